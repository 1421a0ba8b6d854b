//! Column-label lookup
//!
//! Report definitions refer to output columns by label key; the provider
//! turns keys into display text. This is the localization seam: the host
//! can swap the provider, or override individual keys from config, without
//! touching any report semantics.

use std::collections::HashMap;

/// Resolves a label key to display text for output column names.
pub trait LabelProvider {
    fn label(&self, key: &str) -> String;
}

/// Built-in English labels with optional per-key overrides from config.
#[derive(Debug, Default)]
pub struct EnglishLabels {
    overrides: HashMap<String, String>,
}

impl EnglishLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    fn builtin(key: &str) -> Option<&'static str> {
        let label = match key {
            "column_event" => "Event",
            "column_component" => "Component",
            "column_action" => "Action",
            "column_target" => "Target",
            "column_object_table" => "Object table",
            "column_object_name" => "Object name",
            "column_module_name" => "Module",
            "column_time" => "Time",
            "column_session_start" => "Session start",
            "column_dedication" => "Dedication (s)",
            "column_interaction" => "Interaction",
            "column_score" => "Score",
            "column_max_score" => "Max score",
            "column_badge_name" => "Badge",
            "column_course" => "Course",
            "column_speaker" => "Speaker",
            "column_message" => "Message",
            _ => return None,
        };
        Some(label)
    }
}

impl LabelProvider for EnglishLabels {
    fn label(&self, key: &str) -> String {
        if let Some(text) = self.overrides.get(key) {
            return text.clone();
        }
        // Unknown keys fall through as-is so a missing entry is visible in
        // the output instead of erasing the column.
        Self::builtin(key)
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
