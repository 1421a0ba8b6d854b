//! Rendering the final report rows as a terminal table or CSV.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use coursetrace_core::ReportTable;

/// Build a terminal table from the finished report.
pub fn render_table(report: &ReportTable) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(report.columns());

    for row in report.rows() {
        let cells: Vec<String> = report
            .columns()
            .iter()
            .map(|column| {
                row.get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        table.add_row(cells);
    }

    table
}

/// Write the finished report as CSV: a header record of column labels, then
/// one record per row.
pub fn write_csv<W: std::io::Write>(report: &ReportTable, writer: W) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(report.columns())?;

    for row in report.rows() {
        let record: Vec<String> = report
            .columns()
            .iter()
            .map(|column| {
                row.get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursetrace_core::{Row, Value};

    fn sample() -> ReportTable {
        let mut row = Row::new();
        row.insert("Action".to_string(), Value::Text("viewed".into()));
        row.insert("Dedication (s)".to_string(), Value::Int(60));
        ReportTable::new(vec!["Action".into(), "Dedication (s)".into()], vec![row])
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        write_csv(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Action,Dedication (s)\nviewed,60\n");
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let rendered = render_table(&sample()).to_string();
        assert!(rendered.contains("Action"));
        assert!(rendered.contains("viewed"));
    }
}
