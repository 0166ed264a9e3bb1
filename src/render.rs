//! Plain-text and JSON rendering of query results.

use chrono::{Local, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::storage::{OutputRecord, RunRecord};

/// Output longer than this is truncated in listings.
pub const OUTPUT_PREVIEW_CHARS: usize = 255;

/// Column-aligned text table in the `a | b | c` style.
#[derive(Debug, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|i| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .chain(std::iter::once(&self.headers[i]))
                    .map(|c| c.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| format!("{:<w$}", cells.get(i).map(String::as_str).unwrap_or(""), w = *w))
                .collect();
            padded.join(" | ").trim_end().to_string()
        };

        let mut out = line(&self.headers);
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-|-"));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

/// `created_at` as stored by SQLite (UTC) shown in local time.
pub fn format_timestamp(created_at: &str) -> String {
    match NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => Local
            .from_utc_datetime(&naive)
            .format("%b %e %Y, %l:%M:%S %P")
            .to_string(),
        Err(_) => created_at.to_string(),
    }
}

/// Elapsed seconds rounded to milliseconds; pending runs show nothing.
pub fn format_runtime(execution_time_seconds: Option<&str>) -> String {
    execution_time_seconds
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| format!("{:.3}", secs))
        .unwrap_or_default()
}

/// Truncate `output` for listings, pointing at the full dump.
pub fn preview_output(id: i64, output: &str) -> String {
    if output.chars().count() <= OUTPUT_PREVIEW_CHARS {
        return output.to_string();
    }
    let head: String = output.chars().take(OUTPUT_PREVIEW_CHARS).collect();
    format!(
        "{}...\nbee output result truncated\nUse `bee output --id={}` to print full output",
        head, id
    )
}

pub fn runs_table(runs: &[RunRecord]) -> String {
    let mut table = TextTable::new([
        "id", "name", "note", "runtime", "status", "output id", "args", "date",
    ]);
    for run in runs {
        table.row(vec![
            run.id.to_string(),
            run.name.clone(),
            run.note.clone().unwrap_or_default(),
            format_runtime(run.execution_time_seconds.as_deref()),
            run.status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "pending".to_string()),
            run.output_id.map(|id| id.to_string()).unwrap_or_default(),
            run.execution_args.clone(),
            format_timestamp(&run.created_at),
        ]);
    }
    table.render()
}

/// Outputs are multi-line, so each gets a header line and an indented body.
pub fn outputs_listing(outputs: &[OutputRecord]) -> String {
    let mut out = String::new();
    for record in outputs {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!(
            "#{} | {} | {}\n",
            record.id,
            record.name,
            format_timestamp(&record.created_at)
        ));
        for line in preview_output(record.id, &record.output).lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: i64, status: Option<i64>) -> RunRecord {
        RunRecord {
            id,
            name: "fix.sh".into(),
            note: Some("note".into()),
            execution_args: "--run".into(),
            status,
            execution_time_seconds: status.map(|_| "1.500000000".to_string()),
            output_id: None,
            created_at: "2026-01-02 03:04:05".into(),
        }
    }

    #[test]
    fn test_text_table_aligns_columns() {
        let mut table = TextTable::new(["id", "name"]);
        table.row(vec!["10".into(), "a".into()]);
        assert_eq!(table.render(), "id | name\n---|-----\n10 | a");
    }

    #[test]
    fn test_runs_table_marks_pending() {
        let rendered = runs_table(&[run(1, Some(0)), run(2, None)]);
        assert!(rendered.contains("1.500"));
        assert!(rendered.contains("pending"));
    }

    #[test]
    fn test_preview_output_short_text_untouched() {
        assert_eq!(preview_output(1, "hello"), "hello");
    }

    #[test]
    fn test_preview_output_truncates_long_text() {
        let long = "x".repeat(OUTPUT_PREVIEW_CHARS + 10);
        let preview = preview_output(9, &long);
        assert!(preview.starts_with(&"x".repeat(OUTPUT_PREVIEW_CHARS)));
        assert!(!preview.starts_with(&"x".repeat(OUTPUT_PREVIEW_CHARS + 1)));
        assert!(preview.contains("bee output --id=9"));
    }

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(Some("1.500000000")), "1.500");
        assert_eq!(format_runtime(Some("0.123400000")), "0.123");
        assert_eq!(format_runtime(None), "");
    }

    #[test]
    fn test_format_timestamp_passes_through_unparseable() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
