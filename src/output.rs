use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::aggregate::SummaryTable;
use crate::error::{Error, Result};
use crate::loader::LoadReport;
use crate::util::{format_int, format_number};
use crate::views::ViewOutput;

/// Whole numbers print without decimals, everything else with one. A mean
/// over nothing prints as `undefined`.
pub fn format_metric(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format_number(v, 0)
    } else {
        format_number(v, 1)
    }
}

pub fn summary_table(table: &SummaryTable, max_rows: Option<usize>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(
        table
            .key_columns()
            .iter()
            .chain(table.metric_columns())
            .cloned()
            .collect::<Vec<String>>(),
    );
    let limit = max_rows.unwrap_or(usize::MAX);
    for row in table.rows().iter().take(limit) {
        builder.push_record(
            row.keys
                .iter()
                .map(|k| k.to_string())
                .chain(row.metrics.iter().map(|m| format_metric(*m)))
                .collect::<Vec<String>>(),
        );
    }
    builder.build()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)\n".to_string();
    }
    format!("{}\n", Table::new(slice).with(Style::markdown()))
}

/// Summary of a dataset read, printed before the first view that uses it.
pub fn render_load_report(name: &str, report: &LoadReport) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "Processing {name}... ({} of {} rows loaded)",
        format_int(report.loaded_rows),
        format_int(report.total_rows)
    );
    if report.null_fields > 0 {
        let _ = writeln!(s, "Note: {} unparseable cells set to empty.", format_int(report.null_fields));
    }
    if report.skipped_rows > 0 {
        let _ = writeln!(s, "Note: {} unreadable rows skipped.", format_int(report.skipped_rows));
    }
    if !report.dropped_columns.is_empty() {
        let _ = writeln!(s, "Info: ignored index columns {:?}.", report.dropped_columns);
    }
    s
}

/// Render a view as the terminal shows it: title, cards, table, notes.
pub fn render_view(out: &ViewOutput, max_rows: Option<usize>) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{}", out.title);
    if let Some(sub) = &out.subtitle {
        let _ = writeln!(s, "({})", sub);
    }
    let _ = writeln!(s);

    if !out.cards.is_empty() {
        s.push_str(&preview_table_rows(&out.cards, out.cards.len()));
        s.push('\n');
    }

    if out.is_empty() {
        s.push_str("No data for the current selection.\n");
    } else {
        let mut table = summary_table(&out.table, max_rows);
        table.with(Style::markdown());
        let _ = writeln!(s, "{}", table);
        if let Some(n) = max_rows {
            if out.table.len() > n {
                let _ = writeln!(s, "({} of {} rows shown)", n, out.table.len());
            }
        }
    }

    if !out.translations.is_empty() {
        let _ = writeln!(s, "\nMission type translations");
        s.push_str(&preview_table_rows(&out.translations, out.translations.len()));
    }

    let _ = writeln!(s, "\nInsight: {}", out.insight);
    s
}

pub fn write_csv(path: &Path, table: &SummaryTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.key_columns().iter().chain(table.metric_columns()))?;
    for row in table.rows() {
        let record: Vec<String> = row
            .keys
            .iter()
            .map(|k| k.to_string())
            .chain(row.metrics.iter().map(|m| {
                if m.is_finite() {
                    m.to_string()
                } else {
                    String::new()
                }
            }))
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `<view>.csv` (the summary table) and `<view>.json` (the whole
/// output) into `dir`.
pub fn export_view(dir: &Path, out: &ViewOutput) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).map_err(|e| Error::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let csv_path = dir.join(format!("{}.csv", out.view.name()));
    let json_path = dir.join(format!("{}.json", out.view.name()));
    write_csv(&csv_path, &out.table)?;
    write_json(&json_path, out)?;
    log::info!("Exported {} and {}", csv_path.display(), json_path.display());
    Ok((csv_path, json_path))
}
