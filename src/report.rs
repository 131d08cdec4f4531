use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::domain::Attribute;
use crate::stats::{PercentageTable, PivotTable, YearCount, YearDistribution};
use crate::utils::{format_number, format_share};

/// JSON envelope shared by every view.
#[derive(Debug, Serialize)]
pub struct Report<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub source: &'a Path,
    pub view: &'a str,
    pub filtered_records: usize,
    pub data: T,
}

impl<'a, T: Serialize> Report<'a, T> {
    pub fn new(source: &'a Path, view: &'a str, filtered_records: usize, data: T) -> Self {
        Self {
            generated_at: Utc::now(),
            source,
            view,
            filtered_records,
            data,
        }
    }

    pub fn write_json<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out)?;
        Ok(())
    }
}

/// Writes a grid; the first `left_aligned` columns are left-aligned, the rest right-aligned.
fn write_grid<W: Write>(
    out: &mut W,
    header: &[String],
    rows: &[Vec<String>],
    left_aligned: usize,
) -> io::Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if i < left_aligned {
                    format!("{:<width$}", cell, width = *width)
                } else {
                    format!("{:>width$}", cell, width = *width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(header))?;
    writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    )?;
    for row in rows {
        writeln!(out, "{}", line(row.as_slice()))?;
    }
    Ok(())
}

/// Label shown for an empty category cell in text grids.
const BLANK_CATEGORY: &str = "(blank)";

fn pivot_header(categories: &[String]) -> Vec<String> {
    std::iter::once("Year".to_string())
        .chain(categories.iter().map(|category| {
            if category.is_empty() {
                BLANK_CATEGORY.to_string()
            } else {
                category.clone()
            }
        }))
        .collect()
}

pub fn render_pivot<W: Write>(out: &mut W, pivot: &PivotTable) -> io::Result<()> {
    writeln!(
        out,
        "\n--- Completions per year by {} ---",
        pivot.dimension.label().to_lowercase()
    )?;
    if pivot.is_empty() {
        return writeln!(out, "No records match the current filters");
    }

    let mut header = pivot_header(&pivot.categories);
    header.push("Total".to_string());
    let rows: Vec<Vec<String>> = pivot
        .rows
        .iter()
        .map(|(year, row)| {
            std::iter::once(year.to_string())
                .chain(row.values().map(|n| format_number(*n)))
                .chain(std::iter::once(format_number(row.values().sum())))
                .collect()
        })
        .collect();
    write_grid(out, &header, &rows, 1)
}

pub fn render_percentages<W: Write>(out: &mut W, table: &PercentageTable) -> io::Result<()> {
    writeln!(
        out,
        "\n--- Share of completions per year by {} ---",
        table.dimension.label().to_lowercase()
    )?;
    if table.is_empty() {
        return writeln!(out, "No records match the current filters");
    }

    let header = pivot_header(&table.categories);
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|(year, row)| {
            std::iter::once(year.to_string())
                .chain(row.values().map(|share| format_share(*share)))
                .collect()
        })
        .collect();
    write_grid(out, &header, &rows, 1)
}

pub fn render_trend<W: Write>(out: &mut W, title: &str, counts: &[YearCount]) -> io::Result<()> {
    writeln!(out, "\n--- Completions per year for {} ---", title)?;
    if counts.is_empty() {
        return writeln!(out, "No records match the current filters");
    }

    let peak = counts.iter().map(|c| c.count).max().unwrap_or(0).max(1);
    for entry in counts {
        // bars scaled to 40 columns
        let bar = "#".repeat(((entry.count * 40) / peak) as usize);
        writeln!(
            out,
            "{}  {:>7}  {}",
            entry.year,
            format_number(entry.count),
            bar
        )?;
    }
    Ok(())
}

pub fn render_distribution<W: Write>(
    out: &mut W,
    title: &str,
    distributions: &[YearDistribution],
    show_outliers: bool,
) -> io::Result<()> {
    writeln!(out, "\n--- {} ---", title)?;
    if distributions.is_empty() {
        return writeln!(out, "No records match the current filters");
    }

    let mut header: Vec<String> = ["Year", "N", "Whisker-", "Q1", "Median", "Q3", "Whisker+"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if show_outliers {
        header.push("Outliers".to_string());
    }

    let rows: Vec<Vec<String>> = distributions
        .iter()
        .map(|d| {
            let mut row = vec![
                d.year.to_string(),
                format_number(d.count as u64),
                format!("{:.1}", d.lower_whisker),
                format!("{:.1}", d.q1),
                format!("{:.1}", d.median),
                format!("{:.1}", d.q3),
                format!("{:.1}", d.upper_whisker),
            ];
            if show_outliers {
                row.push(format_number(d.outliers.len() as u64));
            }
            row
        })
        .collect();
    write_grid(out, &header, &rows, 1)
}

pub fn render_categories<W: Write>(
    out: &mut W,
    attribute: Attribute,
    values: &[String],
) -> io::Result<()> {
    writeln!(
        out,
        "\n{} ({}, {} values):",
        attribute.label(),
        attribute.column(),
        values.len()
    )?;
    for value in values {
        writeln!(out, "- {}", value)?;
    }
    Ok(())
}

pub fn render_table<W: Write>(
    out: &mut W,
    columns: &[String],
    rows: &[Vec<String>],
    total: usize,
) -> io::Result<()> {
    writeln!(
        out,
        "\n--- Showing {} of {} filtered records ---",
        format_number(rows.len() as u64),
        format_number(total as u64)
    )?;
    write_grid(out, columns, rows, columns.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::to_percentages;
    use std::collections::BTreeMap;

    fn scenario_pivot() -> PivotTable {
        let counts: BTreeMap<(i32, String), u64> = [
            ((2020, "SE".to_string()), 2),
            ((2020, "S".to_string()), 1),
            ((2021, "S".to_string()), 1),
        ]
        .into_iter()
        .collect();
        PivotTable::from_sparse(Attribute::Region, counts)
    }

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn pivot_text_has_zero_filled_cells_and_totals() {
        let text = render(|out| render_pivot(out, &scenario_pivot()));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "--- Completions per year by region ---");
        assert_eq!(lines[2], "Year  S  SE  Total");
        assert_eq!(lines[4], "2020  1   2      3");
        assert_eq!(lines[5], "2021  1   0      1");
    }

    #[test]
    fn percentage_text_shows_gap_for_empty_year() {
        let pivot = scenario_pivot().reindex_years([2019]);
        let text = render(|out| render_percentages(out, &to_percentages(&pivot)));
        assert!(text.contains("2019        -       -"));
        assert!(text.contains("2021  100.00%   0.00%"));
    }

    #[test]
    fn blank_category_gets_a_visible_header() {
        let counts: BTreeMap<(i32, String), u64> = [
            ((2019, String::new()), 1),
            ((2019, "4".to_string()), 2),
        ]
        .into_iter()
        .collect();
        let pivot = PivotTable::from_sparse(Attribute::ProgramGrade, counts);

        let text = render(|out| render_pivot(out, &pivot));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "Year  (blank)  4  Total");
        assert_eq!(lines[4], "2019        1  2      3");

        let report = Report::new(Path::new("data.csv"), "pivot", 3, &pivot);
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["data"]["categories"][0], "");
        assert_eq!(value["data"]["rows"]["2019"][""], 1);
    }

    #[test]
    fn empty_pivot_says_so() {
        let empty = PivotTable::from_sparse(Attribute::Region, BTreeMap::new());
        let text = render(|out| render_pivot(out, &empty));
        assert!(text.contains("No records match"));
    }

    #[test]
    fn json_envelope_serialises_nan_as_null() {
        let pivot = scenario_pivot().reindex_years([2019]);
        let report = Report::new(Path::new("data.csv"), "percentages", 4, to_percentages(&pivot));
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["view"], "percentages");
        assert_eq!(value["filtered_records"], 4);
        assert_eq!(value["data"]["dimension"], "region");
        assert!(value["data"]["rows"]["2019"]["SE"].is_null());
        assert_eq!(value["data"]["rows"]["2021"]["S"], 100.0);
    }
}
