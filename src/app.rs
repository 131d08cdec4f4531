use anyhow::Result;
use regex::RegexBuilder;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{info, warn};

use crate::args::{Args, Command, OutputFormat};
use crate::dataset::Dataset;
use crate::domain::{Attribute, Record};
use crate::error::GradboardError;
use crate::pipeline::{self, FilterSelection};
use crate::report::{self, Report};
use crate::stats::{PivotTable, YearCount};
use crate::{export, utils};

/// Columns shown by `table` when none are requested.
pub const DEFAULT_TABLE_COLUMNS: [&str; 7] = [
    "AN_BASE",
    "SG_ENTIDADE_ENSINO",
    "NM_REGIAO",
    "DS_GRAU_ACADEMICO_DISCENTE",
    "NM_PROGRAMA_IES",
    "IDADE_APROX_DISCENTE",
    "QT_MES_TITULACAO",
];

#[derive(Debug, Serialize)]
struct Summary {
    total_records: usize,
    years: Vec<YearCount>,
    pivots: Vec<PivotTable>,
}

#[derive(Debug, Serialize)]
struct CategoryList {
    attribute: Attribute,
    column: &'static str,
    values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Degree and region lists restrict the selection only when given.
pub fn build_selection(args: &Args) -> FilterSelection {
    let mut selection = FilterSelection::new();
    if !args.degrees.is_empty() {
        selection.set(Attribute::Degree, args.degrees.iter().cloned());
    }
    if !args.regions.is_empty() {
        selection.set(Attribute::Region, args.regions.iter().cloned());
    }
    selection
}

pub fn run(args: &Args) -> Result<()> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "gradboard", "Starting completions analysis");

    let dataset = Dataset::load(&args.data, args.delimiter.map(|c| c as u8))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&dataset, args, &mut out)?;
    out.flush()?;

    info!(
        action = "complete",
        component = "gradboard",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed successfully"
    );
    Ok(())
}

/// Filters the dataset and renders the selected view into `out`.
pub fn execute<W: Write>(dataset: &Dataset, args: &Args, out: &mut W) -> Result<()> {
    let selection = build_selection(args);
    let filtered = pipeline::filter(dataset.records(), &selection);
    info!(
        action = "filter",
        component = "gradboard",
        total_records = dataset.len(),
        filtered_records = filtered.len(),
        "Applied degree and region filters"
    );

    let json = args.format == OutputFormat::Json;
    let source = dataset.source();

    match args.selected_command() {
        Command::Summary => {
            let summary = Summary {
                total_records: dataset.len(),
                years: pipeline::counts_by_year(&filtered),
                pivots: Attribute::DASHBOARD_DIMENSIONS
                    .iter()
                    .map(|dimension| pipeline::counts_by_year_and_dimension(&filtered, *dimension))
                    .collect(),
            };
            if json {
                return Report::new(source, "summary", filtered.len(), summary).write_json(out);
            }

            writeln!(out, "--- Graduate completions ---")?;
            writeln!(out, "Dataset: {}", source.display())?;
            writeln!(
                out,
                "Records loaded: {}",
                utils::format_number(summary.total_records as u64)
            )?;
            writeln!(
                out,
                "Records after filters: {}",
                utils::format_number(filtered.len() as u64)
            )?;
            if let (Some(first), Some(last)) = (summary.years.first(), summary.years.last()) {
                writeln!(out, "Years: {} to {}", first.year, last.year)?;
            }
            for pivot in &summary.pivots {
                report::render_pivot(out, pivot)?;
            }
        }

        Command::Pivot {
            dimension,
            percent,
            fill_years,
        } => {
            let mut pivot = pipeline::counts_by_year_and_dimension(&filtered, dimension);
            if fill_years {
                let bounds = (pivot.years().next(), pivot.years().last());
                if let (Some(first), Some(last)) = bounds {
                    pivot = pivot.reindex_years(first..=last);
                }
            }

            if percent {
                let table = pipeline::to_percentages(&pivot);
                if json {
                    return Report::new(source, "percentages", filtered.len(), table).write_json(out);
                }
                report::render_percentages(out, &table)?;
            } else {
                if json {
                    return Report::new(source, "pivot", filtered.len(), pivot).write_json(out);
                }
                report::render_pivot(out, &pivot)?;
            }
        }

        Command::Trend {
            institution,
            nationality,
        } => {
            let mut records = pipeline::filter_by_institution(&filtered, &institution);
            if records.is_empty() {
                warn!(action = "trend", component = "gradboard", institution = %institution, "Institution has no records under the current filters");
            }
            let mut title = institution.clone();
            if let Some(nationality) = &nationality {
                records = pipeline::filter_by_attribute(&records, Attribute::NationalityType, nationality);
                title = format!("{} ({})", institution, nationality);
            }

            let counts = pipeline::counts_by_year(&records);
            if json {
                return Report::new(source, "trend", records.len(), counts).write_json(out);
            }
            report::render_trend(out, &title, &counts)?;
        }

        Command::Distribution {
            metric,
            institution,
            hide_outliers,
        } => {
            let records: Vec<&Record> = match &institution {
                Some(name) => pipeline::filter_by_institution(&filtered, name),
                None => filtered.clone(),
            };
            let mut distributions = pipeline::distribution_by_year(&records, metric);
            if hide_outliers {
                distributions.iter_mut().for_each(|d| d.outliers.clear());
            }

            if json {
                return Report::new(source, "distribution", records.len(), distributions)
                    .write_json(out);
            }
            let title = match &institution {
                Some(name) => format!("{} per year for {}", metric.label(), name),
                None => format!("{} per year", metric.label()),
            };
            report::render_distribution(out, &title, &distributions, !hide_outliers)?;
        }

        Command::Categories { attribute } => {
            let all: Vec<&Record> = dataset.records().iter().collect();
            let attributes = match attribute {
                Some(attribute) => vec![attribute],
                None => vec![Attribute::Degree, Attribute::Region],
            };
            let lists: Vec<CategoryList> = attributes
                .into_iter()
                .map(|attribute| CategoryList {
                    attribute,
                    column: attribute.column(),
                    values: pipeline::distinct_values(&all, attribute),
                })
                .collect();

            if json {
                return Report::new(source, "categories", filtered.len(), lists).write_json(out);
            }
            for list in &lists {
                report::render_categories(out, list.attribute, &list.values)?;
            }
        }

        Command::Institutions { matching } => {
            let mut institutions = pipeline::distinct_values(&filtered, Attribute::Institution);
            if let Some(pattern) = &matching {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(GradboardError::from)?;
                institutions.retain(|name| regex.is_match(name));
            }

            if json {
                return Report::new(source, "institutions", filtered.len(), institutions)
                    .write_json(out);
            }
            report::render_categories(out, Attribute::Institution, &institutions)?;
        }

        Command::Table { limit, columns } => {
            let columns: Vec<String> = columns.unwrap_or_else(|| {
                DEFAULT_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect()
            });
            let indices = columns
                .iter()
                .map(|name| dataset.column(name.trim()))
                .collect::<Result<Vec<usize>, GradboardError>>()?;

            let rows: Vec<Vec<String>> = filtered
                .iter()
                .take(limit)
                .map(|record| {
                    indices
                        .iter()
                        .map(|i| record.raw().get(*i).unwrap_or_default().to_string())
                        .collect()
                })
                .collect();

            if json {
                return Report::new(source, "table", filtered.len(), RawTable { columns, rows })
                    .write_json(out);
            }
            report::render_table(out, &columns, &rows, filtered.len())?;
        }

        Command::Export { output } => match output {
            Some(path) => export::export_records(&path, dataset.headers(), &filtered)?,
            None => export::write_csv(&mut *out, dataset.headers(), &filtered)?,
        },
    }

    Ok(())
}
