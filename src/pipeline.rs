//! Filtering, grouping and pivoting over loaded records.
//!
//! Every function here is a pure function of its arguments: callers may re-run
//! them on each selection change without clearing anything in between.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::domain::{Attribute, Metric, Record};
use crate::stats::{PercentageTable, PivotTable, YearCount, YearDistribution};

/// Nationality type marking foreign students in the source data.
pub const FOREIGN_NATIONALITY: &str = "ESTRANGEIRO";

const WHISKER_FACTOR: f64 = 1.5;

/// Allowed values per attribute. Attributes without an entry are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    allowed: BTreeMap<Attribute, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow<I, S>(mut self, attribute: Attribute, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(attribute, values);
        self
    }

    pub fn set<I, S>(&mut self, attribute: Attribute, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .insert(attribute, values.into_iter().map(Into::into).collect());
    }

    pub fn allowed(&self, attribute: Attribute) -> Option<&BTreeSet<String>> {
        self.allowed.get(&attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.allowed.keys().copied()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.allowed
            .iter()
            .all(|(attribute, values)| values.contains(&*record.value(*attribute)))
    }
}

/// Records whose constrained attributes all fall inside their allowed sets, in source order.
pub fn filter<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    let filtered: Vec<&Record> = records.iter().filter(|r| selection.matches(r)).collect();
    debug!(
        action = "filter",
        component = "pipeline",
        input_records = records.len(),
        output_records = filtered.len(),
        constrained_attributes = selection.allowed.len(),
        "Applied filter selection"
    );
    filtered
}

pub fn filter_by_attribute<'a>(
    records: &[&'a Record],
    attribute: Attribute,
    value: &str,
) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|r| r.value(attribute) == value)
        .collect()
}

pub fn filter_by_institution<'a>(records: &[&'a Record], institution: &str) -> Vec<&'a Record> {
    filter_by_attribute(records, Attribute::Institution, institution)
}

/// Distinct values of `attribute`, in order of first appearance.
pub fn distinct_values(records: &[&Record], attribute: Attribute) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in records {
        let value = record.value(attribute);
        if seen.insert(value.clone().into_owned()) {
            values.push(value.into_owned());
        }
    }
    values
}

pub fn counts_by_year_and_dimension(records: &[&Record], dimension: Attribute) -> PivotTable {
    let mut counts: BTreeMap<(i32, String), u64> = BTreeMap::new();
    for record in records {
        *counts
            .entry((record.year, record.value(dimension).into_owned()))
            .or_insert(0) += 1;
    }

    let pivot = PivotTable::from_sparse(dimension, counts);
    debug!(
        action = "pivot",
        component = "pipeline",
        dimension = %dimension,
        years = pivot.rows.len(),
        categories = pivot.categories.len(),
        "Built count pivot"
    );
    pivot
}

/// Normalises each year row to percentages of the row total.
///
/// A row whose total is zero divides by zero and yields NaN for every category.
/// The NaN is kept so renderers can show a gap instead of a misleading zero bar.
pub fn to_percentages(pivot: &PivotTable) -> PercentageTable {
    let rows = pivot
        .rows
        .iter()
        .map(|(year, row)| {
            let total = row.values().sum::<u64>() as f64;
            let shares = row
                .iter()
                .map(|(category, count)| (category.clone(), *count as f64 / total * 100.0))
                .collect();
            (*year, shares)
        })
        .collect();

    PercentageTable {
        dimension: pivot.dimension,
        categories: pivot.categories.clone(),
        rows,
    }
}

/// Record counts per year, ascending. Years without records are absent.
pub fn counts_by_year(records: &[&Record]) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(record.year).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Box-plot summaries per year. Records with an unknown metric value are skipped.
pub fn distribution_by_year(records: &[&Record], metric: Metric) -> Vec<YearDistribution> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(value) = record.metric(metric) {
            by_year.entry(record.year).or_default().push(value);
        }
    }

    by_year
        .into_iter()
        .map(|(year, mut values)| {
            values.sort_by(f64::total_cmp);
            summarize(year, metric, &values)
        })
        .collect()
}

fn summarize(year: i32, metric: Metric, sorted: &[f64]) -> YearDistribution {
    let mut distribution = YearDistribution {
        year,
        metric,
        count: sorted.len(),
        min: sorted[0],
        q1: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q3: quantile(sorted, 0.75),
        max: sorted[sorted.len() - 1],
        lower_whisker: f64::NAN,
        upper_whisker: f64::NAN,
        outliers: Vec::new(),
    };

    let reach = distribution.iqr() * WHISKER_FACTOR;
    let (low_fence, high_fence) = (distribution.q1 - reach, distribution.q3 + reach);

    let mut inside = sorted
        .iter()
        .copied()
        .filter(|v| (low_fence..=high_fence).contains(v));
    distribution.lower_whisker = inside.next().unwrap_or(distribution.q1);
    distribution.upper_whisker = inside.last().unwrap_or(distribution.lower_whisker);
    distribution.outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();
    distribution
}

/// Linear-interpolation quantile over an ascending, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
