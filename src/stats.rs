use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Attribute, Metric};

/// Year-indexed counts per category value. Every row carries every category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub dimension: Attribute,
    pub categories: Vec<String>,
    pub rows: BTreeMap<i32, BTreeMap<String, u64>>,
}

impl PivotTable {
    /// Builds a rectangular table from sparse (year, category) counts, zero-filling the gaps.
    pub fn from_sparse(dimension: Attribute, counts: BTreeMap<(i32, String), u64>) -> Self {
        let categories: BTreeSet<String> = counts.keys().map(|(_, c)| c.clone()).collect();
        let years: BTreeSet<i32> = counts.keys().map(|(y, _)| *y).collect();

        let mut rows: BTreeMap<i32, BTreeMap<String, u64>> = years
            .into_iter()
            .map(|year| {
                let row = categories.iter().map(|c| (c.clone(), 0)).collect();
                (year, row)
            })
            .collect();

        for ((year, category), count) in counts {
            if let Some(row) = rows.get_mut(&year) {
                row.insert(category, count);
            }
        }

        Self {
            dimension,
            categories: categories.into_iter().collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.keys().copied()
    }

    pub fn count(&self, year: i32, category: &str) -> u64 {
        self.rows
            .get(&year)
            .and_then(|row| row.get(category))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_total(&self, year: i32) -> u64 {
        self.rows
            .get(&year)
            .map(|row| row.values().sum())
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.rows.values().flat_map(|row| row.values()).sum()
    }

    /// Adds all-zero rows for requested years the table does not have yet.
    pub fn reindex_years(&self, years: impl IntoIterator<Item = i32>) -> PivotTable {
        let mut reindexed = self.clone();
        for year in years {
            reindexed.rows.entry(year).or_insert_with(|| {
                self.categories.iter().map(|c| (c.clone(), 0)).collect()
            });
        }
        reindexed
    }
}

/// Pivot rows normalised to percentages. Rows with a zero total hold NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentageTable {
    pub dimension: Attribute,
    pub categories: Vec<String>,
    pub rows: BTreeMap<i32, BTreeMap<String, f64>>,
}

impl PercentageTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn share(&self, year: i32, category: &str) -> Option<f64> {
        self.rows.get(&year).and_then(|row| row.get(category)).copied()
    }

    pub fn row_sum(&self, year: i32) -> Option<f64> {
        self.rows.get(&year).map(|row| row.values().sum())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// Box-plot summary of one metric for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearDistribution {
    pub year: i32,
    pub metric: Metric,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl YearDistribution {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}
