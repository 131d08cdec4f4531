use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::{self, Record};
use crate::error::GradboardError;

const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Immutable handle over the loaded completions file.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    delimiter: u8,
    headers: StringRecord,
    records: Vec<Record>,
}

impl Dataset {
    pub fn load(path: &Path, delimiter: Option<u8>) -> Result<Self> {
        let start_time = Instant::now();
        info!(action = "start", component = "dataset_load", file_path = ?path, "Loading completions dataset");

        if !path.exists() {
            anyhow::bail!("Dataset file not found at {:?}", path);
        }

        let content =
            fs::read(path).with_context(|| format!("Failed to read dataset {:?}", path))?;

        let mut dataset = Self::from_bytes(&content, delimiter)?;
        dataset.source = path.to_path_buf();

        let load_time = start_time.elapsed();
        info!(
            action = "complete",
            component = "dataset_load",
            record_count = dataset.records.len(),
            column_count = dataset.headers.len(),
            delimiter = %(dataset.delimiter as char).escape_default(),
            duration_ms = load_time.as_millis(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parses a dataset from any reader. Without an explicit delimiter it is sniffed from the header line.
    pub fn from_reader<R: Read>(mut reader: R, delimiter: Option<u8>) -> Result<Self> {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .context("Failed to read dataset content")?;
        Self::from_bytes(&content, delimiter)
    }

    /// Parses a dataset already held in memory.
    pub fn from_bytes(content: &[u8], delimiter: Option<u8>) -> Result<Self> {
        let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(content));

        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::All)
            .from_reader(content);

        let headers = csv_reader
            .headers()
            .context("Failed to read dataset header")?
            .clone();

        if let Some(missing) =
            domain::required_columns().find(|column| !headers.iter().any(|h| h == *column))
        {
            return Err(GradboardError::MissingColumn(missing.to_string()).into());
        }

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = row.with_context(|| format!("Failed to read dataset line {}", line))?;
            let mut record: Record = row
                .deserialize(Some(&headers))
                .with_context(|| format!("Invalid record at dataset line {}", line))?;
            record.raw = row;
            records.push(record);
        }

        if records.is_empty() {
            warn!(action = "complete", component = "dataset_load", "Dataset has a header but no records");
        }

        Ok(Self {
            source: PathBuf::new(),
            delimiter,
            headers,
            records,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of a header column, for raw-table projections.
    pub fn column(&self, name: &str) -> Result<usize, GradboardError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| GradboardError::MissingColumn(name.to_string()))
    }
}

/// Picks the candidate separator occurring most often in the first line. Ties favour `;`.
pub fn detect_delimiter(content: &[u8]) -> u8 {
    let first_line = content.split(|b| *b == b'\n').next().unwrap_or_default();

    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0;
    for candidate in DELIMITER_CANDIDATES {
        let count = first_line.iter().filter(|b| **b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}
