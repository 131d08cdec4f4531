use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::domain::{Attribute, Metric};

#[derive(Parser, Debug)]
#[command(
    name = "gradboard",
    about = "Explore graduate-program completions: filter, pivot by year and export",
    version,
    long_about = None
)]
pub struct Args {
    /// Path to the completions CSV file
    #[arg(
        short,
        long,
        env = "GRADBOARD_DATA",
        default_value = "dados_discentes_comp_titulados_apenas.csv",
        global = true
    )]
    pub data: PathBuf,

    /// Field delimiter of the input file (sniffed from the header when omitted)
    #[arg(long, global = true)]
    pub delimiter: Option<char>,

    /// Keep only these academic degrees (repeatable; all when omitted)
    #[arg(long = "degree", value_name = "DEGREE", global = true)]
    pub degrees: Vec<String>,

    /// Keep only these regions (repeatable; all when omitted)
    #[arg(long = "region", value_name = "REGION", global = true)]
    pub regions: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Record counts and the year pivot for every dashboard dimension
    Summary,

    /// Completions per year broken down by one dimension
    Pivot {
        /// Grouping dimension (region, dependency, legal-status, grade, nationality, ...)
        #[arg(short = 'D', long, default_value = "region")]
        dimension: Attribute,

        /// Show row percentages instead of absolute counts
        #[arg(short, long)]
        percent: bool,

        /// Add empty rows for years between the first and last one present
        #[arg(long)]
        fill_years: bool,
    },

    /// Completions per year for one institution
    Trend {
        /// Exact institution name
        #[arg(short, long)]
        institution: String,

        /// Restrict to one nationality type (e.g. ESTRANGEIRO)
        #[arg(short, long)]
        nationality: Option<String>,
    },

    /// Per-year box-plot summary of age or months to completion
    Distribution {
        /// Metric to summarise (age or months)
        #[arg(short, long, default_value = "age")]
        metric: Metric,

        /// Restrict to one institution
        #[arg(short, long)]
        institution: Option<String>,

        /// Leave outliers out of the rendered summary
        #[arg(long)]
        hide_outliers: bool,
    },

    /// Distinct values available for filtering
    Categories {
        /// Only list this attribute
        #[arg(short, long)]
        attribute: Option<Attribute>,
    },

    /// Institutions present in the filtered records
    Institutions {
        /// Case-insensitive regular expression the name must match
        #[arg(short, long)]
        matching: Option<String>,
    },

    /// Raw filtered rows
    Table {
        /// Number of rows to display
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Columns to display, comma-separated source names
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },

    /// Write the filtered records as CSV
    Export {
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    pub fn selected_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn defaults_to_summary() {
        let args = Args::try_parse_from(["gradboard", "--data", "x.csv"]).unwrap();
        assert_eq!(args.selected_command(), Command::Summary);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.regions.is_empty());
    }

    #[test]
    fn parses_pivot_with_filters_after_subcommand() {
        let args = Args::try_parse_from([
            "gradboard",
            "pivot",
            "--dimension",
            "legal-status",
            "--percent",
            "--region",
            "SUL",
            "--region",
            "NORTE",
        ])
        .unwrap();
        assert_eq!(args.regions, vec!["SUL", "NORTE"]);
        assert_eq!(
            args.selected_command(),
            Command::Pivot {
                dimension: Attribute::LegalStatus,
                percent: true,
                fill_years: false,
            }
        );
    }

    #[test]
    fn unknown_dimension_is_rejected() {
        assert!(Args::try_parse_from(["gradboard", "pivot", "--dimension", "colour"]).is_err());
        assert!(Args::try_parse_from(["gradboard", "distribution", "--metric", "height"]).is_err());
    }

    #[test]
    fn table_columns_split_on_commas() {
        let args =
            Args::try_parse_from(["gradboard", "table", "--columns", "AN_BASE,NM_REGIAO"]).unwrap();
        assert_eq!(
            args.selected_command(),
            Command::Table {
                limit: 20,
                columns: Some(vec!["AN_BASE".into(), "NM_REGIAO".into()]),
            }
        );
    }
}
