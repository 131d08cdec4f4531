use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, OutputFormat};

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a percentage share; NaN (a year without records) renders as a gap.
pub fn format_share(share: f64) -> String {
    if share.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}%", share)
    }
}

pub fn validate_args(args: &Args) -> anyhow::Result<()> {
    if let Some(delimiter) = args.delimiter {
        if !delimiter.is_ascii() {
            anyhow::bail!("--delimiter must be a single ASCII character");
        }
    }

    match args.selected_command() {
        Command::Table { limit, columns } => {
            if limit == 0 {
                anyhow::bail!("--limit must be greater than 0");
            }
            if let Some(columns) = columns {
                if columns.iter().any(|c| c.trim().is_empty()) {
                    anyhow::bail!("--columns must not contain empty names");
                }
            }
        }
        Command::Trend { institution, .. } if institution.trim().is_empty() => {
            anyhow::bail!("--institution must not be empty");
        }
        Command::Distribution {
            institution: Some(institution),
            ..
        } if institution.trim().is_empty() => {
            anyhow::bail!("--institution must not be empty");
        }
        Command::Export { .. } if args.format == OutputFormat::Json => {
            anyhow::bail!("export always writes CSV; --format json is not supported");
        }
        _ => {}
    }

    Ok(())
}
