//! Command-line interface for rowsift.
//!
//! Parses arguments, folds CLI flags over the loaded settings, runs one use
//! case and prints its console report.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::application::use_cases::id_filter::IdFilterUseCase;
use crate::application::use_cases::latency_compare::{LatencyCompareUseCase, LatencyPaths};
use crate::application::use_cases::marker_scan::MarkerScanUseCase;
use crate::application::use_cases::marker_strip::MarkerStripUseCase;
use crate::domain::error::{AppError, Result};
use crate::domain::settings::{parse_delimiter, Settings};
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::storage::resolve_path;

/// rowsift - small utilities for CSV/Excel exports
#[derive(Parser, Debug)]
#[command(name = "rowsift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: rowsift.toml in the working directory, if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Keep only the rows whose id is listed in an ids file
    FilterIds {
        /// Source CSV file
        csv_path: PathBuf,

        /// Newline-separated list of ids to keep
        #[arg(long, value_name = "PATH", default_value = "matched_ids.txt")]
        ids_file: PathBuf,

        /// Output CSV (default: <csv_path stem>_filtered<.ext>)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Delimiter override, e.g. ',' ';' or '\t'. Detected when omitted.
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<String>,
    },

    /// Count rows whose text contains a "begin text" / "end text" marker
    FindMarkers {
        /// Source CSV file
        csv_path: PathBuf,

        /// Delimiter override, e.g. ',' ';' or '\t'. Detected when omitted.
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<String>,

        /// Match marker words with exact case
        #[arg(long)]
        case_sensitive: bool,

        /// Write matched ids here instead of printing them
        #[arg(long, value_name = "PATH")]
        ids_output: Option<PathBuf>,
    },

    /// Write a copy of the CSV with the text column cut to the marker region
    StripMarkers {
        /// Source CSV file
        csv_path: PathBuf,

        /// Output CSV
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Delimiter override, e.g. ',' ';' or '\t'. Detected when omitted.
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<String>,

        /// Match marker words with exact case
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Compare latency per word count between two spreadsheets
    LatencyCompare {
        /// Spreadsheet measured before the change
        #[arg(long, value_name = "PATH")]
        before: Option<PathBuf>,

        /// Spreadsheet measured after the change
        #[arg(long, value_name = "PATH")]
        after: Option<PathBuf>,

        /// Per word count comparison output
        #[arg(long, value_name = "PATH")]
        exact_output: Option<PathBuf>,

        /// Per quantile bin comparison output
        #[arg(long, value_name = "PATH")]
        binned_output: Option<PathBuf>,

        /// Action to compare (case-insensitive)
        #[arg(long)]
        action: Option<String>,

        /// Number of quantile bins
        #[arg(long)]
        bins: Option<usize>,
    },
}

impl Cli {
    /// Load settings and apply the flags of the selected command on top
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = ConfigService::new(self.config.clone()).load()?;

        match &self.command {
            Commands::FilterIds { delimiter, .. } => {
                apply_delimiter(&mut settings, delimiter.as_deref())?;
            }
            Commands::FindMarkers {
                delimiter,
                case_sensitive,
                ..
            }
            | Commands::StripMarkers {
                delimiter,
                case_sensitive,
                ..
            } => {
                apply_delimiter(&mut settings, delimiter.as_deref())?;
                if *case_sensitive {
                    settings.markers.case_sensitive = true;
                }
            }
            Commands::LatencyCompare {
                before,
                after,
                exact_output,
                binned_output,
                action,
                bins,
            } => {
                let latency = &mut settings.latency;
                if let Some(before) = before {
                    latency.before = before.clone();
                }
                if let Some(after) = after {
                    latency.after = after.clone();
                }
                if let Some(path) = exact_output {
                    latency.exact_output = path.clone();
                }
                if let Some(path) = binned_output {
                    latency.binned_output = path.clone();
                }
                if let Some(action) = action {
                    latency.action = action.clone();
                }
                if let Some(bins) = bins {
                    latency.bins = *bins;
                }
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn apply_delimiter(settings: &mut Settings, delimiter: Option<&str>) -> Result<()> {
    if let Some(raw) = delimiter {
        parse_delimiter(raw)?;
        settings.io.delimiter = Some(raw.to_string());
    }
    Ok(())
}

/// Run the parsed command, printing its report to stdout
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let base_dir = settings.io.base_dir.as_deref();
    let resolve = |path: &Path| -> PathBuf { resolve_path(base_dir, path) };

    match &cli.command {
        Commands::FilterIds {
            csv_path,
            ids_file,
            output,
            ..
        } => {
            let input = resolve(csv_path.as_path());
            let ids_file = resolve(ids_file.as_path());
            let output = output.as_deref().map(resolve);

            println!("Loading ids from {}...", ids_file.display());
            let report =
                IdFilterUseCase::new(settings)?.run(&input, &ids_file, output.as_deref())?;

            println!("Loaded {} unique ids", report.loaded_ids);
            println!("Rows processed: {}", report.total_rows);
            println!("Rows kept: {}", report.kept_rows);
            println!("Result saved to: {}", report.output_path.display());
        }
        Commands::FindMarkers {
            csv_path,
            ids_output,
            ..
        } => {
            let input = resolve(csv_path.as_path());
            let ids_output = ids_output.as_deref().map(resolve);

            let report = MarkerScanUseCase::new(settings)?.run(&input, ids_output.as_ref())?;

            if ids_output.is_none() {
                for id in &report.matched_ids {
                    println!("{}", id);
                }
            }
            println!("{}", report.summary);
        }
        Commands::StripMarkers {
            csv_path, output, ..
        } => {
            let input = resolve(csv_path.as_path());
            let output = resolve(output.as_path());

            let report = MarkerStripUseCase::new(settings)?.run(&input, &output)?;

            println!("rows={}", report.rows);
            println!("changed={}", report.changed);
            println!("fallbacks={}", report.fallbacks);
            println!("Result saved to: {}", output.display());
        }
        Commands::LatencyCompare { .. } => {
            let latency = &settings.latency;
            let paths = LatencyPaths {
                before: resolve(latency.before.as_path()),
                after: resolve(latency.after.as_path()),
                exact_output: resolve(latency.exact_output.as_path()),
                binned_output: resolve(latency.binned_output.as_path()),
            };

            LatencyCompareUseCase::new(settings)?.run(&paths)?;

            println!("Saved outputs:");
            println!(" - {}", paths.exact_output.display());
            println!(" - {}", paths.binned_output.display());
        }
    }

    Ok(())
}

/// Parse argv without exiting, for callers that want the error
pub fn try_parse_from<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| AppError::ValidationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_find_markers() {
        let cli = try_parse_from([
            "rowsift",
            "find-markers",
            "export.csv",
            "--case-sensitive",
            "--delimiter",
            ";",
        ])
        .unwrap();

        match cli.command {
            Commands::FindMarkers {
                csv_path,
                delimiter,
                case_sensitive,
                ids_output,
            } => {
                assert_eq!(csv_path, PathBuf::from("export.csv"));
                assert_eq!(delimiter.as_deref(), Some(";"));
                assert!(case_sensitive);
                assert_eq!(ids_output, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_filter_ids_defaults() {
        let cli = try_parse_from(["rowsift", "filter-ids", "export.csv"]).unwrap();
        match cli.command {
            Commands::FilterIds {
                ids_file, output, ..
            } => {
                assert_eq!(ids_file, PathBuf::from("matched_ids.txt"));
                assert_eq!(output, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_settings() {
        figment::Jail::expect_with(|_jail| {
            let cli = try_parse_from([
                "rowsift",
                "latency-compare",
                "--before",
                "a.xlsx",
                "--bins",
                "10",
            ])
            .map_err(|e| e.to_string())?;

            let settings = cli.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.latency.before, PathBuf::from("a.xlsx"));
            assert_eq!(settings.latency.after, PathBuf::from("latency_after_changes.xlsx"));
            assert_eq!(settings.latency.bins, 10);
            Ok(())
        });
    }

    #[test]
    fn test_bad_delimiter_rejected() {
        figment::Jail::expect_with(|_jail| {
            let cli = try_parse_from(["rowsift", "filter-ids", "x.csv", "--delimiter", "ab"])
                .map_err(|e| e.to_string())?;
            assert!(cli.settings().is_err());
            Ok(())
        });
    }
}
