//! Configuration files
//!
//! Settings are read from two optional TOML files:
//! - User home directory: `~/.nfce.toml` (user defaults)
//! - Project directory: `./.nfce.toml` (project defaults)
//!
//! Precedence (highest first): CLI arguments, project config, user config,
//! built-in defaults.

use anyhow::{Context, Result};
use colored::Colorize;
use nfce_core::SummaryGrouping;
use nfce_pipeline::ProcessOptions;
use nfce_report::ReportOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name, looked up in the home and working directories
pub const CONFIG_FILE_NAME: &str = ".nfce.toml";

/// Report file name used when no output is given
pub const DEFAULT_REPORT_NAME: &str = "Dados NFC-e.xlsx";

/// Contents of a `.nfce.toml` file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for the `report` command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report path, relative to the working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Excel number format for money cells
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_format: Option<String>,

    /// Split summary buckets by tax rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by_rate: Option<bool>,
}

impl ReportConfig {
    /// Fields set in `other` replace fields set here
    fn overlay(self, other: Self) -> Self {
        Self {
            output: other.output.or(self.output),
            currency_format: other.currency_format.or(self.currency_format),
            group_by_rate: other.group_by_rate.or(self.group_by_rate),
        }
    }
}

/// `report` arguments given on the command line
#[derive(Debug, Clone, Default)]
pub struct ReportOverrides {
    pub output: Option<PathBuf>,
    pub currency_format: Option<String>,
    pub group_by_rate: bool,
}

/// Fully resolved `report` settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub output: PathBuf,
    pub options: ProcessOptions,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            eprintln!(
                "{} Failed to parse config file: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("{} {}", "Parse error:".yellow().bold(), e);
            eprintln!();
            eprintln!("{} Configuration file syntax:", "Help:".cyan().bold());
            eprintln!("  [report]");
            eprintln!("  output = \"relatorio.xlsx\"");
            eprintln!("  currency_format = \"R$ #,##0.00\"");
            eprintln!("  group_by_rate = false");
            anyhow::anyhow!("Failed to parse config file: {e}")
        })?;

        Ok(config)
    }

    /// Find and load configuration files
    /// Returns (`user_config`, `project_config`)
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = dirs::home_dir()
            .and_then(|home| Self::load_optional(&home.join(CONFIG_FILE_NAME), "user"));
        let project_config = Self::load_optional(Path::new(CONFIG_FILE_NAME), "project");
        (user_config, project_config)
    }

    /// Load a config file if it exists; a broken file is reported and skipped
    fn load_optional(path: &Path, scope: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match Self::load_from_file(path) {
            Ok(config) => {
                log::debug!("Loaded {scope} config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!(
                    "{} Failed to load {scope} config from {}: {}",
                    "Warning:".yellow().bold(),
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Merge configs with precedence
    /// project config > user config > defaults
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let report = [user_config, project_config]
            .into_iter()
            .flatten()
            .filter_map(|config| config.report)
            .reduce(ReportConfig::overlay);

        Self { report }
    }

    /// Combine command-line arguments with the configured defaults
    ///
    /// Without any configured output the report lands next to the archive.
    pub fn report_settings(&self, archive: &Path, overrides: ReportOverrides) -> ReportSettings {
        let configured = self.report.clone().unwrap_or_default();

        let output = overrides
            .output
            .or(configured.output)
            .unwrap_or_else(|| archive.with_file_name(DEFAULT_REPORT_NAME));

        let grouping = if overrides.group_by_rate || configured.group_by_rate.unwrap_or(false) {
            SummaryGrouping::TaxCodesAndRate
        } else {
            SummaryGrouping::TaxCodes
        };

        let report = overrides
            .currency_format
            .or(configured.currency_format)
            .map_or_else(ReportOptions::default, |currency_format| ReportOptions {
                currency_format,
            });

        ReportSettings {
            output,
            options: ProcessOptions { grouping, report },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfce_report::DEFAULT_CURRENCY_FORMAT;
    use tempfile::TempDir;

    fn report_config(
        output: Option<&str>,
        currency_format: Option<&str>,
        group_by_rate: Option<bool>,
    ) -> Config {
        Config {
            report: Some(ReportConfig {
                output: output.map(PathBuf::from),
                currency_format: currency_format.map(str::to_string),
                group_by_rate,
            }),
        }
    }

    #[test]
    fn test_parse_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[report]\noutput = \"saida.xlsx\"\ngroup_by_rate = true\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config, report_config(Some("saida.xlsx"), None, Some(true)));
    }

    #[test]
    fn test_empty_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "").unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[report]\ngroup_by_rate = \"maybe\"\n").unwrap();

        assert!(Config::load_from_file(&path).is_err());
    }

    #[test]
    fn test_project_overrides_user_per_field() {
        let user = report_config(Some("user.xlsx"), Some("0.00"), Some(true));
        let project = report_config(Some("project.xlsx"), None, None);

        let merged = Config::merge(Some(user), Some(project));
        assert_eq!(
            merged,
            report_config(Some("project.xlsx"), Some("0.00"), Some(true))
        );
    }

    #[test]
    fn test_merge_without_configs() {
        assert_eq!(Config::merge(None, None), Config::default());
        assert_eq!(
            Config::merge(None, Some(Config::default())),
            Config::default()
        );
    }

    #[test]
    fn test_default_settings() {
        let settings =
            Config::default().report_settings(Path::new("lotes/marco.zip"), ReportOverrides::default());

        assert_eq!(settings.output, Path::new("lotes").join(DEFAULT_REPORT_NAME));
        assert_eq!(settings.options.grouping, SummaryGrouping::TaxCodes);
        assert_eq!(
            settings.options.report.currency_format,
            DEFAULT_CURRENCY_FORMAT
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = report_config(Some("config.xlsx"), Some("0.00"), Some(false));
        let overrides = ReportOverrides {
            output: Some(PathBuf::from("cli.xlsx")),
            currency_format: Some("#,##0.000".into()),
            group_by_rate: true,
        };

        let settings = config.report_settings(Path::new("a.zip"), overrides);
        assert_eq!(settings.output, PathBuf::from("cli.xlsx"));
        assert_eq!(settings.options.grouping, SummaryGrouping::TaxCodesAndRate);
        assert_eq!(settings.options.report.currency_format, "#,##0.000");
    }

    #[test]
    fn test_config_fills_missing_arguments() {
        let config = report_config(Some("config.xlsx"), Some("0.00"), Some(true));

        let settings = config.report_settings(Path::new("a.zip"), ReportOverrides::default());
        assert_eq!(settings.output, PathBuf::from("config.xlsx"));
        assert_eq!(settings.options.grouping, SummaryGrouping::TaxCodesAndRate);
        assert_eq!(settings.options.report.currency_format, "0.00");
    }
}
