use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::Variant;
use crate::normalize::Field;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// Extra header aliases: source label → canonical field name.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_general_path")]
    pub general_path: PathBuf,
    #[serde(default = "default_direct_path")]
    pub direct_path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            general_path: default_general_path(),
            direct_path: default_direct_path(),
        }
    }
}

fn default_general_path() -> PathBuf {
    PathBuf::from("./data/labor_costs.sqlite")
}
fn default_direct_path() -> PathBuf {
    PathBuf::from("./data/direct_labor.sqlite")
}

impl DbConfig {
    pub fn path_for(&self, variant: Variant) -> &Path {
        match variant {
            Variant::General => &self.general_path,
            Variant::Direct => &self.direct_path,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeConfig {
    #[serde(default = "default_work_hours")]
    pub default_work_hours: f64,
    #[serde(default = "default_weeks_per_month")]
    pub weeks_per_month: f64,
    #[serde(default = "default_overtime_multiplier")]
    pub overtime_multiplier: f64,
    #[serde(default = "default_productivity")]
    pub default_productivity: f64,
    #[serde(default = "default_payment_day")]
    pub payment_day: u32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            default_work_hours: default_work_hours(),
            weeks_per_month: default_weeks_per_month(),
            overtime_multiplier: default_overtime_multiplier(),
            default_productivity: default_productivity(),
            payment_day: default_payment_day(),
        }
    }
}

fn default_work_hours() -> f64 {
    40.0
}
fn default_weeks_per_month() -> f64 {
    4.33
}
fn default_overtime_multiplier() -> f64 {
    1.5
}
fn default_productivity() -> f64 {
    100.0
}
fn default_payment_day() -> u32 {
    25
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,
    #[serde(default = "default_currency_unit")]
    pub currency_unit: String,
    #[serde(default = "default_general_output")]
    pub general_output: PathBuf,
    #[serde(default = "default_direct_output")]
    pub direct_output: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            trend_months: default_trend_months(),
            currency_unit: default_currency_unit(),
            general_output: default_general_output(),
            direct_output: default_direct_output(),
        }
    }
}

fn default_trend_months() -> usize {
    12
}
fn default_currency_unit() -> String {
    "KRW".to_string()
}
fn default_general_output() -> PathBuf {
    PathBuf::from("./reports/labor_cost_report.xlsx")
}
fn default_direct_output() -> PathBuf {
    PathBuf::from("./reports/direct_labor_report.xlsx")
}

impl ReportConfig {
    pub fn output_for(&self, variant: Variant) -> &Path {
        match variant {
            Variant::General => &self.general_output,
            Variant::Direct => &self.direct_output,
        }
    }
}

/// Load and validate a TOML config file.
///
/// A missing file is not an error: the built-in defaults are used so that
/// `paypulse load payroll.xlsx` works without any setup.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let n = &config.normalize;
    if n.default_work_hours <= 0.0 {
        anyhow::bail!("normalize.default_work_hours must be > 0");
    }
    if n.weeks_per_month <= 0.0 {
        anyhow::bail!("normalize.weeks_per_month must be > 0");
    }
    if n.overtime_multiplier <= 0.0 {
        anyhow::bail!("normalize.overtime_multiplier must be > 0");
    }
    if !(1..=31).contains(&n.payment_day) {
        anyhow::bail!("normalize.payment_day must be in [1, 31]");
    }

    if config.report.trend_months == 0 {
        anyhow::bail!("report.trend_months must be >= 1");
    }

    for (label, canonical) in &config.aliases {
        if Field::from_canonical(canonical).is_none() {
            anyhow::bail!(
                "aliases.\"{}\" maps to unknown field '{}'",
                label,
                canonical
            );
        }
    }

    if config.db.general_path == config.db.direct_path {
        anyhow::bail!("db.general_path and db.direct_path must point to different files");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.normalize.payment_day, 25);
        assert_eq!(config.report.trend_months, 12);
        assert_eq!(
            config.db.path_for(Variant::Direct),
            Path::new("./data/direct_labor.sqlite")
        );
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = parse(
            r#"
            [db]
            general_path = "/tmp/g.sqlite"

            [report]
            currency_unit = "EUR"
            "#,
        )
        .unwrap();
        assert_eq!(config.db.general_path, PathBuf::from("/tmp/g.sqlite"));
        assert_eq!(config.report.currency_unit, "EUR");
        assert_eq!(config.report.trend_months, 12);
    }

    #[test]
    fn rejects_unknown_alias_target() {
        let err = parse(
            r#"
            [aliases]
            "Emp No" = "employee_number"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("employee_number"));
    }

    #[test]
    fn rejects_zero_trend_window() {
        assert!(parse("[report]\ntrend_months = 0\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/paypulse.toml")).unwrap();
        assert_eq!(config.normalize.default_work_hours, 40.0);
    }
}
