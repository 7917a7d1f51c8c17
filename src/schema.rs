use crate::error::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Investment Factsheet";
pub const DEFAULT_EXPLANATION_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_EXPLANATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DISCLOSURE: &str = "No disclosures found.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrowthSeries {
    pub name: String,
    /// One value per entry of [`ReportData::time_axis`].
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceRow {
    #[serde(rename = "return")]
    pub ret: f64,
    pub std_dev: f64,
    pub information_ratio: f64,
}

impl PerformanceRow {
    /// The row as printed on the factsheet: values in column order, space separated.
    pub fn to_line(&self) -> String {
        [self.ret, self.std_dev, self.information_ratio]
            .iter()
            .map(|v| crate::utils::format_number(*v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Exposure {
    pub label: String,
    /// Percentage of the portfolio. Values are not required to sum to 100.
    pub value: f64,
}

impl Exposure {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearlyPerformance {
    pub year: String,
    pub value: f64,
}

/// Canonical, fully defaulted data model consumed by chart rendering and assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportData {
    pub time_axis: Vec<String>,
    pub growth_series: Vec<GrowthSeries>,
    pub performance_rows: Vec<PerformanceRow>,
    pub regional_exposure: Vec<Exposure>,
    pub sector_exposure: Vec<Exposure>,
    pub yearly_performance: Vec<YearlyPerformance>,
    pub disclosures: Vec<String>,
}

/// Names of the three required performance columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PerformanceColumns {
    #[schemars(description = "Column holding the portfolio return")]
    pub ret: String,
    #[schemars(description = "Column holding the standard deviation")]
    pub std_dev: String,
    #[schemars(description = "Column holding the information ratio")]
    pub information_ratio: String,
}

impl Default for PerformanceColumns {
    fn default() -> Self {
        Self {
            ret: "Return".to_string(),
            std_dev: "Std Dev".to_string(),
            information_ratio: "Information Ratio".to_string(),
        }
    }
}

/// A label column paired with a value column, plus the literal default used
/// when the columns are absent from the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryField {
    pub label_column: String,
    pub value_column: String,
    pub default_labels: Vec<String>,
    pub default_values: Vec<f64>,
}

impl CategoryField {
    fn new(label_column: &str, value_column: &str, labels: &[&str], values: &[f64]) -> Self {
        Self {
            label_column: label_column.to_string(),
            value_column: value_column.to_string(),
            default_labels: labels.iter().map(|l| l.to_string()).collect(),
            default_values: values.to_vec(),
        }
    }

    pub fn default_pairs(&self) -> Vec<(String, f64)> {
        self.default_labels
            .iter()
            .cloned()
            .zip(self.default_values.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextField {
    pub column: String,
    pub default: Vec<String>,
}

/// Where each logical report field comes from and what it falls back to.
///
/// Resolved once per normalization so the default table can be audited
/// without going through rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ColumnMapping {
    #[schemars(description = "Column holding the time labels shared by all growth series")]
    pub time: String,
    #[schemars(description = "Every column whose name starts with this prefix is a growth series")]
    pub growth_prefix: String,
    pub performance: PerformanceColumns,
    pub regional: CategoryField,
    pub sector: CategoryField,
    pub yearly: CategoryField,
    pub disclosures: TextField,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            time: "Time".to_string(),
            growth_prefix: "Investment Growth".to_string(),
            performance: PerformanceColumns::default(),
            regional: CategoryField::new(
                "Regions",
                "Regional Exposure",
                &["North America", "Asia", "Europe"],
                &[40.0, 35.0, 25.0],
            ),
            sector: CategoryField::new(
                "Sectors",
                "Sector Exposure",
                &["Energy", "Technology", "Healthcare"],
                &[30.0, 50.0, 20.0],
            ),
            yearly: CategoryField::new(
                "Year",
                "Yearly Performance",
                &["2013", "2014", "2015", "2016", "2017"],
                &[5.0, 10.0, 15.0, 7.0, 20.0],
            ),
            disclosures: TextField {
                column: "Disclosures".to_string(),
                default: vec![DEFAULT_DISCLOSURE.to_string()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FactsheetConfig {
    #[schemars(description = "Centered title printed at the top of the first page")]
    pub title: String,
    pub columns: ColumnMapping,
    #[schemars(description = "Gemini model used for the factsheet explanation")]
    pub explanation_model: String,
    #[schemars(description = "Seconds to wait for the explanation before giving up")]
    pub explanation_timeout_secs: u64,
}

impl Default for FactsheetConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            columns: ColumnMapping::default(),
            explanation_model: DEFAULT_EXPLANATION_MODEL.to_string(),
            explanation_timeout_secs: DEFAULT_EXPLANATION_TIMEOUT_SECS,
        }
    }
}

impl FactsheetConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FactsheetConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
