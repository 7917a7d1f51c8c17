//! # Factsheet Builder
//!
//! A library for turning a portfolio CSV into a three-page investment
//! factsheet: a growth chart and performance table, a regional/sector/yearly
//! breakdown, and the fund disclosures.
//!
//! ## Pipeline
//!
//! - **Ingestion**: CSV → [`RawTable`] with typed cells
//! - **Normalization**: [`RawTable`] → [`ReportData`], substituting the literal
//!   defaults in [`ColumnMapping`] for absent optional columns
//! - **Charts**: [`ReportData`] → [`ChartSet`], four SVG charts held in memory
//! - **Assembly**: fixed three-page [`ReportDocument`] layout
//! - **Export**: PDF bytes via `printpdf`, or an HTML preview
//!
//! With the `gemini` feature, [`llm::Explainer`] asks a hosted model for a
//! generic walkthrough of the factsheet sections.
//!
//! ## Example
//!
//! ```rust,ignore
//! use factsheet_builder::*;
//!
//! let table = RawTable::from_csv_path(std::path::Path::new("portfolio.csv"))?;
//! let factsheet = FactsheetGenerator::new(FactsheetConfig::default()).generate(&table)?;
//! std::fs::write(SUGGESTED_FILENAME, &factsheet.pdf)?;
//! ```

pub mod assembler;
pub mod charts;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod pdf;
pub mod preview;
pub mod schema;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use assembler::{assemble, Page, PageElement, Rect, ReportAssembler, ReportDocument, TextAlign};
pub use charts::{render_all, render_bar, render_growth, render_pie, ChartArtifact, ChartRole, ChartSet};
pub use error::{FactsheetError, Result};
pub use ingestion::{Cell, Column, RawTable};
pub use normalizer::normalize;
pub use pdf::{render_pdf, SUGGESTED_FILENAME};
pub use preview::render_preview;
pub use schema::*;

use log::info;

/// Output of one successful generation request.
#[derive(Debug, Clone)]
pub struct Factsheet {
    pub data: ReportData,
    pub document: ReportDocument,
    pub pdf: Vec<u8>,
}

/// Runs the normalize → render → assemble → export pipeline.
///
/// Each call owns its intermediate data; nothing is shared between calls, so
/// a failed generation leaves earlier results untouched.
pub struct FactsheetGenerator {
    config: FactsheetConfig,
}

impl FactsheetGenerator {
    pub fn new(config: FactsheetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactsheetConfig {
        &self.config
    }

    pub fn generate(&self, table: &RawTable) -> Result<Factsheet> {
        info!(
            "Generating factsheet '{}' from {} rows",
            self.config.title,
            table.row_count()
        );

        let data = normalize(table, &self.config.columns)?;
        let charts = render_all(&data)?;
        let document = ReportAssembler::new(self.config.title.clone()).assemble(&data, charts);
        let pdf = render_pdf(&document)?;

        Ok(Factsheet {
            data,
            document,
            pdf,
        })
    }

    pub fn preview(&self, table: &RawTable) -> Result<String> {
        let data = normalize(table, &self.config.columns)?;
        let charts = render_all(&data)?;
        info!("Rendering preview for '{}'", self.config.title);
        Ok(render_preview(&self.config.title, table, &data, &charts))
    }
}

impl Default for FactsheetGenerator {
    fn default() -> Self {
        Self::new(FactsheetConfig::default())
    }
}
