use crate::error::{FactsheetError, Result};
use crate::ingestion::{Cell, Column, RawTable};
use crate::schema::{
    CategoryField, ColumnMapping, Exposure, GrowthSeries, PerformanceRow, ReportData, TextField,
    YearlyPerformance,
};
use log::{debug, warn};

const UNLABELLED: &str = "Unlabelled";

/// Maps an uploaded table onto the canonical [`ReportData`] model.
///
/// The performance columns are required; every other field falls back to the
/// literal defaults in `mapping` when its columns are absent. No range or
/// percentage validation is performed.
pub fn normalize(table: &RawTable, mapping: &ColumnMapping) -> Result<ReportData> {
    debug!(
        "Normalizing table with {} columns and {} rows",
        table.columns().len(),
        table.row_count()
    );

    let performance_rows = resolve_performance(table, mapping)?;
    let (time_axis, growth_series) = resolve_growth(table, mapping)?;

    let regional_exposure = resolve_category(table, &mapping.regional)?
        .into_iter()
        .map(|(label, value)| Exposure::new(label, value))
        .collect();
    let sector_exposure = resolve_category(table, &mapping.sector)?
        .into_iter()
        .map(|(label, value)| Exposure::new(label, value))
        .collect();
    let yearly_performance = resolve_category(table, &mapping.yearly)?
        .into_iter()
        .map(|(year, value)| YearlyPerformance { year, value })
        .collect();

    let disclosures = resolve_disclosures(table, &mapping.disclosures);

    Ok(ReportData {
        time_axis,
        growth_series,
        performance_rows,
        regional_exposure,
        sector_exposure,
        yearly_performance,
        disclosures,
    })
}

fn required_column<'a>(table: &'a RawTable, name: &str) -> Result<&'a Column> {
    table
        .column(name)
        .ok_or_else(|| FactsheetError::MissingRequiredColumn(name.to_string()))
}

fn numeric_cell(column: &Column, row: usize) -> Result<f64> {
    let cell = &column.cells[row];
    cell.as_f64().ok_or_else(|| FactsheetError::MalformedRow {
        column: column.name.clone(),
        row: row + 1,
        value: cell.to_string(),
    })
}

fn resolve_performance(table: &RawTable, mapping: &ColumnMapping) -> Result<Vec<PerformanceRow>> {
    let ret = required_column(table, &mapping.performance.ret)?;
    let std_dev = required_column(table, &mapping.performance.std_dev)?;
    let information_ratio = required_column(table, &mapping.performance.information_ratio)?;

    let mut rows = Vec::new();
    for row in 0..table.row_count() {
        let padding = [ret, std_dev, information_ratio]
            .iter()
            .all(|c| c.cells[row].is_empty());
        if padding {
            continue;
        }

        rows.push(PerformanceRow {
            ret: numeric_cell(ret, row)?,
            std_dev: numeric_cell(std_dev, row)?,
            information_ratio: numeric_cell(information_ratio, row)?,
        });
    }

    Ok(rows)
}

fn resolve_growth(
    table: &RawTable,
    mapping: &ColumnMapping,
) -> Result<(Vec<String>, Vec<GrowthSeries>)> {
    let growth_columns: Vec<&Column> = table.columns_with_prefix(&mapping.growth_prefix).collect();

    let time_column = match table.column(&mapping.time) {
        Some(column) => column,
        None if growth_columns.is_empty() => {
            debug!("No '{}' or growth columns; growth chart will be empty", mapping.time);
            return Ok((Vec::new(), Vec::new()));
        }
        None => return Err(FactsheetError::MissingRequiredColumn(mapping.time.clone())),
    };

    let rows: Vec<usize> = (0..table.row_count())
        .filter(|&row| !time_column.cells[row].is_empty())
        .collect();

    let time_axis = rows
        .iter()
        .filter_map(|&row| time_column.cells[row].as_label())
        .collect();

    let mut series = Vec::with_capacity(growth_columns.len());
    for column in growth_columns {
        let values = rows
            .iter()
            .map(|&row| numeric_cell(column, row))
            .collect::<Result<Vec<f64>>>()?;
        series.push(GrowthSeries {
            name: column.name.clone(),
            values,
        });
    }

    debug!("Discovered {} growth series over {} points", series.len(), rows.len());
    Ok((time_axis, series))
}

fn resolve_category(table: &RawTable, field: &CategoryField) -> Result<Vec<(String, f64)>> {
    let labels = table.column(&field.label_column);
    let values = table.column(&field.value_column);

    match (labels, values) {
        (None, None) => {
            debug!(
                "Columns '{}'/'{}' absent, using default",
                field.label_column, field.value_column
            );
            Ok(field.default_pairs())
        }
        (Some(labels), Some(values)) => {
            let mut pairs = Vec::new();
            for row in 0..table.row_count() {
                let label = &labels.cells[row];
                let value = &values.cells[row];
                if label.is_empty() && value.is_empty() {
                    continue;
                }
                let value = match value {
                    Cell::Empty => 0.0,
                    _ => numeric_cell(values, row)?,
                };
                let label = label.as_label().unwrap_or_else(|| UNLABELLED.to_string());
                pairs.push((label, value));
            }
            Ok(pairs)
        }
        (Some(labels), None) => {
            let found: Vec<String> = labels.cells.iter().filter_map(Cell::as_label).collect();
            if found.len() == field.default_values.len() {
                debug!(
                    "Column '{}' absent, pairing labels with default values",
                    field.value_column
                );
                Ok(found
                    .into_iter()
                    .zip(field.default_values.iter().copied())
                    .collect())
            } else {
                warn!(
                    "Column '{}' absent and '{}' has {} entries (default has {}); using default",
                    field.value_column,
                    field.label_column,
                    found.len(),
                    field.default_values.len()
                );
                Ok(field.default_pairs())
            }
        }
        (None, Some(values)) => {
            let mut found = Vec::new();
            for row in 0..table.row_count() {
                if !values.cells[row].is_empty() {
                    found.push(numeric_cell(values, row)?);
                }
            }
            if found.len() == field.default_labels.len() {
                debug!(
                    "Column '{}' absent, pairing values with default labels",
                    field.label_column
                );
                Ok(field.default_labels.iter().cloned().zip(found).collect())
            } else {
                warn!(
                    "Column '{}' absent and '{}' has {} entries (default has {}); using default",
                    field.label_column,
                    field.value_column,
                    found.len(),
                    field.default_labels.len()
                );
                Ok(field.default_pairs())
            }
        }
    }
}

fn resolve_disclosures(table: &RawTable, field: &TextField) -> Vec<String> {
    match table.column(&field.column) {
        Some(column) => column.cells.iter().filter_map(Cell::as_label).collect(),
        None => {
            debug!("Column '{}' absent, using default disclosure", field.column);
            field.default.clone()
        }
    }
}
