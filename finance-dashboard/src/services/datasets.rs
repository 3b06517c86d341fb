//! Monthly CSV tables behind the dashboard.
//!
//! Each file has a leading row-index column (ignored), a `mês` column with the
//! month label, and numeric columns. Empty cells are missing values and are
//! skipped by aggregates.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DataSettings;

pub const MONTH_COLUMN: &str = "mês";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no 'mês' column", path.display())]
    MissingMonthColumn { path: PathBuf },

    #[error("{} row {row}, column '{column}': '{value}' is not a number", path.display())]
    InvalidNumber {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthRow {
    pub month: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyTable {
    /// Numeric column names, in file order.
    pub columns: Vec<String>,
    pub rows: Vec<MonthRow>,
}

impl MonthlyTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn months(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.month.clone()).collect()
    }

    /// Values of `column` for every row, `None` where the cell was empty.
    pub fn column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Value of `column` in the last row.
    pub fn last(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.last().and_then(|r| r.values[idx])
    }

    pub fn round_values(mut self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        for row in &mut self.rows {
            for value in row.values.iter_mut().flatten() {
                *value = (*value * factor).round() / factor;
            }
        }
        self
    }
}

/// Sum of the present values.
pub fn sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Mean of the present values, `None` if there are none.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Reads one table. `Ok(None)` when the file does not exist.
pub fn load_table(path: &Path) -> Result<Option<MonthlyTable>, DatasetError> {
    if !path.is_file() {
        return Ok(None);
    }

    let read_err = |source: csv::Error| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    let headers = reader.headers().map_err(read_err)?.clone();

    // Column 0 is the row index.
    let month_idx = headers
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, h)| *h == MONTH_COLUMN)
        .map(|(i, _)| i)
        .ok_or_else(|| DatasetError::MissingMonthColumn {
            path: path.to_path_buf(),
        })?;

    let value_indices: Vec<usize> = (1..headers.len()).filter(|i| *i != month_idx).collect();
    let columns: Vec<String> = value_indices
        .iter()
        .map(|i| headers[*i].to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(read_err)?;

        let mut values = Vec::with_capacity(value_indices.len());
        for (idx, column) in value_indices.iter().zip(&columns) {
            let raw = record.get(*idx).unwrap_or("");
            if raw.is_empty() {
                values.push(None);
                continue;
            }
            let value = raw.parse::<f64>().map_err(|_| DatasetError::InvalidNumber {
                path: path.to_path_buf(),
                row: row_no + 1,
                column: column.clone(),
                value: raw.to_string(),
            })?;
            values.push(Some(value));
        }

        rows.push(MonthRow {
            month: record.get(month_idx).unwrap_or("").to_string(),
            values,
        });
    }

    Ok(Some(MonthlyTable {
        columns,
        rows,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    MissingFile(PathBuf),
}

/// The four tables the dashboard is built from.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub expenses: MonthlyTable,
    pub income: MonthlyTable,
    pub balance: MonthlyTable,
    pub investments: MonthlyTable,
    /// Files that were expected but absent. Their tables are empty.
    pub issues: Vec<LoadIssue>,
}

impl Datasets {
    pub fn load(settings: &DataSettings, directory: &Path) -> Result<Self, DatasetError> {
        let mut issues = Vec::new();

        let mut load = |name: &str, file: &str, round: bool| -> Result<MonthlyTable, DatasetError> {
            let path = directory.join(file);
            match load_table(&path)? {
                Some(table) => {
                    tracing::info!(table = name, rows = table.rows.len(), "Loaded dataset");
                    Ok(if round { table.round_values(2) } else { table })
                }
                None => {
                    tracing::error!(table = name, path = %path.display(), "Dataset file not found");
                    issues.push(LoadIssue::MissingFile(path));
                    Ok(MonthlyTable::default())
                }
            }
        };

        let expenses = load("expenses", &settings.expenses_file, true)?;
        let income = load("income", &settings.income_file, true)?;
        let balance = load("balance", &settings.balance_file, true)?;
        let investments = load("investments", &settings.investments_file, false)?;

        Ok(Self {
            expenses,
            income,
            balance,
            investments,
            issues,
        })
    }
}
