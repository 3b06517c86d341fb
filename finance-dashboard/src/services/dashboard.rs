//! The rendered view model, assembled once at startup.

use crate::config::DataSettings;
use crate::locale::{Locale, Text};
use crate::services::charts::{self, ChartError, ChartSpec};
use crate::services::datasets::{Datasets, LoadIssue, MonthlyTable, MONTH_COLUMN};
use crate::services::summary::FinancialSummary;

const CURRENCY_PREFIX: &str = "EUR ";
const MISSING_VALUE: &str = "—";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub icon: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ChartSection {
    pub title: &'static str,
    pub charts: Vec<ChartSpec>,
    /// Localized messages for charts that could not be built.
    pub errors: Vec<String>,
    /// Single full-width chart instead of a two-column row.
    pub wide: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DetailTable {
    fn from_table(table: &MonthlyTable, locale: Locale) -> Self {
        let mut headers = vec![MONTH_COLUMN.to_string()];
        headers.extend(table.columns.iter().cloned());

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.month.clone()];
                cells.extend(row.values.iter().map(|v| match v {
                    Some(x) => locale.format_amount(*x),
                    None => String::new(),
                }));
                cells
            })
            .collect();

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub metrics: Vec<MetricCard>,
    pub sections: Vec<ChartSection>,
    /// Localized load problems, shown above the charts.
    pub issues: Vec<String>,
    pub expense_details: DetailTable,
}

impl Dashboard {
    pub fn build(datasets: &Datasets, settings: &DataSettings, locale: Locale) -> Self {
        let summary = FinancialSummary::compute(datasets, settings.initial_investment);

        let issues = datasets
            .issues
            .iter()
            .map(|issue| match issue {
                LoadIssue::MissingFile(path) => locale.missing_file(&path.display().to_string()),
            })
            .collect();

        let trend = section(
            locale.text(Text::TrendSection),
            false,
            locale,
            vec![
                chart_if_loaded(&datasets.investments, |t| charts::invested_value(t, locale)),
                chart_if_loaded(&datasets.income, |t| charts::income_trend(t, locale)),
            ],
        );

        let comparison = section(
            locale.text(Text::ComparisonSection),
            false,
            locale,
            vec![
                chart_if_loaded(&datasets.investments, |t| {
                    charts::investments_vs_returns(t, locale)
                }),
                chart_if_loaded(&datasets.income, |t| charts::income_comparison(t, locale)),
            ],
        );

        let expenses = section(
            locale.text(Text::ExpensesSection),
            true,
            locale,
            vec![chart_if_loaded(&datasets.expenses, |t| {
                Ok(charts::expenses_vs_ideal(t, &settings.ideal_expense_shares, locale))
            })],
        );

        Self {
            metrics: metric_cards(&summary, locale),
            sections: vec![trend, comparison, expenses],
            issues,
            expense_details: DetailTable::from_table(&datasets.expenses, locale),
        }
    }

    pub fn chart_count(&self) -> usize {
        self.sections.iter().map(|s| s.charts.len()).sum()
    }
}

/// `None` when the table was never loaded; that is reported as a load issue.
fn chart_if_loaded<F>(table: &MonthlyTable, build: F) -> Option<Result<ChartSpec, ChartError>>
where
    F: FnOnce(&MonthlyTable) -> Result<ChartSpec, ChartError>,
{
    if table.columns.is_empty() {
        None
    } else {
        Some(build(table))
    }
}

fn section(
    title: &'static str,
    wide: bool,
    locale: Locale,
    results: Vec<Option<Result<ChartSpec, ChartError>>>,
) -> ChartSection {
    let mut charts = Vec::new();
    let mut errors = Vec::new();

    for result in results.into_iter().flatten() {
        match result {
            Ok(chart) => charts.push(chart),
            Err(e) => {
                tracing::error!(error = %e, "Chart could not be built");
                errors.push(e.localized(locale));
            }
        }
    }

    ChartSection {
        title,
        charts,
        errors,
        wide,
    }
}

fn currency(value: Option<f64>, locale: Locale) -> String {
    match value {
        Some(v) => format!("{}{}", CURRENCY_PREFIX, locale.format_amount(v)),
        None => MISSING_VALUE.to_string(),
    }
}

fn metric_cards(summary: &FinancialSummary, locale: Locale) -> Vec<MetricCard> {
    vec![
        MetricCard {
            label: locale.text(Text::AccountBalance),
            icon: "🏦",
            value: currency(summary.account_balance, locale),
        },
        MetricCard {
            label: locale.text(Text::TotalInvested),
            icon: "💎",
            value: currency(summary.total_invested, locale),
        },
        MetricCard {
            label: locale.text(Text::AverageGrossIncome),
            icon: "📊",
            value: currency(summary.average_gross_income, locale),
        },
        MetricCard {
            label: locale.text(Text::AverageExpenses),
            icon: "💳",
            value: currency(summary.average_expenses, locale),
        },
    ]
}
