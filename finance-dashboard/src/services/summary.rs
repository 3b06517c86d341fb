use crate::services::datasets::{mean, sum, Datasets, MonthlyTable};

pub const BALANCE_COLUMN: &str = "Saldo Inicial";
pub const GROSS_INCOME_COLUMN: &str = "Renda Bruta";

/// Headline figures shown above the charts. `None` when the inputs are missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialSummary {
    pub account_balance: Option<f64>,
    pub total_invested: Option<f64>,
    pub average_gross_income: Option<f64>,
    pub average_expenses: Option<f64>,
}

impl FinancialSummary {
    pub fn compute(datasets: &Datasets, initial_investment: f64) -> Self {
        Self {
            account_balance: datasets.balance.last(BALANCE_COLUMN),
            total_invested: total_invested(&datasets.investments, initial_investment),
            average_gross_income: datasets
                .income
                .column(GROSS_INCOME_COLUMN)
                .and_then(|values| mean(&values)),
            average_expenses: average_monthly_expenses(&datasets.expenses),
        }
    }
}

/// Expense columns that hold amounts. Columns ending in `%` are the monthly
/// composition and are not money.
pub fn expense_amount_columns(expenses: &MonthlyTable) -> Vec<&str> {
    expenses
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !c.trim_end().ends_with('%'))
        .collect()
}

/// Mean over months of each month's total spending.
pub fn average_monthly_expenses(expenses: &MonthlyTable) -> Option<f64> {
    if expenses.is_empty() {
        return None;
    }

    let amount_columns = expense_amount_columns(expenses);
    let monthly_totals: Vec<Option<f64>> = expenses
        .rows
        .iter()
        .map(|row| {
            let total = expenses
                .columns
                .iter()
                .zip(&row.values)
                .filter(|(column, _)| amount_columns.contains(&column.as_str()))
                .filter_map(|(_, value)| *value)
                .sum::<f64>();
            Some(total)
        })
        .collect();

    mean(&monthly_totals)
}

/// Every contribution across all investment columns, plus what was invested
/// before tracking started.
pub fn total_invested(investments: &MonthlyTable, initial_investment: f64) -> Option<f64> {
    if investments.columns.is_empty() {
        return None;
    }

    let contributed: f64 = investments
        .columns
        .iter()
        .filter_map(|c| investments.column(c))
        .map(|values| sum(&values))
        .sum();

    Some(contributed + initial_investment)
}
