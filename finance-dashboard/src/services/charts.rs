//! Chart specifications.
//!
//! Every chart is a Plotly figure (`{"data": [...], "layout": {...}}`) built
//! from one table. The browser hands the JSON to plotly.js unchanged.

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::IdealShare;
use crate::locale::{Locale, Text};
use crate::services::datasets::{MonthlyTable, MONTH_COLUMN};

pub const INVESTED_COLUMN: &str = "Valor Aplicado";
pub const RETURNS_COLUMN: &str = "Rendimento";
pub const GROSS_INCOME_COLUMN: &str = "Renda Bruta";
pub const AVAILABLE_INCOME_COLUMN: &str = "Renda disponível";
pub const PROFIT_COLUMN: &str = "Lucro";

const PRIMARY_GOLD: &str = "#D4AF37";
const SECONDARY_BLUE: &str = "#1E3A8A";
const ACCENT_PURPLE: &str = "#7C3AED";
const DARK_BLUE: &str = "#0F172A";
const SOFT_PURPLE: &str = "#A78BFA";
const BRIGHT_GOLD: &str = "#FFD700";
const NAVY: &str = "#1E40AF";
const LAVENDER: &str = "#8B5CF6";
const BRONZE: &str = "#B45309";

const CATEGORY_PALETTE: [&str; 8] = [
    PRIMARY_GOLD,
    SECONDARY_BLUE,
    ACCENT_PURPLE,
    SOFT_PURPLE,
    BRIGHT_GOLD,
    NAVY,
    LAVENDER,
    BRONZE,
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("chart '{chart}' needs column '{column}'")]
    MissingColumn {
        chart: &'static str,
        column: String,
        available: Vec<String>,
    },
}

impl ChartError {
    pub fn localized(&self, locale: Locale) -> String {
        match self {
            ChartError::MissingColumn {
                column, available, ..
            } => locale.missing_column(column, available),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// DOM id of the chart container.
    pub id: &'static str,
    pub title: String,
    pub figure: Value,
}

impl ChartSpec {
    /// Figure JSON that is safe to embed inside a `<script>` element.
    pub fn figure_json(&self) -> String {
        self.figure
            .to_string()
            .replace('<', "\\u003c")
            .replace('>', "\\u003e")
            .replace('&', "\\u0026")
    }
}

fn require(
    table: &MonthlyTable,
    chart: &'static str,
    column: &str,
) -> Result<Vec<Option<f64>>, ChartError> {
    table
        .column(column)
        .ok_or_else(|| ChartError::MissingColumn {
            chart,
            column: column.to_string(),
            available: table.columns.clone(),
        })
}

fn base_layout(title: &str, height: u32) -> Value {
    json!({
        "title": { "text": title, "x": 0.5, "xanchor": "center", "font": { "color": PRIMARY_GOLD, "size": 18 } },
        "paper_bgcolor": "rgba(15, 23, 42, 0.95)",
        "plot_bgcolor": "rgba(30, 58, 138, 0.1)",
        "font": { "family": "Georgia, serif", "color": "#F8FAFC", "size": 12 },
        "height": height,
        "margin": { "t": 80, "b": 60, "l": 60, "r": 60 },
    })
}

fn extend(mut layout: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (layout.as_object_mut(), extra) {
        base.extend(extra);
    }
    layout
}

fn round1(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| v.map(|x| (x * 10.0).round() / 10.0))
        .collect()
}

/// Line chart of the amount applied to investments each month.
pub fn invested_value(investments: &MonthlyTable, locale: Locale) -> Result<ChartSpec, ChartError> {
    let invested = require(investments, "invested_value", INVESTED_COLUMN)?;
    let title = locale.text(Text::InvestedChart).to_string();

    let figure = json!({
        "data": [{
            "type": "scatter",
            "mode": "lines+markers",
            "name": INVESTED_COLUMN,
            "x": investments.months(),
            "y": invested,
            "line": { "color": PRIMARY_GOLD, "width": 4, "shape": "spline" },
            "marker": { "color": BRIGHT_GOLD, "size": 10, "symbol": "diamond", "line": { "color": DARK_BLUE, "width": 2 } },
            "fill": "tozeroy",
            "fillcolor": "rgba(212, 175, 55, 0.2)",
        }],
        "layout": base_layout(&title, 400),
    });

    Ok(ChartSpec {
        id: "invested-value",
        title,
        figure,
    })
}

/// Gross and available income per month.
pub fn income_trend(income: &MonthlyTable, locale: Locale) -> Result<ChartSpec, ChartError> {
    let gross = require(income, "income_trend", GROSS_INCOME_COLUMN)?;
    let available = require(income, "income_trend", AVAILABLE_INCOME_COLUMN)?;
    let months = income.months();
    let title = locale.text(Text::IncomeTrendChart).to_string();

    let figure = json!({
        "data": [
            {
                "type": "scatter",
                "mode": "lines+markers",
                "name": GROSS_INCOME_COLUMN,
                "x": months,
                "y": gross,
                "line": { "color": SECONDARY_BLUE, "width": 3, "shape": "spline" },
                "marker": { "color": NAVY, "size": 8, "symbol": "circle" },
            },
            {
                "type": "scatter",
                "mode": "lines+markers",
                "name": AVAILABLE_INCOME_COLUMN,
                "x": months,
                "y": available,
                "line": { "color": ACCENT_PURPLE, "width": 3, "shape": "spline" },
                "marker": { "color": LAVENDER, "size": 8, "symbol": "square" },
            },
        ],
        "layout": base_layout(&title, 400),
    });

    Ok(ChartSpec {
        id: "income-trend",
        title,
        figure,
    })
}

/// Grouped bars of money applied against returns earned.
pub fn investments_vs_returns(
    investments: &MonthlyTable,
    locale: Locale,
) -> Result<ChartSpec, ChartError> {
    let invested = require(investments, "investments_vs_returns", INVESTED_COLUMN)?;
    let returns = require(investments, "investments_vs_returns", RETURNS_COLUMN)?;
    let months = investments.months();
    let title = locale.text(Text::InvestmentsChart).to_string();

    let figure = json!({
        "data": [
            {
                "type": "bar",
                "name": INVESTED_COLUMN,
                "x": months,
                "y": invested,
                "opacity": 0.8,
                "marker": { "color": PRIMARY_GOLD, "line": { "color": DARK_BLUE, "width": 1.5 }, "pattern": { "shape": "/" } },
            },
            {
                "type": "bar",
                "name": RETURNS_COLUMN,
                "x": months,
                "y": returns,
                "opacity": 0.8,
                "marker": { "color": ACCENT_PURPLE, "line": { "color": DARK_BLUE, "width": 1.5 } },
            },
        ],
        "layout": extend(
            base_layout(&title, 400),
            json!({ "barmode": "group", "bargap": 0.15, "bargroupgap": 0.1 }),
        ),
    });

    Ok(ChartSpec {
        id: "investments-vs-returns",
        title,
        figure,
    })
}

/// Grouped income bars above a table with every income column.
pub fn income_comparison(income: &MonthlyTable, locale: Locale) -> Result<ChartSpec, ChartError> {
    let series = [
        (GROSS_INCOME_COLUMN, SECONDARY_BLUE),
        (AVAILABLE_INCOME_COLUMN, ACCENT_PURPLE),
        (PROFIT_COLUMN, PRIMARY_GOLD),
    ];
    let months = income.months();
    let title = locale.text(Text::IncomeComparisonChart).to_string();

    let mut data = Vec::with_capacity(series.len() + 1);
    for (column, color) in series {
        let values = require(income, "income_comparison", column)?;
        let labels: Vec<Option<String>> = values
            .iter()
            .map(|v| v.map(|x| format!("{:.2}", x)))
            .collect();
        data.push(json!({
            "type": "bar",
            "name": column,
            "x": months,
            "y": values,
            "text": labels,
            "textposition": "auto",
            "marker": {
                "color": color,
                "opacity": 0.8,
                "line": { "color": DARK_BLUE, "width": 1 },
            },
        }));
    }

    let mut header = vec![format!("<b>{}</b>", MONTH_COLUMN)];
    header.extend(income.columns.iter().map(|c| format!("<b>{}</b>", c)));

    let mut cells: Vec<Value> = vec![json!(months)];
    cells.extend(
        income
            .columns
            .iter()
            .filter_map(|c| income.column(c))
            .map(|values| json!(values)),
    );

    let row_fill: Vec<&str> = (0..income.rows.len())
        .map(|i| {
            if i % 2 == 0 {
                "rgba(212, 175, 55, 0.1)"
            } else {
                "rgba(124, 58, 237, 0.1)"
            }
        })
        .collect();

    data.push(json!({
        "type": "table",
        "domain": { "x": [0.0, 1.0], "y": [0.0, 0.27] },
        "header": {
            "values": header,
            "fill": { "color": SECONDARY_BLUE },
            "font": { "color": "white", "size": 12 },
            "align": "center",
        },
        "cells": {
            "values": cells,
            "fill": { "color": [row_fill] },
            "font": { "color": "white", "size": 11 },
            "align": "center",
            "height": 35,
        },
    }));

    let figure = json!({
        "data": data,
        "layout": extend(
            base_layout(&title, 700),
            json!({
                "barmode": "group",
                "showlegend": true,
                "yaxis": { "domain": [0.35, 1.0] },
                "margin": { "t": 100, "l": 50, "r": 50, "b": 50 },
            }),
        ),
    });

    Ok(ChartSpec {
        id: "income-comparison",
        title,
        figure,
    })
}

/// Stacked composition of spending per month, preceded by the target
/// composition in an `Ideal` bar. Categories absent from the table show only
/// in the ideal bar.
pub fn expenses_vs_ideal(
    expenses: &MonthlyTable,
    ideal: &[IdealShare],
    locale: Locale,
) -> ChartSpec {
    let ideal_label = locale.text(Text::IdealLabel).to_string();
    let title = locale.text(Text::ExpensesChart).to_string();

    let mut x = vec![ideal_label];
    x.extend(expenses.months());

    let data: Vec<Value> = ideal
        .iter()
        .enumerate()
        .map(|(i, share)| {
            let mut y = vec![Some(share.percent)];
            match expenses.column(&share.category) {
                Some(values) => y.extend(values),
                None => y.extend(std::iter::repeat(None).take(expenses.rows.len())),
            }
            json!({
                "type": "bar",
                "name": share.category.trim_end_matches(" %"),
                "x": x,
                "y": y,
                "text": round1(&y),
                "textposition": "inside",
                "textfont": { "color": "white", "size": 10 },
                "marker": {
                    "color": CATEGORY_PALETTE[i % CATEGORY_PALETTE.len()],
                    "line": { "color": DARK_BLUE, "width": 1 },
                },
            })
        })
        .collect();

    let figure = json!({
        "data": data,
        "layout": extend(
            base_layout(&title, 500),
            json!({
                "barmode": "stack",
                "bargap": 0.4,
                "legend": {
                    "orientation": "h",
                    "yanchor": "bottom",
                    "y": 1.02,
                    "xanchor": "right",
                    "x": 1,
                },
            }),
        ),
    });

    ChartSpec {
        id: "expenses-vs-ideal",
        title,
        figure,
    }
}
