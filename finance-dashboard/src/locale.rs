//! User-facing strings. Portuguese is the default; English is available for
//! deployments that configure `access.locale: en`.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR", alias = "pt")]
    PtBr,
    #[serde(rename = "en")]
    En,
}

impl Locale {
    pub fn html_lang(self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::En => "en",
        }
    }

    pub fn greeting(self, name: &str) -> String {
        match self {
            Locale::PtBr => format!("Bem-vindo {}!", name),
            Locale::En => format!("Welcome {}!", name),
        }
    }

    pub fn denial_message(self) -> &'static str {
        match self {
            Locale::PtBr => "Você não tem permissão para acessar este app.",
            Locale::En => "You do not have permission to access this app.",
        }
    }

    pub fn sign_out(self) -> &'static str {
        match self {
            Locale::PtBr => "Sair",
            Locale::En => "Sign out",
        }
    }

    pub fn page_title(self) -> &'static str {
        match self {
            Locale::PtBr => "Resumo Financeiro",
            Locale::En => "Financial Summary",
        }
    }

    pub fn missing_file(self, path: &str) -> String {
        match self {
            Locale::PtBr => format!("Arquivo não encontrado: {}", path),
            Locale::En => format!("File not found: {}", path),
        }
    }

    pub fn missing_column(self, column: &str, available: &[String]) -> String {
        match self {
            Locale::PtBr => format!(
                "Coluna '{}' não encontrada. Colunas disponíveis: {:?}",
                column, available
            ),
            Locale::En => format!(
                "Column '{}' not found. Available columns: {:?}",
                column, available
            ),
        }
    }

    pub fn text(self, key: Text) -> &'static str {
        match (self, key) {
            (Locale::PtBr, Text::HeadlineSection) => "Indicadores Principais",
            (Locale::En, Text::HeadlineSection) => "Key Indicators",
            (Locale::PtBr, Text::TrendSection) => "Análise Temporal",
            (Locale::En, Text::TrendSection) => "Trends",
            (Locale::PtBr, Text::ComparisonSection) => "Análise Comparativa",
            (Locale::En, Text::ComparisonSection) => "Comparisons",
            (Locale::PtBr, Text::ExpensesSection) => "Visão Completa dos Gastos",
            (Locale::En, Text::ExpensesSection) => "Spending Overview",
            (Locale::PtBr, Text::ShowDetails) => "Visualizar Dados Detalhados",
            (Locale::En, Text::ShowDetails) => "Show detailed data",
            (Locale::PtBr, Text::AccountBalance) => "Valor em Conta",
            (Locale::En, Text::AccountBalance) => "Account Balance",
            (Locale::PtBr, Text::TotalInvested) => "Total Investido",
            (Locale::En, Text::TotalInvested) => "Total Invested",
            (Locale::PtBr, Text::AverageGrossIncome) => "Renda Bruta Média",
            (Locale::En, Text::AverageGrossIncome) => "Average Gross Income",
            (Locale::PtBr, Text::AverageExpenses) => "Gastos Médios",
            (Locale::En, Text::AverageExpenses) => "Average Expenses",
            (Locale::PtBr, Text::InvestedChart) => "Evolução do Valor Investido",
            (Locale::En, Text::InvestedChart) => "Invested Value Over Time",
            (Locale::PtBr, Text::IncomeTrendChart) => "Renda Bruta vs Renda Disponível",
            (Locale::En, Text::IncomeTrendChart) => "Gross vs Available Income",
            (Locale::PtBr, Text::InvestmentsChart) => "Investimentos vs Rendimentos",
            (Locale::En, Text::InvestmentsChart) => "Investments vs Returns",
            (Locale::PtBr, Text::IncomeComparisonChart) => "Comparação Completa de Rendas",
            (Locale::En, Text::IncomeComparisonChart) => "Income Comparison",
            (Locale::PtBr, Text::ExpensesChart) => "Gastos vs Ideal",
            (Locale::En, Text::ExpensesChart) => "Spending vs Ideal",
            (_, Text::IdealLabel) => "Ideal",
        }
    }

    /// Formats an amount with two decimals and locale digit grouping.
    pub fn format_amount(self, value: f64) -> String {
        let (group, decimal) = match self {
            Locale::PtBr => ('.', ','),
            Locale::En => (',', '.'),
        };

        let formatted = format!("{:.2}", value.abs());
        let (integer, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (i, digit) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push(group);
            }
            grouped.push(digit);
        }

        let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
        format!("{}{}{}{}", sign, grouped, decimal, fraction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    HeadlineSection,
    TrendSection,
    ComparisonSection,
    ExpensesSection,
    ShowDetails,
    AccountBalance,
    TotalInvested,
    AverageGrossIncome,
    AverageExpenses,
    InvestedChart,
    IncomeTrendChart,
    InvestmentsChart,
    IncomeComparisonChart,
    ExpensesChart,
    IdealLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_per_locale() {
        assert_eq!(Locale::En.format_amount(2710.74), "2,710.74");
        assert_eq!(Locale::PtBr.format_amount(2710.74), "2.710,74");
        assert_eq!(Locale::En.format_amount(-1234567.891), "-1,234,567.89");
        assert_eq!(Locale::En.format_amount(12.5), "12.50");
        assert_eq!(Locale::PtBr.format_amount(-0.001), "0,00");
    }

    #[test]
    fn greeting_includes_name() {
        assert_eq!(Locale::PtBr.greeting("A"), "Bem-vindo A!");
        assert_eq!(Locale::En.greeting("A"), "Welcome A!");
    }

    #[test]
    fn deserializes_locale_tags() {
        let locale: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(locale, Locale::En);
        let locale: Locale = serde_json::from_str("\"pt-BR\"").unwrap();
        assert_eq!(locale, Locale::PtBr);
    }
}
