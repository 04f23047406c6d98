use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The service's page envelope. `next`/`previous` are opaque absolute links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>
}

/// Aggregates returned by `transactions/summary/`, filtered like the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub summary: SummaryStats,
    #[serde(default)]
    pub by_type: Vec<TypeTotal>,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub average_amount: Option<Decimal>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotal {
    #[serde(rename = "transaction_type__name")]
    pub type_name: String,
    pub count: u64,
    #[serde(default)]
    pub total: Option<Decimal>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "category__name")]
    pub category_name: String,
    pub count: u64,
    #[serde(default)]
    pub total: Option<Decimal>
}

/// The figures shown next to the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub count: u64
}

impl Summary {
    /// Income and expense are the totals of the first type whose name contains the marker.
    pub fn totals(&self, income_marker: &str, expense_marker: &str) -> SummaryTotals {
        let total_of = |marker: &str| {
            self.by_type.iter()
                .find(|row| row.type_name.contains(marker))
                .and_then(|row| row.total)
                .unwrap_or_default()
        };

        let income = total_of(income_marker);
        let expense = total_of(expense_marker);

        SummaryTotals {
            income,
            expense,
            balance: income - expense,
            count: self.summary.total_count
        }
    }
}
