use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::api::Query;

const FIELD_PREFIX: &str = "filter-";

/// A filter the transactions endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterParam {
    Status,
    TransactionType,
    Category,
    Subcategory,
    DateFrom,
    DateTo,
    AmountMin,
    AmountMax,
    Search
}

impl FilterParam {
    pub const ALL: [FilterParam; 9] = [
        Self::Status,
        Self::TransactionType,
        Self::Category,
        Self::Subcategory,
        Self::DateFrom,
        Self::DateTo,
        Self::AmountMin,
        Self::AmountMax,
        Self::Search
    ];

    /// The query key the service expects.
    pub fn canonical(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::TransactionType => "transaction_type",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::DateFrom => "date_from",
            Self::DateTo => "date_to",
            Self::AmountMin => "amount_min",
            Self::AmountMax => "amount_max",
            Self::Search => "search"
        }
    }

    /// Resolves a filter input id (`filter-date-from`, `type`) or a canonical key.
    pub fn from_field_id(id: &str) -> Option<Self> {
        let id = id.trim();
        let id = id.strip_prefix(FIELD_PREFIX).unwrap_or(id);

        match id {
            "type" => Some(Self::TransactionType),
            "date-from" => Some(Self::DateFrom),
            "date-to" => Some(Self::DateTo),
            "amount-min" => Some(Self::AmountMin),
            "amount-max" => Some(Self::AmountMax),
            canonical => Self::ALL.into_iter().find(|param| param.canonical() == canonical)
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, Self::DateFrom | Self::DateTo)
    }
}

/// The active list filters. Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    values: BTreeMap<FilterParam, String>
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from raw `(field id, value)` pairs as a filter bar yields them.
    pub fn from_inputs<I, K, V>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>
    {
        let mut state = Self::new();

        for (id, value) in inputs {
            match FilterParam::from_field_id(id.as_ref()) {
                Some(param) => state.set(param, value),
                None => debug!("Ignoring unknown filter field [{}]", id.as_ref())
            }
        }

        state
    }

    /// Rebuilds a state from canonical query pairs.
    pub fn from_query(query: &Query) -> Self {
        Self::from_inputs(query)
    }

    /// Trims and stores `value`; dates are normalized, an empty value clears the filter.
    pub fn set(&mut self, param: FilterParam, value: impl AsRef<str>) {
        let value = value.as_ref().trim();

        if value.is_empty() {
            self.values.remove(&param);
            return;
        }

        let value = if param.is_date() { normalize_date(value) } else { value.to_string() };
        self.values.insert(param, value);
    }

    pub fn get(&self, param: FilterParam) -> Option<&str> {
        self.values.get(&param).map(String::as_str)
    }

    pub fn clear(&mut self, param: FilterParam) {
        self.values.remove(&param);
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_query(&self) -> Query {
        self.values.iter()
            .map(|(param, value)| (param.canonical().to_string(), value.clone()))
            .collect()
    }
}

/// Rewrites `DD.MM.YYYY` as `YYYY-MM-DD`. Anything without a dot is returned as is,
/// as is a dotted value that is not a 1-2 digit day and month and a 4 digit year.
pub fn normalize_date(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }

    let parts: Vec<&str> = value.split('.').collect();

    match parts.as_slice() {
        [day, month, year] if is_digits(day, 1..=2) && is_digits(month, 1..=2) && is_digits(year, 4..=4) => {
            format!("{year}-{month:0>2}-{day:0>2}")
        }
        _ => {
            warn!("Date filter [{value}] is not DD.MM.YYYY, passing it through unchanged");
            value.to_string()
        }
    }
}

fn is_digits(part: &str, len: RangeInclusive<usize>) -> bool {
    len.contains(&part.len()) && part.chars().all(|c| c.is_ascii_digit())
}
