use std::time::Duration;

use tracing::warn;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_PAGE_WINDOW: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_INCOME_MARKER: &str = "Пополнение";
const DEFAULT_EXPENSE_MARKER: &str = "Списание";

/// Per-screen client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the REST service; endpoint paths are joined onto it.
    pub base_url: String,
    pub page_size: u32,
    /// Maximum number of page buttons in the pagination strip.
    pub page_window: u32,
    pub request_timeout: Duration,
    /// Substring identifying the income transaction type in summaries.
    pub income_marker: String,
    /// Substring identifying the expense transaction type in summaries.
    pub expense_marker: String
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_window: DEFAULT_PAGE_WINDOW,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            income_marker: DEFAULT_INCOME_MARKER.to_string(),
            expense_marker: DEFAULT_EXPENSE_MARKER.to_string()
        }
    }
}

impl Settings {
    /// Defaults overridden by `CASHFLOW_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Unparsable or zero numbers keep the current value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>
    {
        if let Some(value) = lookup("CASHFLOW_BASE_URL").filter(|value| !value.trim().is_empty()) {
            self.base_url = value.trim().to_string();
        }

        if let Some(value) = positive("CASHFLOW_PAGE_SIZE", lookup("CASHFLOW_PAGE_SIZE")) {
            self.page_size = value;
        }

        if let Some(value) = positive("CASHFLOW_PAGE_WINDOW", lookup("CASHFLOW_PAGE_WINDOW")) {
            self.page_window = value;
        }

        if let Some(value) = positive("CASHFLOW_TIMEOUT_SECS", lookup("CASHFLOW_TIMEOUT_SECS")) {
            self.request_timeout = Duration::from_secs(u64::from(value));
        }

        if let Some(value) = lookup("CASHFLOW_INCOME_MARKER").filter(|value| !value.is_empty()) {
            self.income_marker = value;
        }

        if let Some(value) = lookup("CASHFLOW_EXPENSE_MARKER").filter(|value| !value.is_empty()) {
            self.expense_marker = value;
        }

        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_page_window(mut self, page_window: u32) -> Self {
        self.page_window = page_window.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_markers(mut self, income: impl Into<String>, expense: impl Into<String>) -> Self {
        self.income_marker = income.into();
        self.expense_marker = expense.into();
        self
    }
}

fn positive(key: &str, value: Option<String>) -> Option<u32> {
    let value = value?;

    match value.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => Some(parsed),
        _ => {
            warn!("Ignoring invalid value [{value}] for {key}");
            None
        }
    }
}
