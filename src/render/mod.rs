mod recording;

use async_trait::async_trait;

use crate::models::{LookupItem, LookupKind, LookupRow, Record, SummaryTotals};

pub use recording::{RecordingRenderer, RenderCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger"
        }
    }
}

/// A selectable widget fed from lookup data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Status,
    Type,
    Category,
    Subcategory
}

impl Level {
    /// Placeholder shown by a form select with nothing chosen.
    pub fn select_placeholder(self) -> &'static str {
        match self {
            Self::Status => "Select status...",
            Self::Type => "Select type...",
            Self::Category => "Select category...",
            Self::Subcategory => "Select subcategory..."
        }
    }

    /// Placeholder shown by a list filter select meaning "no restriction".
    pub fn filter_placeholder(self) -> &'static str {
        match self {
            Self::Status => "All statuses",
            Self::Type => "All types",
            Self::Category => "All categories",
            Self::Subcategory => "All subcategories"
        }
    }
}

/// Everything a pagination strip needs, fully computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
    /// Page numbers to show as buttons, ascending.
    pub window: Vec<u32>
}

/// The presentation layer. Controllers call it with fully computed data and
/// never touch markup themselves.
pub trait Renderer: Send + Sync + 'static {
    fn render_options(&self, level: Level, items: &[LookupItem], placeholder: &str, enabled: bool);
    fn render_records(&self, records: &[Record]);
    fn render_page_controls(&self, controls: &PageControls);
    fn render_summary(&self, totals: &SummaryTotals);
    fn render_lookup_rows(&self, kind: LookupKind, rows: &[LookupRow]);
    fn notify(&self, severity: Severity, message: &str);
}

/// Destructive actions wait on this before touching the network.
#[async_trait]
pub trait ConfirmGate: Send + Sync + 'static {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// A gate that always gives the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ConfirmGate for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
