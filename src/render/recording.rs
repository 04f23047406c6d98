use std::sync::{Mutex, MutexGuard};

use tracing::{error, info, warn};

use crate::models::{LookupItem, LookupKind, LookupRow, Record, SummaryTotals};
use crate::render::{Level, PageControls, Renderer, Severity};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Options {
        level: Level,
        items: Vec<LookupItem>,
        placeholder: String,
        enabled: bool
    },
    Records(Vec<Record>),
    PageControls(PageControls),
    Summary(SummaryTotals),
    LookupRows {
        kind: LookupKind,
        rows: Vec<LookupRow>
    },
    Notice {
        severity: Severity,
        message: String
    }
}

/// Keeps every render call in order. Used by headless front ends and tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The latest options rendered for `level` as `(items, enabled)`.
    pub fn last_options(&self, level: Level) -> Option<(Vec<LookupItem>, bool)> {
        self.lock().iter().rev().find_map(|call| match call {
            RenderCall::Options { level: rendered, items, enabled, .. } if *rendered == level => Some((items.clone(), *enabled)),
            _ => None
        })
    }

    pub fn last_records(&self) -> Option<Vec<Record>> {
        self.lock().iter().rev().find_map(|call| match call {
            RenderCall::Records(records) => Some(records.clone()),
            _ => None
        })
    }

    pub fn last_page_controls(&self) -> Option<PageControls> {
        self.lock().iter().rev().find_map(|call| match call {
            RenderCall::PageControls(controls) => Some(controls.clone()),
            _ => None
        })
    }

    pub fn last_summary(&self) -> Option<SummaryTotals> {
        self.lock().iter().rev().find_map(|call| match call {
            RenderCall::Summary(totals) => Some(*totals),
            _ => None
        })
    }

    pub fn last_lookup_rows(&self, kind: LookupKind) -> Option<Vec<LookupRow>> {
        self.lock().iter().rev().find_map(|call| match call {
            RenderCall::LookupRows { kind: rendered, rows } if *rendered == kind => Some(rows.clone()),
            _ => None
        })
    }

    pub fn notices(&self) -> Vec<(Severity, String)> {
        self.lock().iter().filter_map(|call| match call {
            RenderCall::Notice { severity, message } => Some((*severity, message.clone())),
            _ => None
        }).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RenderCall>> {
        // A panic while recording leaves the log intact
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, call: RenderCall) {
        self.lock().push(call);
    }
}

impl Renderer for RecordingRenderer {
    fn render_options(&self, level: Level, items: &[LookupItem], placeholder: &str, enabled: bool) {
        self.push(RenderCall::Options {
            level,
            items: items.to_vec(),
            placeholder: placeholder.to_string(),
            enabled
        });
    }

    fn render_records(&self, records: &[Record]) {
        self.push(RenderCall::Records(records.to_vec()));
    }

    fn render_page_controls(&self, controls: &PageControls) {
        self.push(RenderCall::PageControls(controls.clone()));
    }

    fn render_summary(&self, totals: &SummaryTotals) {
        self.push(RenderCall::Summary(*totals));
    }

    fn render_lookup_rows(&self, kind: LookupKind, rows: &[LookupRow]) {
        self.push(RenderCall::LookupRows { kind, rows: rows.to_vec() });
    }

    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Danger => error!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Success | Severity::Info => info!("{message}")
        }

        self.push(RenderCall::Notice { severity, message: message.to_string() });
    }
}
