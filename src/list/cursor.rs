use tracing::warn;
use url::Url;

use crate::render::PageControls;
use crate::types::ClientError;

/// Relative links are resolved against this before reading their query.
const LINK_BASE: &str = "http://localhost/";

/// The page a response represents, worked out from its envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPage {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool
}

impl DerivedPage {
    pub fn controls(&self, window: u32) -> PageControls {
        PageControls {
            current_page: self.current_page,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
            window: page_window(self.current_page, self.total_pages, window)
        }
    }
}

pub fn total_pages(count: u64, page_size: u32) -> u32 {
    let pages = count.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Derives the current page from the `next`/`previous` links.
///
/// `next` wins when present (its page minus one), otherwise `previous` plus
/// one, otherwise page 1. A `previous` link without a page parameter points
/// at page 1. The result is clamped to `[1, total_pages]`.
pub fn try_derive_page(count: u64, page_size: u32, next: Option<&str>, previous: Option<&str>) -> Result<DerivedPage, ClientError> {
    let total_pages = total_pages(count, page_size);

    let current_page = match (next, previous) {
        (Some(next), _) => page_of(next)?.ok_or_else(|| ClientError::malformed_link(next))?.saturating_sub(1),
        (None, Some(previous)) => page_of(previous)?.unwrap_or(1).saturating_add(1),
        (None, None) => 1
    };

    Ok(DerivedPage {
        current_page: current_page.clamp(1, total_pages),
        total_pages,
        has_next: next.is_some(),
        has_previous: previous.is_some()
    })
}

/// `try_derive_page`, falling back to page 1 when a link cannot be read.
pub fn derive_page(count: u64, page_size: u32, next: Option<&str>, previous: Option<&str>) -> DerivedPage {
    try_derive_page(count, page_size, next, previous).unwrap_or_else(|error| {
        warn!("{error}, falling back to the first page");

        DerivedPage {
            current_page: 1,
            total_pages: total_pages(count, page_size),
            has_next: next.is_some(),
            has_previous: previous.is_some()
        }
    })
}

/// At most `window` consecutive page numbers, centred on `current` where possible.
pub fn page_window(current: u32, total: u32, window: u32) -> Vec<u32> {
    let total = total.max(1);
    let window = window.clamp(1, total);
    let current = current.clamp(1, total);

    let start = current.saturating_sub(window / 2).max(1).min(total - window + 1);

    (start..start + window).collect()
}

/// The `page` query parameter of `link`, `None` when absent.
fn page_of(link: &str) -> Result<Option<u32>, ClientError> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(LINK_BASE)
            .and_then(|base| base.join(link))
            .map_err(|_| ClientError::malformed_link(link))?,
        Err(_) => return Err(ClientError::malformed_link(link))
    };

    let page = url.query_pairs().find(|(key, _)| key == "page").map(|(_, value)| value.into_owned());

    match page {
        None => Ok(None),
        Some(value) => value.parse::<u32>()
            .ok()
            .filter(|page| *page > 0)
            .map(Some)
            .ok_or_else(|| ClientError::malformed_link(link))
    }
}
