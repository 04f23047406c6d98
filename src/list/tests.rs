use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{derive_page, page_query, page_window, total_pages, try_derive_page, DeleteOutcome, DerivedPage, ListController, LoadReport, LoadStatus};
use crate::api::testing::{record, seeded, seeded_with_records, wait_for_calls, ScriptedApi};
use crate::api::InMemoryApi;
use crate::config::Settings;
use crate::filters::{FilterParam, FilterState};
use crate::reference::ReferenceSource;
use crate::render::{ConfirmGate, FixedAnswer, Level, RecordingRenderer, RenderCall, Severity};
use crate::types::ClientError;

use anyhow::{anyhow, Result};

type Controller = ListController<ScriptedApi, RecordingRenderer, FixedAnswer>;

fn controller(inner: InMemoryApi, confirm: bool) -> (Arc<ScriptedApi>, Arc<RecordingRenderer>, Arc<Controller>) {
    let api = Arc::new(ScriptedApi::new(inner));
    let renderer = Arc::new(RecordingRenderer::new());
    let controller = Arc::new(ListController::new(api.clone(), renderer.clone(), Arc::new(FixedAnswer(confirm)), Settings::default()));
    (api, renderer, controller)
}

/// Confirms only once released, so work can happen while the prompt is open.
#[derive(Default)]
struct HeldAnswer {
    asked: AtomicUsize,
    release: Notify
}

#[async_trait]
impl ConfirmGate for HeldAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        true
    }
}

const APPLIED: LoadReport = LoadReport { records: LoadStatus::Applied, summary: LoadStatus::Applied };

fn record_ids(renderer: &RecordingRenderer) -> Vec<u32> {
    renderer.last_records().unwrap_or_default().iter().map(|record| record.id).collect()
}

#[test]
fn test_middle_page_from_next_link() -> Result<()> {
    let page = try_derive_page(25, 10, Some("http://h/api/transactions/?page=3"), Some("http://h/api/transactions/"))?;

    assert_eq!(page, DerivedPage { current_page: 2, total_pages: 3, has_next: true, has_previous: true });

    Ok(())
}

#[test]
fn test_single_page_without_links() -> Result<()> {
    let page = try_derive_page(5, 10, None, None)?;

    assert_eq!(page, DerivedPage { current_page: 1, total_pages: 1, has_next: false, has_previous: false });

    Ok(())
}

#[test]
fn test_last_page_from_previous_link() -> Result<()> {
    // A link back to the first page carries no page parameter
    let second = try_derive_page(15, 10, None, Some("http://h/api/transactions/?page_size=10"))?;
    let third = try_derive_page(25, 10, None, Some("/api/transactions/?page=2&search=vps"))?;

    assert_eq!(second.current_page, 2);
    assert_eq!(third.current_page, 3);
    assert!(!third.has_next);

    Ok(())
}

#[test]
fn test_derived_page_is_clamped() -> Result<()> {
    let page = try_derive_page(5, 10, Some("http://h/api/transactions/?page=9"), None)?;

    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_pages, 1);

    Ok(())
}

#[test]
fn test_malformed_links_fall_back_to_first_page() {
    let unreadable = try_derive_page(25, 10, Some("http://h/api/transactions/?page=abc"), None);
    let missing = try_derive_page(25, 10, Some("http://h/api/transactions/"), None);

    assert!(matches!(unreadable, Err(ClientError::MalformedPaginationLink { .. })));
    assert!(matches!(missing, Err(ClientError::MalformedPaginationLink { .. })));
    assert_eq!(derive_page(25, 10, Some("http://[::1"), None).current_page, 1);
    assert!(derive_page(25, 10, Some("http://[::1"), None).has_next);
}

#[test]
fn test_total_pages_is_at_least_one() {
    assert_eq!(total_pages(0, 10), 1);
    assert_eq!(total_pages(10, 10), 1);
    assert_eq!(total_pages(11, 10), 2);
}

#[test]
fn test_page_window_stays_within_bounds() {
    assert_eq!(page_window(1, 3, 5), vec![1, 2, 3]);
    assert_eq!(page_window(1, 20, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_window(10, 20, 5), vec![8, 9, 10, 11, 12]);
    assert_eq!(page_window(20, 20, 5), vec![16, 17, 18, 19, 20]);
    assert_eq!(page_window(4, 20, 4), vec![2, 3, 4, 5]);
}

#[test]
fn test_page_query_carries_filters_and_paging() {
    let mut filters = FilterState::new();
    filters.set(FilterParam::Search, "vps");

    let query = page_query(&filters, 0, 10);

    assert_eq!(query.get("page").map(String::as_str), Some("1"));
    assert_eq!(query.get("page_size").map(String::as_str), Some("10"));
    assert_eq!(query.get("search").map(String::as_str), Some("vps"));
}

#[tokio::test]
async fn test_load_renders_records_controls_and_summary() -> Result<()> {
    let (_, renderer, controller) = controller(seeded_with_records(25), true);

    let report = controller.load(2).await;

    assert_eq!(report, APPLIED);
    assert_eq!(controller.current_page().await, 2);
    assert_eq!(record_ids(&renderer), (6..=15).rev().collect::<Vec<_>>());

    let controls = renderer.last_page_controls().ok_or_else(|| anyhow!("page controls were not rendered"))?;
    assert_eq!((controls.current_page, controls.total_pages), (2, 3));
    assert!(controls.has_next && controls.has_previous);
    assert_eq!(controls.window, vec![1, 2, 3]);

    let totals = renderer.last_summary().unwrap_or_default();
    assert_eq!(totals.count, 25);
    assert_eq!(totals.income.to_string(), "2500");
    assert_eq!(totals.balance.to_string(), "2500");

    Ok(())
}

#[tokio::test]
async fn test_open_fills_filter_options_and_loads_first_page() -> Result<()> {
    let (api, renderer, controller) = controller(seeded_with_records(3), true);
    let reference = ReferenceSource::new(api.clone());

    let report = controller.open(&reference).await;

    assert_eq!(report, APPLIED);
    assert_eq!(renderer.last_options(Level::Type).map(|(items, enabled)| (items.len(), enabled)), Some((2, true)));
    assert_eq!(renderer.last_options(Level::Status).map(|(items, _)| items.len()), Some(2));
    assert_eq!(renderer.last_options(Level::Category).map(|(items, enabled)| (items.len(), enabled)), Some((4, true)));
    assert_eq!(renderer.last_options(Level::Subcategory).map(|(items, enabled)| (items.len(), enabled)), Some((6, true)));
    assert_eq!(record_ids(&renderer), vec![3, 2, 1]);

    Ok(())
}

#[tokio::test]
async fn test_open_without_reference_data_warns_and_still_lists() -> Result<()> {
    let (api, renderer, controller) = controller(seeded_with_records(3), true);
    let reference = ReferenceSource::new(api.clone());
    api.fail("reference_data");

    let report = controller.open(&reference).await;

    assert_eq!(report, APPLIED);
    assert_eq!(renderer.last_options(Level::Type).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));
    assert_eq!(renderer.last_options(Level::Category).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));
    assert_eq!(renderer.last_options(Level::Subcategory).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));
    assert_eq!(renderer.notices(), vec![(Severity::Warning, "Could not load reference data. Please try again.".to_string())]);

    Ok(())
}

#[tokio::test]
async fn test_records_render_when_summary_fails() -> Result<()> {
    let (api, renderer, controller) = controller(seeded_with_records(3), true);
    api.fail("summary");

    let report = controller.load(1).await;

    assert_eq!(report, LoadReport { records: LoadStatus::Applied, summary: LoadStatus::Failed });
    assert_eq!(record_ids(&renderer).len(), 3);
    assert!(renderer.last_summary().is_none());
    assert_eq!(renderer.notices(), vec![(Severity::Danger, "Could not load the summary. Please try again.".to_string())]);

    Ok(())
}

#[tokio::test]
async fn test_older_load_finishing_late_is_discarded() -> Result<()> {
    let (api, renderer, controller) = controller(seeded_with_records(25), true);
    let gate = api.gate("transactions");

    let slow = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load(3).await }
    });
    wait_for_calls(&api, "transactions", 1).await;
    api.ungate("transactions");

    let fast = controller.load(1).await;
    gate.notify_one();
    let slow = slow.await?;

    assert_eq!(fast, APPLIED);
    assert_eq!(slow.records, LoadStatus::Stale);
    assert_eq!(controller.current_page().await, 1);
    assert_eq!(record_ids(&renderer).first().copied(), Some(25));

    Ok(())
}

#[tokio::test]
async fn test_filters_reload_first_page() -> Result<()> {
    let inner = seeded()
        .with_record(record(1, 1, 1, 10, 100, 500))
        .with_record(record(2, 2, 2, 20, 200, 40))
        .with_record(record(3, 3, 2, 21, 210, 60));
    let (_, renderer, controller) = controller(inner, true);
    controller.load(1).await;

    let report = controller.apply_filters(FilterState::from_inputs([("filter-type", "2"), ("filter-date-from", "02.03.2024")])).await;

    assert_eq!(report, APPLIED);
    assert_eq!(record_ids(&renderer), vec![3, 2]);
    let totals = renderer.last_summary().unwrap_or_default();
    assert_eq!(totals.expense.to_string(), "100");
    assert_eq!(totals.income.to_string(), "0");

    controller.reset_filters().await;

    assert!(controller.filters().await.is_empty());
    assert_eq!(record_ids(&renderer), vec![3, 2, 1]);

    Ok(())
}

#[tokio::test]
async fn test_delete_on_second_page_reloads_second_page() -> Result<()> {
    let (api, renderer, controller) = controller(seeded_with_records(25), true);
    controller.load(2).await;

    let outcome = controller.delete(10).await;

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(controller.current_page().await, 2);
    assert_eq!(api.calls("transactions"), 2);
    assert_eq!(record_ids(&renderer), vec![15, 14, 13, 12, 11, 9, 8, 7, 6, 5]);
    assert!(renderer.notices().contains(&(Severity::Success, "Transaction deleted".to_string())));

    Ok(())
}

#[tokio::test]
async fn test_deleting_last_record_of_a_page_steps_back() -> Result<()> {
    let (_, renderer, controller) = controller(seeded_with_records(21), true);
    controller.load(3).await;
    assert_eq!(record_ids(&renderer), vec![1]);

    let outcome = controller.delete(1).await;

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(controller.current_page().await, 2);
    assert_eq!(renderer.last_page_controls().map(|controls| (controls.total_pages, controls.has_next)), Some((2, false)));

    Ok(())
}

#[tokio::test]
async fn test_declined_delete_touches_nothing() -> Result<()> {
    let (api, _, controller) = controller(seeded_with_records(5), false);
    controller.load(1).await;
    let calls = api.total_calls();

    let outcome = controller.delete(3).await;

    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(api.total_calls(), calls);
    assert_eq!(api.inner().record_count(), 5);

    Ok(())
}

#[tokio::test]
async fn test_failed_delete_notifies_danger() -> Result<()> {
    let (api, renderer, controller) = controller(seeded_with_records(5), true);
    controller.load(1).await;
    api.fail("delete:3");

    let outcome = controller.delete(3).await;

    assert_eq!(outcome, DeleteOutcome::Failed);
    assert_eq!(api.calls("transactions"), 1);
    assert_eq!(renderer.notices(), vec![(Severity::Danger, "Could not delete the transaction. Please try again.".to_string())]);

    Ok(())
}

#[tokio::test]
async fn test_filter_options_use_filter_placeholders() -> Result<()> {
    let (api, renderer, controller) = controller(seeded(), true);
    let reference = ReferenceSource::new(api.clone());

    controller.open(&reference).await;

    let placeholders: Vec<String> = renderer.calls().into_iter().filter_map(|call| match call {
        RenderCall::Options { placeholder, .. } => Some(placeholder),
        _ => None
    }).collect();

    assert_eq!(placeholders, vec!["All statuses", "All types", "All categories", "All subcategories"]);

    Ok(())
}

#[tokio::test]
async fn test_delete_reloads_the_page_showing_when_asked() -> Result<()> {
    let api = Arc::new(ScriptedApi::new(seeded_with_records(25)));
    let renderer = Arc::new(RecordingRenderer::new());
    let gate = Arc::new(HeldAnswer::default());
    let controller = Arc::new(ListController::new(api.clone(), renderer.clone(), gate.clone(), Settings::default()));
    controller.load(2).await;

    let deleting = tokio::spawn({
        let controller = controller.clone();
        async move { controller.delete(10).await }
    });
    while gate.asked.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    // The user pages on while the prompt is still open
    controller.load(3).await;
    gate.release.notify_one();

    assert_eq!(deleting.await?, DeleteOutcome::Deleted);
    assert_eq!(controller.current_page().await, 2);
    assert_eq!(record_ids(&renderer), vec![15, 14, 13, 12, 11, 9, 8, 7, 6, 5]);

    Ok(())
}

#[tokio::test]
async fn test_set_filters_then_load_reads_once() -> Result<()> {
    let inner = seeded_with_records(15).with_record(record(16, 1, 2, 20, 200, 40));
    let (api, renderer, controller) = controller(inner, true);

    controller.set_filters(FilterState::from_inputs([("type", "1")])).await;
    let report = controller.load(2).await;

    assert_eq!(report, APPLIED);
    assert_eq!(api.calls("transactions"), 1);
    assert_eq!(api.calls("summary"), 1);
    assert_eq!(controller.current_page().await, 2);
    assert_eq!(record_ids(&renderer), vec![5, 4, 3, 2, 1]);
    assert_eq!(renderer.last_summary().map(|totals| totals.count), Some(15));

    Ok(())
}
