use std::sync::Arc;

use super::{CascadeController, CascadePhase, CascadeSelection, LevelState, LevelStatus, Placement, StepOutcome};
use crate::api::testing::{seeded, wait_for_calls, ScriptedApi};
use crate::models::{Category, LookupItem};
use crate::render::{Level, RecordingRenderer, RenderCall, Severity};

use anyhow::Result;

type Controller = CascadeController<ScriptedApi, RecordingRenderer>;

fn controller() -> (Arc<ScriptedApi>, Arc<RecordingRenderer>, Arc<Controller>) {
    let api = Arc::new(ScriptedApi::new(seeded()));
    let renderer = Arc::new(RecordingRenderer::new());
    let controller = Arc::new(CascadeController::new(api.clone(), renderer.clone(), Placement::Form));
    (api, renderer, controller)
}

fn ids(items: &[LookupItem]) -> Vec<u32> {
    items.iter().map(|item| item.id).collect()
}

#[test]
fn test_level_drops_duplicates_and_foreign_children() {
    let mut level = LevelState::<Category>::new(Level::Category);
    let epoch = level.begin(1);

    let applied = level.accept(epoch, vec![
        Category::new(10, 1, "Salary"),
        Category::new(10, 1, "Salary again"),
        Category::new(30, 9, "Foreign"),
        Category::new(11, 1, "Investments")
    ]);

    assert!(applied);
    assert_eq!(ids(&level.items()), vec![10, 11]);
    assert_eq!(level.items()[0].name, "Salary");
    assert_eq!(level.status(), LevelStatus::Loaded);
}

#[test]
fn test_level_rejects_responses_from_an_older_epoch() {
    let mut level = LevelState::<Category>::new(Level::Category);
    let old = level.begin(1);
    let current = level.begin(2);

    assert!(!level.accept(old, vec![Category::new(10, 1, "Salary")]));
    assert!(!level.fail(old));
    assert_eq!(level.status(), LevelStatus::Loading);
    assert!(level.accept(current, vec![Category::new(20, 2, "Marketing")]));
    assert!(!level.select(Some(10)));
    assert!(level.select(Some(20)));
}

#[tokio::test]
async fn test_set_type_offers_only_children_of_the_type() -> Result<()> {
    let (_, renderer, controller) = controller();

    let outcome = controller.set_type(Some(2)).await;

    assert_eq!(outcome, StepOutcome::Applied);
    assert_eq!(ids(&controller.options(Level::Category).await), vec![20, 21]);
    assert!(controller.is_enabled(Level::Category).await);
    assert!(!controller.is_enabled(Level::Subcategory).await);
    assert_eq!(controller.phase().await, CascadePhase::CategoriesLoaded);

    let (items, enabled) = renderer.last_options(Level::Category).unwrap_or_default();
    assert_eq!(ids(&items), vec![20, 21]);
    assert!(enabled);

    Ok(())
}

#[tokio::test]
async fn test_latest_type_wins_over_a_slower_earlier_one() -> Result<()> {
    let (api, renderer, controller) = controller();
    let gate = api.gate("categories:1");

    let slow = tokio::spawn({
        let controller = controller.clone();
        async move { controller.set_type(Some(1)).await }
    });
    wait_for_calls(&api, "categories:1", 1).await;

    let fast = controller.set_type(Some(2)).await;
    gate.notify_one();
    let slow = slow.await?;

    assert_eq!(fast, StepOutcome::Applied);
    assert_eq!(slow, StepOutcome::Stale);
    assert_eq!(ids(&controller.options(Level::Category).await), vec![20, 21]);
    assert_eq!(renderer.last_options(Level::Category).map(|(items, _)| ids(&items)), Some(vec![20, 21]));
    assert_eq!(controller.selection().await.type_id, Some(2));

    Ok(())
}

#[tokio::test]
async fn test_parent_change_discards_pending_subcategories() -> Result<()> {
    let (api, _, controller) = controller();
    controller.set_type(Some(1)).await;
    let gate = api.gate("subcategories:10");

    let pending = tokio::spawn({
        let controller = controller.clone();
        async move { controller.set_category(Some(10), Some(100)).await }
    });
    wait_for_calls(&api, "subcategories:10", 1).await;

    controller.set_type(Some(2)).await;
    gate.notify_one();

    assert_eq!(pending.await?, StepOutcome::Stale);
    assert!(controller.options(Level::Subcategory).await.is_empty());
    assert!(!controller.is_enabled(Level::Subcategory).await);
    assert_eq!(controller.selection().await, CascadeSelection { type_id: Some(2), category_id: None, subcategory_id: None });

    Ok(())
}

#[tokio::test]
async fn test_edit_mode_restores_full_selection() -> Result<()> {
    let (api, renderer, controller) = controller();

    let outcome = controller.load_for_edit(2, 20, 201).await;

    assert_eq!(outcome, StepOutcome::Applied);
    assert_eq!(controller.selection().await, CascadeSelection { type_id: Some(2), category_id: Some(20), subcategory_id: Some(201) });
    assert_eq!(controller.phase().await, CascadePhase::SubcategoriesLoaded);
    assert_eq!(api.calls("categories:2"), 1);
    assert_eq!(api.calls("subcategories:20"), 1);
    assert_eq!(renderer.last_options(Level::Subcategory).map(|(items, enabled)| (ids(&items), enabled)), Some((vec![200, 201], true)));

    Ok(())
}

#[tokio::test]
async fn test_edit_mode_stops_when_a_step_fails() -> Result<()> {
    let (api, _, controller) = controller();
    api.fail("categories:2");

    let outcome = controller.load_for_edit(2, 20, 201).await;

    assert_eq!(outcome, StepOutcome::Failed);
    assert_eq!(api.calls("subcategories:20"), 0);
    assert_eq!(controller.phase().await, CascadePhase::TypeSelected);

    Ok(())
}

#[tokio::test]
async fn test_edit_mode_yields_to_a_type_change_midway() -> Result<()> {
    let (api, renderer, controller) = controller();
    let gate = api.gate("subcategories:20");

    let editing = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_for_edit(2, 20, 201).await }
    });
    wait_for_calls(&api, "subcategories:20", 1).await;

    assert_eq!(controller.set_type(Some(1)).await, StepOutcome::Applied);
    gate.notify_one();

    assert_eq!(editing.await?, StepOutcome::Stale);
    assert_eq!(controller.selection().await, CascadeSelection { type_id: Some(1), category_id: None, subcategory_id: None });
    assert_eq!(ids(&controller.options(Level::Category).await), vec![10, 11]);
    assert!(!controller.is_enabled(Level::Subcategory).await);
    assert_eq!(renderer.last_options(Level::Subcategory).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));

    Ok(())
}

#[tokio::test]
async fn test_failed_read_leaves_level_empty_disabled_and_notifies() -> Result<()> {
    let (api, renderer, controller) = controller();
    controller.set_type(Some(1)).await;
    api.fail("subcategories:11");

    let outcome = controller.set_category(Some(11), None).await;

    assert_eq!(outcome, StepOutcome::Failed);
    assert!(controller.options(Level::Subcategory).await.is_empty());
    assert_eq!(renderer.last_options(Level::Subcategory).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));
    assert_eq!(renderer.notices(), vec![(Severity::Danger, "Could not load subcategories. Please try again.".to_string())]);
    // The parent keeps its state
    assert_eq!(controller.selection().await.category_id, Some(11));
    assert!(controller.is_enabled(Level::Category).await);

    Ok(())
}

#[tokio::test]
async fn test_clearing_type_disables_every_descendant() -> Result<()> {
    let (_, renderer, controller) = controller();
    controller.load_for_edit(1, 10, 100).await;

    let outcome = controller.set_type(None).await;

    assert_eq!(outcome, StepOutcome::Cleared);
    assert_eq!(controller.selection().await, CascadeSelection::default());
    assert_eq!(controller.phase().await, CascadePhase::Idle);
    assert_eq!(renderer.last_options(Level::Category).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));
    assert_eq!(renderer.last_options(Level::Subcategory).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));

    Ok(())
}

#[tokio::test]
async fn test_subcategory_selection_requires_an_offered_option() -> Result<()> {
    let (_, _, controller) = controller();

    assert_eq!(controller.set_subcategory(Some(100)).await, StepOutcome::Rejected);

    controller.set_type(Some(1)).await;
    controller.set_category(Some(10), None).await;

    assert_eq!(controller.set_subcategory(Some(200)).await, StepOutcome::Rejected);
    assert_eq!(controller.set_subcategory(Some(101)).await, StepOutcome::Applied);
    assert_eq!(controller.selection().await.subcategory_id, Some(101));
    assert_eq!(controller.set_subcategory(None).await, StepOutcome::Cleared);

    Ok(())
}

#[tokio::test]
async fn test_filter_placement_renders_filter_placeholders() -> Result<()> {
    let api = Arc::new(ScriptedApi::new(seeded()));
    let renderer = Arc::new(RecordingRenderer::new());
    let controller = CascadeController::new(api, renderer.clone(), Placement::Filter);

    controller.set_type(Some(1)).await;

    let placeholder = renderer.calls().into_iter().rev().find_map(|call| match call {
        RenderCall::Options { level: Level::Category, placeholder, .. } => Some(placeholder),
        _ => None
    });
    assert_eq!(placeholder.as_deref(), Some("All categories"));

    Ok(())
}

#[tokio::test]
async fn test_type_without_categories_keeps_category_disabled() -> Result<()> {
    let api = Arc::new(ScriptedApi::new(seeded().with_type(3, "Transfer")));
    let renderer = Arc::new(RecordingRenderer::new());
    let controller = CascadeController::new(api, renderer.clone(), Placement::Form);

    let outcome = controller.set_type(Some(3)).await;

    assert_eq!(outcome, StepOutcome::Applied);
    assert_eq!(controller.phase().await, CascadePhase::CategoriesLoaded);
    assert!(!controller.is_enabled(Level::Category).await);
    assert_eq!(renderer.last_options(Level::Category).map(|(items, enabled)| (items.len(), enabled)), Some((0, false)));

    Ok(())
}
