use std::collections::HashSet;

use tracing::warn;

use crate::models::{ChildLookup, LookupItem};
use crate::render::Level;
use crate::types::Identifier;

/// Generation counter of one cascade level. Every parent change moves it
/// forward; a response carrying an older value is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelStatus {
    Disabled,
    Loading,
    Loaded,
    Failed
}

/// Which placeholder text a cascade renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// A create/edit form: "Select category..."
    Form,
    /// A list filter bar: "All categories"
    Filter
}

impl Placement {
    pub fn placeholder(self, level: Level) -> &'static str {
        match self {
            Self::Form => level.select_placeholder(),
            Self::Filter => level.filter_placeholder()
        }
    }
}

/// Options and selection of one dependent level.
#[derive(Debug, Clone)]
pub struct LevelState<T> {
    level: Level,
    epoch: Epoch,
    status: LevelStatus,
    parent: Option<Identifier>,
    options: Vec<T>,
    selected: Option<Identifier>
}

impl<T: ChildLookup> LevelState<T> {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            epoch: Epoch::default(),
            status: LevelStatus::Disabled,
            parent: None,
            options: Vec::new(),
            selected: None
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn status(&self) -> LevelStatus {
        self.status
    }

    pub fn selected(&self) -> Option<Identifier> {
        self.selected
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn items(&self) -> Vec<LookupItem> {
        self.options.iter().map(ChildLookup::to_item).collect()
    }

    /// Loaded with at least one option to choose from.
    pub fn is_enabled(&self) -> bool {
        self.status == LevelStatus::Loaded && !self.options.is_empty()
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.options.iter().any(|option| option.id() == id)
    }

    /// Empties and disables the level. Responses already in flight become stale.
    pub fn invalidate(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.status = LevelStatus::Disabled;
        self.parent = None;
        self.options.clear();
        self.selected = None;
        self.epoch
    }

    /// Starts a read of the children of `parent`; returns the epoch the response must carry.
    pub fn begin(&mut self, parent: Identifier) -> Epoch {
        let epoch = self.invalidate();
        self.status = LevelStatus::Loading;
        self.parent = Some(parent);
        epoch
    }

    /// Applies a response if `epoch` is still current. Duplicate ids and
    /// children of another parent are dropped.
    pub fn accept(&mut self, epoch: Epoch, items: Vec<T>) -> bool {
        if epoch != self.epoch {
            return false;
        }

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(items.len());

        for item in items {
            if self.parent.is_some_and(|parent| parent != item.parent_id()) {
                warn!(
                    "Dropping {:?} option [{}] of parent [{}] from a read for parent [{:?}]",
                    self.level, item.id(), item.parent_id(), self.parent
                );
                continue;
            }

            if !seen.insert(item.id()) {
                warn!("Dropping duplicate {:?} option [{}]", self.level, item.id());
                continue;
            }

            options.push(item);
        }

        self.options = options;
        self.status = LevelStatus::Loaded;
        true
    }

    /// Marks a current read as failed. The level stays empty and disabled.
    pub fn fail(&mut self, epoch: Epoch) -> bool {
        if epoch != self.epoch {
            return false;
        }

        self.options.clear();
        self.selected = None;
        self.status = LevelStatus::Failed;
        true
    }

    /// Selects an option. Fails when the level is not loaded or the id is not offered.
    pub fn select(&mut self, id: Option<Identifier>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.is_enabled() && self.contains(id) => {
                self.selected = Some(id);
                true
            }
            Some(_) => false
        }
    }
}

/// The three selections a cascade produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CascadeSelection {
    pub type_id: Option<Identifier>,
    pub category_id: Option<Identifier>,
    pub subcategory_id: Option<Identifier>
}

/// Where the cascade as a whole stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadePhase {
    Idle,
    TypeSelected,
    CategoriesLoading,
    CategoriesLoaded,
    SubcategoriesLoading,
    SubcategoriesLoaded
}

/// Result of one cascade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The level was emptied because its parent was cleared.
    Cleared,
    /// The response or selection took effect.
    Applied,
    /// A newer step superseded this one; its response was discarded.
    Stale,
    /// The read failed; the level is empty and disabled.
    Failed,
    /// The selection was not among the offered options, or the level was disabled.
    Rejected
}
