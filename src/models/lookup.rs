use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::Identifier;

/// A status or a transaction type; the shape every option list is rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: Identifier,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>
}

impl LookupItem {
    pub fn new(id: Identifier, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), description: None }
    }
}

/// A category, owned by a transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Identifier,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The owning transaction type.
    #[serde(rename = "transaction_type")]
    pub type_id: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type_name: Option<String>
}

impl Category {
    pub fn new(id: Identifier, type_id: Identifier, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), description: None, type_id, transaction_type_name: None }
    }
}

/// A subcategory, owned by a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: Identifier,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The owning category.
    #[serde(rename = "category")]
    pub category_id: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type_name: Option<String>
}

impl Subcategory {
    pub fn new(id: Identifier, category_id: Identifier, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), description: None, category_id, category_name: None, transaction_type_name: None }
    }
}

/// A lookup that lives under a parent selection in the cascade.
pub trait ChildLookup: Clone + Send + Sync + 'static {
    fn id(&self) -> Identifier;
    fn parent_id(&self) -> Identifier;
    fn to_item(&self) -> LookupItem;
}

impl ChildLookup for Category {
    fn id(&self) -> Identifier {
        self.id
    }

    fn parent_id(&self) -> Identifier {
        self.type_id
    }

    fn to_item(&self) -> LookupItem {
        LookupItem { id: self.id, name: self.name.clone(), description: self.description.clone() }
    }
}

impl ChildLookup for Subcategory {
    fn id(&self) -> Identifier {
        self.id
    }

    fn parent_id(&self) -> Identifier {
        self.category_id
    }

    fn to_item(&self) -> LookupItem {
        LookupItem { id: self.id, name: self.name.clone(), description: self.description.clone() }
    }
}

/// Every lookup collection, as returned by the combined `reference-data/` read.
///
/// A snapshot is fetched once per screen and never mutated afterwards; it is
/// shared behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    #[serde(default)]
    pub statuses: Vec<LookupItem>,
    #[serde(default, rename = "transaction_types")]
    pub types: Vec<LookupItem>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>
}

impl ReferenceSnapshot {
    pub fn has_status(&self, id: Identifier) -> bool {
        self.statuses.iter().any(|status| status.id == id)
    }

    pub fn has_type(&self, id: Identifier) -> bool {
        self.types.iter().any(|kind| kind.id == id)
    }

    pub fn category(&self, id: Identifier) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn subcategory(&self, id: Identifier) -> Option<&Subcategory> {
        self.subcategories.iter().find(|subcategory| subcategory.id == id)
    }

    /// Duplicate ids and dangling parent references. These are reported, never rejected.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut diagnostics = Vec::new();

        duplicates("status", self.statuses.iter().map(|item| item.id), &mut diagnostics);
        duplicates("transaction type", self.types.iter().map(|item| item.id), &mut diagnostics);
        duplicates("category", self.categories.iter().map(|item| item.id), &mut diagnostics);
        duplicates("subcategory", self.subcategories.iter().map(|item| item.id), &mut diagnostics);

        for category in &self.categories {
            if !self.has_type(category.type_id) {
                diagnostics.push(format!("Category [{}] references missing transaction type [{}]", category.id, category.type_id));
            }
        }

        for subcategory in &self.subcategories {
            if self.category(subcategory.category_id).is_none() {
                diagnostics.push(format!("Subcategory [{}] references missing category [{}]", subcategory.id, subcategory.category_id));
            }
        }

        diagnostics
    }
}

fn duplicates(label: &str, ids: impl Iterator<Item = Identifier>, diagnostics: &mut Vec<String>) {
    let mut seen = HashSet::new();

    for id in ids {
        if !seen.insert(id) {
            diagnostics.push(format!("Duplicate {label} id [{id}]"));
        }
    }
}

/// The four lookup collections managed on the reference book screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Status,
    TransactionType,
    Category,
    Subcategory
}

impl LookupKind {
    pub const ALL: [LookupKind; 4] = [Self::Status, Self::TransactionType, Self::Category, Self::Subcategory];

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Status => "statuses",
            Self::TransactionType => "transaction-types",
            Self::Category => "categories",
            Self::Subcategory => "subcategories"
        }
    }

    /// Query/body key naming the parent, for the kinds that have one.
    pub fn parent_param(self) -> Option<&'static str> {
        match self {
            Self::Category => Some("transaction_type"),
            Self::Subcategory => Some("category"),
            Self::Status | Self::TransactionType => None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::TransactionType => "transaction type",
            Self::Category => "category",
            Self::Subcategory => "subcategory"
        }
    }
}

/// One row of a lookup listing. Parent columns are only present for categories and subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRow {
    pub id: Identifier,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>
}

impl LookupRow {
    pub fn parent_id(&self, kind: LookupKind) -> Option<Identifier> {
        match kind {
            LookupKind::Category => self.transaction_type,
            LookupKind::Subcategory => self.category,
            LookupKind::Status | LookupKind::TransactionType => None
        }
    }

    pub fn parent_name(&self, kind: LookupKind) -> Option<&str> {
        match kind {
            LookupKind::Category => self.transaction_type_name.as_deref(),
            LookupKind::Subcategory => self.category_name.as_deref(),
            LookupKind::Status | LookupKind::TransactionType => None
        }
    }
}

/// Payload for creating or updating a lookup entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupDraft {
    pub name: String,
    pub description: String,
    pub parent: Option<Identifier>
}

impl LookupDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_parent(mut self, parent: Identifier) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn to_body(&self, kind: LookupKind) -> Value {
        let mut body = json!({
            "name": self.name,
            "description": self.description,
        });

        if let (Some(key), Some(parent)) = (kind.parent_param(), self.parent) {
            body[key] = json!(parent);
        }

        body
    }
}
