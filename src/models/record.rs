use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Identifier, RecordId};

/// A cash-flow transaction as the service returns it.
///
/// The `*_name` fields are read-only conveniences attached by the service and
/// are never sent back on writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the service.
    pub id: RecordId,
    #[serde(rename = "transaction_date")]
    pub date: NaiveDate,
    #[serde(rename = "status")]
    pub status_id: Identifier,
    #[serde(rename = "transaction_type")]
    pub type_id: Identifier,
    #[serde(rename = "category")]
    pub category_id: Identifier,
    #[serde(rename = "subcategory")]
    pub subcategory_id: Identifier,
    pub amount: Decimal,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_name: Option<String>
}

impl Record {
    pub fn from_draft(id: RecordId, draft: RecordDraft) -> Self {
        Self {
            id,
            date: draft.date,
            status_id: draft.status_id,
            type_id: draft.type_id,
            category_id: draft.category_id,
            subcategory_id: draft.subcategory_id,
            amount: draft.amount,
            comment: draft.comment,
            created_date: None,
            status_name: None,
            transaction_type_name: None,
            category_name: None,
            subcategory_name: None
        }
    }

    pub fn draft(&self) -> RecordDraft {
        RecordDraft {
            date: self.date,
            status_id: self.status_id,
            type_id: self.type_id,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
            amount: self.amount,
            comment: self.comment.clone()
        }
    }
}

/// The write payload for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    #[serde(rename = "transaction_date")]
    pub date: NaiveDate,
    #[serde(rename = "status")]
    pub status_id: Identifier,
    #[serde(rename = "transaction_type")]
    pub type_id: Identifier,
    #[serde(rename = "category")]
    pub category_id: Identifier,
    #[serde(rename = "subcategory")]
    pub subcategory_id: Identifier,
    pub amount: Decimal,
    #[serde(default)]
    pub comment: String
}
