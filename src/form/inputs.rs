use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{FieldError, Record, RecordDraft, ReferenceSnapshot};
use crate::types::Identifier;

pub const MAX_DIGITS: u32 = 15;
pub const DECIMAL_PLACES: u32 = 2;

/// Raw values of the transaction form, exactly as typed or selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub date: String,
    pub status: String,
    pub transaction_type: String,
    pub category: String,
    pub subcategory: String,
    pub amount: String,
    pub comment: String
}

impl FormInputs {
    pub fn from_record(record: &Record) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            status: record.status_id.to_string(),
            transaction_type: record.type_id.to_string(),
            category: record.category_id.to_string(),
            subcategory: record.subcategory_id.to_string(),
            amount: record.amount.to_string(),
            comment: record.comment.clone()
        }
    }

    /// Checks every field and the cascade against `snapshot`, collecting all failures.
    pub fn validate(&self, snapshot: &ReferenceSnapshot) -> Result<RecordDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let date = collect(parse_date(&self.date), &mut errors);
        let status = collect(parse_id("status", &self.status), &mut errors);
        let type_id = collect(parse_id("transaction_type", &self.transaction_type), &mut errors);
        let category = collect(parse_id("category", &self.category), &mut errors);
        let subcategory = collect(parse_id("subcategory", &self.subcategory), &mut errors);
        let amount = collect(parse_amount(&self.amount), &mut errors);

        if let Some(status) = status.filter(|status| !snapshot.has_status(*status)) {
            errors.push(FieldError::unknown_reference("status", status));
        }

        if let Some(type_id) = type_id.filter(|type_id| !snapshot.has_type(*type_id)) {
            errors.push(FieldError::unknown_reference("transaction_type", type_id));
        }

        if let Some(category_id) = category {
            match snapshot.category(category_id) {
                None => errors.push(FieldError::unknown_reference("category", category_id)),
                Some(found) => {
                    if let Some(type_id) = type_id.filter(|type_id| snapshot.has_type(*type_id) && found.type_id != *type_id) {
                        errors.push(FieldError::category_mismatch(category_id, type_id));
                    }
                }
            }
        }

        if let Some(subcategory_id) = subcategory {
            match snapshot.subcategory(subcategory_id) {
                None => errors.push(FieldError::unknown_reference("subcategory", subcategory_id)),
                Some(found) => {
                    let parent = category.filter(|category_id| snapshot.category(*category_id).is_some());
                    if let Some(category_id) = parent.filter(|category_id| found.category_id != *category_id) {
                        errors.push(FieldError::subcategory_mismatch(subcategory_id, category_id));
                    }
                }
            }
        }

        match (date, status, type_id, category, subcategory, amount) {
            (Some(date), Some(status_id), Some(type_id), Some(category_id), Some(subcategory_id), Some(amount)) if errors.is_empty() => {
                Ok(RecordDraft {
                    date,
                    status_id,
                    type_id,
                    category_id,
                    subcategory_id,
                    amount,
                    comment: self.comment.trim().to_string()
                })
            }
            _ => Err(errors)
        }
    }
}

fn collect<T>(result: Result<T, FieldError>, errors: &mut Vec<FieldError>) -> Option<T> {
    result.map_err(|error| errors.push(error)).ok()
}

/// Accepts `YYYY-MM-DD` or `DD.MM.YYYY`.
pub fn parse_date(value: &str) -> Result<NaiveDate, FieldError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(FieldError::required("transaction_date"));
    }

    let format = if value.contains('.') { "%d.%m.%Y" } else { "%Y-%m-%d" };

    NaiveDate::parse_from_str(value, format).map_err(|_| FieldError::invalid("transaction_date", value))
}

/// Positive, at most two decimal places and fifteen digits. A decimal comma is accepted.
pub fn parse_amount(value: &str) -> Result<Decimal, FieldError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(FieldError::required("amount"));
    }

    let amount: Decimal = value.replace(',', ".").parse().map_err(|_| FieldError::invalid("amount", value))?;

    if amount <= Decimal::ZERO {
        return Err(FieldError::non_positive_amount(value));
    }

    let normalized = amount.normalize();
    let whole = normalized.trunc();
    let whole_digits = if whole.is_zero() { 0 } else { whole.to_string().len() as u32 };

    if normalized.scale() > DECIMAL_PLACES || whole_digits > MAX_DIGITS - DECIMAL_PLACES {
        return Err(FieldError::amount_precision(value, MAX_DIGITS, DECIMAL_PLACES));
    }

    Ok(amount)
}

fn parse_id(field: &'static str, value: &str) -> Result<Identifier, FieldError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(FieldError::required(field));
    }

    value.parse().map_err(|_| FieldError::invalid(field, value))
}
