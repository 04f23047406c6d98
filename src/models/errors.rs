use thiserror::Error;

use crate::types::Identifier;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Field [{field}] is required")]
    Required {
        field: &'static str
    },
    #[error("Field [{field}] has an invalid value [{value}]")]
    Invalid {
        field: &'static str,
        value: String
    },
    #[error("Field [{field}] references unknown id [{id}]")]
    UnknownReference {
        field: &'static str,
        id: Identifier
    },
    #[error("Amount [{value}] must be positive")]
    NonPositiveAmount {
        value: String
    },
    #[error("Amount [{value}] exceeds {max_digits} digits or {decimal_places} decimal places")]
    AmountPrecision {
        value: String,
        max_digits: u32,
        decimal_places: u32
    },
    #[error("Category [{category_id}] does not belong to transaction type [{type_id}]")]
    CategoryMismatch {
        category_id: Identifier,
        type_id: Identifier
    },
    #[error("Subcategory [{subcategory_id}] does not belong to category [{category_id}]")]
    SubcategoryMismatch {
        subcategory_id: Identifier,
        category_id: Identifier
    }
}

impl FieldError {
    pub fn required(field: &'static str) -> Self {
        Self::Required { field }
    }

    pub fn invalid(field: &'static str, value: &str) -> Self {
        Self::Invalid { field, value: value.to_string() }
    }

    pub fn unknown_reference(field: &'static str, id: Identifier) -> Self {
        Self::UnknownReference { field, id }
    }

    pub fn non_positive_amount(value: &str) -> Self {
        Self::NonPositiveAmount { value: value.to_string() }
    }

    pub fn amount_precision(value: &str, max_digits: u32, decimal_places: u32) -> Self {
        Self::AmountPrecision { value: value.to_string(), max_digits, decimal_places }
    }

    pub fn category_mismatch(category_id: Identifier, type_id: Identifier) -> Self {
        Self::CategoryMismatch { category_id, type_id }
    }

    pub fn subcategory_mismatch(subcategory_id: Identifier, category_id: Identifier) -> Self {
        Self::SubcategoryMismatch { subcategory_id, category_id }
    }

    /// The form field the error should be shown next to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field } | Self::Invalid { field, .. } | Self::UnknownReference { field, .. } => field,
            Self::NonPositiveAmount { .. } | Self::AmountPrecision { .. } => "amount",
            Self::CategoryMismatch { .. } => "category",
            Self::SubcategoryMismatch { .. } => "subcategory"
        }
    }
}
