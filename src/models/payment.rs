use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::{validate_card_number, validate_cardholder, validate_cvv};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

/// Largest transfer receipt image accepted, in bytes.
pub const MAX_TRANSFER_RECEIPT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Transfer,
}

impl PaymentMethod {
    pub fn is_card(self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }

    /// Human readable name printed on invoices.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit card",
            PaymentMethod::DebitCard => "Debit card",
            PaymentMethod::Transfer => "Bank transfer",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Payment {
    pub id: i32,
    pub reservation_id: i32,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub card_last_four: Option<String>,
    pub transaction_id: String,
    pub receipt_url: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub reservation_id: i32,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub card_last_four: Option<String>,
    pub transaction_id: String,
    pub receipt_url: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct CardDetails {
    #[validate(custom(function = "validate_card_number"))]
    pub card_number: String,
    // MM/YY
    pub expiry_date: String,
    #[validate(custom(function = "validate_cvv"))]
    pub cvv: String,
    #[validate(custom(function = "validate_cardholder"))]
    pub cardholder_name: String,
}

impl CardDetails {
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }

    /// Rejects malformed and already expired `MM/YY` dates. A card expiring
    /// this month is still accepted.
    pub fn check_expiry(&self, today: NaiveDate) -> AppResult<()> {
        let bytes = self.expiry_date.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b'/'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(AppError::ValidationError("Expiry date must be MM/YY".into()));
        }

        let month: u32 = self.expiry_date[..2]
            .parse()
            .map_err(|_| AppError::ValidationError("Expiry date must be MM/YY".into()))?;
        let year: i32 = self.expiry_date[3..]
            .parse()
            .map_err(|_| AppError::ValidationError("Expiry date must be MM/YY".into()))?;

        if !(1..=12).contains(&month) {
            return Err(AppError::ValidationError("Invalid expiry month".into()));
        }

        let current_year = today.year() % 100;
        if year < current_year || (year == current_year && month < today.month()) {
            return Err(AppError::ValidationError("Card has expired".into()));
        }
        Ok(())
    }
}

/// Uploaded proof of a bank transfer.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TransferReceipt {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub card: Option<CardDetails>,
    pub transfer_receipt: Option<TransferReceipt>,
}

impl PaymentDetails {
    pub fn validate_at(&self, today: NaiveDate) -> AppResult<()> {
        match self.method {
            PaymentMethod::CreditCard | PaymentMethod::DebitCard => {
                let card = self
                    .card
                    .as_ref()
                    .ok_or_else(|| AppError::ValidationError("Card details are required".into()))?;
                card.validate()?;
                card.check_expiry(today)
            }
            PaymentMethod::Transfer => {
                let receipt = self.transfer_receipt.as_ref().ok_or_else(|| {
                    AppError::ValidationError("A transfer receipt must be uploaded".into())
                })?;
                if !receipt.content_type.starts_with("image/") {
                    return Err(AppError::ValidationError(
                        "Transfer receipt must be an image file".into(),
                    ));
                }
                if receipt.size_bytes > MAX_TRANSFER_RECEIPT_BYTES {
                    return Err(AppError::ValidationError(
                        "Transfer receipt must not exceed 5MB".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn card_last_four(&self) -> Option<String> {
        if !self.method.is_card() {
            return None;
        }
        self.card.as_ref().map(CardDetails::last_four)
    }
}
