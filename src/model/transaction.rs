//! Ledger entries.

use crate::framework::SyncEntity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    Purchase,
    CreditGiven,
    CreditReceived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Bank,
    Card,
}

/// A single ledger entry as returned by `/transactions`.
///
/// # Sync Framework
/// Mirrored by a [`ResourceSync`](crate::framework::ResourceSync) through the
/// [`SyncEntity`] impl below; writes use [`TransactionCreate`] for both create and
/// update since the API replaces the whole record on `PUT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub payment_mode: PaymentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /transactions` and `PUT /transactions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreate {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub payment_mode: PaymentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub type TransactionUpdate = TransactionCreate;

impl TransactionCreate {
    pub fn new(
        kind: TransactionKind,
        date: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        payment_mode: PaymentMode,
    ) -> Self {
        Self {
            kind,
            date: date.into(),
            amount,
            category: category.into(),
            payment_mode,
            vendor: None,
            notes: None,
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err("Amount must be greater than zero".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("Category is required".to_string());
        }
        if self.date.trim().is_empty() {
            return Err("Date is required".to_string());
        }
        Ok(())
    }
}

impl SyncEntity for Transaction {
    type Id = String;
    type Create = TransactionCreate;
    type Update = TransactionUpdate;

    const LABEL: &'static str = "Transaction";
    const PLURAL: &'static str = "transactions";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate_create(params: &TransactionCreate) -> Result<(), String> {
        params.validate()
    }

    fn validate_update(_id: &String, params: &TransactionUpdate) -> Result<(), String> {
        params.validate()
    }
}
