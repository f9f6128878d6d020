// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Category reserved for the synthesized transaction appended when a
/// monthly bill is settled.
pub const BILL_PAYMENT_CATEGORY: &str = "Bill Payment";
/// Categories reserved for the ledger side of saving-box movements.
pub const BOX_DEPOSIT_CATEGORY: &str = "Box Deposit";
pub const BOX_WITHDRAWAL_CATEGORY: &str = "Box Withdrawal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            other => Err(LedgerError::validation(
                "kind",
                format!("expected 'income' or 'expense', got '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Credit,
    Debit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "credit" => Ok(PaymentMethod::Credit),
            "debit" => Ok(PaymentMethod::Debit),
            other => Err(LedgerError::validation(
                "payment_method",
                format!("expected 'credit' or 'debit', got '{}'", other),
            )),
        }
    }
}

/// How the user expressed the purchase amount of a parceled purchase:
/// the whole price, or the price of each charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentMode {
    Total,
    PerInstallment,
}

impl InstallmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentMode::Total => "total",
            InstallmentMode::PerInstallment => "per_installment",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "total" => Ok(InstallmentMode::Total),
            "per_installment" => Ok(InstallmentMode::PerInstallment),
            other => Err(LedgerError::validation(
                "installment_mode",
                format!("expected 'total' or 'per_installment', got '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Deposit,
    Withdraw,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Deposit => "deposit",
            MovementKind::Withdraw => "withdraw",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "deposit" => Ok(MovementKind::Deposit),
            "withdraw" => Ok(MovementKind::Withdraw),
            other => Err(LedgerError::validation(
                "kind",
                format!("expected 'deposit' or 'withdraw', got '{}'", other),
            )),
        }
    }
}

/// Parceling summary carried by an installment purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub mode: InstallmentMode,
    pub count: u32,
    pub total_amount: Decimal,
    pub interest_per_month: Option<Decimal>,
    pub first_due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner: i64,
    pub kind: TxKind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub recurring: bool,
    pub tag: Option<String>,
    pub settled: bool,
    pub installment: Option<InstallmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub id: i64,
    pub transaction_id: i64,
    pub description: Option<String>,
    pub total_amount: Decimal,
    pub installment_count: u32,
    pub mode: InstallmentMode,
    pub interest_per_month: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentCharge {
    pub id: i64,
    pub plan_id: i64,
    pub seq: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingBox {
    pub id: i64,
    pub owner: i64,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: Option<Decimal>,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingMovement {
    pub id: i64,
    pub box_id: i64,
    pub kind: MovementKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub transaction_id: Option<i64>,
}
