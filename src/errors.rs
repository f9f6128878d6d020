// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Error type covering the ledger engine. Command handlers convert these
/// into `anyhow` at the CLI boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("corrupt ledger record: {0}")]
    Corrupt(String),
    #[error("storage error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
