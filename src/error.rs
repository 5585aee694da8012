// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Domain failures surfaced to the operator. Handlers carry these inside
/// `anyhow::Error`, so callers that care can `downcast_ref::<StudioError>()`.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error(
        "project {code} still has {incomes} income and {expenses} expense record(s); use --force to delete them too"
    )]
    DeleteBlocked {
        code: String,
        incomes: i64,
        expenses: i64,
    },

    #[error("force delete is disabled (set allow_force_delete=true to enable)")]
    ForceDeleteDisabled,
}

impl StudioError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StudioError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
