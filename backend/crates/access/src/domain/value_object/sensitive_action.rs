//! Sensitive actions and their classification.

use serde::{Deserialize, Serialize};

/// Operation that requires a fresh password confirmation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitiveAction {
    #[display("VOID_CHECK")]
    VoidCheck,
    #[display("EDIT_BANK_CREDENTIALS")]
    EditBankCredentials,
    #[display("LARGE_CHECK")]
    LargeCheck,
}

/// Decides whether an operation is sensitive.
///
/// The guard itself never looks at business payloads; handlers call
/// [`SensitivityPolicy::classify`] with the tag and amount they already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitivityPolicy {
    /// Amounts strictly above this (in cents) are sensitive.
    pub amount_threshold_cents: i64,
}

impl SensitivityPolicy {
    pub const fn new(amount_threshold_cents: i64) -> Self {
        Self {
            amount_threshold_cents,
        }
    }

    /// An explicit tag wins; otherwise an amount over the threshold is a
    /// [`SensitiveAction::LargeCheck`].
    pub fn classify(
        &self,
        tag: Option<SensitiveAction>,
        amount_cents: Option<i64>,
    ) -> Option<SensitiveAction> {
        tag.or_else(|| {
            amount_cents
                .filter(|amount| *amount > self.amount_threshold_cents)
                .map(|_| SensitiveAction::LargeCheck)
        })
    }
}
