//! Account → loan ID override table
//!
//! The lookup service can answer "status of loan X" but has no endpoint for
//! "which loan belongs to account Y". This table stands in for that join so
//! the loan-status agent can answer when only an account number is known.
//! It is a workaround, not a derivation rule: it only knows the accounts it
//! was given and is capped at [`MAX_ENTRIES`]. Remove it once the service
//! gains an account → loan endpoint.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::types::{AccountNumber, LoanId};

/// Upper bound on table size, builtin entries included
pub const MAX_ENTRIES: usize = 64;

/// Entries matching the shipped sample customer data
const BUILTIN: &[(&str, &str)] = &[("123456789", "LN1001"), ("987654321", "LN1002")];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoanTableError {
    #[error("loan override table is limited to {max} entries, got {got}")]
    TooManyEntries { max: usize, got: usize },
}

#[derive(Debug, Clone)]
pub struct LoanLookupTable {
    entries: HashMap<AccountNumber, LoanId>,
}

impl LoanLookupTable {
    /// An empty table: every account is unknown
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The reference entries for the sample data set
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(account, loan)| (AccountNumber::new(*account), LoanId::new(*loan)))
            .collect();
        Self { entries }
    }

    /// Add (or replace) entries, typically from configuration
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = (AccountNumber, LoanId)>,
    ) -> Result<Self, LoanTableError> {
        for (account, loan) in overrides {
            self.entries.insert(account, loan);
        }
        if self.entries.len() > MAX_ENTRIES {
            return Err(LoanTableError::TooManyEntries {
                max: MAX_ENTRIES,
                got: self.entries.len(),
            });
        }
        Ok(self)
    }

    pub fn lookup_loan_id_for_account(&self, account: &AccountNumber) -> Option<LoanId> {
        let hit = self.entries.get(account).cloned();
        debug!("Loan table lookup for {}: {:?}", account, hit);
        hit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LoanLookupTable {
    fn default() -> Self {
        Self::builtin()
    }
}
