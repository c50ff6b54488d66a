//! Resolution chain — find the identifier an agent needs for this turn
//!
//! Order, stopping at the first hit:
//! 1. the current message (also remembered in the context)
//! 2. the conversation context
//! 3. loan IDs only: an account number (message, then context) looked up
//!    in the [`LoanLookupTable`]; a hit is remembered in the context
//!
//! `None` means the agent has to ask the customer for the identifier.

use tracing::{debug, info};

use crate::context::ConversationContext;
use crate::extract::{extract_account_number, extract_loan_id};
use crate::loan_table::LoanLookupTable;
use crate::types::{AccountNumber, LoanId};

/// Where a resolved identifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySource {
    Message,
    Context,
    LookupTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: EntitySource,
}

impl<T> Resolved<T> {
    fn new(value: T, source: EntitySource) -> Self {
        Self { value, source }
    }
}

pub fn resolve_account_number(
    text: &str,
    ctx: &mut ConversationContext,
) -> Option<Resolved<AccountNumber>> {
    if let Some(account) = extract_account_number(text, ctx) {
        return Some(Resolved::new(account, EntitySource::Message));
    }
    let account = ctx.account_number().cloned();
    debug!("Using account number from context: {:?}", account);
    account.map(|a| Resolved::new(a, EntitySource::Context))
}

pub fn resolve_loan_id(
    text: &str,
    ctx: &mut ConversationContext,
    table: &LoanLookupTable,
) -> Option<Resolved<LoanId>> {
    if let Some(loan_id) = extract_loan_id(text, ctx) {
        return Some(Resolved::new(loan_id, EntitySource::Message));
    }
    if let Some(loan_id) = ctx.loan_id().cloned() {
        debug!("Using loan ID from context: {}", loan_id);
        return Some(Resolved::new(loan_id, EntitySource::Context));
    }

    let account = resolve_account_number(text, ctx)?;
    info!(
        "Attempting to find loan ID for account: {}",
        account.value
    );
    let loan_id = table.lookup_loan_id_for_account(&account.value)?;
    ctx.update_loan_id(loan_id.clone());
    info!("Found loan ID for account {}: {}", account.value, loan_id);
    Some(Resolved::new(loan_id, EntitySource::LookupTable))
}
