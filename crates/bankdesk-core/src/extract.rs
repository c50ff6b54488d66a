//! Entity extraction — account numbers and loan IDs from free text
//!
//! Both extractors use the regex engine's Unicode word boundary (`\b`), so a
//! digit run glued to letters ("AB1234567") or a loan ID inside a longer
//! token ("XLN1001") never matches. Lookup table keys are full digit runs,
//! which keeps them consistent with what the extractor can produce.
//!
//! Only the first match in a message is used.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::ConversationContext;
use crate::types::{AccountNumber, LoanId};

static ACCOUNT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{6,}\b").expect("account number pattern is valid"));

static LOAN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bLN[0-9]+\b").expect("loan id pattern is valid"));

/// First standalone run of six or more digits, without touching any context
pub fn find_account_number(text: &str) -> Option<AccountNumber> {
    ACCOUNT_NUMBER_RE
        .find(text)
        .map(|m| AccountNumber::new(m.as_str()))
}

/// First standalone `LN<digits>` token, without touching any context
pub fn find_loan_id(text: &str) -> Option<LoanId> {
    LOAN_ID_RE.find(text).map(|m| LoanId::new(m.as_str()))
}

/// Extract an account number and remember it in the conversation context.
pub fn extract_account_number(
    text: &str,
    ctx: &mut ConversationContext,
) -> Option<AccountNumber> {
    let account = find_account_number(text)?;
    ctx.update_account_number(account.clone());
    Some(account)
}

/// Extract a loan ID and remember it in the conversation context.
pub fn extract_loan_id(text: &str, ctx: &mut ConversationContext) -> Option<LoanId> {
    let loan_id = find_loan_id(text)?;
    ctx.update_loan_id(loan_id.clone());
    Some(loan_id)
}
