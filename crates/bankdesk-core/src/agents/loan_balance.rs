//! Loan balance agent

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{SpecialistAgent, lookup_reply};
use crate::context::ConversationContext;
use crate::intent::{Intent, LOAN_BALANCE_AGENT, wants_loan_balance};
use crate::lookup::{BankingApi, Endpoint};
use crate::resolve::resolve_account_number;

pub const MISSING_ACCOUNT_REPLY: &str = "I need an account number to check your loan balance. Please provide a valid account number.";
pub const NOT_RETRIEVED_REPLY: &str = "Sorry, I couldn't retrieve your loan balance at this time.";

pub struct LoanBalanceAgent {
    api: Arc<dyn BankingApi>,
}

impl LoanBalanceAgent {
    pub fn new(api: Arc<dyn BankingApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SpecialistAgent for LoanBalanceAgent {
    fn name(&self) -> &str {
        LOAN_BALANCE_AGENT
    }

    fn intent(&self) -> Intent {
        Intent::LoanBalance
    }

    fn accepts(&self, text: &str) -> bool {
        wants_loan_balance(text)
    }

    async fn respond(&self, text: &str, ctx: &mut ConversationContext) -> String {
        let Some(account) = resolve_account_number(text, ctx) else {
            return MISSING_ACCOUNT_REPLY.to_string();
        };
        info!("Using account number {} for loan balance", account.value);
        lookup_reply(
            self.api.as_ref(),
            Endpoint::LoanBalance,
            account.value.as_str(),
            NOT_RETRIEVED_REPLY,
        )
        .await
    }
}
