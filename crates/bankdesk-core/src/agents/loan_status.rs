//! Loan status agent
//!
//! The only agent with a third resolution step: when no loan ID is known it
//! tries to derive one from the customer's account number.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{SpecialistAgent, lookup_reply};
use crate::context::ConversationContext;
use crate::intent::{Intent, LOAN_STATUS_AGENT, wants_loan_status};
use crate::loan_table::LoanLookupTable;
use crate::lookup::{BankingApi, Endpoint};
use crate::resolve::resolve_loan_id;

pub const MISSING_LOAN_REPLY: &str = "I need a loan ID (format: LNxxxx) to check your loan status. Please provide a valid loan ID.";
pub const NOT_RETRIEVED_REPLY: &str = "Sorry, I couldn't retrieve your loan status at this time.";

pub struct LoanStatusAgent {
    api: Arc<dyn BankingApi>,
    table: Arc<LoanLookupTable>,
}

impl LoanStatusAgent {
    pub fn new(api: Arc<dyn BankingApi>, table: Arc<LoanLookupTable>) -> Self {
        Self { api, table }
    }
}

#[async_trait]
impl SpecialistAgent for LoanStatusAgent {
    fn name(&self) -> &str {
        LOAN_STATUS_AGENT
    }

    fn intent(&self) -> Intent {
        Intent::LoanStatus
    }

    fn accepts(&self, text: &str) -> bool {
        wants_loan_status(text)
    }

    async fn respond(&self, text: &str, ctx: &mut ConversationContext) -> String {
        let Some(loan_id) = resolve_loan_id(text, ctx, &self.table) else {
            return MISSING_LOAN_REPLY.to_string();
        };
        info!("Using loan ID {} ({:?})", loan_id.value, loan_id.source);
        lookup_reply(
            self.api.as_ref(),
            Endpoint::LoanStatus,
            loan_id.value.as_str(),
            NOT_RETRIEVED_REPLY,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CONNECTION_ERROR_REPLY;
    use crate::agents::testing::FakeBankingApi;
    use crate::types::{AccountNumber, AgentReply, LoanId};

    fn agent() -> (LoanStatusAgent, Arc<FakeBankingApi>) {
        let api = Arc::new(FakeBankingApi::sample());
        let agent = LoanStatusAgent::new(api.clone(), Arc::new(LoanLookupTable::builtin()));
        (agent, api)
    }

    #[tokio::test]
    async fn test_status_from_message() {
        let (agent, _api) = agent();
        let mut ctx = ConversationContext::new("c1");
        let reply = agent
            .handle("What's the status of loan LN1001?", &mut ctx)
            .await;
        assert_eq!(
            reply,
            AgentReply::Handled("Loan ID LN1001 is currently 'Approved'.".to_string())
        );
        assert_eq!(ctx.loan_id(), Some(&LoanId::new("LN1001")));
    }

    #[tokio::test]
    async fn test_bare_loan_id_is_accepted() {
        let (agent, _api) = agent();
        let mut ctx = ConversationContext::new("c1");
        let reply = agent.handle("LN1002", &mut ctx).await;
        assert_eq!(
            reply,
            AgentReply::Handled("Loan ID LN1002 is currently 'Pending'.".to_string())
        );
    }

    #[tokio::test]
    async fn test_status_derived_from_known_account() {
        let (agent, api) = agent();
        let mut ctx = ConversationContext::new("c1");
        ctx.update_account_number(AccountNumber::new("123456789"));

        let reply = agent.handle("what's the loan status", &mut ctx).await;
        assert_eq!(
            reply,
            AgentReply::Handled("Loan ID LN1001 is currently 'Approved'.".to_string())
        );
        assert_eq!(api.calls(), vec![(Endpoint::LoanStatus, "LN1001".to_string())]);
        assert_eq!(ctx.loan_id(), Some(&LoanId::new("LN1001")));
    }

    #[tokio::test]
    async fn test_missing_loan_id_asks_without_calling_service() {
        let (agent, api) = agent();
        let mut ctx = ConversationContext::new("c1");
        let reply = agent.handle("is my loan approved?", &mut ctx).await;
        assert_eq!(reply, AgentReply::Handled(MISSING_LOAN_REPLY.to_string()));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_cannot_derive() {
        let (agent, api) = agent();
        let mut ctx = ConversationContext::new("c1");
        let reply = agent
            .respond("loan status for account 555555555", &mut ctx)
            .await;
        assert_eq!(reply, MISSING_LOAN_REPLY);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_loan_id() {
        let (agent, _api) = agent();
        let mut ctx = ConversationContext::new("c1");
        let reply = agent.respond("status of LN9999", &mut ctx).await;
        assert_eq!(reply, NOT_RETRIEVED_REPLY);
    }

    #[tokio::test]
    async fn test_service_failure() {
        let agent = LoanStatusAgent::new(
            Arc::new(FakeBankingApi::broken()),
            Arc::new(LoanLookupTable::builtin()),
        );
        let mut ctx = ConversationContext::new("c1");
        assert_eq!(
            agent.respond("status of LN1001", &mut ctx).await,
            CONNECTION_ERROR_REPLY
        );
    }

    #[tokio::test]
    async fn test_declines_without_keywords_or_loan_id() {
        let (agent, _api) = agent();
        let mut ctx = ConversationContext::new("c1");
        assert_eq!(
            agent.handle("what's my balance", &mut ctx).await,
            AgentReply::Declined
        );
    }
}
