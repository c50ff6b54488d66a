//! Account balance agent

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{SpecialistAgent, lookup_reply};
use crate::context::ConversationContext;
use crate::intent::{BALANCE_ENQUIRY_AGENT, Intent, wants_account_balance};
use crate::lookup::{BankingApi, Endpoint};
use crate::resolve::resolve_account_number;

pub const MISSING_ACCOUNT_REPLY: &str =
    "I need an account number to check your balance. Please provide a valid account number.";
pub const NOT_RETRIEVED_REPLY: &str =
    "Sorry, I couldn't retrieve your account balance at this time.";

pub struct BalanceEnquiryAgent {
    api: Arc<dyn BankingApi>,
}

impl BalanceEnquiryAgent {
    pub fn new(api: Arc<dyn BankingApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SpecialistAgent for BalanceEnquiryAgent {
    fn name(&self) -> &str {
        BALANCE_ENQUIRY_AGENT
    }

    fn intent(&self) -> Intent {
        Intent::AccountBalance
    }

    fn accepts(&self, text: &str) -> bool {
        wants_account_balance(text)
    }

    async fn respond(&self, text: &str, ctx: &mut ConversationContext) -> String {
        let Some(account) = resolve_account_number(text, ctx) else {
            return MISSING_ACCOUNT_REPLY.to_string();
        };
        info!(
            "Using account number {} ({:?})",
            account.value, account.source
        );
        lookup_reply(
            self.api.as_ref(),
            Endpoint::BalanceEnquiry,
            account.value.as_str(),
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
    use crate::types::{AccountNumber, AgentReply};

    fn agent() -> (BalanceEnquiryAgent, Arc<FakeBankingApi>) {
        let api = Arc::new(FakeBankingApi::sample());
        (BalanceEnquiryAgent::new(api.clone()), api)
    }

    #[tokio::test]
    async fn test_balance_from_message() {
        let (agent, api) = agent();
        let mut ctx = ConversationContext::new("c1");

        let reply = agent
            .handle("What's my balance for account 123456789?", &mut ctx)
            .await;
        assert_eq!(
            reply,
            AgentReply::Handled("Available account balance for 123456789 is $4500".to_string())
        );
        assert_eq!(
            api.calls(),
            vec![(Endpoint::BalanceEnquiry, "123456789".to_string())]
        );
        assert_eq!(ctx.account_number(), Some(&AccountNumber::new("123456789")));
    }

    #[tokio::test]
    async fn test_balance_from_context() {
        let (agent, _api) = agent();
        let mut ctx = ConversationContext::new("c1");
        ctx.update_account_number(AccountNumber::new("987654321"));

        let reply = agent.respond("check my balance again", &mut ctx).await;
        assert_eq!(reply, "Available account balance for 987654321 is $1500.75");
    }

    #[tokio::test]
    async fn test_missing_account_asks_without_calling_service() {
        let (agent, api) = agent();
        let mut ctx = ConversationContext::new("c1");

        let reply = agent.handle("what's my balance?", &mut ctx).await;
        assert_eq!(reply, AgentReply::Handled(MISSING_ACCOUNT_REPLY.to_string()));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (agent, _api) = agent();
        let mut ctx = ConversationContext::new("c1");
        let reply = agent.respond("balance for 555555555", &mut ctx).await;
        assert_eq!(reply, NOT_RETRIEVED_REPLY);
    }

    #[tokio::test]
    async fn test_service_failure() {
        let agent = BalanceEnquiryAgent::new(Arc::new(FakeBankingApi::broken()));
        let mut ctx = ConversationContext::new("c1");
        let reply = agent.respond("balance for 123456789", &mut ctx).await;
        assert_eq!(reply, CONNECTION_ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_declines_unrelated_message() {
        let (agent, api) = agent();
        let mut ctx = ConversationContext::new("c1");
        assert_eq!(agent.handle("hello there", &mut ctx).await, AgentReply::Declined);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_accepts_direct_mention() {
        let (agent, _api) = agent();
        assert!(agent.accepts("@BalanceEnquiryAgent 123456789"));
    }
}
