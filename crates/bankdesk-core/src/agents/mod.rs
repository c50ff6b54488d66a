//! Specialist agents — one per banking intent
//!
//! Each agent decides whether a message is for it, resolves the identifier
//! it needs, asks the lookup service, and turns the outcome into text. No
//! failure ever escapes an agent: missing identifiers become a
//! clarification, lookup failures become a fixed apology.

pub mod balance;
pub mod loan_balance;
pub mod loan_status;
pub mod registry;

pub use balance::BalanceEnquiryAgent;
pub use loan_balance::LoanBalanceAgent;
pub use loan_status::LoanStatusAgent;
pub use registry::AgentRegistry;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::context::ConversationContext;
use crate::intent::Intent;
use crate::lookup::{BankingApi, Endpoint};
use crate::types::AgentReply;

pub const CONNECTION_ERROR_REPLY: &str =
    "Sorry, there was an error connecting to the banking system.";

/// A specialist that answers one kind of banking question
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    /// Agent name, as used in `@Name` mentions
    fn name(&self) -> &str;

    fn intent(&self) -> Intent;

    /// Whether this message is for this agent
    fn accepts(&self, text: &str) -> bool;

    /// Resolve, look up, and phrase the answer. Always produces a reply.
    async fn respond(&self, text: &str, ctx: &mut ConversationContext) -> String;

    /// Offer a message to the agent; declines when [`Self::accepts`] is false
    async fn handle(&self, text: &str, ctx: &mut ConversationContext) -> AgentReply {
        if !self.accepts(text) {
            debug!("{} declined message", self.name());
            return AgentReply::Declined;
        }
        info!("{} inquiry detected: {}", self.name(), text);
        let reply = self.respond(text, ctx).await;
        info!("{} returning: {}", self.name(), reply);
        AgentReply::Handled(reply)
    }
}

/// Run one lookup and map every outcome to user-facing text
pub(crate) async fn lookup_reply(
    api: &dyn BankingApi,
    endpoint: Endpoint,
    value: &str,
    rejected_reply: &str,
) -> String {
    match api.query(endpoint, value).await {
        Ok(text) => text,
        Err(e) if e.is_rejection() => {
            info!("Lookup {} for {} rejected: {}", endpoint, value, e);
            rejected_reply.to_string()
        }
        Err(e) => {
            error!("Error in {} lookup: {}", endpoint, e);
            CONNECTION_ERROR_REPLY.to_string()
        }
    }
}
