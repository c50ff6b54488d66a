//! bankdesk-core - entity resolution and specialist agents for the banking desk
//!
//! This crate provides:
//! - Regex entity extraction for account numbers and loan IDs
//! - Per-conversation context that remembers the last-seen entities
//! - The resolution chain (message → context → loan lookup table)
//! - Three specialist agents backed by the banking lookup service
//! - Intent classification and the router seam (keyword or LLM backed)
//! - The turn dispatcher tying it all together

pub mod agents;
pub mod assistant;
pub mod context;
pub mod extract;
pub mod intent;
pub mod loan_table;
pub mod lookup;
pub mod resolve;
pub mod router;
pub mod types;

// Re-export main types for convenience
pub use agents::{
    AgentRegistry, BalanceEnquiryAgent, LoanBalanceAgent, LoanStatusAgent, SpecialistAgent,
};
pub use assistant::{BankingAssistant, TurnOutcome, FALLBACK_REPLY};
pub use context::{ContextStore, ConversationContext, ConversationSummary};
pub use intent::{Intent, classify};
pub use loan_table::{LoanLookupTable, LoanTableError};
pub use lookup::{BankingApi, Endpoint, HttpBankingApi, LookupError};
pub use router::{IntentRouter, KeywordRouter, LlmRouter, LlmRouterConfig, RouteDecision};
pub use types::{AccountNumber, AgentReply, ChatRole, ChatTurn, LoanId};
