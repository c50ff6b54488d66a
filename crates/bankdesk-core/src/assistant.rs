//! Turn dispatcher — router, agents and conversation context in one place

use anyhow::{Result, anyhow};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::AgentRegistry;
use crate::context::ContextStore;
use crate::router::IntentRouter;
use crate::types::{AgentReply, ChatTurn};

/// Reply for turns no specialist takes
pub const FALLBACK_REPLY: &str = "I can help with account balances, loan balances, and loan status. Please tell me which one you need.";

/// What came out of one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// The agent that answered; `None` when the fallback reply was used
    pub agent: Option<String>,
    pub reply: String,
}

impl TurnOutcome {
    fn fallback() -> Self {
        Self {
            agent: None,
            reply: FALLBACK_REPLY.to_string(),
        }
    }
}

/// Routes each customer message to a specialist, keeping one context per
/// conversation
pub struct BankingAssistant {
    registry: AgentRegistry,
    router: Arc<dyn IntentRouter>,
    contexts: Arc<ContextStore>,
}

impl BankingAssistant {
    pub fn new(registry: AgentRegistry, router: Arc<dyn IntentRouter>) -> Self {
        Self {
            registry,
            router,
            contexts: Arc::new(ContextStore::new()),
        }
    }

    /// Share an existing context store
    pub fn with_contexts(mut self, contexts: Arc<ContextStore>) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn contexts(&self) -> &Arc<ContextStore> {
        &self.contexts
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn router_backend(&self) -> &str {
        self.router.backend()
    }

    /// Process one customer message in `conversation_id`.
    ///
    /// Never fails: routing problems and declines turn into [`FALLBACK_REPLY`].
    pub async fn handle_turn(&self, conversation_id: &str, text: &str) -> TurnOutcome {
        let shared = self.contexts.get_or_create(conversation_id).await;
        let mut ctx = shared.lock().await;
        ctx.push_turn(ChatTurn::user(text));

        let decision = self.router.route(ctx.history()).await;
        let outcome = match decision {
            Ok(decision) => match self.registry.get(&decision.agent) {
                Some(agent) => {
                    info!(
                        "Conversation {}: routed to {} via {}",
                        conversation_id,
                        decision.agent,
                        self.router.backend()
                    );
                    match agent.handle(&decision.directed_text(), &mut ctx).await {
                        AgentReply::Handled(reply) => TurnOutcome {
                            agent: Some(agent.name().to_string()),
                            reply,
                        },
                        AgentReply::Declined => {
                            warn!("{} declined a routed message", decision.agent);
                            TurnOutcome::fallback()
                        }
                    }
                }
                None => {
                    warn!("Router picked unknown agent '{}'", decision.agent);
                    TurnOutcome::fallback()
                }
            },
            Err(e) => {
                info!("Conversation {}: no handler found ({})", conversation_id, e);
                TurnOutcome::fallback()
            }
        };

        ctx.push_turn(ChatTurn::assistant(outcome.reply.clone()));
        outcome
    }

    /// Offer a message straight to one agent, skipping the router.
    ///
    /// The agent may decline. An unknown agent name is an error.
    pub async fn handle_direct(
        &self,
        conversation_id: &str,
        agent_name: &str,
        text: &str,
    ) -> Result<AgentReply> {
        let agent = self.registry.get(agent_name).ok_or_else(|| {
            anyhow!(
                "Unknown agent '{}'. Available: {}",
                agent_name,
                self.registry.list().join(", ")
            )
        })?;

        let shared = self.contexts.get_or_create(conversation_id).await;
        let mut ctx = shared.lock().await;
        ctx.push_turn(ChatTurn::user(text));
        let reply = agent.handle(text, &mut ctx).await;
        if let AgentReply::Handled(ref text) = reply {
            ctx.push_turn(ChatTurn::assistant(text.clone()));
        }
        Ok(reply)
    }
}
