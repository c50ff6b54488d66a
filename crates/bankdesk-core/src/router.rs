//! Routing — pick the specialist for the latest customer message
//!
//! Two backends behind [`IntentRouter`]: the deterministic
//! [`KeywordRouter`], and [`LlmRouter`], which asks an OpenAI-compatible
//! chat model to tag an agent and falls back to keywords when the model is
//! unavailable or answers with something unusable.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::intent;
use crate::types::{ChatRole, ChatTurn};

const ROUTER_SYSTEM_PROMPT: &str = "\
You are the router of a banking assistant. Decide what the customer wants and \
hand the request to exactly one of these agents:

- LoanBalanceAgent: questions about how much is left on a loan.
- BalanceEnquiryAgent: questions about an account balance.
- LoanStatusAgent: questions about whether a loan is approved, or its status.

Never answer the customer yourself. Reply with '@AgentName' followed by the \
customer's full original message, for example:

@LoanBalanceAgent What's my loan balance for account 123456?
@BalanceEnquiryAgent What's my balance for account 789012?
@LoanStatusAgent What's the status of loan LN1001?

Always tag one of these agents and always include the complete message.";

/// Where a message should go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Name of the target agent
    pub agent: String,
    /// The customer's message, unchanged
    pub message: String,
}

impl RouteDecision {
    pub fn new(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// The message addressed to the agent, `@Agent <message>`
    pub fn directed_text(&self) -> String {
        format!("@{} {}", self.agent, self.message)
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no user message to route")]
    EmptyConversation,
    #[error("could not classify message: {0}")]
    Unclassified(String),
}

/// Anything that can choose an agent for a conversation
#[async_trait]
pub trait IntentRouter: Send + Sync {
    fn backend(&self) -> &str;

    /// Route the latest user message in `history`
    async fn route(&self, history: &[ChatTurn]) -> Result<RouteDecision, RouteError>;
}

fn latest_user_message(history: &[ChatTurn]) -> Result<&str, RouteError> {
    history
        .iter()
        .rev()
        .find(|t| t.role == ChatRole::User)
        .map(|t| t.content.as_str())
        .ok_or(RouteError::EmptyConversation)
}

/// Deterministic router built on [`intent::classify`]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRouter;

impl KeywordRouter {
    pub fn route_text(&self, text: &str) -> Result<RouteDecision, RouteError> {
        let intent = intent::classify(text);
        debug!("Keyword router classified message as {}", intent);
        intent
            .decision_for(text)
            .ok_or_else(|| RouteError::Unclassified(text.to_string()))
    }
}

#[async_trait]
impl IntentRouter for KeywordRouter {
    fn backend(&self) -> &str {
        "keyword"
    }

    async fn route(&self, history: &[ChatTurn]) -> Result<RouteDecision, RouteError> {
        self.route_text(latest_user_message(history)?)
    }
}

/// Pick the agent tagged in a router reply (`@AgentName ...`).
///
/// Only the tag is taken from the model. The decision always carries the
/// customer's original message, so identifiers come from what the customer
/// typed and never from the model's echo.
pub fn parse_router_reply(reply: &str, original: &str) -> Option<RouteDecision> {
    let agent = intent::mentioned_agent(reply)?;
    Some(RouteDecision::new(agent, original))
}

/// Settings for the LLM-backed router
#[derive(Clone)]
pub struct LlmRouterConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmRouterConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for LlmRouterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Router that asks an OpenAI-compatible chat model
pub struct LlmRouter {
    client: Client,
    config: LlmRouterConfig,
    fallback: KeywordRouter,
}

impl std::fmt::Debug for LlmRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmRouter")
            .field("config", &self.config)
            .finish()
    }
}

impl LlmRouter {
    pub fn new(config: LlmRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config,
            fallback: KeywordRouter,
        })
    }

    fn to_wire_messages(history: &[ChatTurn]) -> Vec<WireMessage> {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: ROUTER_SYSTEM_PROMPT.to_string(),
        }];
        messages.extend(history.iter().map(|t| WireMessage {
            role: t.role.to_string(),
            content: t.content.clone(),
        }));
        messages
    }

    /// One chat completion; returns the model's text
    async fn complete(&self, history: &[ChatTurn]) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = CompletionRequest {
            model: self.config.model.clone(),
            messages: Self::to_wire_messages(history),
            temperature: self.config.temperature,
        };

        debug!(
            "Sending routing request with {} messages to {}",
            body.messages.len(),
            url
        );

        let mut request = self.client.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }
        let response = request
            .send()
            .await
            .context("Failed to send routing request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Routing request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse routing response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Routing response had no content"))
    }
}

#[async_trait]
impl IntentRouter for LlmRouter {
    fn backend(&self) -> &str {
        "llm"
    }

    async fn route(&self, history: &[ChatTurn]) -> Result<RouteDecision, RouteError> {
        let original = latest_user_message(history)?;

        match self.complete(history).await {
            Ok(reply) => {
                if let Some(decision) = parse_router_reply(&reply, original) {
                    info!("LLM routed message to {}", decision.agent);
                    return Ok(decision);
                }
                warn!("LLM router reply had no agent tag: {:?}", reply);
            }
            Err(e) => {
                warn!("LLM routing failed, using keywords: {}", e);
            }
        }

        self.fallback.route_text(original)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}
