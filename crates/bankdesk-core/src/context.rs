//! Conversation context — the entities a conversation has already mentioned
//!
//! Each conversation gets its own [`ConversationContext`], owned by the
//! [`ContextStore`] and handed to agents by `&mut` for the duration of a turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::types::{AccountNumber, ChatTurn, LoanId};

/// Maximum number of turns kept per conversation for routing
pub const MAX_HISTORY: usize = 50;

/// Last-seen entities and recent turns of one conversation.
///
/// A field holds either nothing or the most recently extracted value of its
/// kind. Values are never rolled back.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    id: String,
    account_number: Option<AccountNumber>,
    loan_id: Option<LoanId>,
    history: Vec<ChatTurn>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            account_number: None,
            loan_id: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account_number(&self) -> Option<&AccountNumber> {
        self.account_number.as_ref()
    }

    pub fn loan_id(&self) -> Option<&LoanId> {
        self.loan_id.as_ref()
    }

    pub fn update_account_number(&mut self, account_number: AccountNumber) {
        info!(
            "Context {} updated: account_number = {}",
            self.id, account_number
        );
        self.account_number = Some(account_number);
        self.updated_at = Utc::now();
    }

    pub fn update_loan_id(&mut self, loan_id: LoanId) {
        info!("Context {} updated: loan_id = {}", self.id, loan_id);
        self.loan_id = Some(loan_id);
        self.updated_at = Utc::now();
    }

    /// Append a turn, dropping the oldest once [`MAX_HISTORY`] is exceeded
    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.history.push(turn);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
        self.updated_at = Utc::now();
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            account_number: self.account_number.clone(),
            loan_id: self.loan_id.clone(),
            turns: self.history.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only snapshot of a conversation, for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub account_number: Option<AccountNumber>,
    pub loan_id: Option<LoanId>,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shared handle to one conversation's context
pub type SharedContext = Arc<Mutex<ConversationContext>>;

/// Owns every live conversation context, keyed by conversation id.
///
/// Whoever processes a turn holds that conversation's mutex until the reply
/// is produced, so turns of the same conversation never interleave.
pub struct ContextStore {
    contexts: RwLock<HashMap<String, SharedContext>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Start a conversation with a fresh id
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.get_or_create(&id).await;
        info!("Created conversation {}", id);
        id
    }

    /// Get a conversation's context, creating an empty one on first use
    pub async fn get_or_create(&self, id: &str) -> SharedContext {
        if let Some(ctx) = self.contexts.read().await.get(id) {
            return ctx.clone();
        }
        let mut contexts = self.contexts.write().await;
        contexts
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("New conversation context {}", id);
                Arc::new(Mutex::new(ConversationContext::new(id)))
            })
            .clone()
    }

    pub async fn get(&self, id: &str) -> Option<SharedContext> {
        self.contexts.read().await.get(id).cloned()
    }

    /// Summaries of all conversations, most recently active first
    pub async fn list(&self) -> Vec<ConversationSummary> {
        let handles: Vec<SharedContext> = self.contexts.read().await.values().cloned().collect();
        let mut list = Vec::with_capacity(handles.len());
        for handle in handles {
            list.push(handle.lock().await.summary());
        }
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.contexts.write().await.remove(id).is_some();
        if removed {
            info!("Removed conversation {}", id);
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.contexts.read().await.len()
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = ConversationContext::new("c1");
        assert_eq!(ctx.id(), "c1");
        assert!(ctx.account_number().is_none());
        assert!(ctx.loan_id().is_none());
        assert!(ctx.history().is_empty());
    }

    #[test]
    fn test_updates_overwrite() {
        let mut ctx = ConversationContext::new("c1");
        ctx.update_account_number(AccountNumber::new("123456789"));
        ctx.update_account_number(AccountNumber::new("987654321"));
        assert_eq!(ctx.account_number(), Some(&AccountNumber::new("987654321")));

        ctx.update_loan_id(LoanId::new("LN1001"));
        assert_eq!(ctx.loan_id(), Some(&LoanId::new("LN1001")));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut ctx = ConversationContext::new("c1");
        ctx.update_account_number(AccountNumber::new("123456789"));
        let first = (ctx.account_number().cloned(), ctx.loan_id().cloned());
        ctx.update_account_number(AccountNumber::new("123456789"));
        let second = (ctx.account_number().cloned(), ctx.loan_id().cloned());
        assert_eq!(first, second);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ctx = ConversationContext::new("c1");
        for i in 0..(MAX_HISTORY + 5) {
            ctx.push_turn(ChatTurn::user(format!("message {}", i)));
        }
        assert_eq!(ctx.history().len(), MAX_HISTORY);
        assert_eq!(ctx.history()[0].content, "message 5");
    }

    #[tokio::test]
    async fn test_store_get_or_create_returns_same_context() {
        let store = ContextStore::new();
        let a = store.get_or_create("alice").await;
        a.lock()
            .await
            .update_account_number(AccountNumber::new("123456789"));

        let again = store.get_or_create("alice").await;
        assert_eq!(
            again.lock().await.account_number(),
            Some(&AccountNumber::new("123456789"))
        );
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_store_keeps_conversations_apart() {
        let store = ContextStore::new();
        store
            .get_or_create("alice")
            .await
            .lock()
            .await
            .update_loan_id(LoanId::new("LN1001"));

        let bob = store.get_or_create("bob").await;
        assert!(bob.lock().await.loan_id().is_none());
    }

    #[tokio::test]
    async fn test_store_create_and_remove() {
        let store = ContextStore::new();
        let id = store.create().await;
        assert!(store.get(&id).await.is_some());
        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert!(store.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_store_list_sorted_by_activity() {
        let store = ContextStore::new();
        store.get_or_create("older").await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        store
            .get_or_create("newer")
            .await
            .lock()
            .await
            .push_turn(ChatTurn::user("hi"));

        let list = store.list().await;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "newer");
        assert_eq!(list[0].turns, 1);
    }
}
