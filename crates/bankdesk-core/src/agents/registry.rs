//! Agent registry — looks up specialists by name or intent

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{BalanceEnquiryAgent, LoanBalanceAgent, LoanStatusAgent, SpecialistAgent};
use crate::intent::Intent;
use crate::loan_table::LoanLookupTable;
use crate::lookup::BankingApi;

/// Holds the registered specialists, keyed by agent name
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn SpecialistAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// The standard desk: balance enquiry, loan balance and loan status
    pub fn banking(api: Arc<dyn BankingApi>, table: Arc<LoanLookupTable>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BalanceEnquiryAgent::new(api.clone())));
        registry.register(Arc::new(LoanBalanceAgent::new(api.clone())));
        registry.register(Arc::new(LoanStatusAgent::new(api, table)));
        registry
    }

    pub fn register(&mut self, agent: Arc<dyn SpecialistAgent>) {
        info!(
            "AgentRegistry: registered '{}' for {}",
            agent.name(),
            agent.intent()
        );
        self.agents.insert(agent.name().to_string(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SpecialistAgent>> {
        self.agents.get(name).cloned()
    }

    /// The agent serving `intent`, if one is registered
    pub fn for_intent(&self, intent: Intent) -> Option<Arc<dyn SpecialistAgent>> {
        let found = self.agents.values().find(|a| a.intent() == intent).cloned();
        debug!(
            "AgentRegistry: {} → {:?}",
            intent,
            found.as_ref().map(|a| a.name().to_string())
        );
        found
    }

    /// Registered agent names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn count(&self) -> usize {
        self.agents.len()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
