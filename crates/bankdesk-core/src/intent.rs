//! Intent classification for banking questions
//!
//! Pure keyword matching, kept separate from the agents so any router
//! backend can reuse it. An explicit `@AgentName` mention always wins.

use serde::{Deserialize, Serialize};

use crate::extract::find_loan_id;
use crate::router::RouteDecision;

pub const BALANCE_ENQUIRY_AGENT: &str = "BalanceEnquiryAgent";
pub const LOAN_BALANCE_AGENT: &str = "LoanBalanceAgent";
pub const LOAN_STATUS_AGENT: &str = "LoanStatusAgent";

const BALANCE_KEYWORDS: &[&str] = &["balance", "account", "check"];
const LOAN_BALANCE_KEYWORDS: &[&str] = &["loan balance", "loan amount", "how much loan"];
const LOAN_STATUS_KEYWORDS: &[&str] = &[
    "loan status",
    "approved",
    "status of loan",
    "loan application",
    "status",
];

/// What the customer is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AccountBalance,
    LoanBalance,
    LoanStatus,
    Unrecognized,
}

impl Intent {
    /// Name of the agent that serves this intent
    pub fn agent_name(&self) -> Option<&'static str> {
        match self {
            Self::AccountBalance => Some(BALANCE_ENQUIRY_AGENT),
            Self::LoanBalance => Some(LOAN_BALANCE_AGENT),
            Self::LoanStatus => Some(LOAN_STATUS_AGENT),
            Self::Unrecognized => None,
        }
    }

    /// Routing decision for this intent, if it names an agent
    pub fn decision_for(&self, message: &str) -> Option<RouteDecision> {
        self.agent_name().map(|agent| RouteDecision::new(agent, message))
    }

    pub fn from_agent_name(name: &str) -> Self {
        match name {
            BALANCE_ENQUIRY_AGENT => Self::AccountBalance,
            LOAN_BALANCE_AGENT => Self::LoanBalance,
            LOAN_STATUS_AGENT => Self::LoanStatus,
            _ => Self::Unrecognized,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountBalance => write!(f, "account_balance"),
            Self::LoanBalance => write!(f, "loan_balance"),
            Self::LoanStatus => write!(f, "loan_status"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

fn is_mentioned(text: &str, agent: &str) -> bool {
    text.contains(&format!("@{}", agent))
}

/// Does the message look like an account balance question?
pub fn wants_account_balance(text: &str) -> bool {
    contains_any(&text.to_lowercase(), BALANCE_KEYWORDS) || is_mentioned(text, BALANCE_ENQUIRY_AGENT)
}

/// Does the message look like a loan balance question?
pub fn wants_loan_balance(text: &str) -> bool {
    contains_any(&text.to_lowercase(), LOAN_BALANCE_KEYWORDS) || is_mentioned(text, LOAN_BALANCE_AGENT)
}

/// Does the message look like a loan status question? A bare loan ID counts.
pub fn wants_loan_status(text: &str) -> bool {
    contains_any(&text.to_lowercase(), LOAN_STATUS_KEYWORDS)
        || is_mentioned(text, LOAN_STATUS_AGENT)
        || find_loan_id(text).is_some()
}

/// First `@Agent` mention of one of the three known agents, by position
pub fn mentioned_agent(text: &str) -> Option<&'static str> {
    [BALANCE_ENQUIRY_AGENT, LOAN_BALANCE_AGENT, LOAN_STATUS_AGENT]
        .into_iter()
        .filter_map(|agent| text.find(&format!("@{}", agent)).map(|pos| (pos, agent)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, agent)| agent)
}

/// Classify a message. Most specific intent first: loan balance beats loan
/// status (a bare loan ID or "status"), which beats the broad balance words.
pub fn classify(text: &str) -> Intent {
    if let Some(agent) = mentioned_agent(text) {
        return Intent::from_agent_name(agent);
    }
    if wants_loan_balance(text) {
        Intent::LoanBalance
    } else if wants_loan_status(text) {
        Intent::LoanStatus
    } else if wants_account_balance(text) {
        Intent::AccountBalance
    } else {
        Intent::Unrecognized
    }
}
