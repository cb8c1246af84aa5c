use concierge_core::{Language, NodeKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::RuleSet;

/// Inputs with at most this many whitespace-delimited tokens are too short
/// to route and get a clarification prompt instead.
pub const CLARIFY_MAX_TOKENS: usize = 2;

/// Where a free-text message should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "node", rename_all = "snake_case")]
pub enum Classification {
    /// Too short to understand; ask for more detail.
    Clarify,
    /// Answer locally as if this node had been selected.
    Branch(NodeKey),
    /// No local rule applies; ask the remote responder.
    Unmatched,
}

/// Deterministic keyword classifier.
///
/// The short-input check runs before any keyword rule, so a two-word
/// message never reaches category logic.
#[derive(Debug, Default)]
pub struct IntentClassifier {
    rules: RuleSet,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn classify(&self, text: &str, language: Language) -> Classification {
        let tokens = text.split_whitespace().count();
        if tokens <= CLARIFY_MAX_TOKENS {
            debug!(tokens, language = %language, "Input too short, asking for clarification");
            return Classification::Clarify;
        }

        let lower = text.to_lowercase();
        match self.rules.first_match(&lower) {
            Some(rule) => {
                debug!(rule = rule.name, node = %rule.target, language = %language, "Matched intent rule");
                Classification::Branch(rule.target)
            }
            None => {
                debug!(language = %language, "No intent rule matched");
                Classification::Unmatched
            }
        }
    }
}
