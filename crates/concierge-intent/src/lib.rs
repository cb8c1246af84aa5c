//! Free-text routing: map what a visitor typed to a menu node, a request
//! for clarification, or nothing (so the remote responder answers).

pub mod classifier;
pub mod rules;

pub use classifier::{Classification, IntentClassifier};
pub use rules::{Rule, RuleSet};
