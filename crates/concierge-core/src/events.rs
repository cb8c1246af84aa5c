use serde::{Deserialize, Serialize};

use crate::types::{AuxLink, OptionTarget, QuickReply};

/// Monotonic identifier of one rendered turn within a presenter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub u64);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One selectable option as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub label: String,
    pub target: OptionTarget,
}

/// One quick-reply button as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyView {
    pub label: String,
    pub reply: QuickReply,
}

/// Everything the presentation layer can be asked to draw.
///
/// Front-ends consume these in order from a `Surface`. Ordering is guaranteed
/// within one turn; reveal tokens of different turns may interleave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum RenderEvent {
    // =========================================================================
    // Turns
    // =========================================================================
    /// A bot message. When `reveal` is set the body arrives as `RevealToken`s
    /// and `links` stay inert until `RevealComplete`.
    BotTurn {
        turn: TurnId,
        text: String,
        links: Vec<AuxLink>,
        reveal: bool,
    },

    /// One whitespace-delimited token of a revealing bot turn.
    RevealToken {
        turn: TurnId,
        index: usize,
        token: String,
    },

    /// All tokens of a revealing turn were released; links become clickable.
    RevealComplete { turn: TurnId },

    /// An echo of what the user typed or clicked.
    UserTurn { turn: TurnId, text: String },

    // =========================================================================
    // Choices
    // =========================================================================
    Options {
        turn: TurnId,
        prompt: String,
        options: Vec<OptionView>,
    },

    QuickReplies {
        turn: TurnId,
        prompt: String,
        replies: Vec<QuickReplyView>,
    },

    // =========================================================================
    // Chrome
    // =========================================================================
    PendingShown,
    PendingHidden,
    /// The transcript was wiped (language switch).
    Cleared,
}

impl RenderEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            RenderEvent::BotTurn { .. } => "bot_turn",
            RenderEvent::RevealToken { .. } => "reveal_token",
            RenderEvent::RevealComplete { .. } => "reveal_complete",
            RenderEvent::UserTurn { .. } => "user_turn",
            RenderEvent::Options { .. } => "options",
            RenderEvent::QuickReplies { .. } => "quick_replies",
            RenderEvent::PendingShown => "pending_shown",
            RenderEvent::PendingHidden => "pending_hidden",
            RenderEvent::Cleared => "cleared",
        }
    }

    /// The turn this event belongs to, if any.
    pub fn turn(&self) -> Option<TurnId> {
        match self {
            RenderEvent::BotTurn { turn, .. }
            | RenderEvent::RevealToken { turn, .. }
            | RenderEvent::RevealComplete { turn }
            | RenderEvent::UserTurn { turn, .. }
            | RenderEvent::Options { turn, .. }
            | RenderEvent::QuickReplies { turn, .. } => Some(*turn),
            RenderEvent::PendingShown | RenderEvent::PendingHidden | RenderEvent::Cleared => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKey;

    #[test]
    fn test_event_name_matches_serde_tag() {
        let events = vec![
            RenderEvent::BotTurn {
                turn: TurnId(1),
                text: "hi".to_string(),
                links: vec![],
                reveal: false,
            },
            RenderEvent::RevealToken {
                turn: TurnId(1),
                index: 0,
                token: "hi".to_string(),
            },
            RenderEvent::RevealComplete { turn: TurnId(1) },
            RenderEvent::UserTurn {
                turn: TurnId(2),
                text: "help".to_string(),
            },
            RenderEvent::Options {
                turn: TurnId(3),
                prompt: "Pick".to_string(),
                options: vec![],
            },
            RenderEvent::QuickReplies {
                turn: TurnId(4),
                prompt: "More?".to_string(),
                replies: vec![],
            },
            RenderEvent::PendingShown,
            RenderEvent::PendingHidden,
            RenderEvent::Cleared,
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_name());
        }
    }

    #[test]
    fn test_options_roundtrip_keeps_targets() {
        let event = RenderEvent::Options {
            turn: TurnId(7),
            prompt: "How can I help?".to_string(),
            options: vec![OptionView {
                label: "Settlement Help".to_string(),
                target: OptionTarget::Node(NodeKey::SettlementHelp),
            }],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: RenderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_turn_accessor() {
        assert_eq!(
            RenderEvent::RevealComplete { turn: TurnId(9) }.turn(),
            Some(TurnId(9))
        );
        assert_eq!(RenderEvent::Cleared.turn(), None);
        assert_eq!(TurnId(3).to_string(), "#3");
    }
}
