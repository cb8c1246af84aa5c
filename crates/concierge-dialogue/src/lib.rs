//! Conversation flow control: turns user selections and free text into the
//! next prompt, paces output, and talks to the remote responder and the
//! interaction log.

pub mod engine;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod presenter;
pub mod state;

pub use engine::{DialogueEngine, Outcome, PendingExchange, SessionSnapshot};
pub use error::{DialogueError, GatewayError};
pub use gateway::{HttpResponder, OfflineResponder, RemoteReply, Responder};
pub use logger::{HttpInteractionLog, InteractionLog, MemoryInteractionLog, NoopInteractionLog};
pub use presenter::{MemorySurface, Presenter, RenderedTurn, Surface};
pub use state::DialogueState;
