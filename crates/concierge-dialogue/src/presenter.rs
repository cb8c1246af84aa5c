//! Turns rendering requests into [`RenderEvent`]s on a [`Surface`].
//!
//! Revealed text is released one whitespace-delimited token per tick from
//! its own task. Several reveals may run at once; ordering is only
//! guaranteed within a turn. Reveal tasks stop early only on
//! [`Presenter::shutdown`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use concierge_core::{AuxLink, OptionView, QuickReplyView, RenderEvent, TurnId};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Where render events go: a terminal, a websocket, a test buffer.
pub trait Surface: Send + Sync {
    fn emit(&self, event: RenderEvent);
}

/// Records every event. Used by tests and embedders that poll.
#[derive(Default)]
pub struct MemorySurface {
    events: Mutex<Vec<RenderEvent>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<RenderEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Texts of all bot turns, in order.
    pub fn bot_texts(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                RenderEvent::BotTurn { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts of all user turns, in order.
    pub fn user_texts(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                RenderEvent::UserTurn { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent options event as (prompt, labels).
    pub fn last_options(&self) -> Option<(String, Vec<String>)> {
        self.lock().iter().rev().find_map(|e| match e {
            RenderEvent::Options { prompt, options, .. } => Some((
                prompt.clone(),
                options.iter().map(|o| o.label.clone()).collect(),
            )),
            _ => None,
        })
    }

    /// The most recent quick-reply prompt.
    pub fn last_quick_replies(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|e| match e {
            RenderEvent::QuickReplies { prompt, .. } => Some(prompt.clone()),
            _ => None,
        })
    }

    pub fn count(&self, event_name: &str) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.event_name() == event_name)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RenderEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Surface for MemorySurface {
    fn emit(&self, event: RenderEvent) {
        self.lock().push(event);
    }
}

/// Result of rendering a bot turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedTurn {
    pub turn: TurnId,
    /// Number of reveal tokens; zero when rendered at once.
    pub tokens: usize,
}

/// Split text into reveal tokens.
pub fn reveal_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

pub struct Presenter {
    surface: Arc<dyn Surface>,
    reveal_tick: Duration,
    next_turn: AtomicU64,
    shutdown: watch::Sender<bool>,
    reveals: Mutex<Vec<JoinHandle<()>>>,
}

impl Presenter {
    pub fn new(surface: Arc<dyn Surface>, reveal_tick: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            surface,
            reveal_tick,
            next_turn: AtomicU64::new(1),
            shutdown,
            reveals: Mutex::new(Vec::new()),
        }
    }

    fn turn(&self) -> TurnId {
        TurnId(self.next_turn.fetch_add(1, Ordering::Relaxed))
    }

    /// Render a bot message. Links stay inert until a reveal completes.
    pub fn render_bot_turn(&self, text: &str, links: Vec<AuxLink>, reveal: bool) -> RenderedTurn {
        let turn = self.turn();
        self.surface.emit(RenderEvent::BotTurn {
            turn,
            text: text.to_string(),
            links,
            reveal,
        });

        if !reveal {
            return RenderedTurn { turn, tokens: 0 };
        }

        let tokens = reveal_tokens(text);
        let count = tokens.len();
        let handle = tokio::spawn(reveal_tokens_task(
            self.surface.clone(),
            turn,
            tokens,
            self.reveal_tick,
            self.shutdown.subscribe(),
        ));

        let mut reveals = self.reveals.lock().unwrap_or_else(|p| p.into_inner());
        reveals.retain(|h| !h.is_finished());
        reveals.push(handle);

        RenderedTurn { turn, tokens: count }
    }

    pub fn render_user_turn(&self, text: &str) -> TurnId {
        let turn = self.turn();
        self.surface.emit(RenderEvent::UserTurn {
            turn,
            text: text.to_string(),
        });
        turn
    }

    pub fn render_options(&self, prompt: &str, options: Vec<OptionView>) -> TurnId {
        let turn = self.turn();
        self.surface.emit(RenderEvent::Options {
            turn,
            prompt: prompt.to_string(),
            options,
        });
        turn
    }

    pub fn render_quick_replies(&self, prompt: &str, replies: Vec<QuickReplyView>) -> TurnId {
        let turn = self.turn();
        self.surface.emit(RenderEvent::QuickReplies {
            turn,
            prompt: prompt.to_string(),
            replies,
        });
        turn
    }

    pub fn show_pending(&self) {
        self.surface.emit(RenderEvent::PendingShown);
    }

    pub fn hide_pending(&self) {
        self.surface.emit(RenderEvent::PendingHidden);
    }

    /// Wipe the transcript. In-flight reveals keep running.
    pub fn clear(&self) {
        self.surface.emit(RenderEvent::Cleared);
    }

    /// Number of reveals still releasing tokens.
    pub fn active_reveals(&self) -> usize {
        let reveals = self.reveals.lock().unwrap_or_else(|p| p.into_inner());
        reveals.iter().filter(|h| !h.is_finished()).count()
    }

    /// Stop all reveals. Partially revealed turns never complete.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        tracing::debug!("Presenter shut down");
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

async fn reveal_tokens_task(
    surface: Arc<dyn Surface>,
    turn: TurnId,
    tokens: Vec<String>,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    for (index, token) in tokens.into_iter().enumerate() {
        if *shutdown.borrow() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(tick) => {}
            _ = shutdown.changed() => return,
        }
        surface.emit(RenderEvent::RevealToken { turn, index, token });
    }
    if *shutdown.borrow() {
        return;
    }
    surface.emit(RenderEvent::RevealComplete { turn });
}
