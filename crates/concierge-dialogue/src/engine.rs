//! The dialogue engine: maps selections and free text to the next prompt.
//!
//! One exchange at a time. An exchange claims the session by moving it to
//! `Processing`; any input arriving before it finishes is ignored. Every
//! exchange is stamped with the session generation, which a language switch
//! bumps; renders from an older generation are dropped so a restarted
//! conversation never shows a turn from the previous language.
//!
//! The session mutex is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use concierge_content::{ContentStore, LanguageResolver, LinkRef, LoadState, NodeKind};
use concierge_core::config::TimingConfig;
use concierge_core::{
    AuxLink, InteractionRecord, Language, Listing, NodeKey, OptionTarget, OptionView, QuickReply,
    QuickReplyView, SessionId,
};
use concierge_intent::{Classification, IntentClassifier};
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::gateway::Responder;
use crate::logger::InteractionLog;
use crate::presenter::Presenter;
use crate::state::DialogueState;

/// The one outstanding round-trip while the session is `Processing`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingExchange {
    pub input: String,
    pub started_at: DateTime<Utc>,
}

/// What an input led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Another exchange was in flight, or there was nothing to act on.
    Ignored,
    /// A language switch happened mid-exchange; nothing more was rendered.
    Stale,
    /// Greeting and root menu shown.
    Welcomed,
    /// Input too short; asked for more detail.
    Clarified,
    /// A menu or listing is on screen.
    Menu(NodeKey),
    /// A leaf response was shown and logged.
    Answered(NodeKey),
    /// Asked the user to describe their need.
    DetailRequested(NodeKey),
    /// The remote responder answered.
    Remote,
    /// The remote responder failed; an apology was shown.
    RemoteFailed,
    /// Programs never finished loading.
    Unavailable,
    Goodbye,
}

#[derive(Clone, Copy, Debug)]
struct DetailRequest {
    node: NodeKey,
    fallback_key: &'static str,
}

#[derive(Debug, Default)]
struct Session {
    state: DialogueState,
    generation: u64,
    pending: Option<PendingExchange>,
    detail: Option<DetailRequest>,
    options: Vec<OptionView>,
}

/// Read-only view of the session.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub language: Language,
    pub state: DialogueState,
    pub generation: u64,
    pub pending: Option<PendingExchange>,
    pub awaiting_detail: Option<NodeKey>,
    /// Options of the most recent menu, in display order.
    pub options: Vec<OptionView>,
}

impl SessionSnapshot {
    pub fn processing(&self) -> bool {
        self.state.is_processing()
    }
}

pub struct DialogueEngine {
    resolver: Arc<LanguageResolver>,
    classifier: IntentClassifier,
    presenter: Arc<Presenter>,
    responder: Arc<dyn Responder>,
    log: Arc<dyn InteractionLog>,
    timing: TimingConfig,
    session: Mutex<Session>,
}

impl DialogueEngine {
    pub fn new(
        resolver: Arc<LanguageResolver>,
        presenter: Arc<Presenter>,
        responder: Arc<dyn Responder>,
        log: Arc<dyn InteractionLog>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            resolver,
            classifier: IntentClassifier::new(),
            presenter,
            responder,
            log,
            timing,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn language(&self) -> Language {
        self.resolver.current_language()
    }

    pub fn session_id(&self) -> &SessionId {
        self.resolver.session_id()
    }

    pub fn presenter(&self) -> &Arc<Presenter> {
        &self.presenter
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session();
        SessionSnapshot {
            session_id: self.resolver.session_id().clone(),
            language: self.resolver.current_language(),
            state: session.state,
            generation: session.generation,
            pending: session.pending.clone(),
            awaiting_detail: session.detail.map(|d| d.node),
            options: session.options.clone(),
        }
    }

    /// Stop background rendering. The engine should not be used afterwards.
    pub fn shutdown(&self) {
        self.presenter.shutdown();
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Greeting, then the root menu.
    pub async fn start(&self) -> Outcome {
        let generation = self.session().generation;
        info!(session_id = %self.session_id(), language = %self.language(), "Conversation started");
        self.welcome(generation).await
    }

    /// Switch language and restart from the greeting.
    ///
    /// Any exchange in flight is abandoned: its remaining output is dropped.
    pub async fn set_language(&self, language: Language) -> Outcome {
        let generation = {
            let mut session = self.session();
            session.generation += 1;
            if session.state != DialogueState::Idle {
                debug!("Dialogue state reset to Idle from {}", session.state);
            }
            session.state = DialogueState::Idle;
            session.pending = None;
            session.detail = None;
            session.options.clear();
            self.presenter.clear();
            session.generation
        };
        info!(language = %language, generation, "Restarting conversation in new language");

        self.resolver.set_language(language).await;
        self.welcome(generation).await
    }

    /// Select the option at `index` (zero-based) of the most recent menu.
    pub async fn choose(&self, index: usize) -> Outcome {
        let option = self.session().options.get(index).cloned();
        match option {
            Some(option) => self.select(option).await,
            None => {
                debug!(index, "No option at index");
                Outcome::Ignored
            }
        }
    }

    /// Select by displayed label.
    ///
    /// The most recent menu is searched first, then every label in the
    /// current language. Unknown labels get the "choose from the menu" answer.
    pub async fn select_label(&self, label: &str) -> Outcome {
        let label = label.trim();
        let on_screen = self
            .session()
            .options
            .iter()
            .find(|o| o.label == label)
            .cloned();

        let option = on_screen
            .or_else(|| {
                self.resolver.resolve_label(label).map(|target| OptionView {
                    label: label.to_string(),
                    target,
                })
            })
            .unwrap_or_else(|| OptionView {
                label: label.to_string(),
                target: OptionTarget::Node(NodeKey::MenuFallback),
            });

        self.select(option).await
    }

    /// Act on an option button.
    pub async fn select(&self, option: OptionView) -> Outcome {
        let Some(generation) = self.begin(&option.label) else {
            return Outcome::Ignored;
        };

        let shown = self.render_current(generation, |presenter, session| {
            session.detail = None;
            presenter.render_user_turn(&option.label);
            presenter.show_pending();
        });
        if shown.is_none() || !self.pause(generation, self.timing.settle()).await {
            return Outcome::Stale;
        }
        if self.render_current(generation, |p, _| p.hide_pending()).is_none() {
            return Outcome::Stale;
        }

        self.resolve(generation, &option.target, &option.label).await
    }

    /// Answer the "anything else?" prompt.
    pub async fn quick_reply(&self, reply: QuickReply) -> Outcome {
        let label = self.reply_label(reply);
        let Some(generation) = self.begin(&label) else {
            return Outcome::Ignored;
        };

        let shown = self.render_current(generation, |presenter, _| {
            presenter.render_user_turn(&label);
            presenter.show_pending();
        });
        if shown.is_none() || !self.pause(generation, self.timing.quick_reply()).await {
            return Outcome::Stale;
        }
        if self.render_current(generation, |p, _| p.hide_pending()).is_none() {
            return Outcome::Stale;
        }

        match reply {
            QuickReply::Yes => {
                let prompt = self.t("whatElse");
                if !self.show_options(generation, &prompt, self.menu_options(NodeKey::Root)) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::AwaitingSelection);
                Outcome::Menu(NodeKey::Root)
            }
            QuickReply::No => {
                let goodbye = self.t("goodbye");
                if !self.say(generation, &goodbye) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::Idle);
                Outcome::Goodbye
            }
        }
    }

    /// Quick reply by label. Anything but the localized "yes" counts as no.
    pub async fn quick_reply_label(&self, label: &str) -> Outcome {
        let yes = self.t("yes");
        let reply = if label.trim().eq_ignore_ascii_case(yes.trim()) {
            QuickReply::Yes
        } else {
            QuickReply::No
        };
        self.quick_reply(reply).await
    }

    /// Handle typed text.
    pub async fn submit_text(&self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            return Outcome::Ignored;
        }
        let Some(generation) = self.begin(text) else {
            return Outcome::Ignored;
        };

        // Short input clarifies even when a detail prompt is open; the prompt
        // stays pending for the next message.
        let language = self.language();
        let classification = self.classifier.classify(text, language);
        let detail = self.render_current(generation, |presenter, session| {
            presenter.render_user_turn(text);
            match classification {
                Classification::Clarify => None,
                _ => session.detail.take(),
            }
        });
        let detail = match detail {
            Some(detail) => detail,
            None => return Outcome::Stale,
        };

        if let Some(detail) = detail {
            if !self.typing(generation).await {
                return Outcome::Stale;
            }
            let body = self.t(detail.fallback_key);
            return self.answer(generation, detail.node, text, body, Vec::new()).await;
        }

        match classification {
            Classification::Clarify => {
                let prompt = self.t("clarifyPrompt");
                if !self.say(generation, &prompt) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::Idle);
                Outcome::Clarified
            }
            Classification::Branch(node) => {
                if !self.typing(generation).await {
                    return Outcome::Stale;
                }
                self.resolve_node(generation, node, text).await
            }
            Classification::Unmatched => self.ask_remote(generation, text, language).await,
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    async fn welcome(&self, generation: u64) -> Outcome {
        if !self.pause(generation, self.timing.welcome_greeting()).await {
            return Outcome::Stale;
        }
        let greeting = self.t("welcomeMessage");
        if !self.say(generation, &greeting) {
            return Outcome::Stale;
        }
        if !self.pause(generation, self.timing.welcome_menu()).await {
            return Outcome::Stale;
        }
        let prompt = self.t("helpQuestion");
        if !self.show_options(generation, &prompt, self.menu_options(NodeKey::Root)) {
            return Outcome::Stale;
        }
        Outcome::Welcomed
    }

    async fn resolve(&self, generation: u64, target: &OptionTarget, selection: &str) -> Outcome {
        let language = self.language();
        match target {
            OptionTarget::Node(key) => self.resolve_node(generation, *key, selection).await,
            OptionTarget::Program(name) => match self.store().find_program(name, language) {
                Some(program) => {
                    let links = listing_link(&program);
                    self.answer(generation, NodeKey::Programs, selection, program.description, links)
                        .await
                }
                None => self.resolve_node(generation, NodeKey::MenuFallback, selection).await,
            },
            OptionTarget::Event(name) => match self.store().find_event(name) {
                Some(event) => {
                    let body = self.event_body(&event);
                    let links = listing_link(&event);
                    self.answer(generation, NodeKey::Events, selection, body, links).await
                }
                None => self.resolve_node(generation, NodeKey::MenuFallback, selection).await,
            },
        }
    }

    async fn resolve_node(&self, generation: u64, key: NodeKey, selection: &str) -> Outcome {
        let kind = self.store().menu().node(key).map(|n| n.kind.clone());
        let Some(kind) = kind else {
            warn!(node = %key, "Menu node missing, answering with menu fallback");
            let body = self.t("menuFallback");
            return self.answer(generation, key, selection, body, Vec::new()).await;
        };

        match kind {
            NodeKind::Menu { prompt_key, .. } => {
                let prompt = self.t(prompt_key);
                if !self.show_options(generation, &prompt, self.menu_options(key)) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::AwaitingSelection);
                Outcome::Menu(key)
            }
            NodeKind::Leaf { body_key, links } => {
                let body = self.t(body_key);
                let links = self.links(&links);
                self.answer(generation, key, selection, body, links).await
            }
            NodeKind::DetailPrompt {
                prompt_key,
                fallback_key,
            } => {
                let prompt = self.t(prompt_key);
                let asked = self.render_current(generation, |presenter, session| {
                    presenter.render_bot_turn(&prompt, Vec::new(), false);
                    session.detail = Some(DetailRequest {
                        node: key,
                        fallback_key,
                    });
                });
                if asked.is_none() {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::Idle);
                Outcome::DetailRequested(key)
            }
            NodeKind::Programs => self.show_programs(generation).await,
            NodeKind::Events => self.show_events(generation, selection).await,
        }
    }

    /// Render a leaf, log it, then offer more help.
    async fn answer(
        &self,
        generation: u64,
        node: NodeKey,
        selection: &str,
        body: String,
        links: Vec<AuxLink>,
    ) -> Outcome {
        let shown = self.render_current(generation, |p, _| {
            p.render_bot_turn(&body, links, false);
        });
        if shown.is_none() {
            return Outcome::Stale;
        }
        self.record(selection, &body);
        debug!(node = %node, "Answered from content");

        if !self.pause(generation, self.timing.follow_up()).await || !self.offer_more(generation) {
            return Outcome::Stale;
        }
        self.finish(generation, DialogueState::Idle);
        Outcome::Answered(node)
    }

    async fn show_programs(&self, generation: u64) -> Outcome {
        let language = self.language();

        if self.store().programs_state(language) != LoadState::Ready {
            let loading = self.t("programsLoading");
            if !self.say(generation, &loading)
                || !self.pause(generation, self.timing.programs_retry()).await
            {
                return Outcome::Stale;
            }
            if self.store().programs_state(language) != LoadState::Ready {
                warn!(language = %language, "Programs still not loaded after retry");
                let unavailable = self.t("programsUnavailable");
                if !self.say(generation, &unavailable) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::Idle);
                return Outcome::Unavailable;
            }
        }

        let active = self.store().active_programs(language);
        if active.is_empty() {
            let key = if self.store().get_programs(language).is_empty() {
                "noPrograms"
            } else {
                "noNewPrograms"
            };
            let notice = self.t(key);
            if !self.say(generation, &notice)
                || !self.pause(generation, self.timing.no_programs_follow_up()).await
            {
                return Outcome::Stale;
            }
            let options = vec![
                self.node_option("morePrograms", NodeKey::MorePrograms),
                self.node_option("backToMenu", NodeKey::Root),
            ];
            let prompt = self.t("wouldYouLike");
            if !self.show_options(generation, &prompt, options) {
                return Outcome::Stale;
            }
            self.finish(generation, DialogueState::AwaitingSelection);
            return Outcome::Menu(NodeKey::Programs);
        }

        let mut options: Vec<OptionView> = active
            .into_iter()
            .map(|p| OptionView {
                label: p.name.clone(),
                target: OptionTarget::Program(p.name),
            })
            .collect();
        options.push(self.node_option("morePrograms", NodeKey::MorePrograms));

        let prompt = self.t("programsPrompt");
        if !self.show_options(generation, &prompt, options) {
            return Outcome::Stale;
        }
        self.finish(generation, DialogueState::AwaitingSelection);
        Outcome::Menu(NodeKey::Programs)
    }

    async fn show_events(&self, generation: u64, selection: &str) -> Outcome {
        let events = self.store().upcoming_events();
        if events.is_empty() {
            let body = self.t("noEvents");
            return self.answer(generation, NodeKey::Events, selection, body, Vec::new()).await;
        }

        let mut options: Vec<OptionView> = events
            .into_iter()
            .map(|e| OptionView {
                label: e.name.clone(),
                target: OptionTarget::Event(e.name),
            })
            .collect();
        options.push(self.node_option("backToMenu", NodeKey::Root));

        let prompt = self.t("eventsPrompt");
        if !self.show_options(generation, &prompt, options) {
            return Outcome::Stale;
        }
        self.finish(generation, DialogueState::AwaitingSelection);
        Outcome::Menu(NodeKey::Events)
    }

    async fn ask_remote(&self, generation: u64, text: &str, language: Language) -> Outcome {
        if self.render_current(generation, |p, _| p.show_pending()).is_none() {
            return Outcome::Stale;
        }

        let session_id = self.session_id().clone();
        let result = self.responder.ask(text, language, &session_id).await;

        if self.render_current(generation, |p, _| p.hide_pending()).is_none() {
            debug!(session_id = %session_id, "Dropping remote reply from before a language switch");
            return Outcome::Stale;
        }

        match result {
            Ok(reply) => {
                for source in &reply.sources {
                    debug!(source = %source.source, "Remote reply source");
                }
                let rendered = self.render_current(generation, |p, _| {
                    p.render_bot_turn(&reply.response, Vec::new(), true)
                });
                let Some(rendered) = rendered else {
                    return Outcome::Stale;
                };
                self.record(text, &reply.response);

                let wait = self.timing.reveal_follow_up(rendered.tokens);
                if !self.pause(generation, wait).await || !self.offer_more(generation) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::Idle);
                Outcome::Remote
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Remote responder failed");
                let key = match e {
                    GatewayError::Rejected(_) => "errorProcessing",
                    _ => "errorMessage",
                };
                let apology = self.t(key);
                if !self.say(generation, &apology) {
                    return Outcome::Stale;
                }
                self.finish(generation, DialogueState::Idle);
                Outcome::RemoteFailed
            }
        }
    }

    // =========================================================================
    // Session bookkeeping
    // =========================================================================

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the single-flight slot. `None` while another exchange runs.
    fn begin(&self, input: &str) -> Option<u64> {
        let mut session = self.session();
        if let Err(e) = session.state.transition(DialogueState::Processing) {
            debug!(input, error = %e, "Input ignored while an exchange is in flight");
            return None;
        }
        session.pending = Some(PendingExchange {
            input: input.to_string(),
            started_at: Utc::now(),
        });
        Some(session.generation)
    }

    /// Release the slot if `generation` still owns it.
    fn finish(&self, generation: u64, next: DialogueState) {
        let mut session = self.session();
        if session.generation != generation {
            return;
        }
        if let Some(pending) = session.pending.take() {
            let elapsed = Utc::now() - pending.started_at;
            debug!(elapsed_ms = elapsed.num_milliseconds(), "Exchange finished");
        }
        if let Err(e) = session.state.transition(next) {
            warn!(error = %e, "Unexpected dialogue state at end of exchange");
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session().generation == generation
    }

    async fn pause(&self, generation: u64, duration: std::time::Duration) -> bool {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        self.is_current(generation)
    }

    /// Pending indicator for the typing delay of a matched free-text input.
    async fn typing(&self, generation: u64) -> bool {
        self.render_current(generation, |p, _| p.show_pending()).is_some()
            && self.pause(generation, self.timing.typing()).await
            && self.render_current(generation, |p, _| p.hide_pending()).is_some()
    }

    /// Run `render` only if `generation` is current. The session lock is held
    /// meanwhile so a language switch cannot interleave with it.
    fn render_current<R>(
        &self,
        generation: u64,
        render: impl FnOnce(&Presenter, &mut Session) -> R,
    ) -> Option<R> {
        let mut session = self.session();
        if session.generation != generation {
            return None;
        }
        Some(render(&self.presenter, &mut session))
    }

    fn say(&self, generation: u64, text: &str) -> bool {
        self.render_current(generation, |p, _| {
            p.render_bot_turn(text, Vec::new(), false);
        })
        .is_some()
    }

    fn show_options(&self, generation: u64, prompt: &str, options: Vec<OptionView>) -> bool {
        self.render_current(generation, |presenter, session| {
            presenter.render_options(prompt, options.clone());
            session.options = options;
        })
        .is_some()
    }

    fn offer_more(&self, generation: u64) -> bool {
        let prompt = self.t("anythingElse");
        let replies = vec![
            QuickReplyView {
                label: self.reply_label(QuickReply::Yes),
                reply: QuickReply::Yes,
            },
            QuickReplyView {
                label: self.reply_label(QuickReply::No),
                reply: QuickReply::No,
            },
        ];
        self.render_current(generation, |p, _| {
            p.render_quick_replies(&prompt, replies);
        })
        .is_some()
    }

    fn record(&self, selection: &str, response: &str) {
        self.log.record(InteractionRecord {
            selection: selection.to_string(),
            response: response.to_string(),
            language: self.language(),
            user_id: self.session_id().clone(),
        });
    }

    // =========================================================================
    // Content helpers
    // =========================================================================

    fn store(&self) -> &ContentStore {
        self.resolver.store()
    }

    fn t(&self, key: &str) -> String {
        self.resolver.label(key)
    }

    fn reply_label(&self, reply: QuickReply) -> String {
        match reply {
            QuickReply::Yes => self.t("yes"),
            QuickReply::No => self.t("no"),
        }
    }

    fn node_option(&self, label_key: &str, target: NodeKey) -> OptionView {
        OptionView {
            label: self.t(label_key),
            target: OptionTarget::Node(target),
        }
    }

    fn menu_options(&self, node: NodeKey) -> Vec<OptionView> {
        self.store()
            .menu()
            .options(node)
            .iter()
            .map(|o| self.node_option(o.label_key, o.target))
            .collect()
    }

    fn links(&self, links: &[LinkRef]) -> Vec<AuxLink> {
        links
            .iter()
            .map(|l| AuxLink {
                label: self.t(l.label_key),
                url: l.url.to_string(),
            })
            .collect()
    }

    fn event_body(&self, event: &Listing) -> String {
        let mut body = format!("<strong>{}</strong><br>{}", event.name, event.description);
        let details = [
            ("eventDate", &event.date),
            ("eventTime", &event.time),
            ("eventCapacity", &event.capacity),
        ];
        let mut first = true;
        for (key, value) in details {
            if let Some(value) = value {
                body.push_str(if first { "<br><br>" } else { "<br>" });
                body.push_str(&format!("{}: {}", self.t(key), value));
                first = false;
            }
        }
        body
    }
}

fn listing_link(listing: &Listing) -> Vec<AuxLink> {
    listing
        .link
        .as_ref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| AuxLink {
            label: listing.name.clone(),
            url: url.clone(),
        })
        .into_iter()
        .collect()
}
