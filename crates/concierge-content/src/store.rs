//! Cached, per-language content.
//!
//! Each (kind, language) pair is loaded independently. A load replaces the
//! cached set wholesale, so readers never observe a partial set. Failures
//! degrade to an empty set and never block menu rendering.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use concierge_core::{Event, Language, NodeKey, OptionTarget, Program};
use tracing::{debug, info, warn};

use crate::error::ContentError;
use crate::menu::{MenuTree, NodeKind};
use crate::source::{ContentKind, ContentSource};
use crate::strings::{self, StringTable};

/// Progress of one content set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    /// Loaded, possibly with an empty set after a failure.
    Ready,
}

#[derive(Debug)]
struct Slot<T> {
    state: LoadState,
    data: Arc<T>,
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self {
            state: LoadState::NotLoaded,
            data: Arc::new(T::default()),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read-only (to everyone but its loaders) holder of strings, the menu tree,
/// programs and events.
pub struct ContentStore {
    source: Arc<dyn ContentSource>,
    menu: MenuTree,
    strings: RwLock<HashMap<Language, Slot<StringTable>>>,
    programs: RwLock<HashMap<Language, Slot<Vec<Program>>>>,
    events: RwLock<Slot<Vec<Event>>>,
}

impl ContentStore {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self::with_menu(source, MenuTree::standard())
    }

    pub fn with_menu(source: Arc<dyn ContentSource>, menu: MenuTree) -> Self {
        Self {
            source,
            menu,
            strings: RwLock::new(HashMap::new()),
            programs: RwLock::new(HashMap::new()),
            events: RwLock::new(Slot::default()),
        }
    }

    pub fn menu(&self) -> &MenuTree {
        &self.menu
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Localized text for `key`. Falls back to the built-in table, then to
    /// the key itself. Never fails.
    pub fn get_string(&self, key: &str, language: Language) -> String {
        if let Some(slot) = read(&self.strings).get(&language) {
            if let Some(text) = slot.data.get(key) {
                return text.clone();
            }
        }
        if let Some(text) = strings::builtin(language).get(key) {
            return text.clone();
        }
        debug!(key, language = %language, "Missing localization key");
        key.to_string()
    }

    /// Ordered option labels for a node, localized.
    ///
    /// Listing nodes yield the names of the records they would offer.
    pub fn get_menu_options(&self, node: NodeKey, language: Language) -> Vec<String> {
        match self.menu.node(node).map(|n| &n.kind) {
            Some(NodeKind::Menu { options, .. }) => options
                .iter()
                .map(|o| self.get_string(o.label_key, language))
                .collect(),
            Some(NodeKind::Programs) => {
                let mut labels: Vec<String> = self
                    .active_programs(language)
                    .into_iter()
                    .map(|p| p.name)
                    .collect();
                labels.push(self.get_string("morePrograms", language));
                labels
            }
            Some(NodeKind::Events) => self.upcoming_events().into_iter().map(|e| e.name).collect(),
            _ => Vec::new(),
        }
    }

    /// All programs loaded for `language`. Empty when unavailable.
    pub fn get_programs(&self, language: Language) -> Vec<Program> {
        read(&self.programs)
            .get(&language)
            .map(|slot| slot.data.as_ref().clone())
            .unwrap_or_default()
    }

    /// Programs that are current and featured, in file order.
    pub fn active_programs(&self, language: Language) -> Vec<Program> {
        self.get_programs(language)
            .into_iter()
            .filter(|p| p.is_active() && p.is_featured)
            .collect()
    }

    pub fn get_events(&self) -> Vec<Event> {
        read(&self.events).data.as_ref().clone()
    }

    /// Non-expired events, featured ones first.
    pub fn upcoming_events(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.get_events().into_iter().filter(|e| e.is_active()).collect();
        events.sort_by_key(|e| !e.is_featured);
        events
    }

    pub fn find_program(&self, name: &str, language: Language) -> Option<Program> {
        self.get_programs(language).into_iter().find(|p| p.name == name)
    }

    pub fn find_event(&self, name: &str) -> Option<Event> {
        self.get_events().into_iter().find(|e| e.name == name)
    }

    /// Map a displayed label back to what it selects.
    ///
    /// Static options are tried first in tree order, then active programs,
    /// then upcoming events. Labels shared by several menus resolve to the
    /// first occurrence.
    pub fn resolve_label(&self, label: &str, language: Language) -> Option<OptionTarget> {
        let wanted = label.trim();
        if wanted.is_empty() {
            return None;
        }
        if let Some(option) = self
            .menu
            .all_options()
            .into_iter()
            .find(|o| self.get_string(o.label_key, language) == wanted)
        {
            return Some(OptionTarget::Node(option.target));
        }
        if let Some(program) = self.active_programs(language).into_iter().find(|p| p.name == wanted) {
            return Some(OptionTarget::Program(program.name));
        }
        self.upcoming_events()
            .into_iter()
            .find(|e| e.name == wanted)
            .map(|e| OptionTarget::Event(e.name))
    }

    pub fn strings_state(&self, language: Language) -> LoadState {
        read(&self.strings)
            .get(&language)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    pub fn programs_state(&self, language: Language) -> LoadState {
        read(&self.programs)
            .get(&language)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    pub fn events_state(&self) -> LoadState {
        read(&self.events).state
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load strings, programs and events for `language`.
    pub async fn load(&self, language: Language) {
        tokio::join!(
            self.load_strings(language),
            self.load_programs(language),
            self.load_events()
        );
    }

    pub async fn load_strings(&self, language: Language) {
        write(&self.strings).entry(language).or_default().state = LoadState::Loading;

        let table = match self.fetch(ContentKind::Strings, language).await {
            Ok(Some(raw)) => match strings::parse_table(&raw) {
                Ok(table) => table,
                Err(e) => {
                    warn!(language = %language, error = %e, "Malformed string table, using built-in strings");
                    StringTable::new()
                }
            },
            Ok(None) | Err(_) => StringTable::new(),
        };

        info!(language = %language, count = table.len(), "Strings loaded");
        write(&self.strings).insert(
            language,
            Slot {
                state: LoadState::Ready,
                data: Arc::new(table),
            },
        );
    }

    pub async fn load_programs(&self, language: Language) {
        write(&self.programs).entry(language).or_default().state = LoadState::Loading;

        let programs = self.fetch_listings(ContentKind::Programs, language).await;
        info!(language = %language, count = programs.len(), "Programs loaded");
        write(&self.programs).insert(
            language,
            Slot {
                state: LoadState::Ready,
                data: Arc::new(programs),
            },
        );
    }

    pub async fn load_events(&self) {
        write(&self.events).state = LoadState::Loading;

        let events = self.fetch_listings(ContentKind::Events, Language::default()).await;
        info!(count = events.len(), "Events loaded");
        *write(&self.events) = Slot {
            state: LoadState::Ready,
            data: Arc::new(events),
        };
    }

    async fn fetch_listings(&self, kind: ContentKind, language: Language) -> Vec<Program> {
        match self.fetch(kind, language).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(kind = %kind, language = %language, error = %e, "Malformed listing file, treating as empty");
                Vec::new()
            }),
            Ok(None) | Err(_) => Vec::new(),
        }
    }

    /// `Ok(None)` when the source has no such file.
    async fn fetch(&self, kind: ContentKind, language: Language) -> Result<Option<String>, ContentError> {
        match self.source.fetch(kind, language).await {
            Ok(raw) => Ok(Some(raw)),
            Err(ContentError::NotFound(name)) => {
                debug!(kind = %kind, file = %name, source = %self.source.describe(), "Content file not present");
                Ok(None)
            }
            Err(e) => {
                warn!(kind = %kind, language = %language, source = %self.source.describe(), error = %e, "Content load failed");
                Err(e)
            }
        }
    }
}
