//! The active conversation language and localized lookups in it.

use std::sync::{Arc, RwLock};

use concierge_core::{Language, NodeKey, OptionTarget, SessionId};
use tracing::{info, warn};

use crate::preferences::{PreferenceStore, StoredPreferences};
use crate::store::ContentStore;

/// Owns the current language and the persisted session identity.
///
/// The session id is generated once per profile and reused across restarts.
/// Persistence failures are logged and never block the conversation.
pub struct LanguageResolver {
    store: Arc<ContentStore>,
    prefs: Arc<dyn PreferenceStore>,
    current: RwLock<Language>,
    session_id: SessionId,
}

impl LanguageResolver {
    pub fn new(
        store: Arc<ContentStore>,
        prefs: Arc<dyn PreferenceStore>,
        default_language: Language,
    ) -> Self {
        let stored = prefs.load().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read stored preferences, starting fresh");
            StoredPreferences::default()
        });

        let language = stored.language.unwrap_or(default_language);
        let session_id = match stored.session_id.clone() {
            Some(id) => id,
            None => {
                let id = SessionId::new();
                let updated = StoredPreferences {
                    session_id: Some(id.clone()),
                    ..stored
                };
                if let Err(e) = prefs.save(&updated) {
                    warn!(error = %e, "Could not persist new session id");
                }
                info!(session_id = %id, "Created new session");
                id
            }
        };

        Self {
            store,
            prefs,
            current: RwLock::new(language),
            session_id,
        }
    }

    pub fn current_language(&self) -> Language {
        *self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    /// Switch language, persist the choice and reload content.
    ///
    /// Strings are loaded before returning; programs and events load in the
    /// background so a listing request can observe them as still loading.
    pub async fn set_language(&self, language: Language) {
        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = language;
        }

        let prefs = StoredPreferences {
            session_id: Some(self.session_id.clone()),
            language: Some(language),
        };
        if let Err(e) = self.prefs.save(&prefs) {
            warn!(language = %language, error = %e, "Could not persist language choice");
        }
        info!(language = %language, "Language switched");

        self.store.load_strings(language).await;
        self.spawn_listing_loads(language);
    }

    /// Load everything for the current language, waiting for all of it.
    pub async fn load_current(&self) {
        self.store.load(self.current_language()).await;
    }

    fn spawn_listing_loads(&self, language: Language) {
        let store = self.store.clone();
        tokio::spawn(async move {
            tokio::join!(store.load_programs(language), store.load_events());
        });
    }

    pub fn label(&self, key: &str) -> String {
        self.store.get_string(key, self.current_language())
    }

    pub fn options(&self, node: NodeKey) -> Vec<String> {
        self.store.get_menu_options(node, self.current_language())
    }

    pub fn resolve_label(&self, label: &str) -> Option<OptionTarget> {
        self.store.resolve_label(label, self.current_language())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{FilePreferences, MemoryPreferences};
    use crate::source::{ContentKind, StaticContentSource};
    use crate::store::LoadState;
    use std::time::Duration;

    fn store() -> Arc<ContentStore> {
        Arc::new(ContentStore::new(Arc::new(StaticContentSource::new())))
    }

    #[test]
    fn test_defaults_to_configured_language() {
        let resolver = LanguageResolver::new(store(), Arc::new(MemoryPreferences::new()), Language::Vi);
        assert_eq!(resolver.current_language(), Language::Vi);
        assert!(resolver.session_id().as_str().starts_with("user_"));
        assert_eq!(resolver.label("yes"), "Có");
    }

    #[test]
    fn test_restores_stored_language_and_session() {
        let prefs = MemoryPreferences::with(StoredPreferences {
            session_id: Some(SessionId("user_42".to_string())),
            language: Some(Language::En),
        });
        let resolver = LanguageResolver::new(store(), Arc::new(prefs), Language::Vi);
        assert_eq!(resolver.current_language(), Language::En);
        assert_eq!(resolver.session_id().as_str(), "user_42");
    }

    #[test]
    fn test_session_id_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let first = LanguageResolver::new(
            store(),
            Arc::new(FilePreferences::in_dir(dir.path())),
            Language::Vi,
        );
        let second = LanguageResolver::new(
            store(),
            Arc::new(FilePreferences::in_dir(dir.path())),
            Language::Vi,
        );
        assert_eq!(first.session_id(), second.session_id());
    }

    #[test]
    fn test_corrupt_preferences_start_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::in_dir(dir.path());
        std::fs::write(prefs.path(), "garbage").unwrap();
        let resolver = LanguageResolver::new(store(), Arc::new(prefs), Language::En);
        assert_eq!(resolver.current_language(), Language::En);
    }

    #[tokio::test]
    async fn test_set_language_persists_and_keeps_session() {
        let prefs = Arc::new(MemoryPreferences::new());
        let resolver = LanguageResolver::new(store(), prefs.clone(), Language::Vi);
        let id = resolver.session_id().clone();

        resolver.set_language(Language::En).await;
        assert_eq!(resolver.current_language(), Language::En);
        assert_eq!(resolver.session_id(), &id);
        assert_eq!(resolver.label("yes"), "Yes");

        let stored = prefs.load().unwrap();
        assert_eq!(stored.language, Some(Language::En));
        assert_eq!(stored.session_id, Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_language_loads_listings_in_background() {
        let source = StaticContentSource::new()
            .with_file(ContentKind::Programs, Language::En, "[]")
            .with_latency(Duration::from_secs(1));
        let store = Arc::new(ContentStore::new(Arc::new(source)));
        let resolver = LanguageResolver::new(store.clone(), Arc::new(MemoryPreferences::new()), Language::Vi);

        resolver.set_language(Language::En).await;
        assert_eq!(store.strings_state(Language::En), LoadState::Ready);
        assert_ne!(store.programs_state(Language::En), LoadState::Ready);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.programs_state(Language::En), LoadState::Ready);
    }

    #[test]
    fn test_resolve_label_in_current_language() {
        let resolver = LanguageResolver::new(store(), Arc::new(MemoryPreferences::new()), Language::Vi);
        assert_eq!(
            resolver.resolve_label("Việc làm hoặc đào tạo"),
            Some(OptionTarget::Node(NodeKey::JobTraining))
        );
        assert_eq!(resolver.resolve_label("Job or training"), None);
        assert_eq!(resolver.options(NodeKey::Root).len(), 12);
    }
}
