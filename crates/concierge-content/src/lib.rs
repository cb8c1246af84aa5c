//! Localized content for the concierge: string tables, the menu tree,
//! program and event listings, and the per-profile language preference.

pub mod error;
pub mod menu;
pub mod preferences;
pub mod resolver;
pub mod source;
pub mod store;
pub mod strings;

pub use error::ContentError;
pub use menu::{LinkRef, MenuNode, MenuTree, NodeKind, OptionRef};
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore, StoredPreferences};
pub use resolver::LanguageResolver;
pub use source::{ContentKind, ContentSource, FsContentSource, HttpContentSource, StaticContentSource};
pub use store::{ContentStore, LoadState};
