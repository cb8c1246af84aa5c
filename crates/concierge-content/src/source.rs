//! Where content files come from.
//!
//! A source hands back raw JSON text for one (kind, language) pair. Parsing
//! and caching live in [`crate::store::ContentStore`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use concierge_core::Language;

use crate::error::ContentError;

/// The three content types loaded per language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Strings,
    Programs,
    Events,
}

impl ContentKind {
    /// File name for this kind. Events are shared by both languages.
    pub fn file_name(&self, language: Language) -> String {
        match self {
            ContentKind::Strings => format!("strings.{}.json", language.code()),
            ContentKind::Programs => format!("programs.{}.json", language.code()),
            ContentKind::Events => "events.json".to_string(),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentKind::Strings => "strings",
            ContentKind::Programs => "programs",
            ContentKind::Events => "events",
        };
        f.write_str(name)
    }
}

/// Fetches raw content files.
///
/// Returns [`ContentError::NotFound`] when the source simply has no such
/// file, so callers can tell "absent" apart from "broken".
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, kind: ContentKind, language: Language) -> Result<String, ContentError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

// =============================================================================
// Filesystem
// =============================================================================

/// Reads content files from a local directory.
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn fetch(&self, kind: ContentKind, language: Language) -> Result<String, ContentError> {
        let path = self.root.join(kind.file_name(language));
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ContentError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(ContentError::Io(e)),
        }
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Fetches content files with `GET {base_url}/{file}`.
pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self, kind: ContentKind, language: Language) -> Result<String, ContentError> {
        let url = format!("{}/{}", self.base_url, kind.file_name(language));
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound(url));
        }
        if !status.is_success() {
            return Err(ContentError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.base_url)
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Serves files from memory. An optional latency is applied to every fetch.
#[derive(Default)]
pub struct StaticContentSource {
    files: HashMap<String, String>,
    latency: Option<Duration>,
}

impl StaticContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, kind: ContentKind, language: Language, body: impl Into<String>) -> Self {
        self.files.insert(kind.file_name(language), body.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl ContentSource for StaticContentSource {
    async fn fetch(&self, kind: ContentKind, language: Language) -> Result<String, ContentError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let name = kind.file_name(language);
        self.files
            .get(&name)
            .cloned()
            .ok_or(ContentError::NotFound(name))
    }

    fn describe(&self) -> String {
        format!("static:{} files", self.files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(ContentKind::Strings.file_name(Language::Vi), "strings.vi.json");
        assert_eq!(ContentKind::Programs.file_name(Language::En), "programs.en.json");
        assert_eq!(ContentKind::Events.file_name(Language::Vi), "events.json");
        assert_eq!(ContentKind::Events.file_name(Language::En), "events.json");
    }

    #[tokio::test]
    async fn test_fs_source_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("events.json"), "[]").unwrap();

        let source = FsContentSource::new(dir.path());
        let body = source.fetch(ContentKind::Events, Language::En).await.unwrap();
        assert_eq!(body, "[]");

        let missing = source.fetch(ContentKind::Programs, Language::En).await;
        assert!(matches!(missing, Err(ContentError::NotFound(_))));
        assert!(source.describe().starts_with("dir:"));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticContentSource::new().with_file(
            ContentKind::Strings,
            Language::En,
            r#"{"yes":"Yes"}"#,
        );
        assert!(source.fetch(ContentKind::Strings, Language::En).await.is_ok());
        assert!(matches!(
            source.fetch(ContentKind::Strings, Language::Vi).await,
            Err(ContentError::NotFound(name)) if name == "strings.vi.json"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_source_latency() {
        let source = StaticContentSource::new()
            .with_file(ContentKind::Events, Language::En, "[]")
            .with_latency(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        source.fetch(ContentKind::Events, Language::En).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_http_source_trims_trailing_slash() {
        let source = HttpContentSource::with_client(reqwest::Client::new(), "http://host/data///");
        assert_eq!(source.describe(), "http:http://host/data");
    }
}
