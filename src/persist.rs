use crate::model::{Document, LayoutMode};
use crate::theme::ThemeMode;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Everything that crosses the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub active_document_id: Option<String>,
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default)]
    pub authenticated: bool,
}

fn default_sidebar_open() -> bool {
    true
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            active_document_id: None,
            breadcrumb: Vec::new(),
            layout_mode: LayoutMode::default(),
            sidebar_open: default_sidebar_open(),
            theme: ThemeMode::default(),
            authenticated: false,
        }
    }
}

/// Key-value style persistence collaborator.
pub trait StateStore {
    fn load(&self) -> anyhow::Result<Option<PersistedState>>;
    fn save(&mut self, state: &PersistedState) -> anyhow::Result<()>;
}

/// Stores the whole state as one JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let state = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &PersistedState) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

/// In-memory store; counts writes so coalescing can be observed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub saved: Option<PersistedState>,
    pub writes: usize,
}

impl StateStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, state: &PersistedState) -> anyhow::Result<()> {
        self.saved = Some(state.clone());
        self.writes += 1;
        Ok(())
    }
}

/// A cancellable delayed save.
///
/// `arm` (re)starts the window and replaces the pending payload, so the write
/// that eventually fires always carries the most recent state. The clock is
/// passed in explicitly; the caller's event loop decides when to `poll`.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: Duration,
    pending: Option<(Instant, PersistedState)>,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn arm(&mut self, now: Instant, state: PersistedState) {
        self.pending = Some((now + self.delay, state));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the payload if the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<PersistedState> {
        let due = self.deadline().is_some_and(|deadline| now >= deadline);
        if due { self.flush() } else { None }
    }

    /// Take the payload regardless of the deadline.
    pub fn flush(&mut self) -> Option<PersistedState> {
        self.pending.take().map(|(_, state)| state)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(active: &str) -> PersistedState {
        PersistedState {
            active_document_id: Some(active.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn rearming_keeps_only_latest_state() {
        let start = Instant::now();
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(500));
        debouncer.arm(start, state("a"));
        debouncer.arm(start + Duration::from_millis(300), state("b"));
        assert!(debouncer.poll(start + Duration::from_millis(600)).is_none());
        let fired = debouncer.poll(start + Duration::from_millis(800)).unwrap();
        assert_eq!(fired.active_document_id.as_deref(), Some("b"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn cancel_drops_pending_save() {
        let start = Instant::now();
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(10));
        debouncer.arm(start, state("a"));
        debouncer.cancel();
        assert!(debouncer.poll(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("state.json"));
        assert!(store.load().unwrap().is_none());
        store.save(&state("doc-1")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.active_document_id.as_deref(), Some("doc-1"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: PersistedState = serde_json::from_str("{}").unwrap();
        assert!(parsed.documents.is_empty());
        assert!(parsed.sidebar_open);
        assert_eq!(parsed.layout_mode, LayoutMode::Mindmap);
    }
}
