//! Page registry
//!
//! Collecting pages and reading them are two separate phases. A
//! [`PageRegistry`] accepts records until [`PageRegistry::barrier`] consumes
//! it and hands back a frozen [`PageSnapshot`], which is the only way to
//! inject the page list into render contexts.

use std::sync::Arc;

use crate::data::{Mapping, Value};

/// Context key the page list is bound to
pub const ALL_PAGES_KEY: &str = "all_pages";

/// A page known to the run
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    /// Output path relative to the file base
    pub path: String,
    /// The page's front-matter
    pub metadata: Mapping,
}

impl PageEntry {
    /// Template view of the entry: `{path, data}`
    pub fn to_value(&self) -> Value {
        let mut entry = Mapping::new();
        entry.insert("path".to_string(), Value::String(self.path.clone()));
        entry.insert("data".to_string(), Value::Object(self.metadata.clone()));
        Value::Object(entry)
    }
}

/// Accumulating phase of the registry
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: Vec<PageEntry>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page; call once per output file, in emission order
    pub fn record(&mut self, path: impl Into<String>, metadata: Option<&Mapping>) {
        self.pages.push(PageEntry {
            path: path.into(),
            metadata: metadata.cloned().unwrap_or_default(),
        });
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Close the registry once every page has been recorded
    pub fn barrier(self) -> PageSnapshot {
        tracing::debug!("Page registry sealed with {} pages", self.pages.len());
        let value = Value::Array(self.pages.iter().map(PageEntry::to_value).collect());
        PageSnapshot {
            entries: self.pages.into(),
            value: Arc::new(value),
        }
    }
}

/// Frozen list of every page in the run
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    entries: Arc<[PageEntry]>,
    value: Arc<Value>,
}

impl PageSnapshot {
    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind the page list into a context, replacing any existing binding
    pub fn annotate(&self, mut context: Mapping) -> Mapping {
        context.insert(ALL_PAGES_KEY.to_string(), (*self.value).clone());
        context
    }
}
