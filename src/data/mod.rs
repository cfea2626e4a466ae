//! Data module - structured values and global data sets

mod loader;

pub use loader::DataLoader;

use std::ops::Deref;
use std::sync::Arc;

/// Loosely typed structured value (mapping/sequence/scalar tree)
pub type Value = serde_json::Value;

/// String-keyed mapping that keeps insertion order
pub type Mapping = serde_json::Map<String, Value>;

/// Global data sets keyed by data file name
///
/// Frozen once loaded; clones share the same underlying mapping.
#[derive(Debug, Clone, Default)]
pub struct GlobalData(Arc<Mapping>);

impl GlobalData {
    pub fn new(data: Mapping) -> Self {
        Self(Arc::new(data))
    }

    /// Underlying mapping
    pub fn as_map(&self) -> &Mapping {
        &self.0
    }
}

impl Deref for GlobalData {
    type Target = Mapping;

    fn deref(&self) -> &Mapping {
        &self.0
    }
}

impl From<Mapping> for GlobalData {
    fn from(data: Mapping) -> Self {
        Self::new(data)
    }
}
