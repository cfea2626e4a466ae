//! Data loader - loads global data sets from the data directory

use std::fs;
use std::path::Path;

use super::{GlobalData, Mapping, Value};
use crate::error::{NucleusError, Result};

/// Loads every data file of a directory into [`GlobalData`]
pub struct DataLoader {
    extension: String,
}

impl DataLoader {
    /// Create a loader for files ending in `.{extension}`
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Load all data sets from `data_dir`
    ///
    /// A missing directory yields empty data. Files are read in lexicographic
    /// name order, so a repeated key is last-wins in that order.
    pub fn load(&self, data_dir: Option<&Path>) -> Result<GlobalData> {
        let data_dir = match data_dir {
            Some(dir) if dir.exists() => dir,
            Some(dir) => {
                tracing::debug!("Data directory {:?} does not exist, skipping", dir);
                return Ok(GlobalData::default());
            }
            None => return Ok(GlobalData::default()),
        };

        let io_err = |source| NucleusError::Io {
            path: data_dir.to_path_buf(),
            source,
        };

        let mut entries = fs::read_dir(data_dir)
            .map_err(io_err)?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(io_err)?;
        entries.sort_by_key(|entry| entry.file_name());

        let suffix = format!(".{}", self.extension);
        let mut data = Mapping::new();

        for entry in entries {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(key) = name.strip_suffix(&suffix) else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(|e| NucleusError::DataLoad {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let value: Value =
                serde_yaml::from_str(&content).map_err(|e| NucleusError::DataLoad {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

            tracing::debug!("Loaded data set `{}` from {:?}", key, path);
            data.insert(key.to_string(), value);
        }

        tracing::debug!("Loaded {} data sets from {:?}", data.len(), data_dir);
        Ok(GlobalData::new(data))
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new("yaml")
    }
}
