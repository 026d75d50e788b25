//! YAML flow catalog source.
//!
//! Points at a single catalog file or at a directory of `*.yaml`/`*.yml`
//! files, which are merged in file name order.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::flow::FlowCatalog;
use crate::ports::FlowRepositoryError;

/// Location of the YAML flow catalog on disk.
#[derive(Debug, Clone)]
pub struct YamlFlowSource {
    path: PathBuf,
}

impl YamlFlowSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and merges the catalog. Validation happens at compile time.
    pub async fn load(&self) -> Result<FlowCatalog, FlowRepositoryError> {
        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|e| unavailable(&self.path, e))?;

        let files = if metadata.is_dir() {
            self.catalog_files().await?
        } else {
            vec![self.path.clone()]
        };

        let mut catalog = FlowCatalog::default();
        for file in files {
            let source = fs::read_to_string(&file)
                .await
                .map_err(|e| unavailable(&file, e))?;
            catalog.extend(FlowCatalog::from_yaml(&source)?);
            tracing::debug!(file = %file.display(), "Loaded flow catalog file");
        }
        Ok(catalog)
    }

    async fn catalog_files(&self) -> Result<Vec<PathBuf>, FlowRepositoryError> {
        let mut entries = fs::read_dir(&self.path)
            .await
            .map_err(|e| unavailable(&self.path, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| unavailable(&self.path, e))?
        {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn unavailable(path: &Path, error: std::io::Error) -> FlowRepositoryError {
    FlowRepositoryError::Unavailable(format!("{}: {}", path.display(), error))
}
