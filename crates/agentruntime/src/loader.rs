// crates/agentruntime/src/loader.rs
use agentcore::{Design, RunError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Supplies designs before a run starts
#[async_trait]
pub trait DesignLoader: Send + Sync {
    async fn load(&self, design_id: &str) -> Result<Design, RunError>;
}

/// Reads designs from `<dir>/<id>.json`
pub struct FileDesignLoader {
    dir: PathBuf,
}

impl FileDesignLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Parse a single design file
    pub async fn read_file(path: &Path) -> Result<Design, RunError> {
        let json = tokio::fs::read_to_string(path).await?;
        let design: Design = serde_json::from_str(&json)?;
        Ok(design)
    }
}

#[async_trait]
impl DesignLoader for FileDesignLoader {
    async fn load(&self, design_id: &str) -> Result<Design, RunError> {
        let path = self.dir.join(format!("{}.json", design_id));
        if !path.exists() {
            return Err(RunError::DesignNotFound(design_id.to_string()));
        }

        tracing::debug!("Loading design {} from {}", design_id, path.display());
        Self::read_file(&path).await
    }
}
