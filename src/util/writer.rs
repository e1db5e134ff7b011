use std::path::PathBuf;

use bytes::Bytes;
use serde_json::{Map, json};
use tokio::fs;
use uuid::Uuid;

use crate::{
    errors::Result,
    providers::{ImageQuality, ImageSize},
    util::{format_local, local_rfc3339, now_local},
};

/// A downloaded image together with what produced it.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    pub data: Bytes,
    pub prompt: String,
    pub model: String,
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub source_url: String,
}

/// Stores downloaded images next to a `.meta.json` sidecar.
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub async fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub async fn persist(&self, artifact: &ImageArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).await?;
        let now = now_local();
        let id = Uuid::new_v4().simple().to_string();
        let base_name = format!(
            "image_{}_{}",
            format_local(&now, "%Y%m%d_%H%M%S"),
            &id[..8]
        );

        let file_name = format!("{base_name}.png");
        let file_path = self.root.join(&file_name);
        fs::write(&file_path, &artifact.data).await?;

        let mut meta = Map::new();
        meta.insert("artifact".to_string(), json!(file_name));
        meta.insert("prompt".to_string(), json!(artifact.prompt));
        meta.insert("model".to_string(), json!(artifact.model));
        meta.insert("size".to_string(), json!(artifact.size.as_str()));
        meta.insert("quality".to_string(), json!(artifact.quality.as_str()));
        meta.insert("source_url".to_string(), json!(artifact.source_url));
        meta.insert("created_at".to_string(), json!(local_rfc3339(&now)));

        let meta_path = self.root.join(format!("{base_name}.meta.json"));
        fs::write(&meta_path, serde_json::to_vec_pretty(&meta)?).await?;

        Ok(file_path)
    }
}
