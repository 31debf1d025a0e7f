//! 画册流：候选来自指定画册内的图片。

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ImmichError;
use crate::feed::AssetSource;
use crate::immich::ImmichApi;

/// 画册来源。实体标识就是画册 ID，展示名由画册名拼出。
pub struct AlbumSource {
    api: Arc<dyn ImmichApi>,
    album_id: String,
    display_name: String,
}

impl AlbumSource {
    pub fn new(api: Arc<dyn ImmichApi>, album_id: impl Into<String>, album_name: &str) -> Self {
        Self {
            api,
            album_id: album_id.into(),
            display_name: format!("Immich: {album_name}"),
        }
    }
}

#[async_trait]
impl AssetSource for AlbumSource {
    fn unique_id(&self) -> &str {
        &self.album_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn refresh_candidate_ids(&self) -> Result<Vec<String>, ImmichError> {
        let assets = self.api.list_album_images(&self.album_id).await?;
        Ok(assets.into_iter().map(|asset| asset.id).collect())
    }
}
