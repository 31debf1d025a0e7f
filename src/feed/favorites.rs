//! 收藏流：候选来自当前用户的全部收藏图片。

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ImmichError;
use crate::feed::AssetSource;
use crate::immich::ImmichApi;

/// 固定实体标识（一个账号只有一条收藏流）
pub const FAVORITE_UNIQUE_ID: &str = "favorite_image";
/// 固定展示名
pub const FAVORITE_DISPLAY_NAME: &str = "Immich: Random favorite image";

pub struct FavoriteSource {
    api: Arc<dyn ImmichApi>,
}

impl FavoriteSource {
    pub fn new(api: Arc<dyn ImmichApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AssetSource for FavoriteSource {
    fn unique_id(&self) -> &str {
        FAVORITE_UNIQUE_ID
    }

    fn display_name(&self) -> &str {
        FAVORITE_DISPLAY_NAME
    }

    async fn refresh_candidate_ids(&self) -> Result<Vec<String>, ImmichError> {
        let assets = self.api.list_favorite_images().await?;
        Ok(assets.into_iter().map(|asset| asset.id).collect())
    }
}
