//! 检索流：候选来自一条保存的元数据检索。
//!
//! 带人物列表的检索对每个人物并发各查一遍，再把命中的资产取并集；
//! 不带人物列表的检索按原条件单次查询。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::error::ImmichError;
use crate::feed::AssetSource;
use crate::immich::{ImmichApi, SearchFilter};

/// 单次检索的来源
pub struct SearchSource {
    api: Arc<dyn ImmichApi>,
    unique_id: String,
    display_name: String,
    filter: SearchFilter,
}

impl SearchSource {
    pub fn new(
        api: Arc<dyn ImmichApi>,
        unique_id: impl Into<String>,
        display_name: impl Into<String>,
        filter: SearchFilter,
    ) -> Self {
        Self {
            api,
            unique_id: unique_id.into(),
            display_name: display_name.into(),
            filter,
        }
    }
}

#[async_trait]
impl AssetSource for SearchSource {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn refresh_candidate_ids(&self) -> Result<Vec<String>, ImmichError> {
        let assets = self.api.search_images(&self.filter).await?;
        Ok(assets.into_iter().map(|asset| asset.id).collect())
    }
}

/// 人物并集检索：对条件里的每个人物 ID 并发各查一遍，结果取并集，
/// 同一资产命中多个人物只留一份。任何一路失败整组失败。
pub struct PersonUnionSearchSource {
    api: Arc<dyn ImmichApi>,
    unique_id: String,
    display_name: String,
    filter: SearchFilter,
}

impl PersonUnionSearchSource {
    pub fn new(
        api: Arc<dyn ImmichApi>,
        unique_id: impl Into<String>,
        display_name: impl Into<String>,
        filter: SearchFilter,
    ) -> Self {
        Self {
            api,
            unique_id: unique_id.into(),
            display_name: display_name.into(),
            filter,
        }
    }
}

#[async_trait]
impl AssetSource for PersonUnionSearchSource {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn refresh_candidate_ids(&self) -> Result<Vec<String>, ImmichError> {
        let searches = self.filter.person_ids.iter().map(|person_id| {
            let filter = self.filter.for_person(person_id);
            let api = self.api.clone();
            async move { api.search_images(&filter).await }
        });
        let batches = try_join_all(searches).await?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for asset in batches.into_iter().flatten() {
            if seen.insert(asset.id.clone()) {
                ids.push(asset.id);
            }
        }
        Ok(ids)
    }
}
