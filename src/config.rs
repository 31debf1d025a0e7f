//! 宿主在建立集成时传入的配置。
//!
//! 配置在进程生命周期内不变；宿主自己负责持久化（本 crate 不落盘）。

use serde::{Deserialize, Serialize};
use url::Url;

use crate::immich::SearchFilter;

/// 单个检索类 feed 的配置。
/// filter 带 personIds 时按人并发检索并对结果取并集（OR 语义）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFeedConfig {
    /// 宿主实体注册用的唯一标识
    pub unique_id: String,
    /// 展示名称
    pub name: String,
    /// Immich 元数据检索条件
    #[serde(default)]
    pub filter: SearchFilter,
}

/// 集成配置（宿主 setup 时一次性传入）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Immich 服务端地址，如 `https://immich.local:2283`
    pub host: String,
    /// API key，随每个请求以 x-api-key 头发送
    pub api_key: String,
    /// 参与轮换的画册 ID 列表（名称在 setup 时从服务端画册列表解析）
    #[serde(default)]
    pub watched_albums: Vec<String>,
    /// 检索类 feed 列表
    #[serde(default)]
    pub searches: Vec<SearchFeedConfig>,
}

impl FeedConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            watched_albums: Vec::new(),
            searches: Vec::new(),
        }
    }

    /// 校验配置可用：host 必须是 http(s) URL，api key 与检索标识非空。
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(self.host.trim())
            .map_err(|e| format!("Invalid Immich host URL: {e}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!("Unsupported Immich host scheme: {}", url.scheme()));
        }
        if self.api_key.trim().is_empty() {
            return Err("Immich API key is empty".to_string());
        }
        for search in &self.searches {
            if search.unique_id.trim().is_empty() {
                return Err("Search feed uniqueId is empty".to_string());
            }
        }
        Ok(())
    }
}
