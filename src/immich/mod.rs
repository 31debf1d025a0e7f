//! Immich HTTP 客户端。
//!
//! 每次操作独立建连（不跨调用复用连接），所有请求携带 x-api-key 头，
//! 单请求总超时 30s、连接超时 10s。传输层失败统一归为
//! [`ImmichError::CannotConnect`]，非 2xx 统一归为 [`ImmichError::Api`]；
//! “该资产不可下载”不是错误，以 `None` 表达。

pub mod protocol;

use async_trait::async_trait;
use log::{debug, error};
use tokio::time::Duration;

use crate::error::ImmichError;
use crate::image_type::is_downloadable_mime;
use protocol::{build_search_body, extract_search_items, filter_image_assets, SearchEnvelope};

pub use protocol::{Album, Asset, SearchFilter, UserInfo};

/// 每个请求携带 API key 的头名
const API_KEY_HEADER: &str = "x-api-key";

/// 新建一次性 HTTP 客户端（每次 API 调用独立建连）。
fn create_client() -> Result<reqwest::Client, ImmichError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("immich-feed/0.1")
        .build()
        .map_err(|e| ImmichError::CannotConnect(format!("Failed to create HTTP client: {e}")))
}

/// feed 层消费的远端操作集合。
///
/// [`ImmichClient`] 是生产实现；抽成 trait 后 feed 层可以换成内存实现做测试。
/// 会话校验类操作（authenticate / get_my_user_info）只在 setup 阶段用，
/// 留在 [`ImmichClient`] 的固有方法上。
#[async_trait]
pub trait ImmichApi: Send + Sync {
    /// 单个资产的元数据
    async fn get_asset_info(&self, asset_id: &str) -> Result<Asset, ImmichError>;

    /// 资产原图字节。非 2xx 或 Content-Type 不在允许列表时返回 `None`。
    async fn download_asset(&self, asset_id: &str) -> Result<Option<Vec<u8>>, ImmichError>;

    /// 元数据检索。请求体在调用方条件上补默认值，结果过两道图片过滤。
    async fn search_images(&self, filter: &SearchFilter) -> Result<Vec<Asset>, ImmichError>;

    /// 收藏的图片
    async fn list_favorite_images(&self) -> Result<Vec<Asset>, ImmichError>;

    /// 全部画册（不含画册内资产）
    async fn list_all_albums(&self) -> Result<Vec<Album>, ImmichError>;

    /// 某画册内的图片
    async fn list_album_images(&self, album_id: &str) -> Result<Vec<Asset>, ImmichError>;
}

/// Immich API 客户端。host + api key 即一个会话，可被多个 feed 共享。
#[derive(Debug, Clone)]
pub struct ImmichClient {
    host: String,
    api_key: String,
}

impl ImmichClient {
    /// host 末尾多余的 `/` 会被去掉。
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let host = host.into().trim().trim_end_matches('/').to_string();
        Self {
            host,
            api_key: api_key.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// 读 JSON 响应体。非 2xx 归为 API 错误；2xx 但响应体解析不出来同样归为
    /// API 错误（服务端可达但给出了不可用的内容）。
    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ImmichError> {
        let status = resp.status();
        let body = resp.text().await.map_err(ImmichError::connect)?;
        if !status.is_success() {
            error!("Immich API error: status={status}, body={body}");
            return Err(ImmichError::api(status, body));
        }
        serde_json::from_str(&body).map_err(|e| {
            error!("Immich API returned an unusable body: {e}");
            ImmichError::api(status, format!("invalid response body: {e}"))
        })
    }

    /// 校验 API key。非 2xx 或响应缺少 authStatus=true 时返回 `false`（记日志，
    /// 不报错）；只有连接不上才返回错误。
    pub async fn authenticate(&self) -> Result<bool, ImmichError> {
        let client = create_client()?;
        let resp = client
            .post(self.api_url("/api/auth/validateToken"))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ImmichError::connect)?;

        let status = resp.status();
        let body = resp.text().await.map_err(ImmichError::connect)?;
        if !status.is_success() {
            error!("Immich auth validation rejected: status={status}, body={body}");
            return Ok(false);
        }

        let auth: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        if auth.get("authStatus").and_then(serde_json::Value::as_bool) != Some(true) {
            error!("Immich auth validation missing positive authStatus: body={body}");
            return Ok(false);
        }
        Ok(true)
    }

    /// 当前用户信息（setup 阶段用于日志与命名）。
    pub async fn get_my_user_info(&self) -> Result<UserInfo, ImmichError> {
        let client = create_client()?;
        let resp = client
            .get(self.api_url("/api/users/me"))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ImmichError::connect)?;
        Self::read_json(resp).await
    }
}

#[async_trait]
impl ImmichApi for ImmichClient {
    async fn get_asset_info(&self, asset_id: &str) -> Result<Asset, ImmichError> {
        let client = create_client()?;
        let resp = client
            .get(self.api_url(&format!("/api/assets/{asset_id}")))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ImmichError::connect)?;
        Self::read_json(resp).await
    }

    async fn download_asset(&self, asset_id: &str) -> Result<Option<Vec<u8>>, ImmichError> {
        let client = create_client()?;
        let resp = client
            .get(self.api_url(&format!("/api/assets/{asset_id}/original")))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(ImmichError::connect)?;

        let status = resp.status();
        if !status.is_success() {
            error!("Failed to download asset {asset_id}: status={status}");
            return Ok(None);
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_downloadable_mime(&content_type) {
            error!("Asset {asset_id} has an unsupported MIME type: {content_type}");
            return Ok(None);
        }

        let bytes = resp.bytes().await.map_err(ImmichError::connect)?;
        Ok(Some(bytes.to_vec()))
    }

    async fn search_images(&self, filter: &SearchFilter) -> Result<Vec<Asset>, ImmichError> {
        let body = build_search_body(filter);
        debug!("Searching Immich metadata: {:?}", body);

        let client = create_client()?;
        let resp = client
            .post(self.api_url("/api/search/metadata"))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ImmichError::connect)?;

        let data: serde_json::Value = Self::read_json(resp).await?;
        let items = match extract_search_items(&data) {
            Some(items) => items,
            None => {
                error!("Unexpected Immich search response shape: {data}");
                return Ok(Vec::new());
            }
        };
        Ok(filter_image_assets(items))
    }

    async fn list_favorite_images(&self) -> Result<Vec<Asset>, ImmichError> {
        let client = create_client()?;
        let resp = client
            .post(self.api_url("/api/search/metadata"))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "isFavorite": true }))
            .send()
            .await
            .map_err(ImmichError::connect)?;

        let envelope: SearchEnvelope = Self::read_json(resp).await?;
        Ok(envelope
            .assets
            .items
            .into_iter()
            .filter(|asset| asset.is_image())
            .collect())
    }

    async fn list_all_albums(&self) -> Result<Vec<Album>, ImmichError> {
        let client = create_client()?;
        let resp = client
            .get(self.api_url("/api/albums"))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ImmichError::connect)?;
        Self::read_json(resp).await
    }

    async fn list_album_images(&self, album_id: &str) -> Result<Vec<Asset>, ImmichError> {
        let client = create_client()?;
        let resp = client
            .get(self.api_url(&format!("/api/albums/{album_id}")))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ImmichError::connect)?;

        let album: Album = Self::read_json(resp).await?;
        Ok(album
            .assets
            .into_iter()
            .filter(|asset| asset.is_image())
            .collect())
    }
}
