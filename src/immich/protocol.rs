//! Immich API 的数据类型与检索响应解析。
//!
//! 元数据检索的响应在服务端版本间有两种形状：顶层 `items` 数组，
//! 或 `assets` 对象内嵌 `items` 数组。这里的提取器两种都兼容，
//! 无法识别的形状按“无条目”处理，由调用方记日志并返回空列表。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::image_type::is_search_image_mime;

/// 图片类型条目在 type 字段中的固定值
pub(crate) const ASSET_TYPE_IMAGE: &str = "IMAGE";

/// 检索默认分页上限
const SEARCH_DEFAULT_SIZE: u64 = 400;

/// 一个资产。检索条目与 `/api/assets/{id}` 详情共用同一形状。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    /// 资产类型，图片为 "IMAGE"
    #[serde(rename = "type", default)]
    pub asset_type: String,
    #[serde(default)]
    pub original_file_name: String,
    /// 新版服务端的 MIME 字段
    #[serde(default)]
    pub original_mime_type: Option<String>,
    /// 旧版服务端的 MIME 字段（originalMimeType 缺失时回退）
    #[serde(default)]
    pub mime_type: Option<String>,
    /// EXIF 原始 JSON 对象
    #[serde(default)]
    pub exif_info: Option<Value>,
    /// 拍摄地时区的本地时间
    #[serde(default)]
    pub local_date_time: Option<String>,
}

impl Asset {
    /// 条目声明的 MIME：优先 originalMimeType，回退 mimeType，统一小写。
    pub fn declared_mime(&self) -> Option<String> {
        self.original_mime_type
            .as_deref()
            .or(self.mime_type.as_deref())
            .map(|m| m.trim().to_lowercase())
    }

    pub fn is_image(&self) -> bool {
        self.asset_type == ASSET_TYPE_IMAGE
    }
}

/// 当前用户信息（`/api/users/me`）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// 画册。`/api/albums` 列表项不带 assets，`/api/albums/{id}` 详情带。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub asset_count: u64,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// 元数据检索条件。未建模的键放 extra 原样透传给服务端。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_after: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_ids: Vec<String>,
    /// 资产类型；缺省时请求体里补 IMAGE
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// 分页上限；缺省时请求体里补默认值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchFilter {
    /// 只保留单个 personId、其余条件不变的拷贝（按人 fan-out 用）。
    pub(crate) fn for_person(&self, person_id: &str) -> SearchFilter {
        let mut one = self.clone();
        one.person_ids = vec![person_id.to_string()];
        one
    }
}

/// 把检索条件合并到固定默认值之上；调用方给出的键覆盖默认值。
pub(crate) fn build_search_body(filter: &SearchFilter) -> Map<String, Value> {
    let mut body = match serde_json::to_value(filter) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    body.entry("type".to_string())
        .or_insert_with(|| Value::String(ASSET_TYPE_IMAGE.to_string()));
    body.entry("size".to_string())
        .or_insert_with(|| Value::Number(SEARCH_DEFAULT_SIZE.into()));
    body
}

/// 按两种已知形状提取检索条目；形状无法识别时返回 None。
/// `assets` 对象存在但没有 `items` 时视为空结果而非异常形状。
pub(crate) fn extract_search_items(body: &Value) -> Option<Vec<Value>> {
    if let Some(items) = body.get("items").and_then(Value::as_array) {
        return Some(items.clone());
    }
    if let Some(assets) = body.get("assets").and_then(Value::as_object) {
        let items = assets
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        return Some(items);
    }
    None
}

/// 解析条目并应用第二道过滤：仅保留 IMAGE 且声明 MIME 在允许列表内的条目。
/// 解析不出来的条目直接丢弃。
pub(crate) fn filter_image_assets(items: Vec<Value>) -> Vec<Asset> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Asset>(item).ok())
        .filter(|asset| asset.is_image() && is_search_image_mime(&asset.declared_mime()))
        .collect()
}

/// 收藏列表响应的严格形状（`assets.items`）。
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchEnvelope {
    pub assets: AssetBucket,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AssetBucket {
    #[serde(default)]
    pub items: Vec<Asset>,
}
