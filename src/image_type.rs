//! 资产 MIME 允许列表，集中定义供客户端两条路径一致使用。
//! 原图下载路径只接受可直接展示的位图；检索过滤路径放宽到服务端会返回的全部图片类型。

/// 原图下载允许的 MIME 类型（响应 Content-Type 未命中则该资产视为不可下载）。
const DOWNLOAD_MIME_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// 检索结果第二道过滤允许的 MIME 类型（兼容 jpg 别名与 HEIC/HEIF）。
const SEARCH_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// 判断下载响应的 Content-Type 是否允许展示。大小写不敏感，忽略 `;` 之后的参数。
pub fn is_downloadable_mime(mime: &str) -> bool {
    let m = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    if m.is_empty() {
        return false;
    }
    DOWNLOAD_MIME_TYPES.contains(&m.as_str())
}

/// 判断检索条目声明的 MIME 是否为允许的图片类型。
pub fn is_search_image_mime(mime: &Option<String>) -> bool {
    let Some(m) = mime else { return false };
    let m = m.trim().to_lowercase();
    if m.is_empty() {
        return false;
    }
    SEARCH_MIME_TYPES.contains(&m.as_str())
}
