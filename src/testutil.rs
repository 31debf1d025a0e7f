//! 测试共用的内存版依赖与极简 HTTP 应答器。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::ImmichError;
use crate::feed::AssetSource;
use crate::immich::{Album, Asset, ImmichApi, SearchFilter};

/// 起一个固定应答的 HTTP 服务：读完一个请求后返回同一份响应，循环服务
/// 每个连接。返回可直接作为 host 的 `http://127.0.0.1:{port}`。
pub(crate) async fn spawn_canned_server(
    status_line: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                read_http_request(&mut socket).await;
                let header = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

/// 读完一个 HTTP 请求：先到头部结束，再按 content-length 读完 body，
/// 避免在客户端写完之前关闭连接。
async fn read_http_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    let mut body_read = buf.len() - header_end;
    while body_read < content_length {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        body_read += n;
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// 内存版 Immich：按资产 ID 提供固定字节与元数据，并统计下载次数。
#[derive(Default)]
pub(crate) struct MockApi {
    pub(crate) bytes: HashMap<String, Vec<u8>>,
    pub(crate) info: HashMap<String, Asset>,
    pub(crate) favorites: Vec<Asset>,
    pub(crate) albums: Vec<Album>,
    pub(crate) album_images: HashMap<String, Vec<Asset>>,
    pub(crate) download_calls: AtomicUsize,
}

#[async_trait]
impl ImmichApi for MockApi {
    async fn get_asset_info(&self, asset_id: &str) -> Result<Asset, ImmichError> {
        self.info
            .get(asset_id)
            .cloned()
            .ok_or_else(|| ImmichError::Api {
                status: 404,
                message: format!("unknown asset {asset_id}"),
            })
    }

    async fn download_asset(&self, asset_id: &str) -> Result<Option<Vec<u8>>, ImmichError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.get(asset_id).cloned())
    }

    async fn search_images(&self, _filter: &SearchFilter) -> Result<Vec<Asset>, ImmichError> {
        Ok(Vec::new())
    }

    async fn list_favorite_images(&self) -> Result<Vec<Asset>, ImmichError> {
        Ok(self.favorites.clone())
    }

    async fn list_all_albums(&self) -> Result<Vec<Album>, ImmichError> {
        Ok(self.albums.clone())
    }

    async fn list_album_images(&self, album_id: &str) -> Result<Vec<Asset>, ImmichError> {
        Ok(self
            .album_images
            .get(album_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// 按批次吐候选 ID 的来源：每次刷新取下一批，最后一批之后一直重复它。
pub(crate) struct MockSource {
    batches: Mutex<Vec<Vec<String>>>,
    pub(crate) refresh_calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub(crate) fn new(batches: Vec<Vec<&str>>) -> Self {
        Self {
            batches: Mutex::new(
                batches
                    .into_iter()
                    .map(|ids| ids.into_iter().map(str::to_string).collect())
                    .collect(),
            ),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl AssetSource for MockSource {
    fn unique_id(&self) -> &str {
        "mock_feed"
    }

    fn display_name(&self) -> &str {
        "Mock feed"
    }

    async fn refresh_candidate_ids(&self) -> Result<Vec<String>, ImmichError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut batches = self.batches.lock().unwrap();
        if batches.len() > 1 {
            Ok(batches.remove(0))
        } else {
            Ok(batches.first().cloned().unwrap_or_default())
        }
    }
}

/// 只有 IMAGE 类型与文件名的最小资产
pub(crate) fn image_asset(id: &str, file_name: &str) -> Asset {
    Asset {
        id: id.to_string(),
        asset_type: "IMAGE".to_string(),
        original_file_name: file_name.to_string(),
        original_mime_type: Some("image/jpeg".to_string()),
        mime_type: None,
        exif_info: None,
        local_date_time: Some("2024-05-01T10:00:00".to_string()),
    }
}

/// 不带内嵌资产的画册条目（列表端点的形状）
pub(crate) fn album(id: &str, name: &str, asset_count: u64) -> Album {
    Album {
        id: id.to_string(),
        album_name: name.to_string(),
        asset_count,
        assets: Vec::new(),
    }
}
