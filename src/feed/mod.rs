//! 随机照片流。
//!
//! 每个 feed 绑定一个候选来源（收藏 / 画册 / 检索），维护一份带时间戳的
//! 候选 ID 缓存，过期后重拉。换图时随机挑一个候选下载原图并抓元数据，
//! 下载不到的资产冷却一段时间后换一张继续试；候选为空只记日志，当前图
//! 保持不变。所有时间参数集中在 [`FeedTiming`]，测试可注入缩短的间隔。

pub mod album;
pub mod favorites;
pub mod rotator;
pub mod search;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{sleep, Duration, Instant};

use crate::emitter::{FeedEmitter, FeedEvent};
use crate::error::ImmichError;
use crate::immich::ImmichApi;

pub use album::AlbumSource;
pub use favorites::FavoriteSource;
pub use rotator::FeedRotator;
pub use search::{PersonUnionSearchSource, SearchSource};

/// 候选 ID 缓存的刷新间隔
pub const ID_REFRESH_INTERVAL: Duration = Duration::from_secs(8 * 60 * 60);
/// 挑到下载不了的资产时，换一张重试前的冷却
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
/// 周期换图的间隔
pub const SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// feed 的时间参数。生产用 [`FeedTiming::default`]。
#[derive(Debug, Clone)]
pub struct FeedTiming {
    pub id_refresh_interval: Duration,
    pub retry_delay: Duration,
    pub scan_interval: Duration,
}

impl Default for FeedTiming {
    fn default() -> Self {
        Self {
            id_refresh_interval: ID_REFRESH_INTERVAL,
            retry_delay: RETRY_DELAY,
            scan_interval: SCAN_INTERVAL,
        }
    }
}

/// 一类候选图片的来源。实现者只负责拉一遍“当前可选的资产 ID”；
/// 缓存、随机挑选与下载由 [`PhotoFeed`] 统一处理。
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// 实体唯一标识
    fn unique_id(&self) -> &str;

    /// 展示名
    fn display_name(&self) -> &str;

    /// 拉取当前全部候选资产 ID
    async fn refresh_candidate_ids(&self) -> Result<Vec<String>, ImmichError>;
}

/// 候选 ID 缓存和它的刷新时间戳
struct CandidatePool {
    ids: Vec<String>,
    refreshed_at: Instant,
}

/// 当前展示图暴露给宿主的附加属性。字段缺失时保持空串。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttributes {
    pub media_filename: String,
    pub media_exif: Value,
    pub media_localdatetime: String,
}

impl Default for ImageAttributes {
    fn default() -> Self {
        Self {
            media_filename: String::new(),
            media_exif: Value::String(String::new()),
            media_localdatetime: String::new(),
        }
    }
}

/// 已下载、正在展示的一张图
#[derive(Debug, Clone)]
pub struct DisplayedImage {
    pub bytes: Vec<u8>,
    pub updated_at: DateTime<Utc>,
    pub attributes: ImageAttributes,
}

/// 一条随机照片流。
///
/// 并发安全：候选缓存锁覆盖“判旧、重拉、盖戳、挑选”全程，避免并发换图
/// 重复打远端；当前图用读写锁，宿主取图（读）与换图（写）互不阻塞。
pub struct PhotoFeed {
    api: Arc<dyn ImmichApi>,
    source: Box<dyn AssetSource>,
    timing: FeedTiming,
    emitter: Arc<FeedEmitter>,
    pool: Mutex<Option<CandidatePool>>,
    current: RwLock<Option<DisplayedImage>>,
}

impl PhotoFeed {
    pub fn new(
        api: Arc<dyn ImmichApi>,
        source: Box<dyn AssetSource>,
        timing: FeedTiming,
        emitter: Arc<FeedEmitter>,
    ) -> Self {
        Self {
            api,
            source,
            timing,
            emitter,
            pool: Mutex::new(None),
            current: RwLock::new(None),
        }
    }

    pub fn unique_id(&self) -> &str {
        self.source.unique_id()
    }

    pub fn display_name(&self) -> &str {
        self.source.display_name()
    }

    pub fn timing(&self) -> &FeedTiming {
        &self.timing
    }

    /// 随机挑下一张候选。缓存过期（或从没拉过）就重拉并盖新戳，拉回来是
    /// 空的同样盖戳；候选为空记错误日志并返回 `None`。
    async fn next_asset_id(&self) -> Result<Option<String>, ImmichError> {
        let mut pool = self.pool.lock().await;

        let needs_refresh = match pool.as_ref() {
            Some(cached) => cached.refreshed_at.elapsed() > self.timing.id_refresh_interval,
            None => true,
        };
        if needs_refresh {
            info!(
                "Refreshing candidate asset ids for feed {}",
                self.source.unique_id()
            );
            let ids = self.source.refresh_candidate_ids().await?;
            self.emitter.emit(FeedEvent::CandidatesRefreshed {
                source_id: self.source.unique_id().to_string(),
                count: ids.len(),
            });
            *pool = Some(CandidatePool {
                ids,
                refreshed_at: Instant::now(),
            });
        }

        let ids = pool
            .as_ref()
            .map(|cached| cached.ids.as_slice())
            .unwrap_or(&[]);
        if ids.is_empty() {
            error!("No image found for feed {}", self.source.unique_id());
            return Ok(None);
        }
        Ok(Some(ids[random_index(ids.len())].clone()))
    }

    /// 换一张图：随机挑候选，下载原图并抓元数据，换上后对外广播。
    /// 挑到下载不了的资产就冷却 [`FeedTiming::retry_delay`] 再换一张；
    /// 没有候选时直接返回，当前图保持不变。
    pub async fn update(&self) -> Result<(), ImmichError> {
        loop {
            let asset_id = match self.next_asset_id().await? {
                Some(id) => id,
                None => return Ok(()),
            };

            let bytes = match self.api.download_asset(&asset_id).await? {
                Some(bytes) => bytes,
                None => {
                    warn!("Asset {asset_id} could not be downloaded, picking another");
                    sleep(self.timing.retry_delay).await;
                    continue;
                }
            };

            let info = self.api.get_asset_info(&asset_id).await?;
            let attributes = ImageAttributes {
                media_filename: info.original_file_name.clone(),
                media_exif: info
                    .exif_info
                    .clone()
                    .unwrap_or_else(|| Value::String(String::new())),
                media_localdatetime: info.local_date_time.clone().unwrap_or_default(),
            };

            let updated_at = Utc::now();
            {
                let mut current = self.current.write().await;
                *current = Some(DisplayedImage {
                    bytes,
                    updated_at,
                    attributes: attributes.clone(),
                });
            }

            self.emitter.emit(FeedEvent::ImageUpdated {
                source_id: self.source.unique_id().to_string(),
                filename: attributes.media_filename,
                updated_at: updated_at.to_rfc3339(),
            });
            return Ok(());
        }
    }

    /// 当前图字节。还没有图时先换一张；仍然没有（比如候选为空）返回 `None`。
    pub async fn image(&self) -> Result<Option<Vec<u8>>, ImmichError> {
        {
            let current = self.current.read().await;
            if let Some(image) = current.as_ref() {
                return Ok(Some(image.bytes.clone()));
            }
        }
        self.update().await?;
        let current = self.current.read().await;
        Ok(current.as_ref().map(|image| image.bytes.clone()))
    }

    /// 当前图的附加属性（还没有图时为 `None`）
    pub async fn attributes(&self) -> Option<ImageAttributes> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|image| image.attributes.clone())
    }

    /// 最近一次换图时间
    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.current.read().await.as_ref().map(|image| image.updated_at)
    }
}

/// 纳秒时间戳取模的轻量随机挑选。`len` 必须大于 0。
fn random_index(len: usize) -> usize {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as usize)
        .unwrap_or(0);
    nanos % len
}
