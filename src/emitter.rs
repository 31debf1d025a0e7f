//! 面向宿主的事件广播。
//!
//! 每次成功换图后广播一条状态变更，宿主订阅后据此刷新实体；
//! 轮换驱动中出现的错误也走同一通道上报。单通道，宿主订阅全部事件流。

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 广播通道容量（慢消费者积压超过该值后丢最旧事件）。
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// feed 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedEvent {
    /// 展示图片已更新
    ImageUpdated {
        source_id: String,
        filename: String,
        /// RFC 3339 时间戳
        updated_at: String,
    },

    /// 候选池已刷新
    CandidatesRefreshed { source_id: String, count: usize },

    /// 一次轮换更新失败（连接或 API 错误）
    UpdateFailed { source_id: String, error: String },
}

/// feed 事件广播器。
pub struct FeedEmitter {
    tx: broadcast::Sender<FeedEvent>,
}

impl FeedEmitter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// 广播一个事件。没有订阅者时跳过发送。
    pub fn emit(&self, event: FeedEvent) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let _ = self.tx.send(event);
    }

    /// 订阅事件流（丢弃返回的 receiver 即取消订阅）。
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    /// 当前订阅者数量
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for FeedEmitter {
    fn default() -> Self {
        Self::new()
    }
}
