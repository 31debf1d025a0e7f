//! Immich 随机照片流集成核心（供宿主运行时作为图片实体后端加载）。
//!
//! 两个协作部分：[`immich`] 负责与 Immich 服务端的 HTTP 交互并归一化响应，
//! [`feed`] 按来源（收藏/画册/检索）维护候选资产池与当前展示图片。
//! 宿主通过 [`setup`] 校验凭据并构建全部 feed，再以固定节奏驱动轮换
//! （或直接交给 [`feed::rotator`]），通过 [`emitter`] 订阅状态变更。

pub mod config;
pub mod emitter;
pub mod error;
pub mod feed;
pub mod image_type;
pub mod immich;
pub mod setup;

#[cfg(test)]
mod testutil;

pub use config::{FeedConfig, SearchFeedConfig};
pub use emitter::{FeedEmitter, FeedEvent};
pub use error::ImmichError;
pub use feed::{AssetSource, FeedTiming, PhotoFeed};
pub use immich::{ImmichApi, ImmichClient};
