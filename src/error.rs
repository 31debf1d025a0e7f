//! 集成统一错误类型。

use thiserror::Error;

/// Immich 集成的错误分类。
///
/// 传输层连接失败与 API 返回失败状态分开表达，宿主据此区分
/// “服务不可达”与“服务报错”。“候选池为空”“资产不可下载”不是错误，
/// 分别以空列表 / `None` 表达。
#[derive(Debug, Error)]
pub enum ImmichError {
    /// 传输层无法连接到 Immich 服务端。
    #[error("Failed to connect to Immich server: {0}")]
    CannotConnect(String),

    /// 服务端可达，但对本次操作返回了失败状态或不可用的响应体。
    #[error("Immich API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// API key 校验未通过（仅在建立会话阶段出现）。
    #[error("Invalid Immich API key")]
    InvalidAuth,
}

impl ImmichError {
    /// 传输层错误的统一包装（reqwest 错误一律归为无法连接）。
    pub(crate) fn connect(e: reqwest::Error) -> Self {
        ImmichError::CannotConnect(e.to_string())
    }

    /// 非 2xx 响应的统一包装。
    pub(crate) fn api(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        ImmichError::Api {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}
