//! Errors - エラー型と分類
//!
//! core のすべての操作はこの `CapsuleError` を返します。
//! HTTP ステータスへの変換は transport 層（capsule-server）の責務です。

use thiserror::Error;

use super::ids::CapsuleId;

/// ErrorKind は運用上の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 呼び出し側の入力が不正（リトライ無意味）
    InvalidInput,
    /// 対象が存在しない
    NotFound,
    /// 対象は存在するが公開されていない
    Forbidden,
    /// store や乱数源の障害
    Internal,
}

#[derive(Debug, Error)]
pub enum CapsuleError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("capsule not found: {0}")]
    NotFound(CapsuleId),

    #[error("capsule is private: {0}")]
    Forbidden(CapsuleId),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CapsuleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
