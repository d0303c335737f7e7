//! Ingestion 错误类型

use contracts::ContractError;
use thiserror::Error;

/// 批次处理错误
#[derive(Debug, Error)]
pub enum IngestError {
    /// 批次为空，不调用任何下游
    #[error("No data items provided")]
    EmptyBatch,

    /// 意外的内部错误
    #[error("{0}")]
    Internal(String),
}

impl IngestError {
    /// 是否为客户端错误
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyBatch)
    }
}

impl From<ContractError> for IngestError {
    fn from(err: ContractError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestError>;
