use diesel::result::Error as DieselError;
use ethers_providers::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // 捕获所有 SQL 执行、ORM 映射错误、NotFound 错误等。
    #[error("Database query error: {0}")]
    DatabaseQuery(#[from] DieselError),

    // 从连接池获取连接失败
    #[error("Database connection pool error: {0}")]
    ConnectionPool(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("类型转换错误: {0}")]
    Conversion(String),

    /// 业务逻辑冲突（重复插入、状态异常）
    #[error("业务冲突错误: {0}")]
    Conflict(String),

    /// 资源未找到
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 内部不可预期错误（兜底）
    #[error("内部错误: {0}")]
    Internal(String),

    #[error("无效的provider: {0}")]
    ProviderError(String),

    #[error("区块链RPC错误 (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("解析错误: {0}")]
    Decode(#[from] DecodeError),
}

/// 节点数据解码异常，调用方负责折叠为默认值
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("uint256 overflow: {0}")]
    Overflow(String),

    #[error("payload too short: need {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },

    #[error("invalid utf-8 in abi string")]
    InvalidUtf8,

    #[error("unexpected shape: {0}")]
    Shape(String),
}

impl AppError {
    /// 节点明确返回"不存在"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Conversion(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::num::TryFromIntError> for AppError {
    fn from(err: std::num::TryFromIntError) -> Self {
        AppError::Conversion(err.to_string())
    }
}
