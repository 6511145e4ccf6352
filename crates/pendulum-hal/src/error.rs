//! HAL 层错误类型定义

use thiserror::Error;

/// 后端错误类型
///
/// 由 `Backend` 实现（仿真 / 串口）返回，HAL 只负责传播。
#[derive(Error, Debug)]
pub enum BackendError {
    /// 底层 IO 错误（串口读写等）
    #[error("Backend IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 协议解析错误（无效帧）
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 设备端报告的错误（`E <message>` 帧）
    #[error("Device reported error: {0}")]
    Device(String),

    /// 等待应答超时
    #[error("Backend timeout")]
    Timeout,

    /// 后端已断开
    #[error("Backend disconnected")]
    Disconnected,

    /// 无效输入（如非有限的目标值）
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// HAL 错误类型
#[derive(Error, Debug)]
pub enum HalError {
    /// 配置错误（致命，在与后端交互前报告）
    #[error("Configuration error: {0}")]
    Config(String),

    /// 未识别的复位模式（致命）
    #[error("Unknown reset mode: {0:?} (expected \"home\" or \"random\")")]
    UnknownResetMode(String),

    /// 后端读数为 NaN/Inf
    #[error("Non-finite backend reading in field `{field}`: {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// 后端错误
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// 配置文件读取错误
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析错误
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl HalError {
    /// 是否为配置类（致命）错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            HalError::Config(_) | HalError::UnknownResetMode(_) | HalError::Parse(_)
        )
    }
}
