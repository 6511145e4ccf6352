//! 后端选择

use crate::config::AppConfig;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pendulum_backend::SimulatedBackend;
use pendulum_hal::Backend;
use tracing::info;

/// 后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// 内置仿真器
    Sim,
    /// 串口连接的真实机器人
    Serial,
}

/// 后端相关参数（覆盖配置文件）
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// 后端类型
    #[arg(short, long, value_enum, default_value_t = BackendKind::Sim)]
    pub backend: BackendKind,

    /// 串口路径（覆盖 `serial.port`）
    #[arg(short, long)]
    pub port: Option<String>,

    /// 波特率（覆盖 `serial.baud_rate`）
    #[arg(long)]
    pub baud: Option<u32>,
}

/// 根据参数创建后端
pub fn open_backend(args: &BackendArgs, config: &AppConfig) -> Result<Box<dyn Backend>> {
    match args.backend {
        BackendKind::Sim => {
            let backend = SimulatedBackend::new(config.sim).context("Failed to create simulator")?;
            info!("Using simulated backend");
            Ok(Box::new(backend))
        },
        BackendKind::Serial => open_serial(args, config),
    }
}

#[cfg(feature = "serial")]
fn open_serial(args: &BackendArgs, config: &AppConfig) -> Result<Box<dyn Backend>> {
    use pendulum_backend::SerialBackend;

    let port = args
        .port
        .clone()
        .or_else(|| config.serial.port.clone())
        .context("No serial port given (use --port or set serial.port in the config file)")?;
    let baud = args.baud.unwrap_or(config.serial.baud_rate);

    let backend = SerialBackend::open(&port, baud)
        .with_context(|| format!("Failed to open serial port {}", port))?
        .with_timeout(config.serial.timeout());
    info!("Using serial backend on {} ({} baud)", port, baud);
    Ok(Box::new(backend))
}

#[cfg(not(feature = "serial"))]
fn open_serial(_args: &BackendArgs, _config: &AppConfig) -> Result<Box<dyn Backend>> {
    anyhow::bail!("Serial support is disabled (rebuild with the `serial` feature)")
}
