//! CLI 配置文件
//!
//! 一个 TOML 文件同时承载 HAL 配置（`[motor]`、`[calibration]`、`[safety]`、
//! `[reset]`、`[control]`）与后端配置（`[sim]`、`[serial]`）。所有字段都有默认值。

use anyhow::{Context, Result};
use pendulum_backend::{DEFAULT_BAUD_RATE, SimConfig};
use pendulum_hal::HalConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件路径：`<config_dir>/pendulum/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push("pendulum");
        path.push("config.toml");
        path
    })
}

/// 串口设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// 串口路径（如 `/dev/ttyUSB0`、`COM3`）
    pub port: Option<String>,

    /// 波特率
    pub baud_rate: u32,

    /// 应答超时（毫秒）
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 100,
        }
    }
}

impl SerialSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub hal: HalConfig,

    #[serde(default)]
    pub sim: SimConfig,

    #[serde(default)]
    pub serial: SerialSettings,
}

/// 已加载的配置及其来源
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// None 表示使用内置默认值
    pub source: Option<PathBuf>,
}

impl AppConfig {
    /// 解析 TOML 文本
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// 检查 HAL 与后端配置
    pub fn validate(&self) -> Result<()> {
        self.hal.validate().context("Invalid HAL configuration")?;
        self.sim.validate().context("Invalid simulator configuration")?;
        if self.serial.baud_rate == 0 {
            anyhow::bail!("serial.baud_rate must be positive");
        }
        if self.serial.timeout_ms == 0 {
            anyhow::bail!("serial.timeout_ms must be positive");
        }
        Ok(())
    }

    /// 加载配置
    ///
    /// - 显式指定的路径必须存在
    /// - 未指定时使用默认路径；默认路径不存在则使用内置默认值
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    return Ok(LoadedConfig {
                        config: Self::default(),
                        source: None,
                    });
                },
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("In config file {}", path.display()))?;

        Ok(LoadedConfig {
            config,
            source: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pendulum_hal::SpeedPolicy;

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [control]
            timestep_hz = 100.0
            speed_policy = "clamp"

            [sim]
            substeps = 2

            [serial]
            port = "/dev/ttyUSB0"
            "#,
        )
        .unwrap();

        assert_eq!(config.hal.control.timestep_hz, 100.0);
        assert_eq!(config.hal.control.speed_policy, SpeedPolicy::Clamp);
        assert_eq!(config.hal.motor.steps_per_rev, 3200);
        assert_eq!(config.sim.substeps, 2);
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.baud_rate, 115_200);
    }

    #[test]
    fn test_round_trip() {
        let mut config = AppConfig::default();
        config.hal.reset.seed = Some(42);
        config.serial.port = Some("COM3".to_string());
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_validate_reports_hal_errors() {
        let config = AppConfig::from_toml_str("[safety]\ndebounce_samples = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("debounce"), "{:#}", err);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/pendulum.toml")));
        assert!(result.is_err());
    }
}
