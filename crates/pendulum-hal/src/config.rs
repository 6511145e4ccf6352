//! # HAL 配置
//!
//! 进程级不可变配置：电机常量、标定补偿角、安全范围、复位与控制参数。
//! 启动时构造一次（默认值或 TOML 文件），之后以值或引用注入各组件。
//!
//! ```toml
//! [motor]
//! steps_per_rev = 3200
//! max_speed_steps_per_sec = 4000.0
//!
//! [calibration]
//! motor_compensation_angle = 0.4
//! bar_compensation_angle = -0.264
//!
//! [safety]
//! motor_angle_range = [-150.0, 150.0]
//! debounce_samples = 1
//!
//! [reset]
//! bar_velocity_range = [-10.0, 10.0]
//!
//! [control]
//! timestep_hz = 240.0
//! speed_policy = "pass_through"
//! ```

use crate::error::HalError;
use crate::units::{Deg, Rad};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 完整 HAL 配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// 步进电机常量
    pub motor: MotorConstants,

    /// 标定补偿角
    pub calibration: CompensationOffsets,

    /// 安全范围
    pub safety: SafetyBounds,

    /// 复位参数
    pub reset: ResetConfig,

    /// 控制循环参数
    pub control: ControlConfig,
}

impl HalConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, HalError> {
        let config: HalConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, HalError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, HalError> {
        toml::to_string_pretty(self).map_err(|e| HalError::Config(e.to_string()))
    }

    /// 校验所有配置项
    ///
    /// 任何错误都是致命的，必须在与后端交互前报告。
    pub fn validate(&self) -> Result<(), HalError> {
        self.motor.validate()?;
        self.calibration.validate()?;
        self.safety.validate()?;
        self.reset.validate()?;
        self.control.validate()?;
        Ok(())
    }
}

/// 步进电机常量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConstants {
    /// 每圈步数
    pub steps_per_rev: u32,

    /// 最大速度（steps/s）
    pub max_speed_steps_per_sec: f64,
}

impl Default for MotorConstants {
    fn default() -> Self {
        Self {
            steps_per_rev: 3200,
            max_speed_steps_per_sec: 4000.0,
        }
    }
}

impl MotorConstants {
    /// 每步对应的弧度
    #[inline]
    pub fn radians_per_step(&self) -> f64 {
        TAU / f64::from(self.steps_per_rev)
    }

    /// 电机最大角速度（rad/s）
    ///
    /// `max_speed_steps_per_sec · 2π / steps_per_rev`
    #[inline]
    pub fn max_motor_speed(&self) -> f64 {
        self.max_speed_steps_per_sec * self.radians_per_step()
    }

    fn validate(&self) -> Result<(), HalError> {
        if self.steps_per_rev == 0 {
            return Err(HalError::Config("motor.steps_per_rev must be > 0".into()));
        }
        if !self.max_speed_steps_per_sec.is_finite() || self.max_speed_steps_per_sec <= 0.0 {
            return Err(HalError::Config(format!(
                "motor.max_speed_steps_per_sec must be finite and > 0 (got {})",
                self.max_speed_steps_per_sec
            )));
        }
        Ok(())
    }
}

/// 标定补偿角
///
/// 修正后端坐标系与真实机器人机械零点之间的偏差。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationOffsets {
    /// 电机补偿角（rad）
    pub motor_compensation_angle: Rad,

    /// 摆杆补偿角（rad）
    pub bar_compensation_angle: Rad,
}

impl Default for CompensationOffsets {
    fn default() -> Self {
        Self {
            motor_compensation_angle: Rad(0.400),
            bar_compensation_angle: Rad(-0.264),
        }
    }
}

impl CompensationOffsets {
    fn validate(&self) -> Result<(), HalError> {
        if !self.motor_compensation_angle.is_finite() || !self.bar_compensation_angle.is_finite() {
            return Err(HalError::Config(format!(
                "calibration angles must be finite (motor={}, bar={})",
                self.motor_compensation_angle.0, self.bar_compensation_angle.0
            )));
        }
        Ok(())
    }
}

/// 电机角度安全范围（闭区间，单位：度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyBounds {
    /// `[min, max]`
    pub motor_angle_range: [Deg; 2],

    /// 连续越界多少个采样才判定故障（1 = 单次越界即故障）
    pub debounce_samples: u32,
}

impl Default for SafetyBounds {
    fn default() -> Self {
        Self {
            motor_angle_range: [Deg(-150.0), Deg(150.0)],
            debounce_samples: 1,
        }
    }
}

impl SafetyBounds {
    /// 下限
    #[inline]
    pub fn min(&self) -> Deg {
        self.motor_angle_range[0]
    }

    /// 上限
    #[inline]
    pub fn max(&self) -> Deg {
        self.motor_angle_range[1]
    }

    fn validate(&self) -> Result<(), HalError> {
        let [min, max] = self.motor_angle_range;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(HalError::Config(format!(
                "safety.motor_angle_range must be finite with min <= max (got [{}, {}])",
                min.0, max.0
            )));
        }
        if self.debounce_samples == 0 {
            return Err(HalError::Config("safety.debounce_samples must be >= 1".into()));
        }
        Ok(())
    }
}

/// 复位参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// 随机复位时摆杆角速度的采样范围（rad/s）
    pub bar_velocity_range: [f64; 2],

    /// 随机数种子（None 表示从系统熵初始化）
    pub seed: Option<u64>,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            bar_velocity_range: [-10.0, 10.0],
            seed: None,
        }
    }
}

impl ResetConfig {
    fn validate(&self) -> Result<(), HalError> {
        let [lo, hi] = self.bar_velocity_range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(HalError::Config(format!(
                "reset.bar_velocity_range must be finite with min <= max (got [{}, {}])",
                lo, hi
            )));
        }
        Ok(())
    }
}

/// 超出 [-100, 100] 的速度百分比的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPolicy {
    /// 原样下发
    #[default]
    PassThrough,
    /// 饱和到 [-100, 100]
    Clamp,
    /// 拒绝：记录警告并下发零速度
    Reject,
}

/// 控制循环参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// 后端步进频率（Hz），每个控制周期推进 `1 / timestep_hz` 秒
    pub timestep_hz: f64,

    /// 速度百分比越界策略
    pub speed_policy: SpeedPolicy,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            timestep_hz: 240.0,
            speed_policy: SpeedPolicy::PassThrough,
        }
    }
}

impl ControlConfig {
    /// 固定时间步长
    #[inline]
    pub fn timestep(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.timestep_hz)
    }

    fn validate(&self) -> Result<(), HalError> {
        if !self.timestep_hz.is_finite() || self.timestep_hz <= 0.0 {
            return Err(HalError::Config(format!(
                "control.timestep_hz must be finite and > 0 (got {})",
                self.timestep_hz
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.timestep_hz).is_err() {
            return Err(HalError::Config(format!(
                "control.timestep_hz {} gives a timestep that cannot be represented",
                self.timestep_hz
            )));
        }
        if self.timestep_hz > 10000.0 {
            tracing::warn!(
                "Very high timestep rate: {} Hz. Hardware may not keep up.",
                self.timestep_hz
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_default_config_is_valid() {
        let config = HalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.motor.steps_per_rev, 3200);
        assert_eq!(config.calibration.bar_compensation_angle, Rad(-0.264));
        assert_eq!(config.safety.min(), Deg(-150.0));
        assert_eq!(config.safety.max(), Deg(150.0));
        assert_eq!(config.control.speed_policy, SpeedPolicy::PassThrough);
    }

    #[test]
    fn test_max_motor_speed() {
        let motor = MotorConstants::default();
        // 4000 · 2π / 3200 = 2.5π
        assert!((motor.max_motor_speed() - 2.5 * PI).abs() < 1e-12);
        assert_eq!(motor.max_motor_speed(), 4000.0 * (TAU / 3200.0));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = HalConfig::from_toml_str(
            r#"
[safety]
motor_angle_range = [-90.0, 120.0]
debounce_samples = 3

[control]
speed_policy = "clamp"
"#,
        )
        .unwrap();

        assert_eq!(config.safety.motor_angle_range, [Deg(-90.0), Deg(120.0)]);
        assert_eq!(config.safety.debounce_samples, 3);
        assert_eq!(config.control.speed_policy, SpeedPolicy::Clamp);
        // 未给出的段落使用默认值
        assert_eq!(config.motor, MotorConstants::default());
        assert_eq!(config.calibration, CompensationOffsets::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = HalConfig::default();
        config.reset.seed = Some(7);
        let text = config.to_toml_string().unwrap();
        let parsed = HalConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let mut config = HalConfig::default();
        config.motor.steps_per_rev = 0;
        assert!(matches!(config.validate(), Err(HalError::Config(_))));

        let mut config = HalConfig::default();
        config.safety.motor_angle_range = [Deg(10.0), Deg(-10.0)];
        assert!(config.validate().is_err());

        let mut config = HalConfig::default();
        config.safety.debounce_samples = 0;
        assert!(config.validate().is_err());

        let mut config = HalConfig::default();
        config.calibration.bar_compensation_angle = Rad(f64::NAN);
        assert!(config.validate().is_err());

        let mut config = HalConfig::default();
        config.control.timestep_hz = 0.0;
        assert!(config.validate().is_err());

        // 1 / 1e-300 秒超出 Duration 范围
        let mut config = HalConfig::default();
        config.control.timestep_hz = 1e-300;
        assert!(matches!(config.validate(), Err(HalError::Config(_))));

        let mut config = HalConfig::default();
        config.reset.bar_velocity_range = [5.0, -5.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_speed_policy_is_parse_error() {
        let err = HalConfig::from_toml_str("[control]\nspeed_policy = \"ignore\"\n").unwrap_err();
        assert!(matches!(err, HalError::Parse(_)));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_timestep() {
        let control = ControlConfig {
            timestep_hz: 100.0,
            ..Default::default()
        };
        assert_eq!(control.timestep(), Duration::from_millis(10));
    }
}
