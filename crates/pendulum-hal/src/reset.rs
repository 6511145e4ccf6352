//! 复位控制器
//!
//! 计算 Home / Random 复位位姿并写入后端。
//!
//! # 非对称性
//!
//! 写入位姿后，摆杆关节被释放（零力速度命令），在重力作用下自由摆动；
//! 电机关节不下发任何速度命令，保持由控制循环随后设置的控制模式。

use crate::backend::{Backend, VelocityCommand};
use crate::config::{CompensationOffsets, ResetConfig, SafetyBounds};
use crate::error::{BackendError, HalError};
use crate::state::Joint;
use crate::units::{Rad, wrap_to_pi};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// 复位模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetMode {
    /// 确定性的起始位姿（零速度，补偿角抵消）
    Home,
    /// 随机位姿（安全故障后使用，避免反复进入同一故障状态）
    Random,
}

impl FromStr for ResetMode {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(ResetMode::Home),
            "random" => Ok(ResetMode::Random),
            _ => Err(HalError::UnknownResetMode(s.to_string())),
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetMode::Home => write!(f, "home"),
            ResetMode::Random => write!(f, "random"),
        }
    }
}

/// 复位位姿（后端坐标系，补偿前）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResetPose {
    /// 摆杆关节位置，位于 (-π, π]
    pub bar_angle: Rad,
    /// 摆杆角速度（rad/s）
    pub bar_angular_velocity: f64,
    /// 电机关节位置（rad）
    pub motor_angle: Rad,
}

/// Home 位姿
///
/// `bar_angle = wrap(π - bar_compensation_angle)`，补偿后恰好为 π（摆杆下垂）；
/// `motor_angle = -motor_compensation_angle`，补偿后为 0°。
pub fn home_pose(offsets: &CompensationOffsets) -> ResetPose {
    ResetPose {
        bar_angle: Rad(wrap_to_pi(PI - offsets.bar_compensation_angle.0)),
        bar_angular_velocity: 0.0,
        motor_angle: -offsets.motor_compensation_angle,
    }
}

/// 随机位姿
///
/// - `bar_angle ~ U(-π, π]`
/// - `bar_angular_velocity ~ U(velocity_range)`
/// - `motor_angle ~ U(bounds)`，由角度转换为弧度
pub fn random_pose<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &SafetyBounds,
    velocity_range: [f64; 2],
) -> ResetPose {
    // 闭区间采样后折叠：-π 映射到 π
    let bar_angle = wrap_to_pi(rng.gen_range(-PI..=PI));
    let bar_angular_velocity = rng.gen_range(velocity_range[0]..=velocity_range[1]);
    let motor_angle = rng.gen_range(bounds.min().to_rad().0..=bounds.max().to_rad().0);

    ResetPose {
        bar_angle: Rad(bar_angle),
        bar_angular_velocity,
        motor_angle: Rad(motor_angle),
    }
}

/// 将复位位姿写入后端
///
/// 1. 电机关节：位置 = `motor_angle`，速度 = 0
/// 2. 摆杆关节：位置 = `bar_angle`，速度 = `bar_angular_velocity`
/// 3. 摆杆关节：零力速度命令（释放）
pub fn apply<B: Backend + ?Sized>(backend: &mut B, pose: &ResetPose) -> Result<(), BackendError> {
    backend.reset_joint_state(Joint::Motor, pose.motor_angle.0, 0.0)?;
    backend.reset_joint_state(Joint::Bar, pose.bar_angle.0, pose.bar_angular_velocity)?;
    backend.set_joint_velocity_target(
        Joint::Bar,
        VelocityCommand::release(pose.bar_angular_velocity),
    )?;
    Ok(())
}

/// 复位控制器
///
/// 持有标定、安全范围与随机数发生器。
#[derive(Debug, Clone)]
pub struct ResetController {
    offsets: CompensationOffsets,
    bounds: SafetyBounds,
    velocity_range: [f64; 2],
    rng: StdRng,
}

impl ResetController {
    /// 创建复位控制器
    ///
    /// `config.seed` 为 `None` 时从系统熵初始化随机数发生器。
    pub fn new(offsets: CompensationOffsets, bounds: SafetyBounds, config: &ResetConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            offsets,
            bounds,
            velocity_range: config.bar_velocity_range,
            rng,
        }
    }

    /// 计算目标位姿
    pub fn reset(&mut self, mode: ResetMode) -> ResetPose {
        match mode {
            ResetMode::Home => home_pose(&self.offsets),
            ResetMode::Random => random_pose(&mut self.rng, &self.bounds, self.velocity_range),
        }
    }

    /// 计算并写入目标位姿
    pub fn reset_backend<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        mode: ResetMode,
    ) -> Result<ResetPose, BackendError> {
        let pose = self.reset(mode);
        debug!(
            "Reset target ({}): bar={} vel={:.4} motor={}",
            mode, pose.bar_angle, pose.bar_angular_velocity, pose.motor_angle
        );
        apply(backend, &pose)?;
        info!("Robot reset to {} pose", mode);
        Ok(pose)
    }
}
