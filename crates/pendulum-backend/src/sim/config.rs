//! 仿真参数

use pendulum_hal::BackendError;
use serde::{Deserialize, Serialize};

/// 仿真器物理参数
///
/// 默认值对应桌面级 Furuta 摆（电机驱动旋臂，末端被动摆杆）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// 重力加速度（m/s²）
    pub gravity: f64,

    /// 摆杆质量（kg）
    pub bar_mass: f64,

    /// 摆杆质心到转轴距离（m）
    pub bar_com_distance: f64,

    /// 摆杆绕质心转动惯量（kg·m²）
    pub bar_inertia: f64,

    /// 摆杆转轴粘性阻尼（N·m·s/rad）
    pub bar_damping: f64,

    /// 旋臂长度（电机轴到摆杆转轴，m）
    pub arm_length: f64,

    /// 速度伺服一阶滞后时间常数（s）
    pub servo_time_constant: f64,

    /// 伺服最大角加速度（rad/s²）
    pub servo_accel_limit: f64,

    /// 电机释放后的阻尼系数（1/s）
    pub motor_release_damping: f64,

    /// 摆杆竖直向上时的关节位置（后端坐标系，rad）
    pub bar_upright_position: f64,

    /// 每个 `advance()` 的积分子步数
    pub substeps: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: 9.806,
            bar_mass: 0.025,
            bar_com_distance: 0.075,
            bar_inertia: 4.7e-5,
            bar_damping: 1.0e-5,
            arm_length: 0.1,
            servo_time_constant: 0.01,
            servo_accel_limit: 400.0,
            motor_release_damping: 5.0,
            bar_upright_position: 0.264,
            substeps: 8,
        }
    }
}

impl SimConfig {
    /// 检查参数合法性
    pub fn validate(&self) -> Result<(), BackendError> {
        let finite = [
            ("gravity", self.gravity),
            ("bar_mass", self.bar_mass),
            ("bar_com_distance", self.bar_com_distance),
            ("bar_inertia", self.bar_inertia),
            ("bar_damping", self.bar_damping),
            ("arm_length", self.arm_length),
            ("servo_time_constant", self.servo_time_constant),
            ("servo_accel_limit", self.servo_accel_limit),
            ("motor_release_damping", self.motor_release_damping),
            ("bar_upright_position", self.bar_upright_position),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(BackendError::InvalidInput(format!(
                    "sim.{} must be finite, got {}",
                    name, value
                )));
            }
        }

        let positive = [
            ("bar_mass", self.bar_mass),
            ("bar_com_distance", self.bar_com_distance),
            ("servo_time_constant", self.servo_time_constant),
            ("servo_accel_limit", self.servo_accel_limit),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(BackendError::InvalidInput(format!(
                    "sim.{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.bar_inertia < 0.0 || self.bar_damping < 0.0 || self.motor_release_damping < 0.0 {
            return Err(BackendError::InvalidInput(
                "sim inertia and damping must be non-negative".to_string(),
            ));
        }

        if self.substeps == 0 {
            return Err(BackendError::InvalidInput(
                "sim.substeps must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// 摆杆绕转轴的等效转动惯量 `m l² + I`
    pub fn bar_pivot_inertia(&self) -> f64 {
        self.bar_mass * self.bar_com_distance * self.bar_com_distance + self.bar_inertia
    }
}
