//! Furuta 摆运动方程
//!
//! 电机（旋臂）为速度伺服关节；摆杆为被动关节，其角度 `φ` 以竖直向上为零：
//!
//! ```text
//! φ̈ = (m g l sin φ − b φ̇ − m l r θ̈ cos φ) / (m l² + I)
//! ```
//!
//! 积分方式为半隐式（symplectic）Euler：先更新速度，再用新速度更新位置。

use super::config::SimConfig;

/// 单个关节的位置与速度
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointState {
    pub position: f64,
    pub velocity: f64,
}

impl JointState {
    /// 以加速度 `acceleration` 积分一个子步
    #[inline]
    pub fn integrate(&mut self, acceleration: f64, h: f64) {
        self.velocity += acceleration * h;
        self.position += self.velocity * h;
    }
}

/// 速度伺服的角加速度（一阶滞后 + 加速度限幅）
#[inline]
pub fn servo_acceleration(config: &SimConfig, velocity: f64, target: f64) -> f64 {
    let accel = (target - velocity) / config.servo_time_constant;
    accel.clamp(-config.servo_accel_limit, config.servo_accel_limit)
}

/// 释放状态下电机的角加速度（仅粘性阻尼）
#[inline]
pub fn released_motor_acceleration(config: &SimConfig, velocity: f64) -> f64 {
    -config.motor_release_damping * velocity
}

/// 被动摆杆的角加速度
///
/// - `phi`: 摆杆角度（竖直向上为零，rad）
/// - `phi_dot`: 摆杆角速度（rad/s）
/// - `motor_accel`: 同一子步内旋臂的角加速度 θ̈（rad/s²）
pub fn bar_acceleration(config: &SimConfig, phi: f64, phi_dot: f64, motor_accel: f64) -> f64 {
    let m = config.bar_mass;
    let l = config.bar_com_distance;
    let r = config.arm_length;

    let gravity = m * config.gravity * l * phi.sin();
    let damping = config.bar_damping * phi_dot;
    let coupling = m * l * r * motor_accel * phi.cos();

    (gravity - damping - coupling) / config.bar_pivot_inertia()
}
