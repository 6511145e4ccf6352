//! 状态类型
//!
//! - [`RawJointReading`]：后端直接报告的原始关节读数（未补偿）
//! - [`CanonicalState`]：与后端无关的规范状态向量，也是交给控制智能体的契约

use crate::units::{Deg, Rad};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 机器人的两个转动关节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    /// 电机驱动的旋转臂
    Motor,
    /// 被动摆杆
    Bar,
}

impl Joint {
    /// 全部关节
    pub const ALL: [Joint; 2] = [Joint::Motor, Joint::Bar];
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Joint::Motor => write!(f, "motor"),
            Joint::Bar => write!(f, "bar"),
        }
    }
}

/// 单个关节的读数（后端坐标系）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointReading {
    /// 位置（rad）
    pub position: f64,
    /// 速度（rad/s）
    pub velocity: f64,
}

/// 原始关节读数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawJointReading {
    /// 摆杆位置（rad，未补偿）
    pub bar_position: f64,
    /// 摆杆角速度（rad/s）
    pub bar_velocity: f64,
    /// 电机位置（rad，未补偿）
    pub motor_position: f64,
}

impl RawJointReading {
    /// 由两个关节读数组合
    pub fn from_joints(bar: JointReading, motor: JointReading) -> Self {
        Self {
            bar_position: bar.position,
            bar_velocity: bar.velocity,
            motor_position: motor.position,
        }
    }
}

/// 规范状态向量
///
/// 每个周期重新计算，按值传递，从不原地修改。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalState {
    /// 摆杆角度，位于 (-π, π]，0 为竖直向上
    pub bar_angle: Rad,
    /// 摆杆角速度（rad/s）
    pub bar_angular_velocity: f64,
    /// 电机角度（度）
    pub motor_angle: Deg,
    /// 电机角度是否越界（由安全监视器设置）
    pub out_of_range: bool,
}

impl CanonicalState {
    /// 返回设置了越界标志的副本
    #[inline]
    pub fn with_out_of_range(self, out_of_range: bool) -> Self {
        Self {
            out_of_range,
            ..self
        }
    }

    /// 以 `[bar_angle, bar_angular_velocity, motor_angle]` 形式返回观测向量
    #[inline]
    pub fn as_array(&self) -> [f64; 3] {
        [
            self.bar_angle.0,
            self.bar_angular_velocity,
            self.motor_angle.0,
        ]
    }
}

impl fmt::Display for CanonicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bar={} ({:.4} rad/s), motor={}{}",
            self.bar_angle,
            self.bar_angular_velocity,
            self.motor_angle,
            if self.out_of_range { " [OUT OF RANGE]" } else { "" }
        )
    }
}
