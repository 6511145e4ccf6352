//! Backend trait - 后端能力接口
//!
//! 仿真后端与串口后端都实现此 trait，控制循环只依赖此接口。
//!
//! # 所有权
//!
//! 后端的关节状态只由控制循环（及其复位控制器）修改。
//! 控制循环按值持有后端，因此不需要任何锁。

use crate::error::BackendError;
use crate::state::{Joint, JointReading, RawJointReading};
use std::time::Duration;

/// 关节速度命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    /// 目标角速度（rad/s）
    pub velocity: f64,

    /// 最大驱动力（None 表示后端默认值）
    ///
    /// `Some(0.0)` 表示零力：关节不再被伺服，在重力作用下自由运动。
    pub max_force: Option<f64>,
}

impl VelocityCommand {
    /// 速度伺服命令
    #[inline]
    pub fn servo(velocity: f64) -> Self {
        Self {
            velocity,
            max_force: None,
        }
    }

    /// 零力命令：释放关节
    #[inline]
    pub fn release(velocity: f64) -> Self {
        Self {
            velocity,
            max_force: Some(0.0),
        }
    }

    /// 是否为零力（释放）命令
    #[inline]
    pub fn is_release(&self) -> bool {
        matches!(self.max_force, Some(f) if f <= 0.0)
    }
}

/// 后端能力接口
pub trait Backend {
    /// 读取单个关节的位置与速度
    fn joint_state(&mut self, joint: Joint) -> Result<JointReading, BackendError>;

    /// 设置关节速度目标
    fn set_joint_velocity_target(
        &mut self,
        joint: Joint,
        command: VelocityCommand,
    ) -> Result<(), BackendError>;

    /// 直接重置关节位置与速度
    fn reset_joint_state(
        &mut self,
        joint: Joint,
        position: f64,
        velocity: f64,
    ) -> Result<(), BackendError>;

    /// 推进一个时间步
    fn advance(&mut self, dt: Duration) -> Result<(), BackendError>;

    /// 读取两个关节，组合为原始读数
    fn read_raw(&mut self) -> Result<RawJointReading, BackendError> {
        let bar = self.joint_state(Joint::Bar)?;
        let motor = self.joint_state(Joint::Motor)?;
        Ok(RawJointReading::from_joints(bar, motor))
    }

    /// 后端名称（用于日志）
    fn name(&self) -> &str {
        "backend"
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn joint_state(&mut self, joint: Joint) -> Result<JointReading, BackendError> {
        (**self).joint_state(joint)
    }

    fn set_joint_velocity_target(
        &mut self,
        joint: Joint,
        command: VelocityCommand,
    ) -> Result<(), BackendError> {
        (**self).set_joint_velocity_target(joint, command)
    }

    fn reset_joint_state(
        &mut self,
        joint: Joint,
        position: f64,
        velocity: f64,
    ) -> Result<(), BackendError> {
        (**self).reset_joint_state(joint, position, velocity)
    }

    fn advance(&mut self, dt: Duration) -> Result<(), BackendError> {
        (**self).advance(dt)
    }

    fn read_raw(&mut self) -> Result<RawJointReading, BackendError> {
        (**self).read_raw()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_command_constructors() {
        let servo = VelocityCommand::servo(2.0);
        assert_eq!(servo.velocity, 2.0);
        assert_eq!(servo.max_force, None);
        assert!(!servo.is_release());

        let release = VelocityCommand::release(-3.0);
        assert_eq!(release.velocity, -3.0);
        assert!(release.is_release());

        let limited = VelocityCommand {
            velocity: 1.0,
            max_force: Some(0.5),
        };
        assert!(!limited.is_release());
    }
}
