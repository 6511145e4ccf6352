//! Mock 后端
//!
//! 记录所有调用，并用最简单的运动学（位置 += 速度 · dt）推进关节状态。

use pendulum_hal::{Backend, BackendError, Joint, JointReading, VelocityCommand};
use std::time::Duration;

/// 后端调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Velocity(Joint, VelocityCommand),
    Reset(Joint, f64, f64),
    Advance(Duration),
}

/// 模拟后端
#[derive(Debug, Default)]
pub struct MockBackend {
    pub bar: JointReading,
    pub motor: JointReading,
    pub calls: Vec<BackendCall>,
    /// 下一次读数返回 NaN
    pub inject_nan: bool,
    /// `advance()` 返回断开错误
    pub fail_advance: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置电机位置（后端坐标系，rad）
    pub fn set_motor_position(&mut self, position: f64) {
        self.motor.position = position;
    }

    /// 清空调用记录
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// 电机速度命令
    pub fn motor_commands(&self) -> Vec<VelocityCommand> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Velocity(Joint::Motor, cmd) => Some(*cmd),
                _ => None,
            })
            .collect()
    }

    /// 推进次数
    pub fn advance_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Advance(_)))
            .count()
    }
}

impl Backend for MockBackend {
    fn joint_state(&mut self, joint: Joint) -> Result<JointReading, BackendError> {
        let mut reading = match joint {
            Joint::Bar => self.bar,
            Joint::Motor => self.motor,
        };
        if self.inject_nan && joint == Joint::Bar {
            self.inject_nan = false;
            reading.position = f64::NAN;
        }
        Ok(reading)
    }

    fn set_joint_velocity_target(
        &mut self,
        joint: Joint,
        command: VelocityCommand,
    ) -> Result<(), BackendError> {
        self.calls.push(BackendCall::Velocity(joint, command));
        if joint == Joint::Motor {
            self.motor.velocity = command.velocity;
        }
        Ok(())
    }

    fn reset_joint_state(
        &mut self,
        joint: Joint,
        position: f64,
        velocity: f64,
    ) -> Result<(), BackendError> {
        self.calls.push(BackendCall::Reset(joint, position, velocity));
        let target = match joint {
            Joint::Bar => &mut self.bar,
            Joint::Motor => &mut self.motor,
        };
        target.position = position;
        target.velocity = velocity;
        Ok(())
    }

    fn advance(&mut self, dt: Duration) -> Result<(), BackendError> {
        if self.fail_advance {
            return Err(BackendError::Disconnected);
        }
        self.calls.push(BackendCall::Advance(dt));
        let dt = dt.as_secs_f64();
        self.bar.position += self.bar.velocity * dt;
        self.motor.position += self.motor.velocity * dt;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
