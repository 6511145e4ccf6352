//! 参考仿真后端
//!
//! 轻量级 Furuta 摆仿真器，行为对应物理引擎中的两个转动关节：
//!
//! - 电机关节：速度伺服（默认目标 0，即"锁定"），零力命令后变为阻尼被动关节
//! - 摆杆关节：初始同样被默认伺服锁定，直到收到零力（释放）命令
//!
//! 与物理引擎一致，`reset_joint_state` 直接写入位置与速度，不经过积分。

mod config;
pub mod dynamics;

pub use config::SimConfig;

use dynamics::{
    JointState, bar_acceleration, released_motor_acceleration, servo_acceleration,
};
use pendulum_hal::{Backend, BackendError, Joint, JointReading, VelocityCommand};
use std::time::Duration;
use tracing::{debug, trace};

/// 仿真后端
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    config: SimConfig,
    motor: JointState,
    bar: JointState,
    motor_command: VelocityCommand,
    bar_command: VelocityCommand,
    /// 上一子步的电机角加速度
    motor_accel: f64,
    /// 仿真时间
    elapsed: Duration,
}

impl SimulatedBackend {
    /// 创建仿真后端（两个关节处于零位并被锁定）
    pub fn new(config: SimConfig) -> Result<Self, BackendError> {
        config.validate()?;
        debug!(
            "Simulated backend: {} substeps, servo tau {} s",
            config.substeps, config.servo_time_constant
        );
        Ok(Self::with_checked_config(config))
    }

    /// 调用方保证 `config` 已通过校验
    fn with_checked_config(config: SimConfig) -> Self {
        Self {
            config,
            motor: JointState::default(),
            bar: JointState::default(),
            motor_command: VelocityCommand::servo(0.0),
            bar_command: VelocityCommand::servo(0.0),
            motor_accel: 0.0,
            elapsed: Duration::ZERO,
        }
    }

    /// 仿真参数
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 累计仿真时间
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// 摆杆是否处于释放（被动）状态
    pub fn bar_released(&self) -> bool {
        self.bar_command.is_release()
    }

    /// 当前关节命令
    pub fn command(&self, joint: Joint) -> VelocityCommand {
        match joint {
            Joint::Motor => self.motor_command,
            Joint::Bar => self.bar_command,
        }
    }

    fn joint_mut(&mut self, joint: Joint) -> &mut JointState {
        match joint {
            Joint::Motor => &mut self.motor,
            Joint::Bar => &mut self.bar,
        }
    }

    /// 积分一个子步
    fn substep(&mut self, h: f64) {
        let motor_accel = if self.motor_command.is_release() {
            released_motor_acceleration(&self.config, self.motor.velocity)
        } else {
            servo_acceleration(&self.config, self.motor.velocity, self.motor_command.velocity)
        };
        self.motor.integrate(motor_accel, h);
        self.motor_accel = motor_accel;

        let bar_accel = if self.bar_command.is_release() {
            let phi = self.bar.position - self.config.bar_upright_position;
            bar_acceleration(&self.config, phi, self.bar.velocity, motor_accel)
        } else {
            servo_acceleration(&self.config, self.bar.velocity, self.bar_command.velocity)
        };
        self.bar.integrate(bar_accel, h);
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        // 默认参数总是合法的（见 `sim::config` 的测试）
        Self::with_checked_config(SimConfig::default())
    }
}

fn ensure_finite(what: &str, value: f64) -> Result<(), BackendError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BackendError::InvalidInput(format!(
            "{} must be finite, got {}",
            what, value
        )))
    }
}

impl Backend for SimulatedBackend {
    fn joint_state(&mut self, joint: Joint) -> Result<JointReading, BackendError> {
        let state = match joint {
            Joint::Motor => self.motor,
            Joint::Bar => self.bar,
        };
        Ok(JointReading {
            position: state.position,
            velocity: state.velocity,
        })
    }

    fn set_joint_velocity_target(
        &mut self,
        joint: Joint,
        command: VelocityCommand,
    ) -> Result<(), BackendError> {
        ensure_finite("velocity target", command.velocity)?;
        if let Some(force) = command.max_force {
            ensure_finite("max force", force)?;
        }
        trace!("sim: {} velocity target {:?}", joint, command);
        match joint {
            Joint::Motor => self.motor_command = command,
            Joint::Bar => self.bar_command = command,
        }
        Ok(())
    }

    fn reset_joint_state(
        &mut self,
        joint: Joint,
        position: f64,
        velocity: f64,
    ) -> Result<(), BackendError> {
        ensure_finite("reset position", position)?;
        ensure_finite("reset velocity", velocity)?;
        debug!(
            "sim: reset {} to position {:.4}, velocity {:.4}",
            joint, position, velocity
        );
        *self.joint_mut(joint) = JointState { position, velocity };
        if joint == Joint::Motor {
            self.motor_accel = 0.0;
        }
        Ok(())
    }

    fn advance(&mut self, dt: Duration) -> Result<(), BackendError> {
        if dt.is_zero() {
            return Ok(());
        }
        let h = dt.as_secs_f64() / f64::from(self.config.substeps);
        for _ in 0..self.config.substeps {
            self.substep(h);
        }
        self.elapsed += dt;

        if !(self.bar.position.is_finite() && self.motor.position.is_finite()) {
            return Err(BackendError::Device(
                "simulation diverged (non-finite joint state)".to_string(),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "sim"
    }
}
