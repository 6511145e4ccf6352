//! ControlLoop - 控制周期状态机
//!
//! # 状态
//!
//! - `Resetting(mode)`：下一个周期执行复位（初始状态为 `Resetting(Home)`）
//! - `Running`：正常控制
//!
//! # 转移
//!
//! | 当前 | 条件 | 动作 | 下一状态 |
//! |---|---|---|---|
//! | Resetting | — | 计算位姿 → 写入后端 → 推进一步 | Running |
//! | Running | 读数非有限 | 记录 NumericFault | Resetting(Home) |
//! | Running | `episode_done`（无论是否越界） | — | Resetting(Home) |
//! | Running | 安全故障 | 记录故障 | Resetting(Random) |
//! | Running | 其他 | 下发电机速度 → 推进一步 | Running |
//!
//! 智能体在每个 Running 周期都会被调用，看到的是已设置越界标志的状态。
//! 转入 `Resetting` 的周期不推进后端，紧随其后的复位周期推进。

use crate::agent::{ControlAgent, ControlCommand};
use crate::backend::{Backend, VelocityCommand};
use crate::config::{HalConfig, SpeedPolicy};
use crate::error::HalError;
use crate::reset::{ResetController, ResetMode, ResetPose};
use crate::safety::SafetyMonitor;
use crate::state::{CanonicalState, Joint};
use crate::translator::translate;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 控制循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 正常控制
    Running,
    /// 等待执行复位
    Resetting(ResetMode),
}

/// 单个周期的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// 执行了复位
    Reset { mode: ResetMode, pose: ResetPose },
    /// 下发了电机速度（rad/s）
    Actuated {
        state: CanonicalState,
        command: ControlCommand,
        velocity: f64,
    },
    /// 电机越界，下一周期随机复位
    SafetyFault { state: CanonicalState },
    /// 智能体结束回合，下一周期 Home 复位
    EpisodeDone { state: CanonicalState },
    /// 读数非有限，下一周期 Home 复位
    NumericFault,
}

/// 运行统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    /// 已执行周期数
    pub cycles: u64,
    /// 推进后端的次数
    pub backend_steps: u64,
    /// Home 复位次数
    pub home_resets: u64,
    /// Random 复位次数
    pub random_resets: u64,
    /// 安全故障次数
    pub safety_faults: u64,
    /// 非有限读数次数
    pub numeric_faults: u64,
    /// 被拒绝的越界速度命令次数
    pub rejected_commands: u64,
}

/// 控制循环
///
/// 按值持有后端：后端关节状态只有这一个写入者。
pub struct ControlLoop<B: Backend> {
    backend: B,
    config: HalConfig,
    resets: ResetController,
    safety: SafetyMonitor,
    state: LoopState,
    last_state: Option<CanonicalState>,
    max_motor_speed: f64,
    timestep: Duration,
    stats: LoopStats,
}

impl<B: Backend> ControlLoop<B> {
    /// 创建控制循环
    ///
    /// 先校验配置；配置错误在任何后端交互之前返回。
    pub fn new(backend: B, config: HalConfig) -> Result<Self, HalError> {
        config.validate()?;

        let resets = ResetController::new(config.calibration, config.safety, &config.reset);
        let safety = SafetyMonitor::new(config.safety);
        let max_motor_speed = config.motor.max_motor_speed();
        let timestep = config.control.timestep();

        debug!(
            "ControlLoop on {}: max_motor_speed={:.6} rad/s, timestep={:?}",
            backend.name(),
            max_motor_speed,
            timestep
        );

        Ok(Self {
            backend,
            config,
            resets,
            safety,
            state: LoopState::Resetting(ResetMode::Home),
            last_state: None,
            max_motor_speed,
            timestep,
            stats: LoopStats::default(),
        })
    }

    /// 当前状态机状态
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// 最近一次交给智能体的规范状态
    pub fn last_state(&self) -> Option<CanonicalState> {
        self.last_state
    }

    /// 运行统计
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// 配置
    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    /// 电机最大角速度（rad/s）
    pub fn max_motor_speed(&self) -> f64 {
        self.max_motor_speed
    }

    /// 固定时间步长
    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    /// 后端引用
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 后端可变引用
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// 取回后端
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// 请求在下一周期复位
    pub fn request_reset(&mut self, mode: ResetMode) {
        self.state = LoopState::Resetting(mode);
    }

    /// 读取并转换当前状态，设置越界标志
    pub fn observe(&mut self) -> Result<CanonicalState, HalError> {
        let raw = self.backend.read_raw()?;
        let state = translate(&raw, &self.config.calibration)?;
        Ok(self.safety.evaluate(state))
    }

    /// 将速度百分比换算为电机角速度（rad/s）
    ///
    /// 返回 `None` 表示命令被 [`SpeedPolicy::Reject`] 拒绝。
    pub fn command_velocity(&self, speed_percentage: f64) -> Option<f64> {
        let percentage = match self.config.control.speed_policy {
            SpeedPolicy::PassThrough => speed_percentage,
            SpeedPolicy::Clamp => speed_percentage.clamp(-100.0, 100.0),
            SpeedPolicy::Reject => {
                if !(-100.0..=100.0).contains(&speed_percentage) {
                    return None;
                }
                speed_percentage
            },
        };
        Some(percentage * self.max_motor_speed / 100.0)
    }

    /// 执行一个控制周期
    pub fn step<A: ControlAgent + ?Sized>(&mut self, agent: &mut A) -> Result<StepOutcome, HalError> {
        self.stats.cycles += 1;

        match self.state {
            LoopState::Resetting(mode) => self.run_reset(mode),
            LoopState::Running => self.run_control(agent),
        }
    }

    fn run_reset(&mut self, mode: ResetMode) -> Result<StepOutcome, HalError> {
        let pose = self.resets.reset_backend(&mut self.backend, mode)?;
        self.safety.clear();
        match mode {
            ResetMode::Home => self.stats.home_resets += 1,
            ResetMode::Random => self.stats.random_resets += 1,
        }

        self.advance()?;
        self.state = LoopState::Running;
        Ok(StepOutcome::Reset { mode, pose })
    }

    fn run_control<A: ControlAgent + ?Sized>(
        &mut self,
        agent: &mut A,
    ) -> Result<StepOutcome, HalError> {
        let state = match self.observe() {
            Ok(state) => state,
            Err(HalError::NonFinite { field, value }) => {
                warn!(
                    "Non-finite reading in {} ({}), forcing home reset",
                    field, value
                );
                self.stats.numeric_faults += 1;
                self.state = LoopState::Resetting(ResetMode::Home);
                return Ok(StepOutcome::NumericFault);
            },
            Err(e) => return Err(e),
        };
        self.last_state = Some(state);

        // 智能体总能看到带越界标志的状态；episode_done 优先于安全故障
        let command = agent.act(&state);

        if state.out_of_range {
            warn!("Out of range! Resetting the robot... ({})", state);
            self.stats.safety_faults += 1;
        }

        if command.episode_done {
            debug!("Episode done, scheduling home reset");
            self.state = LoopState::Resetting(ResetMode::Home);
            return Ok(StepOutcome::EpisodeDone { state });
        }

        if state.out_of_range {
            self.state = LoopState::Resetting(ResetMode::Random);
            return Ok(StepOutcome::SafetyFault { state });
        }

        let velocity = match self.command_velocity(command.speed_percentage) {
            Some(velocity) => velocity,
            None => {
                warn!(
                    "Rejected speed percentage {} outside [-100, 100], holding motor",
                    command.speed_percentage
                );
                self.stats.rejected_commands += 1;
                0.0
            },
        };

        trace!("{} -> motor velocity {:.4} rad/s", state, velocity);
        self.backend
            .set_joint_velocity_target(Joint::Motor, VelocityCommand::servo(velocity))?;
        self.advance()?;

        Ok(StepOutcome::Actuated {
            state,
            command,
            velocity,
        })
    }

    fn advance(&mut self) -> Result<(), HalError> {
        self.backend.advance(self.timestep)?;
        self.stats.backend_steps += 1;
        Ok(())
    }
}
