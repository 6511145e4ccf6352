//! # Pendulum HAL
//!
//! 旋转倒立摆（Furuta 摆）的硬件抽象层。无论后端是仿真还是串口连接的真实机器人，
//! 控制智能体看到的状态与命令接口完全一致。
//!
//! ## 模块
//!
//! - `units` - 弧度/角度 NewType 与角度折叠
//! - `config` - 不可变配置（电机常量、标定补偿角、安全范围）
//! - `translator` - 原始读数 → 规范状态（纯函数）
//! - `safety` - 电机角度安全检查（可配置去抖）
//! - `reset` - Home / Random 复位位姿
//! - `backend` - 后端能力接口
//! - `agent` - 控制智能体接口与参考实现
//! - `control` - 控制循环状态机与运行器
//!
//! ## 数据流
//!
//! ```text
//! Backend → translate → SafetyMonitor → { ResetController | 电机速度命令 } → Backend
//! ```

pub mod agent;
pub mod backend;
pub mod config;
pub mod control;
mod error;
pub mod reset;
pub mod safety;
pub mod state;
pub mod translator;
pub mod units;

pub use agent::{ControlAgent, ControlCommand, EpisodeLimit, IdleAgent, RandomAgent};
pub use backend::{Backend, VelocityCommand};
pub use config::{
    CompensationOffsets, ControlConfig, HalConfig, MotorConstants, ResetConfig, SafetyBounds,
    SpeedPolicy,
};
pub use control::{CancellationToken, ControlLoop, LoopState, LoopStats, RunConfig, StepOutcome};
pub use error::{BackendError, HalError};
pub use reset::{ResetController, ResetMode, ResetPose};
pub use safety::SafetyMonitor;
pub use state::{CanonicalState, Joint, JointReading, RawJointReading};
pub use translator::translate;
pub use units::{Deg, Rad, wrap_to_pi};
