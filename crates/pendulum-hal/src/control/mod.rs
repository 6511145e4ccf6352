//! 控制循环模块
//!
//! - `ControlLoop` - 单周期状态机（读取 → 转换 → 安全检查 → 复位/驱动 → 推进）
//! - Runner - 运行直到取消，可选实时节拍

pub mod machine;
pub mod runner;

// 重新导出常用类型
pub use machine::{ControlLoop, LoopState, LoopStats, StepOutcome};
pub use runner::{CancellationToken, RunConfig, run};
