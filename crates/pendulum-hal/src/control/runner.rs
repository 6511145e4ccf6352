//! Loop Runner - 运行直到取消
//!
//! # 核心功能
//!
//! - **取消令牌**: 在周期之间检查，保证进行中的复位总能完成
//! - **实时节拍**: 可选地使用 `spin_sleep` 按固定周期对齐墙钟时间
//! - **迭代上限**: `max_cycles` 用于测试或定时运行
//!
//! ```rust,ignore
//! use pendulum_hal::control::{CancellationToken, ControlLoop, RunConfig, run};
//!
//! let token = CancellationToken::new();
//! let handler_token = token.clone();
//! ctrlc::set_handler(move || handler_token.cancel())?;
//!
//! let stats = run(&mut control, &mut agent, &RunConfig::default(), &token)?;
//! ```

use super::machine::{ControlLoop, LoopState, LoopStats};
use crate::agent::ControlAgent;
use crate::backend::Backend;
use crate::error::HalError;
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// 取消令牌
///
/// 可克隆，所有副本共享同一标志。通常由 Ctrl+C 处理函数设置。
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// 创建未取消的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 是否已请求取消
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 运行配置
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// 是否按墙钟节拍运行（真实硬件需要；仿真可关闭以全速运行）
    pub realtime: bool,

    /// 最大周期数（None 表示运行直到取消）
    pub max_cycles: Option<u64>,
}

/// 运行控制循环，直到取消或达到 `max_cycles`
///
/// 取消与 `max_cycles` 只在周期之间生效；若此时仍处于 `Resetting`，
/// 先完成该复位周期再返回（因此总周期数可能比 `max_cycles` 多 1）。
///
/// # 返回
///
/// - `Ok(stats)`: 正常结束
/// - `Err(HalError)`: 后端错误（安全故障与非有限读数在循环内部恢复，不会返回错误）
pub fn run<B, A>(
    control: &mut ControlLoop<B>,
    agent: &mut A,
    config: &RunConfig,
    token: &CancellationToken,
) -> Result<LoopStats, HalError>
where
    B: Backend,
    A: ControlAgent + ?Sized,
{
    let period = control.timestep();
    let sleeper = SpinSleeper::default();
    let start_cycles = control.stats().cycles;
    let mut next_deadline = Instant::now() + period;

    info!(
        "Control loop started on {} ({:?} per cycle, realtime={})",
        control.backend().name(),
        period,
        config.realtime
    );

    loop {
        let limit_reached = config
            .max_cycles
            .is_some_and(|max| control.stats().cycles - start_cycles >= max);
        let cancelled = token.is_cancelled();

        if limit_reached || cancelled {
            if let LoopState::Resetting(mode) = control.state() {
                info!("Stopping, completing pending {} reset first", mode);
                control.step(agent)?;
            }
            if cancelled {
                info!("Control loop cancelled");
            }
            break;
        }

        control.step(agent)?;

        if config.realtime {
            let now = Instant::now();
            if now < next_deadline {
                sleeper.sleep(next_deadline - now);
                next_deadline += period;
            } else {
                // 落后超过一个周期：重新对齐，不追赶
                warn!("Control cycle overran by {:?}", now - next_deadline);
                next_deadline = now + period;
            }
        }
    }

    let stats = control.stats();
    info!(
        "Control loop finished: {} cycles, {} home resets, {} random resets, {} safety faults, {} numeric faults",
        stats.cycles,
        stats.home_resets,
        stats.random_resets,
        stats.safety_faults,
        stats.numeric_faults
    );
    Ok(stats)
}
