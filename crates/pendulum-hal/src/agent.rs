//! 控制智能体接口
//!
//! 智能体只观察规范状态并返回命令，从不直接修改后端。
//! 本模块提供几个参考实现：随机、静止与回合长度限制包装器。

use crate::state::CanonicalState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 控制命令
///
/// 每个周期生成一次，由控制循环消费一次，不持久化。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    /// 最大速度的百分比，名义范围 [-100, 100]
    pub speed_percentage: f64,
    /// 回合结束（触发 Home 复位）
    pub episode_done: bool,
}

impl ControlCommand {
    /// 速度命令
    #[inline]
    pub fn speed(speed_percentage: f64) -> Self {
        Self {
            speed_percentage,
            episode_done: false,
        }
    }

    /// 回合结束命令
    #[inline]
    pub fn done() -> Self {
        Self {
            speed_percentage: 0.0,
            episode_done: true,
        }
    }
}

/// 控制智能体
pub trait ControlAgent {
    /// 根据当前规范状态生成命令
    fn act(&mut self, state: &CanonicalState) -> ControlCommand;
}

impl<F> ControlAgent for F
where
    F: FnMut(&CanonicalState) -> ControlCommand,
{
    fn act(&mut self, state: &CanonicalState) -> ControlCommand {
        self(state)
    }
}

/// 随机智能体：速度百分比 ~ U(-100, 100)
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    /// 创建随机智能体，`seed` 为 `None` 时从系统熵初始化
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl ControlAgent for RandomAgent {
    fn act(&mut self, _state: &CanonicalState) -> ControlCommand {
        ControlCommand::speed(self.rng.gen_range(-100.0..=100.0))
    }
}

/// 静止智能体：始终下发零速度
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleAgent;

impl ControlAgent for IdleAgent {
    fn act(&mut self, _state: &CanonicalState) -> ControlCommand {
        ControlCommand::speed(0.0)
    }
}

/// 回合长度限制
///
/// 内部智能体每执行 `max_steps` 步后，下一次调用返回 `episode_done`。
#[derive(Debug, Clone)]
pub struct EpisodeLimit<A> {
    inner: A,
    max_steps: u64,
    steps: u64,
}

impl<A: ControlAgent> EpisodeLimit<A> {
    /// 包装智能体
    pub fn new(inner: A, max_steps: u64) -> Self {
        Self {
            inner,
            max_steps,
            steps: 0,
        }
    }

    /// 当前回合已执行的步数
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// 取回内部智能体
    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: ControlAgent> ControlAgent for EpisodeLimit<A> {
    fn act(&mut self, state: &CanonicalState) -> ControlCommand {
        if self.steps >= self.max_steps {
            self.steps = 0;
            return ControlCommand::done();
        }
        self.steps += 1;
        self.inner.act(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Deg, Rad};

    fn state() -> CanonicalState {
        CanonicalState {
            bar_angle: Rad(0.0),
            bar_angular_velocity: 0.0,
            motor_angle: Deg(0.0),
            out_of_range: false,
        }
    }

    #[test]
    fn test_random_agent_range() {
        let mut agent = RandomAgent::new(Some(3));
        for _ in 0..1000 {
            let cmd = agent.act(&state());
            assert!((-100.0..=100.0).contains(&cmd.speed_percentage));
            assert!(!cmd.episode_done);
        }
    }

    #[test]
    fn test_idle_agent() {
        assert_eq!(IdleAgent.act(&state()), ControlCommand::speed(0.0));
    }

    #[test]
    fn test_closure_agent() {
        let mut calls = 0;
        let mut agent = |s: &CanonicalState| {
            calls += 1;
            ControlCommand::speed(s.motor_angle.0)
        };
        assert_eq!(agent.act(&state()).speed_percentage, 0.0);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_episode_limit() {
        let mut agent = EpisodeLimit::new(IdleAgent, 2);
        assert!(!agent.act(&state()).episode_done);
        assert!(!agent.act(&state()).episode_done);
        assert!(agent.act(&state()).episode_done);
        assert_eq!(agent.steps(), 0);
        assert!(!agent.act(&state()).episode_done);
    }
}
