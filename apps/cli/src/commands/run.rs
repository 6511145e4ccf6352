//! 运行控制循环

use crate::backend::{BackendArgs, BackendKind, open_backend};
use crate::config::AppConfig;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pendulum_hal::control::run;
use pendulum_hal::{
    Backend, CancellationToken, CanonicalState, ControlAgent, ControlCommand, ControlLoop,
    EpisodeLimit, IdleAgent, RandomAgent, RunConfig,
};
use std::path::Path;
use tracing::info;

/// 智能体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    /// 每个周期均匀采样 [-100, 100] 的速度百分比
    Random,
    /// 电机保持静止
    Idle,
}

/// 内置智能体
enum BuiltinAgent {
    Random(RandomAgent),
    Idle(IdleAgent),
}

impl ControlAgent for BuiltinAgent {
    fn act(&mut self, state: &CanonicalState) -> ControlCommand {
        match self {
            BuiltinAgent::Random(agent) => agent.act(state),
            BuiltinAgent::Idle(agent) => agent.act(state),
        }
    }
}

/// 运行参数
#[derive(Args, Debug)]
pub struct RunCommand {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// 智能体
    #[arg(short, long, value_enum, default_value_t = AgentKind::Random)]
    pub agent: AgentKind,

    /// 随机种子（智能体与随机复位）
    #[arg(long)]
    pub seed: Option<u64>,

    /// 每个回合的控制周期数，到达后结束回合并回到 Home
    #[arg(long)]
    pub episode_steps: Option<u64>,

    /// 最多运行的周期数（默认直到 Ctrl+C）
    #[arg(long, visible_alias = "steps")]
    pub max_cycles: Option<u64>,

    /// 按实时节拍运行（串口后端总是实时）
    #[arg(long)]
    pub realtime: bool,
}

impl RunCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let loaded = AppConfig::load(config_path)?;
        let mut config = loaded.config;
        if let Some(seed) = self.seed {
            config.hal.reset.seed = Some(seed);
        }
        // 配置错误必须在接触后端之前报告
        config.validate()?;

        let backend = open_backend(&self.backend, &config)?;
        let mut control =
            ControlLoop::new(backend, config.hal.clone()).context("Failed to build control loop")?;

        let agent = match self.agent {
            AgentKind::Random => BuiltinAgent::Random(RandomAgent::new(self.seed)),
            AgentKind::Idle => BuiltinAgent::Idle(IdleAgent),
        };
        let mut agent: Box<dyn ControlAgent> = match self.episode_steps {
            Some(0) => anyhow::bail!("--episode-steps must be at least 1"),
            Some(steps) => Box::new(EpisodeLimit::new(agent, steps)),
            None => Box::new(agent),
        };

        let run_config = RunConfig {
            realtime: self.realtime || self.backend.backend == BackendKind::Serial,
            max_cycles: self.max_cycles,
        };

        let token = CancellationToken::new();
        let handler_token = token.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nReceived interrupt signal. Finishing current cycle...");
            handler_token.cancel();
        })
        .context("Failed to install Ctrl+C handler")?;

        info!(
            "Running {:?} agent on {} backend at {} Hz",
            self.agent,
            control.backend().name(),
            config.hal.control.timestep_hz
        );
        let stats = run(&mut control, agent.as_mut(), &run_config, &token)?;

        println!("cycles:            {}", stats.cycles);
        println!("backend steps:     {}", stats.backend_steps);
        println!("home resets:       {}", stats.home_resets);
        println!("random resets:     {}", stats.random_resets);
        println!("safety faults:     {}", stats.safety_faults);
        println!("numeric faults:    {}", stats.numeric_faults);
        println!("rejected commands: {}", stats.rejected_commands);
        if let Some(state) = control.last_state() {
            println!("last state:        {}", state);
        }
        Ok(())
    }
}
