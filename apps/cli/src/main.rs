//! # Pendulum CLI
//!
//! 旋转倒立摆 HAL 的命令行入口：选择后端与智能体，运行控制循环直到 Ctrl+C。
//!
//! ```bash
//! # 仿真器 + 随机智能体，运行 10 秒（240 Hz）
//! pendulum-cli run --backend sim --max-cycles 2400
//!
//! # 真实机器人
//! pendulum-cli run --backend serial --port /dev/ttyUSB0 --agent idle
//!
//! # 单次复位
//! pendulum-cli reset --mode random --seed 42
//!
//! # 配置
//! pendulum-cli config show
//! pendulum-cli config check
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod backend;
mod commands;
mod config;

use commands::{ConfigCommand, ResetCommand, RunCommand};

/// Pendulum CLI - 旋转倒立摆命令行工具
#[derive(Parser, Debug)]
#[command(name = "pendulum-cli")]
#[command(about = "Run the rotary pendulum control loop on a simulated or serial backend", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 `<config_dir>/pendulum/config.toml`）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行控制循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 将机器人复位到 Home 或随机位姿
    Reset {
        #[command(flatten)]
        args: ResetCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pendulum_cli=info,pendulum_hal=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { args } => args.execute(config_path),
        Commands::Reset { args } => args.execute(config_path),
        Commands::Config(cmd) => cmd.execute(config_path),
    }
}
