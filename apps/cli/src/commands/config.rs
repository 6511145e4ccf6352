//! 配置管理命令

use crate::config::{AppConfig, default_config_path};
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（TOML）
    Show,

    /// 检查配置
    Check,

    /// 打印默认配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let loaded = AppConfig::load(config_path)?;
                print!("{}", loaded.config.to_toml_string()?);
                Ok(())
            },

            ConfigCommand::Check => {
                let loaded = AppConfig::load(config_path)?;
                match &loaded.source {
                    Some(path) => println!("Config file: {}", path.display()),
                    None => println!("Config file: (none, using defaults)"),
                }
                loaded.config.validate()?;

                let hal = &loaded.config.hal;
                println!("✅ Configuration is valid");
                println!(
                    "  Max motor speed: {:.4} rad/s",
                    hal.motor.max_motor_speed()
                );
                println!(
                    "  Motor range: [{}, {}]",
                    hal.safety.min(),
                    hal.safety.max()
                );
                println!("  Timestep: {:?}", hal.control.timestep());
                Ok(())
            },

            ConfigCommand::Path => {
                match default_config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("(no config directory on this platform)"),
                }
                Ok(())
            },
        }
    }
}
