//! 单次复位

use crate::backend::{BackendArgs, open_backend};
use crate::config::AppConfig;
use anyhow::Result;
use clap::Args;
use pendulum_hal::{Backend, ResetController, ResetMode, translate};
use std::path::Path;

/// 复位参数
#[derive(Args, Debug)]
pub struct ResetCommand {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// 复位模式：home 或 random
    #[arg(short, long, default_value = "home")]
    pub mode: String,

    /// 随机种子
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ResetCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        // 未识别的模式属于配置错误，在打开后端之前报告
        let mode: ResetMode = self.mode.parse()?;

        let mut config = AppConfig::load(config_path)?.config;
        if let Some(seed) = self.seed {
            config.hal.reset.seed = Some(seed);
        }
        config.validate()?;

        let mut backend = open_backend(&self.backend, &config)?;
        let hal = &config.hal;
        let mut resets = ResetController::new(hal.calibration, hal.safety, &hal.reset);
        let pose = resets.reset_backend(&mut backend, mode)?;
        backend.advance(hal.control.timestep())?;

        let state = translate(&backend.read_raw()?, &hal.calibration)?;
        println!("reset mode: {}", mode);
        println!(
            "target:     bar={:.4} rad ({:.4} rad/s), motor={:.4} rad",
            pose.bar_angle.0, pose.bar_angular_velocity, pose.motor_angle.0
        );
        println!("state:      {}", state);
        Ok(())
    }
}
