//! 测试公共模块

#![allow(dead_code)]

pub mod mock_backend;

use pendulum_hal::{ControlLoop, HalConfig};

pub use mock_backend::{BackendCall, MockBackend};

/// 固定种子的默认配置
pub fn seeded_config() -> HalConfig {
    let mut config = HalConfig::default();
    config.reset.seed = Some(2024);
    config
}

/// 创建控制循环，并执行初始 Home 复位
pub fn homed_loop(config: HalConfig) -> ControlLoop<MockBackend> {
    let mut control = ControlLoop::new(MockBackend::new(), config).unwrap();
    let mut agent = pendulum_hal::IdleAgent;
    control.step(&mut agent).unwrap();
    control.backend_mut().clear_calls();
    control
}
