//! # Pendulum Backend
//!
//! `pendulum-hal` 的 `Backend` 实现：
//!
//! - `sim` - 参考仿真器（刚性 Furuta 摆，半隐式 Euler 积分）
//! - `serial` - 串口后端（换行分隔的 ASCII 行协议，传输层可替换）
//!
//! 两种后端对控制循环完全透明：状态转换、安全检查与复位都在 HAL 中完成。

pub mod serial;
pub mod sim;

pub use serial::protocol::{Request, Response};
pub use serial::transport::{EmulatedDevice, MockTransport, Transport};
#[cfg(feature = "serial")]
pub use serial::transport::SerialTransport;
pub use serial::{DEFAULT_BAUD_RATE, SerialBackend};
pub use sim::{SimConfig, SimulatedBackend};
