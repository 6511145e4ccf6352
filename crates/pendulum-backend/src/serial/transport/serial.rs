//! 基于 `serialport` 的串口传输层

use super::Transport;
use pendulum_hal::BackendError;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::info;

/// 读超时：超时视为"暂无数据"，由上层按应答超时重试
const READ_TIMEOUT: Duration = Duration::from_millis(1);

/// 串口传输层（8N1，无流控）
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

fn port_error(e: serialport::Error) -> BackendError {
    BackendError::Io(e.into())
}

/// 超时、中断、暂不可用都不是链路故障
fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl SerialTransport {
    /// 以 8N1、无流控打开串口（如 `/dev/ttyUSB0`、`COM3`）
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, BackendError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(port_error)?;

        info!("Serial link {} open at {} baud", path, baud_rate);
        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    /// 串口路径
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, BackendError> {
        self.port.read(buffer).or_else(|e| {
            if is_transient(e.kind()) {
                Ok(0)
            } else {
                Err(BackendError::Io(e))
            }
        })
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, BackendError> {
        Ok(self.port.write(data)?)
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        Ok(self.port.flush()?)
    }

    fn available(&mut self) -> Result<usize, BackendError> {
        let pending = self.port.bytes_to_read().map_err(port_error)?;
        Ok(pending as usize)
    }
}
