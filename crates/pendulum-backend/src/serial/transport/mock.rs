//! 内存 Mock 传输层
//!
//! 两种用法：
//!
//! - 手动注入应答字节（`inject_read`），检查主机写出的帧（`written_lines`）
//! - 挂载 [`EmulatedDevice`]，由其解析请求帧并自动生成应答

use super::Transport;
use crate::serial::protocol::{Request, Response};
use pendulum_hal::{BackendError, JointReading};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 模拟固件：电机按速度目标匀速运动，摆杆保持注入的状态
#[derive(Debug, Clone, PartialEq)]
pub struct EmulatedDevice {
    pub bar: JointReading,
    pub motor: JointReading,
    /// 每次快照请求之间推进的时间
    pub step: Duration,
    /// 非空时，下一次快照请求返回 `E <message>`
    pub fault: Option<String>,
}

impl EmulatedDevice {
    pub fn new(step: Duration) -> Self {
        Self {
            bar: JointReading::default(),
            motor: JointReading::default(),
            step,
            fault: None,
        }
    }

    fn handle(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::Snapshot => {
                if let Some(message) = self.fault.take() {
                    return Some(Response::Error(message));
                }
                self.motor.position += self.motor.velocity * self.step.as_secs_f64();
                Some(Response::Snapshot {
                    bar: self.bar,
                    motor: self.motor,
                })
            },
            Request::MotorVelocity(velocity) => {
                self.motor.velocity = velocity;
                None
            },
            Request::MotorPosition(position) => {
                self.motor.position = position;
                self.motor.velocity = 0.0;
                None
            },
        }
    }
}

/// Mock 传输层（可克隆，克隆体共享缓冲区）
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    /// 尚未形成完整一行的请求字节
    pending_request: Vec<u8>,
    device: Option<EmulatedDevice>,
    disconnected: bool,
}

impl MockTransport {
    /// 创建空的 Mock 传输层
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建挂载模拟固件的 Mock 传输层
    pub fn with_device(device: EmulatedDevice) -> Self {
        let transport = Self::new();
        transport.lock().device = Some(device);
        transport
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 注入待读取的数据
    pub fn inject_read(&self, data: &[u8]) {
        self.lock().read_buffer.extend(data);
    }

    /// 主机写出的全部数据
    pub fn written(&self) -> Vec<u8> {
        self.lock().write_buffer.clone()
    }

    /// 主机写出的帧（按行拆分，不含换行符）
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// 清空写出记录
    pub fn clear_written(&self) {
        self.lock().write_buffer.clear();
    }

    /// 模拟固件的当前状态
    pub fn device(&self) -> Option<EmulatedDevice> {
        self.lock().device.clone()
    }

    /// 修改模拟固件状态
    pub fn update_device(&self, f: impl FnOnce(&mut EmulatedDevice)) {
        if let Some(device) = self.lock().device.as_mut() {
            f(device);
        }
    }

    /// 模拟连接断开：之后的读写都返回 `Disconnected`
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, BackendError> {
        let mut inner = self.lock();
        if inner.disconnected {
            return Err(BackendError::Disconnected);
        }
        let n = inner.read_buffer.len().min(buffer.len());
        for (slot, byte) in buffer.iter_mut().zip(inner.read_buffer.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, BackendError> {
        let mut inner = self.lock();
        if inner.disconnected {
            return Err(BackendError::Disconnected);
        }
        inner.write_buffer.extend_from_slice(data);

        if inner.device.is_some() {
            inner.pending_request.extend_from_slice(data);
            while let Some(pos) = inner.pending_request.iter().position(|&b| b == b'\n') {
                let frame: Vec<u8> = inner.pending_request.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&frame).into_owned();
                let reply = match Request::parse(&line) {
                    Ok(request) => inner.device.as_mut().and_then(|d| d.handle(request)),
                    Err(e) => Some(Response::Error(e.to_string())),
                };
                if let Some(reply) = reply {
                    let bytes = reply.encode();
                    inner.read_buffer.extend(bytes);
                }
            }
        }

        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        if self.lock().disconnected {
            return Err(BackendError::Disconnected);
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize, BackendError> {
        Ok(self.lock().read_buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_and_read() {
        let mut transport = MockTransport::new();
        transport.inject_read(b"abc");
        assert_eq!(transport.available().unwrap(), 3);

        let mut buf = [0u8; 2];
        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ab");
        assert_eq!(transport.read(&mut buf).unwrap(), 1);
        assert_eq!(transport.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_clone_shares_buffers() {
        let mut transport = MockTransport::new();
        let handle = transport.clone();
        transport.write_all(b"V 1\n").unwrap();
        assert_eq!(handle.written_lines(), vec!["V 1".to_string()]);
        handle.clear_written();
        assert!(transport.written().is_empty());
    }

    #[test]
    fn test_device_answers_snapshot() {
        let mut device = EmulatedDevice::new(Duration::from_millis(100));
        device.bar.position = 1.0;
        let mut transport = MockTransport::with_device(device);

        transport.write_all(b"V 2\nS\n").unwrap();
        let mut buf = [0u8; 64];
        let n = transport.read(&mut buf).unwrap();
        let line = std::str::from_utf8(&buf[..n]).unwrap();
        match Response::parse(line).unwrap() {
            Response::Snapshot { bar, motor } => {
                assert_eq!(bar.position, 1.0);
                assert!((motor.position - 0.2).abs() < 1e-12);
                assert_eq!(motor.velocity, 2.0);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_device_reports_bad_request() {
        let mut transport = MockTransport::with_device(EmulatedDevice::new(Duration::ZERO));
        transport.write_all(b"Q\n").unwrap();
        let mut buf = [0u8; 128];
        let n = transport.read(&mut buf).unwrap();
        assert!(buf[..n].starts_with(b"E "));
    }

    #[test]
    fn test_disconnect() {
        let mut transport = MockTransport::new();
        transport.disconnect();
        assert!(matches!(
            transport.write(b"S\n"),
            Err(BackendError::Disconnected)
        ));
    }
}
