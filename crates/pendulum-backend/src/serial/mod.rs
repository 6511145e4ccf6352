//! 串口后端
//!
//! 通过换行分隔的 ASCII 行协议（见 [`protocol`]）与机器人固件通信。
//!
//! 真实机器人上摆杆是被动关节：摆杆的复位与速度命令会被接受并忽略（仅记录 debug 日志）。
//! 一次 `advance()` 刷新链路并使缓存的快照失效，下一次读取会请求新快照，
//! 因此同一周期内读取两个关节只产生一次往返。

pub mod protocol;
pub mod transport;

use pendulum_hal::{Backend, BackendError, Joint, JointReading, VelocityCommand};
use protocol::{MAX_FRAME_LEN, Request, Response};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use transport::Transport;

#[cfg(feature = "serial")]
use transport::SerialTransport;

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// 默认应答超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// 无数据时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_micros(200);

/// 串口后端
pub struct SerialBackend<T: Transport> {
    transport: T,
    /// 接收缓冲（未形成完整帧的字节）
    rx: Vec<u8>,
    /// 当前周期的快照（bar, motor）
    snapshot: Option<(JointReading, JointReading)>,
    timeout: Duration,
}

#[cfg(feature = "serial")]
impl SerialBackend<SerialTransport> {
    /// 打开串口并创建后端
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, BackendError> {
        Ok(Self::new(SerialTransport::open(path, baud_rate)?))
    }
}

impl<T: Transport> SerialBackend<T> {
    /// 基于任意传输层创建后端
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            rx: Vec::with_capacity(MAX_FRAME_LEN),
            snapshot: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// 设置应答超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 应答超时
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 传输层引用
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 取回传输层
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn send(&mut self, request: Request) -> Result<(), BackendError> {
        trace!("serial → {}", request);
        let frame = request.encode()?;
        self.transport.write_all(&frame)
    }

    /// 读取一帧（跳过空行）
    fn read_frame(&mut self) -> Result<String, BackendError> {
        let deadline = Instant::now() + self.timeout;
        let mut chunk = [0u8; 64];

        loop {
            if let Some(pos) = self.rx.iter().position(|&b| b == b'\n') {
                let frame: Vec<u8> = self.rx.drain(..=pos).collect();
                let line = String::from_utf8(frame).map_err(|_| {
                    BackendError::Protocol("received non-UTF-8 frame".to_string())
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                trace!("serial ← {}", line.trim_end());
                return Ok(line);
            }

            if self.rx.len() > MAX_FRAME_LEN + 2 {
                let len = self.rx.len();
                self.rx.clear();
                return Err(BackendError::Protocol(format!(
                    "no frame terminator within {} bytes",
                    len
                )));
            }

            let n = self.transport.read(&mut chunk)?;
            if n > 0 {
                self.rx.extend_from_slice(&chunk[..n]);
            } else if Instant::now() >= deadline {
                return Err(BackendError::Timeout);
            } else {
                spin_sleep::sleep(POLL_INTERVAL);
            }
        }
    }

    /// 请求并缓存一个状态快照
    fn refresh(&mut self) -> Result<(JointReading, JointReading), BackendError> {
        self.send(Request::Snapshot)?;
        self.transport.flush()?;

        match Response::parse(&self.read_frame()?)? {
            Response::Snapshot { bar, motor } => {
                self.snapshot = Some((bar, motor));
                Ok((bar, motor))
            },
            Response::Error(message) => {
                warn!("Firmware reported error: {}", message);
                Err(BackendError::Device(message))
            },
        }
    }
}

impl<T: Transport> Backend for SerialBackend<T> {
    fn joint_state(&mut self, joint: Joint) -> Result<JointReading, BackendError> {
        let (bar, motor) = match self.snapshot {
            Some(snapshot) => snapshot,
            None => self.refresh()?,
        };
        Ok(match joint {
            Joint::Bar => bar,
            Joint::Motor => motor,
        })
    }

    fn set_joint_velocity_target(
        &mut self,
        joint: Joint,
        command: VelocityCommand,
    ) -> Result<(), BackendError> {
        match joint {
            Joint::Motor => {
                // 步进电机无法释放，零力命令按停止处理
                let velocity = if command.is_release() {
                    debug!("serial: motor release requested, sending zero velocity");
                    0.0
                } else {
                    command.velocity
                };
                self.send(Request::MotorVelocity(velocity))
            },
            Joint::Bar => {
                debug!("serial: ignoring bar velocity command {:?} (passive joint)", command);
                Ok(())
            },
        }
    }

    fn reset_joint_state(
        &mut self,
        joint: Joint,
        position: f64,
        velocity: f64,
    ) -> Result<(), BackendError> {
        match joint {
            Joint::Motor => {
                if velocity != 0.0 {
                    debug!("serial: motor reset velocity {:.4} ignored", velocity);
                }
                self.snapshot = None;
                self.send(Request::MotorPosition(position))
            },
            Joint::Bar => {
                debug!(
                    "serial: ignoring bar reset to {:.4} rad (passive joint)",
                    position
                );
                Ok(())
            },
        }
    }

    fn advance(&mut self, _dt: Duration) -> Result<(), BackendError> {
        self.transport.flush()?;
        self.snapshot = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "serial"
    }
}
