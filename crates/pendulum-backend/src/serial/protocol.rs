//! 串口行协议编解码
//!
//! 每帧一行 ASCII 文本，以 `\n` 结尾（接收端容忍 `\r\n`），字段以空白分隔：
//!
//! | 方向 | 帧 | 含义 |
//! |------|----|------|
//! | 主机 → 机器人 | `S` | 请求状态快照 |
//! | 机器人 → 主机 | `S <bar_pos> <bar_vel> <motor_pos> <motor_vel>` | 状态快照（rad, rad/s） |
//! | 主机 → 机器人 | `V <vel>` | 电机速度目标（rad/s） |
//! | 主机 → 机器人 | `R <pos>` | 电机运动到绝对位置（rad） |
//! | 机器人 → 主机 | `E <message>` | 固件错误 |

use pendulum_hal::{BackendError, JointReading};
use std::fmt;

/// 单帧最大长度（字节，不含换行符）
pub const MAX_FRAME_LEN: usize = 128;

/// 主机 → 机器人
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    /// 请求状态快照
    Snapshot,
    /// 电机速度目标（rad/s）
    MotorVelocity(f64),
    /// 电机绝对位置（rad）
    MotorPosition(f64),
}

/// 机器人 → 主机
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// 状态快照
    Snapshot {
        bar: JointReading,
        motor: JointReading,
    },
    /// 固件错误
    Error(String),
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Snapshot => write!(f, "S"),
            Request::MotorVelocity(v) => write!(f, "V {}", v),
            Request::MotorPosition(p) => write!(f, "R {}", p),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Snapshot { bar, motor } => write!(
                f,
                "S {} {} {} {}",
                bar.position, bar.velocity, motor.position, motor.velocity
            ),
            Response::Error(message) => write!(f, "E {}", message),
        }
    }
}

impl Request {
    /// 编码为一帧（含结尾换行）
    pub fn encode(&self) -> Result<Vec<u8>, BackendError> {
        let value = match self {
            Request::Snapshot => None,
            Request::MotorVelocity(v) | Request::MotorPosition(v) => Some(*v),
        };
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(BackendError::InvalidInput(format!(
                "cannot encode non-finite value in {:?}",
                self
            )));
        }
        Ok(format!("{}\n", self).into_bytes())
    }

    /// 解析主机请求（供固件模拟与测试使用）
    pub fn parse(line: &str) -> Result<Self, BackendError> {
        let mut fields = split_frame(line)?;
        let tag = fields.next().ok_or_else(|| protocol_error("empty frame", line))?;
        let request = match tag {
            "S" => Request::Snapshot,
            "V" => Request::MotorVelocity(parse_finite(fields.next(), "velocity", line)?),
            "R" => Request::MotorPosition(parse_finite(fields.next(), "position", line)?),
            _ => return Err(protocol_error("unknown request tag", line)),
        };
        if fields.next().is_some() {
            return Err(protocol_error("trailing fields", line));
        }
        Ok(request)
    }
}

impl Response {
    /// 编码为一帧（含结尾换行）
    pub fn encode(&self) -> Vec<u8> {
        format!("{}\n", self).into_bytes()
    }

    /// 解析机器人应答
    ///
    /// 快照字段必须是数字，但允许 `NaN`/`inf`：非有限读数交给 HAL 处理（强制 Home 复位），
    /// 而不是作为链路错误中止运行。
    pub fn parse(line: &str) -> Result<Self, BackendError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if let Some(message) = trimmed.strip_prefix("E ") {
            return Ok(Response::Error(message.trim().to_string()));
        }
        if trimmed == "E" {
            return Ok(Response::Error(String::new()));
        }

        let mut fields = split_frame(line)?;
        match fields.next() {
            Some("S") => {},
            Some(_) => return Err(protocol_error("unknown response tag", line)),
            None => return Err(protocol_error("empty frame", line)),
        }

        let bar_position = parse_number(fields.next(), "bar position", line)?;
        let bar_velocity = parse_number(fields.next(), "bar velocity", line)?;
        let motor_position = parse_number(fields.next(), "motor position", line)?;
        let motor_velocity = parse_number(fields.next(), "motor velocity", line)?;
        if fields.next().is_some() {
            return Err(protocol_error("trailing fields", line));
        }

        Ok(Response::Snapshot {
            bar: JointReading {
                position: bar_position,
                velocity: bar_velocity,
            },
            motor: JointReading {
                position: motor_position,
                velocity: motor_velocity,
            },
        })
    }
}

fn split_frame(line: &str) -> Result<std::str::SplitWhitespace<'_>, BackendError> {
    if line.len() > MAX_FRAME_LEN {
        return Err(BackendError::Protocol(format!(
            "frame too long ({} bytes, max {})",
            line.len(),
            MAX_FRAME_LEN
        )));
    }
    Ok(line.split_whitespace())
}

fn parse_number(field: Option<&str>, name: &str, line: &str) -> Result<f64, BackendError> {
    let field = field.ok_or_else(|| protocol_error(&format!("missing {}", name), line))?;
    field
        .parse()
        .map_err(|_| protocol_error(&format!("invalid {} {:?}", name, field), line))
}

/// 主机命令中的数值必须有限
fn parse_finite(field: Option<&str>, name: &str, line: &str) -> Result<f64, BackendError> {
    let value = parse_number(field, name, line)?;
    if !value.is_finite() {
        return Err(protocol_error(&format!("non-finite {}", name), line));
    }
    Ok(value)
}

fn protocol_error(reason: &str, line: &str) -> BackendError {
    BackendError::Protocol(format!("{}: {:?}", reason, line.trim_end()))
}
