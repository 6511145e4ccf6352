//! 传输层抽象
//!
//! 串口后端只依赖字节级的读写接口，便于用内存 Mock 替换真实串口。

mod mock;
#[cfg(feature = "serial")]
mod serial;

pub use mock::{EmulatedDevice, MockTransport};
#[cfg(feature = "serial")]
pub use serial::SerialTransport;

use pendulum_hal::BackendError;

/// 字节传输接口
pub trait Transport: Send {
    /// 读取数据到缓冲区，返回读取的字节数（无数据时返回 0，不阻塞）
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, BackendError>;

    /// 写入数据，返回写入的字节数
    fn write(&mut self, data: &[u8]) -> Result<usize, BackendError>;

    /// 刷新待发送数据（阻塞直到完成）
    fn flush(&mut self) -> Result<(), BackendError>;

    /// 写入全部数据
    fn write_all(&mut self, mut data: &[u8]) -> Result<(), BackendError> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                return Err(BackendError::Disconnected);
            }
            data = &data[n..];
        }
        Ok(())
    }

    /// 可读字节数
    fn available(&mut self) -> Result<usize, BackendError> {
        Ok(0)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, BackendError> {
        (**self).read(buffer)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, BackendError> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        (**self).flush()
    }

    fn available(&mut self) -> Result<usize, BackendError> {
        (**self).available()
    }
}
