use embedded_hal::i2c::ErrorKind;

/// 寄存器总线读写错误
///
/// 总线错误对驱动是致命的：不做重试，直接返回给调用方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("读取寄存器 0x{register:02X} 失败: {kind}")]
    Read { register: u8, kind: ErrorKind },

    #[error("写入寄存器 0x{register:02X} 失败: {kind}")]
    Write { register: u8, kind: ErrorKind },
}

/// BME280驱动错误
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I2C通信总线错误: {0}")]
    Bus(#[from] BusError),

    /// 共享设备锁被持有者的panic污染
    #[error("I2C通信总线锁已失效")]
    Poisoned,

    #[error("无法启动阈值监视线程: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
