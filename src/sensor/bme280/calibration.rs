use log::debug;

use super::bus::RegisterBus;
use super::error::BusError;

/// 温度/压力校准参数起始地址 (0x88-0x9F)
pub const REG_CALIB_TP: u8 = 0x88;
/// 湿度校准参数 dig_H1
pub const REG_CALIB_H1: u8 = 0xA1;
/// 湿度校准参数 dig_H2..dig_H6 起始地址 (0xE1-0xE7)
pub const REG_CALIB_H2: u8 = 0xE1;

/// BME280传感器校准参数
///
/// 出厂时写入 NVM，驱动初始化时读取一次，之后不再改变。
///
/// # 存储分布
/// - 温度/压力参数: 地址 0x88-0x9F (小端序)
/// - 湿度参数: 地址 0xA1, 0xE1-0xE7
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    // 温度校准参数组
    /// 0x88-0x89
    pub dig_t1: u16,
    /// 0x8A-0x8B
    pub dig_t2: i16,
    /// 0x8C-0x8D
    pub dig_t3: i16,

    // 压力校准参数组
    /// 0x8E-0x8F，为0时气压补偿无法做除法
    pub dig_p1: u16,
    /// 0x90-0x91
    pub dig_p2: i16,
    /// 0x92-0x93
    pub dig_p3: i16,
    /// 0x94-0x95
    pub dig_p4: i16,
    /// 0x96-0x97
    pub dig_p5: i16,
    /// 0x98-0x99
    pub dig_p6: i16,
    /// 0x9A-0x9B
    pub dig_p7: i16,
    /// 0x9C-0x9D
    pub dig_p8: i16,
    /// 0x9E-0x9F
    pub dig_p9: i16,

    // 湿度校准参数组
    /// 0xA1
    pub dig_h1: u8,
    /// 0xE1-0xE2
    pub dig_h2: i16,
    /// 0xE3
    pub dig_h3: u8,
    /// 12位有符号数，0xE4[7:0] + 0xE5[3:0]
    pub dig_h4: i16,
    /// 12位有符号数，0xE6[7:0] + 0xE5[7:4]
    pub dig_h5: i16,
    /// 0xE7
    pub dig_h6: i8,
}

impl Calibration {
    /// 从传感器读取全部校准参数
    ///
    /// 任意一次读取失败即整体失败，不存在部分可用的校准参数。
    pub fn load<B: RegisterBus>(bus: &mut B) -> Result<Self, BusError> {
        // 读取温度/压力校准参数 (0x88-0x9F)
        let mut calib = Calibration {
            dig_t1: bus.read_u16_le(REG_CALIB_TP)?,
            dig_t2: bus.read_i16_le(REG_CALIB_TP + 0x02)?,
            dig_t3: bus.read_i16_le(REG_CALIB_TP + 0x04)?,
            dig_p1: bus.read_u16_le(REG_CALIB_TP + 0x06)?,
            dig_p2: bus.read_i16_le(REG_CALIB_TP + 0x08)?,
            dig_p3: bus.read_i16_le(REG_CALIB_TP + 0x0A)?,
            dig_p4: bus.read_i16_le(REG_CALIB_TP + 0x0C)?,
            dig_p5: bus.read_i16_le(REG_CALIB_TP + 0x0E)?,
            dig_p6: bus.read_i16_le(REG_CALIB_TP + 0x10)?,
            dig_p7: bus.read_i16_le(REG_CALIB_TP + 0x12)?,
            dig_p8: bus.read_i16_le(REG_CALIB_TP + 0x14)?,
            dig_p9: bus.read_i16_le(REG_CALIB_TP + 0x16)?,
            ..Default::default()
        };

        // 读取湿度校准参数 (0xA1, 0xE1-0xE7)
        calib.dig_h1 = bus.read_byte(REG_CALIB_H1)?;
        calib.dig_h2 = bus.read_i16_le(REG_CALIB_H2)?;
        calib.dig_h3 = bus.read_byte(REG_CALIB_H2 + 0x02)?;
        let e4 = bus.read_byte(REG_CALIB_H2 + 0x03)?;
        let e5 = bus.read_byte(REG_CALIB_H2 + 0x04)?;
        let e6 = bus.read_byte(REG_CALIB_H2 + 0x05)?;
        (calib.dig_h4, calib.dig_h5) = unpack_h4_h5(e4, e5, e6);
        calib.dig_h6 = bus.read_i8(REG_CALIB_H2 + 0x06)?;

        debug!("BME280校准参数: {:?}", calib);

        // OK
        Ok(calib)
    }
}

/// 拆分 dig_H4 / dig_H5
///
/// 两个12位有符号参数共用 0xE5 这一个字节：
///
/// ```text
///   0xE4        0xE5         0xE6
/// [H4 11:4] [H5 3:0|H4 3:0] [H5 11:4]
/// ```
///
/// 高8位按有符号字节扩展，因此结果保留12位补码的符号。
pub fn unpack_h4_h5(e4: u8, e5: u8, e6: u8) -> (i16, i16) {
    let dig_h4 = (i16::from(e4 as i8) << 4) | i16::from(e5 & 0x0F);
    let dig_h5 = (i16::from(e6 as i8) << 4) | i16::from(e5 >> 4);
    (dig_h4, dig_h5)
}
