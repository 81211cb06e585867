//! BME280 补偿算法
//!
//! 按数据手册 4.2.3 节的定点整数公式，将原始 ADC 值换算为温度(°C)、
//! 气压(Pa)、相对湿度(%)。温度必须最先计算，它产生的 `t_fine`
//! 同时参与气压和湿度的补偿。

use log::warn;

use super::calibration::Calibration;
use super::units::{CENTI, round_to};

/// 湿度补偿中间值的上限，对应 100 %RH (Q22.10 左移 12 位)
const HUMIDITY_MAX: i64 = 419_430_400;

/// 一次连续读取得到的原始 ADC 值
///
/// - 气压、温度: 20位无符号
/// - 湿度: 16位无符号
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub adc_p: u32,
    pub adc_t: u32,
    pub adc_h: u32,
}

impl RawSample {
    /// 解析数据寄存器 0xF7-0xFE 的连续读取结果
    pub fn from_burst(data: &[u8; 8]) -> Self {
        // 解析20位压力数据 (0xF7-0xF9)
        let adc_p =
            (u32::from(data[0]) << 12) | (u32::from(data[1]) << 4) | (u32::from(data[2]) >> 4);
        // 解析20位温度数据 (0xFA-0xFC)
        let adc_t =
            (u32::from(data[3]) << 12) | (u32::from(data[4]) << 4) | (u32::from(data[5]) >> 4);
        // 解析16位湿度数据 (0xFD-0xFE)
        let adc_h = (u32::from(data[6]) << 8) | u32::from(data[7]);

        Self { adc_p, adc_t, adc_h }
    }
}

/// 补偿后的测量值
///
/// - `temperature`: °C，小数点后2位
/// - `pressure`: Pa，小数点后2位
/// - `humidity`: %RH，小数点后2位，范围 0-100
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CompensatedReading {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// 温度补偿
///
/// 返回 `(t_fine, 温度°C)`；温度先按 0.01°C 的整数计算再转为浮点数。
pub fn compensate_temperature(adc_t: u32, calib: &Calibration) -> (i32, f64) {
    let adc_t = i64::from(adc_t);
    let dig_t1 = i64::from(calib.dig_t1);
    let dig_t2 = i64::from(calib.dig_t2);
    let dig_t3 = i64::from(calib.dig_t3);

    let var1 = (((adc_t >> 3) - (dig_t1 << 1)) * dig_t2) >> 11;
    let var2 = (((((adc_t >> 4) - dig_t1) * ((adc_t >> 4) - dig_t1)) >> 12) * dig_t3) >> 14;

    let t_fine = (var1 + var2) as i32;
    // 0.01°C
    let centi_celsius = (i64::from(t_fine) * 5 + 128) >> 8;

    (t_fine, centi_celsius as f64 / 100.0)
}

/// 气压补偿 (64位整数版本)
///
/// `var1` 为 0 时无法做除法，返回 `None`，调用方保留上一次的气压值。
pub fn compensate_pressure(adc_p: u32, t_fine: i32, calib: &Calibration) -> Option<f64> {
    let dig_p1 = i64::from(calib.dig_p1);
    let dig_p2 = i64::from(calib.dig_p2);
    let dig_p3 = i64::from(calib.dig_p3);
    let dig_p4 = i64::from(calib.dig_p4);
    let dig_p5 = i64::from(calib.dig_p5);
    let dig_p6 = i64::from(calib.dig_p6);
    let dig_p7 = i64::from(calib.dig_p7);
    let dig_p8 = i64::from(calib.dig_p8);
    let dig_p9 = i64::from(calib.dig_p9);

    let mut var1 = i64::from(t_fine) - 128000;
    let mut var2 = var1 * var1 * dig_p6;
    var2 += (var1 * dig_p5) << 17;
    var2 += dig_p4 << 35;
    var1 = ((var1 * var1 * dig_p3) >> 8) + ((var1 * dig_p2) << 12);
    var1 = (((1_i64 << 47) + var1) * dig_p1) >> 33;

    if var1 == 0 {
        return None;
    }

    let mut p = 1_048_576 - i64::from(adc_p);
    p = (((p << 31) - var2) * 3125) / var1;
    var1 = (dig_p9 * ((p >> 13) * (p >> 13))) >> 25;
    var2 = (dig_p8 * p) >> 19;
    // Q24.8
    p = ((p + var1 + var2) >> 8) + (dig_p7 << 4);

    Some(round_to(p as f64 / 256.0, CENTI))
}

/// 湿度补偿
///
/// 倒数第二步的中间值被限制在 [0, 419430400]，因此结果始终落在 0-100 %RH。
pub fn compensate_humidity(adc_h: u32, t_fine: i32, calib: &Calibration) -> f64 {
    let adc_h = i64::from(adc_h);
    let dig_h1 = i64::from(calib.dig_h1);
    let dig_h2 = i64::from(calib.dig_h2);
    let dig_h3 = i64::from(calib.dig_h3);
    let dig_h4 = i64::from(calib.dig_h4);
    let dig_h5 = i64::from(calib.dig_h5);
    let dig_h6 = i64::from(calib.dig_h6);

    let var1 = i64::from(t_fine) - 76800;
    let var2 = (((adc_h << 14) - (dig_h4 << 20) - (dig_h5 * var1)) + 16384) >> 15;
    let var3 = (((var1 * dig_h6) >> 10) * (((var1 * dig_h3) >> 11) + 32768)) >> 10;
    let var4 = ((var3 + 2_097_152) * dig_h2 + 8192) >> 14;
    let mut var5 = var2 * var4;
    var5 -= ((((var5 >> 15) * (var5 >> 15)) >> 7) * dig_h1) >> 4;
    let var5 = var5.clamp(0, HUMIDITY_MAX);

    // Q22.10 -> %RH
    round_to((var5 >> 12) as f64 / 1024.0, CENTI)
}

/// 完整的一次补偿
///
/// 气压除零保护触发时沿用 `previous` 中的气压值。
pub fn compensate(
    raw: &RawSample,
    calib: &Calibration,
    previous: &CompensatedReading,
) -> CompensatedReading {
    let (t_fine, temperature) = compensate_temperature(raw.adc_t, calib);
    let pressure = compensate_pressure(raw.adc_p, t_fine, calib).unwrap_or_else(|| {
        warn!("气压补偿除数为0，沿用上一次的气压值");
        previous.pressure
    });
    let humidity = compensate_humidity(raw.adc_h, t_fine, calib);

    CompensatedReading {
        temperature,
        pressure,
        humidity,
    }
}
