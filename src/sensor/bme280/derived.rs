//! 由温度、湿度、气压推导的气象量

use super::units::{AltitudeUnit, CENTI, Precision, round_to};

/// 对流圈气温递减率 (0.65°C/100m)
const LAPSE_RATE: f64 = 0.0065;
/// 气压高度公式的指数 (g·M / R·L)
const BAROMETRIC_EXPONENT: f64 = 5.257;
/// 摄氏度与开尔文的差
const KELVIN_OFFSET: f64 = 273.15;
/// 水蒸气量换算系数 (g·K/(m³·hPa))
const VAPOR_AMOUNT_FACTOR: f64 = 217.0;

// 改良马格努斯公式系数
const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12;

/// 饱和水蒸气压 (hPa)，泰滕斯近似式，保留小数点后2位
///
/// `6.1078 * 10^((7.5 * T) / (237.3 + T))`
pub fn tetens_svp(celsius: f64) -> f64 {
    let svp = 6.1078 * 10f64.powf((7.5 * celsius) / (237.3 + celsius));
    round_to(svp, CENTI)
}

/// 饱和水蒸气压 (hPa)
pub fn saturation_vapor_pressure(celsius: f64, precision: Precision) -> f64 {
    precision.round(tetens_svp(celsius))
}

/// 饱和水蒸气量 (g/m³)
pub fn saturation_vapor_amount(celsius: f64, precision: Precision) -> f64 {
    let sva = VAPOR_AMOUNT_FACTOR * tetens_svp(celsius) / (celsius + KELVIN_OFFSET);
    precision.round(sva)
}

/// 水蒸气压 (hPa)
pub fn vapor_pressure(celsius: f64, humidity: f64, precision: Precision) -> f64 {
    precision.round(tetens_svp(celsius) * humidity / 100.0)
}

/// 水蒸气量 (g/m³)
pub fn vapor_amount(celsius: f64, humidity: f64, precision: Precision) -> f64 {
    let e = tetens_svp(celsius) * humidity / 100.0;
    precision.round(VAPOR_AMOUNT_FACTOR * e / (celsius + KELVIN_OFFSET))
}

/// 露点 (°C)，改良马格努斯公式，未取整
///
/// 湿度必须大于 0，否则结果为 NaN 或负无穷。
pub fn magnus_dew_point(celsius: f64, humidity: f64) -> f64 {
    let alpha = (humidity / 100.0).ln() + (MAGNUS_A * celsius) / (MAGNUS_B + celsius);
    MAGNUS_B * alpha / (MAGNUS_A - alpha)
}

/// 露点 (°C)
pub fn dew_point(celsius: f64, humidity: f64, precision: Precision) -> f64 {
    precision.round(magnus_dew_point(celsius, humidity))
}

/// 两点间的标高差 (米)，气压高度公式
///
/// - `reference_pa`: 基准点气压 (Pa)
/// - `current_pa`: 当前地点气压 (Pa)
/// - `celsius`: 当前地点气温
pub fn barometric_elevation(reference_pa: f64, current_pa: f64, celsius: f64) -> f64 {
    let kelvin = celsius + KELVIN_OFFSET;
    ((reference_pa / current_pa).powf(1.0 / BAROMETRIC_EXPONENT) - 1.0) * kelvin / LAPSE_RATE
}

/// 两点间的标高差，按高度单位换算并取整
pub fn elevation_difference(
    reference_pa: f64,
    current_pa: f64,
    celsius: f64,
    unit: AltitudeUnit,
    precision: Precision,
) -> f64 {
    precision.round(barometric_elevation(reference_pa, current_pa, celsius) * unit.factor())
}
