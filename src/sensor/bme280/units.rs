/// BME280 I2C从设备地址
///
/// - SDO接地时为 0x76 (默认)
/// - SDO接VDDIO时为 0x77
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum I2cAddress {
    #[default]
    Primary,
    Secondary,
}

impl From<I2cAddress> for u8 {
    fn from(address: I2cAddress) -> Self {
        match address {
            I2cAddress::Primary => 0x76,
            I2cAddress::Secondary => 0x77,
        }
    }
}

/// 气压单位
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    #[default]
    Pa,
    HPa,
}

impl PressureUnit {
    /// 由 Pa 换算到该单位时使用的除数
    pub fn divisor(self) -> f64 {
        match self {
            PressureUnit::Pa => 1.0,
            PressureUnit::HPa => 100.0,
        }
    }
}

/// 温度单位
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// 将摄氏度换算到该单位
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

/// 高度单位
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AltitudeUnit {
    #[default]
    Meters,
    Feet,
}

impl AltitudeUnit {
    /// 由米换算到该单位时使用的系数
    pub fn factor(self) -> f64 {
        match self {
            AltitudeUnit::Meters => 1.0,
            AltitudeUnit::Feet => 3.2808,
        }
    }
}

/// 湿度相关量的选择
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MoistureKind {
    /// 相对湿度 (%)
    #[default]
    RelativeHumidity,
    /// 水蒸气压 (hPa)
    VaporPressure,
    /// 水蒸气量 (g/m³)
    VaporAmount,
}

/// 对外输出的数值精度
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// 整数
    Integer,
    /// 小数点后1位
    #[default]
    OneDecimal,
}

impl Precision {
    /// 精度对应的倍率
    pub fn scale(self) -> f64 {
        match self {
            Precision::Integer => 1.0,
            Precision::OneDecimal => 10.0,
        }
    }

    /// 按该精度四舍五入
    pub fn round(self, value: f64) -> f64 {
        round_to(value, self.scale())
    }
}

/// 内部统一使用的小数点后2位倍率
pub(crate) const CENTI: f64 = 100.0;

/// 四舍五入(0.5向上进位)：`floor(value * scale + 0.5) / scale`
pub fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale + 0.5).floor() / scale
}
