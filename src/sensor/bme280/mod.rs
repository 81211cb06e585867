pub mod bus;
pub mod calibration;
pub mod compensation;
pub mod derived;
pub mod error;
pub mod units;
pub mod watcher;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::i2c::I2c;
use log::{debug, info};

pub use bus::{I2cRegisterBus, RegisterBus};
pub use calibration::Calibration;
pub use compensation::{CompensatedReading, RawSample};
pub use error::{BusError, Error, Result};
pub use units::{
    AltitudeUnit, I2cAddress, MoistureKind, Precision, PressureUnit, TemperatureUnit,
};
pub use watcher::{Comparator, Metric, Watcher};

/// 湿度采样率寄存器
pub const REG_CTRL_HUM: u8 = 0xF2;
/// 温度/压力采样率及工作模式寄存器
pub const REG_CTRL_MEAS: u8 = 0xF4;
/// 待机时间/滤波器寄存器
pub const REG_CONFIG: u8 = 0xF5;
/// 数据寄存器起始地址 (0xF7-0xFE)
pub const REG_DATA: u8 = 0xF7;

/// osrs_h = x4
pub const CTRL_HUM_OSRS_X4: u8 = 0x04;
/// osrs_t = x16, osrs_p = x1, 正常模式
pub const CTRL_MEAS_NORMAL: u8 = 0x2F;
/// 睡眠模式
pub const CTRL_MEAS_SLEEP: u8 = 0x00;
/// 待机 250ms，滤波器系数 x4
pub const CONFIG_STANDBY_FILTER: u8 = 0x0C;

/// 阈值监视器默认周期
pub const WATCH_INTERVAL: Duration = Duration::from_millis(1000);

/// 受锁保护的设备状态
struct Device<B> {
    /// 寄存器总线
    bus: B,
    /// 最近一次完成的补偿结果
    last: CompensatedReading,
}

struct Inner<B> {
    /// 校准参数，初始化后不再改变
    calib: Calibration,
    device: Mutex<Device<B>>,
    /// 阈值监视器周期
    watch_interval: Duration,
}

/// BME280 大气压力、温度、湿度传感器封装对象
///
/// 句柄可以廉价克隆，所有克隆和阈值监视器共享同一条总线和同一份
/// "最近一次完成的补偿结果"。每次读取都会重新采样，不做缓存。
pub struct BME280<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for BME280<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// 实现BME280传感器操作
impl<B: RegisterBus + Send + 'static> BME280<B> {
    /// 创建BME280传感器实例
    ///
    /// 读取校准参数并写入固定的初始化序列；任何总线错误都会使创建失败。
    pub fn new(bus: B) -> Result<Self> {
        Self::with_watch_interval(bus, WATCH_INTERVAL)
    }

    /// 创建BME280传感器实例，并指定阈值监视器周期
    pub fn with_watch_interval(mut bus: B, watch_interval: Duration) -> Result<Self> {
        // 读取校准数据
        let calib = Calibration::load(&mut bus)?;

        // 湿度 x4
        bus.write_byte(REG_CTRL_HUM, CTRL_HUM_OSRS_X4)?;
        // 温度 x16、压力 x1、正常模式 (ctrl_hum 需在 ctrl_meas 之前写入才生效)
        bus.write_byte(REG_CTRL_MEAS, CTRL_MEAS_NORMAL)?;
        // 待机 250ms、滤波器 x4
        bus.write_byte(REG_CONFIG, CONFIG_STANDBY_FILTER)?;

        info!("BME280初始化完成");

        // OK
        Ok(Self {
            inner: Arc::new(Inner {
                calib,
                device: Mutex::new(Device {
                    bus,
                    last: CompensatedReading::default(),
                }),
                watch_interval,
            }),
        })
    }

    /// 校准参数
    pub fn calibration(&self) -> &Calibration {
        &self.inner.calib
    }

    /// 采样并补偿一次
    ///
    /// 读取、补偿、保存结果都在持锁期间完成，不会与其他采样交错。
    pub fn sample(&self) -> Result<CompensatedReading> {
        // 获取I2C总线通信权限
        let mut device = self.inner.device.lock().map_err(|_| Error::Poisoned)?;

        // 读取原始数据
        let mut data = [0u8; 8];
        device.bus.read_bytes(REG_DATA, &mut data)?;
        let raw = RawSample::from_burst(&data);

        // 使用补偿公式补偿数据
        let reading = compensation::compensate(&raw, &self.inner.calib, &device.last);
        device.last = reading;
        debug!("BME280 {:?} -> {:?}", raw, reading);

        // OK
        Ok(reading)
    }

    /// 读取气压
    pub fn pressure(&self, unit: PressureUnit, precision: Precision) -> Result<f64> {
        let reading = self.sample()?;
        Ok(precision.round(reading.pressure / unit.divisor()))
    }

    /// 读取气温
    pub fn temperature(&self, unit: TemperatureUnit, precision: Precision) -> Result<f64> {
        let reading = self.sample()?;
        Ok(precision.round(unit.from_celsius(reading.temperature)))
    }

    /// 读取相对湿度 (%)
    pub fn humidity(&self, precision: Precision) -> Result<f64> {
        let reading = self.sample()?;
        Ok(precision.round(reading.humidity))
    }

    /// 读取湿度相关量：相对湿度、水蒸气压或水蒸气量
    pub fn moisture(&self, kind: MoistureKind, precision: Precision) -> Result<f64> {
        let reading = self.sample()?;
        Ok(match kind {
            MoistureKind::RelativeHumidity => precision.round(reading.humidity),
            MoistureKind::VaporPressure => {
                derived::vapor_pressure(reading.temperature, reading.humidity, precision)
            }
            MoistureKind::VaporAmount => {
                derived::vapor_amount(reading.temperature, reading.humidity, precision)
            }
        })
    }

    /// 以当前气温、湿度计算露点 (°C)
    pub fn dew_point(&self, precision: Precision) -> Result<f64> {
        let reading = self.sample()?;
        Ok(derived::dew_point(reading.temperature, reading.humidity, precision))
    }

    /// 计算当前地点相对基准点的标高差
    ///
    /// - `reference`: 基准点气压，单位为 `reference_unit`
    pub fn elevation_difference(
        &self,
        unit: AltitudeUnit,
        reference: f64,
        reference_unit: PressureUnit,
        precision: Precision,
    ) -> Result<f64> {
        let reading = self.sample()?;
        let reference_pa = reference * reference_unit.divisor();
        Ok(derived::elevation_difference(
            reference_pa,
            reading.pressure,
            reading.temperature,
            unit,
            precision,
        ))
    }

    /// 传感器进入正常模式
    pub fn power_on(&self) -> Result<()> {
        self.write_mode(CTRL_MEAS_NORMAL)?;
        info!("BME280进入正常模式");
        Ok(())
    }

    /// 传感器进入睡眠模式
    pub fn power_off(&self) -> Result<()> {
        self.write_mode(CTRL_MEAS_SLEEP)?;
        info!("BME280进入睡眠模式");
        Ok(())
    }

    fn write_mode(&self, mode: u8) -> Result<()> {
        let mut device = self.inner.device.lock().map_err(|_| Error::Poisoned)?;
        device.bus.write_byte(REG_CTRL_MEAS, mode)?;
        Ok(())
    }

    /// 启动阈值监视器
    ///
    /// 每个周期重新采样，`测量值 <comparator> threshold` 成立时调用 `callback`。
    /// 阈值单位：气压 Pa，气温 °C，湿度 %。
    pub fn watch<F>(
        &self,
        metric: Metric,
        comparator: Comparator,
        threshold: f64,
        callback: F,
    ) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        let sensor = self.clone();
        Watcher::spawn(
            move || sensor.sample(),
            metric,
            comparator,
            threshold,
            self.inner.watch_interval,
            callback,
        )
    }

    /// 气压低于阈值 (Pa) 时触发
    pub fn on_pressure_below<F>(&self, threshold: f64, callback: F) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        self.watch(Metric::Pressure, Comparator::Below, threshold, callback)
    }

    /// 气压高于阈值 (Pa) 时触发
    pub fn on_pressure_above<F>(&self, threshold: f64, callback: F) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        self.watch(Metric::Pressure, Comparator::Above, threshold, callback)
    }

    /// 气温低于阈值 (°C) 时触发
    pub fn on_temperature_below<F>(&self, threshold: f64, callback: F) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        self.watch(Metric::Temperature, Comparator::Below, threshold, callback)
    }

    /// 气温高于阈值 (°C) 时触发
    pub fn on_temperature_above<F>(&self, threshold: f64, callback: F) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        self.watch(Metric::Temperature, Comparator::Above, threshold, callback)
    }

    /// 湿度低于阈值 (%) 时触发
    pub fn on_humidity_below<F>(&self, threshold: f64, callback: F) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        self.watch(Metric::Humidity, Comparator::Below, threshold, callback)
    }

    /// 湿度高于阈值 (%) 时触发
    pub fn on_humidity_above<F>(&self, threshold: f64, callback: F) -> Result<Watcher>
    where
        F: FnMut() + Send + 'static,
    {
        self.watch(Metric::Humidity, Comparator::Above, threshold, callback)
    }
}

impl<I2C: I2c + Send + 'static> BME280<I2cRegisterBus<I2C>> {
    /// 通过I2C总线创建传感器实例
    pub fn new_i2c(i2c: I2C, address: I2cAddress) -> Result<Self> {
        Self::new(I2cRegisterBus::new(i2c, address))
    }

    /// 切换I2C从设备地址
    pub fn set_address(&self, address: I2cAddress) -> Result<()> {
        let mut device = self.inner.device.lock().map_err(|_| Error::Poisoned)?;
        device.bus.set_address(address);
        Ok(())
    }
}
