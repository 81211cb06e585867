use std::{thread, time::Duration};

use bme280_weather::bme280::{BME280, I2cAddress, Precision, TemperatureUnit};
use rppal::i2c::I2c;

/// 阈值监视器测试程序
fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 初始化I2C通信总线
    let i2c_bus = I2c::new()?;
    // 创建BME280传感器实例
    let bme280 = BME280::new_i2c(i2c_bus, I2cAddress::Primary)?;

    // 湿度超过70%时提示
    bme280
        .on_humidity_above(70.0, || println!("湿度过高"))?
        .detach();

    // 气压低于1000hPa时提示
    bme280
        .on_pressure_below(100_000.0, || println!("气压偏低，可能有降雨"))?
        .detach();

    // 气温高于30℃时提示，运行一分钟后停止
    let hot = bme280.on_temperature_above(30.0, || println!("气温过高"))?;

    for _ in 0..60 {
        let celsius = bme280.temperature(TemperatureUnit::Celsius, Precision::OneDecimal)?;
        println!("当前温度: {}℃", celsius);
        thread::sleep(Duration::from_secs(1));
    }
    hot.stop();
    println!("已停止高温监视");

    // 进入睡眠模式
    bme280.power_off()?;
    thread::sleep(Duration::from_secs(5));
    bme280.power_on()?;

    // 死循环
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}
