use bme280_weather::bme280::{BME280, I2cAddress, Precision, derived};
use rppal::i2c::I2c;

/// 读取一次BME280数据并输出推导量
fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 初始化I2C通信总线
    let i2c_bus = I2c::new()?;
    // 创建BME280传感器实例
    let bme280 = BME280::new_i2c(i2c_bus, I2cAddress::Primary)?;

    let reading = bme280.sample()?;
    println!(
        "温度: {:.2}℃, 气压: {:.2}Pa, 湿度: {:.2}%",
        reading.temperature, reading.pressure, reading.humidity
    );
    println!(
        "饱和水蒸气压: {}hPa, 饱和水蒸气量: {}g/m³, 露点: {}℃",
        derived::saturation_vapor_pressure(reading.temperature, Precision::OneDecimal),
        derived::saturation_vapor_amount(reading.temperature, Precision::OneDecimal),
        derived::dew_point(reading.temperature, reading.humidity, Precision::OneDecimal),
    );

    // OK
    Ok(())
}
