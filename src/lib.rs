//! BME280 气压/温度/湿度传感器驱动
//!
//! 读取出厂校准参数，按厂商定点公式补偿原始数据，并提供露点、饱和水蒸气、
//! 标高差等推导量以及阈值监视器。

pub mod sensor;

pub use sensor::bme280;
