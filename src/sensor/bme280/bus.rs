use embedded_hal::i2c::{Error as _, I2c};

use super::error::BusError;
use super::units::I2cAddress;

/// 寄存器总线
///
/// 驱动只依赖单字节读写；多字节解码由默认方法基于 `read_byte` 完成，
/// 具体总线可以覆盖 `read_bytes` 以使用连续读取。
pub trait RegisterBus {
    /// 读取单个寄存器
    fn read_byte(&mut self, register: u8) -> Result<u8, BusError>;

    /// 写入单个寄存器
    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError>;

    /// 从 `register` 开始连续读取 `buf.len()` 个寄存器
    fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(register.wrapping_add(offset as u8))?;
        }
        Ok(())
    }

    /// 读取有符号8位整数
    fn read_i8(&mut self, register: u8) -> Result<i8, BusError> {
        Ok(self.read_byte(register)? as i8)
    }

    /// 读取无符号16位整数(小端序)
    fn read_u16_le(&mut self, register: u8) -> Result<u16, BusError> {
        let mut data = [0u8; 2];
        self.read_bytes(register, &mut data)?;
        Ok(u16::from_le_bytes(data))
    }

    /// 读取有符号16位整数(小端序)
    fn read_i16_le(&mut self, register: u8) -> Result<i16, BusError> {
        let mut data = [0u8; 2];
        self.read_bytes(register, &mut data)?;
        Ok(i16::from_le_bytes(data))
    }
}

/// 基于 embedded-hal I2C 总线的寄存器访问
///
/// 树莓派上的 `rppal::i2c::I2c` 启用 `hal` 特性后即可直接使用。
pub struct I2cRegisterBus<I2C> {
    /// I2C通信句柄
    i2c: I2C,
    /// I2C从设备地址
    address: I2cAddress,
}

impl<I2C: I2c> I2cRegisterBus<I2C> {
    /// 创建寄存器总线
    pub fn new(i2c: I2C, address: I2cAddress) -> Self {
        Self { i2c, address }
    }

    /// 当前从设备地址
    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// 切换从设备地址
    pub fn set_address(&mut self, address: I2cAddress) {
        self.address = address;
    }

    /// 取回I2C通信句柄
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for I2cRegisterBus<I2C> {
    fn read_byte(&mut self, register: u8) -> Result<u8, BusError> {
        let mut data = [0u8];
        self.read_bytes(register, &mut data)?;
        Ok(data[0])
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(self.address.into(), &[register, value])
            .map_err(|err| BusError::Write {
                register,
                kind: err.kind(),
            })
    }

    fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(self.address.into(), &[register], buf)
            .map_err(|err| BusError::Read {
                register,
                kind: err.kind(),
            })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use embedded_hal::i2c::ErrorKind;

    use super::RegisterBus;
    use crate::sensor::bme280::error::BusError;

    /// 内存中的寄存器表，测试用
    #[derive(Debug, Default)]
    pub struct Registers {
        pub values: HashMap<u8, u8>,
        pub writes: Vec<(u8, u8)>,
        pub fail_reads: bool,
    }

    #[derive(Clone, Default)]
    pub struct FakeBus {
        pub registers: Arc<Mutex<Registers>>,
    }

    impl FakeBus {
        pub fn set(&self, register: u8, value: u8) {
            self.registers.lock().unwrap().values.insert(register, value);
        }

        pub fn set_all(&self, register: u8, values: &[u8]) {
            for (offset, value) in values.iter().enumerate() {
                self.set(register + offset as u8, *value);
            }
        }

        pub fn writes(&self) -> Vec<(u8, u8)> {
            self.registers.lock().unwrap().writes.clone()
        }

        pub fn fail_reads(&self, fail: bool) {
            self.registers.lock().unwrap().fail_reads = fail;
        }
    }

    impl RegisterBus for FakeBus {
        fn read_byte(&mut self, register: u8) -> Result<u8, BusError> {
            let registers = self.registers.lock().unwrap();
            if registers.fail_reads {
                return Err(BusError::Read {
                    register,
                    kind: ErrorKind::Other,
                });
            }
            Ok(registers.values.get(&register).copied().unwrap_or(0))
        }

        fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError> {
            let mut registers = self.registers.lock().unwrap();
            registers.writes.push((register, value));
            registers.values.insert(register, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

    use super::RegisterBus;
    use super::fake::FakeBus;
    use crate::sensor::bme280::{BME280, BusError, Error, I2cAddress, I2cRegisterBus};

    /// 记录每次传输的从设备地址和数据
    #[derive(Debug, Default)]
    struct Transfers {
        registers: HashMap<u8, u8>,
        /// (从设备地址, 寄存器, 写入值)
        writes: Vec<(u8, u8, u8)>,
        /// (从设备地址, 起始寄存器)
        reads: Vec<(u8, u8)>,
        fail_reads: bool,
        fail_writes: bool,
    }

    #[derive(Clone, Default)]
    struct RecordingI2c {
        transfers: Arc<Mutex<Transfers>>,
    }

    impl ErrorType for RecordingI2c {
        type Error = ErrorKind;
    }

    impl I2c for RecordingI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let mut transfers = self.transfers.lock().unwrap();
            let mut pointer = 0u8;
            for operation in operations.iter_mut() {
                match operation {
                    Operation::Write([register]) => pointer = *register,
                    Operation::Write([register, value]) => {
                        if transfers.fail_writes {
                            return Err(ErrorKind::Other);
                        }
                        transfers.writes.push((address, *register, *value));
                        transfers.registers.insert(*register, *value);
                    }
                    Operation::Write(_) => return Err(ErrorKind::Other),
                    Operation::Read(buf) => {
                        if transfers.fail_reads {
                            return Err(ErrorKind::Other);
                        }
                        transfers.reads.push((address, pointer));
                        for (offset, byte) in buf.iter_mut().enumerate() {
                            let register = pointer.wrapping_add(offset as u8);
                            *byte = transfers.registers.get(&register).copied().unwrap_or(0);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn decodes_little_endian_words() {
        let mut bus = FakeBus::default();
        bus.set_all(0x88, &[0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC]);

        assert_eq!(bus.read_u16_le(0x88).unwrap(), 27504);
        assert_eq!(bus.read_i16_le(0x8A).unwrap(), 26435);
        assert_eq!(bus.read_i16_le(0x8C).unwrap(), -1000);
    }

    #[test]
    fn decodes_signed_byte() {
        let mut bus = FakeBus::default();
        bus.set(0xE7, 0xE2);

        assert_eq!(bus.read_i8(0xE7).unwrap(), -30);
        assert_eq!(bus.read_byte(0xE7).unwrap(), 0xE2);
    }

    #[test]
    fn read_failure_is_reported() {
        let mut bus = FakeBus::default();
        bus.fail_reads(true);

        assert!(bus.read_byte(0xF7).is_err());
    }

    #[test]
    fn i2c_transfers_follow_selected_address() {
        let i2c = RecordingI2c::default();
        let sensor = BME280::new_i2c(i2c.clone(), I2cAddress::Primary).unwrap();

        {
            let transfers = i2c.transfers.lock().unwrap();
            assert_eq!(
                transfers.writes,
                vec![(0x76, 0xF2, 0x04), (0x76, 0xF4, 0x2F), (0x76, 0xF5, 0x0C)]
            );
            assert!(transfers.reads.iter().all(|&(address, _)| address == 0x76));
        }

        sensor.set_address(I2cAddress::Secondary).unwrap();
        sensor.power_off().unwrap();
        sensor.sample().unwrap();

        let transfers = i2c.transfers.lock().unwrap();
        assert_eq!(transfers.writes.last(), Some(&(0x77, 0xF4, 0x00)));
        assert_eq!(transfers.reads.last(), Some(&(0x77, 0xF7)));
    }

    #[test]
    fn i2c_read_failure_names_register() {
        let i2c = RecordingI2c::default();
        let sensor = BME280::new_i2c(i2c.clone(), I2cAddress::Primary).unwrap();
        i2c.transfers.lock().unwrap().fail_reads = true;

        assert!(matches!(
            sensor.sample(),
            Err(Error::Bus(BusError::Read {
                register: 0xF7,
                kind: ErrorKind::Other,
            }))
        ));
    }

    #[test]
    fn i2c_write_failure_names_register() {
        let i2c = RecordingI2c::default();
        i2c.transfers.lock().unwrap().fail_writes = true;
        let mut bus = I2cRegisterBus::new(i2c, I2cAddress::Secondary);

        assert_eq!(bus.address(), I2cAddress::Secondary);
        assert_eq!(
            bus.write_byte(0xF4, 0x2F),
            Err(BusError::Write {
                register: 0xF4,
                kind: ErrorKind::Other,
            })
        );
    }
}
