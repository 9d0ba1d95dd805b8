//! Motion sensor input
//!
//! `MotionSensor` is the seam the client reads from. Two backends:
//! - `Icm20948`: register-level driver over any `embedded-hal` I2C bus
//! - `SimulatedSensor`: seeded random tilt for running without hardware

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

/// LSB per g at the default ±2 g range
pub const ACCEL_SCALE_FACTOR: f32 = 16384.0;
/// LSB per degree/s at the default ±250 dps range
pub const GYRO_SCALE_FACTOR: f32 = 131.0;

/// ICM-20948 registers (user bank 0)
pub mod regs {
    pub const DEVICE_ADDRESS: u8 = 0x68;
    pub const REG_BANK_SEL: u8 = 0x7F;
    pub const WHO_AM_I: u8 = 0x00;
    pub const WHO_AM_I_EXPECTED: u8 = 0xEA;
    pub const PWR_MGMT_1: u8 = 0x06;
    pub const PWR_MGMT_2: u8 = 0x07;
    pub const ACCEL_XOUT_H: u8 = 0x2D;
    pub const GYRO_XOUT_H: u8 = 0x33;

    pub const RESET: u8 = 0x80;
    pub const CLOCK_AUTO: u8 = 0x01;
    pub const ALL_SENSORS_ON: u8 = 0x00;
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor read before init")]
    NotInitialized,
    #[error("i2c bus error: {0:?}")]
    Bus(ErrorKind),
    #[error("unexpected WHO_AM_I 0x{found:02X}")]
    WrongDevice { found: u8 },
}

/// One 6-axis sample: accel in g, gyro in degrees/s
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuReading {
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
}

impl ImuReading {
    /// Scale raw signed counts
    pub fn from_raw(accel: [i16; 3], gyro: [i16; 3]) -> Self {
        Self {
            accel_x: accel[0] as f32 / ACCEL_SCALE_FACTOR,
            accel_y: accel[1] as f32 / ACCEL_SCALE_FACTOR,
            accel_z: accel[2] as f32 / ACCEL_SCALE_FACTOR,
            gyro_x: gyro[0] as f32 / GYRO_SCALE_FACTOR,
            gyro_y: gyro[1] as f32 / GYRO_SCALE_FACTOR,
            gyro_z: gyro[2] as f32 / GYRO_SCALE_FACTOR,
        }
    }

    /// Decode two big-endian XYZ register blocks
    pub fn from_registers(accel: &[u8; 6], gyro: &[u8; 6]) -> Self {
        Self::from_raw(be_triple(accel), be_triple(gyro))
    }
}

fn be_triple(bytes: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_be_bytes([bytes[0], bytes[1]]),
        i16::from_be_bytes([bytes[2], bytes[3]]),
        i16::from_be_bytes([bytes[4], bytes[5]]),
    ]
}

/// Source of motion samples
pub trait MotionSensor {
    fn init(&mut self) -> Result<(), SensorError>;
    fn read(&mut self) -> Result<ImuReading, SensorError>;
}

/// ICM-20948 over I2C
pub struct Icm20948<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    ready: bool,
}

impl<I2C: I2c, D: DelayNs> Icm20948<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: regs::DEVICE_ADDRESS,
            ready: false,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| SensorError::Bus(e.kind()))
    }

    fn read_block(&mut self, start: u8) -> Result<[u8; 6], SensorError> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[start], &mut buf)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        Ok(buf)
    }
}

impl<I2C: I2c, D: DelayNs> MotionSensor for Icm20948<I2C, D> {
    fn init(&mut self) -> Result<(), SensorError> {
        // Bank select and reset can fail on a chip that is mid-reset; carry on
        if let Err(e) = self.write_reg(regs::REG_BANK_SEL, 0x00) {
            log::warn!("IMU bank select failed: {e}");
        }
        if let Err(e) = self.write_reg(regs::PWR_MGMT_1, regs::RESET) {
            log::warn!("IMU soft reset failed: {e}");
        }
        self.delay.delay_ms(100);

        self.write_reg(regs::PWR_MGMT_1, regs::CLOCK_AUTO)?;
        self.write_reg(regs::PWR_MGMT_2, regs::ALL_SENSORS_ON)?;
        self.delay.delay_ms(10);

        let mut id = [0u8; 1];
        self.i2c
            .write_read(self.address, &[regs::WHO_AM_I], &mut id)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        if id[0] != regs::WHO_AM_I_EXPECTED {
            return Err(SensorError::WrongDevice { found: id[0] });
        }

        self.ready = true;
        log::info!("IMU initialized");
        Ok(())
    }

    fn read(&mut self) -> Result<ImuReading, SensorError> {
        if !self.ready {
            return Err(SensorError::NotInitialized);
        }
        let accel = self.read_block(regs::ACCEL_XOUT_H)?;
        let gyro = self.read_block(regs::GYRO_XOUT_H)?;
        Ok(ImuReading::from_registers(&accel, &gyro))
    }
}

/// Random-walk tilt for playing without a sensor
pub struct SimulatedSensor {
    rng: Pcg32,
    gyro_x: f32,
}

impl SimulatedSensor {
    /// Largest simulated rotation rate, degrees/s
    const MAX_RATE: f32 = 60.0;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            gyro_x: 0.0,
        }
    }
}

impl MotionSensor for SimulatedSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read(&mut self) -> Result<ImuReading, SensorError> {
        let nudge: f32 = self.rng.random_range(-15.0..=15.0);
        self.gyro_x = (self.gyro_x + nudge).clamp(-Self::MAX_RATE, Self::MAX_RATE);
        Ok(ImuReading {
            accel_z: 1.0,
            gyro_x: self.gyro_x,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorType, Operation};
    use std::collections::HashMap;

    /// Register file behind a fake I2C bus
    #[derive(Default)]
    struct FakeBus {
        registers: HashMap<u8, u8>,
        writes: Vec<Vec<u8>>,
        fail_writes: bool,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, regs::DEVICE_ADDRESS);
            let mut pointer = 0u8;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if self.fail_writes {
                            return Err(ErrorKind::Other);
                        }
                        pointer = bytes[0];
                        self.writes.push(bytes.to_vec());
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = *self.registers.get(&(pointer + i as u8)).unwrap_or(&0);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn bus_with_id(id: u8) -> FakeBus {
        let mut bus = FakeBus::default();
        bus.registers.insert(regs::WHO_AM_I, id);
        bus
    }

    #[test]
    fn test_from_registers_scales() {
        // 16384 -> 1 g, -131 -> -1 dps
        let accel = [0x40, 0x00, 0x00, 0x00, 0xC0, 0x00];
        let gyro = [0xFF, 0x7D, 0x00, 0x83, 0x00, 0x00];
        let reading = ImuReading::from_registers(&accel, &gyro);
        assert_eq!(reading.accel_x, 1.0);
        assert_eq!(reading.accel_z, -1.0);
        assert_eq!(reading.gyro_x, -1.0);
        assert_eq!(reading.gyro_y, 1.0);
    }

    #[test]
    fn test_init_sequence() {
        let mut imu = Icm20948::new(bus_with_id(regs::WHO_AM_I_EXPECTED), NoDelay);
        imu.init().unwrap();
        let (bus, _) = imu.release();
        assert_eq!(
            &bus.writes[..4],
            &[
                vec![regs::REG_BANK_SEL, 0x00],
                vec![regs::PWR_MGMT_1, regs::RESET],
                vec![regs::PWR_MGMT_1, regs::CLOCK_AUTO],
                vec![regs::PWR_MGMT_2, regs::ALL_SENSORS_ON],
            ]
        );
    }

    #[test]
    fn test_wrong_device() {
        let mut imu = Icm20948::new(bus_with_id(0x12), NoDelay);
        assert_eq!(imu.init(), Err(SensorError::WrongDevice { found: 0x12 }));
        assert_eq!(imu.read(), Err(SensorError::NotInitialized));
    }

    #[test]
    fn test_bus_failure_surfaces() {
        let mut bus = bus_with_id(regs::WHO_AM_I_EXPECTED);
        bus.fail_writes = true;
        let mut imu = Icm20948::new(bus, NoDelay);
        assert_eq!(imu.init(), Err(SensorError::Bus(ErrorKind::Other)));
    }

    #[test]
    fn test_read_gyro_block() {
        let mut bus = bus_with_id(regs::WHO_AM_I_EXPECTED);
        // gyro_x = 262 counts = 2 dps
        bus.registers.insert(regs::GYRO_XOUT_H, 0x01);
        bus.registers.insert(regs::GYRO_XOUT_H + 1, 0x06);
        let mut imu = Icm20948::new(bus, NoDelay);
        imu.init().unwrap();
        let reading = imu.read().unwrap();
        assert_eq!(reading.gyro_x, 2.0);
        assert_eq!(reading.accel_x, 0.0);
    }

    #[test]
    fn test_simulated_sensor_is_bounded() {
        let mut sensor = SimulatedSensor::new(7);
        sensor.init().unwrap();
        for _ in 0..500 {
            let reading = sensor.read().unwrap();
            assert!(reading.gyro_x.abs() <= SimulatedSensor::MAX_RATE);
        }
    }
}
