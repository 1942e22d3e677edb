//! MPU6050 inertial sensor over I2C.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Default I2C address (AD0 low).
pub const MPU6050_ADDR: u8 = 0x68;

const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_GYRO_XOUT_H: u8 = 0x43;
const DEVICE_RESET: u8 = 0x80;

/// One raw reading: accelerometer then gyroscope, X/Y/Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

pub trait InertialSensor {
    type Error;

    fn read_raw(&mut self) -> Result<Sample, Self::Error>;
}

pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mpu6050<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: MPU6050_ADDR,
        }
    }

    /// Resets every register, then wakes the device from sleep.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[REG_PWR_MGMT_1, DEVICE_RESET])?;
        delay.delay_ms(100);
        self.i2c.write(self.address, &[REG_PWR_MGMT_1, 0x00])?;
        delay.delay_ms(10);
        Ok(())
    }

    fn read_triplet(&mut self, register: u8) -> Result<[i16; 3], I2C::Error> {
        let mut buf = [0u8; 6];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok([
            i16::from_be_bytes([buf[0], buf[1]]),
            i16::from_be_bytes([buf[2], buf[3]]),
            i16::from_be_bytes([buf[4], buf[5]]),
        ])
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> InertialSensor for Mpu6050<I2C> {
    type Error = I2C::Error;

    fn read_raw(&mut self) -> Result<Sample, Self::Error> {
        Ok(Sample {
            accel: self.read_triplet(REG_ACCEL_XOUT_H)?,
            gyro: self.read_triplet(REG_GYRO_XOUT_H)?,
        })
    }
}
