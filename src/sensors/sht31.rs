//! Sensirion SHT31 temperature / humidity sensor over I2C.
//!
//! Uses the single-shot, high-repeatability command with clock stretching
//! (`0x2C06`), so the sensor holds SCL until the conversion is done and no
//! delay provider is needed.  The 6-byte answer is two big-endian words,
//! each followed by a CRC-8 (poly 0x31, init 0xFF).  A CRC mismatch is
//! reported as an I2C error; the frame is never partially trusted.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::error::SensorError;

/// Default 7-bit address (ADDR pin low).
pub const DEFAULT_ADDRESS: u8 = 0x44;

const CMD_SINGLE_SHOT_HIGH_STRETCH: [u8; 2] = [0x2C, 0x06];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct Sht31<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Sht31<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Trigger a single-shot measurement and read it back.
    pub fn measure(&mut self) -> Result<ClimateReading, SensorError> {
        self.i2c
            .write(self.address, &CMD_SINGLE_SHOT_HIGH_STRETCH)
            .map_err(|e| map_bus_error(e.kind()))?;

        let mut frame = [0u8; 6];
        self.i2c
            .read(self.address, &mut frame)
            .map_err(|e| map_bus_error(e.kind()))?;

        decode_frame(&frame)
    }

    /// Release the bus.
    pub fn release(self) -> I {
        self.i2c
    }
}

/// Decode a raw 6-byte measurement frame.
pub fn decode_frame(frame: &[u8; 6]) -> Result<ClimateReading, SensorError> {
    let t_raw = checked_word(&frame[0..3])?;
    let h_raw = checked_word(&frame[3..6])?;

    Ok(ClimateReading {
        temperature_c: -45.0 + 175.0 * (t_raw as f32 / 65535.0),
        humidity_pct: 100.0 * (h_raw as f32 / 65535.0),
    })
}

/// CRC-8 as specified by Sensirion (poly 0x31, init 0xFF, no reflection).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn checked_word(chunk: &[u8]) -> Result<u16, SensorError> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::I2c);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

fn map_bus_error(kind: ErrorKind) -> SensorError {
    match kind {
        ErrorKind::NoAcknowledge(_) => SensorError::Timeout,
        _ => SensorError::I2c,
    }
}
