//! Serial CAN-bridge transport.
//!
//! The bridge MCU forwards controller status frames over USB serial and
//! accepts torque command frames addressed to one of the two ID groups.
//!
//! Wire format (little endian, checksum = one's complement of the byte sum
//! after the header):
//! - status in:  [0xAA, 0x55, slot, pos f32, vel f32, cur f32, checksum]
//! - command out: [0xAA, 0x55, group, 4 × i32 milliamps, checksum]

use std::io::{Read, Write};
use std::time::Duration;

use drive_traits::{ActuatorBus, ActuatorState, BusGroup};
use serialport::SerialPort;
use tracing::{debug, warn};

use crate::error::BusError;

pub const DEFAULT_BAUDRATE: u32 = 921_600;
pub const DEFAULT_TIMEOUT_MS: u64 = 5;

const HEADER: [u8; 2] = [0xAA, 0x55];
const STATUS_BODY_LEN: usize = 14; // slot + 3 × f32 + checksum
const SLOTS: usize = 6;

/// Supply voltage used to derive electrical power from measured current.
const BUS_VOLTAGE: f32 = 24.0;
/// Torque constant used to derive mechanical power (N·m per A).
const TORQUE_CONSTANT: f32 = 0.18;

fn checksum(data: &[u8]) -> u8 {
    let sum: u16 = data.iter().map(|&b| b as u16).sum();
    (!sum & 0xFF) as u8
}

/// One six-controller bus behind a serial CAN bridge.
pub struct BridgeBus {
    port: Box<dyn SerialPort>,
    states: [ActuatorState; SLOTS],
    pending: Vec<u8>,
}

impl BridgeBus {
    pub fn open(port_name: &str) -> Result<Self, BusError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self, BusError> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()
            .map_err(|e| BusError::Port(e.to_string()))?;
        debug!(port = port_name, baudrate, "bridge bus open");
        Ok(Self {
            port,
            states: [ActuatorState::default(); SLOTS],
            pending: Vec::with_capacity(256),
        })
    }

    /// Consume complete status frames from the pending buffer.
    fn drain_frames(&mut self) {
        loop {
            // Resynchronize on the header.
            let Some(start) = self
                .pending
                .windows(2)
                .position(|w| w == HEADER)
            else {
                self.pending.clear();
                return;
            };
            if start > 0 {
                self.pending.drain(..start);
            }
            if self.pending.len() < 2 + STATUS_BODY_LEN {
                return;
            }
            let body: Vec<u8> = self.pending[2..2 + STATUS_BODY_LEN].to_vec();
            self.pending.drain(..2 + STATUS_BODY_LEN);

            let slot = body[0];
            let expected = checksum(&body[..STATUS_BODY_LEN - 1]);
            if body[STATUS_BODY_LEN - 1] != expected {
                warn!(slot, "status frame checksum mismatch, dropping");
                continue;
            }
            if slot as usize >= SLOTS {
                warn!(slot, "status frame for unknown slot, dropping");
                continue;
            }
            let position = f32::from_le_bytes([body[1], body[2], body[3], body[4]]);
            let velocity = f32::from_le_bytes([body[5], body[6], body[7], body[8]]);
            let current = f32::from_le_bytes([body[9], body[10], body[11], body[12]]);
            self.states[slot as usize] = ActuatorState {
                position,
                velocity,
                current,
                electrical_power: (current * BUS_VOLTAGE).abs(),
                mechanical_power: (TORQUE_CONSTANT * current * velocity).abs(),
            };
        }
    }
}

impl ActuatorBus for BridgeBus {
    fn poll(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let available = self.port.bytes_to_read().map_err(
            |e| -> Box<dyn std::error::Error + Send + Sync> {
                Box::new(BusError::Port(e.to_string()))
            },
        )?;
        if available > 0 {
            let mut buf = vec![0u8; available as usize];
            match self.port.read(&mut buf) {
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(Box::new(BusError::Io(e))),
            }
        }
        self.drain_frames();
        Ok(())
    }

    fn command_torques(
        &mut self,
        milliamps: [i32; 4],
        group: BusGroup,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut frame = Vec::with_capacity(2 + 1 + 16 + 1);
        frame.extend_from_slice(&HEADER);
        frame.push(match group {
            BusGroup::LowFour => 0x01,
            BusGroup::HighFour => 0x02,
        });
        for ma in milliamps {
            frame.extend_from_slice(&ma.to_le_bytes());
        }
        frame.push(checksum(&frame[2..]));
        self.port.write_all(&frame).map_err(
            |e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(BusError::Io(e)) },
        )?;
        Ok(())
    }

    fn actuator(&self, slot: usize) -> ActuatorState {
        self.states.get(slot).copied().unwrap_or_default()
    }
}
