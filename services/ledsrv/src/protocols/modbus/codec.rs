//! Modbus request builders and response checks used by the display link

use super::constants::{FC_WRITE_MULTIPLE_REGISTERS, MODBUS_MAX_WRITE_REGISTERS};
use super::pdu::{ModbusPdu, PduBuilder};
use crate::error::TransportError;

/// Modbus codec for write requests
pub struct ModbusCodec;

impl ModbusCodec {
    /// Build write PDU for FC16 (Write Multiple Registers)
    pub fn build_write_fc16_multiple_registers_pdu(
        start_address: u16,
        values: &[u16],
    ) -> Result<ModbusPdu, TransportError> {
        if values.is_empty() || values.len() > MODBUS_MAX_WRITE_REGISTERS {
            return Err(TransportError::protocol(format!(
                "Invalid register count for FC16: {} (allowed 1..={})",
                values.len(),
                MODBUS_MAX_WRITE_REGISTERS
            )));
        }

        Ok(PduBuilder::new()
            .function_code(FC_WRITE_MULTIPLE_REGISTERS)?
            .address(start_address)?
            .quantity(values.len() as u16)?
            .byte((values.len() * 2) as u8)?
            .registers(values)?
            .build())
    }

    /// Parse write response PDU
    ///
    /// An FC16 response echoes start address and quantity; when
    /// `expected` is given those are checked too.
    pub fn parse_write_response(
        pdu: &ModbusPdu,
        expected_fc: u8,
        expected: Option<(u16, u16)>,
    ) -> Result<(), TransportError> {
        let data = pdu.as_slice();

        if data.is_empty() {
            return Err(TransportError::protocol("Empty response PDU"));
        }

        if pdu.is_exception() {
            return Err(TransportError::Exception {
                function_code: data[0],
                code: pdu.exception_code().unwrap_or(0),
            });
        }

        if data[0] != expected_fc {
            return Err(TransportError::protocol(format!(
                "Function code mismatch: expected {:02X}, got {:02X}",
                expected_fc, data[0]
            )));
        }

        if let Some((start, quantity)) = expected {
            if data.len() < 5 {
                return Err(TransportError::protocol(format!(
                    "Write response too short: {} bytes",
                    data.len()
                )));
            }
            let echoed_start = u16::from_be_bytes([data[1], data[2]]);
            let echoed_quantity = u16::from_be_bytes([data[3], data[4]]);
            if echoed_start != start || echoed_quantity != quantity {
                return Err(TransportError::protocol(format!(
                    "Write response mismatch: expected start={} qty={}, got start={} qty={}",
                    start, quantity, echoed_start, echoed_quantity
                )));
            }
        }

        Ok(())
    }
}
