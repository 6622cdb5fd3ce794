//! Modbus TCP framing (MBAP header + unit id + PDU)

use tracing::debug;

use super::constants::{MAX_MBAP_LENGTH, MBAP_HEADER_LEN};
use super::pdu::ModbusPdu;
use crate::error::TransportError;

/// Builds request frames and validates response frames for one connection
///
/// Keeps a wrapping transaction counter so a response can be matched to the
/// request that produced it.
#[derive(Debug)]
pub struct MbapFrameCodec {
    next_transaction_id: u16,
    pending: Option<(u16, u8)>,
}

impl Default for MbapFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MbapFrameCodec {
    pub fn new() -> Self {
        Self {
            next_transaction_id: 1,
            pending: None,
        }
    }

    /// Get next transaction ID; wraps from 0xFFFF to 0x0000
    pub fn next_transaction_id(&mut self) -> u16 {
        let id = self.next_transaction_id;
        self.next_transaction_id = self.next_transaction_id.wrapping_add(1);
        id
    }

    /// Build a complete TCP frame and remember it as the pending request
    pub fn build_frame(&mut self, unit_id: u8, pdu: &ModbusPdu) -> Vec<u8> {
        let transaction_id = self.next_transaction_id();
        let length = (pdu.len() + 1) as u16; // PDU length + unit_id

        let mut frame = Vec::with_capacity(MBAP_HEADER_LEN + 1 + pdu.len());
        frame.extend_from_slice(&transaction_id.to_be_bytes());
        frame.extend_from_slice(&0u16.to_be_bytes()); // protocol_id
        frame.extend_from_slice(&length.to_be_bytes());
        frame.push(unit_id);
        frame.extend_from_slice(pdu.as_slice());

        debug!(
            "Building TCP frame: trans_id={:04X}, unit_id={}, FC={:02X}, PDU_len={}",
            transaction_id,
            unit_id,
            pdu.function_code().unwrap_or(0),
            pdu.len()
        );

        self.pending = Some((transaction_id, unit_id));
        frame
    }

    /// Read the MBAP length field and return how many bytes follow the header
    pub fn remaining_len(header: &[u8; MBAP_HEADER_LEN]) -> Result<usize, TransportError> {
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        if length < 2 || length > MAX_MBAP_LENGTH {
            return Err(TransportError::protocol(format!(
                "Invalid TCP frame length: {}",
                length
            )));
        }
        Ok(length)
    }

    /// Parse a complete response frame into (unit id, PDU)
    pub fn parse_frame(&mut self, data: &[u8]) -> Result<(u8, ModbusPdu), TransportError> {
        if data.len() < MBAP_HEADER_LEN + 2 {
            return Err(TransportError::protocol("TCP frame too short"));
        }

        let transaction_id = u16::from_be_bytes([data[0], data[1]]);
        let protocol_id = u16::from_be_bytes([data[2], data[3]]);
        let length = u16::from_be_bytes([data[4], data[5]]) as usize;
        let unit_id = data[6];

        if protocol_id != 0 {
            return Err(TransportError::protocol(format!(
                "Invalid protocol ID: expected 0, got {}",
                protocol_id
            )));
        }

        if data.len() != MBAP_HEADER_LEN + length {
            return Err(TransportError::protocol(format!(
                "Invalid TCP frame length: expected {}, got {}",
                MBAP_HEADER_LEN + length,
                data.len()
            )));
        }

        if let Some((expected_tid, expected_unit)) = self.pending.take() {
            if transaction_id != expected_tid {
                return Err(TransportError::protocol(format!(
                    "Transaction ID mismatch: expected {:04X}, got {:04X}",
                    expected_tid, transaction_id
                )));
            }
            if unit_id != expected_unit {
                return Err(TransportError::protocol(format!(
                    "Unit ID mismatch: expected {}, got {}",
                    expected_unit, unit_id
                )));
            }
        }

        let pdu = ModbusPdu::from_slice(&data[MBAP_HEADER_LEN + 1..])?;
        Ok((unit_id, pdu))
    }
}
