//! Packet encoder
//!
//! Turns a display value into the exact frame its controller expects. The
//! value is truncated to `max_chars` characters and right-padded with ASCII
//! spaces, so every frame for a display has the same size. No I/O happens
//! here; the same input always yields the same frame.

use crate::display::DisplayProtocol;
use crate::error::EncodingError;
use crate::protocols::modbus::constants::{mbap_frame_size, MODBUS_MAX_WRITE_REGISTERS};

/// Length of the custom protocol's device header
pub const DEVICE_HEADER_LEN: usize = 12;

/// Device header preceding every custom HEX/UTF-16 packet
pub const DEVICE_HEADER: [u8; DEVICE_HEADER_LEN] = [
    0x55, 0xAA, 0x00, 0x00, 0x01, 0x01, 0x00, 0xD9, 0x00, 0x00, 0x00, 0x00,
];

/// Largest payload the single length byte can describe
pub const MAX_CUSTOM_PAYLOAD: usize = u8::MAX as usize;

/// Everything the encoder needs to know about a display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub protocol: DisplayProtocol,
    pub max_chars: usize,
    pub unit_id: u8,
    pub start_register: u16,
    pub header: [u8; DEVICE_HEADER_LEN],
}

/// An encoded frame ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// FC16 write of `registers` starting at `start_register` on `unit_id`
    WriteRegisters {
        unit_id: u8,
        start_register: u16,
        registers: Vec<u16>,
    },
    /// Complete packet written to the socket as-is
    Raw(Vec<u8>),
}

impl Frame {
    /// Payload bytes carried by the frame (register data or the raw packet)
    pub fn payload_bytes(&self) -> Vec<u8> {
        match self {
            Frame::WriteRegisters { registers, .. } => {
                registers.iter().flat_map(|r| r.to_be_bytes()).collect()
            },
            Frame::Raw(bytes) => bytes.clone(),
        }
    }

    /// Bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        match self {
            // FC + address + quantity + byte count + data
            Frame::WriteRegisters { registers, .. } => mbap_frame_size(6 + registers.len() * 2),
            Frame::Raw(bytes) => bytes.len(),
        }
    }

    /// Uppercase hex dump of the payload for debug logs
    pub fn to_hex(&self) -> String {
        common::hex::encode_upper(&self.payload_bytes())
    }
}

/// Truncate to `max_chars` characters and right-pad with spaces
pub fn pad_value(value: Option<&str>, max_chars: usize) -> String {
    let mut padded: String = value.unwrap_or("").chars().take(max_chars).collect();
    let missing = max_chars - padded.chars().count();
    padded.extend(std::iter::repeat(' ').take(missing));
    padded
}

/// Encode a value for one display
///
/// `None` (no data) encodes as an all-space frame.
pub fn encode(value: Option<&str>, params: &EncodeParams) -> Result<Frame, EncodingError> {
    match params.protocol {
        DisplayProtocol::HoldingRegisterAscii => encode_registers(value, params),
        DisplayProtocol::CustomHexUtf16 => encode_custom(value, params),
    }
}

fn encode_registers(value: Option<&str>, params: &EncodeParams) -> Result<Frame, EncodingError> {
    let count = params.max_chars.div_ceil(2);
    if count == 0 || count > MODBUS_MAX_WRITE_REGISTERS {
        return Err(EncodingError::InvalidRegisterCount {
            max_chars: params.max_chars,
            count,
            max: MODBUS_MAX_WRITE_REGISTERS,
        });
    }

    let padded = pad_value(value, params.max_chars);
    let mut codes = Vec::with_capacity(params.max_chars);
    for (position, ch) in padded.chars().enumerate() {
        if !ch.is_ascii() {
            return Err(EncodingError::UnsupportedCharacter {
                ch,
                position,
                protocol: DisplayProtocol::HoldingRegisterAscii.as_str(),
            });
        }
        codes.push(ch as u8);
    }

    // High byte first; an odd trailing character gets a zero low byte
    let registers = codes
        .chunks(2)
        .map(|chunk| {
            let high = u16::from(chunk[0]) << 8;
            let low = chunk.get(1).copied().map(u16::from).unwrap_or(0);
            high | low
        })
        .collect();

    Ok(Frame::WriteRegisters {
        unit_id: params.unit_id,
        start_register: params.start_register,
        registers,
    })
}

fn encode_custom(value: Option<&str>, params: &EncodeParams) -> Result<Frame, EncodingError> {
    let payload_len = params.max_chars * 2;
    if payload_len > MAX_CUSTOM_PAYLOAD {
        return Err(EncodingError::PayloadTooLarge {
            len: payload_len,
            max: MAX_CUSTOM_PAYLOAD,
        });
    }

    let padded = pad_value(value, params.max_chars);
    let mut packet = Vec::with_capacity(DEVICE_HEADER_LEN + 1 + payload_len);
    packet.extend_from_slice(&params.header);
    packet.push(payload_len as u8);

    for (position, ch) in padded.chars().enumerate() {
        let unit = u16::try_from(u32::from(ch)).map_err(|_| {
            EncodingError::UnsupportedCharacter {
                ch,
                position,
                protocol: DisplayProtocol::CustomHexUtf16.as_str(),
            }
        })?;
        packet.extend_from_slice(&unit.to_be_bytes());
    }

    Ok(Frame::Raw(packet))
}

/// Read text back out of registers (high byte, low byte; zero bytes skipped)
pub fn registers_to_text(registers: &[u16]) -> String {
    registers
        .iter()
        .flat_map(|r| r.to_be_bytes())
        .filter(|&b| b != 0)
        .map(char::from)
        .collect()
}
