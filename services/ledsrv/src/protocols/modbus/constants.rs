//! Modbus protocol constants from the Modbus Application Protocol v1.1b3
//!
//! - Maximum PDU size: 253 bytes (inherited from RS485 ADU limit of 256 bytes)
//! - Register limits are calculated to fit within the PDU size constraint

/// Modbus MBAP header length for TCP, excluding the unit id
/// Format: Transaction ID(2) + Protocol ID(2) + Length(2)
pub const MBAP_HEADER_LEN: usize = 6;

/// Maximum PDU (Protocol Data Unit) size
/// RS485 ADU (256 bytes) - Slave Address (1 byte) - CRC (2 bytes) = 253 bytes
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum MBAP length field value (Unit ID + PDU)
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

/// Largest complete Modbus TCP frame
pub const MAX_FRAME_SIZE: usize = MBAP_HEADER_LEN + MAX_MBAP_LENGTH;

/// Default Modbus TCP port
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Function code for Write Multiple Registers
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Maximum number of registers for FC16 (Write Multiple Registers)
///
/// Request PDU: FC(1) + Start(2) + Quantity(2) + Byte Count(1) + N × 2 ≤ 253
/// Therefore: N ≤ (253 - 6) / 2 = 123.5 → 123 registers
pub const MODBUS_MAX_WRITE_REGISTERS: usize = 123;

/// Calculate total Modbus TCP frame size (MBAP header + unit id + PDU)
#[inline]
pub const fn mbap_frame_size(pdu_len: usize) -> usize {
    MBAP_HEADER_LEN + 1 + pdu_len
}
