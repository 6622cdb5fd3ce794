//! Modbus TCP pieces needed to push text into holding registers
//!
//! Only FC16 (Write Multiple Registers) is issued; responses are validated
//! for MBAP consistency and exception codes.

pub mod codec;
pub mod constants;
pub mod frame;
pub mod pdu;

pub use codec::ModbusCodec;
pub use frame::MbapFrameCodec;
pub use pdu::{ModbusPdu, PduBuilder};
