//! Wire protocols spoken by the display controllers

pub mod modbus;
