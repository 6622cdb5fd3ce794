//! Display transport
//!
//! Opens a fresh TCP connection per send, writes one frame, and closes. For
//! register frames the Modbus write response is read and validated before the
//! send counts as delivered; raw frames are fire-and-forget once written.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::display::DisplayTarget;
use crate::encoder::Frame;
use crate::error::TransportError;
use crate::protocols::modbus::constants::{FC_WRITE_MULTIPLE_REGISTERS, MBAP_HEADER_LEN};
use crate::protocols::modbus::{MbapFrameCodec, ModbusCodec};

/// Default bound on connect, write and each response read
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// Delivers encoded frames to display controllers
#[async_trait]
pub trait DisplayTransport: Send + Sync {
    /// Deliver `frame` to `target`; `Ok` only when the device accepted it
    async fn send(&self, target: &DisplayTarget, frame: &Frame) -> Result<(), TransportError>;
}

/// Connection-per-send TCP transport
#[derive(Debug, Clone)]
pub struct TcpDisplayTransport {
    timeout: Duration,
}

impl Default for TcpDisplayTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

impl TcpDisplayTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn connect(&self, target: &DisplayTarget) -> Result<TcpStream, TransportError> {
        let addr = target.to_string();
        debug!("Connecting to display controller {}", addr);

        match timeout(self.timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY on {}: {}", addr, e);
                }
                Ok(stream)
            },
            Ok(Err(e)) => Err(TransportError::Connect {
                addr,
                reason: e.to_string(),
            }),
            Err(_) => Err(TransportError::Timeout(format!(
                "connect to {} exceeded {:?}",
                addr, self.timeout
            ))),
        }
    }

    async fn write_all(&self, stream: &mut TcpStream, bytes: &[u8]) -> Result<(), TransportError> {
        match timeout(self.timeout, stream.write_all(bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Io(format!("write failed: {}", e))),
            Err(_) => Err(TransportError::Timeout(format!(
                "write exceeded {:?}",
                self.timeout
            ))),
        }
    }

    async fn read_exact(&self, stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), TransportError> {
        match timeout(self.timeout, stream.read_exact(buf)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(
                TransportError::Io("connection closed before a full response arrived".to_string()),
            ),
            Ok(Err(e)) => Err(TransportError::Io(format!("read failed: {}", e))),
            Err(_) => Err(TransportError::Timeout(format!(
                "response exceeded {:?}",
                self.timeout
            ))),
        }
    }

    async fn send_registers(
        &self,
        stream: &mut TcpStream,
        unit_id: u8,
        start_register: u16,
        registers: &[u16],
    ) -> Result<(), TransportError> {
        let pdu = ModbusCodec::build_write_fc16_multiple_registers_pdu(start_register, registers)?;
        let mut frames = MbapFrameCodec::new();
        let request = frames.build_frame(unit_id, &pdu);
        self.write_all(stream, &request).await?;

        let mut header = [0u8; MBAP_HEADER_LEN];
        self.read_exact(stream, &mut header).await?;
        let remaining = MbapFrameCodec::remaining_len(&header)?;

        let mut response = Vec::with_capacity(MBAP_HEADER_LEN + remaining);
        response.extend_from_slice(&header);
        response.resize(MBAP_HEADER_LEN + remaining, 0);
        self.read_exact(stream, &mut response[MBAP_HEADER_LEN..]).await?;

        let (_, response_pdu) = frames.parse_frame(&response)?;
        ModbusCodec::parse_write_response(
            &response_pdu,
            FC_WRITE_MULTIPLE_REGISTERS,
            Some((start_register, registers.len() as u16)),
        )
    }
}

#[async_trait]
impl DisplayTransport for TcpDisplayTransport {
    async fn send(&self, target: &DisplayTarget, frame: &Frame) -> Result<(), TransportError> {
        let mut stream = self.connect(target).await?;

        let result = match frame {
            Frame::WriteRegisters {
                unit_id,
                start_register,
                registers,
            } => {
                self.send_registers(&mut stream, *unit_id, *start_register, registers)
                    .await
            },
            Frame::Raw(bytes) => self.write_all(&mut stream, bytes).await,
        };

        if result.is_ok() {
            debug!(
                hex_data = %frame.to_hex(),
                length = frame.wire_len(),
                direction = "send",
                "Frame delivered to {}",
                target
            );
        }

        // Best effort; the stream is closed on drop either way
        let _ = stream.shutdown().await;
        result
    }
}
