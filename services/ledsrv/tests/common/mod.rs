//! Shared fixtures for integration tests
//!
//! - `ModbusSimulator`: in-process Modbus TCP server answering FC16 writes
//! - `RawSink`: TCP listener recording every byte stream it receives
//! - `StaticSource`: data source returning a settable value

#![allow(dead_code)]
#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ledsrv::datasource::DataSource;
use ledsrv::display::{DisplayConfig, DisplayProtocol};
use ledsrv::error::DataSourceError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;

/// Simple Modbus TCP simulator for register displays
#[derive(Default)]
pub struct ModbusSimulator {
    holding_registers: RwLock<HashMap<u16, u16>>,
    /// Answer every request with this exception code instead of writing
    exception: Mutex<Option<u8>>,
    requests: Mutex<usize>,
}

impl ModbusSimulator {
    /// Start listening on an ephemeral local port
    pub async fn start() -> (Arc<Self>, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sim = Arc::new(Self::default());

        let server = Arc::clone(&sim);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let sim = Arc::clone(&server);
                tokio::spawn(async move {
                    let _ = sim.handle_connection(stream).await;
                });
            }
        });

        (sim, addr)
    }

    pub fn fail_with_exception(&self, code: Option<u8>) {
        *self.exception.lock().unwrap() = code;
    }

    pub fn request_count(&self) -> usize {
        *self.requests.lock().unwrap()
    }

    /// Registers `start..start+count` as currently stored
    pub async fn registers(&self, start: u16, count: u16) -> Vec<u16> {
        let holding = self.holding_registers.read().await;
        (0..count)
            .map(|i| holding.get(&(start + i)).copied().unwrap_or(0))
            .collect()
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> std::io::Result<()> {
        loop {
            let mut header = [0u8; 6];
            if stream.read_exact(&mut header).await.is_err() {
                return Ok(()); // Connection closed
            }
            let transaction_id = u16::from_be_bytes([header[0], header[1]]);
            let length = u16::from_be_bytes([header[4], header[5]]) as usize;

            let mut body = vec![0u8; length];
            stream.read_exact(&mut body).await?;
            *self.requests.lock().unwrap() += 1;

            let unit_id = body[0];
            let function_code = body[1];
            let exception = *self.exception.lock().unwrap();

            let response = match (function_code, exception) {
                (_, Some(code)) => build_exception(transaction_id, unit_id, function_code, code),
                (0x10, None) => self.write_multiple_registers(transaction_id, unit_id, &body[2..]).await,
                _ => build_exception(transaction_id, unit_id, function_code, 0x01),
            };
            stream.write_all(&response).await?;
        }
    }

    /// Write multiple registers (Function 0x10)
    async fn write_multiple_registers(&self, tid: u16, uid: u8, data: &[u8]) -> Vec<u8> {
        let start = u16::from_be_bytes([data[0], data[1]]);
        let count = u16::from_be_bytes([data[2], data[3]]);

        let mut holding = self.holding_registers.write().await;
        for i in 0..count {
            let offset = 5 + i as usize * 2;
            let value = u16::from_be_bytes([data[offset], data[offset + 1]]);
            holding.insert(start + i, value);
        }

        let mut response = Vec::new();
        response.extend_from_slice(&tid.to_be_bytes());
        response.extend_from_slice(&[0x00, 0x00]); // Protocol ID
        response.extend_from_slice(&6u16.to_be_bytes()); // Length
        response.push(uid);
        response.push(0x10);
        response.extend_from_slice(&start.to_be_bytes());
        response.extend_from_slice(&count.to_be_bytes());
        response
    }
}

fn build_exception(tid: u16, uid: u8, func: u8, exception: u8) -> Vec<u8> {
    let mut response = Vec::new();
    response.extend_from_slice(&tid.to_be_bytes());
    response.extend_from_slice(&[0x00, 0x00]); // Protocol ID
    response.extend_from_slice(&3u16.to_be_bytes()); // Length
    response.push(uid);
    response.push(func | 0x80); // Set error bit
    response.push(exception);
    response
}

/// Records each accepted connection's full byte stream
#[derive(Default)]
pub struct RawSink {
    packets: Mutex<Vec<Vec<u8>>>,
}

impl RawSink {
    pub async fn start() -> (Arc<Self>, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sink = Arc::new(Self::default());

        let server = Arc::clone(&sink);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let sink = Arc::clone(&server);
                tokio::spawn(async move {
                    let mut packet = Vec::new();
                    if stream.read_to_end(&mut packet).await.is_ok() {
                        sink.packets.lock().unwrap().push(packet);
                    }
                });
            }
        });

        (sink, addr)
    }

    pub fn packets(&self) -> Vec<Vec<u8>> {
        self.packets.lock().unwrap().clone()
    }

    /// Wait until at least `count` packets arrived
    pub async fn wait_for(&self, count: usize) -> Vec<Vec<u8>> {
        for _ in 0..100 {
            let packets = self.packets();
            if packets.len() >= count {
                return packets;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.packets()
    }
}

/// Data source returning whatever was last set
#[derive(Default)]
pub struct StaticSource {
    value: Mutex<Option<String>>,
}

impl StaticSource {
    pub fn set(&self, value: Option<&str>) {
        *self.value.lock().unwrap() = value.map(str::to_string);
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch_scalar(&self, _query: &str) -> Result<Option<String>, DataSourceError> {
        Ok(self.value.lock().unwrap().clone())
    }
}

/// Display pointing at a local test endpoint
pub fn display_at(name: &str, addr: SocketAddr, protocol: DisplayProtocol) -> DisplayConfig {
    DisplayConfig {
        name: name.to_string(),
        host: addr.ip().to_string(),
        port: Some(addr.port()),
        protocol,
        query: "SELECT TOP 1 masp FROM view_scada".to_string(),
        poll_interval_secs: 5,
        unit_id: 1,
        start_register: 0,
        max_chars: 20,
        header: None,
        last_value: None,
    }
}
