//! End-to-end monitor cycles against real sockets

use std::sync::Arc;
use std::time::Duration;

use ledsrv::display::{DisplayProtocol, MAX_MAX_CHARS};
use ledsrv::encoder::{registers_to_text, DEVICE_HEADER};
use ledsrv::error::TransportError;
use ledsrv::transport::DisplayTransport;
use ledsrv::{
    CycleOutcome, DisplayMonitor, DisplayRegistry, EmptyValuePolicy, Frame, MonitorContext,
    TcpDisplayTransport,
};

mod common;
use common::{display_at, ModbusSimulator, RawSink, StaticSource};

struct Fixture {
    _dir: tempfile::TempDir,
    source: Arc<StaticSource>,
    registry: Arc<DisplayRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(DisplayRegistry::new(dir.path().join("config.json")));
        Self {
            _dir: dir,
            source: Arc::new(StaticSource::default()),
            registry,
        }
    }

    fn context(&self) -> MonitorContext {
        MonitorContext {
            source: self.source.clone(),
            transport: Arc::new(TcpDisplayTransport::new(Duration::from_millis(500))),
            registry: self.registry.clone(),
            empty_value: EmptyValuePolicy::Blank,
        }
    }
}

#[tokio::test]
async fn test_register_display_receives_value_once() {
    let (sim, addr) = ModbusSimulator::start().await;
    let fixture = Fixture::new();
    let display = display_at("Line 1", addr, DisplayProtocol::HoldingRegisterAscii);
    fixture.registry.create(display.clone()).await.unwrap();

    let mut monitor = DisplayMonitor::new(display, fixture.context()).unwrap();
    fixture.source.set(Some("A11S-12"));

    assert_eq!(monitor.poll_once().await, CycleOutcome::Sent);
    assert_eq!(monitor.poll_once().await, CycleOutcome::Unchanged);
    assert_eq!(sim.request_count(), 1);

    let registers = sim.registers(0, 10).await;
    assert_eq!(registers[0], 0x4131);
    assert_eq!(registers[9], 0x2020);
    assert_eq!(registers_to_text(&registers), "A11S-12             ");

    let stored = fixture.registry.get("Line 1").await.unwrap();
    assert_eq!(stored.last_value.as_deref(), Some("A11S-12"));
}

#[tokio::test]
async fn test_exception_response_is_not_committed() {
    let (sim, addr) = ModbusSimulator::start().await;
    let fixture = Fixture::new();
    let display = display_at("Line 1", addr, DisplayProtocol::HoldingRegisterAscii);
    fixture.registry.create(display.clone()).await.unwrap();

    let mut monitor = DisplayMonitor::new(display, fixture.context()).unwrap();
    fixture.source.set(Some("U70-19"));

    sim.fail_with_exception(Some(0x02));
    assert_eq!(monitor.poll_once().await, CycleOutcome::SendFailed);
    assert_eq!(monitor.last_value(), None);
    assert_eq!(fixture.registry.get("Line 1").await.unwrap().last_value, None);

    // Same value is retried next cycle
    sim.fail_with_exception(None);
    assert_eq!(monitor.poll_once().await, CycleOutcome::Sent);
    assert_eq!(sim.request_count(), 2);
    assert_eq!(
        fixture.registry.get("Line 1").await.unwrap().last_value.as_deref(),
        Some("U70-19")
    );
}

#[tokio::test]
async fn test_transport_reports_exception_code() {
    let (sim, addr) = ModbusSimulator::start().await;
    sim.fail_with_exception(Some(0x04));

    let target = display_at("x", addr, DisplayProtocol::HoldingRegisterAscii).target();
    let frame = Frame::WriteRegisters {
        unit_id: 1,
        start_register: 0,
        registers: vec![0x4849],
    };
    let err = TcpDisplayTransport::default()
        .send(&target, &frame)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Exception {
            function_code: 0x90,
            code: 0x04
        }
    );
}

#[tokio::test]
async fn test_custom_display_receives_packet() {
    let (sink, addr) = RawSink::start().await;
    let fixture = Fixture::new();
    let mut display = display_at("Line 2", addr, DisplayProtocol::CustomHexUtf16);
    display.max_chars = 4;
    fixture.registry.create(display.clone()).await.unwrap();

    let mut monitor = DisplayMonitor::new(display, fixture.context()).unwrap();
    fixture.source.set(Some("HI"));
    assert_eq!(monitor.poll_once().await, CycleOutcome::Sent);

    let packets = sink.wait_for(1).await;
    let mut expected = DEVICE_HEADER.to_vec();
    expected.push(0x08);
    expected.extend_from_slice(&[0x00, 0x48, 0x00, 0x49, 0x00, 0x20, 0x00, 0x20]);
    assert_eq!(packets, vec![expected]);
}

#[tokio::test]
async fn test_custom_payload_length_bound() {
    let (sink, addr) = RawSink::start().await;
    let fixture = Fixture::new();
    let mut display = display_at("Line 3", addr, DisplayProtocol::CustomHexUtf16);
    display.max_chars = MAX_MAX_CHARS;
    fixture.registry.create(display.clone()).await.unwrap();

    // Widest display the registry accepts goes out whole
    let mut monitor = DisplayMonitor::new(display.clone(), fixture.context()).unwrap();
    fixture.source.set(Some("A11S-12"));
    assert_eq!(monitor.poll_once().await, CycleOutcome::Sent);

    let packets = sink.wait_for(1).await;
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].len(), DEVICE_HEADER.len() + 1 + 2 * MAX_MAX_CHARS);
    assert_eq!(packets[0][DEVICE_HEADER.len()] as usize, 2 * MAX_MAX_CHARS);

    // Past the one-byte length field the encoder refuses to build a frame
    let mut params = display.encode_params().unwrap();
    params.max_chars = 128;
    let err = ledsrv::encode(Some("X"), &params).unwrap_err();
    assert!(err.to_string().contains("Payload too large"));
}

#[tokio::test]
async fn test_unreachable_display_times_out_without_commit() {
    let fixture = Fixture::new();
    // TEST-NET-1 address, never routable
    let display = display_at(
        "Line 1",
        "192.0.2.1:502".parse().unwrap(),
        DisplayProtocol::HoldingRegisterAscii,
    );
    fixture.registry.create(display.clone()).await.unwrap();

    let mut monitor = DisplayMonitor::new(display, fixture.context()).unwrap();
    fixture.source.set(Some("A11S-12"));
    assert_eq!(monitor.poll_once().await, CycleOutcome::SendFailed);
    assert_eq!(fixture.registry.get("Line 1").await.unwrap().last_value, None);
}
