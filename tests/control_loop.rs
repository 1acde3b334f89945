//! End to end: a small engine exposed through one endpoint.
//!
//! The engine picks its waveform by name from a registry, exposes a
//! checked gain parameter under `/engine/mixer`, streams its state as
//! rendered messages, and reports liveness. A peer writes the gain
//! remotely and the change callback sees it.

use serde_json::{Value, json};
use std::net::UdpSocket as StdSocket;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tether::prelude::*;
use tether_transport::codec::{Datagram, decode, encode};
use tokio::net::UdpSocket;
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(5);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Waveforms, constructed by name
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

trait Waveform: Send + Sync {
    fn label(&self) -> &'static str;
}

struct Sine;
impl Waveform for Sine {
    fn label(&self) -> &'static str {
        "sine"
    }
}

struct Saw;
impl Waveform for Saw {
    fn label(&self) -> &'static str {
        "saw"
    }
}

impl Parsable for dyn Waveform {
    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<dyn Waveform>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut registry = Registry::<dyn Waveform>::for_base();
            registry
                .register::<Sine>("Sine", || Box::new(Sine))
                .and_then(|r| r.register::<Saw>("Saw", || Box::new(Saw)))
                .expect("waveform names are distinct");
            registry
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine state, rendered for the peer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Snapshot {
    gain: Parameter<f64>,
    waveform: Box<dyn Waveform>,
}

impl Renderable for Snapshot {
    fn render(&self) -> Vec<RenderedMessage> {
        vec![
            RenderedMessage::new([json!("gain"), json!(self.gain.get())]),
            RenderedMessage::new([json!("waveform"), json!(self.waveform.label())]),
        ]
    }
}

fn free_port() -> u16 {
    StdSocket::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn drain(listener: &UdpSocket) -> Vec<Datagram> {
    let mut buf = [0_u8; 2048];
    let mut out = Vec::new();
    while let Ok(Ok((len, _))) =
        timeout(Duration::from_millis(200), listener.recv_from(&mut buf)).await
    {
        out.push(decode(&buf[..len]).unwrap());
    }
    out
}

#[tokio::test]
async fn remote_write_reaches_engine_and_liveness_is_reported() {
    let _ = tether::init_logging("tether=debug");

    let config = EndpointConfig::from_json(&format!(
        r#"{{"recv_port": {}, "send_port": {}, "default_address": "/engine",
            "status_interval": 0.05, "handle_interrupt": false}}"#,
        free_port(),
        free_port()
    ))
    .unwrap();
    let listener = UdpSocket::bind(("127.0.0.1", config.send_port)).await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let gain = Parameter::builder("gain", 0.5)
        .type_info(ParamType::Float)
        .range(NumericRange::new(0.0, 1.0))
        .description("master gain")
        .check_range(true)
        .check_type(true)
        .on_change(move |v: &f64| {
            sink.lock().unwrap().push(*v);
            Ok(())
        })
        .build()
        .unwrap();
    let mixer = Arc::new(Node::new("mixer").with(&gain));

    let endpoint = Endpoint::new(config).unwrap();
    let status = StatusService::for_endpoint(&endpoint);
    status.register_default("/engine/mixer", mixer).unwrap();
    status.attach(&endpoint).unwrap();

    let snapshot = Snapshot {
        gain: gain.clone(),
        waveform: <dyn Waveform>::from_name("SAW").unwrap(),
    };
    let to = endpoint.recv_addr();

    timeout(
        LIMIT,
        endpoint.start(|ctx: TaskContext| {
            let seen = Arc::clone(&seen);
            async move {
                let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
                let write = |value: Value| {
                    let args = [json!("set"), json!("/engine/mixer/gain"), value];
                    encode("/engine", &args).unwrap()
                };
                peer.send_to(&write(json!(1.5)), to).await.unwrap();
                peer.send_to(&write(json!(0.8)), to).await.unwrap();

                while seen.lock().unwrap().is_empty()
                    && ctx.sleep(Duration::from_millis(10)).await
                {}
                ctx.sender().send_renderable(&snapshot, None);
                ctx.sleep(Duration::from_millis(60)).await;
                ctx.stop();
            }
        }),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![0.8]);
    assert_eq!(gain.get(), 0.8);

    let received = drain(&listener).await;
    let rendered: Vec<&Datagram> = received.iter().filter(|d| d.address == "/engine").collect();
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].args, vec![json!("gain"), json!(0.8)]);
    assert_eq!(rendered[1].args, vec![json!("waveform"), json!("saw")]);

    let statuses: Vec<Status> = received
        .iter()
        .filter(|d| d.address == "/engine/mixer/status")
        .map(|d| Status::from_code(d.args[0].as_i64().unwrap() as i32))
        .collect();
    assert!(statuses.contains(&Status::Ready));
    assert_eq!(statuses.last(), Some(&Status::Terminated));
}

#[test]
fn waveforms_are_built_by_name() {
    let registry = <dyn Waveform>::registry();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["saw", "sine"]);
    assert_eq!(<dyn Waveform>::from_name("Sine").unwrap().label(), "sine");

    let err = <dyn Waveform>::from_name("square").err().unwrap();
    assert!(matches!(err, ConfigError::UnknownVariant { .. }));
}
