//! Mock ports and canned sensor nodes for integration tests.
//!
//! Records every event and delivery so tests can assert on the full
//! history without a network or flash.

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use sensestack::adapters::sim_bus::{FnSource, SimulatedBus};
use sensestack::app::events::AppEvent;
use sensestack::app::ports::{ConfigError, ConfigPort, DeliveryPort, EventSink};
use sensestack::app::publisher::DeliveryOutcome;
use sensestack::config::NodeConfig;
use sensestack::node::FieldSource;
use sensestack::node::sensors::{CarbonMonoxideNode, ClimateNode, ParticulateNode, UvNode};
use sensestack::protocol::BusAddress;

pub fn addr(raw: u8) -> BusAddress {
    BusAddress::new(raw).unwrap()
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Delivery ──────────────────────────────────────────────────

pub struct RecordingDelivery {
    pub posts: Vec<(String, String)>,
    pub reply: DeliveryOutcome,
}

#[allow(dead_code)]
impl RecordingDelivery {
    pub fn accepting() -> Self {
        Self {
            posts: Vec::new(),
            reply: DeliveryOutcome::new(200, "OK"),
        }
    }

    pub fn failing(code: i32, detail: &str) -> Self {
        Self {
            posts: Vec::new(),
            reply: DeliveryOutcome::new(code, detail),
        }
    }

    pub fn last_json(&self) -> serde_json::Value {
        let (_, body) = self.posts.last().expect("nothing was posted");
        serde_json::from_str(body).expect("posted body is not JSON")
    }
}

impl DeliveryPort for RecordingDelivery {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome {
        self.posts.push((url.to_owned(), body.to_owned()));
        self.reply.clone()
    }
}

// ── Settings store ────────────────────────────────────────────

/// In-memory [`ConfigPort`] that validates like the real store.
#[derive(Default)]
pub struct MemoryStore {
    pub saved: RefCell<Option<NodeConfig>>,
    pub saves: RefCell<u32>,
    pub erased: RefCell<bool>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigPort for MemoryStore {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.fail_writes {
            return Err(ConfigError::IoError);
        }
        *self.saved.borrow_mut() = Some(config.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn erase(&self) -> Result<(), ConfigError> {
        *self.saved.borrow_mut() = None;
        *self.erased.borrow_mut() = true;
        Ok(())
    }
}

// ── Canned nodes ──────────────────────────────────────────────

pub fn climate(temperature_c: f32, humidity_pct: f32) -> ClimateNode {
    let mut node = ClimateNode::new();
    node.record(temperature_c, humidity_pct);
    node
}

pub fn carbon_monoxide(ppm: f32) -> CarbonMonoxideNode {
    let mut node = CarbonMonoxideNode::new();
    node.record(ppm);
    node
}

/// 1890/3300 of the supply: 1.89 V, about 7.5 mW/cm².
pub fn uv() -> UvNode {
    let mut node = UvNode::new();
    node.record_samples(&[1880, 1890, 1900], &[3300, 3300, 3300]);
    node
}

pub fn pms_frame(pm1: u16, pm2_5: u16, pm10: u16) -> [u8; 32] {
    let mut f = [0u8; 32];
    f[..2].copy_from_slice(&[0x42, 0x4D]);
    f[2..4].copy_from_slice(&28u16.to_be_bytes());
    f[4..6].copy_from_slice(&pm1.to_be_bytes());
    f[6..8].copy_from_slice(&pm2_5.to_be_bytes());
    f[8..10].copy_from_slice(&pm10.to_be_bytes());
    let sum = f[..30].iter().fold(0u16, |a, &b| a.wrapping_add(u16::from(b)));
    f[30..].copy_from_slice(&sum.to_be_bytes());
    f
}

pub fn particulate(pm1: u16, pm2_5: u16, pm10: u16) -> ParticulateNode {
    let mut node = ParticulateNode::new();
    node.ingest(&pms_frame(pm1, pm2_5, pm10)).unwrap();
    node
}

/// A node whose reading can be changed while it sits on the bus.
pub fn shared<T: FieldSource + Send + 'static>(node: T) -> (Arc<Mutex<T>>, impl FieldSource + Send) {
    let handle = Arc::new(Mutex::new(node));
    let source = handle.clone();
    (handle, FnSource(move || source.lock().unwrap().fields()))
}

/// The four standard node variants at their well-known addresses.
#[allow(dead_code)]
pub fn standard_bus() -> SimulatedBus {
    let mut bus = SimulatedBus::new();
    bus.attach(addr(11), climate(21.43, 55.2));
    bus.attach(addr(12), particulate(5, 12, 30));
    bus.attach(addr(16), uv());
    bus.attach(addr(17), carbon_monoxide(3.24));
    bus
}
