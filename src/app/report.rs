//! Sensor records and the merged report.
//!
//! Wire form of a [`Report`]:
//!
//! ```json
//! {
//!   "uuid": "…", "name": "…", "lat": "52.1", "long": "4.3",
//!   "data": { "temperature": "21.4 c", "humidity": "55 %" }
//! }
//! ```
//!
//! `data` is flat: every node's fields share one map.  Records are kept
//! per node internally, so nothing from one node leaks into another's
//! record; the flattening only happens on serialization.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::protocol::BusAddress;

// ───────────────────────────────────────────────────────────────
// SensorRecord
// ───────────────────────────────────────────────────────────────

/// Key → value readings collected from one node in one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SensorRecord(BTreeMap<String, String>);

impl SensorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reading.  A repeated key overwrites; the old value is
    /// returned.
    pub fn insert(&mut self, key: &str, value: &str) -> Option<String> {
        self.0.insert(key.to_owned(), value.to_owned())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// NodeIdentity
// ───────────────────────────────────────────────────────────────

/// Who is reporting.  Latitude and longitude are carried as entered by
/// the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub name: String,
    pub uuid: String,
    pub latitude: String,
    pub longitude: String,
}

// ───────────────────────────────────────────────────────────────
// Report
// ───────────────────────────────────────────────────────────────

/// One polling cycle's merged output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    identity: NodeIdentity,
    /// Per-node records, in roster order.
    nodes: Vec<(BusAddress, SensorRecord)>,
}

impl Report {
    pub fn new(identity: NodeIdentity) -> Self {
        Self {
            identity,
            nodes: Vec::new(),
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Attach a node's record.  Keys already published by an earlier
    /// node are logged; the later node wins in the flattened `data` map.
    pub fn insert(&mut self, address: BusAddress, record: SensorRecord) {
        for (key, _) in record.iter() {
            let earlier = self
                .nodes
                .iter()
                .find(|(a, r)| *a != address && r.get(key).is_some());
            if let Some((other, _)) = earlier {
                warn!(
                    "Report: key '{}' from {} shadows the same key from {}",
                    key, address, other
                );
            }
        }
        match self.nodes.iter_mut().find(|(a, _)| *a == address) {
            Some((_, existing)) => *existing = record,
            None => self.nodes.push((address, record)),
        }
    }

    pub fn record(&self, address: BusAddress) -> Option<&SensorRecord> {
        self.nodes.iter().find(|(a, _)| *a == address).map(|(_, r)| r)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (BusAddress, &SensorRecord)> {
        self.nodes.iter().map(|(a, r)| (*a, r))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn field_count(&self) -> usize {
        self.nodes.iter().map(|(_, r)| r.len()).sum()
    }

    /// All readings in one map, later nodes overriding earlier ones.
    pub fn flattened(&self) -> BTreeMap<&str, &str> {
        let mut data = BTreeMap::new();
        for (_, record) in &self.nodes {
            for (key, value) in record.iter() {
                data.insert(key, value);
            }
        }
        data
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Borrowed wire layout.
#[derive(Serialize)]
struct WireReport<'a> {
    uuid: &'a str,
    name: &'a str,
    lat: &'a str,
    long: &'a str,
    data: BTreeMap<&'a str, &'a str>,
}

impl Serialize for Report {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireReport {
            uuid: &self.identity.uuid,
            name: &self.identity.name,
            lat: &self.identity.latitude,
            long: &self.identity.longitude,
            data: self.flattened(),
        }
        .serialize(serializer)
    }
}
