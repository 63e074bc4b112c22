//! 433 MHz code registry and bus bridge.
//!
//! The same bus hosts cheap 433 MHz remote-control devices. Their codes are
//! learned by publishing a JSON code table to two properties:
//!
//! | Property             | Shape                                        |
//! |----------------------|----------------------------------------------|
//! | `sys/433mhz/rx_codes`| `{"path": [code, length], …}`                |
//! | `sys/433mhz/tx_codes`| `{"path": [on_code, off_code, length], …}`   |
//!
//! Received codes that match an rx entry become an event on that entry's
//! path. Codes nobody registered are reported on
//! `sys/433mhz/rx_unknown_code` once they repeat often enough to not be
//! noise. Every tx entry becomes a property whose `true` / `false` value
//! queues the on or off code for transmission.
//!
//! A new table replaces the previous one as a whole. A malformed
//! table is rejected without touching the registry in use.

use core::fmt::Write;
use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde_json::Value;

use crate::app::ports::Publisher;
use crate::error::{self, RegistryError};

/// Minimum interval between events for the same known code (milliseconds).
pub const MIN_INTER_EVENT_MS: u32 = 3000;
/// Successive receipts of an unknown code before it is reported.
pub const UNKNOWN_REPEAT_COUNT: u32 = 4;
/// Shorter unknown codes are assumed to be noise.
pub const UNKNOWN_MIN_LENGTH: u16 = 10;

pub const RX_CODES_TOPIC: &str = "sys/433mhz/rx_codes";
pub const TX_CODES_TOPIC: &str = "sys/433mhz/tx_codes";
pub const RX_UNKNOWN_TOPIC: &str = "sys/433mhz/rx_unknown_code";

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Codes keyed by the bus path they are published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRegistry<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for CodeRegistry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> CodeRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `path`, returning the old one.
    pub fn add(&mut self, path: impl Into<String>, code: T) -> Option<T> {
        self.entries.insert(path.into(), code)
    }

    pub fn get(&self, path: &str) -> Option<&T> {
        self.entries.get(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A code to listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxCode {
    pub code: u32,
    pub length: u16,
}

/// An on/off pair to transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxCode {
    pub on_code: u32,
    pub off_code: u32,
    pub length: u16,
}

impl TxCode {
    pub fn code_for(&self, on: bool) -> u32 {
        if on { self.on_code } else { self.off_code }
    }
}

impl CodeRegistry<RxCode> {
    /// Parse `{"path": [code, length], …}`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (path, [code, length]) in parse_entries::<2>(json)? {
            registry.add(
                path,
                RxCode {
                    code: to_code(code)?,
                    length: to_length(length)?,
                },
            );
        }
        Ok(registry)
    }

    /// Path registered for a received code.
    pub fn lookup(&self, code: u32, length: u16) -> Option<&str> {
        self.iter()
            .find(|(_, rx)| rx.code == code && rx.length == length)
            .map(|(path, _)| path)
    }
}

impl CodeRegistry<TxCode> {
    /// Parse `{"path": [on_code, off_code, length], …}`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (path, [on_code, off_code, length]) in parse_entries::<3>(json)? {
            registry.add(
                path,
                TxCode {
                    on_code: to_code(on_code)?,
                    off_code: to_code(off_code)?,
                    length: to_length(length)?,
                },
            );
        }
        Ok(registry)
    }
}

/// Validate the object shape and pull out `N` unsigned integers per entry.
fn parse_entries<const N: usize>(json: &str) -> Result<Vec<(String, [u64; N])>, RegistryError> {
    let value: Value = serde_json::from_str(json).map_err(|e| {
        warn!("radio: bad JSON in code table: {}", e);
        RegistryError::Malformed
    })?;
    let Value::Object(map) = value else {
        warn!("radio: expected object in code table");
        return Err(RegistryError::ExpectedObject);
    };

    let mut entries = Vec::with_capacity(map.len());
    for (path, entry) in map {
        let numbers = entry
            .as_array()
            .filter(|items| items.len() == N)
            .ok_or(RegistryError::BadEntry)?;
        let mut out = [0u64; N];
        for (slot, item) in out.iter_mut().zip(numbers) {
            *slot = item.as_u64().ok_or(RegistryError::BadEntry)?;
        }
        entries.push((path, out));
    }
    Ok(entries)
}

fn to_code(raw: u64) -> Result<u32, RegistryError> {
    u32::try_from(raw).map_err(|_| RegistryError::BadEntry)
}

fn to_length(raw: u64) -> Result<u16, RegistryError> {
    u16::try_from(raw).map_err(|_| RegistryError::BadEntry)
}

// ───────────────────────────────────────────────────────────────
// Receive side
// ───────────────────────────────────────────────────────────────

/// What a received code means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxEvent {
    /// A registered code; fire the event at this path.
    Known(String),
    /// An unregistered code that kept repeating.
    Unknown { code: u32, length: u16 },
}

impl RxEvent {
    /// `[code,length]` payload for the unknown-code event.
    pub fn unknown_payload(&self) -> Option<heapless::String<24>> {
        let Self::Unknown { code, length } = self else {
            return None;
        };
        let mut payload = heapless::String::new();
        // u32 + u16 + brackets and comma: at most 18 bytes.
        write!(payload, "[{},{}]", code, length).ok()?;
        Some(payload)
    }
}

/// Turns raw receiver output into bus events.
#[derive(Debug, Default)]
pub struct RxDecoder {
    codes: CodeRegistry<RxCode>,
    last_event_ms: BTreeMap<String, u32>,
    last_code: Option<(u32, u16)>,
    repeats: u32,
}

impl RxDecoder {
    pub fn new(codes: CodeRegistry<RxCode>) -> Self {
        Self {
            codes,
            ..Self::default()
        }
    }

    /// Swap in a new registry. Throttling history is forgotten.
    pub fn replace_codes(&mut self, codes: CodeRegistry<RxCode>) {
        self.codes = codes;
        self.last_event_ms.clear();
    }

    pub fn codes(&self) -> &CodeRegistry<RxCode> {
        &self.codes
    }

    /// Feed one received code.
    pub fn on_code(&mut self, now: u32, code: u32, length: u16) -> Option<RxEvent> {
        if self.last_code == Some((code, length)) {
            self.repeats = self.repeats.saturating_add(1);
        } else {
            self.last_code = Some((code, length));
            self.repeats = 1;
        }

        if let Some(path) = self.codes.lookup(code, length) {
            let due = self
                .last_event_ms
                .get(path)
                .is_none_or(|&last| now.wrapping_sub(last) >= MIN_INTER_EVENT_MS);
            if !due {
                return None;
            }
            let path = String::from(path);
            self.last_event_ms.insert(path.clone(), now);
            Some(RxEvent::Known(path))
        } else if self.repeats == UNKNOWN_REPEAT_COUNT && length >= UNKNOWN_MIN_LENGTH {
            Some(RxEvent::Unknown { code, length })
        } else {
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Transmit side
// ───────────────────────────────────────────────────────────────

/// Per-path pending on/off requests.
#[derive(Debug, Default)]
pub struct TxQueue {
    codes: CodeRegistry<TxCode>,
    pending: BTreeMap<String, bool>,
}

impl TxQueue {
    pub fn new(codes: CodeRegistry<TxCode>) -> Self {
        Self {
            codes,
            pending: BTreeMap::new(),
        }
    }

    /// Swap in a new registry, dropping every pending request.
    pub fn replace_codes(&mut self, codes: CodeRegistry<TxCode>) {
        self.codes = codes;
        self.pending.clear();
    }

    pub fn codes(&self) -> &CodeRegistry<TxCode> {
        &self.codes
    }

    /// Queue the code for `path`. Only exact `true` / `false` payloads count.
    pub fn request(&mut self, path: &str, payload: &str) -> bool {
        let on = match payload {
            "true" => true,
            "false" => false,
            _ => return false,
        };
        if self.codes.get(path).is_none() {
            return false;
        }
        self.pending.insert(String::from(path), on);
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take the next request: `(path, code, length)`.
    pub fn next_pending(&mut self) -> Option<(String, u32, u16)> {
        let (path, on) = self.pending.pop_first()?;
        let tx = *self.codes.get(&path)?;
        debug!("radio: tx {} -> {}", path, if on { "on" } else { "off" });
        Some((path, tx.code_for(on), tx.length))
    }
}

// ───────────────────────────────────────────────────────────────
// Bus bridge
// ───────────────────────────────────────────────────────────────

/// Wires the registries to the bus.
#[derive(Debug, Default)]
pub struct RadioBridge {
    rx: RxDecoder,
    tx: TxQueue,
}

impl RadioBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one inbound message. Returns whether the topic belonged here.
    pub fn handle_message(&mut self, topic: &str, payload: &str, publisher: &mut impl Publisher) -> bool {
        match topic {
            RX_CODES_TOPIC => {
                if let Err(e) = self.load_rx_codes(payload) {
                    warn!("radio: rx_codes rejected: {}", e);
                }
                true
            }
            TX_CODES_TOPIC => {
                if let Err(e) = self.load_tx_codes(payload, publisher) {
                    warn!("radio: tx_codes rejected: {}", e);
                }
                true
            }
            path if self.tx.codes().get(path).is_some() => {
                if !self.tx.request(path, payload) {
                    debug!("radio: ignoring {} = {:?}", path, payload);
                }
                true
            }
            _ => false,
        }
    }

    /// Replace the rx table with its JSON form. Returns the number of codes.
    pub fn load_rx_codes(&mut self, json: &str) -> error::Result<usize> {
        let codes = CodeRegistry::<RxCode>::from_json(json)?;
        let n = codes.len();
        info!("radio: {} rx codes registered", n);
        self.rx.replace_codes(codes);
        Ok(n)
    }

    /// Replace the tx table with its JSON form, deleting the old properties
    /// and announcing the new ones. Returns the number of codes.
    pub fn load_tx_codes(&mut self, json: &str, publisher: &mut impl Publisher) -> error::Result<usize> {
        let codes = CodeRegistry::<TxCode>::from_json(json)?;
        for (path, _) in self.tx.codes().iter() {
            publisher.publish(path, "");
        }
        for (path, _) in codes.iter() {
            publisher.publish(path, "null");
        }
        let n = codes.len();
        info!("radio: {} tx codes registered", n);
        self.tx.replace_codes(codes);
        Ok(n)
    }

    /// Feed one code from the receiver and publish what it means.
    pub fn receive(&mut self, now: u32, code: u32, length: u16, publisher: &mut impl Publisher) {
        match self.rx.on_code(now, code, length) {
            Some(RxEvent::Known(path)) => publisher.publish(&path, "null"),
            Some(event) => {
                if let Some(payload) = event.unknown_payload() {
                    publisher.publish(RX_UNKNOWN_TOPIC, &payload);
                }
            }
            None => {}
        }
    }

    /// Next `(code, length)` to hand to the transmitter.
    pub fn next_transmission(&mut self) -> Option<(u32, u16)> {
        self.tx.next_pending().map(|(_, code, length)| (code, length))
    }

    pub fn rx(&self) -> &RxDecoder {
        &self.rx
    }

    pub fn tx(&self) -> &TxQueue {
        &self.tx
    }
}
