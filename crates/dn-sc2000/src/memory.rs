//! In-process host and MIDI sink
//!
//! `MemoryHost` keeps a flat control store with change connections and
//! per-deck scratch bookkeeping. It lets the mapping run without a DJ
//! application attached (tests, dry runs, replaying captured MIDI).

use crate::host::{ConnectionHandle, ControlCallback, ControlHost, HostError, MidiSink};
use std::collections::HashMap;
use std::sync::Mutex;

/// Scratch model parameters as passed to `scratch_enable`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScratchParams {
    pub resolution: u32,
    pub rpm: f64,
    pub alpha: f64,
    pub beta: f64,
}

struct Connection {
    group: String,
    key: String,
    callback: ControlCallback,
}

/// Control store implementing [`ControlHost`]
#[derive(Default)]
pub struct MemoryHost {
    controls: HashMap<(String, String), f64>,
    connections: HashMap<u64, Connection>,
    next_handle: u64,
    scratching: HashMap<u8, ScratchParams>,
    /// Every `set_value` call in order
    writes: Vec<(String, String, f64)>,
    /// Every `scratch_tick` call in order
    ticks: Vec<(u8, i32)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a control with an initial value (no callbacks fire)
    pub fn define(&mut self, group: &str, key: &str, value: f64) {
        self.controls
            .insert((group.to_string(), key.to_string()), value);
    }

    /// Whether a control exists
    pub fn has_control(&self, group: &str, key: &str) -> bool {
        self.controls
            .contains_key(&(group.to_string(), key.to_string()))
    }

    /// Writes recorded since creation or the last `clear_history`
    pub fn writes(&self) -> &[(String, String, f64)] {
        &self.writes
    }

    /// Scratch ticks recorded since creation or the last `clear_history`
    pub fn ticks(&self) -> &[(u8, i32)] {
        &self.ticks
    }

    /// Scratch parameters of a deck, if its scratch model is active
    pub fn scratch_params(&self, deck: u8) -> Option<ScratchParams> {
        self.scratching.get(&deck).copied()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn clear_history(&mut self) {
        self.writes.clear();
        self.ticks.clear();
    }

    fn notify(&mut self, group: &str, key: &str, value: f64) {
        for conn in self.connections.values_mut() {
            if conn.group == group && conn.key == key {
                (conn.callback)(value, &conn.group, &conn.key);
            }
        }
    }
}

impl ControlHost for MemoryHost {
    fn get_value(&self, group: &str, key: &str) -> f64 {
        match self.controls.get(&(group.to_string(), key.to_string())) {
            Some(value) => *value,
            None => {
                log::warn!("MemoryHost: get_value on unknown control {} {}", group, key);
                0.0
            }
        }
    }

    fn set_value(&mut self, group: &str, key: &str, value: f64) {
        self.writes
            .push((group.to_string(), key.to_string(), value));
        let previous = self
            .controls
            .insert((group.to_string(), key.to_string()), value);
        if previous != Some(value) {
            self.notify(group, key, value);
        }
    }

    fn connect(
        &mut self,
        group: &str,
        key: &str,
        callback: ControlCallback,
    ) -> Result<ConnectionHandle, HostError> {
        if !self.has_control(group, key) {
            return Err(HostError::UnknownControl {
                group: group.to_string(),
                key: key.to_string(),
            });
        }
        let handle = ConnectionHandle(self.next_handle);
        self.next_handle += 1;
        self.connections.insert(
            handle.0,
            Connection {
                group: group.to_string(),
                key: key.to_string(),
                callback,
            },
        );
        Ok(handle)
    }

    fn trigger(&mut self, handle: ConnectionHandle) -> Result<(), HostError> {
        let conn = self
            .connections
            .get_mut(&handle.0)
            .ok_or(HostError::UnknownConnection(handle))?;
        let value = self
            .controls
            .get(&(conn.group.clone(), conn.key.clone()))
            .copied()
            .unwrap_or(0.0);
        (conn.callback)(value, &conn.group, &conn.key);
        Ok(())
    }

    fn disconnect(&mut self, handle: ConnectionHandle) -> Result<(), HostError> {
        self.connections
            .remove(&handle.0)
            .map(|_| ())
            .ok_or(HostError::UnknownConnection(handle))
    }

    fn scratch_enable(&mut self, deck: u8, resolution: u32, rpm: f64, alpha: f64, beta: f64) {
        self.scratching.insert(
            deck,
            ScratchParams {
                resolution,
                rpm,
                alpha,
                beta,
            },
        );
    }

    fn scratch_disable(&mut self, deck: u8) {
        self.scratching.remove(&deck);
    }

    fn scratch_tick(&mut self, deck: u8, delta: i32) {
        self.ticks.push((deck, delta));
    }

    fn is_scratching(&self, deck: u8) -> bool {
        self.scratching.contains_key(&deck)
    }
}

/// MIDI sink that records every message it is asked to send
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<[u8; 3]>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far
    pub fn messages(&self) -> Vec<[u8; 3]> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Return and clear the recorded messages
    pub fn take(&self) -> Vec<[u8; 3]> {
        self.sent
            .lock()
            .map(|mut sent| std::mem::take(&mut *sent))
            .unwrap_or_default()
    }
}

impl MidiSink for RecordingSink {
    fn send_short_msg(&self, status: u8, data1: u8, data2: u8) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push([status, data1, data2]);
        }
    }
}
