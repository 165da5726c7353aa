//! MIDI port discovery and connection
//!
//! Uses midir for cross-platform MIDI I/O (ALSA on Linux, CoreMIDI on macOS, WinMM on Windows).
//!
//! The midir input callback runs on the driver thread. It only forwards raw
//! bytes over a flume channel; the handlers run on whichever thread drains
//! that channel, one message at a time.

use crate::host::MidiSink;
use flume::{Receiver, Sender};
use midir::{
    MidiIO, MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection,
};
use std::sync::Mutex;

/// Error type for MIDI connection operations
#[derive(Debug, thiserror::Error)]
pub enum MidiConnectionError {
    #[error("Failed to initialize MIDI input: {0}")]
    InputInitError(String),

    #[error("Failed to initialize MIDI output: {0}")]
    OutputInitError(String),

    #[error("No MIDI input ports available")]
    NoInputPorts,

    #[error("No MIDI port found matching pattern: {0}")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI port: {0}")]
    ConnectionError(String),

    #[error("Failed to get port info: {0}")]
    PortInfoError(String),
}

/// Index of the first port name containing `port_match` (case-insensitive)
pub fn matching_port(names: &[String], port_match: &str) -> Option<usize> {
    let pattern = port_match.to_lowercase();
    names
        .iter()
        .position(|name| name.to_lowercase().contains(&pattern))
}

/// Find the port matching `port_match` on either side of midir
///
/// When nothing matches, the available port names are logged so the user
/// can fix `port_match` in the config.
fn find_port<T: MidiIO>(io: &T, port_match: &str) -> Result<T::Port, MidiConnectionError> {
    let ports = io.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|port| io.port_name(port).unwrap_or_default())
        .collect();

    let Some(idx) = matching_port(&names, port_match) else {
        log::warn!(
            "MIDI: No port matching '{}' (available: [{}])",
            port_match,
            names.join(", ")
        );
        return Err(MidiConnectionError::PortNotFound(port_match.to_string()));
    };

    log::info!("MIDI: Found port: {}", names[idx]);
    ports
        .into_iter()
        .nth(idx)
        .ok_or_else(|| MidiConnectionError::PortInfoError(names[idx].clone()))
}

/// Port lookup helpers
pub struct MidiConnection;

impl MidiConnection {
    /// Find an input port whose name contains `port_match` (case-insensitive)
    pub fn find_input_port(
        port_match: &str,
    ) -> Result<(MidiInput, MidiInputPort), MidiConnectionError> {
        let midi_in = MidiInput::new("dn-sc2000-in")
            .map_err(|e| MidiConnectionError::InputInitError(e.to_string()))?;

        if midi_in.port_count() == 0 {
            return Err(MidiConnectionError::NoInputPorts);
        }

        let input_port = find_port(&midi_in, port_match)?;
        Ok((midi_in, input_port))
    }

    /// Connect to the first output port whose name contains `port_match`
    pub fn connect_output(port_match: &str) -> Result<MidiOutputConnection, MidiConnectionError> {
        let midi_out = MidiOutput::new("dn-sc2000-out")
            .map_err(|e| MidiConnectionError::OutputInitError(e.to_string()))?;

        let output_port = find_port(&midi_out, port_match)?;
        midi_out
            .connect(&output_port, "dn-sc2000-output")
            .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))
    }
}

/// LED output through a midir connection
pub struct MidiOutputSink {
    connection: Mutex<MidiOutputConnection>,
}

impl MidiOutputSink {
    pub fn new(connection: MidiOutputConnection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    /// Connect to the output port matching `port_match`
    pub fn connect(port_match: &str) -> Result<Self, MidiConnectionError> {
        MidiConnection::connect_output(port_match).map(Self::new)
    }
}

impl MidiSink for MidiOutputSink {
    fn send_short_msg(&self, status: u8, data1: u8, data2: u8) {
        let Ok(mut connection) = self.connection.lock() else {
            log::warn!("MIDI output: connection lock poisoned");
            return;
        };
        log::trace!("[MIDI OUT] {:#04x} {:#04x} {:#04x}", status, data1, data2);
        if let Err(e) = connection.send(&[status, data1, data2]) {
            log::warn!("MIDI output: Failed to send message: {}", e);
        }
    }
}

/// Owns the midir input connection and the receiving end of the bridge
pub struct MidiInputHandler {
    /// The midir connection (kept alive for the duration)
    _connection: MidiInputConnection<Sender<Vec<u8>>>,
    rx: Receiver<Vec<u8>>,
}

impl MidiInputHandler {
    /// Connect to the input port matching `port_match`
    pub fn connect(port_match: &str) -> Result<Self, MidiConnectionError> {
        let (midi_in, port) = MidiConnection::find_input_port(port_match)?;
        let (tx, rx) = flume::bounded(256);

        let connection = midi_in
            .connect(&port, "dn-sc2000-input", Self::midi_callback, tx)
            .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))?;

        log::info!("MIDI: Input handler connected");

        Ok(Self {
            _connection: connection,
            rx,
        })
    }

    /// Called from the MIDI driver thread; must not block
    fn midi_callback(_timestamp: u64, data: &[u8], tx: &mut Sender<Vec<u8>>) {
        log::trace!("[MIDI IN] {:02x?}", data);
        if tx.try_send(data.to_vec()).is_err() {
            log::warn!("MIDI: Input channel full, dropping message");
        }
    }

    /// Drain all pending raw messages (non-blocking)
    pub fn drain(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        std::iter::from_fn(|| self.rx.try_recv().ok())
    }
}
