//! Denon DN-SC2000 controller mapping
//!
//! This crate provides:
//! - The controller's LED address table
//! - LED feedback: host control changes mirrored onto controller LEDs
//! - Input handlers: shift, hotcues, effect knobs, jog wheels, browse, beat size
//! - An input routing table from raw MIDI to handlers
//! - MIDI device connection via midir
//!
//! # Architecture
//!
//! ```text
//! MIDI Device → midir callback → flume channel → DnSc2000::handle_midi → handlers → ControlHost
//! ControlHost change → LED callback → MidiSink → MIDI Device
//! ```
//!
//! The host DJ application sits behind the [`ControlHost`] trait. The mapping
//! only reads and writes named controls and drives per-deck scratch models.

mod config;
mod connection;
mod feedback;
mod handlers;
mod host;
mod input;
mod leds;
mod memory;
mod routing;
mod shared_state;

pub use config::{
    default_config_path, load_config, save_config, ControllerConfig, ScratchConfig,
    DEFAULT_FX_KNOB_QUANT,
};
pub use connection::{
    matching_port, MidiConnection, MidiConnectionError, MidiInputHandler, MidiOutputSink,
};
pub use feedback::{
    bind_led, bind_leds, deck_bindings, fx_bindings, led_bindings, led_message, unbind_leds,
    LedBinding, LedTarget,
};
pub use handlers::{
    direction_from_value, fx_knob_target, hotcue_number, step_quantized, FxKnobRoute,
    FxKnobTarget, Handler, InputHandlers, FX_KNOB_ROUTES, HOTCUE_PADS_HIGH, HOTCUE_PADS_LOW,
};
pub use host::{
    deck_from_group, deck_group, fx_effect_group, fx_unit_group, ConnectionHandle,
    ControlCallback, ControlHost, HostError, MidiSink,
};
pub use input::MidiEvent;
pub use leds::{DualLed, FxUnitLeds, LedState, LedTable, LEDS};
pub use memory::{MemoryHost, RecordingSink, ScratchParams};
pub use routing::{MessageKind, Route, RoutingTable};
pub use shared_state::ShiftState;

use std::path::Path;
use std::sync::Arc;

/// Error type for controller lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Host rejected LED binding: {0}")]
    HostError(#[from] HostError),

    #[error("MIDI connection error: {0}")]
    ConnectionError(#[from] MidiConnectionError),

    #[error("Controller is already initialized")]
    AlreadyInitialized,
}

/// One DN-SC2000 attached to a host
///
/// Owns the shift state, so several controllers can run side by side.
pub struct DnSc2000 {
    /// Loaded configuration
    config: ControllerConfig,
    /// Input handlers (share the shift state)
    handlers: InputHandlers,
    /// Raw MIDI → handler routing
    routing: RoutingTable,
    /// LED bindings built from the address table
    bindings: Vec<LedBinding>,
    /// Live LED connections (empty until `init`)
    connections: Vec<ConnectionHandle>,
}

impl DnSc2000 {
    pub fn new(config: ControllerConfig) -> Self {
        let handlers = InputHandlers::new(
            Arc::new(ShiftState::new()),
            config.fx_knob_quant,
            config.scratch,
        );
        let routing = RoutingTable::with_defaults(config.routes.clone());
        Self {
            config,
            handlers,
            routing,
            bindings: led_bindings(&LEDS),
            connections: Vec::new(),
        }
    }

    /// Create a controller from a config file (default path when `None`)
    pub fn from_config_path(config_path: Option<&Path>) -> Self {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(default_config_path);
        Self::new(load_config(&config_path))
    }

    /// Connect to the MIDI ports matching the configured `port_match`
    pub fn connect_midi(&self) -> Result<(MidiInputHandler, MidiOutputSink), MappingError> {
        let input = MidiInputHandler::connect(&self.config.port_match)?;
        let output = MidiOutputSink::connect(&self.config.port_match)?;
        log::info!("MIDI: Connected to device matching '{}'", self.config.port_match);
        Ok((input, output))
    }

    /// Bind every LED to its host control and push the current state
    ///
    /// Fails on the first control the host doesn't know; connections made up
    /// to that point are dropped again.
    pub fn init<H: ControlHost + ?Sized>(
        &mut self,
        host: &mut H,
        sink: Arc<dyn MidiSink>,
    ) -> Result<(), MappingError> {
        if !self.connections.is_empty() {
            return Err(MappingError::AlreadyInitialized);
        }

        self.connections = bind_leds(&mut *host, sink, &self.bindings)?;

        log::info!("DN-SC2000: {} LED connections bound", self.connections.len());
        Ok(())
    }

    /// Route and handle one raw MIDI message
    ///
    /// Returns false if no route matched.
    pub fn handle_midi<H: ControlHost + ?Sized>(&self, host: &mut H, data: &[u8]) -> bool {
        self.routing.dispatch(&self.handlers, host, data)
    }

    /// Handle every message waiting on an input handler; returns how many were read
    pub fn process<H: ControlHost + ?Sized>(
        &self,
        host: &mut H,
        input: &MidiInputHandler,
    ) -> usize {
        let mut read = 0;
        for data in input.drain() {
            self.handle_midi(&mut *host, &data);
            read += 1;
        }
        read
    }

    /// Drop LED connections and release shift
    pub fn shutdown<H: ControlHost + ?Sized>(&mut self, host: &mut H) {
        self.disconnect_all(host);
        self.handlers.shift().set_held(false);
        log::info!("DN-SC2000: shut down");
    }

    fn disconnect_all<H: ControlHost + ?Sized>(&mut self, host: &mut H) {
        unbind_leds(host, self.connections.drain(..));
    }

    pub fn is_initialized(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Check if shift is currently held
    pub fn is_shift_held(&self) -> bool {
        self.handlers.shift().is_held()
    }

    pub fn handlers(&self) -> &InputHandlers {
        &self.handlers
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn bindings(&self) -> &[LedBinding] {
        &self.bindings
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl Default for DnSc2000 {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}
