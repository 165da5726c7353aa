//! Host application protocol
//!
//! The mapping never touches the mixing engine directly. Everything goes
//! through named controls addressed by `(group, key)`, e.g.
//! `("[Channel1]", "play_indicator")`, plus a scratch model per deck and a
//! raw MIDI output for LEDs.

/// Callback invoked with `(value, group, key)` when a connected control changes
pub type ControlCallback = Box<dyn FnMut(f64, &str, &str) + Send>;

/// Opaque handle to a control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u64);

/// Error type for host operations
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Unknown control {group} {key}")]
    UnknownControl { group: String, key: String },

    #[error("Connection {0:?} is not registered")]
    UnknownConnection(ConnectionHandle),
}

/// Control-address interface of the host DJ application
pub trait ControlHost {
    /// Read the current value of a control
    fn get_value(&self, group: &str, key: &str) -> f64;

    /// Write a control value
    fn set_value(&mut self, group: &str, key: &str, value: f64);

    /// Subscribe to value changes of a control
    ///
    /// Fails when the control does not exist.
    fn connect(
        &mut self,
        group: &str,
        key: &str,
        callback: ControlCallback,
    ) -> Result<ConnectionHandle, HostError>;

    /// Invoke a connection's callback once with the control's current value
    fn trigger(&mut self, handle: ConnectionHandle) -> Result<(), HostError>;

    /// Drop a connection
    fn disconnect(&mut self, handle: ConnectionHandle) -> Result<(), HostError>;

    /// Enable the scratch model for a deck (1-based)
    fn scratch_enable(&mut self, deck: u8, resolution: u32, rpm: f64, alpha: f64, beta: f64);

    /// Disable the scratch model for a deck
    fn scratch_disable(&mut self, deck: u8);

    /// Feed a jog wheel movement into an active scratch model
    fn scratch_tick(&mut self, deck: u8, delta: i32);

    /// Whether the scratch model of a deck is active
    fn is_scratching(&self, deck: u8) -> bool;

    /// Resolve a group name to its deck number
    fn deck_from_group(&self, group: &str) -> Option<u8> {
        deck_from_group(group)
    }
}

/// Outbound MIDI short messages (LED feedback)
///
/// Takes `&self` so LED callbacks owned by the host can share one sink.
pub trait MidiSink: Send + Sync {
    fn send_short_msg(&self, status: u8, data1: u8, data2: u8);
}

/// Parse a deck number out of `[ChannelN]`, `[SamplerN]` or `[PreviewDeckN]`
pub fn deck_from_group(group: &str) -> Option<u8> {
    let inner = group.strip_prefix('[')?.strip_suffix(']')?;
    let digits = ["Channel", "Sampler", "PreviewDeck"]
        .iter()
        .find_map(|prefix| inner.strip_prefix(prefix))?;
    digits.parse::<u8>().ok().filter(|deck| *deck > 0)
}

/// Group name of a deck (1-based)
pub fn deck_group(deck: u8) -> String {
    format!("[Channel{}]", deck)
}

/// Group name of an effect unit (1-based)
pub fn fx_unit_group(unit: usize) -> String {
    format!("[EffectRack1_EffectUnit{}]", unit)
}

/// Group name of an effect slot inside a unit (both 1-based)
pub fn fx_effect_group(unit: usize, effect: usize) -> String {
    format!("[EffectRack1_EffectUnit{}_Effect{}]", unit, effect)
}
