//! Raw MIDI input events
//!
//! Handlers receive the same five values the host's input routing hands to a
//! controller script: channel, control, value, status and the deck group.
//! The status byte is kept verbatim; the shift and jog touch handlers decide
//! press/release from its high nibble alone.

/// Note Off status nibble
pub const NOTE_OFF: u8 = 0x80;
/// Note On status nibble
pub const NOTE_ON: u8 = 0x90;
/// Control Change status nibble
pub const CONTROL_CHANGE: u8 = 0xB0;

/// One incoming MIDI short message, tagged with the deck group it addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Note or CC number
    pub control: u8,
    /// Velocity or CC value
    pub value: u8,
    /// Full status byte (type nibble + channel)
    pub status: u8,
    /// Host group this event targets, e.g. `[Channel1]`
    pub group: String,
}

impl MidiEvent {
    /// Parse a 3-byte short message
    ///
    /// Only Note Off, Note On and Control Change carry controls on this
    /// device; anything else returns `None`.
    pub fn parse(data: &[u8], group: impl Into<String>) -> Option<Self> {
        let &[status, control, value, ..] = data else {
            return None;
        };
        match status & 0xF0 {
            NOTE_OFF | NOTE_ON | CONTROL_CHANGE => Some(Self {
                channel: status & 0x0F,
                control,
                value,
                status,
                group: group.into(),
            }),
            _ => None,
        }
    }

    /// Status high nibble
    pub fn message_type(&self) -> u8 {
        self.status & 0xF0
    }

    /// True when the status nibble is Note On (velocity is not consulted)
    pub fn is_note_on(&self) -> bool {
        self.message_type() == NOTE_ON
    }
}
