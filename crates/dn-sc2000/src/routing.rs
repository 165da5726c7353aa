//! Input routing table
//!
//! Decides which handler receives an incoming MIDI message, based on the
//! message type, channel and control number. The deck group handed to the
//! handler follows the channel (channel 0 → `[Channel1]`) unless the route
//! names a group explicitly.

use crate::handlers::{Handler, InputHandlers, HOTCUE_PADS_HIGH, HOTCUE_PADS_LOW};
use crate::host::{deck_group, ControlHost};
use crate::input::{MidiEvent, CONTROL_CHANGE, NOTE_OFF, NOTE_ON};
use crate::leds::DECK_COUNT;
use serde::{Deserialize, Serialize};

/// MIDI message type a route listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Note On and Note Off
    Note,
    ControlChange,
}

impl MessageKind {
    pub fn matches(self, status: u8) -> bool {
        match self {
            Self::Note => matches!(status & 0xF0, NOTE_ON | NOTE_OFF),
            Self::ControlChange => status & 0xF0 == CONTROL_CHANGE,
        }
    }
}

/// One routing rule: a range of controls on a channel bound to a handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub message: MessageKind,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// First control number (inclusive)
    pub first: u8,
    /// Last control number (inclusive)
    pub last: u8,
    pub handler: Handler,
    /// Group override; defaults to the deck of the channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Route {
    pub fn new(message: MessageKind, channel: u8, first: u8, last: u8, handler: Handler) -> Self {
        Self {
            message,
            channel,
            first,
            last,
            handler,
            group: None,
        }
    }

    /// Check if a status/control pair falls under this route
    pub fn matches(&self, status: u8, control: u8) -> bool {
        self.message.matches(status)
            && status & 0x0F == self.channel
            && (self.first..=self.last).contains(&control)
    }

    /// Group passed to the handler
    pub fn group(&self) -> String {
        self.group
            .clone()
            .unwrap_or_else(|| deck_group(self.channel + 1))
    }
}

/// Ordered set of routes; the first match wins
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Built-in routes followed by `extra`
    pub fn with_defaults(extra: Vec<Route>) -> Self {
        let mut routes = Self::default_routes();
        routes.extend(extra);
        Self::new(routes)
    }

    /// Routes fixed by the controller's layout: hotcue pads and effect knobs on each deck channel
    pub fn default_routes() -> Vec<Route> {
        let mut routes = Vec::new();
        for channel in 0..DECK_COUNT as u8 {
            for pads in [HOTCUE_PADS_LOW, HOTCUE_PADS_HIGH] {
                routes.push(Route::new(
                    MessageKind::Note,
                    channel,
                    *pads.start(),
                    *pads.end(),
                    Handler::HotCue,
                ));
            }
            routes.push(Route::new(
                MessageKind::ControlChange,
                channel,
                0x55,
                0x5C,
                Handler::FxKnob,
            ));
        }
        routes
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the handler for a raw message and build its event
    pub fn resolve(&self, data: &[u8]) -> Option<(Handler, MidiEvent)> {
        let (&status, rest) = data.split_first()?;
        let control = *rest.first()?;
        let route = self
            .routes
            .iter()
            .find(|route| route.matches(status, control))?;
        let event = MidiEvent::parse(data, route.group())?;
        Some((route.handler, event))
    }

    /// Route a raw message to its handler
    ///
    /// Returns false if no route matched; the message is then dropped.
    pub fn dispatch<H: ControlHost + ?Sized>(
        &self,
        handlers: &InputHandlers,
        host: &mut H,
        data: &[u8],
    ) -> bool {
        match self.resolve(data) {
            Some((handler, event)) => {
                log::trace!("[MIDI IN] {:02x?} -> {:?}", data, handler);
                handlers.dispatch(handler, host, &event);
                true
            }
            None => {
                log::trace!("[MIDI IN] {:02x?} -> (no route)", data);
                false
            }
        }
    }
}
