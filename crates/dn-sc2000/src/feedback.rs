//! LED feedback binding
//!
//! Builds one [`LedBinding`] per (host control, LED) pair from the address
//! table and connects them all the same way: subscribe, then push the
//! current value once so the LEDs are correct right after startup.
//!
//! ```text
//! host control change → callback(value) → [0xB0 + deck - 1, on|off, led] → MidiSink
//! ```

use crate::host::{
    deck_group, fx_effect_group, fx_unit_group, ConnectionHandle, ControlHost, HostError,
    MidiSink,
};
use crate::leds::{
    LedState, LedTable, DECK_COUNT, EFFECTS_PER_UNIT, FX_UNIT_COUNT, HOTCUE_COUNT, LED_STATUS_BASE,
};
use std::sync::Arc;

/// Which deck(s) an LED update is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedTarget {
    /// A single deck (1-based)
    Deck(u8),
    /// Every deck; effect slots are shared by both decks
    AllDecks,
}

/// One host control mirrored onto one LED
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedBinding {
    pub group: String,
    pub key: String,
    pub led: u8,
    pub target: LedTarget,
}

impl LedBinding {
    fn new(group: String, key: impl Into<String>, led: u8, target: LedTarget) -> Self {
        Self {
            group,
            key: key.into(),
            led,
            target,
        }
    }

    /// Decks this binding sends to
    pub fn decks(&self) -> Vec<u8> {
        match self.target {
            LedTarget::Deck(deck) => vec![deck],
            LedTarget::AllDecks => (1..=DECK_COUNT as u8).collect(),
        }
    }
}

/// Build an LED message for a deck
pub fn led_message(value: f64, deck: u8, led: u8) -> [u8; 3] {
    [
        LED_STATUS_BASE + deck - 1,
        LedState::from_value(value).code(),
        led,
    ]
}

/// Bindings for one deck, in startup order
pub fn deck_bindings(table: &LedTable, deck: u8) -> Vec<LedBinding> {
    let group = deck_group(deck);
    let target = LedTarget::Deck(deck);

    let mut bindings = vec![
        LedBinding::new(group.clone(), "play_indicator", table.play, target),
        LedBinding::new(group.clone(), "cue_indicator", table.cue, target),
        LedBinding::new(group.clone(), "sync_enabled", table.sync, target),
        LedBinding::new(group.clone(), "keylock", table.keylock, target),
    ];

    // Effect unit assignment lives on the unit, keyed by the deck's group
    for (idx, unit) in table.fx.iter().enumerate() {
        bindings.push(LedBinding::new(
            fx_unit_group(idx + 1),
            format!("group_{}_enable", group),
            unit.on,
            target,
        ));
    }

    bindings.push(LedBinding::new(group.clone(), "loop_in", table.loop_in.bright, target));
    bindings.push(LedBinding::new(group.clone(), "loop_out", table.loop_out.bright, target));
    bindings.push(LedBinding::new(
        group.clone(),
        "loop_enabled",
        table.auto_loop.bright,
        target,
    ));

    for (idx, cue) in table.hotcue.iter().enumerate() {
        bindings.push(LedBinding::new(
            group.clone(),
            format!("hotcue_{}_enabled", idx + 1),
            cue.bright,
            target,
        ));
    }

    bindings
}

/// Bindings for the effect slots of one unit (1-based)
pub fn fx_bindings(table: &LedTable, unit: usize) -> Vec<LedBinding> {
    let Some(leds) = table.fx_unit(unit) else {
        return Vec::new();
    };
    (1..=EFFECTS_PER_UNIT)
        .filter_map(|effect| {
            leds.effect(effect).map(|led| {
                LedBinding::new(
                    fx_effect_group(unit, effect),
                    "enabled",
                    led,
                    LedTarget::AllDecks,
                )
            })
        })
        .collect()
}

/// Every LED binding of the controller: decks first, then effect slots
pub fn led_bindings(table: &LedTable) -> Vec<LedBinding> {
    let mut bindings = Vec::with_capacity(DECK_COUNT * (9 + HOTCUE_COUNT) + FX_UNIT_COUNT * 3);
    for deck in 1..=DECK_COUNT as u8 {
        bindings.extend(deck_bindings(table, deck));
    }
    for unit in 1..=FX_UNIT_COUNT {
        bindings.extend(fx_bindings(table, unit));
    }
    bindings
}

/// Connect a single binding and push the control's current value
pub fn bind_led<H: ControlHost + ?Sized>(
    host: &mut H,
    sink: Arc<dyn MidiSink>,
    binding: &LedBinding,
) -> Result<ConnectionHandle, HostError> {
    let decks = binding.decks();
    let led = binding.led;
    let handle = host.connect(
        &binding.group,
        &binding.key,
        Box::new(move |value, group, key| {
            for &deck in &decks {
                let [status, state, led] = led_message(value, deck, led);
                log::trace!(
                    "[MIDI OUT] {} {} = {} -> {:#04x} {:#04x} {:#04x}",
                    group, key, value, status, state, led
                );
                sink.send_short_msg(status, state, led);
            }
        }),
    )?;
    host.trigger(handle)?;
    Ok(handle)
}

/// Connect all bindings, stopping at the first control the host doesn't know
///
/// On failure every connection made so far is disconnected again, so the
/// host is left without LED callbacks.
pub fn bind_leds<H: ControlHost + ?Sized>(
    host: &mut H,
    sink: Arc<dyn MidiSink>,
    bindings: &[LedBinding],
) -> Result<Vec<ConnectionHandle>, HostError> {
    let mut handles = Vec::with_capacity(bindings.len());
    for binding in bindings {
        match bind_led(&mut *host, sink.clone(), binding) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                log::warn!("LED feedback: {} {} failed: {}", binding.group, binding.key, e);
                unbind_leds(&mut *host, handles);
                return Err(e);
            }
        }
    }
    log::debug!("LED feedback: {} connections bound", handles.len());
    Ok(handles)
}

/// Disconnect LED connections; stale handles are logged and skipped
pub fn unbind_leds<H: ControlHost + ?Sized>(
    host: &mut H,
    handles: impl IntoIterator<Item = ConnectionHandle>,
) {
    for handle in handles {
        if let Err(e) = host.disconnect(handle) {
            log::debug!("LED feedback: {}", e);
        }
    }
}
