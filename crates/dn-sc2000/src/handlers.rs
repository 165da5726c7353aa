//! Input handlers
//!
//! Each handler interprets one kind of incoming MIDI event and issues
//! control writes (or scratch calls) to the host. Handlers run one at a time
//! on the dispatch thread; the only state they share is the shift flag.
//!
//! Unknown controls, knob ids or groups are ignored.

use crate::config::ScratchConfig;
use crate::host::{fx_effect_group, fx_unit_group, ControlHost};
use crate::input::MidiEvent;
use crate::shared_state::ShiftState;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Group of the library browser
pub const PLAYLIST_GROUP: &str = "[Playlist]";

/// Jog wheel values are centered on this byte
pub const JOG_CENTER: u8 = 0x40;

/// Hotcue pads 1-4
pub const HOTCUE_PADS_LOW: RangeInclusive<u8> = 0x17..=0x1A;
/// Hotcue pads 5-8; the controller skips 0x1B..=0x20 between the two groups
pub const HOTCUE_PADS_HIGH: RangeInclusive<u8> = 0x21..=0x24;

/// Handler selected by the input routing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handler {
    Shift,
    HotCue,
    FxKnob,
    SelectTrack,
    JogTouch,
    JogTurn,
    BeatSize,
}

/// Range of effect knob ids belonging to one effect unit
///
/// The first id is the unit's mix knob, the following ids are its effect
/// slots in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FxKnobRoute {
    pub first: u8,
    pub last: u8,
    pub unit: usize,
}

/// What an effect knob turn adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxKnobTarget {
    /// Dry/wet mix of a unit
    Mix { unit: usize },
    /// Meta knob (or effect selection with shift) of one slot
    Effect { unit: usize, effect: usize },
}

/// Effect knob ids of the DN-SC2000
pub const FX_KNOB_ROUTES: &[FxKnobRoute] = &[
    FxKnobRoute { first: 0x55, last: 0x58, unit: 1 },
    FxKnobRoute { first: 0x59, last: 0x5C, unit: 2 },
];

/// Resolve an effect knob id against a route table
pub fn fx_knob_target(routes: &[FxKnobRoute], knob: u8) -> Option<FxKnobTarget> {
    let route = routes
        .iter()
        .find(|route| (route.first..=route.last).contains(&knob))?;
    let offset = (knob - route.first) as usize;
    Some(if offset == 0 {
        FxKnobTarget::Mix { unit: route.unit }
    } else {
        FxKnobTarget::Effect {
            unit: route.unit,
            effect: offset,
        }
    })
}

/// Map a hotcue pad control to its cue number (1-8)
///
/// The two pad groups use different offsets; anything that doesn't land
/// on 1..=8 is not a hotcue pad.
pub fn hotcue_number(control: u8) -> Option<u8> {
    let offset = if control < 0x20 { 0x16 } else { 0x1C };
    control
        .checked_sub(offset)
        .filter(|cue| (1..=8).contains(cue))
}

/// Encoder direction from the value byte: 0 is clockwise, anything else counter-clockwise
pub fn direction_from_value(value: u8) -> i32 {
    if value == 0 {
        1
    } else {
        -1
    }
}

/// Step a unit-range parameter by whole detents of `1 / quant`
///
/// Returns `None` when the step would leave `0..=1`; the value is then left
/// alone rather than pinned to the boundary.
pub fn step_quantized(value: f64, quant: u32, direction: i32) -> Option<f64> {
    let quant = quant.max(1) as i64;
    let step = (value * quant as f64).floor() as i64 + direction as i64;
    if (0..=quant).contains(&step) {
        Some(step as f64 / quant as f64)
    } else {
        None
    }
}

/// Stateful input handlers for one controller instance
#[derive(Debug, Clone)]
pub struct InputHandlers {
    shift: Arc<ShiftState>,
    fx_knob_quant: u32,
    scratch: ScratchConfig,
    fx_knobs: Vec<FxKnobRoute>,
}

impl InputHandlers {
    pub fn new(shift: Arc<ShiftState>, fx_knob_quant: u32, scratch: ScratchConfig) -> Self {
        Self {
            shift,
            fx_knob_quant,
            scratch,
            fx_knobs: FX_KNOB_ROUTES.to_vec(),
        }
    }

    /// Replace the effect knob table (for controller variants)
    pub fn with_fx_knobs(mut self, routes: Vec<FxKnobRoute>) -> Self {
        self.fx_knobs = routes;
        self
    }

    pub fn shift(&self) -> &Arc<ShiftState> {
        &self.shift
    }

    /// Run the handler selected by the routing table
    pub fn dispatch<H: ControlHost + ?Sized>(
        &self,
        handler: Handler,
        host: &mut H,
        event: &MidiEvent,
    ) {
        match handler {
            Handler::Shift => self.handle_shift(event),
            Handler::HotCue => self.handle_hotcue(host, event),
            Handler::FxKnob => self.handle_fx_knob(host, event),
            Handler::SelectTrack => self.handle_select_track(host, event),
            Handler::JogTouch => self.handle_jog_touch(host, event),
            Handler::JogTurn => self.handle_jog_turn(host, event),
            Handler::BeatSize => self.handle_beat_size(host, event),
        }
    }

    /// Shift is held exactly while the last shift event was a Note On
    pub fn handle_shift(&self, event: &MidiEvent) {
        let held = event.is_note_on();
        self.shift.set_held(held);
        log::debug!("[MIDI IN] -> Shift {}", if held { "pressed" } else { "released" });
    }

    /// Activate a hotcue, or clear it while shift is held
    pub fn handle_hotcue<H: ControlHost + ?Sized>(&self, host: &mut H, event: &MidiEvent) {
        let Some(cue) = hotcue_number(event.control) else {
            log::trace!("[MIDI IN] -> control {:#04x} is not a hotcue pad", event.control);
            return;
        };
        let action = if self.shift.is_held() { "clear" } else { "activate" };
        let key = format!("hotcue_{}_{}", cue, action);
        log::debug!("[MIDI IN] -> {} {} = {}", event.group, key, event.value);
        host.set_value(&event.group, &key, event.value as f64);
    }

    /// Nudge a unit-range parameter one detent up or down
    pub fn handle_fx_value<H: ControlHost + ?Sized>(
        &self,
        host: &mut H,
        group: &str,
        param: &str,
        direction: i32,
    ) {
        let current = host.get_value(group, param);
        match step_quantized(current, self.fx_knob_quant, direction) {
            Some(value) => host.set_value(group, param, value),
            None => log::trace!("[MIDI IN] -> {} {} at limit ({})", group, param, current),
        }
    }

    /// Select the next or previous effect in a slot
    pub fn handle_fx_select<H: ControlHost + ?Sized>(
        &self,
        host: &mut H,
        group: &str,
        direction: i32,
    ) {
        let key = if direction > 0 { "next_effect" } else { "prev_effect" };
        host.set_value(group, key, 1.0);
    }

    /// Effect slot knob: meta parameter, or effect selection with shift
    pub fn handle_fx_shift<H: ControlHost + ?Sized>(
        &self,
        host: &mut H,
        group: &str,
        direction: i32,
    ) {
        if self.shift.is_held() {
            self.handle_fx_select(host, group, direction);
        } else {
            self.handle_fx_value(host, group, "meta", direction);
        }
    }

    /// Effect knob turn; the knob id is the control byte, the direction the value byte
    pub fn handle_fx_knob<H: ControlHost + ?Sized>(&self, host: &mut H, event: &MidiEvent) {
        self.fx_knob(host, event.control, direction_from_value(event.value));
    }

    /// Apply one detent of an effect knob
    pub fn fx_knob<H: ControlHost + ?Sized>(&self, host: &mut H, knob: u8, direction: i32) {
        match fx_knob_target(&self.fx_knobs, knob) {
            Some(FxKnobTarget::Mix { unit }) => {
                self.handle_fx_value(host, &fx_unit_group(unit), "mix", direction);
            }
            Some(FxKnobTarget::Effect { unit, effect }) => {
                self.handle_fx_shift(host, &fx_effect_group(unit, effect), direction);
            }
            None => log::trace!("[MIDI IN] -> unknown effect knob {:#04x}", knob),
        }
    }

    /// Browse encoder: value 0 selects the next track, anything else the previous one
    pub fn handle_select_track<H: ControlHost + ?Sized>(&self, host: &mut H, event: &MidiEvent) {
        let key = if event.value == 0 {
            "SelectNextTrack"
        } else {
            "SelectPrevTrack"
        };
        host.set_value(PLAYLIST_GROUP, key, 1.0);
    }

    /// Touching the platter enables scratching, releasing it disables
    pub fn handle_jog_touch<H: ControlHost + ?Sized>(&self, host: &mut H, event: &MidiEvent) {
        let Some(deck) = host.deck_from_group(&event.group) else {
            log::trace!("[MIDI IN] -> jog touch for non-deck group {}", event.group);
            return;
        };
        if event.is_note_on() {
            let s = &self.scratch;
            host.scratch_enable(deck, s.resolution, s.rpm, s.alpha, s.beta);
            log::debug!("[MIDI IN] -> Scratch enabled on deck {}", deck);
        } else {
            host.scratch_disable(deck);
            log::debug!("[MIDI IN] -> Scratch disabled on deck {}", deck);
        }
    }

    /// Platter turn: scratch tick while scratching, otherwise a jog nudge
    pub fn handle_jog_turn<H: ControlHost + ?Sized>(&self, host: &mut H, event: &MidiEvent) {
        let Some(deck) = host.deck_from_group(&event.group) else {
            log::trace!("[MIDI IN] -> jog turn for non-deck group {}", event.group);
            return;
        };
        let delta = event.value as i32 - JOG_CENTER as i32;
        if host.is_scratching(deck) {
            host.scratch_tick(deck, delta);
        } else {
            host.set_value(&event.group, "jog", delta as f64);
        }
    }

    /// Double (value 0) or halve the loop size, or the beatjump size with shift
    pub fn handle_beat_size<H: ControlHost + ?Sized>(&self, host: &mut H, event: &MidiEvent) {
        let key = if self.shift.is_held() {
            "beatjump_size"
        } else {
            "beatloop_size"
        };
        let size = host.get_value(&event.group, key);
        let size = if event.value == 0 { size * 2.0 } else { size / 2.0 };
        log::debug!("[MIDI IN] -> {} {} = {}", event.group, key, size);
        host.set_value(&event.group, key, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use std::collections::HashSet;

    fn handlers() -> InputHandlers {
        InputHandlers::new(Arc::new(ShiftState::new()), 32, ScratchConfig::default())
    }

    fn event(status: u8, control: u8, value: u8, group: &str) -> MidiEvent {
        MidiEvent::parse(&[status, control, value], group).unwrap()
    }

    fn last_write(host: &MemoryHost) -> (String, String, f64) {
        host.writes().last().cloned().expect("no writes")
    }

    #[test]
    fn test_hotcue_numbers_cover_one_to_eight() {
        let cues: Vec<u8> = HOTCUE_PADS_LOW
            .chain(HOTCUE_PADS_HIGH)
            .map(|control| hotcue_number(control).unwrap())
            .collect();
        assert_eq!(cues, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let unique: HashSet<u8> = cues.iter().copied().collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_hotcue_number_offsets() {
        assert_eq!(hotcue_number(0x17), Some(1));
        assert_eq!(hotcue_number(0x1A), Some(4));
        assert_eq!(hotcue_number(0x21), Some(5));
        assert_eq!(hotcue_number(0x24), Some(8));
        // Below 0x20 the low offset applies even past pad 4
        assert_eq!(hotcue_number(0x1D), Some(7));
        // 0x20 is not a pad but the high offset still maps it onto cue 4
        assert_eq!(hotcue_number(0x20), Some(4));
        assert_eq!(hotcue_number(0x16), None);
        assert_eq!(hotcue_number(0x25), None);
        assert_eq!(hotcue_number(0x00), None);
    }

    #[test]
    fn test_shift_follows_status_nibble() {
        let h = handlers();
        for (status, held) in [
            (0x90, true),
            (0x80, false),
            (0x91, true),
            (0x90, true),
            (0x81, false),
        ] {
            h.handle_shift(&event(status, 0x60, 0x7F, "[Channel1]"));
            assert_eq!(h.shift().is_held(), held);
        }
        // Note On with velocity 0 still counts as held
        h.handle_shift(&event(0x90, 0x60, 0x00, "[Channel1]"));
        assert!(h.shift().is_held());
    }

    #[test]
    fn test_hotcue_activate_and_clear() {
        let h = handlers();
        let mut host = MemoryHost::new();

        h.handle_hotcue(&mut host, &event(0x90, 0x18, 0x7F, "[Channel1]"));
        assert_eq!(
            last_write(&host),
            ("[Channel1]".to_string(), "hotcue_2_activate".to_string(), 127.0)
        );

        h.handle_hotcue(&mut host, &event(0x80, 0x18, 0x00, "[Channel1]"));
        assert_eq!(last_write(&host).2, 0.0);

        h.shift().set_held(true);
        h.handle_hotcue(&mut host, &event(0x91, 0x22, 0x7F, "[Channel2]"));
        assert_eq!(
            last_write(&host),
            ("[Channel2]".to_string(), "hotcue_6_clear".to_string(), 127.0)
        );
    }

    #[test]
    fn test_hotcue_ignores_non_pad_controls() {
        let h = handlers();
        let mut host = MemoryHost::new();
        h.handle_hotcue(&mut host, &event(0x90, 0x30, 0x7F, "[Channel1]"));
        assert!(host.writes().is_empty());
    }

    #[test]
    fn test_fx_value_steps_to_upper_limit() {
        let h = handlers();
        let mut host = MemoryHost::new();
        let group = "[EffectRack1_EffectUnit1]";
        host.define(group, "mix", 0.5);

        for _ in 0..16 {
            h.handle_fx_value(&mut host, group, "mix", 1);
        }
        assert_eq!(host.get_value(group, "mix"), 1.0);

        h.handle_fx_value(&mut host, group, "mix", 1);
        assert_eq!(host.get_value(group, "mix"), 1.0);
        assert_eq!(host.writes().len(), 16);
    }

    #[test]
    fn test_fx_value_rejects_below_zero() {
        let h = handlers();
        let mut host = MemoryHost::new();
        let group = "[EffectRack1_EffectUnit1_Effect1]";
        host.define(group, "meta", 0.0);

        h.handle_fx_value(&mut host, group, "meta", -1);
        assert_eq!(host.get_value(group, "meta"), 0.0);
        assert!(host.writes().is_empty());
    }

    #[test]
    fn test_step_quantized_snaps_to_grid() {
        // 0.51 sits inside detent 16, one step up lands on 17/32
        assert_eq!(step_quantized(0.51, 32, 1), Some(17.0 / 32.0));
        assert_eq!(step_quantized(0.51, 32, -1), Some(15.0 / 32.0));
        assert_eq!(step_quantized(1.0, 32, 1), None);
        assert_eq!(step_quantized(1.0, 32, -1), Some(31.0 / 32.0));
    }

    #[test]
    fn test_fx_knob_table() {
        assert_eq!(fx_knob_target(FX_KNOB_ROUTES, 0x55), Some(FxKnobTarget::Mix { unit: 1 }));
        assert_eq!(
            fx_knob_target(FX_KNOB_ROUTES, 0x57),
            Some(FxKnobTarget::Effect { unit: 1, effect: 2 })
        );
        assert_eq!(fx_knob_target(FX_KNOB_ROUTES, 0x59), Some(FxKnobTarget::Mix { unit: 2 }));
        assert_eq!(
            fx_knob_target(FX_KNOB_ROUTES, 0x5C),
            Some(FxKnobTarget::Effect { unit: 2, effect: 3 })
        );
        assert_eq!(fx_knob_target(FX_KNOB_ROUTES, 0x54), None);
        assert_eq!(fx_knob_target(FX_KNOB_ROUTES, 0x5D), None);
    }

    #[test]
    fn test_fx_knob_mix_and_meta() {
        let h = handlers();
        let mut host = MemoryHost::new();
        host.define("[EffectRack1_EffectUnit2]", "mix", 0.0);
        host.define("[EffectRack1_EffectUnit2_Effect1]", "meta", 0.5);

        // Value byte 0 = clockwise
        h.handle_fx_knob(&mut host, &event(0xB0, 0x59, 0x00, "[Channel1]"));
        assert_eq!(host.get_value("[EffectRack1_EffectUnit2]", "mix"), 1.0 / 32.0);

        // Any other value byte = counter-clockwise
        h.handle_fx_knob(&mut host, &event(0xB0, 0x5A, 0x7F, "[Channel1]"));
        assert_eq!(host.get_value("[EffectRack1_EffectUnit2_Effect1]", "meta"), 15.0 / 32.0);
    }

    #[test]
    fn test_fx_knob_with_shift_selects_effect() {
        let h = handlers();
        let mut host = MemoryHost::new();
        h.shift().set_held(true);

        h.handle_fx_knob(&mut host, &event(0xB0, 0x56, 0x00, "[Channel1]"));
        assert_eq!(
            last_write(&host),
            ("[EffectRack1_EffectUnit1_Effect1]".to_string(), "next_effect".to_string(), 1.0)
        );

        h.handle_fx_knob(&mut host, &event(0xB0, 0x58, 0x01, "[Channel1]"));
        assert_eq!(
            last_write(&host),
            ("[EffectRack1_EffectUnit1_Effect3]".to_string(), "prev_effect".to_string(), 1.0)
        );

        // Mix knob ignores shift
        host.define("[EffectRack1_EffectUnit1]", "mix", 0.0);
        h.handle_fx_knob(&mut host, &event(0xB0, 0x55, 0x00, "[Channel1]"));
        assert_eq!(host.get_value("[EffectRack1_EffectUnit1]", "mix"), 1.0 / 32.0);
    }

    #[test]
    fn test_unknown_fx_knob_is_ignored() {
        let h = handlers();
        let mut host = MemoryHost::new();
        h.fx_knob(&mut host, 0x40, 1);
        assert!(host.writes().is_empty());
    }

    #[test]
    fn test_select_track() {
        let h = handlers();
        let mut host = MemoryHost::new();
        h.handle_select_track(&mut host, &event(0xB0, 0x54, 0x00, "[Channel1]"));
        assert_eq!(
            last_write(&host),
            ("[Playlist]".to_string(), "SelectNextTrack".to_string(), 1.0)
        );
        h.handle_select_track(&mut host, &event(0xB0, 0x54, 0x7F, "[Channel1]"));
        assert_eq!(last_write(&host).1, "SelectPrevTrack");
    }

    #[test]
    fn test_jog_touch_enables_and_disables_scratch() {
        let h = handlers();
        let mut host = MemoryHost::new();

        h.handle_jog_touch(&mut host, &event(0x91, 0x51, 0x7F, "[Channel2]"));
        let params = host.scratch_params(2).expect("scratch enabled");
        assert_eq!(params.resolution, 2250);
        assert!((params.rpm - (33.0 + 1.0 / 3.0)).abs() < 1e-9);
        assert_eq!(params.alpha, 0.125);
        assert_eq!(params.beta, 0.125 / 32.0);
        assert!(!host.is_scratching(1));

        h.handle_jog_touch(&mut host, &event(0x81, 0x51, 0x00, "[Channel2]"));
        assert!(!host.is_scratching(2));
    }

    #[test]
    fn test_jog_turn_ticks_or_nudges() {
        let h = handlers();
        let mut host = MemoryHost::new();

        h.handle_jog_turn(&mut host, &event(0xB0, 0x51, 0x43, "[Channel1]"));
        assert_eq!(last_write(&host), ("[Channel1]".to_string(), "jog".to_string(), 3.0));
        assert!(host.ticks().is_empty());

        h.handle_jog_touch(&mut host, &event(0x90, 0x52, 0x7F, "[Channel1]"));
        h.handle_jog_turn(&mut host, &event(0xB0, 0x51, 0x3E, "[Channel1]"));
        assert_eq!(host.ticks(), &[(1, -2)]);
        assert_eq!(host.writes().len(), 1);
    }

    #[test]
    fn test_jog_ignores_non_deck_groups() {
        let h = handlers();
        let mut host = MemoryHost::new();
        h.handle_jog_touch(&mut host, &event(0x90, 0x52, 0x7F, "[Master]"));
        h.handle_jog_turn(&mut host, &event(0xB0, 0x51, 0x41, "[Master]"));
        assert!(host.writes().is_empty());
        assert!(host.ticks().is_empty());
    }

    #[test]
    fn test_beat_size() {
        let h = handlers();
        let mut host = MemoryHost::new();
        host.define("[Channel1]", "beatloop_size", 1.0);
        host.define("[Channel1]", "beatjump_size", 4.0);

        h.handle_beat_size(&mut host, &event(0xB0, 0x56, 0x00, "[Channel1]"));
        assert_eq!(host.get_value("[Channel1]", "beatloop_size"), 2.0);

        h.handle_beat_size(&mut host, &event(0xB0, 0x56, 0x7F, "[Channel1]"));
        assert_eq!(host.get_value("[Channel1]", "beatloop_size"), 1.0);

        h.shift().set_held(true);
        h.handle_beat_size(&mut host, &event(0xB0, 0x56, 0x7F, "[Channel1]"));
        assert_eq!(host.get_value("[Channel1]", "beatjump_size"), 2.0);
        assert_eq!(host.get_value("[Channel1]", "beatloop_size"), 1.0);
    }
}
