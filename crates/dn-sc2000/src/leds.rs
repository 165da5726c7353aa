//! Hardware address table for the DN-SC2000
//!
//! Every outbound LED message takes its target byte from this table. The
//! controller addresses LEDs per deck: the MIDI channel selects the deck and
//! the third data byte selects the LED.
//!
//! Most pads have a bright and a dim variant. Only the bright variants are
//! driven by the mapping; the dim codes are kept so the table stays a complete
//! picture of the hardware.

/// LED state codes sent as the first data byte of an LED message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedState {
    On = 0x4A,
    Off = 0x4B,
    Blink = 0x4C,
}

impl LedState {
    /// Map a host control value to on/off (any non-zero value is on)
    pub fn from_value(value: f64) -> Self {
        if value != 0.0 {
            Self::On
        } else {
            Self::Off
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Bright/dim LED pair behind a single pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualLed {
    pub bright: u8,
    pub dim: u8,
}

/// LEDs belonging to one effect unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FxUnitLeds {
    /// Unit enabled for the deck
    pub on: u8,
    /// Per-effect LEDs; effect slot `m` (1..=3) lights `cc[m]`, `cc[0]` is not driven
    pub cc: [u8; 4],
}

impl FxUnitLeds {
    /// LED for an effect slot (1-based), `None` outside 1..=3
    pub fn effect(&self, effect: usize) -> Option<u8> {
        if (1..=EFFECTS_PER_UNIT).contains(&effect) {
            Some(self.cc[effect])
        } else {
            None
        }
    }
}

/// Complete LED address table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedTable {
    pub keylock: u8,
    pub sync: u8,
    pub cue: u8,
    pub play: u8,
    /// Hotcue pads 1-8 (index 0 = hotcue 1)
    pub hotcue: [DualLed; HOTCUE_COUNT],
    pub loop_in: DualLed,
    pub loop_out: DualLed,
    pub auto_loop: DualLed,
    /// Effect units 1-2 (index 0 = unit 1)
    pub fx: [FxUnitLeds; FX_UNIT_COUNT],
}

impl LedTable {
    /// Bright LED for a hotcue (1-based), `None` outside 1..=8
    pub fn hotcue_bright(&self, cue: usize) -> Option<u8> {
        cue.checked_sub(1)
            .and_then(|idx| self.hotcue.get(idx))
            .map(|led| led.bright)
    }

    /// LEDs of an effect unit (1-based)
    pub fn fx_unit(&self, unit: usize) -> Option<&FxUnitLeds> {
        unit.checked_sub(1).and_then(|idx| self.fx.get(idx))
    }
}

pub const DECK_COUNT: usize = 2;
pub const HOTCUE_COUNT: usize = 8;
pub const FX_UNIT_COUNT: usize = 2;
pub const EFFECTS_PER_UNIT: usize = 3;

/// Status byte of LED messages for deck 1; deck N uses `LED_STATUS_BASE + N - 1`
pub const LED_STATUS_BASE: u8 = 0xB0;

/// The DN-SC2000 LED map
pub static LEDS: LedTable = LedTable {
    keylock: 0x08,
    sync: 0x09,
    cue: 0x26,
    play: 0x27,
    hotcue: [
        DualLed { bright: 0x11, dim: 0x12 },
        DualLed { bright: 0x13, dim: 0x14 },
        DualLed { bright: 0x15, dim: 0x16 },
        DualLed { bright: 0x17, dim: 0x18 },
        DualLed { bright: 0x19, dim: 0x1A },
        DualLed { bright: 0x1B, dim: 0x1C },
        // 0x1E is skipped on the hardware
        DualLed { bright: 0x1D, dim: 0x1F },
        DualLed { bright: 0x20, dim: 0x21 },
    ],
    loop_in: DualLed { bright: 0x24, dim: 0x3E },
    loop_out: DualLed { bright: 0x40, dim: 0x2A },
    auto_loop: DualLed { bright: 0x2B, dim: 0x53 },
    fx: [
        FxUnitLeds { on: 0x5A, cc: [0x5C, 0x5D, 0x5E, 0x5F] },
        FxUnitLeds { on: 0x5B, cc: [0x60, 0x61, 0x62, 0x63] },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_led_state_codes() {
        assert_eq!(LedState::On.code(), 0x4A);
        assert_eq!(LedState::Off.code(), 0x4B);
        assert_eq!(LedState::Blink.code(), 0x4C);
        assert_eq!(LedState::from_value(1.0), LedState::On);
        assert_eq!(LedState::from_value(0.5), LedState::On);
        assert_eq!(LedState::from_value(0.0), LedState::Off);
    }

    #[test]
    fn test_hotcue_lookup() {
        assert_eq!(LEDS.hotcue_bright(1), Some(0x11));
        assert_eq!(LEDS.hotcue_bright(7), Some(0x1D));
        assert_eq!(LEDS.hotcue_bright(8), Some(0x20));
        assert_eq!(LEDS.hotcue_bright(0), None);
        assert_eq!(LEDS.hotcue_bright(9), None);
    }

    #[test]
    fn test_fx_effect_leds() {
        let unit1 = LEDS.fx_unit(1).unwrap();
        assert_eq!(unit1.effect(1), Some(0x5D));
        assert_eq!(unit1.effect(3), Some(0x5F));
        assert_eq!(unit1.effect(0), None);
        assert_eq!(unit1.effect(4), None);

        let unit2 = LEDS.fx_unit(2).unwrap();
        assert_eq!(unit2.on, 0x5B);
        assert_eq!(unit2.effect(2), Some(0x61));
        assert!(LEDS.fx_unit(3).is_none());
    }

    #[test]
    fn test_driven_addresses_are_distinct() {
        let mut driven = vec![LEDS.keylock, LEDS.sync, LEDS.cue, LEDS.play];
        driven.extend(LEDS.hotcue.iter().map(|led| led.bright));
        driven.extend([LEDS.loop_in.bright, LEDS.loop_out.bright, LEDS.auto_loop.bright]);
        for unit in &LEDS.fx {
            driven.push(unit.on);
            driven.extend(&unit.cc[1..]);
        }
        let unique: HashSet<u8> = driven.iter().copied().collect();
        assert_eq!(unique.len(), driven.len());
    }
}
