//! Lock state and the keyboard's status LEDs.

use std::fmt;

use tracing::debug;

use crate::frame::{FrameTransceiver, NotAcknowledged};
use crate::line::{Delay, Line};
use crate::scancode::{LockKey, opcodes};

/// The LED parameter byte sent after `ED`:
/// - Bit 2 (0x04): Caps Lock
/// - Bit 1 (0x02): Num Lock
/// - Bit 0 (0x01): Scroll Lock
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Leds(u8);

impl Leds {
    pub const OFF: Leds = Leds(0);

    pub fn new(byte: u8) -> Self {
        Leds(byte & 0x07)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_scroll(&self) -> bool {
        self.0 & 0x01 == 0x01
    }

    pub fn is_num(&self) -> bool {
        self.0 & 0x02 == 0x02
    }

    pub fn is_caps(&self) -> bool {
        self.0 & 0x04 == 0x04
    }
}

impl fmt::Debug for Leds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leds({:02X}=", self.0)?;
        let mut first = true;
        for led in [
            ("Scroll", self.is_scroll()),
            ("Num", self.is_num()),
            ("Caps", self.is_caps()),
        ] {
            if led.1 {
                if first {
                    first = false;
                } else {
                    write!(f, "+")?;
                }
                write!(f, "{}", led.0)?;
            }
        }
        write!(f, ")")?;
        Ok(())
    }
}

pub fn led_byte(scroll: bool, num: bool, caps: bool) -> u8 {
    (scroll as u8) | ((num as u8) << 1) | ((caps as u8) << 2)
}

/// Persistent lock flags, changed only by releasing the matching lock key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockState {
    pub scroll: bool,
    pub num: bool,
    pub caps: bool,
}

impl LockState {
    pub fn toggle(&mut self, key: LockKey) {
        match key {
            LockKey::Scroll => self.scroll = !self.scroll,
            LockKey::Num => self.num = !self.num,
            LockKey::Caps => self.caps = !self.caps,
        }
    }

    pub fn leds(&self) -> Leds {
        Leds(led_byte(self.scroll, self.num, self.caps))
    }
}

impl<C: Line, D: Line, T: Delay> FrameTransceiver<C, D, T> {
    /// Send `ED` and the LED byte. Both writes are attempted even if the first
    /// goes unacknowledged; the first failure is returned.
    pub fn set_leds(&mut self, leds: Leds) -> Result<(), NotAcknowledged> {
        debug!("PS2: setting {leds:?}");
        let command = self.write_frame(opcodes::SET_LEDS);
        let value = self.write_frame(leds.bits());
        command.and(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Timing;
    use crate::line::NoDelay;
    use crate::sim::SimKeyboard;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, false, 0b000)]
    #[case(true, false, false, 0b001)]
    #[case(false, true, false, 0b010)]
    #[case(false, false, true, 0b100)]
    #[case(true, false, true, 0b101)]
    #[case(true, true, true, 0b111)]
    fn test_led_byte(
        #[case] scroll: bool,
        #[case] num: bool,
        #[case] caps: bool,
        #[case] byte: u8,
    ) {
        assert_eq!(led_byte(scroll, num, caps), byte);
        let locks = LockState { scroll, num, caps };
        assert_eq!(locks.leds().bits(), byte);
    }

    #[test]
    fn test_toggle() {
        let mut locks = LockState::default();
        locks.toggle(LockKey::Caps);
        assert_eq!(locks.leds(), Leds::new(0x04));
        locks.toggle(LockKey::Num);
        locks.toggle(LockKey::Caps);
        assert_eq!(
            locks,
            LockState {
                scroll: false,
                num: true,
                caps: false
            }
        );
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Leds::new(0x05)), "Leds(05=Scroll+Caps)");
        assert_eq!(format!("{:?}", Leds::OFF), "Leds(00=)");
    }

    #[test]
    fn test_set_leds_on_wire() {
        let (clock, data, kbd) = SimKeyboard::new();
        let mut xcvr = FrameTransceiver::new(clock, data, NoDelay);

        assert_eq!(xcvr.set_leds(Leds::new(0b101)), Ok(()));
        assert_eq!(kbd.received(), vec![0xED, 0x05]);
    }

    #[test]
    fn test_set_leds_not_acknowledged() {
        let (clock, data, kbd) = SimKeyboard::new();
        kbd.set_acknowledge(false);
        let mut xcvr = FrameTransceiver::new(clock, data, NoDelay);

        assert_eq!(
            xcvr.set_leds(Leds::new(0x02)),
            Err(NotAcknowledged { command: 0xED })
        );
        // The value byte was still clocked out
        assert_eq!(kbd.frames_in(), 2);
        assert_eq!(kbd.ack_polls(), Timing::DEFAULT.ack_polls as usize);
    }
}
