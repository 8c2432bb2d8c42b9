//! # Bit-banged PS/2 keyboard driver.
//!
//! Reads scan code set 2 from a keyboard over two open-collector lines
//! (clock, data), tracks which keys are held, applies Shift, Caps Lock and
//! Num Lock, and keeps the keyboard's lock LEDs in step.
//!
//! ```no_run
//! use ps2_keyboard::{Keyboard, SimKeyboard, NoDelay};
//!
//! let (clock, data, kbd) = SimKeyboard::new();
//! let mut keyboard = Keyboard::new(clock, data, NoDelay);
//! keyboard.reset();
//! kbd.send(&[0x12, 0x1C]);
//! assert_eq!(keyboard.poll_next_key_snapshot(), vec!["A"]);
//! ```

pub mod decoder;
pub mod frame;
pub mod keyboard;
pub mod led;
pub mod line;
pub mod scancode;
pub mod shift;
pub mod sim;

pub use decoder::{Decoded, KeyEventDecoder, KeyQueue, Pending};
pub use frame::{FrameError, FrameTransceiver, NotAcknowledged, Timing};
pub use keyboard::Keyboard;
pub use led::{Leds, LockState, led_byte};
pub use line::{Delay, Line, NoDelay, SpinDelay};
pub use scancode::{KeyId, LockKey};
pub use sim::{SimClock, SimData, SimHandle, SimKeyboard};
