//! # Scan code stream → pressed-key snapshots.
//!
//! The decoder is fed one byte at a time. Prefix bytes (`F0`, `E0`, `E1`) set
//! flags that qualify the next scan code; a make code adds its key to the
//! queue of held keys and, unless it is a modifier, completes a snapshot; a
//! break code removes the key again.
//!
//! The Pause key sends `E1 14 77 E1 F0 14 F0 77` and never a break code of
//! its own. `E1` opens a synthesized `pause` entry, and the Num Lock break
//! inside the sequence closes it without touching the real Num Lock state.

use bit_set::BitSet;
use tracing::{debug, info, trace, warn};

use crate::led::{Leds, LockState};
use crate::scancode::{self, KeyId, MODIFIER_CODES, opcodes};
use crate::shift;

/// Held keys in press order, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct KeyQueue {
    order: Vec<KeyId>,
    present: BitSet,
}

impl KeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: KeyId) -> bool {
        self.present.contains(key as usize)
    }

    /// Append `key` if it is not already held. Returns whether it was added.
    pub fn push(&mut self, key: KeyId) -> bool {
        if !self.present.insert(key as usize) {
            return false;
        }
        self.order.push(key);
        true
    }

    /// Returns whether `key` was held.
    pub fn remove(&mut self, key: KeyId) -> bool {
        if !self.present.remove(key as usize) {
            return false;
        }
        self.order.retain(|&k| k != key);
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.present.clear();
    }

    pub fn as_slice(&self) -> &[KeyId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Flags set by prefix bytes, cleared once the qualified code is consumed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub release: bool,
    pub extended: bool,
    pub pause: bool,
}

/// What a single byte did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// State may have changed; keep reading.
    Consumed,
    /// A lock key was released; the LEDs need updating.
    LocksChanged(Leds),
    /// A non-modifier key went down. Labels of all held keys in press order.
    Snapshot(Vec<&'static str>),
}

#[derive(Debug, Default)]
pub struct KeyEventDecoder {
    queue: KeyQueue,
    pending: Pending,
    locks: LockState,
}

impl KeyEventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget held keys, prefixes and lock state. Returns the LEDs to send.
    pub fn reset(&mut self) -> Leds {
        self.queue.clear();
        self.pending = Pending::default();
        self.locks = LockState::default();
        self.locks.leds()
    }

    pub fn queue(&self) -> &KeyQueue {
        &self.queue
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn locks(&self) -> LockState {
        self.locks
    }

    pub fn feed(&mut self, byte: u8) -> Decoded {
        match byte {
            opcodes::RELEASE_PREFIX => {
                self.pending.release = true;
                Decoded::Consumed
            }
            opcodes::EXTENDED_PREFIX => {
                self.pending.extended = true;
                Decoded::Consumed
            }
            opcodes::PAUSE_PREFIX => {
                self.pending.pause = true;
                self.queue.push(KeyId::Pause);
                Decoded::Consumed
            }
            opcodes::SELF_TEST_PASSED => {
                info!("PS2: keyboard ready");
                Decoded::Consumed
            }
            opcodes::ACKNOWLEDGE => {
                debug!("PS2: acknowledge");
                Decoded::Consumed
            }
            _ => match scancode::decode(byte) {
                None => {
                    warn!("PS2: unrecognized scan code {byte:02X}");
                    Decoded::Consumed
                }
                Some(key) if self.pending.release => self.release(key),
                Some(key) => self.press(byte, key),
            },
        }
    }

    fn release(&mut self, key: KeyId) -> Decoded {
        trace!("PS2: break {key:?}");
        let decoded = if !self.queue.remove(key) {
            warn!("PS2: {key:?} released but not held, clearing queue");
            self.queue.clear();
            Decoded::Consumed
        } else if key == KeyId::NumLock && self.pending.pause {
            self.pending.pause = false;
            self.queue.remove(KeyId::Pause);
            Decoded::Consumed
        } else if let Some(lock) = key.lock() {
            self.locks.toggle(lock);
            Decoded::LocksChanged(self.locks.leds())
        } else {
            Decoded::Consumed
        };

        self.pending.release = false;
        self.pending.extended = false;
        decoded
    }

    fn press(&mut self, code: u8, key: KeyId) -> Decoded {
        trace!(
            "PS2: make {key:?}{}",
            if self.pending.extended { " (E0)" } else { "" }
        );
        if self.queue.push(key) {
            self.pending.extended = false;
        }

        if MODIFIER_CODES.contains(&code) {
            return Decoded::Consumed;
        }
        Decoded::Snapshot(shift::apply(self.queue.as_slice(), self.locks))
    }
}
