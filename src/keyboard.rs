use tracing::debug;

use crate::decoder::{Decoded, KeyEventDecoder, KeyQueue};
use crate::frame::{FrameError, FrameTransceiver, Timing};
use crate::led::{Leds, LockState};
use crate::line::{Delay, Line};

/// A PS/2 keyboard on a clock/data line pair.
///
/// Every operation takes `&mut self` and busy-waits on the lines. To share a
/// keyboard, put the whole value behind one mutex: a key read that triggers
/// an LED update is a single request/response exchange on the wire and must
/// not be interleaved with anything else.
pub struct Keyboard<C, D, T> {
    transceiver: FrameTransceiver<C, D, T>,
    decoder: KeyEventDecoder,
}

impl<C: Line, D: Line, T: Delay> Keyboard<C, D, T> {
    pub fn new(clock: C, data: D, delay: T) -> Self {
        Self::with_timing(clock, data, delay, Timing::DEFAULT)
    }

    pub fn with_timing(clock: C, data: D, delay: T, timing: Timing) -> Self {
        Self {
            transceiver: FrameTransceiver::with_timing(clock, data, delay, timing),
            decoder: KeyEventDecoder::new(),
        }
    }

    /// Release all keys, clear the locks and turn the LEDs off.
    pub fn reset(&mut self) {
        let leds = self.decoder.reset();
        self.push_leds(leds);
    }

    /// Block until a non-modifier key goes down and return every held key, in
    /// press order, after shift and lock processing.
    pub fn poll_next_key_snapshot(&mut self) -> Vec<&'static str> {
        loop {
            match self.transceiver.read_frame() {
                Ok(byte) => {
                    if let Some(snapshot) = self.handle(byte) {
                        return snapshot;
                    }
                }
                Err(err) => debug!("PS2: dropping frame: {err}"),
            }
        }
    }

    /// Like [`poll_next_key_snapshot`](Self::poll_next_key_snapshot), but
    /// returns `None` once the keyboard has been idle for `idle_polls` clock
    /// samples between frames.
    pub fn try_poll_next_key_snapshot(&mut self, idle_polls: u32) -> Option<Vec<&'static str>> {
        loop {
            match self.transceiver.read_frame_within(idle_polls) {
                Ok(byte) => {
                    if let Some(snapshot) = self.handle(byte) {
                        return Some(snapshot);
                    }
                }
                Err(FrameError::Timeout) => return None,
                Err(err) => debug!("PS2: dropping frame: {err}"),
            }
        }
    }

    pub fn locks(&self) -> LockState {
        self.decoder.locks()
    }

    pub fn pressed(&self) -> &KeyQueue {
        self.decoder.queue()
    }

    pub fn into_parts(self) -> (C, D, T) {
        self.transceiver.into_parts()
    }

    fn handle(&mut self, byte: u8) -> Option<Vec<&'static str>> {
        match self.decoder.feed(byte) {
            Decoded::Consumed => None,
            Decoded::LocksChanged(leds) => {
                self.push_leds(leds);
                None
            }
            Decoded::Snapshot(snapshot) => Some(snapshot),
        }
    }

    // Lock state is already updated; a missing acknowledge is only logged.
    fn push_leds(&mut self, leds: Leds) {
        _ = self.transceiver.set_leds(leds);
    }
}
