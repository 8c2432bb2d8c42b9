//! Bit-level PS/2 frame transceiver.
//!
//! A frame is 11 bits: a start bit (0), eight data bits LSB first, an odd
//! parity bit and a stop bit (1). The keyboard always generates the clock; the
//! host samples or changes the data line while the clock is low.

use std::fmt;

use tracing::{trace, warn};

use crate::line::{Delay, Line};

/// Microsecond timings and retry counts for the wire protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Settle time after switching line modes, and between acknowledge polls.
    pub settle_us: u32,
    /// Power-up wait and request-to-send clock hold.
    pub hold_us: u32,
    /// How many times to poll the data line for the keyboard's acknowledge.
    pub ack_polls: u32,
}

impl Timing {
    pub const DEFAULT: Timing = Timing {
        settle_us: 10,
        hold_us: 100,
        ack_polls: 100,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The parity bit did not make the frame odd.
    Parity { byte: u8, parity_bit: bool },
    /// The stop bit was 0.
    StopBit { byte: u8 },
    /// No start edge within the poll budget of a bounded read.
    Timeout,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Parity { byte, parity_bit } => write!(
                f,
                "parity error on {byte:02X} (parity bit {})",
                *parity_bit as u8
            ),
            FrameError::StopBit { byte } => write!(f, "missing stop bit after {byte:02X}"),
            FrameError::Timeout => write!(f, "no frame started"),
        }
    }
}

impl std::error::Error for FrameError {}

/// The keyboard never pulled the data line low after a host write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAcknowledged {
    pub command: u8,
}

impl fmt::Display for NotAcknowledged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command {:02X} not acknowledged", self.command)
    }
}

impl std::error::Error for NotAcknowledged {}

/// Owns the clock and data lines exclusively. Every operation busy-waits on
/// line transitions and blocks the caller until the frame is complete.
pub struct FrameTransceiver<C, D, T> {
    clock: C,
    data: D,
    delay: T,
    timing: Timing,
}

impl<C: Line, D: Line, T: Delay> FrameTransceiver<C, D, T> {
    pub fn new(clock: C, data: D, delay: T) -> Self {
        Self::with_timing(clock, data, delay, Timing::DEFAULT)
    }

    pub fn with_timing(mut clock: C, mut data: D, mut delay: T, timing: Timing) -> Self {
        clock.set_input_pull_up();
        data.set_input_pull_up();
        delay.delay_us(timing.hold_us);
        Self {
            clock,
            data,
            delay,
            timing,
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn into_parts(self) -> (C, D, T) {
        (self.clock, self.data, self.delay)
    }

    /// Read one byte from the keyboard, waiting as long as it takes for the
    /// frame to start.
    pub fn read_frame(&mut self) -> Result<u8, FrameError> {
        self.read_frame_inner(None)
    }

    /// Like [`read_frame`](Self::read_frame), but gives up with
    /// [`FrameError::Timeout`] if the clock has not fallen after `idle_polls`
    /// samples. A frame that has started is always read to the end.
    pub fn read_frame_within(&mut self, idle_polls: u32) -> Result<u8, FrameError> {
        self.read_frame_inner(Some(idle_polls))
    }

    fn read_frame_inner(&mut self, idle_polls: Option<u32>) -> Result<u8, FrameError> {
        self.clock.set_input_pull_up();
        self.data.set_input_pull_up();
        self.delay.delay_us(self.timing.settle_us);

        // Start bit: the keyboard pulls the clock low
        let mut polls = 0;
        while self.clock.is_high() {
            if let Some(limit) = idle_polls {
                if polls >= limit {
                    return Err(FrameError::Timeout);
                }
                polls += 1;
            }
            std::hint::spin_loop();
        }

        let mut byte = 0u8;
        let mut parity = false;
        for i in 0..8 {
            let bit = self.next_bit();
            byte |= (bit as u8) << i;
            parity ^= bit;
        }

        let parity_bit = self.next_bit();
        let stop_bit = self.next_bit();

        if parity_bit == parity {
            return Err(FrameError::Parity { byte, parity_bit });
        }
        if !stop_bit {
            return Err(FrameError::StopBit { byte });
        }

        trace!("PS2: read {byte:02X}");
        Ok(byte)
    }

    /// Send one command byte and wait for the keyboard's acknowledge pulse.
    pub fn write_frame(&mut self, command: u8) -> Result<(), NotAcknowledged> {
        trace!("PS2: write {command:02X}");

        // Request to send: hold the clock low, then present the start bit
        self.clock.set_output(false);
        self.delay.delay_us(self.timing.hold_us);
        self.data.set_output(false);
        self.clock.set_input_pull_up();

        let mut parity = true;
        for i in 0..8 {
            let bit = (command >> i) & 1 == 1;
            self.wait_clock_cycle();
            self.data.set_output(bit);
            parity ^= bit;
        }

        self.wait_clock_cycle();
        self.data.set_output(parity);

        self.wait_clock_cycle();
        self.data.set_output(true);

        self.data.set_input_pull_up();

        for _ in 0..self.timing.ack_polls {
            if !self.data.is_high() {
                return Ok(());
            }
            self.delay.delay_us(self.timing.settle_us);
        }

        warn!("PS2: command {command:02X} not acknowledged");
        Err(NotAcknowledged { command })
    }

    /// Wait out one clock period: low → high → low.
    fn wait_clock_cycle(&mut self) {
        while !self.clock.is_high() {
            std::hint::spin_loop();
        }
        while self.clock.is_high() {
            std::hint::spin_loop();
        }
    }

    fn next_bit(&mut self) -> bool {
        self.wait_clock_cycle();
        self.data.is_high()
    }
}
