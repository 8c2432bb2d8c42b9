//! In-process PS/2 keyboard on a simulated clock/data pair.
//!
//! The device advances half a clock period every time the host samples the
//! clock line, so the transceiver's busy-wait loops drive the simulation
//! directly and no real time passes. Pair it with [`NoDelay`].
//!
//! Device → host: queued frames are shifted out one bit per falling edge.
//! Host → device: the device watches for request-to-send (clock held low,
//! data low, clock released), clocks in ten bits, checks parity and stop, and
//! acknowledges by holding data low until the host touches a line again.
//!
//! [`NoDelay`]: crate::line::NoDelay

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use crate::line::Line;
use crate::scancode::opcodes;

/// Encode `byte` as an 11-bit frame: start, 8 data bits LSB first, odd parity, stop.
pub fn frame_bits(byte: u8) -> [bool; 11] {
    let mut bits = [false; 11];
    for i in 0..8 {
        bits[1 + i] = (byte >> i) & 1 == 1;
    }
    bits[9] = byte.count_ones().is_multiple_of(2);
    bits[10] = true;
    bits
}

struct Receive {
    edges: usize,
    bits: [bool; 10],
}

pub struct SimKeyboard {
    outbound: VecDeque<[bool; 11]>,
    frame: VecDeque<bool>,
    clock_high: bool,
    data_out: bool,

    host_clock: Option<bool>,
    host_data: Option<bool>,
    request_to_send: bool,
    rx: Option<Receive>,

    ack_low: bool,
    awaiting_ack: bool,
    ack_polls: usize,

    frames_in: usize,
    received: Vec<u8>,
    rejected: usize,
    acknowledge: bool,
    ack_reply: bool,
}

impl SimKeyboard {
    /// Create a keyboard and return its clock line, data line and a handle for
    /// scripting it.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (SimClock, SimData, SimHandle) {
        let state = Rc::new(RefCell::new(SimKeyboard {
            outbound: VecDeque::new(),
            frame: VecDeque::new(),
            clock_high: true,
            data_out: true,
            host_clock: None,
            host_data: None,
            request_to_send: false,
            rx: None,
            ack_low: false,
            awaiting_ack: false,
            ack_polls: 0,
            frames_in: 0,
            received: Vec::new(),
            rejected: 0,
            acknowledge: true,
            ack_reply: true,
        }));
        (
            SimClock(state.clone()),
            SimData(state.clone()),
            SimHandle(state),
        )
    }

    fn clear_ack(&mut self) {
        self.ack_low = false;
        self.awaiting_ack = false;
    }

    fn sample_clock(&mut self) -> bool {
        if let Some(level) = self.host_clock {
            return level;
        }

        if let Some(rx) = &mut self.rx {
            self.clock_high = !self.clock_high;
            if !self.clock_high {
                rx.edges += 1;
            }
            return self.clock_high;
        }

        if !self.clock_high {
            self.clock_high = true;
            return true;
        }

        if self.frame.is_empty() {
            let Some(bits) = self.outbound.pop_front() else {
                return true;
            };
            self.frame.extend(bits);
        }

        // Falling edge: present the next bit
        if let Some(bit) = self.frame.pop_front() {
            self.data_out = bit;
        }
        self.clock_high = false;
        false
    }

    fn sample_data(&mut self) -> bool {
        if let Some(level) = self.host_data {
            return level;
        }
        if self.awaiting_ack {
            self.ack_polls += 1;
        }
        if self.ack_low {
            return false;
        }
        self.data_out
    }

    fn finish_receive(&mut self, rx: Receive) {
        self.clock_high = true;
        self.awaiting_ack = true;
        self.ack_polls = 0;
        self.frames_in += 1;

        let byte = rx.bits[..8]
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i));
        let ones = rx.bits[..9].iter().filter(|&&bit| bit).count();
        if rx.edges < 10 || ones.is_multiple_of(2) || !rx.bits[9] {
            trace!("SIM: rejected frame {byte:02X} after {} edges", rx.edges);
            self.rejected += 1;
            return;
        }

        if !self.acknowledge {
            trace!("SIM: ignoring {byte:02X}");
            return;
        }

        trace!("SIM: received {byte:02X}");
        self.received.push(byte);
        self.ack_low = true;
        if self.ack_reply {
            self.outbound.push_back(frame_bits(opcodes::ACKNOWLEDGE));
        }
    }
}

/// The simulated keyboard's clock line.
pub struct SimClock(Rc<RefCell<SimKeyboard>>);

/// The simulated keyboard's data line.
pub struct SimData(Rc<RefCell<SimKeyboard>>);

impl Line for SimClock {
    fn set_input_pull_up(&mut self) {
        let mut guard = self.0.borrow_mut();
        let kbd = &mut *guard;
        kbd.host_clock = None;
        kbd.clear_ack();
        if kbd.request_to_send {
            kbd.request_to_send = false;
            if kbd.host_data == Some(false) {
                kbd.rx = Some(Receive {
                    edges: 0,
                    bits: [false; 10],
                });
                kbd.clock_high = false;
            }
        }
    }

    fn set_output(&mut self, high: bool) {
        let mut kbd = self.0.borrow_mut();
        kbd.host_clock = Some(high);
        kbd.clear_ack();
        if !high {
            // Inhibit: anything in flight is dropped
            kbd.request_to_send = true;
            kbd.rx = None;
            kbd.frame.clear();
        }
    }

    fn is_high(&mut self) -> bool {
        self.0.borrow_mut().sample_clock()
    }
}

impl Line for SimData {
    fn set_input_pull_up(&mut self) {
        let mut kbd = self.0.borrow_mut();
        kbd.host_data = None;
        match kbd.rx.take() {
            Some(rx) => kbd.finish_receive(rx),
            None => kbd.clear_ack(),
        }
    }

    fn set_output(&mut self, high: bool) {
        let mut guard = self.0.borrow_mut();
        let kbd = &mut *guard;
        kbd.host_data = Some(high);
        kbd.ack_low = false;
        if let Some(rx) = &mut kbd.rx
            && (1..=10).contains(&rx.edges)
        {
            rx.bits[rx.edges - 1] = high;
        }
    }

    fn is_high(&mut self) -> bool {
        self.0.borrow_mut().sample_data()
    }
}

/// Scripts the simulated keyboard and inspects what the host sent it.
#[derive(Clone)]
pub struct SimHandle(Rc<RefCell<SimKeyboard>>);

impl SimHandle {
    /// Queue bytes for the keyboard to send.
    pub fn send(&self, bytes: &[u8]) {
        let mut kbd = self.0.borrow_mut();
        kbd.outbound.extend(bytes.iter().map(|&b| frame_bits(b)));
    }

    /// Queue a frame exactly as given, for corrupt-frame tests.
    pub fn send_raw_frame(&self, bits: [bool; 11]) {
        self.0.borrow_mut().outbound.push_back(bits);
    }

    /// Frames queued but not yet started.
    pub fn pending(&self) -> usize {
        self.0.borrow().outbound.len()
    }

    /// Command bytes the keyboard accepted, in order.
    pub fn received(&self) -> Vec<u8> {
        self.0.borrow().received.clone()
    }

    /// Host writes clocked in, whether accepted or not.
    pub fn frames_in(&self) -> usize {
        self.0.borrow().frames_in
    }

    /// Host writes that failed the keyboard's parity or stop-bit check.
    pub fn rejected(&self) -> usize {
        self.0.borrow().rejected
    }

    /// Data line samples taken by the host while waiting for the last acknowledge.
    pub fn ack_polls(&self) -> usize {
        self.0.borrow().ack_polls
    }

    /// Whether the keyboard pulls data low after a good command. Default on.
    pub fn set_acknowledge(&self, acknowledge: bool) {
        self.0.borrow_mut().acknowledge = acknowledge;
    }

    /// Whether the keyboard queues `FA` after acknowledging. Default on.
    pub fn set_ack_reply(&self, reply: bool) {
        self.0.borrow_mut().ack_reply = reply;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bits() {
        // 0x1C has three ones, so parity is 0
        assert_eq!(
            frame_bits(0x1C),
            [false, false, false, true, true, true, false, false, false, false, true]
        );
        // Even counts of ones need the parity bit set
        assert!(frame_bits(0x00)[9]);
        assert!(frame_bits(0xFF)[9]);
        assert!(frame_bits(0x03)[9]);
        assert!(!frame_bits(0x01)[9]);
        assert!(!frame_bits(0x7F)[9]);
        for byte in 0..=u8::MAX {
            let bits = frame_bits(byte);
            assert!(!bits[0]);
            assert!(bits[10]);
            let ones = bits[1..10].iter().filter(|&&bit| bit).count();
            assert_eq!(ones % 2, 1, "byte {byte:02X}");
        }
    }

    #[test]
    fn test_idle_lines_are_high() {
        let (mut clock, mut data, kbd) = SimKeyboard::new();
        for _ in 0..10 {
            assert!(clock.is_high());
            assert!(data.is_high());
        }
        assert_eq!(kbd.pending(), 0);
    }

    #[test]
    fn test_clock_out_one_frame() {
        let (mut clock, mut data, kbd) = SimKeyboard::new();
        kbd.send(&[0xF0]);
        assert_eq!(kbd.pending(), 1);

        let mut sampled = Vec::new();
        for _ in 0..11 {
            assert!(!clock.is_high());
            sampled.push(data.is_high());
            assert!(clock.is_high());
        }
        assert_eq!(sampled, frame_bits(0xF0));
        assert_eq!(kbd.pending(), 0);
        assert!(clock.is_high());
    }

    #[test]
    fn test_host_inhibit_holds_clock() {
        let (mut clock, mut data, _kbd) = SimKeyboard::new();
        clock.set_output(false);
        assert!(!clock.is_high());
        data.set_output(true);
        assert!(data.is_high());
    }
}
