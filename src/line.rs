//! The electrical boundary: a digital line that is either an input with a
//! pull-up or an output driven to a level, and a microsecond delay source.
//!
//! PS/2 lines are open-collector. They idle high through the pull-up and are
//! only ever pulled low by either side, so "release" means switching the line
//! back to an input.

use std::time::{Duration, Instant};

pub trait Line {
    /// Release the line: input mode with the pull-up enabled.
    fn set_input_pull_up(&mut self);

    /// Switch to output mode and drive `high`.
    fn set_output(&mut self, high: bool);

    /// Sample the current level.
    fn is_high(&mut self) -> bool;
}

impl<L: Line + ?Sized> Line for &mut L {
    fn set_input_pull_up(&mut self) {
        (**self).set_input_pull_up()
    }

    fn set_output(&mut self, high: bool) {
        (**self).set_output(high)
    }

    fn is_high(&mut self) -> bool {
        (**self).is_high()
    }
}

pub trait Delay {
    fn delay_us(&mut self, us: u32);
}

/// Busy-waits on the monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinDelay;

impl Delay for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        let deadline = Instant::now() + Duration::from_micros(us as u64);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Returns immediately. Useful against simulated lines that advance per read.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}
