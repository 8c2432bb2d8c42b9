use clap::Parser;
use hex_literal::hex;
use std::path::PathBuf;
use tracing::{Level, info, warn};

use ps2_keyboard::{Keyboard, NoDelay, SimKeyboard, Timing};

mod host;

/// Types "Hi!", toggles Caps Lock, types "A", then presses Pause.
const DEMO_SCRIPT: &[u8] = &hex!(
    "AA"
    "12 33 F0 33 F0 12"
    "43 F0 43"
    "59 16 F0 16 F0 59"
    "58 F0 58"
    "1C F0 1C"
    "E1 14 77 E1 F0 14 F0 77"
);

/// PS/2 keyboard replay
/// Feeds a scan code capture through a simulated keyboard and the driver
#[derive(Parser)]
#[command(name = "ps2-keyboard")]
#[command(about = "Replay a PS/2 scan code capture through the keyboard driver")]
struct Args {
    /// Capture file: hex bytes separated by whitespace or commas, `#` comments
    #[arg(long, conflicts_with = "bytes")]
    capture: Option<PathBuf>,

    /// Scan code bytes as hex, e.g. "1C F0 1C"
    #[arg(long)]
    bytes: Option<String>,

    /// The keyboard ignores host commands
    #[arg(long)]
    no_ack: bool,

    /// The keyboard acknowledges commands without sending FA
    #[arg(long)]
    no_ack_reply: bool,

    /// Line settle delay in microseconds
    #[arg(long, default_value_t = Timing::DEFAULT.settle_us)]
    settle_us: u32,

    /// Request-to-send hold in microseconds
    #[arg(long, default_value_t = Timing::DEFAULT.hold_us)]
    hold_us: u32,

    /// Acknowledge polls before a command is given up on
    #[arg(long, default_value_t = Timing::DEFAULT.ack_polls)]
    ack_polls: u32,

    /// Idle clock samples after which the replay is finished
    #[arg(long, default_value_t = 1000)]
    idle_polls: u32,

    /// Log to ps2-keyboard.log in the temp directory
    #[arg(long)]
    log_file: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    if args.log_file {
        host::logging::setup_logging_file(level)?;
    } else {
        host::logging::setup_logging_stdio(level);
    }

    let script = match (&args.capture, &args.bytes) {
        (Some(path), _) => host::capture::load(path)?,
        (None, Some(text)) => host::capture::parse(text)?,
        (None, None) => DEMO_SCRIPT.to_vec(),
    };
    info!("Replaying {} bytes", script.len());

    let (clock, data, kbd) = SimKeyboard::new();
    kbd.set_acknowledge(!args.no_ack);
    kbd.set_ack_reply(!args.no_ack_reply);

    let timing = Timing {
        settle_us: args.settle_us,
        hold_us: args.hold_us,
        ack_polls: args.ack_polls,
    };
    let mut keyboard = Keyboard::with_timing(clock, data, NoDelay, timing);
    keyboard.reset();

    kbd.send(&script);
    while let Some(snapshot) = keyboard.try_poll_next_key_snapshot(args.idle_polls) {
        println!("{snapshot:?}");
    }

    if !keyboard.pressed().is_empty() {
        warn!("Still held: {:?}", keyboard.pressed().as_slice());
    }
    let locks = keyboard.locks();
    info!("Locks: {locks:?} {:?}", locks.leds());
    info!("Keyboard received: {:02X?}", kbd.received());

    Ok(())
}
