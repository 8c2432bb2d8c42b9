//! Shift, Caps Lock and Num Lock applied to a pressed-key snapshot.

use crate::led::LockState;
use crate::scancode::{KeyId, numpad_substitute};

/// Label every held key, in press order, as it would be typed.
///
/// A held shift key applies to all other held keys regardless of which was
/// pressed first. Shift cancels Caps Lock for letters. Without shift, Caps
/// Lock uppercases letters and Num Lock turns the navigation cluster into
/// digits. The shift keys themselves are left out.
pub fn apply(keys: &[KeyId], locks: LockState) -> Vec<&'static str> {
    let shifted = keys.iter().any(|key| key.is_shift());
    keys.iter()
        .filter(|key| !key.is_shift())
        .map(|&key| label(key, shifted, locks))
        .collect()
}

fn label(key: KeyId, shifted: bool, locks: LockState) -> &'static str {
    if shifted {
        if locks.caps && key.is_letter() {
            key.name()
        } else {
            key.shifted_name()
        }
    } else if locks.caps && key.is_letter() {
        key.shifted_name()
    } else if locks.num {
        numpad_substitute(key).unwrap_or(key.name())
    } else {
        key.name()
    }
}
