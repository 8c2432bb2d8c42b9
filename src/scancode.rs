//! # PS/2 scan code set 2 tables (US layout).
//!
//! Every key is defined once in the `def_scan_codes!` list below; the enum, its labels and
//! both 132-entry lookup tables are generated from that list at compile time.
//! A key's discriminant is its scan code, so the identifier to code mapping
//! needs no table of its own.

/// Wire opcodes exchanged with the keyboard
pub mod opcodes {
    /// Host → keyboard: set LEDs, followed by the LED byte
    pub const SET_LEDS: u8 = 0xED;
    /// Next scan code is a break (key released)
    pub const RELEASE_PREFIX: u8 = 0xF0;
    /// Next scan code belongs to the extended (E0) set
    pub const EXTENDED_PREFIX: u8 = 0xE0;
    /// Start of the Pause key sequence
    pub const PAUSE_PREFIX: u8 = 0xE1;
    /// Basic assurance test passed (sent after power-up or reset)
    pub const SELF_TEST_PASSED: u8 = 0xAA;
    /// Command acknowledged
    pub const ACKNOWLEDGE: u8 = 0xFA;
}

/// Number of entries in the decode tables. Codes at or above this are not keys.
pub const TABLE_LEN: usize = 132;

macro_rules! def_scan_codes {
    ($($code:literal => $key:ident $name:literal $shifted:literal;)*) => {
        /// A key the decoder can report.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum KeyId {
            $($key = $code,)*
            /// Synthesized for the E1 sequence; the Pause key has no code of its own.
            Pause = 0x84,
        }

        impl KeyId {
            pub const ALL: &'static [KeyId] = &[$(KeyId::$key,)* KeyId::Pause];

            /// Unshifted label, e.g. `"a"`, `"1"`, `"capslock"`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(KeyId::$key => $name,)*
                    KeyId::Pause => "pause",
                }
            }

            /// Label with shift held, e.g. `"A"`, `"!"`. Keys without a
            /// shifted form return their unshifted label.
            pub const fn shifted_name(self) -> &'static str {
                match self {
                    $(KeyId::$key => $shifted,)*
                    KeyId::Pause => "pause",
                }
            }
        }
    };
}

def_scan_codes!(
0x01 => F9 "f9" "f9";
0x03 => F5 "f5" "f5";
0x04 => F3 "f3" "f3";
0x05 => F1 "f1" "f1";
0x06 => F2 "f2" "f2";
0x07 => F12 "f12" "f12";
0x09 => F10 "f10" "f10";
0x0A => F8 "f8" "f8";
0x0B => F6 "f6" "f6";
0x0C => F4 "f4" "f4";
0x0D => Tab "tab" "tab";
0x0E => Backtick "`" "`";
0x11 => Alt "alt" "alt";
0x12 => LShift "lshift" "lshift";
0x14 => Ctrl "ctrl" "ctrl";
0x15 => Q "q" "Q";
0x16 => Key1 "1" "!";
0x1A => Z "z" "Z";
0x1B => S "s" "S";
0x1C => A "a" "A";
0x1D => W "w" "W";
0x1E => Key2 "2" "@";
0x1F => LWin "lwin" "lwin";
0x21 => C "c" "C";
0x22 => X "x" "X";
0x23 => D "d" "D";
0x24 => E "e" "E";
0x25 => Key4 "4" "$";
0x26 => Key3 "3" "#";
0x27 => RWin "rwin" "rwin";
0x29 => Space "space" "space";
0x2A => V "v" "V";
0x2B => F "f" "F";
0x2C => T "t" "T";
0x2D => R "r" "R";
0x2E => Key5 "5" "%";
0x2F => Menu "menu" "menu";
0x31 => N "n" "N";
0x32 => B "b" "B";
0x33 => H "h" "H";
0x34 => G "g" "G";
0x35 => Y "y" "Y";
0x36 => Key6 "6" "^";
0x3A => M "m" "M";
0x3B => J "j" "J";
0x3C => U "u" "U";
0x3D => Key7 "7" "&";
0x3E => Key8 "8" "*";
0x41 => Comma "," "<";
0x42 => K "k" "K";
0x43 => I "i" "I";
0x44 => O "o" "O";
0x45 => Key0 "0" ")";
0x46 => Key9 "9" "(";
0x49 => Period "." ">";
0x4A => Slash "/" "?";
0x4B => L "l" "L";
0x4C => Semicolon ";" ":";
0x4D => P "p" "P";
0x4E => Minus "-" "_";
0x52 => Apostrophe "'" "\"";
0x54 => LeftBracket "[" "{";
0x55 => Equals "=" "+";
0x58 => CapsLock "capslock" "capslock";
0x59 => RShift "rshift" "rshift";
0x5A => Enter "enter" "enter";
0x5B => RightBracket "]" "}";
0x5D => Backslash "\\" "|";
0x66 => Backspace "backspace" "backspace";
0x69 => End "end" "end";
0x6B => Left "left" "left";
0x6C => Home "home" "home";
0x70 => Insert "insert" "insert";
0x71 => Delete "delete" "delete";
0x72 => Down "down" "down";
0x73 => Center "center" "center";
0x74 => Right "right" "right";
0x75 => Up "up" "up";
0x76 => Esc "esc" "esc";
0x77 => NumLock "numlock" "numlock";
0x78 => F11 "f11" "f11";
0x79 => KpPlus "+" "+";
0x7A => PageDown "pagedown" "pagedown";
0x7B => KpMinus "-" "-";
0x7C => KpStar "*" "*";
0x7D => PageUp "pageup" "pageup";
0x7E => ScrollLock "scroll" "scroll";
0x83 => F7 "f7" "f7";
);

/// Make codes that only qualify the next key and never complete a snapshot.
pub const MODIFIER_CODES: [u8; 6] = [
    KeyId::Ctrl as u8,
    KeyId::Alt as u8,
    KeyId::LShift as u8,
    KeyId::RShift as u8,
    KeyId::LWin as u8,
    KeyId::RWin as u8,
];

/// Navigation cluster keys and what they type with Num Lock on.
pub const NUMPAD_SUBSTITUTION: [(KeyId, &str); 11] = [
    (KeyId::End, "1"),
    (KeyId::Left, "4"),
    (KeyId::Home, "7"),
    (KeyId::Insert, "0"),
    (KeyId::Delete, "."),
    (KeyId::Down, "2"),
    (KeyId::Center, "5"),
    (KeyId::Right, "6"),
    (KeyId::Up, "8"),
    (KeyId::PageDown, "3"),
    (KeyId::PageUp, "9"),
];

const KEY_BY_CODE: [Option<KeyId>; TABLE_LEN] = {
    let mut table = [None; TABLE_LEN];
    let mut i = 0;
    while i < KeyId::ALL.len() {
        let key = KeyId::ALL[i];
        if let Some(code) = key.scan_code() {
            table[code as usize] = Some(key);
        }
        i += 1;
    }
    table
};

/// Unshifted labels by scan code, `""` for unused codes.
pub const UNSHIFTED_TABLE: [&str; TABLE_LEN] = {
    let mut table = [""; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        if let Some(key) = KEY_BY_CODE[i] {
            table[i] = key.name();
        }
        i += 1;
    }
    table
};

/// Shifted labels by scan code, parallel to [`UNSHIFTED_TABLE`].
pub const SHIFTED_TABLE: [&str; TABLE_LEN] = {
    let mut table = [""; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        if let Some(key) = KEY_BY_CODE[i] {
            table[i] = key.shifted_name();
        }
        i += 1;
    }
    table
};

/// Look up a make/break code. `None` for unused or out-of-table codes.
pub fn decode(code: u8) -> Option<KeyId> {
    KEY_BY_CODE.get(code as usize).copied().flatten()
}

/// Num Lock rewrite for a navigation cluster key.
pub const fn numpad_substitute(key: KeyId) -> Option<&'static str> {
    match key {
        KeyId::End => Some("1"),
        KeyId::Left => Some("4"),
        KeyId::Home => Some("7"),
        KeyId::Insert => Some("0"),
        KeyId::Delete => Some("."),
        KeyId::Down => Some("2"),
        KeyId::Center => Some("5"),
        KeyId::Right => Some("6"),
        KeyId::Up => Some("8"),
        KeyId::PageDown => Some("3"),
        KeyId::PageUp => Some("9"),
        _ => None,
    }
}

/// The three keys whose release toggles an LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKey {
    Scroll,
    Num,
    Caps,
}

impl KeyId {
    pub const fn scan_code(self) -> Option<u8> {
        match self {
            KeyId::Pause => None,
            key => Some(key as u8),
        }
    }

    pub fn is_shift(self) -> bool {
        matches!(self, KeyId::LShift | KeyId::RShift)
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyId::Ctrl | KeyId::Alt | KeyId::LShift | KeyId::RShift | KeyId::LWin | KeyId::RWin
        )
    }

    /// Single-letter keys, the only ones Caps Lock affects.
    pub fn is_letter(self) -> bool {
        let name = self.name().as_bytes();
        name.len() == 1 && name[0].is_ascii_alphabetic()
    }

    pub fn lock(self) -> Option<LockKey> {
        match self {
            KeyId::ScrollLock => Some(LockKey::Scroll),
            KeyId::NumLock => Some(LockKey::Num),
            KeyId::CapsLock => Some(LockKey::Caps),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rustfmt::skip]
    const US_UNSHIFTED: [&str; TABLE_LEN] = [
        /* 00 */ "", "f9", "", "f5", "f3", "f1", "f2", "f12",
        /* 08 */ "", "f10", "f8", "f6", "f4", "tab", "`", "",
        /* 10 */ "", "alt", "lshift", "", "ctrl", "q", "1", "",
        /* 18 */ "", "", "z", "s", "a", "w", "2", "lwin",
        /* 20 */ "", "c", "x", "d", "e", "4", "3", "rwin",
        /* 28 */ "", "space", "v", "f", "t", "r", "5", "menu",
        /* 30 */ "", "n", "b", "h", "g", "y", "6", "",
        /* 38 */ "", "", "m", "j", "u", "7", "8", "",
        /* 40 */ "", ",", "k", "i", "o", "0", "9", "",
        /* 48 */ "", ".", "/", "l", ";", "p", "-", "",
        /* 50 */ "", "", "'", "", "[", "=", "", "",
        /* 58 */ "capslock", "rshift", "enter", "]", "", "\\", "", "",
        /* 60 */ "", "", "", "", "", "", "backspace", "",
        /* 68 */ "", "end", "", "left", "home", "", "", "",
        /* 70 */ "insert", "delete", "down", "center", "right", "up", "esc", "numlock",
        /* 78 */ "f11", "+", "pagedown", "-", "*", "pageup", "scroll", "",
        /* 80 */ "", "", "", "f7",
    ];

    #[rustfmt::skip]
    const US_SHIFTED: [&str; TABLE_LEN] = [
        /* 00 */ "", "f9", "", "f5", "f3", "f1", "f2", "f12",
        /* 08 */ "", "f10", "f8", "f6", "f4", "tab", "`", "",
        /* 10 */ "", "alt", "lshift", "", "ctrl", "Q", "!", "",
        /* 18 */ "", "", "Z", "S", "A", "W", "@", "lwin",
        /* 20 */ "", "C", "X", "D", "E", "$", "#", "rwin",
        /* 28 */ "", "space", "V", "F", "T", "R", "%", "menu",
        /* 30 */ "", "N", "B", "H", "G", "Y", "^", "",
        /* 38 */ "", "", "M", "J", "U", "&", "*", "",
        /* 40 */ "", "<", "K", "I", "O", ")", "(", "",
        /* 48 */ "", ">", "?", "L", ":", "P", "_", "",
        /* 50 */ "", "", "\"", "", "{", "+", "", "",
        /* 58 */ "capslock", "rshift", "enter", "}", "", "|", "", "",
        /* 60 */ "", "", "", "", "", "", "backspace", "",
        /* 68 */ "", "end", "", "left", "home", "", "", "",
        /* 70 */ "insert", "delete", "down", "center", "right", "up", "esc", "numlock",
        /* 78 */ "f11", "+", "pagedown", "-", "*", "pageup", "scroll", "",
        /* 80 */ "", "", "", "f7",
    ];

    #[test]
    fn test_tables_match_us_layout() {
        for code in 0..TABLE_LEN {
            assert_eq!(UNSHIFTED_TABLE[code], US_UNSHIFTED[code], "code {code:02X}");
            assert_eq!(SHIFTED_TABLE[code], US_SHIFTED[code], "code {code:02X}");
            let label = decode(code as u8).map(KeyId::name).unwrap_or("");
            assert_eq!(label, US_UNSHIFTED[code], "code {code:02X}");
        }
    }

    #[test]
    fn test_out_of_table() {
        assert_eq!(decode(0x84), None);
        assert_eq!(decode(0xAA), None);
        assert_eq!(decode(0xFF), None);
    }

    #[rstest]
    #[case(0x00, "", "")]
    #[case(0x02, "", "")]
    #[case(0x05, "f1", "f1")]
    #[case(0x16, "1", "!")]
    #[case(0x1C, "a", "A")]
    #[case(0x0E, "`", "`")]
    #[case(0x4E, "-", "_")]
    #[case(0x52, "'", "\"")]
    #[case(0x5D, "\\", "|")]
    #[case(0x7B, "-", "-")]
    #[case(0x79, "+", "+")]
    #[case(0x58, "capslock", "capslock")]
    #[case(0x77, "numlock", "numlock")]
    #[case(0x7E, "scroll", "scroll")]
    #[case(0x83, "f7", "f7")]
    fn test_tables(#[case] code: usize, #[case] unshifted: &str, #[case] shifted: &str) {
        assert_eq!(UNSHIFTED_TABLE[code], unshifted);
        assert_eq!(SHIFTED_TABLE[code], shifted);
    }

    #[test]
    fn test_tables_are_parallel() {
        for code in 0..TABLE_LEN {
            assert_eq!(
                UNSHIFTED_TABLE[code].is_empty(),
                SHIFTED_TABLE[code].is_empty()
            );
        }
    }

    #[test]
    fn test_reverse_lookup() {
        for &key in KeyId::ALL {
            match key.scan_code() {
                Some(code) => assert_eq!(decode(code), Some(key)),
                None => assert_eq!(key, KeyId::Pause),
            }
        }
    }

    #[test]
    fn test_modifiers() {
        let modifiers: Vec<_> = KeyId::ALL.iter().filter(|k| k.is_modifier()).collect();
        assert_eq!(modifiers.len(), 6);
        for code in MODIFIER_CODES {
            assert!(decode(code).is_some_and(KeyId::is_modifier));
        }
    }

    #[test]
    fn test_letters() {
        assert_eq!(KeyId::ALL.iter().filter(|k| k.is_letter()).count(), 26);
        assert!(!KeyId::Key1.is_letter());
        assert!(!KeyId::F1.is_letter());
    }

    #[test]
    fn test_numpad_substitution() {
        assert_eq!(numpad_substitute(KeyId::End), Some("1"));
        assert_eq!(numpad_substitute(KeyId::Delete), Some("."));
        assert_eq!(numpad_substitute(KeyId::PageUp), Some("9"));
        assert_eq!(numpad_substitute(KeyId::A), None);
        assert_eq!(numpad_substitute(KeyId::KpMinus), None);

        for (key, digit) in NUMPAD_SUBSTITUTION {
            assert_eq!(numpad_substitute(key), Some(digit), "{key:?}");
        }
        let substituted = KeyId::ALL
            .iter()
            .filter(|&&k| numpad_substitute(k).is_some())
            .count();
        assert_eq!(substituted, NUMPAD_SUBSTITUTION.len());
    }
}
