//! Scan code captures: hex bytes separated by whitespace or commas, with an
//! optional `0x` prefix. `#` starts a comment that runs to the end of the line.

use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum CaptureError {
    Io(io::Error),
    BadByte { line: usize, token: String },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Io(err) => write!(f, "reading capture: {err}"),
            CaptureError::BadByte { line, token } => {
                write!(f, "line {line}: {token:?} is not a hex byte")
            }
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<io::Error> for CaptureError {
    fn from(err: io::Error) -> Self {
        CaptureError::Io(err)
    }
}

pub fn load(path: &Path) -> Result<Vec<u8>, CaptureError> {
    parse(&std::fs::read_to_string(path)?)
}

pub fn parse(text: &str) -> Result<Vec<u8>, CaptureError> {
    let mut bytes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let code = line.split('#').next().unwrap_or_default();
        for token in code
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            let byte = u8::from_str_radix(digits, 16).map_err(|_| CaptureError::BadByte {
                line: line_no,
                token: token.to_string(),
            })?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse() {
        let text = "# press and release a\n1C F0 1C\n0x12,0x16 # shift 1\n\n";
        assert_eq!(parse(text).unwrap(), vec![0x1C, 0xF0, 0x1C, 0x12, 0x16]);
    }

    #[test]
    fn test_parse_bad_byte() {
        let err = parse("1C\nF0 XYZ\n").unwrap_err();
        match err {
            CaptureError::BadByte { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "XYZ");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse("100").is_err());
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "E1 14 77").unwrap();
        writeln!(file, "E1 F0 14 F0 77 # pause").unwrap();
        assert_eq!(
            load(file.path()).unwrap(),
            vec![0xE1, 0x14, 0x77, 0xE1, 0xF0, 0x14, 0xF0, 0x77]
        );
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("missing.txt")),
            Err(CaptureError::Io(_))
        ));
    }
}
