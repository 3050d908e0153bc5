//! Text encoding descriptors.
//!
//! Formatters compare encodings by canonical name only. ASCII is a subset of
//! UTF-8 but is still a different encoding.

use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

/// A byte-level text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// UTF-8 without a byte order mark.
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Ascii,
    Latin1,
}

impl Encoding {
    /// Canonical encoding name.
    pub const fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf32Le => "utf-32le",
            Encoding::Ascii => "us-ascii",
            Encoding::Latin1 => "iso-8859-1",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = WireError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let encoding = match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Encoding::Utf8,
            "utf-16" | "utf-16le" | "utf16le" | "unicode" => Encoding::Utf16Le,
            "utf-16be" | "utf16be" | "unicodefffe" => Encoding::Utf16Be,
            "utf-32" | "utf-32le" | "utf32le" => Encoding::Utf32Le,
            "us-ascii" | "ascii" => Encoding::Ascii,
            "iso-8859-1" | "latin1" | "latin-1" => Encoding::Latin1,
            _ => {
                return Err(WireError::UnsupportedEncoding {
                    requested: label.to_string(),
                    required: "a known encoding label".to_string(),
                })
            }
        };
        Ok(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_case_insensitive() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!(" Latin1 ".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("unicode".parse::<Encoding>().unwrap(), Encoding::Utf16Le);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "ebcdic".parse::<Encoding>().unwrap_err();
        assert!(matches!(err, WireError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn test_display_is_canonical_name() {
        assert_eq!(Encoding::Utf8.to_string(), "utf-8");
        assert_eq!(Encoding::Ascii.to_string(), "us-ascii");
    }
}
