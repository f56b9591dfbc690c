// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

use std::error;
use std::fmt;

/// Errors produced while encoding or decoding SML data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The TL header was truncated or internally inconsistent.
    MalformedTl(String),
    /// The TL header's type class did not match the element being decoded into.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A fixed-width integer received a payload of a different width.
    WidthMismatch { expected: u8, found: u8 },
    /// An assigned integer value fell outside the range of its width/signedness.
    ValueOutOfRange { value: i128, min: i128, max: i128 },
    /// An explicit Choice saw a tag value absent from its mapping.
    UnknownChoiceTag(u32),
    /// The End-Of-Message slot did not contain 0x00.
    NotEndOfMessage(u8),
    /// The telegram's 8-byte start escape sequence did not match.
    BadStartEscape,
    /// The telegram's 5-byte end escape sequence did not match.
    BadEndEscape,
    /// The telegram's padding byte count was not in {0,1,2,3}.
    BadPadding(u8),
    /// A message- or telegram-level CRC did not verify.
    ChecksumMismatch { expected: u16, found: u16 },
    /// Re-encoding a just-decoded element did not reproduce the consumed bytes.
    SelfEncodeMismatch,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedTl(reason) => write!(f, "malformed TL header: {}", reason),
            Error::TypeMismatch { expected, found } => {
                write!(f, "TL type mismatch: expected {}, found {}", expected, found)
            }
            Error::WidthMismatch { expected, found } => write!(
                f,
                "integer width mismatch: expected {} byte(s), found {}",
                expected, found
            ),
            Error::ValueOutOfRange { value, min, max } => {
                write!(f, "value {} out of range [{}, {}]", value, min, max)
            }
            Error::UnknownChoiceTag(tag) => write!(f, "unknown choice tag: 0x{:X}", tag),
            Error::NotEndOfMessage(byte) => {
                write!(f, "expected end-of-message byte 0x00, found 0x{:02X}", byte)
            }
            Error::BadStartEscape => write!(f, "telegram start escape sequence not found"),
            Error::BadEndEscape => write!(f, "telegram end escape sequence not found"),
            Error::BadPadding(n) => write!(f, "telegram padding byte count out of range: {}", n),
            Error::ChecksumMismatch { expected, found } => write!(
                f,
                "CRC mismatch: stored 0x{:04X}, computed 0x{:04X}",
                expected, found
            ),
            Error::SelfEncodeMismatch => {
                write!(f, "re-encoding a decoded element did not reproduce its bytes")
            }
        }
    }
}

// This is important for other errors to wrap this one.
impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
