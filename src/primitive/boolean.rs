// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

use super::{verify_round_trip, SmlElement};
use crate::error::Error;
use crate::tl::{self, Tl, TypeClass};

/// A tri-state boolean: `None` (absent), `Some(false)` or `Some(true)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boolean {
    value: Option<bool>,
}

impl Boolean {
    pub fn new() -> Self {
        Boolean { value: None }
    }

    pub fn with_value(value: bool) -> Self {
        Boolean { value: Some(value) }
    }

    pub fn value(&self) -> Option<bool> {
        self.value
    }

    pub fn set_value(&mut self, value: Option<bool>) {
        self.value = value;
    }
}

impl SmlElement for Boolean {
    fn encode(&self) -> Vec<u8> {
        match self.value {
            None => vec![0x01],
            Some(v) => {
                let mut out = tl::encode_payload(TypeClass::Boolean, 1);
                out.push(if v { 0xFF } else { 0x00 });
                out
            }
        }
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        match tl::decode(data)? {
            Tl::Absent => {
                self.value = None;
                Ok(1)
            }
            Tl::Present {
                class,
                declared_length,
                tl_byte_count,
            } => {
                if class != TypeClass::Boolean {
                    return Err(Error::TypeMismatch {
                        expected: TypeClass::Boolean.name(),
                        found: class.name(),
                    });
                }
                let payload_len = declared_length.saturating_sub(tl_byte_count);
                if payload_len != 1 {
                    return Err(Error::WidthMismatch {
                        expected: 1,
                        found: payload_len as u8,
                    });
                }
                let total = tl_byte_count + payload_len;
                if data.len() < total {
                    return Err(Error::MalformedTl(format!(
                        "declared length {} exceeds remaining buffer of {} bytes",
                        total,
                        data.len()
                    )));
                }
                self.value = Some(data[tl_byte_count] != 0x00);
                verify_round_trip(&self.encode(), &data[..total])?;
                Ok(total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_decodes_to_none() {
        let mut b = Boolean::new();
        assert_eq!(b.decode(&[0x01]).unwrap(), 1);
        assert_eq!(b.value(), None);
    }

    #[test]
    fn false_round_trips() {
        let original = Boolean::with_value(false);
        let encoded = original.encode();
        assert_eq!(encoded, vec![0x42, 0x00]);
        let mut decoded = Boolean::new();
        decoded.decode(&encoded).unwrap();
        assert_eq!(decoded.value(), Some(false));
    }

    #[test]
    fn true_round_trips() {
        let original = Boolean::with_value(true);
        let encoded = original.encode();
        assert_eq!(encoded, vec![0x42, 0xFF]);
        let mut decoded = Boolean::new();
        decoded.decode(&encoded).unwrap();
        assert_eq!(decoded.value(), Some(true));
    }

    #[test]
    fn wrong_payload_width_is_rejected() {
        let mut b = Boolean::new();
        // Declares a 2-byte Boolean payload, which is invalid.
        let err = b.decode(&[0x43, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, Error::WidthMismatch { .. }));
    }
}
