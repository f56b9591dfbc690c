// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

use super::{verify_round_trip, SmlElement};
use crate::error::Error;
use crate::tl::{self, Tl, TypeClass};

/// A signed or unsigned integer of 1, 2, 4 or 8 bytes.
///
/// A single generalized struct stands in for the eight distinct
/// `Integer8`/`Integer16`/.../`UnsignedInteger64` wire types: the
/// width/signedness pair is carried as data rather than duplicated
/// across near-identical structs.
///
/// `width` is `None` for a width-flexible integer (used where the wire
/// format lets the TL header alone determine the byte count, e.g. an
/// implicit `Value` choice); otherwise it pins the element to exactly
/// that many payload bytes and range-checks every assigned value
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integer {
    width: Option<u8>,
    signed: bool,
    value: Option<i128>,
    /// For a width-flexible integer (`width: None`), the payload width
    /// the last `decode` actually consumed. `encode` must reproduce this
    /// exact width rather than re-deriving a possibly smaller minimal
    /// width from `value`, or a just-decoded element would fail its own
    /// round-trip check. Cleared whenever `set_value` assigns a new value.
    decoded_width: Option<u8>,
}

fn range(width: u8, signed: bool) -> (i128, i128) {
    let bits = width as u32 * 8;
    if signed {
        let max = (1i128 << (bits - 1)) - 1;
        (-(1i128 << (bits - 1)), max)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

fn type_class(signed: bool) -> TypeClass {
    if signed {
        TypeClass::SignedInteger
    } else {
        TypeClass::UnsignedInteger
    }
}

/// Smallest power-of-two byte width (1, 2, 4 or 8) able to hold `value`.
fn minimal_width(value: i128, signed: bool) -> Result<u8, Error> {
    for &w in &[1u8, 2, 4, 8] {
        let (min, max) = range(w, signed);
        if value >= min && value <= max {
            return Ok(w);
        }
    }
    let (min, max) = range(8, signed);
    Err(Error::ValueOutOfRange { value, min, max })
}

impl Default for Integer {
    fn default() -> Self {
        Integer::new(None, false)
    }
}

impl Integer {
    fn new(width: Option<u8>, signed: bool) -> Self {
        Integer {
            width,
            signed,
            value: None,
            decoded_width: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn width(&self) -> Option<u8> {
        self.width
    }

    pub fn value(&self) -> Option<i128> {
        self.value
    }

    pub fn set_value(&mut self, value: Option<i128>) -> Result<(), Error> {
        if let Some(v) = value {
            let width = self.width.unwrap_or(minimal_width(v, self.signed)?);
            let (min, max) = range(width, self.signed);
            if v < min || v > max {
                return Err(Error::ValueOutOfRange { value: v, min, max });
            }
        }
        self.value = value;
        self.decoded_width = None;
        Ok(())
    }

    fn encode_width(&self) -> Option<u8> {
        match self.width {
            Some(w) => Some(w),
            None => self
                .decoded_width
                .or_else(|| self.value.and_then(|v| minimal_width(v, self.signed).ok())),
        }
    }
}

impl SmlElement for Integer {
    fn encode(&self) -> Vec<u8> {
        let value = match self.value {
            None => return vec![0x01],
            Some(v) => v,
        };
        let width = self
            .encode_width()
            .expect("set_value validated a representable width");
        let mut out = tl::encode_payload(type_class(self.signed), width as usize);
        let bytes = value.to_be_bytes();
        out.extend_from_slice(&bytes[bytes.len() - width as usize..]);
        out
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        match tl::decode(data)? {
            Tl::Absent => {
                self.value = None;
                self.decoded_width = None;
                Ok(1)
            }
            Tl::Present {
                class,
                declared_length,
                tl_byte_count,
            } => {
                if class != type_class(self.signed) {
                    return Err(Error::TypeMismatch {
                        expected: type_class(self.signed).name(),
                        found: class.name(),
                    });
                }
                let payload_len = declared_length.saturating_sub(tl_byte_count);
                if let Some(expected) = self.width {
                    if payload_len != expected as usize {
                        return Err(Error::WidthMismatch {
                            expected,
                            found: payload_len as u8,
                        });
                    }
                }
                let total = tl_byte_count + payload_len;
                if data.len() < total {
                    return Err(Error::MalformedTl(format!(
                        "declared length {} exceeds remaining buffer of {} bytes",
                        total,
                        data.len()
                    )));
                }
                let payload = &data[tl_byte_count..total];
                let value = decode_payload(payload, self.signed);
                self.value = Some(value);
                if self.width.is_none() {
                    self.decoded_width = Some(payload_len as u8);
                }
                verify_round_trip(&self.encode(), &data[..total])?;
                Ok(total)
            }
        }
    }
}

fn decode_payload(payload: &[u8], signed: bool) -> i128 {
    let negative = signed && payload.first().map_or(false, |b| b & 0x80 != 0);
    let mut buf = [if negative { 0xFFu8 } else { 0x00 }; 16];
    let start = buf.len() - payload.len();
    buf[start..].copy_from_slice(payload);
    i128::from_be_bytes(buf)
}

/// A width-flexible signed integer; its byte width is whatever the TL
/// header declares (decode) or the minimal width the value fits (encode).
pub fn signed_integer() -> Integer {
    Integer::new(None, true)
}

/// A width-flexible unsigned integer.
pub fn unsigned_integer() -> Integer {
    Integer::new(None, false)
}

pub fn signed_integer8() -> Integer {
    Integer::new(Some(1), true)
}

pub fn signed_integer16() -> Integer {
    Integer::new(Some(2), true)
}

pub fn signed_integer32() -> Integer {
    Integer::new(Some(4), true)
}

pub fn signed_integer64() -> Integer {
    Integer::new(Some(8), true)
}

pub fn unsigned_integer8() -> Integer {
    Integer::new(Some(1), false)
}

pub fn unsigned_integer16() -> Integer {
    Integer::new(Some(2), false)
}

pub fn unsigned_integer32() -> Integer {
    Integer::new(Some(4), false)
}

pub fn unsigned_integer64() -> Integer {
    Integer::new(Some(8), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned8_round_trips() {
        let mut i = unsigned_integer8();
        i.set_value(Some(200)).unwrap();
        let encoded = i.encode();
        assert_eq!(encoded, vec![0x62, 200]);
        let mut decoded = unsigned_integer8();
        decoded.decode(&encoded).unwrap();
        assert_eq!(decoded.value(), Some(200));
    }

    #[test]
    fn signed8_negative_round_trips() {
        let mut i = signed_integer8();
        i.set_value(Some(-1)).unwrap();
        let encoded = i.encode();
        assert_eq!(encoded, vec![0x52, 0xFF]);
        let mut decoded = signed_integer8();
        decoded.decode(&encoded).unwrap();
        assert_eq!(decoded.value(), Some(-1));
    }

    #[test]
    fn unsigned64_max_round_trips() {
        let mut i = unsigned_integer64();
        i.set_value(Some(u64::MAX as i128)).unwrap();
        let encoded = i.encode();
        let mut decoded = unsigned_integer64();
        decoded.decode(&encoded).unwrap();
        assert_eq!(decoded.value(), Some(u64::MAX as i128));
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        let mut i = unsigned_integer8();
        let err = i.set_value(Some(256)).unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { .. }));
    }

    #[test]
    fn fixed_width_decode_rejects_mismatched_payload() {
        let mut i = unsigned_integer8();
        // Declares a 2-byte unsigned integer payload where 1 is expected.
        let err = i.decode(&[0x63, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, Error::WidthMismatch { .. }));
    }

    #[test]
    fn flexible_integer_infers_width_from_wire() {
        let mut i = unsigned_integer64();
        i.set_value(Some(9)).unwrap();
        let encoded = i.encode();
        // unsigned_integer64 is fixed-width, so it always emits 8 bytes.
        assert_eq!(encoded.len(), 9);

        let mut flexible = unsigned_integer();
        let consumed = flexible.decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(flexible.value(), Some(9));
        assert_eq!(flexible.width(), None);
    }

    #[test]
    fn absent_round_trips() {
        let i = signed_integer16();
        assert_eq!(i.encode(), vec![0x01]);
        let mut decoded = signed_integer16();
        decoded.decode(&[0x01]).unwrap();
        assert_eq!(decoded.value(), None);
    }

    #[test]
    fn wrong_sign_class_is_rejected() {
        let mut i = signed_integer8();
        // 0x62 0x01 is an UnsignedInteger TL, not SignedInteger.
        let err = i.decode(&[0x62, 0x01]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
