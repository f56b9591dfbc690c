// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Shared plumbing for SML's two Choice flavors.
//!
//! Explicit choices (`MessageBody`, `Time`) wrap a tag and a chosen
//! element in a length-2 Sequence; the tag/wrapper bytes are produced
//! and consumed by [`encode_tag`]/[`decode_tag`] and
//! [`wrap_explicit`]/[`unwrap_explicit`]. Implicit choices (`Status`,
//! `Value`) have no tag at all: the next TL header alone picks the
//! variant, handled by [`Primitive`] and [`decode_implicit`].

use crate::error::Error;
use crate::primitive::{
    signed_integer, signed_integer16, signed_integer32, signed_integer64, signed_integer8,
    unsigned_integer, unsigned_integer16, unsigned_integer32, unsigned_integer64,
    unsigned_integer8, Boolean, Integer, OctetString, SmlElement,
};
use crate::tl::{self, Tl, TypeClass};

/// Encodes a fixed-width unsigned tag (`width` of 1 or 2 bytes).
pub fn encode_tag(width: u8, tag: u64) -> Vec<u8> {
    let mut out = tl::encode_payload(TypeClass::UnsignedInteger, width as usize);
    let bytes = tag.to_be_bytes();
    out.extend_from_slice(&bytes[bytes.len() - width as usize..]);
    out
}

/// A decoded tag: its value and how many bytes it consumed.
pub struct DecodedTag {
    pub value: u64,
    pub consumed: usize,
}

/// Decodes a fixed-width unsigned tag at the front of `data`.
pub fn decode_tag(data: &[u8], width: u8) -> Result<DecodedTag, Error> {
    match tl::decode(data)? {
        Tl::Absent => Err(Error::MalformedTl("choice tag must not be absent".into())),
        Tl::Present {
            class,
            declared_length,
            tl_byte_count,
        } => {
            if class != TypeClass::UnsignedInteger {
                return Err(Error::TypeMismatch {
                    expected: TypeClass::UnsignedInteger.name(),
                    found: class.name(),
                });
            }
            let payload_len = declared_length.saturating_sub(tl_byte_count);
            if payload_len != width as usize {
                return Err(Error::WidthMismatch {
                    expected: width,
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
            let mut buf = [0u8; 8];
            buf[8 - payload_len..].copy_from_slice(&data[tl_byte_count..total]);
            Ok(DecodedTag {
                value: u64::from_be_bytes(buf),
                consumed: total,
            })
        }
    }
}

/// Wraps a tag and a chosen element's bytes in the Sequence(2) envelope
/// every explicit Choice uses on the wire.
pub fn wrap_explicit(tag_bytes: &[u8], body_bytes: &[u8]) -> Vec<u8> {
    let mut out = tl::encode_sequence(2);
    out.extend_from_slice(tag_bytes);
    out.extend_from_slice(body_bytes);
    out
}

/// Consumes the Sequence(2) TL wrapper at the front of `data`, verifying
/// its declared length is exactly 2, and returns how many bytes the
/// wrapper TL itself occupied.
pub fn unwrap_explicit(data: &[u8]) -> Result<usize, Error> {
    match tl::decode(data)? {
        Tl::Present {
            class,
            declared_length,
            tl_byte_count,
        } if class == TypeClass::Sequence => {
            if declared_length != 2 {
                return Err(Error::MalformedTl(format!(
                    "explicit choice wrapper declares {} fields, expected 2",
                    declared_length
                )));
            }
            Ok(tl_byte_count)
        }
        Tl::Present { class, .. } => Err(Error::TypeMismatch {
            expected: TypeClass::Sequence.name(),
            found: class.name(),
        }),
        Tl::Absent => Err(Error::MalformedTl(
            "explicit choice wrapper must not be absent".into(),
        )),
    }
}

/// The value an implicit Choice (`Status`, `Value`) resolves to, picked
/// purely from the next TL header on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// The `0x01` "not set" sentinel.
    Absent,
    OctetString(OctetString),
    Boolean(Boolean),
    Integer(Integer),
    Sequence(Vec<Primitive>),
}

impl Default for Primitive {
    fn default() -> Self {
        Primitive::Absent
    }
}

impl SmlElement for Primitive {
    fn encode(&self) -> Vec<u8> {
        match self {
            Primitive::Absent => vec![0x01],
            Primitive::OctetString(v) => v.encode(),
            Primitive::Boolean(v) => v.encode(),
            Primitive::Integer(v) => v.encode(),
            Primitive::Sequence(items) => {
                let mut out = tl::encode_sequence(items.len());
                for item in items {
                    out.extend(item.encode());
                }
                out
            }
        }
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        let (value, consumed) = decode_implicit(data)?;
        *self = value;
        Ok(consumed)
    }
}

/// Picks and decodes the implicit Choice variant indicated by the next
/// TL header. Integer widths of 1/2/4/8 bytes map to the matching fixed
/// variant (`SML_UnsignedInteger08`-style dispatch); any other width
/// falls back to the width-flexible variant. This is the corrected
/// counterpart of the source's `SML_UnignedInteger08` misnomer.
pub fn decode_implicit(data: &[u8]) -> Result<(Primitive, usize), Error> {
    match tl::decode(data)? {
        Tl::Absent => Ok((Primitive::Absent, 1)),
        Tl::Present {
            class,
            declared_length,
            tl_byte_count,
        } => match class {
            TypeClass::OctetString => {
                let mut v = OctetString::new();
                let consumed = v.decode(data)?;
                Ok((Primitive::OctetString(v), consumed))
            }
            TypeClass::Boolean => {
                let mut v = Boolean::new();
                let consumed = v.decode(data)?;
                Ok((Primitive::Boolean(v), consumed))
            }
            TypeClass::SignedInteger | TypeClass::UnsignedInteger => {
                let payload_len = declared_length.saturating_sub(tl_byte_count);
                let signed = class == TypeClass::SignedInteger;
                let mut v = match payload_len {
                    1 if signed => signed_integer8(),
                    1 => unsigned_integer8(),
                    2 if signed => signed_integer16(),
                    2 => unsigned_integer16(),
                    4 if signed => signed_integer32(),
                    4 => unsigned_integer32(),
                    8 if signed => signed_integer64(),
                    8 => unsigned_integer64(),
                    _ if signed => signed_integer(),
                    _ => unsigned_integer(),
                };
                let consumed = v.decode(data)?;
                Ok((Primitive::Integer(v), consumed))
            }
            TypeClass::Sequence => {
                let mut items = Vec::with_capacity(declared_length);
                let mut offset = tl_byte_count;
                for _ in 0..declared_length {
                    let (item, consumed) = decode_implicit(&data[offset..])?;
                    items.push(item);
                    offset += consumed;
                }
                Ok((Primitive::Sequence(items), offset))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips() {
        let encoded = encode_tag(2, 0x0701);
        let decoded = decode_tag(&encoded, 2).unwrap();
        assert_eq!(decoded.value, 0x0701);
        assert_eq!(decoded.consumed, encoded.len());
    }

    #[test]
    fn explicit_wrapper_round_trips() {
        let tag_bytes = encode_tag(1, 2);
        let body_bytes = unsigned_integer32().encode();
        let wrapped = wrap_explicit(&tag_bytes, &body_bytes);
        let consumed = unwrap_explicit(&wrapped).unwrap();
        assert_eq!(consumed, 1);
        let tag = decode_tag(&wrapped[consumed..], 1).unwrap();
        assert_eq!(tag.value, 2);
    }

    #[test]
    fn explicit_wrapper_rejects_wrong_field_count() {
        let bad = tl::encode_sequence(3);
        let err = unwrap_explicit(&bad).unwrap_err();
        assert!(matches!(err, Error::MalformedTl(_)));
    }

    #[test]
    fn implicit_unsigned_one_byte_uses_u8_variant() {
        let mut source = unsigned_integer8();
        source.set_value(Some(42)).unwrap();
        let encoded = source.encode();

        let (value, consumed) = decode_implicit(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        match value {
            Primitive::Integer(i) => {
                assert_eq!(i.width(), Some(1));
                assert!(!i.is_signed());
                assert_eq!(i.value(), Some(42));
            }
            other => panic!("expected Primitive::Integer, got {:?}", other),
        }
    }

    #[test]
    fn implicit_octet_string_round_trips() {
        let mut os = OctetString::new();
        os.set_value(Some(b"abc".to_vec()));
        let encoded = os.encode();
        let (value, consumed) = decode_implicit(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert!(matches!(value, Primitive::OctetString(_)));
    }

    #[test]
    fn implicit_absent_is_recognized() {
        let (value, consumed) = decode_implicit(&[0x01]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(value, Primitive::Absent);
    }

    #[test]
    fn implicit_nested_sequence_decodes_recursively() {
        let mut a = unsigned_integer8();
        a.set_value(Some(1)).unwrap();
        let mut b = unsigned_integer8();
        b.set_value(Some(2)).unwrap();
        let mut seq = tl::encode_sequence(2);
        seq.extend(a.encode());
        seq.extend(b.encode());

        let (value, consumed) = decode_implicit(&seq).unwrap();
        assert_eq!(consumed, seq.len());
        match value {
            Primitive::Sequence(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Primitive::Sequence, got {:?}", other),
        }
    }
}
