// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Generic helpers behind SML's two Sequence flavors.
//!
//! Fixed sequences (message envelopes, nested schemas) call
//! [`encode_fixed`]/[`decode_fixed`] field-by-field from concrete
//! structs; the field count itself is the schema, so no runtime schema
//! table is carried. List sequences (`ValList`) use
//! [`encode_list`]/[`decode_list`] over a single homogeneous element
//! type, constructing a fresh element per entry so no decoded entry
//! aliases another.

use crate::error::Error;
use crate::primitive::SmlElement;
use crate::tl::{self, Tl, TypeClass};

/// Encodes a fixed-field Sequence: `TL(Sequence, fields.len())` followed
/// by each field's own encoding, in order.
pub fn encode_fixed(fields: &[&dyn SmlElement]) -> Vec<u8> {
    let mut out = tl::encode_sequence(fields.len());
    for field in fields {
        out.extend(field.encode());
    }
    out
}

/// Decodes a fixed-field Sequence into `fields`, in order. Fails with
/// `MalformedTl` if the declared element count does not equal
/// `fields.len()`.
pub fn decode_fixed(data: &[u8], fields: &mut [&mut dyn SmlElement]) -> Result<usize, Error> {
    let (declared_length, mut offset) = decode_sequence_header(data, fields.len())?;
    debug_assert_eq!(declared_length, fields.len());
    for field in fields.iter_mut() {
        let consumed = field.decode(&data[offset..])?;
        offset += consumed;
    }
    Ok(offset)
}

/// Encodes a list Sequence: `TL(Sequence, items.len())` followed by each
/// item's own encoding.
pub fn encode_list<T: SmlElement>(items: &[T]) -> Vec<u8> {
    let mut out = tl::encode_sequence(items.len());
    for item in items {
        out.extend(item.encode());
    }
    out
}

/// Decodes a list Sequence into a freshly constructed `Vec<T>`, one
/// `T::default()` decoded per declared element.
pub fn decode_list<T: SmlElement + Default>(data: &[u8]) -> Result<(Vec<T>, usize), Error> {
    let (count, mut offset) = decode_sequence_header_any_length(data)?;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let mut item = T::default();
        let consumed = item.decode(&data[offset..])?;
        offset += consumed;
        items.push(item);
    }
    Ok((items, offset))
}

fn decode_sequence_header(data: &[u8], expected_len: usize) -> Result<(usize, usize), Error> {
    let (declared_length, consumed) = decode_sequence_header_any_length(data)?;
    if declared_length != expected_len {
        return Err(Error::MalformedTl(format!(
            "sequence declares {} fields, expected {}",
            declared_length, expected_len
        )));
    }
    Ok((declared_length, consumed))
}

fn decode_sequence_header_any_length(data: &[u8]) -> Result<(usize, usize), Error> {
    match tl::decode(data)? {
        Tl::Present {
            class,
            declared_length,
            tl_byte_count,
        } if class == TypeClass::Sequence => Ok((declared_length, tl_byte_count)),
        Tl::Present { class, .. } => Err(Error::TypeMismatch {
            expected: TypeClass::Sequence.name(),
            found: class.name(),
        }),
        Tl::Absent => Err(Error::MalformedTl("sequence must not be absent".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{unsigned_integer8, OctetString};

    #[test]
    fn fixed_sequence_round_trips() {
        let mut a = OctetString::new();
        a.set_value(Some(b"id".to_vec()));
        let mut b = unsigned_integer8();
        b.set_value(Some(7)).unwrap();

        let encoded = encode_fixed(&[&a, &b]);

        let mut decoded_a = OctetString::new();
        let mut decoded_b = unsigned_integer8();
        let consumed = decode_fixed(&encoded, &mut [&mut decoded_a, &mut decoded_b]).unwrap();

        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded_a.value(), Some(&b"id"[..]));
        assert_eq!(decoded_b.value(), Some(7));
    }

    #[test]
    fn fixed_sequence_rejects_wrong_field_count() {
        let mut a = OctetString::new();
        a.set_value(Some(b"id".to_vec()));
        let encoded = encode_fixed(&[&a]);

        let mut decoded_a = OctetString::new();
        let mut decoded_b = unsigned_integer8();
        let err = decode_fixed(&encoded, &mut [&mut decoded_a, &mut decoded_b]).unwrap_err();
        assert!(matches!(err, Error::MalformedTl(_)));
    }

    #[test]
    fn list_sequence_round_trips() {
        let mut items = Vec::new();
        for v in [1u8, 2, 3] {
            let mut e = unsigned_integer8();
            e.set_value(Some(v as i128)).unwrap();
            items.push(e);
        }
        let encoded = encode_list(&items);
        let (decoded, consumed): (Vec<_>, usize) = decode_list(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].value(), Some(1));
        assert_eq!(decoded[2].value(), Some(3));
    }

    #[test]
    fn empty_list_round_trips() {
        let items: Vec<crate::primitive::Integer> = Vec::new();
        let encoded = encode_list(&items);
        assert_eq!(encoded, vec![0x70]);
        let (decoded, consumed) = decode_list::<crate::primitive::Integer>(&encoded).unwrap();
        assert_eq!(consumed, 1);
        assert!(decoded.is_empty());
    }
}
