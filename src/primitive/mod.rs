// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! SML primitive value codecs: Octet String, Boolean, Integer and
//! End-Of-Message.

mod boolean;
mod eom;
mod integer;
mod octet_string;

pub use boolean::Boolean;
pub use eom::EndOfMessage;
pub use integer::{
    signed_integer, signed_integer16, signed_integer32, signed_integer64, signed_integer8,
    unsigned_integer, unsigned_integer16, unsigned_integer32, unsigned_integer64,
    unsigned_integer8, Integer,
};
pub use octet_string::OctetString;

use crate::error::Error;

/// Common behavior of every element that can appear in an SML Sequence
/// or Choice: encode to bytes, and decode by mutating `self` from the
/// front of a buffer, returning the number of bytes consumed.
///
/// Decoding mutates in place (rather than returning `Self`) so that
/// trait objects (`&dyn SmlElement`) can be used uniformly by the
/// generic Sequence/Choice helpers in `sequence.rs` and `choice.rs`.
pub trait SmlElement: std::fmt::Debug {
    fn encode(&self) -> Vec<u8>;
    fn decode(&mut self, data: &[u8]) -> Result<usize, Error>;

    /// Length of this element's current encoded form.
    fn byte_length(&self) -> usize {
        self.encode().len()
    }
}

/// Verifies the round-trip invariant: re-encoding a just-decoded
/// element must reproduce the bytes it consumed.
pub(crate) fn verify_round_trip(encoded: &[u8], consumed: &[u8]) -> Result<(), Error> {
    if encoded == consumed {
        Ok(())
    } else {
        Err(Error::SelfEncodeMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octet_string_round_trips_value_empty_and_absent() {
        let mut s = OctetString::new();
        s.set_value(Some(vec![1, 2, 3]));
        let encoded = s.encode();
        let mut decoded = OctetString::new();
        let consumed = decoded.decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.value(), Some(&vec![1u8, 2, 3][..]));

        let mut empty = OctetString::new();
        empty.set_value(Some(vec![]));
        assert_eq!(empty.encode(), vec![0x00]);

        let absent = OctetString::new();
        assert_eq!(absent.encode(), vec![0x01]);
    }

    #[test]
    fn boolean_round_trips() {
        let mut b = Boolean::new();
        b.set_value(Some(true));
        let encoded = b.encode();
        let mut decoded = Boolean::new();
        decoded.decode(&encoded).unwrap();
        assert_eq!(decoded.value(), Some(true));
    }

    #[test]
    fn end_of_message_has_no_tl() {
        let eom = EndOfMessage::new();
        assert_eq!(eom.encode(), vec![0x00]);
    }
}
