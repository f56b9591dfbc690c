// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Transport framing around a stream of Messages.

use crate::crc;
use crate::error::Error;
use crate::message::Message;
use crate::primitive::SmlElement;

const START_TAG: [u8; 8] = [0x1B, 0x1B, 0x1B, 0x1B, 0x01, 0x01, 0x01, 0x01];
const END_PREFIX: [u8; 5] = [0x1B, 0x1B, 0x1B, 0x1B, 0x1A];

/// Number of zero padding bytes appended after `len` bytes of messages:
/// `len mod 4`, not an alignment-to-4 count.
fn padding_for(len: usize) -> u8 {
    (len % 4) as u8
}

/// A framed telegram: an ordered list of Messages plus the trailing
/// padding byte count (the interior message length, mod 4) that
/// precedes the end tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Telegram {
    pub messages: Vec<Message>,
}

impl Telegram {
    pub fn new() -> Self {
        Telegram::default()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut interior = Vec::new();
        for message in &self.messages {
            interior.extend(message.encode());
        }

        let padding = padding_for(interior.len());

        let mut out = Vec::with_capacity(interior.len() + 16 + padding as usize);
        out.extend_from_slice(&START_TAG);
        out.extend_from_slice(&interior);
        out.extend(std::iter::repeat(0u8).take(padding as usize));
        out.extend_from_slice(&END_PREFIX);
        out.push(padding);
        let crc_bytes = crc::as_byte_pair(&out);
        out.extend_from_slice(&crc_bytes);
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 16 {
            return Err(Error::MalformedTl(format!(
                "telegram shorter than the minimum 16-byte frame: {} bytes",
                data.len()
            )));
        }
        if data[..8] != START_TAG {
            return Err(Error::BadStartEscape);
        }
        if data[data.len() - 8..data.len() - 3] != END_PREFIX {
            return Err(Error::BadEndEscape);
        }
        let padding = data[data.len() - 3];
        if padding > 3 {
            return Err(Error::BadPadding(padding));
        }

        let stored_crc = [data[data.len() - 2], data[data.len() - 1]];
        let computed_crc = crc::as_byte_pair(&data[..data.len() - 2]);
        if computed_crc != stored_crc {
            log::debug!(
                "telegram CRC mismatch: stored {:02x?}, computed {:02x?}",
                stored_crc,
                computed_crc
            );
            return Err(Error::ChecksumMismatch {
                expected: u16::from_le_bytes(stored_crc),
                found: u16::from_le_bytes(computed_crc),
            });
        }

        let interior_end = data.len() - 8 - padding as usize;
        let interior = &data[8..interior_end];

        let mut messages = Vec::new();
        let mut offset = 0;
        while offset < interior.len() {
            let mut message = Message::default();
            let consumed = message.decode(&interior[offset..])?;
            offset += consumed;
            messages.push(message);
        }
        log::trace!(
            "telegram decoded, {} message(s), {} padding byte(s)",
            messages.len(),
            padding
        );

        Ok(Telegram { messages })
    }
}
