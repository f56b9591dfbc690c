// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! A codec for the Smart Message Language (SML) protocol used by smart
//! electricity meters.
//!
//! SML frames a sequence of Messages inside an escape-delimited
//! [`Telegram`](telegram::Telegram). Each Message carries a typed
//! payload ([`MessageBody`](message::MessageBody): Public Open, Public
//! Close, Get List, ...) built from nested sequences and TL-prefixed
//! primitive values, protected by two independent CRC-16 checksums (one
//! per Message, one per Telegram).
//!
//! # Examples
//! ```no_run
//! # use sml::telegram::Telegram;
//! # fn main() -> Result<(), sml::error::Error> {
//! let bytes: &[u8] = &[];
//! let telegram = Telegram::decode(bytes)?;
//! for message in &telegram.messages {
//!     println!("{:?}", message.body);
//! }
//! # Ok(())
//! # }
//! ```
pub mod choice;
pub mod crc;
pub mod dump;
pub mod error;
pub mod message;
pub mod primitive;
pub mod sequence;
pub mod telegram;
pub mod tl;

pub use error::Error;
pub use telegram::Telegram;
