// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! The fixed-field message schemas: the six `MessageBody` variants,
//! the nested `Time`/`Status`/`Value` choices, `ValueEntry`, and the
//! outer `Message` envelope with its CRC check.

use crate::choice::{self, Primitive};
use crate::crc;
use crate::error::Error;
use crate::primitive::{
    signed_integer8, unsigned_integer16, unsigned_integer8, Integer, OctetString, SmlElement,
};
use crate::sequence;
use crate::tl::{self, Tl, TypeClass};

/// An implicit Choice resolved at decode time from the next TL header.
/// Used for `ValueEntry::status`.
pub type Status = Primitive;
/// An implicit Choice resolved at decode time from the next TL header.
/// Used for `ValueEntry::value`.
pub type Value = Primitive;

/// The explicit Choice `{1 -> secondsIndex, 2 -> timestamp}`, both
/// carrying an Unsigned Integer 32 payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Time {
    SecIndex(u32),
    Timestamp(u32),
}

impl Default for Time {
    fn default() -> Self {
        Time::SecIndex(0)
    }
}

impl SmlElement for Time {
    fn encode(&self) -> Vec<u8> {
        let (tag, value) = match *self {
            Time::SecIndex(v) => (1u64, v),
            Time::Timestamp(v) => (2u64, v),
        };
        let tag_bytes = choice::encode_tag(1, tag);
        let mut field = crate::primitive::unsigned_integer32();
        field
            .set_value(Some(value as i128))
            .expect("u32 always fits an unsigned 32-bit field");
        choice::wrap_explicit(&tag_bytes, &field.encode())
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        let wrapper_len = choice::unwrap_explicit(data)?;
        let tag = choice::decode_tag(&data[wrapper_len..], 1)?;
        let body_offset = wrapper_len + tag.consumed;
        let mut field = crate::primitive::unsigned_integer32();
        let consumed = field.decode(&data[body_offset..])?;
        let value = field
            .value()
            .ok_or_else(|| Error::MalformedTl("Time value must not be absent".into()))?
            as u32;
        *self = match tag.value {
            1 => Time::SecIndex(value),
            2 => Time::Timestamp(value),
            other => return Err(Error::UnknownChoiceTag(other as u32)),
        };
        Ok(body_offset + consumed)
    }
}

/// A homogeneous list of readings (`GetListRes::val_list`). A thin
/// wrapper around `Vec<ValueEntry>` so the list Sequence's own `SmlElement`
/// impl can live alongside its field siblings in a fixed Sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueEntryList(pub Vec<ValueEntry>);

impl SmlElement for ValueEntryList {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_list(&self.0)
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        let (items, consumed) = sequence::decode_list(data)?;
        self.0 = items;
        Ok(consumed)
    }
}

/// A single reading inside a Get List Res.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
    pub obj_name: OctetString,
    pub status: Status,
    pub val_time: Time,
    pub unit: Integer,
    pub scaler: Integer,
    pub value: Value,
    pub value_signature: OctetString,
}

impl Default for ValueEntry {
    fn default() -> Self {
        ValueEntry {
            obj_name: OctetString::default(),
            status: Status::default(),
            val_time: Time::default(),
            unit: unsigned_integer8(),
            scaler: signed_integer8(),
            value: Value::default(),
            value_signature: OctetString::default(),
        }
    }
}

impl SmlElement for ValueEntry {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[
            &self.obj_name,
            &self.status,
            &self.val_time,
            &self.unit,
            &self.scaler,
            &self.value,
            &self.value_signature,
        ])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(
            data,
            &mut [
                &mut self.obj_name,
                &mut self.status,
                &mut self.val_time,
                &mut self.unit,
                &mut self.scaler,
                &mut self.value,
                &mut self.value_signature,
            ],
        )
    }
}

/// The request body of a Public Open exchange, opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOpenReq {
    pub code_page: OctetString,
    pub client_id: OctetString,
    pub req_file_id: OctetString,
    pub server_id: OctetString,
    pub username: OctetString,
    pub password: OctetString,
    pub sml_version: Integer,
}

impl Default for PublicOpenReq {
    fn default() -> Self {
        PublicOpenReq {
            code_page: OctetString::default(),
            client_id: OctetString::default(),
            req_file_id: OctetString::default(),
            server_id: OctetString::default(),
            username: OctetString::default(),
            password: OctetString::default(),
            sml_version: unsigned_integer8(),
        }
    }
}

impl SmlElement for PublicOpenReq {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[
            &self.code_page,
            &self.client_id,
            &self.req_file_id,
            &self.server_id,
            &self.username,
            &self.password,
            &self.sml_version,
        ])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(
            data,
            &mut [
                &mut self.code_page,
                &mut self.client_id,
                &mut self.req_file_id,
                &mut self.server_id,
                &mut self.username,
                &mut self.password,
                &mut self.sml_version,
            ],
        )
    }
}

/// The response body of a Public Open exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOpenRes {
    pub code_page: OctetString,
    pub client_id: OctetString,
    pub req_file_id: OctetString,
    pub server_id: OctetString,
    pub ref_time: Time,
    pub sml_version: Integer,
}

impl Default for PublicOpenRes {
    fn default() -> Self {
        PublicOpenRes {
            code_page: OctetString::default(),
            client_id: OctetString::default(),
            req_file_id: OctetString::default(),
            server_id: OctetString::default(),
            ref_time: Time::default(),
            sml_version: unsigned_integer8(),
        }
    }
}

impl SmlElement for PublicOpenRes {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[
            &self.code_page,
            &self.client_id,
            &self.req_file_id,
            &self.server_id,
            &self.ref_time,
            &self.sml_version,
        ])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(
            data,
            &mut [
                &mut self.code_page,
                &mut self.client_id,
                &mut self.req_file_id,
                &mut self.server_id,
                &mut self.ref_time,
                &mut self.sml_version,
            ],
        )
    }
}

/// The request body closing a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicCloseReq {
    pub global_signature: OctetString,
}

impl SmlElement for PublicCloseReq {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[&self.global_signature])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(data, &mut [&mut self.global_signature])
    }
}

/// The response body closing a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicCloseRes {
    pub global_signature: OctetString,
}

impl SmlElement for PublicCloseRes {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[&self.global_signature])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(data, &mut [&mut self.global_signature])
    }
}

/// The request body asking for a named reading list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetListReq {
    pub client_id: OctetString,
    pub server_id: OctetString,
    pub username: OctetString,
    pub password: OctetString,
    pub list_name: OctetString,
}

impl SmlElement for GetListReq {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[
            &self.client_id,
            &self.server_id,
            &self.username,
            &self.password,
            &self.list_name,
        ])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(
            data,
            &mut [
                &mut self.client_id,
                &mut self.server_id,
                &mut self.username,
                &mut self.password,
                &mut self.list_name,
            ],
        )
    }
}

/// The response body carrying a reading list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetListRes {
    pub client_id: OctetString,
    pub server_id: OctetString,
    pub list_name: OctetString,
    pub act_sensor_time: Time,
    pub val_list: ValueEntryList,
    pub list_signature: OctetString,
    pub act_gateway_time: Time,
}

impl SmlElement for GetListRes {
    fn encode(&self) -> Vec<u8> {
        sequence::encode_fixed(&[
            &self.client_id,
            &self.server_id,
            &self.list_name,
            &self.act_sensor_time,
            &self.val_list,
            &self.list_signature,
            &self.act_gateway_time,
        ])
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        sequence::decode_fixed(
            data,
            &mut [
                &mut self.client_id,
                &mut self.server_id,
                &mut self.list_name,
                &mut self.act_sensor_time,
                &mut self.val_list,
                &mut self.list_signature,
                &mut self.act_gateway_time,
            ],
        )
    }
}

const TAG_PUBLIC_OPEN_REQ: u64 = 0x0100;
const TAG_PUBLIC_OPEN_RES: u64 = 0x0101;
const TAG_PUBLIC_CLOSE_REQ: u64 = 0x0200;
const TAG_PUBLIC_CLOSE_RES: u64 = 0x0201;
const TAG_GET_LIST_REQ: u64 = 0x0700;
const TAG_GET_LIST_RES: u64 = 0x0701;

/// Message body tags the SML standard reserves for message kinds this
/// crate does not model. Decoding one of these still fails with
/// `UnknownChoiceTag`, but carrying the name here lets the decode path
/// log which reserved kind was seen instead of a bare tag number.
const RESERVED_TAGS: &[(u64, &str)] = &[
    (0x0300, "GetProfilePackReq"),
    (0x0301, "GetProfilePackRes"),
    (0x0400, "GetProfileListReq"),
    (0x0401, "GetProfileListRes"),
    (0x0500, "GetProcParameterReq"),
    (0x0501, "GetProcParameterRes"),
    (0x0600, "SetProcParameterReq"),
    (0x0601, "SetProcParameterRes"),
    (0xFF01, "AttentionRes"),
];

/// The explicit Choice selecting which request/response schema a
/// Message's body holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    PublicOpenReq(PublicOpenReq),
    PublicOpenRes(PublicOpenRes),
    PublicCloseReq(PublicCloseReq),
    PublicCloseRes(PublicCloseRes),
    GetListReq(GetListReq),
    GetListRes(GetListRes),
}

impl Default for MessageBody {
    fn default() -> Self {
        MessageBody::PublicOpenReq(PublicOpenReq::default())
    }
}

impl MessageBody {
    fn tag_and_bytes(&self) -> (u64, Vec<u8>) {
        match self {
            MessageBody::PublicOpenReq(v) => (TAG_PUBLIC_OPEN_REQ, v.encode()),
            MessageBody::PublicOpenRes(v) => (TAG_PUBLIC_OPEN_RES, v.encode()),
            MessageBody::PublicCloseReq(v) => (TAG_PUBLIC_CLOSE_REQ, v.encode()),
            MessageBody::PublicCloseRes(v) => (TAG_PUBLIC_CLOSE_RES, v.encode()),
            MessageBody::GetListReq(v) => (TAG_GET_LIST_REQ, v.encode()),
            MessageBody::GetListRes(v) => (TAG_GET_LIST_RES, v.encode()),
        }
    }
}

impl SmlElement for MessageBody {
    fn encode(&self) -> Vec<u8> {
        let (tag, body) = self.tag_and_bytes();
        let tag_bytes = choice::encode_tag(2, tag);
        choice::wrap_explicit(&tag_bytes, &body)
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        let wrapper_len = choice::unwrap_explicit(data)?;
        let tag = choice::decode_tag(&data[wrapper_len..], 2)?;
        let body_offset = wrapper_len + tag.consumed;
        macro_rules! decode_variant {
            ($variant:ident, $ty:ty) => {{
                let mut v = <$ty>::default();
                let consumed = v.decode(&data[body_offset..])?;
                *self = MessageBody::$variant(v);
                Ok(body_offset + consumed)
            }};
        }
        match tag.value {
            TAG_PUBLIC_OPEN_REQ => decode_variant!(PublicOpenReq, PublicOpenReq),
            TAG_PUBLIC_OPEN_RES => decode_variant!(PublicOpenRes, PublicOpenRes),
            TAG_PUBLIC_CLOSE_REQ => decode_variant!(PublicCloseReq, PublicCloseReq),
            TAG_PUBLIC_CLOSE_RES => decode_variant!(PublicCloseRes, PublicCloseRes),
            TAG_GET_LIST_REQ => decode_variant!(GetListReq, GetListReq),
            TAG_GET_LIST_RES => decode_variant!(GetListRes, GetListRes),
            other => {
                if let Some((_, name)) = RESERVED_TAGS.iter().find(|(t, _)| *t == other) {
                    log::debug!(
                        "message body tag {:#06x} ({}) is reserved and not implemented",
                        other,
                        name
                    );
                } else {
                    log::debug!("unknown message body tag {:#06x}", other);
                }
                Err(Error::UnknownChoiceTag(other as u32))
            }
        }
    }
}

/// A single SML Message: the fixed 6-field envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub transaction_id: OctetString,
    pub group_no: Integer,
    pub abort_on_error: Integer,
    pub body: MessageBody,
    /// The CRC stored on the wire, populated by `decode`. Ignored by
    /// `encode`, which always recomputes the CRC over the freshly
    /// serialized field bytes.
    pub crc: u16,
}

impl Default for Message {
    fn default() -> Self {
        Message {
            transaction_id: OctetString::default(),
            group_no: unsigned_integer8(),
            abort_on_error: unsigned_integer8(),
            body: MessageBody::default(),
            crc: 0,
        }
    }
}

impl SmlElement for Message {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = tl::encode_sequence(6);
        bytes.extend(self.transaction_id.encode());
        bytes.extend(self.group_no.encode());
        bytes.extend(self.abort_on_error.encode());
        bytes.extend(self.body.encode());

        let crc_value = crc::as_integer(&bytes);
        let mut crc_field = unsigned_integer16();
        crc_field
            .set_value(Some(crc_value as i128))
            .expect("CRC-16 always fits an unsigned 16-bit field");
        bytes.extend(crc_field.encode());
        bytes.push(0x00); // EndOfMessage

        bytes
    }

    fn decode(&mut self, data: &[u8]) -> Result<usize, Error> {
        let (declared_length, tl_byte_count) = match tl::decode(data)? {
            Tl::Present {
                class,
                declared_length,
                tl_byte_count,
            } if class == TypeClass::Sequence => (declared_length, tl_byte_count),
            Tl::Present { class, .. } => {
                return Err(Error::TypeMismatch {
                    expected: TypeClass::Sequence.name(),
                    found: class.name(),
                })
            }
            Tl::Absent => return Err(Error::MalformedTl("message must not be absent".into())),
        };
        if declared_length != 6 {
            return Err(Error::MalformedTl(format!(
                "message declares {} fields, expected 6",
                declared_length
            )));
        }

        let mut offset = tl_byte_count;
        offset += self.transaction_id.decode(&data[offset..])?;
        offset += self.group_no.decode(&data[offset..])?;
        offset += self.abort_on_error.decode(&data[offset..])?;
        offset += self.body.decode(&data[offset..])?;
        let prefix_len = offset;

        let mut crc_field = unsigned_integer16();
        offset += crc_field.decode(&data[offset..])?;
        let stored_crc = crc_field
            .value()
            .ok_or_else(|| Error::MalformedTl("message CRC must not be absent".into()))?
            as u16;

        let mut eom = crate::primitive::EndOfMessage::new();
        offset += eom.decode(&data[offset..])?;

        let computed_crc = crc::as_integer(&data[..prefix_len]);
        if computed_crc != stored_crc {
            log::debug!(
                "message CRC mismatch: stored {:#06x}, computed {:#06x}",
                stored_crc,
                computed_crc
            );
            return Err(Error::ChecksumMismatch {
                expected: stored_crc,
                found: computed_crc,
            });
        }
        self.crc = stored_crc;

        log::trace!("message decoded, {} bytes, tag verified", offset);
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_sec_index_round_trips() {
        let t = Time::SecIndex(12345);
        let encoded = t.encode();
        let mut decoded = Time::default();
        let consumed = decoded.decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, Time::SecIndex(12345));
    }

    #[test]
    fn time_unknown_tag_is_rejected() {
        let tag_bytes = choice::encode_tag(1, 9);
        let mut value = crate::primitive::unsigned_integer32();
        value.set_value(Some(1)).unwrap();
        let wrapped = choice::wrap_explicit(&tag_bytes, &value.encode());
        let mut t = Time::default();
        let err = t.decode(&wrapped).unwrap_err();
        assert!(matches!(err, Error::UnknownChoiceTag(9)));
    }

    #[test]
    fn public_open_req_round_trips() {
        let mut req = PublicOpenReq::default();
        req.client_id.set_value(Some(b"client".to_vec()));
        req.sml_version.set_value(Some(1)).unwrap();

        let encoded = req.encode();
        let mut decoded = PublicOpenReq::default();
        let consumed = decoded.decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, req);
    }

    #[test]
    fn message_body_round_trips_get_list_res() {
        let mut res = GetListRes::default();
        res.client_id.set_value(Some(b"c".to_vec()));
        let mut entry = ValueEntry::default();
        entry.obj_name.set_value(Some(b"1-0:1.8.0".to_vec()));
        entry.unit.set_value(Some(30)).unwrap();
        entry.scaler.set_value(Some(-1)).unwrap();
        res.val_list.0.push(entry);

        let body = MessageBody::GetListRes(res);
        let encoded = body.encode();
        let mut decoded = MessageBody::default();
        let consumed = decoded.decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, body);
    }

    #[test]
    fn message_body_reserved_tag_is_unknown_choice_tag() {
        let tag_bytes = choice::encode_tag(2, 0xFF01);
        let wrapped = choice::wrap_explicit(&tag_bytes, &[0x01]);
        let mut body = MessageBody::default();
        let err = body.decode(&wrapped).unwrap_err();
        assert!(matches!(err, Error::UnknownChoiceTag(0xFF01)));
    }

    #[test]
    fn message_round_trips_and_crc_matches() {
        let mut msg = Message::default();
        msg.transaction_id
            .set_value(Some(vec![0x05, 0x01, 0x02, 0x03, 0x04]));
        msg.group_no.set_value(Some(0)).unwrap();
        msg.abort_on_error.set_value(Some(0)).unwrap();
        let mut req = PublicOpenReq::default();
        req.sml_version.set_value(Some(1)).unwrap();
        msg.body = MessageBody::PublicOpenReq(req);

        let encoded = msg.encode();
        let mut decoded = Message::default();
        let consumed = decoded.decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.transaction_id, msg.transaction_id);
        assert_eq!(decoded.body, msg.body);
    }

    #[test]
    fn message_rejects_corrupted_crc() {
        let mut msg = Message::default();
        msg.group_no.set_value(Some(0)).unwrap();
        msg.abort_on_error.set_value(Some(0)).unwrap();
        let mut encoded = msg.encode();
        let crc_payload_index = encoded.len() - 1 - 2;
        encoded[crc_payload_index] ^= 0xFF;

        let mut decoded = Message::default();
        let err = decoded.decode(&encoded).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }
}
