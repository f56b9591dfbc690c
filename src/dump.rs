// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! The indented hex/name/type/value diagnostic dumper, matching the
//! column widths of the reference implementation's `getText` helpers.

use crate::choice::Primitive;
use crate::message::{
    Message, MessageBody, PublicCloseReq, PublicCloseRes, PublicOpenReq, PublicOpenRes, Time,
    ValueEntry,
};
use crate::primitive::{Boolean, Integer, OctetString, SmlElement};
use crate::telegram::Telegram;

const COL_WIDTH_BIN: usize = 35;
const COL_WIDTH_NAME: usize = 15;
const COL_WIDTH_TYPE: usize = 30;

fn line(depth: usize, hex_bytes: &[u8], name: &str, type_name: &str, value: &str) -> String {
    let indent = "  ".repeat(depth);
    let mut hex_col = hex::encode(hex_bytes);
    if hex_col.len() > COL_WIDTH_BIN {
        hex_col.truncate(COL_WIDTH_BIN);
    }
    format!(
        "{}{:<bin$}{:<name$}{:<typ$}{}\n",
        indent,
        hex_col,
        name,
        type_name,
        value,
        bin = COL_WIDTH_BIN,
        name = COL_WIDTH_NAME,
        typ = COL_WIDTH_TYPE
    )
}

/// Produces the indented hex/name/type/value dump for any element of
/// the decoded tree.
pub trait Dump {
    fn dump(&self, depth: usize, name: &str) -> String;
}

impl Dump for OctetString {
    fn dump(&self, depth: usize, name: &str) -> String {
        let value = match self.value() {
            Some(bytes) => hex::encode(bytes),
            None => "<absent>".to_string(),
        };
        line(depth, &self.encode(), name, "OctetString", &value)
    }
}

impl Dump for Boolean {
    fn dump(&self, depth: usize, name: &str) -> String {
        let value = match self.value() {
            Some(true) => "true".to_string(),
            Some(false) => "false".to_string(),
            None => "<absent>".to_string(),
        };
        line(depth, &self.encode(), name, "Boolean", &value)
    }
}

impl Dump for Integer {
    fn dump(&self, depth: usize, name: &str) -> String {
        let type_name = match self.width() {
            Some(w) => format!(
                "{}Integer{}",
                if self.is_signed() { "Signed" } else { "Unsigned" },
                w * 8
            ),
            None => format!(
                "{}Integer",
                if self.is_signed() { "Signed" } else { "Unsigned" }
            ),
        };
        let value = match self.value() {
            Some(v) => v.to_string(),
            None => "<absent>".to_string(),
        };
        line(depth, &self.encode(), name, &type_name, &value)
    }
}

impl Dump for Primitive {
    fn dump(&self, depth: usize, name: &str) -> String {
        match self {
            Primitive::Absent => line(depth, &self.encode(), name, "Absent", "<absent>"),
            Primitive::OctetString(v) => v.dump(depth, name),
            Primitive::Boolean(v) => v.dump(depth, name),
            Primitive::Integer(v) => v.dump(depth, name),
            Primitive::Sequence(items) => {
                let mut out = line(depth, &[], name, "Sequence", &format!("{} elements", items.len()));
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&item.dump(depth + 1, &format!("[Nr. {}]", i + 1)));
                }
                out
            }
        }
    }
}

impl Dump for Time {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &self.encode(), name, "Time", "Choice");
        let (tag, value) = match *self {
            Time::SecIndex(v) => (1u8, v),
            Time::Timestamp(v) => (2u8, v),
        };
        out.push_str(&line(depth + 1, &[tag], "Tag", "UnsignedInteger8", &tag.to_string()));
        out.push_str(&line(
            depth + 1,
            &value.to_be_bytes(),
            "Element",
            "UnsignedInteger32",
            &value.to_string(),
        ));
        out
    }
}

impl Dump for ValueEntry {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "ValueEntry", "Sequence");
        out.push_str(&self.obj_name.dump(depth + 1, "ObjName"));
        out.push_str(&self.status.dump(depth + 1, "Status"));
        out.push_str(&self.val_time.dump(depth + 1, "ValTime"));
        out.push_str(&self.unit.dump(depth + 1, "Unit"));
        out.push_str(&self.scaler.dump(depth + 1, "Scaler"));
        out.push_str(&self.value.dump(depth + 1, "Value"));
        out.push_str(&self.value_signature.dump(depth + 1, "ValueSignature"));
        out
    }
}

impl Dump for PublicOpenReq {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "PublicOpenReq", "Sequence");
        out.push_str(&self.code_page.dump(depth + 1, "CodePage"));
        out.push_str(&self.client_id.dump(depth + 1, "ClientId"));
        out.push_str(&self.req_file_id.dump(depth + 1, "ReqFileId"));
        out.push_str(&self.server_id.dump(depth + 1, "ServerId"));
        out.push_str(&self.username.dump(depth + 1, "Username"));
        out.push_str(&self.password.dump(depth + 1, "Password"));
        out.push_str(&self.sml_version.dump(depth + 1, "SmlVersion"));
        out
    }
}

impl Dump for PublicOpenRes {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "PublicOpenRes", "Sequence");
        out.push_str(&self.code_page.dump(depth + 1, "CodePage"));
        out.push_str(&self.client_id.dump(depth + 1, "ClientId"));
        out.push_str(&self.req_file_id.dump(depth + 1, "ReqFileId"));
        out.push_str(&self.server_id.dump(depth + 1, "ServerId"));
        out.push_str(&self.ref_time.dump(depth + 1, "RefTime"));
        out.push_str(&self.sml_version.dump(depth + 1, "SmlVersion"));
        out
    }
}

impl Dump for PublicCloseReq {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "PublicCloseReq", "Sequence");
        out.push_str(&self.global_signature.dump(depth + 1, "GlobalSignature"));
        out
    }
}

impl Dump for PublicCloseRes {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "PublicCloseRes", "Sequence");
        out.push_str(&self.global_signature.dump(depth + 1, "GlobalSignature"));
        out
    }
}

impl Dump for crate::message::GetListReq {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "GetListReq", "Sequence");
        out.push_str(&self.client_id.dump(depth + 1, "ClientId"));
        out.push_str(&self.server_id.dump(depth + 1, "ServerId"));
        out.push_str(&self.username.dump(depth + 1, "Username"));
        out.push_str(&self.password.dump(depth + 1, "Password"));
        out.push_str(&self.list_name.dump(depth + 1, "ListName"));
        out
    }
}

impl Dump for crate::message::GetListRes {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "GetListRes", "Sequence");
        out.push_str(&self.client_id.dump(depth + 1, "ClientId"));
        out.push_str(&self.server_id.dump(depth + 1, "ServerId"));
        out.push_str(&self.list_name.dump(depth + 1, "ListName"));
        out.push_str(&self.act_sensor_time.dump(depth + 1, "ActSensorTime"));
        out.push_str(&line(
            depth + 1,
            &[],
            "ValList",
            "Sequence",
            &format!("{} elements", self.val_list.0.len()),
        ));
        for (i, entry) in self.val_list.0.iter().enumerate() {
            out.push_str(&entry.dump(depth + 2, &format!("[Nr. {}]", i + 1)));
        }
        out.push_str(&self.list_signature.dump(depth + 1, "ListSignature"));
        out.push_str(&self.act_gateway_time.dump(depth + 1, "ActGatewayTime"));
        out
    }
}

impl Dump for MessageBody {
    fn dump(&self, depth: usize, name: &str) -> String {
        let (tag, type_name): (u16, &str) = match self {
            MessageBody::PublicOpenReq(_) => (0x0100, "PublicOpenReq"),
            MessageBody::PublicOpenRes(_) => (0x0101, "PublicOpenRes"),
            MessageBody::PublicCloseReq(_) => (0x0200, "PublicCloseReq"),
            MessageBody::PublicCloseRes(_) => (0x0201, "PublicCloseRes"),
            MessageBody::GetListReq(_) => (0x0700, "GetListReq"),
            MessageBody::GetListRes(_) => (0x0701, "GetListRes"),
        };
        let mut out = line(depth, &[], name, "Choice", type_name);
        out.push_str(&line(
            depth + 1,
            &tag.to_be_bytes(),
            "Tag",
            "UnsignedInteger16",
            &format!("{:#06x}", tag),
        ));
        let element = match self {
            MessageBody::PublicOpenReq(v) => v.dump(depth + 1, "Element"),
            MessageBody::PublicOpenRes(v) => v.dump(depth + 1, "Element"),
            MessageBody::PublicCloseReq(v) => v.dump(depth + 1, "Element"),
            MessageBody::PublicCloseRes(v) => v.dump(depth + 1, "Element"),
            MessageBody::GetListReq(v) => v.dump(depth + 1, "Element"),
            MessageBody::GetListRes(v) => v.dump(depth + 1, "Element"),
        };
        out.push_str(&element);
        out
    }
}

impl Dump for Message {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "Message", "Sequence");
        out.push_str(&self.transaction_id.dump(depth + 1, "TransactionId"));
        out.push_str(&self.group_no.dump(depth + 1, "GroupNo"));
        out.push_str(&self.abort_on_error.dump(depth + 1, "AbortOnError"));
        out.push_str(&self.body.dump(depth + 1, "MessageBody"));
        out.push_str(&line(
            depth + 1,
            &self.crc.to_be_bytes(),
            "Crc",
            "UnsignedInteger16",
            &format!("{:#06x}", self.crc),
        ));
        out.push_str(&line(depth + 1, &[0x00], "EndOfMessage", "EndOfMessage", "0x00"));
        out
    }
}

impl Dump for Telegram {
    fn dump(&self, depth: usize, name: &str) -> String {
        let mut out = line(depth, &[], name, "Telegram", &format!("{} message(s)", self.messages.len()));
        for (i, message) in self.messages.iter().enumerate() {
            out.push_str(&message.dump(depth + 1, &format!("[Nr. {}]", i + 1)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PublicOpenReq;

    #[test]
    fn octet_string_dump_shows_hex_and_absent() {
        let mut s = OctetString::new();
        s.set_value(Some(vec![0xAB, 0xCD]));
        let text = s.dump(0, "ClientId");
        assert!(text.contains("ClientId"));
        assert!(text.contains("OctetString"));
        assert!(text.contains("abcd"));

        let absent = OctetString::new();
        assert!(absent.dump(0, "ClientId").contains("<absent>"));
    }

    #[test]
    fn nested_dump_indents_by_depth() {
        let mut req = PublicOpenReq::default();
        req.sml_version.set_value(Some(1)).unwrap();
        let text = req.dump(0, "Body");
        let version_line = text.lines().find(|l| l.contains("SmlVersion")).unwrap();
        assert!(version_line.starts_with("  "));
    }

    #[test]
    fn telegram_dump_labels_messages_by_index() {
        let mut msg = Message::default();
        msg.group_no.set_value(Some(0)).unwrap();
        msg.abort_on_error.set_value(Some(0)).unwrap();
        let telegram = Telegram {
            messages: vec![msg],
        };
        let text = telegram.dump(0, "Telegram");
        assert!(text.contains("[Nr. 1]"));
    }
}
