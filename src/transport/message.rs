//! Protocol-level CoAP messages
//!
//! `CoapMessage` is the shape the client core reads and writes. It carries
//! exactly the fields the pub/sub exchange needs: type, code, message ID, the
//! command marker (an ETag option), the topic path (Uri-Path options) and the
//! payload. Wire encoding is delegated to `coap-lite`.

use std::fmt;

use coap_lite::{CoapOption, MessageClass, MessageType as WireType, Packet};

use crate::utils::error::{PubsubError, Result};

/// CoAP message type (RFC 7252 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Confirmable,
    NonConfirmable,
    Acknowledgement,
    Reset,
}

impl From<MessageType> for WireType {
    fn from(t: MessageType) -> Self {
        match t {
            MessageType::Confirmable => WireType::Confirmable,
            MessageType::NonConfirmable => WireType::NonConfirmable,
            MessageType::Acknowledgement => WireType::Acknowledgement,
            MessageType::Reset => WireType::Reset,
        }
    }
}

impl From<WireType> for MessageType {
    fn from(t: WireType) -> Self {
        match t {
            WireType::Confirmable => MessageType::Confirmable,
            WireType::NonConfirmable => MessageType::NonConfirmable,
            WireType::Acknowledgement => MessageType::Acknowledgement,
            WireType::Reset => MessageType::Reset,
        }
    }
}

/// Raw CoAP code byte (`class << 5 | detail`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code(pub u8);

impl Code {
    pub const EMPTY: Code = Code(0x00);
    pub const GET: Code = Code(0x01);
    /// 2.05 Content
    pub const CONTENT: Code = Code(0x45);
}

/// Command keyword carried in the ETag option of every request we send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    AddSub,
    RemSub,
    Heartbeat,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::AddSub => "ADDSUB",
            Command::RemSub => "REMSUB",
            Command::Heartbeat => "HB",
        }
    }

    /// Parse a marker as it appears on the wire. Unknown markers yield `None`.
    pub fn from_marker(raw: &[u8]) -> Option<Command> {
        match raw {
            b"ADDSUB" => Some(Command::AddSub),
            b"REMSUB" => Some(Command::RemSub),
            b"HB" => Some(Command::Heartbeat),
            _ => None,
        }
    }
}

/// Canonical form of a topic: its non-empty Uri-Path segments joined by `/`.
/// `"/a//b/"` and `"a/b"` name the same server resource.
pub fn topic_path(topic: &str) -> String {
    topic
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoapMessage {
    pub message_type: MessageType,
    pub code: Code,
    pub message_id: u16,
    pub command: Option<Command>,
    /// Topic name, `/`-separated. Empty when the message has no Uri-Path.
    pub path: String,
    pub payload: Vec<u8>,
}

impl CoapMessage {
    /// A confirmable GET tagged with `command` and addressed to `topic`.
    pub fn request(command: Command, topic: &str, message_id: u16) -> Self {
        Self {
            message_type: MessageType::Confirmable,
            code: Code::GET,
            message_id,
            command: Some(command),
            path: topic.to_string(),
            payload: Vec::new(),
        }
    }

    /// A confirmable GET tagged `HB` carrying a fixed text payload.
    pub fn heartbeat(message_id: u16, payload: &str) -> Self {
        Self {
            message_type: MessageType::Confirmable,
            code: Code::GET,
            message_id,
            command: Some(Command::Heartbeat),
            path: String::new(),
            payload: payload.as_bytes().to_vec(),
        }
    }

    /// Empty acknowledgement for an inbound confirmable message.
    pub fn ack(message_id: u16) -> Self {
        Self {
            message_type: MessageType::Acknowledgement,
            code: Code::EMPTY,
            message_id,
            command: None,
            path: String::new(),
            payload: Vec::new(),
        }
    }

    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// True for an acknowledgement that carries no publication.
    pub fn is_bare_ack(&self) -> bool {
        self.message_type == MessageType::Acknowledgement && self.payload.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut packet = Packet::new();
        packet.header.set_type(self.message_type.into());
        packet.header.code = MessageClass::from(self.code.0);
        packet.header.message_id = self.message_id;

        if let Some(command) = self.command {
            packet.add_option(CoapOption::ETag, command.as_str().as_bytes().to_vec());
        }
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            packet.add_option(CoapOption::UriPath, segment.as_bytes().to_vec());
        }
        packet.payload = self.payload.clone();

        packet
            .to_bytes()
            .map_err(|e| PubsubError::codec(format!("encode message {}: {e:?}", self.message_id)))
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let packet = Packet::from_bytes(buf)
            .map_err(|e| PubsubError::codec(format!("decode {} bytes: {e:?}", buf.len())))?;

        let command = packet
            .get_option(CoapOption::ETag)
            .and_then(|values| values.front())
            .and_then(|raw| Command::from_marker(raw));

        let path = packet
            .get_option(CoapOption::UriPath)
            .map(|segments| {
                segments
                    .iter()
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();

        Ok(Self {
            message_type: packet.header.get_type().into(),
            code: Code(u8::from(packet.header.code)),
            message_id: packet.header.message_id,
            command,
            path,
            payload: packet.payload,
        })
    }
}
