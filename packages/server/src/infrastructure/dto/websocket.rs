//! WebSocket relay event DTOs.
//!
//! Every frame is a JSON text frame of the form
//! `{"event": "<name>", "data": { ... }}` with camelCase payload keys.

use serde::{Deserialize, Serialize};

/// Reference to a user as shown to the peer (caller card on an incoming call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
}

/// `from` of `call-user`: either a bare user id or a full caller card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallerRef {
    Id(String),
    Card(UserRef),
}

impl CallerRef {
    pub fn id(&self) -> &str {
        match self {
            CallerRef::Id(id) => id,
            CallerRef::Card(card) => &card.id,
        }
    }
}

impl From<CallerRef> for UserRef {
    fn from(caller: CallerRef) -> Self {
        match caller {
            CallerRef::Id(id) => UserRef {
                id,
                name: String::new(),
                email: None,
                avatar: None,
                profession: None,
            },
            CallerRef::Card(card) => card,
        }
    }
}

impl From<UserRef> for CallerRef {
    fn from(card: UserRef) -> Self {
        CallerRef::Card(card)
    }
}

/// `call-user` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallUserPayload {
    pub from: CallerRef,
    pub to: String,
    pub room_id: String,
}

/// `call-joined` / `end-call` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPayload {
    pub from: String,
    pub to: String,
    pub room_id: String,
}

/// `send-message` / `message` payload
///
/// On `send-message` the relay fills in the sender itself, and the relay clock
/// stands in for a missing timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    #[serde(alias = "sender", default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub room_id: String,
}

/// `incoming-call` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCallPayload {
    pub from: UserRef,
    pub room_id: String,
}

/// `call-accepted` / `call-ended` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEventPayload {
    pub from: String,
    pub room_id: String,
}

/// `peer-unreachable` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerUnreachablePayload {
    pub to: String,
    pub room_id: String,
}

/// Events sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    CallUser(CallUserPayload),
    CallJoined(SignalPayload),
    EndCall(SignalPayload),
    SendMessage(ChatMessageDto),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CallUser(_) => "call-user",
            ClientEvent::CallJoined(_) => "call-joined",
            ClientEvent::EndCall(_) => "end-call",
            ClientEvent::SendMessage(_) => "send-message",
        }
    }
}

/// Events sent by the relay server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    IncomingCall(IncomingCallPayload),
    CallAccepted(CallEventPayload),
    CallEnded(CallEventPayload),
    Message(ChatMessageDto),
    PeerUnreachable(PeerUnreachablePayload),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::IncomingCall(_) => "incoming-call",
            ServerEvent::CallAccepted(_) => "call-accepted",
            ServerEvent::CallEnded(_) => "call-ended",
            ServerEvent::Message(_) => "message",
            ServerEvent::PeerUnreachable(_) => "peer-unreachable",
        }
    }

    /// Room the event is scoped to, as sent on the wire.
    pub fn room_id(&self) -> &str {
        match self {
            ServerEvent::IncomingCall(p) => &p.room_id,
            ServerEvent::CallAccepted(p) | ServerEvent::CallEnded(p) => &p.room_id,
            ServerEvent::Message(m) => &m.room_id,
            ServerEvent::PeerUnreachable(p) => &p.room_id,
        }
    }
}
