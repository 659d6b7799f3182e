//! Message formatting utilities for client display.

use swaphere_server::{domain::ChatMessage, infrastructure::dto::websocket::UserRef};
use swaphere_shared::time::format_hh_mm;

use crate::call::{CallUpdate, EndReason};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format an incoming-call notice with the caller's card
    pub fn format_incoming_call(from: &UserRef) -> String {
        let mut output = format!("\n* Incoming call from {} ({})", from.name, from.id);
        if let Some(profession) = &from.profession {
            output.push_str(&format!(", {}", profession));
        }
        output.push_str(&format!(
            "\n  /accept {} to answer, /decline {} to decline\n",
            from.id, from.id
        ));
        output
    }

    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `sender_name` - Display name of the sender
    /// * `text` - Message body
    /// * `timestamp` - RFC 3339 timestamp as sent on the wire
    pub fn format_chat_message(sender_name: &str, text: &str, timestamp: &str) -> String {
        format!("\n[{}] {}: {}\n", format_hh_mm(timestamp), sender_name, text)
    }

    pub fn format_transcript_entry(message: &ChatMessage) -> String {
        Self::format_chat_message(
            &message.sender_name,
            message.text.as_str(),
            &message.timestamp.to_rfc3339(),
        )
    }

    /// Format a change of the current call
    pub fn format_call_update(update: &CallUpdate, peer_name: &str) -> String {
        match update {
            CallUpdate::Activated => format!("\n* In call with {}\n", peer_name),
            CallUpdate::Message(message) => Self::format_transcript_entry(message),
            CallUpdate::PeerUnreachable => {
                format!("\n* {} is offline right now\n", peer_name)
            }
            CallUpdate::Ended(EndReason::TransportLost) => {
                "\n* Call ended: connection to the relay was lost\n".to_string()
            }
            CallUpdate::Ended(reason) => format!("\n* Call with {} ended: {}\n", peer_name, reason),
        }
    }

    pub fn format_toggle(label: &str, on: bool) -> String {
        format!("\n* {}: {}\n", label, if on { "on" } else { "off" })
    }

    /// Format the list of online users, marking the current user
    pub fn format_online_users(online: &[String], me: &str) -> String {
        let mut output = String::from("\nOnline:\n");
        if online.is_empty() {
            output.push_str("(nobody)\n");
        }
        for user_id in online {
            let suffix = if user_id == me { " (me)" } else { "" };
            output.push_str(&format!("  {}{}\n", user_id, suffix));
        }
        output
    }

    pub fn format_help() -> String {
        [
            "",
            "Commands:",
            "  /call <userId> [name]  start a call",
            "  /accept [userId]       answer an incoming call",
            "  /decline [userId]      decline an incoming call",
            "  /join                  confirm you joined the video conference",
            "  /mute                  toggle microphone",
            "  /video                 toggle camera",
            "  /chat                  toggle chat panel",
            "  /end                   end the current call",
            "  /who                   list online users",
            "  /quit                  exit",
            "  anything else          send a chat message",
            "",
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swaphere_server::domain::{MessageText, RoomId, Timestamp, UserId};

    #[test]
    fn test_format_incoming_call() {
        // テスト項目: 着信通知に発信者の名前・ID・職業と応答方法が含まれる
        // given (前提条件):
        let from = UserRef {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: None,
            avatar: None,
            profession: Some("Engineer".to_string()),
        };

        // when (操作):
        let result = MessageFormatter::format_incoming_call(&from);

        // then (期待する結果):
        assert!(result.contains("Incoming call from Ada (u1), Engineer"));
        assert!(result.contains("/accept u1"));
    }

    #[test]
    fn test_format_chat_message_keeps_unparseable_timestamp() {
        // テスト項目: 解析できないタイムスタンプはそのまま表示される
        // given (前提条件):
        // when (操作):
        let result = MessageFormatter::format_chat_message("Grace", "hi", "yesterday");

        // then (期待する結果):
        assert_eq!(result, "\n[yesterday] Grace: hi\n");
    }

    #[test]
    fn test_format_transcript_entry() {
        // テスト項目: トランスクリプトのメッセージが送信者名と本文で表示される
        // given (前提条件):
        let u1 = UserId::try_from("u1").unwrap();
        let u2 = UserId::try_from("u2").unwrap();
        let message = ChatMessage {
            sender_id: u1.clone(),
            sender_name: "Ada".to_string(),
            text: MessageText::new("hello".to_string()).unwrap(),
            timestamp: Timestamp::new(0),
            room_id: RoomId::for_pair(&u1, &u2).unwrap(),
        };

        // when (操作):
        let result = MessageFormatter::format_transcript_entry(&message);

        // then (期待する結果):
        assert!(result.ends_with("] Ada: hello\n"));
    }

    #[test]
    fn test_format_call_ended() {
        // テスト項目: 通話終了の表示に終了理由が含まれる
        // given (前提条件):
        let update = CallUpdate::Ended(EndReason::PeerEnded);

        // when (操作):
        let result = MessageFormatter::format_call_update(&update, "Grace");

        // then (期待する結果):
        assert_eq!(
            result,
            "\n* Call with Grace ended: the other person ended the call\n"
        );
    }

    #[test]
    fn test_format_online_users_marks_me() {
        // テスト項目: オンライン一覧で自分に (me) が付く
        // given (前提条件):
        let online = vec!["u1".to_string(), "u2".to_string()];

        // when (操作):
        let result = MessageFormatter::format_online_users(&online, "u2");

        // then (期待する結果):
        assert_eq!(result, "\nOnline:\n  u1\n  u2 (me)\n");
    }
}
