//! Message formatting utilities for client display.

use chanoma_server::infrastructure::dto::websocket::{ChatMessageDto, RoomUserDto};
use chanoma_shared::time::timestamp_to_rfc3339;

/// 表示用に参加者 ID を短縮する際の文字数
const SHORT_ID_LENGTH: usize = 8;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the room-users snapshot showing all participants
    ///
    /// # Arguments
    ///
    /// * `users` - Deduplicated participant view received on join
    /// * `own_name` - The resolved display name of this client
    pub fn format_room_users(users: &[RoomUserDto], own_name: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str(&format!("You joined as '{}'. Participants:\n", own_name));

        if users.is_empty() {
            output.push_str("(No other participants)\n");
        } else {
            for user in users {
                output.push_str(&format!("{} ({})\n", user.name, short_id(&user.id)));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a user-connected notification
    pub fn format_user_connected(participant_id: &str, display_name: &str) -> String {
        format!("\n+ {} ({}) joined\n", display_name, short_id(participant_id))
    }

    /// Format a user-disconnected notification
    ///
    /// # Arguments
    ///
    /// * `participant_id` - The id of the participant who left
    /// * `display_name` - The last known display name, if the roster still had one
    pub fn format_user_disconnected(participant_id: &str, display_name: Option<&str>) -> String {
        match display_name {
            Some(name) => format!("\n- {} ({}) left\n", name, short_id(participant_id)),
            None => format!("\n- {} left\n", short_id(participant_id)),
        }
    }

    /// Format a chat message
    pub fn format_chat_message(message: &ChatMessageDto, is_own: bool) -> String {
        let timestamp = timestamp_to_rfc3339(message.timestamp);
        let own_suffix = if is_own { " (you)" } else { "" };
        format!(
            "\n[{}] {}{}: {}\n",
            timestamp, message.sender_name, own_suffix, message.text
        )
    }

    /// Format the chat history replayed on join
    ///
    /// The history replaces any prior local chat view.
    pub fn format_chat_history(messages: &[ChatMessageDto], own_id: &str) -> String {
        if messages.is_empty() {
            return String::new();
        }

        let mut output = String::new();
        output.push_str("\n------------------------------------------------------------\n");
        output.push_str(&format!("Chat history ({} messages):\n", messages.len()));
        for message in messages {
            let is_own = message.sender == own_id;
            let own_suffix = if is_own { " (you)" } else { "" };
            output.push_str(&format!(
                "[{}] {}{}: {}\n",
                timestamp_to_rfc3339(message.timestamp),
                message.sender_name,
                own_suffix,
                message.text
            ));
        }
        output.push_str("------------------------------------------------------------\n");
        output
    }

    /// Format a confirmation line after sending a message
    pub fn format_sent_confirmation(text: &str) -> String {
        format!("you: {}\n", text)
    }
}

/// 参加者 ID の先頭 8 文字を表示用に切り出す
fn short_id(participant_id: &str) -> String {
    participant_id.chars().take(SHORT_ID_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> RoomUserDto {
        RoomUserDto {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn message(sender: &str, name: &str, text: &str) -> ChatMessageDto {
        ChatMessageDto {
            sender: sender.to_string(),
            sender_name: name.to_string(),
            text: text.to_string(),
            timestamp: 1672531200000,
        }
    }

    #[test]
    fn test_format_room_users_with_no_other_participants() {
        // テスト項目: 他の参加者がいない場合、適切なメッセージが表示される
        // given (前提条件):
        let users = vec![];

        // when (操作):
        let result = MessageFormatter::format_room_users(&users, "Alice");

        // then (期待する結果):
        assert!(result.contains("You joined as 'Alice'"));
        assert!(result.contains("(No other participants)"));
    }

    #[test]
    fn test_format_room_users_with_participants() {
        // テスト項目: 参加者の表示名と短縮 ID が表示される
        // given (前提条件):
        let users = vec![user("0123456789abcdef", "Bob"), user("fedcba9876543210", "Carol")];

        // when (操作):
        let result = MessageFormatter::format_room_users(&users, "Alice");

        // then (期待する結果):
        assert!(result.contains("Bob (01234567)"));
        assert!(result.contains("Carol (fedcba98)"));
    }

    #[test]
    fn test_format_user_connected() {
        // テスト項目: 参加通知が正しくフォーマットされる
        // given (前提条件):

        // when (操作):
        let result = MessageFormatter::format_user_connected("0123456789abcdef", "Bob");

        // then (期待する結果):
        assert!(result.contains("+ Bob (01234567) joined"));
    }

    #[test]
    fn test_format_user_disconnected_without_name() {
        // テスト項目: 表示名が不明な退室通知では短縮 ID だけが表示される
        // given (前提条件):

        // when (操作):
        let result = MessageFormatter::format_user_disconnected("0123456789abcdef", None);

        // then (期待する結果):
        assert!(result.contains("- 01234567 left"));
    }

    #[test]
    fn test_format_chat_message_marks_own_message() {
        // テスト項目: 自分のメッセージには (you) マークが付く
        // given (前提条件):
        let chat = message("alice", "Alice", "hi");

        // when (操作):
        let own = MessageFormatter::format_chat_message(&chat, true);
        let other = MessageFormatter::format_chat_message(&chat, false);

        // then (期待する結果):
        assert!(own.contains("Alice (you): hi"));
        assert!(other.contains("Alice: hi"));
        assert!(!other.contains("(you)"));
    }

    #[test]
    fn test_format_chat_history_is_empty_for_no_messages() {
        // テスト項目: 履歴が空の場合は何も表示されない
        // given (前提条件):
        let messages = vec![];

        // when (操作):
        let result = MessageFormatter::format_chat_history(&messages, "alice");

        // then (期待する結果):
        assert!(result.is_empty());
    }

    #[test]
    fn test_format_chat_history_lists_messages_in_order() {
        // テスト項目: 履歴が古い順に全件表示される
        // given (前提条件):
        let messages = vec![
            message("alice", "Alice", "first"),
            message("bob", "Bob", "second"),
        ];

        // when (操作):
        let result = MessageFormatter::format_chat_history(&messages, "alice");

        // then (期待する結果):
        assert!(result.contains("Chat history (2 messages)"));
        let first_pos = result.find("first").unwrap();
        let second_pos = result.find("second").unwrap();
        assert!(first_pos < second_pos);
        assert!(result.contains("Alice (you): first"));
    }
}
