//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    ClientCommand, Event, EventKind, FileRef, MessageContent, Severity, Username,
    ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as dto};

fn severity_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

fn names(users: &[Username]) -> Vec<String> {
    users.iter().map(|u| u.as_str().to_string()).collect()
}

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::ClientMessage> for ClientCommand {
    type Error = ValueObjectError;

    fn try_from(dto: dto::ClientMessage) -> Result<Self, Self::Error> {
        Ok(match dto {
            dto::ClientMessage::Chat { content } => {
                ClientCommand::Chat(MessageContent::new(content)?)
            }
            dto::ClientMessage::File {
                file_url,
                file_name,
                file_size,
                file_type,
            } => ClientCommand::File(FileRef::new(file_url, file_name, file_size, file_type)?),
            dto::ClientMessage::TypingStart => ClientCommand::TypingStart,
            dto::ClientMessage::TypingStop => ClientCommand::TypingStop,
        })
    }
}

impl http::FileUploadedRequest {
    /// Validate the upload result into the uploader's name and the file reference
    pub fn into_domain(self) -> Result<(Username, FileRef), ValueObjectError> {
        let username = Username::new(self.username)?;
        let file = FileRef::new(self.file_url, self.file_name, self.file_size, self.file_type)?;
        Ok((username, file))
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Event> for dto::ServerMessage {
    fn from(event: &Event) -> Self {
        let username = event.username.as_str().to_string();
        let timestamp = event.timestamp.value();
        match &event.kind {
            EventKind::Join { room_users } => Self::Join {
                message: format!("{} joined the room", event.username),
                username,
                timestamp,
                room_users: names(room_users),
            },
            EventKind::Leave { room_users } => Self::Leave {
                message: format!("{} left the room", event.username),
                username,
                timestamp,
                room_users: names(room_users),
            },
            EventKind::Chat { content } => Self::Chat {
                username,
                timestamp,
                content: content.as_str().to_string(),
            },
            EventKind::File(file) => Self::File {
                username,
                timestamp,
                file_url: file.url.clone(),
                file_name: file.name.clone(),
                file_size: file.size,
                file_type: file.content_type.clone(),
            },
            EventKind::TypingStart => Self::TypingStart {
                username,
                timestamp,
            },
            EventKind::TypingStop => Self::TypingStop {
                username,
                timestamp,
            },
            EventKind::Error {
                code,
                severity,
                message,
            } => Self::Error {
                username,
                timestamp,
                error_code: code.as_str().to_string(),
                severity: severity_str(*severity).to_string(),
                message: message.clone(),
            },
        }
    }
}

/// Serialize an event into the JSON frame delivered to clients
pub fn encode_event(event: &Event) -> Result<String, serde_json::Error> {
    serde_json::to_string(&dto::ServerMessage::from(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, Timestamp};

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    #[test]
    fn test_client_chat_is_validated() {
        // テスト項目: 空白のみの本文はドメインへの変換で拒否される
        // given (前提条件):
        let dto_msg = dto::ClientMessage::Chat {
            content: "   ".to_string(),
        };

        // when (操作):
        let result = ClientCommand::try_from(dto_msg);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("content")));
    }

    #[test]
    fn test_client_file_to_domain() {
        // テスト項目: file メッセージがファイル参照に変換される
        // given (前提条件):
        let dto_msg = dto::ClientMessage::File {
            file_url: "/static/uploads/abc123-notes.pdf".to_string(),
            file_name: "notes.pdf".to_string(),
            file_size: 2048576,
            file_type: "application/pdf".to_string(),
        };

        // when (操作):
        let command = ClientCommand::try_from(dto_msg).unwrap();

        // then (期待する結果):
        match command {
            ClientCommand::File(file) => {
                assert_eq!(file.name, "notes.pdf");
                assert_eq!(file.size, 2048576);
                assert_eq!(file.content_type, "application/pdf");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_leave_event_to_dto() {
        // テスト項目: leave イベントが残りメンバー付きの DTO に変換される
        // given (前提条件):
        let event = Event::new(
            EventKind::Leave {
                room_users: vec![user("bob")],
            },
            user("alice"),
            Timestamp::new(3000),
        );

        // when (操作):
        let dto_msg = dto::ServerMessage::from(&event);

        // then (期待する結果):
        assert_eq!(
            dto_msg,
            dto::ServerMessage::Leave {
                username: "alice".to_string(),
                timestamp: 3000,
                message: "alice left the room".to_string(),
                room_users: vec!["bob".to_string()],
            }
        );
    }

    #[test]
    fn test_error_event_encoding() {
        // テスト項目: error イベントがコードと重大度付きの JSON になる
        // given (前提条件):
        let event = Event::new(
            EventKind::Error {
                code: ErrorCode::InvalidMessageFormat,
                severity: Severity::Warning,
                message: "unknown variant `dance`".to_string(),
            },
            user("alice"),
            Timestamp::new(10),
        );

        // when (操作):
        let json: serde_json::Value =
            serde_json::from_str(&encode_event(&event).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "error");
        assert_eq!(json["error_code"], "INVALID_MESSAGE_FORMAT");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_upload_request_to_domain() {
        // テスト項目: アップロード結果のリクエストがユーザー名とファイル参照に変換される
        // given (前提条件):
        let request = http::FileUploadedRequest {
            username: " carol ".to_string(),
            file_url: "/static/uploads/x.png".to_string(),
            file_name: "x.png".to_string(),
            file_size: 12,
            file_type: "image/png".to_string(),
        };

        // when (操作):
        let (username, file) = request.into_domain().unwrap();

        // then (期待する結果):
        assert_eq!(username.as_str(), "carol");
        assert_eq!(file.url, "/static/uploads/x.png");
    }
}
