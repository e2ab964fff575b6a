use serde::Serialize;

use crate::common::types::{Chat, User};

/// Payload of `GET /getUser/:userId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWithChats {
    pub user: User,
    pub chats: Vec<Chat>,
}

/// Payload of `GET /getMutualUsers/:userId/:anotherUserId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualUsers {
    pub mutual_users: Vec<String>,
}

/// Returned by every write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Acknowledged {
    pub acknowledged: bool,
}

impl Acknowledged {
    pub const YES: Self = Self { acknowledged: true };
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorMessage {
                message: message.into(),
            },
        }
    }
}
