use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A user as served by the upstream data source.
///
/// Only `userId` and `username` are interpreted; every other field is carried
/// through untouched so responses echo the upstream record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A chat between participants, referenced by username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub chat_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
    /// Outer `None`: key absent. `Some(None)`: upstream sent `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Option<Vec<Value>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chat {
    pub fn has_participant(&self, username: &str) -> bool {
        self.participants.iter().any(|participant| participant == username)
    }

    pub fn messages(&self) -> Option<&[Value]> {
        self.messages.as_ref().and_then(|messages| messages.as_deref())
    }

    /// Append a message, starting a fresh list when none exists yet.
    pub fn push_message(&mut self, message: Value) {
        match &mut self.messages {
            Some(Some(messages)) => messages.push(message),
            slot => *slot = Some(Some(vec![message])),
        }
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<Vec<Value>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Value>>::deserialize(deserializer).map(Some)
}

/// Everything the service knows about, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub users: Vec<User>,
    pub chats: Vec<Chat>,
}
