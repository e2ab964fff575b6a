use std::collections::HashSet;

use serde_json::Value;

use crate::common::{Acknowledged, Chat, Dataset, MutualUsers, User, UserWithChats};
use crate::config::Behavior;
use crate::error::{QueryError, Result};

/// In-memory owner of the dataset. All reads and writes go through here.
///
/// The store itself is not synchronized; the HTTP layer keeps it behind a
/// single lock so requests are applied one at a time.
pub struct DatasetStore {
    dataset: Dataset,
    behavior: Behavior,
}

impl DatasetStore {
    pub fn new(dataset: Dataset, behavior: Behavior) -> Self {
        Self { dataset, behavior }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Look up a user and every chat they take part in.
    pub fn get_user(&self, user_id: &str) -> Result<UserWithChats> {
        let user = self
            .find_user(user_id)
            .ok_or_else(|| QueryError::UserNotFound(user_id.to_string()))?;

        let chats = self
            .chats_with(&user.username)
            .cloned()
            .collect::<Vec<_>>();
        log::debug!("User {user_id} participates in {} chats", chats.len());

        Ok(UserWithChats {
            user: user.clone(),
            chats,
        })
    }

    /// Usernames both users have shared a chat with.
    ///
    /// Order follows the first user's chats. Under `Behavior::Legacy` the
    /// second user's scan excludes the first user's name rather than their
    /// own, so the second user can show up in the result.
    pub fn mutual_users(&self, user_id: &str, another_user_id: &str) -> Result<MutualUsers> {
        let (user, another_user) = match (self.find_user(user_id), self.find_user(another_user_id)) {
            (Some(user), Some(another_user)) => (user, another_user),
            _ => {
                return Err(QueryError::UsersNotFound(
                    user_id.to_string(),
                    another_user_id.to_string(),
                ));
            }
        };

        let chatted_with = self.chatted_with(&user.username, &user.username);
        let another_excluded = match self.behavior {
            Behavior::Legacy => user.username.as_str(),
            Behavior::Corrected => another_user.username.as_str(),
        };
        let another_chatted_with = self
            .chatted_with(&another_user.username, another_excluded)
            .into_iter()
            .collect::<HashSet<_>>();

        let mutual_users = chatted_with
            .into_iter()
            .filter(|username| another_chatted_with.contains(username))
            .collect();

        Ok(MutualUsers { mutual_users })
    }

    /// Append `message` to a chat, creating its message list on first write.
    pub fn add_chat_message(&mut self, chat_id: &str, message: Value) -> Result<Acknowledged> {
        let chat = self
            .find_chat_mut(chat_id)
            .ok_or_else(|| QueryError::ChatNotFound(chat_id.to_string()))?;

        chat.push_message(message);
        log::debug!(
            "Chat {chat_id} now holds {} messages",
            chat.messages().map_or(0, <[Value]>::len)
        );

        Ok(Acknowledged::YES)
    }

    /// Remove a user from one chat, or from every chat when `chat_id` is `None`.
    pub fn remove_user_from_chats(
        &mut self,
        user_id: &str,
        chat_id: Option<&str>,
    ) -> Result<Acknowledged> {
        let username = self
            .find_user(user_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| QueryError::UserNotFound(user_id.to_string()))?;

        match chat_id {
            Some(chat_id) => {
                let behavior = self.behavior;
                let chat = self
                    .find_chat_mut(chat_id)
                    .ok_or_else(|| QueryError::ChatNotFound(chat_id.to_string()))?;
                remove_from_single_chat(chat, &username, behavior);
            }
            None => {
                let mut removed = 0;
                for chat in &mut self.dataset.chats {
                    if let Some(index) = position_of(chat, &username) {
                        chat.participants.remove(index);
                        removed += 1;
                    }
                }
                log::debug!("Removed {username} from {removed} chats");
            }
        }

        Ok(Acknowledged::YES)
    }

    fn find_user(&self, user_id: &str) -> Option<&User> {
        self.dataset.users.iter().find(|user| user.user_id == user_id)
    }

    fn find_chat_mut(&mut self, chat_id: &str) -> Option<&mut Chat> {
        self.dataset
            .chats
            .iter_mut()
            .find(|chat| chat.chat_id == chat_id)
    }

    fn chats_with<'a>(&'a self, username: &'a str) -> impl Iterator<Item = &'a Chat> + 'a {
        self.dataset
            .chats
            .iter()
            .filter(move |chat| chat.has_participant(username))
    }

    /// De-duplicated participants of `username`'s chats, minus `excluded`.
    fn chatted_with(&self, username: &str, excluded: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.chats_with(username)
            .flat_map(|chat| chat.participants.iter())
            .filter(|participant| participant.as_str() != excluded)
            .filter(|participant| seen.insert(*participant))
            .cloned()
            .collect()
    }
}

fn position_of(chat: &Chat, username: &str) -> Option<usize> {
    chat.participants
        .iter()
        .position(|participant| participant == username)
}

fn remove_from_single_chat(chat: &mut Chat, username: &str, behavior: Behavior) {
    match (behavior, position_of(chat, username)) {
        (Behavior::Corrected, Some(index)) => {
            chat.participants.remove(index);
        }
        (Behavior::Corrected, None) => {}
        // Legacy treats the index as a truthy flag: index 0 is skipped and a
        // miss removes the last participant.
        (Behavior::Legacy, Some(0)) => {}
        (Behavior::Legacy, Some(index)) => {
            chat.participants.remove(index);
        }
        (Behavior::Legacy, None) => {
            if let Some(last) = chat.participants.pop() {
                log::warn!(
                    "{username} not in chat {}; legacy removal dropped {last}",
                    chat.chat_id
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Dataset {
        serde_json::from_value(json!({
            "users": [
                { "userId": "u1", "username": "alice", "email": "alice@example.com" },
                { "userId": "u2", "username": "bob" },
                { "userId": "u3", "username": "carol" },
                { "userId": "u4", "username": "dave" }
            ],
            "chats": [
                { "chatId": "chat1", "participants": ["alice", "bob"] },
                { "chatId": "chat2", "participants": ["alice", "carol"] },
                { "chatId": "chat3", "participants": ["bob", "carol"], "messages": ["hi"] }
            ]
        }))
        .unwrap()
    }

    fn store(behavior: Behavior) -> DatasetStore {
        DatasetStore::new(fixture(), behavior)
    }

    fn participants(store: &DatasetStore, chat_id: &str) -> Vec<String> {
        store
            .dataset()
            .chats
            .iter()
            .find(|chat| chat.chat_id == chat_id)
            .map(|chat| chat.participants.clone())
            .unwrap()
    }

    #[test]
    fn get_user_returns_exactly_their_chats() {
        let store = store(Behavior::Legacy);
        let found = store.get_user("u1").unwrap();

        assert_eq!(found.user.username, "alice");
        assert_eq!(found.user.extra["email"], "alice@example.com");
        let chat_ids: Vec<_> = found.chats.iter().map(|chat| chat.chat_id.as_str()).collect();
        assert_eq!(chat_ids, ["chat1", "chat2"]);
    }

    #[test]
    fn get_user_without_chats_returns_empty_list() {
        let found = store(Behavior::Legacy).get_user("u4").unwrap();
        assert!(found.chats.is_empty());
    }

    #[test]
    fn get_user_unknown_id_is_not_found() {
        let err = store(Behavior::Legacy).get_user("nope").unwrap_err();
        assert_eq!(err, QueryError::UserNotFound("nope".into()));
        assert_eq!(err.to_string(), "no user with the user id (nope) found");
    }

    #[test]
    fn legacy_mutual_users_keeps_second_users_own_name() {
        let mutual = store(Behavior::Legacy).mutual_users("u1", "u2").unwrap();
        assert_eq!(mutual.mutual_users, ["bob", "carol"]);
    }

    #[test]
    fn corrected_mutual_users_excludes_both_users() {
        let mutual = store(Behavior::Corrected).mutual_users("u1", "u2").unwrap();
        assert_eq!(mutual.mutual_users, ["carol"]);
    }

    #[test]
    fn mutual_users_are_deduplicated() {
        let mut dataset = fixture();
        dataset.chats.push(serde_json::from_value(json!({
            "chatId": "chat4", "participants": ["alice", "carol", "bob"]
        })).unwrap());
        let store = DatasetStore::new(dataset, Behavior::Corrected);

        let mutual = store.mutual_users("u1", "u2").unwrap();
        assert_eq!(mutual.mutual_users, ["carol"]);
    }

    #[test]
    fn mutual_users_requires_both_users() {
        let store = store(Behavior::Legacy);
        let err = store.mutual_users("u1", "missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "there was not a user found for both user id (u1) and user id (missing)"
        );
        assert!(store.mutual_users("missing", "u1").is_err());
    }

    #[test]
    fn first_message_initializes_the_list() {
        let mut store = store(Behavior::Legacy);
        store.add_chat_message("chat1", json!({ "text": "hello" })).unwrap();

        let chat = &store.dataset().chats[0];
        assert_eq!(chat.messages(), Some(&[json!({ "text": "hello" })][..]));
    }

    #[test]
    fn messages_are_appended_in_order() {
        let mut store = store(Behavior::Legacy);
        store.add_chat_message("chat3", json!("second")).unwrap();
        store.add_chat_message("chat3", json!("third")).unwrap();

        let chat = &store.dataset().chats[2];
        assert_eq!(
            chat.messages(),
            Some(&[json!("hi"), json!("second"), json!("third")][..])
        );
    }

    #[test]
    fn message_to_unknown_chat_changes_nothing() {
        let mut store = store(Behavior::Legacy);
        let err = store.add_chat_message("chat9", json!("lost")).unwrap_err();

        assert_eq!(err, QueryError::ChatNotFound("chat9".into()));
        assert_eq!(store.dataset(), &fixture());
    }

    #[test]
    fn legacy_single_chat_removal_skips_first_participant() {
        let mut store = store(Behavior::Legacy);
        store.remove_user_from_chats("u1", Some("chat1")).unwrap();
        assert_eq!(participants(&store, "chat1"), ["alice", "bob"]);
    }

    #[test]
    fn single_chat_removal_drops_later_participant() {
        let mut store = store(Behavior::Legacy);
        store.remove_user_from_chats("u2", Some("chat1")).unwrap();
        assert_eq!(participants(&store, "chat1"), ["alice"]);
    }

    #[test]
    fn legacy_single_chat_removal_of_absent_user_pops_last() {
        let mut store = store(Behavior::Legacy);
        store.remove_user_from_chats("u3", Some("chat1")).unwrap();
        assert_eq!(participants(&store, "chat1"), ["alice"]);
    }

    #[test]
    fn corrected_single_chat_removal_handles_first_and_absent() {
        let mut store = store(Behavior::Corrected);
        store.remove_user_from_chats("u1", Some("chat1")).unwrap();
        store.remove_user_from_chats("u3", Some("chat1")).unwrap();
        assert_eq!(participants(&store, "chat1"), ["bob"]);
    }

    #[test]
    fn removal_from_all_chats_covers_every_position() {
        let mut store = store(Behavior::Legacy);
        store.remove_user_from_chats("u3", None).unwrap();

        assert_eq!(participants(&store, "chat1"), ["alice", "bob"]);
        assert_eq!(participants(&store, "chat2"), ["alice"]);
        assert_eq!(participants(&store, "chat3"), ["bob"]);

        store.remove_user_from_chats("u1", None).unwrap();
        assert_eq!(participants(&store, "chat1"), ["bob"]);
        assert!(participants(&store, "chat2").is_empty());
    }

    #[test]
    fn removal_errors_for_unknown_user_or_chat() {
        let mut store = store(Behavior::Legacy);
        assert_eq!(
            store.remove_user_from_chats("nope", Some("chat1")).unwrap_err(),
            QueryError::UserNotFound("nope".into())
        );
        assert_eq!(
            store.remove_user_from_chats("u2", Some("chat9")).unwrap_err(),
            QueryError::ChatNotFound("chat9".into())
        );
        assert_eq!(store.dataset(), &fixture());
    }
}
