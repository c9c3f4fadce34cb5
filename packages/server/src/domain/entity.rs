//! Core domain models for the chat application.

use super::value_object::{MessageId, MessageText, ReactionType, Timestamp, Username};

/// Default number of messages the log keeps (older ones are pruned by the log)
pub const DEFAULT_MESSAGE_RETENTION: usize = 50;

/// A chat message as stored in the message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier assigned by the log
    pub id: MessageId,
    /// Author's username
    pub author: Username,
    /// Message text (trimmed)
    pub text: MessageText,
    /// Timestamp assigned by the log
    pub created_at: Timestamp,
    /// Message this one answers (AI replies link to the message they answer)
    pub parent_id: Option<MessageId>,
    /// Author's avatar, if the client supplied one
    pub profile_picture_url: Option<String>,
    /// Reactions grouped by type
    pub reactions: Vec<ReactionGroup>,
}

impl Message {
    /// Whether this message replies to `parent`
    pub fn is_reply_to(&self, parent: MessageId) -> bool {
        self.parent_id == Some(parent)
    }
}

/// Input for appending a message to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub author: Username,
    pub text: MessageText,
    pub parent_id: Option<MessageId>,
    pub profile_picture_url: Option<String>,
}

/// All users who reacted to a message with one reaction type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionGroup {
    pub reaction_type: ReactionType,
    pub users: Vec<Username>,
}

impl ReactionGroup {
    /// Group `(type, user)` pairs by type.
    ///
    /// Types keep the order of their first reaction, users keep reaction order.
    pub fn group<'a, I>(reactions: I) -> Vec<ReactionGroup>
    where
        I: IntoIterator<Item = (&'a ReactionType, &'a Username)>,
    {
        let mut groups: Vec<ReactionGroup> = Vec::new();
        for (reaction_type, user) in reactions {
            match groups.iter_mut().find(|g| &g.reaction_type == reaction_type) {
                Some(group) => group.users.push(user.clone()),
                None => groups.push(ReactionGroup {
                    reaction_type: reaction_type.clone(),
                    users: vec![user.clone()],
                }),
            }
        }
        groups
    }
}

/// Durable last-seen record kept by the user directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub username: Username,
    pub last_online_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn kind(name: &str) -> ReactionType {
        ReactionType::new(name).unwrap()
    }

    #[test]
    fn test_reaction_group_groups_by_type() {
        // テスト項目: リアクションは種別ごとにまとめられ、初出順が保たれる
        // given (前提条件):
        let like = kind("like");
        let laugh = kind("laugh");
        let alice = user("alice");
        let bob = user("bob");
        let pairs = vec![(&like, &bob), (&laugh, &alice), (&like, &alice)];

        // when (操作):
        let groups = ReactionGroup::group(pairs);

        // then (期待する結果):
        assert_eq!(
            groups,
            vec![
                ReactionGroup {
                    reaction_type: like.clone(),
                    users: vec![bob.clone(), alice.clone()],
                },
                ReactionGroup {
                    reaction_type: laugh.clone(),
                    users: vec![alice.clone()],
                },
            ]
        );
    }

    #[test]
    fn test_reaction_group_empty() {
        // テスト項目: リアクションが無ければ空のリストになる
        // when (操作):
        let groups = ReactionGroup::group(Vec::new());

        // then (期待する結果):
        assert!(groups.is_empty());
    }

    #[test]
    fn test_message_is_reply_to() {
        // テスト項目: parent_id で返信関係を判定できる
        // given (前提条件):
        let reply = Message {
            id: MessageId::new(11),
            author: user("claude"),
            text: MessageText::new("a").unwrap(),
            created_at: Timestamp::new(0),
            parent_id: Some(MessageId::new(10)),
            profile_picture_url: None,
            reactions: Vec::new(),
        };

        // then (期待する結果):
        assert!(reply.is_reply_to(MessageId::new(10)));
        assert!(!reply.is_reply_to(MessageId::new(11)));
    }
}
