use crate::{Reply, ReplyId, Topic, TopicId};

/// Change notification emitted after a successful mutation
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ForumEvent {
    NewTopic(Topic),
    #[serde(rename_all = "camelCase")]
    NewReply {
        topic_id: TopicId,
        reply: Reply,
        parent_id: Option<ReplyId>,
    },
    #[serde(rename_all = "camelCase")]
    TopicVoteUpdate { topic_id: TopicId, vote_score: i64 },
    #[serde(rename_all = "camelCase")]
    ReplyVoteUpdate {
        topic_id: TopicId,
        reply_id: ReplyId,
        vote_score: i64,
    },
}

impl ForumEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ForumEvent::NewTopic(_) => "new-topic",
            ForumEvent::NewReply { .. } => "new-reply",
            ForumEvent::TopicVoteUpdate { .. } => "topic-vote-update",
            ForumEvent::ReplyVoteUpdate { .. } => "reply-vote-update",
        }
    }

    /// Reply events are scoped to their topic's room, everything else goes to everyone
    pub fn room(&self) -> Option<String> {
        match self {
            ForumEvent::NewTopic(_) | ForumEvent::TopicVoteUpdate { .. } => None,
            ForumEvent::NewReply { topic_id, .. } | ForumEvent::ReplyVoteUpdate { topic_id, .. } => {
                Some(topic_id.room())
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum FeedMessage {
    Event(ForumEvent),
    Pong,
}
