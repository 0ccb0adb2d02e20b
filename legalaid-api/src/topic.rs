use chrono::Utc;
use uuid::Uuid;

use crate::{Author, Error, Reply, ReplyId, ReplyPath, Time, Vote, MAX_REPLY_DEPTH};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct TopicId(pub String);

impl TopicId {
    pub fn generate() -> TopicId {
        TopicId(Uuid::new_v4().to_string())
    }

    /// Name of the feed room that receives this topic's reply events
    pub fn room(&self) -> String {
        format!("topic-{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub category: String,
    pub content: String,
    pub author: Author,
    pub vote_score: i64,
    #[serde(default)]
    pub views: u64,
    pub created_at: Time,

    /// Number of top-level replies, refreshed after each new reply
    #[serde(default)]
    pub reply_count: usize,

    /// Top-level replies in display order
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewTopic {
    pub title: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl NewTopic {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_required("title", &self.title)?;
        crate::validate_required("category", &self.category)?;
        crate::validate_required("content", &self.content)?;
        Ok(())
    }
}

impl Topic {
    pub fn now(new: NewTopic, author: Author) -> Topic {
        Topic {
            id: TopicId::generate(),
            title: new.title,
            category: new.category,
            content: new.content,
            author,
            vote_score: 0,
            views: 0,
            created_at: Utc::now(),
            reply_count: 0,
            replies: Vec::new(),
        }
    }

    /// Returns the new score
    pub fn apply_vote(&mut self, vote: Vote) -> i64 {
        self.vote_score = self.vote_score.saturating_add(vote.delta());
        self.vote_score
    }

    pub fn find_reply(&self, id: &ReplyId) -> Option<&Reply> {
        ReplyPath::locate(&self.replies, id).and_then(|p| p.get(&self.replies))
    }

    pub fn find_reply_mut(&mut self, id: &ReplyId) -> Option<&mut Reply> {
        let path = ReplyPath::locate(&self.replies, id)?;
        path.get_mut(&mut self.replies)
    }

    /// Attaches `reply` at the top level, or below `parent` wherever it is.
    ///
    /// The tree is left untouched when `parent` cannot be found or when the
    /// new reply would land at `MAX_REPLY_DEPTH` or deeper.
    pub fn attach_reply(&mut self, parent: Option<&ReplyId>, reply: Reply) -> Result<(), Error> {
        match parent {
            None => self.replies.push(reply),
            Some(parent) => {
                let path = ReplyPath::locate(&self.replies, parent)
                    .ok_or_else(|| Error::ParentNotFound(parent.clone()))?;
                if path.depth() + 1 >= MAX_REPLY_DEPTH {
                    return Err(Error::ReplyTooDeep(parent.clone()));
                }
                path.get_mut(&mut self.replies)
                    .ok_or_else(|| Error::ParentNotFound(parent.clone()))?
                    .children
                    .push(reply);
            }
        }
        self.reply_count = self.replies.len();
        Ok(())
    }

    /// Returns the new score of the reply
    pub fn vote_reply(&mut self, id: &ReplyId, vote: Vote) -> Result<i64, Error> {
        Ok(self
            .find_reply_mut(id)
            .ok_or_else(|| Error::ReplyNotFound(id.clone()))?
            .apply_vote(vote))
    }

    pub fn total_replies(&self) -> usize {
        Reply::count_in(&self.replies)
    }
}
