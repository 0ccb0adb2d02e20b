mod author;
pub use author::{
    Author, DisplayUser, UserRef, ANONYMOUS_NAME, DEFAULT_PROFILE_IMAGE, USER_ID_HEADER,
    USER_IMAGE_HEADER, USER_NAME_HEADER,
};

mod category;
pub use category::Category;

mod error;
pub use error::Error;

mod event;
pub use event::{FeedMessage, ForumEvent};

mod reply;
pub use reply::{NewReply, Reply, ReplyId, ReplyPath, MAX_REPLY_DEPTH};

mod response;
pub use response::{Envelope, VoteResult};

mod topic;
pub use topic::{NewTopic, Topic, TopicId};

mod vote;
pub use vote::Vote;

pub use uuid::Uuid;
pub type Time = chrono::DateTime<chrono::Utc>;

/// Rejects strings that cannot be stored by a document backend
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

/// Rejects missing (empty or whitespace-only) required fields
pub fn validate_required(field: &'static str, s: &str) -> Result<(), Error> {
    if s.trim().is_empty() {
        return Err(Error::MissingField(String::from(field)));
    }
    validate_string(s)
}
