use std::sync::Arc;

use anyhow::Context;
use legalaid_api::{
    Author, ForumEvent, NewReply, NewTopic, Reply, ReplyId, Topic, TopicId, UserRef, Vote,
};

use crate::{Error, Notifier, TopicStore};

/// Topic and reply-tree operations on top of a store.
///
/// Every mutation is applied through `TopicStore::update` and only then
/// reported to the notifier, whose outcome is never looked at.
pub struct Forum<S> {
    store: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: TopicStore> Forum<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Forum<S> {
        Forum { store, notifier }
    }

    pub async fn list_topics(&self) -> Result<Vec<Topic>, Error> {
        Ok(self.store.list().await.context("listing topics")?)
    }

    pub async fn find_topic(&self, id: &TopicId) -> Result<Topic, Error> {
        self.store
            .find(id)
            .await
            .with_context(|| format!("fetching topic {id:?}"))?
            .ok_or_else(|| Error::topic_not_found(id.clone()))
    }

    pub async fn create_topic(
        &self,
        new: NewTopic,
        user: Option<UserRef>,
    ) -> Result<Topic, Error> {
        new.validate()?;
        let author = Author::for_request(user, new.anonymous);
        let topic = Topic::now(new, author);
        self.store
            .insert(topic.clone())
            .await
            .with_context(|| format!("inserting topic {:?}", topic.id))?;
        tracing::debug!(
            topic = ?topic.id,
            anonymous = topic.author.is_anonymous(),
            "created topic"
        );
        self.notifier
            .notify(ForumEvent::NewTopic(topic.clone()))
            .await;
        Ok(topic)
    }

    /// Returns the new score of the topic
    pub async fn vote_topic(&self, id: &TopicId, vote: Vote) -> Result<i64, Error> {
        let vote_score = self
            .store
            .update(id, |t| t.apply_vote(vote))
            .await
            .with_context(|| format!("voting on topic {id:?}"))?
            .ok_or_else(|| Error::topic_not_found(id.clone()))?;
        self.notifier
            .notify(ForumEvent::TopicVoteUpdate {
                topic_id: id.clone(),
                vote_score,
            })
            .await;
        Ok(vote_score)
    }

    pub async fn add_reply(
        &self,
        topic_id: &TopicId,
        new: NewReply,
        user: Option<UserRef>,
    ) -> Result<Reply, Error> {
        new.validate()?;
        let author = Author::for_request(user, new.anonymous);
        let reply = Reply::now(new.content, author);
        let parent_id = new.parent_id;
        let attached = reply.clone();
        self.store
            .update(topic_id, |t| t.attach_reply(parent_id.as_ref(), attached))
            .await
            .with_context(|| format!("adding reply to topic {topic_id:?}"))?
            .ok_or_else(|| Error::topic_not_found(topic_id.clone()))??;
        tracing::debug!(topic = ?topic_id, reply = ?reply.id, parent = ?parent_id, "added reply");
        self.notifier
            .notify(ForumEvent::NewReply {
                topic_id: topic_id.clone(),
                reply: reply.clone(),
                parent_id,
            })
            .await;
        Ok(reply)
    }

    /// Returns the new score of the reply
    pub async fn adjust_reply_score(
        &self,
        topic_id: &TopicId,
        reply_id: &ReplyId,
        vote: Vote,
    ) -> Result<i64, Error> {
        let vote_score = self
            .store
            .update(topic_id, |t| t.vote_reply(reply_id, vote))
            .await
            .with_context(|| format!("voting on reply {reply_id:?} of topic {topic_id:?}"))?
            .ok_or_else(|| Error::topic_not_found(topic_id.clone()))??;
        self.notifier
            .notify(ForumEvent::ReplyVoteUpdate {
                topic_id: topic_id.clone(),
                reply_id: reply_id.clone(),
                vote_score,
            })
            .await;
        Ok(vote_score)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use legalaid_api::{Error as ApiError, ReplyPath, MAX_REPLY_DEPTH};
    use tokio::sync::Mutex;

    use super::*;
    use crate::MemStore;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ForumEvent>>);

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify(&self, event: ForumEvent) {
            self.0.lock().await.push(event);
        }
    }

    fn forum(topics: Vec<Topic>) -> (Forum<MemStore>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (
            Forum::new(MemStore::new(topics), recorder.clone()),
            recorder,
        )
    }

    fn new_topic(title: &str) -> NewTopic {
        NewTopic {
            title: String::from(title),
            category: String::from("Employment Law"),
            content: String::from("Unpaid overtime"),
            anonymous: false,
        }
    }

    fn empty_topic(id: &str) -> Topic {
        let mut t = Topic::now(new_topic("empty"), Author::Anonymous);
        t.id = TopicId(String::from(id));
        t
    }

    fn reply_to(parent: Option<&ReplyId>, content: &str) -> NewReply {
        NewReply {
            content: String::from(content),
            parent_id: parent.cloned(),
            anonymous: false,
        }
    }

    fn user() -> UserRef {
        UserRef {
            id: String::from("u1"),
            name: String::from("Parent In Need"),
            profile_image: None,
        }
    }

    fn assert_api_err<T: std::fmt::Debug>(res: Result<T, Error>, expected: ApiError) {
        match res {
            Err(Error::Api(e)) => assert_eq!(e, expected),
            res => panic!("expected {expected:?}, got {res:?}"),
        }
    }

    #[tokio::test]
    async fn topics_are_listed_in_reverse_creation_order() {
        let (forum, _) = forum(Vec::new());
        let mut created = Vec::new();
        for i in 0..5 {
            let topic = forum
                .create_topic(new_topic(&format!("topic {i}")), None)
                .await
                .unwrap();
            created.push(topic.id);
        }
        created.reverse();
        let listed = forum
            .list_topics()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect::<Vec<_>>();
        assert_eq!(listed, created);
    }

    #[tokio::test]
    async fn created_topics_start_blank() {
        let (forum, events) = forum(Vec::new());
        let topic = forum.create_topic(new_topic("t"), Some(user())).await.unwrap();
        assert_eq!(topic.vote_score, 0);
        assert_eq!(topic.reply_count, 0);
        assert!(topic.replies.is_empty());
        assert_eq!(topic.author, Author::User(user()));
        assert_eq!(forum.find_topic(&topic.id).await.unwrap(), topic);
        assert_eq!(
            *events.0.lock().await,
            vec![ForumEvent::NewTopic(topic.clone())]
        );
    }

    #[tokio::test]
    async fn invalid_topics_are_rejected_without_events() {
        let (forum, events) = forum(Vec::new());
        let mut t = new_topic("");
        t.title = String::from("   ");
        assert_api_err(
            forum.create_topic(t, None).await,
            ApiError::MissingField(String::from("title")),
        );
        assert!(forum.list_topics().await.unwrap().is_empty());
        assert!(events.0.lock().await.is_empty());
    }

    #[tokio::test]
    async fn upvote_then_downvote_restores_score() {
        let (forum, events) = forum(MemStore::with_samples().unwrap().list().await.unwrap());
        let id = TopicId(String::from("3"));
        let before = forum.find_topic(&id).await.unwrap().vote_score;
        assert_eq!(forum.vote_topic(&id, Vote::Up).await.unwrap(), before + 1);
        assert_eq!(forum.vote_topic(&id, Vote::Down).await.unwrap(), before);
        assert_eq!(forum.find_topic(&id).await.unwrap().vote_score, before);
        assert_eq!(events.0.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn voting_on_missing_topic_is_not_found() {
        let (forum, events) = forum(Vec::new());
        let id = TopicId(String::from("nonexistent"));
        assert_api_err(
            forum.vote_topic(&id, Vote::Up).await,
            ApiError::TopicNotFound(id.clone()),
        );
        assert_api_err(forum.find_topic(&id).await, ApiError::TopicNotFound(id));
        assert!(events.0.lock().await.is_empty());
    }

    #[tokio::test]
    async fn first_reply_is_the_sole_top_level_reply() {
        let (forum, events) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        let reply = forum
            .add_reply(&t1, reply_to(None, "hello"), None)
            .await
            .unwrap();
        let topic = forum.find_topic(&t1).await.unwrap();
        assert_eq!(topic.replies, vec![reply.clone()]);
        assert_eq!(topic.replies[0].vote_score, 0);
        assert_eq!(topic.reply_count, 1);
        assert_eq!(
            *events.0.lock().await,
            vec![ForumEvent::NewReply {
                topic_id: t1,
                reply,
                parent_id: None
            }]
        );
    }

    #[tokio::test]
    async fn replies_attach_below_parents_at_any_depth() {
        let (forum, _) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        let mut parent = None;
        let mut chain = Vec::new();
        for depth in 0..6 {
            let r = forum
                .add_reply(&t1, reply_to(parent.as_ref(), &format!("depth {depth}")), None)
                .await
                .unwrap();
            parent = Some(r.id.clone());
            chain.push(r.id);
        }
        let topic = forum.find_topic(&t1).await.unwrap();
        for (depth, id) in chain.iter().enumerate() {
            let path = ReplyPath::locate(&topic.replies, id).unwrap();
            assert_eq!(path.depth(), depth);
        }
        assert_eq!(topic.reply_count, 1);
        assert_eq!(topic.total_replies(), 6);
    }

    #[tokio::test]
    async fn missing_parent_is_not_found_and_changes_nothing() {
        let (forum, events) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        forum
            .add_reply(&t1, reply_to(None, "root"), None)
            .await
            .unwrap();
        let before = forum.find_topic(&t1).await.unwrap();
        let ghost = ReplyId(String::from("ghost"));
        assert_api_err(
            forum.add_reply(&t1, reply_to(Some(&ghost), "lost"), None).await,
            ApiError::ParentNotFound(ghost),
        );
        assert_eq!(forum.find_topic(&t1).await.unwrap(), before);
        assert_eq!(events.0.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn chains_of_replies_stop_at_the_depth_limit() {
        let (forum, events) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        let mut last = None;
        for i in 0..MAX_REPLY_DEPTH {
            let r = forum
                .add_reply(&t1, reply_to(last.as_ref(), &format!("level {i}")), None)
                .await
                .unwrap();
            last = Some(r.id);
        }
        let last = last.expect("chain is not empty");
        let before = forum.find_topic(&t1).await.unwrap();
        assert_api_err(
            forum
                .add_reply(&t1, reply_to(Some(&last), "one too many"), None)
                .await,
            ApiError::ReplyTooDeep(last.clone()),
        );
        assert_eq!(forum.find_topic(&t1).await.unwrap(), before);
        assert_eq!(events.0.lock().await.len(), MAX_REPLY_DEPTH);

        // the whole chain still goes through json
        let json = serde_json::to_string(&before).unwrap();
        let parsed: Topic = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_replies(), MAX_REPLY_DEPTH);
    }

    #[tokio::test]
    async fn nested_reply_votes_leave_parent_alone() {
        let (forum, events) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        let r0 = forum
            .add_reply(&t1, reply_to(None, "r0"), None)
            .await
            .unwrap();
        let r1 = forum
            .add_reply(&t1, reply_to(Some(&r0.id), "r1"), Some(user()))
            .await
            .unwrap();
        assert_eq!(
            forum.adjust_reply_score(&t1, &r1.id, Vote::Up).await.unwrap(),
            1
        );
        assert_eq!(
            forum.adjust_reply_score(&t1, &r1.id, Vote::Up).await.unwrap(),
            2
        );
        let topic = forum.find_topic(&t1).await.unwrap();
        assert_eq!(topic.find_reply(&r1.id).unwrap().vote_score, 2);
        assert_eq!(topic.find_reply(&r0.id).unwrap().vote_score, 0);
        assert_eq!(
            events.0.lock().await.last(),
            Some(&ForumEvent::ReplyVoteUpdate {
                topic_id: t1,
                reply_id: r1.id,
                vote_score: 2
            })
        );
    }

    #[tokio::test]
    async fn reply_vote_round_trip_restores_score() {
        let (forum, _) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        let r = forum
            .add_reply(&t1, reply_to(None, "r"), None)
            .await
            .unwrap();
        forum.adjust_reply_score(&t1, &r.id, Vote::Up).await.unwrap();
        assert_eq!(
            forum.adjust_reply_score(&t1, &r.id, Vote::Down).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn reply_votes_report_what_is_missing() {
        let (forum, _) = forum(vec![empty_topic("t1")]);
        let t1 = TopicId(String::from("t1"));
        let ghost_topic = TopicId(String::from("t2"));
        let ghost_reply = ReplyId(String::from("reply-0"));
        assert_api_err(
            forum
                .adjust_reply_score(&ghost_topic, &ghost_reply, Vote::Up)
                .await,
            ApiError::TopicNotFound(ghost_topic.clone()),
        );
        assert_api_err(
            forum.adjust_reply_score(&t1, &ghost_reply, Vote::Up).await,
            ApiError::ReplyNotFound(ghost_reply.clone()),
        );
        assert_api_err(
            forum
                .add_reply(&ghost_topic, reply_to(None, "x"), None)
                .await,
            ApiError::TopicNotFound(ghost_topic),
        );
    }
}
