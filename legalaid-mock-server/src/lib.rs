use legalaid_api::{
    Author, Category, Error, NewReply, NewTopic, Reply, ReplyId, Topic, TopicId, UserRef, Vote,
    VoteResult, MAX_REPLY_DEPTH,
};

/// Reference model of the community endpoints.
///
/// Keeps everything in a plain vector and searches reply trees by naive
/// recursion, so the real server can be checked against it.
pub struct MockServer(Vec<Topic>);

/// Returns the reply along with its depth below the topic
fn find_reply<'a>(
    replies: &'a mut [Reply],
    id: &ReplyId,
    depth: usize,
) -> Option<(usize, &'a mut Reply)> {
    for r in replies.iter_mut() {
        if r.id == *id {
            return Some((depth, r));
        }
        if let Some(res) = find_reply(&mut r.children, id, depth + 1) {
            return Some(res);
        }
    }
    None
}

impl MockServer {
    pub fn with_topics(topics: Vec<Topic>) -> MockServer {
        MockServer(topics)
    }

    fn topic_mut(&mut self, id: &TopicId) -> Result<&mut Topic, Error> {
        self.0
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| Error::TopicNotFound(id.clone()))
    }

    pub fn list_topics(&self) -> Result<Vec<Topic>, Error> {
        Ok(self.0.clone())
    }

    pub fn get_topic(&self, id: &TopicId) -> Result<Topic, Error> {
        self.0
            .iter()
            .find(|t| t.id == *id)
            .cloned()
            .ok_or_else(|| Error::TopicNotFound(id.clone()))
    }

    pub fn list_categories(&self) -> Vec<Category> {
        Category::defaults()
    }

    pub fn create_topic(&mut self, user: Option<UserRef>, t: NewTopic) -> Result<Topic, Error> {
        t.validate()?;
        let author = Author::for_request(user, t.anonymous);
        let topic = Topic::now(t, author);
        self.0.insert(0, topic.clone());
        Ok(topic)
    }

    pub fn add_reply(
        &mut self,
        user: Option<UserRef>,
        topic: &TopicId,
        r: NewReply,
    ) -> Result<Reply, Error> {
        r.validate()?;
        let topic = self.topic_mut(topic)?;
        let reply = Reply::now(r.content, Author::for_request(user, r.anonymous));
        match r.parent_id {
            None => topic.replies.push(reply.clone()),
            Some(parent) => match find_reply(&mut topic.replies, &parent, 0) {
                Some((depth, _)) if depth + 1 >= MAX_REPLY_DEPTH => {
                    return Err(Error::ReplyTooDeep(parent))
                }
                Some((_, p)) => p.children.push(reply.clone()),
                None => return Err(Error::ParentNotFound(parent)),
            },
        }
        topic.reply_count = topic.replies.len();
        Ok(reply)
    }

    pub fn vote_topic(&mut self, id: &TopicId, vote: Vote) -> Result<VoteResult, Error> {
        let topic = self.topic_mut(id)?;
        topic.vote_score = topic.vote_score.saturating_add(vote.delta());
        Ok(VoteResult {
            message: format!("{} for topic ID: {} registered", vote.label(), id.0),
            vote_score: topic.vote_score,
        })
    }

    pub fn vote_reply(
        &mut self,
        topic: &TopicId,
        reply: &ReplyId,
        vote: Vote,
    ) -> Result<VoteResult, Error> {
        let t = self.topic_mut(topic)?;
        let (_, r) = find_reply(&mut t.replies, reply, 0)
            .ok_or_else(|| Error::ReplyNotFound(reply.clone()))?;
        r.vote_score = r.vote_score.saturating_add(vote.delta());
        Ok(VoteResult {
            message: format!(
                "{} for reply ID: {} in topic ID: {} registered",
                vote.label(),
                reply.0,
                topic.0
            ),
            vote_score: r.vote_score,
        })
    }
}
