use std::{collections::VecDeque, path::Path};

use anyhow::Context;
use async_trait::async_trait;
use legalaid_api::{Author, Time, Topic, TopicId, UserRef};
use tokio::sync::RwLock;

/// Where topics live. The forum logic only ever goes through this trait.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Newest topics first
    async fn list(&self) -> anyhow::Result<Vec<Topic>>;

    async fn find(&self, id: &TopicId) -> anyhow::Result<Option<Topic>>;

    /// The inserted topic becomes the first one listed
    async fn insert(&self, topic: Topic) -> anyhow::Result<()>;

    /// Runs `f` on the topic, atomically with respect to every other store call.
    ///
    /// Returns `None` if there is no such topic.
    async fn update<F, R>(&self, id: &TopicId, f: F) -> anyhow::Result<Option<R>>
    where
        F: Send + FnOnce(&mut Topic) -> R,
        R: Send;
}

/// In-memory store, one lock for the whole collection
#[derive(Debug, Default)]
pub struct MemStore(RwLock<VecDeque<Topic>>);

impl MemStore {
    /// `topics` must already be in listing order
    pub fn new(topics: Vec<Topic>) -> MemStore {
        MemStore(RwLock::new(topics.into()))
    }

    pub fn load_seed(path: &Path) -> anyhow::Result<MemStore> {
        let data = std::fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let topics: Vec<Topic> =
            serde_json::from_slice(&data).with_context(|| format!("parsing topics from {path:?}"))?;
        tracing::info!(num_topics = topics.len(), "loaded seed topics");
        Ok(MemStore::new(topics))
    }

    pub fn with_samples() -> anyhow::Result<MemStore> {
        Ok(MemStore::new(sample_topics()?))
    }
}

#[async_trait]
impl TopicStore for MemStore {
    async fn list(&self) -> anyhow::Result<Vec<Topic>> {
        Ok(self.0.read().await.iter().cloned().collect())
    }

    async fn find(&self, id: &TopicId) -> anyhow::Result<Option<Topic>> {
        Ok(self.0.read().await.iter().find(|t| t.id == *id).cloned())
    }

    async fn insert(&self, topic: Topic) -> anyhow::Result<()> {
        self.0.write().await.push_front(topic);
        Ok(())
    }

    async fn update<F, R>(&self, id: &TopicId, f: F) -> anyhow::Result<Option<R>>
    where
        F: Send + FnOnce(&mut Topic) -> R,
        R: Send,
    {
        Ok(self.0.write().await.iter_mut().find(|t| t.id == *id).map(f))
    }
}

fn sample_topic(
    id: &str,
    title: &str,
    category: &str,
    (name, image): (&str, &str),
    (views, vote_score, reply_count): (u64, i64, usize),
    created_at: &str,
    content: &str,
) -> anyhow::Result<Topic> {
    Ok(Topic {
        id: TopicId(String::from(id)),
        title: String::from(title),
        category: String::from(category),
        content: String::from(content),
        author: Author::User(UserRef {
            id: format!("sample-user-{id}"),
            name: String::from(name),
            profile_image: Some(String::from(image)),
        }),
        vote_score,
        views,
        created_at: created_at
            .parse::<Time>()
            .with_context(|| format!("parsing creation date of sample topic {id}"))?,
        reply_count,
        replies: Vec::new(),
    })
}

/// What the forum shows before anyone posted anything
pub fn sample_topics() -> anyhow::Result<Vec<Topic>> {
    Ok(vec![
        sample_topic(
            "1",
            "Landlord won't fix heating, what are my options?",
            "Housing & Tenant Issues",
            ("John Smith", "/avatar1.jpg"),
            (234, 12, 15),
            "2023-10-25T14:32:00Z",
            "My apartment heating has been broken for two weeks now and temperatures are \
             dropping. I've contacted my landlord multiple times but they keep saying they'll \
             'get to it'. What are my legal options?",
        )?,
        sample_topic(
            "2",
            "How does child custody work with an out-of-state move?",
            "Family Law",
            ("Parent In Need", "/avatar2.jpg"),
            (128, 8, 7),
            "2023-10-24T09:15:00Z",
            "I have joint custody of my children with my ex-spouse. I received a job offer in \
             another state that would significantly improve our financial situation. How can I \
             legally move with my children?",
        )?,
        sample_topic(
            "3",
            "Employer not paying overtime, what documentation do I need?",
            "Employment Law",
            ("Worker Rights", "/avatar3.jpg"),
            (302, 15, 21),
            "2023-10-20T16:45:00Z",
            "I've been working 50+ hours weekly for the past three months, but my employer \
             hasn't paid any overtime. What kind of documentation should I gather to support \
             my case?",
        )?,
        sample_topic(
            "4",
            "Success story: Won my security deposit case in small claims!",
            "Small Claims",
            ("Victorious Renter", "/avatar4.jpg"),
            (253, 6, 18),
            "2023-10-22T11:20:00Z",
            "Just wanted to share my success story of winning my security deposit case in small \
             claims court. Happy to answer questions about the process!",
        )?,
    ])
}
