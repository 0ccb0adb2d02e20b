use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    Json,
};
use futures::StreamExt;
use legalaid_api::{
    Category, Envelope, NewReply, NewTopic, Reply, ReplyId, Topic, TopicId, Vote, VoteResult,
};

use crate::{extractors::*, Error, TopicFeeds};

fn parse_vote(segment: &str, path: impl FnOnce() -> String) -> Result<Vote, Error> {
    segment
        .parse::<Vote>()
        .map_err(|()| Error::unknown_route(path()))
}

pub async fn list_topics(
    State(forum): State<Arc<AppForum>>,
) -> Result<Json<Envelope<Vec<Topic>>>, Error> {
    let topics = forum.list_topics().await?;
    Ok(Json(Envelope::counted(topics.len(), topics)))
}

pub async fn get_topic(
    State(forum): State<Arc<AppForum>>,
    Path(id): Path<TopicId>,
) -> Result<Json<Envelope<Topic>>, Error> {
    Ok(Json(Envelope::ok(forum.find_topic(&id).await?)))
}

pub async fn list_categories() -> Json<Envelope<Vec<Category>>> {
    Json(Envelope::ok(Category::defaults()))
}

pub async fn create_topic(
    State(forum): State<Arc<AppForum>>,
    Identity(user): Identity,
    JsonBody(data): JsonBody<NewTopic>,
) -> Result<(StatusCode, Json<Envelope<Topic>>), Error> {
    let topic = forum.create_topic(data, user).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(topic))))
}

pub async fn add_reply(
    State(forum): State<Arc<AppForum>>,
    Identity(user): Identity,
    Path(id): Path<TopicId>,
    JsonBody(data): JsonBody<NewReply>,
) -> Result<Json<Envelope<Reply>>, Error> {
    Ok(Json(Envelope::ok(forum.add_reply(&id, data, user).await?)))
}

pub async fn vote_topic(
    State(forum): State<Arc<AppForum>>,
    Path((id, vote)): Path<(TopicId, String)>,
) -> Result<Json<Envelope<VoteResult>>, Error> {
    let vote = parse_vote(&vote, || format!("/topics/{}/{vote}", id.0))?;
    let vote_score = forum.vote_topic(&id, vote).await?;
    Ok(Json(Envelope::ok(VoteResult {
        message: format!("{} for topic ID: {} registered", vote.label(), id.0),
        vote_score,
    })))
}

pub async fn vote_reply(
    State(forum): State<Arc<AppForum>>,
    Path((id, reply_id, vote)): Path<(TopicId, ReplyId, String)>,
) -> Result<Json<Envelope<VoteResult>>, Error> {
    let vote = parse_vote(&vote, || {
        format!("/topics/{}/replies/{}/{vote}", id.0, reply_id.0)
    })?;
    let vote_score = forum.adjust_reply_score(&id, &reply_id, vote).await?;
    Ok(Json(Envelope::ok(VoteResult {
        message: format!(
            "{} for reply ID: {} in topic ID: {} registered",
            vote.label(),
            reply_id.0,
            id.0
        ),
        vote_score,
    })))
}

#[derive(serde::Deserialize)]
pub struct FeedParams {
    room: Option<String>,
}

pub async fn feed(
    ws: WebSocketUpgrade,
    State(feeds): State<TopicFeeds>,
    Query(params): Query<FeedParams>,
) -> axum::response::Response {
    ws.on_upgrade(move |sock| {
        let (write, read) = sock.split();
        feeds.serve_socket(params.room, write, read)
    })
}
