#![cfg(test)]

use std::{cmp, fmt::Debug, ops::RangeTo, panic::AssertUnwindSafe};

use async_recursion::async_recursion;
use bolero::generator::TypeGenerator;
use axum::{
    body::Body,
    http::{self, request},
    Router,
};
use legalaid_api::{
    Envelope, Error as ApiError, NewReply, NewTopic, Reply, ReplyId, Topic, TopicId, UserRef,
    Vote, VoteResult, USER_ID_HEADER, USER_IMAGE_HEADER, USER_NAME_HEADER,
};
use legalaid_mock_server::MockServer;
use tower::{Service, ServiceExt};

use crate::{app, store::sample_topics, MemStore};

macro_rules! do_tokio_test {
    ( $name:ident, $gen:expr, $fn:expr ) => {
        #[test]
        fn $name() {
            if std::env::var("RUST_LOG").is_ok() {
                let _ = tracing_subscriber::fmt::try_init();
            }
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_generator($gen)
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

pub async fn call<Resp>(app: &mut Router, req: request::Request<Body>) -> Result<Resp, ApiError>
where
    Resp: for<'de> serde::Deserialize<'de>,
{
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status.is_success() {
        let envelope: Envelope<Resp> = serde_json::from_slice(&body).unwrap_or_else(|err| {
            panic!("failed parsing resp body {err}, body is {body:?}")
        });
        assert!(envelope.success, "successful response without success flag");
        return Ok(envelope.data);
    }
    let err = ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}"));
    assert_eq!(status, err.status_code(), "status does not match error {err:?}");
    Err(err)
}

pub fn build_request<Req>(
    method: &str,
    uri: &str,
    user: Option<&UserRef>,
    body: &Req,
) -> request::Request<Body>
where
    Req: serde::Serialize,
{
    let mut req = request::Builder::new()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        req = req
            .header(USER_ID_HEADER, &user.id)
            .header(USER_NAME_HEADER, &user.name);
        if let Some(image) = &user.profile_image {
            req = req.header(USER_IMAGE_HEADER, image);
        }
    }
    req.body(Body::from(
        serde_json::to_vec(body).expect("serializing request body to json"),
    ))
    .expect("building request")
}

pub async fn run_on_app<Req, Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    user: Option<&UserRef>,
    body: &Req,
) -> Result<Resp, ApiError>
where
    Req: serde::Serialize,
    Resp: for<'de> serde::Deserialize<'de>,
{
    call(app, build_request(method, uri, user, body)).await
}

/// Drops what legitimately differs between two implementations: generated ids and clocks
fn normalize(mut v: serde_json::Value) -> serde_json::Value {
    match &mut v {
        serde_json::Value::Object(m) => {
            m.remove("id");
            m.remove("createdAt");
            for x in m.values_mut() {
                *x = normalize(x.take());
            }
        }
        serde_json::Value::Array(a) => {
            for x in a.iter_mut() {
                *x = normalize(x.take());
            }
        }
        _ => (),
    }
    v
}

fn shape<T: serde::Serialize>(t: &T) -> serde_json::Value {
    normalize(serde_json::to_value(t).expect("serializing to json"))
}

fn compare<T>(name: &str, app_res: Result<T, ApiError>, mock_res: Result<T, ApiError>)
where
    T: Debug + PartialEq,
{
    assert_eq!(
        app_res, mock_res,
        "app and mock did not return the same result for {name}"
    );
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    CreateTopic {
        as_user: bool,
        anonymous: bool,
        blank_title: bool,
    },
    AddReply {
        topic: usize,
        parent: Option<usize>,
        as_user: bool,
        anonymous: bool,
        ghost_parent: bool,
    },
    VoteTopic {
        topic: usize,
        vote: Vote,
        ghost: bool,
    },
    VoteReply {
        topic: usize,
        reply: usize,
        vote: Vote,
        ghost: bool,
    },
    GetTopic {
        topic: usize,
        ghost: bool,
    },
    ListCategories,
}

/// Same entity, as named by the app and by the mock
#[derive(Clone, Debug)]
struct Pair<T> {
    app: T,
    mock: T,
}

impl<T: Clone> Pair<T> {
    fn same(t: T) -> Pair<T> {
        Pair {
            app: t.clone(),
            mock: t,
        }
    }
}

struct ComparativeFuzzer {
    app: Router,
    mock: MockServer,
    user: UserRef,
    topics: Vec<Pair<TopicId>>,
    replies: Vec<Vec<Pair<ReplyId>>>,
    counter: usize,
}

impl ComparativeFuzzer {
    fn new() -> ComparativeFuzzer {
        let samples = sample_topics().expect("building sample topics");
        let topics = samples.iter().map(|t| Pair::same(t.id.clone())).collect();
        let replies = samples.iter().map(|_| Vec::new()).collect();
        ComparativeFuzzer {
            app: app(MemStore::new(samples.clone()), true),
            mock: MockServer::with_topics(samples),
            user: UserRef {
                id: String::from("fuzz-user"),
                name: String::from("Fuzz User"),
                profile_image: None,
            },
            topics,
            replies,
            counter: 0,
        }
    }

    fn user(&self, as_user: bool) -> Option<UserRef> {
        as_user.then(|| self.user.clone())
    }

    fn pick_topic(&self, topic: usize, ghost: bool) -> (Option<usize>, Pair<TopicId>) {
        match resize_int(topic, ..self.topics.len()) {
            Some(i) if !ghost => (Some(i), self.topics[i].clone()),
            _ => (None, Pair::same(TopicId(String::from("ghost-topic")))),
        }
    }

    fn next_text(&mut self, what: &str) -> String {
        self.counter += 1;
        format!("{what} {}", self.counter)
    }

    #[async_recursion]
    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        match op {
            FuzzOp::CreateTopic {
                as_user,
                anonymous,
                blank_title,
            } => {
                let new_topic = NewTopic {
                    title: match blank_title {
                        true => String::new(),
                        false => self.next_text("title"),
                    },
                    category: String::from("Housing & Tenant Issues"),
                    content: self.next_text("content"),
                    anonymous,
                };
                let user = self.user(as_user);
                let app_res: Result<Topic, ApiError> = run_on_app(
                    &mut self.app,
                    "POST",
                    "/api/community/topics",
                    user.as_ref(),
                    &new_topic,
                )
                .await;
                let mock_res = self.mock.create_topic(user, new_topic);
                if let (Ok(app), Ok(mock)) = (&app_res, &mock_res) {
                    self.topics.push(Pair {
                        app: app.id.clone(),
                        mock: mock.id.clone(),
                    });
                    self.replies.push(Vec::new());
                }
                compare(
                    "CreateTopic",
                    app_res.map(|t| shape(&t)),
                    mock_res.map(|t| shape(&t)),
                );
            }
            FuzzOp::AddReply {
                topic,
                parent,
                as_user,
                anonymous,
                ghost_parent,
            } => {
                let ti = match resize_int(topic, ..self.topics.len()) {
                    Some(ti) => ti,
                    None => {
                        self.execute_fuzz_op(FuzzOp::CreateTopic {
                            as_user,
                            anonymous,
                            blank_title: false,
                        })
                        .await;
                        return self
                            .execute_fuzz_op(FuzzOp::AddReply {
                                topic,
                                parent,
                                as_user,
                                anonymous,
                                ghost_parent,
                            })
                            .await;
                    }
                };
                let parent = match ghost_parent {
                    true => Some(Pair::same(ReplyId(String::from("ghost-reply")))),
                    false => parent
                        .and_then(|p| resize_int(p, ..self.replies[ti].len()))
                        .map(|p| self.replies[ti][p].clone()),
                };
                let content = self.next_text("reply");
                let user = self.user(as_user);
                let topic = self.topics[ti].clone();
                let app_res: Result<Reply, ApiError> = run_on_app(
                    &mut self.app,
                    "POST",
                    &format!("/api/community/topics/{}/replies", topic.app.0),
                    user.as_ref(),
                    &NewReply {
                        content: content.clone(),
                        parent_id: parent.as_ref().map(|p| p.app.clone()),
                        anonymous,
                    },
                )
                .await;
                let mock_res = self.mock.add_reply(
                    user,
                    &topic.mock,
                    NewReply {
                        content,
                        parent_id: parent.map(|p| p.mock),
                        anonymous,
                    },
                );
                if let (Ok(app), Ok(mock)) = (&app_res, &mock_res) {
                    self.replies[ti].push(Pair {
                        app: app.id.clone(),
                        mock: mock.id.clone(),
                    });
                }
                compare(
                    "AddReply",
                    app_res.map(|r| shape(&r)),
                    mock_res.map(|r| shape(&r)),
                );
            }
            FuzzOp::VoteTopic { topic, vote, ghost } => {
                let (_, topic) = self.pick_topic(topic, ghost);
                let app_res: Result<VoteResult, ApiError> = run_on_app(
                    &mut self.app,
                    "PUT",
                    &format!("/api/community/topics/{}/{}", topic.app.0, vote.segment()),
                    None,
                    &(),
                )
                .await;
                let mock_res = self.mock.vote_topic(&topic.mock, vote);
                compare(
                    "VoteTopic",
                    app_res.map(|r| r.vote_score),
                    mock_res.map(|r| r.vote_score),
                );
            }
            FuzzOp::VoteReply {
                topic,
                reply,
                vote,
                ghost,
            } => {
                let (ti, topic) = self.pick_topic(topic, false);
                let reply = match ti.and_then(|ti| resize_int(reply, ..self.replies[ti].len())) {
                    Some(ri) if !ghost => self.replies[ti.expect("reply without topic")][ri].clone(),
                    _ => Pair::same(ReplyId(String::from("ghost-reply"))),
                };
                let app_res: Result<VoteResult, ApiError> = run_on_app(
                    &mut self.app,
                    "PUT",
                    &format!(
                        "/api/community/topics/{}/replies/{}/{}",
                        topic.app.0,
                        reply.app.0,
                        vote.segment()
                    ),
                    None,
                    &(),
                )
                .await;
                let mock_res = self.mock.vote_reply(&topic.mock, &reply.mock, vote);
                compare(
                    "VoteReply",
                    app_res.map(|r| r.vote_score),
                    mock_res.map(|r| r.vote_score),
                );
            }
            FuzzOp::GetTopic { topic, ghost } => {
                let (_, topic) = self.pick_topic(topic, ghost);
                let app_res: Result<Topic, ApiError> = run_on_app(
                    &mut self.app,
                    "GET",
                    &format!("/api/community/topics/{}", topic.app.0),
                    None,
                    &(),
                )
                .await;
                let mock_res = self.mock.get_topic(&topic.mock);
                compare(
                    "GetTopic",
                    app_res.map(|t| shape(&t)),
                    mock_res.map(|t| shape(&t)),
                );
            }
            FuzzOp::ListCategories => {
                compare(
                    "ListCategories",
                    run_on_app(&mut self.app, "GET", "/api/community/categories", None, &())
                        .await,
                    Ok(self.mock.list_categories()),
                );
            }
        }
    }

    async fn compare_listings(&mut self) {
        let app_res: Result<Vec<Topic>, ApiError> =
            run_on_app(&mut self.app, "GET", "/api/community/topics", None, &()).await;
        compare(
            "ListTopics",
            app_res.map(|t| shape(&t)),
            self.mock.list_topics().map(|t| shape(&t)),
        );
    }
}

do_tokio_test!(
    compare_with_mock,
    bolero::generator::gen_with::<Vec<FuzzOp>>().len(1..60usize),
    |test: Vec<FuzzOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new();
        for op in test {
            fuzzer.execute_fuzz_op(op).await;
        }
        fuzzer.compare_listings().await;
    }
);
