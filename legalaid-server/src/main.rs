use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

mod error;
mod extractors;
mod feeds;
mod forum;
mod fuzz;
mod handlers;
mod store;

use error::Error;
use extractors::AppState;
use feeds::{NoopNotifier, Notifier, TopicFeeds};
use forum::Forum;
use store::{MemStore, TopicStore};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Address to listen on
    #[structopt(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// JSON array of topics to start with, as written by generate-test-data
    #[structopt(long, env = "SEED_FILE", parse(from_os_str))]
    seed_file: Option<PathBuf>,

    /// Do not relay change events to websocket subscribers
    #[structopt(long)]
    disable_feed: bool,
}

pub fn app(store: MemStore, enable_feed: bool) -> Router {
    let feeds = TopicFeeds::new();
    let notifier: Arc<dyn Notifier> = match enable_feed {
        true => Arc::new(feeds.clone()),
        false => Arc::new(NoopNotifier),
    };
    let state = AppState {
        forum: Arc::new(Forum::new(store, notifier)),
        feeds,
    };

    let mut community = Router::new()
        .route(
            "/topics",
            get(handlers::list_topics).post(handlers::create_topic),
        )
        .route("/topics/:id", get(handlers::get_topic))
        .route("/topics/:id/replies", post(handlers::add_reply))
        .route("/topics/:id/:vote", put(handlers::vote_topic))
        .route(
            "/topics/:id/replies/:reply_id/:vote",
            put(handlers::vote_reply),
        )
        .route("/categories", get(handlers::list_categories));
    if enable_feed {
        community = community.route("/feed", get(handlers::feed));
    }

    Router::new()
        .nest("/api/community", community)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let store = match &opt.seed_file {
        Some(path) => MemStore::load_seed(path)
            .with_context(|| format!("loading seed file {path:?}"))?,
        None => MemStore::with_samples().context("building sample topics")?,
    };
    if opt.disable_feed {
        tracing::info!("change feed disabled");
    }
    let app = app(store, !opt.disable_feed);

    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
