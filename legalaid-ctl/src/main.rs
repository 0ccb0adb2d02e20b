use anyhow::{anyhow, Context};
use legalaid_api::{
    Category, Envelope, NewReply, NewTopic, Reply, ReplyId, Topic, Vote, VoteResult,
    USER_ID_HEADER, USER_IMAGE_HEADER, USER_NAME_HEADER,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, default_value = "http://127.0.0.1:3000")]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// List all topics, newest first
    Topics,

    /// Show a topic along with its whole reply tree
    Topic { id: String },

    /// Open a new topic
    NewTopic {
        title: String,

        /// One of the categories listed by the `categories` command
        category: String,

        content: String,

        /// Hide your name even if LEGALAID_USER_ID is set
        #[structopt(long)]
        anonymous: bool,
    },

    /// Reply to a topic, or to one of its replies
    Reply {
        topic: String,

        content: String,

        /// Reply to send this one below, at any depth
        #[structopt(long)]
        parent: Option<String>,

        #[structopt(long)]
        anonymous: bool,
    },

    /// Vote on a topic
    VoteTopic {
        topic: String,

        #[structopt(possible_values = &["upvote", "downvote"])]
        vote: String,
    },

    /// Vote on a reply
    VoteReply {
        topic: String,

        reply: String,

        #[structopt(possible_values = &["upvote", "downvote"])]
        vote: String,
    },

    /// List the topic categories
    Categories,
}

struct Client {
    host: String,
    http: reqwest::Client,
}

impl Client {
    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> anyhow::Result<reqwest::RequestBuilder> {
        let mut req = self
            .http
            .request(method, format!("{}/api/community{path}", self.host));
        // identity is vouched for by whatever sits in front of the server
        if let Ok(id) = std::env::var("LEGALAID_USER_ID") {
            let name = std::env::var("LEGALAID_USER_NAME")
                .context("LEGALAID_USER_ID is set but LEGALAID_USER_NAME is not")?;
            req = req.header(USER_ID_HEADER, id).header(USER_NAME_HEADER, name);
            if let Ok(image) = std::env::var("LEGALAID_USER_IMAGE") {
                req = req.header(USER_IMAGE_HEADER, image);
            }
        }
        Ok(req)
    }

    async fn send<T>(&self, req: reqwest::RequestBuilder) -> anyhow::Result<Envelope<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let resp = req.send().await.context("sending request")?;
        let status = resp.status();
        let body = resp.bytes().await.context("reading response body")?;
        if !status.is_success() {
            let err = legalaid_api::Error::parse(&body)
                .with_context(|| format!("server answered {status} with an unexpected body"))?;
            if err.is_not_found() {
                return Err(anyhow::Error::from(err)
                    .context("check the ids with the `topics` and `topic` commands"));
            }
            return Err(err.into());
        }
        serde_json::from_slice(&body).context("parsing response body")
    }
}

fn parse_vote(vote: &str) -> anyhow::Result<Vote> {
    vote.parse()
        .map_err(|()| anyhow!("unknown vote {vote:?}, expected upvote or downvote"))
}

fn print_topic_line(t: &Topic) {
    let author = t.author.display();
    println!(
        "[{}] {} ({}, by {}, {} votes, {} replies, {} views)",
        t.id.0, t.title, t.category, author.name, t.vote_score, t.reply_count, t.views
    );
}

fn print_replies(replies: &[Reply], depth: usize) {
    for r in replies {
        println!(
            "{:indent$}- [{}] {} ({} votes): {}",
            "",
            r.id.0,
            r.author.display().name,
            r.vote_score,
            r.content,
            indent = depth * 2
        );
        print_replies(&r.children, depth + 1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    let client = Client {
        host: opt.host.trim_end_matches('/').to_string(),
        http: reqwest::Client::new(),
    };

    use reqwest::Method;
    match opt.cmd {
        Command::Topics => {
            let res: Envelope<Vec<Topic>> = client
                .send(client.request(Method::GET, "/topics")?)
                .await?;
            println!("{} topics", res.count.unwrap_or(res.data.len()));
            for t in &res.data {
                print_topic_line(t);
            }
        }
        Command::Topic { id } => {
            let res: Envelope<Topic> = client
                .send(client.request(Method::GET, &format!("/topics/{id}"))?)
                .await?;
            let t = res.data;
            print_topic_line(&t);
            println!("{}", t.content);
            println!("{} replies in total", t.total_replies());
            print_replies(&t.replies, 0);
        }
        Command::NewTopic {
            title,
            category,
            content,
            anonymous,
        } => {
            let req = client.request(Method::POST, "/topics")?.json(&NewTopic {
                title,
                category,
                content,
                anonymous,
            });
            let res: Envelope<Topic> = client.send(req).await?;
            println!("created topic {}", res.data.id.0);
        }
        Command::Reply {
            topic,
            content,
            parent,
            anonymous,
        } => {
            let req = client
                .request(Method::POST, &format!("/topics/{topic}/replies"))?
                .json(&NewReply {
                    content,
                    parent_id: parent.map(ReplyId),
                    anonymous,
                });
            let res: Envelope<Reply> = client.send(req).await?;
            println!("created reply {}", res.data.id.0);
        }
        Command::VoteTopic { topic, vote } => {
            let vote = parse_vote(&vote)?;
            let path = format!("/topics/{topic}/{}", vote.segment());
            let res: Envelope<VoteResult> =
                client.send(client.request(Method::PUT, &path)?).await?;
            println!("{} (score is now {})", res.data.message, res.data.vote_score);
        }
        Command::VoteReply { topic, reply, vote } => {
            let vote = parse_vote(&vote)?;
            let path = format!("/topics/{topic}/replies/{reply}/{}", vote.segment());
            let res: Envelope<VoteResult> =
                client.send(client.request(Method::PUT, &path)?).await?;
            println!("{} (score is now {})", res.data.message, res.data.vote_score);
        }
        Command::Categories => {
            let res: Envelope<Vec<Category>> = client
                .send(client.request(Method::GET, "/categories")?)
                .await?;
            for c in res.data {
                println!(
                    "{} [{}]: {} topics, {} posts",
                    c.name, c.icon, c.topics, c.posts
                );
            }
        }
    }

    Ok(())
}
