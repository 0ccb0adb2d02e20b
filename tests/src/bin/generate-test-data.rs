use anyhow::Context;
use chrono::{Duration, Utc};
use legalaid_api::{Author, Category, NewTopic, Reply, ReplyId, Topic, UserRef};
use rand::{seq::SliceRandom, Rng};

const NUM_USERS: usize = 8;

const NUM_TOPICS: usize = 40;
const TOPIC_TITLE_LEN: usize = 8;
const TOPIC_CONTENT_LEN: usize = 60;

const MAX_REPLIES_PER_TOPIC: usize = 25;
const REPLY_CONTENT_LEN: usize = 25;
const ANONYMOUS_ONE_IN: u32 = 5;

const MAX_AGE_DAYS: i64 = 60;

fn gen_author(rng: &mut impl Rng, users: &[UserRef]) -> Author {
    match rng.gen_ratio(1, ANONYMOUS_ONE_IN) {
        true => Author::Anonymous,
        false => Author::User(users.choose(rng).expect("no users generated").clone()),
    }
}

fn gen_score(rng: &mut impl Rng) -> i64 {
    rng.gen_range(-3..30)
}

fn main() -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let categories = Category::defaults();

    // Generate users
    let users = (0..NUM_USERS)
        .map(|i| UserRef {
            id: format!("user-{i}"),
            name: lipsum::lipsum_title(),
            profile_image: rng
                .gen_bool(0.5)
                .then(|| format!("/avatar{}.jpg", i % 5 + 1)),
        })
        .collect::<Vec<_>>();

    let mut topics = Vec::with_capacity(NUM_TOPICS);
    for _ in 0..NUM_TOPICS {
        let category = categories.choose(&mut rng).context("no categories")?;
        let mut topic = Topic::now(
            NewTopic {
                title: lipsum::lipsum_words(TOPIC_TITLE_LEN),
                category: category.name.clone(),
                content: lipsum::lipsum_words(TOPIC_CONTENT_LEN),
                anonymous: false,
            },
            gen_author(&mut rng, &users),
        );
        let age = Duration::minutes(rng.gen_range(0..MAX_AGE_DAYS * 24 * 60));
        topic.created_at = Utc::now() - age;
        topic.vote_score = gen_score(&mut rng);
        topic.views = rng.gen_range(0..500);

        // Generate replies, each one below a random earlier reply or at the top level
        let mut ids: Vec<ReplyId> = Vec::new();
        let mut date = topic.created_at;
        for _ in 0..rng.gen_range(0..=MAX_REPLIES_PER_TOPIC) {
            let parent = match rng.gen_bool(0.3) {
                true => None,
                false => ids.choose(&mut rng).cloned(),
            };
            let mut reply = Reply::now(
                lipsum::lipsum_words(REPLY_CONTENT_LEN),
                gen_author(&mut rng, &users),
            );
            date = date + Duration::minutes(rng.gen_range(1..600));
            reply.created_at = date;
            reply.vote_score = gen_score(&mut rng);
            ids.push(reply.id.clone());
            topic
                .attach_reply(parent.as_ref(), reply)
                .context("attaching generated reply")?;
        }
        topics.push(topic);
    }

    // Newest first, the order the store lists them in
    topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    println!(
        "{}",
        serde_json::to_string_pretty(&topics).context("serializing topics")?
    );
    Ok(())
}
