use chrono::Utc;
use uuid::Uuid;

use crate::{Author, Error, Time, Vote};

/// Replies may sit at depths `0..MAX_REPLY_DEPTH` below their topic.
///
/// Cloning, serializing and dropping a reply recurse through its children,
/// and clients parse topics with serde_json's nesting limit of 128.
pub const MAX_REPLY_DEPTH: usize = 32;

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct ReplyId(pub String);

impl ReplyId {
    pub fn generate() -> ReplyId {
        ReplyId(format!("reply-{}", Uuid::new_v4()))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: ReplyId,
    pub content: String,
    pub author: Author,
    pub vote_score: i64,
    pub created_at: Time,

    /// Replies to this reply, in display order
    #[serde(default)]
    pub children: Vec<Reply>,
}

impl Reply {
    pub fn now(content: String, author: Author) -> Reply {
        Reply {
            id: ReplyId::generate(),
            content,
            author,
            vote_score: 0,
            created_at: Utc::now(),
            children: Vec::new(),
        }
    }

    /// Returns the new score
    pub fn apply_vote(&mut self, vote: Vote) -> i64 {
        self.vote_score = self.vote_score.saturating_add(vote.delta());
        self.vote_score
    }

    /// Number of nodes in the forest, nested ones included
    pub fn count_in(replies: &[Reply]) -> usize {
        let mut count = 0;
        let mut stack = vec![replies];
        while let Some(siblings) = stack.pop() {
            count += siblings.len();
            stack.extend(siblings.iter().map(|r| &r.children as &[Reply]));
        }
        count
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub content: String,

    /// If set, this is a reply to another reply rather than to the topic
    pub parent_id: Option<ReplyId>,

    #[serde(default)]
    pub anonymous: bool,
}

impl NewReply {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_required("content", &self.content)?;
        if let Some(p) = &self.parent_id {
            crate::validate_string(&p.0)?;
        }
        Ok(())
    }
}

/// Child indices leading from a topic's top-level replies down to one reply
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplyPath(Vec<usize>);

impl ReplyPath {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// 0 for top-level replies
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Depth-first search for `id`.
    ///
    /// Each sibling list is scanned in full before the search descends, in
    /// order, into the subtrees of its members. The explicit stack keeps
    /// arbitrarily deep trees off the call stack.
    pub fn locate(replies: &[Reply], id: &ReplyId) -> Option<ReplyPath> {
        let mut stack: Vec<(Vec<usize>, &[Reply])> = vec![(Vec::new(), replies)];
        while let Some((prefix, siblings)) = stack.pop() {
            if let Some(i) = siblings.iter().position(|r| r.id == *id) {
                let mut path = prefix;
                path.push(i);
                return Some(ReplyPath(path));
            }
            // reversed so that the first sibling's subtree gets popped first
            for (i, r) in siblings.iter().enumerate().rev() {
                if !r.children.is_empty() {
                    let mut path = prefix.clone();
                    path.push(i);
                    stack.push((path, &r.children));
                }
            }
        }
        None
    }

    pub fn get<'a>(&self, replies: &'a [Reply]) -> Option<&'a Reply> {
        let (first, rest) = self.0.split_first()?;
        let mut node = replies.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn get_mut<'a>(&self, replies: &'a mut [Reply]) -> Option<&'a mut Reply> {
        let (first, rest) = self.0.split_first()?;
        let mut node = replies.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(id: &str, children: Vec<Reply>) -> Reply {
        Reply {
            id: ReplyId(String::from(id)),
            content: format!("content of {id}"),
            author: Author::Anonymous,
            vote_score: 0,
            created_at: Utc::now(),
            children,
        }
    }

    fn id(s: &str) -> ReplyId {
        ReplyId(String::from(s))
    }

    fn forest() -> Vec<Reply> {
        vec![
            reply(
                "a",
                vec![reply("a0", vec![reply("a00", vec![])]), reply("a1", vec![])],
            ),
            reply("b", vec![reply("b0", vec![])]),
        ]
    }

    #[test]
    fn locate_finds_every_depth() {
        let f = forest();
        let cases = [
            ("a", vec![0], 0),
            ("b", vec![1], 0),
            ("a1", vec![0, 1], 1),
            ("b0", vec![1, 0], 1),
            ("a00", vec![0, 0, 0], 2),
        ];
        for (name, indices, depth) in cases {
            let path = ReplyPath::locate(&f, &id(name)).expect("reply should be found");
            assert_eq!(path.indices(), &indices[..], "path of {name}");
            assert_eq!(path.depth(), depth, "depth of {name}");
            assert_eq!(path.get(&f).unwrap().id, id(name));
        }
        assert_eq!(ReplyPath::locate(&f, &id("nope")), None);
        assert_eq!(ReplyPath::locate(&[], &id("a")), None);
    }

    #[test]
    fn siblings_are_checked_before_descending() {
        // "dup" exists both as a grandchild of "a" and as the second top-level reply
        let f = vec![
            reply("a", vec![reply("dup", vec![])]),
            reply("dup", vec![]),
        ];
        let path = ReplyPath::locate(&f, &id("dup")).unwrap();
        assert_eq!(path.indices(), &[1]);
    }

    #[test]
    fn first_subtree_is_searched_before_later_ones() {
        let f = vec![
            reply("a", vec![reply("a0", vec![reply("dup", vec![])])]),
            reply("b", vec![reply("dup", vec![])]),
        ];
        let path = ReplyPath::locate(&f, &id("dup")).unwrap();
        assert_eq!(path.indices(), &[0, 0, 0]);
    }

    #[test]
    fn get_mut_mutates_only_the_target() {
        let mut f = forest();
        let path = ReplyPath::locate(&f, &id("a0")).unwrap();
        let node = path.get_mut(&mut f).unwrap();
        assert_eq!(node.apply_vote(Vote::Up), 1);
        assert_eq!(node.apply_vote(Vote::Up), 2);
        assert_eq!(f[0].vote_score, 0);
        assert_eq!(f[0].children[0].vote_score, 2);
        assert_eq!(f[0].children[0].children[0].vote_score, 0);
    }

    #[test]
    fn stale_paths_return_none() {
        let f = forest();
        assert!(ReplyPath(vec![5]).get(&f).is_none());
        assert!(ReplyPath(vec![0, 0, 3]).get(&f).is_none());
        assert!(ReplyPath::default().get(&f).is_none());
    }

    #[test]
    fn count_includes_nested_replies() {
        assert_eq!(Reply::count_in(&forest()), 6);
        assert_eq!(Reply::count_in(&[]), 0);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let depth = 2_000;
        let mut node = reply(&format!("n{depth}"), vec![]);
        for i in (0..depth).rev() {
            node = reply(&format!("n{i}"), vec![node]);
        }
        let f = vec![node];
        let path = ReplyPath::locate(&f, &id(&format!("n{depth}"))).unwrap();
        assert_eq!(path.depth(), depth);
        assert_eq!(Reply::count_in(&f), depth + 1);
    }

    #[test]
    fn new_reply_parses_camel_case() {
        let r: NewReply =
            serde_json::from_str(r#"{"content":"hi","parentId":"reply-1"}"#).unwrap();
        assert_eq!(r.parent_id, Some(id("reply-1")));
        assert!(!r.anonymous);
        assert_eq!(r.validate(), Ok(()));
        let r: NewReply = serde_json::from_str(r#"{"content":"","parentId":null}"#).unwrap();
        assert_eq!(
            r.validate(),
            Err(Error::MissingField(String::from("content")))
        );
    }
}
