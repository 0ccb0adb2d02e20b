use std::str::FromStr;

use bolero::generator::TypeGenerator;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn delta(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }

    /// URL path segment of this vote
    pub fn segment(self) -> &'static str {
        match self {
            Vote::Up => "upvote",
            Vote::Down => "downvote",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vote::Up => "Upvote",
            Vote::Down => "Downvote",
        }
    }
}

impl FromStr for Vote {
    type Err = ();

    fn from_str(s: &str) -> Result<Vote, ()> {
        match s {
            "upvote" => Ok(Vote::Up),
            "downvote" => Ok(Vote::Down),
            _ => Err(()),
        }
    }
}
