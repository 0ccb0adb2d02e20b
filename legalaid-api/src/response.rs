/// Success body of every endpoint: `{success: true, data, count?}`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Envelope<T> {
        Envelope {
            success: true,
            count: None,
            data,
        }
    }

    pub fn counted(count: usize, data: T) -> Envelope<T> {
        Envelope {
            success: true,
            count: Some(count),
            data,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub message: String,
    pub vote_score: i64,
}
