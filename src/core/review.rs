use crate::core::coerce::Classification;
use crate::core::transcript::VideoTranscript;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `reviews.json`. `word` and `score` are whatever the model
/// gave, string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub cover: String,
    pub word: Value,
    pub score: Value,
    pub video_url: String,
    pub description: String,
}

pub fn assemble_review(
    classification: &Classification,
    video: &VideoTranscript,
    video_url: &str,
) -> Option<ReviewRecord> {
    if !classification.review {
        return None;
    }

    Some(ReviewRecord {
        cover: video.cover.clone(),
        word: classification.word.clone(),
        score: classification.score.clone(),
        video_url: video_url.to_string(),
        description: video.description.clone(),
    })
}
