use crate::config::Config;
use crate::core::schema::lookup_str;
use crate::error::{Error, Result};
use reqwest::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER,
    USER_AGENT,
};
use serde_json::Value;
use std::future::Future;

const TRANSCRIPTION_ORIGIN: &str = "https://script.tokaudit.io";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36";

/// Fetch metadata and client hints the transcription endpoint sees from its own web client.
const BROWSER_HINT_HEADERS: &[(&str, &str)] = &[
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "cross-site"),
    (
        "sec-ch-ua",
        r#""Not/A)Brand";v="8", "Chromium";v="126", "Google Chrome";v="126""#,
    ),
    ("sec-ch-ua-mobile", "?1"),
    ("sec-ch-ua-platform", r#""Android""#),
];

#[derive(Debug, Clone, PartialEq)]
pub struct VideoTranscript {
    pub description: String,
    pub cover: String,
    pub transcript: String,
}

/// Anything that can turn a video URL into its description, cover and transcript.
pub trait TranscriptSource {
    fn fetch(&self, video_id: &str, video_url: &str) -> impl Future<Output = Result<VideoTranscript>>;
}

#[derive(Clone)]
pub struct TranscriptService {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TranscriptService {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"));
        headers.insert(ORIGIN, HeaderValue::from_static(TRANSCRIPTION_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://script.tokaudit.io/"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in BROWSER_HINT_HEADERS {
            headers.insert(*name, HeaderValue::from_static(*value));
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            endpoint: config.transcription_url.clone(),
            api_key: config.transcription_api_key.clone(),
        })
    }
}

impl TranscriptSource for TranscriptService {
    async fn fetch(&self, video_id: &str, video_url: &str) -> Result<VideoTranscript> {
        tracing::debug!("requesting transcript for {video_id}");

        let response = self
            .client
            .get(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .query(&[("video", video_url), ("get_transcript", "true")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                service: "transcription",
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let payload: Value = serde_json::from_str(&body)?;
        parse_transcription(&payload)
    }
}

/// Reads `{data: {desc, video: {cover}}, subtitles}`.
pub fn parse_transcription(payload: &Value) -> Result<VideoTranscript> {
    Ok(VideoTranscript {
        description: lookup_str(payload, &["data", "desc"])?.to_string(),
        cover: lookup_str(payload, &["data", "video", "cover"])?.to_string(),
        transcript: lookup_str(payload, &["subtitles"])?.to_string(),
    })
}

pub fn canonical_video_url(handle: &str, video_id: &str) -> String {
    format!("https://www.tiktok.com/@{handle}/video/{video_id}")
}

pub(crate) fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(400) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

const MAX_VIDEO_ID_LEN: usize = 128;

/// Ensure a video identifier is safe for downstream use (ledger entries, URLs, API calls).
/// Only ASCII alphanumeric characters plus `_` and `-` are allowed.
pub fn sanitize_video_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::custom("Video ID cannot be empty"));
    }

    if trimmed.len() > MAX_VIDEO_ID_LEN {
        return Err(Error::custom("Video ID is unexpectedly long"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(Error::custom(format!(
            "Video ID {trimmed:?} contains unsupported characters; expected only letters, numbers, '-' or '_'"
        )));
    }

    Ok(trimmed.to_string())
}

/// Splits the comma-separated command line list. Every entry must be a valid id.
pub fn parse_video_ids(list: &str) -> Result<Vec<String>> {
    list.split(',').map(sanitize_video_id).collect()
}
