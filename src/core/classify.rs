use crate::config::Config;
use crate::core::coerce::{Classification, StructuredExtractor};
use crate::core::schema::lookup_str;
use crate::core::transcript::snippet;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::future::Future;

pub const MAX_ATTEMPTS: usize = 3;

const INSTRUCTION: &str = "You are a text to JSON output system, Here is a transcript of a video that is likely a food review. first output a true or false for if it is a food review based on the transcript, whats one word that would sum up the reviewers thoughts of the food, try to use their words? and output their given score for this review OUTPUT IN JSON ONLY DO NOT MAKE ANY COMMENTS DO NOT RETURN ANY OTHER TEXT!! YOU MUST RETURN json that can be parsed by a strict JSON parser eg. {'review': true, 'word': '', 'score': 10} here is the transcript: ";

pub fn build_prompt(transcript: &str) -> String {
    format!("{INSTRUCTION}```{transcript}```")
}

/// A text-completion endpoint: one prompt in, the reply text out.
pub trait LlmBackend {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    json_mode: bool,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.llm_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.model.clone(),
            json_mode: config.json_mode,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "repetition_penalty": 1.1,
            "temperature": 0.7,
            "top_p": 0.9,
            "top_k": 40,
            "max_tokens": 1024,
            "stream": false
        });
        if self.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

impl LlmBackend for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        // Read as text first so an error body is not lost to a JSON failure.
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                service: "chat completion",
                status: status.as_u16(),
                body: extract_error_message(status, &text),
            });
        }

        let payload: Value = serde_json::from_str(&text)?;
        Ok(lookup_str(&payload, &["choices", "0", "message", "content"])?.to_string())
    }
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    let body = snippet(body_text);
    if body.is_empty() {
        status.canonical_reason().unwrap_or("no body").to_string()
    } else {
        body
    }
}

/// Asks the model to classify a transcript, regenerating until the reply
/// coerces or the attempts run out.
pub struct ReviewClassifier<B, E> {
    backend: B,
    extractor: E,
    attempts: usize,
}

impl<B: LlmBackend, E: StructuredExtractor> ReviewClassifier<B, E> {
    pub fn new(backend: B, extractor: E) -> Self {
        Self {
            backend,
            extractor,
            attempts: MAX_ATTEMPTS,
        }
    }

    /// `Ok(None)` means no usable classification after every attempt.
    /// Transport failures are not retried and propagate.
    pub async fn classify(&self, transcript: &str) -> Result<Option<Classification>> {
        let prompt = build_prompt(transcript);

        for attempt in 1..=self.attempts {
            let reply = self.backend.complete(&prompt).await?;
            println!("AI Response: {}", reply.trim());

            match self.extractor.extract(&reply) {
                Some(classification) => return Ok(Some(classification)),
                None => {
                    println!("Attempt {attempt}: failed to parse AI response");
                    tracing::warn!(attempt, reply_len = reply.len(), "unusable classification reply");
                }
            }
        }

        Ok(None)
    }
}
