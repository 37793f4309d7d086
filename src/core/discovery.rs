use crate::core::schema::{dotted, lookup_array};
use crate::core::transcript::snippet;
use crate::error::{Error, Result};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;

const STATE_SCRIPT_ID: &str = "__FRONTITY_CONNECT_STATE__";

pub fn embed_url(handle: &str) -> String {
    format!("https://www.tiktok.com/embed/@{handle}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    /// Everything currently listed on the feed, in feed order.
    pub listed: Vec<String>,
    /// `listed` minus the processed ledger, still in feed order.
    pub pending: Vec<String>,
}

pub struct DiscoveryService {
    client: Client,
    handle: String,
    script: StateScript,
}

impl DiscoveryService {
    pub fn new(handle: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            handle: handle.to_string(),
            script: StateScript::new()?,
        })
    }

    /// Fetches the embed page once. No retry: a page without the state block
    /// means the page layout changed, not that the request was unlucky.
    pub async fn fetch_listed(&self) -> Result<Vec<String>> {
        let url = embed_url(&self.handle);
        tracing::debug!("fetching embed page {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("could not fetch {url}: {e}")))?;
        let status = response.status();
        let html = response.text().await?;
        if !status.is_success() {
            return Err(Error::retrieval(format!(
                "{url} answered HTTP {}: {}",
                status.as_u16(),
                snippet(&html)
            )));
        }

        let state = extract_state_blob(&self.script, &html)?;
        extract_video_ids(&state, &self.handle)
    }

    pub async fn discover(&self, processed: &[String]) -> Result<Discovery> {
        let listed = self.fetch_listed().await?;
        let pending = pending_ids(&listed, processed);
        Ok(Discovery { listed, pending })
    }
}

/// Locates the `<script id="__FRONTITY_CONNECT_STATE__" type="application/json">`
/// element. Attributes may come in any order, quoted or not.
pub struct StateScript {
    block: Regex,
    id_attr: Regex,
    json_type: Regex,
}

impl StateScript {
    pub fn new() -> Result<Self> {
        Ok(Self {
            block: Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>")?,
            id_attr: Regex::new(&format!(
                r#"(?i)\bid\s*=\s*["']?{}(?:["'\s/]|$)"#,
                regex::escape(STATE_SCRIPT_ID)
            ))?,
            json_type: Regex::new(r#"(?i)\btype\s*=\s*["']?application/json(?:["'\s/]|$)"#)?,
        })
    }

    pub fn find<'a>(&self, html: &'a str) -> Option<&'a str> {
        self.block
            .captures_iter(html)
            .find(|caps| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                self.id_attr.is_match(attrs) && self.json_type.is_match(attrs)
            })
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().trim())
    }
}

/// Pulls the hydration JSON out of the page's state `<script>` element.
pub fn extract_state_blob(script: &StateScript, html: &str) -> Result<Value> {
    let body = script
        .find(html)
        .ok_or_else(|| Error::retrieval(format!("{STATE_SCRIPT_ID} script block not found")))?;

    serde_json::from_str(body)
        .map_err(|e| Error::retrieval(format!("{STATE_SCRIPT_ID} block is not JSON: {e}")))
}

/// Reads `source.data["/embed/@{handle}"].videoList[*].id`. Numeric ids are
/// accepted and kept as their decimal text.
pub fn extract_video_ids(state: &Value, handle: &str) -> Result<Vec<String>> {
    let feed_key = format!("/embed/@{handle}");
    let path = ["source", "data", feed_key.as_str(), "videoList"];
    let videos = lookup_array(state, &path)?;

    videos
        .iter()
        .enumerate()
        .map(|(i, video)| match video.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(Error::schema(format!("{}.{i}.id", dotted(&path)))),
        })
        .collect()
}

/// Feed order is preserved; membership in `processed` is all that matters.
pub fn pending_ids(listed: &[String], processed: &[String]) -> Vec<String> {
    let seen: HashSet<&str> = processed.iter().map(String::as_str).collect();
    listed
        .iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn page(blob: &str) -> String {
        format!(
            r#"<html><head><script src="x.js"></script></head><body>
<script id="{STATE_SCRIPT_ID}" type="application/json">{blob}</script>
</body></html>"#
        )
    }

    #[test]
    fn subtracts_processed_preserving_feed_order() {
        let pending = pending_ids(&ids(&["a", "b", "c"]), &ids(&["a"]));
        assert_eq!(pending, ids(&["b", "c"]));
    }

    #[test]
    fn duplicate_ledger_entries_do_not_matter() {
        let pending = pending_ids(&ids(&["c", "a", "b"]), &ids(&["b", "b", "x"]));
        assert_eq!(pending, ids(&["c", "a"]));
    }

    #[test]
    fn extracts_ids_from_embed_page() {
        let blob = json!({
            "source": {"data": {"/embed/@chef": {"videoList": [
                {"id": "7001", "desc": "x"},
                {"id": 7002u64}
            ]}}}
        });
        let re = StateScript::new().unwrap();
        let state = extract_state_blob(&re, &page(&blob.to_string())).unwrap();
        assert_eq!(extract_video_ids(&state, "chef").unwrap(), ids(&["7001", "7002"]));
    }

    #[test]
    fn missing_script_block_is_a_retrieval_error() {
        let re = StateScript::new().unwrap();
        let err = extract_state_blob(&re, "<html><script>var a = 1;</script></html>").unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }

    #[test]
    fn wrong_handle_is_a_schema_mismatch() {
        let state = json!({"source": {"data": {"/embed/@other": {"videoList": []}}}});
        let err = extract_video_ids(&state, "chef").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { ref path } if path == "source.data./embed/@chef"));
    }

    #[test]
    fn entry_without_id_names_its_index() {
        let state = json!({"source": {"data": {"/embed/@chef": {"videoList": [{"id": "1"}, {}]}}}});
        let err = extract_video_ids(&state, "chef").unwrap_err();
        assert!(
            matches!(err, Error::SchemaMismatch { ref path } if path == "source.data./embed/@chef.videoList.1.id")
        );
    }

    #[test]
    fn script_attributes_in_any_order_and_unquoted() {
        let re = StateScript::new().unwrap();
        let html = format!(r#"<script type=application/json id={STATE_SCRIPT_ID}>{{"a": 1}}</script>"#);
        assert_eq!(re.find(&html), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn state_script_needs_json_type() {
        let re = StateScript::new().unwrap();
        let html = format!(
            r#"<script id="{STATE_SCRIPT_ID}">window.x = 1;</script>
<script id="{STATE_SCRIPT_ID}" type="application/json">{{"b": 2}}</script>"#
        );
        assert_eq!(re.find(&html), Some(r#"{"b": 2}"#));

        let html = format!(r#"<script id="{STATE_SCRIPT_ID}" type="text/javascript">{{}}</script>"#);
        assert!(re.find(&html).is_none());
    }

    #[test]
    fn similar_id_does_not_match() {
        let re = StateScript::new().unwrap();
        let html = format!(r#"<script id="{STATE_SCRIPT_ID}_OLD" type="application/json">{{}}</script>"#);
        assert!(re.find(&html).is_none());
    }
}
