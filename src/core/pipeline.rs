use crate::core::classify::{LlmBackend, ReviewClassifier};
use crate::core::coerce::StructuredExtractor;
use crate::core::ledger::LedgerStore;
use crate::core::review::{ReviewRecord, assemble_review};
use crate::core::transcript::{TranscriptSource, canonical_video_url};
use crate::error::Result;
use std::collections::HashSet;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunOutcome {
    pub new_reviews: Vec<ReviewRecord>,
    pub processed_ids: Vec<String>,
    /// Videos marked processed without a usable classification.
    pub unusable: usize,
}

/// Outcome for a single video; the id is always recorded.
struct VideoOutcome {
    review: Option<ReviewRecord>,
    classified: bool,
}

pub struct Pipeline<'a, T, B, E> {
    handle: String,
    transcripts: T,
    classifier: ReviewClassifier<B, E>,
    ledgers: &'a LedgerStore,
    checkpoint: bool,
}

impl<'a, T, B, E> Pipeline<'a, T, B, E>
where
    T: TranscriptSource,
    B: LlmBackend,
    E: StructuredExtractor,
{
    pub fn new(
        handle: &str,
        transcripts: T,
        classifier: ReviewClassifier<B, E>,
        ledgers: &'a LedgerStore,
    ) -> Self {
        Self {
            handle: handle.to_string(),
            transcripts,
            classifier,
            ledgers,
            checkpoint: false,
        }
    }

    /// Persist each video's outcome as soon as it is known instead of once at the end.
    pub fn with_checkpoint(mut self, checkpoint: bool) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Processes every id in order and persists the outcome. Any transcription
    /// or transport error aborts the run; without checkpointing nothing from
    /// the run is written in that case.
    pub async fn run(&self, video_ids: &[String]) -> Result<RunOutcome> {
        let mut outcome = RunOutcome::default();
        let mut seen = HashSet::new();

        for video_id in video_ids {
            if !seen.insert(video_id.as_str()) {
                tracing::info!("{video_id} given more than once; skipping repeat");
                continue;
            }

            let video = self.process_video(video_id).await?;

            if self.checkpoint {
                self.ledgers
                    .commit(video.review.iter().cloned().collect(), vec![video_id.clone()])
                    .await?;
            }

            if !video.classified {
                outcome.unusable += 1;
            }
            outcome.new_reviews.extend(video.review);
            outcome.processed_ids.push(video_id.clone());
        }

        if !self.checkpoint {
            self.ledgers
                .commit(outcome.new_reviews.clone(), outcome.processed_ids.clone())
                .await?;
        }

        Ok(outcome)
    }

    async fn process_video(&self, video_id: &str) -> Result<VideoOutcome> {
        let video_url = canonical_video_url(&self.handle, video_id);
        println!("Processing video: {video_url}");

        let video = self.transcripts.fetch(video_id, &video_url).await?;
        tracing::debug!(
            "{video_id}: description {} chars, transcript {} chars",
            video.description.len(),
            video.transcript.len()
        );

        let Some(classification) = self.classifier.classify(&video.transcript).await? else {
            println!("Failed to parse AI response after all attempts, marking {video_id} processed without a review.");
            return Ok(VideoOutcome {
                review: None,
                classified: false,
            });
        };

        let review = assemble_review(&classification, &video, &video_url);
        match &review {
            Some(record) => println!(
                "Determined this is a food review video: {} ({})",
                record.word, record.score
            ),
            None => println!("AI determined this is not a food review video."),
        }

        Ok(VideoOutcome {
            review,
            classified: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerPaths;
    use crate::core::coerce::JsonSpanExtractor;
    use crate::core::transcript::VideoTranscript;
    use crate::error::Error;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::Path;

    struct FakeTranscripts;

    impl TranscriptSource for FakeTranscripts {
        async fn fetch(&self, video_id: &str, _video_url: &str) -> Result<VideoTranscript> {
            if video_id == "broken" {
                return Err(Error::schema("data.desc"));
            }
            Ok(VideoTranscript {
                description: format!("video {video_id}"),
                cover: format!("https://cdn/{video_id}.jpg"),
                transcript: format!("transcript-{video_id}"),
            })
        }
    }

    /// Answers by transcript, so each video gets a deterministic reply.
    struct FakeModel {
        replies: HashMap<String, String>,
    }

    impl LlmBackend for FakeModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            let reply = self
                .replies
                .iter()
                .find(|(transcript, _)| prompt.contains(&format!("```{transcript}```")))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| "I am not sure.".to_string());
            Ok(reply)
        }
    }

    fn model(pairs: &[(&str, &str)]) -> FakeModel {
        FakeModel {
            replies: pairs
                .iter()
                .map(|(id, reply)| (format!("transcript-{id}"), reply.to_string()))
                .collect(),
        }
    }

    fn store_in(dir: &Path) -> LedgerStore {
        LedgerStore::new(LedgerPaths {
            processed: dir.join("processed_videos.json"),
            reviews: dir.join("reviews.json"),
        })
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pipeline<'a>(store: &'a LedgerStore, m: FakeModel) -> Pipeline<'a, FakeTranscripts, FakeModel, JsonSpanExtractor> {
        let classifier = ReviewClassifier::new(m, JsonSpanExtractor::new().unwrap());
        Pipeline::new("chef", FakeTranscripts, classifier, store)
    }

    #[tokio::test]
    async fn review_and_non_review_are_both_processed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let m = model(&[
            ("111", r#"{"review": true, "word":"amazing","score":10}"#),
            ("222", r#"{"review": false, "word":"fine","score":5}"#),
        ]);

        let outcome = pipeline(&store, m).run(&ids(&["111", "222"])).await.unwrap();
        assert_eq!(outcome.new_reviews.len(), 1);
        assert_eq!(outcome.unusable, 0);

        let reviews = store.reviews().await;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].video_url, "https://www.tiktok.com/@chef/video/111");
        assert_eq!(reviews[0].word, json!("amazing"));
        assert_eq!(reviews[0].score, json!(10));
        assert_eq!(reviews[0].description, "video 111");
        assert_eq!(store.processed_ids().await, ids(&["111", "222"]));
    }

    #[tokio::test]
    async fn every_input_id_lands_in_the_ledger_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        std::fs::write(tmp.path().join("processed_videos.json"), r#"["old1", "old2"]"#).unwrap();

        let m = model(&[("a", r#"{"review": true, "word":"w","score":1}"#)]);
        let input = ids(&["a", "b", "c"]);
        let outcome = pipeline(&store, m).run(&input).await.unwrap();

        // b and c never coerce and are marked processed anyway
        assert_eq!(outcome.unusable, 2);
        assert_eq!(store.processed_ids().await.len(), 2 + input.len());
    }

    #[tokio::test]
    async fn repeated_ids_are_processed_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let m = model(&[("a", r#"{"review": false}"#)]);

        let outcome = pipeline(&store, m).run(&ids(&["a", "a"])).await.unwrap();
        assert_eq!(outcome.processed_ids, ids(&["a"]));
    }

    #[tokio::test]
    async fn failed_run_writes_nothing_without_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let m = model(&[("a", r#"{"review": true, "word":"w","score":1}"#)]);

        let err = pipeline(&store, m).run(&ids(&["a", "broken"])).await;
        assert!(err.is_err());
        assert!(store.processed_ids().await.is_empty());
        assert!(store.reviews().await.is_empty());
    }

    #[tokio::test]
    async fn checkpoint_keeps_work_done_before_a_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let m = model(&[("a", r#"{"review": true, "word":"w","score":1}"#)]);

        let err = pipeline(&store, m)
            .with_checkpoint(true)
            .run(&ids(&["a", "broken"]))
            .await;
        assert!(err.is_err());
        assert_eq!(store.processed_ids().await, ids(&["a"]));
        assert_eq!(store.reviews().await.len(), 1);
    }
}
