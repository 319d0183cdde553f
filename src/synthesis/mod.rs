//! Response synthesis ("generate")
//!
//! Projects evidence into answer candidates and, when a summarizer is
//! configured, asks it for a short freshness-aware summary.

use crate::models::{Answer, AnswerCandidate, ConfidenceVerdict, EvidenceItem, EvidenceSet, Query};
use crate::Result;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_SOURCE: &str = "catalog";
pub const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(20);

/// Text-generation collaborator
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

pub struct ResponseSynthesizer {
    summarizer: Option<Arc<dyn Summarizer>>,
    summary_timeout: Duration,
}

impl ResponseSynthesizer {
    pub fn new(summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self {
            summarizer,
            summary_timeout: DEFAULT_SUMMARY_TIMEOUT,
        }
    }

    pub fn with_summary_timeout(mut self, summary_timeout: Duration) -> Self {
        self.summary_timeout = summary_timeout;
        self
    }

    pub async fn synthesize(
        &self,
        query: &Query,
        evidence: &EvidenceSet,
        verdict: &ConfidenceVerdict,
    ) -> Answer {
        let candidates: Vec<AnswerCandidate> = evidence.iter().filter_map(candidate_from).collect();
        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let summary = match (&self.summarizer, candidates.is_empty()) {
            (Some(summarizer), false) => {
                let prompt = build_summary_prompt(&query.text, &candidates);
                self.request_summary(summarizer.as_ref(), &prompt).await
            }
            _ => None,
        };

        info!(
            candidates = candidates.len(),
            confidence = verdict.score,
            has_summary = summary.is_some(),
            "Answer generated"
        );

        Answer {
            query: query.text.clone(),
            candidates,
            generated_at,
            confidence: verdict.score,
            summary,
        }
    }

    async fn request_summary(&self, summarizer: &dyn Summarizer, prompt: &str) -> Option<String> {
        match tokio::time::timeout(self.summary_timeout, summarizer.summarize(prompt)).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(error = %e, "Summary generation failed");
                None
            }
            Err(_) => {
                warn!("Summary generation timed out");
                None
            }
        }
    }
}

/// Map one evidence item to a candidate; empty payloads produce none.
pub fn candidate_from(item: &EvidenceItem) -> Option<AnswerCandidate> {
    let p = &item.payload;
    if p.is_empty() {
        return None;
    }

    Some(AnswerCandidate {
        name: p.get("name").and_then(as_text),
        price: p.get("price").and_then(as_number),
        data_per_day: p.get("data_per_day").and_then(as_text),
        validity_days: p.get("validity_days").and_then(as_whole_number),
        source: p
            .get("source")
            .and_then(as_text)
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        last_updated: p.get("last_updated").and_then(as_text),
    })
}

pub fn build_summary_prompt(query: &str, candidates: &[AnswerCandidate]) -> String {
    let mut prompt = format!("User query: {}\n\nAvailable plans:\n", query);

    for c in candidates {
        prompt.push_str(&format!(
            "- {} | {} | ₹{} | {} days | updated {}\n",
            c.name.as_deref().unwrap_or("unknown"),
            c.data_per_day.as_deref().unwrap_or("n/a"),
            c.price.map(format_price).unwrap_or_else(|| "n/a".into()),
            c.validity_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "n/a".into()),
            c.last_updated.as_deref().unwrap_or("unknown"),
        ));
    }

    prompt.push_str(
        "\nProvide a concise summary highlighting new or recent plans and any notes about freshness.",
    );
    prompt
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        format!("{:.2}", price)
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestrationError;
    use crate::normalizer::absorb;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recording {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Summarizer for Recording {
        async fn summarize(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Ultra 3GB/day is the newest plan.".to_string())
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Summarizer for Failing {
        async fn summarize(&self, _prompt: &str) -> Result<String> {
            Err(OrchestrationError::LlmError("quota exceeded".to_string()))
        }
    }

    struct Hanging;

    #[async_trait::async_trait]
    impl Summarizer for Hanging {
        async fn summarize(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    fn verdict() -> ConfidenceVerdict {
        ConfidenceVerdict {
            score: 0.9,
            accepted: true,
        }
    }

    fn sample_evidence() -> EvidenceSet {
        let mut set = EvidenceSet::new();
        absorb(
            &mut set,
            vec![
                json!({"id": "kb-1", "score": 0.8, "payload": {
                    "name": "Super 2GB/day", "price": 199, "data_per_day": "2GB",
                    "validity_days": 28, "last_updated": "2025-08-12T10:00:00Z", "source": "kb"
                }}),
                json!({"id": "kb-2", "score": 0.1, "payload": {}}),
                json!({"name": "Ultra 3GB/day", "price": "299.5", "data_per_day": "3GB",
                       "validity_days": 30.0, "last_updated": "2025-08-13T09:00:00Z"}),
            ],
        );
        set
    }

    #[tokio::test]
    async fn test_empty_payloads_are_filtered() {
        let synthesizer = ResponseSynthesizer::new(None);
        let query = Query::new("2GB plans", "Maharashtra");

        let answer = synthesizer.synthesize(&query, &sample_evidence(), &verdict()).await;

        assert_eq!(answer.candidates.len(), 2);
        assert_eq!(answer.query, "2GB plans");
        assert_eq!(answer.confidence, 0.9);
        assert!(answer.summary.is_none());
        assert!(answer.generated_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_candidate_fields_and_source_default() {
        let synthesizer = ResponseSynthesizer::new(None);
        let answer = synthesizer
            .synthesize(&Query::new("q", "r"), &sample_evidence(), &verdict())
            .await;

        let kb = &answer.candidates[0];
        assert_eq!(kb.name.as_deref(), Some("Super 2GB/day"));
        assert_eq!(kb.price, Some(199.0));
        assert_eq!(kb.validity_days, Some(28));
        assert_eq!(kb.source, "kb");

        let catalog = &answer.candidates[1];
        assert_eq!(catalog.price, Some(299.5));
        assert_eq!(catalog.validity_days, Some(30));
        assert_eq!(catalog.source, "catalog");
    }

    #[tokio::test]
    async fn test_summary_prompt_lists_every_candidate() {
        let recording = Arc::new(Recording {
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = ResponseSynthesizer::new(Some(recording.clone() as Arc<dyn Summarizer>));

        let answer = synthesizer
            .synthesize(&Query::new("2GB plans", "r"), &sample_evidence(), &verdict())
            .await;

        assert_eq!(answer.summary.as_deref(), Some("Ultra 3GB/day is the newest plan."));

        let prompts = recording.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("User query: 2GB plans"));
        assert!(prompts[0].contains("- Super 2GB/day | 2GB | ₹199 | 28 days | updated 2025-08-12T10:00:00Z"));
        assert!(prompts[0].contains("- Ultra 3GB/day | 3GB | ₹299.50 | 30 days"));
        assert!(prompts[0].contains("notes about freshness"));
    }

    #[tokio::test]
    async fn test_summary_failure_is_not_fatal() {
        let synthesizer = ResponseSynthesizer::new(Some(Arc::new(Failing) as Arc<dyn Summarizer>));
        let answer = synthesizer
            .synthesize(&Query::new("q", "r"), &sample_evidence(), &verdict())
            .await;

        assert!(answer.summary.is_none());
        assert_eq!(answer.candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_summary_timeout_is_not_fatal() {
        let synthesizer = ResponseSynthesizer::new(Some(Arc::new(Hanging) as Arc<dyn Summarizer>))
            .with_summary_timeout(Duration::from_millis(50));
        let answer = synthesizer
            .synthesize(&Query::new("q", "r"), &sample_evidence(), &verdict())
            .await;

        assert!(answer.summary.is_none());
    }

    #[tokio::test]
    async fn test_no_summary_without_candidates() {
        let recording = Arc::new(Recording {
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = ResponseSynthesizer::new(Some(recording.clone() as Arc<dyn Summarizer>));

        let answer = synthesizer
            .synthesize(&Query::new("q", "r"), &EvidenceSet::new(), &verdict())
            .await;

        assert!(answer.candidates.is_empty());
        assert!(answer.summary.is_none());
        assert!(recording.prompts.lock().unwrap().is_empty());
    }
}
