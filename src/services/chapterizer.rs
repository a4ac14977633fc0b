use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::models::{ChapterIndexEntry, ChapterResult, DocumentPage, ParsedChapter};
use crate::services::extractor::{
    last_page_number, page_scoped_text, resolve_range, title_scoped_text,
};
use crate::services::llm::{ChatCompleter, LlmError};
use crate::services::planner::Planner;
use crate::services::prompt::build_prompt;
use crate::services::response::{ParseError, parse_response};
use crate::services::tokens::TokenCounter;
use crate::utils::text::preview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPass {
    PageScoped,
    TitleScoped,
}

#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no content found for chapter {title:?} ({pass:?})")]
    ContentNotFound { title: String, pass: ExtractionPass },
    #[error("malformed AI response: {0}")]
    MalformedResponse(#[from] ParseError),
    #[error("AI completion failed after {attempts} attempt(s): {source}")]
    Collaborator {
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterErrorKind {
    InvalidInput,
    ContentNotFound,
    MalformedAiResponse,
    CollaboratorFailure,
}

impl ChapterError {
    pub fn kind(&self) -> ChapterErrorKind {
        match self {
            ChapterError::InvalidInput(_) => ChapterErrorKind::InvalidInput,
            ChapterError::ContentNotFound { .. } => ChapterErrorKind::ContentNotFound,
            ChapterError::MalformedResponse(_) => ChapterErrorKind::MalformedAiResponse,
            ChapterError::Collaborator { .. } => ChapterErrorKind::CollaboratorFailure,
        }
    }

    /// Whether a caller may resubmit the same chapter unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChapterError::Collaborator { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

/// Exponential backoff for transient completion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, doubling from `initial_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

/// Splits one chapter at a time into AI-drafted subchapters.
///
/// Holds only its collaborators and immutable tuning, so a single instance
/// can serve any number of concurrent chapters.
pub struct ChapterSubdivider<C, T> {
    completer: C,
    tokenizer: T,
    planner: Planner,
    retry: RetryPolicy,
    request_timeout: Option<Duration>,
}

impl<C, T> ChapterSubdivider<C, T>
where
    C: ChatCompleter,
    T: TokenCounter,
{
    pub fn new(completer: C, tokenizer: T) -> Self {
        Self {
            completer,
            tokenizer,
            planner: Planner::default(),
            retry: RetryPolicy::default(),
            request_timeout: None,
        }
    }

    pub fn with_planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Processes `current`, bounded by `next` when there is one.
    pub async fn subdivide(
        &self,
        pages: &[DocumentPage],
        current: Option<&ChapterIndexEntry>,
        next: Option<&ChapterIndexEntry>,
    ) -> Result<ChapterResult, ChapterError> {
        let Some(current) = current else {
            return Err(ChapterError::InvalidInput("no chapter given".to_string()));
        };
        if pages.is_empty() {
            return Err(ChapterError::InvalidInput("document has no pages".to_string()));
        }

        let span = tracing::info_span!(
            "chapter",
            title = %current.title,
            start_page = current.start_page,
        );
        self.run(pages, current, next).instrument(span).await
    }

    /// Processes the outline entry at `index`, using the following entry as its bound.
    pub async fn subdivide_at(
        &self,
        pages: &[DocumentPage],
        outline: &[ChapterIndexEntry],
        index: usize,
    ) -> Result<ChapterResult, ChapterError> {
        if index >= outline.len() {
            return Err(ChapterError::InvalidInput(format!(
                "chapter index {} out of range for an outline of {} entries",
                index,
                outline.len()
            )));
        }
        self.subdivide(pages, outline.get(index), outline.get(index + 1))
            .await
    }

    /// Processes every outline entry with at most `concurrency` chapters in
    /// flight. Results come back in outline order.
    pub async fn subdivide_all(
        &self,
        pages: &[DocumentPage],
        outline: &[ChapterIndexEntry],
        concurrency: usize,
    ) -> Vec<Result<ChapterResult, ChapterError>> {
        stream::iter(0..outline.len())
            .map(|index| self.subdivide_at(pages, outline, index))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn run(
        &self,
        pages: &[DocumentPage],
        current: &ChapterIndexEntry,
        next: Option<&ChapterIndexEntry>,
    ) -> Result<ChapterResult, ChapterError> {
        let last_page = last_page_number(pages).unwrap_or(current.start_page);
        let range = resolve_range(current, next, last_page);
        if range.is_inverted() {
            tracing::warn!(
                start_page = range.start_page,
                end_page = range.end_page,
                "Outline yields an inverted page range"
            );
        }

        let page_text = page_scoped_text(pages, range);
        if page_text.trim().is_empty() {
            return Err(ChapterError::ContentNotFound {
                title: current.title.clone(),
                pass: ExtractionPass::PageScoped,
            });
        }

        let page_tokens = self.tokenizer.count_tokens(&page_text);
        let plan = self.planner.plan(page_tokens);
        tracing::debug!(
            page_tokens,
            target_count = plan.target_count,
            "Planned subdivision"
        );

        let full_text = title_scoped_text(pages, &current.title, next.map(|n| n.title.as_str()));
        if full_text.is_empty() {
            return Err(ChapterError::ContentNotFound {
                title: current.title.clone(),
                pass: ExtractionPass::TitleScoped,
            });
        }

        // The model only ever sees the page-bounded text.
        let prompt = build_prompt(&page_text, &current.title, plan.target_count);
        tracing::debug!(prompt_chars = prompt.len(), "Prompt built");

        let started = Instant::now();
        let raw = self.complete_with_retry(&prompt).await?;
        let elapsed = started.elapsed();

        let parsed = parse_response(&raw).map_err(|e| {
            tracing::warn!(error = %e, response = %preview(&raw), "Rejected AI response");
            ChapterError::from(e)
        })?;
        check_declared_count(&parsed, plan.target_count);

        let token_count = self.tokenizer.count_tokens(&full_text);
        let end_page = match next {
            Some(next) => next.start_page - 1,
            None => current.end_page,
        };

        tracing::info!(
            subchapters = parsed.subchapters.len(),
            token_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Chapter subdivided"
        );

        Ok(ChapterResult {
            title: parsed.title,
            full_text,
            token_count,
            processing_time_seconds: (elapsed.as_millis() as f64 / 1000.0).round() as u64,
            start_page: current.start_page,
            end_page,
            subchapters: parsed.subchapters,
        })
    }

    async fn complete_with_retry(&self, prompt: &str) -> Result<String, ChapterError> {
        let mut attempt = 1;
        loop {
            match self.complete_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ChapterError::Collaborator {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, LlmError> {
        let call = AssertUnwindSafe(self.completer.complete(prompt)).catch_unwind();
        let outcome = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(LlmError::Timeout),
            },
            None => call.await,
        };
        outcome.unwrap_or_else(|_| Err(LlmError::Panicked))
    }
}

fn check_declared_count(parsed: &ParsedChapter, target_count: usize) {
    let delivered = parsed.subchapters.len();
    if delivered == 0 {
        tracing::warn!("AI response contains no subchapters");
    }
    if parsed.declared_count as usize != delivered || delivered != target_count {
        tracing::warn!(
            declared = parsed.declared_count,
            delivered,
            target_count,
            "Subchapter count differs from the plan"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(500));
        assert_eq!(policy.backoff(60), Duration::from_millis(500));
    }

    #[test]
    fn error_kinds_and_retryability() {
        let transient = ChapterError::Collaborator {
            attempts: 3,
            source: LlmError::RateLimited,
        };
        assert_eq!(transient.kind(), ChapterErrorKind::CollaboratorFailure);
        assert!(transient.is_retryable());

        let malformed = ChapterError::from(ParseError::MissingChapter);
        assert_eq!(malformed.kind(), ChapterErrorKind::MalformedAiResponse);
        assert!(!malformed.is_retryable());

        let missing = ChapterError::ContentNotFound {
            title: "A".into(),
            pass: ExtractionPass::TitleScoped,
        };
        assert_eq!(missing.kind(), ChapterErrorKind::ContentNotFound);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ChapterErrorKind::MalformedAiResponse).unwrap();
        assert_eq!(json, "\"malformed_ai_response\"");
    }
}
