#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use subchapterizer::{ChapterIndexEntry, ChatCompleter, DocumentPage, LlmError};

/// Replays queued answers in order and records every prompt it receives.
pub struct ScriptedCompleter {
    answers: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompleter {
    pub fn new(answers: Vec<Result<String, LlmError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(answer: &str) -> Self {
        Self::new((0..16).map(|_| Ok(answer.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatCompleter for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }
}

/// Answers by inspecting the prompt.
pub struct FnCompleter<F>(pub F);

#[async_trait::async_trait]
impl<F> ChatCompleter for FnCompleter<F>
where
    F: Fn(&str) -> Result<String, LlmError> + Send + Sync,
{
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (self.0)(prompt)
    }
}

pub struct SlowCompleter {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ChatCompleter for SlowCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(chapter_json("late", &["a"]))
    }
}

pub struct PanickingCompleter;

#[async_trait::async_trait]
impl ChatCompleter for PanickingCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        panic!("backend exploded");
    }
}

pub fn chapter_json(title: &str, subtitles: &[&str]) -> String {
    let subtemas: Vec<serde_json::Value> = subtitles
        .iter()
        .map(|s| {
            serde_json::json!({
                "title": s,
                "texto": format!("model copy of {}", s),
                "descripcion": format!("about {}", s),
            })
        })
        .collect();
    serde_json::json!({
        "capitulo": {
            "titulo": title,
            "Total_Subcapitulos": subtitles.len(),
            "subtemas": subtemas,
        }
    })
    .to_string()
}

pub fn sample_pages() -> Vec<DocumentPage> {
    vec![
        DocumentPage::new(1, ["Intro"]),
        DocumentPage::new(2, ["CAP I: Historia", "t1", "t2"]),
        DocumentPage::new(3, ["CAP II: Geografia", "t3"]),
    ]
}

pub fn sample_outline() -> Vec<ChapterIndexEntry> {
    vec![
        ChapterIndexEntry::new("CAP I: Historia", 2, 2),
        ChapterIndexEntry::new("CAP II: Geografia", 3, 3),
    ]
}
