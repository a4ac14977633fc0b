//! Chapter segmentation and AI-assisted subdivision.
//!
//! Given a document as numbered pages of text lines and an outline of chapter
//! titles with start pages, locates each chapter's text, decides how finely to
//! split it, asks a language model for subchapters and assembles a result whose
//! text always comes from the document rather than the model.

pub mod config;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

pub use models::{ChapterIndexEntry, ChapterResult, DocumentPage, SubchapterDraft};
pub use services::chapterizer::{ChapterError, ChapterErrorKind, ChapterSubdivider, RetryPolicy};
pub use services::llm::{ChatCompleter, LLMClient, LlmError};
pub use services::tokens::{ApproxTokenCounter, TiktokenCounter, TokenCounter};
