use serde::{Deserialize, Serialize};

/// One outline record: a chapter title and the page where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterIndexEntry {
    pub title: String,
    pub start_page: i64,
    /// Declared by the outline stage; may be stale.
    #[serde(default)]
    pub end_page: i64,
}

impl ChapterIndexEntry {
    pub fn new(title: impl Into<String>, start_page: i64, end_page: i64) -> Self {
        Self {
            title: title.into(),
            start_page,
            end_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    pub page_number: i64,
    pub lines: Vec<String>,
}

impl DocumentPage {
    pub fn new<I, S>(page_number: i64, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page_number,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Inclusive page range. Not guaranteed to be ordered when the outline is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterBoundary {
    pub start_page: i64,
    pub end_page: i64,
}

impl ChapterBoundary {
    pub fn is_inverted(&self) -> bool {
        self.start_page > self.end_page
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdivisionPlan {
    pub target_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubchapterDraft {
    pub title: String,
    /// Whatever the model echoed back. Informational only.
    pub text: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResult {
    pub title: String,
    pub full_text: String,
    pub token_count: usize,
    pub processing_time_seconds: u64,
    pub start_page: i64,
    pub end_page: i64,
    pub subchapters: Vec<SubchapterDraft>,
}

/// What the model declared, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChapter {
    pub title: String,
    pub declared_count: u32,
    pub subchapters: Vec<SubchapterDraft>,
}

// Wire schema of the model's answer. Keys are fixed by the prompt.

#[derive(Debug, Deserialize)]
pub struct AiChapter {
    pub titulo: String,
    #[serde(rename = "Total_Subcapitulos")]
    pub total_subcapitulos: u32,
    pub subtemas: Vec<AiSubtopic>,
}

#[derive(Debug, Deserialize)]
pub struct AiSubtopic {
    pub title: String,
    pub texto: String,
    pub descripcion: String,
}

impl From<AiChapter> for ParsedChapter {
    fn from(chapter: AiChapter) -> Self {
        ParsedChapter {
            title: chapter.titulo,
            declared_count: chapter.total_subcapitulos,
            subchapters: chapter
                .subtemas
                .into_iter()
                .map(|s| SubchapterDraft {
                    title: s.title,
                    text: s.texto,
                    description: s.descripcion,
                })
                .collect(),
        }
    }
}

// HTTP bodies.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdivideRequest {
    #[serde(default)]
    pub pages: Vec<DocumentPage>,
    #[serde(default)]
    pub chapters: Vec<ChapterIndexEntry>,
    #[serde(default)]
    pub chapter_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SubdivideResponse {
    pub results: Vec<ChapterOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChapterOutcome {
    Ok {
        title: String,
        result: ChapterResult,
    },
    Error {
        title: String,
        error: ErrorBody,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: crate::services::chapterizer::ChapterErrorKind,
    pub message: String,
}
