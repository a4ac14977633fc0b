pub mod chapterizer;
pub mod extractor;
pub mod llm;
pub mod matcher;
pub mod planner;
pub mod prompt;
pub mod response;
pub mod tokens;
