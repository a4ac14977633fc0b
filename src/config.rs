use anyhow::{Context, Result, bail};
use std::str::FromStr;
use std::time::Duration;

use crate::services::planner::{DEFAULT_MAX_PARTS, DEFAULT_MIN_PARTS, DEFAULT_UNIT_TOKENS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    OpenAi,
    /// OpenAI-compatible body, keyed with an `api-key` header.
    AzureOpenAi,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "lmstudio" => Ok(LlmProvider::OpenAi),
            "azure" => Ok(LlmProvider::AzureOpenAi),
            other => bail!("unknown LLM provider: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct ProcessingSettings {
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub concurrency: usize,
    pub unit_tokens: usize,
    pub min_parts: usize,
    pub max_parts: usize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub llm: LlmSettings,
    pub processing: ProcessingSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key/value source. Unset keys take defaults,
    /// unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = LlmSettings {
            provider: parse_or(&get, "LLM_PROVIDER", LlmProvider::Ollama)?,
            api_url: get("LLM_API_URL")
                .unwrap_or_else(|| "http://localhost:11434/api/generate".to_string()),
            api_key: get("LLM_API_KEY"),
            model: get("LLM_MODEL").unwrap_or_else(|| "llama2".to_string()),
            temperature: parse_or(&get, "LLM_TEMPERATURE", 0.1)?,
        };

        let processing = ProcessingSettings {
            request_timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", 300)?),
            max_attempts: parse_or(&get, "LLM_MAX_ATTEMPTS", 3)?,
            concurrency: parse_or(&get, "CHAPTER_CONCURRENCY", 4)?,
            unit_tokens: parse_or(&get, "SUBCHAPTER_UNIT_TOKENS", DEFAULT_UNIT_TOKENS)?,
            min_parts: DEFAULT_MIN_PARTS,
            max_parts: parse_or(&get, "SUBCHAPTER_MAX", DEFAULT_MAX_PARTS)?,
        };

        if processing.concurrency == 0 {
            bail!("CHAPTER_CONCURRENCY must be at least 1");
        }
        if processing.max_attempts == 0 {
            bail!("LLM_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Settings {
            server_addr: get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            llm,
            processing,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
