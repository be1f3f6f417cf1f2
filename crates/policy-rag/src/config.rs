//! Configuration for the policy RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "POLICY_RAG_CONFIG";

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Backend provider (ollama or openai)
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// Language model / embedding service configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Persisted index configuration
    pub index: IndexConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Source disclosure configuration
    pub grounding: GroundingConfig,
    /// Conversation configuration
    pub chat: ChatConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, the `POLICY_RAG_CONFIG` variable, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) if !p.is_empty() => Self::from_file(p)?,
                _ => Self::default(),
            },
        };

        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var(OPENAI_API_KEY_ENV)
                .ok()
                .filter(|k| !k.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("top_k must be greater than zero".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than zero".to_string()));
        }
        if self.llm.embed_batch_size == 0 {
            return Err(Error::Config("embed_batch_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server for both embeddings and completions
    #[default]
    Ollama,
    /// OpenAI API (requires an API key)
    OpenAi,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Drop sessions idle for this many seconds (0 keeps them until deleted)
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            session_idle_secs: 3600,
        }
    }
}

/// Language model and embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// OpenAI API base URL
    pub openai_base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds, applied to every service call
    pub timeout_secs: u64,
    /// Number of automatic retries for failed requests
    pub max_retries: u32,
    /// Most texts sent in one embeddings request
    pub embed_batch_size: usize,
    /// API key (OpenAI backend)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            max_retries: 0,
            embed_batch_size: 256,
            api_key: None,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (768 for nomic-embed-text, 1536 for text-embedding-3-small)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Persisted index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the persisted index
    pub directory: PathBuf,
    /// Directory of policy documents; the demo corpus is used when unset
    pub documents_dir: Option<PathBuf>,
    /// Rebuild when the persisted index was built from a different corpus
    pub verify_fingerprint: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let directory = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("policy-rag")
            .join("index");

        Self {
            directory,
            documents_dir: None,
            verify_fingerprint: false,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Source disclosure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Candidate phrases must be longer than this many characters
    pub min_phrase_len: usize,
    /// Matching phrases needed before sources are disclosed
    pub min_overlap: usize,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            min_phrase_len: 10,
            min_overlap: 1,
        }
    }
}

/// What to do when retrieval returns no chunks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyContextPolicy {
    /// Skip the model call and answer with `fallback_answer`
    #[default]
    Fallback,
    /// Call the model with an empty context
    CallModel,
}

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Most recent turns embedded into prompts
    pub max_history_turns: usize,
    /// Rewrite follow-up questions into standalone questions before retrieval
    pub condense_question: bool,
    /// Behaviour when nothing was retrieved
    pub empty_context_policy: EmptyContextPolicy,
    /// Answer given under the fallback policy
    pub fallback_answer: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
            condense_question: true,
            empty_context_policy: EmptyContextPolicy::Fallback,
            fallback_answer:
                "I couldn't find information about that in the policy documents.".to_string(),
        }
    }
}
