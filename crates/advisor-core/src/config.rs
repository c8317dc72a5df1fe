//! Application configuration loaded from environment variables

use std::env;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings for the Advisor pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Logical name of the vector collection
    pub collection_name: String,
    /// Path of the JSON-backed history ledger
    pub history_path: String,
    /// Chunk size in tokens
    pub chunk_size: usize,
    /// Chunk overlap in tokens
    pub chunk_overlap: usize,
    /// Similarity cutoff applied before truncation
    pub similarity_cutoff: f32,
    /// Expected embedding dimension, validated against the model on startup
    pub embed_dim: usize,

    pub embedding_api_key: String,
    pub embedding_base_url: String,
    pub embedding_model: String,

    pub anthropic_api_key: String,
    pub anthropic_model: String,
}

impl Settings {
    /// Create settings from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let embedding_api_key = env::var("EMBEDDING_API_KEY")
            .or_else(|_| env::var("VOYAGE_API_KEY"))
            .map_err(|_| {
                Error::Configuration(
                    "EMBEDDING_API_KEY or VOYAGE_API_KEY environment variable not found"
                        .to_string(),
                )
            })?;

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            Error::Configuration("ANTHROPIC_API_KEY environment variable not found".to_string())
        })?;

        Ok(Self {
            collection_name: env::var("COLLECTION_NAME")
                .unwrap_or_else(|_| "advisor_docs".to_string()),
            history_path: env::var("HISTORY_PATH")
                .unwrap_or_else(|_| "query_history.json".to_string()),
            chunk_size: parse_var("CHUNK_SIZE", 256)?,
            chunk_overlap: parse_var("CHUNK_OVERLAP", 20)?,
            similarity_cutoff: parse_var("SIMILARITY_CUTOFF", 0.6)?,
            embed_dim: parse_var("EMBED_DIM", 1024)?,
            embedding_api_key,
            embedding_base_url: env::var("EMBEDDING_BASE_URL")
                .unwrap_or_else(|_| "https://api.voyageai.com/v1".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "voyage-3.5".to_string()),
            anthropic_api_key,
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-0".to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Configuration(format!("could not parse {}='{}'", name, raw))),
        Err(_) => Ok(default),
    }
}
