use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use advisor_core::{
    reconcile_schema, ChunkerConfig, Document, EmbeddingProvider, QueryRequest, SchemaAction,
    Settings,
};
use advisor_history::{FileHistoryStore, HistoryService};
use advisor_providers::{AnthropicChat, OpenAiEmbeddings};
use advisor_rag::{InMemoryVectorIndex, IndexingPipeline, QueryEngine};

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "Ask questions over a local document corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a directory of documents and answer one question over them
    Ask {
        /// Directory of .txt/.md documents to index
        #[arg(long)]
        docs: PathBuf,
        /// The question to answer
        query: String,
        /// Number of source documents to return
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// Show recent query history
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show aggregate query statistics
    Stats,
    /// Check reachability of the index and both providers
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let history = Arc::new(HistoryService::new(Arc::new(FileHistoryStore::new(
        &settings.history_path,
    )?)));

    match cli.command {
        Command::Ask { docs, query, top_k } => {
            let engine = build_engine(&settings, history, &docs).await?;
            let mut request = QueryRequest::new(query, top_k);
            request.similarity_cutoff = settings.similarity_cutoff;
            let txn = engine.query(&request).await;

            if txn.success {
                println!("{}\n", txn.response_text);
                for (i, source) in txn.source_documents.iter().enumerate() {
                    println!(
                        "[{}] score {:.3} ({})",
                        i + 1,
                        source.score,
                        source.metadata.source.as_deref().unwrap_or("unknown")
                    );
                }
            } else {
                println!(
                    "Query failed: {}",
                    txn.error_message.as_deref().unwrap_or("unknown error")
                );
                std::process::exit(1);
            }
        }
        Command::History { limit, offset } => {
            let page = history.list(limit, offset).await?;
            println!(
                "{} entries total (showing {} from offset {})",
                page.total_count,
                page.items.len(),
                page.offset
            );
            for entry in page.items {
                let status = if entry.success { "ok" } else { "failed" };
                println!(
                    "{}  [{}] {}ms  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    status,
                    entry.response_time_ms,
                    entry.query
                );
            }
        }
        Command::Stats => {
            let stats = history.statistics().await?;
            println!("total queries:    {}", stats.total);
            println!("successful:       {}", stats.successful);
            println!("failed:           {}", stats.failed);
            println!("success rate:     {:.1}%", stats.success_rate * 100.0);
            if let Some(avg) = stats.avg_duration_ms {
                println!("avg duration:     {:.0}ms", avg);
            }
            println!("last day/week/month: {}/{}/{}",
                stats.queries_last_day, stats.queries_last_week, stats.queries_last_month);
        }
        Command::Health => {
            let embedder = Arc::new(OpenAiEmbeddings::from_settings(&settings)?);
            let chat = Arc::new(AnthropicChat::from_settings(&settings)?);
            let index = Arc::new(InMemoryVectorIndex::new());
            let engine = QueryEngine::new(embedder, chat, index, history);
            let status = engine.health().await;
            println!("vector index:       {}", if status.vector_index { "ok" } else { "unreachable" });
            println!("embedding provider: {}", if status.embedding_provider { "ok" } else { "unreachable" });
            println!("chat provider:      {}", if status.chat_provider { "ok" } else { "unreachable" });
            if !status.all_healthy() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn build_engine(
    settings: &Settings,
    history: Arc<HistoryService>,
    docs: &Path,
) -> Result<QueryEngine<OpenAiEmbeddings, AnthropicChat, InMemoryVectorIndex>> {
    let embedder = Arc::new(OpenAiEmbeddings::from_settings(settings)?);
    let chat = Arc::new(AnthropicChat::from_settings(settings)?);
    let index = Arc::new(InMemoryVectorIndex::new());

    // The in-memory collection is rebuilt from scratch each run, so a
    // configured-dimension drift never forces a re-index; it only means the
    // EMBED_DIM setting is stale.
    let model_dim = embedder.dimension().await?;
    if reconcile_schema(Some(settings.embed_dim), model_dim) == SchemaAction::RecreateRequired {
        tracing::warn!(
            configured = settings.embed_dim,
            actual = model_dim,
            "configured EMBED_DIM does not match the model output dimension; using the model's"
        );
    }

    let chunker = ChunkerConfig {
        chunk_size: settings.chunk_size,
        chunk_overlap: settings.chunk_overlap,
        ..ChunkerConfig::default()
    };
    let pipeline = IndexingPipeline::new(embedder.clone(), index.clone(), chunker)?;
    let documents = load_documents(docs)?;
    let report = pipeline.index(&documents).await?;
    println!(
        "indexed {} chunks from {} documents ({} skipped)",
        report.indexed_chunks,
        documents.len(),
        report.skipped_documents
    );

    Ok(QueryEngine::new(embedder, chat, index, history))
}

fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_text = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("txt") | Some("md")
        );
        if !is_text {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let text = std::fs::read_to_string(&path)?;
        let mut document = Document::new(name.clone(), text);
        document.metadata = serde_json::json!({
            "file_name": name,
            "source": path.display().to_string(),
        });
        documents.push(document);
    }
    if documents.is_empty() {
        anyhow::bail!("no .txt or .md documents found in {}", dir.display());
    }
    Ok(documents)
}
