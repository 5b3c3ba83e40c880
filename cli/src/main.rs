//! Command-line client for a running `docmind-server` instance.
//!
//! Talks to the HTTP API over `reqwest` (spec §6 routes); there is no direct dependency on the
//! pipeline/retrieval/research crates themselves, the same "HTTP boundary, not library call"
//! shape `ravituringworks-generic-ai-agent`'s Ollama client uses for its model backend.
//!
//! # Usage
//!
//! ```bash
//! docmind upload ./report.pdf
//! docmind ask "What was revenue growth last quarter?"
//! docmind documents list
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8787";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Parser, Debug)]
#[command(name = "docmind", version, about = "CLI client for the docmind document RAG service")]
struct Args {
    /// Base URL of the running docmind server.
    #[arg(long, global = true, default_value = DEFAULT_SERVER_URL, env = "DOCMIND_SERVER_URL")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is reachable.
    Health,
    /// Register and process a local file as a new document.
    Upload {
        /// Path to the file on disk. Must be readable by the server process itself, since
        /// `POST /process` takes an already-written server-local path (spec §1 puts the
        /// upload receiver's own HTTP framing out of scope).
        path: PathBuf,
    },
    /// Ask a question against the indexed corpus.
    Ask {
        query: String,
        #[arg(long, default_value_t = 5)]
        num_sources: usize,
        #[arg(long, value_parser = ["hybrid", "visual", "text"], default_value = "hybrid")]
        mode: String,
        #[arg(long)]
        vision: bool,
    },
    /// Print the numbered context block a query would resolve to, without calling the LLM.
    Context {
        query: String,
        #[arg(long, default_value_t = 5)]
        num_sources: usize,
    },
    /// List indexed documents.
    Documents {
        #[command(subcommand)]
        action: DocumentsAction,
    },
    /// Fetch the current processing status of a document.
    Status { doc_id: String },
    /// Show the pending/active processing queue.
    Queue,
    /// Show aggregate corpus and processing stats.
    Stats,
}

#[derive(Subcommand, Debug)]
enum DocumentsAction {
    /// List indexed documents.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a single document's summary.
    Show { doc_id: String },
    /// Delete a document and its vectors.
    Rm { doc_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    match args.command {
        Command::Health => health(&client, &args.server).await,
        Command::Upload { path } => upload(&client, &args.server, &path).await,
        Command::Ask {
            query,
            num_sources,
            mode,
            vision,
        } => ask(&client, &args.server, &query, num_sources, &mode, vision).await,
        Command::Context { query, num_sources } => {
            context_only(&client, &args.server, &query, num_sources).await
        }
        Command::Documents { action } => documents(&client, &args.server, action).await,
        Command::Status { doc_id } => status(&client, &args.server, &doc_id).await,
        Command::Queue => queue(&client, &args.server).await,
        Command::Stats => stats(&client, &args.server).await,
    }
}

async fn health(client: &reqwest::Client, server: &str) -> Result<()> {
    let body: Value = get_json(client, server, "/health").await?;
    print_json(&body);
    Ok(())
}

#[derive(Serialize)]
struct RegisterUploadRequest<'a> {
    filename: &'a str,
    expected_size: u64,
}

#[derive(Deserialize)]
struct RegisterUploadResponse {
    doc_id: String,
    is_duplicate: bool,
}

#[derive(Serialize)]
struct ProcessRequest<'a> {
    filename: &'a str,
    path: &'a str,
}

async fn upload(client: &reqwest::Client, server: &str, path: &PathBuf) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("path has no filename")?;
    let absolute_path = path
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", path.display()))?;

    let register: RegisterUploadResponse = post_json(
        client,
        server,
        "/upload/register",
        &RegisterUploadRequest {
            filename,
            expected_size: metadata.len(),
        },
    )
    .await?;

    if register.is_duplicate {
        println!("Matches an existing document: {}", register.doc_id);
    }

    println!("Processing {filename} (doc_id {})...", register.doc_id);
    let outcome: Value = post_json(
        client,
        server,
        "/process",
        &ProcessRequest {
            filename,
            path: &absolute_path.to_string_lossy(),
        },
    )
    .await?;
    print_json(&outcome);
    Ok(())
}

#[derive(Serialize)]
struct AskBody<'a> {
    query: &'a str,
    num_sources: usize,
    search_mode: &'a str,
    vision_enabled: bool,
}

async fn ask(
    client: &reqwest::Client,
    server: &str,
    query: &str,
    num_sources: usize,
    mode: &str,
    vision: bool,
) -> Result<()> {
    let body = AskBody {
        query,
        num_sources,
        search_mode: mode,
        vision_enabled: vision,
    };
    let result: Value = post_json(client, server, "/research/ask", &body).await?;
    if let Some(answer) = result.get("answer_markdown").and_then(Value::as_str) {
        println!("{answer}\n");
    }
    print_json(&result);
    Ok(())
}

async fn context_only(client: &reqwest::Client, server: &str, query: &str, num_sources: usize) -> Result<()> {
    let body = AskBody {
        query,
        num_sources,
        search_mode: "hybrid",
        vision_enabled: false,
    };
    let result: Value = post_json(client, server, "/research/context-only", &body).await?;
    print_json(&result);
    Ok(())
}

async fn documents(client: &reqwest::Client, server: &str, action: DocumentsAction) -> Result<()> {
    match action {
        DocumentsAction::List { search } => {
            let path = match search {
                Some(needle) => format!("/documents?search={}", urlencode(&needle)),
                None => "/documents".to_string(),
            };
            let docs: Value = get_json(client, server, &path).await?;
            print_json(&docs);
        }
        DocumentsAction::Show { doc_id } => {
            let doc: Value = get_json(client, server, &format!("/documents/{doc_id}")).await?;
            print_json(&doc);
        }
        DocumentsAction::Rm { doc_id } => {
            let url = format!("{server}/documents/{doc_id}");
            let response = client.delete(&url).send().await.context("request failed")?;
            let body = response_to_json(response).await?;
            print_json(&body);
        }
    }
    Ok(())
}

async fn status(client: &reqwest::Client, server: &str, doc_id: &str) -> Result<()> {
    let body: Value = get_json(client, server, &format!("/status/{doc_id}")).await?;
    print_json(&body);
    Ok(())
}

async fn queue(client: &reqwest::Client, server: &str) -> Result<()> {
    let body: Value = get_json(client, server, "/status/queue").await?;
    print_json(&body);
    Ok(())
}

async fn stats(client: &reqwest::Client, server: &str) -> Result<()> {
    let body: Value = get_json(client, server, "/status/stats").await?;
    print_json(&body);
    Ok(())
}

async fn get_json<T: for<'de> Deserialize<'de>>(client: &reqwest::Client, server: &str, path: &str) -> Result<T> {
    let url = format!("{server}{path}");
    let response = client.get(&url).send().await.context("request failed")?;
    response_to_json(response).await
}

async fn post_json<T, B>(client: &reqwest::Client, server: &str, path: &str, body: &B) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    B: Serialize,
{
    let url = format!("{server}{path}");
    let response = client.post(&url).json(body).send().await.context("request failed")?;
    response_to_json(response).await
}

async fn response_to_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("server returned {status}: {body}");
    }
    response.json().await.context("failed to parse server response")
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
