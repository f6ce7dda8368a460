//! Terminal front end for the documents admin console.
//!
//! ```text
//! doc-console list [--pages N]
//! doc-console upload ./report.pdf --folder reports
//! doc-console delete reports/old.pdf reports/older.pdf --yes
//! doc-console sync
//! doc-console status [--watch]
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use doc_manager::{
    config::ConsoleConfig,
    console::{DocumentsApi, DocumentsConsole, HttpApiClient, SyncPoller},
    folders::{FolderMap, FolderNode},
};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "doc-console", about = "Manage knowledge-base documents")]
struct Cli {
    /// Base URL of the doc-manager API
    #[arg(long, env = "API_BASE_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show documents as a folder tree
    List {
        /// Number of pages to walk
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Upload a local file through a presigned URL
    Upload {
        path: PathBuf,
        /// Destination folder, e.g. `reports`
        #[arg(long)]
        folder: String,
        /// Content type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Delete documents by key
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Start a search index sync
    Sync,
    /// Show whether a sync is running
    Status {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
}

fn print_tree(map: &FolderMap, depth: usize) {
    let indent = "  ".repeat(depth);
    for (segment, node) in map {
        match node {
            FolderNode::Folder(children) => {
                println!("{}{}/", indent, segment);
                print_tree(children, depth + 1);
            }
            FolderNode::Object(record) => {
                println!(
                    "{}{}  {} bytes  {}",
                    indent,
                    segment,
                    record.size,
                    record.last_modified.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::{BufRead, Write};

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn fail_on_error(console: &mut DocumentsConsole<HttpApiClient>) -> Result<()> {
    match console.take_error() {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_manager=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let api = HttpApiClient::new(&config.api_base_url);
    let mut console = DocumentsConsole::new(api, &config);

    match cli.command {
        Command::List { pages } => {
            console.load_documents(None, None).await;
            fail_on_error(&mut console)?;

            for page in 1..=pages.max(1) {
                if page > 1 {
                    if !console.has_next_page() {
                        break;
                    }
                    console.next_page().await;
                    fail_on_error(&mut console)?;
                }
                println!("-- page {} --", console.current_page_index);
                print_tree(&console.tree, 0);
            }
        }
        Command::Upload {
            path,
            folder,
            content_type,
        } => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .context("path has no usable file name")?
                .to_string();
            let content_type = content_type.unwrap_or_else(|| {
                mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string()
            });
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;

            let key = console
                .upload_file(&folder, &file_name, &content_type, Bytes::from(data))
                .await?;
            println!("Uploaded {}", key);
        }
        Command::Delete { keys, yes } => {
            console.load_documents(None, None).await;
            fail_on_error(&mut console)?;

            // Keys beyond the first page cannot be picked from the table
            let mut outside_page = Vec::new();
            for key in &keys {
                if !console.select(key) {
                    outside_page.push(key.clone());
                }
            }

            let total = console.selected_items.len() + outside_page.len();
            if !yes && !confirm(&console.delete_prompt_with(&outside_page))? {
                console.cancel_delete();
                println!("Cancelled");
                return Ok(());
            }

            let mut failed = 0;
            if console.request_delete() {
                for outcome in console.confirm_delete().await {
                    match outcome.error {
                        None => println!("deleted {}", outcome.key),
                        Some(e) => {
                            failed += 1;
                            eprintln!("failed  {}: {}", outcome.key, e);
                        }
                    }
                }
            }
            if !outside_page.is_empty() {
                let response = console.api().delete_files(outside_page).await?;
                for outcome in response.results {
                    match outcome.error {
                        None => println!("deleted {}", outcome.key),
                        Some(e) => {
                            failed += 1;
                            eprintln!("failed  {}: {}", outcome.key, e);
                        }
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} deletes failed", failed, total);
            }
        }
        Command::Sync => {
            console.poll_sync_status().await;
            if !console.sync_now().await {
                fail_on_error(&mut console)?;
                println!("A sync is already running");
            } else {
                println!("Sync started");
            }
        }
        Command::Status { watch } => {
            if !watch {
                console.poll_sync_status().await;
                println!("{}", if console.syncing { "syncing" } else { "idle" });
                return Ok(());
            }

            let period = Duration::from_secs(config.sync_poll_interval_secs.max(1));
            let console = Arc::new(Mutex::new(console));
            let poller = SyncPoller::spawn(console.clone(), period);

            let mut last = None;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(period) => {
                        let syncing = console.lock().await.syncing;
                        if last != Some(syncing) {
                            println!("{}", if syncing { "syncing" } else { "idle" });
                            last = Some(syncing);
                        }
                    }
                }
            }
            poller.stop();
        }
    }

    Ok(())
}
