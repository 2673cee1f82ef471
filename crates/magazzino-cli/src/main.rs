mod configuration;
mod session;
mod view;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use magazzino::client::{Credential, DocumentUpload, MagazzinoClient};
use magazzino::orchestrator::chat::ChatOrchestrator;
use magazzino::orchestrator::ingest::IngestOrchestrator;
use magazzino::session::WidgetTokenCache;

use crate::configuration::Settings;
use crate::view::TerminalView;

#[derive(Parser)]
#[command(author, version, about = "Terminal client for the Magazzino Creatore content warehouse", long_about = None)]
struct Cli {
    /// Backend base URL (overrides MAGAZZINO_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session against the knowledge base
    Chat,
    /// Generate content ideas from the ingested material
    Ideas,
    /// Ingest every video of a YouTube channel
    IngestChannel {
        /// Channel URL, e.g. https://youtube.com/@creator
        channel_url: String,
    },
    /// Ingest the articles of an RSS feed
    IngestFeed {
        /// Feed URL
        rss_url: String,
    },
    /// Upload documents to the knowledge base
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Synchronize WordPress content
    SyncWordpress,
    /// Restore the database backup and rebuild the search index
    RestoreDatabase,
    /// Full restore; the application restarts and progress is not reported
    RestoreFull,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::new().context("failed to load settings")?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }

    let mut client = MagazzinoClient::new(&settings.base_url, settings.credential())?;

    // Embedded-style deployments configure only a customer id; exchange
    // it for a widget token before the first authenticated call.
    if matches!(settings.credential(), Credential::Anonymous) {
        if let Some(customer_id) = &settings.customer_id {
            let mut tokens = WidgetTokenCache::new(customer_id.clone());
            let token = tokens
                .get_or_fetch(&client)
                .await
                .context("widget token exchange failed")?;
            client.set_credential(Credential::Bearer(token));
        }
    }

    match cli.command {
        Command::Chat => {
            session::ChatRepl::new(&client).run().await?;
        }
        Command::Ideas => {
            let mut view = TerminalView::new();
            let mut orchestrator = ChatOrchestrator::new(&client);
            orchestrator.generate_ideas(&mut view).await;
        }
        Command::IngestChannel { channel_url } => {
            let mut view = TerminalView::new();
            let mut orchestrator = IngestOrchestrator::new(&client);
            orchestrator.ingest_channel(&mut view, &channel_url).await;
        }
        Command::IngestFeed { rss_url } => {
            let mut view = TerminalView::new();
            let mut orchestrator = IngestOrchestrator::new(&client);
            orchestrator.ingest_feed(&mut view, &rss_url).await;
        }
        Command::Upload { files } => {
            let mut uploads = Vec::new();
            for path in &files {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let filename = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("document")
                    .to_string();
                uploads.push(DocumentUpload { filename, bytes });
            }
            let mut view = TerminalView::new();
            let mut orchestrator = IngestOrchestrator::new(&client);
            orchestrator.upload_documents(&mut view, uploads).await;
        }
        Command::SyncWordpress => {
            let mut view = TerminalView::new();
            let mut orchestrator = IngestOrchestrator::new(&client);
            orchestrator.sync_wordpress(&mut view).await;
        }
        Command::RestoreDatabase => {
            let mut view = TerminalView::new();
            let mut orchestrator = IngestOrchestrator::new(&client);
            orchestrator.restore_database(&mut view).await;
        }
        Command::RestoreFull => {
            let mut view = TerminalView::new();
            let mut orchestrator = IngestOrchestrator::new(&client);
            orchestrator.restore_full(&mut view).await;
        }
    }

    Ok(())
}
