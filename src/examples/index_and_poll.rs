//! Index and Poll Example
//!
//! Indexes a couple of documents into a content source, waits for their
//! asynchronous receipts, then grants a user access to the source.
//!
//! Run with:
//!   ENTSEARCH_CONFIG=client.json ENTSEARCH_SOURCE=<source key> \
//!     cargo run -p entsearch-rs --example index_and_poll

use entsearch_rs::{Client, ClientConfig, ClientError, Document, PageParams};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("entsearch_rs=debug,index_and_poll=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;

    let config_path = std::env::var("ENTSEARCH_CONFIG").unwrap_or_else(|_| "client.json".into());
    let source_key = std::env::var("ENTSEARCH_SOURCE")?;

    let config = ClientConfig::load(&config_path)?;
    tracing::info!("Using {} ({:?})", config.base_url(), config.variant);

    let client = Client::from_config(&config)?;

    let documents = vec![
        Document::new(
            "tips-mentor",
            "5 Tips On Finding A Mentor",
            "The difference between a budding entrepreneur who merely shows promise and one who is already enjoying some success often comes down to mentoring.",
            "https://www.shopify.com/content/5-tips-on-finding-a-mentor",
        )
        .with_type("article"),
        Document::new(
            "profit-passions",
            "How to Profit from Your Passions",
            "Want to know the secret to starting a successful business? Find a void and fill it.",
            "https://www.shopify.com/content/how-to-profit-from-your-passions",
        ),
    ];

    match client.index_documents_and_wait(&source_key, &documents).await {
        Ok(receipts) => {
            for receipt in receipts {
                println!("📝 {} -> {:?} {:?}", receipt.id, receipt.status, receipt.errors);
            }
        }
        Err(ClientError::Timeout { waited, pending }) => {
            println!("⏱  Gave up after {:?}; still pending: {:?}", waited, pending);
        }
        Err(e) => return Err(e.into()),
    }

    let permissions = vec!["marketing".to_string()];
    let updated = client
        .add_user_permissions(&source_key, "elastic", &permissions)
        .await?;
    println!("🔐 {} now has {:?}", updated.user, updated.permissions);

    let page = client
        .list_permissions(&source_key, Some(PageParams::default().with_size(10)))
        .await?;
    println!(
        "👥 Page {}/{} ({} users total)",
        page.meta.page.current, page.meta.page.total_pages, page.meta.page.total_results
    );

    Ok(())
}
