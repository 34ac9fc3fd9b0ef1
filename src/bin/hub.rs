use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use vigia::api::{self, ApiConfig, ApiState};
use vigia::collector::MetricsCollector;
use vigia::config::Config;
use vigia::notify::senders::{EmailSender, WhatsAppSender};
use vigia::notify::AlertDispatcher;
use vigia::pipeline::{AlertEvaluator, BatchRunner, ServerProcessor};
use vigia::store::postgres::PgStore;
use vigia::store::DataStore;

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Bind address, overriding VIGIA_BIND_ADDR
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("vigia", LevelFilter::DEBUG),
        ("hub", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let store: Arc<dyn DataStore> = Arc::new(PgStore::connect(&config.database_url).await?);
    let client = config.http_client();

    let dispatcher = Arc::new(AlertDispatcher::new(
        store.clone(),
        EmailSender::new(client.clone(), config.email.clone(), store.clone()),
        WhatsAppSender::new(client.clone(), store.clone()),
    ));

    let processor = ServerProcessor::new(
        store.clone(),
        MetricsCollector::new(client),
        AlertEvaluator::new(store.clone(), dispatcher.clone()),
    );
    let runner = Arc::new(BatchRunner::new(
        store.clone(),
        processor,
        config.job_name.clone(),
    ));

    let state = ApiState::new(store, runner, dispatcher);
    let addr = api::spawn_api_server(
        ApiConfig {
            bind_addr: config.bind_addr,
        },
        state,
    )
    .await?;

    info!("monitoring hub ready on {addr}");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    Ok(())
}
