use inmemstore::{commands, Store, StoreConfig};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PROMPT: &str = "Enter a command or type 'EXIT' to quit: ";

#[tokio::main]
async fn main() -> inmemstore::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inmemstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = StoreConfig::from_env();
    let store = Store::open(config);
    let sweeper = store.spawn_sweeper();

    let mut stdout = io::stdout();
    stdout
        .write_all(format!("Welcome to inmemstore!\n{}\n", commands::HELP).as_bytes())
        .await?;

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        };

        if line.trim().eq_ignore_ascii_case("EXIT") {
            break;
        }

        if let Some(reply) = commands::dispatch(&line, &store) {
            stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        }
    }

    stdout.write_all(b"Exiting inmemstore.\n").await?;
    stdout.flush().await?;

    sweeper.stop().await;
    info!("Shut down with {} keys in memory", store.len());

    Ok(())
}
