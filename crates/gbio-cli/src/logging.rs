use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the fmt subscriber. `RUST_LOG` is honoured; gbio crates log at info by default.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gbio_cli=info".parse()?)
                .add_directive("gbio_core=info".parse()?)
                .add_directive("gbio_gbif=info".parse()?),
        )
        .init();
    Ok(())
}
