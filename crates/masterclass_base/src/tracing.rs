use crate::MasterclassResult;
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};

/// Install the global subscriber: fmt output filtered by `RUST_LOG` (default `info`),
/// plus the error layer so errors can capture span traces.
pub fn init_tracing() -> MasterclassResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| crate::err!("Failed to install tracing subscriber: {}", e))
}
