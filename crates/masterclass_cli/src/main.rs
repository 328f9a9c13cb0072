/* 📖 # Why does the CLI parse arguments by hand?

There are two commands and no flags, so std::env::args is enough:

    masterclass search <query...>   render the results for one query
    masterclass serve               serve /api/search and /api/feedback

Both read `masterclass.toml` from the current directory (defaults if it is
missing). Exit code 1 means configuration, usage or startup failed.
*/

use std::env;
use std::process;
use std::sync::Arc;
use std::thread;

use tracing::info;

use masterclass_base::pal::http::HttpServerConfig;
use masterclass_base::tracing::init_tracing;
use masterclass_base::{FilePath, PalHandle, RealPal};
use masterclass_engine::{ApiService, Config, MemoryQueryState, QueryController, QueryState, load_config};

const CONFIG_FILE: &str = "masterclass.toml";
const USAGE: &str = "Usage: masterclass search <query...> | masterclass serve";

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn run_search(pal: PalHandle, config: &Config, query: &str) {
    let mut controller = QueryController::new(
        pal,
        config.search.index_source(),
        Arc::new(MemoryQueryState::new()),
    )
    .with_min_query_length(config.search.min_query_length);

    if matches!(controller.search(query), QueryState::Idle) {
        eprintln!(
            "Query must be at least {} characters long.",
            config.search.min_query_length
        );
        process::exit(1);
    }
    println!("{}", controller.render_html());
}

fn run_server(pal: PalHandle, config: &Config) {
    let service = ApiService::new(pal.clone(), config)
        .unwrap_or_else(|e| fail(format!("Failed to create API service: {}", e)));
    let server_config = HttpServerConfig::new(config.server.host.clone()).with_port(config.server.port);
    let handle = pal
        .start_http_server(Box::new(service), server_config)
        .unwrap_or_else(|e| fail(format!("Failed to start server: {}", e)));

    println!("Serving on http://{}:{}", config.server.host, handle.port());
    info!(source = %config.search.index_source(), "search endpoint ready at /api/search");
    if config.feedback.webhook_url.is_none() {
        info!("no webhook configured, /api/feedback will answer 500");
    }

    // The server runs until the process is terminated.
    while !handle.is_shutdown() {
        thread::park();
    }
}

fn main() {
    if let Err(e) = init_tracing() {
        fail(e);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        fail(USAGE);
    };

    let current_dir = env::current_dir()
        .unwrap_or_else(|e| fail(format!("Failed to get current directory: {}", e)));
    let pal = PalHandle::new(
        RealPal::new(current_dir).unwrap_or_else(|e| fail(format!("Failed to initialize: {}", e))),
    );
    let config = load_config(&pal, &FilePath::from(CONFIG_FILE))
        .unwrap_or_else(|e| fail(format!("Failed to load config from {}: {:?}", CONFIG_FILE, e)));

    match command.as_str() {
        "search" => run_search(pal, &config, &args[1..].join(" ")),
        "serve" => run_server(pal, &config),
        other => fail(format!("Unknown command '{}'. {}", other, USAGE)),
    }
}
