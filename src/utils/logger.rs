use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("event_lens=debug,tower_http=debug,info")
        } else {
            EnvFilter::new("event_lens=info,tower_http=info,warn")
        }
    })
}

/// 初始化日誌；`json` 用於容器/雲端環境
pub fn init_logger(verbose: bool, json: bool) {
    let filter = default_filter(verbose);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(verbose, false);
}
