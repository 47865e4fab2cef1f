//! Logging setup for the binaries

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Map the `-d` count to a level filter.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the stderr subscriber. Safe to call once per process.
pub fn setup_logging(verbosity: u8) {
    if verbosity > 3 {
        eprintln!("Don't be crazy, max is -d -d -d");
    }
    let filter = level_for(verbosity);

    // HTTP internals are only interesting at trace level
    let noisy_modules = ["hyper_util", "reqwest::connect"];
    let module_filter = filter_fn(move |metadata| {
        filter == LevelFilter::TRACE
            || !noisy_modules
                .iter()
                .any(|name| metadata.target().starts_with(name))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    if tracing_subscriber::registry()
        .with(filtered_layer)
        .try_init()
        .is_err()
    {
        return;
    }

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, LevelFilter::WARN)]
    #[case(1, LevelFilter::INFO)]
    #[case(2, LevelFilter::DEBUG)]
    #[case(3, LevelFilter::TRACE)]
    #[case(9, LevelFilter::TRACE)]
    fn given_debug_count_when_mapping_then_level_matches(
        #[case] verbosity: u8,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(level_for(verbosity), expected);
    }
}
