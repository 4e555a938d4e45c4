use clap::Parser;
use hvac_stability::cli::args::Cli;
use hvac_stability::cli::commands::execute_command;
use hvac_stability::cli::output;
use hvac_stability::cli::CliError;
use hvac_stability::config::Settings;
use hvac_stability::infrastructure::di::ServiceContainer;
use hvac_stability::infrastructure::kumo;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.debug, cli.cloud_logging);

    if let Err(e) = run(&cli) {
        output::error(&e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings)?;
    execute_command(cli, &container)
}

fn setup_logging(verbosity: u8, cloud_logging: bool) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // cloud client chatter only with --cloud-logging
    let module_filter = filter_fn(move |metadata| {
        cloud_logging || !metadata.target().starts_with(kumo::LOG_TARGET)
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
