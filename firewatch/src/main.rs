use clap::ArgMatches;
use colored::Colorize;
use firewatch::commands::command_argument_builder;
use firewatch::handlers::{handle_fetch, handle_serve, handle_status, handle_urls, load_config};
use firewatch_core::print_banner;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "✗".red().bold(), err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    // .env may carry FIRMS_MAP_KEY
    dotenvy::dotenv().ok();

    let chosen_command = command_argument_builder().get_matches();
    // global flags propagate down into the subcommand matches
    let args: &ArgMatches = chosen_command
        .subcommand()
        .map(|(_, sub)| sub)
        .unwrap_or(&chosen_command);

    init_tracing(
        args.get_one::<String>("log-level")
            .map(String::as_str)
            .unwrap_or("info"),
    );

    if !args.get_flag("quiet") {
        print_banner();
    }

    let Some((name, primary_command)) = chosen_command.subcommand() else {
        // No subcommand provided, just show the banner
        return;
    };

    let config = load_config(
        args.get_one::<String>("config").map(String::as_str),
        args.get_one::<String>("map-key").map(String::as_str),
    )
    .unwrap_or_else(|e| fail(e));

    let result = match name {
        "serve" => handle_serve(config, primary_command).await,
        "fetch" => handle_fetch(config, primary_command).await,
        "status" => handle_status(config, primary_command).await,
        "urls" => handle_urls(config, primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        fail(e);
    }
}
