use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use firewatch_core::gateway::ActiveFiresParams;
use firewatch_core::report::{render_report, save_report, ReportFormat};
use firewatch_core::{ActiveFires, AppConfig, FireGateway};
use firewatch_upstream::{FirmsArea, KeyStatus};
use indicatif::{ProgressBar, ProgressStyle};
use pager::Pager;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Config file, then environment, then the `--map-key` flag.
pub fn load_config(config_path: Option<&str>, map_key: Option<&str>) -> Result<AppConfig> {
    let mut config = AppConfig::load(config_path)?;
    config.apply_env();
    if let Some(key) = map_key {
        config.firms.map_key = Some(key.to_string());
    }
    Ok(config)
}

/// Collect the `fetch` flags into the same parameters the HTTP API takes.
pub fn fetch_params(args: &ArgMatches) -> ActiveFiresParams {
    ActiveFiresParams {
        country: args.get_one::<String>("country").cloned(),
        days: args.get_one::<u8>("days").map(|d| d.to_string()),
        sources: args.get_one::<String>("sources").cloned(),
        include_low: Some(args.get_flag("include-low").to_string()),
        date: None,
    }
}

/// Write to `output` when given, otherwise to stdout (through a pager on a terminal).
pub fn write_report(content: &str, output: Option<&Path>, use_pager: bool) -> Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => {
            if use_pager {
                Pager::with_pager("less -R").setup();
            }
            print!("{}", content);
        }
    }
    Ok(())
}

/// `output`, with the format's extension added when it has none.
pub fn report_path(output: &Path, format: ReportFormat) -> PathBuf {
    if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.with_extension(format.extension())
    }
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    spinner
}

pub fn format_key_status(status: &KeyStatus) -> String {
    let count = |value: Option<u64>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let mut out = String::new();
    out.push_str(&format!("Transaction limit:    {}\n", count(status.transaction_limit)));
    out.push_str(&format!("Current transactions: {}\n", count(status.current_transactions)));
    out.push_str(&format!(
        "Interval:             {}\n",
        status.transaction_interval.as_deref().unwrap_or("-")
    ));
    out
}

fn fire_summary_line(fires: &ActiveFires) -> String {
    if fires.fires.is_empty() {
        format!(
            "No fires found in {} over the last {} day(s)",
            fires.country.display_name, fires.days
        )
    } else {
        format!(
            "{} fire(s) found in {} over the last {} day(s)",
            fires.fires.len(),
            fires.country.display_name,
            fires.days
        )
    }
}

pub async fn handle_serve(mut config: AppConfig, args: &ArgMatches) -> Result<()> {
    if let Some(listen) = args.get_one::<SocketAddr>("listen") {
        config.server.listen = listen.to_string();
    }

    if !args.get_flag("quiet") {
        print_divider();
        println!("{}", "  FIREWATCH GATEWAY".bright_white().bold());
        print_divider();
        println!(
            "{} Dashboard: {}",
            "→".blue(),
            format!("http://{}/", config.server.listen).bright_white()
        );
        println!(
            "{} API:       {}",
            "→".blue(),
            format!("http://{}/active-fires?country=Vietnam&days=5", config.server.listen).bright_white()
        );
        println!();
    }

    crate::server::serve(&config).await
}

pub async fn handle_fetch(config: AppConfig, args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let gateway = FireGateway::from_config(&config)?;
    let request = fetch_params(args).validate(gateway.defaults())?;

    let format_name = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unsupported report format: {}", format_name))?;
    let output = args
        .get_one::<PathBuf>("output")
        .map(|path| report_path(path, format));

    let progress = spinner(
        quiet,
        format!("Looking up active fires in {}...", request.country),
    );
    let result = gateway.active_fires(&request).await;
    progress.finish_and_clear();

    let fires = result?;
    debug!(
        "{} fire(s), {} high confidence",
        fires.fires.len(),
        fires.high_confidence_count()
    );
    if !quiet {
        eprintln!("{} {}", "✓".green().bold(), fire_summary_line(&fires));
    }

    let report = render_report(&fires, format)?;
    let use_pager = !quiet && std::io::stdout().is_terminal();
    write_report(&report, output.as_deref(), use_pager)
}

pub async fn handle_status(config: AppConfig, args: &ArgMatches) -> Result<()> {
    let gateway = FireGateway::from_config(&config)?;
    let progress = spinner(args.get_flag("quiet"), "Querying FIRMS map key status...".to_string());
    let result = gateway.key_status().await;
    progress.finish_and_clear();
    let status = result?;

    print_divider();
    println!(
        "{}",
        format!("  FIRMS MAP KEY {}", config.map_key()?.redacted())
            .bright_white()
            .bold()
    );
    print_divider();
    print!("{}", format_key_status(&status));

    if let (Some(limit), Some(current)) = (status.transaction_limit, status.current_transactions)
        && current >= limit
    {
        println!(
            "\n{} {}",
            "⚠".yellow().bold(),
            "The access limit is reached, try again in 10 minutes or use a different key".yellow()
        );
    }
    Ok(())
}

pub fn handle_urls(config: AppConfig, args: &ArgMatches) -> Result<()> {
    let gateway = FireGateway::from_config(&config)?;
    let country = args
        .get_one::<String>("country")
        .ok_or_else(|| anyhow!("--country is required"))?;
    let days = args.get_one::<u8>("days").copied();

    let search_url = gateway.nominatim_search_url(country)?;
    let csv_urls = gateway.configured_csv_urls(&FirmsArea::World, days)?;

    println!("{}", "Nominatim".bright_white().bold());
    println!("  {}", search_url);
    println!("{}", "FIRMS".bright_white().bold());
    for url in csv_urls {
        println!("  {}", url);
    }
    Ok(())
}
