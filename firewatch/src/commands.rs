use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

const SOURCES_HELP: &str =
    "Comma separated FIRMS sources: MODIS_NRT, VIIRS_SNPP_NRT, VIIRS_NOAA20_NRT, VIIRS_NOAA21_NRT \
    (default: the configured sources)";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("firewatch")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("firewatch")
        .about("Active fire detections per country, from NASA FIRMS and OpenStreetMap Nominatim")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false).global(true))
        .arg(
            arg!(--"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to the TOML configuration file (default: ~/.config/firewatch/config.toml)"),
        )
        .arg(
            arg!(--"map-key" <KEY>)
                .required(false)
                .global(true)
                .help("FIRMS map key, overrides FIRMS_MAP_KEY and the configuration file"),
        )
        .arg(
            arg!(--"log-level" <LEVEL>)
                .required(false)
                .global(true)
                .env("RUST_LOG")
                .help("Log filter, e.g. info, debug or firewatch_core=debug")
                .default_value("info"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("serve")
                .about("Serve the map dashboard and the active fires API")
                .arg(
                    arg!(-l --"listen" <ADDR>)
                        .required(false)
                        .help("Listen address, overrides FIREWATCH_LISTEN and the configuration file")
                        .value_parser(clap::value_parser!(std::net::SocketAddr)),
                ),
        )
        .subcommand(
            command!("fetch")
                .about("Fetch the active fires of a country and print a report")
                .arg(
                    arg!(-c --"country" <COUNTRY>)
                        .required(true)
                        .help("Country name or ISO code"),
                )
                .arg(
                    arg!(-d --"days" <DAYS>)
                        .required(false)
                        .help("Number of days to look back, 1 to 10 (default: the configured day range)")
                        .value_parser(clap::value_parser!(u8).range(1..=10)),
                )
                .arg(arg!(-s --"sources" <SOURCES>).required(false).help(SOURCES_HELP))
                .arg(
                    arg!(--"include-low")
                        .required(false)
                        .help("Include low confidence detections")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, geojson")
                        .value_parser(["text", "json", "csv", "geojson"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(command!("status").about("Show the transaction usage of the FIRMS map key"))
        .subcommand(
            command!("urls")
                .about("Print the upstream request URLs for a country")
                .arg(
                    arg!(-c --"country" <COUNTRY>)
                        .required(true)
                        .help("Country name or ISO code"),
                )
                .arg(
                    arg!(-d --"days" <DAYS>)
                        .required(false)
                        .help("Number of days to look back, 1 to 10")
                        .value_parser(clap::value_parser!(u8).range(1..=10)),
                ),
        )
}
