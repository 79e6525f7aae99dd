pub mod config;
pub mod detections;
pub mod error;
pub mod gateway;
pub mod geometry;
pub mod model;
pub mod report;

use colored::Colorize;

pub use config::AppConfig;
pub use error::{ErrorKind, GatewayError, Result};
pub use gateway::{ActiveFiresParams, ActiveFiresRequest, FireGateway, QueryDefaults};
pub use geometry::Boundary;
pub use model::{ActiveFires, ConfidenceLevel, CountryInfo, FireDetection};
pub use report::ReportFormat;

pub fn print_banner() {
    let banner = r#"
   __ _                          _       _
  / _(_)_ __ _____      ____ _| |_ ___| |__
 | |_| | '__/ _ \ \ /\ / / _` | __/ __| '_ \
 |  _| | | |  __/\ V  V / (_| | || (__| | | |
 |_| |_|_|  \___| \_/\_/ \__,_|\__\___|_| |_|
"#;
    println!("{}", banner.red().bold());
    println!(
        "  {} {}\n",
        "active fires on a map".yellow(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
