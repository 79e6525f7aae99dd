pub mod error;
pub mod firms;
pub mod http;
pub mod nominatim;
pub mod record;

pub use error::{Result, UpstreamError};
pub use firms::{FirmsArea, FirmsClient, FirmsSource, KeyStatus, MapKey};
pub use nominatim::NominatimClient;
pub use record::{AreaBounds, RawDetection};
