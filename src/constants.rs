// Mapillary Graph API
pub const DEFAULT_GRAPH_URL: &str = "https://graph.mapillary.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// File scanning
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

// GPS encoding - coordinates are stored as micro-degree rationals,
// so six decimal places (about 0.11 m at the equator) survive the trip
pub const GPS_PRECISION_DENOMINATOR: u32 = 1_000_000;
