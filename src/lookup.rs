use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::settings::Settings;

/// Blocking client for the Mapillary Graph API image endpoint.
pub struct LookupClient {
    client: reqwest::blocking::Client,
    graph_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GeometryResponse {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // The API sends [longitude, latitude].
    coordinates: (f64, f64),
}

impl LookupClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            graph_url: settings.graph_url.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    /// Fetch the (latitude, longitude) of a Mapillary image.
    ///
    /// Every failure mode (transport error, non-200 status, malformed
    /// payload) logs a warning and returns None so the caller can move on
    /// to the next image.
    pub fn image_geometry(&self, image_id: &str) -> Option<(f64, f64)> {
        let url = format!("{}/{}", self.graph_url, image_id);
        let query = [
            ("fields", "geometry"),
            ("access_token", self.access_token.as_str()),
        ];

        let response = match self.client.get(&url).query(&query).send() {
            Ok(response) => response,
            Err(err) => {
                warn!("Couldn't find {}: {}", image_id, err);
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            warn!("Couldn't find {}: {}", image_id, response.status());
            return None;
        }

        let body = match response.bytes() {
            Ok(body) => body,
            Err(err) => {
                warn!("Couldn't find {}: {}", image_id, err);
                return None;
            }
        };

        match parse_geometry(&body) {
            Ok(coordinates) => Some(coordinates),
            Err(err) => {
                warn!("Couldn't find {}: {}", image_id, err);
                None
            }
        }
    }
}

/// Parse a geometry payload, swapping the API's [longitude, latitude] order
/// into (latitude, longitude).
fn parse_geometry(body: &[u8]) -> Result<(f64, f64)> {
    let response: GeometryResponse =
        serde_json::from_slice(body).context("Malformed geometry payload")?;
    let (lon, lat) = response.geometry.coordinates;
    Ok((lat, lon))
}
