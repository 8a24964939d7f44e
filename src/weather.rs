//! Current-weather proxy client.
//!
//! Injects the server-held API key so it never reaches the browser.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::WeatherError;

/// Upstream response passed back to the caller unchanged.
#[derive(Debug, Clone)]
pub struct WeatherResponse {
    /// Upstream status (always a success status).
    pub status: StatusCode,
    /// Upstream body.
    pub body: Bytes,
}

/// Client for the third-party current-weather endpoint.
#[derive(Clone)]
pub struct WeatherClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Endpoint URL.
    base_url: String,
    /// Location query.
    location: String,
    /// Unit system.
    units: String,
    /// API key; `None` when not configured.
    api_key: Option<String>,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("location", &self.location)
            .field("units", &self.units)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WeatherClient {
    /// Create a weather client from config.
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(config.weather_timeout())
            .connect_timeout(config.weather_timeout().min(Duration::from_secs(2)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.weather_url.clone(),
            location: config.weather_location.clone(),
            units: config.weather_units.clone(),
            api_key: config.weather_api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// Full request URL for `api_key`.
    fn request_url(&self, api_key: &str) -> Result<Url, WeatherError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", self.location.as_str()),
                ("units", self.units.as_str()),
                ("appid", api_key),
            ],
        )?;
        Ok(url)
    }

    /// Fetch current conditions.
    ///
    /// Returns `Ok(None)` when no API key is configured, without any
    /// outbound request.
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn current(&self) -> Result<Option<WeatherResponse>, WeatherError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let url = self.request_url(api_key)?;
        let response = self.http.get(url).send().await.map_err(|e| {
            // The URL carries the key.
            let e = e.without_url();
            warn!("Weather request failed: {}", e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Weather upstream returned an error");
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(reqwest::Error::without_url)?;
        debug!(bytes = body.len(), "Weather response received");

        Ok(Some(WeatherResponse { status, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let mut all = vec![("SAVE_PASSWORD", "pw")];
        all.extend_from_slice(pairs);
        Config::from_pairs(all.iter().copied()).unwrap()
    }

    #[test]
    fn request_url_carries_fixed_query() {
        let client = WeatherClient::new(&config(&[("WEATHER_API_KEY", "k3y")])).unwrap();
        let url = client.request_url("k3y").unwrap();

        assert_eq!(url.host_str(), Some("api.openweathermap.org"));
        assert_eq!(url.path(), "/data/2.5/weather");
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            vec![
                ("q".to_string(), "Lafayette,LA,US".to_string()),
                ("units".to_string(), "imperial".to_string()),
                ("appid".to_string(), "k3y".to_string()),
            ]
        );
    }

    #[test]
    fn debug_output_redacts_key() {
        let client = WeatherClient::new(&config(&[("WEATHER_API_KEY", "k3y")])).unwrap();
        assert!(!format!("{:?}", client).contains("k3y"));
    }

    #[tokio::test]
    async fn unconfigured_client_skips_request() {
        let client = WeatherClient::new(&config(&[])).unwrap();

        assert!(client.current().await.unwrap().is_none());
    }
}
