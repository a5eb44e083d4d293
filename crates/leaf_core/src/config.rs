use crate::error::ConfigError;
use crate::types::ConfidenceScale;
use reqwest::Url;
use std::str::FromStr;
use std::time::Duration;

pub const ENDPOINT_VAR: &str = "LEAF_API_URL";
pub const TIMEOUT_VAR: &str = "LEAF_API_TIMEOUT_SECS";
pub const SCALE_VAR: &str = "LEAF_CONFIDENCE_SCALE";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for talking to the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub confidence_scale: ConfidenceScale,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            timeout: DEFAULT_TIMEOUT,
            confidence_scale: ConfidenceScale::default(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_confidence_scale(mut self, scale: ConfidenceScale) -> Self {
        self.confidence_scale = scale;
        self
    }

    /// Reads the process environment. `fallback_endpoint` is used when
    /// `LEAF_API_URL` is unset at runtime (typically the value baked in at
    /// build time).
    pub fn from_env(fallback_endpoint: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), fallback_endpoint)
    }

    pub fn from_lookup<F>(lookup: F, fallback_endpoint: Option<&str>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENDPOINT_VAR)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| fallback_endpoint.map(str::to_string))
            .ok_or(ConfigError::MissingEndpoint)?;
        let mut config = Self::new(&endpoint)?;

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Duration::try_from_secs_f64(secs)
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
        }
        if let Some(raw) = lookup(SCALE_VAR) {
            config.confidence_scale = raw.parse()?;
        }
        Ok(config)
    }

    /// Health check URL on the endpoint's origin.
    pub fn ping_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path("/ping");
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

impl FromStr for ConfidenceScale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percent" => Ok(Self::Percent),
            "fraction" => Ok(Self::Fraction),
            _ => Err(ConfigError::InvalidScale(s.to_string())),
        }
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint {
            value: raw.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}
