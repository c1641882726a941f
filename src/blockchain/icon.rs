use crate::config::Config;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "icon";

/// Best-effort lookup of a token icon in a public asset catalog.
#[derive(Clone)]
pub struct IconResolver {
    http: reqwest::Client,
    base_url: String,
    default_icon: String,
}

impl IconResolver {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_options(
            &config.icon_base_url,
            &config.default_icon_url,
            Duration::from_millis(config.icon_timeout_ms),
        )
    }

    pub fn with_options(base_url: &str, default_icon: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_icon: default_icon.to_string(),
        })
    }

    pub fn icon_url(&self, symbol: &str) -> String {
        format!("{}/{}.png", self.base_url, symbol.to_lowercase())
    }

    /// Catalog URL for `symbol`, or the generic token icon when the catalog has none.
    pub async fn resolve(&self, symbol: &str) -> String {
        let url = self.icon_url(symbol);
        match self.check(&url).await {
            Ok(true) => {
                debug!(service = SERVICE, symbol, %url, "icon found");
                url
            }
            Ok(false) => {
                debug!(service = SERVICE, symbol, "icon not in catalog, using default");
                self.default_icon.clone()
            }
            Err(e) => {
                warn!(service = SERVICE, symbol, "icon lookup failed: {}", e);
                self.default_icon.clone()
            }
        }
    }

    async fn check(&self, url: &str) -> Result<bool, reqwest::Error> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        // the CDN answers some misses with 200 and an error page
        let body = response.text().await?;
        Ok(!body.contains("Couldn't find"))
    }
}
