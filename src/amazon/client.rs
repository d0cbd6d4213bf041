//! HTTP sessions for product pages using wreq for TLS fingerprint emulation.

use crate::amazon::regions::Region;
use crate::config::Config;
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// Fetch failures, split so the worker can classify them.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Trait for product-page fetching - enables mocking for tests.
#[async_trait]
pub trait ProductPages: Send + Sync {
    /// Fetches a product detail page by ASIN.
    async fn product_page(&self, asin: &str) -> Result<String, FetchError>;

    /// Fetches raw bytes from a URL discovered on a page (image download).
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Hands one fresh session to each worker invocation.
///
/// Construction is serialized behind a mutex: the TLS emulation layer is
/// treated as unsafe to initialize concurrently, matching the constraint the
/// automation driver imposed on the original pipeline. The session itself is
/// exclusively owned by the invocation that acquired it and is dropped on
/// every exit path.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<Box<dyn ProductPages>>;
}

/// Product-page session with browser impersonation and anti-bot measures.
pub struct PageSession {
    client: Client,
    region: Region,
    delay_ms: u64,
    delay_jitter_ms: u64,
    page_timeout: Duration,
    download_timeout: Duration,
    base_url: Option<String>,
}

impl PageSession {
    /// Builds a new session from the run configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Builds a session with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| anyhow::anyhow!("Failed to configure proxy: {}", e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            region: config.region,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            base_url,
        })
    }

    /// Returns the base URL (custom for testing, or region-based for production).
    fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.region.base_url())
    }

    /// Performs a GET with anti-bot headers under a bounded wait.
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.delay().await;

        debug!("GET {}", url);

        let request = async {
            let response = self
                .client
                .get(url)
                .emulation(Emulation::Chrome131)
                .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
                .header("Accept-Language", self.region.accept_language())
                .header("Accept-Encoding", "gzip, deflate, br")
                .header("Cache-Control", "no-cache")
                .header("Pragma", "no-cache")
                .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
                .header("Sec-Ch-Ua-Mobile", "?0")
                .header("Sec-Ch-Ua-Platform", "\"macOS\"")
                .header("Sec-Fetch-Dest", "document")
                .header("Sec-Fetch-Mode", "navigate")
                .header("Sec-Fetch-Site", "none")
                .header("Sec-Fetch-User", "?1")
                .header("Upgrade-Insecure-Requests", "1")
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            debug!("Response status: {}", status);

            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            response.text().await.map_err(|e| FetchError::Transport(e.to_string()))
        };

        tokio::time::timeout(self.page_timeout, request)
            .await
            .unwrap_or(Err(FetchError::Timeout(self.page_timeout)))
    }

    /// Adds a random delay to mimic human behavior.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl ProductPages for PageSession {
    async fn product_page(&self, asin: &str) -> Result<String, FetchError> {
        let url = format!("{}/dp/{}", self.base_url(), asin);
        self.get_text(&url).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);

        let request = async {
            let response = self
                .client
                .get(url)
                .emulation(Emulation::Chrome131)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| FetchError::Transport(e.to_string()))
        };

        tokio::time::timeout(self.download_timeout, request)
            .await
            .unwrap_or(Err(FetchError::Timeout(self.download_timeout)))
    }
}

/// Production factory: one wreq session per invocation, built under the
/// initialization lock.
pub struct WreqSessionFactory {
    config: Config,
    base_url: Option<String>,
    init_lock: Mutex<()>,
}

impl WreqSessionFactory {
    pub fn new(config: Config) -> Self {
        Self { config, base_url: None, init_lock: Mutex::new(()) }
    }

    /// Factory with a custom base URL (for testing against a local server).
    pub fn with_base_url(config: Config, base_url: String) -> Self {
        Self { config, base_url: Some(base_url), init_lock: Mutex::new(()) }
    }
}

#[async_trait]
impl SessionFactory for WreqSessionFactory {
    async fn acquire(&self) -> anyhow::Result<Box<dyn ProductPages>> {
        let _guard = self.init_lock.lock().await;
        let session = PageSession::with_base_url(&self.config, self.base_url.clone())?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config() -> Config {
        Config { delay_ms: 0, delay_jitter_ms: 0, page_timeout_secs: 2, ..Config::default() }
    }

    #[tokio::test]
    async fn test_product_page_success() {
        let mock_server = MockServer::start().await;

        let html = r#"
            <html><body>
                <a id="bylineInfo">Visit the Logitech Store</a>
                <span class="a-price"><span class="a-offscreen">$29.99</span></span>
            </body></html>
        "#;

        Mock::given(method("GET"))
            .and(path("/dp/B08N5WRWNW"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let config = make_test_config();
        let session = PageSession::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let body = session.product_page("B08N5WRWNW").await.unwrap();
        assert!(body.contains("Logitech"));
        assert!(body.contains("$29.99"));
    }

    #[tokio::test]
    async fn test_product_page_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/INVALIDASI"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let config = make_test_config();
        let session = PageSession::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let result = session.product_page("INVALIDASI").await;
        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_product_page_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B08N5WRWNW"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let config = make_test_config();
        let session = PageSession::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let result = session.product_page("B08N5WRWNW").await;
        assert!(matches!(result, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn test_product_page_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B08N5WRWNW"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html></html>")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let mut config = make_test_config();
        config.page_timeout_secs = 1;
        let session = PageSession::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let result = session.product_page("B08N5WRWNW").await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_download_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/images/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&mock_server)
            .await;

        let config = make_test_config();
        let session = PageSession::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let bytes = session.download(&format!("{}/images/a.jpg", mock_server.uri())).await.unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_download_failure_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/images/a.jpg"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let config = make_test_config();
        let session = PageSession::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let result = session.download(&format!("{}/images/a.jpg", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::Status(403))));
    }

    #[tokio::test]
    async fn test_base_url_default() {
        let config = Config::default();
        let session = PageSession::new(&config).unwrap();
        assert_eq!(session.base_url(), "https://www.amazon.com");
    }

    #[tokio::test]
    async fn test_base_url_custom() {
        let config = make_test_config();
        let session =
            PageSession::with_base_url(&config, Some("http://custom.url".to_string())).unwrap();
        assert_eq!(session.base_url(), "http://custom.url");
    }

    #[tokio::test]
    async fn test_factory_acquires_fresh_session() {
        let config = make_test_config();
        let factory = WreqSessionFactory::with_base_url(config, "http://localhost".to_string());

        let first = factory.acquire().await;
        let second = factory.acquire().await;
        assert!(first.is_ok());
        assert!(second.is_ok());
    }

    #[test]
    fn test_fetch_error_display() {
        assert!(FetchError::Timeout(Duration::from_secs(10)).to_string().contains("timed out"));
        assert!(FetchError::Status(503).to_string().contains("503"));
        assert!(FetchError::Transport("refused".to_string()).to_string().contains("refused"));
    }
}
