//! PDF rendering seam.
//!
//! The core never produces PDF bytes itself — it hands the detail projection
//! to an external renderer service and surfaces failures as-is, unretried.

use async_trait::async_trait;
use thiserror::Error;

use crate::interview::models::InterviewDetail;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Renderer returned status {status}: {message}")]
    Service { status: u16, message: String },
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, detail: &InterviewDetail) -> Result<Vec<u8>, RenderError>;
}

/// Delegates rendering to an external HTTP service that accepts the detail
/// projection as JSON and responds with PDF bytes.
pub struct HttpPdfRenderer {
    client: reqwest::Client,
    render_url: String,
}

impl HttpPdfRenderer {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            render_url: format!("{}/render", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, detail: &InterviewDetail) -> Result<Vec<u8>, RenderError> {
        let response = self.client.post(&self.render_url).json(detail).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RenderError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
