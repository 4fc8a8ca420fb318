use super::types::*;
use super::PricingService;
use crate::errors::PricingFailure;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;

pub const BINOMIAL_PATH: &str = "/calculate";
pub const HO_LEE_PATH: &str = "/calculate/ho-lee";

/// Remote pricing service client. One call is one attempt: no retries.
#[derive(Clone)]
pub struct PricingClient {
    client: Client,
    base_url: String,
}

impl PricingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn price_binomial(&self, req: &BinomialRequest) -> Result<BinomialQuote, PricingFailure> {
        let url = format!("{}{}", self.base_url, BINOMIAL_PATH);
        let resp = self.client.post(&url).json(req).send().await?;
        read_json(resp, BINOMIAL_PATH).await
    }

    /// Sends the parameters as a JSON part named `params` and, if present,
    /// the uploaded file as a binary part named `term_structure`.
    pub async fn price_ho_lee(&self, req: &HoLeeRequest) -> Result<HoLeeQuote, PricingFailure> {
        let url = format!("{}{}", self.base_url, HO_LEE_PATH);

        let params = serde_json::to_string(&req.params)
            .map_err(|e| PricingFailure::Malformed(format!("encode params: {e}")))?;
        let mut form = Form::new().part(
            "params",
            Part::text(params).mime_str("application/json")?,
        );
        if let Some(upload) = &req.term_structure {
            form = form.part(
                "term_structure",
                Part::bytes(upload.content.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str("text/csv")?,
            );
        }

        let resp = self.client.post(&url).multipart(form).send().await?;
        read_json(resp, HO_LEE_PATH).await
    }
}

impl PricingService for PricingClient {
    async fn price(&self, request: &PricingRequest) -> Result<PricingQuote, PricingFailure> {
        match request {
            PricingRequest::Binomial(r) => self.price_binomial(r).await.map(PricingQuote::Binomial),
            PricingRequest::HoLee(r) => self.price_ho_lee(r).await.map(PricingQuote::HoLee),
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: Response, path: &str) -> Result<T, PricingFailure> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PricingFailure::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| PricingFailure::Malformed(format!("POST {path}: {e}")))
}
