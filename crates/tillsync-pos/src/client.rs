//! HTTP client for the remote POS API.
//!
//! Wraps `reqwest` with POS-specific error handling. Sign-in exchanges a raw
//! credential blob for a bearer token (the POS answers 201 on success); the
//! three fetch endpoints take a `dd/mm/yyyy` window as query parameters and
//! authenticate with `X-User-Email` / `X-User-Token` headers.

use std::time::Duration;

use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use tillsync_core::DateWindow;

use crate::error::PosError;
use crate::types::{RawOrder, RawProductLine, RawSession};

const ORDERS_ENDPOINT: &str = "sale_orders";
const PRODUCTS_ENDPOINT: &str = "sale_products";
const SESSIONS_ENDPOINT: &str = "psessions";

#[derive(Debug, Deserialize)]
struct SignInResponse {
    authentication_token: String,
}

/// Client for the POS REST API.
///
/// One instance per run; the token returned by [`PosClient::sign_in`] is
/// treated as valid for the whole run and never refreshed mid-run.
pub struct PosClient {
    client: Client,
    base_url: Url,
}

impl PosClient {
    /// Creates a new client for the given POS base URL.
    ///
    /// # Errors
    ///
    /// Returns [`PosError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`PosError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, PosError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tillsync/0.1 (sales-sync)")
            .build()?;

        // Keep exactly one trailing slash so Url::join appends endpoint
        // segments instead of replacing the last path component.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PosError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Exchanges a credential blob for a bearer token.
    ///
    /// The blob is posted verbatim as the request body; its contents are
    /// opaque to this client and are never logged.
    ///
    /// # Errors
    ///
    /// - [`PosError::Unauthenticated`] when the POS answers anything but 201.
    /// - [`PosError::Http`] on transport failure.
    /// - [`PosError::Deserialize`] if the 201 body lacks a token.
    pub async fn sign_in(&self, credential: &str) -> Result<String, PosError> {
        let url = self.endpoint_url("users/sign_in");
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(credential.to_string())
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(PosError::Unauthenticated {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: SignInResponse =
            serde_json::from_str(&body).map_err(|e| PosError::Deserialize {
                context: "users/sign_in".to_string(),
                source: e,
            })?;

        Ok(parsed.authentication_token)
    }

    /// Fetches sale orders inside the window.
    ///
    /// # Errors
    ///
    /// See [`PosClient::fetch`].
    pub async fn fetch_orders(
        &self,
        email: &str,
        token: &str,
        window: &DateWindow,
    ) -> Result<Vec<RawOrder>, PosError> {
        self.fetch(ORDERS_ENDPOINT, email, token, window).await
    }

    /// Fetches order line items inside the window.
    ///
    /// # Errors
    ///
    /// See [`PosClient::fetch`].
    pub async fn fetch_product_lines(
        &self,
        email: &str,
        token: &str,
        window: &DateWindow,
    ) -> Result<Vec<RawProductLine>, PosError> {
        self.fetch(PRODUCTS_ENDPOINT, email, token, window).await
    }

    /// Fetches cash-register sessions inside the window.
    ///
    /// # Errors
    ///
    /// See [`PosClient::fetch`].
    pub async fn fetch_sessions(
        &self,
        email: &str,
        token: &str,
        window: &DateWindow,
    ) -> Result<Vec<RawSession>, PosError> {
        self.fetch(SESSIONS_ENDPOINT, email, token, window).await
    }

    /// Sends a windowed GET to one fetch endpoint and parses the JSON array.
    ///
    /// # Errors
    ///
    /// - [`PosError::UnexpectedStatus`] on any non-200 answer.
    /// - [`PosError::Http`] on transport failure.
    /// - [`PosError::Deserialize`] if the body is not an array of records.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        email: &str,
        token: &str,
        window: &DateWindow,
    ) -> Result<Vec<T>, PosError> {
        let mut url = self.endpoint_url(endpoint);
        url.query_pairs_mut()
            .append_pair("fromDate", &window.from_date)
            .append_pair("toDate", &window.to_date);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-User-Email", email)
            .header("X-User-Token", token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(PosError::UnexpectedStatus {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PosError::Deserialize {
            context: endpoint.to_string(),
            source: e,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Url {
        // base_url always ends in '/' and endpoints are known relative
        // segments, so join cannot fail.
        self.base_url
            .join(endpoint)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> PosClient {
        PosClient::new(base_url, 30).expect("client construction should not fail")
    }

    #[test]
    fn endpoint_url_appends_segment() {
        let client = test_client("https://pos.example.com");
        assert_eq!(
            client.endpoint_url("sale_orders").as_str(),
            "https://pos.example.com/sale_orders"
        );
    }

    #[test]
    fn trailing_slash_is_collapsed() {
        let client = test_client("https://pos.example.com///");
        assert_eq!(
            client.endpoint_url("psessions").as_str(),
            "https://pos.example.com/psessions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = PosClient::new("not a url", 30);
        assert!(matches!(result, Err(PosError::InvalidBaseUrl { .. })));
    }
}
