use std::sync::Arc;
use std::time::Duration;

use reqwest::Response;
use reqwest_middleware::{ClientWithMiddleware as Client, RequestBuilder};

use token_source::TokenSource;

use crate::http::error::{Error, ErrorWrapper};

pub const SCOPES: [&str; 1] = ["https://www.googleapis.com/auth/cloud-platform"];

#[derive(Debug, Clone)]
pub struct IamClient {
    ts: Arc<dyn TokenSource>,
    endpoint: String,
    http: Client,
    timeout: Option<Duration>,
    debug: bool,
}

impl IamClient {
    pub(crate) fn new(
        ts: Arc<dyn TokenSource>,
        endpoint: &str,
        http: Client,
        timeout: Option<Duration>,
        debug: bool,
    ) -> Self {
        Self {
            ts,
            endpoint: format!("{endpoint}/v1"),
            http,
            timeout,
            debug,
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    async fn with_headers(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = self.ts.token().await.map_err(Error::TokenSource)?;
        let builder = builder
            .header("X-Goog-Api-Client", "rust")
            .header(reqwest::header::USER_AGENT, "google-cloud-iam")
            .header(reqwest::header::AUTHORIZATION, token);
        // one deadline per round trip, retries are never attempted
        Ok(match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        })
    }

    pub async fn send<T>(&self, builder: RequestBuilder) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = self.with_headers(builder).await?;
        let response = request.send().await?;
        let body = Self::read_body(response).await?;
        if self.debug {
            tracing::info!("{}", body);
        }
        Ok(serde_json::from_str(body.as_str())?)
    }

    /// Reads the response body, turning a failed response into an error.
    ///
    /// A failed response becomes `Error::Response` when its body is the JSON error envelope and
    /// `Error::HttpClient` carrying the status otherwise.
    async fn read_body(response: Response) -> Result<String, Error> {
        let status_error = response.error_for_status_ref().err();
        let body = response.text().await?;
        match status_error {
            None => Ok(body),
            Some(error) => Err(match serde_json::from_str::<ErrorWrapper>(body.as_str()) {
                Ok(wrapper) => Error::Response(wrapper.error),
                Err(_) => Error::HttpClient(error),
            }),
        }
    }
}
