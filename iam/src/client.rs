use std::sync::Arc;
use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use token_source::{NoopTokenSourceProvider, TokenSourceProvider};

use crate::checker::ServiceAccountChecker;
use crate::http::iam_client::IamClient;
use crate::http::service_account_client::ServiceAccountClient;
use crate::policy::{ServiceAccountPolicyBinder, ServiceAccountPolicyManager};

#[derive(Debug)]
pub struct ClientConfig {
    pub http: ClientWithMiddleware,
    pub iam_endpoint: String,
    pub token_source_provider: Box<dyn TokenSourceProvider>,
    pub project_id: Option<String>,
    /// Deadline for a single round trip to the IAM service.
    pub timeout: Option<Duration>,
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http: ClientBuilder::new(reqwest::Client::default()).build(),
            iam_endpoint: "https://iam.googleapis.com".to_string(),
            token_source_provider: Box::new(NoopTokenSourceProvider {}),
            project_id: None,
            timeout: Some(Duration::from_secs(30)),
            debug: false,
        }
    }
}

#[cfg(feature = "auth")]
pub use google_cloud_auth;

#[cfg(feature = "auth")]
impl ClientConfig {
    pub async fn with_auth(self) -> Result<Self, google_cloud_auth::error::Error> {
        let ts = google_cloud_auth::token::DefaultTokenSourceProvider::new(Self::auth_config()).await?;
        Ok(self.with_token_source(ts))
    }

    pub async fn with_credentials(
        self,
        credentials: google_cloud_auth::credentials::CredentialsFile,
    ) -> Result<Self, google_cloud_auth::error::Error> {
        let ts = google_cloud_auth::token::DefaultTokenSourceProvider::new_with_credentials(
            Self::auth_config(),
            Box::new(credentials),
        )
        .await?;
        Ok(self.with_token_source(ts))
    }

    fn with_token_source(mut self, ts: google_cloud_auth::token::DefaultTokenSourceProvider) -> Self {
        if self.project_id.is_none() {
            self.project_id = ts.project_id.clone();
        }
        self.token_source_provider = Box::new(ts);
        self
    }

    fn auth_config() -> google_cloud_auth::project::Config<'static> {
        google_cloud_auth::project::Config::default().with_scopes(&crate::http::iam_client::SCOPES)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    service_account_client: ServiceAccountClient,
    project_id: String,
}

impl Client {
    /// New client
    pub fn new(config: ClientConfig) -> Self {
        let ts = config.token_source_provider.token_source();
        let client = Arc::new(IamClient::new(
            ts,
            config.iam_endpoint.as_str(),
            config.http,
            config.timeout,
            config.debug,
        ));
        Self {
            service_account_client: ServiceAccountClient::new(client),
            project_id: config.project_id.unwrap_or_default(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn service_account(&self) -> &ServiceAccountClient {
        &self.service_account_client
    }

    pub fn policy_manager(&self) -> ServiceAccountPolicyManager<ServiceAccountClient> {
        ServiceAccountPolicyManager::new(self.service_account_client.clone())
    }

    pub fn policy_binder(&self) -> ServiceAccountPolicyBinder<ServiceAccountClient> {
        ServiceAccountPolicyBinder::new(self.project_id.as_str(), self.policy_manager())
    }

    pub fn service_account_checker(&self) -> ServiceAccountChecker<ServiceAccountClient> {
        ServiceAccountChecker::new(self.project_id.as_str(), self.service_account_client.clone())
    }
}
