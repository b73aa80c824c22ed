use async_trait::async_trait;

use crate::error::{is_not_found, Error};
use crate::http::error::Error as HttpError;
use crate::http::service_account_client::ServiceAccountClient;
use crate::http::types::ServiceAccount;
use crate::resource::service_account_resource;

/// Looks up a single service account by resource path.
///
/// An absent account must surface as a remote error carrying the `404` status.
#[async_trait]
pub trait ServiceAccountFetcher: Send + Sync {
    async fn fetch_service_account(&self, resource: &str) -> Result<ServiceAccount, HttpError>;
}

#[async_trait]
impl ServiceAccountFetcher for ServiceAccountClient {
    async fn fetch_service_account(&self, resource: &str) -> Result<ServiceAccount, HttpError> {
        self.get(resource).await
    }
}

#[derive(Debug, Clone)]
pub struct ServiceAccountChecker<F> {
    project: String,
    fetcher: F,
}

impl<F: ServiceAccountFetcher> ServiceAccountChecker<F> {
    pub fn new(project: impl Into<String>, fetcher: F) -> Self {
        Self {
            project: project.into(),
            fetcher,
        }
    }

    /// Reports whether the service account `name` exists in the configured project.
    ///
    /// A not found response is `Ok(false)`. Any other failure is returned as an error and says nothing
    /// about whether the account exists.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn exists(&self, name: &str) -> Result<bool, Error> {
        let resource = service_account_resource(name, &self.project);
        match self.fetcher.fetch_service_account(&resource).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => {
                tracing::debug!("service account {resource} not found");
                Ok(false)
            }
            Err(e) => Err(Error::GetServiceAccount(e)),
        }
    }
}
