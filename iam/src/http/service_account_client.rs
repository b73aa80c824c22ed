use std::sync::Arc;

use crate::http::error::Error;
use crate::http::iam_client::IamClient;
use crate::http::service_account;
use crate::http::service_account::get_iam_policy::GetIamPolicyRequest;
use crate::http::service_account::set_iam_policy::SetIamPolicyRequest;
use crate::http::types::{Policy, ServiceAccount};

#[derive(Debug, Clone)]
pub struct ServiceAccountClient {
    inner: Arc<IamClient>,
}

impl ServiceAccountClient {
    pub fn new(inner: Arc<IamClient>) -> Self {
        Self { inner }
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn get(&self, resource: &str) -> Result<ServiceAccount, Error> {
        let builder = service_account::get::build(self.inner.endpoint(), self.inner.http(), resource);
        self.inner.send(builder).await
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn get_iam_policy(&self, resource: &str, req: &GetIamPolicyRequest) -> Result<Policy, Error> {
        let builder = service_account::get_iam_policy::build(self.inner.endpoint(), self.inner.http(), resource, req);
        self.inner.send(builder).await
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn set_iam_policy(&self, resource: &str, req: &SetIamPolicyRequest) -> Result<Policy, Error> {
        let builder = service_account::set_iam_policy::build(self.inner.endpoint(), self.inner.http(), resource, req);
        self.inner.send(builder).await
    }
}
