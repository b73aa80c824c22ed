use std::borrow::Cow;
use std::fmt;

use crate::http::types::Binding;

/// A role that can be bound on a service account's policy.
///
/// Roles compare by exact string value. No normalization is applied.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ServiceAccountRole(Cow<'static, str>);

impl ServiceAccountRole {
    /// Allows principals to mint OAuth2 access tokens for the service account.
    pub const TOKEN_CREATOR: ServiceAccountRole =
        ServiceAccountRole(Cow::Borrowed("roles/iam.serviceAccountTokenCreator"));

    /// Allows Kubernetes service accounts to impersonate the service account through workload identity.
    pub const WORKLOAD_IDENTITY_USER: ServiceAccountRole =
        ServiceAccountRole(Cow::Borrowed("roles/iam.workloadIdentityUser"));

    pub fn new(role: impl Into<String>) -> Self {
        Self(Cow::Owned(role.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceAccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceAccountRole {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the fully qualified resource name of a service account.
///
/// See <https://cloud.google.com/iam/docs/reference/rest/v1/projects.serviceAccounts/getIamPolicy>
pub fn service_account_resource(name: &str, project: &str) -> String {
    format!("projects/{project}/serviceAccounts/{}", service_account_email(name, project))
}

pub fn service_account_email(name: &str, project: &str) -> String {
    format!("{name}@{project}.iam.gserviceaccount.com")
}

/// Member reference for the service account itself, e.g. `serviceAccount:svc@proj.iam.gserviceaccount.com`.
pub fn service_account_email_member(name: &str, project: &str) -> String {
    format!("serviceAccount:{}", service_account_email(name, project))
}

/// Member reference for a Kubernetes service account federated through workload identity.
pub fn service_account_kubernetes_member(name: &str, namespace: &str, project: &str) -> String {
    format!("serviceAccount:{project}.svc.id.goog[{namespace}/{name}]")
}

pub fn new_binding(role: &ServiceAccountRole, member: impl Into<String>) -> Binding {
    Binding {
        role: role.to_string(),
        members: vec![member.into()],
        ..Default::default()
    }
}

/// Binds the service account's own identity to the token creator role.
pub fn token_creator_role_binding(name: &str, project: &str) -> Binding {
    new_binding(
        &ServiceAccountRole::TOKEN_CREATOR,
        service_account_email_member(name, project),
    )
}
