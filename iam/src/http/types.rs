use serde_json::{Map, Value};

/// An Identity and Access Management (IAM) policy, which specifies access
/// controls for Google Cloud resources.
///
/// A `Policy` is a collection of `bindings`. A `binding` binds one or more
/// `members`, or principals, to a single `role`.
///
/// **JSON example:**
///
///     {
///       "bindings": [
///         {
///           "role": "roles/iam.serviceAccountTokenCreator",
///           "members": [
///             "serviceAccount:svc-a@proj-x.iam.gserviceaccount.com"
///           ]
///         }
///       ],
///       "etag": "BwWWja0YfJA=",
///       "version": 1
///     }
///
/// Fields this library does not model are kept in `extra` and written back unchanged.
#[derive(Clone, PartialEq, serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Specifies the format of the policy.
    ///
    /// Valid values are `0`, `1`, and `3`. Any operation that affects conditional
    /// role bindings must specify version `3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    /// Associates a list of `members`, or principals, with a `role`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
    /// Specifies cloud audit logging configuration for this policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_configs: Vec<AuditConfig>,
    /// `etag` is used for optimistic concurrency control. It is returned by
    /// `getIamPolicy` and round-tripped on `setIamPolicy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Associates `members`, or principals, with a `role`.
#[derive(Clone, PartialEq, serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Role that is assigned to the list of `members`, or principals.
    /// For example, `roles/iam.serviceAccountTokenCreator`.
    pub role: String,
    /// Specifies the principals requesting access for a Google Cloud resource.
    ///
    /// * `serviceAccount:{emailid}`: An email address that represents a service
    ///   account. For example, `my-other-app@appspot.gserviceaccount.com`.
    ///
    /// * `serviceAccount:{projectid}.svc.id.goog[{namespace}/{kubernetes-sa}]`: An
    ///   identifier for a Kubernetes service account.
    ///
    /// * `user:{emailid}`, `group:{emailid}`, `domain:{domain}` and the
    ///   `deleted:` forms are passed through untouched.
    #[serde(default)]
    pub members: Vec<String>,
    /// The condition that is associated with this binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expr>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Represents a textual expression in the Common Expression Language (CEL) syntax.
#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Expr {
    /// Textual representation of an expression in Common Expression Language syntax.
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Specifies the audit configuration for a service.
#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Specifies a service that will be enabled for audit logging, or `allServices`.
    pub service: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_log_configs: Vec<AuditLogConfig>,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogConfig {
    /// `ADMIN_READ`, `DATA_WRITE` or `DATA_READ`.
    pub log_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exempted_members: Vec<String>,
}

/// A service account resource.
#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// The resource name of the service account,
    /// `projects/{PROJECT_ID}/serviceAccounts/{EMAIL_ADDRESS}`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_client_id: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}
