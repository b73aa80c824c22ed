use async_trait::async_trait;

use crate::error::Error;
use crate::http::error::Error as HttpError;
use crate::http::service_account::get_iam_policy::GetIamPolicyRequest;
use crate::http::service_account::set_iam_policy::SetIamPolicyRequest;
use crate::http::service_account_client::ServiceAccountClient;
use crate::http::types::{Binding, Policy};
use crate::resource::{
    new_binding, service_account_email_member, service_account_kubernetes_member, service_account_resource,
    ServiceAccountRole,
};

/// Remote store holding one IAM policy document per resource path.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn fetch_policy(&self, resource: &str) -> Result<Policy, HttpError>;

    /// Replaces the whole policy document and returns the server's canonical version of it.
    async fn write_policy(&self, resource: &str, policy: Policy) -> Result<Policy, HttpError>;
}

#[async_trait]
impl PolicyStore for ServiceAccountClient {
    async fn fetch_policy(&self, resource: &str) -> Result<Policy, HttpError> {
        self.get_iam_policy(resource, &GetIamPolicyRequest::default()).await
    }

    async fn write_policy(&self, resource: &str, policy: Policy) -> Result<Policy, HttpError> {
        let req = SetIamPolicyRequest {
            policy,
            update_mask: None,
        };
        self.set_iam_policy(resource, &req).await
    }
}

/// Reads and writes service account policies, tagging failures with the operation that failed.
///
/// Every call is a single attempt. Retrying is up to the caller.
#[derive(Debug, Clone)]
pub struct ServiceAccountPolicyManager<S> {
    store: S,
}

impl<S: PolicyStore> ServiceAccountPolicyManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn get_policy(&self, resource: &str) -> Result<Policy, Error> {
        self.store.fetch_policy(resource).await.map_err(Error::GetPolicy)
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn set_policy(&self, resource: &str, policy: Policy) -> Result<Policy, Error> {
        self.store.write_policy(resource, policy).await.map_err(Error::SetPolicy)
    }
}

/// Grants and revokes roles on a service account's own IAM policy.
///
/// Each operation fetches the current policy, mutates it in memory and writes the whole document back,
/// including the etag it was fetched with. The service rejects that write if the policy changed in
/// between. No retry and no further precondition is added, so a concurrent mutation fails with a
/// conflict, and a write without an etag can still overwrite one. Serialize mutations per resource
/// path if that matters.
#[derive(Debug, Clone)]
pub struct ServiceAccountPolicyBinder<S> {
    project: String,
    manager: ServiceAccountPolicyManager<S>,
}

impl<S: PolicyStore> ServiceAccountPolicyBinder<S> {
    pub fn new(project: impl Into<String>, manager: ServiceAccountPolicyManager<S>) -> Self {
        Self {
            project: project.into(),
            manager,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Binds the service account's own identity to `role` on its policy.
    ///
    /// Binding a member that is already present leaves the document untouched.
    pub async fn add_role(&self, name: &str, role: &ServiceAccountRole) -> Result<Policy, Error> {
        let resource = service_account_resource(name, &self.project);
        let binding = new_binding(role, service_account_email_member(name, &self.project));
        self.add_policy_binding(&resource, binding).await
    }

    /// Binds a Kubernetes service account to `role` on the policy of the service account `name`.
    pub async fn add_kubernetes_role(
        &self,
        name: &str,
        namespace: &str,
        kubernetes_name: &str,
        role: &ServiceAccountRole,
    ) -> Result<Policy, Error> {
        let resource = service_account_resource(name, &self.project);
        let binding = new_binding(
            role,
            service_account_kubernetes_member(kubernetes_name, namespace, &self.project),
        );
        self.add_policy_binding(&resource, binding).await
    }

    /// Drops every binding for `role` from the service account's policy.
    ///
    /// The whole binding goes, including any other members that held the role.
    pub async fn remove_role(&self, name: &str, role: &ServiceAccountRole) -> Result<Policy, Error> {
        let resource = service_account_resource(name, &self.project);
        self.remove_policy_role_binding(&resource, role).await
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn add_policy_binding(&self, resource: &str, binding: Binding) -> Result<Policy, Error> {
        let mut policy = self.manager.get_policy(resource).await?;
        let added = add_binding(&mut policy, binding);
        tracing::debug!("adding binding to {resource}: {added} member(s) added");
        self.manager.set_policy(resource, policy).await
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn remove_policy_role_binding(&self, resource: &str, role: &ServiceAccountRole) -> Result<Policy, Error> {
        let mut policy = self.manager.get_policy(resource).await?;
        let removed = remove_role_bindings(&mut policy, role.as_str());
        tracing::debug!("removing {role} from {resource}: {removed} binding(s) removed");
        self.manager.set_policy(resource, policy).await
    }

    /// Removes only the members listed in `binding` from the bindings matching its role.
    ///
    /// Matching bindings stay in the policy even when they end up empty.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn remove_policy_role_member_binding(&self, resource: &str, binding: &Binding) -> Result<Policy, Error> {
        let mut policy = self.manager.get_policy(resource).await?;
        let removed = remove_role_members(&mut policy, binding);
        tracing::debug!("removing members of {} from {resource}: {removed} member(s) removed", binding.role);
        self.manager.set_policy(resource, policy).await
    }
}

/// Adds the members of `binding` to every binding of the same role, keeping their order.
///
/// Members already present are skipped. If no binding holds the role yet, `binding` is appended as is.
/// Returns the number of members added.
pub fn add_binding(policy: &mut Policy, binding: Binding) -> usize {
    let mut found = false;
    let mut added = 0;
    for b in policy.bindings.iter_mut().filter(|b| b.role == binding.role) {
        found = true;
        for member in &binding.members {
            if !b.members.contains(member) {
                b.members.push(member.clone());
                added += 1;
            }
        }
    }
    if !found {
        added = binding.members.len();
        policy.bindings.push(binding);
    }
    added
}

/// Removes every binding for `role`. Returns the number of bindings removed.
pub fn remove_role_bindings(policy: &mut Policy, role: &str) -> usize {
    let before = policy.bindings.len();
    policy.bindings.retain(|b| b.role != role);
    before - policy.bindings.len()
}

/// Removes the members of `binding` from every binding of the same role. Returns the number of members removed.
pub fn remove_role_members(policy: &mut Policy, binding: &Binding) -> usize {
    let mut removed = 0;
    for b in policy.bindings.iter_mut().filter(|b| b.role == binding.role) {
        let before = b.members.len();
        b.members.retain(|m| !binding.members.contains(m));
        removed += before - b.members.len();
    }
    removed
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::test::response;
    use crate::error::{is_not_found, Error};
    use crate::http::error::Error as HttpError;
    use crate::http::types::{Binding, Policy};
    use crate::policy::{
        add_binding, remove_role_bindings, remove_role_members, PolicyStore, ServiceAccountPolicyBinder,
        ServiceAccountPolicyManager,
    };
    use crate::resource::{
        new_binding, service_account_email_member, service_account_kubernetes_member, service_account_resource,
        token_creator_role_binding, ServiceAccountRole,
    };

    const NAME: &str = "svc-a";
    const PROJECT: &str = "proj-x";

    #[ctor::ctor]
    fn init() {
        let _ = tracing_subscriber::fmt().with_env_filter("google_cloud_iam=trace").try_init();
    }

    /// Keeps one policy in memory and records what the binder writes back.
    #[derive(Default)]
    pub(crate) struct FakePolicyStore {
        policy: Mutex<Policy>,
        fetch_error: Option<u16>,
        write_error: Option<u16>,
        fetched: Mutex<Vec<String>>,
        written: Mutex<Vec<(String, Policy)>>,
    }

    impl FakePolicyStore {
        pub(crate) fn new(policy: Policy) -> Self {
            Self {
                policy: Mutex::new(policy),
                ..Default::default()
            }
        }

        fn current(&self) -> Policy {
            self.policy.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PolicyStore for FakePolicyStore {
        async fn fetch_policy(&self, resource: &str) -> Result<Policy, HttpError> {
            self.fetched.lock().unwrap().push(resource.to_string());
            match self.fetch_error {
                Some(code) => Err(response(code)),
                None => Ok(self.current()),
            }
        }

        async fn write_policy(&self, resource: &str, mut policy: Policy) -> Result<Policy, HttpError> {
            if let Some(code) = self.write_error {
                return Err(response(code));
            }
            self.written.lock().unwrap().push((resource.to_string(), policy.clone()));
            // the server assigns a fresh etag on every write
            policy.etag = Some(format!("etag-{}", self.written.lock().unwrap().len()));
            *self.policy.lock().unwrap() = policy.clone();
            Ok(policy)
        }
    }

    fn binder(store: FakePolicyStore) -> ServiceAccountPolicyBinder<FakePolicyStore> {
        ServiceAccountPolicyBinder::new(PROJECT, ServiceAccountPolicyManager::new(store))
    }

    fn store(binder: &ServiceAccountPolicyBinder<FakePolicyStore>) -> &FakePolicyStore {
        &binder.manager.store
    }

    fn binding(role: &str, members: &[&str]) -> Binding {
        Binding {
            role: role.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_role_to_empty_policy() {
        let binder = binder(FakePolicyStore::default());
        let policy = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(policy.bindings, vec![token_creator_role_binding(NAME, PROJECT)]);
        assert_eq!(
            policy.bindings[0].members,
            vec!["serviceAccount:svc-a@proj-x.iam.gserviceaccount.com".to_string()]
        );
        let written = store(&binder).written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, "projects/proj-x/serviceAccounts/svc-a@proj-x.iam.gserviceaccount.com");
    }

    #[tokio::test]
    async fn test_add_role_appends_member_to_existing_binding() {
        let other = binding("roles/viewer", &["user:eve@example.com"]);
        let existing = binding("roles/iam.serviceAccountTokenCreator", &["serviceAccount:something"]);
        let binder = binder(FakePolicyStore::new(Policy {
            bindings: vec![existing, other.clone()],
            ..Default::default()
        }));
        let policy = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(
            policy.bindings,
            vec![
                binding(
                    "roles/iam.serviceAccountTokenCreator",
                    &["serviceAccount:something", "serviceAccount:svc-a@proj-x.iam.gserviceaccount.com"]
                ),
                other,
            ]
        );
    }

    #[tokio::test]
    async fn test_add_role_is_idempotent() {
        let binder = binder(FakePolicyStore::default());
        let once = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        let twice = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(once.bindings, twice.bindings);
        assert_eq!(twice.bindings.len(), 1);
        assert_eq!(twice.bindings[0].members.len(), 1);

        // the second write still goes out, carrying the etag of the first
        let written = store(&binder).written.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].1.etag.as_deref(), Some("etag-1"));
    }

    #[tokio::test]
    async fn test_add_role_returns_server_version() {
        let binder = binder(FakePolicyStore::default());
        let policy = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(policy.etag.as_deref(), Some("etag-1"));
        assert!(store(&binder).written.lock().unwrap()[0].1.etag.is_none());
    }

    #[tokio::test]
    async fn test_add_role_keeps_metadata() {
        let mut initial = Policy {
            version: Some(1),
            etag: Some("BwWWja0YfJA=".to_string()),
            bindings: vec![binding("roles/viewer", &["user:eve@example.com"])],
            ..Default::default()
        };
        initial.extra.insert("futureField".to_string(), json!([1, 2]));
        let binder = binder(FakePolicyStore::new(initial.clone()));
        binder.add_role(NAME, &ServiceAccountRole::WORKLOAD_IDENTITY_USER).await.unwrap();

        let written = store(&binder).written.lock().unwrap();
        let sent = &written[0].1;
        assert_eq!(sent.version, initial.version);
        assert_eq!(sent.etag, initial.etag);
        assert_eq!(sent.extra, initial.extra);
        assert_eq!(sent.bindings[0], initial.bindings[0]);
        assert_eq!(sent.bindings[1].role, "roles/iam.workloadIdentityUser");
    }

    #[tokio::test]
    async fn test_add_kubernetes_role() {
        let binder = binder(FakePolicyStore::default());
        let policy = binder
            .add_kubernetes_role(NAME, "team-a", "airflow", &ServiceAccountRole::WORKLOAD_IDENTITY_USER)
            .await
            .unwrap();
        assert_eq!(
            policy.bindings,
            vec![binding(
                "roles/iam.workloadIdentityUser",
                &["serviceAccount:proj-x.svc.id.goog[team-a/airflow]"]
            )]
        );
        assert_eq!(store(&binder).written.lock().unwrap()[0].0, service_account_resource(NAME, PROJECT));
    }

    #[tokio::test]
    async fn test_remove_role_drops_whole_binding() {
        let other = binding("roles/viewer", &["user:eve@example.com"]);
        let binder = binder(FakePolicyStore::new(Policy {
            bindings: vec![
                binding(
                    "roles/iam.serviceAccountTokenCreator",
                    &["serviceAccount:other@proj-x.iam.gserviceaccount.com"],
                ),
                other.clone(),
            ],
            ..Default::default()
        }));
        let policy = binder.remove_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(policy.bindings, vec![other]);
    }

    #[tokio::test]
    async fn test_remove_role_without_match_is_noop() {
        let initial = Policy {
            version: Some(1),
            bindings: vec![
                binding("roles/viewer", &["user:eve@example.com"]),
                binding("roles/editor", &["user:bob@example.com", "user:alice@example.com"]),
            ],
            ..Default::default()
        };
        let binder = binder(FakePolicyStore::new(initial.clone()));
        binder.remove_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(store(&binder).written.lock().unwrap()[0].1, initial);
    }

    #[tokio::test]
    async fn test_remove_role_drops_every_matching_binding() {
        let viewer = binding("roles/viewer", &["user:eve@example.com"]);
        let binder = binder(FakePolicyStore::new(Policy {
            bindings: vec![
                binding("roles/iam.serviceAccountTokenCreator", &["user:a@example.com"]),
                viewer.clone(),
                binding("roles/iam.serviceAccountTokenCreator", &["user:b@example.com"]),
            ],
            ..Default::default()
        }));
        let policy = binder.remove_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(policy.bindings, vec![viewer.clone()]);
        assert_eq!(store(&binder).written.lock().unwrap()[0].1.bindings, vec![viewer]);
    }

    #[tokio::test]
    async fn test_add_role_fills_every_matching_binding() {
        let member = service_account_email_member(NAME, PROJECT);
        let binder = binder(FakePolicyStore::new(Policy {
            bindings: vec![
                binding("roles/iam.serviceAccountTokenCreator", &[member.as_str()]),
                binding("roles/viewer", &["user:eve@example.com"]),
                binding("roles/iam.serviceAccountTokenCreator", &["user:a@example.com"]),
            ],
            ..Default::default()
        }));
        let policy = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
        assert_eq!(
            policy.bindings,
            vec![
                binding("roles/iam.serviceAccountTokenCreator", &[member.as_str()]),
                binding("roles/viewer", &["user:eve@example.com"]),
                binding("roles/iam.serviceAccountTokenCreator", &["user:a@example.com", member.as_str()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_then_remove_scenario() {
        let binder = binder(FakePolicyStore::default());
        let role = ServiceAccountRole::TOKEN_CREATOR;
        let first = binder.add_role(NAME, &role).await.unwrap();
        assert_eq!(
            serde_json::to_value(&first.bindings).unwrap(),
            json!([{
                "role": "roles/iam.serviceAccountTokenCreator",
                "members": ["serviceAccount:svc-a@proj-x.iam.gserviceaccount.com"]
            }])
        );
        let second = binder.add_role(NAME, &role).await.unwrap();
        assert_eq!(first.bindings, second.bindings);
        let removed = binder.remove_role(NAME, &role).await.unwrap();
        assert!(removed.bindings.is_empty());
    }

    #[tokio::test]
    async fn test_get_failure_aborts_without_write() {
        let binder = binder(FakePolicyStore {
            fetch_error: Some(404),
            ..Default::default()
        });
        let err = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap_err();
        assert!(matches!(err, Error::GetPolicy(_)));
        // a missing account is not translated during mutations, but stays classifiable
        assert!(is_not_found(&err));
        assert!(store(&binder).written.lock().unwrap().is_empty());

        let err = binder.remove_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap_err();
        assert!(matches!(err, Error::GetPolicy(_)));
    }

    #[tokio::test]
    async fn test_set_failure_propagates() {
        let initial = Policy {
            bindings: vec![binding("roles/viewer", &["user:eve@example.com"])],
            ..Default::default()
        };
        let binder = binder(FakePolicyStore {
            write_error: Some(409),
            ..FakePolicyStore::new(initial.clone())
        });
        let err = binder.add_role(NAME, &ServiceAccountRole::TOKEN_CREATOR).await.unwrap_err();
        assert!(matches!(err, Error::SetPolicy(HttpError::Response(ref r)) if r.code == 409));
        assert_eq!(err.to_string(), "setting service account policy: status 409");
        assert_eq!(store(&binder).current(), initial);
    }

    #[tokio::test]
    async fn test_remove_policy_role_member_binding() {
        let member = service_account_email_member(NAME, PROJECT);
        let binder = binder(FakePolicyStore::new(Policy {
            bindings: vec![
                binding("roles/iam.serviceAccountTokenCreator", &["user:eve@example.com", member.as_str()]),
                binding("roles/iam.workloadIdentityUser", &[member.as_str()]),
            ],
            ..Default::default()
        }));
        let resource = service_account_resource(NAME, PROJECT);
        let policy = binder
            .remove_policy_role_member_binding(&resource, &token_creator_role_binding(NAME, PROJECT))
            .await
            .unwrap();
        assert_eq!(
            policy.bindings,
            vec![
                binding("roles/iam.serviceAccountTokenCreator", &["user:eve@example.com"]),
                binding("roles/iam.workloadIdentityUser", &[member.as_str()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_manager_reads_requested_resource() {
        let manager = ServiceAccountPolicyManager::new(FakePolicyStore::default());
        let resource = service_account_resource(NAME, PROJECT);
        manager.get_policy(&resource).await.unwrap();
        assert_eq!(*manager.store.fetched.lock().unwrap(), vec![resource]);
    }

    #[test]
    fn test_add_binding_mutates_every_matching_binding() {
        let mut policy = Policy {
            bindings: vec![
                binding("roles/iam.serviceAccountTokenCreator", &["user:a@example.com"]),
                binding("roles/viewer", &["user:b@example.com"]),
                binding("roles/iam.serviceAccountTokenCreator", &["user:c@example.com"]),
            ],
            ..Default::default()
        };
        let added = add_binding(
            &mut policy,
            new_binding(&ServiceAccountRole::TOKEN_CREATOR, "user:d@example.com"),
        );
        assert_eq!(added, 2);
        assert_eq!(
            policy.bindings,
            vec![
                binding("roles/iam.serviceAccountTokenCreator", &["user:a@example.com", "user:d@example.com"]),
                binding("roles/viewer", &["user:b@example.com"]),
                binding("roles/iam.serviceAccountTokenCreator", &["user:c@example.com", "user:d@example.com"]),
            ]
        );
    }

    #[test]
    fn test_add_binding_with_several_members() {
        let mut policy = Policy {
            bindings: vec![binding("roles/viewer", &["user:a@example.com"])],
            ..Default::default()
        };
        let added = add_binding(
            &mut policy,
            binding("roles/viewer", &["user:a@example.com", "user:b@example.com", "user:c@example.com"]),
        );
        assert_eq!(added, 2);
        assert_eq!(
            policy.bindings[0].members,
            vec!["user:a@example.com", "user:b@example.com", "user:c@example.com"]
        );
    }

    #[test]
    fn test_role_match_is_exact() {
        let mut policy = Policy {
            bindings: vec![binding("roles/IAM.serviceAccountTokenCreator", &["user:a@example.com"])],
            ..Default::default()
        };
        assert_eq!(remove_role_bindings(&mut policy, "roles/iam.serviceAccountTokenCreator"), 0);
        add_binding(&mut policy, token_creator_role_binding(NAME, PROJECT));
        assert_eq!(policy.bindings.len(), 2);
    }

    #[test]
    fn test_remove_role_members_keeps_other_roles() {
        let member = service_account_kubernetes_member("airflow", "team-a", PROJECT);
        let mut policy = Policy {
            bindings: vec![
                binding("roles/viewer", &[member.as_str()]),
                binding("roles/iam.workloadIdentityUser", &[member.as_str()]),
            ],
            ..Default::default()
        };
        let removed = remove_role_members(
            &mut policy,
            &new_binding(&ServiceAccountRole::WORKLOAD_IDENTITY_USER, member.clone()),
        );
        assert_eq!(removed, 1);
        assert_eq!(policy.bindings[0].members, vec![member]);
        assert!(policy.bindings[1].members.is_empty());
    }
}
