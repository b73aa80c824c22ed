#![allow(clippy::result_large_err)]
//! # google-cloud-iam
//!
//! Google Cloud Platform IAM client library for service account policies.
//!
//! ## Quick Start
//!
//! ### CreateClient
//!
//! The function `with_auth()` will try and read the credentials from a file specified in the environment variable `GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_APPLICATION_CREDENTIALS_JSON` or
//! from a metadata server.
//!
//! This is also described in [google-cloud-auth](https://github.com/yoshidan/google-cloud-rust/blob/main/foundation/auth/README.md)
//!
//! ```rust
//! use google_cloud_iam::client::{Client, ClientConfig};
//!
//! async fn run() {
//!     let config = ClientConfig::default().with_auth().await.unwrap();
//!     let client = Client::new(config);
//! }
//! ```
//!
//! ### Grant and revoke a role
//!
//! ```rust
//! use google_cloud_iam::client::Client;
//! use google_cloud_iam::resource::ServiceAccountRole;
//!
//! async fn run(client: &Client) {
//!     let binder = client.policy_binder();
//!     let policy = binder.add_role("svc-a", &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
//!     let policy = binder.remove_role("svc-a", &ServiceAccountRole::TOKEN_CREATOR).await.unwrap();
//! }
//! ```
//!
//! ### Check a service account
//!
//! ```rust
//! use google_cloud_iam::client::Client;
//!
//! async fn run(client: &Client) {
//!     if !client.service_account_checker().exists("svc-a").await.unwrap() {
//!         // provision it first
//!     }
//! }
//! ```
//!
//! Mutations are a read-modify-write of the whole policy document. The fetched etag is sent back
//! with the write, so the service rejects it if the policy changed in between. The client neither
//! retries such a conflict nor adds any precondition of its own, so callers should serialize
//! mutations per resource path.

pub mod checker;
pub mod client;
pub mod error;
pub mod http;
pub mod policy;
pub mod resource;
