pub mod error;
pub mod iam_client;
pub mod service_account;
pub mod service_account_client;
pub mod types;
