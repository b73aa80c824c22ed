pub mod get;
pub mod get_iam_policy;
pub mod set_iam_policy;
