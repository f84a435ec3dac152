pub mod deployments;
pub mod dns;
pub mod error;
pub mod github;
pub mod maintenance;
pub mod projects;
pub mod settings;
pub mod stats;
