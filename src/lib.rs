pub mod aws;
pub mod config;
pub mod deploy;
pub mod domain;
pub mod error;
pub mod exports;
pub mod output;
pub mod plan;
pub mod policy;
pub mod provider;
pub mod regions;
pub mod resources;


pub use config::StackConfig;
pub use error::{Error, Result};
pub use exports::Exports;
pub use plan::Plan;
pub use resources::{CertificateSource, StaticWebsite};
