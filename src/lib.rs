pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod invoice;
pub mod journal;
pub mod program;
pub mod query;
pub mod registry;
pub mod revision;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

pub use command::Command;
pub use config::{CapacityPolicy, ServiceConfig};
pub use error::LedgerError;
pub use identity::{CertificateIdentity, Credential, Identity, IdentityProvider, Role};
pub use service::FinancingService;
pub use types::Outcome;
