pub mod config;
pub mod errors;
pub mod naming;
pub mod pstore;
pub mod telemetry;

pub use config::{PstoreConfig, SlsConfig};
pub use errors::{ApiError, PstoreError, Result, SlsError};
pub use naming::{Lambda, LambdaTrigger, Prefix, Service, ServiceLayout, to_lambda_trigger};
pub use pstore::{Client, MemoryParameterStore, ParameterApi, SsmApi};
