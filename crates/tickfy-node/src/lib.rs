//! Tickfy node management.
//!
//! Installs the chain daemon, initialises its home, optionally provisions the
//! upgrade supervisor, and runs the daemon as a supervised child process with
//! its output captured into a bounded log. Validator operations shell out to
//! the daemon CLI using the active vault wallet.
//!
//! [`NodeService`] is the single entry point; the modules underneath are
//! public for callers that need finer control.

pub mod config;
pub mod error;
pub mod installer;
pub mod logs;
pub mod records;
pub mod service;
pub mod status;
pub mod supervisor;
pub mod tool;
pub mod upgrade;
pub mod validator;

pub use config::ServiceConfig;
pub use error::NodeError;
pub use logs::LogBuffer;
pub use records::{NodeConfig, UpgradeSupervisorConfig, ValidatorRecord};
pub use service::NodeService;
pub use status::AppStatus;
pub use supervisor::{LaunchSpec, SupervisionMode, Supervisor};
pub use validator::{StakingInfo, ValidatorParams};
