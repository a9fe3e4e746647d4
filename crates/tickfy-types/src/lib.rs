//! Shared constants and types for the Tickfy validator toolkit.
//!
//! Every other crate in the workspace depends on this one for chain
//! parameters, on-disk file names, local endpoint defaults, and the error
//! taxonomy used to report failures back to a caller.

pub mod constants;
pub mod kind;

pub use constants::Denom;
pub use kind::ErrorKind;
