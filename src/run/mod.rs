//! Application-facing setup.

mod init;

pub use init::connect;
