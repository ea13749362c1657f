//! Daemon startup errors.
//!
//! Everything here is fatal: the daemon refuses to enter the event loop
//! on a broken configuration or an unreachable collaborator.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("{_0} is unreachable")]
    Connectivity(#[error(not(source))] &'static str),
    #[display("could not watch the intake directory")]
    Watch,
}
