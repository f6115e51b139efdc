//! A crate that lets an application register itself as a Windows service and drive that
//! service through its lifecycle: install, start, stop, query and uninstall.
//!
//! # Controlling a service
//!
//! All operations go through a [`ServiceController`], which owns a [`backend::ScmBackend`] (the
//! raw Service Control Manager primitives) and a [`clock::Clock`] used while waiting for a
//! service to leave a pending state.
//!
//! ```rust,no_run
//! use service_installer::{ServiceController, service::ServiceState};
//!
//! fn main() -> service_installer::Result<()> {
//!     let controller = ServiceController::system();
//!
//!     if controller.status("my_service")? != ServiceState::Running {
//!         controller.start_service("my_service")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Every handle acquired from the service manager is wrapped in a guard that releases it when
//! dropped, so an early return or an error never leaks a handle. A [`service::Service`] borrows
//! the [`service_manager::ServiceManager`] it was opened from and therefore can never outlive it.
//!
//! # Waiting for transitions
//!
//! Start and stop requests return as soon as the service manager accepts them. The controller
//! then polls the service status until it leaves the pending state, see [`wait`] for the exact
//! polling and stall detection rules.
//!
//! # Command surface
//!
//! [`Dispatcher`] maps a textual command (`install`, `uninstall`, `start`, `stop`, `status`,
//! `is-installed`) to the operations above and renders a one line, human readable result.
//!
//! ```rust,no_run
//! use service_installer::{Dispatcher, DispatcherConfig};
//!
//! let dispatcher = Dispatcher::system(
//!     DispatcherConfig::builder()
//!         .with_additional_usage("-Console  run in the foreground")
//!         .build(),
//! );
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! println!(
//!     "{}",
//!     dispatcher.handle_request(args.first().map(String::as_str), "my_service", "My Service", &[])
//! );
//! ```

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The service control manager could not be opened.
    #[error("Could not connect to service control manager: {0}")]
    ManagerUnreachable(#[source] io::Error),

    /// The service exists but could not be opened with the requested rights, or does not exist.
    #[error("Could not open service: {0}")]
    ServiceNotOpenable(#[source] io::Error),

    /// An operation that needs an existing service found none.
    #[error("Service not installed.")]
    ServiceNotInstalled,

    /// Neither opening an existing service nor creating a new one succeeded.
    #[error("Failed to install service: {0}")]
    ServiceCreationFailed(#[source] io::Error),

    /// The service manager rejected the deletion.
    #[error("Could not delete service {}", os_code(.0))]
    ServiceDeletionFailed(#[source] io::Error),

    /// The service did not reach the running state.
    #[error("Unable to start service")]
    ServiceFailedToStart,

    /// The service did not reach the stopped state.
    #[error("Unable to stop service")]
    ServiceFailedToStop,

    /// The status query primitive itself failed.
    #[error("Failed to query service status: {0}")]
    StatusQueryFailed(#[source] io::Error),

    /// The executable to register could not be located.
    #[error("Could not determine the service executable path: {0}")]
    ExecutablePathUnavailable(String),

    /// A name or argument contains an interior nul character.
    #[error("Invalid {0}: contains a nul character")]
    InvalidName(&'static str),
}

fn os_code(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => code.to_string(),
        None => err.to_string(),
    }
}

pub mod backend;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod process_path;
mod sc_handle;
pub mod service;
pub mod service_manager;
pub mod wait;

pub use config::{DispatcherConfig, ExecutableSource};
pub use controller::ServiceController;
pub use dispatcher::{Command, Dispatcher, Outcome};
