//! Maps command tokens to lifecycle operations and renders a one line result.
//!
//! The rendered strings are matched verbatim by callers that parse the output, so each
//! [`Outcome`] renders to a fixed phrase.

use std::fmt;
use std::str::FromStr;

use strum::IntoEnumIterator;
use tracing::{debug, error};

use crate::backend::{ScmBackend, SystemBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::DispatcherConfig;
use crate::controller::ServiceController;
use crate::service::ServiceState;
use crate::{Error, Result};

/// A recognized command token.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Command {
    Install,
    Uninstall,
    Start,
    Stop,
    Status,
    #[strum(to_string = "is-installed", serialize = "isinstalled")]
    IsInstalled,
}

impl Command {
    /// Parse a token case-insensitively, with or without a leading `-`.
    pub fn parse(token: &str) -> Option<Command> {
        Command::from_str(token.trim().trim_start_matches('-')).ok()
    }
}

/// The result of one request.
#[derive(Debug)]
pub enum Outcome {
    InstalledAndStarted,
    InstallationFailed,
    Started,
    FailedToStart,
    Stopped,
    FailedToStop,
    Uninstalled,
    Status(ServiceState),
    Installed(bool),
    Usage(String),
    Failed(Error),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            Outcome::InstallationFailed
                | Outcome::FailedToStart
                | Outcome::FailedToStop
                | Outcome::Usage(_)
                | Outcome::Failed(_)
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InstalledAndStarted => f.write_str("Service installed and started successfully"),
            Outcome::InstallationFailed => f.write_str("Service installation failed"),
            Outcome::Started => f.write_str("Service started successfully"),
            Outcome::FailedToStart => f.write_str("Service failed to start"),
            Outcome::Stopped => f.write_str("Service stopped successfully"),
            Outcome::FailedToStop => f.write_str("Service failed to stop"),
            Outcome::Uninstalled => f.write_str("Service Uninstalled, please Reboot"),
            Outcome::Status(state) => write!(f, "{state}"),
            Outcome::Installed(true) => f.write_str("The service is installed"),
            Outcome::Installed(false) => f.write_str("The service is not installed"),
            Outcome::Usage(usage) => f.write_str(usage),
            Outcome::Failed(e) => write!(f, "{e}"),
        }
    }
}

pub struct Dispatcher<B = SystemBackend, C = SystemClock> {
    controller: ServiceController<B, C>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Dispatcher for the service control manager of the local machine.
    pub fn system(config: DispatcherConfig) -> Self {
        Dispatcher::new(ServiceController::system(), config)
    }
}

impl<B: ScmBackend, C: Clock> Dispatcher<B, C> {
    pub fn new(controller: ServiceController<B, C>, config: DispatcherConfig) -> Self {
        Dispatcher { controller, config }
    }

    pub fn controller(&self) -> &ServiceController<B, C> {
        &self.controller
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run `command` against `service_name` and render the result.
    ///
    /// Never fails: errors are rendered as their description and unrecognized commands render
    /// the usage listing.
    pub fn handle_request(
        &self,
        command: Option<&str>,
        service_name: &str,
        display_name: &str,
        arguments: &[String],
    ) -> String {
        self.dispatch(command, service_name, display_name, arguments)
            .to_string()
    }

    /// Like [`handle_request`](Dispatcher::handle_request), returning the structured outcome.
    pub fn dispatch(
        &self,
        command: Option<&str>,
        service_name: &str,
        display_name: &str,
        arguments: &[String],
    ) -> Outcome {
        let Some(command) = command.and_then(Command::parse) else {
            debug!(?command, "Unrecognized command");
            return Outcome::Usage(self.usage());
        };
        debug!(%command, service = service_name, "Handling service command");

        match self.run(command, service_name, display_name, arguments) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%command, service = service_name, "Service command failed: {e}");
                Outcome::Failed(e)
            }
        }
    }

    fn run(
        &self,
        command: Command,
        service_name: &str,
        display_name: &str,
        arguments: &[String],
    ) -> Result<Outcome> {
        let status = self.controller.status(service_name)?;

        let outcome = match command {
            Command::Install => match status {
                ServiceState::NotFound => {
                    let executable = match self.config.executable.resolve() {
                        Ok(path) => path,
                        Err(e) => {
                            error!("Not installing {service_name}: {e}");
                            return Ok(Outcome::InstallationFailed);
                        }
                    };
                    self.controller.install_and_start(
                        service_name,
                        display_name,
                        &executable,
                        arguments,
                    )?;
                    if self.settled_status(service_name)? == ServiceState::Running {
                        Outcome::InstalledAndStarted
                    } else {
                        Outcome::InstallationFailed
                    }
                }
                ServiceState::Running => Outcome::Started,
                _ => self.start(service_name)?,
            },
            Command::Uninstall => {
                self.controller.uninstall(service_name)?;
                Outcome::Uninstalled
            }
            Command::Start => self.start(service_name)?,
            Command::Stop => {
                self.controller.stop_service(service_name)?;
                if self.settled_status(service_name)? == ServiceState::Stopped {
                    Outcome::Stopped
                } else {
                    Outcome::FailedToStop
                }
            }
            Command::Status => Outcome::Status(status),
            Command::IsInstalled => Outcome::Installed(self.controller.is_installed(service_name)?),
        };
        Ok(outcome)
    }

    fn start(&self, service_name: &str) -> Result<Outcome> {
        self.controller.start_service(service_name)?;
        if self.settled_status(service_name)? == ServiceState::Running {
            Ok(Outcome::Started)
        } else {
            Ok(Outcome::FailedToStart)
        }
    }

    fn settled_status(&self, service_name: &str) -> Result<ServiceState> {
        self.controller.clock().sleep(self.config.settle_delay);
        self.controller.status(service_name)
    }

    /// The listing rendered for unrecognized commands.
    pub fn usage(&self) -> String {
        let mut usage = String::from("Valid Service Arguments are:\n");
        for command in Command::iter() {
            usage.push_str(&command.to_string());
            usage.push('\n');
        }
        if !self.config.additional_usage.is_empty() {
            usage.push_str("Additional Arguments:\n");
            for line in &self.config.additional_usage {
                usage.push_str(line);
                usage.push('\n');
            }
        }
        usage
    }
}
