use std::path::Path;

use tracing::{debug, info, warn};

use crate::backend::{self, ScmBackend, SystemBackend};
use crate::clock::{Clock, SystemClock};
use crate::service::{Service, ServiceAccess, ServiceInfo, ServiceState};
use crate::service_manager::{ServiceManager, ServiceManagerAccess};
use crate::wait;
use crate::{Error, Result};

/// Lifecycle operations and status queries for named services.
///
/// Each call opens the handles it needs and closes them before returning, nothing is held between
/// calls.
pub struct ServiceController<B = SystemBackend, C = SystemClock> {
    backend: B,
    clock: C,
}

impl ServiceController {
    /// Controller for the service control manager of the local machine.
    pub fn system() -> Self {
        ServiceController::new(backend::default_backend(), SystemClock::new())
    }
}

impl<B: ScmBackend, C: Clock> ServiceController<B, C> {
    pub fn new(backend: B, clock: C) -> Self {
        ServiceController { backend, clock }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn connect(&self, access: ServiceManagerAccess) -> Result<ServiceManager<'_, B>> {
        ServiceManager::connect(&self.backend, access)
    }

    /// Start an installed service and wait until it is running.
    pub fn start_service(&self, name: &str) -> Result<()> {
        let manager = self.connect(ServiceManagerAccess::CONNECT)?;
        let service =
            manager.open_service(name, ServiceAccess::QUERY_STATUS | ServiceAccess::START)?;
        info!(service = name, "Starting service");
        self.start_and_wait(&service)
    }

    /// Stop a service and wait until it has stopped.
    pub fn stop_service(&self, name: &str) -> Result<()> {
        let manager = self.connect(ServiceManagerAccess::CONNECT)?;
        let service =
            manager.open_service(name, ServiceAccess::QUERY_STATUS | ServiceAccess::STOP)?;
        info!(service = name, "Stopping service");
        self.stop_and_wait(&service)
    }

    /// Register the service unless it already exists, then start it and wait until it is
    /// running.
    ///
    /// A new service starts automatically on boot, runs `executable_path` with `arguments` and
    /// reports launch failures with normal severity.
    pub fn install_and_start(
        &self,
        name: &str,
        display_name: &str,
        executable_path: &Path,
        arguments: &[String],
    ) -> Result<()> {
        let manager = self.connect(ServiceManagerAccess::ALL_ACCESS)?;
        let service = match manager.open_service(name, ServiceAccess::ALL_ACCESS) {
            Ok(service) => {
                debug!(service = name, "Service already installed, skipping creation");
                service
            }
            Err(Error::ServiceNotOpenable(_)) => {
                let service_info =
                    ServiceInfo::auto_start(name, display_name, executable_path, arguments);
                info!(
                    service = name,
                    command = %service_info.launch_command(),
                    "Installing service"
                );
                manager.create_service(&service_info, ServiceAccess::ALL_ACCESS)?
            }
            Err(e) => return Err(e),
        };

        self.start_and_wait(&service)
    }

    /// Stop the service if it is running and delete it.
    ///
    /// The stop is best effort: a service that fails to stop is still marked for deletion.
    pub fn uninstall(&self, name: &str) -> Result<()> {
        let manager = self.connect(ServiceManagerAccess::ALL_ACCESS)?;
        let service = manager
            .open_service(name, ServiceAccess::ALL_ACCESS)
            .map_err(|e| match e {
                Error::ServiceNotOpenable(_) => Error::ServiceNotInstalled,
                other => other,
            })?;

        if let Err(e) = self.stop_and_wait(&service) {
            warn!(service = name, "Continuing uninstall after failed stop: {e}");
        }
        service.delete()?;
        info!(service = name, "Service marked for deletion");
        Ok(())
    }

    /// The current state of a service, or [`ServiceState::NotFound`] if it cannot be opened.
    pub fn status(&self, name: &str) -> Result<ServiceState> {
        let manager = self.connect(ServiceManagerAccess::CONNECT)?;
        let service = match manager.open_service(name, ServiceAccess::QUERY_STATUS) {
            Ok(service) => service,
            Err(Error::ServiceNotOpenable(e)) => {
                debug!(service = name, "Service not found: {e}");
                return Ok(ServiceState::NotFound);
            }
            Err(e) => return Err(e),
        };
        let state = service.query_status()?.current_state;
        debug!(service = name, %state, "Queried service status");
        Ok(state)
    }

    pub fn is_installed(&self, name: &str) -> Result<bool> {
        let manager = self.connect(ServiceManagerAccess::CONNECT)?;
        let installed = match manager.open_service(name, ServiceAccess::QUERY_STATUS) {
            Ok(_) => Ok(true),
            Err(Error::ServiceNotOpenable(_)) => Ok(false),
            Err(e) => Err(e),
        };
        installed
    }

    fn start_and_wait(&self, service: &Service<'_, B>) -> Result<()> {
        // A rejected request (e.g. already running) is settled by the status the wait observes.
        if let Err(e) = service.start(&[]) {
            debug!("Start request not accepted: {e}");
        }
        if wait::await_transition(
            service,
            &self.clock,
            ServiceState::StartPending,
            ServiceState::Running,
        ) {
            info!("Service is running");
            Ok(())
        } else {
            Err(Error::ServiceFailedToStart)
        }
    }

    fn stop_and_wait(&self, service: &Service<'_, B>) -> Result<()> {
        if let Err(e) = service.stop() {
            debug!("Stop request not accepted: {e}");
        }
        if wait::await_transition(
            service,
            &self.clock,
            ServiceState::StopPending,
            ServiceState::Stopped,
        ) {
            info!("Service is stopped");
            Ok(())
        } else {
            Err(Error::ServiceFailedToStop)
        }
    }
}
