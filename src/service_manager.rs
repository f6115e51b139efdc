use tracing::debug;

use crate::backend::ScmBackend;
use crate::sc_handle::ScHandle;
use crate::service::{Service, ServiceAccess, ServiceInfo};
use crate::{Error, Result};

bitflags::bitflags! {
    /// Flags describing access permissions for [`ServiceManager`].
    #[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
    pub struct ServiceManagerAccess: u32 {
        /// Can connect to service control manager.
        const CONNECT = 0x0001;

        /// Can create services.
        const CREATE_SERVICE = 0x0002;

        /// Can enumerate services or receive notifications.
        const ENUMERATE_SERVICE = 0x0004;

        /// Can lock the services database.
        const LOCK = 0x0008;

        /// Can query the lock status of the services database.
        const QUERY_LOCK_STATUS = 0x0010;

        /// Can notify the system of boot configuration changes.
        const MODIFY_BOOT_CONFIG = 0x0020;

        /// Includes all possible access rights.
        const ALL_ACCESS = 0x000F_003F;
    }
}

/// Service manager.
///
/// Holds a connection to the service control manager for as long as it is alive. Services opened
/// through it borrow it and are closed before it.
pub struct ServiceManager<'b, B: ScmBackend + ?Sized> {
    backend: &'b B,
    manager_handle: ScHandle<'b, B>,
}

impl<'b, B: ScmBackend + ?Sized> ServiceManager<'b, B> {
    /// Connect to the local services database.
    ///
    /// # Arguments
    ///
    /// * `backend` - The primitives used to talk to the service control manager.
    /// * `request_access` - Desired access permissions.
    pub fn connect(backend: &'b B, request_access: ServiceManagerAccess) -> Result<Self> {
        let handle = backend
            .open_manager(request_access)
            .map_err(Error::ManagerUnreachable)?;
        debug!(access = ?request_access, "Connected to service control manager");

        Ok(ServiceManager {
            backend,
            manager_handle: ScHandle::new(backend, handle),
        })
    }

    /// Open an existing service.
    ///
    /// # Arguments
    ///
    /// * `name` - The service name.
    /// * `request_access` - Desired permissions for the returned [`Service`] instance.
    ///
    /// Fails with [`Error::ServiceNotOpenable`] when the service does not exist or the requested
    /// access is denied.
    pub fn open_service(&self, name: &str, request_access: ServiceAccess) -> Result<Service<'_, B>> {
        check_nul(name, "service name")?;
        let handle = self
            .backend
            .open_service(self.manager_handle.raw_handle(), name, request_access)
            .map_err(Error::ServiceNotOpenable)?;

        Ok(Service::new(self.backend, ScHandle::new(self.backend, handle)))
    }

    /// Create a service.
    ///
    /// # Arguments
    ///
    /// * `service_info` - The service information that will be saved to the system services
    ///   registry.
    /// * `service_access` - Desired access permissions for the returned [`Service`] instance.
    pub fn create_service(
        &self,
        service_info: &ServiceInfo,
        service_access: ServiceAccess,
    ) -> Result<Service<'_, B>> {
        check_nul(&service_info.name, "service name")?;
        check_nul(&service_info.display_name, "display name")?;
        check_nul(&service_info.launch_command(), "launch command")?;

        let handle = self
            .backend
            .create_service(
                self.manager_handle.raw_handle(),
                service_info,
                service_access,
            )
            .map_err(Error::ServiceCreationFailed)?;

        Ok(Service::new(self.backend, ScHandle::new(self.backend, handle)))
    }
}

fn check_nul(value: &str, what: &'static str) -> Result<()> {
    if value.contains('\0') {
        return Err(Error::InvalidName(what));
    }
    Ok(())
}
