//! The raw service control manager primitives.
//!
//! Everything above this module talks to the operating system exclusively through
//! [`ScmBackend`]. Handles are plain tokens here; ownership and release are handled by the
//! [`ServiceManager`](crate::service_manager::ServiceManager) and
//! [`Service`](crate::service::Service) wrappers.

use std::io;

use crate::service::{ServiceAccess, ServiceControl, ServiceInfo, ServiceStatus};
use crate::service_manager::ServiceManagerAccess;

#[cfg(test)]
pub(crate) mod fake;
#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod win32;

#[cfg(not(windows))]
pub use unsupported::UnsupportedBackend;
#[cfg(windows)]
pub use win32::Win32Backend;

/// Backend used by [`default_backend`] on this platform.
#[cfg(windows)]
pub type SystemBackend = Win32Backend;
/// Backend used by [`default_backend`] on this platform.
#[cfg(not(windows))]
pub type SystemBackend = UnsupportedBackend;

/// Returns the backend for the service control manager of the local machine.
pub fn default_backend() -> SystemBackend {
    #[cfg(windows)]
    return Win32Backend;
    #[cfg(not(windows))]
    return UnsupportedBackend;
}

/// An opaque handle issued by a [`ScmBackend`]. Zero is never a valid handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawHandle(isize);

impl RawHandle {
    pub const INVALID: RawHandle = RawHandle(0);

    pub fn new(raw: isize) -> Self {
        RawHandle(raw)
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn as_raw(self) -> isize {
        self.0
    }
}

/// The handle based capability surface of the service control manager.
///
/// Every method that returns a handle only returns `Ok` with a valid handle. Each handle handed
/// out must later be passed to [`close_handle`](ScmBackend::close_handle) exactly once.
pub trait ScmBackend {
    /// Connect to the service control manager of the local machine.
    fn open_manager(&self, access: ServiceManagerAccess) -> io::Result<RawHandle>;

    /// Open an existing service entry.
    fn open_service(
        &self,
        manager: RawHandle,
        name: &str,
        access: ServiceAccess,
    ) -> io::Result<RawHandle>;

    /// Register a new service entry and open it.
    fn create_service(
        &self,
        manager: RawHandle,
        info: &ServiceInfo,
        access: ServiceAccess,
    ) -> io::Result<RawHandle>;

    /// Mark a service entry for deletion.
    fn delete_service(&self, service: RawHandle) -> io::Result<()>;

    /// Send a control code and return the status reported back.
    fn control_service(
        &self,
        service: RawHandle,
        control: ServiceControl,
    ) -> io::Result<ServiceStatus>;

    fn query_status(&self, service: RawHandle) -> io::Result<ServiceStatus>;

    fn start_service(&self, service: RawHandle, args: &[String]) -> io::Result<()>;

    fn close_handle(&self, handle: RawHandle) -> io::Result<()>;
}

impl<T: ScmBackend + ?Sized> ScmBackend for &T {
    fn open_manager(&self, access: ServiceManagerAccess) -> io::Result<RawHandle> {
        (**self).open_manager(access)
    }

    fn open_service(
        &self,
        manager: RawHandle,
        name: &str,
        access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        (**self).open_service(manager, name, access)
    }

    fn create_service(
        &self,
        manager: RawHandle,
        info: &ServiceInfo,
        access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        (**self).create_service(manager, info, access)
    }

    fn delete_service(&self, service: RawHandle) -> io::Result<()> {
        (**self).delete_service(service)
    }

    fn control_service(
        &self,
        service: RawHandle,
        control: ServiceControl,
    ) -> io::Result<ServiceStatus> {
        (**self).control_service(service, control)
    }

    fn query_status(&self, service: RawHandle) -> io::Result<ServiceStatus> {
        (**self).query_status(service)
    }

    fn start_service(&self, service: RawHandle, args: &[String]) -> io::Result<()> {
        (**self).start_service(service, args)
    }

    fn close_handle(&self, handle: RawHandle) -> io::Result<()> {
        (**self).close_handle(handle)
    }
}
