use std::io;

use super::{RawHandle, ScmBackend};
use crate::service::{ServiceAccess, ServiceControl, ServiceInfo, ServiceStatus};
use crate::service_manager::ServiceManagerAccess;

/// Backend for platforms without a service control manager. Every primitive fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedBackend;

fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "the Windows service control manager is not available on this platform",
    )
}

impl ScmBackend for UnsupportedBackend {
    fn open_manager(&self, _access: ServiceManagerAccess) -> io::Result<RawHandle> {
        Err(unsupported())
    }

    fn open_service(
        &self,
        _manager: RawHandle,
        _name: &str,
        _access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        Err(unsupported())
    }

    fn create_service(
        &self,
        _manager: RawHandle,
        _info: &ServiceInfo,
        _access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        Err(unsupported())
    }

    fn delete_service(&self, _service: RawHandle) -> io::Result<()> {
        Err(unsupported())
    }

    fn control_service(
        &self,
        _service: RawHandle,
        _control: ServiceControl,
    ) -> io::Result<ServiceStatus> {
        Err(unsupported())
    }

    fn query_status(&self, _service: RawHandle) -> io::Result<ServiceStatus> {
        Err(unsupported())
    }

    fn start_service(&self, _service: RawHandle, _args: &[String]) -> io::Result<()> {
        Err(unsupported())
    }

    fn close_handle(&self, _handle: RawHandle) -> io::Result<()> {
        Err(unsupported())
    }
}
