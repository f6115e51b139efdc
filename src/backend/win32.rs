use std::time::Duration;
use std::{io, mem, ptr};

use widestring::U16CString;
use windows_sys::Win32::Security::SC_HANDLE;
use windows_sys::Win32::System::Services;

use super::{RawHandle, ScmBackend};
use crate::service::{
    ServiceAccess, ServiceControl, ServiceInfo, ServiceState, ServiceStatus, ServiceType,
};
use crate::service_manager::ServiceManagerAccess;

/// The service control manager of the local machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct Win32Backend;

fn to_wide(value: &str) -> io::Result<U16CString> {
    U16CString::from_str(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

fn handle_result(handle: SC_HANDLE) -> io::Result<RawHandle> {
    let handle = RawHandle::new(handle);
    if handle.is_valid() {
        Ok(handle)
    } else {
        Err(io::Error::last_os_error())
    }
}

fn bool_result(result: i32) -> io::Result<()> {
    if result == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn status_from_raw(raw: &Services::SERVICE_STATUS) -> ServiceStatus {
    ServiceStatus {
        service_type: ServiceType::from_bits_retain(raw.dwServiceType),
        current_state: ServiceState::from_raw(raw.dwCurrentState),
        controls_accepted: raw.dwControlsAccepted,
        win32_exit_code: raw.dwWin32ExitCode,
        service_specific_exit_code: raw.dwServiceSpecificExitCode,
        checkpoint: raw.dwCheckPoint,
        wait_hint: Duration::from_millis(u64::from(raw.dwWaitHint)),
    }
}

impl ScmBackend for Win32Backend {
    fn open_manager(&self, access: ServiceManagerAccess) -> io::Result<RawHandle> {
        // Null machine and database names select the active database of the local machine.
        let handle = unsafe { Services::OpenSCManagerW(ptr::null(), ptr::null(), access.bits()) };
        handle_result(handle)
    }

    fn open_service(
        &self,
        manager: RawHandle,
        name: &str,
        access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        let name = to_wide(name)?;
        let handle =
            unsafe { Services::OpenServiceW(manager.as_raw(), name.as_ptr(), access.bits()) };
        handle_result(handle)
    }

    fn create_service(
        &self,
        manager: RawHandle,
        info: &ServiceInfo,
        access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        let name = to_wide(&info.name)?;
        let display_name = to_wide(&info.display_name)?;
        let launch_command = to_wide(&info.launch_command())?;

        let handle = unsafe {
            Services::CreateServiceW(
                manager.as_raw(),
                name.as_ptr(),
                display_name.as_ptr(),
                access.bits(),
                info.service_type.bits(),
                info.start_type.to_raw(),
                info.error_control.to_raw(),
                launch_command.as_ptr(),
                ptr::null(),     // load ordering group
                ptr::null_mut(), // tag id within the load ordering group
                ptr::null(),     // dependencies
                ptr::null(),     // run as LocalSystem
                ptr::null(),     // password
            )
        };
        handle_result(handle)
    }

    fn delete_service(&self, service: RawHandle) -> io::Result<()> {
        bool_result(unsafe { Services::DeleteService(service.as_raw()) })
    }

    fn control_service(
        &self,
        service: RawHandle,
        control: ServiceControl,
    ) -> io::Result<ServiceStatus> {
        let mut raw: Services::SERVICE_STATUS = unsafe { mem::zeroed() };
        bool_result(unsafe {
            Services::ControlService(service.as_raw(), control.to_raw(), &mut raw)
        })?;
        Ok(status_from_raw(&raw))
    }

    fn query_status(&self, service: RawHandle) -> io::Result<ServiceStatus> {
        let mut raw: Services::SERVICE_STATUS = unsafe { mem::zeroed() };
        bool_result(unsafe { Services::QueryServiceStatus(service.as_raw(), &mut raw) })?;
        Ok(status_from_raw(&raw))
    }

    fn start_service(&self, service: RawHandle, args: &[String]) -> io::Result<()> {
        let wide_args = args
            .iter()
            .map(|arg| to_wide(arg))
            .collect::<io::Result<Vec<_>>>()?;
        let raw_args: Vec<*const u16> = wide_args.iter().map(|arg| arg.as_ptr()).collect();

        bool_result(unsafe {
            Services::StartServiceW(
                service.as_raw(),
                raw_args.len() as u32,
                if raw_args.is_empty() {
                    ptr::null()
                } else {
                    raw_args.as_ptr()
                },
            )
        })
    }

    fn close_handle(&self, handle: RawHandle) -> io::Result<()> {
        bool_result(unsafe { Services::CloseServiceHandle(handle.as_raw()) })
    }
}
