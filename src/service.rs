use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::ScmBackend;
use crate::sc_handle::ScHandle;
use crate::wait::StatusSource;
use crate::{Error, Result};

bitflags::bitflags! {
    /// Flags describing the access permissions when working with services.
    #[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
    pub struct ServiceAccess: u32 {
        /// Can query the service configuration.
        const QUERY_CONFIG = 0x0001;

        /// Can change the service configuration.
        const CHANGE_CONFIG = 0x0002;

        /// Can query the service status.
        const QUERY_STATUS = 0x0004;

        /// Can enumerate the services that depend on this service.
        const ENUMERATE_DEPENDENTS = 0x0008;

        /// Can start the service.
        const START = 0x0010;

        /// Can stop the service.
        const STOP = 0x0020;

        /// Can pause or continue the service.
        const PAUSE_CONTINUE = 0x0040;

        /// Can ask the service to report its status immediately.
        const INTERROGATE = 0x0080;

        /// Can send user defined control codes.
        const USER_DEFINED_CONTROL = 0x0100;

        /// Can delete the service.
        const DELETE = 0x0001_0000;

        /// Includes all possible access rights.
        const ALL_ACCESS = 0x000F_01FF;
    }
}

bitflags::bitflags! {
    /// Enum describing the types of Windows services.
    #[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
    pub struct ServiceType: u32 {
        /// Kernel device driver.
        const KERNEL_DRIVER = 0x0000_0001;

        /// File system driver.
        const FILE_SYSTEM_DRIVER = 0x0000_0002;

        /// Service that runs in its own process.
        const OWN_PROCESS = 0x0000_0010;

        /// Service that shares a process with one or more other services.
        const SHARE_PROCESS = 0x0000_0020;

        /// The service can interact with the desktop.
        const INTERACTIVE_PROCESS = 0x0000_0100;
    }
}

/// Current state of a service.
///
/// [`NotFound`](ServiceState::NotFound) and [`Unknown`](ServiceState::Unknown) are never
/// reported by the operating system, they are produced by this crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display)]
#[repr(i32)]
pub enum ServiceState {
    /// The state could not be retrieved.
    Unknown = -1,
    /// No service with the given name exists.
    NotFound = 0,
    Stopped = 1,
    StartPending = 2,
    StopPending = 3,
    Running = 4,
    ContinuePending = 5,
    PausePending = 6,
    Paused = 7,
}

impl ServiceState {
    /// Maps a raw `dwCurrentState` value. Values the system should never report map to
    /// [`Unknown`](ServiceState::Unknown).
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => ServiceState::Stopped,
            2 => ServiceState::StartPending,
            3 => ServiceState::StopPending,
            4 => ServiceState::Running,
            5 => ServiceState::ContinuePending,
            6 => ServiceState::PausePending,
            7 => ServiceState::Paused,
            _ => ServiceState::Unknown,
        }
    }

}

/// Service control codes that can be sent to a service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ServiceControl {
    Stop = 0x0000_0001,
    Pause = 0x0000_0002,
    Continue = 0x0000_0003,
    Interrogate = 0x0000_0004,
    Shutdown = 0x0000_0005,
}

impl ServiceControl {
    pub fn to_raw(self) -> u32 {
        self as u32
    }
}

/// Enum describing the start options for windows services.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ServiceStartType {
    /// Autostart on system boot
    AutoStart = 0x0000_0002,
    /// Service is enabled, can be started manually
    OnDemand = 0x0000_0003,
    /// Disabled service
    Disabled = 0x0000_0004,
}

impl ServiceStartType {
    pub fn to_raw(self) -> u32 {
        self as u32
    }
}

/// Error handling strategy for service failures.
///
/// See <https://msdn.microsoft.com/en-us/library/windows/desktop/ms682450(v=vs.85).aspx>
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ServiceErrorControl {
    Ignore = 0x0000_0000,
    Normal = 0x0000_0001,
    Severe = 0x0000_0002,
    Critical = 0x0000_0003,
}

impl ServiceErrorControl {
    pub fn to_raw(self) -> u32 {
        self as u32
    }
}

/// A snapshot of a service's status, read fresh on every query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ServiceStatus {
    pub service_type: ServiceType,
    pub current_state: ServiceState,
    /// Raw `dwControlsAccepted` mask.
    pub controls_accepted: u32,
    pub win32_exit_code: u32,
    pub service_specific_exit_code: u32,
    /// Progress counter the service increments during a pending transition.
    pub checkpoint: u32,
    /// The service's estimate of how long the current pending transition takes.
    pub wait_hint: Duration,
}

impl ServiceStatus {
    /// A status with the given state and no pending progress information.
    pub fn with_state(current_state: ServiceState) -> Self {
        ServiceStatus {
            service_type: ServiceType::OWN_PROCESS,
            current_state,
            controls_accepted: 0,
            win32_exit_code: 0,
            service_specific_exit_code: 0,
            checkpoint: 0,
            wait_hint: Duration::ZERO,
        }
    }

    /// A pending status reporting `checkpoint` progress and a wait hint in milliseconds.
    pub fn pending(current_state: ServiceState, checkpoint: u32, wait_hint_ms: u64) -> Self {
        ServiceStatus {
            checkpoint,
            wait_hint: Duration::from_millis(wait_hint_ms),
            ..ServiceStatus::with_state(current_state)
        }
    }
}

/// The information needed to register a service with the service control manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,

    /// Friendly service name
    pub display_name: String,

    pub service_type: ServiceType,

    pub start_type: ServiceStartType,

    /// Severity of the error if the service fails to start on boot.
    pub error_control: ServiceErrorControl,

    /// Path to the service binary
    pub executable_path: PathBuf,

    /// Launch arguments passed to the binary each time the system starts the service.
    pub launch_arguments: Vec<String>,
}

impl ServiceInfo {
    /// A service running in its own process that starts with the system and reports launch
    /// failures with normal severity.
    pub fn auto_start(
        name: impl Into<String>,
        display_name: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        launch_arguments: &[String],
    ) -> Self {
        ServiceInfo {
            name: name.into(),
            display_name: display_name.into(),
            service_type: ServiceType::OWN_PROCESS,
            start_type: ServiceStartType::AutoStart,
            error_control: ServiceErrorControl::Normal,
            executable_path: executable_path.into(),
            launch_arguments: launch_arguments.to_vec(),
        }
    }

    /// Returns the command line the system runs to launch the service.
    ///
    /// Without launch arguments this is the bare executable path. Otherwise the path is quoted
    /// and followed by the arguments, separated by single spaces.
    pub fn launch_command(&self) -> String {
        let path = self.executable_path.to_string_lossy();
        if self.launch_arguments.is_empty() {
            return path.into_owned();
        }

        let mut command = format!("\"{path}\"");
        for argument in &self.launch_arguments {
            command.push(' ');
            command.push_str(argument);
        }
        command
    }
}

/// An open service entry. Borrows the [`ServiceManager`](crate::service_manager::ServiceManager)
/// it was opened from and closes its handle when dropped.
pub struct Service<'m, B: ScmBackend + ?Sized> {
    backend: &'m B,
    service_handle: ScHandle<'m, B>,
}

impl<'m, B: ScmBackend + ?Sized> Service<'m, B> {
    pub(crate) fn new(backend: &'m B, service_handle: ScHandle<'m, B>) -> Self {
        Service {
            backend,
            service_handle,
        }
    }

    /// Ask the system to start the service.
    ///
    /// The call returns once the request is accepted; the service is usually still pending.
    pub fn start(&self, arguments: &[String]) -> io::Result<()> {
        self.backend
            .start_service(self.service_handle.raw_handle(), arguments)
    }

    /// Send the stop control and return the status reported back.
    pub fn stop(&self) -> io::Result<ServiceStatus> {
        self.backend
            .control_service(self.service_handle.raw_handle(), ServiceControl::Stop)
    }

    /// Get the service status from the system.
    pub fn query_status(&self) -> Result<ServiceStatus> {
        self.backend
            .query_status(self.service_handle.raw_handle())
            .map_err(Error::StatusQueryFailed)
    }

    /// Mark the service for deletion from the service control manager database.
    ///
    /// The entry disappears once every open handle to it has been closed.
    pub fn delete(&self) -> Result<()> {
        self.backend
            .delete_service(self.service_handle.raw_handle())
            .map_err(Error::ServiceDeletionFailed)
    }
}

impl<B: ScmBackend + ?Sized> StatusSource for Service<'_, B> {
    fn query_status(&self) -> Result<ServiceStatus> {
        Service::query_status(self)
    }
}
