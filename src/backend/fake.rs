//! In-memory service control manager for tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;

use super::{RawHandle, ScmBackend};
use crate::service::{ServiceAccess, ServiceControl, ServiceInfo, ServiceState, ServiceStatus};
use crate::service_manager::ServiceManagerAccess;

const ERROR_INVALID_HANDLE: i32 = 6;
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;
const ERROR_SERVICE_NOT_ACTIVE: i32 = 1062;
const ERROR_SERVICE_ALREADY_RUNNING: i32 = 1056;
const ERROR_SERVICE_EXISTS: i32 = 1073;

/// What a service reports after a start or stop request.
#[derive(Clone, Debug)]
pub(crate) enum Transition {
    /// Jump straight to the terminal state.
    Immediate,
    /// Replay these query results, then stay on the last one. `None` fails the query.
    Scripted(Vec<Option<ServiceStatus>>),
}

#[derive(Debug)]
struct FakeService {
    info: Option<ServiceInfo>,
    status: ServiceStatus,
    queued: VecDeque<Option<ServiceStatus>>,
    on_start: Transition,
    on_stop: Transition,
}

#[derive(Debug, Clone)]
enum HandleKind {
    Manager,
    Service { name: String, manager: RawHandle },
}

#[derive(Debug, Default)]
struct State {
    services: HashMap<String, FakeService>,
    handles: HashMap<RawHandle, HandleKind>,
    next_handle: isize,
    acquired: usize,
    released: usize,
    created: usize,
    start_requests: usize,
    stop_requests: usize,
    used_after_manager_closed: bool,
    fail_open_manager: Option<i32>,
    fail_create: Option<i32>,
    fail_delete: Option<i32>,
    fail_open_service: Option<i32>,
}

/// Fake service control manager that mutates service state synchronously and counts every
/// handle it hands out and takes back.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    state: RefCell<State>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        FakeBackend::default()
    }

    pub(crate) fn add_service(&self, name: &str, state: ServiceState) {
        self.state.borrow_mut().services.insert(
            name.to_owned(),
            FakeService {
                info: None,
                status: ServiceStatus::with_state(state),
                queued: VecDeque::new(),
                on_start: Transition::Immediate,
                on_stop: Transition::Immediate,
            },
        );
    }

    pub(crate) fn set_on_start(&self, name: &str, transition: Transition) {
        if let Some(service) = self.state.borrow_mut().services.get_mut(name) {
            service.on_start = transition;
        }
    }

    pub(crate) fn set_on_stop(&self, name: &str, transition: Transition) {
        if let Some(service) = self.state.borrow_mut().services.get_mut(name) {
            service.on_stop = transition;
        }
    }

    /// Results returned by the next status queries of `name`. `None` fails the query.
    pub(crate) fn queue_statuses(&self, name: &str, statuses: Vec<Option<ServiceStatus>>) {
        if let Some(service) = self.state.borrow_mut().services.get_mut(name) {
            service.queued.extend(statuses);
        }
    }

    /// The next open of a manager handle fails with `code`.
    pub(crate) fn fail_open_manager(&self, code: i32) {
        self.state.borrow_mut().fail_open_manager = Some(code);
    }

    pub(crate) fn fail_create(&self, code: i32) {
        self.state.borrow_mut().fail_create = Some(code);
    }

    pub(crate) fn fail_delete(&self, code: i32) {
        self.state.borrow_mut().fail_delete = Some(code);
    }

    pub(crate) fn fail_open_service(&self, code: i32) {
        self.state.borrow_mut().fail_open_service = Some(code);
    }

    pub(crate) fn state_of(&self, name: &str) -> Option<ServiceState> {
        self.state
            .borrow()
            .services
            .get(name)
            .map(|s| s.status.current_state)
    }

    pub(crate) fn launch_command(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .services
            .get(name)
            .and_then(|s| s.info.as_ref())
            .map(ServiceInfo::launch_command)
    }

    pub(crate) fn service_info(&self, name: &str) -> Option<ServiceInfo> {
        self.state
            .borrow()
            .services
            .get(name)
            .and_then(|s| s.info.clone())
    }

    pub(crate) fn acquired(&self) -> usize {
        self.state.borrow().acquired
    }

    pub(crate) fn released(&self) -> usize {
        self.state.borrow().released
    }

    pub(crate) fn open_handles(&self) -> usize {
        self.state.borrow().handles.len()
    }

    pub(crate) fn created(&self) -> usize {
        self.state.borrow().created
    }

    pub(crate) fn start_requests(&self) -> usize {
        self.state.borrow().start_requests
    }

    pub(crate) fn stop_requests(&self) -> usize {
        self.state.borrow().stop_requests
    }

    pub(crate) fn used_after_manager_closed(&self) -> bool {
        self.state.borrow().used_after_manager_closed
    }
}

impl State {
    fn issue(&mut self, kind: HandleKind) -> RawHandle {
        self.next_handle += 1;
        let handle = RawHandle::new(self.next_handle);
        self.handles.insert(handle, kind);
        self.acquired += 1;
        handle
    }

    fn check_manager(&self, manager: RawHandle) -> io::Result<()> {
        match self.handles.get(&manager) {
            Some(HandleKind::Manager) => Ok(()),
            _ => Err(io::Error::from_raw_os_error(ERROR_INVALID_HANDLE)),
        }
    }

    fn service_name(&mut self, service: RawHandle) -> io::Result<String> {
        let (name, manager) = match self.handles.get(&service) {
            Some(HandleKind::Service { name, manager }) => (name.clone(), *manager),
            _ => return Err(io::Error::from_raw_os_error(ERROR_INVALID_HANDLE)),
        };
        if !self.handles.contains_key(&manager) {
            self.used_after_manager_closed = true;
        }
        Ok(name)
    }

    fn service_mut(&mut self, service: RawHandle) -> io::Result<&mut FakeService> {
        let name = self.service_name(service)?;
        self.services
            .get_mut(&name)
            .ok_or_else(|| io::Error::from_raw_os_error(ERROR_SERVICE_DOES_NOT_EXIST))
    }
}

fn apply(service: &mut FakeService, transition: Transition, terminal: ServiceState) {
    match transition {
        Transition::Immediate => service.status = ServiceStatus::with_state(terminal),
        Transition::Scripted(steps) => {
            if let Some(Some(first)) = steps.first() {
                service.status = *first;
            }
            service.queued = steps.into_iter().collect();
        }
    }
}

impl ScmBackend for FakeBackend {
    fn open_manager(&self, _access: ServiceManagerAccess) -> io::Result<RawHandle> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.fail_open_manager.take() {
            return Err(io::Error::from_raw_os_error(code));
        }
        Ok(state.issue(HandleKind::Manager))
    }

    fn open_service(
        &self,
        manager: RawHandle,
        name: &str,
        _access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        let mut state = self.state.borrow_mut();
        state.check_manager(manager)?;
        if let Some(code) = state.fail_open_service.take() {
            return Err(io::Error::from_raw_os_error(code));
        }
        if !state.services.contains_key(name) {
            return Err(io::Error::from_raw_os_error(ERROR_SERVICE_DOES_NOT_EXIST));
        }
        Ok(state.issue(HandleKind::Service {
            name: name.to_owned(),
            manager,
        }))
    }

    fn create_service(
        &self,
        manager: RawHandle,
        info: &ServiceInfo,
        _access: ServiceAccess,
    ) -> io::Result<RawHandle> {
        let mut state = self.state.borrow_mut();
        state.check_manager(manager)?;
        if let Some(code) = state.fail_create.take() {
            return Err(io::Error::from_raw_os_error(code));
        }
        if state.services.contains_key(&info.name) {
            return Err(io::Error::from_raw_os_error(ERROR_SERVICE_EXISTS));
        }
        state.services.insert(
            info.name.clone(),
            FakeService {
                info: Some(info.clone()),
                status: ServiceStatus::with_state(ServiceState::Stopped),
                queued: VecDeque::new(),
                on_start: Transition::Immediate,
                on_stop: Transition::Immediate,
            },
        );
        state.created += 1;
        Ok(state.issue(HandleKind::Service {
            name: info.name.clone(),
            manager,
        }))
    }

    fn delete_service(&self, service: RawHandle) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        let name = state.service_name(service)?;
        if let Some(code) = state.fail_delete.take() {
            return Err(io::Error::from_raw_os_error(code));
        }
        state.services.remove(&name);
        Ok(())
    }

    fn control_service(
        &self,
        service: RawHandle,
        control: ServiceControl,
    ) -> io::Result<ServiceStatus> {
        let mut state = self.state.borrow_mut();
        if control == ServiceControl::Stop {
            state.stop_requests += 1;
        }
        let entry = state.service_mut(service)?;
        match control {
            ServiceControl::Stop => {
                if entry.status.current_state == ServiceState::Stopped {
                    return Err(io::Error::from_raw_os_error(ERROR_SERVICE_NOT_ACTIVE));
                }
                let transition = entry.on_stop.clone();
                apply(entry, transition, ServiceState::Stopped);
                Ok(entry.status)
            }
            _ => Ok(entry.status),
        }
    }

    fn query_status(&self, service: RawHandle) -> io::Result<ServiceStatus> {
        let mut state = self.state.borrow_mut();
        let entry = state.service_mut(service)?;
        match entry.queued.pop_front() {
            Some(Some(status)) => {
                entry.status = status;
                Ok(status)
            }
            Some(None) => Err(io::Error::from_raw_os_error(ERROR_INVALID_HANDLE)),
            None => Ok(entry.status),
        }
    }

    fn start_service(&self, service: RawHandle, _args: &[String]) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.start_requests += 1;
        let entry = state.service_mut(service)?;
        if entry.status.current_state == ServiceState::Running {
            return Err(io::Error::from_raw_os_error(ERROR_SERVICE_ALREADY_RUNNING));
        }
        let transition = entry.on_start.clone();
        apply(entry, transition, ServiceState::Running);
        Ok(())
    }

    fn close_handle(&self, handle: RawHandle) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        match state.handles.remove(&handle) {
            Some(_) => {
                state.released += 1;
                Ok(())
            }
            None => Err(io::Error::from_raw_os_error(ERROR_INVALID_HANDLE)),
        }
    }
}
