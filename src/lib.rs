pub mod cli;
pub mod config;
pub mod dispatch;
pub mod event_loop;
pub mod logging;
pub mod mapping;
pub mod midi;
pub mod monitor;
pub mod scheduler;

pub use cli::{validate_device, Args};
pub use dispatch::{
    create_shared_mapping, ConfigMapping, DeviceIdentity, DispatchOutcome, Dispatcher,
    MessageHandler, SharedMapping,
};
pub use scheduler::{Scheduler, ThreadScheduler};

pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}

#[cfg(not(feature = "test-mock"))]
pub fn handle_device_list() -> Vec<String> {
    midi::list_input_ports()
}

#[cfg(feature = "test-mock")]
pub fn handle_device_list() -> Vec<String> {
    // Mock implementation for tests - simple format as expected by tests
    vec!["Mock_Device_1".to_string(), "Mock_Device_2".to_string()]
}
