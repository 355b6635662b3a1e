use crate::payload::{DiscreteEvent, SampleEvent};

/// Status the driver expects back from a callback, and returns itself when a
/// registration call succeeds.
pub const RET_SUCCESS: i32 = 1;

pub type SampleCallback = extern "system" fn(SampleEvent) -> i32;
pub type EventCallback = extern "system" fn(DiscreteEvent) -> i32;

/// Callback registration surface of the device driver.
///
/// The driver keeps exactly one callback slot per stream kind. Passing `None`
/// uninstalls the current callback. Callbacks may be invoked from any driver
/// thread, concurrently with each other.
pub trait Driver: Send + Sync {
    fn set_sample_callback(&self, callback: Option<SampleCallback>) -> i32;

    fn set_event_callback(&self, callback: Option<EventCallback>) -> i32;
}
