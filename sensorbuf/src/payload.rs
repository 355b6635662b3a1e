//! Fixed-layout records handed over by the driver. The buffering core copies
//! them around and never looks inside.

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelData {
    pub gaze_x: f64,
    pub gaze_y: f64,
    pub diameter: f64,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
}

/// Continuous high-frequency measurement.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleEvent {
    /// Driver timestamp in microseconds.
    pub timestamp: i64,
    pub left: ChannelData,
    pub right: ChannelData,
    pub plane_number: i32,
}

/// Discrete occurrence detected by the device.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiscreteEvent {
    pub event_type: u8,
    pub channel: u8,
    pub start_time: i64,
    pub end_time: i64,
    pub duration: i64,
    pub position_x: f64,
    pub position_y: f64,
}
