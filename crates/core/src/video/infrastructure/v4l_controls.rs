use v4l::control::{Control, Value};
use v4l::Device;

use crate::capture::domain::capture_config::CameraControls;

// User-class control ids from linux/v4l2-controls.h
const V4L2_CID_BASE: u32 = 0x0098_0900;
const V4L2_CID_BRIGHTNESS: u32 = V4L2_CID_BASE;
const V4L2_CID_CONTRAST: u32 = V4L2_CID_BASE + 1;
const V4L2_CID_GAMMA: u32 = V4L2_CID_BASE + 16;
const V4L2_CID_GAIN: u32 = V4L2_CID_BASE + 19;

/// A control value as the driver reports it after being written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlReading {
    pub name: &'static str,
    pub requested: i64,
    /// `None` when the camera does not expose the control.
    pub actual: Option<i64>,
}

/// Name, V4L2 id and value for every control in `controls`.
pub fn control_requests(controls: &CameraControls) -> [(&'static str, u32, i64); 4] {
    [
        ("gamma", V4L2_CID_GAMMA, controls.gamma),
        ("gain", V4L2_CID_GAIN, controls.gain),
        ("brightness", V4L2_CID_BRIGHTNESS, controls.brightness),
        ("contrast", V4L2_CID_CONTRAST, controls.contrast),
    ]
}

/// Writes `controls` to `/dev/video{index}` and reads each one back.
///
/// Only failing to open the device is an error. Drivers routinely lack some
/// controls or clamp values, so individual rejections are logged and the
/// read-back value is reported instead.
pub fn apply_camera_controls(
    index: u32,
    controls: &CameraControls,
) -> std::io::Result<Vec<ControlReading>> {
    let device = Device::new(index as usize)?;

    let readings = control_requests(controls)
        .into_iter()
        .map(|(name, id, requested)| {
            let control = Control {
                id,
                value: Value::Integer(requested),
            };
            if let Err(e) = device.set_control(control) {
                log::warn!("Camera rejected {name}={requested}: {e}");
            }
            let actual = match device.control(id) {
                Ok(Control {
                    value: Value::Integer(v),
                    ..
                }) => Some(v),
                _ => None,
            };
            ControlReading {
                name,
                requested,
                actual,
            }
        })
        .collect();

    Ok(readings)
}

/// One-line summary, e.g. `gamma=200 gain=0 brightness=unsupported`.
pub fn describe_readings(readings: &[ControlReading]) -> String {
    readings
        .iter()
        .map(|r| match r.actual {
            Some(v) => format!("{}={v}", r.name),
            None => format!("{}=unsupported", r.name),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
