pub mod api;
pub mod conditions;
pub mod error;
pub mod fan;
pub mod gpio;
pub mod power;
pub mod service;

pub use api::{router, serve, ControlState};
pub use conditions::{
    publish_client, ConditionsPayload, ConditionsReading, ConditionsReporter, ConditionsSensor,
    IioDht22Sensor,
};
pub use error::HardwareError;
pub use fan::{FanCommand, FanController};
pub use gpio::{OutputPin, SYSFS_GPIO_ROOT, SysfsPin};
pub use power::CrtPower;
