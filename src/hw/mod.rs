mod btleplug_backend;
mod fake_link;
mod hardware;
mod session;

pub use self::btleplug_backend::BleClient;
pub use self::fake_link::{FakeDeviceLink, FakeLinkConfig};
pub use self::hardware::{DeviceLink, NotificationStream};
pub use self::session::{DeviceSession, OperateError};
