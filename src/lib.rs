mod advert;
mod error;
mod hw;
pub mod models;
mod protocol;
mod telemetry;
mod utils;
mod validator;

pub use advert::{
    Advertisement, AdvertisementDispatcher, DeviceStateEvent, DispatchOutcome, IgnoreReason,
};
pub use error::{InteractionError, ProtocolError, TelemetryError};
pub use hw::{
    BleClient, DeviceLink, DeviceSession, FakeDeviceLink, FakeLinkConfig, NotificationStream,
    OperateError,
};
pub use models::{
    BotAction, BotHandler, BotState, ContactSensorState, CurtainHandler, CurtainMode,
    CurtainState, DecodeError, DeviceModel, DeviceState, DoorState, HumidifierHandler,
    HumidifierMode, HumidifierState, LightLevel, MeterState, MotionSensorState, QuickGear,
};
pub use protocol::{
    ACK_SUCCESS, ACK_SUCCESS_ALTERNATE, Command, DEFAULT_RESPONSE_TIMEOUT, EndpointId,
};
pub use telemetry::init_tracing;
pub use validator::{
    FieldRule, LengthRule, NumberRule, RuleKind, RuleSet, StringRule, ValidationCode,
    ValidationError,
};
