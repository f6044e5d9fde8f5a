//! Wire models for the metering API.
//!
//! Field names follow the upstream camelCase JSON; structs default every
//! field so partially populated payloads deserialize cleanly.

mod customer;
mod device;
mod usage;
mod vehicle;

pub use customer::Customer;
pub use device::{
    Charger, ChannelType, Device, DeviceChannel, DeviceConnected, DevicesStatus, LatitudeLongitude,
    LocationInformation, LocationProperties, Outlet,
};
pub use usage::{ChannelUsage, ChartUsage, DeviceListUsage, UsageDevice};
pub use vehicle::{Vehicle, VehicleStatus};
