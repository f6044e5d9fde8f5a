//! Metering device models: monitors, channels, outlets, EV chargers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A metering device as reported by `customers/devices`.
///
/// Devices nest one level: an outlet or charger can appear as a
/// sub-device of the monitor it hangs off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub device_gid: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_device_gid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_channel_num: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<DeviceChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet: Option<Outlet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev_charger: Option<Charger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_properties: Option<LocationProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_connected: Option<DeviceConnected>,
    /// Nested sub-devices (one level deep on the wire).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,
}

/// Connectivity report for a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConnected {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_gid: Option<i64>,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_since: Option<DateTime<Utc>>,
}

/// One measuring channel of a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceChannel {
    pub device_gid: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub channel_num: String,
    pub channel_multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type_gid: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_channel_num: Option<String>,
}

impl Default for DeviceChannel {
    fn default() -> Self {
        Self {
            device_gid: 0,
            name: None,
            // The combined mains channel.
            channel_num: "1,2,3".to_string(),
            channel_multiplier: 1.0,
            channel_type_gid: None,
            channel_type: None,
            parent_channel_num: None,
        }
    }
}

/// A selectable channel type from `devices/channels/channeltypes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelType {
    pub channel_type_gid: i64,
    pub description: String,
    pub selectable: bool,
}

/// Location metadata attached to a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationProperties {
    pub device_name: String,
    pub display_name: String,
    pub zip_code: String,
    pub time_zone: String,
    pub usage_cent_per_kw_hour: f64,
    pub peak_demand_dollar_per_kw: f64,
    pub billing_cycle_start_day: u32,
    pub solar: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility_rate_gid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_information: Option<LocationInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude_longitude: Option<LatitudeLongitude>,
}

/// Free-form home survey answers; the upstream stores them all as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationInformation {
    pub air_conditioning: String,
    pub heat_source: String,
    pub location_sq_ft: String,
    pub num_electric_cars: String,
    pub location_type: String,
    pub num_people: String,
    pub swimming_pool: String,
    pub hot_tub: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatitudeLongitude {
    pub latitude: f64,
    pub longitude: f64,
}

/// A smart outlet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Outlet {
    pub device_gid: i64,
    pub outlet_on: bool,
    pub load_gid: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<serde_json::Value>,
}

/// An EV charger (EVSE).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Charger {
    pub device_gid: i64,
    pub load_gid: i64,
    pub charger_on: bool,
    pub message: String,
    pub status: String,
    pub icon: String,
    pub icon_label: String,
    pub icon_detail_text: String,
    pub fault_text: String,
    pub charging_rate: f64,
    pub max_charging_rate: f64,
    pub off_peak_schedules_enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_schedules: Vec<serde_json::Value>,
    pub debug_code: String,
    pub pro_control_code: String,
    #[serde(rename = "breakerPIN", skip_serializing_if = "Option::is_none")]
    pub breaker_pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_management_enabled: Option<bool>,
}

/// Snapshot from `customers/devices/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevicesStatus {
    pub devices_connected: Vec<DeviceConnected>,
    pub outlets: Vec<Outlet>,
    pub ev_chargers: Vec<Charger>,
}

impl DevicesStatus {
    /// Copy connectivity state onto a previously fetched device list.
    pub fn apply_connectivity(&self, devices: &mut [Device]) {
        for report in &self.devices_connected {
            let Some(device_gid) = report.device_gid else {
                continue;
            };
            if let Some(device) = devices.iter_mut().find(|d| d.device_gid == device_gid) {
                device.device_connected = Some(report.clone());
            }
        }
    }
}
