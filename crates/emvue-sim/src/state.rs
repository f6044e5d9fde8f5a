//! In-memory simulator state.
//!
//! Holds a customer, a device tree, and per-channel power draw, and renders
//! the same JSON shapes the cloud API serves. Devices are built through the
//! seeding helpers; the wire shapes come straight from the emvue-core
//! models so the simulator cannot drift from what the client parses.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use emvue_core::models::{
    ChannelType, Charger, Customer, Device, DeviceChannel, DeviceConnected, DevicesStatus,
    LatitudeLongitude, LocationInformation, LocationProperties, Outlet,
};

/// Mutable world state behind the simulator endpoints.
pub struct SimulatorState {
    customer: Customer,
    devices: Vec<Device>,
    channel_types: Vec<ChannelType>,
    /// kWh-per-minute per (device, channel), keyed the way usage queries
    /// look things up.
    channel_usages: HashMap<(i64, String), f64>,
}

impl SimulatorState {
    pub fn new() -> Self {
        Self {
            customer: Customer {
                customer_gid: 1,
                email: "test@example.com".to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                created_at: Some(Utc::now()),
            },
            devices: Vec::new(),
            channel_types: vec![
                ChannelType {
                    channel_type_gid: 1,
                    description: "Main".to_string(),
                    selectable: false,
                },
                ChannelType {
                    channel_type_gid: 2,
                    description: "Circuit".to_string(),
                    selectable: true,
                },
                ChannelType {
                    channel_type_gid: 3,
                    description: "TED5000".to_string(),
                    selectable: false,
                },
            ],
            channel_usages: HashMap::new(),
        }
    }

    /// Add a multi-channel monitor.
    pub fn add_monitor(&mut self, device_gid: i64, name: &str, channel_count: u32) {
        let mut channels = vec![DeviceChannel {
            device_gid,
            name: Some("Main".to_string()),
            channel_num: "1,2,3".to_string(),
            channel_multiplier: 1.0,
            channel_type_gid: Some(1),
            channel_type: Some("Main".to_string()),
            parent_channel_num: None,
        }];

        for circuit in 1..=channel_count {
            channels.push(DeviceChannel {
                device_gid,
                name: Some(format!("Circuit {circuit}")),
                channel_num: circuit.to_string(),
                channel_multiplier: 1.0,
                channel_type_gid: Some(2),
                channel_type: Some("Circuit".to_string()),
                parent_channel_num: None,
            });
        }

        channels.push(DeviceChannel {
            device_gid,
            name: Some("Balance".to_string()),
            channel_num: "Balance".to_string(),
            channel_multiplier: 1.0,
            channel_type_gid: None,
            channel_type: Some("Balance".to_string()),
            parent_channel_num: None,
        });

        self.devices.push(Device {
            device_gid,
            manufacturer_device_id: Some(format!("VUE-{device_gid}")),
            model: Some("VUE001".to_string()),
            firmware: Some("1.4.5".to_string()),
            channels,
            location_properties: Some(home_properties(name, "home", "2000", "4")),
            ..Device::default()
        });
    }

    /// Add a smart outlet, optionally hanging off a monitor channel.
    pub fn add_outlet(
        &mut self,
        device_gid: i64,
        name: &str,
        on: bool,
        parent_device_gid: Option<i64>,
        parent_channel_num: Option<&str>,
    ) {
        self.devices.push(Device {
            device_gid,
            manufacturer_device_id: Some(format!("OUTLET-{device_gid}")),
            model: Some("SSO001".to_string()),
            firmware: Some("1.2.3".to_string()),
            parent_device_gid,
            parent_channel_num: parent_channel_num.map(str::to_owned),
            channels: vec![DeviceChannel {
                device_gid,
                name: Some(name.to_string()),
                channel_num: "1,2,3".to_string(),
                channel_multiplier: 1.0,
                channel_type_gid: None,
                channel_type: Some("Outlet".to_string()),
                parent_channel_num: None,
            }],
            outlet: Some(Outlet {
                device_gid,
                outlet_on: on,
                load_gid: device_gid,
                ..Outlet::default()
            }),
            location_properties: Some(home_properties(name, "outlet", "0", "0")),
            ..Device::default()
        });
    }

    /// Add an EV charger, optionally hanging off a monitor channel.
    pub fn add_charger(
        &mut self,
        device_gid: i64,
        name: &str,
        on: bool,
        breaker_size: f64,
        parent_device_gid: Option<i64>,
        parent_channel_num: Option<&str>,
    ) {
        self.devices.push(Device {
            device_gid,
            manufacturer_device_id: Some(format!("EVSE-{device_gid}")),
            model: Some("EVSE001".to_string()),
            firmware: Some("2.1.0".to_string()),
            parent_device_gid,
            parent_channel_num: parent_channel_num.map(str::to_owned),
            channels: vec![DeviceChannel {
                device_gid,
                name: Some(name.to_string()),
                channel_num: "1,2,3".to_string(),
                channel_multiplier: 1.0,
                channel_type_gid: None,
                channel_type: Some("EVSE".to_string()),
                parent_channel_num: None,
            }],
            ev_charger: Some(Charger {
                device_gid,
                load_gid: device_gid,
                charger_on: on,
                message: "EV is not accepting charge".to_string(),
                status: "Standby".to_string(),
                icon: "CarConnected".to_string(),
                icon_label: "Offering Charge".to_string(),
                icon_detail_text: "Check your vehicle for a scheduled charge time.".to_string(),
                debug_code: "311".to_string(),
                charging_rate: breaker_size,
                max_charging_rate: breaker_size,
                load_management_enabled: Some(false),
                ..Charger::default()
            }),
            location_properties: Some(home_properties(name, "evse", "0", "0")),
            ..Device::default()
        });
    }

    /// Set the steady-state draw of a channel, in watts.
    pub fn set_channel_watts(&mut self, device_gid: i64, channel_num: &str, watts: f64) {
        // Stored as kWh over one minute, which is what usage queries serve.
        self.channel_usages
            .insert((device_gid, channel_num.to_string()), watts / 60_000.0);
    }

    /// Mark a channel as bidirectional (generation capable).
    pub fn set_channel_bidirectional(&mut self, device_gid: i64, channel_num: &str) {
        let channel = self
            .devices
            .iter_mut()
            .find(|device| device.device_gid == device_gid)
            .and_then(|device| {
                device
                    .channels
                    .iter_mut()
                    .find(|channel| channel.channel_num == channel_num)
            });
        if let Some(channel) = channel {
            channel.channel_type = Some("Solar".to_string());
        }
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn device(&self, device_gid: i64) -> Option<&Device> {
        self.devices
            .iter()
            .find(|device| device.device_gid == device_gid)
    }

    pub fn channel_types(&self) -> &[ChannelType] {
        &self.channel_types
    }

    /// The `customers/devices` payload.
    pub fn devices_payload(&self) -> Value {
        json!({ "devices": self.devices })
    }

    /// The `customers/devices/status` payload.
    pub fn status(&self) -> DevicesStatus {
        DevicesStatus {
            devices_connected: self
                .devices
                .iter()
                .map(|device| DeviceConnected {
                    device_gid: Some(device.device_gid),
                    connected: true,
                    offline_since: None,
                })
                .collect(),
            outlets: self
                .devices
                .iter()
                .filter_map(|device| device.outlet.clone())
                .collect(),
            ev_chargers: self
                .devices
                .iter()
                .filter_map(|device| device.ev_charger.clone())
                .collect(),
        }
    }

    /// The `getDeviceListUsages` payload for a `+`-separated gid list.
    pub fn usage_payload(&self, device_gids: &str, instant: Option<&str>) -> Value {
        let instant = instant
            .map(str::to_owned)
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let devices: Vec<Value> = device_gids
            .split('+')
            .filter_map(|gid| gid.parse::<i64>().ok())
            .filter_map(|gid| self.device(gid))
            .map(|device| {
                let channel_usages: Vec<Value> = device
                    .channels
                    .iter()
                    .map(|channel| {
                        let usage = self
                            .channel_usages
                            .get(&(device.device_gid, channel.channel_num.clone()))
                            .copied()
                            .unwrap_or(0.0);
                        json!({
                            "name": channel.name,
                            "deviceGid": device.device_gid,
                            "channelNum": channel.channel_num,
                            "usage": usage,
                            "percentage": 0.0,
                        })
                    })
                    .collect();
                json!({
                    "deviceGid": device.device_gid,
                    "channelUsages": channel_usages,
                })
            })
            .collect();

        json!({
            "deviceListUsages": {
                "instant": instant,
                "devices": devices,
            }
        })
    }

    /// Apply an outlet update, returning the new state.
    pub fn update_outlet(&mut self, update: &Value) -> Option<Outlet> {
        let device_gid = update.get("deviceGid")?.as_i64()?;
        let outlet = self
            .devices
            .iter_mut()
            .find(|device| device.device_gid == device_gid)?
            .outlet
            .as_mut()?;

        if let Some(on) = update.get("outletOn").and_then(Value::as_bool) {
            outlet.outlet_on = on;
        }
        Some(outlet.clone())
    }

    /// Apply a charger update, returning the new state.
    pub fn update_charger(&mut self, update: &Value) -> Option<Charger> {
        let device_gid = update.get("deviceGid")?.as_i64()?;
        let charger = self
            .devices
            .iter_mut()
            .find(|device| device.device_gid == device_gid)?
            .ev_charger
            .as_mut()?;

        if let Some(on) = update.get("chargerOn").and_then(Value::as_bool) {
            charger.charger_on = on;
        }
        if let Some(rate) = update.get("chargingRate").and_then(Value::as_f64) {
            charger.charging_rate = rate;
        }
        if let Some(max) = update.get("maxChargingRate").and_then(Value::as_f64) {
            charger.max_charging_rate = max;
        }
        Some(charger.clone())
    }
}

impl Default for SimulatorState {
    fn default() -> Self {
        Self::new()
    }
}

fn home_properties(
    name: &str,
    location_type: &str,
    sq_ft: &str,
    num_people: &str,
) -> LocationProperties {
    LocationProperties {
        device_name: name.to_string(),
        display_name: name.to_string(),
        zip_code: "12345".to_string(),
        time_zone: "America/New_York".to_string(),
        usage_cent_per_kw_hour: 0.12,
        peak_demand_dollar_per_kw: 0.0,
        billing_cycle_start_day: 1,
        solar: false,
        utility_rate_gid: None,
        location_information: Some(LocationInformation {
            air_conditioning: "true".to_string(),
            heat_source: "electricFurnace".to_string(),
            location_sq_ft: sq_ft.to_string(),
            num_electric_cars: "1".to_string(),
            location_type: location_type.to_string(),
            num_people: num_people.to_string(),
            swimming_pool: "false".to_string(),
            hot_tub: "false".to_string(),
        }),
        latitude_longitude: Some(LatitudeLongitude {
            latitude: 40.7128,
            longitude: -74.0060,
        }),
    }
}

/// The default simulated home: one 8-channel monitor, four outlets, one EV
/// charger, with a plausible set of steady-state loads.
pub fn default_home() -> SimulatorState {
    let mut state = SimulatorState::new();

    state.add_monitor(1000, "Home", 8);
    state.add_outlet(1001, "plug1", true, Some(1000), Some("1"));
    state.add_outlet(1002, "plug2", false, Some(1000), Some("1"));
    state.add_outlet(1003, "plug3", true, Some(1000), Some("4"));
    state.add_outlet(1004, "plug4", false, Some(1000), Some("1,2,3"));
    state.add_charger(1005, "EV", true, 50.0, Some(1000), Some("1,2,3"));

    state.set_channel_watts(1005, "1,2,3", 40.0 * 240.0); // EV charger: 40A at 240V
    state.set_channel_watts(1003, "1,2,3", 10.0 * 120.0); // plug3: 10A at 120V
    state.set_channel_watts(1001, "1,2,3", 5.0 * 120.0); // plug1: 5A at 120V
    state.set_channel_bidirectional(1000, "2");
    state.set_channel_watts(1000, "2", -10.0 * 120.0); // circuit 2 generating
    state.set_channel_watts(1000, "1,2,3", 85.0 * 240.0); // whole house: 85A at 240V
    state.set_channel_watts(1000, "Balance", 42.5 * 240.0);

    state
}
