//! Typed client over an authenticated session.
//!
//! `Vue` is thin glue: each method formats an endpoint path, dispatches it
//! through the session's pipeline, and decodes the JSON answer into the
//! model types. It works identically over the cloud session and the
//! simulated session.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::models::{
    ChannelType, ChartUsage, Charger, Customer, Device, DeviceChannel, DeviceListUsage,
    DevicesStatus, LocationProperties, Outlet, UsageDevice, Vehicle, VehicleStatus,
};
use crate::retry::RetryPolicy;
use crate::traits::ApiSession;
use crate::types::{Scale, Unit};
use crate::Result;

const API_CUSTOMER: &str = "customers";
const API_CUSTOMER_DEVICES: &str = "customers/devices";
const API_CHANNEL_TYPES: &str = "devices/channels/channeltypes";
const API_GET_STATUS: &str = "customers/devices/status";
const API_OUTLET: &str = "devices/outlet";
const API_CHARGER: &str = "devices/evcharger";
const API_VEHICLES: &str = "customers/vehicles";

/// Channel numbers that have no chart data of their own.
const GRID_CHANNELS: [&str; 2] = ["MainsFromGrid", "MainsToGrid"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DevicesEnvelope {
    devices: Vec<Device>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UsageEnvelope {
    device_list_usages: Option<DeviceListUsage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VehicleStatusEnvelope {
    settings: Option<VehicleStatus>,
}

/// Typed API client for the metering service.
///
/// # Example
///
/// ```no_run
/// use emvue_core::{ApiSession, Vue};
///
/// # async fn example<S: ApiSession>(session: S) -> emvue_core::Result<()> {
/// let vue = Vue::new(session);
/// for device in vue.devices().await? {
///     println!("{}", device.device_gid);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Vue<S> {
    session: S,
}

impl<S: ApiSession> Vue<S> {
    /// Wrap an authenticated session.
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Access the underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Fetch the account details.
    pub async fn customer(&self) -> Result<Customer> {
        self.session.get(API_CUSTOMER).await?.json()
    }

    /// Fetch all devices, flattening nested sub-devices into the list.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let envelope: DevicesEnvelope = self.session.get(API_CUSTOMER_DEVICES).await?.json()?;

        let mut devices = Vec::new();
        for mut device in envelope.devices {
            let nested = std::mem::take(&mut device.devices);
            devices.push(device);
            devices.extend(nested);
        }
        Ok(devices)
    }

    /// Fetch the location metadata for one device.
    pub async fn device_properties(&self, device_gid: i64) -> Result<LocationProperties> {
        let path = format!("devices/{device_gid}/locationProperties");
        self.session.get(&path).await?.json()
    }

    /// Update a channel's settings (name, multiplier, type).
    pub async fn update_channel(&self, channel: &DeviceChannel) -> Result<DeviceChannel> {
        let path = format!("devices/{}/channels", channel.device_gid);
        let body = json!({
            "deviceGid": channel.device_gid,
            "name": channel.name,
            "channelNum": channel.channel_num,
            "channelMultiplier": channel.channel_multiplier,
            "channelTypeGid": channel.channel_type_gid,
            "type": channel.channel_type,
            "parentChannelNum": channel.parent_channel_num,
        });
        self.session.put_json(&path, body).await?.json()
    }

    /// Fetch the selectable channel types.
    pub async fn channel_types(&self) -> Result<Vec<ChannelType>> {
        self.session.get(API_CHANNEL_TYPES).await?.json()
    }

    /// Fetch usage for a list of devices at an instant.
    ///
    /// The backend fills channel data asynchronously, so freshly queried
    /// instants can come back with `usage: null` holes; this retries with
    /// the usual backoff until the data is complete or the budget runs out,
    /// and returns whatever was gathered, keyed by device gid.
    pub async fn device_list_usage(
        &self,
        device_gids: &[i64],
        instant: Option<DateTime<Utc>>,
        scale: Scale,
        unit: Unit,
    ) -> Result<HashMap<i64, UsageDevice>> {
        // Slower first retry than the dispatcher's default; data holes
        // take longer to fill than 503s take to clear.
        let policy = RetryPolicy::from_secs(5, 2.0, 30.0);
        self.device_list_usage_with_policy(device_gids, instant, scale, unit, &policy)
            .await
    }

    /// [`Vue::device_list_usage`] with an explicit retry policy.
    #[instrument(skip_all, fields(devices = device_gids.len()))]
    pub async fn device_list_usage_with_policy(
        &self,
        device_gids: &[i64],
        instant: Option<DateTime<Utc>>,
        scale: Scale,
        unit: Unit,
        policy: &RetryPolicy,
    ) -> Result<HashMap<i64, UsageDevice>> {
        let gids = device_gids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        let instant = instant.unwrap_or_else(Utc::now);
        let path = format!(
            "AppAPI?apiMethod=getDeviceListUsages&deviceGids={gids}&instant={}&scale={scale}&energyUnit={unit}",
            format_instant(instant)
        );

        let mut gathered: HashMap<i64, UsageDevice> = HashMap::new();
        for attempt in 1..=policy.max_attempts() {
            if attempt > 1 {
                sleep(policy.delay_for(attempt - 1)).await;
            }

            let response = self.session.get(&path).await?;
            let mut update_failed = false;

            let report = if response.is_success() {
                response.json::<UsageEnvelope>().ok()
            } else {
                None
            }
            .and_then(|envelope| envelope.device_list_usages);

            match report {
                Some(report) => {
                    for device in report.devices {
                        let missing = device.has_missing_data();
                        update_failed = update_failed || missing;
                        if !missing || attempt == policy.max_attempts() {
                            gathered.insert(device.device_gid, device);
                        }
                    }
                }
                None => update_failed = true,
            }

            if !update_failed {
                break;
            }
            debug!(attempt, "usage data incomplete");
        }

        Ok(gathered)
    }

    /// Fetch time-series usage for one channel.
    ///
    /// The synthetic grid channels carry no chart data; for those this
    /// returns an empty series without a network call.
    pub async fn chart_usage(
        &self,
        device_gid: i64,
        channel_num: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        scale: Scale,
        unit: Unit,
    ) -> Result<ChartUsage> {
        if GRID_CHANNELS.contains(&channel_num) {
            return Ok(ChartUsage {
                first_usage_instant: start,
                usage_list: Vec::new(),
            });
        }

        let start = start.unwrap_or_else(Utc::now);
        let end = end.unwrap_or_else(Utc::now);
        let path = format!(
            "AppAPI?apiMethod=getChartUsage&deviceGid={device_gid}&channel={channel_num}&start={}&end={}&scale={scale}&energyUnit={unit}",
            format_instant(start),
            format_instant(end)
        );

        let mut chart: ChartUsage = self.session.get(&path).await?.json()?;
        if chart.first_usage_instant.is_none() {
            chart.first_usage_instant = Some(start);
        }
        Ok(chart)
    }

    /// Fetch the connectivity/outlet/charger status snapshot.
    pub async fn devices_status(&self) -> Result<DevicesStatus> {
        self.session.get(API_GET_STATUS).await?.json()
    }

    /// Fetch all smart outlets.
    pub async fn outlets(&self) -> Result<Vec<Outlet>> {
        Ok(self.devices_status().await?.outlets)
    }

    /// Switch an outlet, returning its updated state.
    pub async fn update_outlet(&self, outlet: &Outlet, on: Option<bool>) -> Result<Outlet> {
        let body = json!({
            "deviceGid": outlet.device_gid,
            "outletOn": on.unwrap_or(outlet.outlet_on),
            "loadGid": outlet.load_gid,
        });
        self.session.put_json(API_OUTLET, body).await?.json()
    }

    /// Fetch all EV chargers.
    pub async fn chargers(&self) -> Result<Vec<Charger>> {
        Ok(self.devices_status().await?.ev_chargers)
    }

    /// Switch a charger or adjust its rate, returning its updated state.
    pub async fn update_charger(
        &self,
        charger: &Charger,
        on: Option<bool>,
        charge_rate: Option<f64>,
    ) -> Result<Charger> {
        let mut body = json!({
            "deviceGid": charger.device_gid,
            "loadGid": charger.load_gid,
            "chargerOn": on.unwrap_or(charger.charger_on),
            "chargingRate": charge_rate.unwrap_or(charger.charging_rate),
            "maxChargingRate": charger.max_charging_rate,
        });
        if let Some(pin) = &charger.breaker_pin {
            body["breakerPIN"] = json!(pin);
        }
        self.session.put_json(API_CHARGER, body).await?.json()
    }

    /// Fetch the linked vehicles.
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>> {
        self.session.get(API_VEHICLES).await?.json()
    }

    /// Fetch the charging status of one vehicle, if the backend has one.
    pub async fn vehicle_status(&self, vehicle_gid: i64) -> Result<Option<VehicleStatus>> {
        let path = format!("vehicles/v2/settings?vehicleGid={vehicle_gid}");
        let envelope: VehicleStatusEnvelope = self.session.get(&path).await?.json()?;
        Ok(envelope.settings)
    }
}

/// Format an instant the way the upstream query parameters expect:
/// whole-second UTC ISO-8601 with a `Z` suffix.
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
