//! Usage report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage for a set of devices at one instant, from `getDeviceListUsages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceListUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant: Option<DateTime<Utc>>,
    pub devices: Vec<UsageDevice>,
}

/// Per-device usage, one entry per channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageDevice {
    pub device_gid: i64,
    /// The upstream occasionally emits `null` entries in this list.
    pub channel_usages: Vec<Option<ChannelUsage>>,
}

impl UsageDevice {
    /// True if any channel is still waiting for data (`usage: null`).
    pub fn has_missing_data(&self) -> bool {
        self.channel_usages
            .iter()
            .flatten()
            .any(|channel| channel.usage.is_none())
    }

    /// Look up a channel's usage value by channel number.
    pub fn channel_usage(&self, channel_num: &str) -> Option<f64> {
        self.channel_usages
            .iter()
            .flatten()
            .find(|channel| channel.channel_num == channel_num)
            .and_then(|channel| channel.usage)
    }
}

/// Usage for one channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub device_gid: i64,
    pub channel_num: String,
    /// `None` until the backend has data for the requested instant.
    pub usage: Option<f64>,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_devices: Vec<Option<UsageDevice>>,
}

/// Time-series usage for one channel, from `getChartUsage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_usage_instant: Option<DateTime<Utc>>,
    pub usage_list: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_missing_channel_data() {
        let device: UsageDevice = serde_json::from_value(json!({
            "deviceGid": 1000,
            "channelUsages": [
                {"deviceGid": 1000, "channelNum": "1,2,3", "usage": 0.34, "percentage": 100.0},
                {"deviceGid": 1000, "channelNum": "2", "usage": null, "percentage": 0.0},
                null
            ]
        }))
        .unwrap();

        assert!(device.has_missing_data());
        assert_eq!(device.channel_usage("1,2,3"), Some(0.34));
        assert_eq!(device.channel_usage("2"), None);
    }

    #[test]
    fn chart_usage_tolerates_null_samples() {
        let chart: ChartUsage = serde_json::from_value(json!({
            "firstUsageInstant": "2024-06-01T12:00:00Z",
            "usageList": [0.1, null, 0.3]
        }))
        .unwrap();

        assert!(chart.first_usage_instant.is_some());
        assert_eq!(chart.usage_list, vec![Some(0.1), None, Some(0.3)]);
    }
}
