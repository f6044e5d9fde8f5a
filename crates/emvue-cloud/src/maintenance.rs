//! Maintenance-banner probe.

use serde::Deserialize;

/// Public maintenance status object; served from object storage, not the
/// API, so no credentials are involved.
pub const MAINTENANCE_URL: &str =
    "https://s3.amazonaws.com/com.emporiaenergy.manual.ota/maintenance/maintenance.json";

#[derive(Debug, Default, Deserialize)]
struct MaintenanceNotice {
    msg: Option<String>,
}

/// Returns the maintenance banner text when the service is down for
/// maintenance, `None` otherwise (including on any fetch error — an
/// unreachable banner is not an outage signal).
pub async fn down_for_maintenance(http: &reqwest::Client) -> Option<String> {
    let response = http.get(MAINTENANCE_URL).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let notice: MaintenanceNotice = response.json().await.ok()?;
    notice.msg
}
