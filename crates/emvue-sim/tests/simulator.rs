//! End-to-end tests: typed client over a simulated session against the
//! in-process simulator server.

use emvue_core::{ApiSession, ApiUrl, Error, Scale, Unit, Vue};
use emvue_core::error::ApiError;
use emvue_sim::{default_home, SimulatedSession, SimulatorServer};

async fn client() -> (SimulatorServer, Vue<SimulatedSession>) {
    let server = SimulatorServer::start(default_home())
        .await
        .expect("failed to start simulator");
    let api = ApiUrl::new(server.base_url()).unwrap();
    let session = SimulatedSession::new(api, Some("Sim-User".to_string()));
    (server, Vue::new(session))
}

#[tokio::test]
async fn fetches_the_simulated_customer() {
    let (_server, vue) = client().await;

    let customer = vue.customer().await.unwrap();
    assert_eq!(customer.email, "test@example.com");
    assert_eq!(customer.customer_gid, 1);
}

#[tokio::test]
async fn lists_the_default_home_devices() {
    let (_server, vue) = client().await;

    let devices = vue.devices().await.unwrap();
    assert_eq!(devices.len(), 6);

    let monitor = devices.iter().find(|d| d.device_gid == 1000).unwrap();
    assert_eq!(monitor.model.as_deref(), Some("VUE001"));
    assert_eq!(monitor.channels.len(), 10);

    let charger = devices.iter().find(|d| d.device_gid == 1005).unwrap();
    assert!(charger.ev_charger.is_some());
    assert_eq!(charger.parent_device_gid, Some(1000));
}

#[tokio::test]
async fn reads_location_properties() {
    let (_server, vue) = client().await;

    let properties = vue.device_properties(1000).await.unwrap();
    assert_eq!(properties.device_name, "Home");
    assert_eq!(properties.time_zone, "America/New_York");
}

#[tokio::test]
async fn unknown_device_surfaces_the_simulators_401() {
    let (_server, vue) = client().await;

    // The simulated session remediates the 401 once, gets 401 again, and
    // hands the response through; the typed layer reports the status.
    let err = vue.device_properties(9999).await.unwrap_err();
    match err {
        Error::Api(ApiError::Status { status: 401, message }) => {
            assert!(message.unwrap().contains("9999"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn lists_channel_types() {
    let (_server, vue) = client().await;

    let types = vue.channel_types().await.unwrap();
    assert_eq!(types.len(), 3);
    assert!(types.iter().any(|t| t.description == "Circuit" && t.selectable));
}

#[tokio::test]
async fn reports_seeded_usage() {
    let (_server, vue) = client().await;

    let usage = vue
        .device_list_usage(&[1000, 1005], None, Scale::Minute, Unit::KilowattHours)
        .await
        .unwrap();

    let house = usage[&1000].channel_usage("1,2,3").unwrap();
    assert!((house - 85.0 * 240.0 / 60_000.0).abs() < 1e-9);

    let charger = usage[&1005].channel_usage("1,2,3").unwrap();
    assert!((charger - 40.0 * 240.0 / 60_000.0).abs() < 1e-9);

    // The bidirectional circuit reports generation as negative usage.
    let solar = usage[&1000].channel_usage("2").unwrap();
    assert!(solar < 0.0);
}

#[tokio::test]
async fn toggles_an_outlet() {
    let (_server, vue) = client().await;

    let outlets = vue.outlets().await.unwrap();
    let plug2 = outlets.iter().find(|o| o.device_gid == 1002).unwrap();
    assert!(!plug2.outlet_on);

    let updated = vue.update_outlet(plug2, Some(true)).await.unwrap();
    assert!(updated.outlet_on);

    let outlets = vue.outlets().await.unwrap();
    assert!(outlets.iter().find(|o| o.device_gid == 1002).unwrap().outlet_on);
}

#[tokio::test]
async fn adjusts_the_charger() {
    let (_server, vue) = client().await;

    let chargers = vue.chargers().await.unwrap();
    assert_eq!(chargers.len(), 1);
    let charger = &chargers[0];
    assert!(charger.charger_on);

    let updated = vue
        .update_charger(charger, Some(false), Some(16.0))
        .await
        .unwrap();
    assert!(!updated.charger_on);
    assert_eq!(updated.charging_rate, 16.0);
}

#[tokio::test]
async fn chart_usage_returns_an_empty_series() {
    let (_server, vue) = client().await;

    let chart = vue
        .chart_usage(1000, "1", None, None, Scale::Second, Unit::KilowattHours)
        .await
        .unwrap();
    assert!(chart.usage_list.is_empty());
    assert!(chart.first_usage_instant.is_some());
}

#[tokio::test]
async fn vehicles_are_empty_in_the_simulator() {
    let (_server, vue) = client().await;
    assert!(vue.vehicles().await.unwrap().is_empty());
}

#[tokio::test]
async fn session_reports_the_simulator_identity() {
    let (_server, vue) = client().await;

    assert_eq!(vue.session().username(), "sim-user");
    assert_eq!(vue.session().tokens().id_token.as_deref(), Some("simulator"));

    let anonymous = SimulatedSession::new(ApiUrl::new("http://localhost:3000").unwrap(), None);
    assert_eq!(anonymous.username(), "simulator");
}
