use cambio::AppCommand;
use cambio::cli::RateOverrides;
use cambio::core::config::AppConfig;
use cambio::core::scheduler::{self, Variant};
use cambio::core::{
    ComparisonRow, ConversionResult, RateError, RateModel, RefreshOutcome, RefreshScheduler,
    SchedulerHandle, SimpleConversion, View,
};
use cambio::providers::exchangerate_api::ExchangeRateApiProvider;
use chrono::{DateTime, Local};
use std::sync::Mutex;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/latest/BRL"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
        providers:
          exchangerate_api:
            base_url: {base_url}
            retries: 0
        rates:
          tax_percent: 65
          mep_percent: 10
    "#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

/// Keeps the last value handed to each render call.
#[derive(Default)]
struct CapturingView {
    rates: Mutex<Option<RateModel>>,
    conversion: Mutex<Option<ConversionResult>>,
    comparison: Mutex<Vec<ComparisonRow>>,
    error: Mutex<Option<(String, bool)>>,
}

impl View for CapturingView {
    fn render_rates(&self, model: &RateModel) {
        *self.rates.lock().unwrap() = Some(model.clone());
    }

    fn render_conversion(&self, result: &ConversionResult) {
        *self.conversion.lock().unwrap() = Some(*result);
    }

    fn render_simple_conversion(&self, _result: &SimpleConversion) {}

    fn render_comparison(&self, rows: &[ComparisonRow]) {
        *self.comparison.lock().unwrap() = rows.to_vec();
    }

    fn render_error(&self, error: &RateError, retry: Option<&SchedulerHandle>) {
        *self.error.lock().unwrap() = Some((error.to_string(), retry.is_some()));
    }

    fn render_last_update(&self, _timestamp: DateTime<Local>) {}
}

fn scheduler_from_config(
    config_file: &tempfile::NamedTempFile,
    handle: &SchedulerHandle,
) -> RefreshScheduler<ExchangeRateApiProvider, CapturingView> {
    let config = AppConfig::load_from_path(config_file.path()).expect("Failed to load config");
    let provider = ExchangeRateApiProvider::from_config(&config.providers.exchangerate_api)
        .expect("Failed to create provider");
    let mut model = RateModel::default();
    model.set_tax_percent(config.rates.tax_percent).unwrap();
    model.set_mep_percent(config.rates.mep_percent).unwrap();
    RefreshScheduler::new(
        provider,
        CapturingView::default(),
        model,
        config.scheduler_settings(Variant::Extended),
        handle,
    )
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

const RATES_RESPONSE: &str = r#"{
    "base": "BRL",
    "rates": { "BRL": 1, "USD": 0.19, "ARS": 190.0 }
}"#;

#[test_log::test(tokio::test)]
async fn test_convert_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(200, RATES_RESPONSE).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = cambio::run_command(
        AppCommand::Convert {
            amount: "10".to_string(),
            variant: Variant::Extended,
            overrides: RateOverrides::default(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_simple_convert_flow_with_overrides() {
    let mock_server = test_utils::create_mock_server(200, RATES_RESPONSE).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = cambio::run_command(
        AppCommand::Convert {
            amount: "25.5".to_string(),
            variant: Variant::Simple,
            overrides: RateOverrides {
                tax_percent: Some(30.0),
                mep_percent: Some(5.0),
            },
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_rates_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(200, RATES_RESPONSE).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = cambio::run_command(
        AppCommand::Rates {
            overrides: RateOverrides::default(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_server_error_is_reported() {
    let mock_server = test_utils::create_mock_server(500, "").await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = cambio::run_command(
        AppCommand::Rates {
            overrides: RateOverrides::default(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("a 500 response must fail the command");
    info!(error = %err, "Command failed as expected");
    assert!(err.to_string().contains("Could not load exchange rates"));
}

#[test_log::test(tokio::test)]
async fn test_invalid_amount_is_rejected_before_fetching() {
    let mock_server = wiremock::MockServer::start().await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = cambio::run_command(
        AppCommand::Convert {
            amount: "ten".to_string(),
            variant: Variant::Extended,
            overrides: RateOverrides::default(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Invalid amount"));
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing.yaml");

    let result = cambio::run_command(
        AppCommand::Rates {
            overrides: RateOverrides::default(),
        },
        Some(missing.to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
    assert!(!missing.exists());
}

#[test_log::test(tokio::test)]
async fn test_refresh_and_convert_render_expected_figures() {
    let mock_server = test_utils::create_mock_server(200, RATES_RESPONSE).await;
    let config_file = test_utils::write_config(&mock_server.uri());
    let (handle, _commands) = scheduler::command_channel();
    let scheduler = scheduler_from_config(&config_file, &handle);

    assert_eq!(scheduler.refresh().await, RefreshOutcome::Updated);
    scheduler.set_amount(10.0).await;

    let view = scheduler.view();
    let rates = view.rates.lock().unwrap().clone().expect("rates rendered");
    assert_close(rates.usd_official_to_ars(), 1000.0);
    assert_close(rates.usd_card_to_ars(), 1650.0);
    assert_close(rates.usd_mep_to_ars(), 1100.0);

    let conversion = view.conversion.lock().unwrap().expect("conversion rendered");
    assert_close(conversion.usd, 1.9);
    assert_close(conversion.ars_card, 3135.0);
    assert_close(conversion.ars_mep, 2090.0);
    assert_close(conversion.savings, 1045.0);
    assert_close(conversion.savings_percent.unwrap(), 100.0 / 3.0);

    let comparison = view.comparison.lock().unwrap();
    assert_eq!(comparison.len(), 6);
    assert_close(comparison[5].brl_amount, 100.0);
    assert_close(comparison[5].ars_card, 31350.0);
    assert_close(comparison[5].ars_mep, 20900.0);
    assert!(view.error.lock().unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_offers_retry_only_while_handle_is_alive() {
    let mock_server = test_utils::create_mock_server(500, "").await;
    let config_file = test_utils::write_config(&mock_server.uri());
    let (handle, _commands) = scheduler::command_channel();
    let scheduler = scheduler_from_config(&config_file, &handle);

    assert_eq!(scheduler.refresh().await, RefreshOutcome::Failed);
    let (message, retry) = scheduler.view().error.lock().unwrap().clone().unwrap();
    assert!(message.contains("500"));
    assert!(retry);

    drop(handle);
    assert_eq!(scheduler.refresh().await, RefreshOutcome::Failed);
    let (_, retry) = scheduler.view().error.lock().unwrap().clone().unwrap();
    assert!(!retry);
    assert!(scheduler.view().rates.lock().unwrap().is_none());
}
