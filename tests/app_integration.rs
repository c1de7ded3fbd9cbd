use fairval::cli::dcf::DcfOverrides;
use fairval::cli::dividend::GordonArgs;
use fairval::cli::fetch::DataSources;
use fairval::core::config::AppConfig;
use fairval::core::fundamentals::Field;
use std::fs;
use tempfile::{NamedTempFile, TempDir};
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_yahoo_mock_server(symbol: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_alphavantage_mock_server(symbol: &str, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "OVERVIEW"))
            .and(query_param("symbol", symbol))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn chart_response(price: f64) -> String {
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{"currency": "BRL", "regularMarketPrice": {price}}},
                        "timestamp": [1714521600, 1714608000],
                        "indicators": {{"quote": [{{"close": [{}, {}]}}]}}
                    }}],
                    "error": null
                }}
            }}"#,
            price - 1.0,
            price - 0.5
        )
    }
}

const COMPANIES: &str = r#"
companies:
  - ticker: "PETR4"
    name: "Petrobras"
    sector: "Energy"
    fundamentals:
      price: 36.90
      pe_ratio: 4.5
      pb_ratio: 0.9
      dividend_yield: 0.1768
      eps: 8.20
      book_value_per_share: 30.97
    dcf:
      initial_fcff: 1000.0
      stage1_growth_pct: 5.0
      stage1_years: 5
      stage2_growth_pct: 3.0
      wacc_pct: 10.0
      shares_outstanding: 100.0
      net_debt: 500.0
  - ticker: "ITUB4"
    name: "Itaú Unibanco"
    sector: "Financial Services"
    fundamentals:
      price: 20.58
      pe_ratio: 9.8
      pb_ratio: 1.3
      dividend_yield: 6.5
      eps: 2.10
      book_value_per_share: 18.50
"#;

fn write_config(providers: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("Failed to create temp file");
    let content = format!("currency: \"BRL\"\n{providers}\n{COMPANIES}");
    fs::write(config_file.path(), content).expect("Failed to write config file");
    config_file
}

fn path_of(file: &NamedTempFile) -> &str {
    file.path().to_str().expect("temp path is not UTF-8")
}

fn cache_path_line(dir: &TempDir) -> String {
    format!("cache_path: {}", dir.path().display())
}

#[test_log::test(tokio::test)]
async fn test_offline_report_for_several_tickers() {
    let config_file = write_config("");

    let result = fairval::run_command(
        fairval::AppCommand::Report {
            tickers: vec!["PETR4".to_string(), "itub4".to_string(), "XXXX3".to_string()],
        },
        Some(path_of(&config_file)),
        true,
    )
    .await;
    assert!(result.is_ok(), "Report failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_offline_single_method_commands() {
    let config_file = write_config("");
    let config_path = Some(path_of(&config_file));

    let commands = vec![
        fairval::AppCommand::Normalize {
            ticker: "ITUB4".to_string(),
        },
        fairval::AppCommand::Multiples {
            ticker: "PETR4".to_string(),
        },
        fairval::AppCommand::Gordon {
            ticker: "PETR4".to_string(),
            args: GordonArgs {
                growth_pct: Some(3.0),
                required_return_pct: Some(10.0),
                sensitivity: true,
            },
        },
        fairval::AppCommand::Dcf {
            ticker: "PETR4".to_string(),
            overrides: DcfOverrides {
                wacc_pct: Some(11.0),
                ..Default::default()
            },
            sensitivity: true,
        },
        fairval::AppCommand::Sectors,
    ];

    for command in commands {
        let result = fairval::run_command(command, config_path, true).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }
}

#[test_log::test(tokio::test)]
async fn test_dcf_without_inputs_fails() {
    let config_file = write_config("");

    let result = fairval::run_command(
        fairval::AppCommand::Dcf {
            ticker: "ITUB4".to_string(),
            overrides: DcfOverrides::default(),
            sensitivity: false,
        },
        Some(path_of(&config_file)),
        true,
    )
    .await;
    let err = result.expect_err("DCF without inputs should fail");
    assert!(err.to_string().contains("No usable DCF inputs for ITUB4"));
}

#[test_log::test(tokio::test)]
async fn test_dcf_rejects_wacc_not_above_growth() {
    let config_file = write_config("");

    let result = fairval::run_command(
        fairval::AppCommand::Dcf {
            ticker: "PETR4".to_string(),
            overrides: DcfOverrides {
                wacc_pct: Some(3.0),
                ..Default::default()
            },
            sensitivity: false,
        },
        Some(path_of(&config_file)),
        true,
    )
    .await;
    let err = result.expect_err("WACC equal to growth should fail");
    assert!(err.to_string().contains("must be greater than"));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file() {
    let result = fairval::run_command(
        fairval::AppCommand::Sectors,
        Some("/nonexistent/fairval/config.yaml"),
        true,
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_live_sources_are_consolidated() {
    let yahoo = test_utils::create_yahoo_mock_server(
        "PETR4.SA",
        200,
        &test_utils::chart_response(38.5),
    )
    .await;
    let alphavantage = test_utils::create_alphavantage_mock_server(
        "PETR4.SAO",
        r#"{
            "Symbol": "PETR4.SAO",
            "Name": "Petroleo Brasileiro",
            "Sector": "ENERGY",
            "EPS": "8.50",
            "BookValue": "31.20",
            "PERatio": "4.4",
            "PriceToBookRatio": "1.2",
            "DividendYield": "0.15",
            "EVToEBITDA": "3.1"
        }"#,
    )
    .await;

    let cache_dir = TempDir::new().unwrap();
    let config_file = write_config(&format!(
        r#"
{}
providers:
  yahoo:
    base_url: {}
    symbol_suffix: ".SA"
  alphavantage:
    base_url: {}
    api_key: "test-key"
    symbol_suffix: ".SAO"
"#,
        cache_path_line(&cache_dir),
        yahoo.uri(),
        alphavantage.uri()
    ));

    let config = AppConfig::load_from_path(config_file.path()).unwrap();
    let sources = DataSources::from_config(&config, false);
    let data = sources.load_company(&config, "PETR4").await;
    drop(sources);
    info!(?data, "Consolidated company data");

    assert_eq!(data.raw.source, "alphavantage");
    assert_eq!(data.raw.get(Field::Price), Some(38.5));
    assert_eq!(data.raw.get(Field::Eps), Some(8.5));
    assert_eq!(data.raw.get(Field::EvToEbitda), Some(3.1));
    // Configured sector and name win over the provider's
    assert_eq!(data.raw.sector.as_deref(), Some("Energy"));
    assert_eq!(data.name.as_deref(), Some("Petrobras"));
    assert_eq!(data.history.as_ref().map(|h| h.closes.len()), Some(2));

    let result = fairval::run_command(
        fairval::AppCommand::Report {
            tickers: vec!["PETR4".to_string()],
        },
        Some(path_of(&config_file)),
        false,
    )
    .await;
    assert!(result.is_ok(), "Report failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_failing_sources_fall_back_to_snapshot() {
    let yahoo = test_utils::create_yahoo_mock_server("ITUB4.SA", 500, "oops").await;
    // No overview mock mounted: every Alpha Vantage request gets a 404
    let alphavantage = wiremock::MockServer::start().await;

    let cache_dir = TempDir::new().unwrap();
    let config_file = write_config(&format!(
        r#"
{}
providers:
  yahoo:
    base_url: {}
    symbol_suffix: ".SA"
  alphavantage:
    base_url: {}
    api_key: "test-key"
"#,
        cache_path_line(&cache_dir),
        yahoo.uri(),
        alphavantage.uri()
    ));

    let config = AppConfig::load_from_path(config_file.path()).unwrap();
    let sources = DataSources::from_config(&config, false);
    let data = sources.load_company(&config, "ITUB4").await;
    drop(sources);

    assert_eq!(data.raw.source, "reference");
    assert_eq!(data.raw.get(Field::Price), Some(20.58));
    assert!(data.history.is_none());

    let result = fairval::run_command(
        fairval::AppCommand::Gordon {
            ticker: "ITUB4".to_string(),
            args: GordonArgs::default(),
        },
        Some(path_of(&config_file)),
        false,
    )
    .await;
    assert!(result.is_ok(), "Gordon failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_fetched_data_is_reused_by_later_runs() {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let yahoo = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/VALE3.SA"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_utils::chart_response(61.2)),
        )
        .expect(1)
        .mount(&yahoo)
        .await;
    let alphavantage = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("symbol", "VALE3.SAO"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Symbol": "VALE3.SAO", "Name": "Vale", "EPS": "7.10", "PERatio": "8.6"}"#,
        ))
        .expect(1)
        .mount(&alphavantage)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let config_file = write_config(&format!(
        r#"
{}
cache_ttl_secs: 3600
providers:
  yahoo:
    base_url: {}
    symbol_suffix: ".SA"
  alphavantage:
    base_url: {}
    api_key: "test-key"
    symbol_suffix: ".SAO"
"#,
        cache_path_line(&cache_dir),
        yahoo.uri(),
        alphavantage.uri()
    ));
    let config = AppConfig::load_from_path(config_file.path()).unwrap();

    let first = {
        let sources = DataSources::from_config(&config, false);
        sources.load_company(&config, "VALE3").await
    };
    let second = {
        let sources = DataSources::from_config(&config, false);
        sources.load_company(&config, "vale3").await
    };

    assert_eq!(first.raw.source, "alphavantage");
    assert_eq!(first.raw.get(Field::PeRatio), Some(8.6));
    assert_eq!(first.raw.get(Field::Price), Some(61.2));
    assert_eq!(second.raw, first.raw);
    assert_eq!(second.history, first.history);

    yahoo.verify().await;
    alphavantage.verify().await;
}
