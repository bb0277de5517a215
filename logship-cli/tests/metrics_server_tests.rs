//! Integration tests for metrics server functionality.

use logship_cli::metrics_server;
use logship_core::config::MetricsConfig;
use serial_test::serial;

fn metrics_config(listen_addr: &str, port: u16) -> MetricsConfig {
    MetricsConfig {
        enabled: true,
        listen_addr: listen_addr.to_owned(),
        port,
    }
}

#[test]
fn test_listen_address_parses_ip_and_port() {
    let addr = metrics_server::listen_address(&metrics_config("127.0.0.1", 19464))
        .expect("address should parse");
    assert_eq!(addr.port(), 19464);
    assert!(addr.ip().is_loopback());
}

#[test]
#[serial]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    let result = metrics_server::install_metrics_recorder(&metrics_config("999.999.999.999", 9464));
    assert!(
        result.is_err(),
        "install_metrics_recorder should fail with invalid address"
    );
}

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_succeeds_with_valid_config() {
    let result = metrics_server::install_metrics_recorder(&metrics_config("127.0.0.1", 19465));
    assert!(
        result.is_ok(),
        "install_metrics_recorder should succeed with valid config: {:?}",
        result.err()
    );

    // 전역 레코더는 프로세스당 한 번만 설치 가능
    let second = metrics_server::install_metrics_recorder(&metrics_config("127.0.0.1", 19466));
    assert!(second.is_err(), "a second recorder must be rejected");
}
