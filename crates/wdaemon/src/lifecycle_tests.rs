use super::*;
use serial_test::serial;

fn clear_env() {
    for key in ["SATH_GRPC", "SATH_MODE", "HOSTNAME", "WORKER_MAX_CONCURRENT_JOBS"] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn resolve_config_prefers_the_cli_flag_over_sath_grpc() {
    clear_env();
    std::env::set_var("SATH_GRPC", "http://from-env:7777");
    let config =
        resolve_config(PathBuf::from("/tmp/sath-test-home"), Some("http://from-flag:9999".to_string()))
            .unwrap();
    assert_eq!(config.grpc_addr, "http://from-flag:9999");
    clear_env();
}

#[test]
#[serial]
fn resolve_config_falls_back_to_sath_grpc_then_the_default() {
    clear_env();
    let config = resolve_config(PathBuf::from("/tmp/sath-test-home"), None).unwrap();
    assert_eq!(config.grpc_addr, "http://127.0.0.1:7777");

    std::env::set_var("SATH_GRPC", "http://from-env:7777");
    let config = resolve_config(PathBuf::from("/tmp/sath-test-home"), None).unwrap();
    assert_eq!(config.grpc_addr, "http://from-env:7777");
    clear_env();
}

#[test]
#[serial]
fn resolve_config_debug_mode_disables_tls() {
    clear_env();
    let config = resolve_config(PathBuf::from("/tmp/sath-test-home"), None).unwrap();
    assert!(config.tls);

    std::env::set_var("SATH_MODE", "debug");
    let config = resolve_config(PathBuf::from("/tmp/sath-test-home"), None).unwrap();
    assert!(!config.tls);
    clear_env();
}
