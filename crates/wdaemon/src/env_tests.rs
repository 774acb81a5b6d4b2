use super::*;
use serial_test::serial;

fn clear_all() {
    for key in [
        "SATH_ENV",
        "SATH_GRPC",
        "SATH_MODE",
        "HOSTNAME",
        "WORKER_MAX_CONCURRENT_JOBS",
        "WORKER_FETCH_INTERVAL_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn running_in_docker_is_false_unless_sath_env_is_docker() {
    clear_all();
    assert!(!running_in_docker());
    std::env::set_var("SATH_ENV", "bare-metal");
    assert!(!running_in_docker());
    std::env::set_var("SATH_ENV", "docker");
    assert!(running_in_docker());
    clear_all();
}

#[test]
#[serial]
fn grpc_endpoint_is_none_when_unset_or_empty() {
    clear_all();
    assert_eq!(grpc_endpoint(), None);
    std::env::set_var("SATH_GRPC", "");
    assert_eq!(grpc_endpoint(), None);
    std::env::set_var("SATH_GRPC", "https://scheduler.example:443");
    assert_eq!(grpc_endpoint().as_deref(), Some("https://scheduler.example:443"));
    clear_all();
}

#[test]
#[serial]
fn debug_mode_requires_exact_match() {
    clear_all();
    assert!(!debug_mode());
    std::env::set_var("SATH_MODE", "verbose");
    assert!(!debug_mode());
    std::env::set_var("SATH_MODE", "debug");
    assert!(debug_mode());
    clear_all();
}

#[test]
#[serial]
fn hostname_falls_back_when_unset() {
    clear_all();
    assert_eq!(hostname(), "unknown-host");
    std::env::set_var("HOSTNAME", "node-7");
    assert_eq!(hostname(), "node-7");
    clear_all();
}

#[test]
#[serial]
fn max_concurrent_jobs_defaults_to_one_and_rejects_zero() {
    clear_all();
    assert_eq!(max_concurrent_jobs(), 1);
    std::env::set_var("WORKER_MAX_CONCURRENT_JOBS", "0");
    assert_eq!(max_concurrent_jobs(), 1);
    std::env::set_var("WORKER_MAX_CONCURRENT_JOBS", "4");
    assert_eq!(max_concurrent_jobs(), 4);
    clear_all();
}

#[test]
#[serial]
fn fetch_interval_defaults_to_30s() {
    clear_all();
    assert_eq!(fetch_interval(), Duration::from_secs(30));
    std::env::set_var("WORKER_FETCH_INTERVAL_MS", "500");
    assert_eq!(fetch_interval(), Duration::from_millis(500));
    clear_all();
}
