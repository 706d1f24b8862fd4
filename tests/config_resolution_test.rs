use anyhow::Result;
use camper_watch::utils::validation::Validate;
use camper_watch::{CliArgs, FileConfig, MonitorConfig};
use clap::Parser;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_cli_beats_file_and_file_beats_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{
            "telegram_token": "file-token",
            "telegram_chats": [-1001, "42"],
            "default_cities": ["Lyon", "Nice"],
            "heartbeat_days": 2
        }"#,
    )?;

    let args = CliArgs::try_parse_from([
        "camper-watch",
        "--config",
        config_path.to_str().unwrap(),
        "--cities",
        "Madrid,Zürich",
        "--telegram-token",
        "cli-token",
    ])?;

    let file = FileConfig::load_or_warn(&args.config);
    let config = MonitorConfig::resolve(args.overrides(), file);

    assert_eq!(config.notifier_token, "cli-token");
    assert_eq!(config.target_cities, vec!["Madrid", "Zürich"]);
    assert_eq!(config.notifier_targets, vec!["-1001", "42"]);
    assert_eq!(config.liveness_interval, Duration::from_secs(2 * 86_400));
    assert_eq!(config.seen_store_path, "seen_offers.json");
    assert_eq!(config.config_path, config_path);
    tokio_test::assert_ok!(config.validate());
    Ok(())
}

#[test]
fn test_toml_config_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("camper.toml");
    std::fs::write(
        &config_path,
        r#"
telegram_token = "toml-token"
telegram_chats = ["7"]
seen_file = "state/seen.json"
poll_interval_secs = 120
"#,
    )?;

    let args =
        CliArgs::try_parse_from(["camper-watch", "--config", config_path.to_str().unwrap()])?;
    let config = MonitorConfig::resolve(args.overrides(), FileConfig::load_or_warn(&args.config));

    assert_eq!(config.seen_store_path, "state/seen.json");
    assert_eq!(config.poll_interval, Duration::from_secs(120));
    Ok(())
}

#[test]
fn test_missing_credentials_is_fatal() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let args = CliArgs::try_parse_from([
        "camper-watch",
        "--config",
        temp_dir.path().join("absent.json").to_str().unwrap(),
        "--telegram-token",
        "",
        "--telegram-chats",
        "",
    ])?;

    let config = MonitorConfig::resolve(args.overrides(), FileConfig::load_or_warn(&args.config));
    let err = config.validate().unwrap_err();
    assert!(err.is_fatal());
    Ok(())
}
