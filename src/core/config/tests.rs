use super::data::{Config, RevealSettings};
use super::defaults::{DEFAULT_BATCH_SIZE, DEFAULT_BOT_LABEL, DEFAULT_CLEANUP, DEFAULT_TRIGGERS};
use super::io::ConfigError;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.bot_label(), DEFAULT_BOT_LABEL);
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        bot_label: Some("CGI".to_string()),
        reveal: RevealSettings {
            tick_ms: Some(10),
            batch_size: Some(3),
            ..Default::default()
        },
        ..Default::default()
    };
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let mut loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);

    loaded.unset_value("bot-label").expect("unset");
    loaded
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let reloaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(reloaded.bot_label, None);
    assert_eq!(reloaded.reveal.batch_size, Some(3));
}

#[test]
fn parse_errors_name_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "bot_label = [").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    let config_err = err
        .downcast_ref::<ConfigError>()
        .expect("config error type");
    assert!(matches!(config_err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn toml_sections_map_onto_settings() {
    let config: Config = toml::from_str(
        r#"
bot_label = "CGI"

[reveal]
tick_ms = 8
cancel_previous = true

[split]
cleanup = ["```html", "```", "HTML:"]
"#,
    )
    .expect("valid toml");

    let reveal = config.reveal_config();
    assert_eq!(reveal.tick, Duration::from_millis(8));
    assert_eq!(reveal.batch_size, DEFAULT_BATCH_SIZE);
    assert!(reveal.cancel_previous);

    let split = config.split_config();
    assert_eq!(split.triggers.len(), DEFAULT_TRIGGERS.len());
    assert_eq!(split.cleanup, vec!["```html", "```", "HTML:"]);
}

#[test]
fn zero_values_are_clamped_when_read_from_file() {
    let config = Config {
        reveal: RevealSettings {
            tick_ms: Some(0),
            batch_size: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };
    let reveal = config.reveal_config();
    assert_eq!(reveal.tick, Duration::from_millis(1));
    assert_eq!(reveal.batch_size, 1);
}

#[test]
fn set_value_validates_input() {
    let mut config = Config::default();

    config.set_value("reveal.tick-ms", "12").expect("tick");
    assert_eq!(config.reveal.tick_ms, Some(12));

    assert!(matches!(
        config.set_value("reveal.tick-ms", "0"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.set_value("reveal.batch-size", "many"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.set_value("reveal.cancel-previous", "maybe"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.set_value("theme", "dark"),
        Err(ConfigError::UnknownKey(_))
    ));

    config
        .set_value("reveal.cancel-previous", "on")
        .expect("bool");
    assert_eq!(config.reveal.cancel_previous, Some(true));
}

#[test]
fn split_lists_extend_defaults() {
    let mut config = Config::default();
    config.set_value("split.trigger", r"(?i)giá:").expect("trigger");
    config.set_value("split.cleanup", "Html:").expect("cleanup");

    let split = config.split_config();
    assert_eq!(split.triggers.len(), DEFAULT_TRIGGERS.len() + 1);
    assert_eq!(split.triggers.last().map(String::as_str), Some(r"(?i)giá:"));
    assert_eq!(split.cleanup.len(), DEFAULT_CLEANUP.len() + 1);

    let err = config
        .set_value("split.trigger", "(unclosed")
        .expect_err("invalid regex");
    assert!(matches!(err, ConfigError::InvalidTrigger { .. }));

    config.unset_value("split.trigger").expect("unset");
    assert_eq!(config.split_config().triggers.len(), DEFAULT_TRIGGERS.len());
}

#[test]
fn log_paused_round_trips_through_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");

    let mut config = Config::default();
    assert!(!config.log_paused());
    assert!(matches!(
        config.set_value("log-paused", "later"),
        Err(ConfigError::InvalidValue { .. })
    ));
    config.set_value("log-paused", "yes").expect("bool");
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let mut loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert!(loaded.log_paused());
    loaded.unset_value("log-paused").expect("unset");
    assert_eq!(loaded.log_paused, None);
}
