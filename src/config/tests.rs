use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.cache.fragment_limit = Some(64);
    raw.logging.level = Some("info".to_string());

    let overrides = RuntimeOverrides {
        cache_fragment_limit: Some(8),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_runtime_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.fragment_limit.get(), 8);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.fragment_limit.get(), DEFAULT_FRAGMENT_LIMIT);
    assert_eq!(
        settings.cache.single_flight_wait,
        Duration::from_millis(DEFAULT_SINGLE_FLIGHT_WAIT_MS)
    );
    assert!(settings.cache.snapshot_path.is_none());
    assert_eq!(settings.render.timezone, Tz::UTC);
    assert!(settings.content.fixture.is_none());
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = RuntimeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_runtime_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_fragment_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.fragment_limit = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero limit");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.fragment_limit",
            ..
        }
    ));
}

#[test]
fn zero_single_flight_wait_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.single_flight_wait_ms = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn unknown_timezone_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.timezone = Some("Mars/Olympus_Mons".to_string());

    let err = Settings::from_raw(raw).expect_err("bad zone");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.timezone",
            ..
        }
    ));
}

#[test]
fn timezone_is_parsed() {
    let mut raw = RawSettings::default();
    raw.render.timezone = Some(" Europe/Berlin ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.render.timezone, chrono_tz::Europe::Berlin);
}

#[test]
fn toml_file_layer_is_read() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        "[cache]\nenabled = false\nfragment_limit = 12\n\n[render]\ntimezone = \"Asia/Tokyo\"\n",
    )
    .expect("write config");

    let cli = CliArgs::parse_from(["magblocks", "--config-file", path.to_str().expect("utf8 path")]);
    let settings = load(&cli).expect("settings");

    assert!(!settings.cache.enabled);
    assert_eq!(settings.cache.fragment_limit.get(), 12);
    assert_eq!(settings.render.timezone, chrono_tz::Asia::Tokyo);
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "magblocks",
        "render",
        "--block",
        "themezee-blocks/magazine-column",
        "--options",
        r#"{"numberOfPosts": 4}"#,
        "--repeat",
        "3",
        "--render-timezone",
        "Europe/Paris",
    ]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.block, "themezee-blocks/magazine-column");
            assert_eq!(render.options.as_deref(), Some(r#"{"numberOfPosts": 4}"#));
            assert_eq!(render.repeat, 3);
            assert_eq!(
                render.overrides.render_timezone.as_deref(),
                Some("Europe/Paris")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_schema_arguments() {
    let args = CliArgs::parse_from(["magblocks", "schema", "--block", "themezee-blocks/magazine-vertical"]);

    match args.command.expect("schema command") {
        Command::Schema(schema) => {
            assert_eq!(schema.block.as_deref(), Some("themezee-blocks/magazine-vertical"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn repeat_must_be_positive() {
    let parsed = CliArgs::try_parse_from([
        "magblocks",
        "render",
        "--block",
        "themezee-blocks/magazine-column",
        "--repeat",
        "0",
    ]);
    assert!(parsed.is_err());
}
