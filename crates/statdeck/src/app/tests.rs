use super::*;

#[test]
fn test_cli_build() {
    let app = build_cli();
    assert_eq!(app.get_name(), "statdeck");
}

#[test]
fn test_cli_requires_subcommand() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["statdeck"]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_snapshot_flags() {
    let app = build_cli();
    let matches = app
        .try_get_matches_from(vec!["statdeck", "snapshot", "--json", "--save"])
        .unwrap();
    let snapshot = matches.subcommand_matches("snapshot").unwrap();
    assert!(snapshot.get_flag("json"));
    assert!(snapshot.get_flag("save"));
}

#[test]
fn test_cli_watch_interval() {
    let app = build_cli();
    let matches = app
        .try_get_matches_from(vec!["statdeck", "watch", "--interval", "15000"])
        .unwrap();
    let watch = matches.subcommand_matches("watch").unwrap();
    assert_eq!(watch.get_one::<u64>("interval"), Some(&15_000));
    assert!(!watch.get_flag("json"));
}

#[test]
fn test_cli_watch_interval_must_be_numeric() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["statdeck", "watch", "--interval", "soon"]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_watch_interval_optional() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["statdeck", "watch"]).unwrap();
    let watch = matches.subcommand_matches("watch").unwrap();
    assert!(watch.get_one::<u64>("interval").is_none());
}

#[test]
fn test_cli_global_overrides_after_subcommand() {
    let app = build_cli();
    let matches = app
        .try_get_matches_from(vec![
            "statdeck",
            "clear-cache",
            "--base-url",
            "http://stats.local:9000",
            "--token",
            "secret",
            "-v",
        ])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "clear-cache");
    assert_eq!(
        sub.get_one::<String>("base-url").map(String::as_str),
        Some("http://stats.local:9000")
    );
    assert_eq!(sub.get_one::<String>("token").map(String::as_str), Some("secret"));
    assert!(sub.get_flag("verbose"));
}

#[test]
fn test_cli_reset_metrics_json() {
    let app = build_cli();
    let matches = app
        .try_get_matches_from(vec!["statdeck", "reset-metrics", "--json"])
        .unwrap();
    let reset = matches.subcommand_matches("reset-metrics").unwrap();
    assert!(reset.get_flag("json"));
}

#[test]
fn test_cli_unknown_subcommand_rejected() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["statdeck", "create", "x"]);
    assert!(matches.is_err());
}
