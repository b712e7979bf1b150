use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["mandi-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(!cli.json);
}

#[test]
fn parses_states_command() {
    let cli = Cli::try_parse_from(["mandi-cli", "states"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::States)));
}

#[test]
fn parses_prices_with_filters() {
    let cli = Cli::try_parse_from([
        "mandi-cli",
        "prices",
        "--state",
        "Kerala",
        "--commodity",
        "Banana",
        "--limit",
        "10",
        "--offset",
        "20",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Prices(args)) = cli.command else {
        panic!("expected prices command");
    };
    assert_eq!(args.state.as_deref(), Some("Kerala"));
    assert_eq!(args.commodity.as_deref(), Some("Banana"));
    assert_eq!(args.limit, Some(10));
    assert_eq!(args.offset, 20);
    assert!(args.district.is_none());
}

#[test]
fn prices_without_filters_uses_defaults() {
    let cli = Cli::try_parse_from(["mandi-cli", "prices"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Prices(ref args)) if *args == FilterArgs::default()
    ));
}

#[test]
fn json_flag_is_global() {
    let cli = Cli::try_parse_from(["mandi-cli", "insight", "--state", "Bihar", "--json"])
        .expect("expected valid cli args");
    assert!(cli.json);
    assert!(matches!(cli.command, Some(Commands::Insight(_))));
}

#[test]
fn trend_and_options_share_filter_args() {
    for sub in ["trend", "options"] {
        let cli = Cli::try_parse_from(["mandi-cli", sub, "--market", "Patna", "--search", "wheat"])
            .expect("expected valid cli args");
        let args = match cli.command {
            Some(Commands::Trend(args) | Commands::Options(args)) => args,
            other => panic!("unexpected command: {other:?}"),
        };
        assert_eq!(args.market.as_deref(), Some("Patna"));
        assert_eq!(args.search.as_deref(), Some("wheat"));
    }
}

#[test]
fn geo_filter_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "mandi-cli",
        "prices",
        "--lat",
        "-12.5",
        "--lon",
        "77.6",
        "--radius-km",
        "25",
    ])
    .expect("expected valid cli args");
    let Some(Commands::Prices(args)) = cli.command else {
        panic!("expected prices command");
    };
    assert_eq!(args.lat, Some(-12.5));
    assert_eq!(args.radius_km, Some(25.0));
}

#[test]
fn lat_without_lon_is_rejected() {
    let result = Cli::try_parse_from(["mandi-cli", "prices", "--lat", "25.6"]);
    assert!(result.is_err());
}

#[test]
fn weather_requires_coordinates() {
    assert!(Cli::try_parse_from(["mandi-cli", "weather"]).is_err());

    let cli = Cli::try_parse_from(["mandi-cli", "weather", "--lat", "25.6", "--lon", "85.1"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Weather { lat, lon }) if (lat - 25.6).abs() < 1e-9 && (lon - 85.1).abs() < 1e-9
    ));
}

fn broken_config() -> anyhow::Result<AppConfig> {
    anyhow::bail!("invalid MANDI_ENV value: staging")
}

#[tokio::test]
async fn states_runs_without_loading_config() {
    let cli = Cli::try_parse_from(["mandi-cli", "states", "--json"]).expect("expected valid cli args");
    run(cli, broken_config).await.expect("states needs no config");
}

#[tokio::test]
async fn no_command_runs_without_loading_config() {
    let cli = Cli::try_parse_from(["mandi-cli"]).expect("expected valid cli args");
    run(cli, broken_config).await.expect("bare invocation needs no config");
}

#[tokio::test]
async fn upstream_commands_surface_config_errors() {
    let cli = Cli::try_parse_from(["mandi-cli", "prices", "--state", "Kerala"])
        .expect("expected valid cli args");
    let err = run(cli, broken_config).await.expect_err("prices needs config");
    assert!(err.to_string().contains("MANDI_ENV"));
}

#[test]
fn help_is_handled_by_clap() {
    let err = Cli::try_parse_from(["mandi-cli", "--help"]).expect_err("help exits early");
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}
