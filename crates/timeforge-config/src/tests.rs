//! Tests for planner configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        horizon = 200
        search_strategy = "depth_first"
        flaw_selection = "random"
        random_seed = 42

        [costs]
        expansion_cost = 3.0
        planning_cost = 5.5

        [termination]
        seconds_spent_limit = 30
        node_count_limit = 10000
    "#;

    let config = PlannerConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.horizon, 200);
    assert_eq!(config.search_strategy, SearchStrategyType::DepthFirst);
    assert_eq!(config.flaw_selection, FlawSelectionType::Random);
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.costs.expansion_cost, 3.0);
    assert_eq!(config.costs.planning_cost, 5.5);
    // unspecified costs keep their defaults
    assert_eq!(config.costs.scheduling_cost, 1.0);
    assert_eq!(config.node_limit(), Some(10_000));
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        horizon: 120
        search_strategy: depth_first_cost_first
        flaw_selection: hierarchical
        termination:
          millis_spent_limit: 250
    "#;

    let config = PlannerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.horizon, 120);
    assert_eq!(
        config.search_strategy,
        SearchStrategyType::DepthFirstCostFirst
    );
    assert_eq!(config.time_limit(), Some(Duration::from_millis(250)));
}

#[test]
fn test_defaults() {
    let config = PlannerConfig::from_toml_str("").unwrap();
    assert_eq!(config, PlannerConfig::default());
    assert_eq!(config.horizon, 1000);
    assert_eq!(config.flaw_selection, FlawSelectionType::Hierarchical);
    assert!(config.time_limit().is_none());
}

#[test]
fn test_invalid_horizon_rejected() {
    let err = PlannerConfig::from_toml_str("horizon = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = PlannerConfig::new()
        .with_horizon(MAX_HORIZON)
        .validate()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(PlannerConfig::new()
        .with_horizon(MAX_HORIZON - 1)
        .validate()
        .is_ok());
}

#[test]
fn test_huge_time_limit_saturates() {
    let termination = TerminationConfig {
        seconds_spent_limit: Some(u64::MAX),
        millis_spent_limit: Some(500),
        node_count_limit: None,
    };
    assert_eq!(termination.time_limit(), Some(Duration::from_millis(u64::MAX)));

    let termination = TerminationConfig {
        seconds_spent_limit: Some(2),
        millis_spent_limit: Some(500),
        node_count_limit: None,
    };
    assert_eq!(termination.time_limit(), Some(Duration::from_millis(2500)));
}

#[test]
fn test_negative_cost_rejected() {
    let err = PlannerConfig::from_toml_str(
        r#"
        [costs]
        scheduling_cost = -1.0
    "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_unknown_strategy_rejected() {
    let err = PlannerConfig::from_toml_str(r#"search_strategy = "breadth_first""#).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_builder() {
    let config = PlannerConfig::new()
        .with_horizon(50)
        .with_random_seed(123)
        .with_termination_seconds(60)
        .with_node_limit(500)
        .with_search_strategy(SearchStrategyType::DepthFirst);

    assert_eq!(config.horizon, 50);
    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.time_limit(), Some(Duration::from_secs(60)));
    assert_eq!(config.node_limit(), Some(500));
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_falls_back_to_default() {
    let config = PlannerConfig::load("does-not-exist.toml").unwrap_or_default();
    assert_eq!(config.horizon, 1000);
}
