//! Configuration system for Timeforge.
//!
//! Load planner configuration from TOML or YAML to choose the search
//! strategy, the flaw selection heuristic, operator costs and termination
//! limits without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use timeforge_config::{PlannerConfig, SearchStrategyType};
//! use std::time::Duration;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     horizon = 500
//!     search_strategy = "depth_first"
//!
//!     [costs]
//!     expansion_cost = 2.0
//!
//!     [termination]
//!     seconds_spent_limit = 30
//! "#).unwrap();
//!
//! assert_eq!(config.horizon, 500);
//! assert_eq!(config.search_strategy, SearchStrategyType::DepthFirst);
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use timeforge_config::PlannerConfig;
//!
//! let config = PlannerConfig::load("planner.toml").unwrap_or_default();
//! assert_eq!(config.horizon, 1000);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exclusive upper bound on the temporal horizon. Distances in the
/// temporal network are summed without overflow checks below it.
pub const MAX_HORIZON: i64 = i64::MAX / 4;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_horizon() -> i64 {
    1000
}

/// Main planner configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PlannerConfig {
    /// Temporal horizon of the plan database.
    #[serde(default = "default_horizon")]
    pub horizon: i64,

    /// Fringe ordering of the search.
    #[serde(default)]
    pub search_strategy: SearchStrategyType,

    /// Heuristic choosing which flaw to branch on.
    #[serde(default)]
    pub flaw_selection: FlawSelectionType,

    /// Random seed for reproducible flaw selection.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Operator costs charged by the resolvers.
    #[serde(default)]
    pub costs: CostConfig,

    /// Termination configuration.
    #[serde(default)]
    pub termination: Option<TerminationConfig>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            search_strategy: SearchStrategyType::default(),
            flaw_selection: FlawSelectionType::default(),
            random_seed: None,
            costs: CostConfig::default(),
            termination: None,
        }
    }
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon <= 0 || self.horizon >= MAX_HORIZON {
            return Err(ConfigError::Invalid(format!(
                "horizon must be in (0, {MAX_HORIZON}), got {}",
                self.horizon
            )));
        }
        self.costs.validate()
    }

    /// Sets the temporal horizon.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the search strategy.
    pub fn with_search_strategy(mut self, strategy: SearchStrategyType) -> Self {
        self.search_strategy = strategy;
        self
    }

    /// Sets the flaw selection heuristic.
    pub fn with_flaw_selection(mut self, selection: FlawSelectionType) -> Self {
        self.flaw_selection = selection;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the operator costs.
    pub fn with_costs(mut self, costs: CostConfig) -> Self {
        self.costs = costs;
        self
    }

    /// Sets the termination time limit.
    pub fn with_termination_seconds(mut self, seconds: u64) -> Self {
        self.termination = Some(TerminationConfig {
            seconds_spent_limit: Some(seconds),
            ..self.termination.unwrap_or_default()
        });
        self
    }

    /// Sets the termination node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.termination = Some(TerminationConfig {
            node_count_limit: Some(nodes),
            ..self.termination.unwrap_or_default()
        });
        self
    }

    /// Returns the termination time limit, if configured.
    ///
    /// Convenience method that delegates to `termination.time_limit()`.
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.as_ref().and_then(|t| t.time_limit())
    }

    /// Returns the node count limit, if configured.
    pub fn node_limit(&self) -> Option<u64> {
        self.termination.as_ref().and_then(|t| t.node_count_limit)
    }
}

/// Search strategy types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategyType {
    /// Stack-ordered fringe: most recently generated node first.
    DepthFirst,

    /// Priority fringe: deeper first, then cheaper, then shorter makespan.
    #[default]
    DepthFirstCostFirst,
}

/// Flaw selection heuristic types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlawSelectionType {
    /// Uniformly random choice among detected flaws.
    Random,

    /// Goal ordering, component hierarchy and flaw type filters.
    #[default]
    Hierarchical,
}

/// Costs charged per operator kind.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CostConfig {
    /// Expanding a goal through a synchronization rule.
    pub expansion_cost: f64,

    /// Unifying a goal with an active decision.
    pub unification_cost: f64,

    /// Ordering two decisions or resource events.
    pub scheduling_cost: f64,

    /// Inserting a new resource production or consumption.
    pub planning_cost: f64,

    /// Completing a timeline gap.
    pub completion_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            expansion_cost: 1.0,
            unification_cost: 0.0,
            scheduling_cost: 1.0,
            planning_cost: 2.0,
            completion_cost: 1.0,
        }
    }
}

impl CostConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let costs = [
            ("expansion_cost", self.expansion_cost),
            ("unification_cost", self.unification_cost),
            ("scheduling_cost", self.scheduling_cost),
            ("planning_cost", self.planning_cost),
            ("completion_cost", self.completion_cost),
        ];
        for (name, value) in costs {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Termination configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TerminationConfig {
    /// Maximum seconds to spend solving.
    pub seconds_spent_limit: Option<u64>,

    /// Maximum milliseconds to spend solving, added to the seconds limit.
    pub millis_spent_limit: Option<u64>,

    /// Maximum number of expanded search nodes.
    pub node_count_limit: Option<u64>,
}

impl TerminationConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let millis = self
            .seconds_spent_limit
            .unwrap_or(0)
            .saturating_mul(1000)
            .saturating_add(self.millis_spent_limit.unwrap_or(0));
        if millis > 0 {
            Some(Duration::from_millis(millis))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests;
