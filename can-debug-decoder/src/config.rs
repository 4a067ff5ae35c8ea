//! Render and report configuration types
//!
//! Everything here is optional; the defaults reproduce the reference report
//! layout byte-for-byte.

use serde::{Deserialize, Serialize};

/// How wide the rule under the header block is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleWidth {
    /// Same width as the rule under the message name
    #[default]
    MatchName,
    /// Width of the longest header line (`ID:`, `Sender:`, ...)
    WidestHeader,
}

/// What a batch render does when one pair fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole batch with the first error; no bytes are produced
    #[default]
    Abort,
    /// Omit failing pairs from the body and report them alongside it
    Skip,
}

/// Configuration for rendering a single message block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Width policy for the rule closing the header block
    #[serde(default)]
    pub rule_width: RuleWidth,
}

impl RenderConfig {
    /// Create a render configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the header rule width policy
    pub fn with_rule_width(mut self, rule_width: RuleWidth) -> Self {
        self.rule_width = rule_width;
        self
    }
}

/// Configuration for rendering a stream of message blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Per-message render settings
    #[serde(flatten)]
    pub render: RenderConfig,

    /// Batch failure handling
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl ReportConfig {
    /// Create a report configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the header rule width policy
    pub fn with_rule_width(mut self, rule_width: RuleWidth) -> Self {
        self.render.rule_width = rule_width;
        self
    }

    /// Builder method: set the batch failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
