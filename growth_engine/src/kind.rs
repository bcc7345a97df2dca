//! The two analysis kinds the orchestrator can compute.

use serde::{Deserialize, Serialize};

/// Discriminator for an analysis computation (serde snake_case).
///
/// One orchestration path dispatches on this tag; the kinds never share a
/// cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Persona and maturity-stage classification.
    Discovery,
    /// Peer-percentile scoring.
    Benchmark,
}

impl AnalysisKind {
    /// Stable storage code for the `analysis_results.kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::Discovery => "discovery",
            AnalysisKind::Benchmark => "benchmark",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(AnalysisKind::Discovery),
            "benchmark" => Ok(AnalysisKind::Benchmark),
            other => Err(format!("unknown analysis kind: {other}")),
        }
    }
}
