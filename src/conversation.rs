use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed question/answer exchange.
///
/// Turns are created when a successful reply arrives and are never mutated
/// afterwards. Failed requests produce a transcript message but no Turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    pub timestamp: DateTime<Utc>,
}

/// Quality scores the backend attaches to an answer.
///
/// Only `global_score` is interpreted by the client. The per-metric scores
/// (`answer_relevancy`, `context_precision`, ...) are carried through
/// serialization untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub global_score: f64,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, f64>,
}

impl Evaluation {
    pub fn tier(&self) -> Tier {
        Tier::from_score(self.global_score)
    }

    /// Badge text shown next to a scored answer, e.g. `✓ Score: 85%`.
    pub fn badge(&self) -> String {
        format!("✓ Score: {:.0}%", self.global_score * 100.0)
    }
}

/// Quality band derived from `global_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Good,
    Medium,
    Low,
}

impl Tier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Tier::Good
        } else if score >= 0.4 {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}
