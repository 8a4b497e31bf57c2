//! Approver decision model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An approver's verdict on a pending post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Decision {
    pub fn reject(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = reason.trim();
        Self::Rejected {
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected { .. } => write!(f, "rejected"),
        }
    }
}
