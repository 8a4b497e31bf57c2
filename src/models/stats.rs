//! Approver dashboard statistics.

use serde::{Deserialize, Serialize};

/// Aggregate review counts computed by the backend.
///
/// Treated as a read-only snapshot: each successful fetch replaces the
/// previous value wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproverDashboardStats {
    #[serde(alias = "pendingVideos", alias = "pending_count")]
    pub pending_count: u64,

    #[serde(alias = "approvedVideos", alias = "approved_count")]
    pub approved_count: u64,

    #[serde(alias = "rejectedVideos", alias = "rejected_count")]
    pub rejected_count: u64,

    #[serde(alias = "todayReviewed", alias = "todayCount", alias = "today_reviewed_count")]
    pub today_reviewed_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_flat_counts() {
        let stats: ApproverDashboardStats = serde_json::from_str(
            r#"{"pendingCount":4,"approvedCount":10,"rejectedCount":2,"todayReviewedCount":3}"#,
        )
        .unwrap();
        assert_eq!(stats.pending_count, 4);
        assert_eq!(stats.today_reviewed_count, 3);
    }

    #[test]
    fn test_deserialize_alias_names() {
        let stats: ApproverDashboardStats = serde_json::from_str(
            r#"{"pendingVideos":1,"approvedVideos":2,"rejectedVideos":3,"todayCount":4}"#,
        )
        .unwrap();
        assert_eq!(
            stats,
            ApproverDashboardStats {
                pending_count: 1,
                approved_count: 2,
                rejected_count: 3,
                today_reviewed_count: 4,
            }
        );
    }

    #[test]
    fn test_nested_shape_is_rejected() {
        let result = serde_json::from_str::<ApproverDashboardStats>(
            r#"{"data":{"pendingCount":4}}"#,
        );
        assert!(result.is_err());
    }
}
