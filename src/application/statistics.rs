use serde::Serialize;

use crate::domain::todo::TodoStatus;

/// Per-status counts for one owner. Statuses with no todos read as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
}

impl StatusSummary {
    pub fn from_counts(counts: impl IntoIterator<Item = (TodoStatus, u64)>) -> Self {
        let mut summary = Self::default();
        for (status, count) in counts {
            *summary.slot_mut(status) += count;
            summary.total += count;
        }
        summary
    }

    fn slot_mut(&mut self, status: TodoStatus) -> &mut u64 {
        match status {
            TodoStatus::Pending => &mut self.pending,
            TodoStatus::InProgress => &mut self.in_progress,
            TodoStatus::Completed => &mut self.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_statuses_read_as_zero() {
        let summary = StatusSummary::from_counts([(TodoStatus::Pending, 2), (TodoStatus::Completed, 1)]);
        assert_eq!(summary, StatusSummary { total: 3, pending: 2, in_progress: 0, completed: 1 });
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let summary = StatusSummary::from_counts([(TodoStatus::InProgress, 4)]);
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            json!({ "total": 4, "pending": 0, "inProgress": 4, "completed": 0 })
        );
    }

    #[test]
    fn empty_store_is_all_zero() {
        assert_eq!(StatusSummary::from_counts([]), StatusSummary::default());
    }
}
