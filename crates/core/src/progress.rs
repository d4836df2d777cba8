// Study progress tracking: record hours per (user, topic, day) or report them

use crate::error::{ToolError, ToolResult};
use crate::storage::{ProgressStore, ProgressUpdate};
use crate::types::{Hours, ProgressKey, ProgressRecord};
use chrono::NaiveDate;
use std::sync::Arc;

/// Result of a record-or-report call. `Display` renders the user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressReport {
    /// Report mode, a record exists for today
    Reported { key: ProgressKey, total: Hours },
    /// Report mode, nothing recorded today
    NothingRecorded { key: ProgressKey },
    /// Record mode with no positive hours; nothing was written
    Unchanged { key: ProgressKey, total: Hours },
    /// First contribution of the day
    Created { key: ProgressKey, added: Hours, total: Hours },
    /// Later contribution on the same day
    Incremented { key: ProgressKey, added: Hours, total: Hours },
}

impl ProgressReport {
    /// Hours stored for the key after the call
    pub fn total(&self) -> Hours {
        match self {
            Self::NothingRecorded { .. } => Hours::ZERO,
            Self::Reported { total, .. }
            | Self::Unchanged { total, .. }
            | Self::Created { total, .. }
            | Self::Incremented { total, .. } => *total,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Incremented { .. })
    }
}

impl std::fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reported { key, total } => write!(
                f,
                "Your recorded progress for '{}' on {} is {} hours.",
                key.topic,
                key.day_label(),
                total
            ),
            Self::NothingRecorded { key } => write!(
                f,
                "No study progress recorded for '{}' on {}.",
                key.topic,
                key.day_label()
            ),
            Self::Unchanged { key, total } => write!(
                f,
                "No new hours added for '{}'. Current total for today: {} hours.",
                key.topic, total
            ),
            Self::Created { key, added, total } => write!(
                f,
                "Successfully recorded {} hours for '{}' on {}. Total for today: {} hours.",
                added,
                key.topic,
                key.day_label(),
                total
            ),
            Self::Incremented { key, added, total } => write!(
                f,
                "Updated progress for '{}' on {}: Added {} hours. New total: {} hours.",
                key.topic,
                key.day_label(),
                added,
                total
            ),
        }
    }
}

/// Progress state machine over a [`ProgressStore`].
///
/// For a given key the record is either absent or present with some hours.
/// Report mode never writes; record mode creates or increments the record
/// inside a single store transaction.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn ProgressStore>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Record or report progress for the caller's local calendar day
    pub fn record_or_report(
        &self,
        user_id: &str,
        topic: &str,
        hours: f64,
        report_only: bool,
    ) -> ToolResult<ProgressReport> {
        let today = chrono::Local::now().date_naive();
        self.record_or_report_on(today, user_id, topic, hours, report_only)
    }

    pub fn record_or_report_on(
        &self,
        day: NaiveDate,
        user_id: &str,
        topic: &str,
        hours: f64,
        report_only: bool,
    ) -> ToolResult<ProgressReport> {
        if user_id.trim().is_empty() {
            return Err(ToolError::malformed("user_id must not be empty"));
        }
        if topic.trim().is_empty() {
            return Err(ToolError::malformed("topic must not be empty"));
        }

        let key = ProgressKey::new(user_id, topic, day);
        tracing::info!(
            user_id = %key.user_id,
            topic = %key.topic,
            day = %key.day,
            hours,
            report_only,
            "Tracking progress"
        );

        if report_only {
            return match self.read(&key)? {
                Some(record) => Ok(ProgressReport::Reported {
                    total: record.hours,
                    key,
                }),
                None => Ok(ProgressReport::NothingRecorded { key }),
            };
        }

        if !hours.is_finite() {
            return Err(ToolError::malformed(format!("hours must be a finite number, got {}", hours)));
        }

        // Non-positive and sub-hundredth amounts add nothing
        let added = match Hours::from_f64(hours) {
            Some(added) if !added.is_zero() => added,
            Some(_) => return self.unchanged(key),
            None if hours <= 0.0 => return self.unchanged(key),
            None => {
                return Err(ToolError::malformed(format!(
                    "hours value {} is too large to record",
                    hours
                )))
            }
        };

        let update = self.store.add_hours(&key, added).map_err(|e| {
            tracing::error!(
                user_id = %key.user_id,
                topic = %key.topic,
                error = %format!("{:#}", e),
                "Failed to record progress"
            );
            ToolError::Persistence(e)
        })?;

        let total = update.record().hours;
        Ok(match update {
            ProgressUpdate::Created(_) => ProgressReport::Created { key, added, total },
            ProgressUpdate::Incremented { .. } => ProgressReport::Incremented { key, added, total },
        })
    }

    /// All records of a user, most recent day first
    pub fn history(&self, user_id: &str) -> ToolResult<Vec<ProgressRecord>> {
        self.store.list_for_user(user_id).map_err(|e| {
            tracing::error!(user_id, error = %format!("{:#}", e), "Failed to list progress");
            ToolError::Persistence(e)
        })
    }

    fn unchanged(&self, key: ProgressKey) -> ToolResult<ProgressReport> {
        let total = self
            .read(&key)?
            .map(|record| record.hours)
            .unwrap_or(Hours::ZERO);
        Ok(ProgressReport::Unchanged { key, total })
    }

    fn read(&self, key: &ProgressKey) -> ToolResult<Option<ProgressRecord>> {
        self.store.get(key).map_err(|e| {
            tracing::error!(
                user_id = %key.user_id,
                topic = %key.topic,
                error = %format!("{:#}", e),
                "Failed to read progress"
            );
            ToolError::Persistence(e)
        })
    }
}
