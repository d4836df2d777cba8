use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Unique identifier for a progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Study time with two-decimal precision, held as whole hundredths of an hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hours(u32);

impl Hours {
    pub const ZERO: Hours = Hours(0);

    pub fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Round a caller-supplied amount to two decimals.
    ///
    /// Returns `None` for negative, NaN or infinite input.
    pub fn from_f64(hours: f64) -> Option<Self> {
        if !hours.is_finite() || hours < 0.0 {
            return None;
        }
        let hundredths = (hours * 100.0).round();
        if hundredths > f64::from(u32::MAX) {
            return None;
        }
        Some(Self(hundredths as u32))
    }

    pub fn hundredths(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Sum of two amounts, or `None` if it does not fit
    pub fn checked_add(self, other: Hours) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl std::fmt::Display for Hours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Hours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Hours::from_f64(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hours value: {}", raw)))
    }
}

/// Natural key of a progress record: one entry per user, topic and calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub user_id: String,
    pub topic: String,
    pub day: NaiveDate,
}

impl ProgressKey {
    pub fn new(user_id: impl Into<String>, topic: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            topic: topic.into(),
            day,
        }
    }

    /// Day formatted the way it appears in storage keys and user messages
    pub fn day_label(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }
}

/// Accumulated study hours for one (user, topic, day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: RecordId,
    pub user_id: String,
    pub topic: String,
    pub day: NaiveDate,
    pub hours: Hours,
    pub created_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(key: &ProgressKey, hours: Hours) -> Self {
        Self {
            id: RecordId::new(),
            user_id: key.user_id.clone(),
            topic: key.topic.clone(),
            day: key.day,
            hours,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(self.user_id.clone(), self.topic.clone(), self.day)
    }
}
