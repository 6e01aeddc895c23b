use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    Personal,
    Health,
    Finance,
    Shopping,
}

impl Category {
    /// Order in which keyword sets are tested. First match wins.
    pub const ALL: [Category; 5] = [
        Self::Work,
        Self::Personal,
        Self::Health,
        Self::Finance,
        Self::Shopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Health => "Health",
            Self::Finance => "Finance",
            Self::Shopping => "Shopping",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub category: Category,
    pub priority: Priority,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build a task, deriving category and priority from the text.
    /// The text is stored as given; callers trim and validate it.
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id,
            category: classify::categorize(&text),
            priority: classify::prioritize(&text),
            text,
            completed: false,
            created_at: Utc::now(),
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}
