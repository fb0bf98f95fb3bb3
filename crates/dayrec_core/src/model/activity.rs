//! Activity ledger domain model.
//!
//! # Responsibility
//! - Define the logged time interval (`ActivityRecord`) and the label to category
//!   mapping (`ActivityCategory`).
//! - Validate field limits before anything reaches storage.
//!
//! # Invariants
//! - `(day, start)` and `(day, end)` are unique across records (enforced by schema).
//! - `ActivityRecord::activity` must name an existing `ActivityCategory::activity`.
//! - Labels are at most 40 characters, comments at most 50.

use crate::db::Entity;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const RECORDS_TABLE: &str = "act_recs";
pub const CATEGORIES_TABLE: &str = "act_cats";

pub const LABEL_MAX_CHARS: usize = 40;
pub const COMMENT_MAX_CHARS: usize = 50;

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityValidationError {
    EmptyLabel,
    LabelTooLong { chars: usize },
    CommentTooLong { chars: usize },
    EmptyCategory,
    CategoryTooLong { chars: usize },
}

impl Display for ActivityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLabel => write!(f, "activity label cannot be empty"),
            Self::LabelTooLong { chars } => write!(
                f,
                "activity label has {chars} characters; at most {LABEL_MAX_CHARS} allowed"
            ),
            Self::CommentTooLong { chars } => write!(
                f,
                "comment has {chars} characters; at most {COMMENT_MAX_CHARS} allowed"
            ),
            Self::EmptyCategory => write!(f, "category name cannot be empty"),
            Self::CategoryTooLong { chars } => write!(
                f,
                "category name has {chars} characters; at most {LABEL_MAX_CHARS} allowed"
            ),
        }
    }
}

impl Error for ActivityValidationError {}

/// One logged time interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// Row id; `None` until persisted.
    pub id: Option<i64>,
    pub day: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Free-text label, references `act_cats.a_done`.
    pub activity: String,
    /// `None` lets the schema default (`NFI`) apply on insert.
    pub comment: Option<String>,
}

impl ActivityRecord {
    pub fn new(
        day: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        activity: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            day,
            start,
            end,
            activity: activity.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        validate_label(&self.activity)?;
        if let Some(comment) = &self.comment {
            let chars = comment.chars().count();
            if chars > COMMENT_MAX_CHARS {
                return Err(ActivityValidationError::CommentTooLong { chars });
            }
        }
        Ok(())
    }
}

impl Display for ActivityRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<activity record ('{}','{}','{}','{}','{}')>",
            self.day,
            self.start.format("%H:%M:%S"),
            self.end.format("%H:%M:%S"),
            self.activity,
            self.comment.as_deref().unwrap_or("None")
        )
    }
}

impl Entity for ActivityRecord {
    const TABLE: &'static str = RECORDS_TABLE;

    fn column_value(&self, column: &str) -> Option<Value> {
        let value = match column {
            "a_id" => self.id.map_or(Value::Null, Value::Integer),
            "day" => Value::Text(self.day.format("%F").to_string()),
            "startt" => Value::Text(self.start.format("%H:%M:%S%.f").to_string()),
            "endt" => Value::Text(self.end.format("%H:%M:%S%.f").to_string()),
            "a_done" => Value::Text(self.activity.clone()),
            "comments" => self.comment.clone().map_or(Value::Null, Value::Text),
            _ => return None,
        };
        Some(value)
    }
}

/// Maps an activity label onto a broader category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCategory {
    pub activity: String,
    pub category: String,
}

impl ActivityCategory {
    pub fn new(activity: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            category: category.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        validate_label(&self.activity)?;
        let chars = self.category.chars().count();
        if self.category.trim().is_empty() {
            return Err(ActivityValidationError::EmptyCategory);
        }
        if chars > LABEL_MAX_CHARS {
            return Err(ActivityValidationError::CategoryTooLong { chars });
        }
        Ok(())
    }
}

impl Entity for ActivityCategory {
    const TABLE: &'static str = CATEGORIES_TABLE;

    fn column_value(&self, column: &str) -> Option<Value> {
        match column {
            "a_done" => Some(Value::Text(self.activity.clone())),
            "a_cat" => Some(Value::Text(self.category.clone())),
            _ => None,
        }
    }
}

fn validate_label(label: &str) -> Result<(), ActivityValidationError> {
    if label.trim().is_empty() {
        return Err(ActivityValidationError::EmptyLabel);
    }
    let chars = label.chars().count();
    if chars > LABEL_MAX_CHARS {
        return Err(ActivityValidationError::LabelTooLong { chars });
    }
    Ok(())
}
