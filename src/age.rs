use crate::model::ColumnId;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use std::fmt::Display;

/// Default age after which an untouched `todo` task is moved to `progress`.
pub const STALE_AFTER_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Default,
    Warning,
    Completed,
}

/// What a task card says about its age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeLabel {
    Created(DateTime<Utc>),
    AutoMoved {
        created_at: DateTime<Utc>,
        after_hours: i64,
    },
    Completed(DateTime<Utc>),
}

impl AgeLabel {
    pub fn accent(&self) -> Accent {
        match self {
            AgeLabel::Created(_) => Accent::Default,
            AgeLabel::AutoMoved { .. } => Accent::Warning,
            AgeLabel::Completed(_) => Accent::Completed,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            AgeLabel::Created(at) | AgeLabel::Completed(at) => *at,
            AgeLabel::AutoMoved { created_at, .. } => *created_at,
        }
    }

    /// Label text in the viewer's local time.
    pub fn text(&self) -> String {
        self.render(&Local)
    }

    pub fn render<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let created = format_created(self.created_at(), tz);
        match self {
            AgeLabel::Created(_) => format!("Created: {}", created),
            AgeLabel::AutoMoved { after_hours, .. } => {
                format!("Auto-moved after {}hrs — Created: {}", after_hours, created)
            }
            AgeLabel::Completed(_) => format!("Completed — Created: {}", created),
        }
    }
}

/// Label for a task sitting in `column`, without any staleness handling.
pub fn label_for(column: ColumnId, created_at: DateTime<Utc>) -> AgeLabel {
    match column {
        ColumnId::Done => AgeLabel::Completed(created_at),
        ColumnId::Todo | ColumnId::Progress => AgeLabel::Created(created_at),
    }
}

pub fn is_stale(created_at: DateTime<Utc>, now: DateTime<Utc>, stale_after: Duration) -> bool {
    now.signed_duration_since(created_at) >= stale_after
}

/// Short month, day, and 12-hour clock, e.g. `Oct 18, 09:05 PM`.
pub fn format_created<Tz>(created_at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    created_at
        .with_timezone(tz)
        .format("%b %-d, %I:%M %p")
        .to_string()
}
