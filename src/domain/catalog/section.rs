//! Date-bucketed sections

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::recording::Recording;

const TITLE_FORMAT: &str = "%d/%m/%Y";

/// A date bucket of recordings, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub data: Vec<Recording>,
}

/// Section ordering by date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Descending => Self::Ascending,
            Self::Ascending => Self::Descending,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Descending => "desc",
            Self::Ascending => "asc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desc" | "descending" | "newest" => Ok(Self::Descending),
            "asc" | "ascending" | "oldest" => Ok(Self::Ascending),
            other => Err(format!("Invalid sort order: \"{}\". Use 'asc' or 'desc'", other)),
        }
    }
}

/// Bucket label for a creation time, in local time: `dd/MM/yyyy`
pub fn section_title(created_at: DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format(TITLE_FORMAT)
        .to_string()
}

/// Parse a bucket label back into a date
pub fn parse_section_title(title: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(title, TITLE_FORMAT).ok()
}

/// Order sections by date in the given direction.
///
/// Titles that are not dates rank below every date (last when descending,
/// first when ascending) and sort alphabetically among themselves.
pub fn sort_sections(sections: &mut [Section], order: SortOrder) {
    sections.sort_by(|a, b| {
        match (parse_section_title(&a.title), parse_section_title(&b.title)) {
            (Some(x), Some(y)) => match order {
                SortOrder::Ascending => x.cmp(&y),
                SortOrder::Descending => y.cmp(&x),
            },
            (Some(_), None) => match order {
                SortOrder::Ascending => Ordering::Greater,
                SortOrder::Descending => Ordering::Less,
            },
            (None, Some(_)) => match order {
                SortOrder::Ascending => Ordering::Less,
                SortOrder::Descending => Ordering::Greater,
            },
            (None, None) => a.title.cmp(&b.title),
        }
    });
}

fn newest_first(a: &Recording, b: &Recording) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.file_path.cmp(&b.file_path))
}

pub(super) fn sort_newest_first(recordings: &mut [Recording]) {
    recordings.sort_by(newest_first);
}
