//! Scripture reference value objects

use std::fmt;
use std::str::FromStr;

use crate::domain::error::ReferenceError;

/// Inclusive verse range within a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerseRange {
    start: u32,
    end: u32,
}

impl VerseRange {
    /// Create a validated verse range (`1 <= start <= end`)
    pub fn new(start: u32, end: u32) -> Result<Self, ReferenceError> {
        if start == 0 || start > end {
            return Err(ReferenceError::InvalidVerseRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one verse
    pub fn single(verse: u32) -> Result<Self, ReferenceError> {
        Self::new(verse, verse)
    }

    pub const fn start(&self) -> u32 {
        self.start
    }

    pub const fn end(&self) -> u32 {
        self.end
    }

    pub const fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Textual label used in file names: `"5"` or `"5-7"`
    pub fn label(&self) -> String {
        if self.is_single() {
            self.start.to_string()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Book/chapter/verse reference identifying what is being recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    book: String,
    chapter: u32,
    verses: VerseRange,
}

impl Reference {
    /// Create a validated reference
    pub fn new(
        book: impl Into<String>,
        chapter: u32,
        verse_start: u32,
        verse_end: u32,
    ) -> Result<Self, ReferenceError> {
        let book = book.into();
        if !is_path_segment(&book) {
            return Err(ReferenceError::InvalidBook(book));
        }
        if chapter == 0 {
            return Err(ReferenceError::ZeroChapter);
        }
        let verses = VerseRange::new(verse_start, verse_end)?;
        Ok(Self {
            book,
            chapter,
            verses,
        })
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub const fn chapter(&self) -> u32 {
        self.chapter
    }

    pub const fn verses(&self) -> VerseRange {
        self.verses
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    /// Parse `"GEN 1:1"` or `"1SA 2:3-4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ReferenceError::Malformed {
            input: s.to_string(),
        };

        let (book, location) = s.trim().rsplit_once(char::is_whitespace).ok_or_else(malformed)?;
        let book = book.trim();
        let (chapter, verses) = location.split_once(':').ok_or_else(malformed)?;
        let chapter: u32 = chapter.parse().map_err(|_| malformed())?;

        let (start, end) = match verses.split_once('-') {
            Some((start, end)) => (
                start.parse().map_err(|_| malformed())?,
                end.parse().map_err(|_| malformed())?,
            ),
            None => {
                let verse = verses.parse().map_err(|_| malformed())?;
                (verse, verse)
            }
        };

        Self::new(book, chapter, start, end)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verses)
    }
}

/// Check that a value can be used as a single directory name
pub fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
}
