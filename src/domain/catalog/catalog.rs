//! Recording catalog with derived indices

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::recording::{PathTriple, Recording};
use super::section::{section_title, sort_newest_first, sort_sections, Section, SortOrder};

/// Current persisted snapshot layout
pub const CATALOG_SNAPSHOT_VERSION: u32 = 1;

/// Persisted form of the catalog: `{version, sections, languages, books, chapters}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: u32,
    pub sections: Vec<Section>,
    pub languages: Vec<String>,
    pub books: Vec<String>,
    pub chapters: Vec<String>,
}

/// Optional language/book/chapter constraints; empty strings mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingFilter {
    pub language: Option<String>,
    pub book: Option<String>,
    pub chapter: Option<String>,
}

impl RecordingFilter {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn book(mut self, book: impl Into<String>) -> Self {
        self.book = Some(book.into());
        self
    }

    pub fn chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    /// True when every provided, non-empty constraint matches
    pub fn matches(&self, recording: &Recording) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(triple) = recording.path_triple() else {
            return false;
        };
        constraint_matches(&self.language, &triple.language)
            && constraint_matches(&self.book, &triple.book)
            && constraint_matches(&self.chapter, &triple.chapter)
    }

    fn is_empty(&self) -> bool {
        [&self.language, &self.book, &self.chapter]
            .iter()
            .all(|c| c.as_deref().map_or(true, str::is_empty))
    }
}

fn constraint_matches(constraint: &Option<String>, value: &str) -> bool {
    match constraint.as_deref() {
        None | Some("") => true,
        Some(expected) => expected == value,
    }
}

/// Saved recordings keyed by path, plus language/book/chapter indices.
///
/// The indices are always a function of the entries: every mutation goes
/// through `add`, which updates them before returning.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<PathBuf, Recording>,
    languages: BTreeSet<String>,
    books: BTreeSet<String>,
    chapters: BTreeSet<String>,
    order: SortOrder,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a full scan
    pub fn from_recordings(recordings: impl IntoIterator<Item = Recording>) -> Self {
        let mut catalog = Self::new();
        for recording in recordings {
            catalog.add(recording);
        }
        catalog
    }

    /// Restore from a persisted snapshot. Indices are recomputed from the entries.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self::from_recordings(snapshot.sections.into_iter().flat_map(|s| s.data))
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            version: CATALOG_SNAPSHOT_VERSION,
            sections: self.sections(),
            languages: self.languages.iter().cloned().collect(),
            books: self.books.iter().cloned().collect(),
            chapters: self.chapters.iter().cloned().collect(),
        }
    }

    /// Insert or replace a recording and fold its path into the indices
    pub fn add(&mut self, recording: Recording) {
        if let Some(triple) = recording.path_triple() {
            self.languages.insert(triple.language);
            self.books.insert(triple.book);
            self.chapters.insert(triple.chapter);
        }
        self.entries.insert(recording.file_path.clone(), recording);
    }

    pub fn get(&self, path: &Path) -> Option<&Recording> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.iter().cloned().collect()
    }

    pub fn books(&self) -> Vec<String> {
        self.books.iter().cloned().collect()
    }

    pub fn chapters(&self) -> Vec<String> {
        self.chapters.iter().cloned().collect()
    }

    /// Distinct books recorded under `language`
    pub fn books_for(&self, language: &str) -> Vec<String> {
        self.distinct(|t| (t.language == language).then_some(t.book))
    }

    /// Distinct chapters recorded under `language`/`book`
    pub fn chapters_for(&self, language: &str, book: &str) -> Vec<String> {
        self.distinct(|t| (t.language == language && t.book == book).then_some(t.chapter))
    }

    fn distinct(&self, pick: impl Fn(PathTriple) -> Option<String>) -> Vec<String> {
        self.entries
            .values()
            .filter_map(Recording::path_triple)
            .filter_map(pick)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.order = order;
    }

    pub fn toggle_sort_order(&mut self) -> SortOrder {
        self.order = self.order.toggled();
        self.order
    }

    /// All recordings grouped by creation date
    pub fn sections(&self) -> Vec<Section> {
        self.filter(&RecordingFilter::default())
    }

    /// Sections restricted to matching recordings; empty sections are dropped.
    pub fn filter(&self, filter: &RecordingFilter) -> Vec<Section> {
        let mut buckets: BTreeMap<String, Vec<Recording>> = BTreeMap::new();
        for recording in self.entries.values().filter(|r| filter.matches(r)) {
            buckets
                .entry(section_title(recording.created_at))
                .or_default()
                .push(recording.clone());
        }

        let mut sections: Vec<Section> = buckets
            .into_iter()
            .map(|(title, mut data)| {
                sort_newest_first(&mut data);
                Section { title, data }
            })
            .collect();
        sort_sections(&mut sections, self.order);
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn rec(path: &str, created_at: chrono::DateTime<Utc>) -> Recording {
        Recording::new(path, created_at, 1000)
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_recordings(vec![
            rec("/r/en/GEN/1/en_GEN_1_1.m4a", at(10, 12)),
            rec("/r/en/GEN/2/en_GEN_2_1.m4a", at(10, 13)),
            rec("/r/es/EXO/2/es_EXO_2_1-3.m4a", at(12, 12)),
        ])
    }

    #[test]
    fn indices_cover_all_entries() {
        let catalog = sample_catalog();
        assert_eq!(catalog.languages(), vec!["en", "es"]);
        assert_eq!(catalog.books(), vec!["EXO", "GEN"]);
        assert_eq!(catalog.chapters(), vec!["1", "2"]);
    }

    #[test]
    fn add_updates_indices_incrementally() {
        let mut catalog = sample_catalog();
        catalog.add(rec("/r/fr/LEV/9/fr_LEV_9_1.m4a", at(11, 9)));
        assert!(catalog.languages().contains(&"fr".to_string()));
        assert!(catalog.books().contains(&"LEV".to_string()));
        assert!(catalog.chapters().contains(&"9".to_string()));
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn add_joins_existing_section_newest_first() {
        let mut catalog = sample_catalog();
        let newest = rec("/r/en/GEN/1/en_GEN_1_2.m4a", at(10, 12) + Duration::minutes(90));
        catalog.add(newest.clone());

        let title = section_title(newest.created_at);
        let sections = catalog.sections();
        let section = sections.iter().find(|s| s.title == title).unwrap();
        assert_eq!(section.data[0], newest);
    }

    #[test]
    fn filter_by_language() {
        let catalog = sample_catalog();
        let sections = catalog.filter(&RecordingFilter::default().language("en"));
        let all: Vec<_> = sections.iter().flat_map(|s| &s.data).collect();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.file_name.starts_with("en_")));
    }

    #[test]
    fn filter_drops_empty_sections() {
        let catalog = sample_catalog();
        assert!(catalog
            .filter(&RecordingFilter::default().language("fr"))
            .is_empty());
    }

    #[test]
    fn empty_constraints_match_everything() {
        let catalog = sample_catalog();
        let filter = RecordingFilter::default().language("").book("");
        let count: usize = catalog.filter(&filter).iter().map(|s| s.data.len()).sum();
        assert_eq!(count, 3);
    }

    #[test]
    fn filter_by_all_three() {
        let catalog = sample_catalog();
        let filter = RecordingFilter::default().language("en").book("GEN").chapter("2");
        let sections = catalog.filter(&filter);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].data[0].file_name, "en_GEN_2_1.m4a");
    }

    #[test]
    fn sections_follow_sort_order() {
        let mut catalog = Catalog::from_recordings(vec![
            rec("/r/en/GEN/1/a.m4a", at(1, 12)),
            rec("/r/en/GEN/1/b.m4a", at(20, 12)),
        ]);
        let first = catalog.sections()[0].data[0].file_name.clone();
        assert_eq!(first, "b.m4a");

        catalog.toggle_sort_order();
        let first = catalog.sections()[0].data[0].file_name.clone();
        assert_eq!(first, "a.m4a");
    }

    #[test]
    fn cascading_options() {
        let catalog = sample_catalog();
        assert_eq!(catalog.books_for("en"), vec!["GEN"]);
        assert_eq!(catalog.chapters_for("en", "GEN"), vec!["1", "2"]);
        assert!(catalog.chapters_for("es", "GEN").is_empty());
    }

    #[test]
    fn snapshot_restores_same_catalog() {
        let catalog = sample_catalog();
        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.version, CATALOG_SNAPSHOT_VERSION);

        let restored = Catalog::from_snapshot(snapshot.clone());
        assert_eq!(restored.len(), catalog.len());
        assert_eq!(restored.snapshot(), snapshot);
    }
}
