//! Catalog of saved recordings and its date-grouped views

mod catalog;
mod clock;
mod recording;
mod section;

pub use catalog::{Catalog, CatalogSnapshot, RecordingFilter, CATALOG_SNAPSHOT_VERSION};
pub use clock::{format_clock, format_duration};
pub use recording::{PathTriple, Recording};
pub use section::{parse_section_title, section_title, sort_sections, Section, SortOrder};
