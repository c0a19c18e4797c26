//! App wiring and the non-interactive commands

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::debug;

use crate::application::ports::{AudioDevice, ConfigStore, FileSystem};
use crate::application::{LoadSource, RecordingStore, StoreConfig, StoreError};
use crate::domain::catalog::RecordingFilter;
use crate::domain::config::AppConfig;
use crate::domain::SortOrder;
use crate::infrastructure::{CpalAudioDevice, JsonCatalogCache, LocalFileSystem, XdgConfigStore};

use super::args::ListArgs;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment overrides
pub const ENV_LANGUAGE: &str = "VERSE_RECORDER_LANGUAGE";
pub const ENV_DIR: &str = "VERSE_RECORDER_DIR";

/// Catalog cache file kept inside a directory given with `--dir`
pub const DIR_CACHE_FILE: &str = ".verse-recorder-catalog.json";

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            Presenter::new().warn(&format!("Ignoring config file: {}", e));
            AppConfig::empty()
        }
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}

fn env_config() -> AppConfig {
    AppConfig {
        language: env::var(ENV_LANGUAGE).ok().filter(|s| !s.is_empty()),
        recordings_dir: env::var(ENV_DIR)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from),
        ..Default::default()
    }
}

/// Config overrides for an explicit `--dir`; its catalog cache lives beside it
pub fn dir_override(dir: Option<PathBuf>) -> AppConfig {
    match dir {
        Some(dir) => AppConfig {
            cache_path: Some(dir.join(DIR_CACHE_FILE)),
            recordings_dir: Some(dir),
            ..Default::default()
        },
        None => AppConfig::empty(),
    }
}

/// Adapters shared by every command
pub struct Services {
    pub device: Arc<dyn AudioDevice>,
    pub fs: Arc<dyn FileSystem>,
    pub store: Arc<RecordingStore>,
}

impl Services {
    pub fn new(config: &AppConfig) -> Self {
        let device: Arc<dyn AudioDevice> = Arc::new(CpalAudioDevice::new());
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
        let cache = Arc::new(JsonCatalogCache::new(config.cache_path_or_default()));
        let store = Arc::new(RecordingStore::new(
            Arc::clone(&fs),
            Arc::clone(&device),
            cache,
            StoreConfig::from_app_config(config),
        ));
        Self { device, fs, store }
    }

    /// Populate the catalog, from the cache unless `rescan` is set
    pub async fn load_catalog(&self, rescan: bool) -> Result<(), StoreError> {
        if rescan {
            let count = self.store.invalidate().await?;
            debug!(count, "catalog rebuilt on request");
        } else if self.store.load().await? == LoadSource::Scan {
            debug!(root = %self.store.root().display(), "catalog cache missed");
        }
        Ok(())
    }
}

/// `list`: print recordings grouped by date
pub async fn run_list(args: ListArgs, config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let services = Services::new(&config);

    if let Err(e) = services.load_catalog(args.rescan).await {
        presenter.error(&format!("Failed to load recordings: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    let store = &services.store;

    if args.ascending {
        store.set_sort_order(SortOrder::Ascending).await;
    }

    if args.summary {
        print_summary(store, &args, &presenter).await;
        return ExitCode::from(EXIT_SUCCESS);
    }

    let filter = build_filter(&args);
    let sections = store.filter(&filter).await;
    if sections.is_empty() {
        presenter.info(&format!(
            "No recordings found under {}",
            store.root().display()
        ));
        return ExitCode::from(EXIT_SUCCESS);
    }

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            presenter.output("");
        }
        presenter.section(section);
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn build_filter(args: &ListArgs) -> RecordingFilter {
    let mut filter = RecordingFilter::default();
    if let Some(language) = &args.language {
        filter = filter.language(language.clone());
    }
    if let Some(book) = &args.book {
        filter = filter.book(book.clone());
    }
    if let Some(chapter) = &args.chapter {
        filter = filter.chapter(chapter.clone());
    }
    filter
}

/// Option lists narrowed by whatever is already selected
async fn print_summary(store: &RecordingStore, args: &ListArgs, presenter: &Presenter) {
    match (&args.language, &args.book) {
        (Some(language), Some(book)) => {
            presenter.key_value("chapters", &store.chapters_for(language, book).await.join(", "));
        }
        (Some(language), None) => {
            presenter.key_value("books", &store.books_for(language).await.join(", "));
        }
        _ => {
            presenter.key_value("languages", &store.languages().await.join(", "));
            presenter.key_value("books", &store.books().await.join(", "));
            presenter.key_value("chapters", &store.chapters().await.join(", "));
        }
    }
}

/// `export`: copy a recording out of the catalog tree
pub async fn run_export(path: PathBuf, to: Option<PathBuf>, config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let services = Services::new(&config);

    let source = resolve_recording_path(services.store.root(), &path);
    let dest = to.unwrap_or_else(|| config.export_dir_or_default());

    match services.store.export(&source, &dest).await {
        Ok(exported) => {
            presenter.success("Recording exported");
            presenter.output(&exported.to_string_lossy());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Export failed: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Relative paths are taken from the recordings root
fn resolve_recording_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
