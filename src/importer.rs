// 📥 Importer - corp.xml → corporations table
//
// Runs once at startup, before the server accepts requests.
// Guard: a store holding ANY rows is left alone, even if an earlier
// import died half-way. Partial imports are not resumed.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::record::{CorporateRecord, RecordField};
use crate::store::CorporationStore;

/// Tag wrapping one corporation in the registry export
pub const ENTRY_TAG: &str = "list";

/// Log a progress line every N entries
pub const PROGRESS_INTERVAL: usize = 1000;

// ============================================================================
// PARSED ENTRY
// ============================================================================

/// One `<list>` element as found in the document, before normalization
///
/// `None` means the tag was missing, `Some("")` means it was present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorporationEntry {
    pub corp_code: Option<String>,
    pub corp_name: Option<String>,
    pub corp_eng_name: Option<String>,
    pub stock_code: Option<String>,
    pub modify_date: Option<String>,
}

impl CorporationEntry {
    fn slot(&mut self, field: RecordField) -> &mut Option<String> {
        match field {
            RecordField::Code => &mut self.corp_code,
            RecordField::Name => &mut self.corp_name,
            RecordField::EnglishName => &mut self.corp_eng_name,
            RecordField::ShortCode => &mut self.stock_code,
            RecordField::LastModified => &mut self.modify_date,
        }
    }

    /// Convert to a record. Blank english name / stock code become `None`;
    /// the other three fields are taken as-is but must be present.
    pub fn into_record(self) -> Result<CorporateRecord> {
        let code = self.corp_code.context("entry has no <corp_code>")?;
        let name = self
            .corp_name
            .with_context(|| format!("entry {code} has no <corp_name>"))?;
        let modify_date = self
            .modify_date
            .with_context(|| format!("entry {code} has no <modify_date>"))?;

        Ok(CorporateRecord::new(
            code,
            name,
            self.corp_eng_name,
            self.stock_code,
            modify_date,
        ))
    }
}

/// Parse a whole registry document into entries, in document order
///
/// Every `<list>` element at any depth is an entry. Within an entry the first
/// occurrence of each field tag wins; nested markup inside a field
/// contributes its text.
pub fn parse_document(xml: &str) -> Result<Vec<CorporationEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut entries = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut root_closed = false;

    // (entry, depth of its <list>)
    let mut current: Option<(CorporationEntry, usize)> = None;
    // (field being captured, depth of its start tag)
    let mut capture: Option<(RecordField, usize)> = None;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML near byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(e) => {
                let name = std::str::from_utf8(e.name().into_inner())
                    .context("Element name is not UTF-8")?
                    .to_string();
                if root_closed {
                    bail!("Element <{}> after the root element", name);
                }
                saw_root = true;
                open.push(name);
                let depth = open.len();
                let name = &open[depth - 1];

                match current.as_mut() {
                    None if name == ENTRY_TAG => {
                        current = Some((CorporationEntry::default(), depth));
                    }
                    Some((entry, _)) if capture.is_none() => {
                        if let Some(field) = RecordField::from_column(name) {
                            let slot = entry.slot(field);
                            if slot.is_none() {
                                *slot = Some(String::new());
                                capture = Some((field, depth));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = std::str::from_utf8(e.name().into_inner())
                    .context("Element name is not UTF-8")?;
                if root_closed {
                    bail!("Element <{}> after the root element", name);
                }
                saw_root = true;
                if open.is_empty() {
                    root_closed = true;
                }

                match current.as_mut() {
                    None if name == ENTRY_TAG => entries.push(CorporationEntry::default()),
                    Some((entry, _)) if capture.is_none() => {
                        if let Some(field) = RecordField::from_column(name) {
                            entry.slot(field).get_or_insert_with(String::new);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if open.is_empty() {
                    let text = t.unescape().context("Invalid character reference")?;
                    if !is_blank_outside_root(&text) {
                        bail!("Text outside the root element: {:?}", text.trim());
                    }
                    continue;
                }
                if let (Some((entry, _)), Some((field, _))) = (current.as_mut(), capture) {
                    let text = t.unescape().context("Invalid character reference")?;
                    entry.slot(field).get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(c) => {
                if let (Some((entry, _)), Some((field, _))) = (current.as_mut(), capture) {
                    let bytes = c.into_inner();
                    let text = std::str::from_utf8(&bytes).context("CDATA is not UTF-8")?;
                    entry.slot(field).get_or_insert_with(String::new).push_str(text);
                }
            }
            Event::End(_) => {
                let depth = open.len();
                open.pop();
                if open.is_empty() {
                    root_closed = true;
                }

                if matches!(capture, Some((_, d)) if d == depth) {
                    capture = None;
                }
                if matches!(current, Some((_, d)) if d == depth) {
                    if let Some((entry, _)) = current.take() {
                        entries.push(entry);
                    }
                }
            }
            Event::Eof => {
                if let Some(unclosed) = open.last() {
                    bail!("Document ended inside <{}>", unclosed);
                }
                if !saw_root {
                    bail!("Document has no root element");
                }
                break;
            }
            _ => {}
        }
    }

    Ok(entries)
}

/// Only whitespace (and a byte-order mark) may surround the root element
fn is_blank_outside_root(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{feff}')
}

// ============================================================================
// IMPORT
// ============================================================================

/// Counters for one import run
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Entries taken from the document (including one that failed to save)
    pub processed: usize,
    pub saved: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportReport {
    fn start() -> Self {
        ImportReport {
            processed: 0,
            saved: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// What the startup import step did
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    /// Store already had rows; nothing read or written
    AlreadyLoaded { existing: i64 },
    /// Source document not found; nothing written
    SourceMissing { path: PathBuf },
    Imported(ImportReport),
    /// Import aborted; the first `saved` entries remain in the store
    Failed { saved: usize, error: String },
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::AlreadyLoaded { existing } => {
                write!(f, "data already loaded ({} corporations)", existing)
            }
            ImportOutcome::SourceMissing { path } => {
                write!(f, "source document {} not found", path.display())
            }
            ImportOutcome::Imported(report) => write!(
                f,
                "imported {} corporations in {} ms",
                report.saved,
                report.elapsed().num_milliseconds()
            ),
            ImportOutcome::Failed { saved, error } => {
                write!(f, "import failed after {} corporations: {}", saved, error)
            }
        }
    }
}

/// Read `path` and upsert every entry into `store`
///
/// Stops at the first error. Rows written before the error stay written.
pub fn import_document(store: &dyn CorporationStore, path: &Path) -> Result<ImportReport> {
    let mut report = ImportReport::start();
    import_into(store, path, &mut report)?;
    Ok(report.finish())
}

fn import_into(store: &dyn CorporationStore, path: &Path, report: &mut ImportReport) -> Result<()> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let entries = parse_document(&xml)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!("Parsed {} entries from {}", entries.len(), path.display());

    for entry in entries {
        report.processed += 1;

        let record = entry
            .into_record()
            .with_context(|| format!("Invalid entry #{}", report.processed))?;
        store.save(&record)?;
        report.saved += 1;

        if report.processed % PROGRESS_INTERVAL == 0 {
            info!("Processed {} corporations", report.processed);
        }
    }

    Ok(())
}

/// Startup step: import `path` only when the store is empty
///
/// Missing or broken source documents are logged and reported through the
/// outcome, never returned as `Err`. `Err` means the store could not even be
/// counted.
pub fn load_if_empty(store: &dyn CorporationStore, path: &Path) -> Result<ImportOutcome> {
    let existing = store.count().context("Failed to count stored corporations")?;
    if existing > 0 {
        info!("Data already loaded: {} corporations", existing);
        return Ok(ImportOutcome::AlreadyLoaded { existing });
    }

    if !path.exists() {
        warn!("Source document {} not found, starting with an empty store", path.display());
        return Ok(ImportOutcome::SourceMissing {
            path: path.to_path_buf(),
        });
    }

    info!("Loading {} into the corporation store...", path.display());

    let mut report = ImportReport::start();
    match import_into(store, path, &mut report) {
        Ok(()) => {
            let report = report.finish();
            info!(
                "Data load complete: {} corporations ({} ms)",
                report.saved,
                report.elapsed().num_milliseconds()
            );
            Ok(ImportOutcome::Imported(report))
        }
        Err(e) => {
            error!(
                "Import of {} failed after {} corporations: {:?}",
                path.display(),
                report.saved,
                e
            );
            Ok(ImportOutcome::Failed {
                saved: report.saved,
                error: format!("{:#}", e),
            })
        }
    }
}
