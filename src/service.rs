// 🔎 Query Service - read-only lookups over the corporation store

use anyhow::Result;
use std::sync::Arc;

use crate::record::{CorporateRecord, RecordField, SearchScope};
use crate::store::CorporationStore;

/// CorporationService - thin layer the HTTP handlers and the CLI call into
///
/// Cheap to clone; every clone shares the same store handle.
#[derive(Clone)]
pub struct CorporationService {
    store: Arc<dyn CorporationStore>,
}

impl CorporationService {
    pub fn new(store: Arc<dyn CorporationStore>) -> Self {
        CorporationService { store }
    }

    pub fn store(&self) -> &dyn CorporationStore {
        self.store.as_ref()
    }

    /// Substring search over name and english name, ordered by name
    ///
    /// Missing or blank input returns nothing rather than everything.
    pub fn search_by_name(&self, text: Option<&str>) -> Result<Vec<CorporateRecord>> {
        match non_blank(text) {
            Some(text) => self.store.find_containing(text, SearchScope::NameOrEnglishName),
            None => Ok(Vec::new()),
        }
    }

    /// Same as `search_by_name`, but ignores the english name
    pub fn search_by_name_only(&self, text: Option<&str>) -> Result<Vec<CorporateRecord>> {
        match non_blank(text) {
            Some(text) => self.store.find_containing(text, SearchScope::Name),
            None => Ok(Vec::new()),
        }
    }

    /// First corporation whose name is exactly `name`
    pub fn find_by_exact_name(&self, name: &str) -> Result<Option<CorporateRecord>> {
        let found = self.store.find_by_field(RecordField::Name, name)?;
        Ok(found.into_iter().next())
    }

    pub fn get_by_code(&self, code: &str) -> Result<Option<CorporateRecord>> {
        self.store.find_by_id(code)
    }

    /// Exact stock-code match. Stock codes are not unique, so this is a list.
    pub fn search_by_short_code(&self, code: Option<&str>) -> Result<Vec<CorporateRecord>> {
        match non_blank(code) {
            Some(code) => self.store.find_by_field(RecordField::ShortCode, code),
            None => Ok(Vec::new()),
        }
    }

    pub fn count(&self) -> Result<i64> {
        self.store.count()
    }

    /// Every corporation, ordered by name (no paging)
    pub fn all(&self) -> Result<Vec<CorporateRecord>> {
        self.store.find_all()
    }

    /// Upsert one record, blank optionals stored as absent
    pub fn save(&self, record: CorporateRecord) -> Result<CorporateRecord> {
        let record = record.normalized();
        self.store.save(&record)?;
        Ok(record)
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn service() -> CorporationService {
        let store = SqliteStore::open_in_memory().unwrap();
        let service = CorporationService::new(Arc::new(store));

        for record in [
            CorporateRecord::new("00100001", "Alpha", Some("Alpha Inc.".into()), Some("000001".into()), "20240101"),
            CorporateRecord::new("00100002", "Beta Corp", Some("Beta Corporation".into()), None, "20240102"),
            CorporateRecord::new("00100003", "Gamma", None, Some("000003".into()), "20240103"),
            CorporateRecord::new("00100004", "Delta", Some("Gamma Partners".into()), None, "20240104"),
        ] {
            service.save(record).unwrap();
        }

        service
    }

    #[test]
    fn test_search_by_name_matches_either_name() {
        let service = service();

        let found = service.search_by_name(Some("Gamma")).unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();

        // Delta matches through its english name and sorts first
        assert_eq!(names, vec!["Delta", "Gamma"]);
        for record in &found {
            let in_name = record.name.contains("Gamma");
            let in_eng = record.english_name.as_deref().is_some_and(|e| e.contains("Gamma"));
            assert!(in_name || in_eng);
        }
    }

    #[test]
    fn test_search_by_name_blank_input_returns_nothing() {
        let service = service();

        assert!(service.search_by_name(None).unwrap().is_empty());
        assert!(service.search_by_name(Some("")).unwrap().is_empty());
        assert!(service.search_by_name(Some("   ")).unwrap().is_empty());
    }

    #[test]
    fn test_search_by_name_trims_input() {
        let service = service();

        let found = service.search_by_name(Some("  Beta ")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "00100002");
    }

    #[test]
    fn test_search_by_name_only() {
        let service = service();

        let found = service.search_by_name_only(Some("Gamma")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Gamma");
    }

    #[test]
    fn test_find_by_exact_name() {
        let service = service();

        assert_eq!(
            service.find_by_exact_name("Beta Corp").unwrap().map(|r| r.code),
            Some("00100002".to_string())
        );
        assert!(service.find_by_exact_name("Beta").unwrap().is_none());
    }

    #[test]
    fn test_get_by_code() {
        let service = service();

        let alpha = service.get_by_code("00100001").unwrap().unwrap();
        assert_eq!(
            alpha,
            CorporateRecord::new("00100001", "Alpha", Some("Alpha Inc.".into()), Some("000001".into()), "20240101")
        );
        assert!(service.get_by_code("00000000").unwrap().is_none());
    }

    #[test]
    fn test_search_by_short_code() {
        let service = service();

        let found = service.search_by_short_code(Some("000003")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Gamma");

        assert!(service.search_by_short_code(Some("")).unwrap().is_empty());
        assert!(service.search_by_short_code(None).unwrap().is_empty());
        assert!(service.search_by_short_code(Some("999999")).unwrap().is_empty());
    }

    #[test]
    fn test_save_normalizes_and_upserts() {
        let service = service();

        let mut record = service.get_by_code("00100001").unwrap().unwrap();
        record.english_name = Some(" ".to_string());
        record.name = "Alpha Renamed".to_string();

        let saved = service.save(record).unwrap();
        assert_eq!(saved.english_name, None);

        assert_eq!(service.count().unwrap(), 4);
        let stored = service.get_by_code("00100001").unwrap().unwrap();
        assert_eq!(stored.name, "Alpha Renamed");
        assert_eq!(stored.english_name, None);
    }

    #[test]
    fn test_all_ordered_by_name() {
        let service = service();

        let names: Vec<String> = service.all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta Corp", "Delta", "Gamma"]);
    }

    #[test]
    fn test_concurrent_reads() {
        let service = service();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || service.search_by_name(Some("a")).unwrap().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
    }
}
