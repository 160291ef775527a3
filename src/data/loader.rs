use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::model::{Listing, ListingTable, Schema, OPTIONAL_COLUMNS};
use crate::error::DataError;

/// Conventional name of the listings file.
pub const DATA_FILE_NAME: &str = "vehicles_us.csv";

/// Cell contents treated as missing in categorical columns.
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Locate the data file: relative to the working directory first, then next
/// to the running executable.
pub fn resolve_data_path(file_name: &str) -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_against(Path::new(file_name), exe_dir.as_deref())
}

fn resolve_against(file: &Path, fallback_dir: Option<&Path>) -> PathBuf {
    if file.exists() {
        return file.to_path_buf();
    }
    match fallback_dir {
        Some(dir) => dir.join(file),
        None => file.to_path_buf(),
    }
}

/// Load the listings table from a CSV file on disk.
pub fn load_listings(path: &Path) -> Result<ListingTable, DataError> {
    if !path.is_file() {
        return Err(DataError::DataSourceNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_listings(file)?;
    log::info!("Loaded {} listings from {}", table.len(), path.display());
    Ok(table)
}

/// Parse listings from any CSV reader.
///
/// Only an unreadable header fails the call. Cells that do not coerce (or are
/// not valid UTF-8) become `None`; the rest of their row is kept.
pub fn read_listings<R: Read>(reader: R) -> Result<ListingTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = dedupe_headers(reader.headers()?);
    let schema = Schema::from_headers(headers.iter());
    let missing = schema.missing_required();
    if !missing.is_empty() {
        log::warn!("Listings file lacks columns {missing:?}; they load as null");
    }
    let absent_optional: Vec<&str> = OPTIONAL_COLUMNS
        .iter()
        .copied()
        .filter(|c| !schema.has(c))
        .collect();
    if !absent_optional.is_empty() {
        log::debug!("Optional columns not present: {absent_optional:?}");
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    let mut bad_cells = 0usize;
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = match result {
            Ok(raw) => decode_record(&raw, &mut bad_cells),
            Err(e) => {
                log::debug!("Skipping CSV row {row_no}: {e}");
                skipped += 1;
                continue;
            }
        };
        match record.deserialize::<RawListing>(Some(&headers)) {
            Ok(raw) => rows.push(raw.coerce()),
            Err(e) => {
                log::debug!("Skipping CSV row {row_no}: {e}");
                skipped += 1;
            }
        }
    }
    if bad_cells > 0 {
        log::warn!("{bad_cells} cells were not valid UTF-8 and load as null");
    }
    if skipped > 0 {
        log::warn!("Skipped {skipped} undecodable rows");
    }

    Ok(ListingTable::from_listings(rows, schema))
}

/// Rename repeated header names to `name.1`, `name.2`, ... so the first
/// occurrence keeps the plain name.
fn dedupe_headers(headers: &csv::StringRecord) -> csv::StringRecord {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let renamed: csv::StringRecord = headers
        .iter()
        .map(|name| {
            let n = seen.entry(name).or_insert(0);
            let out = if *n == 0 {
                name.to_string()
            } else {
                format!("{name}.{n}")
            };
            *n += 1;
            out
        })
        .collect();
    if renamed != *headers {
        log::warn!("Duplicate column names renamed: {renamed:?}");
    }
    renamed
}

/// Decode each cell on its own; invalid UTF-8 becomes an empty (null) cell.
fn decode_record(raw: &csv::ByteRecord, bad_cells: &mut usize) -> csv::StringRecord {
    raw.iter()
        .map(|cell| {
            std::str::from_utf8(cell).unwrap_or_else(|_| {
                *bad_cells += 1;
                ""
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Raw CSV record → Listing
// ---------------------------------------------------------------------------

/// One CSV row exactly as read; every column is optional text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListing {
    price: Option<String>,
    model_year: Option<String>,
    model: Option<String>,
    condition: Option<String>,
    cylinders: Option<String>,
    fuel: Option<String>,
    odometer: Option<String>,
    transmission: Option<String>,
    #[serde(rename = "type")]
    vehicle_type: Option<String>,
    paint_color: Option<String>,
    is_4wd: Option<String>,
    date_posted: Option<String>,
    days_listed: Option<String>,
}

impl RawListing {
    fn coerce(self) -> Listing {
        Listing {
            price: parse_number(self.price.as_deref()),
            model_year: parse_number(self.model_year.as_deref()),
            model: parse_category(self.model),
            condition: parse_category(self.condition),
            cylinders: parse_number(self.cylinders.as_deref()),
            fuel: parse_category(self.fuel),
            odometer: parse_number(self.odometer.as_deref()),
            transmission: parse_category(self.transmission),
            vehicle_type: parse_category(self.vehicle_type),
            paint_color: parse_category(self.paint_color),
            is_4wd: parse_number(self.is_4wd.as_deref()),
            date_posted: self.date_posted.as_deref().and_then(parse_timestamp),
            days_listed: parse_number(self.days_listed.as_deref()),
        }
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_category(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if NULL_MARKERS.contains(&trimmed) {
        return None;
    }
    if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

// ---------------------------------------------------------------------------
// Load cache
// ---------------------------------------------------------------------------

/// Identity of a file's contents as seen by the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileSignature {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileSignature {
    fn of(path: &Path) -> Result<Self, DataError> {
        let meta = std::fs::metadata(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DataError::DataSourceNotFound {
                path: path.to_path_buf(),
            },
            _ => DataError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(FileSignature {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug)]
struct CacheEntry {
    path: PathBuf,
    signature: FileSignature,
    table: Arc<ListingTable>,
}

/// Remembers the last loaded table, keyed by path and file signature.
///
/// The lock is held while loading, so concurrent callers never read the same
/// file twice.
#[derive(Debug, Default)]
pub struct ListingCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table if `path` is unchanged, otherwise (re)load it.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<ListingTable>, DataError> {
        if !path.is_file() {
            return Err(DataError::DataSourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let signature = FileSignature::of(&key)?;

        let mut entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = entry.as_ref() {
            if cached.path == key && cached.signature == signature {
                log::debug!("Cache hit for {}", key.display());
                return Ok(Arc::clone(&cached.table));
            }
        }

        let table = Arc::new(load_listings(&key)?);
        *entry = Some(CacheEntry {
            path: key,
            signature,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Whether an unchanged copy of `path` is cached.
    pub fn is_cached(&self, path: &Path) -> bool {
        let Ok(key) = std::fs::canonicalize(path) else {
            return false;
        };
        let Ok(signature) = FileSignature::of(&key) else {
            return false;
        };
        let entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entry
            .as_ref()
            .is_some_and(|c| c.path == key && c.signature == signature)
    }

    /// Drop the cached table; the next `get_or_load` re-reads the file.
    pub fn invalidate(&self) {
        let mut entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const HEADER: &str =
        "price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn parses_a_clean_row() {
        let csv = format!(
            "{HEADER}\n9400,2011,bmw x5,good,6,gas,145000,automatic,SUV,,1,2018-06-23,19\n"
        );
        let table = read_listings(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);

        let row = &table.rows()[0];
        assert_eq!(row.price, Some(9400.0));
        assert_eq!(row.model_year, Some(2011.0));
        assert_eq!(row.model.as_deref(), Some("bmw x5"));
        assert_eq!(row.vehicle_type.as_deref(), Some("SUV"));
        assert_eq!(row.cylinders, Some(6.0));
        assert_eq!(row.is_4wd, Some(1.0));
        assert_eq!(row.paint_color, None);
        assert_eq!(row.posting_year(), Some(2018));
        assert_eq!(row.days_listed, Some(19.0));
    }

    #[test]
    fn bad_model_year_becomes_null_and_row_survives() {
        let csv = format!(
            "{HEADER}\n5000,abc,ford f-150,fair,8,gas,88000,manual,truck,red,,2019-01-07,40\n"
        );
        let table = read_listings(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);

        let row = &table.rows()[0];
        assert_eq!(row.model_year, None);
        assert_eq!(row.price, Some(5000.0));
        assert_eq!(row.model.as_deref(), Some("ford f-150"));
        assert_eq!(row.fuel.as_deref(), Some("gas"));
        assert_eq!(row.odometer, Some(88000.0));
        assert_eq!(row.paint_color.as_deref(), Some("red"));
        assert_eq!(row.is_4wd, None);
    }

    #[test]
    fn dirty_cells_degrade_to_null() {
        let csv = format!(
            "{HEADER}\nNaN,2010.0,civic,NA,four,gas,lots,automatic,sedan,blue,yes,not a date,\n"
        );
        let table = read_listings(csv.as_bytes()).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.price, None);
        assert_eq!(row.model_year, Some(2010.0));
        assert_eq!(row.condition, None);
        assert_eq!(row.cylinders, None);
        assert_eq!(row.odometer, None);
        assert_eq!(row.is_4wd, None);
        assert_eq!(row.date_posted, None);
        assert_eq!(row.posting_year(), None);
        assert_eq!(row.days_listed, None);
    }

    #[test]
    fn invalid_utf8_cell_is_null_and_row_survives() {
        let mut csv = format!("{HEADER}\n").into_bytes();
        csv.extend_from_slice(b"1000,2010,caf\xe9,good,4,gas,50000,manual,sedan,,,2018-05-01,3\n");
        csv.extend_from_slice(b"2000,2012,civic,fair,4,gas,60000,automatic,sedan,,,2018-06-01,4\n");
        let table = read_listings(csv.as_slice()).unwrap();
        assert_eq!(table.len(), 2);

        let row = &table.rows()[0];
        assert_eq!(row.model, None);
        assert_eq!(row.price, Some(1000.0));
        assert_eq!(row.model_year, Some(2010.0));
        assert_eq!(row.fuel.as_deref(), Some("gas"));
        assert_eq!(row.posting_year(), Some(2018));
        assert_eq!(table.rows()[1].model.as_deref(), Some("civic"));
    }

    #[test]
    fn duplicate_header_keeps_first_column() {
        let csv = format!(
            "{HEADER},price\n9400,2011,bmw x5,good,6,gas,145000,automatic,SUV,,1,2018-06-23,19,1\n"
        );
        let table = read_listings(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].price, Some(9400.0));
        assert_eq!(table.rows()[0].model.as_deref(), Some("bmw x5"));
        assert!(table.schema().has("price.1"));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let csv = "price,model_year,model,condition,fuel,odometer,transmission,type,date_posted\n\
                   1000,2005,camry,good,gas,200000,automatic,sedan,2018-10-01\n";
        let table = read_listings(csv.as_bytes()).unwrap();
        assert!(!table.schema().has("cylinders"));
        assert!(!table.schema().has("is_4wd"));
        assert!(table.schema().missing_required().is_empty());

        let row = &table.rows()[0];
        assert_eq!(row.cylinders, None);
        assert_eq!(row.is_4wd, None);
        assert_eq!(row.price, Some(1000.0));
    }

    #[test]
    fn short_rows_fill_with_nulls() {
        let csv = format!("{HEADER}\n1500,2001,corolla\n");
        let table = read_listings(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row.price, Some(1500.0));
        assert_eq!(row.model.as_deref(), Some("corolla"));
        assert_eq!(row.fuel, None);
        assert_eq!(row.date_posted, None);
    }

    #[test]
    fn accepts_several_timestamp_layouts() {
        let expect = |s: &str, year: i32| {
            let parsed = parse_timestamp(s);
            assert!(parsed.is_some(), "failed to parse {s:?}");
            assert_eq!(parsed.map(|d| chrono::Datelike::year(&d)), Some(year));
        };
        expect("2018-06-23", 2018);
        expect("2019-01-07 13:45:00", 2019);
        expect("2017-03-02T08:00:00.250", 2017);
        expect("2016-12-31T23:00:00-05:00", 2017);
        expect("04/15/2015", 2015);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn missing_file_is_data_source_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);
        match load_listings(&path) {
            Err(DataError::DataSourceNotFound { path: p }) => assert_eq!(p, path),
            other => panic!("expected DataSourceNotFound, got {other:?}"),
        }
        assert!(matches!(
            ListingCache::new().get_or_load(&path),
            Err(DataError::DataSourceNotFound { .. })
        ));
    }

    #[test]
    fn directory_is_not_a_data_source() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_listings(dir.path()),
            Err(DataError::DataSourceNotFound { .. })
        ));
    }

    #[test]
    fn resolves_existing_path_before_fallback() {
        let file = write_csv(HEADER);
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_against(file.path(), Some(dir.path())), file.path());

        let missing = Path::new("surely-not-here-vehicles.csv");
        assert_eq!(
            resolve_against(missing, Some(dir.path())),
            dir.path().join(missing)
        );
        assert_eq!(resolve_against(missing, None), missing);
    }

    #[test]
    fn cache_reuses_table_until_file_changes() {
        let mut file = write_csv(&format!(
            "{HEADER}\n1000,2010,a,good,4,gas,1,manual,sedan,,,2018-01-01,1\n"
        ));
        let cache = ListingCache::new();
        assert!(!cache.is_cached(file.path()));

        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_cached(file.path()));

        file.write_all(b"2000,2012,b,fair,6,diesel,2,automatic,truck,,,2019-01-01,2\n")
            .unwrap();
        file.flush().unwrap();

        let third = cache.get_or_load(file.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn concurrent_callers_share_one_table() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ListingCache>();

        let file = write_csv(&format!(
            "{HEADER}\n1000,2010,a,good,4,gas,1,manual,sedan,,,2018-01-01,1\n"
        ));
        let cache = ListingCache::new();
        let (cache_ref, path) = (&cache, file.path());
        let tables: Vec<Arc<ListingTable>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(move || cache_ref.get_or_load(path)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        assert_eq!(tables.len(), 8);
        for table in &tables[1..] {
            assert!(Arc::ptr_eq(&tables[0], table));
        }
        assert!(cache.is_cached(file.path()));
    }

    #[test]
    fn invalidate_forces_reload() {
        let file = write_csv(&format!(
            "{HEADER}\n1000,2010,a,good,4,gas,1,manual,sedan,,,2018-01-01,1\n"
        ));
        let cache = ListingCache::new();
        let first = cache.get_or_load(file.path()).unwrap();
        cache.invalidate();
        assert!(!cache.is_cached(file.path()));
        let second = cache.get_or_load(file.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.rows(), second.rows());
    }
}
