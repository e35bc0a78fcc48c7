use crate::config::ParsePolicy;
use crate::error::{Error, Result};
use crate::types::{MissionRecord, RawMissionRow, RawRegionalRow, RegionalRecord};
use crate::util::{non_empty, parse_count_safe, parse_datetime_safe, parse_f64_safe, parse_i32_safe};
use csv::{ByteRecord, ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

pub const MISSION_COLUMNS: &[&str] = &[
    "mission_created_date",
    "mission_type",
    "mission_location_district",
    "response_time",
];

pub const REGIONAL_COLUMNS: &[&str] = &[
    "district_area_name",
    "source_year",
    "mission_count_all",
    "mission_count_ems",
    "mission_count_fire",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    /// Rows that could not be mapped onto the expected columns at all.
    pub skipped_rows: usize,
    /// Cells that held a value but could not be parsed and were nulled.
    pub null_fields: usize,
    /// Leftover index columns such as `Unnamed: 0`.
    pub dropped_columns: Vec<String>,
}

/// Applies the parse policy to individual cells and keeps the tally.
struct CellParser<'a> {
    path: &'a Path,
    policy: ParsePolicy,
    null_fields: usize,
}

impl CellParser<'_> {
    fn parse<T>(
        &mut self,
        row: usize,
        column: &str,
        raw: Option<&str>,
        parse: impl Fn(Option<&str>) -> Option<T>,
    ) -> Result<Option<T>> {
        let Some(text) = non_empty(raw) else {
            return Ok(None);
        };
        if let Some(v) = parse(Some(text)) {
            return Ok(Some(v));
        }
        self.unparseable(row, column, text)?;
        Ok(None)
    }

    /// Nulls and counts the cell, or fails the load under `Reject`.
    fn unparseable(&mut self, row: usize, column: &str, text: &str) -> Result<()> {
        match self.policy {
            ParsePolicy::NullField => {
                self.null_fields += 1;
                log::debug!("{}: row {row}, column '{column}': nulling {text:?}", self.path.display());
                Ok(())
            }
            ParsePolicy::Reject => Err(Error::Parse {
                path: self.path.to_path_buf(),
                row,
                column: column.to_string(),
                value: text.to_string(),
            }),
        }
    }

    /// Copy `record`, blanking cells that are not valid UTF-8. Blanked cells
    /// in `required` columns go through the parse policy; others are ignored
    /// since nothing reads them.
    fn decode_row(&mut self, row: usize, record: &ByteRecord, required: &[(usize, &str)]) -> Result<ByteRecord> {
        let mut clean = ByteRecord::with_capacity(record.as_slice().len(), record.len());
        for (i, cell) in record.iter().enumerate() {
            if std::str::from_utf8(cell).is_ok() {
                clean.push_field(cell);
                continue;
            }
            if let Some((_, column)) = required.iter().find(|(idx, _)| *idx == i) {
                self.unparseable(row, column, &String::from_utf8_lossy(cell))?;
            }
            clean.push_field(b"");
        }
        Ok(clean)
    }
}

fn is_index_artifact(header: &str) -> bool {
    let h = header.trim();
    h.is_empty() || h.starts_with("Unnamed:")
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Shared read loop: checks the header, decodes each row into `R` and lets
/// `convert` turn it into a typed record. Rows are read as raw bytes so a
/// cell with broken encoding is handled like any other unparseable cell.
/// Rows are numbered from 1 after the header.
fn load_with<R, T>(
    path: &Path,
    required: &[&str],
    policy: ParsePolicy,
    mut convert: impl FnMut(&mut CellParser<'_>, usize, R) -> Result<T>,
) -> Result<(Vec<T>, LoadReport)>
where
    R: DeserializeOwned,
{
    let file = open(path)?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(file);
    let headers = rdr.headers()?.clone();
    let byte_headers = rdr.byte_headers()?.clone();

    let mut columns = Vec::with_capacity(required.len());
    for column in required {
        match headers.iter().position(|h| h == *column) {
            Some(idx) => columns.push((idx, *column)),
            None => {
                return Err(Error::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
            }
        }
    }

    let mut report = LoadReport {
        dropped_columns: headers
            .iter()
            .filter(|h| is_index_artifact(h))
            .map(str::to_string)
            .collect(),
        ..LoadReport::default()
    };
    if !report.dropped_columns.is_empty() {
        log::debug!(
            "{}: dropping index columns {:?}",
            path.display(),
            report.dropped_columns
        );
    }

    let mut cells = CellParser {
        path,
        policy,
        null_fields: 0,
    };
    let mut records = Vec::new();
    let mut record = ByteRecord::new();

    while rdr.read_byte_record(&mut record)? {
        report.total_rows += 1;
        let row_no = report.total_rows;
        let clean = cells.decode_row(row_no, &record, &columns)?;
        let raw = match clean.deserialize::<R>(Some(&byte_headers)) {
            Ok(r) => r,
            Err(e) => match policy {
                ParsePolicy::NullField => {
                    log::debug!("{}: skipping unreadable row {row_no}: {e}", path.display());
                    report.skipped_rows += 1;
                    continue;
                }
                ParsePolicy::Reject => return Err(e.into()),
            },
        };
        records.push(convert(&mut cells, row_no, raw)?);
    }

    report.loaded_rows = records.len();
    report.null_fields = cells.null_fields;
    if report.null_fields > 0 || report.skipped_rows > 0 {
        log::warn!(
            "{}: {} unparseable cells nulled, {} unreadable rows skipped",
            path.display(),
            report.null_fields,
            report.skipped_rows
        );
    }
    log::info!(
        "Loaded {} of {} rows from {}",
        report.loaded_rows,
        report.total_rows,
        path.display()
    );
    Ok((records, report))
}

/// Load the mission export. `mission_created_date` is parsed as a timestamp
/// and `response_time` as seconds; both follow `policy` when unparseable.
pub fn load_missions(path: &Path, policy: ParsePolicy) -> Result<(Vec<MissionRecord>, LoadReport)> {
    load_with(path, MISSION_COLUMNS, policy, |cells, row, raw: RawMissionRow| {
        Ok(MissionRecord {
            timestamp: cells.parse(
                row,
                "mission_created_date",
                raw.mission_created_date.as_deref(),
                parse_datetime_safe,
            )?,
            mission_type_raw: non_empty(raw.mission_type.as_deref()).map(str::to_string),
            district: non_empty(raw.mission_location_district.as_deref()).map(str::to_string),
            response_time: cells.parse(row, "response_time", raw.response_time.as_deref(), parse_f64_safe)?,
        })
    })
}

/// Load the regional export. District names are always read as text, so a
/// numeric-looking area name still becomes a string key.
pub fn load_regional(path: &Path, policy: ParsePolicy) -> Result<(Vec<RegionalRecord>, LoadReport)> {
    load_with(path, REGIONAL_COLUMNS, policy, |cells, row, raw: RawRegionalRow| {
        Ok(RegionalRecord {
            district: non_empty(raw.district_area_name.as_deref()).map(str::to_string),
            year: cells.parse(row, "source_year", raw.source_year.as_deref(), parse_i32_safe)?,
            mission_count_all: cells.parse(
                row,
                "mission_count_all",
                raw.mission_count_all.as_deref(),
                parse_count_safe,
            )?,
            mission_count_ems: cells.parse(
                row,
                "mission_count_ems",
                raw.mission_count_ems.as_deref(),
                parse_count_safe,
            )?,
            mission_count_fire: cells.parse(
                row,
                "mission_count_fire",
                raw.mission_count_fire.as_deref(),
                parse_count_safe,
            )?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        csv_bytes(content.as_bytes())
    }

    fn csv_bytes(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content).expect("write temp file");
        file
    }

    const BROKEN_DISTRICT: &[u8] = b"mission_created_date,mission_type,mission_location_district,response_time\n\
        2021-01-01 00:00:00,Brand,Mitte,60\n\
        2021-01-02 00:00:00,Brand,Mitte\xff,90\n";

    #[test]
    fn broken_encoding_nulls_the_cell_and_keeps_the_row() {
        let file = csv_bytes(BROKEN_DISTRICT);
        let (rows, report) = load_missions(file.path(), ParsePolicy::NullField).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.null_fields, 1);
        assert_eq!(rows[1].district, None);
        assert_eq!(rows[1].response_time, Some(90.0));
    }

    #[test]
    fn broken_encoding_under_reject_is_a_parse_error() {
        let file = csv_bytes(BROKEN_DISTRICT);
        let err = load_missions(file.path(), ParsePolicy::Reject).unwrap_err();
        match err {
            Error::Parse { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "mission_location_district");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn broken_encoding_in_index_column_is_ignored() {
        let file = csv_bytes(
            b"Unnamed: 0,district_area_name,source_year,mission_count_all,mission_count_ems,mission_count_fire\n\
              \xfe,Mitte,2022,10,5,2\n",
        );
        let (rows, report) = load_regional(file.path(), ParsePolicy::Reject).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(report.null_fields, 0);
    }

    #[test]
    fn drops_index_column_and_reads_rows() {
        let file = csv_file(
            ",mission_created_date,mission_type,mission_location_district,response_time\n\
             0,2021-05-01 08:15:00,Brand,Mitte,120\n\
             1,2021-05-02 22:40:00,Rettungsdienst,,\n",
        );
        let (rows, report) = load_missions(file.path(), ParsePolicy::NullField).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(report.dropped_columns, vec![String::new()]);
        assert_eq!(rows[0].timestamp.unwrap().hour(), 8);
        assert_eq!(rows[0].district.as_deref(), Some("Mitte"));
        assert_eq!(rows[1].district, None);
        assert_eq!(rows[1].response_time, None);
        assert_eq!(report.null_fields, 0);
    }

    #[test]
    fn null_field_policy_keeps_the_row() {
        let file = csv_file(
            "Unnamed: 0,mission_created_date,mission_type,mission_location_district,response_time\n\
             0,not a date,Brand,Mitte,fast\n",
        );
        let (rows, report) = load_missions(file.path(), ParsePolicy::NullField).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, None);
        assert_eq!(rows[0].response_time, None);
        assert_eq!(report.null_fields, 2);
        assert_eq!(report.dropped_columns, vec!["Unnamed: 0".to_string()]);
    }

    #[test]
    fn reject_policy_aborts_the_load() {
        let file = csv_file(
            "mission_created_date,mission_type,mission_location_district,response_time\n\
             2021-01-01 00:00:00,Brand,Mitte,60\n\
             garbage,Brand,Mitte,60\n",
        );
        let err = load_missions(file.path(), ParsePolicy::Reject).unwrap_err();
        match err {
            Error::Parse { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "mission_created_date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_missions(Path::new("/no/such/missions.csv"), ParsePolicy::NullField).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn missing_header_is_reported() {
        let file = csv_file("district_area_name,source_year\nMitte,2021\n");
        let err = load_regional(file.path(), ParsePolicy::NullField).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "mission_count_all"));
    }

    #[test]
    fn regional_counts_and_text_districts() {
        let file = csv_file(
            "district_area_name,source_year,mission_count_all,mission_count_ems,mission_count_fire\n\
             1011,2022.0,100,60,30\n\
             Mitte,2022,-3,20,20\n",
        );
        let (rows, report) = load_regional(file.path(), ParsePolicy::NullField).unwrap();
        assert_eq!(rows[0].district.as_deref(), Some("1011"));
        assert_eq!(rows[0].year, Some(2022));
        assert_eq!(rows[0].mission_count_all, Some(100));
        assert_eq!(rows[1].mission_count_all, None);
        assert_eq!(report.null_fields, 1);
    }
}
