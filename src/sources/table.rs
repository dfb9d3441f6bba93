use super::SourceSpec;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Default substituted for every malformed numeric cell.
const METRIC_DEFAULT: f64 = 0.0;

/// One county's metrics for a single source table.
#[derive(Debug, Clone)]
pub struct CountyMetricRow {
    pub county_fips: String,
    pub state: String,
    pub metrics: HashMap<String, f64>,
}

/// A source table keyed by normalized county FIPS. Loaded once, immutable.
#[derive(Debug, Clone)]
pub struct MetricTable {
    name: &'static str,
    rows: HashMap<String, CountyMetricRow>,
    columns: HashSet<String>,
}

impl MetricTable {
    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            rows: HashMap::new(),
            columns: HashSet::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn row(&self, county_fips: &str) -> Option<&CountyMetricRow> {
        self.rows.get(county_fips)
    }

    /// True when the column appeared in the table header. Distinguishes a
    /// genuinely absent metric from one that parsed to the default.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn counties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows
            .values()
            .map(|row| (row.county_fips.as_str(), row.state.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Loads a source table, returning an empty table on any failure so the batch
/// continues with UNAVAILABLE coverage for this source.
pub fn load_table(spec: &SourceSpec, path: &Path) -> MetricTable {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(source = spec.name, path = %path.display(), %err, "source table unavailable, treating as empty");
            return MetricTable::empty(spec.name);
        }
    };

    match read_table(spec, file) {
        Ok(table) => table,
        Err(err) => {
            warn!(source = spec.name, path = %path.display(), %err, "malformed source table, treating as empty");
            MetricTable::empty(spec.name)
        }
    }
}

pub fn read_table<R: Read>(spec: &SourceSpec, reader: R) -> Result<MetricTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(clean_header)
        .collect();
    let index_of = |column: &str| headers.iter().position(|header| header.as_str() == column);

    let Some(code_idx) = index_of(spec.code_column) else {
        warn!(
            source = spec.name,
            column = spec.code_column,
            "county code column missing, treating table as empty"
        );
        return Ok(MetricTable::empty(spec.name));
    };
    let state_idx = index_of(spec.state_column);

    let wanted: Vec<(String, usize)> = spec
        .numeric_columns()
        .into_iter()
        .filter_map(|column| index_of(&column).map(|idx| (column, idx)))
        .collect();

    let mut rows = HashMap::new();
    for record in csv_reader.records() {
        let record = record?;
        let county_fips = normalize_fips(record.get(code_idx).unwrap_or(""));
        if county_fips.is_empty() {
            continue;
        }

        let state = state_idx
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
            .trim()
            .to_ascii_uppercase();

        let mut metrics = HashMap::with_capacity(wanted.len());
        for (column, idx) in &wanted {
            metrics.insert(column.clone(), parse_metric(record.get(*idx).unwrap_or("")));
        }

        rows.insert(
            county_fips.clone(),
            CountyMetricRow {
                county_fips,
                state,
                metrics,
            },
        );
    }

    Ok(MetricTable {
        name: spec.name,
        rows,
        columns: wanted.into_iter().map(|(column, _)| column).collect(),
    })
}

/// The single guarded numeric parse for the whole engine. Empty, unparsable,
/// NaN, infinite, and upstream sentinel cells all collapse to the default.
pub fn parse_metric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return METRIC_DEFAULT;
    }

    match trimmed.to_ascii_uppercase().as_str() {
        "NA" | "N/A" | "NULL" | "NONE" => return METRIC_DEFAULT,
        _ => {}
    }

    let value: f64 = match trimmed.parse() {
        Ok(value) => value,
        Err(_) => return METRIC_DEFAULT,
    };

    if !value.is_finite() || value == -999.0 {
        return METRIC_DEFAULT;
    }

    value
}

/// Normalizes a county code to the fixed 5-digit zero-padded form, so a raw
/// "6037" and "06037" resolve to the same row. Non-numeric input yields an
/// empty string, which callers treat as no county.
pub fn normalize_fips(raw: &str) -> String {
    let cleaned = raw.replace(['\u{feff}', '\u{200b}'], "");
    let trimmed = cleaned.trim();
    let integral = trimmed.split('.').next().unwrap_or("");

    let digits: String = integral.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > 5 {
        return String::new();
    }

    format!("{digits:0>5}")
}

fn clean_header(raw: &str) -> String {
    raw.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::nri_spec;
    use std::io::Cursor;

    #[test]
    fn parse_metric_guards_every_malformed_shape() {
        assert_eq!(parse_metric("42.5"), 42.5);
        assert_eq!(parse_metric(" 7 "), 7.0);
        assert_eq!(parse_metric(""), 0.0);
        assert_eq!(parse_metric("not-a-number"), 0.0);
        assert_eq!(parse_metric("NaN"), 0.0);
        assert_eq!(parse_metric("inf"), 0.0);
        assert_eq!(parse_metric("-inf"), 0.0);
        assert_eq!(parse_metric("-999"), 0.0);
        assert_eq!(parse_metric("NA"), 0.0);
        assert_eq!(parse_metric("null"), 0.0);
    }

    #[test]
    fn normalize_fips_pads_and_strips() {
        assert_eq!(normalize_fips("6037"), "06037");
        assert_eq!(normalize_fips("06037"), "06037");
        assert_eq!(normalize_fips("6037.0"), "06037");
        assert_eq!(normalize_fips("\u{feff}4013"), "04013");
        assert_eq!(normalize_fips("  "), "");
        assert_eq!(normalize_fips("abc"), "");
        assert_eq!(normalize_fips("123456"), "");
    }

    #[test]
    fn reader_keys_rows_by_normalized_fips() {
        let spec = nri_spec();
        let csv = "STCOFIPS,STATEABBRV,EAL_SCORE,SOVI_SCORE,RESL_SCORE,EAL_VALT\n\
                   6037,ca,55.2,60.1,40.0,1200000\n\
                   06073,CA,48.9,NaN,38.5,\n";

        let table = read_table(&spec, Cursor::new(csv)).expect("table parses");
        assert_eq!(table.len(), 2);

        let row = table.row("06037").expect("padded code resolves");
        assert_eq!(row.state, "CA");
        assert_eq!(row.metrics["EAL_SCORE"], 55.2);

        let row = table.row("06073").expect("row present");
        assert_eq!(row.metrics["SOVI_SCORE"], 0.0, "NaN collapses to default");
        assert_eq!(row.metrics["EAL_VALT"], 0.0, "empty cell collapses to default");
    }

    #[test]
    fn bom_on_first_header_is_stripped() {
        let spec = nri_spec();
        let csv = "\u{feff}STCOFIPS,STATEABBRV,EAL_SCORE\n6037,CA,12.0\n";

        let table = read_table(&spec, Cursor::new(csv)).expect("table parses");
        assert!(table.has_column("EAL_SCORE"));
        assert_eq!(table.row("06037").expect("row").metrics["EAL_SCORE"], 12.0);
    }

    #[test]
    fn missing_code_column_yields_empty_table() {
        let spec = nri_spec();
        let table =
            read_table(&spec, Cursor::new("FIPS,EAL_SCORE\n06037,10\n")).expect("reader runs");
        assert!(table.is_empty());
    }
}
