use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, warn};

use super::{Feature, FragmentVector, IngestError, IonMode, Spectrum};

const INDEX: &str = "index";
const PRECURSOR_MZ: &str = "precursor_mz";
const ION_MODE: &str = "ion_mode";
const ADDUCT: &str = "adduct";
const MS2: &str = "ms2";
const FRAGMENT_PREFIX: &str = "mz_";

/// Result of reading a feature table: the valid features plus one
/// [`IngestError`] per rejected row.
#[derive(Debug, Default)]
pub struct FeatureTable {
    /// Rows that passed the ingestion contract, in file order
    pub features: Vec<Feature>,
    /// Row-level ingestion errors
    pub errors: Vec<IngestError>,
}

struct Columns {
    index: usize,
    precursor_mz: usize,
    ion_mode: usize,
    adduct: usize,
    ms2: Option<usize>,
    fragments: Vec<(usize, u32)>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require =
            |name: &str| find(name).ok_or_else(|| IngestError::MissingColumn(name.to_string()));

        // A leading unnamed column is the pandas-style row index
        let index = match find(INDEX) {
            Some(i) => i,
            None if headers.first().map_or(false, |h| h.is_empty()) => 0,
            None => return Err(IngestError::MissingColumn(INDEX.to_string())),
        };

        let fragments = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                let key = h.strip_prefix(FRAGMENT_PREFIX)?;
                let nominal = key.parse::<f64>().ok()?;
                Some((i, nominal.round().max(0.0) as u32))
            })
            .collect();

        Ok(Self {
            index,
            precursor_mz: require(PRECURSOR_MZ)?,
            ion_mode: require(ION_MODE)?,
            adduct: require(ADDUCT)?,
            ms2: find(MS2),
            fragments,
        })
    }
}

impl FeatureTable {
    /// Read a feature table; `.tsv`/`.txt` files are tab-delimited, anything
    /// else comma-delimited.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") | Some("txt") => b'\t',
            _ => b',',
        };
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), delimiter)
    }

    /// Read a feature table from any reader.
    ///
    /// Header or I/O problems are fatal; per-row problems are collected in
    /// [`FeatureTable::errors`].
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        let columns = Columns::from_headers(&headers)?;
        debug!(
            "Feature table: {} columns, {} fragment columns",
            headers.len(),
            columns.fragments.len()
        );

        let mut table = FeatureTable::default();
        let mut seen = HashSet::new();

        for (row, record) in csv_reader.byte_records().enumerate() {
            let record = record?;
            let fields: Vec<Option<&str>> = record
                .iter()
                .map(|bytes| std::str::from_utf8(bytes).ok().map(str::trim))
                .collect();
            let field = |i: usize| fields.get(i).copied().flatten().unwrap_or("");

            let raw_index = String::from_utf8_lossy(record.get(columns.index).unwrap_or(b""));
            let index = match raw_index.trim() {
                "" => row.to_string(),
                value => value.to_string(),
            };

            // Undecodable bytes reject the row, not the table
            if let Some(column) = fields.iter().position(Option::is_none) {
                let error = if Some(column) == columns.ms2 {
                    IngestError::SpectrumParse {
                        index,
                        message: "MS2 field is not valid UTF-8".to_string(),
                    }
                } else {
                    let name = headers.get(column).map_or("", String::as_str);
                    IngestError::invalid_field(&index, name, "not valid UTF-8")
                };
                warn!("Rejected feature row: {error}");
                table.errors.push(error);
                continue;
            }

            match parse_row(&index, &columns, &field) {
                Ok(feature) => {
                    if !seen.insert(feature.id.clone()) {
                        table.errors.push(IngestError::DuplicateIndex(feature.id));
                        continue;
                    }
                    table.features.push(feature);
                }
                Err(error) => {
                    warn!("Rejected feature row: {error}");
                    table.errors.push(error);
                }
            }
        }

        Ok(table)
    }
}

fn parse_row<'a>(
    index: &str,
    columns: &Columns,
    field: &impl Fn(usize) -> &'a str,
) -> Result<Feature, IngestError> {
    let precursor_mz: f64 = field(columns.precursor_mz).parse().map_err(|_| {
        IngestError::invalid_field(
            index,
            PRECURSOR_MZ,
            format!("not a number: '{}'", field(columns.precursor_mz)),
        )
    })?;

    let ion_mode: IonMode = field(columns.ion_mode)
        .parse()
        .map_err(|e: String| IngestError::invalid_field(index, ION_MODE, e))?;

    let spectrum = match columns.ms2 {
        Some(i) => Spectrum::parse(field(i)).map_err(|e| IngestError::SpectrumParse {
            index: index.to_string(),
            message: e.to_string(),
        })?,
        None => Spectrum::empty(),
    };

    let mut fragments = FragmentVector::new();
    for &(i, nominal) in &columns.fragments {
        let present = match field(i) {
            "" | "0" | "0.0" | "false" | "False" => false,
            "1" | "1.0" | "true" | "True" => true,
            other => {
                return Err(IngestError::invalid_field(
                    index,
                    &format!("{FRAGMENT_PREFIX}{nominal}"),
                    format!("fragment flags must be 0 or 1, got '{other}'"),
                ))
            }
        };
        fragments.set(nominal, present);
    }

    let feature = Feature {
        id: index.to_string(),
        precursor_mz,
        ion_mode,
        adduct: field(columns.adduct).to_string(),
        spectrum,
        fragments,
    };
    feature.validate_contract()?;
    Ok(feature)
}
