use lexfreq_types::RankedLemma;
use thiserror::Error;

pub const CSV_HEADER: [&str; 3] = ["Rank", "Lemma", "Frequency"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected header {0:?}")]
    Header(Vec<String>),
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
}

/// Frequency table as spreadsheet-friendly CSV: UTF-8 with BOM, CRLF rows.
pub fn write_csv(table: &[RankedLemma]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(UTF8_BOM.to_vec());
    writer.write_record(CSV_HEADER)?;
    for row in table {
        writer.write_record([
            row.rank.to_string(),
            row.lemma.clone(),
            row.frequency.to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

/// Parses output of [`write_csv`]. A leading BOM is optional.
pub fn read_csv(bytes: &[u8]) -> Result<Vec<RankedLemma>, ExportError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body);

    let headers = reader.headers()?;
    if headers.iter().ne(CSV_HEADER) {
        return Err(ExportError::Header(
            headers.iter().map(str::to_string).collect(),
        ));
    }

    let mut table = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let field = |i: usize| {
            record.get(i).ok_or_else(|| ExportError::Row {
                row,
                message: format!("missing column {}", CSV_HEADER[i]),
            })
        };
        let number = |i: usize| {
            field(i)?.parse::<usize>().map_err(|err| ExportError::Row {
                row,
                message: format!("{}: {err}", CSV_HEADER[i]),
            })
        };
        table.push(RankedLemma {
            rank: number(0)?,
            lemma: field(1)?.to_string(),
            frequency: number(2)?,
        });
    }
    Ok(table)
}

/// `text_analysis_<stem>.csv`, restricted to characters safe in a header value.
pub fn export_file_name(source: Option<&str>) -> String {
    let stem: String = source
        .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if stem.is_empty() {
        "text_analysis.csv".to_string()
    } else {
        format!("text_analysis_{stem}.csv")
    }
}
