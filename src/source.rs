//! Reading the raw service-request log.
//!
//! The source is a delimited text file (optionally gzip-compressed) with one
//! row per ticket. Loading decodes it, checks the header, and projects each
//! row down to the columns the pipeline uses.

use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

use crate::config::{PipelineConfig, SourceEncoding};
use crate::error::{ParseError, PipelineError, Result};

/// Columns present in the source that nothing downstream reads.
pub const DROPPED_COLUMNS: [&str; 6] = [
    "GRUPOSERVICO_CODIGO",
    "SERVICO_CODIGO",
    "LOGRADOURO",
    "NUMERO",
    "latitude",
    "longitude",
];

/// Columns kept after pruning, in [`RawRequest`] field order.
pub const KEPT_COLUMNS: [&str; 7] = [
    "GRUPOSERVICO_DESCRICAO",
    "SERVICO_DESCRICAO",
    "BAIRRO",
    "RPA",
    "DATA_DEMANDA",
    "DATA_ULT_SITUACAO",
    "SITUACAO",
];

/// A source row after column pruning, still as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRequest {
    #[serde(rename = "GRUPOSERVICO_DESCRICAO")]
    pub service_group: String,
    #[serde(rename = "SERVICO_DESCRICAO")]
    pub service_name: String,
    #[serde(rename = "BAIRRO")]
    pub neighborhood: String,
    #[serde(rename = "RPA")]
    pub region_code: String,
    #[serde(rename = "DATA_DEMANDA")]
    pub request_date: String,
    #[serde(rename = "DATA_ULT_SITUACAO")]
    pub last_status_date: String,
    #[serde(rename = "SITUACAO")]
    pub status: String,
    /// 1-based line in the source file, for error reporting.
    #[serde(skip)]
    pub line: u64,
}

/// Reads and parses the file named by `config.source_path`.
pub fn load(config: &PipelineConfig) -> Result<Vec<RawRequest>> {
    let bytes = read_bytes(&config.source_path)?;
    parse(&bytes, config)
}

/// Reads the whole file, gunzipping it when the name ends in `.gz`.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(path = %path.display(), gzipped, "Reading source");

    if gzipped {
        let file = File::open(path).map_err(io_err)?;
        let mut bytes = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| match e.kind() {
                // The decoder rejected the stream itself.
                ErrorKind::InvalidInput | ErrorKind::InvalidData | ErrorKind::UnexpectedEof => {
                    ParseError::Encoding {
                        encoding: "gzip",
                        message: e.to_string(),
                    }
                    .into()
                }
                _ => io_err(e),
            })?;
        Ok(bytes)
    } else {
        std::fs::read(path).map_err(io_err)
    }
}

/// Decodes source bytes into text.
///
/// ISO-8859-1 maps every byte to the code point of the same value, so it
/// cannot fail.
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> Result<String> {
    match encoding {
        SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        SourceEncoding::Utf8 => {
            let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding {
                encoding: encoding.name(),
                message: e.to_string(),
            })?;
            Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
        }
    }
}

/// Parses already-read source bytes into pruned rows.
pub fn parse(bytes: &[u8], config: &PipelineConfig) -> Result<Vec<RawRequest>> {
    let text = decode(bytes, config.encoding)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(malformed)?.clone();
    let projection = Projection::from_headers(&headers)?;
    debug!(
        columns = headers.len(),
        dropped = DROPPED_COLUMNS.len(),
        "Source header validated"
    );

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(malformed)?;
        rows.push(projection.apply(&record)?);
    }

    debug!(rows = rows.len(), "Source rows loaded");
    Ok(rows)
}

/// Index of each kept column within the source header.
struct Projection {
    indices: Vec<usize>,
    headers: StringRecord,
}

impl Projection {
    /// Both the dropped and the kept columns must be present.
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
        };

        for name in DROPPED_COLUMNS {
            position(name)?;
        }

        let indices = KEPT_COLUMNS
            .iter()
            .map(|&name| position(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            indices,
            headers: KEPT_COLUMNS.iter().copied().collect(),
        })
    }

    fn apply(&self, record: &StringRecord) -> Result<RawRequest> {
        let line = record.position().map_or(0, |p| p.line());
        let projected: StringRecord = self
            .indices
            .iter()
            .map(|&i| record.get(i).unwrap_or(""))
            .collect();

        let mut row: RawRequest = projected
            .deserialize(Some(&self.headers))
            .map_err(|e| ParseError::Malformed {
                line,
                message: e.to_string(),
            })?;
        row.line = line;
        Ok(row)
    }
}

fn malformed(err: csv::Error) -> PipelineError {
    ParseError::Malformed {
        line: err.position().map_or(0, |p| p.line()),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::io::Write;

    const HEADER: &str = concat!(
        "GRUPOSERVICO_CODIGO;GRUPOSERVICO_DESCRICAO;SERVICO_CODIGO;SERVICO_DESCRICAO;",
        "LOGRADOURO;NUMERO;BAIRRO;RPA;DATA_DEMANDA;SITUACAO;DATA_ULT_SITUACAO;latitude;longitude"
    );

    const ROW: &str = concat!(
        "10;DRENAGEM;101;LIMPEZA DE CANAL;RUA A;12;IBURA;6;",
        "2024-01-10;ATENDIDA;2024-01-15;-8.1;-34.9"
    );

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_parse_projects_kept_columns() {
        let text = format!("{HEADER}\n{ROW}\n");
        let rows = parse(text.as_bytes(), &PipelineConfig::default()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.service_group, "DRENAGEM");
        assert_eq!(row.service_name, "LIMPEZA DE CANAL");
        assert_eq!(row.neighborhood, "IBURA");
        assert_eq!(row.region_code, "6");
        assert_eq!(row.request_date, "2024-01-10");
        assert_eq!(row.last_status_date, "2024-01-15");
        assert_eq!(row.status, "ATENDIDA");
        assert_eq!(row.line, 2);
    }

    #[test]
    fn test_missing_dropped_column_is_parse_error() {
        let header = HEADER.replace(";latitude;longitude", "");
        let row = ROW.replace(";-8.1;-34.9", "");
        let text = format!("{header}\n{row}\n");
        let err = parse(text.as_bytes(), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::MissingColumn(ref c)) if c == "latitude"
        ));
    }

    #[test]
    fn test_missing_kept_column_is_parse_error() {
        let header = HEADER.replacen(";SITUACAO;", ";ESTADO;", 1);
        let text = format!("{header}\n");
        let err = parse(text.as_bytes(), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::MissingColumn(ref c)) if c == "SITUACAO"
        ));
    }

    #[test]
    fn test_parse_trims_headers_and_fields() {
        let header = HEADER.replace(';', " ; ");
        let row = ROW.replace(';', " ;  ");
        let text = format!(" {header} \n  {row}\t\n");
        let rows = parse(text.as_bytes(), &PipelineConfig::default()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.service_group, "DRENAGEM");
        assert_eq!(row.service_name, "LIMPEZA DE CANAL");
        assert_eq!(row.region_code, "6");
        assert_eq!(row.last_status_date, "2024-01-15");
        assert_eq!(row.status, "ATENDIDA");
    }

    #[test]
    fn test_empty_source_is_missing_column() {
        let err = parse(b"", &PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::MissingColumn(ref c)) if c == "GRUPOSERVICO_CODIGO"
        ));
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        let text = format!("{HEADER}\n10;DRENAGEM;101\n");
        let err = parse(text.as_bytes(), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_wrong_delimiter_is_parse_error() {
        let text = HEADER.replace(';', ",");
        let err = parse(text.as_bytes(), &PipelineConfig::default()).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_decode_latin1() {
        let bytes = b"S\xc3O JOS\xc9";
        assert_eq!(decode(bytes, SourceEncoding::Latin1).unwrap(), "SÃO JOSÉ");
    }

    #[test]
    fn test_decode_utf8_strips_bom_and_rejects_invalid() {
        let bom = "\u{feff}VÁRZEA".as_bytes();
        let text = decode(bom, SourceEncoding::Utf8).unwrap();
        assert_eq!(text, "VÁRZEA");
        let err = decode(b"V\xc1RZEA", SourceEncoding::Utf8).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ParseError::Encoding { .. })));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_bytes(Path::new("/nonexistent/156_2024.csv")).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_read_gzipped_source() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let path = temp_path("emlurb_source_test.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(HEADER.as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let bytes = read_bytes(&path).unwrap();
        assert_eq!(bytes, HEADER.as_bytes());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_gzip_is_parse_error() {
        let path = temp_path("emlurb_corrupt_test.csv.gz");
        fs::write(&path, b"this is not a gzip stream").unwrap();

        let err = read_bytes(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(err.is_parse());
        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::Encoding { encoding: "gzip", .. })
        ));
    }
}
