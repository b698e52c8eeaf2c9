//! The `export` command: pivot the store into one row per station and date.

use clap::{Args, ValueEnum};
use log::info;
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use wxh_db::{Database, ScanFilter, WideRow};
use wxh_utils::dates::parse_date;
use wxh_wunderground::station::Station;

use crate::{error::ConfigError, DEFAULT_STORE};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Delimited text with a header row
    #[default]
    Csv,
    /// A JSON array of objects, absent values as null
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// SQLite store to read
    #[arg(short = 'd', long = "store", alias = "database", default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// Only export this station (repeatable)
    #[arg(short, long = "station")]
    pub stations: Vec<String>,

    /// First date to export, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<String>,

    /// Last date to export, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<String>,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Field delimiter for CSV output
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
}

impl ExportArgs {
    /// Validate the filter flags into a [`ScanFilter`].
    pub fn scan_filter(&self) -> Result<ScanFilter, ConfigError> {
        let stations = self
            .stations
            .iter()
            .map(|code| Station::normalize_code(code))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScanFilter {
            stations,
            from: self.from.as_deref().map(parse_filter_date).transpose()?,
            to: self.to.as_deref().map(parse_filter_date).transpose()?,
        })
    }

    fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ConfigError::InvalidDelimiter(self.delimiter))
        }
    }
}

fn parse_filter_date(value: &str) -> Result<chrono::NaiveDate, ConfigError> {
    parse_date(value).map_err(|_| ConfigError::InvalidDate(value.to_string()))
}

/// Write `rows` as delimited text under a `columns` header. Absent values
/// are empty cells.
pub fn write_csv<W: Write>(
    writer: W,
    columns: &[&str],
    rows: &[WideRow],
    delimiter: u8,
) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    wtr.write_record(columns)?;
    for row in rows {
        let mut record = vec![row.station.clone(), row.date.clone()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `rows` as a JSON array of objects keyed by `columns`.
pub fn write_json<W: Write>(
    mut writer: W,
    columns: &[&str],
    rows: &[WideRow],
) -> anyhow::Result<()> {
    let objects: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut object = Map::new();
            object.insert(columns[0].to_string(), Value::from(row.station.clone()));
            object.insert(columns[1].to_string(), Value::from(row.date.clone()));
            for (column, value) in columns[2..].iter().zip(&row.values) {
                object.insert(column.to_string(), value.map_or(Value::Null, Value::from));
            }
            Value::Object(object)
        })
        .collect();
    serde_json::to_writer_pretty(&mut writer, &objects)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Entry point of `wxh export`.
pub async fn run_export(args: ExportArgs) -> anyhow::Result<()> {
    let filter = args.scan_filter()?;
    let delimiter = args.delimiter_byte()?;

    let db = Database::open_read_only(&args.store)?;
    let columns = db.export_columns();
    let rows = db.export_rows(&filter)?;

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match args.format {
        ExportFormat::Csv => write_csv(writer, &columns, &rows, delimiter)?,
        ExportFormat::Json => write_json(writer, &columns, &rows)?,
    }

    if let Some(path) = &args.output {
        info!("Exported {} rows to {}", rows.len(), path.display());
    }
    Ok(())
}
