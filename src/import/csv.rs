// Copyright 2023 Remi Bernotavicius

use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum DecodeError {
    MissingColumn { line: usize },
    EmptyField { line: usize, column: &'static str },
    Csv(::csv::Error),
    Io(io::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { line } => write!(
                f,
                "decode error: line {line}: expected columns name,measurement_unit"
            ),
            Self::EmptyField { line, column } => {
                write!(f, "decode error: line {line}: {column} is empty")
            }
            Self::Csv(e) => write!(f, "decode error: {e}"),
            Self::Io(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<::csv::Error> for DecodeError {
    fn from(e: ::csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRow {
    pub line: usize,
    pub name: String,
    pub measurement_unit: String,
}

fn field(line: usize, column: &'static str, value: Option<&str>) -> Result<String> {
    match value {
        None => Err(DecodeError::MissingColumn { line }),
        Some("") => Err(DecodeError::EmptyField { line, column }),
        Some(value) => Ok(value.to_owned()),
    }
}

/// The first two columns are the name and the unit, anything after them is ignored. A record with
/// nothing but blank fields decodes to `None`.
fn decode_record(record: &::csv::StringRecord) -> Result<Option<IngredientRow>> {
    let line = record.position().map_or(0, |p| p.line() as usize);
    if record.iter().all(str::is_empty) {
        return Ok(None);
    }
    Ok(Some(IngredientRow {
        line,
        name: field(line, "name", record.get(0))?,
        measurement_unit: field(line, "measurement_unit", record.get(1))?,
    }))
}

/// Decodes headerless `name,measurement_unit` records. A malformed record only fails itself.
pub fn decode_ingredients(reader: impl io::Read) -> Vec<Result<IngredientRow>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(reader);
    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => decode_record(&record).transpose(),
            Err(e) => Some(Err(e.into())),
        })
        .collect()
}

/// Failing to open the file is an error for the whole import.
pub fn decode_ingredients_from_path(path: impl AsRef<Path>) -> Result<Vec<Result<IngredientRow>>> {
    let file = std::fs::File::open(path)?;
    Ok(decode_ingredients(io::BufReader::new(file)))
}

#[cfg(test)]
fn decode_str(text: &str) -> Vec<Result<IngredientRow>> {
    decode_ingredients(text.as_bytes())
}

#[cfg(test)]
fn row(line: usize, name: &str, measurement_unit: &str) -> IngredientRow {
    IngredientRow {
        line,
        name: name.into(),
        measurement_unit: measurement_unit.into(),
    }
}

#[test]
fn decode_rows() {
    let rows = decode_str(
        "абрикосовое варенье,г\n\
         \n\
         salt , g \n\
         no unit\n\
         sugar,\n\
         ,g\n\
         flour,g,extra\n",
    );
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].as_ref().unwrap(), &row(1, "абрикосовое варенье", "г"));
    assert_eq!(rows[1].as_ref().unwrap(), &row(3, "salt", "g"));
    assert!(matches!(rows[2], Err(DecodeError::MissingColumn { line: 4 })));
    assert!(matches!(
        rows[3],
        Err(DecodeError::EmptyField {
            line: 5,
            column: "measurement_unit"
        })
    ));
    assert!(matches!(
        rows[4],
        Err(DecodeError::EmptyField { column: "name", .. })
    ));
    assert_eq!(rows[5].as_ref().unwrap(), &row(7, "flour", "g"));
}

#[test]
fn decode_quoted_fields() {
    let rows = decode_str(
        "\"salt, coarse\",g\n\
         \"say \"\"hi\"\"\",g\n\
         salt,\"pinch, small\"\n",
    );
    let rows: Vec<_> = rows.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(
        rows,
        vec![
            row(1, "salt, coarse", "g"),
            row(2, "say \"hi\"", "g"),
            row(3, "salt", "pinch, small"),
        ]
    );
}

#[test]
fn whitespace_only_lines_are_ignored() {
    let rows = decode_str("eggs,pcs\n   \n\t\nmilk,ml\n");
    let names: Vec<_> = rows.into_iter().map(|r| r.unwrap().name).collect();
    assert_eq!(names, vec!["eggs", "milk"]);
}

#[test]
fn missing_file() {
    let result = decode_ingredients_from_path("/nonexistent/foodgram/ingredients.csv");
    assert!(matches!(result, Err(DecodeError::Io(_))));
}
