// Copyright 2023 Remi Bernotavicius

use crate::catalog;
use crate::database;
use crate::error::{AppError, AppResult};
use crate::Result;
use self::csv::{DecodeError, IngredientRow};
use diesel::prelude::Connection as _;
use std::path::Path;

mod csv;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub loaded: usize,
    pub already_present: usize,
    pub skipped: usize,
}

enum Outcome {
    Loaded,
    AlreadyPresent,
    Skipped,
}

fn import_row(conn: &mut database::Connection, row: IngredientRow) -> AppResult<Outcome> {
    if let Some(existing) = catalog::find_ingredient_by_name(conn, &row.name)? {
        if existing.measurement_unit != row.measurement_unit {
            log::warn!(
                "line {}: {:?} already exists measured in {:?}, not {:?}",
                row.line,
                row.name,
                existing.measurement_unit,
                row.measurement_unit
            );
        }
        return Ok(Outcome::AlreadyPresent);
    }
    match catalog::create_ingredient(conn, &row.name, &row.measurement_unit) {
        Ok(_) => Ok(Outcome::Loaded),
        Err(AppError::Validation(e)) => {
            log::warn!("line {}: skipping {:?}: {e}", row.line, row.name);
            Ok(Outcome::Skipped)
        }
        Err(e) => Err(e),
    }
}

pub struct IngredientImporter {
    rows: Vec<std::result::Result<IngredientRow, DecodeError>>,
    total_rows: usize,
    summary: ImportSummary,
}

impl IngredientImporter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let rows = csv::decode_ingredients_from_path(path)?;
        let total_rows = rows.len();
        Ok(Self {
            rows,
            total_rows,
            summary: ImportSummary::default(),
        })
    }

    pub fn done(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> ImportSummary {
        self.summary
    }

    pub fn percent_done(&self) -> f32 {
        if self.total_rows == 0 {
            return 1.0;
        }
        (self.total_rows - self.rows.len()) as f32 / self.total_rows as f32
    }

    /// Imports the next batch of rows in one transaction.
    pub fn import_one(&mut self, conn: &mut database::Connection) -> AppResult<()> {
        const BATCH_SIZE: usize = 100;
        let batch: Vec<_> = self
            .rows
            .drain(..BATCH_SIZE.min(self.rows.len()))
            .collect();

        let summary = conn.transaction::<_, AppError, _>(|conn| {
            let mut summary = self.summary;
            for row in batch {
                let row = match row {
                    Ok(row) => row,
                    Err(e) => {
                        log::warn!("skipping row: {e}");
                        summary.skipped += 1;
                        continue;
                    }
                };
                match import_row(conn, row)? {
                    Outcome::Loaded => summary.loaded += 1,
                    Outcome::AlreadyPresent => summary.already_present += 1,
                    Outcome::Skipped => summary.skipped += 1,
                }
            }
            Ok(summary)
        })?;
        self.summary = summary;
        Ok(())
    }
}

pub fn load_ingredients(
    conn: &mut database::Connection,
    path: impl AsRef<Path>,
) -> Result<ImportSummary> {
    let mut importer = IngredientImporter::new(path)?;

    while !importer.done() {
        importer.import_one(conn)?;
        log::debug!("imported {:.0}%", importer.percent_done() * 100.0);
    }

    let summary = importer.summary();
    log::info!(
        "loaded {} ingredients ({} already present, {} skipped)",
        summary.loaded,
        summary.already_present,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
fn write_csv(test_name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "foodgram-{}-{test_name}.csv",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn load_ingredients_skips_bad_rows() {
    let mut conn = database::test_connection();
    catalog::create_ingredient(&mut conn, "salt", "g").unwrap();

    let path = write_csv(
        "skips_bad_rows",
        "sugar,g\n\
         \n\
         salt,pinch\n\
         no unit\n\
         milk,\n\
         eggs,pcs\n\
         sugar,g\n",
    );
    let summary = load_ingredients(&mut conn, &path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            loaded: 2,
            already_present: 2,
            skipped: 2,
        }
    );

    let names: Vec<_> = catalog::search_ingredients(&mut conn, None)
        .unwrap()
        .into_iter()
        .map(|i| (i.name, i.measurement_unit))
        .collect();
    assert_eq!(
        names,
        vec![
            ("eggs".to_string(), "pcs".to_string()),
            ("salt".to_string(), "g".to_string()),
            ("sugar".to_string(), "g".to_string()),
        ]
    );
}

#[test]
fn importer_batches() {
    let mut conn = database::test_connection();
    let contents: String = (0..250).map(|i| format!("item {i},g\n")).collect();
    let path = write_csv("batches", &contents);

    let mut importer = IngredientImporter::new(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    importer.import_one(&mut conn).unwrap();
    assert_eq!(importer.summary().loaded, 100);
    assert!((importer.percent_done() - 0.4).abs() < f32::EPSILON);

    while !importer.done() {
        importer.import_one(&mut conn).unwrap();
    }
    assert_eq!(importer.summary().loaded, 250);
    assert_eq!(importer.percent_done(), 1.0);
}
