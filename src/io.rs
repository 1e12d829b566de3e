/**
 * SimReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::fs::File;
use std::io::{self, stdout, BufReader, Read, Write};
use std::path::Path;

use log::info;
use serde_derive::Serialize;

use crate::error::{RecoError, Result};
use crate::model::{ModelConfig, Recommendation};
use crate::source::InteractionSource;
use crate::types::Interaction;

/// Interactions stored in a CSV file. We expect NO headers, and a user, an item and an optional
/// quantity per line, separated by tabs by default. A missing quantity counts as a single
/// interaction.
pub struct CsvInteractions {
    path: String,
    delimiter: u8,
}

impl CsvInteractions {

    pub fn new<P: Into<String>>(path: P) -> Self {
        CsvInteractions { path: path.into(), delimiter: b'\t' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl InteractionSource for CsvInteractions {

    fn fetch_all(&mut self) -> Result<Vec<Interaction>> {
        info!("Reading interactions from {}", self.path);
        let file = File::open(&self.path)?;
        interactions_from_csv(file, self.delimiter)
    }
}

/// Parses interaction records from any reader.
pub fn interactions_from_csv<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Interaction>> {

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut interactions = Vec::new();

    for (line, result) in csv_reader.records().enumerate() {
        let record = result?;
        let line = line as u64 + 1;

        if record.len() < 2 || record.len() > 3 {
            return Err(RecoError::MalformedRecord {
                line,
                reason: format!("expected 2 or 3 fields, found {}", record.len()),
            });
        }

        let quantity = match record.get(2) {
            Some(field) => field.trim().parse::<u32>().map_err(|failure| {
                RecoError::MalformedRecord {
                    line,
                    reason: format!("invalid quantity '{}': {}", field, failure),
                }
            })?,
            None => 1,
        };

        interactions.push(Interaction::new(&record[0], &record[1], quantity));
    }

    Ok(interactions)
}

/// Reads a JSON model configuration, absent fields take their default values.
pub fn read_config(path: &str) -> Result<ModelConfig> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Struct used for JSON serialization of recommendations. Field names will be used in JSON.
#[derive(Serialize)]
struct Recommendations<'a> {
    for_user: &'a str,
    recommended_items: &'a [Recommendation],
}

/// Output recommendations in JSON format, one line per user. If an `output_path` is supplied,
/// we write to a file at the specified path, otherwise, we output to stdout.
pub fn write_recommendations(
    recommendations: &[(String, Vec<Recommendation>)],
    output_path: Option<String>,
) -> io::Result<()> {

    let mut out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout())
    };

    for (user, recommended_items) in recommendations.iter() {

        let as_json = serde_json::to_string(&Recommendations {
            for_user: user,
            recommended_items,
        })?;

        writeln!(out, "{}", as_json)?;
    }

    Ok(())
}
