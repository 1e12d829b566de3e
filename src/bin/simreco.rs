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

use std::env;
use std::error::Error;

use fnv::FnvHashMap;
use getopts::{Matches, Options};
use log::info;

use simreco::io::{self, CsvInteractions};
use simreco::{LoadSource, ModelConfig, ScoreReduction};

fn main() {

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input consists of interactions \
        between users and items. The input file must contain a user, an item and optionally a \
        quantity per line, separated by tabs.", "PATH");
    opts.optopt("d", "delimiter", "Field separator of the input file (optional, defaults to a \
        tab).", "CHAR");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
    opts.optopt("t", "target", "Known interactions to recommend for, as a comma separated list \
        of items with optional quantities, e.g. 'apple:2,dog'.", "ITEMS");
    opts.optflag("a", "all-users", "Recommend for every user of the input from their own \
        history.");
    opts.optopt("n", "num-recommendations", "Number of items to recommend (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("c", "config", "JSON file with the model configuration (optional).", "PATH");
    opts.optflag("", "cosine", "Normalise co-occurrences to cosine similarities.");
    opts.optflag("", "percentage", "Normalise co-occurrences to row percentages.");
    opts.optflag("", "zero-diagonal", "Ignore self co-occurrences.");
    opts.optflag("", "first-column", "Score items by their first pseudo-unique column only.");
    opts.optflag("", "strict", "Fail on target items which do not occur in the input.");
    opts.optflag("", "dump", "Print a JSON snapshot of the model instead of recommendations.");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    if !matches.opt_present("i") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        );
    }

    if !matches.opt_present("t") && !matches.opt_present("a") && !matches.opt_present("dump") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a target via --target, or use --all-users or --dump."),
        );
    }

    let n: usize = match matches.opt_get_default("n", 10) {
        Ok(n) => n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if let Err(failure) = run(&matches, n) {
        eprintln!("\n{}\n", failure);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));

    if hint.is_some() {
        std::process::exit(1);
    }
}

fn model_config(matches: &Matches) -> Result<ModelConfig, Box<dyn Error>> {

    let mut config = match matches.opt_str("c") {
        Some(path) => io::read_config(&path)?,
        None => ModelConfig::default(),
    };

    if matches.opt_present("cosine") {
        config.options.cosine_similarity = true;
    }

    if matches.opt_present("percentage") {
        config.options.row_percentage = true;
    }

    if matches.opt_present("zero-diagonal") {
        config.options.zero_diagonal = true;
    }

    if matches.opt_present("first-column") {
        config.reduction = ScoreReduction::First;
    }

    Ok(config)
}

fn delimiter(matches: &Matches) -> Result<u8, Box<dyn Error>> {
    match matches.opt_str("d") {
        None => Ok(b'\t'),
        Some(ref value) if value == "\\t" => Ok(b'\t'),
        Some(value) => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("Delimiter must be a single ASCII character, got '{}'", value).into()),
        },
    }
}

/// Parses `item[:quantity]` pairs, a missing quantity counts as 1.
fn parse_target(target: &str) -> Result<FnvHashMap<String, u32>, Box<dyn Error>> {

    let mut quantities = FnvHashMap::default();

    for entry in target.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let mut parts = entry.rsplitn(2, ':');

        let (item, quantity) = match (parts.next(), parts.next()) {
            (Some(quantity), Some(item)) => (item, quantity.parse::<u32>()?),
            (Some(item), None) => (item, 1),
            _ => continue,
        };

        *quantities.entry(item.to_string()).or_insert(0) += quantity;
    }

    Ok(quantities)
}

fn run(matches: &Matches, n: usize) -> Result<(), Box<dyn Error>> {

    let interactions_path = matches.opt_str("i").unwrap_or_default();
    let output_path = matches.opt_str("o");
    let strict = matches.opt_present("strict");

    let config = model_config(matches)?;
    let delimiter = delimiter(matches)?;

    let source = LoadSource::from_interactions(
        CsvInteractions::new(interactions_path).with_delimiter(delimiter)
    );
    let model = simreco::load(source, config)?;

    if matches.opt_present("dump") {
        println!("{}", model.dump().to_json()?);
        return Ok(());
    }

    let recommendations = if matches.opt_present("a") {

        let (users, histories): (Vec<String>, Vec<FnvHashMap<String, u32>>) =
            model.user_histories().into_iter().unzip();

        info!("Computing {} recommendations for {} users", n, users.len());

        let recommended = model.recommend_batch(&histories, n, strict, num_cpus::get())?;

        users.into_iter().zip(recommended.into_iter()).collect()
    } else {

        let target = parse_target(&matches.opt_str("t").unwrap_or_default())?;

        info!("Computing {} recommendations for a target with {} items", n, target.len());

        let recommended = model.recommend(
            target.iter().map(|(item, quantity)| (item, *quantity)),
            n,
            strict,
        )?;

        vec![(String::from("target"), recommended)]
    };

    io::write_recommendations(&recommendations, output_path)?;

    Ok(())
}
