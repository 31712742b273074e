use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::ArgMatches;

use bcfrs_reader::reader::BcfReader;

pub fn run_loc(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("BCF")
        .expect("BCF path is required");

    let mut reader =
        BcfReader::open_path(path).with_context(|| format!("Failed to open {}", path))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    while let Some(locus) = reader.decode_loc()? {
        writeln!(out, "{}\t{}\t{}", locus.contig, locus.start, locus.end)?;
    }

    Ok(())
}
