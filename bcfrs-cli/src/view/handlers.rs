use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::ArgMatches;

use bcfrs_core::models::{Filters, Genotype, InfoValue, Variant};
use bcfrs_reader::reader::BcfReader;

pub fn run_view(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("BCF")
        .expect("BCF path is required");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match matches.get_one::<String>("region") {
        Some(region) => {
            let (contig, start, end) = parse_region(region)?;
            let mut reader = BcfReader::open_path_indexed(path)
                .with_context(|| format!("Failed to open {} with its index", path))?;
            for variant in reader.query(&contig, start, end)? {
                write_variant(&mut out, &variant?)?;
            }
        }
        None => {
            let mut reader =
                BcfReader::open_path(path).with_context(|| format!("Failed to open {}", path))?;
            for variant in reader.records()? {
                write_variant(&mut out, &variant?)?;
            }
        }
    }

    Ok(())
}

/// Parse a `chr:start-end` region string.
fn parse_region(region: &str) -> Result<(String, u32, u32)> {
    let parsed = region.rsplit_once(':').and_then(|(contig, range)| {
        let (start, end) = range.split_once('-')?;
        let start = start.replace(',', "").parse::<u32>().ok()?;
        let end = end.replace(',', "").parse::<u32>().ok()?;
        Some((contig.to_string(), start, end))
    });
    match parsed {
        Some(region) => Ok(region),
        None => bail!("Invalid region (expected chr:start-end): {}", region),
    }
}

fn write_variant(out: &mut impl Write, variant: &Variant) -> Result<()> {
    write!(
        out,
        "{}\t{}\t{}\t{}",
        variant.locus,
        variant.id.as_deref().unwrap_or("."),
        variant.reference_allele().unwrap_or("."),
        if variant.alternate_alleles().is_empty() {
            ".".to_string()
        } else {
            variant.alternate_alleles().join(",")
        },
    )?;

    match variant.qual {
        Some(qual) => write!(out, "\t{}", qual)?,
        None => write!(out, "\t.")?,
    }

    match &variant.filters {
        Filters::Unevaluated => write!(out, "\t.")?,
        Filters::Pass => write!(out, "\tPASS")?,
        Filters::Named(names) => write!(out, "\t{}", names.join(";"))?,
    }

    if variant.info.is_empty() {
        write!(out, "\t.")?;
    } else {
        let info: Vec<String> = variant
            .info
            .iter()
            .map(|(key, value)| match value {
                InfoValue::Flag => key.clone(),
                other => format!("{}={}", key, fmt_info_value(other)),
            })
            .collect();
        write!(out, "\t{}", info.join(";"))?;
    }

    for genotype in &variant.genotypes {
        write!(out, "\t{}", fmt_genotype(genotype))?;
    }

    writeln!(out)?;
    Ok(())
}

fn fmt_info_value(value: &InfoValue) -> String {
    fn join<T: ToString>(items: &[Option<T>]) -> String {
        items
            .iter()
            .map(|v| v.as_ref().map_or(".".to_string(), |v| v.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }

    match value {
        InfoValue::Flag => String::new(),
        InfoValue::Missing => ".".to_string(),
        InfoValue::Int(v) => v.to_string(),
        InfoValue::Float(v) => v.to_string(),
        InfoValue::String(s) => s.clone(),
        InfoValue::Ints(items) => join(items),
        InfoValue::Floats(items) => join(items),
        InfoValue::Strings(items) => items.join(","),
    }
}

fn fmt_genotype(genotype: &Genotype) -> String {
    if genotype.alleles.is_empty() {
        return ".".to_string();
    }
    let sep = if genotype.phased { "|" } else { "/" };
    genotype
        .alleles
        .iter()
        .map(|a| a.as_deref().unwrap_or("."))
        .collect::<Vec<_>>()
        .join(sep)
}
