use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::{BcfError, Result};

/// Declared value type of an INFO or FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

impl FromStr for ValueType {
    type Err = BcfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Integer" => Ok(ValueType::Integer),
            "Float" => Ok(ValueType::Float),
            "Flag" => Ok(ValueType::Flag),
            "Character" => Ok(ValueType::Character),
            "String" => Ok(ValueType::String),
            other => Err(BcfError::HeaderParse(format!("unknown Type: {}", other))),
        }
    }
}

/// Declared arity (`Number=`) of an INFO or FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arity {
    /// A literal element count.
    Count(u32),
    /// `A`: one value per alternate allele.
    PerAltAllele,
    /// `R`: one value per allele, reference included.
    PerAllele,
    /// `G`: one value per possible genotype.
    PerGenotype,
    /// `.`: unknown or unbounded.
    Unbounded,
}

impl FromStr for Arity {
    type Err = BcfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(Arity::PerAltAllele),
            "R" => Ok(Arity::PerAllele),
            "G" => Ok(Arity::PerGenotype),
            "." => Ok(Arity::Unbounded),
            n => n
                .parse::<u32>()
                .map(Arity::Count)
                .map_err(|_| BcfError::HeaderParse(format!("unknown Number: {}", n))),
        }
    }
}

///
/// One entry of the sequence dictionary (`##contig` line).
///
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contig {
    pub id: String,
    pub length: Option<u64>,
}

///
/// Declaration of an INFO or FORMAT field (`##INFO`/`##FORMAT` line).
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDecl {
    pub id: String,
    pub arity: Arity,
    pub ty: ValueType,
    pub description: Option<String>,
}

/// One `##` metadata line, over the closed set of line kinds the codec
/// cares about. Anything that is not a FILTER/INFO/FORMAT/contig line is
/// kept verbatim under `Other`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderLine {
    Filter { id: String, description: Option<String> },
    Info(FieldDecl),
    Format(FieldDecl),
    Contig(Contig),
    Other { key: String, value: String },
}

///
/// Parsed VCF header: metadata lines in declaration order, the sequence
/// dictionary, per-id INFO/FORMAT declarations and the sample names from
/// the `#CHROM` column line.
///
/// The line order matters: the binary records reference FILTER/INFO/FORMAT
/// keys by their position in the combined, first-occurrence-wins walk over
/// these lines.
///
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    lines: Vec<HeaderLine>,
    contigs: Vec<Contig>,
    contig_index: HashMap<String, usize>,
    infos: HashMap<String, FieldDecl>,
    formats: HashMap<String, FieldDecl>,
    samples: Vec<String>,
}

impl Header {
    ///
    /// Parse the text form of a VCF header (the `##`-prefixed metadata
    /// lines plus the final `#CHROM` column line).
    ///
    /// # Arguments
    /// - text: the header text; trailing NUL padding is ignored.
    ///
    pub fn from_vcf_text(text: &str) -> Result<Self> {
        let mut header = Header::default();

        for line in text.trim_end_matches('\0').lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("##") {
                header.push_line(parse_meta_line(rest)?);
            } else if line.starts_with("#CHROM") {
                header.samples = line.split('\t').skip(9).map(str::to_string).collect();
            } else {
                return Err(BcfError::HeaderParse(format!(
                    "unexpected header line: {}",
                    line
                )));
            }
        }

        Ok(header)
    }

    fn push_line(&mut self, line: HeaderLine) {
        match &line {
            HeaderLine::Contig(contig) => {
                if !self.contig_index.contains_key(&contig.id) {
                    self.contig_index
                        .insert(contig.id.clone(), self.contigs.len());
                    self.contigs.push(contig.clone());
                }
            }
            HeaderLine::Info(decl) => {
                self.infos.entry(decl.id.clone()).or_insert_with(|| decl.clone());
            }
            HeaderLine::Format(decl) => {
                self.formats
                    .entry(decl.id.clone())
                    .or_insert_with(|| decl.clone());
            }
            _ => {}
        }
        self.lines.push(line);
    }

    /// All metadata lines, in declaration order.
    pub fn lines(&self) -> &[HeaderLine] {
        &self.lines
    }

    /// The sequence dictionary, in declaration order.
    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    /// Look up a contig by its dictionary index.
    pub fn contig(&self, index: i32) -> Option<&Contig> {
        usize::try_from(index).ok().and_then(|i| self.contigs.get(i))
    }

    /// Dictionary index of a contig name.
    pub fn contig_index(&self, name: &str) -> Option<usize> {
        self.contig_index.get(name).copied()
    }

    /// Declaration of an INFO field, if any.
    pub fn info(&self, id: &str) -> Option<&FieldDecl> {
        self.infos.get(id)
    }

    /// Declaration of a FORMAT field, if any.
    pub fn format(&self, id: &str) -> Option<&FieldDecl> {
        self.formats.get(id)
    }

    /// Sample names from the `#CHROM` line, in column order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// True when the header declares at least one genotyped sample.
    pub fn has_genotyping_data(&self) -> bool {
        !self.samples.is_empty()
    }
}

/// Split on `sep`, ignoring separators inside double quotes. Descriptions
/// in structured lines routinely contain commas and `=`.
fn split_respecting_quotes(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut field_start = 0;
    for (idx, ch) in s.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == sep && !in_quotes {
            parts.push(&s[field_start..idx]);
            field_start = idx + ch.len_utf8();
        }
    }
    parts.push(&s[field_start..]);
    parts
}

fn unquote(s: &str) -> &str {
    s.trim_start_matches('"').trim_end_matches('"')
}

/// Parse one metadata line with the leading `##` already stripped.
fn parse_meta_line(line: &str) -> Result<HeaderLine> {
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| BcfError::HeaderParse(format!("missing '=' in ##{}", line)))?;

    let structured = value.starts_with('<') && value.ends_with('>');
    if !structured {
        return Ok(HeaderLine::Other {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    let body = &value[1..value.len() - 1];
    let mut fields: HashMap<&str, &str> = HashMap::new();
    for item in split_respecting_quotes(body, ',') {
        if let Some((k, v)) = item.trim().split_once('=') {
            fields.insert(k, unquote(v));
        }
    }

    let id = || -> Result<String> {
        fields
            .get("ID")
            .map(|s| s.to_string())
            .ok_or_else(|| BcfError::HeaderParse(format!("##{} line without ID", key)))
    };

    match key {
        "FILTER" => Ok(HeaderLine::Filter {
            id: id()?,
            description: fields.get("Description").map(|s| s.to_string()),
        }),
        "INFO" => Ok(HeaderLine::Info(parse_field_decl(key, id()?, &fields)?)),
        "FORMAT" => Ok(HeaderLine::Format(parse_field_decl(key, id()?, &fields)?)),
        "contig" => Ok(HeaderLine::Contig(Contig {
            id: id()?,
            length: fields.get("length").and_then(|s| s.parse().ok()),
        })),
        other => Ok(HeaderLine::Other {
            key: other.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_field_decl(key: &str, id: String, fields: &HashMap<&str, &str>) -> Result<FieldDecl> {
    let arity = fields
        .get("Number")
        .ok_or_else(|| BcfError::HeaderParse(format!("##{}/{} without Number", key, id)))?
        .parse()?;
    let ty = fields
        .get("Type")
        .ok_or_else(|| BcfError::HeaderParse(format!("##{}/{} without Type", key, id)))?
        .parse()?;
    Ok(FieldDecl {
        id,
        arity,
        ty,
        description: fields.get("Description").map(|s| s.to_string()),
    })
}
