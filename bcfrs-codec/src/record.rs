//! Per-record decoding. A record on the wire is two little-endian u32
//! lengths followed by two length-prefixed blocks: the site block (locus,
//! quality, alleles, filters, INFO) and the per-sample block (FORMAT
//! fields). Both blocks are buffered whole and parsed from scratch space
//! that is reused across calls.

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};

use bcfrs_core::models::{
    FieldDecl, Filters, Genotype, GenotypeFilter, GenotypeValue, Header, InfoValue, Locus,
    ValueType, Variant,
};
use bcfrs_core::{BcfError, Result};

use crate::consts::{
    ALLELE_DEPTHS_KEY, DEPTH_KEY, GENOTYPE_FILTER_KEY, GENOTYPE_KEY, GENOTYPE_QUALITY_KEY,
    LIKELIHOODS_KEY, UNFILTERED,
};
use crate::dictionary::Dictionary;
use crate::stream::BcfStream;
use crate::typed::{self, Atom, Kind, TypedValue, Value, truncated, FLOAT_MISSING_BITS};

/// Reusable per-sample accumulator. One builder per header sample lives for
/// the whole life of the decoder; only the sample name survives the
/// per-record reset.
#[derive(Debug)]
struct GenotypeBuilder {
    sample: String,
    alleles: Vec<Option<String>>,
    phased: bool,
    depth: Option<i32>,
    quality: Option<i32>,
    allele_depths: Option<Vec<Option<i32>>>,
    likelihoods: Option<Vec<Option<i32>>>,
    filter: GenotypeFilter,
    attributes: Vec<(String, GenotypeValue)>,
}

impl GenotypeBuilder {
    fn new(sample: String) -> Self {
        GenotypeBuilder {
            sample,
            alleles: Vec::new(),
            phased: false,
            depth: None,
            quality: None,
            allele_depths: None,
            likelihoods: None,
            filter: GenotypeFilter::Unfiltered,
            attributes: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.alleles.clear();
        self.phased = false;
        self.depth = None;
        self.quality = None;
        self.allele_depths = None;
        self.likelihoods = None;
        self.filter = GenotypeFilter::Unfiltered;
        self.attributes.clear();
    }

    fn build(&self) -> Genotype {
        Genotype {
            sample: self.sample.clone(),
            alleles: self.alleles.clone(),
            phased: self.phased,
            depth: self.depth,
            quality: self.quality,
            allele_depths: self.allele_depths.clone(),
            likelihoods: self.likelihoods.clone(),
            filter: self.filter.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

///
/// Decodes one variant record per call from a byte stream positioned at a
/// record boundary.
///
/// The decoder owns a scratch buffer and the pooled genotype builders;
/// both are overwritten by the next call, but the returned [`Variant`] is
/// independent of them.
///
#[derive(Debug)]
pub struct RecordDecoder {
    header: Arc<Header>,
    dictionary: Dictionary,
    builders: Vec<GenotypeBuilder>,
    scratch: Vec<u8>,
    first_record_offset: Option<u64>,
}

impl RecordDecoder {
    /// Build a decoder for a parsed header. Fails when the header is
    /// unusable for BCF (no contig dictionary).
    pub fn new(header: Arc<Header>, first_record_offset: Option<u64>) -> Result<Self> {
        let dictionary = Dictionary::from_header(&header)?;
        let builders = header
            .samples()
            .iter()
            .map(|s| GenotypeBuilder::new(s.clone()))
            .collect();
        Ok(RecordDecoder {
            header,
            dictionary,
            builders,
            scratch: Vec::new(),
            first_record_offset,
        })
    }

    /// Virtual offset of the first record, when the stream supports random
    /// access.
    pub fn first_record_offset(&self) -> Option<u64> {
        self.first_record_offset
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Decode the next record, or `None` on a clean end of stream. EOF
    /// anywhere but before the first length word is a truncation error.
    pub fn decode<S: BcfStream>(&mut self, stream: &mut S) -> Result<Option<Variant>> {
        let Some((info_len, format_len)) = read_block_lengths(stream)? else {
            return Ok(None);
        };

        self.fill_scratch(stream, info_len, "info block")?;
        let (mut variant, n_fmt) = {
            let mut cursor = Cursor::new(&self.scratch[..info_len]);
            decode_site(&mut cursor, &self.header, &self.dictionary)?
        };

        for builder in &mut self.builders {
            builder.reset();
        }

        self.fill_scratch(stream, format_len, "format block")?;
        {
            let Self {
                header,
                dictionary,
                builders,
                scratch,
                ..
            } = self;
            let mut cursor = Cursor::new(&scratch[..format_len]);
            decode_format_block(
                &mut cursor,
                header,
                dictionary,
                builders,
                &variant.alleles,
                n_fmt,
            )?;
        }

        if self.header.has_genotyping_data() {
            variant.genotypes = self.builders.iter().map(GenotypeBuilder::build).collect();
        }

        Ok(Some(variant))
    }

    /// Decode only the locus of the next record, skipping the rest of the
    /// site block and the whole per-sample block unparsed.
    pub fn decode_loc<S: BcfStream>(&mut self, stream: &mut S) -> Result<Option<Locus>> {
        let Some((info_len, format_len)) = read_block_lengths(stream)? else {
            return Ok(None);
        };

        self.fill_scratch(stream, info_len, "info block")?;
        let locus = {
            let mut cursor = Cursor::new(&self.scratch[..info_len]);
            decode_locus(&mut cursor, &self.header)?
        };

        skip_bytes(stream, format_len as u64)?;
        Ok(Some(locus))
    }

    fn fill_scratch<S: BcfStream>(
        &mut self,
        stream: &mut S,
        len: usize,
        what: &'static str,
    ) -> Result<()> {
        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
        stream
            .read_exact(&mut self.scratch[..len])
            .map_err(|e| truncated(e, what))
    }
}

/// Read the two block lengths heading a record. Zero bytes available is
/// the one sanctioned end of stream; a partial read is truncation.
fn read_block_lengths<S: BcfStream>(stream: &mut S) -> Result<Option<(usize, usize)>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BcfError::Io(e)),
        }
    }
    match filled {
        0 => return Ok(None),
        4 => {}
        _ => return Err(BcfError::Truncated("record length")),
    }

    let info_len = u32::from_le_bytes(buf) as usize;
    let format_len = stream
        .read_u32::<LittleEndian>()
        .map_err(|e| truncated(e, "record length"))? as usize;
    Ok(Some((info_len, format_len)))
}

fn skip_bytes<S: BcfStream>(stream: &mut S, len: u64) -> Result<()> {
    let mut limited = (&mut *stream).take(len);
    let copied = io::copy(&mut limited, &mut io::sink())?;
    if copied < len {
        return Err(BcfError::Truncated("format block"));
    }
    Ok(())
}

fn decode_locus(cursor: &mut Cursor<&[u8]>, header: &Header) -> Result<Locus> {
    let tid = cursor
        .read_i32::<LittleEndian>()
        .map_err(|e| truncated(e, "contig index"))?;
    let contig = header.contig(tid).ok_or(BcfError::UnknownContig(tid))?;
    let pos0 = cursor
        .read_i32::<LittleEndian>()
        .map_err(|e| truncated(e, "position"))? as i64;
    let rlen = cursor
        .read_i32::<LittleEndian>()
        .map_err(|e| truncated(e, "reference length"))? as i64;
    Ok(Locus {
        contig: contig.id.clone(),
        start: (pos0 + 1) as u32,
        end: (pos0 + rlen) as u32,
    })
}

fn decode_site(
    cursor: &mut Cursor<&[u8]>,
    header: &Header,
    dictionary: &Dictionary,
) -> Result<(Variant, u8)> {
    let locus = decode_locus(cursor, header)?;

    let qual_bits = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| truncated(e, "quality"))?;
    let qual = f32::from_bits(qual_bits);
    let qual = if qual_bits == FLOAT_MISSING_BITS || qual.is_nan() {
        None
    } else {
        Some(qual)
    };

    let n_info = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| truncated(e, "info count"))?;
    let n_allele = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| truncated(e, "allele count"))?;

    // legacy 3-byte sample count; the header is authoritative
    let mut reserved = [0u8; 3];
    cursor
        .read_exact(&mut reserved)
        .map_err(|e| truncated(e, "sample count"))?;

    let n_fmt = cursor.read_u8().map_err(|e| truncated(e, "format count"))?;

    let id = typed::read_string(cursor)?;
    let id = (!id.is_empty()).then_some(id);

    let mut alleles = Vec::with_capacity(n_allele as usize);
    for _ in 0..n_allele {
        alleles.push(typed::read_string(cursor)?);
    }

    let filter_ids = typed::read_int_array(cursor)?;
    let filters = if filter_ids.is_empty() {
        Filters::Unevaluated
    } else if filter_ids.len() == 1 && filter_ids[0] == 0 {
        // PASS is always slot 0
        Filters::Pass
    } else {
        let names = filter_ids
            .iter()
            .map(|&ix| dictionary.word(ix).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        Filters::Named(names)
    };

    let mut info = Vec::with_capacity(n_info as usize);
    for _ in 0..n_info {
        let tag_index = typed::read_scalar_int(cursor)?;
        let tag = dictionary.word(tag_index)?;
        let decl = header
            .info(tag)
            .ok_or_else(|| BcfError::UndeclaredInfoTag(tag.to_string()))?;
        let tv = typed::read_value(cursor)?;
        info.push((tag.to_string(), coerce_info_value(tv, decl.ty)));
    }

    let variant = Variant {
        locus,
        id,
        alleles,
        qual,
        filters,
        info,
        genotypes: Vec::new(),
    };
    Ok((variant, n_fmt))
}

/// Apply the header-declared INFO type to a decoded value: a CHAR string
/// under a String declaration splits on commas (one part collapses back to
/// a scalar), a one-element numeric vector collapses to its element, and
/// an absent value marks a FLAG-style key as present.
fn coerce_info_value(tv: TypedValue, declared: ValueType) -> InfoValue {
    match tv.value {
        Value::Absent => InfoValue::Flag,
        Value::String(s) => {
            if declared == ValueType::String && s.contains(',') {
                InfoValue::Strings(s.split(',').map(str::to_string).collect())
            } else {
                InfoValue::String(s)
            }
        }
        Value::Int(v) => InfoValue::Int(v),
        Value::Float(v) => InfoValue::Float(v),
        Value::Ints(items) => match items.as_slice() {
            [Some(v)] => InfoValue::Int(*v),
            [None] => InfoValue::Missing,
            _ => InfoValue::Ints(items),
        },
        Value::Floats(items) => match items.as_slice() {
            [Some(v)] => InfoValue::Float(*v),
            [None] => InfoValue::Missing,
            _ => InfoValue::Floats(items),
        },
    }
}

/// One accumulated per-sample value before key-specific finalization.
#[derive(Debug, Clone, PartialEq)]
enum SampleValue {
    Int(i32),
    Float(f32),
    Str(String),
}

fn decode_format_block(
    cursor: &mut Cursor<&[u8]>,
    header: &Header,
    dictionary: &Dictionary,
    builders: &mut [GenotypeBuilder],
    alleles: &[String],
    n_fmt: u8,
) -> Result<()> {
    for _ in 0..n_fmt {
        let tag_index = typed::read_scalar_int(cursor)?;
        let tag = dictionary.word(tag_index)?.to_string();
        let decl = header
            .format(&tag)
            .ok_or_else(|| BcfError::UndeclaredFormatTag(tag.clone()))?;

        let descriptor = cursor
            .read_u8()
            .map_err(|e| truncated(e, "format descriptor"))?;
        let kind = Kind::from_descriptor(descriptor)?;
        let n_element = typed::decode_count(cursor, descriptor)?;

        for builder in builders.iter_mut() {
            decode_sample_field(cursor, &tag, decl, kind, n_element, alleles, builder)?;
        }
    }
    Ok(())
}

fn decode_sample_field(
    cursor: &mut Cursor<&[u8]>,
    tag: &str,
    decl: &FieldDecl,
    kind: Kind,
    n_element: usize,
    alleles: &[String],
    builder: &mut GenotypeBuilder,
) -> Result<()> {
    if kind == Kind::Char {
        // the whole per-sample value is one fixed-length string
        let s = typed::read_fixed_string(cursor, n_element)?;
        let values = if s.is_empty() {
            Vec::new()
        } else {
            vec![Some(SampleValue::Str(s))]
        };
        return finalize_sample_field(tag, decl, values, builder);
    }

    let is_gt = tag == GENOTYPE_KEY;
    let mut gt_alleles: Vec<Option<String>> = Vec::new();
    let mut phased = false;
    let mut values: Vec<Option<SampleValue>> = Vec::new();
    let mut ended = false;

    for _ in 0..n_element {
        // all n_element atoms are physically present per sample; keep
        // consuming padding once the terminator is seen
        let atom = typed::read_atom(cursor, kind)?;
        if ended {
            continue;
        }
        match atom {
            Atom::EndOfVector => ended = true,
            Atom::Missing if is_gt => {
                // a missing token shifts to a negative allele index
                gt_alleles.push(None);
                phased = false;
            }
            Atom::Missing if tag == GENOTYPE_FILTER_KEY => {
                values.push(Some(SampleValue::Str(UNFILTERED.to_string())));
            }
            Atom::Missing => values.push(None),
            Atom::Int(v) if is_gt => {
                phased = (v & 1) == 1;
                let allele_index = (v >> 1) - 1;
                if allele_index < 0 {
                    gt_alleles.push(None);
                } else {
                    let allele = alleles.get(allele_index as usize).ok_or_else(|| {
                        BcfError::MalformedGenotypeField(format!(
                            "GT allele index {} out of range",
                            allele_index
                        ))
                    })?;
                    gt_alleles.push(Some(allele.clone()));
                }
            }
            Atom::Int(v) => values.push(Some(SampleValue::Int(v))),
            Atom::Float(v) => values.push(Some(SampleValue::Float(v))),
            Atom::Char(_) => {}
        }
    }

    if is_gt {
        if !gt_alleles.is_empty() {
            builder.alleles = gt_alleles;
            builder.phased = phased;
        }
        return Ok(());
    }

    finalize_sample_field(tag, decl, values, builder)
}

fn finalize_sample_field(
    tag: &str,
    decl: &FieldDecl,
    values: Vec<Option<SampleValue>>,
    builder: &mut GenotypeBuilder,
) -> Result<()> {
    match tag {
        GENOTYPE_QUALITY_KEY => builder.quality = scalar_int(tag, values)?,
        DEPTH_KEY => builder.depth = scalar_int(tag, values)?,
        ALLELE_DEPTHS_KEY => builder.allele_depths = int_vector(tag, values)?,
        LIKELIHOODS_KEY => builder.likelihoods = int_vector(tag, values)?,
        GENOTYPE_FILTER_KEY => builder.filter = filter_state(values)?,
        _ => {
            if let Some(value) = generic_value(decl, values) {
                builder.attributes.push((tag.to_string(), value));
            }
        }
    }
    Ok(())
}

/// GQ and DP carry at most one value per sample.
fn scalar_int(tag: &str, values: Vec<Option<SampleValue>>) -> Result<Option<i32>> {
    match values.as_slice() {
        [] | [None] => Ok(None),
        [Some(SampleValue::Int(v))] => Ok(Some(*v)),
        [Some(SampleValue::Str(s))] => s.parse().map(Some).map_err(|_| {
            BcfError::MalformedGenotypeField(format!("{}: not an integer: {}", tag, s))
        }),
        [Some(SampleValue::Float(_))] => Err(BcfError::MalformedGenotypeField(format!(
            "{}: expected an integer value",
            tag
        ))),
        _ => Err(BcfError::MalformedGenotypeField(format!(
            "{}: expected at most one value, got {}",
            tag,
            values.len()
        ))),
    }
}

/// AD and PL keep their vectors as decoded; an empty or all-missing vector
/// leaves the field absent.
fn int_vector(tag: &str, values: Vec<Option<SampleValue>>) -> Result<Option<Vec<Option<i32>>>> {
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            None => out.push(None),
            Some(SampleValue::Int(v)) => out.push(Some(v)),
            Some(_) => {
                return Err(BcfError::MalformedGenotypeField(format!(
                    "{}: expected integer values",
                    tag
                )));
            }
        }
    }
    Ok(Some(out))
}

/// FT: nothing or "." means unfiltered, one other string names the reason.
fn filter_state(values: Vec<Option<SampleValue>>) -> Result<GenotypeFilter> {
    match values.as_slice() {
        [] | [None] => Ok(GenotypeFilter::Unfiltered),
        [Some(SampleValue::Str(s))] => {
            if s == UNFILTERED {
                Ok(GenotypeFilter::Unfiltered)
            } else {
                Ok(GenotypeFilter::Filtered(s.clone()))
            }
        }
        [Some(_)] => Err(BcfError::MalformedGenotypeField(
            "FT: expected a string value".to_string(),
        )),
        _ => Err(BcfError::MalformedGenotypeField(format!(
            "FT: expected at most one value, got {}",
            values.len()
        ))),
    }
}

/// Any other FORMAT key is stored verbatim, with string payloads coerced
/// to the declared numeric type when they parse.
fn generic_value(decl: &FieldDecl, values: Vec<Option<SampleValue>>) -> Option<GenotypeValue> {
    match values.len() {
        0 => None,
        1 => match values.into_iter().next().unwrap() {
            None => None,
            Some(SampleValue::Int(v)) => Some(GenotypeValue::Int(v)),
            Some(SampleValue::Float(v)) => Some(GenotypeValue::Float(v)),
            Some(SampleValue::Str(s)) => Some(coerce_string(decl.ty, s)),
        },
        _ => {
            let has_floats = values
                .iter()
                .flatten()
                .any(|v| matches!(v, SampleValue::Float(_)));
            if has_floats {
                Some(GenotypeValue::Floats(
                    values
                        .into_iter()
                        .map(|v| match v {
                            Some(SampleValue::Float(f)) => Some(f),
                            Some(SampleValue::Int(i)) => Some(i as f32),
                            _ => None,
                        })
                        .collect(),
                ))
            } else {
                Some(GenotypeValue::Ints(
                    values
                        .into_iter()
                        .map(|v| match v {
                            Some(SampleValue::Int(i)) => Some(i),
                            _ => None,
                        })
                        .collect(),
                ))
            }
        }
    }
}

fn coerce_string(ty: ValueType, s: String) -> GenotypeValue {
    match ty {
        ValueType::Integer => match s.parse::<i32>() {
            Ok(v) => GenotypeValue::Int(v),
            Err(_) => GenotypeValue::String(s),
        },
        ValueType::Float => match s.parse::<f32>() {
            Ok(v) => GenotypeValue::Float(v),
            Err(_) => GenotypeValue::String(s),
        },
        _ => GenotypeValue::String(s),
    }
}
