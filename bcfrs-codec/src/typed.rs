//! The typed-value primitive: every piece of variable data in a BCF record
//! (IDs, alleles, filters, INFO values, FORMAT tags) is framed as one
//! descriptor byte (low nibble type code, high nibble element count)
//! followed by the payload. A count nibble of 15 means the true count
//! follows as a nested typed scalar integer.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use bcfrs_core::{BcfError, Result};

/// Missing sentinel for INT8 values.
pub const INT8_MISSING: i32 = i8::MIN as i32;
/// End-of-vector sentinel for INT8 values.
pub const INT8_END_OF_VECTOR: i32 = i8::MIN as i32 + 1;
/// Missing sentinel for INT16 values.
pub const INT16_MISSING: i32 = i16::MIN as i32;
/// End-of-vector sentinel for INT16 values.
pub const INT16_END_OF_VECTOR: i32 = i16::MIN as i32 + 1;
/// Missing sentinel for INT32 values.
pub const INT32_MISSING: i32 = i32::MIN;
/// End-of-vector sentinel for INT32 values.
pub const INT32_END_OF_VECTOR: i32 = i32::MIN + 1;

/// Bit pattern of the FLOAT missing sentinel. This is not a canonical NaN;
/// it must be compared on the raw bits, never through `is_nan`.
pub const FLOAT_MISSING_BITS: u32 = 0x7F80_0001;
/// Bit pattern of the FLOAT end-of-vector sentinel.
pub const FLOAT_END_OF_VECTOR_BITS: u32 = 0x7F80_0002;

/// Count nibble value marking an overflowed count.
const OVERFLOW_COUNT: usize = 15;

/// The six wire type codes a descriptor byte can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Missing,
    Int8,
    Int16,
    Int32,
    Float,
    Char,
}

impl Kind {
    /// Decode the low nibble of a descriptor byte. An undefined code is a
    /// fatal format error.
    pub fn from_descriptor(descriptor: u8) -> Result<Kind> {
        match descriptor & 0x0f {
            0 => Ok(Kind::Missing),
            1 => Ok(Kind::Int8),
            2 => Ok(Kind::Int16),
            3 => Ok(Kind::Int32),
            5 => Ok(Kind::Float),
            7 => Ok(Kind::Char),
            other => Err(BcfError::InvalidTypeCode(other)),
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Kind::Int8 | Kind::Int16 | Kind::Int32)
    }
}

/// One atomic unit, with the per-width sentinels already classified.
/// CHAR atoms are raw bytes; zero bytes terminate strings one level up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Atom {
    Int(i32),
    Float(f32),
    Char(u8),
    Missing,
    EndOfVector,
}

/// The payload of a decoded typed value.
///
/// A declared count of 0 is `Absent`, a count of 1 is a scalar (never a
/// one-element vector), and larger counts are vectors whose length may be
/// shorter than declared when an end-of-vector sentinel cut them off.
/// Vector elements are `None` where the stream carried the missing
/// sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Absent,
    Int(i32),
    Float(f32),
    String(String),
    Ints(Vec<Option<i32>>),
    Floats(Vec<Option<f32>>),
}

/// One decoded typed unit. The declared count is kept separately from the
/// actual payload length.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub kind: Kind,
    pub declared_count: usize,
    pub value: Value,
}

/// Map mid-read EOF to the truncation error; everything else stays IO.
pub(crate) fn truncated(err: io::Error, what: &'static str) -> BcfError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        BcfError::Truncated(what)
    } else {
        BcfError::Io(err)
    }
}

/// Decode the element count for `descriptor`, reading the nested typed
/// integer that holds the true count when the nibble is the overflow
/// marker.
pub fn decode_count<R: Read>(reader: &mut R, descriptor: u8) -> Result<usize> {
    let nibble = (descriptor >> 4) as usize;
    if nibble >= OVERFLOW_COUNT {
        let count = read_scalar_int(reader)?;
        usize::try_from(count).map_err(|_| BcfError::ExpectedScalarInt)
    } else {
        Ok(nibble)
    }
}

fn read_raw_int<R: Read>(reader: &mut R, kind: Kind) -> Result<i32> {
    let v = match kind {
        Kind::Int8 => reader.read_i8().map_err(|e| truncated(e, "int8 value"))? as i32,
        Kind::Int16 => reader
            .read_i16::<LittleEndian>()
            .map_err(|e| truncated(e, "int16 value"))? as i32,
        Kind::Int32 => reader
            .read_i32::<LittleEndian>()
            .map_err(|e| truncated(e, "int32 value"))?,
        _ => return Err(BcfError::ExpectedIntValue),
    };
    Ok(v)
}

/// Read one atomic value of `kind`, classifying the per-width missing and
/// end-of-vector sentinels. The caller decides what the sentinels mean in
/// its context.
pub fn read_atom<R: Read>(reader: &mut R, kind: Kind) -> Result<Atom> {
    match kind {
        Kind::Missing => Ok(Atom::Missing),
        Kind::Int8 | Kind::Int16 | Kind::Int32 => {
            let v = read_raw_int(reader, kind)?;
            let (missing, end) = match kind {
                Kind::Int8 => (INT8_MISSING, INT8_END_OF_VECTOR),
                Kind::Int16 => (INT16_MISSING, INT16_END_OF_VECTOR),
                _ => (INT32_MISSING, INT32_END_OF_VECTOR),
            };
            Ok(if v == missing {
                Atom::Missing
            } else if v == end {
                Atom::EndOfVector
            } else {
                Atom::Int(v)
            })
        }
        Kind::Float => {
            let bits = reader
                .read_u32::<LittleEndian>()
                .map_err(|e| truncated(e, "float value"))?;
            Ok(match bits {
                FLOAT_MISSING_BITS => Atom::Missing,
                FLOAT_END_OF_VECTOR_BITS => Atom::EndOfVector,
                _ => Atom::Float(f32::from_bits(bits)),
            })
        }
        Kind::Char => Ok(Atom::Char(
            reader.read_u8().map_err(|e| truncated(e, "char value"))?,
        )),
    }
}

/// Read `length` bytes and keep everything before the first zero byte:
/// zero is the CHAR vector terminator, so truncation happens there, not at
/// the buffer end.
pub fn read_fixed_string<R: Read>(reader: &mut R, length: usize) -> Result<String> {
    let mut buf = vec![0u8; length];
    reader
        .read_exact(&mut buf)
        .map_err(|e| truncated(e, "string value"))?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(length);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Read one complete typed value: descriptor, count, payload.
pub fn read_value<R: Read>(reader: &mut R) -> Result<TypedValue> {
    let descriptor = reader
        .read_u8()
        .map_err(|e| truncated(e, "type descriptor"))?;
    read_value_with(reader, descriptor)
}

/// Read the count and payload for an already-consumed descriptor byte.
pub fn read_value_with<R: Read>(reader: &mut R, descriptor: u8) -> Result<TypedValue> {
    let kind = Kind::from_descriptor(descriptor)?;
    let count = decode_count(reader, descriptor)?;

    let value = match kind {
        Kind::Missing => Value::Absent,
        Kind::Char => {
            if count == 0 {
                Value::Absent
            } else {
                Value::String(read_fixed_string(reader, count)?)
            }
        }
        Kind::Int8 | Kind::Int16 | Kind::Int32 => {
            if count == 0 {
                Value::Absent
            } else if count == 1 {
                // scalars are read raw; sentinel interpretation belongs to
                // vectors only
                Value::Int(read_raw_int(reader, kind)?)
            } else {
                let mut items = Vec::with_capacity(count);
                let mut ended = false;
                for _ in 0..count {
                    // every declared element is physically present; keep
                    // consuming padding past the terminator
                    match read_atom(reader, kind)? {
                        _ if ended => {}
                        Atom::EndOfVector => ended = true,
                        Atom::Missing => items.push(None),
                        Atom::Int(v) => items.push(Some(v)),
                        _ => unreachable!(),
                    }
                }
                Value::Ints(items)
            }
        }
        Kind::Float => {
            if count == 0 {
                Value::Absent
            } else if count == 1 {
                let bits = reader
                    .read_u32::<LittleEndian>()
                    .map_err(|e| truncated(e, "float value"))?;
                Value::Float(f32::from_bits(bits))
            } else {
                let mut items = Vec::with_capacity(count);
                let mut ended = false;
                for _ in 0..count {
                    match read_atom(reader, Kind::Float)? {
                        _ if ended => {}
                        Atom::EndOfVector => ended = true,
                        Atom::Missing => items.push(None),
                        Atom::Float(v) => items.push(Some(v)),
                        _ => unreachable!(),
                    }
                }
                Value::Floats(items)
            }
        }
    };

    Ok(TypedValue {
        kind,
        declared_count: count,
        value,
    })
}

/// Read a typed value that must be a scalar integer (tag indices, overflow
/// counts).
pub fn read_scalar_int<R: Read>(reader: &mut R) -> Result<i32> {
    let tv = read_value(reader)?;
    match tv.value {
        Value::Int(v) => Ok(v),
        _ => Err(BcfError::ExpectedScalarInt),
    }
}

/// Read a typed value that must be character-kinded, as a string. An
/// absent value reads as the empty string.
pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let tv = read_value(reader)?;
    match tv.value {
        Value::String(s) => Ok(s),
        Value::Absent if tv.kind == Kind::Char || tv.kind == Kind::Missing => Ok(String::new()),
        _ => Err(BcfError::ExpectedCharValue),
    }
}

/// Read an integer-kinded typed value as a plain vector. Absent values and
/// MISSING-kinded values read as the empty vector; missing elements are
/// dropped.
pub fn read_int_array<R: Read>(reader: &mut R) -> Result<Vec<i32>> {
    let tv = read_value(reader)?;
    match tv.value {
        Value::Absent => Ok(Vec::new()),
        Value::Int(v) => Ok(vec![v]),
        Value::Ints(items) => Ok(items.into_iter().flatten().collect()),
        _ => Err(BcfError::ExpectedIntValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    fn descriptor(count: u8, type_code: u8) -> u8 {
        (count << 4) | type_code
    }

    #[test]
    fn test_kind_from_descriptor() {
        assert_eq!(Kind::from_descriptor(0x11).unwrap(), Kind::Int8);
        assert_eq!(Kind::from_descriptor(0x22).unwrap(), Kind::Int16);
        assert_eq!(Kind::from_descriptor(0x33).unwrap(), Kind::Int32);
        assert_eq!(Kind::from_descriptor(0x15).unwrap(), Kind::Float);
        assert_eq!(Kind::from_descriptor(0x17).unwrap(), Kind::Char);
        assert_eq!(Kind::from_descriptor(0x00).unwrap(), Kind::Missing);
        assert!(matches!(
            Kind::from_descriptor(0x14),
            Err(BcfError::InvalidTypeCode(4))
        ));
        assert!(matches!(
            Kind::from_descriptor(0x16),
            Err(BcfError::InvalidTypeCode(6))
        ));
    }

    #[test]
    fn test_scalar_int8() {
        let data = [descriptor(1, 1), 42];
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.kind, Kind::Int8);
        assert_eq!(tv.declared_count, 1);
        assert_eq!(tv.value, Value::Int(42));
    }

    #[test]
    fn test_count_one_is_scalar_never_vector() {
        let data = [descriptor(1, 2), 0x2c, 0x01]; // int16 300
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::Int(300));
    }

    #[test]
    fn test_count_zero_is_absent() {
        let data = [descriptor(0, 1)];
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::Absent);
    }

    #[test]
    fn test_int8_vector_with_missing_element() {
        let data = [descriptor(3, 1), 5, 0x80, 7];
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.declared_count, 3);
        assert_eq!(tv.value, Value::Ints(vec![Some(5), None, Some(7)]));
    }

    #[test]
    fn test_int8_vector_stops_at_end_of_vector() {
        let data = [descriptor(4, 1), 5, 6, 0x81, 0x81];
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.declared_count, 4);
        assert_eq!(tv.value, Value::Ints(vec![Some(5), Some(6)]));
    }

    #[test]
    fn test_int16_vector_sentinels() {
        let mut data = vec![descriptor(3, 2)];
        data.extend_from_slice(&1000i16.to_le_bytes());
        data.extend_from_slice(&i16::MIN.to_le_bytes());
        data.extend_from_slice(&(i16::MIN + 1).to_le_bytes());
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::Ints(vec![Some(1000), None]));
    }

    #[test]
    fn test_int32_vector_sentinels() {
        let mut data = vec![descriptor(2, 3)];
        data.extend_from_slice(&123456i32.to_le_bytes());
        data.extend_from_slice(&i32::MIN.to_le_bytes());
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::Ints(vec![Some(123456), None]));
    }

    #[test]
    fn test_int8_sentinel_values_are_legal_int16() {
        // -128 is only a sentinel at the 1-byte width
        let mut data = vec![descriptor(2, 2)];
        data.extend_from_slice(&(-128i16).to_le_bytes());
        data.extend_from_slice(&(-127i16).to_le_bytes());
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::Ints(vec![Some(-128), Some(-127)]));
    }

    #[test]
    fn test_float_vector_sentinel_bit_patterns() {
        let mut data = vec![descriptor(3, 5)];
        data.extend_from_slice(&1.5f32.to_bits().to_le_bytes());
        data.extend_from_slice(&FLOAT_MISSING_BITS.to_le_bytes());
        data.extend_from_slice(&FLOAT_END_OF_VECTOR_BITS.to_le_bytes());
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::Floats(vec![Some(1.5), None]));
    }

    #[test]
    fn test_float_nan_is_not_a_sentinel() {
        let mut data = vec![descriptor(2, 5)];
        data.extend_from_slice(&f32::NAN.to_bits().to_le_bytes());
        data.extend_from_slice(&2.0f32.to_bits().to_le_bytes());
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        match tv.value {
            Value::Floats(items) => {
                assert!(items[0].unwrap().is_nan());
                assert_eq!(items[1], Some(2.0));
            }
            other => panic!("expected float vector, got {:?}", other),
        }
    }

    #[test]
    fn test_char_string_truncates_at_nul() {
        let data = [descriptor(5, 7), b'A', b'C', 0, b'G', b'T'];
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.value, Value::String("AC".to_string()));
    }

    #[test]
    fn test_overflow_count() {
        // count nibble 15, true count 20 as a nested typed int8
        let mut data = vec![descriptor(15, 1), descriptor(1, 1), 20];
        data.extend(std::iter::repeat(1u8).take(20));
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.declared_count, 20);
        assert_eq!(tv.value, Value::Ints(vec![Some(1); 20]));
    }

    #[test]
    fn test_missing_kind() {
        let data = [descriptor(0, 0)];
        let tv = read_value(&mut Cursor::new(&data[..])).unwrap();
        assert_eq!(tv.kind, Kind::Missing);
        assert_eq!(tv.value, Value::Absent);
    }

    #[test]
    fn test_read_scalar_int_rejects_vectors() {
        let data = [descriptor(2, 1), 1, 2];
        assert!(matches!(
            read_scalar_int(&mut Cursor::new(&data[..])),
            Err(BcfError::ExpectedScalarInt)
        ));
    }

    #[test]
    fn test_read_string() {
        let data = [descriptor(3, 7), b'r', b's', b'1'];
        assert_eq!(read_string(&mut Cursor::new(&data[..])).unwrap(), "rs1");

        let empty = [descriptor(0, 7)];
        assert_eq!(read_string(&mut Cursor::new(&empty[..])).unwrap(), "");

        let not_char = [descriptor(1, 1), 9];
        assert!(matches!(
            read_string(&mut Cursor::new(&not_char[..])),
            Err(BcfError::ExpectedCharValue)
        ));
    }

    #[test]
    fn test_read_int_array() {
        let data = [descriptor(2, 1), 0, 3];
        assert_eq!(
            read_int_array(&mut Cursor::new(&data[..])).unwrap(),
            vec![0, 3]
        );

        let scalar = [descriptor(1, 1), 0];
        assert_eq!(
            read_int_array(&mut Cursor::new(&scalar[..])).unwrap(),
            vec![0]
        );

        let absent = [descriptor(0, 0)];
        assert!(read_int_array(&mut Cursor::new(&absent[..]))
            .unwrap()
            .is_empty());
    }

    #[rstest]
    #[case(Kind::Int8, &[0x80][..], Atom::Missing)]
    #[case(Kind::Int8, &[0x81][..], Atom::EndOfVector)]
    #[case(Kind::Int8, &[0x05][..], Atom::Int(5))]
    #[case(Kind::Int16, &[0x00, 0x80][..], Atom::Missing)]
    #[case(Kind::Int16, &[0x01, 0x80][..], Atom::EndOfVector)]
    #[case(Kind::Int32, &[0x00, 0x00, 0x00, 0x80][..], Atom::Missing)]
    #[case(Kind::Int32, &[0x01, 0x00, 0x00, 0x80][..], Atom::EndOfVector)]
    #[case(Kind::Float, &[0x01, 0x00, 0x80, 0x7f][..], Atom::Missing)]
    #[case(Kind::Float, &[0x02, 0x00, 0x80, 0x7f][..], Atom::EndOfVector)]
    fn test_read_atom_sentinels(#[case] kind: Kind, #[case] bytes: &[u8], #[case] expected: Atom) {
        let atom = read_atom(&mut Cursor::new(bytes), kind).unwrap();
        assert_eq!(atom, expected);
    }

    #[test]
    fn test_truncated_vector_is_a_truncation_error() {
        let data = [descriptor(4, 1), 1, 2];
        assert!(matches!(
            read_value(&mut Cursor::new(&data[..])),
            Err(BcfError::Truncated(_))
        ));
    }
}
