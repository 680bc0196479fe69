//! Length prefixed strings as stored in packages

use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinResult, BinWrite, Endian};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use derive_more::derive::{Deref, Display, From};
use widestring::U16String;

/// Longest string accepted when reading, in characters
const MAX_STRING_LENGTH: u32 = 0x10000;

/// A package string
///
/// On disk the string is prefixed with an `i32` length that counts the NUL terminator. A positive
/// length means 8-bit characters, a negative one means UTF-16 code units and `0` is the empty
/// string. 8-bit characters are Latin-1, so strings that fit in Latin-1 are written with 8-bit
/// characters and everything else as UTF-16.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, Display, From)]
pub struct FString(String);

impl FString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn is_latin1(&self) -> bool {
        self.0.chars().all(|c| c <= '\u{FF}')
    }

    /// Number of bytes this string occupies once serialized
    pub fn serialized_size(&self) -> usize {
        if self.0.is_empty() {
            4
        } else if self.is_latin1() {
            4 + self.0.chars().count() + 1
        } else {
            4 + (self.0.encode_utf16().count() + 1) * 2
        }
    }
}

impl From<&str> for FString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl PartialEq<str> for FString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn invalid<T>(reader: &mut impl Seek, message: String) -> BinResult<T> {
    Err(binrw::Error::AssertFail {
        pos: reader.stream_position()?,
        message,
    })
}

impl BinRead for FString {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(reader: &mut R, _: Endian, _: Self::Args<'_>) -> BinResult<Self> {
        let length = reader.read_i32::<LittleEndian>()?;
        if length == 0 {
            return Ok(Self::default());
        }
        if length.unsigned_abs() > MAX_STRING_LENGTH {
            return invalid(reader, format!("string length {length} is too large"));
        }

        if length > 0 {
            let mut bytes = vec![0u8; length as usize];
            reader.read_exact(&mut bytes)?;
            if bytes.pop() != Some(0) {
                return invalid(reader, "string is not NUL terminated".into());
            }
            // 8-bit strings are Latin-1
            Ok(Self(bytes.into_iter().map(char::from).collect()))
        } else {
            let mut units = Vec::with_capacity(length.unsigned_abs() as usize);
            for _ in 0..length.unsigned_abs() {
                units.push(reader.read_u16::<LittleEndian>()?);
            }
            if units.pop() != Some(0) {
                return invalid(reader, "string is not NUL terminated".into());
            }
            let value = U16String::from_vec(units);
            match String::from_utf16(value.as_slice()) {
                Ok(value) => Ok(Self(value)),
                Err(e) => invalid(reader, format!("invalid UTF-16 string: {e}")),
            }
        }
    }
}

impl BinWrite for FString {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(&self, writer: &mut W, _: Endian, _: Self::Args<'_>) -> BinResult<()> {
        if self.0.is_empty() {
            writer.write_i32::<LittleEndian>(0)?;
        } else if self.is_latin1() {
            let bytes: Vec<u8> = self.0.chars().map(|c| c as u8).collect();
            writer.write_i32::<LittleEndian>(bytes.len() as i32 + 1)?;
            writer.write_all(&bytes)?;
            writer.write_u8(0)?;
        } else {
            let units = U16String::from_str(&self.0).into_vec();
            writer.write_i32::<LittleEndian>(-(units.len() as i32 + 1))?;
            for unit in units {
                writer.write_u16::<LittleEndian>(unit)?;
            }
            writer.write_u16::<LittleEndian>(0)?;
        }
        Ok(())
    }
}
