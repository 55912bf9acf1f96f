/*!
 Contains logic to read objects out of a binary property list (`bplist00`) container.

 Layout referenced from `CFBinaryPList.c` in Apple's open source `CoreFoundation`:
   - an 8 byte header, `bplist00`
   - the object pool, each object starting with a marker byte
   - an offset table holding the position of every object
   - a 32 byte trailer describing the widths and sizes of the above
*/
use crate::{
    error::archive::ArchiveError,
    util::bplist::models::{PlistObject, Trailer, MAGIC, TRAILER_SIZE},
};

/// Indicates a null object
const NULL: u8 = 0x00;
/// Indicates a `false` boolean
const FALSE: u8 = 0x08;
/// Indicates a `true` boolean
const TRUE: u8 = 0x09;
/// Indicates a date stored as an 8 byte float
const DATE: u8 = 0x33;
/// A low nibble of this value means the length is stored in the integer object that follows the marker
const EXTENDED_LENGTH: u8 = 0x0F;

/// Object kinds stored in the high nibble of a marker byte
const KIND_SINGLETON: u8 = 0x0;
const KIND_INTEGER: u8 = 0x1;
const KIND_REAL: u8 = 0x2;
const KIND_DATE: u8 = 0x3;
const KIND_DATA: u8 = 0x4;
const KIND_ASCII_STRING: u8 = 0x5;
const KIND_UTF16_STRING: u8 = 0x6;
const KIND_UTF8_STRING: u8 = 0x7;
const KIND_UID: u8 = 0x8;
const KIND_ARRAY: u8 = 0xA;
const KIND_SET: u8 = 0xC;
const KIND_DICTIONARY: u8 = 0xD;

/// Read a big-endian unsigned integer of up to 8 bytes
fn be_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Random-access reader over the object pool of a `bplist00` container
///
/// Construction only validates the header and trailer; objects are decoded
/// one at a time by index through [`BinaryPlistReader::read_object`].
#[derive(Debug)]
pub struct BinaryPlistReader<'a> {
    /// The container we want to read
    stream: &'a [u8],
    /// The decoded trailer
    trailer: Trailer,
    /// Byte position of the offset table
    offset_table: usize,
    /// Number of objects in the pool
    num_objects: usize,
}

impl<'a> BinaryPlistReader<'a> {
    /// Validate the header and trailer of `stream`
    pub fn new(stream: &'a [u8]) -> Result<Self, ArchiveError> {
        if stream.len() < MAGIC.len() + TRAILER_SIZE {
            return Err(ArchiveError::TooShort(stream.len()));
        }
        if !stream.starts_with(MAGIC) {
            return Err(ArchiveError::InvalidHeader);
        }

        let trailer = Self::read_trailer(&stream[stream.len() - TRAILER_SIZE..]);
        let (offset_table, num_objects) = Self::validate_trailer(&trailer, stream.len())?;

        Ok(Self {
            stream,
            trailer,
            offset_table,
            num_objects,
        })
    }

    /// The trailer layout is 6 unused bytes, the two widths, then three big-endian `u64`s
    fn read_trailer(bytes: &[u8]) -> Trailer {
        Trailer {
            offset_size: bytes[6],
            ref_size: bytes[7],
            num_objects: be_u64(&bytes[8..16]),
            root_object: be_u64(&bytes[16..24]),
            offset_table_offset: be_u64(&bytes[24..32]),
        }
    }

    /// Ensure the trailer describes an offset table that fits inside the container
    fn validate_trailer(trailer: &Trailer, len: usize) -> Result<(usize, usize), ArchiveError> {
        if !(1..=8).contains(&trailer.offset_size) {
            return Err(ArchiveError::InvalidTrailer(format!(
                "offset width {} is not between 1 and 8",
                trailer.offset_size
            )));
        }
        if !(1..=8).contains(&trailer.ref_size) {
            return Err(ArchiveError::InvalidTrailer(format!(
                "reference width {} is not between 1 and 8",
                trailer.ref_size
            )));
        }
        if trailer.num_objects == 0 {
            return Err(ArchiveError::InvalidTrailer("empty object pool".to_string()));
        }
        if trailer.root_object >= trailer.num_objects {
            return Err(ArchiveError::InvalidReference(
                trailer.root_object,
                trailer.num_objects,
            ));
        }
        if trailer.ref_size < 8 && trailer.num_objects > 1u64 << (8 * u32::from(trailer.ref_size))
        {
            return Err(ArchiveError::InvalidTrailer(format!(
                "{} objects cannot be addressed with {} byte references",
                trailer.num_objects, trailer.ref_size
            )));
        }

        let objects_end = (len - TRAILER_SIZE) as u64;
        let table_end = trailer
            .num_objects
            .checked_mul(u64::from(trailer.offset_size))
            .and_then(|table_len| trailer.offset_table_offset.checked_add(table_len));
        match table_end {
            Some(end) if trailer.offset_table_offset >= MAGIC.len() as u64 && end <= objects_end => {
                // Both values are bounded by `len`, so they fit in a usize
                Ok((
                    trailer.offset_table_offset as usize,
                    trailer.num_objects as usize,
                ))
            }
            _ => Err(ArchiveError::InvalidTrailer(format!(
                "offset table at {:x} does not fit before the trailer",
                trailer.offset_table_offset
            ))),
        }
    }

    /// The decoded trailer
    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Index of the top-level object
    pub fn root(&self) -> usize {
        // Checked against `num_objects` during validation
        self.trailer.root_object as usize
    }

    /// Number of objects in the pool
    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    /// Read exactly `n` bytes starting at `start`
    fn read_exact_bytes(&self, start: usize, n: usize) -> Result<&'a [u8], ArchiveError> {
        let end = start
            .checked_add(n)
            .ok_or(ArchiveError::OutOfBounds(start, self.stream.len()))?;
        self.stream
            .get(start..end)
            .ok_or(ArchiveError::OutOfBounds(end, self.stream.len()))
    }

    /// Get the byte at a given index, if the index is within the bounds of the container
    fn get_byte(&self, byte_idx: usize) -> Result<u8, ArchiveError> {
        self.stream
            .get(byte_idx)
            .copied()
            .ok_or(ArchiveError::OutOfBounds(byte_idx, self.stream.len()))
    }

    /// Look up the position of object `index` in the offset table
    fn object_offset(&self, index: usize) -> Result<usize, ArchiveError> {
        if index >= self.num_objects {
            return Err(ArchiveError::InvalidReference(
                index as u64,
                self.num_objects as u64,
            ));
        }
        let width = usize::from(self.trailer.offset_size);
        let entry = self.read_exact_bytes(self.offset_table + index * width, width)?;
        let offset = be_u64(entry);

        if offset < MAGIC.len() as u64 || offset >= self.offset_table as u64 {
            return Err(ArchiveError::OutOfBounds(offset as usize, self.offset_table));
        }
        Ok(offset as usize)
    }

    /// Read the element count of a variable-length object, returning it with the position of the payload
    fn read_length(&self, offset: usize, info: u8) -> Result<(usize, usize), ArchiveError> {
        if info != EXTENDED_LENGTH {
            return Ok((usize::from(info), offset + 1));
        }

        let marker = self.get_byte(offset + 1)?;
        if marker >> 4 != KIND_INTEGER || marker & 0x0F > 3 {
            return Err(ArchiveError::InvalidLength(offset));
        }
        let width = 1usize << (marker & 0x0F);
        let length = be_u64(self.read_exact_bytes(offset + 2, width)?);
        let length = usize::try_from(length).map_err(|_| ArchiveError::InvalidLength(offset))?;

        Ok((length, offset + 2 + width))
    }

    /// Integers of 1, 2 and 4 bytes are unsigned, 8 bytes are signed, 16 bytes keep the low half
    fn read_integer(&self, offset: usize, info: u8) -> Result<i64, ArchiveError> {
        if info > 4 {
            return Err(ArchiveError::UnknownMarker(KIND_INTEGER << 4 | info, offset));
        }
        let width = 1usize << info;
        let bytes = self.read_exact_bytes(offset + 1, width)?;
        let value = match width {
            16 => be_u64(&bytes[8..]),
            _ => be_u64(bytes),
        };
        Ok(value as i64)
    }

    fn read_real(&self, offset: usize, info: u8) -> Result<f64, ArchiveError> {
        match info {
            2 => {
                let bits = be_u64(self.read_exact_bytes(offset + 1, 4)?) as u32;
                Ok(f64::from(f32::from_bits(bits)))
            }
            3 => Ok(f64::from_bits(be_u64(
                self.read_exact_bytes(offset + 1, 8)?,
            ))),
            _ => Err(ArchiveError::UnknownMarker(KIND_REAL << 4 | info, offset)),
        }
    }

    /// Read `count` object references, each `ref_size` bytes wide
    fn read_references(&self, start: usize, count: usize) -> Result<Vec<usize>, ArchiveError> {
        let width = usize::from(self.trailer.ref_size);
        let byte_len = count
            .checked_mul(width)
            .ok_or(ArchiveError::OutOfBounds(start, self.stream.len()))?;

        self.read_exact_bytes(start, byte_len)?
            .chunks_exact(width)
            .map(|chunk| {
                let reference = be_u64(chunk);
                if reference >= self.num_objects as u64 {
                    return Err(ArchiveError::InvalidReference(
                        reference,
                        self.num_objects as u64,
                    ));
                }
                Ok(reference as usize)
            })
            .collect()
    }

    fn read_utf16(&self, offset: usize, info: u8) -> Result<String, ArchiveError> {
        let (length, start) = self.read_length(offset, info)?;
        let byte_len = length
            .checked_mul(2)
            .ok_or(ArchiveError::InvalidLength(offset))?;
        let units: Vec<u16> = self
            .read_exact_bytes(start, byte_len)?
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        String::from_utf16(&units).map_err(|_| ArchiveError::StringParseError(offset))
    }

    fn read_utf8(&self, offset: usize, info: u8, ascii: bool) -> Result<String, ArchiveError> {
        let (length, start) = self.read_length(offset, info)?;
        let bytes = self.read_exact_bytes(start, length)?;
        if ascii && !bytes.is_ascii() {
            return Err(ArchiveError::StringParseError(offset));
        }
        std::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| ArchiveError::StringParseError(offset))
    }

    /// Decode the object at `index` in the pool
    ///
    /// Containers are returned as lists of pool indices; nothing beyond this object is read.
    pub fn read_object(&self, index: usize) -> Result<PlistObject<'a>, ArchiveError> {
        let offset = self.object_offset(index)?;
        let marker = self.get_byte(offset)?;
        let info = marker & 0x0F;

        match marker >> 4 {
            KIND_SINGLETON => match marker {
                NULL => Ok(PlistObject::Null),
                FALSE => Ok(PlistObject::Boolean(false)),
                TRUE => Ok(PlistObject::Boolean(true)),
                _ => Err(ArchiveError::UnknownMarker(marker, offset)),
            },
            KIND_INTEGER => self.read_integer(offset, info).map(PlistObject::Integer),
            KIND_REAL => self.read_real(offset, info).map(PlistObject::Real),
            KIND_DATE if marker == DATE => {
                let bits = be_u64(self.read_exact_bytes(offset + 1, 8)?);
                Ok(PlistObject::Date(f64::from_bits(bits)))
            }
            KIND_DATA => {
                let (length, start) = self.read_length(offset, info)?;
                Ok(PlistObject::Data(self.read_exact_bytes(start, length)?))
            }
            KIND_ASCII_STRING => self.read_utf8(offset, info, true).map(PlistObject::String),
            KIND_UTF16_STRING => self.read_utf16(offset, info).map(PlistObject::String),
            KIND_UTF8_STRING => self.read_utf8(offset, info, false).map(PlistObject::String),
            KIND_UID => {
                let width = usize::from(info) + 1;
                if width > 8 {
                    return Err(ArchiveError::UnknownMarker(marker, offset));
                }
                Ok(PlistObject::Uid(be_u64(
                    self.read_exact_bytes(offset + 1, width)?,
                )))
            }
            KIND_ARRAY => {
                let (count, start) = self.read_length(offset, info)?;
                self.read_references(start, count).map(PlistObject::Array)
            }
            KIND_SET => {
                let (count, start) = self.read_length(offset, info)?;
                self.read_references(start, count).map(PlistObject::Set)
            }
            KIND_DICTIONARY => {
                let (count, start) = self.read_length(offset, info)?;
                let total = count
                    .checked_mul(2)
                    .ok_or(ArchiveError::InvalidLength(offset))?;
                let references = self.read_references(start, total)?;
                let (keys, values) = references.split_at(count);
                Ok(PlistObject::Dictionary(
                    keys.iter().copied().zip(values.iter().copied()).collect(),
                ))
            }
            _ => Err(ArchiveError::UnknownMarker(marker, offset)),
        }
    }
}
