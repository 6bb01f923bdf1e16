// Bank file container format
//
// A bank file is a little-endian binary container: a self-describing
// header followed by a contiguous fixed-stride array of encoded crossing
// records, the "source_bank" dataset. The header carries everything a
// reader from a different build needs to decide compatibility before
// touching the body: format version, byte order, record count, stride,
// and a per-field layout descriptor. Any layout change requires a version
// bump; readers reject versions and descriptors they do not understand
// instead of guessing.
//
// Layout, version 1:
//
//   magic         [u8; 8]  b"MCSBANK\0"
//   version       u16
//   byte_order    u8       1 = little-endian
//   flags         u8       bit 0: records sorted by natural ordering key
//   record_count  u64
//   record_stride u32      80
//   field_count   u16
//   fields        field_count x { name_len u8, name, type_code u8, size u8 }
//   dataset_name  u8 len + bytes ("source_bank")
//   meta_len      u32
//   metadata      JSON, auxiliary run information
//   body          record_count x record_stride bytes

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BankError;
use crate::particle::ParticleType;
use crate::source_site::{sort_sites, SourceSite};

pub const BANK_MAGIC: [u8; 8] = *b"MCSBANK\0";
pub const FORMAT_VERSION: u16 = 1;
/// Name of the record array inside the container
pub const SOURCE_BANK_DATASET: &str = "source_bank";
/// Encoded size of one record in bytes: two u32 tags and nine f64 fields
pub const RECORD_STRIDE: usize = 80;

const LITTLE_ENDIAN_TAG: u8 = 1;
const FLAG_SORTED: u8 = 0b0000_0001;

const TYPE_UINT: u8 = 0;
const TYPE_FLOAT: u8 = 1;

/// Field order, type codes, and sizes of a version-1 record. Written into
/// every header and checked verbatim on read.
const RECORD_LAYOUT: &[(&str, u8, u8)] = &[
    ("particle_type", TYPE_UINT, 4),
    ("surface_id", TYPE_UINT, 4),
    ("x", TYPE_FLOAT, 8),
    ("y", TYPE_FLOAT, 8),
    ("z", TYPE_FLOAT, 8),
    ("u", TYPE_FLOAT, 8),
    ("v", TYPE_FLOAT, 8),
    ("w", TYPE_FLOAT, 8),
    ("energy", TYPE_FLOAT, 8),
    ("time", TYPE_FLOAT, 8),
    ("weight", TYPE_FLOAT, 8),
];

/// Auxiliary run information stored alongside the records. Consumers may
/// want it for provenance; replay correctness never depends on it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    pub seed: u64,
    pub particles: usize,
    pub batches: usize,
    pub surf_ids: Vec<u32>,
}

/// Serializes a finalized bank to a container file.
///
/// The full file is assembled in memory and written to a sibling
/// temporary path, then renamed into place, so a failed write never
/// leaves a file whose header disagrees with its body.
#[derive(Debug, Clone, Default)]
pub struct BankWriter {
    sort_records: bool,
    metadata: Option<RunMetadata>,
}

impl BankWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort records by the natural ordering key before encoding, for
    /// bit-reproducible files across differently-partitioned runs. The
    /// header records that the file is sorted.
    pub fn deterministic(mut self, sort: bool) -> Self {
        self.sort_records = sort;
        self
    }

    pub fn with_metadata(mut self, metadata: RunMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn write(&self, path: &Path, sites: &[SourceSite]) -> Result<(), BankError> {
        // Reject invalid records up front; a bank file must never store a
        // record that a reader would have to reject.
        for (index, site) in sites.iter().enumerate() {
            site.validate()
                .map_err(|reason| BankError::InvalidRecord { index, reason })?;
        }

        let meta_json = match &self.metadata {
            Some(meta) => {
                serde_json::to_vec(meta).map_err(|e| BankError::io(path, e.into()))?
            }
            None => Vec::new(),
        };

        let mut buffer =
            Vec::with_capacity(128 + meta_json.len() + sites.len() * RECORD_STRIDE);
        buffer.extend_from_slice(&BANK_MAGIC);
        buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buffer.push(LITTLE_ENDIAN_TAG);
        buffer.push(if self.sort_records { FLAG_SORTED } else { 0 });
        buffer.extend_from_slice(&(sites.len() as u64).to_le_bytes());
        buffer.extend_from_slice(&(RECORD_STRIDE as u32).to_le_bytes());
        buffer.extend_from_slice(&(RECORD_LAYOUT.len() as u16).to_le_bytes());
        for (name, type_code, size) in RECORD_LAYOUT {
            buffer.push(name.len() as u8);
            buffer.extend_from_slice(name.as_bytes());
            buffer.push(*type_code);
            buffer.push(*size);
        }
        buffer.push(SOURCE_BANK_DATASET.len() as u8);
        buffer.extend_from_slice(SOURCE_BANK_DATASET.as_bytes());
        buffer.extend_from_slice(&(meta_json.len() as u32).to_le_bytes());
        buffer.extend_from_slice(&meta_json);

        if self.sort_records {
            let mut sorted = sites.to_vec();
            sort_sites(&mut sorted);
            for site in &sorted {
                encode_site(&mut buffer, site);
            }
        } else {
            for site in sites {
                encode_site(&mut buffer, site);
            }
        }

        write_atomic(path, &buffer)
    }
}

/// Write through a sibling temporary file and rename into place
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BankError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, bytes).map_err(|e| BankError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        BankError::io(path, e)
    })
}

fn encode_site(buffer: &mut Vec<u8>, site: &SourceSite) {
    buffer.extend_from_slice(&site.particle_type.to_u32().to_le_bytes());
    buffer.extend_from_slice(&site.surface_id.to_le_bytes());
    for value in site.position {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    for value in site.direction {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    buffer.extend_from_slice(&site.energy.to_le_bytes());
    buffer.extend_from_slice(&site.time.to_le_bytes());
    buffer.extend_from_slice(&site.weight.to_le_bytes());
}

/// A bank file loaded into memory
#[derive(Debug, Clone)]
pub struct BankFile {
    pub sites: Vec<SourceSite>,
    pub metadata: Option<RunMetadata>,
    pub version: u16,
    /// Whether the writer sorted the records by the natural ordering key.
    /// Unless this is set, on-disk order is an implementation detail.
    pub sorted: bool,
}

pub struct BankReader;

impl BankReader {
    /// Load and validate a bank file.
    ///
    /// Validation order: magic, format version, byte order, layout
    /// descriptor, declared-vs-actual body length, then every record's
    /// field invariants with the offending index on failure.
    pub fn read(path: &Path) -> Result<BankFile, BankError> {
        let bytes = fs::read(path).map_err(|e| BankError::io(path, e))?;
        let mut header = HeaderReader::new(path, &bytes);

        let magic = header.take(BANK_MAGIC.len())?;
        if magic != BANK_MAGIC {
            return Err(header.bad("magic bytes do not match"));
        }
        let version = header.u16()?;
        if version != FORMAT_VERSION {
            return Err(BankError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }
        let byte_order = header.u8()?;
        if byte_order != LITTLE_ENDIAN_TAG {
            return Err(header.bad("unknown byte order tag"));
        }
        let flags = header.u8()?;
        let record_count = header.u64()?;
        let stride = header.u32()? as usize;
        if stride != RECORD_STRIDE {
            return Err(header.bad("record stride does not match this format version"));
        }

        let field_count = header.u16()? as usize;
        if field_count != RECORD_LAYOUT.len() {
            return Err(header.bad("record layout descriptor has wrong field count"));
        }
        for (name, type_code, size) in RECORD_LAYOUT {
            let name_len = header.u8()? as usize;
            let field_name = header.take(name_len)?;
            if field_name != name.as_bytes()
                || header.u8()? != *type_code
                || header.u8()? != *size
            {
                return Err(header.bad("record layout descriptor does not match"));
            }
        }

        let dataset_len = header.u8()? as usize;
        let dataset = header.take(dataset_len)?;
        if dataset != SOURCE_BANK_DATASET.as_bytes() {
            return Err(header.bad("record dataset is not named 'source_bank'"));
        }

        let meta_len = header.u32()? as usize;
        let meta_bytes = header.take(meta_len)?;
        // Metadata is auxiliary; unparseable metadata is dropped, not fatal
        let metadata = if meta_bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(meta_bytes).ok()
        };

        let body = header.remaining();
        let expected = record_count
            .checked_mul(RECORD_STRIDE as u64)
            .ok_or_else(|| header.bad("record count overflows the file size"))?;
        if body.len() as u64 != expected {
            return Err(BankError::TruncatedFile {
                path: path.to_path_buf(),
                expected,
                actual: body.len() as u64,
            });
        }

        let mut sites = Vec::with_capacity(record_count as usize);
        for (index, record) in body.chunks_exact(RECORD_STRIDE).enumerate() {
            sites.push(decode_site(record, index)?);
        }

        Ok(BankFile {
            sites,
            metadata,
            version,
            sorted: flags & FLAG_SORTED != 0,
        })
    }
}

fn decode_site(record: &[u8], index: usize) -> Result<SourceSite, BankError> {
    let corrupt = |reason: String| BankError::CorruptRecord { index, reason };

    let tag = u32::from_le_bytes(record[0..4].try_into().expect("fixed record slice"));
    let particle_type = ParticleType::from_u32(tag)
        .ok_or_else(|| corrupt(format!("unknown particle type tag {}", tag)))?;
    let surface_id = u32::from_le_bytes(record[4..8].try_into().expect("fixed record slice"));

    let mut floats = [0.0f64; 9];
    for (i, chunk) in record[8..].chunks_exact(8).enumerate() {
        floats[i] = f64::from_le_bytes(chunk.try_into().expect("fixed record slice"));
    }

    let site = SourceSite {
        particle_type,
        position: [floats[0], floats[1], floats[2]],
        direction: [floats[3], floats[4], floats[5]],
        energy: floats[6],
        time: floats[7],
        weight: floats[8],
        surface_id,
    };
    site.validate().map_err(corrupt)?;
    Ok(site)
}

/// Sequential reader over the header bytes. Running out of bytes inside
/// the header means the file is not a bank file at all, which
/// is reported as a header error rather than truncation.
struct HeaderReader<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> HeaderReader<'a> {
    fn new(path: &'a Path, bytes: &'a [u8]) -> Self {
        Self {
            path,
            bytes,
            offset: 0,
        }
    }

    fn bad(&self, reason: &str) -> BankError {
        BankError::BadHeader {
            path: self.path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], BankError> {
        if self.offset + len > self.bytes.len() {
            return Err(self.bad("file ends inside the header"));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, BankError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, BankError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().expect("sized slice")))
    }

    fn u32(&mut self) -> Result<u32, BankError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().expect("sized slice")))
    }

    fn u64(&mut self) -> Result<u64, BankError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().expect("sized slice")))
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }
}
