use std::collections::HashMap;
use std::io::Read;

use sha2::{Digest, Sha256};

use crate::entry::{Entry, EntryKind};
use crate::error::FormatError;
use crate::format::{Codec, HEADER_LEN, MAGIC, VERSION};

/// Decoded fixed-size header of a blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub codec: Codec,
    pub entry_count: u32,
    pub unpacked_size: u64,
    pub stored_size: u64,
    pub digest: [u8; 32],
}

impl Header {
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// Accumulates entries and encodes them into a blob.
///
/// Entries are written in insertion order. The writer does not validate
/// paths; extraction is where untrusted paths are rejected.
pub struct ArchiveWriter {
    codec: Codec,
    level: Option<u32>,
    entries: Vec<Entry>,
    payload: Vec<u8>,
}

impl ArchiveWriter {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            level: None,
            entries: Vec::new(),
            payload: Vec::new(),
        }
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn add_file(&mut self, path: impl Into<String>, contents: &[u8], executable: bool) -> &mut Self {
        self.entries
            .push(Entry::file(path, contents.len() as u64, executable));
        self.payload.extend_from_slice(contents);
        self
    }

    pub fn add_directory(&mut self, path: impl Into<String>) -> &mut Self {
        self.entries.push(Entry::directory(path));
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn finish(self) -> Result<Vec<u8>, FormatError> {
        let entry_count = u32::try_from(self.entries.len())
            .map_err(|_| FormatError::TooLarge("more than u32::MAX entries"))?;
        let stored = self.codec.compress(&self.payload, self.level)?;
        let digest: [u8; 32] = Sha256::digest(&stored).into();

        let manifest_len: usize = self.entries.iter().map(|e| 2 + e.path.len() + 1 + 8).sum();
        let mut blob = Vec::with_capacity(HEADER_LEN + manifest_len + stored.len());

        blob.extend_from_slice(&MAGIC);
        blob.push(VERSION);
        blob.push(self.codec.id());
        blob.extend_from_slice(&0u16.to_le_bytes());
        blob.extend_from_slice(&entry_count.to_le_bytes());
        blob.extend_from_slice(&(self.payload.len() as u64).to_le_bytes());
        blob.extend_from_slice(&(stored.len() as u64).to_le_bytes());
        blob.extend_from_slice(&digest);

        for entry in &self.entries {
            let path_len = u16::try_from(entry.path.len())
                .map_err(|_| FormatError::TooLarge("entry path longer than 65535 bytes"))?;
            blob.extend_from_slice(&path_len.to_le_bytes());
            blob.extend_from_slice(entry.path.as_bytes());
            blob.push(entry.flags());
            blob.extend_from_slice(&entry.size.to_le_bytes());
        }

        blob.extend_from_slice(&stored);
        Ok(blob)
    }
}

/// A parsed, digest-checked view over a blob.
#[derive(Clone, Debug)]
pub struct Archive<'a> {
    header: Header,
    entries: Vec<Entry>,
    stored: &'a [u8],
}

impl<'a> Archive<'a> {
    /// Parse the header and manifest and verify the payload digest.
    ///
    /// The payload is not decompressed here; see [`Archive::unpack`].
    pub fn parse(blob: &'a [u8]) -> Result<Self, FormatError> {
        let mut reader = ByteReader::new(blob);

        if reader.take(4)? != MAGIC {
            return Err(FormatError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let codec = Codec::from_id(reader.u8()?)?;
        if reader.u16()? != 0 {
            return Err(FormatError::ReservedBits);
        }
        let entry_count = reader.u32()?;
        let unpacked_size = reader.u64()?;
        let stored_size = reader.u64()?;
        let mut digest = [0u8; 32];
        digest.copy_from_slice(reader.take(32)?);

        let header = Header {
            version,
            codec,
            entry_count,
            unpacked_size,
            stored_size,
            digest,
        };

        // Each manifest record is at least 11 bytes; refuse counts the blob cannot hold
        // before reserving memory for them.
        if (entry_count as usize).saturating_mul(11) > reader.remaining() {
            return Err(FormatError::Truncated {
                offset: reader.pos,
                needed: (entry_count as usize).saturating_mul(11),
                available: reader.remaining(),
            });
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut seen = HashMap::with_capacity(entry_count as usize);
        let mut declared = 0u64;
        for _ in 0..entry_count {
            let path_len = reader.u16()? as usize;
            let path = std::str::from_utf8(reader.take(path_len)?)
                .map_err(|_| FormatError::InvalidUtf8)?
                .to_string();
            let flags = reader.u8()?;
            let size = reader.u64()?;
            let entry = Entry::from_flags(path, flags, size)?;
            if seen.insert(entry.path.clone(), entry.kind).is_some() {
                return Err(FormatError::DuplicatePath(entry.path));
            }
            declared = declared
                .checked_add(entry.size)
                .ok_or(FormatError::TooLarge("declared sizes overflow u64"))?;
            entries.push(entry);
        }

        // A file cannot also be the parent directory of another entry.
        for entry in &entries {
            for (idx, _) in entry.path.match_indices('/') {
                let parent = &entry.path[..idx];
                if seen.get(parent) == Some(&EntryKind::File) {
                    return Err(FormatError::PathConflict {
                        path: entry.path.clone(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        if declared != unpacked_size {
            return Err(FormatError::SizeMismatch {
                declared,
                actual: unpacked_size,
            });
        }

        let stored_len = usize::try_from(stored_size)
            .map_err(|_| FormatError::TooLarge("payload larger than address space"))?;
        let stored = reader.take(stored_len)?;
        if reader.remaining() != 0 {
            return Err(FormatError::TrailingBytes(reader.remaining()));
        }

        let actual: [u8; 32] = Sha256::digest(stored).into();
        if actual != header.digest {
            return Err(FormatError::DigestMismatch {
                expected: header.digest_hex(),
                actual: hex::encode(actual),
            });
        }

        Ok(Self {
            header,
            entries,
            stored,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn codec(&self) -> Codec {
        self.header.codec
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Decompress the payload, checking it against the declared size.
    pub fn unpack(&self) -> Result<Vec<u8>, FormatError> {
        let declared = self.header.unpacked_size;
        let capacity = usize::try_from(declared)
            .map_err(|_| FormatError::TooLarge("payload larger than address space"))?;

        let decoder = self.codec().decoder(self.stored)?;
        let mut payload = Vec::with_capacity(capacity);
        // Read one byte past the declared size so oversized payloads are detected
        // without inflating them fully.
        decoder
            .take(declared.saturating_add(1))
            .read_to_end(&mut payload)
            .map_err(FormatError::Compression)?;

        if payload.len() as u64 != declared {
            return Err(FormatError::SizeMismatch {
                declared,
                actual: payload.len() as u64,
            });
        }
        Ok(payload)
    }

    /// Pair every entry with its slice of the unpacked payload.
    ///
    /// Directories get an empty slice. `payload` must be exactly as long as
    /// the header declares, as returned by [`Archive::unpack`].
    pub fn contents<'p>(&self, payload: &'p [u8]) -> Result<Vec<(&Entry, &'p [u8])>, FormatError> {
        if payload.len() as u64 != self.header.unpacked_size {
            return Err(FormatError::SizeMismatch {
                declared: self.header.unpacked_size,
                actual: payload.len() as u64,
            });
        }

        // Entry sizes sum to `unpacked_size`, checked in `parse`.
        let mut rest = payload;
        Ok(self
            .entries
            .iter()
            .map(|entry| {
                let (slice, tail) = rest.split_at(entry.size as usize);
                rest = tail;
                (entry, slice)
            })
            .collect())
    }
}

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, FormatError> {
        self.array().map(u64::from_le_bytes)
    }
}
