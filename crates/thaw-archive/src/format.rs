use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use crate::error::FormatError;

pub const MAGIC: [u8; 4] = *b"THAW";
pub const VERSION: u8 = 1;

/// Fixed-size header: magic, version, codec, reserved, entry count,
/// unpacked size, stored size, SHA-256 digest.
pub const HEADER_LEN: usize = 4 + 1 + 1 + 2 + 4 + 8 + 8 + 32;

/// Compression codec applied to the concatenated payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Codec {
    None,
    #[default]
    Gzip,
    Zstd,
}

impl Codec {
    pub const fn id(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Gzip => 1,
            Self::Zstd => 2,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, FormatError> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Zstd),
            other => Err(FormatError::UnknownCodec(other)),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Whether this build can both encode and decode the codec.
    pub const fn is_enabled(self) -> bool {
        match self {
            Self::None => true,
            Self::Gzip => cfg!(feature = "gzip"),
            Self::Zstd => cfg!(feature = "zstd"),
        }
    }

    /// Compress `data` in one shot.
    ///
    /// `level` is codec specific: 0-9 for gzip (default 6), 1-22 for zstd
    /// (default 3). Out-of-range values are clamped.
    pub fn compress(self, data: &[u8], level: Option<u32>) -> Result<Vec<u8>, FormatError> {
        match self {
            Self::None => Ok(data.to_vec()),
            #[cfg(feature = "gzip")]
            Self::Gzip => {
                use std::io::Write;
                let level = flate2::Compression::new(level.unwrap_or(6).min(9));
                let mut encoder = flate2::write::GzEncoder::new(Vec::new(), level);
                encoder.write_all(data).map_err(FormatError::Compression)?;
                encoder.finish().map_err(FormatError::Compression)
            }
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let level = level.unwrap_or(3).clamp(1, 22) as i32;
                zstd::stream::encode_all(data, level).map_err(FormatError::Compression)
            }
            #[allow(unreachable_patterns)]
            disabled => Err(FormatError::CodecDisabled(disabled)),
        }
    }

    /// Create a streaming decoder for this codec.
    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>, FormatError> {
        match self {
            Self::None => Ok(Decoder::Passthrough(reader)),
            #[cfg(feature = "gzip")]
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(
                reader,
            )))),
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(reader)
                    .map_err(FormatError::Compression)?;
                Ok(Decoder::Zstd(Box::new(decoder)))
            }
            #[allow(unreachable_patterns)]
            disabled => Err(FormatError::CodecDisabled(disabled)),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "store" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "zstd" | "zst" => Ok(Self::Zstd),
            other => Err(format!("unknown codec '{other}', expected none, gzip or zstd")),
        }
    }
}

/// Decoder wrapper over the enabled codecs.
pub enum Decoder<R: Read> {
    Passthrough(R),
    #[cfg(feature = "gzip")]
    Gzip(Box<flate2::read::GzDecoder<R>>),
    #[cfg(feature = "zstd")]
    Zstd(Box<zstd::stream::read::Decoder<'static, io::BufReader<R>>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            #[cfg(feature = "gzip")]
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(d) => d.read(buf),
        }
    }
}
