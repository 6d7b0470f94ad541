//! Image file header.
//!
//! Only the 20-byte header is persisted: magic, version, object count,
//! global count and root object index, all big-endian u32. The object
//! graph itself is rebuilt by [`bootstrap`](crate::special::bootstrap).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::Vm;

/// `STLP`
pub const IMAGE_MAGIC: u32 = 0x5354_4C50;
pub const IMAGE_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 20;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("cannot read image: {0}")]
    Io(#[from] io::Error),

    #[error("image too small: {len} bytes, header needs {HEADER_SIZE}")]
    TooSmall { len: usize },

    #[error("not an image file: bad magic {found:#010x}, expected {IMAGE_MAGIC:#010x}")]
    BadMagic { found: u32 },

    #[error("unsupported image version {0}, expected {IMAGE_VERSION}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: u32,
    pub version: u32,
    pub object_count: u32,
    pub global_count: u32,
    pub root_object: u32,
}

impl ImageHeader {
    pub fn new(object_count: u32, global_count: u32, root_object: u32) -> Self {
        Self {
            magic: IMAGE_MAGIC,
            version: IMAGE_VERSION,
            object_count,
            global_count,
            root_object,
        }
    }

    /// Parse and validate the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ImageError::TooSmall { len: bytes.len() });
        }
        let word = |i: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_be_bytes(b)
        };
        let header = Self {
            magic: word(0),
            version: word(1),
            object_count: word(2),
            global_count: word(3),
            root_object: word(4),
        };
        if header.magic != IMAGE_MAGIC {
            return Err(ImageError::BadMagic {
                found: header.magic,
            });
        }
        if header.version != IMAGE_VERSION {
            return Err(ImageError::UnsupportedVersion(header.version));
        }
        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        for (i, word) in [
            self.magic,
            self.version,
            self.object_count,
            self.global_count,
            self.root_object,
        ]
        .into_iter()
        .enumerate()
        {
            out[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}

pub fn load_image_header(path: &Path) -> Result<ImageHeader, ImageError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::with_capacity(HEADER_SIZE);
    reader
        .by_ref()
        .take(HEADER_SIZE as u64)
        .read_to_end(&mut bytes)?;
    let header = ImageHeader::parse(&bytes)?;
    log::debug!(
        "image {}: {} objects, {} globals, root {}",
        path.display(),
        header.object_count,
        header.global_count,
        header.root_object
    );
    Ok(header)
}

/// Write a header describing `vm`'s current heap and globals.
pub fn save_image_header(vm: &Vm, path: &Path) -> Result<ImageHeader, ImageError> {
    let header = ImageHeader::new(vm.heap.len() as u32, vm.globals.len() as u32, 0);
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&header.to_bytes())?;
    writer.flush()?;
    Ok(header)
}
