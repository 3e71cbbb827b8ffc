//! Fixed-layout image container.
//!
//! A container is a fixed-size header followed by `width * height` pixels in
//! blue-green-red order, row-major, without row padding or compression. Width
//! and height are little-endian `u32` fields inside the header; every other
//! header byte is carried through untouched.

use crate::errors::*;
use crate::raster::{Raster, PIXEL_SIZE};
use common::ImageInfo;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Byte layout of the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLayout {
    pub header_size: usize,
    pub width_offset: usize,
    pub height_offset: usize,
    /// Bytes per pixel in the data section.
    pub channels: usize,
}

impl ContainerLayout {
    /// 24-bit bitmap with a 14-byte file header and a 40-byte info header.
    pub const BMP: ContainerLayout = ContainerLayout {
        header_size: 54,
        width_offset: 18,
        height_offset: 22,
        channels: 3,
    };

    fn validate(&self) -> Result<()> {
        if self.channels != PIXEL_SIZE {
            bail!(ErrorKind::InvalidConfig(format!(
                "{} channels per pixel, only {} are supported",
                self.channels, PIXEL_SIZE
            )));
        }
        let fields_fit = [self.width_offset, self.height_offset]
            .iter()
            .all(|&offset| offset.checked_add(4).map_or(false, |end| end <= self.header_size));
        if !fields_fit {
            bail!(ErrorKind::InvalidConfig(
                "dimension fields lie outside the header".into()
            ));
        }
        Ok(())
    }
}

impl Default for ContainerLayout {
    fn default() -> Self {
        ContainerLayout::BMP
    }
}

/// Raw header bytes together with the layout used to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    layout: ContainerLayout,
    bytes: Vec<u8>,
}

impl Header {
    pub fn parse(layout: ContainerLayout, bytes: Vec<u8>) -> Result<Self> {
        layout.validate()?;
        if bytes.len() < layout.header_size {
            bail!(ErrorKind::TruncatedHeader(bytes.len(), layout.header_size));
        }
        let mut bytes = bytes;
        bytes.truncate(layout.header_size);
        Ok(Self { layout, bytes })
    }

    /// A fresh header for a `width`×`height` image.
    ///
    /// With the BMP layout this is a complete uncompressed 24-bit bitmap
    /// header; other layouts only get their dimension fields filled in.
    pub fn new(layout: ContainerLayout, width: u32, height: u32) -> Result<Self> {
        layout.validate()?;
        let mut bytes = vec![0u8; layout.header_size];
        put_u32(&mut bytes, layout.width_offset, width);
        put_u32(&mut bytes, layout.height_offset, height);

        if layout == ContainerLayout::BMP {
            let data_size = (width as u64) * (height as u64) * PIXEL_SIZE as u64;
            let file_size = data_size + layout.header_size as u64;
            bytes[0..2].copy_from_slice(b"BM");
            put_u32(&mut bytes, 2, clamp_u32(file_size));
            put_u32(&mut bytes, 10, layout.header_size as u32);
            put_u32(&mut bytes, 14, 40);
            bytes[26..28].copy_from_slice(&1u16.to_le_bytes());
            bytes[28..30].copy_from_slice(&24u16.to_le_bytes());
            put_u32(&mut bytes, 34, clamp_u32(data_size));
        }

        Ok(Self { layout, bytes })
    }

    pub fn width(&self) -> usize {
        get_u32(&self.bytes, self.layout.width_offset) as usize
    }

    pub fn height(&self) -> usize {
        get_u32(&self.bytes, self.layout.height_offset) as usize
    }

    pub fn info(&self) -> ImageInfo {
        ImageInfo::new(self.width(), self.height())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn get_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(field)
}

fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn clamp_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads a header and the pixel grid it describes.
pub fn read_image<R: Read>(layout: ContainerLayout, mut reader: R) -> Result<(Header, Raster)> {
    layout.validate()?;
    let mut bytes = vec![0u8; layout.header_size];
    let read = read_fully(&mut reader, &mut bytes)?;
    if read < layout.header_size {
        bail!(ErrorKind::TruncatedHeader(read, layout.header_size));
    }
    let header = Header::parse(layout, bytes)?;

    let info = header.info();
    let mut raster = Raster::new(info.width, info.height)?;
    let read = read_fully(&mut reader, raster.as_bytes_mut())?;
    if read < raster.as_bytes().len() {
        bail!(ErrorKind::TruncatedPixels(read / PIXEL_SIZE, raster.len()));
    }

    Ok((header, raster))
}

/// Writes `header` followed by the pixels of `raster`, which must have the
/// shape the header describes.
pub fn write_image<W: Write>(mut writer: W, header: &Header, raster: &Raster) -> Result<()> {
    raster.ensure_shape(&header.info())?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(raster.as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn load(path: &Path) -> Result<(Header, Raster)> {
    let file = File::open(path).chain_err(|| format!("Cannot read image file {}", path.display()))?;
    read_image(ContainerLayout::BMP, BufReader::new(file))
        .chain_err(|| format!("Cannot read image file {}", path.display()))
}

pub fn save(path: &Path, header: &Header, raster: &Raster) -> Result<()> {
    let file =
        File::create(path).chain_err(|| format!("Cannot write image file {}", path.display()))?;
    write_image(BufWriter::new(file), header, raster)
        .chain_err(|| format!("Cannot write image file {}", path.display()))
}
