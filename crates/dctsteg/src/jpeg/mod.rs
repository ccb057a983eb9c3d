//! Coefficient-level JPEG codec.
//!
//! The steganographic engine never needs pixels: it reads a JPEG down to its
//! quantised DCT coefficients, mutates a selection of them and writes the
//! file back with every other parameter copied verbatim. This module owns
//! that round trip:
//!
//! ```text
//! bytes → parse → huffman decode → per-component block planes
//!                                        │ (coefficient surgery)
//! bytes ← write ← huffman encode ←───────┘
//! ```
//!
//! Only baseline (SOF0) streams are handled; anything else is reported as a
//! codec failure.

pub mod coeffs;
pub mod huffman;
pub mod marker;
pub mod parser;
pub mod writer;

use std::path::Path;

use crate::error::{Result, StegError};
use coeffs::ComponentPlane;
use parser::{Component, ComponentGeometry, FrameInfo, JpegSegments};

/// Colourspace as far as the statistics report cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Rgb,
    Grayscale,
    YCbCr,
    Unknown,
}

impl Colorspace {
    pub fn name(self) -> &'static str {
        match self {
            Colorspace::Rgb => "RGB",
            Colorspace::Grayscale => "Grayscale",
            Colorspace::YCbCr => "YCbCr",
            Colorspace::Unknown => "Unknown colorspace",
        }
    }
}

/// A JPEG opened for coefficient surgery.
pub struct JpegImage {
    segments: JpegSegments,
    frame: FrameInfo,
    planes: Vec<ComponentPlane>,
}

impl JpegImage {
    /// Reads and decodes a file. Failures to read map to the input-access
    /// error; malformed streams map to codec failures.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(StegError::InputOpen)?;
        Self::from_bytes(&data)
    }

    /// Decodes an in-memory JPEG stream.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let segments = parser::parse(data)?;
        let planes = coeffs::decode_planes(&segments)?;
        let frame = segments
            .frame
            .clone()
            .ok_or_else(|| crate::error::codec("no frame header (SOF) in stream"))?;
        Ok(JpegImage {
            segments,
            frame,
            planes,
        })
    }

    pub fn components(&self) -> &[Component] {
        &self.frame.components
    }

    /// Block-level geometry of component `index`.
    pub fn geometry(&self, index: usize) -> ComponentGeometry {
        self.frame.geometry(&self.frame.components[index])
    }

    /// Classifies the colourspace from the component count, the Adobe
    /// transform byte and the component ids, in that order.
    pub fn colorspace(&self) -> Colorspace {
        match self.frame.components.len() {
            1 => Colorspace::Grayscale,
            3 => match self.segments.adobe_transform {
                Some(0) => Colorspace::Rgb,
                Some(1) => Colorspace::YCbCr,
                Some(_) => Colorspace::Unknown,
                None => {
                    let ids: Vec<u8> = self.frame.components.iter().map(|c| c.id).collect();
                    if ids == [b'R', b'G', b'B'] {
                        Colorspace::Rgb
                    } else {
                        Colorspace::YCbCr
                    }
                }
            },
            _ => Colorspace::Unknown,
        }
    }

    #[inline]
    pub fn block(&self, component: usize, row: u32, col: u32) -> &[i16; 64] {
        self.planes[component].block(row, col)
    }

    #[inline]
    pub fn block_mut(&mut self, component: usize, row: u32, col: u32) -> &mut [i16; 64] {
        self.planes[component].block_mut(row, col)
    }

    /// Re-encodes the (possibly modified) planes into a complete file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let scan = coeffs::encode_planes(&self.planes, &self.segments)?;
        Ok(writer::write_jpeg(&self.segments, &scan))
    }

    /// Writes the image to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(StegError::WriteImage)
    }
}
