//! Segment-level JPEG parsing.
//!
//! Pulls out what coefficient surgery needs: the frame description (SOF0),
//! the Huffman tables, the restart interval and the raw entropy-coded scan.
//! All other segments are kept verbatim so the writer can replay them into
//! the output file unchanged.

use super::marker::Marker;
use crate::error::{codec, Result};

/// A raw segment kept for reconstruction.
#[derive(Debug, Clone)]
pub struct Segment {
    pub marker: Marker,
    /// Segment payload, excluding marker and length bytes.
    pub data: Vec<u8>,
}

/// One Huffman table as defined by a DHT segment.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Number of codes of each length 1..=16.
    pub code_lengths: [u8; 16],
    /// Symbol values in code order.
    pub values: Vec<u8>,
}

/// One colour component of the frame.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    /// DC Huffman table id, assigned by the SOS header.
    pub dc_table_id: u8,
    /// AC Huffman table id, assigned by the SOS header.
    pub ac_table_id: u8,
}

/// Block-level geometry of one component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentGeometry {
    /// Pixel width after subsampling.
    pub downsampled_width: u32,
    /// Pixel height after subsampling.
    pub downsampled_height: u32,
    /// Real block columns, ceil(downsampled_width / 8).
    pub width_in_blocks: u32,
    /// Real block rows, ceil(downsampled_height / 8).
    pub height_in_blocks: u32,
    /// Block columns of the stored grid, padded to whole MCUs.
    pub grid_width: u32,
    /// Block rows of the stored grid, padded to whole MCUs.
    pub grid_height: u32,
}

/// Frame description from the SOF marker.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub sof_type: u8,
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: Vec<Component>,
}

impl FrameInfo {
    pub fn is_baseline(&self) -> bool {
        self.sof_type == 0
    }

    /// Largest sampling factors across components.
    pub fn max_sampling(&self) -> (u32, u32) {
        let h = self
            .components
            .iter()
            .map(|c| c.h_sampling as u32)
            .max()
            .unwrap_or(1);
        let v = self
            .components
            .iter()
            .map(|c| c.v_sampling as u32)
            .max()
            .unwrap_or(1);
        (h, v)
    }

    /// MCU grid dimensions (columns, rows) for an interleaved scan.
    pub fn mcu_grid(&self) -> (u32, u32) {
        let (h_max, v_max) = self.max_sampling();
        let cols = (self.width as u32).div_ceil(8 * h_max);
        let rows = (self.height as u32).div_ceil(8 * v_max);
        (cols, rows)
    }

    /// Geometry of one component under this frame.
    ///
    /// A single-component scan is not interleaved, so its grid is exactly
    /// the real block grid; interleaved scans pad each component's grid to
    /// whole MCUs and the padding blocks are carried but never addressed by
    /// the coefficient enumeration.
    pub fn geometry(&self, component: &Component) -> ComponentGeometry {
        let (h_max, v_max) = self.max_sampling();
        let h = component.h_sampling as u32;
        let v = component.v_sampling as u32;
        let downsampled_width = (self.width as u32 * h).div_ceil(h_max);
        let downsampled_height = (self.height as u32 * v).div_ceil(v_max);
        let width_in_blocks = downsampled_width.div_ceil(8);
        let height_in_blocks = downsampled_height.div_ceil(8);
        let (grid_width, grid_height) = if self.components.len() == 1 {
            (width_in_blocks, height_in_blocks)
        } else {
            let (mcu_cols, mcu_rows) = self.mcu_grid();
            (mcu_cols * h, mcu_rows * v)
        };
        ComponentGeometry {
            downsampled_width,
            downsampled_height,
            width_in_blocks,
            height_in_blocks,
            grid_width,
            grid_height,
        }
    }
}

/// Everything the codec retains from a parsed file.
#[derive(Debug, Clone, Default)]
pub struct JpegSegments {
    /// All pre-scan segments in file order, for reconstruction.
    pub segments: Vec<Segment>,
    /// DC Huffman tables by id.
    pub dc_tables: [Option<HuffmanTable>; 4],
    /// AC Huffman tables by id.
    pub ac_tables: [Option<HuffmanTable>; 4],
    pub frame: Option<FrameInfo>,
    /// Restart interval in MCUs, 0 when unset.
    pub restart_interval: u16,
    /// Entropy-coded scan data, byte stuffing and restart markers included.
    pub scan_data: Vec<u8>,
    /// Colour transform byte of an Adobe APP14 segment, when present.
    pub adobe_transform: Option<u8>,
}

/// Parses a complete JPEG byte stream up to and including its first scan.
pub fn parse(data: &[u8]) -> Result<JpegSegments> {
    let mut segments = JpegSegments::default();
    let mut pos = 0usize;

    if data.len() < 2 || data[0] != 0xff || data[1] != 0xd8 {
        return Err(codec("not a JPEG file (missing SOI marker)"));
    }
    pos += 2;

    loop {
        let marker = read_marker(data, &mut pos)?;
        match marker {
            Marker::Eoi => break,

            Marker::Sos => {
                let header = read_segment_body(data, &mut pos)?;
                parse_sos_header(&header, &mut segments)?;
                segments.scan_data = read_scan_data(data, &mut pos);
                break;
            }

            Marker::Dht => {
                let body = read_segment_body(data, &mut pos)?;
                parse_dht(&body, &mut segments)?;
                segments.segments.push(Segment { marker, data: body });
            }

            Marker::Sof(n) => {
                let body = read_segment_body(data, &mut pos)?;
                segments.frame = Some(parse_sof(n, &body)?);
                segments.segments.push(Segment { marker, data: body });
            }

            Marker::Dri => {
                let body = read_segment_body(data, &mut pos)?;
                if body.len() >= 2 {
                    segments.restart_interval = u16::from_be_bytes([body[0], body[1]]);
                }
                segments.segments.push(Segment { marker, data: body });
            }

            Marker::App(14) => {
                let body = read_segment_body(data, &mut pos)?;
                if body.len() >= 12 && &body[..5] == b"Adobe" {
                    segments.adobe_transform = Some(body[11]);
                }
                segments.segments.push(Segment { marker, data: body });
            }

            _ if marker.has_length() => {
                let body = read_segment_body(data, &mut pos)?;
                segments.segments.push(Segment { marker, data: body });
            }

            // Markers without a length field should not appear before the
            // scan; skip them.
            _ => {}
        }
    }

    Ok(segments)
}

/// Advances past fill bytes and returns the next marker.
fn read_marker(data: &[u8], pos: &mut usize) -> Result<Marker> {
    while *pos < data.len() && data[*pos] != 0xff {
        *pos += 1;
    }
    while *pos < data.len() && data[*pos] == 0xff {
        *pos += 1;
    }
    if *pos >= data.len() {
        return Err(codec("unexpected end of file while scanning for a marker"));
    }
    let byte = data[*pos];
    *pos += 1;
    Marker::from_byte(byte).ok_or_else(|| codec(format!("invalid marker byte 0x{byte:02x}")))
}

/// Reads a length-prefixed segment body.
fn read_segment_body(data: &[u8], pos: &mut usize) -> Result<Vec<u8>> {
    if *pos + 2 > data.len() {
        return Err(codec("truncated segment length"));
    }
    let length = u16::from_be_bytes([data[*pos], data[*pos + 1]]) as usize;
    if length < 2 {
        return Err(codec("segment length too small"));
    }
    *pos += 2;
    let body_len = length - 2;
    if *pos + body_len > data.len() {
        return Err(codec("truncated segment body"));
    }
    let body = data[*pos..*pos + body_len].to_vec();
    *pos += body_len;
    Ok(body)
}

/// Captures entropy-coded bytes until a non-restart marker.
///
/// Stuffed bytes (FF 00) and restart markers stay in the data; the bit
/// reader deals with both.
fn read_scan_data(data: &[u8], pos: &mut usize) -> Vec<u8> {
    let mut scan = Vec::new();
    while *pos < data.len() {
        let byte = data[*pos];
        if byte != 0xff {
            scan.push(byte);
            *pos += 1;
            continue;
        }
        match data.get(*pos + 1) {
            Some(0x00) => {
                scan.push(0xff);
                scan.push(0x00);
                *pos += 2;
            }
            Some(&next) if (0xd0..=0xd7).contains(&next) => {
                scan.push(0xff);
                scan.push(next);
                *pos += 2;
            }
            Some(0xff) => {
                // Fill byte before a marker.
                *pos += 1;
            }
            _ => break,
        }
    }
    scan
}

fn parse_dht(body: &[u8], segments: &mut JpegSegments) -> Result<()> {
    let mut pos = 0;
    while pos < body.len() {
        let tc_th = body[pos];
        let class = tc_th >> 4;
        let id = tc_th & 0x0f;
        pos += 1;
        if class > 1 || id > 3 {
            return Err(codec(format!(
                "invalid Huffman table: class {class}, id {id}"
            )));
        }
        if pos + 16 > body.len() {
            return Err(codec("DHT segment too short for code lengths"));
        }
        let mut code_lengths = [0u8; 16];
        code_lengths.copy_from_slice(&body[pos..pos + 16]);
        pos += 16;

        let total: usize = code_lengths.iter().map(|&n| n as usize).sum();
        if pos + total > body.len() {
            return Err(codec("DHT segment too short for symbol values"));
        }
        let values = body[pos..pos + total].to_vec();
        pos += total;

        let table = HuffmanTable {
            code_lengths,
            values,
        };
        if class == 0 {
            segments.dc_tables[id as usize] = Some(table);
        } else {
            segments.ac_tables[id as usize] = Some(table);
        }
    }
    Ok(())
}

fn parse_sof(sof_type: u8, body: &[u8]) -> Result<FrameInfo> {
    if body.len() < 6 {
        return Err(codec("SOF segment too short"));
    }
    let precision = body[0];
    let height = u16::from_be_bytes([body[1], body[2]]);
    let width = u16::from_be_bytes([body[3], body[4]]);
    let num_components = body[5] as usize;
    if width == 0 || height == 0 || num_components == 0 {
        return Err(codec("SOF declares an empty image"));
    }
    if body.len() < 6 + num_components * 3 {
        return Err(codec("SOF segment too short for its components"));
    }

    let mut components = Vec::with_capacity(num_components);
    for k in 0..num_components {
        let offset = 6 + k * 3;
        let sampling = body[offset + 1];
        let h_sampling = sampling >> 4;
        let v_sampling = sampling & 0x0f;
        if !(1..=4).contains(&h_sampling) || !(1..=4).contains(&v_sampling) {
            return Err(codec(format!(
                "sampling factors {h_sampling}x{v_sampling} out of range"
            )));
        }
        components.push(Component {
            id: body[offset],
            h_sampling,
            v_sampling,
            dc_table_id: 0,
            ac_table_id: 0,
        });
    }

    Ok(FrameInfo {
        sof_type,
        precision,
        width,
        height,
        components,
    })
}

/// Copies the scan's table assignments onto the frame components.
fn parse_sos_header(body: &[u8], segments: &mut JpegSegments) -> Result<()> {
    if body.is_empty() {
        return Err(codec("empty SOS header"));
    }
    let num_components = body[0] as usize;
    if body.len() < 1 + num_components * 2 + 3 {
        return Err(codec("SOS header too short"));
    }
    let frame = segments
        .frame
        .as_mut()
        .ok_or_else(|| codec("SOS before SOF"))?;
    if num_components != frame.components.len() {
        return Err(codec("scan does not cover all frame components"));
    }
    for k in 0..num_components {
        let component_id = body[1 + k * 2];
        let tables = body[2 + k * 2];
        let component = frame
            .components
            .iter_mut()
            .find(|c| c.id == component_id)
            .ok_or_else(|| codec("SOS names an unknown component"))?;
        component.dc_table_id = tables >> 4;
        component.ac_table_id = tables & 0x0f;
    }
    Ok(())
}
