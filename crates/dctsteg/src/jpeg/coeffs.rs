//! Scan data to coefficient planes and back.
//!
//! Decoding stops at the quantised coefficients: no dequantisation, no
//! inverse DCT. Each component gets its own plane, a row-major grid of 8x8
//! blocks in natural (row, column) coefficient order, sized to the MCU
//! grid so that padding blocks survive a re-encode byte for byte.

use super::huffman::{encode_magnitude, BitReader, BitWriter, DecodeTable, EncodeTable};
use super::parser::{FrameInfo, JpegSegments};
use crate::error::{codec, Result, StegError};

/// Zigzag scan position to natural (row-major) block index.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// All blocks of one colour component.
#[derive(Debug)]
pub struct ComponentPlane {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Row-major block grid; each block holds natural-order coefficients.
    pub blocks: Vec<[i16; 64]>,
}

impl ComponentPlane {
    pub fn new(grid_width: u32, grid_height: u32) -> Result<Self> {
        let count = grid_width as usize * grid_height as usize;
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(count)
            .map_err(|_| StegError::OutOfMemory)?;
        blocks.resize(count, [0i16; 64]);
        Ok(ComponentPlane {
            grid_width,
            grid_height,
            blocks,
        })
    }

    #[inline]
    pub fn block(&self, row: u32, col: u32) -> &[i16; 64] {
        &self.blocks[(row * self.grid_width + col) as usize]
    }

    #[inline]
    pub fn block_mut(&mut self, row: u32, col: u32) -> &mut [i16; 64] {
        &mut self.blocks[(row * self.grid_width + col) as usize]
    }
}

/// Compiled Huffman tables for the components of one scan.
struct ScanTables {
    dc: Vec<DecodeTable>,
    ac: Vec<DecodeTable>,
}

fn build_decode_tables(frame: &FrameInfo, segments: &JpegSegments) -> Result<ScanTables> {
    let mut dc = Vec::with_capacity(frame.components.len());
    let mut ac = Vec::with_capacity(frame.components.len());
    for component in &frame.components {
        let dc_table = segments.dc_tables[component.dc_table_id as usize]
            .as_ref()
            .ok_or_else(|| codec(format!("missing DC Huffman table {}", component.dc_table_id)))?;
        let ac_table = segments.ac_tables[component.ac_table_id as usize]
            .as_ref()
            .ok_or_else(|| codec(format!("missing AC Huffman table {}", component.ac_table_id)))?;
        dc.push(DecodeTable::build(dc_table)?);
        ac.push(DecodeTable::build(ac_table)?);
    }
    Ok(ScanTables { dc, ac })
}

fn checked_frame(segments: &JpegSegments) -> Result<&FrameInfo> {
    let frame = segments
        .frame
        .as_ref()
        .ok_or_else(|| codec("no frame header (SOF) before the scan"))?;
    if !frame.is_baseline() {
        return Err(codec(format!(
            "only baseline (SOF0) JPEG is supported, got SOF{}",
            frame.sof_type
        )));
    }
    if frame.precision != 8 {
        return Err(codec(format!(
            "unsupported sample precision {}",
            frame.precision
        )));
    }
    Ok(frame)
}

/// Entropy-decodes the scan into one plane per component.
pub fn decode_planes(segments: &JpegSegments) -> Result<Vec<ComponentPlane>> {
    let frame = checked_frame(segments)?;
    let tables = build_decode_tables(frame, segments)?;

    let mut planes = Vec::with_capacity(frame.components.len());
    for component in &frame.components {
        let geometry = frame.geometry(component);
        planes.push(ComponentPlane::new(
            geometry.grid_width,
            geometry.grid_height,
        )?);
    }

    let mut reader = BitReader::new(&segments.scan_data);
    let mut predictors = vec![0i16; frame.components.len()];
    let interval = segments.restart_interval as u32;
    let mut since_restart = 0u32;

    if frame.components.len() == 1 {
        // Non-interleaved: one block per MCU, row-major over the grid.
        let (grid_width, grid_height) = (planes[0].grid_width, planes[0].grid_height);
        for row in 0..grid_height {
            for col in 0..grid_width {
                if interval > 0 && since_restart == interval {
                    reader.restart()?;
                    predictors[0] = 0;
                    since_restart = 0;
                }
                decode_block(
                    &mut reader,
                    planes[0].block_mut(row, col),
                    &tables.dc[0],
                    &tables.ac[0],
                    &mut predictors[0],
                )?;
                since_restart += 1;
            }
        }
    } else {
        let (mcu_cols, mcu_rows) = frame.mcu_grid();
        for mcu_row in 0..mcu_rows {
            for mcu_col in 0..mcu_cols {
                if interval > 0 && since_restart == interval {
                    reader.restart()?;
                    predictors.fill(0);
                    since_restart = 0;
                }
                for (ci, component) in frame.components.iter().enumerate() {
                    let h = component.h_sampling as u32;
                    let v = component.v_sampling as u32;
                    for by in 0..v {
                        for bx in 0..h {
                            decode_block(
                                &mut reader,
                                planes[ci].block_mut(mcu_row * v + by, mcu_col * h + bx),
                                &tables.dc[ci],
                                &tables.ac[ci],
                                &mut predictors[ci],
                            )?;
                        }
                    }
                }
                since_restart += 1;
            }
        }
    }

    Ok(planes)
}

/// Re-encodes the planes into scan data using the file's own tables.
///
/// With unmodified planes the output reproduces the original scan bytes.
pub fn encode_planes(planes: &[ComponentPlane], segments: &JpegSegments) -> Result<Vec<u8>> {
    let frame = checked_frame(segments)?;
    if planes.len() != frame.components.len() {
        return Err(codec("plane count does not match the frame"));
    }

    let mut dc_encoders = Vec::with_capacity(frame.components.len());
    let mut ac_encoders = Vec::with_capacity(frame.components.len());
    for component in &frame.components {
        let dc_table = segments.dc_tables[component.dc_table_id as usize]
            .as_ref()
            .ok_or_else(|| codec(format!("missing DC Huffman table {}", component.dc_table_id)))?;
        let ac_table = segments.ac_tables[component.ac_table_id as usize]
            .as_ref()
            .ok_or_else(|| codec(format!("missing AC Huffman table {}", component.ac_table_id)))?;
        dc_encoders.push(EncodeTable::build(dc_table)?);
        ac_encoders.push(EncodeTable::build(ac_table)?);
    }

    let mut writer = BitWriter::with_capacity(segments.scan_data.len());
    let mut predictors = vec![0i16; frame.components.len()];
    let interval = segments.restart_interval as u32;
    let mut since_restart = 0u32;
    let mut restart_id = 0u8;
    let mut blocks_written = 0usize;

    if frame.components.len() == 1 {
        let plane = &planes[0];
        for row in 0..plane.grid_height {
            for col in 0..plane.grid_width {
                if interval > 0 && since_restart == interval {
                    writer.write_restart(restart_id);
                    restart_id = (restart_id + 1) & 7;
                    predictors[0] = 0;
                    since_restart = 0;
                }
                encode_block(
                    &mut writer,
                    plane.block(row, col),
                    &dc_encoders[0],
                    &ac_encoders[0],
                    &mut predictors[0],
                )?;
                blocks_written += 1;
                since_restart += 1;
            }
        }
    } else {
        let (mcu_cols, mcu_rows) = frame.mcu_grid();
        for mcu_row in 0..mcu_rows {
            for mcu_col in 0..mcu_cols {
                if interval > 0 && since_restart == interval {
                    writer.write_restart(restart_id);
                    restart_id = (restart_id + 1) & 7;
                    predictors.fill(0);
                    since_restart = 0;
                }
                for (ci, component) in frame.components.iter().enumerate() {
                    let h = component.h_sampling as u32;
                    let v = component.v_sampling as u32;
                    for by in 0..v {
                        for bx in 0..h {
                            encode_block(
                                &mut writer,
                                planes[ci].block(mcu_row * v + by, mcu_col * h + bx),
                                &dc_encoders[ci],
                                &ac_encoders[ci],
                                &mut predictors[ci],
                            )?;
                            blocks_written += 1;
                        }
                    }
                }
                since_restart += 1;
            }
        }
    }

    let data = writer.into_bytes();
    log::debug!(
        "re-encoded scan: {} blocks into {} bytes (source {} bytes)",
        blocks_written,
        data.len(),
        segments.scan_data.len()
    );
    Ok(data)
}

/// Decodes one 8x8 block from the reader.
fn decode_block(
    reader: &mut BitReader,
    block: &mut [i16; 64],
    dc: &DecodeTable,
    ac: &DecodeTable,
    predictor: &mut i16,
) -> Result<()> {
    block.fill(0);

    let dc_size = reader.decode_symbol(dc)?;
    if dc_size > 11 {
        return Err(codec(format!("invalid DC magnitude category {dc_size}")));
    }
    let diff = reader.receive_extend(dc_size)?;
    *predictor = predictor.wrapping_add(diff);
    block[0] = *predictor;

    let mut k = 1;
    while k < 64 {
        let symbol = reader.decode_symbol(ac)?;
        let run = symbol >> 4;
        let size = symbol & 0x0f;
        if size == 0 {
            if run == 0 {
                break; // EOB
            }
            if run == 0x0f {
                k += 16; // ZRL
                continue;
            }
            return Err(codec(format!("invalid AC run/size symbol 0x{symbol:02x}")));
        }
        k += run as usize;
        if k >= 64 {
            return Err(codec("AC coefficient index out of range"));
        }
        block[ZIGZAG_TO_NATURAL[k]] = reader.receive_extend(size)?;
        k += 1;
    }
    Ok(())
}

/// Encodes one 8x8 block: DC difference, then run-length coded AC values
/// in zigzag order.
fn encode_block(
    writer: &mut BitWriter,
    block: &[i16; 64],
    dc: &EncodeTable,
    ac: &EncodeTable,
    predictor: &mut i16,
) -> Result<()> {
    let dc_value = block[0];
    let diff = dc_value.wrapping_sub(*predictor);
    *predictor = dc_value;

    let (size, bits) = encode_magnitude(diff);
    writer.write_code(size, dc)?;
    if size > 0 {
        writer.write_bits(bits, size);
    }

    let mut zero_run = 0u8;
    for k in 1..64 {
        let coeff = block[ZIGZAG_TO_NATURAL[k]];
        if coeff == 0 {
            zero_run += 1;
            continue;
        }
        while zero_run >= 16 {
            writer.write_code(0xf0, ac)?; // ZRL
            zero_run -= 16;
        }
        let (size, bits) = encode_magnitude(coeff);
        writer.write_code((zero_run << 4) | size, ac)?;
        writer.write_bits(bits, size);
        zero_run = 0;
    }
    if zero_run > 0 {
        writer.write_code(0x00, ac)?; // EOB
    }
    Ok(())
}
