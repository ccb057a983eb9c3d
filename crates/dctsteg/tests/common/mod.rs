//! Synthetic baseline JPEG construction for the end-to-end tests.
//!
//! Builds a coefficient-level JPEG from scratch: the standard luminance
//! Huffman tables (ITU T.81 Annex K), a flat quantisation table and
//! pseudo-random coefficient planes, assembled with the crate's own scan
//! encoder and file writer. Every component references table 0 throughout.

use dctsteg::jpeg::coeffs::{encode_planes, ComponentPlane};
use dctsteg::jpeg::marker::Marker;
use dctsteg::jpeg::parser::{Component, FrameInfo, HuffmanTable, JpegSegments, Segment};
use dctsteg::jpeg::writer::write_jpeg;

const DC_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const AC_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
#[rustfmt::skip]
const AC_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12,
    0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08,
    0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16,
    0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
    0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59,
    0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79,
    0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98,
    0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6,
    0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4,
    0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea,
    0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

fn dht_segment_data() -> Vec<u8> {
    let mut data = Vec::new();
    data.push(0x00); // DC table, id 0
    data.extend_from_slice(&DC_BITS);
    data.extend_from_slice(&DC_VALUES);
    data.push(0x10); // AC table, id 0
    data.extend_from_slice(&AC_BITS);
    data.extend_from_slice(&AC_VALUES);
    data
}

fn dqt_segment_data() -> Vec<u8> {
    let mut data = vec![0x00]; // 8-bit precision, id 0
    data.extend_from_slice(&[8u8; 64]);
    data
}

fn sof_segment_data(frame: &FrameInfo) -> Vec<u8> {
    let mut data = vec![frame.precision];
    data.extend_from_slice(&frame.height.to_be_bytes());
    data.extend_from_slice(&frame.width.to_be_bytes());
    data.push(frame.components.len() as u8);
    for component in &frame.components {
        data.push(component.id);
        data.push((component.h_sampling << 4) | component.v_sampling);
        data.push(0); // quantisation table 0
    }
    data
}

/// Fills one plane with plausible-looking coefficients: DC values with some
/// spread, AC values mostly zero and small otherwise.
fn random_plane(grid_width: u32, grid_height: u32, rng: &mut fastrand::Rng) -> ComponentPlane {
    let mut plane = ComponentPlane::new(grid_width, grid_height).unwrap();
    for block in plane.blocks.iter_mut() {
        block[0] = rng.i16(-100..100);
        for coefficient in block.iter_mut().skip(1) {
            *coefficient = match rng.usize(0..10) {
                0..=5 => 0,
                6..=8 => rng.i16(-3..=3),
                _ => rng.i16(-15..=15),
            };
        }
    }
    plane
}

/// Builds a complete baseline JPEG with the given dimensions and sampling
/// factors, one entry per component. `restart_interval` of 0 means no DRI
/// segment.
pub fn synthetic_jpeg(
    width: u16,
    height: u16,
    samplings: &[(u8, u8)],
    restart_interval: u16,
    seed: u64,
) -> Vec<u8> {
    let components = samplings
        .iter()
        .enumerate()
        .map(|(index, &(h, v))| Component {
            id: index as u8 + 1,
            h_sampling: h,
            v_sampling: v,
            dc_table_id: 0,
            ac_table_id: 0,
        })
        .collect();
    let frame = FrameInfo {
        sof_type: 0,
        precision: 8,
        width,
        height,
        components,
    };

    let mut segments = JpegSegments {
        segments: vec![
            Segment {
                marker: Marker::Dqt,
                data: dqt_segment_data(),
            },
            Segment {
                marker: Marker::Dht,
                data: dht_segment_data(),
            },
            Segment {
                marker: Marker::Sof(0),
                data: sof_segment_data(&frame),
            },
        ],
        restart_interval,
        ..Default::default()
    };
    if restart_interval > 0 {
        segments.segments.push(Segment {
            marker: Marker::Dri,
            data: restart_interval.to_be_bytes().to_vec(),
        });
    }
    segments.dc_tables[0] = Some(HuffmanTable {
        code_lengths: DC_BITS,
        values: DC_VALUES.to_vec(),
    });
    segments.ac_tables[0] = Some(HuffmanTable {
        code_lengths: AC_BITS,
        values: AC_VALUES.to_vec(),
    });

    let mut rng = fastrand::Rng::with_seed(seed);
    let planes: Vec<ComponentPlane> = frame
        .components
        .iter()
        .map(|component| {
            let geometry = frame.geometry(component);
            random_plane(geometry.grid_width, geometry.grid_height, &mut rng)
        })
        .collect();

    segments.frame = Some(frame);
    let scan = encode_planes(&planes, &segments).expect("synthetic scan must encode");
    write_jpeg(&segments, &scan)
}
