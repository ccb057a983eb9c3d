//! Reassembles a complete JPEG file around new scan data.

use super::marker::Marker;
use super::parser::JpegSegments;

/// Writes a full JPEG: the retained segments in their original order, a
/// rebuilt SOS header and the given scan data. Everything except the scan
/// is copied from the source file, so quantisation tables, Huffman tables,
/// sampling and colourspace are untouched.
pub fn write_jpeg(segments: &JpegSegments, scan_data: &[u8]) -> Vec<u8> {
    let estimated: usize = segments
        .segments
        .iter()
        .map(|s| s.data.len() + 4)
        .sum::<usize>()
        + scan_data.len()
        + 64;
    let mut out = Vec::with_capacity(estimated);

    push_marker(&mut out, Marker::Soi);
    for segment in &segments.segments {
        push_marker(&mut out, segment.marker);
        if segment.marker.has_length() {
            let length = (segment.data.len() + 2) as u16;
            out.extend_from_slice(&length.to_be_bytes());
        }
        out.extend_from_slice(&segment.data);
    }

    push_sos_header(&mut out, segments);
    out.extend_from_slice(scan_data);
    push_marker(&mut out, Marker::Eoi);
    out
}

fn push_marker(out: &mut Vec<u8>, marker: Marker) {
    out.push(0xff);
    out.push(marker.to_byte());
}

/// Rebuilds the SOS header from the frame's component table assignments.
fn push_sos_header(out: &mut Vec<u8>, segments: &JpegSegments) {
    let Some(frame) = &segments.frame else {
        return;
    };
    push_marker(out, Marker::Sos);

    let num_components = frame.components.len() as u8;
    let length = 6 + 2 * num_components as u16;
    out.extend_from_slice(&length.to_be_bytes());
    out.push(num_components);
    for component in &frame.components {
        out.push(component.id);
        out.push((component.dc_table_id << 4) | component.ac_table_id);
    }
    out.push(0); // spectral selection start
    out.push(63); // spectral selection end
    out.push(0); // successive approximation
}
