//! Capacity and usage reporting.

use std::fmt;

/// Per-component capacity details.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    /// True when the downsampled width is not a whole number of blocks, so
    /// the last block column is excluded from the usable set.
    pub afraid_width: bool,
    /// Likewise for the height.
    pub afraid_height: bool,
    pub h_sampling: u8,
    pub v_sampling: u8,
    /// Pixel dimensions after subsampling.
    pub width: u32,
    pub height: u32,
    /// Usable block grid, border blocks excluded.
    pub width_in_blocks: u32,
    pub height_in_blocks: u32,
    pub usable_blocks: u32,
}

/// What an encode, decode or estimate run learned about the image.
#[derive(Debug, Clone)]
pub struct Statistics {
    /// Total embed-eligible coefficient count.
    pub bits_available: u32,
    /// Usable positions per DCT block under the chosen radius.
    pub bits_in_block: u8,
    pub colorspace: &'static str,
    pub channels: Vec<ChannelInfo>,
    /// Bits occupied by the framed message; 0 after an estimate run.
    pub bits_used: u32,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Renders a byte count the way people read storage sizes.
fn human_bytes(bytes: u32) -> String {
    if bytes < 2 * 1024 {
        return format!("{bytes} B");
    }
    let kib = bytes as f64 / 1024.0;
    if kib < 2.0 * 1024.0 {
        return format!("{kib:.1} KiB");
    }
    format!("{:.1} MiB", kib / 1024.0)
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "\tAll bits available: {}", self.bits_available)?;
        writeln!(f, "\tBytes available: {}", human_bytes(self.bits_available / 8))?;
        writeln!(f, "\tBits in DCT block: {}", self.bits_in_block)?;
        writeln!(
            f,
            "\tColorspace: {}, {} channels",
            self.colorspace,
            self.channels.len()
        )?;
        writeln!(f, "Color components:")?;
        for (index, channel) in self.channels.iter().enumerate() {
            writeln!(f, "Component {index}:")?;
            writeln!(
                f,
                "\tSampling (width x height): {} x {}",
                channel.h_sampling, channel.v_sampling
            )?;
            writeln!(
                f,
                "\tWidth and height in pixels after sampling: {}, {}",
                channel.width, channel.height
            )?;
            writeln!(
                f,
                "\tSkip border blocks (width, height): {}, {}",
                yes_no(channel.afraid_width),
                yes_no(channel.afraid_height)
            )?;
            writeln!(f, "\tUsable DCT blocks: {}", channel.usable_blocks)?;
            writeln!(
                f,
                "\tWidth and height in blocks after skipping border blocks: {}, {}",
                channel.width_in_blocks, channel.height_in_blocks
            )?;
        }
        if self.bits_used != 0 {
            let usage = self.bits_used as f64 / self.bits_available as f64 * 100.0;
            if usage > 0.005 {
                writeln!(
                    f,
                    "Used {} of {} available bits, usage: {usage:.2}%",
                    self.bits_used, self.bits_available
                )?;
            } else {
                writeln!(
                    f,
                    "Used {} of {} available bits, usage: {usage:e}%",
                    self.bits_used, self.bits_available
                )?;
            }
        } else {
            writeln!(f, "Statistics produced by estimation")?;
        }
        writeln!(f, "End of statistics.")
    }
}
