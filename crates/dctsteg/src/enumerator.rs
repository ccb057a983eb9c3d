//! Flat numbering of every usable DCT coefficient in an image.
//!
//! The permutation treats all usable coefficients as one pool, so a single
//! random index lands uniformly across colour components and blocks instead
//! of favouring any one channel. This module realises the bijection between
//! that flat index and a concrete (component, block row, block column,
//! coefficient) coordinate.

use crate::error::{Result, StegError};

/// Hard cap on registered components, matching the codec's own limit.
pub const MAX_COMPONENTS: usize = 255;

/// Number of usable coefficient positions per block for a given radius.
///
/// A position (i, j) is usable when i^2 + j^2 < R^2, i.e. it lies strictly
/// inside the radius circle; lattice points on the circle are excluded. For
/// the default radius 2 that leaves the four positions (0,0), (0,1), (1,0)
/// and (1,1).
pub fn usable_in_block(radius: u8) -> u8 {
    let r2 = radius as u32 * radius as u32;
    let mut count = 0;
    for i in 0..8u32 {
        for j in 0..8u32 {
            if i * i + j * j < r2 {
                count += 1;
            }
        }
    }
    count
}

/// Resolves a coefficient ordinal to its (i, j) position.
///
/// Positions are ranked by a row-major scan over the block; within a row the
/// scan stops at the first position outside the radius, since i^2 + j^2 only
/// grows with j.
fn coefficient_at(ordinal: u8, radius: u8) -> Option<(u8, u8)> {
    let r2 = radius as u32 * radius as u32;
    let mut current = 0;
    for i in 0..8u32 {
        for j in 0..8u32 {
            if i * i + j * j >= r2 {
                break;
            }
            if current == ordinal {
                return Some((i as u8, j as u8));
            }
            current += 1;
        }
    }
    None
}

/// Per-component card: usable block grid and its size.
struct Card {
    wbl: u32,
    hbl: u32,
    nblocks: u32,
}

/// A coordinate produced by [`Enumerator::locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the colour component.
    pub component: u8,
    /// Block row inside the component.
    pub m: u32,
    /// Block column inside the component.
    pub n: u32,
    /// Coefficient row inside the block.
    pub i: u8,
    /// Coefficient column inside the block.
    pub j: u8,
}

/// The index ↔ coordinate bijection over all registered components.
pub struct Enumerator {
    cards: Vec<Card>,
    radius: u8,
}

impl Enumerator {
    pub fn new(radius: u8) -> Self {
        Enumerator {
            cards: Vec::new(),
            radius,
        }
    }

    /// Registers one component's usable block grid.
    ///
    /// Empty grids (zero width or height) are fine and contribute nothing.
    pub fn add(&mut self, width: u32, height: u32) -> Result<()> {
        if self.cards.len() == MAX_COMPONENTS {
            return Err(crate::error::codec("too many colour components"));
        }
        let nblocks = width.checked_mul(height).ok_or(StegError::DataTooLong)?;
        self.cards.push(Card {
            wbl: width,
            hbl: height,
            nblocks,
        });
        Ok(())
    }

    /// Total number of usable coefficient positions.
    pub fn count(&self) -> Result<u32> {
        let per_block = usable_in_block(self.radius) as u32;
        let mut all: u32 = 0;
        for card in &self.cards {
            let positions = card
                .nblocks
                .checked_mul(per_block)
                .ok_or(StegError::DataTooLong)?;
            all = all.checked_add(positions).ok_or(StegError::DataTooLong)?;
        }
        Ok(all)
    }

    /// Maps a flat index back to its coordinate.
    ///
    /// Indices at or beyond [`Enumerator::count`] are rejected.
    pub fn locate(&self, idx: u32) -> Result<Position> {
        let per_block = usable_in_block(self.radius) as u64;
        let mut base: u64 = 0;
        for (id, card) in self.cards.iter().enumerate() {
            let span = card.nblocks as u64 * per_block;
            if (idx as u64) < base + span {
                let local = idx as u64 - base;
                let block_id = (local / per_block) as u32;
                let ordinal = (local % per_block) as u8;
                let (i, j) = coefficient_at(ordinal, self.radius)
                    .expect("ordinal is below the per-block count");
                return Ok(Position {
                    component: id as u8,
                    m: block_id / card.wbl,
                    n: block_id % card.wbl,
                    i,
                    j,
                });
            }
            base += span;
        }
        Err(StegError::DataTooLong)
    }
}
