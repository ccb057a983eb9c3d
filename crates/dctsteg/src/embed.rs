//! Randomised-LSB read and write on a single coefficient.
//!
//! Plain LSB replacement never moves a coefficient whose low bit already
//! matches and always moves a mismatching one in a fixed direction, which
//! makes the embedding detectable. Here a mismatching coefficient moves by
//! one in a direction drawn from the entropy source, so the shift and the
//! prior value are statistically independent.

use crate::entropy::BitSource;
use crate::error::Result;

/// Forces the low bit of `coef` to `bit`.
///
/// A matching coefficient is left untouched. Otherwise the coefficient moves
/// by exactly one, in a random direction; at the saturation values of `i16`
/// the direction is flipped inward so the value never leaves the type's
/// range.
pub fn embed_bit(coef: &mut i16, bit: bool, entropy: &mut impl BitSource) -> Result<()> {
    let lsb = *coef & 1 != 0;
    if lsb == bit {
        return Ok(());
    }
    let mut upward = entropy.produce_bit()?;
    if upward && *coef == i16::MAX {
        upward = false;
    }
    if !upward && *coef == i16::MIN {
        upward = true;
    }
    if upward {
        *coef += 1;
    } else {
        *coef -= 1;
    }
    Ok(())
}

/// Reads the embedded bit back.
pub fn extract_bit(coef: i16) -> bool {
    coef & 1 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out a scripted bit sequence, then fails.
    struct Scripted(Vec<bool>);

    impl BitSource for Scripted {
        fn produce_bit(&mut self) -> Result<bool> {
            match self.0.pop() {
                Some(bit) => Ok(bit),
                None => Err(crate::error::StegError::EntropySource),
            }
        }
    }

    #[test]
    fn matching_bit_is_a_no_op() {
        let mut coef = 4i16;
        let mut entropy = Scripted(vec![]);
        embed_bit(&mut coef, false, &mut entropy).unwrap();
        assert_eq!(coef, 4);
    }

    #[test]
    fn mismatch_moves_in_the_drawn_direction() {
        let mut coef = 4i16;
        embed_bit(&mut coef, true, &mut Scripted(vec![true])).unwrap();
        assert_eq!(coef, 5);

        let mut coef = 4i16;
        embed_bit(&mut coef, true, &mut Scripted(vec![false])).unwrap();
        assert_eq!(coef, 3);
    }

    #[test]
    fn saturation_forces_the_direction_inward() {
        let mut coef = i16::MAX;
        embed_bit(&mut coef, false, &mut Scripted(vec![true])).unwrap();
        assert_eq!(coef, 32766);

        let mut coef = i16::MIN;
        embed_bit(&mut coef, true, &mut Scripted(vec![false])).unwrap();
        assert_eq!(coef, -32767);
    }

    #[test]
    fn embedded_bit_is_always_readable() {
        let mut entropy = Scripted(vec![true, false, true, false, true, false, true, false]);
        for start in [-3i16, -2, -1, 0, 1, 2, 3, 100] {
            for bit in [false, true] {
                let mut coef = start;
                embed_bit(&mut coef, bit, &mut entropy).unwrap();
                assert_eq!(extract_bit(coef), bit);
                assert!((coef - start).abs() <= 1);
            }
        }
    }

    #[test]
    fn entropy_failure_propagates() {
        let mut coef = 2i16;
        assert!(embed_bit(&mut coef, true, &mut Scripted(vec![])).is_err());
        assert_eq!(coef, 2);
    }
}
