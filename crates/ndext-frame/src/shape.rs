use std::fmt;

use crate::error::{FrameError, Result};

/// Nesting depth of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    One,
    Two,
    Three,
}

impl Rank {
    /// All supported ranks.
    pub const ALL: [Rank; 3] = [Rank::One, Rank::Two, Rank::Three];

    /// Numeric rank (1, 2 or 3).
    pub const fn get(self) -> usize {
        match self {
            Rank::One => 1,
            Rank::Two => 2,
            Rank::Three => 3,
        }
    }

    /// Build a rank from its numeric value.
    pub const fn from_usize(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Rank::One),
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            _ => None,
        }
    }

    /// Size of the dimension header carried in front of the payload.
    ///
    /// Rank 1 frames carry no header; the element count is implied by the
    /// payload length.
    pub const fn header_len(self) -> usize {
        match self {
            Rank::One => 0,
            Rank::Two => 8,
            Rank::Three => 12,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Per-dimension sizes of a rectangular array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: [u32; 3],
    rank: Rank,
}

impl Shape {
    pub fn rank1(len: u32) -> Self {
        Self {
            dims: [len, 0, 0],
            rank: Rank::One,
        }
    }

    pub fn rank2(rows: u32, cols: u32) -> Self {
        Self {
            dims: [rows, cols, 0],
            rank: Rank::Two,
        }
    }

    pub fn rank3(planes: u32, rows: u32, cols: u32) -> Self {
        Self {
            dims: [planes, rows, cols],
            rank: Rank::Three,
        }
    }

    /// Build a shape from a slice of 1 to 3 sizes.
    pub fn from_dims(dims: &[u32]) -> Option<Self> {
        match *dims {
            [a] => Some(Self::rank1(a)),
            [a, b] => Some(Self::rank2(a, b)),
            [a, b, c] => Some(Self::rank3(a, b, c)),
            _ => None,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The declared sizes, outermost first.
    pub fn dims(&self) -> &[u32] {
        &self.dims[..self.rank.get()]
    }

    /// Total element count, `None` on overflow.
    pub fn element_count(&self) -> Option<usize> {
        self.dims()
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim as usize))
    }

    /// Payload size in bytes for elements of `width` bytes.
    pub fn payload_len(&self, width: usize) -> Result<usize> {
        self.element_count()
            .and_then(|count| count.checked_mul(width))
            .ok_or(FrameError::PayloadTooLarge {
                size: usize::MAX,
                max: u32::MAX as usize,
            })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dims().iter().map(u32::to_string).collect();
        write!(f, "({})", dims.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lengths() {
        assert_eq!(Rank::One.header_len(), 0);
        assert_eq!(Rank::Two.header_len(), 8);
        assert_eq!(Rank::Three.header_len(), 12);
    }

    #[test]
    fn dims_follow_rank() {
        assert_eq!(Shape::rank1(4).dims(), &[4]);
        assert_eq!(Shape::rank2(2, 3).dims(), &[2, 3]);
        assert_eq!(Shape::rank3(2, 0, 5).dims(), &[2, 0, 5]);
    }

    #[test]
    fn element_count_with_zero_dim() {
        assert_eq!(Shape::rank3(2, 0, 5).element_count(), Some(0));
        assert_eq!(Shape::rank2(2, 3).element_count(), Some(6));
    }

    #[test]
    fn from_dims_rejects_bad_rank() {
        assert!(Shape::from_dims(&[]).is_none());
        assert!(Shape::from_dims(&[1, 2, 3, 4]).is_none());
        assert_eq!(Shape::from_dims(&[2, 3]), Some(Shape::rank2(2, 3)));
    }

    #[test]
    fn display_lists_dims() {
        assert_eq!(Shape::rank2(2, 3).to_string(), "(2, 3)");
    }
}
