//! Sample vertices and the border tags used to align tiles

use crate::core::types::{Vec2, Vec3};

/// A sampled surface point. Only mutated while a tile is being built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl SampleVertex {
    /// Unsampled vertex; normal defaults to up until the height field is queried
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal: Vec3::Y,
            uv,
        }
    }

    /// Average this vertex with another, attribute by attribute
    pub fn merge(&mut self, other: &SampleVertex) {
        self.position = 0.5 * (self.position + other.position);
        self.normal = 0.5 * (self.normal + other.normal);
        self.uv = 0.5 * (self.uv + other.uv);
    }

    /// Position projected onto the XZ plane
    pub fn xz(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

/// One side of a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

    /// Edge tag running along this side
    pub fn edge(self) -> BorderTag {
        match self {
            Side::Left => BorderTag::Left,
            Side::Right => BorderTag::Right,
            Side::Bottom => BorderTag::Bottom,
            Side::Top => BorderTag::Top,
        }
    }

    /// The two corner tags at the ends of this side
    pub fn corners(self) -> [BorderTag; 2] {
        match self {
            Side::Left => [BorderTag::LeftBottom, BorderTag::LeftTop],
            Side::Right => [BorderTag::RightBottom, BorderTag::RightTop],
            Side::Bottom => [BorderTag::LeftBottom, BorderTag::RightBottom],
            Side::Top => [BorderTag::LeftTop, BorderTag::RightTop],
        }
    }
}

/// Fixed positions on a tile boundary: 4 corners then 4 edges.
///
/// Bottom is -z, top is +z, left is -x, right is +x. The discriminants are the
/// stable codes used in logs and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BorderTag {
    LeftBottom = 0,
    LeftTop = 1,
    RightTop = 2,
    RightBottom = 3,
    Bottom = 4,
    Top = 5,
    Left = 6,
    Right = 7,
}

impl BorderTag {
    pub const ALL: [BorderTag; 8] = [
        BorderTag::LeftBottom,
        BorderTag::LeftTop,
        BorderTag::RightTop,
        BorderTag::RightBottom,
        BorderTag::Bottom,
        BorderTag::Top,
        BorderTag::Left,
        BorderTag::Right,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_corner(self) -> bool {
        self.code() <= BorderTag::RightBottom.code()
    }

    /// Sides a corner sits on, `None` for edge tags
    pub fn corner_sides(self) -> Option<(Side, Side)> {
        match self {
            BorderTag::LeftBottom => Some((Side::Left, Side::Bottom)),
            BorderTag::LeftTop => Some((Side::Left, Side::Top)),
            BorderTag::RightTop => Some((Side::Right, Side::Top)),
            BorderTag::RightBottom => Some((Side::Right, Side::Bottom)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_averages_attributes() {
        let mut a = SampleVertex {
            position: Vec3::new(0.0, 2.0, 0.0),
            normal: Vec3::Y,
            uv: Vec2::ZERO,
        };
        let b = SampleVertex {
            position: Vec3::new(2.0, 4.0, 2.0),
            normal: Vec3::X,
            uv: Vec2::ONE,
        };
        a.merge(&b);
        assert_eq!(a.position, Vec3::new(1.0, 3.0, 1.0));
        assert_eq!(a.normal, Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(a.uv, Vec2::splat(0.5));
    }

    #[test]
    fn test_corner_classification() {
        let corners: Vec<_> = BorderTag::ALL.iter().filter(|t| t.is_corner()).collect();
        assert_eq!(corners.len(), 4);
        assert!(BorderTag::Right.corner_sides().is_none());
        assert_eq!(BorderTag::LeftTop.corner_sides(), Some((Side::Left, Side::Top)));
    }

    #[test]
    fn test_side_corners_are_corners() {
        for side in Side::ALL {
            for corner in side.corners() {
                let (a, b) = corner.corner_sides().unwrap();
                assert!(a == side || b == side);
            }
        }
    }
}
