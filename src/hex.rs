//! Odd-r offset hex coordinates for a pointy-top map.
//!
//! Odd rows are shifted right by half a hex. Distance and pixel math go
//! through axial coordinates; storage and neighbour lookups stay in offset
//! space so the map can be addressed as a plain rectangle.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

const SQRT_3: f32 = 1.732_050_8;

/// Neighbour offsets in NW, NE, E, SE, SW, W order.
const EVEN_ROW_NEIGHBORS: [(i32, i32); 6] = [(-1, -1), (0, -1), (1, 0), (0, 1), (-1, 1), (-1, 0)];
const ODD_ROW_NEIGHBORS: [(i32, i32); 6] = [(0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 0)];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn to_axial(self) -> (i32, i32) {
        (self.q - (self.r - (self.r & 1)) / 2, self.r)
    }

    pub fn from_axial(x: i32, z: i32) -> Self {
        Self::new(x + (z - (z & 1)) / 2, z)
    }

    pub fn distance(self, other: HexCoord) -> u32 {
        let (aq, ar) = self.to_axial();
        let (bq, br) = other.to_axial();
        let dq = aq - bq;
        let dr = ar - br;
        ((dq.abs() + (dq + dr).abs() + dr.abs()) / 2) as u32
    }

    pub fn neighbors(self) -> [HexCoord; 6] {
        let offsets = if self.r & 1 == 1 {
            &ODD_ROW_NEIGHBORS
        } else {
            &EVEN_ROW_NEIGHBORS
        };
        offsets.map(|(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    /// Every coordinate within `radius` steps, centre included.
    pub fn disk(self, radius: i32) -> Vec<HexCoord> {
        let (cx, cz) = self.to_axial();
        let mut out = Vec::new();
        for dx in -radius..=radius {
            let lo = (-radius).max(-dx - radius);
            let hi = radius.min(-dx + radius);
            for dz in lo..=hi {
                out.push(HexCoord::from_axial(cx + dx, cz + dz));
            }
        }
        out
    }

    /// Centre of the hex in world space. World y grows upward, map rows grow downward.
    pub fn to_world(self, size: f32) -> Vec2 {
        let x = size * SQRT_3 * (self.q as f32 + 0.5 * (self.r & 1) as f32);
        let y = size * 1.5 * self.r as f32;
        Vec2::new(x, -y)
    }

    pub fn from_world(pos: Vec2, size: f32) -> HexCoord {
        let y = -pos.y;
        let fx = (SQRT_3 / 3.0 * pos.x - y / 3.0) / size;
        let fz = (2.0 / 3.0 * y) / size;
        let (x, z) = cube_round(fx, fz);
        HexCoord::from_axial(x, z)
    }
}

fn cube_round(fx: f32, fz: f32) -> (i32, i32) {
    let fy = -fx - fz;
    let mut rx = fx.round();
    let ry = fy.round();
    let mut rz = fz.round();
    let dx = (rx - fx).abs();
    let dy = (ry - fy).abs();
    let dz = (rz - fz).abs();
    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy <= dz {
        rz = -rx - ry;
    }
    (rx as i32, rz as i32)
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_are_adjacent_on_both_parities() {
        for origin in [HexCoord::new(4, 4), HexCoord::new(4, 5)] {
            for n in origin.neighbors() {
                assert_eq!(origin.distance(n), 1, "{origin} -> {n}");
            }
        }
    }

    #[test]
    fn test_neighbor_order_odd_row() {
        let n = HexCoord::new(2, 3).neighbors();
        assert_eq!(n[0], HexCoord::new(2, 2)); // NW
        assert_eq!(n[1], HexCoord::new(3, 2)); // NE
        assert_eq!(n[2], HexCoord::new(3, 3)); // E
        assert_eq!(n[5], HexCoord::new(1, 3)); // W
    }

    #[test]
    fn test_distance_across_rows() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance(HexCoord::new(3, 0)), 3);
        assert_eq!(a.distance(HexCoord::new(0, 4)), 4);
        assert_eq!(a.distance(HexCoord::new(2, 4)), 4);
        assert_eq!(HexCoord::new(2, 4).distance(a), 4);
    }

    #[test]
    fn test_disk_size() {
        assert_eq!(HexCoord::new(10, 10).disk(0).len(), 1);
        assert_eq!(HexCoord::new(10, 10).disk(3).len(), 37);
        assert!(HexCoord::new(10, 11)
            .disk(3)
            .iter()
            .all(|c| c.distance(HexCoord::new(10, 11)) <= 3));
    }

    #[test]
    fn test_world_position_maps_back_to_hex() {
        for c in [HexCoord::new(0, 0), HexCoord::new(5, 3), HexCoord::new(7, 8)] {
            let p = c.to_world(24.0);
            assert_eq!(HexCoord::from_world(p, 24.0), c);
            assert_eq!(HexCoord::from_world(p + Vec2::new(6.0, -5.0), 24.0), c);
        }
    }
}
