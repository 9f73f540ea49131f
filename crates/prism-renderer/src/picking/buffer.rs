//! Picking buffer contents.

use crate::scene::PickingGranularity;

/// One pixel of the picking buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickTexel {
    /// Render object index.
    pub ro: i32,
    /// Nearest vertex.
    pub vertex: i32,
    /// Triangle.
    pub element: i32,
    /// Vertex opposite the nearest edge.
    pub edge: i32,
}

impl PickTexel {
    /// Value of pixels not covered by any object.
    pub const BACKGROUND: PickTexel = PickTexel {
        ro: -1,
        vertex: -1,
        element: -1,
        edge: -1,
    };

    /// True for the background value.
    pub fn is_background(&self) -> bool {
        self.ro < 0
    }

    /// Encode a fragment of triangle `triangle` with corner vertex indices
    /// `corners` and barycentric coordinates `bary`.
    ///
    /// The nearest vertex is the corner with the largest coordinate, the
    /// nearest edge is the one opposite the smallest coordinate. Ties go to
    /// the lower corner. The picking shader applies the same rules.
    pub fn encode(
        granularity: PickingGranularity,
        ro: i32,
        triangle: u32,
        corners: [u32; 3],
        bary: [f32; 3],
    ) -> PickTexel {
        let nearest = corners[nearest_corner(bary)] as i32;
        match granularity {
            PickingGranularity::Object => PickTexel {
                ro,
                ..Self::BACKGROUND
            },
            PickingGranularity::Vertex => PickTexel {
                ro,
                vertex: nearest,
                ..Self::BACKGROUND
            },
            PickingGranularity::Edge => PickTexel {
                ro,
                vertex: nearest,
                element: triangle as i32,
                edge: corners[farthest_corner(bary)] as i32,
            },
            PickingGranularity::Triangle => PickTexel {
                ro,
                vertex: nearest,
                element: triangle as i32,
                edge: -1,
            },
        }
    }

    pub(crate) fn from_array(v: [i32; 4]) -> Self {
        PickTexel {
            ro: v[0],
            vertex: v[1],
            element: v[2],
            edge: v[3],
        }
    }
}

/// Index of the largest coordinate, lowest index on ties.
fn nearest_corner([a, b, c]: [f32; 3]) -> usize {
    if a >= b && a >= c {
        0
    } else if b >= c {
        1
    } else {
        2
    }
}

/// Index of the smallest coordinate, lowest index on ties.
fn farthest_corner([a, b, c]: [f32; 3]) -> usize {
    if a <= b && a <= c {
        0
    } else if b <= c {
        1
    } else {
        2
    }
}

/// Read-back picking buffer. Row 0 is the bottom row of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct PickBuffer {
    width: u32,
    height: u32,
    texels: Vec<PickTexel>,
}

impl PickBuffer {
    /// Buffer filled with [`PickTexel::BACKGROUND`].
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![PickTexel::BACKGROUND; width as usize * height as usize],
        }
    }

    /// Build from rows ordered top to bottom, as GPU readbacks deliver them.
    pub fn from_top_down_rows(width: u32, height: u32, rows: Vec<PickTexel>) -> Self {
        debug_assert_eq!(rows.len(), width as usize * height as usize);
        let texels = rows
            .chunks_exact(width.max(1) as usize)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self {
            width,
            height,
            texels,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel at pixel `(x, y)` from the bottom-left corner; background outside.
    pub fn texel(&self, x: i64, y: i64) -> PickTexel {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return PickTexel::BACKGROUND;
        }
        self.texels[(y * self.width as i64 + x) as usize]
    }

    /// Overwrite a texel; out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, texel: PickTexel) {
        if x < self.width && y < self.height {
            self.texels[(y * self.width + x) as usize] = texel;
        }
    }

    /// Reset every texel to background.
    pub fn clear(&mut self) {
        self.texels.fill(PickTexel::BACKGROUND);
    }
}
