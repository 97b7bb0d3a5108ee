use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

/// Column-major 4x4 matrix.
///
/// Element `(row, col)` lives at index `col * 4 + row`, matching what GL expects
/// when uploaded without transposition.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4(pub [f32; 16]);

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self(m)
    }

    #[inline]
    pub const fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    /// Orthographic projection mapping the box `[left, right] x [bottom, top] x [near, far]`
    /// onto clip space.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fnr = far - near;

        let mut m = Self::IDENTITY;
        m.0[0] = 2.0 / rl;
        m.0[5] = 2.0 / tb;
        m.0[10] = -2.0 / fnr;
        m.0[12] = -(right + left) / rl;
        m.0[13] = -(top + bottom) / tb;
        m.0[14] = -(far + near) / fnr;
        m
    }

    /// Pixel-space projection for a `width` x `height` surface, origin top-left, +Y down.
    pub fn screen(width: f32, height: f32) -> Self {
        Self::orthographic(0.0, width, height, 0.0, -1.0, 1.0)
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[12] = x;
        m.0[13] = y;
        m.0[14] = z;
        m
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[0] = x;
        m.0[5] = y;
        m.0[10] = z;
        m
    }

    /// Counter-clockwise rotation about +Z, in radians.
    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut m = Self::IDENTITY;
        m.0[0] = c;
        m.0[1] = s;
        m.0[4] = -s;
        m.0[5] = c;
        m
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    pub fn transposed(&self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = self.0[col * 4 + row];
            }
        }
        Self(out)
    }

    /// Transforms a point (w = 1), returning the xyz part.
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (row, o) in out.iter_mut().enumerate() {
            *o = self.get(row, 0) * p[0] + self.get(row, 1) * p[1] + self.get(row, 2) * p[2]
                + self.get(row, 3);
        }
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| self.get(row, k) * rhs.get(k, col)).sum();
            }
        }
        Mat4(out)
    }
}
