//! 2D affine transforms for track composition.

use serde::{Deserialize, Serialize};

/// Column-major 2x3 affine: `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Translate * rotate * scale. `rotation_deg` is in degrees.
    pub fn from_parts(x: f32, y: f32, scale_x: f32, scale_y: f32, rotation_deg: f32) -> Self {
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        Self {
            a: cos * scale_x,
            b: sin * scale_x,
            c: -sin * scale_y,
            d: cos * scale_y,
            tx: x,
            ty: y,
        }
    }

    /// `self ∘ child`: apply `child` first, then `self`.
    pub fn then(&self, child: &Affine2) -> Affine2 {
        Affine2 {
            a: self.a * child.a + self.c * child.b,
            b: self.b * child.a + self.d * child.b,
            c: self.a * child.c + self.c * child.d,
            d: self.b * child.c + self.d * child.d,
            tx: self.a * child.tx + self.c * child.ty + self.tx,
            ty: self.b * child.tx + self.d * child.ty + self.ty,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    #[inline]
    pub fn translation(&self) -> (f32, f32) {
        (self.tx, self.ty)
    }
}

impl std::ops::Mul for Affine2 {
    type Output = Affine2;

    fn mul(self, rhs: Affine2) -> Affine2 {
        self.then(&rhs)
    }
}
