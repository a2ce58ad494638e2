use std::ops::{Add, AddAssign, Mul, Neg, Sub};

// --- Scalar helpers ---

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Deterministic hash of two scalars into [0, 1).
///
/// Shader-style fract(sin(...)) hash: reproducible across runs, no clock or
/// global RNG involved, which keeps confetti selection and tests stable.
pub fn hash01(a: f32, b: f32) -> f32 {
    let s = (a * 12.9898 + b * 78.233).sin() * 43758.547;
    s - s.floor()
}

// --- Vec2 ---

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn normalize(self) -> Vec2 {
        let len_sq = self.length_squared();
        if len_sq < 1e-12 {
            return Vec2::ZERO;
        }
        self * (1.0 / len_sq.sqrt())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

// --- Vec3 ---

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const Y: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Zero-safe: normalizing a (near-)zero vector yields the zero vector.
    pub fn normalize(self) -> Vec3 {
        let len_sq = self.length_squared();
        if len_sq < 1e-12 {
            return Vec3::ZERO;
        }
        self * (1.0 / len_sq.sqrt())
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// --- Mat4 ---

/// Row-major 4x4 matrix. `a.mul(b)` composes so that `b` is applied first
/// when transforming points: `(a * b).transform_point(p) == a * (b * p)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [f32; 16],
}

impl Mat4 {
    pub fn identity() -> Self {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Self { m }
    }

    pub fn translation(offset: Vec3) -> Self {
        let mut out = Self::identity();
        out.m[3] = offset.x;
        out.m[7] = offset.y;
        out.m[11] = offset.z;
        out
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut out = Self::identity();
        out.m[5] = cos;
        out.m[6] = -sin;
        out.m[9] = sin;
        out.m[10] = cos;
        out
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut out = Self::identity();
        out.m[0] = cos;
        out.m[2] = sin;
        out.m[8] = -sin;
        out.m[10] = cos;
        out
    }

    /// Right-handed perspective; view depth maps to NDC z in [-1, 1].
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y * 0.5).tan().max(1e-6);
        let inv_depth = 1.0 / (near - far);
        let mut m = [0.0; 16];
        m[0] = f / aspect.max(1e-6);
        m[5] = f;
        m[10] = (far + near) * inv_depth;
        m[11] = 2.0 * far * near * inv_depth;
        m[14] = -1.0;
        Self { m }
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        let inv_depth = 1.0 / (far - near).max(1e-6);
        let mut m = [0.0; 16];
        m[0] = 2.0 / width.max(1e-6);
        m[5] = 2.0 / height.max(1e-6);
        m[10] = -2.0 * inv_depth;
        m[11] = -(far + near) * inv_depth;
        m[15] = 1.0;
        Self { m }
    }

    /// View matrix looking from `eye` toward `target`. A degenerate
    /// eye-to-target direction falls back to -Z.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut forward = (target - eye).normalize();
        if forward.length_squared() < 1e-12 {
            forward = Vec3::new(0.0, 0.0, -1.0);
        }
        let mut side = forward.cross(up).normalize();
        if side.length_squared() < 1e-12 {
            side = Vec3::new(1.0, 0.0, 0.0);
        }
        let view_up = side.cross(forward);

        let mut m = [0.0; 16];
        m[0] = side.x;
        m[1] = side.y;
        m[2] = side.z;
        m[3] = -side.dot(eye);
        m[4] = view_up.x;
        m[5] = view_up.y;
        m[6] = view_up.z;
        m[7] = -view_up.dot(eye);
        m[8] = -forward.x;
        m[9] = -forward.y;
        m[10] = -forward.z;
        m[11] = forward.dot(eye);
        m[15] = 1.0;
        Self { m }
    }

    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut m = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.m[row * 4 + k] * other.m[k * 4 + col];
                }
                m[row * 4 + col] = sum;
            }
        }
        Mat4 { m }
    }

    /// Transforms a point including the perspective divide. A vanishing
    /// homogeneous w degrades to the zero vector rather than dividing.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let (clip, w) = self.transform_homogeneous(p);
        if w.abs() < 1e-8 {
            return Vec3::ZERO;
        }
        clip * (1.0 / w)
    }

    /// Transform without the divide; returns clip-space xyz and w. The
    /// projector needs the raw w to reject points behind the eye.
    pub fn transform_homogeneous(&self, p: Vec3) -> (Vec3, f32) {
        let m = &self.m;
        let x = m[0] * p.x + m[1] * p.y + m[2] * p.z + m[3];
        let y = m[4] * p.x + m[5] * p.y + m[6] * p.z + m[7];
        let z = m[8] * p.x + m[9] * p.y + m[10] * p.z + m[11];
        let w = m[12] * p.x + m[13] * p.y + m[14] * p.z + m[15];
        (Vec3::new(x, y, z), w)
    }

    /// Transforms a direction: rotation/scale only, translation ignored.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0] * d.x + m[1] * d.y + m[2] * d.z,
            m[4] * d.x + m[5] * d.y + m[6] * d.z,
            m[8] * d.x + m[9] * d.y + m[10] * d.z,
        )
    }
}
