use crate::math::{clamp01, Vec3};

/// Blinn-Phong shading against a single fixed light direction.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceLighting {
    light_dir: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl SurfaceLighting {
    /// The light direction is normalized once here; a zero vector falls back
    /// to straight overhead.
    pub fn new(light_dir: Vec3, ambient: f32, diffuse: f32, specular: f32, shininess: f32) -> Self {
        let mut dir = light_dir.normalize();
        if dir.length_squared() < 1e-12 {
            dir = Vec3::Y;
        }
        Self {
            light_dir: dir,
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    pub fn light_dir(&self) -> Vec3 {
        self.light_dir
    }

    /// Luminance in [0, 1] for a surface normal and view direction.
    pub fn luminance(&self, normal: Vec3, view_dir: Vec3) -> f32 {
        let n_dot_l = normal.dot(self.light_dir).max(0.0);
        let half = (self.light_dir + view_dir).normalize();
        let n_dot_h = normal.dot(half).max(0.0);
        clamp01(self.ambient + self.diffuse * n_dot_l + self.specular * n_dot_h.powf(self.shininess))
    }
}

impl Default for SurfaceLighting {
    fn default() -> Self {
        Self::new(Vec3::new(0.4, 1.0, 0.3), 0.18, 0.62, 0.35, 16.0)
    }
}
