use crate::math::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    Perspective,
    Orthographic,
}

/// Immutable viewpoint. Drivers (the orbit rig, external animation) produce a
/// fresh `Camera` value per frame rather than mutating one in place.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub projection: ProjectionKind,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov: std::f32::consts::PI / 3.0,
            near: 0.1,
            far: 1000.0,
            projection: ProjectionKind::Perspective,
        }
    }

    pub fn with_projection(mut self, projection: ProjectionKind) -> Self {
        self.projection = projection;
        self
    }

    /// Combined view-projection matrix for the given aspect ratio.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at(self.position, self.target, self.up);
        let proj = match self.projection {
            ProjectionKind::Perspective => {
                Mat4::perspective(self.fov, aspect, self.near, self.far)
            }
            ProjectionKind::Orthographic => {
                // Frame the target: the ortho extent matches what the
                // perspective frustum would cover at the target distance.
                let dist = (self.target - self.position).length().max(self.near);
                let view_height = 2.0 * dist * (self.fov * 0.5).tan();
                Mat4::orthographic(view_height * aspect, view_height, self.near, self.far)
            }
        };
        proj.mul(&view)
    }
}

/// Orbiting camera driver: owns its angle state and emits a new `Camera`
/// each advance; otherwise stateless across frames.
#[derive(Debug, Clone)]
pub struct OrbitRig {
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
    pub speed: f32,
    angle: f32,
}

impl OrbitRig {
    pub fn new(target: Vec3, radius: f32, height: f32) -> Self {
        Self {
            target,
            radius,
            height,
            speed: 0.25,
            angle: 0.0,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn advance(&mut self, dt: f32) -> Camera {
        self.angle += self.speed * dt;
        self.camera()
    }

    pub fn camera(&self) -> Camera {
        let position = Vec3::new(
            self.target.x + self.radius * self.angle.cos(),
            self.target.y + self.height,
            self.target.z + self.radius * self.angle.sin(),
        );
        Camera::new(position, self.target)
    }
}

/// Result of projecting a world point onto the cell grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub x: i32,
    pub y: i32,
    pub depth: f32,
    pub visible: bool,
}

impl Projection {
    const OFFSCREEN: Projection = Projection {
        x: -1,
        y: -1,
        depth: f32::INFINITY,
        visible: false,
    };
}

/// Maps world points to integer cell coordinates plus normalized depth,
/// correcting for terminal cells being roughly twice as tall as wide.
#[derive(Debug, Clone, Copy)]
pub struct ScreenProjector {
    pub width: usize,
    pub height: usize,
    pub cell_aspect: f32,
}

impl ScreenProjector {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cell_aspect: 0.5,
        }
    }

    /// Aspect ratio to feed the camera: the pixel-grid ratio folded with the
    /// width:height ratio of one character cell.
    pub fn aspect(&self) -> f32 {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        w * self.cell_aspect / h
    }

    pub fn project(&self, world: Vec3, camera: &Camera) -> Projection {
        let vp = camera.view_projection(self.aspect());
        self.project_with(&vp, world)
    }

    /// Hot-path variant taking a precomputed view-projection matrix.
    pub fn project_with(&self, view_projection: &Mat4, world: Vec3) -> Projection {
        let (clip, w) = view_projection.transform_homogeneous(world);
        if w < 1e-6 {
            return Projection::OFFSCREEN;
        }
        let inv_w = 1.0 / w;
        let ndc_x = clip.x * inv_w;
        let ndc_y = clip.y * inv_w;
        let ndc_z = clip.z * inv_w;

        let x = ((ndc_x * 0.5 + 0.5) * self.width as f32).floor() as i32;
        let y = ((-ndc_y * 0.5 + 0.5) * self.height as f32).floor() as i32;
        let depth = ndc_z * 0.5 + 0.5;

        let visible = x >= 0
            && (x as usize) < self.width
            && y >= 0
            && (y as usize) < self.height
            && (0.0..=1.0).contains(&depth);

        Projection {
            x,
            y,
            depth,
            visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
    }

    #[test]
    fn target_projects_to_screen_center() {
        let projector = ScreenProjector::new(80, 40);
        let proj = projector.project(Vec3::ZERO, &test_camera());
        assert!(proj.visible);
        assert!((proj.x - 40).abs() <= 1, "x was {}", proj.x);
        assert!((proj.y - 20).abs() <= 1, "y was {}", proj.y);
        assert!(proj.depth > 0.0 && proj.depth < 1.0);
    }

    #[test]
    fn point_behind_camera_is_invisible() {
        let projector = ScreenProjector::new(80, 40);
        let proj = projector.project(Vec3::new(0.0, 0.0, 20.0), &test_camera());
        assert!(!proj.visible);
    }

    #[test]
    fn point_far_off_axis_is_invisible() {
        let projector = ScreenProjector::new(80, 40);
        let proj = projector.project(Vec3::new(500.0, 0.0, 0.0), &test_camera());
        assert!(!proj.visible);
    }

    #[test]
    fn nearer_points_get_smaller_depth() {
        let projector = ScreenProjector::new(80, 40);
        let camera = test_camera();
        let near = projector.project(Vec3::new(0.0, 0.0, 5.0), &camera);
        let far = projector.project(Vec3::new(0.0, 0.0, -5.0), &camera);
        assert!(near.visible && far.visible);
        assert!(near.depth < far.depth);
    }

    #[test]
    fn cell_aspect_makes_offsets_optically_symmetric() {
        // An 80x40 grid of 0.5-aspect cells is optically square, so equal
        // world x and y offsets must cover equal optical distance: the x
        // offset in cells, scaled by the cell aspect, matches the y offset.
        let projector = ScreenProjector::new(80, 40);
        let camera = test_camera();
        let px = projector.project(Vec3::new(2.0, 0.0, 0.0), &camera);
        let py = projector.project(Vec3::new(0.0, 2.0, 0.0), &camera);
        assert!(px.visible && py.visible);
        let dx = (px.x - 40).abs() as f32 * projector.cell_aspect;
        let dy = (py.y - 20).abs() as f32;
        assert!(
            (dx - dy).abs() <= 1.0,
            "expected optically symmetric offsets, got dx={} dy={}",
            dx,
            dy
        );
    }

    #[test]
    fn orthographic_projection_is_depth_independent_in_xy() {
        let camera = test_camera().with_projection(ProjectionKind::Orthographic);
        let projector = ScreenProjector::new(80, 40);
        let a = projector.project(Vec3::new(1.0, 1.0, 2.0), &camera);
        let b = projector.project(Vec3::new(1.0, 1.0, -2.0), &camera);
        assert!(a.visible && b.visible);
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
        assert!(a.depth < b.depth);
    }

    #[test]
    fn orbit_rig_keeps_radius_and_looks_at_target() {
        let target = Vec3::new(10.0, 0.0, 7.5);
        let mut rig = OrbitRig::new(target, 12.0, 6.0);
        for _ in 0..10 {
            let camera = rig.advance(0.1);
            let flat = Vec3::new(
                camera.position.x - target.x,
                0.0,
                camera.position.z - target.z,
            );
            assert!((flat.length() - 12.0).abs() < 1e-4);
            assert_eq!(camera.target, target);
            assert!((camera.position.y - 6.0).abs() < 1e-6);
        }
        assert!(rig.angle() > 0.0);
    }

    #[test]
    fn projection_is_pure() {
        let projector = ScreenProjector::new(64, 32);
        let camera = test_camera();
        let p = Vec3::new(1.3, -0.4, 2.2);
        assert_eq!(projector.project(p, &camera), projector.project(p, &camera));
    }
}
