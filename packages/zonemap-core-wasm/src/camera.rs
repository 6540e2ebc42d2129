use nalgebra::{Isometry3, Perspective3, Point3, Unit, Vector3};

/// A ray with a unit direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub dir: Unit<Vector3<f64>>,
}

impl Ray {
    /// Returns `None` for a zero-length or non-finite direction.
    pub fn new(origin: Point3<f64>, dir: Vector3<f64>) -> Option<Self> {
        if !dir.iter().all(|c| c.is_finite()) {
            return None;
        }
        let dir = Unit::try_new(dir, 1e-12)?;
        Some(Self { origin, dir })
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.dir.into_inner() * t
    }
}

const UP_PARALLEL_EPS: f64 = 1e-9;

/// Perspective camera pose as reported by the host each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    /// Vertical field of view in degrees.
    pub fov_y: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 500.0, 1400.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov_y: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

impl Camera {
    /// Ray from the eye through normalized device coordinates `(x, y)`,
    /// both in [-1, 1] with +y up.
    pub fn ray_from_ndc(&self, x: f64, y: f64) -> Option<Ray> {
        if !(x.is_finite() && y.is_finite()) || !(self.aspect > f64::EPSILON) || !(self.fov_y > 0.0) {
            return None;
        }
        let forward = self.target - self.position;
        if forward.norm() <= f64::EPSILON {
            return None;
        }

        let projection = Perspective3::new(self.aspect, self.fov_y.to_radians(), self.near, self.far);
        let view = Isometry3::look_at_rh(&self.position, &self.target, &self.effective_up(&forward));

        let in_view = projection.unproject_point(&Point3::new(x, y, 0.5));
        let in_world = view.inverse_transform_point(&in_view);
        Ray::new(self.position, in_world - self.position)
    }

    // Looking straight along `up` leaves the view basis undefined
    fn effective_up(&self, forward: &Vector3<f64>) -> Vector3<f64> {
        if forward.cross(&self.up).norm() > UP_PARALLEL_EPS * forward.norm() * self.up.norm() {
            return self.up;
        }
        if forward.dot(&self.up) < 0.0 {
            -Vector3::z()
        } else {
            Vector3::z()
        }
    }
}

/// Interpolation curve for camera pans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Quadratic ease in, ease out.
    Power2InOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Power2InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// "Move the orbit target to `to` over `duration` seconds with `easing`."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPan {
    pub to: Point3<f64>,
    pub duration: f64,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy)]
struct ActivePan {
    from: Point3<f64>,
    pan: CameraPan,
    elapsed: f64,
}

/// Owns the orbit target and advances at most one pan at a time.
#[derive(Debug, Clone)]
pub struct CameraRig {
    target: Point3<f64>,
    active: Option<ActivePan>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

impl CameraRig {
    pub fn new(target: Point3<f64>) -> Self {
        Self {
            target,
            active: None,
        }
    }

    pub fn target(&self) -> Point3<f64> {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Destination of the running pan, if any.
    pub fn destination(&self) -> Option<Point3<f64>> {
        self.active.map(|a| a.pan.to)
    }

    /// Adopt the host's orbit target (the user dragged the controls). Ignored
    /// while a pan is running.
    pub fn sync_target(&mut self, target: Point3<f64>) {
        if self.active.is_none() {
            self.target = target;
        }
    }

    /// Start a pan from the current target. Any running pan is dropped.
    pub fn issue(&mut self, pan: CameraPan) {
        if pan.duration <= 0.0 {
            self.target = pan.to;
            self.active = None;
            return;
        }
        self.active = Some(ActivePan {
            from: self.target,
            pan,
            elapsed: 0.0,
        });
    }

    /// Advance the running pan by `dt` seconds. Returns the new target while
    /// a pan ran during this step.
    pub fn advance(&mut self, dt: f64) -> Option<Point3<f64>> {
        let mut active = self.active?;
        active.elapsed += dt.max(0.0);

        let progress = (active.elapsed / active.pan.duration).min(1.0);
        let eased = active.pan.easing.apply(progress);
        self.target = active.from + (active.pan.to - active.from) * eased;

        if progress >= 1.0 {
            self.target = active.pan.to;
            self.active = None;
        } else {
            self.active = Some(active);
        }
        Some(self.target)
    }
}
