use nalgebra::Point3;

use crate::camera::Ray;
use crate::feature_registry::{SceneObject, ZoneScene};
use crate::info_panel::InfoPanelAdapter;
use crate::models::{HighlightKind, ObjectId};
use crate::polygon_geometry::Aabb;

const PARALLEL_EPS: f64 = 1e-12;

/// Hover slot: at most one object is hovered at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering(ObjectId),
}

impl HoverState {
    pub fn hovered(self) -> Option<ObjectId> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering(id) => Some(id),
        }
    }
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTransition {
    /// Nothing changed (Idle stayed Idle, or the same object is still hit).
    Unchanged,
    Entered(ObjectId),
    Switched { from: ObjectId, to: ObjectId },
    Left(ObjectId),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub id: ObjectId,
    pub distance: f64,
    pub point: Point3<f64>,
}

/// Per-frame ray picking and the hover state machine.
#[derive(Debug, Clone, Default)]
pub struct PickingEngine;

impl PickingEngine {
    /// Nearest object along the ray.
    ///
    /// Ordering contract: smallest ray parameter wins; on an exact tie the
    /// object registered first wins.
    pub fn pick(&self, objects: &[SceneObject], ray: &Ray) -> Option<PickHit> {
        let mut best: Option<(f64, ObjectId)> = None;

        for object in objects {
            let Some(bounds) = object.bounds else {
                continue;
            };
            let limit = best.map_or(f64::INFINITY, |(t, _)| t);
            if ray_aabb_hit_t(ray, &bounds, limit).is_none() {
                continue;
            }

            let Some(t) = nearest_triangle_hit(object, ray, limit) else {
                continue;
            };
            let closer = match best {
                None => true,
                Some((bt, _)) => t < bt,
            };
            if closer {
                best = Some((t, object.id));
            }
        }

        let (distance, id) = best?;
        Some(PickHit {
            id,
            distance,
            point: ray.at(distance),
        })
    }

    /// Run one cycle: pick along `ray` (a missing ray counts as a miss) and
    /// move the hover slot, updating treatments and the info panel.
    pub fn evaluate(
        &self,
        ray: Option<&Ray>,
        scene: &mut ZoneScene,
        hover: &mut HoverState,
        panel: &mut dyn InfoPanelAdapter,
    ) -> HoverTransition {
        let hit = ray.and_then(|r| self.pick(scene.objects(), r)).map(|h| h.id);

        match (*hover, hit) {
            (HoverState::Idle, None) => HoverTransition::Unchanged,
            (HoverState::Hovering(current), Some(id)) if current == id => {
                HoverTransition::Unchanged
            }
            (HoverState::Idle, Some(id)) => {
                Self::enter(id, scene, hover, panel);
                HoverTransition::Entered(id)
            }
            (HoverState::Hovering(previous), Some(id)) => {
                scene.set_treatment(previous, HighlightKind::Hover, false);
                Self::enter(id, scene, hover, panel);
                HoverTransition::Switched {
                    from: previous,
                    to: id,
                }
            }
            (HoverState::Hovering(previous), None) => {
                scene.set_treatment(previous, HighlightKind::Hover, false);
                *hover = HoverState::Idle;
                panel.clear();
                HoverTransition::Left(previous)
            }
        }
    }

    fn enter(
        id: ObjectId,
        scene: &mut ZoneScene,
        hover: &mut HoverState,
        panel: &mut dyn InfoPanelAdapter,
    ) {
        scene.set_treatment(id, HighlightKind::Hover, true);
        *hover = HoverState::Hovering(id);
        if let Some(object) = scene.get(id) {
            panel.show(&object.record);
        }
    }
}

fn nearest_triangle_hit(object: &SceneObject, ray: &Ray, limit: f64) -> Option<f64> {
    object
        .mesh
        .triangles()
        .filter_map(|[a, b, c]| ray_triangle_hit_t(ray, a, b, c))
        .filter(|t| *t <= limit)
        .min_by(|a, b| a.total_cmp(b))
}

/// Slab test; returns the entry distance (0 when the origin is inside).
fn ray_aabb_hit_t(ray: &Ray, bounds: &Aabb, t_max: f64) -> Option<f64> {
    let mut t_min = 0.0_f64;
    let mut t_max = t_max;

    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.dir[axis];
        let (min, max) = (bounds.min[axis], bounds.max[axis]);

        if d.abs() < PARALLEL_EPS {
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min - o) * inv;
        let mut t2 = (max - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min)
}

/// Moller-Trumbore, both faces count as hits.
fn ray_triangle_hit_t(ray: &Ray, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<f64> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.dir.cross(&edge2);
    let det = edge1.dot(&p);
    if det.abs() < PARALLEL_EPS {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = ray.dir.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(&q) * inv_det;
    (t >= 0.0).then_some(t)
}
