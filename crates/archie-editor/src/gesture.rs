//! Pointer gesture state machine.
//!
//! A gesture starts on pointer-down, streams preview frames into the
//! history on every move, and ends exactly once: committed on pointer-up,
//! discarded on cancel. Only one gesture is active at a time.

use crate::input::Modifiers;
use crate::mutation::{DocMutation, translate};
use crate::session::EditorSession;
use archie_core::{Bounds, Container, ContainerKind, Document, EntityId, EntityKind, EntityRef, InteractionMode, Link, Node};
use archie_render::kurbo::Point;
use archie_render::{Corner, SceneTree, hit_test, hit_test_handle, hit_test_rect};

/// Hit slop around thin shapes, screen pixels.
pub const HIT_TOLERANCE_PX: f32 = 4.0;

#[derive(Debug, Clone)]
pub(crate) enum Gesture {
    /// Moving the selection. Frames are `base` translated by the pointer
    /// delta, so the result never depends on how many moves arrived.
    Drag {
        base: Document,
        targets: Vec<EntityRef>,
        origin: (f32, f32),
        press: (f32, f32),
        pressed: EntityRef,
        toggled: bool,
        moved: bool,
    },
    Resize {
        node: EntityId,
        corner: Corner,
        /// Node geometry at press time: center and size.
        start: (f32, f32, f32, f32),
        origin: (f32, f32),
        press: (f32, f32),
        moved: bool,
    },
    Pan {
        last: (f32, f32),
        press: (f32, f32),
        moved: bool,
    },
    Marquee {
        origin: (f32, f32),
        current: (f32, f32),
        press: (f32, f32),
        additive: bool,
        moved: bool,
    },
}

impl Gesture {
    /// The rubber-band rectangle in document space, once it has moved.
    pub(crate) fn marquee_rect(&self) -> Option<Bounds> {
        match self {
            Gesture::Marquee {
                origin,
                current,
                moved: true,
                ..
            } => Some(Bounds::from_corners(origin.0, origin.1, current.0, current.1)),
            _ => None,
        }
    }
}

/// Keep only the dominant axis of a delta.
pub fn constrain_to_axis(dx: f32, dy: f32) -> (f32, f32) {
    if dx.abs() >= dy.abs() { (dx, 0.0) } else { (0.0, dy) }
}

/// New `(x, y, width, height)` of a center-anchored node after dragging
/// `corner` by `(dx, dy)`. The opposite corner stays fixed and the size
/// never drops below `min`.
pub fn resize_geometry(
    start: (f32, f32, f32, f32),
    corner: Corner,
    dx: f32,
    dy: f32,
    min: (f32, f32),
) -> (f32, f32, f32, f32) {
    let (x, y, w, h) = start;
    let (sx, sy) = corner.sign();
    let width = (w + sx * dx).max(min.0);
    let height = (h + sy * dy).max(min.1);
    (x + sx * (width - w) / 2.0, y + sy * (height - h) / 2.0, width, height)
}

fn travel(a: (f32, f32), b: (f32, f32)) -> f32 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

impl EditorSession {
    fn document_point(&self, sx: f32, sy: f32) -> (f32, f32) {
        self.transform.to_document(sx, sy)
    }

    fn hit_at(&self, scene: &SceneTree, p: (f32, f32)) -> Option<EntityRef> {
        let tolerance = (HIT_TOLERANCE_PX / self.transform.scale) as f64;
        hit_test(scene, Point::new(p.0 as f64, p.1 as f64), tolerance)
    }

    /// Returns whether a redraw is needed.
    pub fn pointer_down(&mut self, sx: f32, sy: f32, modifiers: Modifiers) -> bool {
        self.finish_gesture();
        self.animation = None;
        let p = self.document_point(sx, sy);

        match self.mode {
            InteractionMode::Select | InteractionMode::Pan => self.press_select(sx, sy, p, modifiers),
            InteractionMode::Connect => self.press_connect(p),
            InteractionMode::AddNode => {
                let (w, h) = self.config.default_node_size;
                let id = self.document().fresh_id("node");
                let node = Node::new(id, "New node", p.0, p.1, w, h);
                self.place(DocMutation::AddNode(Box::new(node)), EntityRef::node(id))
            }
            InteractionMode::AddContainer => {
                let (w, h) = self.config.default_container_size;
                let id = self.document().fresh_id("container");
                let container = Container::new(id, "New container", ContainerKind::Region, Bounds::new(p.0, p.1, w, h));
                self.place(DocMutation::AddContainer(Box::new(container)), EntityRef::container(id))
            }
        }
    }

    /// Commit a newly created entity, select it, and go back to select mode.
    fn place(&mut self, mutation: DocMutation, created: EntityRef) -> bool {
        if self.commit(mutation) {
            self.selection.replace(created);
            self.resizing = None;
            log::debug!("placed {:?} {}", created.kind, created.id);
        }
        self.mode = InteractionMode::Select;
        true
    }

    fn press_select(&mut self, sx: f32, sy: f32, p: (f32, f32), modifiers: Modifiers) -> bool {
        let scene = self.scene();
        let point = Point::new(p.0 as f64, p.1 as f64);
        let handle = hit_test_handle(&scene, point).and_then(|(id, corner)| {
            let node = self.document().node(id).filter(|n| !n.locked)?;
            Some((id, corner, (node.x, node.y, node.width, node.height)))
        });
        if let Some((node, corner, start)) = handle {
            self.gesture = Some(Gesture::Resize {
                node,
                corner,
                start,
                origin: p,
                press: (sx, sy),
                moved: false,
            });
            return true;
        }

        match self.hit_at(&scene, p) {
            Some(entity) => {
                let toggled = modifiers.shift;
                if toggled {
                    let added = self.selection.toggle(entity);
                    self.sync_resizing();
                    if !added {
                        return true;
                    }
                } else if !self.selection.contains(entity.id) {
                    self.selection.replace(entity);
                    self.sync_resizing();
                }
                self.gesture = Some(Gesture::Drag {
                    base: self.document().clone(),
                    targets: self.selection.as_slice().to_vec(),
                    origin: p,
                    press: (sx, sy),
                    pressed: entity,
                    toggled,
                    moved: false,
                });
            }
            None if self.mode == InteractionMode::Pan => {
                self.gesture = Some(Gesture::Pan {
                    last: (sx, sy),
                    press: (sx, sy),
                    moved: false,
                });
            }
            None => {
                self.gesture = Some(Gesture::Marquee {
                    origin: p,
                    current: p,
                    press: (sx, sy),
                    additive: modifiers.shift,
                    moved: false,
                });
            }
        }
        true
    }

    fn press_connect(&mut self, p: (f32, f32)) -> bool {
        let hit = self.hit_at(&self.scene(), p).filter(|e| e.kind == EntityKind::Node).map(|e| e.id);
        match (hit, self.connect_source) {
            (Some(node), None) => {
                log::debug!("connect source {node}");
                self.connect_source = Some(node);
            }
            (Some(node), Some(source)) if node == source => {}
            (Some(target), Some(source)) => {
                let id = self.document().fresh_id("link");
                let link = Link::new(id, source, target);
                self.connect_source = None;
                return self.place(DocMutation::AddLink(Box::new(link)), EntityRef::link(id));
            }
            (None, _) => self.connect_source = None,
        }
        true
    }

    pub fn pointer_move(&mut self, sx: f32, sy: f32, modifiers: Modifiers) -> bool {
        let p = self.transform.to_document(sx, sy);
        let tolerance = self.config.click_tolerance_px;
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };

        match gesture {
            Gesture::Drag {
                base,
                targets,
                origin,
                press,
                moved,
                ..
            } => {
                if !*moved && travel(*press, (sx, sy)) <= tolerance {
                    return false;
                }
                *moved = true;
                let (mut dx, mut dy) = (p.0 - origin.0, p.1 - origin.1);
                if modifiers.shift {
                    (dx, dy) = constrain_to_axis(dx, dy);
                }
                let mut frame = base.clone();
                translate(&mut frame, targets.as_slice(), dx, dy);
                self.history.apply(frame, true);
            }
            Gesture::Resize {
                node,
                corner,
                start,
                origin,
                press,
                moved,
            } => {
                if !*moved && travel(*press, (sx, sy)) <= tolerance {
                    return false;
                }
                *moved = true;
                let (x, y, width, height) =
                    resize_geometry(*start, *corner, p.0 - origin.0, p.1 - origin.1, self.config.min_node_size);
                let mut frame = self.history.current().clone();
                DocMutation::SetNodeGeometry {
                    id: *node,
                    x,
                    y,
                    width,
                    height,
                }
                .apply(&mut frame);
                self.history.apply(frame, true);
            }
            Gesture::Pan { last, press, moved } => {
                self.transform = self.transform.panned(sx - last.0, sy - last.1);
                self.animation = None;
                *last = (sx, sy);
                if !*moved && travel(*press, (sx, sy)) > tolerance {
                    *moved = true;
                }
            }
            Gesture::Marquee {
                current,
                press,
                moved,
                ..
            } => {
                *current = p;
                if !*moved && travel(*press, (sx, sy)) > tolerance {
                    *moved = true;
                }
            }
        }
        true
    }

    pub fn pointer_up(&mut self, sx: f32, sy: f32, modifiers: Modifiers) -> bool {
        if self.gesture.is_none() {
            return false;
        }
        self.pointer_move(sx, sy, modifiers);
        if let Some(gesture) = self.gesture.take() {
            self.end_gesture(gesture);
        }
        true
    }

    /// Abandon the active gesture, restoring the pre-gesture document.
    pub fn pointer_cancel(&mut self) -> bool {
        self.abort_gesture()
    }

    /// Wheel or trackpad. `zoom` other than 1 zooms about the pointer;
    /// otherwise the deltas pan.
    pub fn wheel(&mut self, sx: f32, sy: f32, dx: f32, dy: f32, zoom: f32) -> bool {
        self.animation = None;
        self.transform = if (zoom - 1.0).abs() > f32::EPSILON {
            self.transform.zoomed_at(sx, sy, zoom)
        } else {
            self.transform.panned(-dx, -dy)
        };
        true
    }

    /// End the active gesture as if the pointer were released where it
    /// last was.
    pub(crate) fn finish_gesture(&mut self) {
        if let Some(gesture) = self.gesture.take() {
            self.end_gesture(gesture);
        }
    }

    pub(crate) fn abort_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if matches!(gesture, Gesture::Drag { .. } | Gesture::Resize { .. }) {
            self.history.discard_preview();
        }
        log::debug!("gesture cancelled");
        true
    }

    fn end_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Drag {
                moved: true, ..
            }
            | Gesture::Resize {
                moved: true, ..
            } => {
                if self.history.commit_preview() {
                    log::debug!("gesture committed, {} history entries", self.history.len());
                }
                self.after_commit();
            }
            Gesture::Drag {
                pressed, toggled, ..
            } => {
                self.history.discard_preview();
                if !toggled {
                    self.selection.replace(pressed);
                    self.sync_resizing();
                }
            }
            Gesture::Resize { .. } => {
                self.history.discard_preview();
            }
            Gesture::Pan { moved, .. } => {
                if !moved {
                    self.selection.clear();
                    self.sync_resizing();
                }
            }
            Gesture::Marquee {
                origin,
                current,
                additive,
                moved,
                ..
            } => {
                if moved {
                    let rect = Bounds::from_corners(origin.0, origin.1, current.0, current.1);
                    let hits = hit_test_rect(&self.scene(), rect);
                    if additive {
                        self.selection.extend(hits);
                    } else {
                        self.selection.replace_all(hits);
                    }
                } else if !additive {
                    self.selection.clear();
                }
                self.sync_resizing();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_constraint_keeps_dominant_delta() {
        assert_eq!(constrain_to_axis(10.0, -3.0), (10.0, 0.0));
        assert_eq!(constrain_to_axis(2.0, -7.0), (0.0, -7.0));
    }

    #[test]
    fn resize_keeps_opposite_corner_fixed() {
        let start = (100.0, 100.0, 100.0, 60.0);
        let (x, y, w, h) = resize_geometry(start, Corner::BottomRight, 20.0, 10.0, (40.0, 30.0));
        assert_eq!((w, h), (120.0, 70.0));
        assert_eq!((x - w / 2.0, y - h / 2.0), (50.0, 70.0));

        let (x, y, w, h) = resize_geometry(start, Corner::TopLeft, -20.0, -10.0, (40.0, 30.0));
        assert_eq!((w, h), (120.0, 70.0));
        assert_eq!((x + w / 2.0, y + h / 2.0), (150.0, 130.0));
    }

    #[test]
    fn resize_respects_minimum() {
        let (x, _, w, _) = resize_geometry((0.0, 0.0, 100.0, 60.0), Corner::BottomRight, -500.0, 0.0, (40.0, 30.0));
        assert_eq!(w, 40.0);
        assert_eq!(x - w / 2.0, -50.0);
    }
}
