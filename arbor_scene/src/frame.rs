// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame culling, label placement, hydration requests, and picking.

use core::cell::OnceCell;

use arbor_chunk::NodePath;
use arbor_index::{CellGrid, CellKey, Index, UniformGrid};
use arbor_view::{Camera, LabelSettings, Projection, Settings};
use hashbrown::HashSet;
use kurbo::{Circle, Point, Rect, Shape, Size};

use crate::scene::Scene;
use crate::types::{DetailLevel, EntryFlags, SceneNodeId};

/// Cell size of the pick index, in pixels.
const PICK_CELL_PX: f64 = 64.0;

/// One visible node, projected.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameEntry {
    /// The node.
    pub id: SceneNodeId,
    /// Screen-space circle.
    pub circle: Circle,
    /// Distance from the root.
    pub depth: u32,
    /// Stub, leaf, labelled.
    pub flags: EntryFlags,
    /// How much to draw.
    pub detail: DetailLevel,
}

/// A placed label.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    /// Index into [`Frame::entries`].
    pub entry: usize,
    /// Where the label is centred, in pixels.
    pub anchor: Point,
    /// Effective font size.
    pub font_px: f64,
    /// The label-grid cell the anchor falls in.
    pub cell: CellKey,
}

/// A visible stub the caller should hydrate.
#[derive(Clone, Debug, PartialEq)]
pub struct HydrationRequest {
    /// Root path of the stub.
    pub path: NodePath,
    /// Chunk holding its subtree.
    pub chunk_ref: String,
    /// Screen radius, used for priority.
    pub radius_px: f64,
}

/// What a frame was computed for. Equal keys mean equal frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameKey {
    /// Scene epoch.
    pub epoch: u32,
    /// Camera.
    pub camera: Camera,
    /// Viewport size.
    pub viewport: Size,
}

/// Counters from one cull.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes whose circles were tested.
    pub visited: usize,
    /// Subtrees dropped for missing the padded viewport.
    pub offscreen: usize,
    /// Subtrees dropped for being below the minimum radius.
    pub too_small: usize,
    /// Visible stubs beyond the per-frame request limit.
    pub deferred_requests: usize,
}

/// The visible subset of a scene under one camera.
///
/// Immutable once built. The pick index is built on first use and lives as
/// long as the frame; a frame whose [`key`](Self::key) no longer matches the
/// scene and camera is stale and should be replaced, which
/// [`Scene::is_current`] checks.
#[derive(Debug)]
pub struct Frame {
    key: FrameKey,
    padded: Rect,
    entries: Vec<FrameEntry>,
    labels: Vec<Label>,
    requests: Vec<HydrationRequest>,
    stats: FrameStats,
    pick_index: OnceCell<Index<u32, UniformGrid>>,
}

impl Frame {
    /// What the frame was computed for.
    pub fn key(&self) -> FrameKey {
        self.key
    }

    /// The padded viewport used for culling, in pixels.
    pub fn padded_viewport(&self) -> Rect {
        self.padded
    }

    /// Visible nodes, parents before children.
    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    /// Placed labels, largest node first.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Visible stubs to hydrate, largest first.
    pub fn requests(&self) -> &[HydrationRequest] {
        &self.requests
    }

    /// Counters.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    fn pick_index(&self) -> &Index<u32, UniformGrid> {
        self.pick_index.get_or_init(|| {
            let mut index = Index::with_uniform_grid(PICK_CELL_PX);
            index.reserve(self.entries.len());
            for (i, e) in self.entries.iter().enumerate() {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Frame entries are bounded by the scene's 32-bit slots."
                )]
                index.insert(e.circle.bounding_box(), i as u32);
            }
            index
        })
    }

    /// The innermost visible node whose circle contains `pt`.
    ///
    /// Nested circles all contain a point inside a child, so the smallest
    /// containing circle wins; equal radii go to the nearer centre.
    pub fn pick(&self, pt: Point) -> Option<&FrameEntry> {
        self.pick_index()
            .query_point(pt)
            .map(|(_, i)| &self.entries[i as usize])
            .filter(|e| (pt - e.circle.center).hypot() <= e.circle.radius)
            .min_by(|a, b| {
                let da = (pt - a.circle.center).hypot();
                let db = (pt - b.circle.center).hypot();
                a.circle
                    .radius
                    .total_cmp(&b.circle.radius)
                    .then(da.total_cmp(&db))
            })
    }
}

/// Whether a circle and a rectangle share a point.
pub(crate) fn circle_meets_rect(c: Circle, r: Rect) -> bool {
    let nearest = Point::new(c.center.x.clamp(r.x0, r.x1), c.center.y.clamp(r.y0, r.y1));
    (c.center - nearest).hypot2() <= c.radius * c.radius
}

impl Scene {
    /// Whether `frame` still describes this scene under `camera` and `viewport`.
    pub fn is_current(&self, frame: &Frame, camera: Camera, viewport: Size) -> bool {
        frame.key
            == FrameKey {
                epoch: self.epoch(),
                camera,
                viewport,
            }
    }

    /// Compute the visible subset for `camera` on a `viewport`-sized surface.
    ///
    /// A subtree is skipped when its circle misses the padded viewport or is
    /// smaller than the minimum radius; children nest strictly inside their
    /// parents, so nothing below a skipped node could have been visible.
    pub fn cull(&self, camera: Camera, viewport: Size, settings: &Settings) -> Frame {
        let projection = Projection::new(viewport);
        let padded =
            projection.padded_viewport(settings.cull.pad_fraction, settings.cull.vertical_pad_px);
        let min_radius = settings.cull.min_node_radius_px;
        let mut stats = FrameStats::default();
        let mut entries = Vec::new();
        let mut stubs = Vec::new();

        let mut stack: Vec<usize> = if self.is_empty() { vec![] } else { vec![0] };
        while let Some(slot) = stack.pop() {
            stats.visited += 1;
            let node = self.slot(slot);
            let circle = projection.circle_to_screen(camera, node.circle());
            if !circle_meets_rect(circle, padded) {
                stats.offscreen += 1;
                continue;
            }
            if circle.radius < min_radius {
                stats.too_small += 1;
                continue;
            }
            let mut flags = EntryFlags::empty();
            if node.is_stub() {
                flags |= EntryFlags::STUB;
                stubs.push((slot, circle.radius));
            } else if node.is_leaf() {
                flags |= EntryFlags::LEAF;
            }
            entries.push(FrameEntry {
                id: self.id(slot),
                circle,
                depth: node.depth(),
                flags,
                detail: DetailLevel::from_screen_radius(circle.radius, false),
            });
            stack.extend(self.child_slots(slot).rev());
        }

        let labels = place_labels(&mut entries, &settings.labels);

        stubs.sort_by(|a, b| b.1.total_cmp(&a.1));
        let limit = settings.cull.max_requests_per_frame;
        stats.deferred_requests = stubs.len().saturating_sub(limit);
        let requests = stubs
            .into_iter()
            .take(limit)
            .filter_map(|(slot, radius_px)| {
                Some(HydrationRequest {
                    path: self.path_of_slot(slot),
                    chunk_ref: self.slot(slot).chunk_ref()?.to_owned(),
                    radius_px,
                })
            })
            .collect();

        tracing::trace!(
            entries = entries.len(),
            labels = labels.len(),
            visited = stats.visited,
            "culled frame"
        );
        Frame {
            key: FrameKey {
                epoch: self.epoch(),
                camera,
                viewport,
            },
            padded,
            entries,
            labels,
            requests,
            stats,
            pick_index: OnceCell::new(),
        }
    }
}

/// Accept labels largest first; a candidate needs its label-grid cell and the
/// eight around it free of accepted labels.
fn place_labels(entries: &mut [FrameEntry], settings: &LabelSettings) -> Vec<Label> {
    let mut candidates: Vec<(usize, f64)> = entries
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            let font_px = settings.font_px(e.circle.radius);
            (e.circle.radius >= settings.min_radius_px && font_px >= settings.min_font_px)
                .then_some((i, font_px))
        })
        .collect();
    candidates.sort_by(|a, b| {
        entries[b.0]
            .circle
            .radius
            .total_cmp(&entries[a.0].circle.radius)
            .then(a.0.cmp(&b.0))
    });

    let grid = CellGrid::new(settings.cell_px);
    let mut taken: HashSet<CellKey> = HashSet::new();
    let mut labels = Vec::new();
    for (i, font_px) in candidates {
        let anchor = entries[i].circle.center;
        let cell = grid.cell_of(anchor);
        if CellGrid::neighbourhood(cell)
            .iter()
            .any(|k| taken.contains(k))
        {
            continue;
        }
        taken.insert(cell);
        entries[i].flags |= EntryFlags::LABELED;
        entries[i].detail = DetailLevel::Labeled;
        labels.push(Label {
            entry: i,
            anchor,
            font_px,
            cell,
        });
    }
    labels
}
