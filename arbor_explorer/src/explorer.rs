// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The explorer: a scene, a camera and a lazy loader driven frame by frame.

use core::time::Duration;
use std::sync::Arc;

use arbor_chunk::{Node, NodePath};
use arbor_loader::{Fetch, LazyLoader, LoadError, LoaderConfig, Progress, Visibility};
use arbor_scene::{Frame, LayoutConfig, Scene, SceneBuilder};
use arbor_view::{Camera, CameraController, Preset, Projection, Settings, SettingsStore};
use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Size, Vec2};
use tokio::task::{JoinError, JoinSet};

use crate::hover::{HoverEvent, HoverState};

/// Everything an [`Explorer`] is configured with.
#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    /// Surface size in pixels.
    pub viewport: Size,
    /// Circle layout.
    pub layout: LayoutConfig,
    /// Loader limits.
    pub loader: LoaderConfig,
    /// Nodes laid out between yields while [`Explorer::open`] builds the
    /// initial scene.
    pub build_slice: usize,
    /// Culling, label and camera settings.
    pub settings: Settings,
}

impl Default for ExplorerConfig {
    /// Takes the settings from [`SettingsStore::global`].
    fn default() -> Self {
        Self {
            viewport: Size::new(1280.0, 800.0),
            layout: LayoutConfig::default(),
            loader: LoaderConfig::default(),
            build_slice: 4096,
            settings: SettingsStore::global().snapshot(),
        }
    }
}

/// Opening a session failed.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// The manifest or the root skeleton could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// What a batch of completed loads changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    /// Stubs hydrated and grafted.
    pub grafted: usize,
    /// Scene nodes added.
    pub nodes: usize,
    /// Loads that failed. Their stubs stay stubs.
    pub failed: Vec<LoadError>,
}

impl Applied {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.grafted == 0 && self.failed.is_empty()
    }
}

type Completion = (NodePath, String, Result<Arc<Node>, LoadError>);

/// One interactive view of a lazily hydrated tree.
///
/// The explorer owns the tree, its [`Scene`] and the camera. Fetches run as
/// tokio tasks; their results are applied on the caller's task by
/// [`apply_completed`](Self::apply_completed) or [`settle`](Self::settle), so
/// the tree is never touched concurrently. A typical loop:
///
/// 1. feed input ([`pointer_move`](Self::pointer_move), [`click`](Self::click),
///    [`zoom_at`](Self::zoom_at), [`pan_by`](Self::pan_by));
/// 2. [`apply_completed`](Self::apply_completed);
/// 3. [`render`](Self::render), which also requests visible stubs.
///
/// A stub whose load failed is not requested again until it leaves the
/// frame's requests and comes back, or is clicked.
#[derive(Debug)]
pub struct Explorer {
    loader: Arc<LazyLoader>,
    root: Node,
    scene: Scene,
    camera: CameraController,
    settings: Settings,
    viewport: Size,
    frame: Option<Frame>,
    pending: JoinSet<Completion>,
    requested: HashMap<String, NodePath>,
    failed: HashMap<String, LoadError>,
    hover: HoverState,
    visibility: Visibility,
}

impl Explorer {
    /// Load the manifest and skeleton through `fetch` and lay out the scene.
    ///
    /// Layout proceeds `build_slice` nodes at a time, yielding between slices
    /// unless `visibility` reports the surface hidden.
    pub async fn open(
        fetch: Arc<dyn Fetch>,
        config: ExplorerConfig,
        visibility: Visibility,
    ) -> Result<Self, ExplorerError> {
        let (loader, root) = LazyLoader::open(fetch, config.loader.clone()).await?;
        let scene = {
            let mut builder = SceneBuilder::new(&root, config.layout);
            while !builder.step(config.build_slice.max(1)) {
                if !visibility.is_hidden() {
                    tokio::task::yield_now().await;
                }
            }
            builder.finish()
        };
        tracing::info!(
            nodes = scene.len(),
            chunks = loader.manifest().total_chunks,
            "explorer opened"
        );
        let mut explorer = Self::with_scene(Arc::new(loader), root, scene, &config);
        explorer.visibility = visibility;
        Ok(explorer)
    }

    /// A session over an already opened loader and its skeleton.
    pub fn new(loader: Arc<LazyLoader>, root: Node, config: &ExplorerConfig) -> Self {
        let scene = Scene::build(&root, config.layout);
        Self::with_scene(loader, root, scene, config)
    }

    fn with_scene(loader: Arc<LazyLoader>, root: Node, scene: Scene, config: &ExplorerConfig) -> Self {
        let settings = config.settings.clone();
        let camera = CameraController::new(Camera::default())
            .with_easing(settings.camera.easing)
            .with_zoom_limits(settings.camera.min_k, settings.camera.max_k);
        let mut explorer = Self {
            loader,
            root,
            scene,
            camera,
            settings,
            viewport: config.viewport,
            frame: None,
            pending: JoinSet::new(),
            requested: HashMap::new(),
            failed: HashMap::new(),
            hover: HoverState::new(),
            visibility: Visibility::new(),
        };
        explorer.camera.jump_to(explorer.home());
        explorer
    }

    /// The camera that fits the whole tree.
    pub fn home(&self) -> Camera {
        self.projection()
            .fit_circle(self.scene.layout().root_circle(), self.settings.camera.fit_margin)
    }

    fn projection(&self) -> Projection {
        Projection::new(self.viewport)
    }

    /// Advance the camera to `now` and return the frame to draw.
    ///
    /// The frame is reused while the scene, the camera and the viewport are
    /// unchanged. A fresh frame requests its visible stubs.
    pub fn render(&mut self, now: Duration) -> &Frame {
        self.camera.tick(now);
        self.current_frame()
    }

    fn current_frame(&mut self) -> &Frame {
        let camera = self.camera.camera();
        let frame = match self.frame.take() {
            Some(frame) if self.scene.is_current(&frame, camera, self.viewport) => frame,
            _ => {
                let frame = self.scene.cull(camera, self.viewport, &self.settings);
                self.issue_requests(&frame);
                frame
            }
        };
        self.frame.insert(frame)
    }

    fn issue_requests(&mut self, frame: &Frame) {
        let wanted: HashSet<&str> = frame
            .requests()
            .iter()
            .map(|r| r.chunk_ref.as_str())
            .collect();
        // A failure is forgotten once its stub drops out of the requests.
        self.failed.retain(|chunk_ref, _| wanted.contains(chunk_ref.as_str()));
        for request in frame.requests() {
            if self.requested.contains_key(&request.chunk_ref)
                || self.failed.contains_key(&request.chunk_ref)
            {
                continue;
            }
            self.spawn_load(request.path.clone(), request.chunk_ref.clone());
        }
    }

    fn spawn_load(&mut self, path: NodePath, chunk_ref: String) {
        tracing::trace!(%path, chunk_ref, "requesting chunk");
        self.requested.insert(chunk_ref.clone(), path.clone());
        let loader = Arc::clone(&self.loader);
        self.pending.spawn(async move {
            let result = loader.load_chunk(&chunk_ref).await;
            (path, chunk_ref, result)
        });
    }

    /// Graft every load that has finished, without waiting.
    pub fn apply_completed(&mut self) -> Applied {
        let mut applied = Applied::default();
        while let Some(joined) = self.pending.try_join_next() {
            self.apply_joined(joined, &mut applied);
        }
        applied
    }

    /// Wait for every outstanding load and graft the results.
    ///
    /// Does not render, so stubs revealed by the grafts are not requested
    /// until the next [`render`](Self::render).
    pub async fn settle(&mut self) -> Applied {
        let mut applied = Applied::default();
        while let Some(joined) = self.pending.join_next().await {
            self.apply_joined(joined, &mut applied);
        }
        applied
    }

    fn apply_joined(&mut self, joined: Result<Completion, JoinError>, applied: &mut Applied) {
        match joined {
            Ok(completion) => self.apply(completion, applied),
            Err(err) => {
                tracing::error!(error = %err, "chunk load task failed");
                // The lost task's ref can no longer be delivered. Dropping a
                // queued one too only costs a shared fetch later.
                let loader = &self.loader;
                self.requested.retain(|chunk_ref, _| loader.is_in_flight(chunk_ref));
            }
        }
    }

    fn apply(&mut self, (path, chunk_ref, result): Completion, applied: &mut Applied) {
        self.requested.remove(&chunk_ref);
        let chunk = match result {
            Ok(chunk) => chunk,
            Err(err) => {
                tracing::warn!(%path, chunk_ref, error = %err.reason, "hydration failed");
                self.failed.insert(chunk_ref, err.clone());
                applied.failed.push(err);
                return;
            }
        };
        self.failed.remove(&chunk_ref);
        let Some(node) = self.root.find_mut(path.segments()) else {
            tracing::warn!(%path, "hydrated path is not in the tree");
            return;
        };
        if !node.is_stub {
            tracing::debug!(%path, "already hydrated");
            return;
        }
        self.loader.merge_into(node, chunk);
        match self.scene.graft(&path, node) {
            Ok(added) => {
                applied.grafted += 1;
                applied.nodes += added;
                self.frame = None;
            }
            Err(err) => tracing::error!(error = %err, "tree and scene disagree"),
        }
    }

    /// The node under a screen point, if any.
    pub fn pick(&mut self, pt: Point) -> Option<NodePath> {
        let id = self.current_frame().pick(pt)?.id;
        self.scene.path_of(id)
    }

    /// Move the pointer to `pt` and report hover transitions.
    pub fn pointer_move(&mut self, pt: Point) -> Vec<HoverEvent> {
        let path = self.pick(pt);
        self.hover.update(path.as_ref())
    }

    /// The pointer left the surface.
    pub fn pointer_leave(&mut self) -> Vec<HoverEvent> {
        self.hover.clear()
    }

    /// Zoom to the node under `pt`.
    ///
    /// A clicked stub is requested right away, even if it failed before.
    /// Returns the clicked node.
    pub fn click(&mut self, pt: Point, now: Duration) -> Option<NodePath> {
        self.camera.tick(now);
        let path = self.pick(pt)?;
        if let Some(chunk_ref) = self
            .scene
            .find(&path)
            .and_then(|id| self.scene.node(id))
            .and_then(|node| node.chunk_ref())
            .map(str::to_owned)
        {
            self.failed.remove(&chunk_ref);
            if !self.requested.contains_key(&chunk_ref) {
                self.spawn_load(path.clone(), chunk_ref);
            }
        }
        self.zoom_to(&path, now);
        Some(path)
    }

    /// Animate to fit the node at `path`. Returns `false` if it is not laid out.
    pub fn zoom_to(&mut self, path: &NodePath, now: Duration) -> bool {
        let Some(node) = self.scene.find(path).and_then(|id| self.scene.node(id)) else {
            return false;
        };
        let target = self
            .projection()
            .fit_circle(node.circle(), self.settings.camera.fit_margin);
        self.camera.animate_to(
            target,
            Duration::from_millis(self.settings.camera.animation_ms),
            now,
        );
        true
    }

    /// Animate back to the whole tree.
    pub fn zoom_home(&mut self, now: Duration) {
        let home = self.home();
        self.camera.animate_to(
            home,
            Duration::from_millis(self.settings.camera.animation_ms),
            now,
        );
    }

    /// Scale by `factor` about a screen point. Stops any animation.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let (min_k, max_k) = self.camera.zoom_limits();
        let camera = self.camera.camera();
        let factor = (camera.k * factor).clamp(min_k, max_k) / camera.k;
        let next = self.projection().zoom_about(camera, anchor, factor);
        self.camera.jump_to(next);
    }

    /// Move by a screen-space drag delta. Stops any animation.
    pub fn pan_by(&mut self, delta: Vec2) {
        let next = self.projection().pan_by(self.camera.camera(), delta);
        self.camera.jump_to(next);
    }

    /// The surface changed size.
    pub fn resize(&mut self, viewport: Size) {
        if viewport != self.viewport {
            tracing::debug!(?viewport, "viewport resized");
            self.viewport = viewport;
            self.frame = None;
        }
    }

    /// Replace the settings. The camera keeps its position.
    pub fn set_settings(&mut self, settings: Settings) {
        self.camera = self
            .camera
            .clone()
            .with_easing(settings.camera.easing)
            .with_zoom_limits(settings.camera.min_k, settings.camera.max_k);
        self.settings = settings;
        self.frame = None;
    }

    /// Switch to a preset's settings.
    pub fn apply_preset(&mut self, preset: Preset) {
        tracing::debug!(?preset, "explorer preset");
        self.set_settings(preset.settings());
    }

    /// Report whether the surface is visible; hidden surfaces skip yields.
    pub fn set_visible(&self, visible: bool) {
        self.visibility.set_hidden(!visible);
    }

    /// The tree as hydrated so far.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The laid-out scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The camera controller.
    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    /// Whether the camera is animating, i.e. another render is due.
    pub fn is_animating(&self) -> bool {
        self.camera.is_animating()
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Surface size.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Loaded against total nodes.
    pub fn progress(&self) -> Progress {
        self.loader.progress()
    }

    /// The loader.
    pub fn loader(&self) -> &Arc<LazyLoader> {
        &self.loader
    }

    /// Loads started and not yet applied.
    pub fn pending_requests(&self) -> usize {
        self.requested.len()
    }

    /// Whether a load of `chunk_ref` is outstanding.
    pub fn is_requested(&self, chunk_ref: &str) -> bool {
        self.requested.contains_key(chunk_ref)
    }

    /// The last failure for `chunk_ref`, if it has not been retried since.
    pub fn failure(&self, chunk_ref: &str) -> Option<&LoadError> {
        self.failed.get(chunk_ref)
    }

    /// Every failure that has not been retried since.
    pub fn failures(&self) -> impl Iterator<Item = &LoadError> + '_ {
        self.failed.values()
    }

    /// The hovered node.
    pub fn hovered(&self) -> Option<NodePath> {
        self.hover.current()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet as StdHashSet;
    use std::sync::Mutex;

    use arbor_chunk::{MANIFEST_FILE, encode};
    use arbor_loader::{FetchError, LoadFailure, MemoryFetch};
    use arbor_partition::{PartitionConfig, partition_node};
    use async_trait::async_trait;

    use super::*;

    /// Serves a partition from memory; chosen documents can be made to fail.
    #[derive(Debug, Default)]
    struct Flaky {
        docs: MemoryFetch,
        failing: Mutex<StdHashSet<String>>,
    }

    impl Flaky {
        fn set_failing(&self, name: &str, failing: bool) {
            let mut set = self.failing.lock().unwrap();
            if failing {
                set.insert(name.to_owned());
            } else {
                set.remove(name);
            }
        }
    }

    #[async_trait]
    impl Fetch for Flaky {
        async fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError> {
            if self.failing.lock().unwrap().contains(name) {
                return Err(FetchError::Transport("unreachable".to_owned()));
            }
            self.docs.fetch(name).await
        }
    }

    /// 20 kingdoms of 2 phyla of 2 species.
    fn taxonomy() -> Node {
        Node::branch(
            "Life",
            0,
            (0..20)
                .map(|k| {
                    Node::branch(
                        format!("K{k}"),
                        1,
                        (0..2)
                            .map(|p| {
                                Node::branch(
                                    format!("K{k}P{p}"),
                                    2,
                                    (0..2).map(|s| Node::leaf(format!("K{k}P{p}S{s}"), 3)).collect(),
                                )
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    fn flaky_for(tree: &Node) -> Arc<Flaky> {
        let partition = partition_node(
            tree,
            PartitionConfig {
                chunk_size_budget: 5,
                depth_threshold: 1,
            },
        )
        .unwrap();
        let mut docs = MemoryFetch::new();
        docs.insert(MANIFEST_FILE, partition.manifest.encode().unwrap());
        docs.insert(
            partition.manifest.root_file.clone(),
            encode(&partition.root).unwrap(),
        );
        for chunk in &partition.chunks {
            docs.insert(chunk.file_name(), encode(&chunk.data).unwrap());
        }
        Arc::new(Flaky {
            docs,
            ..Flaky::default()
        })
    }

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            viewport: Size::new(800.0, 600.0),
            build_slice: 8,
            settings: Preset::Balanced.settings(),
            ..ExplorerConfig::default()
        }
    }

    async fn open(fetch: &Arc<Flaky>) -> Explorer {
        let fetch: Arc<dyn Fetch> = fetch.clone();
        Explorer::open(fetch, config(), Visibility::new()).await.unwrap()
    }

    fn path(segments: &[&str]) -> NodePath {
        NodePath::from(segments)
    }

    /// Screen position of a laid-out node's centre.
    fn screen_center(ex: &Explorer, p: &NodePath) -> Point {
        let node = ex.scene().node(ex.scene().find(p).unwrap()).unwrap();
        Projection::new(ex.viewport()).world_to_screen(ex.camera().camera(), node.circle().center)
    }

    #[tokio::test(start_paused = true)]
    async fn opens_on_the_whole_skeleton() {
        let ex = open(&flaky_for(&taxonomy())).await;
        assert_eq!(ex.scene().len(), 21);
        assert_eq!(ex.root().stubs().len(), 20);
        assert_eq!(ex.camera().camera(), ex.home());
        assert!(!ex.is_animating());
        assert_eq!(ex.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn render_requests_visible_stubs_and_settle_grafts_them() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        let epoch = ex.scene().epoch();
        let frame = ex.render(Duration::ZERO);
        assert_eq!(frame.requests().len(), 16);
        assert_eq!(frame.stats().deferred_requests, 4);
        assert_eq!(ex.pending_requests(), 16);

        // The same frame is reused and asks for nothing new.
        ex.render(Duration::ZERO);
        assert_eq!(ex.pending_requests(), 16);

        let applied = ex.settle().await;
        assert_eq!(applied.grafted, 16);
        assert!(applied.failed.is_empty());
        assert!(applied.nodes > 0);
        assert_eq!(ex.pending_requests(), 0);
        assert_ne!(ex.scene().epoch(), epoch);
        assert_eq!(ex.render(Duration::ZERO).key().epoch, ex.scene().epoch());
    }

    #[tokio::test(start_paused = true)]
    async fn rendering_until_quiet_hydrates_everything() {
        let tree = taxonomy();
        let mut ex = open(&flaky_for(&tree)).await;
        for _ in 0..10 {
            ex.render(Duration::ZERO);
            if ex.pending_requests() == 0 {
                break;
            }
            ex.settle().await;
        }
        assert_eq!(ex.root(), &tree);
        assert_eq!(ex.scene().len(), 141);
        assert!(ex.progress().is_complete());
        assert!(ex.render(Duration::ZERO).requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_wait_for_the_stub_to_come_back() {
        let fetch = flaky_for(&taxonomy());
        let mut ex = open(&fetch).await;
        let broken = ex.render(Duration::ZERO).requests()[0].clone();
        fetch.set_failing(&broken.chunk_ref, true);

        let applied = ex.settle().await;
        assert_eq!(applied.failed.len(), 1);
        assert!(matches!(applied.failed[0].reason, LoadFailure::Fetch(_)));
        assert!(ex.failure(&broken.chunk_ref).is_some());
        assert!(ex.root().find(broken.path.segments()).unwrap().is_stub);

        // Still on screen: not hammered.
        fetch.set_failing(&broken.chunk_ref, false);
        ex.render(Duration::ZERO);
        assert!(!ex.is_requested(&broken.chunk_ref));
        ex.settle().await;

        // Leave and come back.
        ex.pan_by(Vec2::new(1.0e5, 0.0));
        assert!(ex.render(Duration::ZERO).requests().is_empty());
        assert!(ex.failure(&broken.chunk_ref).is_none());
        ex.pan_by(Vec2::new(-1.0e5, 0.0));
        ex.render(Duration::ZERO);
        assert!(ex.is_requested(&broken.chunk_ref));
        ex.settle().await;
        assert!(!ex.root().find(broken.path.segments()).unwrap().is_stub);
    }

    #[tokio::test(start_paused = true)]
    async fn clicking_a_failed_stub_retries_at_once() {
        let fetch = flaky_for(&taxonomy());
        let mut ex = open(&fetch).await;
        let k0 = path(&["Life", "K0"]);
        let chunk_ref = ex.root().find(k0.segments()).unwrap().chunk_ref.clone().unwrap();
        fetch.set_failing(&chunk_ref, true);
        let at = screen_center(&ex, &k0);
        ex.click(at, Duration::ZERO);
        assert!(ex.is_requested(&chunk_ref));
        ex.settle().await;
        assert!(ex.failure(&chunk_ref).is_some());
        ex.render(Duration::from_secs(5));

        fetch.set_failing(&chunk_ref, false);
        let at = screen_center(&ex, &k0);
        assert_eq!(ex.click(at, Duration::ZERO), Some(k0.clone()));
        assert!(ex.is_requested(&chunk_ref));
        assert!(ex.failure(&chunk_ref).is_none());
        ex.settle().await;
        assert!(!ex.root().find(k0.segments()).unwrap().is_stub);
    }

    #[tokio::test(start_paused = true)]
    async fn click_animates_to_the_node() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        let k7 = path(&["Life", "K7"]);
        let at = screen_center(&ex, &k7);
        assert_eq!(ex.click(at, Duration::ZERO), Some(k7.clone()));
        assert!(ex.is_animating());

        let node = ex.scene().node(ex.scene().find(&k7).unwrap()).unwrap();
        let target = Projection::new(ex.viewport()).fit_circle(node.circle(), 0.1);
        let start = ex.camera().camera();

        let ms = ex.settings().camera.animation_ms;
        ex.render(Duration::from_millis(ms / 4));
        let mid = ex.camera().camera();
        assert!(mid.k > start.k && mid.k < target.k);

        ex.render(Duration::from_millis(ms));
        assert!(!ex.is_animating());
        assert_eq!(ex.camera().camera(), target);
    }

    #[tokio::test(start_paused = true)]
    async fn hover_reports_enter_and_leave() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        let life = path(&["Life"]);
        let k3 = path(&["Life", "K3"]);
        let k4 = path(&["Life", "K4"]);

        let at = screen_center(&ex, &k3);
        assert_eq!(
            ex.pointer_move(at),
            [HoverEvent::Enter(life.clone()), HoverEvent::Enter(k3.clone())]
        );
        assert!(ex.pointer_move(at).is_empty());

        let at = screen_center(&ex, &k4);
        assert_eq!(
            ex.pointer_move(at),
            [HoverEvent::Leave(k3), HoverEvent::Enter(k4.clone())]
        );
        assert_eq!(ex.hovered(), Some(k4.clone()));

        // Far outside the root circle.
        assert_eq!(
            ex.pointer_move(Point::new(-1.0e4, -1.0e4)),
            [HoverEvent::Leave(k4), HoverEvent::Leave(life)]
        );
        assert!(ex.pointer_leave().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hover_survives_grafts() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        let k2 = path(&["Life", "K2"]);
        let at = screen_center(&ex, &k2);
        ex.pointer_move(at);
        for _ in 0..3 {
            ex.render(Duration::ZERO);
            ex.settle().await;
        }
        // K2 is a branch now; its centre sits between its phyla.
        assert!(!ex.root().find(k2.segments()).unwrap().is_stub);
        assert!(ex.pointer_move(at).is_empty());
        assert_eq!(ex.hovered(), Some(k2));
    }

    #[tokio::test(start_paused = true)]
    async fn zoom_at_keeps_the_anchor_and_respects_limits() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        let anchor = Point::new(200.0, 150.0);
        let projection = Projection::new(ex.viewport());
        let before = projection.screen_to_world(ex.camera().camera(), anchor);
        ex.zoom_at(anchor, 3.0);
        let after = projection.screen_to_world(ex.camera().camera(), anchor);
        assert!((before - after).hypot() < 1e-9);

        ex.zoom_at(anchor, 1e30);
        let max_k = ex.settings().camera.max_k;
        assert!((ex.camera().camera().k - max_k).abs() <= max_k * 1e-12);
        let pinned = projection.screen_to_world(ex.camera().camera(), anchor);
        assert!((before - pinned).hypot() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_changes_take_effect_next_frame() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        assert_eq!(ex.render(Duration::ZERO).requests().len(), 16);
        ex.settle().await;
        ex.apply_preset(Preset::Performance);
        assert_eq!(ex.settings(), &Preset::Performance.settings());
        assert!(ex.render(Duration::ZERO).requests().len() <= 6);

        ex.resize(Size::new(400.0, 300.0));
        assert_eq!(ex.render(Duration::ZERO).key().viewport, Size::new(400.0, 300.0));
    }

    #[tokio::test(start_paused = true)]
    async fn zoom_to_unknown_path_is_refused() {
        let mut ex = open(&flaky_for(&taxonomy())).await;
        assert!(!ex.zoom_to(&path(&["Life", "Nowhere"]), Duration::ZERO));
        assert!(!ex.is_animating());
        ex.zoom_to(&path(&["Life", "K1"]), Duration::ZERO);
        ex.zoom_home(Duration::from_millis(10));
        ex.render(Duration::from_secs(5));
        assert_eq!(ex.camera().camera(), ex.home());
    }
}
