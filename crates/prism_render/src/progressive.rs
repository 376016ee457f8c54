//! Progressive background rendering.
//!
//! One background thread walks the pyramid from coarse to fine. Within a
//! level, tiles are shaded in parallel on the rayon pool into tile-local
//! buffers, then spliced into the level's framebuffer. Cancellation is
//! cooperative: the worker polls a shared flag per pixel and a cancelled
//! level is discarded whole, so the display side only ever sees fully
//! written levels.
//!
//! Exactly one job runs at a time. Camera changes and resizes cancel the
//! current job and block until its thread is joined before touching any
//! shared state.

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use prism_math::{Ray, Vec3};
use prism_trace::CommittedScene;
use rayon::prelude::*;

use crate::camera::{Camera, RayGrid};
use crate::error::{RenderError, RenderResult};
use crate::framebuffer::{FrameBuffer, FrameBufferPyramid};
use crate::tiles::{tile_grid, Tile, TILE_GRID};

pub struct ProgressiveRenderer {
    scene: Arc<CommittedScene>,
    pyramid: Arc<FrameBufferPyramid>,
    camera: Camera,
    /// Index of the last fully written level, -1 for none.
    latest: Arc<AtomicIsize>,
    job: Option<RenderJob>,
}

struct RenderJob {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<RenderResult<()>>,
}

impl ProgressiveRenderer {
    /// Create the renderer and start rendering immediately.
    pub fn new(scene: Arc<CommittedScene>, width: u32, height: u32, camera: Camera) -> Self {
        let mut renderer = Self {
            scene,
            pyramid: Arc::new(FrameBufferPyramid::new(width, height)),
            camera,
            latest: Arc::new(AtomicIsize::new(-1)),
            job: None,
        };
        renderer.start_job();
        renderer
    }

    /// Cancel the in-flight job and restart for a new camera.
    ///
    /// Blocks until the previous worker has been joined. An error from that
    /// worker surfaces here; the new job starts regardless.
    pub fn set_camera(&mut self, camera: Camera) -> RenderResult<()> {
        let previous = self.cancel_current();
        self.camera = camera;
        self.start_job();
        previous
    }

    /// Cancel, reallocate the pyramid for new viewport dimensions, and
    /// restart for the last-known camera.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let previous = self.cancel_current();
        self.pyramid = Arc::new(FrameBufferPyramid::new(width, height));
        self.start_job();
        previous
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn level_count(&self) -> usize {
        self.pyramid.level_count()
    }

    /// The highest fully written level, or `None` since the last restart.
    pub fn latest_level(&self) -> Option<usize> {
        let level = self.latest.load(Ordering::Acquire);
        (level >= 0).then_some(level as usize)
    }

    /// The buffer at `latest_level`, ready to present. Never blocks.
    pub fn acquire_for_display(&self) -> Option<&FrameBuffer> {
        let buffer = self.pyramid.level(self.latest_level()?);
        if buffer.is_locked() {
            // The worker has already advanced past this level
            buffer.unlock();
        }
        Some(buffer)
    }

    fn start_job(&mut self) {
        self.latest.store(-1, Ordering::Release);

        let cancel = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            scene: Arc::clone(&self.scene),
            pyramid: Arc::clone(&self.pyramid),
            camera: self.camera,
            latest: Arc::clone(&self.latest),
            cancel: Arc::clone(&cancel),
        };
        let handle = std::thread::spawn(move || worker.run());
        self.job = Some(RenderJob { cancel, handle });
    }

    /// Signal cancellation and join the worker before returning.
    fn cancel_current(&mut self) -> RenderResult<()> {
        let Some(job) = self.job.take() else {
            return Ok(());
        };
        job.cancel.store(true, Ordering::Release);
        job.handle.join().map_err(|_| RenderError::Worker)?
    }
}

impl Drop for ProgressiveRenderer {
    fn drop(&mut self) {
        // The worker borrows nothing from us, but leaving it running after
        // drop would waste a core on an image nobody will see
        let _ = self.cancel_current();
    }
}

struct Worker {
    scene: Arc<CommittedScene>,
    pyramid: Arc<FrameBufferPyramid>,
    camera: Camera,
    latest: Arc<AtomicIsize>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(self) -> RenderResult<()> {
        for level in 0..self.pyramid.level_count() {
            if self.cancelled() {
                log::debug!("render job cancelled before level {level}");
                return Ok(());
            }
            if !self.render_level(level)? {
                log::debug!("render job cancelled during level {level}");
                return Ok(());
            }
            self.latest.store(level as isize, Ordering::Release);
        }
        log::debug!("render job completed all {} levels", self.pyramid.level_count());
        Ok(())
    }

    /// Render one level. Returns false if cancellation was observed; the
    /// level is then left unpublished.
    fn render_level(&self, level: usize) -> RenderResult<bool> {
        let buffer = self.pyramid.level(level);
        buffer.lock_for_write()?;

        let grid = self.camera.ray_grid(buffer.width(), buffer.height());
        let tiles = tile_grid(buffer.width(), buffer.height(), TILE_GRID);

        let shaded: Vec<Option<(Tile, Vec<u32>)>> = tiles
            .par_iter()
            .map(|&tile| self.shade_tile(tile, &grid).map(|pixels| (tile, pixels)))
            .collect();

        if shaded.iter().any(Option::is_none) {
            buffer.unlock();
            return Ok(false);
        }

        for (tile, pixels) in shaded.into_iter().flatten() {
            buffer.write_tile(tile.x, tile.y, tile.width, &pixels);
        }

        // The buffer stays locked; the display side unlocks it on acquire
        Ok(true)
    }

    /// Shade one tile into a local buffer, or bail on cancellation.
    fn shade_tile(&self, tile: Tile, grid: &RayGrid) -> Option<Vec<u32>> {
        let mut pixels = Vec::with_capacity(tile.pixel_count() as usize);
        for y in tile.y..tile.y + tile.height {
            for x in tile.x..tile.x + tile.width {
                if self.cancelled() {
                    return None;
                }
                pixels.push(shade(&self.scene, &grid.ray_for(x, y)));
            }
        }
        Some(pixels)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// Single-bounce shading: white on a miss, otherwise the absolute normal
/// scaled by how squarely the surface faces the ray.
fn shade(scene: &CommittedScene, ray: &Ray) -> u32 {
    match scene.intersect(ray) {
        None => pack_rgba(Vec3::ONE),
        Some(scene_hit) => {
            let normal = scene_hit.hit.normal;
            let facing = normal.dot(ray.direction.normalize()).abs();
            pack_rgba(normal.abs() * facing)
        }
    }
}

/// Pack a [0, 1] color into RGBA8, red in the low byte, opaque alpha.
fn pack_rgba(color: Vec3) -> u32 {
    let r = (255.0 * color.x.clamp(0.0, 1.0)) as u32;
    let g = (255.0 * color.y.clamp(0.0, 1.0)) as u32;
    let b = (255.0 * color.z.clamp(0.0, 1.0)) as u32;
    r | (g << 8) | (b << 16) | 0xFF00_0000
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{Geometry, SceneGraph};
    use prism_math::Mat4;
    use std::time::{Duration, Instant};

    const WHITE: u32 = 0xFFFF_FFFF;

    fn empty_scene() -> Arc<CommittedScene> {
        let mut graph = SceneGraph::new();
        let root = graph.add_node();
        graph.commit(root);
        Arc::new(CommittedScene::commit(&graph, root))
    }

    /// A large quad at z = 0 facing +Z, centered on the origin.
    fn quad_scene() -> Arc<CommittedScene> {
        let mut graph = SceneGraph::new();
        let mesh = graph.add_node();
        graph.attach_geometry(
            mesh,
            Geometry::new(
                vec![
                    Vec3::new(-10.0, -10.0, 0.0),
                    Vec3::new(10.0, -10.0, 0.0),
                    Vec3::new(10.0, 10.0, 0.0),
                    Vec3::new(-10.0, 10.0, 0.0),
                ],
                vec![0, 1, 2, 0, 2, 3],
            )
            .unwrap(),
        );
        graph.commit(mesh);

        let root = graph.add_node();
        graph.add_instance(root, mesh, Mat4::IDENTITY);
        graph.commit(root);
        Arc::new(CommittedScene::commit(&graph, root))
    }

    fn front_camera() -> Camera {
        Camera::new().with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    }

    fn wait_for_completion(renderer: &ProgressiveRenderer) {
        let deadline = Instant::now() + Duration::from_secs(30);
        let finest = renderer.level_count() - 1;
        while renderer.latest_level() != Some(finest) {
            assert!(Instant::now() < deadline, "render job never completed");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_miss_renders_white() {
        let renderer = ProgressiveRenderer::new(empty_scene(), 64, 64, front_camera());
        wait_for_completion(&renderer);

        let buffer = renderer.acquire_for_display().unwrap();
        assert!(buffer.snapshot().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn test_hit_shades_from_normal() {
        let renderer = ProgressiveRenderer::new(quad_scene(), 64, 64, front_camera());
        wait_for_completion(&renderer);

        let buffer = renderer.acquire_for_display().unwrap();
        let center = buffer.snapshot()[(32 * 64 + 32) as usize];

        // Normal is +Z and the ray hits almost head-on: blue, not white
        assert_ne!(center, WHITE);
        assert!((center >> 16) & 0xFF > 200, "pixel {center:#010x}");
        assert_eq!(center & 0xFF, 0);
    }

    #[test]
    fn test_latest_level_is_monotonic() {
        let renderer = ProgressiveRenderer::new(quad_scene(), 400, 300, front_camera());

        let mut observed = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(30);
        loop {
            assert!(Instant::now() < deadline, "render job never completed");
            observed.push(renderer.latest_level());
            if renderer.latest_level() == Some(renderer.level_count() - 1) {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        // None sorts before Some(0), so the whole trace must be sorted
        let mut sorted = observed.clone();
        sorted.sort();
        assert_eq!(observed, sorted);
    }

    #[test]
    fn test_idempotent_finest_image() {
        let camera = front_camera();
        let mut renderer = ProgressiveRenderer::new(quad_scene(), 96, 96, camera);

        wait_for_completion(&renderer);
        let first = renderer.acquire_for_display().unwrap().snapshot();

        // Restart (cancelling the completed job) with the same camera
        renderer.set_camera(camera).unwrap();
        wait_for_completion(&renderer);
        let second = renderer.acquire_for_display().unwrap().snapshot();

        assert_eq!(first, second);
    }

    #[test]
    fn test_camera_change_mid_render_is_safe() {
        let mut renderer = ProgressiveRenderer::new(quad_scene(), 512, 512, front_camera());

        // Hammer the renderer with restarts while jobs are in flight
        for i in 0..5 {
            let mut camera = front_camera();
            camera.orbit(0.1 * i as f32, 0.0);
            renderer.set_camera(camera).unwrap();

            // Whatever is visible is a fully completed level
            if let Some(level) = renderer.latest_level() {
                assert!(level < renderer.level_count());
            }
        }

        wait_for_completion(&renderer);
    }

    #[test]
    fn test_resize_reallocates_pyramid() {
        let mut renderer = ProgressiveRenderer::new(empty_scene(), 64, 64, front_camera());
        wait_for_completion(&renderer);

        renderer.resize(200, 150).unwrap();
        wait_for_completion(&renderer);

        let buffer = renderer.acquire_for_display().unwrap();
        assert_eq!((buffer.width(), buffer.height()), (200, 150));
    }

    #[test]
    fn test_acquire_unlocks_published_level() {
        let renderer = ProgressiveRenderer::new(empty_scene(), 64, 64, front_camera());
        wait_for_completion(&renderer);

        let buffer = renderer.acquire_for_display().unwrap();
        assert!(!buffer.is_locked());
    }
}
