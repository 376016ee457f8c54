//! Pixel buffers and the resolution pyramid.
//!
//! Pixels are packed RGBA8, one `u32` per pixel, red in the low byte. The
//! lock flag tracks the explicit write lifecycle: the render worker locks a
//! level before writing it and the display side unlocks it when the worker
//! has moved on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::RenderResult;

/// Coarsest pyramid dimension: halving stops once a side would drop below
/// this many pixels.
const MIN_LEVEL_SIZE: u32 = 32;

/// Upper bound on pyramid depth for very large viewports.
const MAX_LEVELS: usize = 8;

/// A fixed-size RGBA8 pixel buffer with an explicit write lock.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Mutex<Vec<u32>>,
    locked: AtomicBool,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "zero-sized framebuffer");
        Self {
            width,
            height,
            pixels: Mutex::new(vec![0; (width * height) as usize]),
            locked: AtomicBool::new(false),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mark the buffer as owned by a writer.
    ///
    /// Locking a buffer the display side never released is allowed: the
    /// previous writer is gone by the time a new one starts.
    pub fn lock_for_write(&self) -> RenderResult<()> {
        self.locked.store(true, Ordering::Release);
        Ok(())
    }

    /// Return ownership to the display side.
    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Copy a tile's rows into the buffer.
    ///
    /// `pixels` is row-major within the tile. Tiles from one grid touch
    /// disjoint ranges, so concurrent writers never overlap.
    pub fn write_tile(&self, x: u32, y: u32, tile_width: u32, pixels: &[u32]) {
        let mut buffer = lock_pixels(&self.pixels);
        for (row, chunk) in pixels.chunks_exact(tile_width as usize).enumerate() {
            let start = ((y + row as u32) * self.width + x) as usize;
            buffer[start..start + tile_width as usize].copy_from_slice(chunk);
        }
    }

    /// Snapshot of the pixel contents.
    pub fn snapshot(&self) -> Vec<u32> {
        lock_pixels(&self.pixels).clone()
    }

    /// Snapshot as raw RGBA bytes, ready for texture upload.
    pub fn snapshot_rgba(&self) -> Vec<u8> {
        bytemuck::cast_slice(&lock_pixels(&self.pixels)[..]).to_vec()
    }
}

/// A poisoned pixel mutex only means a worker died mid-write; the pixels
/// are still plain data, so keep going.
fn lock_pixels(pixels: &Mutex<Vec<u32>>) -> std::sync::MutexGuard<'_, Vec<u32>> {
    pixels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A stack of framebuffers from coarse to fine.
///
/// Index 0 is the coarsest level; the last level is the full viewport
/// resolution. Each level doubles the linear dimensions of the previous.
pub struct FrameBufferPyramid {
    levels: Vec<FrameBuffer>,
}

impl FrameBufferPyramid {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "zero-sized viewport");

        let mut sizes = vec![(width, height)];
        let (mut w, mut h) = (width, height);
        while sizes.len() < MAX_LEVELS && w / 2 >= MIN_LEVEL_SIZE && h / 2 >= MIN_LEVEL_SIZE {
            w /= 2;
            h /= 2;
            sizes.push((w, h));
        }

        let levels = sizes
            .into_iter()
            .rev()
            .map(|(w, h)| FrameBuffer::new(w, h))
            .collect();
        Self { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, index: usize) -> &FrameBuffer {
        &self.levels[index]
    }

    /// Full-resolution level.
    pub fn finest(&self) -> &FrameBuffer {
        &self.levels[self.levels.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_lifecycle() {
        let buffer = FrameBuffer::new(4, 4);
        assert!(!buffer.is_locked());

        buffer.lock_for_write().unwrap();
        assert!(buffer.is_locked());

        buffer.unlock();
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_write_tile_lands_in_place() {
        let buffer = FrameBuffer::new(4, 4);
        // 2x2 tile at (1, 1)
        buffer.write_tile(1, 1, 2, &[10, 11, 20, 21]);

        let pixels = buffer.snapshot();
        assert_eq!(pixels[1 * 4 + 1], 10);
        assert_eq!(pixels[1 * 4 + 2], 11);
        assert_eq!(pixels[2 * 4 + 1], 20);
        assert_eq!(pixels[2 * 4 + 2], 21);
        assert_eq!(pixels[0], 0);
    }

    #[test]
    fn test_rgba_snapshot_layout() {
        let buffer = FrameBuffer::new(1, 1);
        buffer.write_tile(0, 0, 1, &[0xFF00_1020]);

        // Red in the low byte
        assert_eq!(buffer.snapshot_rgba(), vec![0x20, 0x10, 0x00, 0xFF]);
    }

    #[test]
    fn test_pyramid_ordering_and_halving() {
        let pyramid = FrameBufferPyramid::new(640, 480);

        assert!(pyramid.level_count() > 1);
        assert_eq!(pyramid.finest().width(), 640);
        assert_eq!(pyramid.finest().height(), 480);

        // Coarse to fine, doubling each step
        for i in 1..pyramid.level_count() {
            assert_eq!(pyramid.level(i).width(), pyramid.level(i - 1).width() * 2);
        }
        assert!(pyramid.level(0).width() >= MIN_LEVEL_SIZE);
    }

    #[test]
    fn test_tiny_viewport_is_single_level() {
        let pyramid = FrameBufferPyramid::new(40, 40);
        assert_eq!(pyramid.level_count(), 1);
        assert_eq!(pyramid.level(0).width(), 40);
    }

    #[test]
    #[should_panic(expected = "zero-sized viewport")]
    fn test_zero_viewport_panics() {
        FrameBufferPyramid::new(0, 100);
    }
}
