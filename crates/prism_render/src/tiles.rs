//! Tile partitioning for parallel shading.

/// A rectangular pixel region, independent of its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Subdivision factor per axis: every level is shaded as `TILE_GRID`²
/// independent tiles.
pub const TILE_GRID: u32 = 8;

/// Partition a buffer into a k-by-k grid of tiles.
///
/// Integer division sizes the grid; the last tile in each row and column
/// absorbs the remainder, so the union covers every pixel exactly once.
/// Zero-area tiles from k > width/height are skipped.
pub fn tile_grid(width: u32, height: u32, k: u32) -> Vec<Tile> {
    assert!(width > 0 && height > 0, "zero-sized tile grid");
    assert!(k > 0, "zero subdivision factor");

    let tile_w = width / k;
    let tile_h = height / k;

    let mut tiles = Vec::with_capacity((k * k) as usize);
    for row in 0..k {
        for col in 0..k {
            let x = col * tile_w;
            let y = row * tile_h;
            let w = if col == k - 1 { width - x } else { tile_w };
            let h = if row == k - 1 { height - y } else { tile_h };
            if w == 0 || h == 0 {
                continue;
            }
            tiles.push(Tile {
                x,
                y,
                width: w,
                height: h,
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(width: u32, height: u32, k: u32) {
        let tiles = tile_grid(width, height, k);

        // Every pixel covered exactly once
        let mut coverage = vec![0u32; (width * height) as usize];
        for tile in &tiles {
            for y in tile.y..tile.y + tile.height {
                for x in tile.x..tile.x + tile.width {
                    coverage[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(
            coverage.iter().all(|&c| c == 1),
            "gap or overlap at {}x{} k={}",
            width,
            height,
            k
        );
    }

    #[test]
    fn test_exact_cover() {
        assert_exact_cover(64, 64, 8);
        assert_exact_cover(100, 70, 8);
        assert_exact_cover(7, 13, 4);
        assert_exact_cover(1, 1, 1);
    }

    #[test]
    fn test_remainder_goes_to_last_tile() {
        let tiles = tile_grid(100, 100, 8);
        // 100 / 8 = 12, last tile absorbs 100 - 7*12 = 16
        let last = tiles.last().unwrap();
        assert_eq!(last.width, 16);
        assert_eq!(last.height, 16);
    }

    #[test]
    fn test_grid_smaller_than_k() {
        // 3x3 with k=8: integer division yields zero-width interior tiles
        let tiles = tile_grid(3, 3, 8);
        let total: u32 = tiles.iter().map(Tile::pixel_count).sum();
        assert_eq!(total, 9);
        assert_exact_cover(3, 3, 8);
    }

    #[test]
    #[should_panic(expected = "zero-sized tile grid")]
    fn test_zero_dimension_panics() {
        tile_grid(0, 10, 4);
    }
}
