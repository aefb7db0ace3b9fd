use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Collision shape of an actor or object, aligned to its rectangle's top-left.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CollisionMask {
    /// Every pixel of the rectangle is solid.
    #[default]
    Solid,
    /// Per-pixel footprint, e.g. derived from a sprite's alpha channel.
    Bitmap(Bitmap),
}

/// Row-major pixel footprint. `bits` always holds `width * height` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBitmap")]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    bits: Vec<bool>,
}

#[derive(Deserialize)]
struct RawBitmap {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl TryFrom<RawBitmap> for Bitmap {
    type Error = String;

    fn try_from(raw: RawBitmap) -> Result<Self, Self::Error> {
        let expected = raw.width as usize * raw.height as usize;
        if raw.bits.len() != expected {
            return Err(format!(
                "bitmap {}x{} needs {expected} bits, got {}",
                raw.width,
                raw.height,
                raw.bits.len()
            ));
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            bits: raw.bits,
        })
    }
}

impl Bitmap {
    /// Build a bitmap by sampling `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    /// Pixel lookup; anything outside the bitmap is empty.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.bits
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(false)
    }
}

impl CollisionMask {
    fn is_set(&self, rect: &Rect, world_x: i64, world_y: i64) -> bool {
        match self {
            CollisionMask::Solid => true,
            CollisionMask::Bitmap(bitmap) => bitmap.get(
                world_x - rect.x.floor() as i64,
                world_y - rect.y.floor() as i64,
            ),
        }
    }
}

/// Test whether two masked rectangles overlap.
///
/// Solid/solid pairs reduce to a rectangle test. Otherwise every whole pixel
/// inside the rectangles' intersection is sampled in both masks.
pub fn masks_overlap(a: &Rect, a_mask: &CollisionMask, b: &Rect, b_mask: &CollisionMask) -> bool {
    let Some(overlap) = a.intersection(b) else {
        return false;
    };
    if matches!(
        (a_mask, b_mask),
        (CollisionMask::Solid, CollisionMask::Solid)
    ) {
        return true;
    }

    let x0 = overlap.left().floor() as i64;
    let x1 = overlap.right().ceil() as i64;
    let y0 = overlap.top().floor() as i64;
    let y1 = overlap.bottom().ceil() as i64;
    for py in y0..y1 {
        for px in x0..x1 {
            if a_mask.is_set(a, px, py) && b_mask.is_set(b, px, py) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_half(w: u32, h: u32) -> CollisionMask {
        CollisionMask::Bitmap(Bitmap::from_fn(w, h, |x, _| x < w / 2))
    }

    #[test]
    fn solid_masks_reduce_to_rect_test() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(9.0, 9.0, 10.0, 10.0);
        assert!(masks_overlap(
            &a,
            &CollisionMask::Solid,
            &b,
            &CollisionMask::Solid
        ));
        assert!(!masks_overlap(
            &a,
            &CollisionMask::Solid,
            &b.translated(1.0, 0.0),
            &CollisionMask::Solid
        ));
    }

    #[test]
    fn empty_bitmap_region_does_not_collide() {
        // Only the left half of `a` is solid; `b` overlaps the right half.
        let a = Rect::new(0.0, 0.0, 20.0, 20.0);
        let b = Rect::new(12.0, 0.0, 20.0, 20.0);
        assert!(!masks_overlap(
            &a,
            &left_half(20, 20),
            &b,
            &CollisionMask::Solid
        ));

        let c = Rect::new(5.0, 0.0, 20.0, 20.0);
        assert!(masks_overlap(
            &a,
            &left_half(20, 20),
            &c,
            &CollisionMask::Solid
        ));
    }

    #[test]
    fn bitmap_lookup_outside_is_empty() {
        let bitmap = Bitmap::from_fn(4, 4, |_, _| true);
        assert!(bitmap.get(0, 0));
        assert!(bitmap.get(3, 3));
        assert!(!bitmap.get(4, 0));
        assert!(!bitmap.get(-1, 2));
    }

    #[test]
    fn bitmap_deserialize_checks_length() {
        let bitmap = Bitmap::from_fn(2, 2, |x, y| x == y);
        let json = serde_json::to_string(&bitmap).unwrap();
        let back: Bitmap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bitmap);

        let short = r#"{"width":4,"height":4,"bits":[true,false]}"#;
        let err = serde_json::from_str::<Bitmap>(short).unwrap_err();
        assert!(err.to_string().contains("needs 16 bits"), "{err}");
    }

    #[test]
    fn degenerate_rect_never_collides_even_with_full_mask() {
        let a = Rect::new(0.0, 0.0, 0.0, 10.0);
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        let full = CollisionMask::Bitmap(Bitmap::from_fn(10, 10, |_, _| true));
        assert!(!masks_overlap(&a, &full, &b, &CollisionMask::Solid));
    }
}
