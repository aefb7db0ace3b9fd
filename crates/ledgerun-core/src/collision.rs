use crate::block::BlockId;
use crate::geometry::Rect;
use crate::mask::{CollisionMask, masks_overlap};
use crate::registry::BlockRegistry;

/// Anything that moves and collides against world blocks.
///
/// The player and every monster implement this, so the resolver treats all
/// actors the same way.
pub trait Body {
    fn rect(&self) -> Rect;
    fn rect_mut(&mut self) -> &mut Rect;

    fn mask(&self) -> &CollisionMask {
        &CollisionMask::Solid
    }
}

/// What a vertical resolve touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalContacts {
    /// Every block the body overlapped, in id order.
    pub touched: Vec<BlockId>,
    /// The body was falling and got snapped onto a block top.
    pub landed: bool,
    /// The body was rising and got snapped under a block bottom.
    pub hit_head: bool,
}

impl VerticalContacts {
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }
}

fn overlaps_block(rect: &Rect, mask: &CollisionMask, block_rect: &Rect) -> bool {
    masks_overlap(rect, mask, block_rect, &CollisionMask::Solid)
}

/// Probe a horizontal move of `dx` without committing it.
///
/// Returns the first block (lowest id) the shifted body would overlap.
pub fn probe_horizontal<B: Body + ?Sized>(
    body: &B,
    world: &BlockRegistry,
    dx: f32,
) -> Option<BlockId> {
    let shifted = body.rect().translated(dx, 0.0);
    if shifted.is_degenerate() {
        return None;
    }
    let mask = body.mask();
    world.query_rect(&shifted).into_iter().find(|id| {
        world
            .get(*id)
            .is_some_and(|b| overlaps_block(&shifted, mask, &b.rect()))
    })
}

/// Resolve overlaps after the body already moved by `dy` this tick.
///
/// Every block overlapping the moved body is reported. Falling (`dy > 0`)
/// snaps the body's bottom to the highest touched top; rising (`dy < 0`)
/// snaps its top to the lowest touched bottom. With `dy == 0` overlaps are
/// reported but the body is left in place.
pub fn resolve_vertical<B: Body + ?Sized>(
    body: &mut B,
    world: &BlockRegistry,
    dy: f32,
) -> VerticalContacts {
    let mut contacts = VerticalContacts::default();
    let moved = body.rect();
    if moved.is_degenerate() || !dy.is_finite() {
        return contacts;
    }

    let mut touched_rects = Vec::new();
    for id in world.query_rect(&moved) {
        let Some(block) = world.get(id) else {
            continue;
        };
        let block_rect = block.rect();
        if overlaps_block(&moved, body.mask(), &block_rect) {
            contacts.touched.push(id);
            touched_rects.push(block_rect);
        }
    }

    if dy > 0.0 {
        if let Some(top) = touched_rects.iter().map(Rect::top).reduce(f32::min) {
            body.rect_mut().set_bottom(top);
            contacts.landed = true;
        }
    } else if dy < 0.0
        && let Some(bottom) = touched_rects.iter().map(Rect::bottom).reduce(f32::max)
    {
        body.rect_mut().set_top(bottom);
        contacts.hit_head = true;
    }
    contacts
}
