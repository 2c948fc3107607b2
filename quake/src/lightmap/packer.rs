/// Places rectangles into a fixed size atlas, one at a time, in call order.
pub trait RectPacker {
    fn new(width: u32, height: u32) -> Self
    where
        Self: Sized;

    /// Top-left corner for a `w` by `h` rectangle, or `None` once it no longer fits.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)>;
}

/// Fills rows left to right. A rectangle that does not fit the current row
/// opens a new one below, as tall as the tallest rectangle of the row above.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    shelf_height: u32,
}

impl RectPacker for ShelfPacker {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
            shelf_height: 0,
        }
    }

    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > self.width || h > self.height {
            return None;
        }

        if self.x + w > self.width {
            self.y += self.shelf_height;
            self.x = 0;
            self.shelf_height = 0;
        }
        if self.y.checked_add(h)? > self.height {
            return None;
        }

        let pos = (self.x, self.y);
        self.x += w;
        self.shelf_height = self.shelf_height.max(h);
        Some(pos)
    }
}

/// Packs every `Some` size in order, or fails if any one does not fit.
pub fn pack_all<P: RectPacker>(
    sizes: &[Option<(u32, u32)>],
    width: u32,
    height: u32,
) -> Option<Vec<Option<(u32, u32)>>> {
    let mut packer = P::new(width, height);
    sizes
        .iter()
        .map(|size| match size {
            Some((w, h)) => packer.place(*w, *h).map(Some),
            None => Some(None),
        })
        .collect()
}

/// Finds the first size that fits everything, doubling the smaller side
/// (width when square) after each failure. Gives up past `max_size`.
///
/// On failure returns the last size tried.
pub fn pack_smallest<P: RectPacker>(
    sizes: &[Option<(u32, u32)>],
    initial_size: u32,
    max_size: u32,
) -> Result<(u32, u32, Vec<Option<(u32, u32)>>), (u32, u32)> {
    let mut width = initial_size.max(1);
    let mut height = width;
    let mut tried = (width, height);

    while width <= max_size && height <= max_size {
        if let Some(placed) = pack_all::<P>(sizes, width, height) {
            return Ok((width, height, placed));
        }
        tried = (width, height);

        let side = if width <= height {
            &mut width
        } else {
            &mut height
        };
        match side.checked_mul(2) {
            Some(doubled) => *side = doubled,
            None => break,
        }
    }

    Err(tried)
}
