/// Infinite, centre-outward enumeration of integer block coordinates.
///
/// Walks a square spiral: (0,0), (1,0), (1,1), (0,1), (-1,1), (-1,0), ...
/// Each ring is finished before the next one starts, so the first `k` items
/// always form a compact patch around the origin and no grid size has to be
/// known up front.
#[derive(Debug, Clone)]
pub struct SpiralIter {
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    leg_len: u32,
    leg_step: u32,
    legs_done: u32,
    started: bool,
}

impl Default for SpiralIter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiralIter {
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            dx: 1,
            dy: 0,
            leg_len: 1,
            leg_step: 0,
            legs_done: 0,
            started: false,
        }
    }
}

impl Iterator for SpiralIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some((self.x, self.y));
        }

        self.x += self.dx;
        self.y += self.dy;
        self.leg_step += 1;

        if self.leg_step == self.leg_len {
            self.leg_step = 0;
            // Turn left.
            (self.dx, self.dy) = (-self.dy, self.dx);
            self.legs_done += 1;
            // Leg length grows every second turn: 1,1,2,2,3,3,...
            if self.legs_done % 2 == 0 {
                self.leg_len += 1;
            }
        }

        Some((self.x, self.y))
    }
}

/// Coordinate at spiral position `index`. O(index); prefer [`SpiralIter`] for walks.
pub fn spiral_coord(index: usize) -> (i32, i32) {
    SpiralIter::new().nth(index).unwrap_or((0, 0))
}
