//! Seed ordering over the occupancy mask.

/// Visits every cell of an `nx` x `ny` mask exactly once, spiralling inward
/// from the outer boundary.
///
/// Starting at the edges means streamlines crossing the whole domain are
/// placed before the short ones in the interior.
#[derive(Debug, Clone)]
pub struct SpiralSeeds {
    remaining: usize,
    x: isize,
    y: isize,
    xfirst: isize,
    yfirst: isize,
    xlast: isize,
    ylast: isize,
    direction: Heading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    Right,
    Up,
    Left,
    Down,
}

impl SpiralSeeds {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            remaining: nx * ny,
            x: 0,
            y: 0,
            xfirst: 0,
            yfirst: 1,
            xlast: nx as isize - 1,
            ylast: ny as isize - 1,
            direction: Heading::Right,
        }
    }
}

impl Iterator for SpiralSeeds {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = (self.x as usize, self.y as usize);

        match self.direction {
            Heading::Right => {
                self.x += 1;
                if self.x >= self.xlast {
                    self.xlast -= 1;
                    self.direction = Heading::Up;
                }
            }
            Heading::Up => {
                self.y += 1;
                if self.y >= self.ylast {
                    self.ylast -= 1;
                    self.direction = Heading::Left;
                }
            }
            Heading::Left => {
                self.x -= 1;
                if self.x <= self.xfirst {
                    self.xfirst += 1;
                    self.direction = Heading::Down;
                }
            }
            Heading::Down => {
                self.y -= 1;
                if self.y <= self.yfirst {
                    self.yfirst += 1;
                    self.direction = Heading::Right;
                }
            }
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
