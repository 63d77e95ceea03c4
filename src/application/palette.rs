// Color allocator - Distinct hues by golden-ratio stepping
use rand::Rng;
use std::fmt;

const GOLDEN_RATIO: f64 = 0.618_033_988_749_895;

pub const THRESHOLD_HIGH_COLOR: &str = "rgba(255, 0, 0, 0.5)";
pub const THRESHOLD_LOW_COLOR: &str = "rgba(0, 255, 0, 0.5)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub hue: u16,
}

impl Color {
    pub fn hsla(&self, alpha: f32) -> String {
        format!("hsla({}, 80%, 55%, {})", self.hue, alpha)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hsla(1.0))
    }
}

/// `n` visually distinct colors starting from a random hue. Not stable across calls.
pub fn colors(n: usize) -> Vec<Color> {
    let seed = rand::thread_rng().gen_range(0.0..1.0);
    colors_from_seed(n, seed)
}

pub fn colors_from_seed(n: usize, seed: f64) -> Vec<Color> {
    let mut hue = seed.rem_euclid(1.0);
    (0..n)
        .map(|_| {
            hue = (hue + GOLDEN_RATIO) % 1.0;
            Color { hue: (hue * 360.0).floor() as u16 % 360 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular_distance(a: u16, b: u16) -> u16 {
        let d = a.abs_diff(b);
        d.min(360 - d)
    }

    #[test]
    fn test_hues_are_pairwise_distinct() {
        for _ in 0..20 {
            let hues: Vec<u16> = colors(12).iter().map(|c| c.hue).collect();
            for (i, a) in hues.iter().enumerate() {
                for b in &hues[i + 1..] {
                    assert!(circular_distance(*a, *b) >= 10, "hues {:?} too close", hues);
                }
            }
        }
    }

    #[test]
    fn test_consecutive_colors_are_far_apart() {
        let hues: Vec<u16> = colors_from_seed(8, 0.25).iter().map(|c| c.hue).collect();
        for pair in hues.windows(2) {
            assert!(circular_distance(pair[0], pair[1]) >= 136);
        }
    }

    #[test]
    fn test_format() {
        let color = colors_from_seed(1, 0.0)[0];
        assert_eq!(color.hue, 222);
        assert_eq!(color.to_string(), "hsla(222, 80%, 55%, 1)");
        assert_eq!(color.hsla(0.5), "hsla(222, 80%, 55%, 0.5)");
    }

    #[test]
    fn test_zero_colors() {
        assert!(colors(0).is_empty());
    }
}
