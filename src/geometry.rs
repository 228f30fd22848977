use serde::{Deserialize, Serialize};

/// Largest width or height accepted from manual edits.
pub const MAX_DIM: u32 = 4096;

/// Named rules that derive a target canvas from the original image size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Preset {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    /// 1:1, side = longest original side
    Square,
    /// 1:1 with 30% extra room around the longest side
    AutoPad,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Landscape,
        Preset::Portrait,
        Preset::Square,
        Preset::AutoPad,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Landscape => "Landscape",
            Preset::Portrait => "Portrait",
            Preset::Square => "1:1",
            Preset::AutoPad => "1:1 +30%",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetDimensions {
    pub width: u32,
    pub height: u32,
}

impl TargetDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions typed or dragged in by the user, clamped to `[1, MAX_DIM]`.
    pub fn manual(width: u32, height: u32) -> Self {
        Self {
            width: clamp_dimension(width),
            height: clamp_dimension(height),
        }
    }

    pub fn from_preset(preset: Preset, original_width: u32, original_height: u32) -> Self {
        let (width, height) = resolve(preset, original_width, original_height);
        Self { width, height }
    }

    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.width >= width && self.height >= height
    }
}

impl Default for TargetDimensions {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

pub fn clamp_dimension(value: u32) -> u32 {
    value.clamp(1, MAX_DIM)
}

/// Computes the canvas size a preset produces for an image of the given size.
///
/// The result never shrinks either side of the original. Results are not
/// clamped to `MAX_DIM`.
pub fn resolve(preset: Preset, original_width: u32, original_height: u32) -> (u32, u32) {
    let w = original_width as u64;
    let h = original_height as u64;

    match preset {
        Preset::Landscape => {
            // w / h < 16 / 9, compared without floating point
            if w * 9 < h * 16 {
                (round_scaled(h, 16.0 / 9.0), original_height)
            } else {
                (original_width, round_scaled(w, 9.0 / 16.0))
            }
        }
        Preset::Portrait => {
            // w / h > 9 / 16
            if w * 16 > h * 9 {
                (original_width, round_scaled(w, 16.0 / 9.0))
            } else {
                (round_scaled(h, 9.0 / 16.0), original_height)
            }
        }
        Preset::Square => {
            let side = original_width.max(original_height);
            (side, side)
        }
        Preset::AutoPad => {
            let side = round_scaled(w.max(h), 1.3);
            (side, side)
        }
    }
}

fn round_scaled(value: u64, factor: f64) -> u32 {
    (value as f64 * factor).round() as u32
}
