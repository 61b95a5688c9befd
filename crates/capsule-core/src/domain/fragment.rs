//! Fragment placement for the collage view.
//!
//! A fragment is the on-screen card of one capsule. Its position, tilt and
//! size are drawn once at creation from an injected random source and
//! persisted, so the collage does not jitter between page loads.
//! Overlaps are allowed; this is scatter, not packing.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::CapsuleError;

/// Collage coordinates of one capsule.
///
/// `x` / `y` are percentages of the viewport, `rotation` is degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for Fragment {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

/// Ranges that [`place`] draws from.
///
/// x / y stay away from the edges so cards are not clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementBounds {
    pub x: RangeInclusive<f64>,
    pub y: RangeInclusive<f64>,
    pub rotation: RangeInclusive<f64>,
    pub scale: RangeInclusive<f64>,
}

impl Default for PlacementBounds {
    fn default() -> Self {
        Self {
            x: 10.0..=90.0,
            y: 10.0..=90.0,
            rotation: -15.0..=15.0,
            scale: 0.8..=1.2,
        }
    }
}

impl PlacementBounds {
    pub fn contains(&self, f: &Fragment) -> bool {
        self.x.contains(&f.x)
            && self.y.contains(&f.y)
            && self.rotation.contains(&f.rotation)
            && self.scale.contains(&f.scale)
    }

    /// Draw a fragment, each component independently uniform.
    pub fn place<R: Rng + ?Sized>(&self, rng: &mut R) -> Fragment {
        Fragment {
            x: rng.gen_range(self.x.clone()),
            y: rng.gen_range(self.y.clone()),
            rotation: rng.gen_range(self.rotation.clone()),
            scale: rng.gen_range(self.scale.clone()),
        }
    }
}

/// Draw a fragment with the default bounds.
pub fn place<R: Rng + ?Sized>(rng: &mut R) -> Fragment {
    PlacementBounds::default().place(rng)
}

/// Manual rearrangement of one fragment (e.g. drag and drop).
///
/// x / y are required; rotation and scale are kept when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FragmentUpdate {
    #[serde(rename = "fragment_x")]
    pub x: f64,
    #[serde(rename = "fragment_y")]
    pub y: f64,
    #[serde(rename = "fragment_rotation", default)]
    pub rotation: Option<f64>,
    #[serde(rename = "fragment_scale", default)]
    pub scale: Option<f64>,
}

impl FragmentUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            rotation: None,
            scale: None,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Limits applied to manual moves, wider than [`PlacementBounds`].
pub const POSITION_LIMITS: RangeInclusive<f64> = 0.0..=100.0;
pub const ROTATION_LIMITS: RangeInclusive<f64> = -30.0..=30.0;
pub const SCALE_LIMITS: RangeInclusive<f64> = 0.5..=1.5;

fn clamp_to(value: f64, limits: &RangeInclusive<f64>, field: &str) -> Result<f64, CapsuleError> {
    if !value.is_finite() {
        return Err(CapsuleError::invalid(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(value.clamp(*limits.start(), *limits.end()))
}

/// Apply an update to a fragment, clamping every value into its limits.
///
/// Applying the same update twice gives the same fragment.
pub fn reposition(current: Fragment, update: FragmentUpdate) -> Result<Fragment, CapsuleError> {
    let x = clamp_to(update.x, &POSITION_LIMITS, "fragment_x")?;
    let y = clamp_to(update.y, &POSITION_LIMITS, "fragment_y")?;
    let rotation = match update.rotation {
        Some(r) => clamp_to(r, &ROTATION_LIMITS, "fragment_rotation")?,
        None => current.rotation,
    };
    let scale = match update.scale {
        Some(s) => clamp_to(s, &SCALE_LIMITS, "fragment_scale")?,
        None => current.scale,
    };
    Ok(Fragment {
        x,
        y,
        rotation,
        scale,
    })
}
