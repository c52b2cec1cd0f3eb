// Sprite module
// Two-state sprite that shows one of two rasters

use crate::raster::Raster;

/// A sprite with an "active" and a "normal" look.
///
/// Nothing inside the crate flips the flag: the embedding application decides
/// when a sprite becomes active (click, collision, timer...).
#[derive(Debug, Clone)]
pub struct Sprite {
    active: Raster,
    normal: Raster,
    is_active: bool,
}

impl Sprite {
    /// Create an inactive sprite
    pub fn new(active: Raster, normal: Raster) -> Self {
        Self {
            active,
            normal,
            is_active: false,
        }
    }

    /// The raster matching the current state
    pub fn current_image(&self) -> &Raster {
        if self.is_active {
            &self.active
        } else {
            &self.normal
        }
    }

    /// Size shared by both rasters: the minimum of each axis
    pub fn effective_size(&self) -> (u32, u32) {
        (
            self.active.width().min(self.normal.width()),
            self.active.height().min(self.normal.height()),
        )
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn active_image(&self) -> &Raster {
        &self.active
    }

    pub fn normal_image(&self) -> &Raster {
        &self.normal
    }
}
