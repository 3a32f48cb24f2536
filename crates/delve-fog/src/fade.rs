//! Per-tile fog fade animations.

use ahash::AHashMap;
use delve_common::TileCoord;

/// Fog fade-out of a single tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeAnimation {
    start_alpha: f32,
    elapsed: f32,
}

impl FadeAnimation {
    /// Starts a fade from the given alpha.
    #[must_use]
    pub const fn new(start_alpha: f32) -> Self {
        Self {
            start_alpha,
            elapsed: 0.0,
        }
    }

    /// Alpha the fade started from.
    #[must_use]
    pub const fn start_alpha(&self) -> f32 {
        self.start_alpha
    }

    /// Seconds since the fade started.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalized progress in `[0, 1]`. A non-positive duration is complete.
    #[must_use]
    pub fn progress(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / duration).clamp(0.0, 1.0)
    }

    /// Current alpha, easing out quadratically towards zero.
    #[must_use]
    pub fn alpha(&self, duration: f32) -> f32 {
        let t = self.progress(duration);
        self.start_alpha * (1.0 - t * t)
    }

    /// Whether the fade has run its full duration.
    #[must_use]
    pub fn is_finished(&self, duration: f32) -> bool {
        self.progress(duration) >= 1.0
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }
}

/// Tracks every running fade. At most one animation exists per tile.
#[derive(Debug, Clone, Default)]
pub struct FadeScheduler {
    duration: f32,
    animations: AHashMap<TileCoord, FadeAnimation>,
}

impl FadeScheduler {
    /// Creates a scheduler whose fades last `duration` seconds.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            animations: AHashMap::new(),
        }
    }

    /// Fade length in seconds.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Starts a fade for `tile`, replacing any running one.
    pub fn start(&mut self, tile: TileCoord, start_alpha: f32) {
        self.animations.insert(tile, FadeAnimation::new(start_alpha));
    }

    /// Removes the fade for `tile`.
    pub fn cancel(&mut self, tile: TileCoord) -> Option<FadeAnimation> {
        self.animations.remove(&tile)
    }

    /// Drops every fade.
    pub fn clear(&mut self) {
        self.animations.clear();
    }

    /// Current alpha of a fading tile.
    #[must_use]
    pub fn alpha(&self, tile: TileCoord) -> Option<f32> {
        self.animations.get(&tile).map(|a| a.alpha(self.duration))
    }

    /// Looks up a running fade.
    #[must_use]
    pub fn get(&self, tile: TileCoord) -> Option<&FadeAnimation> {
        self.animations.get(&tile)
    }

    /// Whether `tile` is fading.
    #[must_use]
    pub fn is_fading(&self, tile: TileCoord) -> bool {
        self.animations.contains_key(&tile)
    }

    /// Number of running fades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Whether nothing is fading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Advances every fade and removes those that finished.
    ///
    /// Finished tiles are returned sorted.
    pub fn advance(&mut self, dt: f32) -> Vec<TileCoord> {
        let duration = self.duration;
        let mut finished = Vec::new();
        self.animations.retain(|tile, animation| {
            animation.advance(dt);
            let done = animation.is_finished(duration);
            if done {
                finished.push(*tile);
            }
            !done
        });
        finished.sort_unstable();
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_eases_out() {
        let mut fade = FadeAnimation::new(1.0);
        assert!((fade.alpha(0.5) - 1.0).abs() < f32::EPSILON);

        fade.advance(0.25);
        // t = 0.5, alpha = 1 - 0.25
        assert!((fade.alpha(0.5) - 0.75).abs() < 1e-5);

        fade.advance(0.25);
        assert!(fade.is_finished(0.5));
        assert!(fade.alpha(0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_start_alpha() {
        let mut fade = FadeAnimation::new(0.5);
        fade.advance(0.25);
        assert!((fade.alpha(0.5) - 0.375).abs() < 1e-5);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let fade = FadeAnimation::new(1.0);
        assert!(fade.is_finished(0.0));
    }

    #[test]
    fn test_restart_replaces_animation() {
        let mut scheduler = FadeScheduler::new(0.5);
        let tile = TileCoord::new(1, 1);

        scheduler.start(tile, 1.0);
        scheduler.advance(0.2);
        let alpha = scheduler.alpha(tile).expect("fading");
        scheduler.start(tile, alpha);

        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.get(tile).is_some_and(|a| a.elapsed() == 0.0));
        assert!((scheduler.alpha(tile).unwrap_or_default() - alpha).abs() < f32::EPSILON);
    }

    #[test]
    fn test_advance_reports_finished_sorted() {
        let mut scheduler = FadeScheduler::new(0.5);
        scheduler.start(TileCoord::new(3, 0), 1.0);
        scheduler.start(TileCoord::new(-1, 2), 1.0);
        scheduler.advance(0.3);
        scheduler.start(TileCoord::new(0, 0), 1.0);

        let finished = scheduler.advance(0.3);
        assert_eq!(finished, vec![TileCoord::new(-1, 2), TileCoord::new(3, 0)]);
        assert!(scheduler.is_fading(TileCoord::new(0, 0)));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = FadeScheduler::new(0.5);
        scheduler.start(TileCoord::new(0, 0), 1.0);
        assert!(scheduler.cancel(TileCoord::new(0, 0)).is_some());
        assert!(scheduler.cancel(TileCoord::new(0, 0)).is_none());
        assert!(scheduler.is_empty());
    }
}
