//! Swipe gesture recognition for the card deck.
//!
//! Pointer input drives an explicit state machine:
//!
//! ```text
//! Idle ──down──▶ Dragging ──up──▶ SnappingBack ──340ms──▶ Idle
//!                         └─up──▶ FlyingAway ──340ms, emit──▶ Settling ──60ms──▶ Idle
//! ```
//!
//! Time is passed in by the caller, so the recognizer never sleeps and can be
//! driven from an event loop or from tests alike.

use std::time::{Duration, Instant};

use crate::models::Action;

/// Horizontal travel (px) past which a release always counts as a swipe
pub const DISTANCE_THRESHOLD: f64 = 140.0;
/// Average horizontal speed (px/ms) past which a release counts as a flick
pub const VELOCITY_THRESHOLD: f64 = 0.6;
/// Card tilt per pixel of horizontal drag (degrees)
pub const ROTATION_PER_PX: f64 = 0.08;
/// Off-screen translation of a flown-away card (px)
pub const FLYAWAY_DISTANCE: f64 = 900.0;
/// Extra fly-away travel per px/ms of release velocity
pub const FLYAWAY_VELOCITY_SCALE: f64 = 600.0;
/// Cap on the velocity-scaled extra travel
pub const FLYAWAY_MAX_EXTRA: f64 = 1.6 * FLYAWAY_DISTANCE;
/// Tilt of a flown-away card (degrees)
pub const FLYAWAY_ROTATION: f64 = 30.0;
/// Duration of both the snap-back and the fly-away animation
pub const RELEASE_ANIMATION: Duration = Duration::from_millis(340);
/// Pause after the decision is emitted before the card resets
pub const SETTLE_DELAY: Duration = Duration::from_millis(60);

/// Horizontal offset at which a decision overlay is fully opaque
const OVERLAY_RANGE: f64 = 200.0;
/// Floor for elapsed drag time, keeps velocity finite
const MIN_ELAPSED_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visual offset of the card
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CardTransform {
    pub x: f64,
    pub y: f64,
    /// Degrees, positive is clockwise
    pub rotation: f64,
}

impl CardTransform {
    pub fn like_opacity(&self) -> f64 {
        (self.x / OVERLAY_RANGE).clamp(0.0, 1.0)
    }

    pub fn dislike_opacity(&self) -> f64 {
        (-self.x / OVERLAY_RANGE).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    fn sign(self) -> f64 {
        match self {
            SwipeDirection::Left => -1.0,
            SwipeDirection::Right => 1.0,
        }
    }

    /// Right is a like, left a dislike
    pub fn action(self) -> Action {
        match self {
            SwipeDirection::Left => Action::Dislike,
            SwipeDirection::Right => Action::Like,
        }
    }
}

/// How a drag ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    Swipe {
        direction: SwipeDirection,
        /// px/ms
        velocity: f64,
    },
    SnapBack,
}

/// Decides between swipe and snap-back from total horizontal travel and drag time
pub fn classify_release(dx: f64, elapsed: Duration) -> Release {
    let dt = (elapsed.as_secs_f64() * 1000.0).max(MIN_ELAPSED_MS);
    let velocity = dx / dt;

    let is_distance_swipe = dx.abs() > DISTANCE_THRESHOLD;
    let is_flick = velocity.abs() > VELOCITY_THRESHOLD;

    if is_distance_swipe || is_flick {
        let direction = if dx > 0.0 || (dx == 0.0 && velocity > 0.0) {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        };
        Release::Swipe {
            direction,
            velocity,
        }
    } else {
        Release::SnapBack
    }
}

/// An in-progress drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub pointer_id: u32,
    pub start: Point,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeState {
    Idle,
    Dragging(Drag),
    SnappingBack { until: Instant },
    FlyingAway { direction: SwipeDirection, until: Instant },
    Settling { until: Instant },
}

/// Pointer-driven swipe state machine for a single card
#[derive(Debug)]
pub struct SwipeRecognizer {
    state: SwipeState,
    transform: CardTransform,
}

impl Default for SwipeRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SwipeRecognizer {
    pub fn new() -> Self {
        Self {
            state: SwipeState::Idle,
            transform: CardTransform::default(),
        }
    }

    pub fn state(&self) -> SwipeState {
        self.state
    }

    pub fn transform(&self) -> CardTransform {
        self.transform
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SwipeState::Dragging(_))
    }

    /// True while an animation blocks new drags
    pub fn is_animating(&self) -> bool {
        !matches!(self.state, SwipeState::Idle | SwipeState::Dragging(_))
    }

    /// Pointer currently captured by a drag
    pub fn captured_pointer(&self) -> Option<u32> {
        match self.state {
            SwipeState::Dragging(drag) => Some(drag.pointer_id),
            _ => None,
        }
    }

    /// Transition time to apply to transform changes; none while the card follows the pointer
    pub fn transition(&self) -> Option<Duration> {
        match self.state {
            SwipeState::Dragging(_) => None,
            _ => Some(RELEASE_ANIMATION),
        }
    }

    /// Starts a drag; returns false if the card is busy
    pub fn pointer_down(&mut self, pointer_id: u32, at: Point, now: Instant) -> bool {
        if self.state != SwipeState::Idle {
            return false;
        }
        self.state = SwipeState::Dragging(Drag {
            pointer_id,
            start: at,
            started_at: now,
        });
        true
    }

    /// Follows the pointer; ignored unless it is the captured one
    pub fn pointer_move(&mut self, pointer_id: u32, at: Point) -> bool {
        let SwipeState::Dragging(drag) = self.state else {
            return false;
        };
        if drag.pointer_id != pointer_id {
            return false;
        }

        let dx = at.x - drag.start.x;
        let dy = at.y - drag.start.y;
        self.transform = CardTransform {
            x: dx,
            y: dy,
            rotation: dx * ROTATION_PER_PX,
        };
        true
    }

    /// Ends the drag and starts the matching animation
    pub fn pointer_up(&mut self, pointer_id: u32, at: Point, now: Instant) -> Option<Release> {
        let SwipeState::Dragging(drag) = self.state else {
            return None;
        };
        if drag.pointer_id != pointer_id {
            return None;
        }

        let dx = at.x - drag.start.x;
        let release = classify_release(dx, now.saturating_duration_since(drag.started_at));
        let until = now + RELEASE_ANIMATION;

        match release {
            Release::Swipe {
                direction,
                velocity,
            } => {
                let extra = (velocity.abs() * FLYAWAY_VELOCITY_SCALE).min(FLYAWAY_MAX_EXTRA);
                let sign = direction.sign();
                self.transform = CardTransform {
                    x: sign * (FLYAWAY_DISTANCE + extra),
                    y: self.transform.y,
                    rotation: sign * FLYAWAY_ROTATION,
                };
                self.state = SwipeState::FlyingAway { direction, until };
            }
            Release::SnapBack => {
                self.transform = CardTransform::default();
                self.state = SwipeState::SnappingBack { until };
            }
        }

        Some(release)
    }

    /// Advances animations; returns the swipe decision once, when the fly-away ends
    pub fn tick(&mut self, now: Instant) -> Option<SwipeDirection> {
        let mut emitted = None;

        if let SwipeState::FlyingAway { direction, until } = self.state {
            if now < until {
                return None;
            }
            emitted = Some(direction);
            self.state = SwipeState::Settling {
                until: until + SETTLE_DELAY,
            };
        }

        match self.state {
            SwipeState::SnappingBack { until } | SwipeState::Settling { until } if now >= until => {
                self.transform = CardTransform::default();
                self.state = SwipeState::Idle;
            }
            _ => {}
        }

        emitted
    }
}

/// Pointer capture on whatever hosts the card
pub trait PointerSurface {
    fn capture(&mut self, pointer_id: u32);
    fn release(&mut self, pointer_id: u32);
}

type SwipeHandler = Box<dyn FnMut() + Send>;

/// A card wired to its surface and to like/dislike handlers
///
/// Dropping the card mid-drag releases the captured pointer.
pub struct SwipeCard<S: PointerSurface> {
    recognizer: SwipeRecognizer,
    surface: S,
    on_swipe_right: SwipeHandler,
    on_swipe_left: SwipeHandler,
}

impl<S: PointerSurface> SwipeCard<S> {
    pub fn new(
        surface: S,
        on_swipe_right: impl FnMut() + Send + 'static,
        on_swipe_left: impl FnMut() + Send + 'static,
    ) -> Self {
        Self {
            recognizer: SwipeRecognizer::new(),
            surface,
            on_swipe_right: Box::new(on_swipe_right),
            on_swipe_left: Box::new(on_swipe_left),
        }
    }

    pub fn recognizer(&self) -> &SwipeRecognizer {
        &self.recognizer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn pointer_down(&mut self, pointer_id: u32, at: Point, now: Instant) {
        if self.recognizer.pointer_down(pointer_id, at, now) {
            self.surface.capture(pointer_id);
        }
    }

    pub fn pointer_move(&mut self, pointer_id: u32, at: Point) {
        self.recognizer.pointer_move(pointer_id, at);
    }

    pub fn pointer_up(&mut self, pointer_id: u32, at: Point, now: Instant) -> Option<Release> {
        let release = self.recognizer.pointer_up(pointer_id, at, now)?;
        self.surface.release(pointer_id);
        Some(release)
    }

    /// Drives animations and fires the handler when a fly-away completes
    pub fn tick(&mut self, now: Instant) -> Option<SwipeDirection> {
        let direction = self.recognizer.tick(now)?;
        match direction {
            SwipeDirection::Right => (self.on_swipe_right)(),
            SwipeDirection::Left => (self.on_swipe_left)(),
        }
        Some(direction)
    }
}

impl<S: PointerSurface> Drop for SwipeCard<S> {
    fn drop(&mut self) {
        if let Some(pointer_id) = self.recognizer.captured_pointer() {
            self.surface.release(pointer_id);
        }
    }
}
