//! Identity selection under id churn
//!
//! Tracker ids are only meaningful for a few frames: they get dropped and
//! reassigned while the physical hand is still in view, and list order
//! shuffles. A selector remembers the id it handed out last and sticks to it
//! while it stays in the frame.

use rigstream_core::{EntityId, Gesture, Hand, HandFrame, Pointable, Vec3};

/// Anything a selector can pick
pub trait TrackedEntity {
    fn entity_id(&self) -> EntityId;

    /// Reference position used by distance-based strategies
    fn position(&self) -> Vec3;
}

impl TrackedEntity for Hand {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.palm_position
    }
}

impl TrackedEntity for Pointable {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.tip_position
    }
}

impl TrackedEntity for Gesture {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.center.unwrap_or(Vec3::ZERO)
    }
}

/// What to pick when the remembered id is gone
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// First entity in frame order
    #[default]
    FirstAvailable,
    /// Entity closest to the last selected position
    NearestToPrevious,
}

/// Remembers the last selected id and position
#[derive(Clone, Debug, Default)]
pub struct IdentityTracker {
    strategy: SelectionStrategy,
    last_id: Option<EntityId>,
    last_position: Option<Vec3>,
}

impl IdentityTracker {
    pub fn new(strategy: SelectionStrategy) -> Self {
        IdentityTracker {
            strategy,
            last_id: None,
            last_position: None,
        }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    pub fn last_selected(&self) -> Option<EntityId> {
        self.last_id
    }

    /// Forget the current selection
    pub fn reset(&mut self) {
        self.last_id = None;
        self.last_position = None;
    }

    /// Pick the entity continuing the previous selection.
    ///
    /// Returns `None` only when there are no candidates; the remembered id
    /// is kept in that case so the entity can be picked up again.
    pub fn select<'a, T, I>(&mut self, candidates: I) -> Option<&'a T>
    where
        T: TrackedEntity + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let candidates: Vec<&'a T> = candidates.into_iter().collect();

        let continued = self
            .last_id
            .and_then(|id| candidates.iter().copied().find(|c| c.entity_id() == id));

        let chosen = match continued {
            Some(entity) => entity,
            None => self.fallback(&candidates)?,
        };

        self.last_id = Some(chosen.entity_id());
        self.last_position = Some(chosen.position());
        Some(chosen)
    }

    fn fallback<'a, T: TrackedEntity>(&self, candidates: &[&'a T]) -> Option<&'a T> {
        match (self.strategy, self.last_position) {
            (SelectionStrategy::NearestToPrevious, Some(previous)) => {
                candidates.iter().copied().min_by(|a, b| {
                    let da = a.position().distance(previous);
                    let db = b.position().distance(previous);
                    da.total_cmp(&db)
                })
            }
            _ => candidates.first().copied(),
        }
    }
}

/// Sticks to one hand
#[derive(Clone, Debug, Default)]
pub struct HandSelector {
    tracker: IdentityTracker,
}

impl HandSelector {
    pub fn new(strategy: SelectionStrategy) -> Self {
        HandSelector {
            tracker: IdentityTracker::new(strategy),
        }
    }

    pub fn select<'a>(&mut self, frame: &'a HandFrame) -> Option<&'a Hand> {
        self.tracker.select(&frame.hands)
    }

    /// Look up a hand by id without touching the selection
    pub fn hand_from_id(id: EntityId, frame: &HandFrame) -> Option<&Hand> {
        frame.hand(id)
    }

    pub fn last_selected(&self) -> Option<EntityId> {
        self.tracker.last_selected()
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}

/// Sticks to one finger. Pointables without a hand are false positives
/// and never selected.
#[derive(Clone, Debug, Default)]
pub struct PointableSelector {
    tracker: IdentityTracker,
}

impl PointableSelector {
    pub fn new(strategy: SelectionStrategy) -> Self {
        PointableSelector {
            tracker: IdentityTracker::new(strategy),
        }
    }

    pub fn select<'a>(&mut self, frame: &'a HandFrame) -> Option<&'a Pointable> {
        self.tracker
            .select(frame.pointables.iter().filter(|p| p.hand_id.is_some()))
    }

    pub fn last_selected(&self) -> Option<EntityId> {
        self.tracker.last_selected()
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}

/// Sticks to one circle gesture
#[derive(Clone, Debug, Default)]
pub struct CircleGestureSelector {
    tracker: IdentityTracker,
}

impl CircleGestureSelector {
    pub fn new(strategy: SelectionStrategy) -> Self {
        CircleGestureSelector {
            tracker: IdentityTracker::new(strategy),
        }
    }

    pub fn select<'a>(&mut self, frame: &'a HandFrame) -> Option<&'a Gesture> {
        self.tracker
            .select(frame.gestures.iter().filter(|g| g.is_circle()))
    }

    pub fn last_selected(&self) -> Option<EntityId> {
        self.tracker.last_selected()
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}
