//! Input translation
//!
//! Raw pointer/touch events arrive asynchronously from the platform. They are
//! translated here into game-agnostic intents and queued; the frame loop
//! drains the queue once at the start of each tick, so input is quantized to
//! frames rather than applied mid-frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Raw pointer event in canvas-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// A touch/click began
    Down { x: f32, y: f32 },
    /// The active touch/cursor moved
    Move { x: f32, y: f32 },
    /// The active touch/click ended
    Up { x: f32, y: f32 },
}

/// Device-independent input intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Short press-and-release at the press position
    Tap { x: f32, y: f32 },
    /// Pointer pressed; a drag may follow
    DragStart { x: f32, y: f32 },
    /// Pointer moved by (dx, dy) since the previous drag intent
    DragDelta { dx: f32, dy: f32 },
    /// Pointer released
    DragEnd,
}

/// Heading on the grid (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Dominant-axis direction of a drag, if it travelled more than `min`
    pub fn from_swipe(delta: Vec2, min: f32) -> Option<Self> {
        let (ax, ay) = (delta.x.abs(), delta.y.abs());
        if ax > ay && ax > min {
            Some(if delta.x > 0.0 { Direction::Right } else { Direction::Left })
        } else if ay > ax && ay > min {
            Some(if delta.y > 0.0 { Direction::Down } else { Direction::Up })
        } else {
            None
        }
    }
}

/// Tracking for the pointer currently held down
#[derive(Debug, Clone, Copy)]
struct ActivePointer {
    origin: Vec2,
    last: Vec2,
}

/// Translates pointer events into a queue of intents.
///
/// A press always produces `DragStart`. Movement produces `DragDelta` relative
/// to the previous reported position. Release produces `DragEnd`, followed by
/// `Tap` at the press position when the pointer travelled no further than
/// `tap_slop` pixels.
#[derive(Debug, Clone)]
pub struct InputTranslator {
    pending: Vec<Intent>,
    pointer: Option<ActivePointer>,
    tap_slop: f32,
}

impl InputTranslator {
    pub fn new(tap_slop: f32) -> Self {
        Self {
            pending: Vec::with_capacity(16),
            pointer: None,
            tap_slop,
        }
    }

    /// Feed one raw event (called by the platform's listeners)
    pub fn push(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => {
                let p = Vec2::new(x, y);
                self.pointer = Some(ActivePointer { origin: p, last: p });
                self.pending.push(Intent::DragStart { x, y });
            }
            PointerEvent::Move { x, y } => {
                let Some(pointer) = self.pointer.as_mut() else {
                    return;
                };
                let p = Vec2::new(x, y);
                let delta = p - pointer.last;
                pointer.last = p;
                if delta != Vec2::ZERO {
                    self.pending.push(Intent::DragDelta {
                        dx: delta.x,
                        dy: delta.y,
                    });
                }
            }
            PointerEvent::Up { x, y } => {
                let Some(pointer) = self.pointer.take() else {
                    return;
                };
                let p = Vec2::new(x, y);
                let delta = p - pointer.last;
                if delta != Vec2::ZERO {
                    self.pending.push(Intent::DragDelta {
                        dx: delta.x,
                        dy: delta.y,
                    });
                }
                self.pending.push(Intent::DragEnd);
                if p.distance(pointer.origin) <= self.tap_slop {
                    self.pending.push(Intent::Tap {
                        x: pointer.origin.x,
                        y: pointer.origin.y,
                    });
                }
            }
        }
    }

    /// Take every queued intent in arrival order
    pub fn drain(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.pending)
    }

    /// Drop queued intents and forget the active pointer
    pub fn clear(&mut self) {
        self.pending.clear();
        self.pointer = None;
    }

    pub fn is_pressed(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for InputTranslator {
    fn default() -> Self {
        Self::new(crate::consts::TAP_SLOP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_is_tap() {
        let mut input = InputTranslator::new(10.0);
        input.push(PointerEvent::Down { x: 30.0, y: 40.0 });
        input.push(PointerEvent::Up { x: 32.0, y: 41.0 });
        let intents = input.drain();
        assert_eq!(
            intents,
            vec![
                Intent::DragStart { x: 30.0, y: 40.0 },
                Intent::DragDelta { dx: 2.0, dy: 1.0 },
                Intent::DragEnd,
                Intent::Tap { x: 30.0, y: 40.0 },
            ]
        );
        assert!(input.is_empty());
    }

    #[test]
    fn test_long_drag_is_not_tap() {
        let mut input = InputTranslator::new(10.0);
        input.push(PointerEvent::Down { x: 0.0, y: 0.0 });
        input.push(PointerEvent::Move { x: 15.0, y: 0.0 });
        input.push(PointerEvent::Move { x: 40.0, y: 5.0 });
        input.push(PointerEvent::Up { x: 40.0, y: 5.0 });
        let intents = input.drain();
        assert_eq!(
            intents,
            vec![
                Intent::DragStart { x: 0.0, y: 0.0 },
                Intent::DragDelta { dx: 15.0, dy: 0.0 },
                Intent::DragDelta { dx: 25.0, dy: 5.0 },
                Intent::DragEnd,
            ]
        );
    }

    #[test]
    fn test_move_without_press_ignored() {
        let mut input = InputTranslator::new(10.0);
        input.push(PointerEvent::Move { x: 5.0, y: 5.0 });
        input.push(PointerEvent::Up { x: 5.0, y: 5.0 });
        assert!(input.is_empty());
        assert!(!input.is_pressed());
    }

    #[test]
    fn test_swipe_direction_dominant_axis() {
        assert_eq!(
            Direction::from_swipe(Vec2::new(-31.0, 10.0), 30.0),
            Some(Direction::Left)
        );
        assert_eq!(
            Direction::from_swipe(Vec2::new(5.0, 31.0), 30.0),
            Some(Direction::Down)
        );
        assert_eq!(Direction::from_swipe(Vec2::new(25.0, 25.0), 20.0), None);
        assert_eq!(Direction::from_swipe(Vec2::new(30.0, 0.0), 30.0), None);
    }

    #[test]
    fn test_clear_forgets_pointer() {
        let mut input = InputTranslator::new(10.0);
        input.push(PointerEvent::Down { x: 1.0, y: 1.0 });
        assert!(input.is_pressed());
        input.clear();
        assert!(!input.is_pressed());
        assert_eq!(input.len(), 0);
    }
}
