//! 2048-style tile merging
//!
//! Each move compacts every line toward the moving edge and then runs a
//! single merge pass in encounter order, so a tile produced by a merge never
//! merges again within the same move.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::game::{GameKind, Outcome, Simulation};
use super::input::{Direction, Intent};
use crate::settings::{MergeTuning, Settings};

/// Grid position (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
}

impl Slot {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// N×N board of tile values (0 = empty, else a power of two ≥ 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    /// Row-major
    cells: Vec<u32>,
}

/// One tile's travel during a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileTravel {
    pub from: Slot,
    pub to: Slot,
    /// The tile was absorbed into the tile at `to`
    pub merged: bool,
}

/// Result of sliding a grid in one direction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub moved: bool,
    /// Sum of the values produced by merges
    pub gained: u64,
    pub travels: Vec<TileTravel>,
}

/// Compact and merge one line already ordered from the moving edge.
///
/// Returns the new line, the score gained, and for every input tile the
/// pair `(from_index, to_index, merged)`.
fn slide_line(line: &[u32]) -> (Vec<u32>, u64, Vec<(usize, usize, bool)>) {
    let tiles: Vec<(usize, u32)> = line
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, v)| v != 0)
        .collect();

    let mut out = vec![0; line.len()];
    let mut gained = 0u64;
    let mut trails = Vec::with_capacity(tiles.len());
    let mut write = 0;
    let mut i = 0;
    while i < tiles.len() {
        let (from, value) = tiles[i];
        match tiles.get(i + 1) {
            Some(&(other, next)) if next == value => {
                out[write] = value * 2;
                gained += u64::from(value * 2);
                trails.push((from, write, false));
                trails.push((other, write, true));
                i += 2;
            }
            _ => {
                out[write] = value;
                trails.push((from, write, false));
                i += 1;
            }
        }
        write += 1;
    }
    (out, gained, trails)
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Build from explicit rows (test fixtures, saved boards)
    pub fn from_rows(rows: &[Vec<u32>]) -> Self {
        let size = rows.len();
        let mut grid = Self::new(size);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().take(size).enumerate() {
                grid.set(Slot::new(r, c), v);
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, slot: Slot) -> u32 {
        self.cells[slot.row * self.size + slot.col]
    }

    pub fn set(&mut self, slot: Slot, value: u32) {
        self.cells[slot.row * self.size + slot.col] = value;
    }

    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Sum of every tile value
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&v| u64::from(v)).sum()
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Empty slots in row-major order
    pub fn empty_slots(&self) -> Vec<Slot> {
        (0..self.size)
            .flat_map(|r| (0..self.size).map(move |c| Slot::new(r, c)))
            .filter(|&s| self.get(s) == 0)
            .collect()
    }

    /// Whether any move could change the board: an empty slot exists or two
    /// orthogonal neighbours are equal
    pub fn can_move(&self) -> bool {
        if self.cells.contains(&0) {
            return true;
        }
        for r in 0..self.size {
            for c in 0..self.size {
                let v = self.get(Slot::new(r, c));
                if c + 1 < self.size && self.get(Slot::new(r, c + 1)) == v {
                    return true;
                }
                if r + 1 < self.size && self.get(Slot::new(r + 1, c)) == v {
                    return true;
                }
            }
        }
        false
    }

    /// Slots of line `k`, ordered from the edge the tiles move toward
    fn line(&self, dir: Direction, k: usize) -> Vec<Slot> {
        let n = self.size;
        match dir {
            Direction::Left => (0..n).map(|c| Slot::new(k, c)).collect(),
            Direction::Right => (0..n).rev().map(|c| Slot::new(k, c)).collect(),
            Direction::Up => (0..n).map(|r| Slot::new(r, k)).collect(),
            Direction::Down => (0..n).rev().map(|r| Slot::new(r, k)).collect(),
        }
    }

    /// Slide every line toward `dir`
    pub fn slide(&mut self, dir: Direction) -> Slide {
        let mut result = Slide::default();
        for k in 0..self.size {
            let slots = self.line(dir, k);
            let before: Vec<u32> = slots.iter().map(|&s| self.get(s)).collect();
            let (after, gained, trails) = slide_line(&before);
            if after != before {
                result.moved = true;
            }
            result.gained += gained;
            for (&slot, &value) in slots.iter().zip(&after) {
                self.set(slot, value);
            }
            result
                .travels
                .extend(trails.into_iter().map(|(from, to, merged)| TileTravel {
                    from: slots[from],
                    to: slots[to],
                    merged,
                }));
        }
        result
    }
}

/// Kind of cosmetic tile animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationKind {
    Appear,
    Move,
    Merge,
}

/// Cosmetic animation record; blocks input while in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub kind: AnimationKind,
    pub origin: Option<Slot>,
    pub destination: Slot,
    pub progress_ms: f32,
    pub duration_ms: f32,
}

/// Outcome of a move request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveReport {
    /// The board changed (and a tile was spawned)
    pub moved: bool,
    pub gained: u64,
    /// No further move is possible
    pub lost: bool,
}

/// Tile-merge simulation core
#[derive(Debug, Clone)]
pub struct MergeGame {
    tuning: MergeTuning,
    swipe_min: f32,
    grid: Grid,
    score: u64,
    animations: Vec<Animation>,
    /// Total drag travel since the last drag start
    drag: Option<Vec2>,
}

impl MergeGame {
    pub fn new(tuning: MergeTuning) -> Self {
        Self {
            tuning,
            swipe_min: 30.0,
            grid: Grid::new(tuning.grid_size.max(2)),
            score: 0,
            animations: Vec::new(),
            drag: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut game = Self::new(settings.merge);
        game.swipe_min = settings.input.merge_swipe_min;
        game
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn is_animating(&self) -> bool {
        !self.animations.is_empty()
    }

    pub fn can_move(&self) -> bool {
        self.grid.can_move()
    }

    /// Spawn a 2 (or, with `four_chance`, a 4) on a uniformly chosen empty slot
    fn spawn_tile(&mut self, rng: &mut Pcg32) -> Option<Slot> {
        let empty = self.grid.empty_slots();
        if empty.is_empty() {
            return None;
        }
        let slot = empty[rng.random_range(0..empty.len())];
        let value = if rng.random::<f64>() < self.tuning.four_chance {
            4
        } else {
            2
        };
        self.grid.set(slot, value);
        self.animations.push(Animation {
            kind: AnimationKind::Appear,
            origin: None,
            destination: slot,
            progress_ms: 0.0,
            duration_ms: self.tuning.appear_ms,
        });
        Some(slot)
    }

    /// Slide the board. Rejected without mutation while animations run.
    pub fn move_tiles(&mut self, dir: Direction, rng: &mut Pcg32) -> MoveReport {
        if self.is_animating() {
            return MoveReport::default();
        }

        let slide = self.grid.slide(dir);
        if !slide.moved {
            return MoveReport::default();
        }

        self.score += slide.gained;
        for travel in slide.travels.iter().filter(|t| t.merged || t.from != t.to) {
            self.animations.push(Animation {
                kind: if travel.merged {
                    AnimationKind::Merge
                } else {
                    AnimationKind::Move
                },
                origin: Some(travel.from),
                destination: travel.to,
                progress_ms: 0.0,
                duration_ms: self.tuning.slide_ms,
            });
        }

        self.spawn_tile(rng);
        let lost = !self.grid.can_move();
        if lost {
            log::info!(
                "2048 board locked: score {}, best tile {}",
                self.score,
                self.grid.max_tile()
            );
        }
        MoveReport {
            moved: true,
            gained: slide.gained,
            lost,
        }
    }
}

impl Simulation for MergeGame {
    fn kind(&self) -> GameKind {
        GameKind::TileMerge
    }

    fn reset(&mut self, rng: &mut Pcg32) {
        self.grid.clear();
        self.score = 0;
        self.animations.clear();
        self.drag = None;
        self.spawn_tile(rng);
        self.spawn_tile(rng);
    }

    fn handle_intent(&mut self, intent: Intent, rng: &mut Pcg32) -> Outcome {
        match intent {
            Intent::DragStart { .. } => self.drag = Some(Vec2::ZERO),
            Intent::DragDelta { dx, dy } => {
                if let Some(drag) = self.drag.as_mut() {
                    *drag += Vec2::new(dx, dy);
                }
            }
            Intent::DragEnd => {
                let Some(total) = self.drag.take() else {
                    return Outcome::Continue;
                };
                if let Some(dir) = Direction::from_swipe(total, self.swipe_min) {
                    if self.move_tiles(dir, rng).lost {
                        return Outcome::Over;
                    }
                }
            }
            Intent::Tap { .. } => {}
        }
        Outcome::Continue
    }

    fn advance(&mut self, dt_ms: f32, _rng: &mut Pcg32) -> Outcome {
        // retain keeps survivors in their original order
        self.animations.retain_mut(|anim| {
            anim.progress_ms += dt_ms;
            anim.progress_ms < anim.duration_ms
        });
        Outcome::Continue
    }

    fn score(&self) -> u64 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(2048)
    }

    fn game_with(rows: &[Vec<u32>]) -> MergeGame {
        let mut g = MergeGame::new(MergeTuning::default());
        g.grid = Grid::from_rows(rows);
        g
    }

    #[test]
    fn test_slide_line_examples() {
        assert_eq!(slide_line(&[2, 2, 4, 0]).0, vec![4, 4, 0, 0]);
        assert_eq!(slide_line(&[2, 2, 4, 0]).1, 4);
        assert_eq!(slide_line(&[2, 0, 0, 2]).0, vec![4, 0, 0, 0]);
        assert_eq!(slide_line(&[2, 0, 0, 2]).1, 4);
        assert_eq!(slide_line(&[2, 2, 2, 2]).0, vec![4, 4, 0, 0]);
        assert_eq!(slide_line(&[2, 2, 2, 2]).1, 8);
        assert_eq!(slide_line(&[4, 4, 8, 0]).0, vec![8, 8, 0, 0]);
        assert_eq!(slide_line(&[2, 4, 8, 16]).1, 0);
    }

    #[test]
    fn test_slide_right_and_vertical() {
        let mut grid = Grid::from_rows(&[
            vec![2, 2, 4, 0],
            vec![0, 0, 0, 0],
            vec![2, 0, 0, 0],
            vec![2, 0, 0, 0],
        ]);
        let slide = grid.clone().slide(Direction::Right);
        assert!(slide.moved);

        let mut right = grid.clone();
        right.slide(Direction::Right);
        assert_eq!(right.rows()[0], vec![0, 0, 4, 4]);

        let slide = grid.slide(Direction::Down);
        assert_eq!(slide.gained, 4);
        let rows = grid.rows();
        assert_eq!(rows[3], vec![4, 2, 4, 0]);
        assert_eq!(rows[0], vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_move_scores_and_spawns() {
        let mut rng = rng();
        let mut g = game_with(&[
            vec![2, 2, 4, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let report = g.move_tiles(Direction::Left, &mut rng);
        assert!(report.moved);
        assert_eq!(report.gained, 4);
        assert_eq!(g.score(), 4);
        // 8 from the slide plus one spawned 2 or 4
        let spawned = g.grid().total() - 8;
        assert!(spawned == 2 || spawned == 4);
        assert!(
            g.animations()
                .iter()
                .any(|a| a.kind == AnimationKind::Appear)
        );
        assert!(
            g.animations()
                .iter()
                .any(|a| a.kind == AnimationKind::Merge)
        );
    }

    #[test]
    fn test_unmoved_never_spawns() {
        let mut rng = rng();
        let mut g = game_with(&[
            vec![2, 4, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let before = g.grid().clone();
        let report = g.move_tiles(Direction::Left, &mut rng);
        assert!(!report.moved);
        assert_eq!(g.grid(), &before);
        assert!(!g.is_animating());
    }

    #[test]
    fn test_move_rejected_while_animating() {
        let mut rng = rng();
        let mut g = game_with(&[
            vec![2, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        assert!(g.move_tiles(Direction::Right, &mut rng).moved);
        let snapshot = g.grid().clone();
        assert!(!g.move_tiles(Direction::Left, &mut rng).moved);
        assert_eq!(g.grid(), &snapshot);

        // Appear animation (200 ms) outlasts the slide (100 ms)
        g.advance(150.0, &mut rng);
        assert!(g.is_animating());
        g.advance(50.0, &mut rng);
        assert!(!g.is_animating());
        assert!(g.move_tiles(Direction::Left, &mut rng).moved);
    }

    #[test]
    fn test_locked_board_cannot_move() {
        let g = game_with(&[
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ]);
        assert!(!g.can_move());

        let g = game_with(&[
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 4],
        ]);
        assert!(g.can_move());
    }

    #[test]
    fn test_loss_after_final_move() {
        let mut rng = rng();
        // Only the last row slides; the spawned 2 fills the gap it leaves
        let mut g = game_with(&[
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![0, 8, 16, 8],
        ]);
        g.tuning.four_chance = 0.0;
        g.handle_intent(Intent::DragStart { x: 300.0, y: 300.0 }, &mut rng);
        g.handle_intent(Intent::DragDelta { dx: -40.0, dy: 3.0 }, &mut rng);
        let outcome = g.handle_intent(Intent::DragEnd, &mut rng);
        assert_eq!(g.grid().rows()[3], vec![8, 16, 8, 2]);
        assert_eq!(outcome, Outcome::Over);
    }

    #[test]
    fn test_short_swipe_ignored() {
        let mut rng = rng();
        let mut g = game_with(&[
            vec![2, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        g.handle_intent(Intent::DragStart { x: 0.0, y: 0.0 }, &mut rng);
        g.handle_intent(Intent::DragDelta { dx: 25.0, dy: 0.0 }, &mut rng);
        g.handle_intent(Intent::DragEnd, &mut rng);
        assert_eq!(g.grid().rows()[0], vec![2, 0, 0, 0]);
    }

    #[test]
    fn test_reset_spawns_two_tiles() {
        let mut rng = rng();
        let mut g = MergeGame::new(MergeTuning::default());
        g.reset(&mut rng);
        assert_eq!(g.grid().empty_slots().len(), 14);
        assert_eq!(g.score(), 0);
    }

    fn tile() -> impl Strategy<Value = u32> {
        prop_oneof![Just(0u32), (1u32..=6).prop_map(|p| 1 << p)]
    }

    fn board() -> impl Strategy<Value = Vec<Vec<u32>>> {
        proptest::collection::vec(proptest::collection::vec(tile(), 4), 4)
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_slide_conserves_sum(rows in board(), dir in direction()) {
            let mut grid = Grid::from_rows(&rows);
            let before = grid.clone();
            let nonzero_before = before.size() * before.size() - before.empty_slots().len();
            let slide = grid.slide(dir);

            prop_assert_eq!(before.total(), grid.total());
            prop_assert_eq!(slide.moved, before != grid);
            for row in grid.rows() {
                for v in row {
                    prop_assert!(v == 0 || (v >= 2 && v.is_power_of_two()));
                }
            }
            // Each surviving tile absorbed at most one other
            let nonzero_after = grid.size() * grid.size() - grid.empty_slots().len();
            prop_assert!(nonzero_after * 2 >= nonzero_before);
            let merges = (nonzero_before - nonzero_after) as u64;
            prop_assert!(slide.gained >= merges * 4);
        }

        #[test]
        fn prop_move_spawns_only_when_moved(
            rows in board(),
            dir in direction(),
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut g = game_with(&rows);
            let before_total = g.grid().total();
            let report = g.move_tiles(dir, &mut rng);
            let added = g.grid().total() - before_total;
            if report.moved {
                prop_assert!(added == 2 || added == 4);
            } else {
                prop_assert_eq!(added, 0);
                prop_assert_eq!(g.score(), 0);
            }
        }
    }
}
