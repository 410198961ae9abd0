//! Grid snake
//!
//! The snake moves one cell per movement interval (`1000 / speed` ms),
//! accumulated from frame deltas so speed does not depend on refresh rate.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::game::{GameKind, Outcome, Simulation};
use super::input::{Direction, Intent};
use crate::settings::{Settings, SnakeTuning};

/// Grid cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Bonus food with its own expiry countdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialFood {
    pub cell: Cell,
    pub remaining_ms: f32,
}

/// Snake simulation core
#[derive(Debug, Clone)]
pub struct SnakeGame {
    tuning: SnakeTuning,
    cols: i32,
    rows: i32,
    swipe_min: f32,
    max_steps: u32,
    /// Head first
    body: VecDeque<Cell>,
    direction: Direction,
    next_direction: Direction,
    food: Option<Cell>,
    special: Option<SpecialFood>,
    /// Time spent without special food since the last roll
    special_timer_ms: f32,
    speed: u32,
    accumulator_ms: f32,
    score: u64,
    /// Drag travel not yet turned into a direction change
    swipe: Vec2,
}

impl SnakeGame {
    pub fn new(tuning: SnakeTuning, cols: i32, rows: i32) -> Self {
        Self {
            tuning,
            cols: cols.max(3),
            rows: rows.max(1),
            swipe_min: 20.0,
            max_steps: crate::consts::MAX_SUBSTEPS,
            body: VecDeque::new(),
            direction: Direction::Right,
            next_direction: Direction::Right,
            food: None,
            special: None,
            special_timer_ms: 0.0,
            speed: tuning.initial_speed,
            accumulator_ms: 0.0,
            score: 0,
            swipe: Vec2::ZERO,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let (cols, rows) = settings.snake_grid();
        let mut game = Self::new(settings.snake, cols, rows);
        game.swipe_min = settings.input.snake_swipe_min;
        game.max_steps = settings.max_steps_per_frame.max(1);
        game
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn special_food(&self) -> Option<SpecialFood> {
        self.special
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn grid_size(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }

    /// Current movement interval in milliseconds
    pub fn move_interval_ms(&self) -> f32 {
        1000.0 / self.speed.max(1) as f32
    }

    /// Queue a turn. A 180° reversal of the current heading is ignored.
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if dir == self.direction.opposite() {
            return false;
        }
        self.next_direction = dir;
        true
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }

    /// Cells free of snake and of the excluded cell, in column-major order
    fn free_cells(&self, exclude: Option<Cell>) -> Vec<Cell> {
        let mut occupied = vec![false; (self.cols * self.rows) as usize];
        let index = |c: Cell| (c.x * self.rows + c.y) as usize;
        for &segment in &self.body {
            if self.in_bounds(segment) {
                occupied[index(segment)] = true;
            }
        }
        if let Some(cell) = exclude {
            occupied[index(cell)] = true;
        }
        (0..self.cols)
            .flat_map(|x| (0..self.rows).map(move |y| Cell::new(x, y)))
            .filter(|&c| !occupied[index(c)])
            .collect()
    }

    /// Place ordinary food uniformly on a free cell. Returns false when the
    /// board is full.
    fn generate_food(&mut self, rng: &mut Pcg32) -> bool {
        let free = self.free_cells(self.special.map(|s| s.cell));
        if free.is_empty() {
            self.food = None;
            return false;
        }
        self.food = Some(free[rng.random_range(0..free.len())]);
        true
    }

    /// Arm special food on a free cell; silently skipped if none exists
    fn spawn_special(&mut self, rng: &mut Pcg32) {
        let free = self.free_cells(self.food);
        if free.is_empty() {
            return;
        }
        let cell = free[rng.random_range(0..free.len())];
        self.special = Some(SpecialFood {
            cell,
            remaining_ms: self.tuning.special_lifetime_ms,
        });
        log::debug!("Special food armed at ({}, {})", cell.x, cell.y);
    }

    fn update_special(&mut self, dt_ms: f32, rng: &mut Pcg32) {
        if let Some(special) = self.special.as_mut() {
            special.remaining_ms -= dt_ms;
            if special.remaining_ms <= 0.0 {
                self.special = None;
            }
        } else {
            self.special_timer_ms += dt_ms;
            if self.special_timer_ms >= self.tuning.special_interval_ms {
                self.special_timer_ms = 0.0;
                if rng.random::<f64>() < self.tuning.special_chance {
                    self.spawn_special(rng);
                }
            }
        }
    }

    /// Move one cell
    pub fn step(&mut self, rng: &mut Pcg32) -> Outcome {
        self.direction = self.next_direction;
        let Some(head) = self.head() else {
            return Outcome::Over;
        };
        let next = head.step(self.direction);

        if !self.in_bounds(next) {
            return Outcome::Over;
        }
        // Strict: the tail counts even though it may vacate this step
        if self.body.contains(&next) {
            return Outcome::Over;
        }

        self.body.push_front(next);
        let mut ate = false;

        if self.food == Some(next) {
            self.score += self.tuning.food_points;
            self.food = None;
            ate = true;
            if self.tuning.speed_step_points > 0
                && self.score % self.tuning.speed_step_points == 0
                && self.speed < self.tuning.max_speed
            {
                self.speed += 1;
                log::debug!("Snake speed -> {}", self.speed);
            }
            if !self.generate_food(rng) {
                log::info!("Snake filled the board at score {}", self.score);
                return Outcome::Over;
            }
        }

        if self.special.is_some_and(|s| s.cell == next) {
            self.score += self.tuning.special_points;
            self.special = None;
            ate = true;
        }

        if !ate {
            self.body.pop_back();
        }
        Outcome::Continue
    }
}

impl Simulation for SnakeGame {
    fn kind(&self) -> GameKind {
        GameKind::Snake
    }

    fn reset(&mut self, rng: &mut Pcg32) {
        let mid = self.rows / 2;
        let head_x = 5.min(self.cols - 1).max(2);
        self.body = (0..3).map(|i| Cell::new(head_x - i, mid)).collect();
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;
        self.score = 0;
        self.speed = self.tuning.initial_speed;
        self.accumulator_ms = 0.0;
        self.swipe = Vec2::ZERO;
        self.special = None;
        self.special_timer_ms = 0.0;
        self.generate_food(rng);
    }

    fn handle_intent(&mut self, intent: Intent, _rng: &mut Pcg32) -> Outcome {
        match intent {
            Intent::DragStart { .. } | Intent::DragEnd => self.swipe = Vec2::ZERO,
            Intent::DragDelta { dx, dy } => {
                self.swipe += Vec2::new(dx, dy);
                if let Some(dir) = Direction::from_swipe(self.swipe, self.swipe_min) {
                    self.set_direction(dir);
                    self.swipe = Vec2::ZERO;
                }
            }
            Intent::Tap { .. } => {}
        }
        Outcome::Continue
    }

    fn advance(&mut self, dt_ms: f32, rng: &mut Pcg32) -> Outcome {
        self.update_special(dt_ms, rng);

        self.accumulator_ms += dt_ms;
        let mut steps = 0;
        while self.accumulator_ms >= self.move_interval_ms() {
            if steps >= self.max_steps {
                // Drop the backlog rather than teleporting
                self.accumulator_ms = 0.0;
                break;
            }
            self.accumulator_ms -= self.move_interval_ms();
            if self.step(rng).is_over() {
                return Outcome::Over;
            }
            steps += 1;
        }
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
    use std::collections::HashSet;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(12345)
    }

    fn game(cols: i32, rows: i32) -> (SnakeGame, Pcg32) {
        let mut rng = rng();
        let mut g = SnakeGame::new(SnakeTuning::default(), cols, rows);
        g.reset(&mut rng);
        (g, rng)
    }

    fn place(g: &mut SnakeGame, cells: &[(i32, i32)], dir: Direction) {
        g.body = cells.iter().map(|&(x, y)| Cell::new(x, y)).collect();
        g.direction = dir;
        g.next_direction = dir;
    }

    #[test]
    fn test_reset_layout() {
        let (g, _) = game(18, 33);
        let body: Vec<Cell> = g.body().iter().copied().collect();
        assert_eq!(body, vec![Cell::new(5, 16), Cell::new(4, 16), Cell::new(3, 16)]);
        assert_eq!(g.direction(), Direction::Right);
        assert_eq!(g.speed(), 10);
        let food = g.food().unwrap();
        assert!(!g.body().contains(&food));
    }

    #[test]
    fn test_reversal_ignored() {
        let (mut g, mut rng) = game(18, 33);
        g.food = Some(Cell::new(0, 0));
        assert!(!g.set_direction(Direction::Left));
        assert_eq!(g.next_direction(), Direction::Right);
        g.step(&mut rng);
        assert_eq!(g.head(), Some(Cell::new(6, 16)));
    }

    #[test]
    fn test_turn_is_applied_on_next_step() {
        let (mut g, mut rng) = game(18, 33);
        g.food = Some(Cell::new(0, 0));
        assert!(g.set_direction(Direction::Up));
        assert_eq!(g.direction(), Direction::Right);
        g.step(&mut rng);
        assert_eq!(g.direction(), Direction::Up);
        assert_eq!(g.head(), Some(Cell::new(5, 15)));
        assert_eq!(g.body().len(), 3);
    }

    #[test]
    fn test_wall_collision() {
        let (mut g, mut rng) = game(10, 10);
        place(&mut g, &[(9, 5), (8, 5), (7, 5)], Direction::Right);
        assert_eq!(g.step(&mut rng), Outcome::Over);
    }

    #[test]
    fn test_self_collision_counts_vacating_tail() {
        let (mut g, mut rng) = game(10, 10);
        // Head at (4,4) moving down into (4,5), which is the tail
        place(
            &mut g,
            &[(4, 4), (5, 4), (5, 5), (4, 5)],
            Direction::Left,
        );
        g.food = Some(Cell::new(0, 0));
        g.set_direction(Direction::Down);
        assert_eq!(g.step(&mut rng), Outcome::Over);
    }

    #[test]
    fn test_eating_grows_by_one() {
        let (mut g, mut rng) = game(18, 33);
        g.food = Some(Cell::new(6, 16));
        assert_eq!(g.step(&mut rng), Outcome::Continue);
        assert_eq!(g.body().len(), 4);
        assert_eq!(g.score(), 10);
        let food = g.food().unwrap();
        assert!(!g.body().contains(&food));
    }

    #[test]
    fn test_speed_rises_every_fifty_points_and_caps() {
        let (mut g, mut rng) = game(18, 33);
        g.score = 40;
        g.food = Some(Cell::new(6, 16));
        g.step(&mut rng);
        assert_eq!(g.speed(), 11);

        g.speed = 20;
        g.score = 90;
        let head = g.head().unwrap();
        g.food = Some(Cell::new(head.x + 1, head.y));
        g.step(&mut rng);
        assert_eq!(g.score(), 100);
        assert_eq!(g.speed(), 20);
    }

    #[test]
    fn test_special_food_scores_without_speed_change() {
        let (mut g, mut rng) = game(18, 33);
        g.food = Some(Cell::new(0, 0));
        g.special = Some(SpecialFood {
            cell: Cell::new(6, 16),
            remaining_ms: 5000.0,
        });
        g.step(&mut rng);
        assert_eq!(g.score(), 50);
        assert_eq!(g.speed(), 10);
        assert_eq!(g.body().len(), 4);
        assert!(g.special_food().is_none());
    }

    #[test]
    fn test_special_food_expires() {
        let (mut g, mut rng) = game(18, 33);
        g.special = Some(SpecialFood {
            cell: Cell::new(0, 0),
            remaining_ms: 5000.0,
        });
        g.update_special(4999.0, &mut rng);
        assert!(g.special_food().is_some());
        g.update_special(1.0, &mut rng);
        assert!(g.special_food().is_none());
    }

    #[test]
    fn test_special_roll_resets_timer() {
        let (mut g, mut rng) = game(18, 33);
        g.tuning.special_chance = 1.0;
        g.update_special(14_999.0, &mut rng);
        assert!(g.special_food().is_none());
        g.update_special(1.0, &mut rng);
        let special = g.special_food().unwrap();
        assert_eq!(special.remaining_ms, 5000.0);
        assert_ne!(Some(special.cell), g.food());
        assert!(!g.body().contains(&special.cell));
        assert_eq!(g.special_timer_ms, 0.0);
    }

    #[test]
    fn test_new_food_avoids_special_food() {
        for seed in 0..500 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut g = SnakeGame::new(SnakeTuning::default(), 7, 1);
            g.reset(&mut rng);
            place(&mut g, &[(5, 0), (4, 0), (3, 0)], Direction::Right);
            g.food = Some(Cell::new(6, 0));
            g.special = Some(SpecialFood {
                cell: Cell::new(1, 0),
                remaining_ms: 5000.0,
            });
            // Only (0,0), (1,0) and (2,0) are off the snake after eating
            assert_eq!(g.step(&mut rng), Outcome::Continue);
            let food = g.food().unwrap();
            assert_ne!(food, Cell::new(1, 0), "seed {seed}");
            assert!(!g.body().contains(&food));
            assert!(g.special_food().is_some());
        }
    }

    #[test]
    fn test_special_food_arm_frequency() {
        let (mut g, _) = game(18, 33);
        let mut rng = Pcg32::seed_from_u64(99);
        let trials = 20_000;
        let mut armed = 0;
        for _ in 0..trials {
            g.special = None;
            g.special_timer_ms = 0.0;
            g.update_special(g.tuning.special_interval_ms, &mut rng);
            if g.special_food().is_some() {
                armed += 1;
            }
        }
        let freq = f64::from(armed) / f64::from(trials);
        assert!((freq - 0.3).abs() < 0.02, "armed {freq}");
    }

    #[test]
    fn test_movement_accumulates_delta_time() {
        let (mut g, mut rng) = game(18, 33);
        g.food = Some(Cell::new(0, 0));
        g.advance(99.0, &mut rng);
        assert_eq!(g.head(), Some(Cell::new(5, 16)));
        g.advance(1.0, &mut rng);
        assert_eq!(g.head(), Some(Cell::new(6, 16)));
        // 250 ms at speed 10 is two more cells with 50 ms left over
        g.advance(250.0, &mut rng);
        assert_eq!(g.head(), Some(Cell::new(8, 16)));
    }

    #[test]
    fn test_board_full_is_game_over() {
        let (mut g, mut rng) = game(4, 1);
        place(&mut g, &[(2, 0), (1, 0), (0, 0)], Direction::Right);
        g.food = Some(Cell::new(3, 0));
        assert_eq!(g.step(&mut rng), Outcome::Over);
    }

    #[test]
    fn test_swipe_turns_snake() {
        let (mut g, mut rng) = game(18, 33);
        g.handle_intent(Intent::DragStart { x: 100.0, y: 100.0 }, &mut rng);
        g.handle_intent(Intent::DragDelta { dx: 2.0, dy: 12.0 }, &mut rng);
        assert_eq!(g.next_direction(), Direction::Right);
        g.handle_intent(Intent::DragDelta { dx: 1.0, dy: 12.0 }, &mut rng);
        assert_eq!(g.next_direction(), Direction::Down);
        // Reversal by swipe is also ignored
        g.handle_intent(Intent::DragDelta { dx: -40.0, dy: 0.0 }, &mut rng);
        assert_eq!(g.next_direction(), Direction::Down);
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_growth_only_on_food(
            seed in any::<u64>(),
            dirs in proptest::collection::vec(direction_strategy(), 1..200),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut g = SnakeGame::new(SnakeTuning::default(), 12, 12);
            g.reset(&mut rng);
            let mut last_speed = g.speed();
            for dir in dirs {
                g.set_direction(dir);
                let len_before = g.body().len();
                let score_before = g.score();
                if g.step(&mut rng).is_over() {
                    break;
                }
                let grew = g.body().len() - len_before;
                let ate = g.score() > score_before;
                prop_assert_eq!(grew, usize::from(ate));
                prop_assert!(g.speed() >= last_speed);
                prop_assert!(g.speed() <= 20);
                last_speed = g.speed();
                let unique: HashSet<Cell> = g.body().iter().copied().collect();
                prop_assert_eq!(unique.len(), g.body().len());
            }
        }
    }
}
