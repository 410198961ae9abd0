//! Vertical shooter
//!
//! One `advance` call is one simulation frame; every timer here counts
//! frames. A frame runs nine ordered phases:
//!
//! 1. power-up timers (effects revert at zero)
//! 2. fire cooldown and firing
//! 3. bullets
//! 4. enemy spawning
//! 5. enemies (reaching the bottom costs a life)
//! 6. falling power-ups
//! 7. explosions
//! 8. collision resolution
//! 9. level-up
//!
//! Collection updates use `retain`, which keeps survivors in order. Collision
//! resolution walks each collection from the back so removing index `i`
//! never shifts an element that has not been visited yet.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::game::{GameKind, Outcome, Simulation};
use super::input::Intent;
use crate::settings::{PowerupWeights, Settings, ShooterTuning};

pub const PLAYER_SIZE: f32 = 60.0;
/// Player top edge sits this far above the bottom of the playfield
pub const PLAYER_OFFSET: f32 = 100.0;
pub const POWERUP_SIZE: f32 = 30.0;

/// The player's ship and its timed effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub rect: Rect,
    /// Frames of shield left (absorbs one hit)
    pub shield_frames: u32,
    /// Frames of rapid fire left
    pub rapid_frames: u32,
    /// Frames of damage immunity left
    pub invincible_frames: u32,
}

impl Player {
    fn spawn(width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(
                width / 2.0 - PLAYER_SIZE / 2.0,
                height - PLAYER_OFFSET,
                PLAYER_SIZE,
                PLAYER_SIZE,
            ),
            shield_frames: 0,
            rapid_frames: 0,
            invincible_frames: 0,
        }
    }

    pub fn has_shield(&self) -> bool {
        self.shield_frames > 0
    }

    pub fn has_rapid_fire(&self) -> bool {
        self.rapid_frames > 0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_frames > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub rect: Rect,
    /// Pixels per frame, upward
    pub speed: f32,
    /// Side cannon (rapid fire) rather than the central gun
    pub lateral: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub rect: Rect,
    /// Pixels per frame, downward
    pub speed: f32,
    /// Colour hue in degrees
    pub hue: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Life,
    Shield,
    RapidFire,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 3] = [
        PowerupKind::Life,
        PowerupKind::Shield,
        PowerupKind::RapidFire,
    ];

    fn weight(self, weights: &PowerupWeights) -> f64 {
        match self {
            PowerupKind::Life => weights.life,
            PowerupKind::Shield => weights.shield,
            PowerupKind::RapidFire => weights.rapid_fire,
        }
    }
}

/// Weighted draw: `random() * total`, then subtract weights in order until
/// the remainder is ≤ 0. Falls back to the first kind.
pub fn draw_powerup(weights: &PowerupWeights, rng: &mut Pcg32) -> PowerupKind {
    let total: f64 = PowerupKind::ALL.iter().map(|k| k.weight(weights)).sum();
    let mut roll = rng.random::<f64>() * total;
    for kind in PowerupKind::ALL {
        roll -= kind.weight(weights);
        if roll <= 0.0 {
            return kind;
        }
    }
    PowerupKind::ALL[0]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub rect: Rect,
    pub kind: PowerupKind,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    /// Heading in radians
    pub angle: f32,
    /// Red rather than orange
    pub warm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub particles: Vec<Particle>,
    /// Frames left
    pub life: u32,
}

impl Explosion {
    /// Burst of `floor(size / 2)` particles at `center`
    fn new(center: Vec2, size: f32, life: u32, rng: &mut Pcg32) -> Self {
        let count = (size / 2.0).floor().max(0.0) as usize;
        let particles = (0..count)
            .map(|_| Particle {
                pos: center,
                speed: rng.random_range(1.0..4.0),
                angle: rng.random_range(0.0..std::f32::consts::TAU),
                radius: 2.0 + rng.random::<f32>() * (size / 4.0),
                warm: rng.random::<bool>(),
            })
            .collect();
        Self { particles, life }
    }
}

/// Shooter simulation core
#[derive(Debug, Clone)]
pub struct ShooterGame {
    tuning: ShooterTuning,
    width: f32,
    height: f32,
    player: Player,
    bullets: Vec<Bullet>,
    enemies: Vec<Enemy>,
    powerups: Vec<Powerup>,
    explosions: Vec<Explosion>,
    score: u64,
    lives: u32,
    level: u32,
    spawn_interval: u32,
    spawn_counter: u32,
    fire_cooldown: u32,
    firing: bool,
    /// Last pointer position; the player's centre follows it
    pointer: Vec2,
}

impl ShooterGame {
    pub fn new(tuning: ShooterTuning, width: f32, height: f32) -> Self {
        Self {
            tuning,
            width,
            height,
            player: Player::spawn(width, height),
            bullets: Vec::new(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            explosions: Vec::new(),
            score: 0,
            lives: tuning.lives,
            level: 1,
            spawn_interval: tuning.spawn_interval,
            spawn_counter: 0,
            fire_cooldown: 0,
            firing: false,
            pointer: Vec2::new(width / 2.0, height - PLAYER_OFFSET + PLAYER_SIZE / 2.0),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.shooter,
            settings.playfield.width,
            settings.playfield.height,
        )
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn powerups(&self) -> &[Powerup] {
        &self.powerups
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn spawn_interval(&self) -> u32 {
        self.spawn_interval
    }

    pub fn is_firing(&self) -> bool {
        self.firing
    }

    fn fire_interval(&self) -> u32 {
        if self.player.has_rapid_fire() {
            self.tuning.rapid_cooldown
        } else {
            self.tuning.fire_cooldown
        }
    }

    /// Centre the player on `target`, clamped to the playfield
    fn move_player_to(&mut self, target: Vec2) {
        self.player.rect.pos = target - self.player.rect.size * 0.5;
        self.player
            .rect
            .clamp_within(Vec2::new(self.width, self.height));
    }

    fn fire(&mut self) {
        let p = self.player.rect;
        let speed = self.tuning.bullet_speed;
        self.bullets.push(Bullet {
            rect: Rect::new(p.center().x - 5.0, p.top(), 10.0, 20.0),
            speed,
            lateral: false,
        });
        if self.player.has_rapid_fire() {
            for x in [p.left() + 10.0, p.right() - 18.0] {
                self.bullets.push(Bullet {
                    rect: Rect::new(x, p.top() + 10.0, 8.0, 16.0),
                    speed,
                    lateral: true,
                });
            }
        }
    }

    fn spawn_enemy(&mut self, rng: &mut Pcg32) {
        let size = rng.random_range(30.0..60.0);
        let speed = rng.random_range(1.0..3.0) + 0.2 * self.level as f32;
        let x = rng.random::<f32>() * (self.width - size).max(0.0);
        let hue = rng.random_range(0.0..360.0);
        self.enemies.push(Enemy {
            rect: Rect::new(x, -size, size, size),
            speed,
            hue,
        });
    }

    fn explode(&mut self, rect: Rect, rng: &mut Pcg32) {
        let life = self.tuning.explosion_life;
        self.explosions
            .push(Explosion::new(rect.center(), rect.size.x, life, rng));
    }

    /// Lose a life and start the invincibility window. True when no lives remain.
    fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.player.invincible_frames = self.tuning.invincible_frames;
        log::debug!("shooter: life lost, {} left", self.lives);
        self.lives == 0
    }

    fn apply_powerup(&mut self, kind: PowerupKind) {
        match kind {
            PowerupKind::Life => self.lives = (self.lives + 1).min(self.tuning.max_lives),
            PowerupKind::Shield => self.player.shield_frames = self.tuning.shield_frames,
            PowerupKind::RapidFire => self.player.rapid_frames = self.tuning.rapid_frames,
        }
    }

    fn tick_timers(&mut self) {
        let player = &mut self.player;
        for timer in [
            &mut player.shield_frames,
            &mut player.rapid_frames,
            &mut player.invincible_frames,
        ] {
            *timer = timer.saturating_sub(1);
        }
    }

    fn resolve_collisions(&mut self, rng: &mut Pcg32) -> Outcome {
        // Bullets against enemies; each bullet hits at most one enemy
        for i in (0..self.bullets.len()).rev() {
            let bullet = self.bullets[i].rect;
            let Some(j) = (0..self.enemies.len())
                .rev()
                .find(|&j| bullet.overlaps(&self.enemies[j].rect))
            else {
                continue;
            };
            self.bullets.remove(i);
            let enemy = self.enemies.remove(j).rect;
            self.explode(enemy, rng);
            self.score += enemy.size.x.floor() as u64;
            if rng.random::<f64>() < self.tuning.powerup_chance {
                let kind = draw_powerup(&self.tuning.powerup_weights, rng);
                // Dropped with its corner on the enemy centre
                let at = enemy.center();
                self.powerups.push(Powerup {
                    rect: Rect::new(at.x, at.y, POWERUP_SIZE, POWERUP_SIZE),
                    kind,
                    speed: self.tuning.powerup_speed,
                });
            }
        }

        // Player against enemies; invincibility skips the whole pass
        if !self.player.is_invincible() {
            for j in (0..self.enemies.len()).rev() {
                if !self.player.rect.overlaps(&self.enemies[j].rect) {
                    continue;
                }
                let enemy = self.enemies.remove(j).rect;
                self.explode(enemy, rng);
                if self.player.has_shield() {
                    self.player.shield_frames = 0;
                    continue;
                }
                if self.lose_life() {
                    return Outcome::Over;
                }
                break;
            }
        }

        // Player against power-ups
        for k in (0..self.powerups.len()).rev() {
            if self.player.rect.overlaps(&self.powerups[k].rect) {
                let powerup = self.powerups.remove(k);
                self.apply_powerup(powerup.kind);
            }
        }

        Outcome::Continue
    }

    /// Run one frame
    pub fn frame(&mut self, rng: &mut Pcg32) -> Outcome {
        // 1. timed effects
        self.tick_timers();

        // 2. firing
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        if self.firing && self.fire_cooldown == 0 {
            self.fire();
            self.fire_cooldown = self.fire_interval();
        }

        // 3. bullets
        self.bullets.retain_mut(|b| {
            b.rect.pos.y -= b.speed;
            b.rect.bottom() >= 0.0
        });

        // 4. spawning
        self.spawn_counter += 1;
        if self.spawn_counter >= self.spawn_interval {
            self.spawn_enemy(rng);
            self.spawn_counter = 0;
        }

        // 5. enemies
        let height = self.height;
        let before = self.enemies.len();
        self.enemies.retain_mut(|e| {
            e.rect.pos.y += e.speed;
            e.rect.top() <= height
        });
        for _ in self.enemies.len()..before {
            if !self.player.is_invincible() && self.lose_life() {
                return Outcome::Over;
            }
        }

        // 6. power-ups
        self.powerups.retain_mut(|p| {
            p.rect.pos.y += p.speed;
            p.rect.top() <= height
        });

        // 7. explosions
        self.explosions.retain_mut(|explosion| {
            for p in &mut explosion.particles {
                p.pos += Vec2::new(p.angle.cos(), p.angle.sin()) * p.speed;
                p.radius *= 0.95;
            }
            explosion.life = explosion.life.saturating_sub(1);
            explosion.life > 0
        });

        // 8. collisions
        if self.resolve_collisions(rng).is_over() {
            return Outcome::Over;
        }

        // 9. level-up
        if self.score >= u64::from(self.level) * self.tuning.level_threshold {
            self.level += 1;
            self.spawn_interval = self
                .spawn_interval
                .saturating_sub(self.tuning.spawn_step)
                .max(self.tuning.spawn_floor);
            log::debug!(
                "shooter: level {} (spawn every {} frames)",
                self.level,
                self.spawn_interval
            );
        }

        Outcome::Continue
    }
}

impl Simulation for ShooterGame {
    fn kind(&self) -> GameKind {
        GameKind::Shooter
    }

    fn reset(&mut self, _rng: &mut Pcg32) {
        *self = Self::new(self.tuning, self.width, self.height);
    }

    fn handle_intent(&mut self, intent: Intent, _rng: &mut Pcg32) -> Outcome {
        match intent {
            Intent::DragStart { x, y } => {
                self.pointer = Vec2::new(x, y);
                self.firing = true;
            }
            Intent::DragDelta { dx, dy } => {
                self.pointer += Vec2::new(dx, dy);
                self.move_player_to(self.pointer);
            }
            Intent::DragEnd => self.firing = false,
            Intent::Tap { .. } => {}
        }
        Outcome::Continue
    }

    fn advance(&mut self, _dt_ms: f32, rng: &mut Pcg32) -> Outcome {
        self.frame(rng)
    }

    fn score(&self) -> u64 {
        self.score
    }
}
