//! Game runner
//!
//! Owns one game instance and everything around it: the frame clock, input
//! translator, session, collaborators and the lifecycle registrations. The
//! platform calls [`GameRunner::on_frame`] and [`GameRunner::on_pointer`];
//! after teardown both are ignored.

use rand_pcg::Pcg32;

use crate::platform::{EventSink, FrameClock, Lifecycle, Platform};
use crate::renderer::{NullRenderer, Renderer};
use crate::services::{HighScoreStore, ScoreReporter};
use crate::settings::Settings;
use crate::sim::input::{InputTranslator, PointerEvent};
use crate::sim::machine::{GamePhase, Hud};
use crate::sim::session::GameSession;
use crate::sim::tick::{TickInput, TickReport, tick};
use crate::sim::{RngState, Simulation};

type GameOverHook = Box<dyn FnMut(u64)>;
type ExitHook = Box<dyn FnMut()>;

pub struct GameRunner<S: Simulation, P: Platform> {
    game: S,
    session: GameSession,
    platform: P,
    lifecycle: Lifecycle,
    clock: FrameClock,
    input: InputTranslator,
    hud: Hud,
    rng: Pcg32,
    store: Box<dyn HighScoreStore>,
    reporter: Option<Box<dyn ScoreReporter>>,
    renderer: Box<dyn Renderer<S>>,
    on_game_over: Option<GameOverHook>,
    on_exit: Option<ExitHook>,
    frames: u64,
}

impl<S: Simulation, P: Platform> GameRunner<S, P> {
    /// Build a runner. The stored high score is loaded here, once.
    pub fn new(
        game: S,
        platform: P,
        settings: &Settings,
        seed: RngState,
        store: Box<dyn HighScoreStore>,
    ) -> Self {
        let kind = game.kind();
        let high_score = match store.load_high_score(kind.storage_key()) {
            Ok(score) => score.unwrap_or(0),
            Err(e) => {
                log::warn!("Could not load {} high score: {}", kind.as_str(), e);
                0
            }
        };

        Self {
            game,
            session: GameSession::new(kind, high_score),
            platform,
            lifecycle: Lifecycle::new(),
            clock: FrameClock::new(settings.max_frame_ms),
            input: InputTranslator::new(settings.input.tap_slop),
            hud: settings.hud(),
            rng: seed.to_rng(),
            store,
            reporter: None,
            renderer: Box::new(NullRenderer),
            on_game_over: None,
            on_exit: None,
            frames: 0,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ScoreReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer<S>>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Called once per GameOver with the final score
    pub fn on_game_over(mut self, hook: impl FnMut(u64) + 'static) -> Self {
        self.on_game_over = Some(Box::new(hook));
        self
    }

    /// Called once, at teardown
    pub fn on_exit(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn game(&self) -> &S {
        &self.game
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_running(&self) -> bool {
        !self.lifecycle.is_torn_down()
    }

    /// Subscribe to input and request the first frame
    pub fn start(&mut self) {
        if !self.is_running() {
            return;
        }
        self.lifecycle.attach_listeners(&mut self.platform);
        self.lifecycle.schedule_frame(&mut self.platform);
        log::info!(
            "{} started (best {})",
            self.session.kind.as_str(),
            self.session.high_score
        );
    }

    /// Raw input from the platform; queued until the next frame
    pub fn on_pointer(&mut self, event: PointerEvent) {
        if self.is_running() {
            self.input.push(event);
        }
    }

    /// Display-refresh callback
    pub fn on_frame(&mut self, timestamp_ms: f64) {
        if !self.is_running() {
            return;
        }
        self.lifecycle.frame_fired();
        self.frames += 1;

        let input = TickInput {
            intents: self.input.drain(),
            dt_ms: self.clock.tick(timestamp_ms),
        };
        let report = tick(
            &mut self.session,
            &mut self.game,
            &self.hud,
            &input,
            &mut self.rng,
        );
        self.apply(report);

        if self.is_running() {
            self.renderer.render(&self.session, &self.game);
            self.lifecycle.schedule_frame(&mut self.platform);
        }
    }

    /// Host-initiated exit (navigation away, app hidden for good)
    pub fn exit(&mut self) {
        if !self.is_running() {
            return;
        }
        if matches!(self.session.phase, GamePhase::Playing | GamePhase::Paused) {
            if let Some(record) = self.session.settle() {
                self.persist(record);
            }
        }
        self.teardown();
    }

    fn apply(&mut self, report: TickReport) {
        if let Some(record) = report.record {
            self.persist(record);
        }
        if let Some(score) = report.game_over {
            if let Some(hook) = self.on_game_over.as_mut() {
                hook(score);
            }
            self.report(score);
        }
        if report.exit {
            self.teardown();
        }
    }

    fn persist(&mut self, score: u64) {
        let key = self.session.kind.storage_key();
        if let Err(e) = self.store.persist_high_score(key, score) {
            log::warn!("Could not save high score {} for {}: {}", score, key, e);
        }
    }

    fn report(&mut self, score: u64) {
        if score == 0 {
            return;
        }
        let Some(reporter) = self.reporter.as_mut() else {
            return;
        };
        let index = self.session.kind.index();
        let delta = i64::try_from(score).unwrap_or(i64::MAX);
        match reporter.report_score(index, delta) {
            Ok(report) if report.success => {
                log::info!(
                    "Reported {} for game {} (total {})",
                    score,
                    index,
                    report.new_score
                );
                self.session.unlocked_games = report.unlocked_games;
            }
            Ok(_) => log::warn!("Score report for game {} was not accepted", index),
            Err(e) => log::warn!("Score report for game {} failed: {}", index, e),
        }
    }

    /// Release the frame subscription and every listener, then signal exit.
    /// Safe to call repeatedly.
    fn teardown(&mut self) {
        if !self.lifecycle.teardown(&mut self.platform) {
            return;
        }
        self.input.clear();
        log::info!(
            "{} exited after {} frames",
            self.session.kind.as_str(),
            self.frames
        );
        if let Some(hook) = self.on_exit.as_mut() {
            hook();
        }
    }
}

impl<S: Simulation, P: Platform> EventSink for GameRunner<S, P> {
    fn frame(&mut self, timestamp_ms: f64) {
        self.on_frame(timestamp_ms);
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.on_pointer(event);
    }
}

impl<S: Simulation, P: Platform> Drop for GameRunner<S, P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
