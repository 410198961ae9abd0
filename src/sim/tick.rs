//! One frame of the game loop
//!
//! Intents queued since the previous frame are routed through the HUD and the
//! lifecycle reducer first; only gameplay intents reach the core, and only
//! while playing. The core then advances by the frame delta.

use rand_pcg::Pcg32;

use super::game::{Outcome, Simulation};
use super::input::Intent;
use super::machine::{Command, Effect, GamePhase, Hud, reduce};
use super::session::GameSession;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intents in arrival order
    pub intents: Vec<Intent>,
    /// Clamped wall time since the previous frame
    pub dt_ms: f32,
}

/// What happened during a frame that the runner must act on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A fresh run began (entities reset)
    pub started_run: bool,
    /// The run ended with this score
    pub game_over: Option<u64>,
    /// New high score that must be persisted
    pub record: Option<u64>,
    /// The player asked to leave
    pub exit: bool,
}

/// Run the reducer for one command and carry out its effect
fn dispatch<S: Simulation>(
    session: &mut GameSession,
    game: &mut S,
    command: Command,
    rng: &mut Pcg32,
    report: &mut TickReport,
) {
    let rules = game.kind().rules();
    let transition = reduce(session.phase, command, rules);
    let from = session.phase;
    session.phase = transition.phase;
    if from != transition.phase {
        log::debug!(
            "{}: {:?} -> {:?}",
            game.kind().as_str(),
            from,
            transition.phase
        );
    }

    match transition.effect {
        Effect::None => {}
        Effect::ResetRun => {
            game.reset(rng);
            session.begin_run();
            report.started_run = true;
        }
        Effect::Forward(intent) => {
            let outcome = game.handle_intent(intent, rng);
            session.score = game.score();
            if outcome.is_over() {
                dispatch(session, game, Command::Finish, rng, report);
            }
        }
        Effect::GameOver => {
            session.score = game.score();
            report.game_over = Some(session.score);
            report.record = session.settle();
            log::info!(
                "{}: game over with score {}",
                game.kind().as_str(),
                session.score
            );
        }
        Effect::Exit => {
            report.exit = true;
            if matches!(from, GamePhase::Playing | GamePhase::Paused) {
                report.record = session.settle();
            }
        }
    }
}

/// Advance one frame.
///
/// Intents are consumed in order until the player exits or the run ends;
/// anything queued after that point in the same frame is dropped.
pub fn tick<S: Simulation>(
    session: &mut GameSession,
    game: &mut S,
    hud: &Hud,
    input: &TickInput,
    rng: &mut Pcg32,
) -> TickReport {
    let rules = game.kind().rules();
    let mut report = TickReport::default();

    for &intent in &input.intents {
        let command = hud.classify(session.phase, intent, rules);
        dispatch(session, game, command, rng, &mut report);
        if report.exit || report.game_over.is_some() {
            return report;
        }
    }

    if session.phase == GamePhase::Playing {
        let outcome = game.advance(input.dt_ms, rng);
        session.score = game.score();
        if outcome == Outcome::Over {
            dispatch(session, game, Command::Finish, rng, &mut report);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MergeTuning, ShooterTuning, SnakeTuning};
    use crate::sim::game::GameKind;
    use crate::sim::merge::MergeGame;
    use crate::sim::shooter::ShooterGame;
    use crate::sim::snake::SnakeGame;
    use rand::SeedableRng;

    const HUD_WIDTH: f32 = 375.0;

    fn hud() -> Hud {
        Hud::for_width(HUD_WIDTH)
    }

    fn tap(x: f32, y: f32) -> TickInput {
        TickInput {
            intents: vec![Intent::Tap { x, y }],
            dt_ms: 16.0,
        }
    }

    fn idle(dt_ms: f32) -> TickInput {
        TickInput {
            intents: Vec::new(),
            dt_ms,
        }
    }

    #[test]
    fn test_tap_launches_run() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut game = SnakeGame::new(SnakeTuning::default(), 18, 33);
        let mut session = GameSession::new(GameKind::Snake, 0);

        let report = tick(&mut session, &mut game, &hud(), &idle(16.0), &mut rng);
        assert_eq!(report, TickReport::default());
        assert_eq!(session.phase, GamePhase::Start);

        let report = tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);
        assert!(report.started_run);
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(game.body().len(), 3);
    }

    #[test]
    fn test_paused_core_does_not_advance() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut game = SnakeGame::new(SnakeTuning::default(), 18, 33);
        let mut session = GameSession::new(GameKind::Snake, 0);
        tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);

        let pause = hud().pause_button.center();
        tick(&mut session, &mut game, &hud(), &tap(pause.x, pause.y), &mut rng);
        assert_eq!(session.phase, GamePhase::Paused);

        let head = game.head();
        for _ in 0..20 {
            tick(&mut session, &mut game, &hud(), &idle(100.0), &mut rng);
        }
        assert_eq!(game.head(), head);

        tick(&mut session, &mut game, &hud(), &tap(pause.x, pause.y), &mut rng);
        assert_eq!(session.phase, GamePhase::Playing);
        tick(&mut session, &mut game, &hud(), &idle(100.0), &mut rng);
        assert_ne!(game.head(), head);
    }

    #[test]
    fn test_shooter_pause_button_is_gameplay() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut game = ShooterGame::new(ShooterTuning::default(), HUD_WIDTH, 667.0);
        let mut session = GameSession::new(GameKind::Shooter, 0);
        tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);

        let pause = hud().pause_button.center();
        tick(&mut session, &mut game, &hud(), &tap(pause.x, pause.y), &mut rng);
        assert_eq!(session.phase, GamePhase::Playing);
    }

    #[test]
    fn test_snake_wall_ends_run_and_records() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut game = SnakeGame::new(SnakeTuning::default(), 18, 33);
        let mut session = GameSession::new(GameKind::Snake, 0);
        tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);

        let mut over = None;
        for _ in 0..100 {
            let report = tick(&mut session, &mut game, &hud(), &idle(100.0), &mut rng);
            if report.game_over.is_some() {
                over = Some(report);
                break;
            }
        }
        let report = over.expect("snake should hit the right wall");
        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(report.game_over, Some(session.score));
        // Any food eaten on the way beats the stored 0
        assert_eq!(report.record, (session.score > 0).then_some(session.score));

        // Tap on game over restarts
        let report = tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);
        assert!(report.started_run);
        assert_eq!(session.phase, GamePhase::Playing);
    }

    #[test]
    fn test_back_button_exits_from_any_phase() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut game = MergeGame::new(MergeTuning::default());
        let mut session = GameSession::new(GameKind::TileMerge, 0);
        let back = hud().back_button.center();

        let report = tick(&mut session, &mut game, &hud(), &tap(back.x, back.y), &mut rng);
        assert!(report.exit);
        assert_eq!(report.record, None);
    }

    #[test]
    fn test_exit_mid_run_persists_record() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut game = MergeGame::new(MergeTuning::default());
        let mut session = GameSession::new(GameKind::TileMerge, 0);
        tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);
        session.score = 12;

        let back = hud().back_button.center();
        let report = tick(&mut session, &mut game, &hud(), &tap(back.x, back.y), &mut rng);
        assert!(report.exit);
        assert_eq!(report.record, Some(12));
        assert!(session.new_record);
    }

    #[test]
    fn test_gameplay_intents_ignored_outside_playing() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut game = ShooterGame::new(ShooterTuning::default(), HUD_WIDTH, 667.0);
        let mut session = GameSession::new(GameKind::Shooter, 0);
        let input = TickInput {
            intents: vec![Intent::DragStart { x: 10.0, y: 400.0 }],
            dt_ms: 16.0,
        };
        tick(&mut session, &mut game, &hud(), &input, &mut rng);
        assert!(!game.is_firing());
        assert_eq!(session.phase, GamePhase::Start);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut game = ShooterGame::new(ShooterTuning::default(), HUD_WIDTH, 667.0);
            let mut session = GameSession::new(GameKind::Shooter, 0);
            tick(&mut session, &mut game, &hud(), &tap(200.0, 300.0), &mut rng);
            let hold = TickInput {
                intents: vec![Intent::DragStart { x: 187.0, y: 600.0 }],
                dt_ms: 16.0,
            };
            tick(&mut session, &mut game, &hud(), &hold, &mut rng);
            for _ in 0..600 {
                tick(&mut session, &mut game, &hud(), &idle(16.0), &mut rng);
            }
            (session.score, game.lives(), game.enemies().len())
        };
        assert_eq!(run(42), run(42));
    }
}
