//! Arcade Suite entry point
//!
//! Native builds run a headless demo: each game is driven for a fixed number
//! of frames by a scripted pointer, and the resulting sessions are logged.
//! The WASM build mounts one game on the page's canvas.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use arcade_suite::highscores::LocalStorageStore;
    use arcade_suite::platform::{WebPlatform, mount};
    use arcade_suite::sim::{GameSession, MergeGame, ShooterGame, Simulation, SnakeGame};
    use arcade_suite::{GameRunner, ScoreLedger, Settings, sim::RngState};

    thread_local! {
        /// Keeps the mounted game alive for the lifetime of the page
        static MOUNTED: RefCell<Option<Box<dyn std::any::Any>>> = RefCell::new(None);
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    fn hud_renderer<S>(session: &GameSession, _game: &S) {
        set_text("score", &session.score.to_string());
        set_text("best", &session.high_score.to_string());
        set_text("phase", &format!("{:?}", session.phase));
    }

    fn launch<S: Simulation + 'static>(
        game: S,
        canvas: HtmlCanvasElement,
        settings: &Settings,
    ) -> Result<(), JsValue> {
        let platform =
            WebPlatform::new(canvas).ok_or_else(|| JsValue::from_str("no window"))?;
        let seed = RngState::new(js_sys::Date::now() as u64);
        let runner = GameRunner::new(game, platform, settings, seed, Box::new(LocalStorageStore))
            .with_reporter(Box::new(ScoreLedger::new()))
            .with_renderer(Box::new(hud_renderer::<S>))
            .on_game_over(|score| log::info!("Game over: {}", score))
            .on_exit(|| set_text("phase", "Exited"));
        let handle = mount(runner);
        MOUNTED.with(|m| *m.borrow_mut() = Some(Box::new(handle)));
        Ok(())
    }

    pub fn run() -> Result<(), JsValue> {
        arcade_suite::init_logging();
        log::info!("Arcade Suite starting...");

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;

        let mut settings = Settings::load();
        settings.playfield.width = canvas.client_width() as f32;
        settings.playfield.height = canvas.client_height() as f32;

        // <canvas id="canvas" data-game="snake|2048|shooter">
        match canvas.get_attribute("data-game").as_deref() {
            Some("2048") => launch(MergeGame::from_settings(&settings), canvas, &settings),
            Some("shooter") => launch(ShooterGame::from_settings(&settings), canvas, &settings),
            _ => launch(SnakeGame::from_settings(&settings), canvas, &settings),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::Path;

    use arcade_suite::highscores::JsonFileStore;
    use arcade_suite::platform::HeadlessPlatform;
    use arcade_suite::services::HighScoreStore;
    use arcade_suite::sim::{
        Direction, GameKind, GamePhase, GameSession, MergeGame, PointerEvent, RngState,
        ShooterGame, Simulation, SnakeGame,
    };
    use arcade_suite::{GameRunner, MemoryStore, ScoreLedger, Settings};

    /// 60 seconds at 60 Hz
    const FRAMES: u64 = 3600;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn swipe(from: (f32, f32), dir: Direction, length: f32) -> Vec<PointerEvent> {
        let (dx, dy) = dir.offset();
        let to = (from.0 + dx as f32 * length, from.1 + dy as f32 * length);
        let mid = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        vec![
            PointerEvent::Down { x: from.0, y: from.1 },
            PointerEvent::Move { x: mid.0, y: mid.1 },
            PointerEvent::Up { x: to.0, y: to.1 },
        ]
    }

    fn tap(x: f32, y: f32) -> Vec<PointerEvent> {
        vec![PointerEvent::Down { x, y }, PointerEvent::Up { x, y }]
    }

    /// Scripted player for one game
    fn script(
        kind: GameKind,
        frame: u64,
        session: &GameSession,
        settings: &Settings,
    ) -> Vec<PointerEvent> {
        let center = (settings.playfield.width / 2.0, settings.playfield.height / 2.0);
        match session.phase {
            GamePhase::Start | GamePhase::GameOver if frame % 30 == 0 => {
                return tap(center.0, center.1);
            }
            GamePhase::Playing => {}
            _ => return Vec::new(),
        }

        match kind {
            GameKind::Snake if frame % 45 == 0 => {
                let turns = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];
                swipe(center, turns[(frame / 45 % 4) as usize], 40.0)
            }
            GameKind::TileMerge if frame % 20 == 0 => {
                let moves = [Direction::Left, Direction::Down, Direction::Right, Direction::Down];
                swipe(center, moves[(frame / 20 % 4) as usize], 60.0)
            }
            GameKind::Shooter => {
                let sweep = (frame as f32 * 0.03).sin() * settings.playfield.width * 0.4;
                let x = center.0 + sweep;
                let y = settings.playfield.height - 70.0;
                if frame % 120 == 0 {
                    vec![PointerEvent::Down { x, y }]
                } else {
                    vec![PointerEvent::Move { x, y }]
                }
            }
            _ => Vec::new(),
        }
    }

    fn play<S: Simulation + 'static>(
        game: S,
        settings: &Settings,
        store: Box<dyn HighScoreStore>,
        ledger: &ScoreLedger,
        seed: u64,
    ) {
        let kind = game.kind();
        let mut runner = GameRunner::new(
            game,
            HeadlessPlatform::new(),
            settings,
            RngState::new(seed),
            store,
        )
        .with_reporter(Box::new(ledger.clone()))
        .on_game_over(move |score| log::info!("{} run over: {}", kind.as_str(), score));
        runner.start();

        for frame in 0..FRAMES {
            for event in script(kind, frame, runner.session(), settings) {
                runner.on_pointer(event);
            }
            let Some(handle) = runner.platform().next_pending() else {
                break;
            };
            runner.platform_mut().fire(handle);
            runner.on_frame(frame as f64 * FRAME_MS);
        }
        runner.exit();

        let session = runner.session();
        log::info!(
            "{}: phase {:?}, score {}, best {}, new record {}",
            kind.as_str(),
            session.phase,
            session.score,
            session.high_score,
            session.new_record
        );
        println!(
            "{:<8} best {:>6}  last {:>6}",
            kind.as_str(),
            session.high_score,
            session.score
        );
    }

    pub fn run() {
        let settings = match std::env::args().nth(1) {
            Some(path) => Settings::load(Path::new(&path)),
            None => Settings::default(),
        };
        let seed = std::env::args()
            .nth(2)
            .and_then(|s| s.parse().ok())
            .unwrap_or(2024);
        // Best scores survive between demo runs when a file is given
        let scores_path = std::env::args().nth(3);
        let memory = MemoryStore::new();
        let store = || -> Box<dyn HighScoreStore> {
            match &scores_path {
                Some(path) => Box::new(JsonFileStore::new(path)),
                None => Box::new(memory.clone()),
            }
        };

        let ledger = ScoreLedger::new();
        play(SnakeGame::from_settings(&settings), &settings, store(), &ledger, seed);
        play(MergeGame::from_settings(&settings), &settings, store(), &ledger, seed);
        play(ShooterGame::from_settings(&settings), &settings, store(), &ledger, seed);

        let state = ledger.snapshot();
        println!("total    {:>6}  unlocked {:?}", state.total, state.unlocked);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Arcade Suite (native) starting...");
    log::info!("Usage: arcade-suite [settings.json] [seed] [scores.json]");
    demo::run();
}
