//! Speed Tap entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, KeyboardEvent, PointerEvent};

    use speedtap::assets::{AssetKind, AssetRef};
    use speedtap::consts::MAX_FRAME_MS;
    use speedtap::highscores::{GameKind, HighScores};
    use speedtap::mode::GameMode;
    use speedtap::platform::{DeltaClock, FrameLoop, KeyAction, PendingEvent, map_key};
    use speedtap::settings::{Difficulty, Settings};
    use speedtap::sim::{
        ArcadeConfig, ArcadeEvent, ArcadeInput, ArcadePhase, ArcadeSnapshot, ArcadeState,
        ReactionEvent, ReactionSession, ReactionSnapshot, ReactionState, RunSeed, Trigger, arcade,
        reaction,
    };
    use speedtap::sprite::css::CssSpriteLayer;
    use speedtap::sprite::{SpriteDriver, SpriteLayer, SpriteSheet};

    /// Runner sheet: row 0 runs, row 1 jumps
    const RUNNER_SHEET: SpriteSheet = SpriteSheet {
        frame_width: 64.0,
        frame_height: 80.0,
        frames: 6,
        row: 0,
    };

    enum Engine {
        Reaction(ReactionSession),
        Arcade { state: ArcadeState, rng: Pcg32 },
    }

    /// Game instance for the current screen
    struct Game {
        engine: Engine,
        settings: Settings,
        pending: PendingEvent<KeyAction>,
        clock: DeltaClock,
        sprite: SpriteDriver,
        layers: Vec<CssSpriteLayer>,
        high_scores: HighScores,
        /// Leaderboard place of the finished run
        final_rank: Option<usize>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    thread_local! {
        /// The screen that currently owns the frame loop
        static ACTIVE: RefCell<Option<(Rc<RefCell<Game>>, FrameLoop)>> = const { RefCell::new(None) };
    }

    impl Game {
        fn new(
            kind: GameKind,
            mode: GameMode,
            settings: Settings,
            layers: Vec<CssSpriteLayer>,
        ) -> Self {
            let high_scores = HighScores::load(kind, &mode.id);
            let engine = match kind {
                GameKind::Reaction => Engine::Reaction(ReactionSession::new(mode)),
                GameKind::Arcade => {
                    let seed = js_sys::Date::now() as u64;
                    log::info!("Arcade run seeded with {}", seed);
                    let config = ArcadeConfig::for_difficulty(settings.difficulty);
                    Engine::Arcade {
                        state: ArcadeState::new(mode, config),
                        rng: RunSeed(seed).to_rng(),
                    }
                }
            };

            let mut sprite = SpriteDriver::new(RUNNER_SHEET, settings.effective_sprite_fps());
            sprite.set_explicit_frame(settings.pinned_sprite_frame());

            Self {
                engine,
                settings,
                pending: PendingEvent::new(),
                clock: DeltaClock::new(),
                sprite,
                layers,
                high_scores,
                final_rank: None,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        fn kind(&self) -> GameKind {
            match self.engine {
                Engine::Reaction(_) => GameKind::Reaction,
                Engine::Arcade { .. } => GameKind::Arcade,
            }
        }

        fn mode_id(&self) -> &str {
            match &self.engine {
                Engine::Reaction(session) => session.mode().id.as_str(),
                Engine::Arcade { state, .. } => state.level().id.as_str(),
            }
        }

        /// Pause a running arcade; the pause input is a toggle
        fn auto_pause(&mut self, reason: &str) {
            if let Engine::Arcade { state, .. } = &self.engine {
                if state.phase == ArcadePhase::Playing {
                    self.pending.post(KeyAction::Pause);
                    log::info!("Auto-paused ({})", reason);
                }
            }
        }

        /// One frame: drain input, advance the engine, animate, publish
        fn frame(&mut self, time: f64) {
            let elapsed = self.clock.sample(time);
            let action = self.pending.take();

            let finished = match &mut self.engine {
                Engine::Reaction(session) => {
                    let trigger = match action {
                        Some(KeyAction::Hit) => Some(Trigger::Hit),
                        Some(KeyAction::Stop) => Some(Trigger::Stop),
                        _ => None,
                    };
                    match reaction::tick(session, trigger, elapsed) {
                        Some(ReactionEvent::GameOver { score }) => Some((score, session.best_time)),
                        Some(ReactionEvent::Scored { clocked_ms, points }) => {
                            log::debug!("Reaction {:.0} ms, {} points", clocked_ms, points);
                            None
                        }
                        _ => None,
                    }
                }
                Engine::Arcade { state, rng } => {
                    let hit = action == Some(KeyAction::Hit);
                    let game_over = state.phase == ArcadePhase::GameOver;
                    let input = ArcadeInput {
                        jump: hit && !game_over,
                        restart: hit && game_over,
                        pause: action == Some(KeyAction::Pause),
                        stop: action == Some(KeyAction::Stop),
                    };
                    let events = arcade::tick(state, &input, elapsed.min(MAX_FRAME_MS), rng);
                    if events.contains(&ArcadeEvent::Restarted) {
                        self.final_rank = None;
                    }
                    events.iter().find_map(|event| match event {
                        ArcadeEvent::GameOver { feet } => Some((u64::from(*feet), None)),
                        _ => None,
                    })
                }
            };

            if let Some((score, best_time)) = finished {
                self.record(score, best_time);
            }

            self.animate(elapsed);
            self.track_fps(time);
            self.update_hud();
        }

        fn record(&mut self, score: u64, best_time: Option<f64>) {
            let kind = self.kind();
            let mode_id = self.mode_id().to_string();
            self.final_rank = self.high_scores.add_score(score, best_time, js_sys::Date::now());
            if let Some(rank) = self.final_rank {
                self.high_scores.save(kind, &mode_id);
                log::info!("New high score #{}: {}", rank, score);
            }
        }

        fn animate(&mut self, elapsed: f64) {
            let (row, held) = match &self.engine {
                Engine::Reaction(session) => (0, session.state == ReactionState::GameOver),
                Engine::Arcade { state, .. } => (
                    u32::from(state.player.airborne()),
                    state.phase != ArcadePhase::Playing,
                ),
            };
            self.sprite.set_row(row);
            self.sprite.set_pause(held);

            let mut layers: Vec<&mut dyn SpriteLayer> = self
                .layers
                .iter_mut()
                .map(|layer| layer as &mut dyn SpriteLayer)
                .collect();
            self.sprite.tick(elapsed, &mut layers);
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Oldest sample is the one about to be overwritten
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            match &self.engine {
                Engine::Reaction(session) => {
                    let snap = ReactionSnapshot::from(session);
                    set_text(&document, "#hud-score .hud-value", &snap.score.to_string());
                    set_text(&document, "#hud-lives .hud-value", &snap.lives.to_string());
                    set_text(&document, "#hud-streak .hud-value", &snap.streak.to_string());
                    set_text(&document, "#hud-timer .hud-value", &format!("{:.1}", snap.time_left));
                    set_text(&document, "#hud-clocked .hud-value", &format_ms(snap.clocked_time));
                    set_text(&document, "#hud-best .hud-value", &format_ms(snap.best_time));
                    set_text(&document, "#hud-average .hud-value", &format_ms(snap.average_time));

                    set_text(
                        &document,
                        "#hud-best-ever .hud-value",
                        &format_ms(self.high_scores.best_time()),
                    );
                    self.show_rank(&document, snap.state == ReactionState::GameOver, snap.score);

                    show_if(&document, "tap-prompt", snap.state == ReactionState::Waiting);
                    show_if(&document, "countdown", snap.state == ReactionState::CountDown);
                    show_if(&document, "game-over", snap.state == ReactionState::GameOver);
                    if snap.state == ReactionState::GameOver {
                        set_text(&document, "#final-score", &snap.score.to_string());
                    }
                    publish(&document, &snap);
                }
                Engine::Arcade { state, .. } => {
                    let snap = ArcadeSnapshot::from(state);
                    set_text(&document, "#hud-feet .hud-value", &snap.feet.to_string());
                    set_text(&document, "#hud-lives .hud-value", &snap.lives.to_string());

                    self.show_rank(
                        &document,
                        snap.phase == ArcadePhase::GameOver,
                        u64::from(snap.feet),
                    );

                    show_if(&document, "ready-prompt", snap.phase == ArcadePhase::Ready);
                    show_if(&document, "pause-menu", snap.phase == ArcadePhase::Paused);
                    show_if(&document, "game-over", snap.phase == ArcadePhase::GameOver);
                    if snap.phase == ArcadePhase::GameOver {
                        set_text(&document, "#final-score", &snap.feet.to_string());
                    }

                    if let Some(runner) = document
                        .get_element_by_id("runner")
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                    {
                        let _ = runner
                            .style()
                            .set_property("top", &format!("{}px", snap.player_top));
                    }
                    publish(&document, &snap);
                }
            }

            if let Some(top) = self.high_scores.top_score() {
                set_text(&document, "#hud-high .hud-value", &top.to_string());
            }

            show_if(&document, "hud-fps", self.settings.show_fps);
            if self.settings.show_fps {
                set_text(&document, "#hud-fps .hud-value", &self.fps.to_string());
            }
        }
    }

    impl Game {
        /// Live: the place the current score would take. Game over: the place it took.
        fn show_rank(&self, document: &Document, over: bool, score: u64) {
            let rank = if over {
                self.final_rank
            } else {
                self.high_scores.potential_rank(score)
            };
            let text = rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "-".into());
            set_text(document, "#hud-rank .hud-value", &text);
        }
    }

    fn format_ms(value: Option<f64>) -> String {
        value.map(|ms| format!("{:.0} ms", ms)).unwrap_or_else(|| "-".into())
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn show_if(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Hand the view layer a JSON copy of the snapshot
    fn publish<T: serde::Serialize>(document: &Document, snapshot: &T) {
        let Some(root) = document
            .get_element_by_id("game")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        if let Ok(json) = serde_json::to_string(snapshot) {
            let _ = root.dataset().set("snapshot", &json);
        }
    }

    /// Every `[data-sprite]` element becomes a sprite layer
    fn sprite_layers(document: &Document, settings: &Settings) -> Vec<CssSpriteLayer> {
        let Ok(nodes) = document.query_selector_all("[data-sprite]") else {
            return Vec::new();
        };
        let image = AssetRef::new(AssetKind::Character, "runner", "run").resolve(&settings.asset_root);
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .map(|element| {
                let _ = element
                    .style()
                    .set_property("background-image", &format!("url({})", image));
                CssSpriteLayer::new(element)
            })
            .collect()
    }

    fn render_points_table(document: &Document, session: &ReactionSession) {
        let rows: Vec<String> = session
            .points_table()
            .iter()
            .map(|bucket| format!("<{} ms: {}", bucket.threshold_ms, bucket.points))
            .collect();
        set_text(document, "#points-table", &rows.join("\n"));
    }

    fn with_game(f: impl FnOnce(&mut Game)) {
        ACTIVE.with(|active| {
            if let Some((game, _)) = active.borrow().as_ref() {
                f(&mut game.borrow_mut());
            }
        });
    }

    /// Tear down the current screen, cancelling its frame loop
    fn leave() {
        let previous = ACTIVE.with(|active| active.borrow_mut().take());
        if let Some((game, mut frame_loop)) = previous {
            frame_loop.cancel();
            let g = game.borrow();
            log::info!("Left {} screen ({})", g.kind().as_str(), g.mode_id());
        }
    }

    fn enter(kind: GameKind, mode: GameMode) {
        leave();

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document; cannot start {}", kind.as_str());
            return;
        };

        let settings = Settings::load();
        let layers = sprite_layers(&document, &settings);
        log::info!(
            "Entering {} screen, mode '{}' ({} sprite layers)",
            kind.as_str(),
            mode.level,
            layers.len()
        );

        let game = Rc::new(RefCell::new(Game::new(kind, mode, settings, layers)));
        {
            let g = game.borrow();
            if let Engine::Reaction(session) = &g.engine {
                if g.settings.show_points_table {
                    render_points_table(&document, session);
                }
            }
        }

        let frame_game = game.clone();
        let frame_loop = FrameLoop::start(move |time| frame_game.borrow_mut().frame(time));
        ACTIVE.with(|active| *active.borrow_mut() = Some((game, frame_loop)));
    }

    fn parse_kind(kind: &str) -> GameKind {
        match kind {
            "arcade" => GameKind::Arcade,
            _ => GameKind::Reaction,
        }
    }

    fn parse_mode(json: Option<String>) -> GameMode {
        match json.as_deref().map(GameMode::from_json) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                log::warn!("Ignoring mode record: {}", e);
                GameMode::default()
            }
            None => GameMode::default(),
        }
    }

    /// Switch screens from page script
    #[wasm_bindgen]
    pub fn switch_game(kind: &str, mode_json: &str) {
        enter(parse_kind(kind), parse_mode(Some(mode_json.to_string())));
    }

    /// Store a difficulty from the settings page; applies from the next screen
    #[wasm_bindgen]
    pub fn set_difficulty(name: &str) {
        let Some(difficulty) = Difficulty::from_str(name) else {
            log::warn!("Unknown difficulty '{}'", name);
            return;
        };
        let mut settings = Settings::load();
        settings.difficulty = difficulty;
        settings.save();
        log::info!("Difficulty set to {}", difficulty.as_str());
    }

    /// Leave the current screen from page script
    #[wasm_bindgen]
    pub fn leave_screen() {
        leave();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Speed Tap starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_input_handlers(&window, &document);
        setup_buttons(&document);
        setup_auto_pause(&window, &document);

        let dataset = document.body().map(|body| body.dataset());
        let kind = dataset
            .as_ref()
            .and_then(|d| d.get("game"))
            .map(|k| parse_kind(&k))
            .unwrap_or(GameKind::Reaction);
        let mode = parse_mode(dataset.as_ref().and_then(|d| d.get("mode")));
        enter(kind, mode);

        log::info!("Speed Tap running!");
    }

    fn setup_input_handlers(window: &web_sys::Window, document: &Document) {
        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                if let Some(action) = map_key(&event.key()) {
                    if action == KeyAction::Hit {
                        event.prevent_default();
                    }
                    with_game(|g| g.pending.post(action));
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Tap / click anywhere on the play field
        if let Some(field) = document.get_element_by_id("game") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                if !event.is_primary() {
                    return;
                }
                event.prevent_default();
                with_game(|g| g.pending.post(KeyAction::Hit));
            });
            let _ = field
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document) {
        let buttons = [
            ("restart-btn", KeyAction::Hit),
            ("resume-btn", KeyAction::Pause),
            ("pause-btn", KeyAction::Pause),
            ("stop-btn", KeyAction::Stop),
        ];
        for (id, action) in buttons {
            if let Some(btn) = document.get_element_by_id(id) {
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
                    event.stop_propagation();
                    with_game(|g| g.pending.post(action));
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_auto_pause(window: &web_sys::Window, document: &Document) {
        // Visibility change (tab switch, minimize)
        {
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    with_game(|g| g.auto_pause("tab hidden"));
                } else {
                    // Do not bill the hidden time to the next frame
                    with_game(|g| g.clock.reset());
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                with_game(|g| g.auto_pause("window blur"));
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Navigating away ends the screen
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| leave());
            let _ = window
                .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Speed Tap (native) starting...");
    log::info!("The browser UI needs wasm32 - run with `trunk serve` for the web version");

    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drives both engines without a browser, feeding scripted input
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use speedtap::highscores::{GameKind, HighScores};
    use speedtap::mode::GameMode;
    use speedtap::platform::{DeltaClock, FrameLoop, KeyAction, PendingEvent};
    use speedtap::records::{
        BackendConfig, BackendRole, ListQuery, MemoryStore, RecordAction, RecordEvent,
        RecordStore, sort_modes,
    };
    use speedtap::settings::{Difficulty, Settings};
    use speedtap::sim::{
        ArcadeConfig, ArcadeInput, ArcadePhase, ArcadeSnapshot, ArcadeState, RandomSource,
        ReactionSession, ReactionSnapshot, ReactionState, RunSeed, Trigger, arcade, reaction,
    };

    /// Simulated frame interval (ms)
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 120;

    pub fn run() {
        let settings = settings_from_args();
        let store = seed_store();

        let modes = load_sorted(&store, "modes");
        let Some(mode) = modes.first().cloned() else {
            log::error!("No modes available");
            return;
        };
        log::info!("{} modes loaded, playing '{}'", modes.len(), mode.level);

        let levels = load_sorted(&store, "levels");
        let Some(level) = levels.last().cloned() else {
            log::error!("No arcade levels available");
            return;
        };
        log::info!("{} levels loaded, running '{}'", levels.len(), level.level);

        let reaction = play_reaction(mode.clone(), 7);
        log::info!(
            "Reaction: score {}, {} rounds, best {:?} ms, average {:?} ms",
            reaction.score,
            reaction.rounds,
            reaction.best_time,
            reaction.average_time
        );

        let run = play_arcade(level.clone(), &settings, 7);
        log::info!("Arcade: {} feet, {} lives left", run.feet, run.lives);

        let results = [
            (GameKind::Reaction, &mode.id, reaction.score, reaction.best_time),
            (GameKind::Arcade, &level.id, u64::from(run.feet), None),
        ];
        for (kind, id, score, best) in results {
            let mut board = HighScores::load(kind, id);
            if let Some(rank) = board.add_score(score, best, 0.0) {
                board.save(kind, id);
                log::info!("{} high score #{}: {}", kind.as_str(), rank, score);
            }
        }
    }

    /// `speedtap [easy|normal|hard]` overrides the stored difficulty
    fn settings_from_args() -> Settings {
        let Some(arg) = std::env::args().nth(1) else {
            return Settings::load();
        };
        match Difficulty::from_str(&arg) {
            Some(difficulty) => {
                log::info!("Difficulty {} from command line", difficulty.as_str());
                let settings = Settings::from_difficulty(difficulty);
                settings.save();
                settings
            }
            None => {
                log::warn!("Unknown difficulty '{}', using stored settings", arg);
                Settings::load()
            }
        }
    }

    /// Reaction modes and arcade levels as the backend would serve them
    fn seed_store() -> MemoryStore<GameMode> {
        let mut store = MemoryStore::connect(BackendConfig::new("memory://demo", BackendRole::Admin));
        let modes = [
            ("m-hard", "Hard", 250.0),
            ("m-easy", "Easy", 600.0),
            ("m-med", "Medium", 400.0),
        ];
        let levels = [("l-1", "Level 1", 5.0), ("l-2", "Level 2", 8.0)];
        let seeded = modes
            .iter()
            .map(|m| ("modes", m))
            .chain(levels.iter().map(|l| ("levels", l)));
        for (collection, (id, level, speed)) in seeded {
            let event = RecordEvent {
                action: RecordAction::Insert,
                record: GameMode::new(*id, *level, *speed, 3.0),
            };
            if let Err(e) = store.write(collection, event) {
                log::warn!("Seeding {} failed: {}", collection, e);
            }
        }
        store
    }

    /// Sorted by speed value, largest first; the slowest arcade level comes last
    fn load_sorted(store: &MemoryStore<GameMode>, collection: &str) -> Vec<GameMode> {
        match store.list(collection, &ListQuery::default()) {
            Ok(mut records) => {
                sort_modes(&mut records);
                records
            }
            Err(e) => {
                log::warn!("{} list failed: {}", collection, e);
                vec![GameMode::default()]
            }
        }
    }

    fn play_reaction(mode: GameMode, seed: u64) -> ReactionSnapshot {
        let session = Rc::new(RefCell::new(ReactionSession::new(mode)));
        let mut rng = RunSeed(seed).to_rng();
        let mut pending = PendingEvent::new();
        let mut clock = DeltaClock::new();
        let mut reaction_ms = 0.0;
        let mut rounds_left = 12;

        let shared = session.clone();
        let frame_loop = FrameLoop::start(move |time| {
            let mut session = shared.borrow_mut();
            let elapsed = clock.sample(time);
            let trigger = match pending.take() {
                Some(KeyAction::Hit) => Some(Trigger::Hit),
                Some(KeyAction::Stop) => Some(Trigger::Stop),
                _ => None,
            };
            reaction::tick(&mut session, trigger, elapsed);

            match session.state {
                ReactionState::CountDown => {
                    // Human-ish reaction for the coming window
                    reaction_ms = 150.0 + f64::from(rng.draw()) * 350.0;
                }
                ReactionState::Waiting if session.time_waiting >= reaction_ms => {
                    rounds_left -= 1;
                    let action = if rounds_left == 0 { KeyAction::Stop } else { KeyAction::Hit };
                    pending.post(action);
                }
                _ => {}
            }
        });
        let frames = drive_until("Reaction", frame_loop, || {
            session.borrow().state == ReactionState::GameOver
        });
        log::debug!("Reaction ran {} frames", frames);

        ReactionSnapshot::from(&*session.borrow())
    }

    fn play_arcade(mode: GameMode, settings: &Settings, seed: u64) -> ArcadeSnapshot {
        let config = ArcadeConfig::for_difficulty(settings.difficulty);
        let state = Rc::new(RefCell::new(ArcadeState::new(mode, config)));
        let mut rng = RunSeed(seed).to_rng();
        let mut clock = DeltaClock::new();

        let shared = state.clone();
        let mut started = false;
        let frame_loop = FrameLoop::start(move |time| {
            let mut state = shared.borrow_mut();
            let elapsed = clock.sample(time);
            let input = ArcadeInput {
                jump: !started || obstacle_ahead(&state),
                ..ArcadeInput::default()
            };
            started = true;
            arcade::tick(&mut state, &input, elapsed, &mut rng);
        });

        let frames = drive_until("Arcade", frame_loop, || {
            state.borrow().phase == ArcadePhase::GameOver
        });
        log::debug!("Arcade ran {} frames", frames);

        ArcadeSnapshot::from(&*state.borrow())
    }

    /// Jump when the nearest unhit obstacle is about to reach the player
    fn obstacle_ahead(state: &ArcadeState) -> bool {
        if state.player.airborne() {
            return false;
        }
        let player = state.player_rect();
        state
            .tiles
            .values()
            .filter(|tile| tile.has_obstacle && !state.obstacles_hit.contains(&tile.id))
            .map(|tile| state.obstacle_rect(tile).left() - player.right())
            .any(|gap| (0.0..24.0).contains(&gap))
    }

    /// Pump frames until `done` holds or the cap is hit, then tear down
    fn drive_until(name: &str, mut frame_loop: FrameLoop, done: impl Fn() -> bool) -> u32 {
        let mut frames = 0;
        while frames < MAX_FRAMES && frame_loop.pump(f64::from(frames) * FRAME_MS) {
            frames += 1;
            if done() {
                frame_loop.cancel();
            }
        }
        if frame_loop.is_running() {
            log::warn!("{} stopped at the {} frame cap", name, MAX_FRAMES);
            frame_loop.cancel();
        }
        frames
    }
}
