//! Sweet Slice entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, PointerEvent};

    use sweet_slice::audio::{AudioManager, SoundEffect};
    use sweet_slice::consts::*;
    use sweet_slice::persistence::LocalStore;
    use sweet_slice::platform::{Viewport, is_mobile_user_agent};
    use sweet_slice::renderer::SdfRenderState;
    use sweet_slice::sim::{BladeInput, GameEvent, GamePhase, GameState, TickInput, tick};
    use sweet_slice::{HighScores, Settings, Tuning};

    struct Game {
        state: GameState,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        settings: Settings,
        highscores: HighScores,
        store: Option<LocalStore>,
        audio: AudioManager,
        viewport: Viewport,
        is_mobile: bool,
        // Rank reached by the last finished run
        last_rank: Option<usize>,
    }

    impl Game {
        fn new(seed: u64, viewport: Viewport, is_mobile: bool) -> Self {
            let store = match LocalStore::open() {
                Ok(store) => Some(store),
                Err(e) => {
                    log::warn!("LocalStorage unavailable, nothing will persist: {}", e);
                    None
                }
            };
            let (settings, highscores) = match &store {
                Some(store) => (Settings::load_from(store), HighScores::load_from(store)),
                None => (Settings::default(), HighScores::new()),
            };

            let mut audio = AudioManager::new();
            audio.set_volume(settings.sfx_gain());

            let item_scale = settings.item_scale(is_mobile);
            let mut state = GameState::new(seed, Tuning::default(), viewport.css, item_scale);
            state.max_particles = settings.max_particles();

            Self {
                state,
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                settings,
                highscores,
                store,
                audio,
                viewport,
                is_mobile,
                last_rank: None,
            }
        }

        /// Queue a run start for the next tick
        fn request_start(&mut self) {
            self.audio.resume();
            self.state.item_scale = self.settings.item_scale(self.is_mobile);
            self.last_rank = None;
            self.input.start = true;
        }

        /// Re-apply and persist settings after the player changed one
        fn settings_changed(&mut self) {
            self.audio.set_volume(self.settings.sfx_gain());
            self.state.max_particles = self.settings.max_particles();
            if let Some(store) = &self.store {
                self.settings.save_to(store);
            }
        }

        fn apply_viewport(&mut self, viewport: Viewport) {
            self.viewport = viewport;
            self.state.resize(viewport.css);
            if let Some(ref mut render_state) = self.render_state {
                let (w, h) = viewport.buffer_size();
                render_state.resize(w, h, viewport.pixel_ratio);
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;
            self.state.max_particles = self.settings.max_particles();

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.state, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.start = false;
                self.input.pause = false;
                self.input.blade.clear();
            }

            self.handle_events();
        }

        /// React to what happened inside the simulation
        fn handle_events(&mut self) {
            for event in self.state.drain_events() {
                if let Some(effect) = SoundEffect::for_event(&event, self.state.tuning.combo_step) {
                    self.audio.play(effect);
                }

                if let GameEvent::GameOver { score, best_combo } = event {
                    self.last_rank =
                        self.highscores
                            .add_score(score, best_combo, js_sys::Date::now());
                    if let Some(rank) = self.last_rank {
                        log::info!("New high score: #{} with {}", rank, score);
                        self.audio.play(SoundEffect::HighScore);
                        if let Some(store) = &self.store {
                            self.highscores.save_to(store);
                        }
                    }
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.settings, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (w, h) = self.viewport.buffer_size();
                        render_state.resize(w, h, self.viewport.pixel_ratio);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let state = &self.state;

            set_text(&document, "hud-score", &state.score.to_string());
            set_text(
                &document,
                "hud-misses",
                &format!("{} / {}", state.misses, state.tuning.max_misses),
            );

            // Combo only shows once it is a real chain
            if let Some(el) = document.get_element_by_id("hud-combo") {
                if state.combo > 1 {
                    el.set_text_content(Some(&format!(
                        "Combo {} (x{})",
                        state.combo,
                        state.multiplier()
                    )));
                    let _ = el.set_attribute("class", "hud-item");
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            let label = if state.phase == GamePhase::Paused {
                "Resume"
            } else {
                "Pause"
            };
            set_text(&document, "pause-btn", label);

            set_visible(&document, "title-screen", state.phase == GamePhase::Title);
            set_visible(&document, "pause-screen", state.phase == GamePhase::Paused);
            set_visible(&document, "game-over", state.phase == GamePhase::GameOver);

            if state.phase == GamePhase::GameOver {
                set_text(&document, "final-score", &state.score.to_string());
                set_text(&document, "final-combo", &state.best_combo.to_string());
                let rank = match self.last_rank {
                    Some(1) => "New best!".to_string(),
                    Some(rank) => format!("Rank #{}", rank),
                    None => String::new(),
                };
                set_text(&document, "final-rank", &rank);
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id)
            && el.text_content().as_deref() != Some(text)
        {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let class = if visible { "overlay" } else { "overlay hidden" };
            let _ = el.set_attribute("class", class);
        }
    }

    /// Height of a page element, zero when absent
    fn element_height(document: &Document, selector: &str) -> f32 {
        document
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .map(|el| el.offset_height() as f32)
            .unwrap_or(0.0)
    }

    /// Size the canvas to the play area and return its geometry
    fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> Viewport {
        let document = window.document();
        let (header, footer) = match &document {
            Some(doc) => (element_height(doc, "header"), element_height(doc, ".footer")),
            None => (0.0, 0.0),
        };
        let inner = Vec2::new(
            window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(800.0) as f32,
            window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(600.0) as f32,
        );
        let viewport = Viewport::fit(inner, header, footer, window.device_pixel_ratio() as f32);

        let (w, h) = viewport.buffer_size();
        canvas.set_width(w);
        canvas.set_height(h);
        let style = canvas.style();
        let _ = style.set_property("width", &format!("{}px", viewport.css.x));
        let _ = style.set_property("height", &format!("{}px", viewport.css.y));

        viewport
    }

    fn to_js(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Sweet Slice starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()
            .map_err(|_| "not a canvas")?;

        let viewport = fit_canvas(&window, &canvas);
        let is_mobile = window
            .navigator()
            .user_agent()
            .map(|ua| is_mobile_user_agent(&ua))
            .unwrap_or(false);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, viewport, is_mobile)));

        log::info!("Game initialized with seed: {}", seed);

        // Prefer WebGPU, fall back to WebGL2
        let has_webgpu = js_sys::Reflect::has(&window.navigator(), &JsValue::from_str("gpu"))
            .unwrap_or(false);
        let backends = if has_webgpu {
            wgpu::Backends::BROWSER_WEBGPU
        } else {
            wgpu::Backends::GL
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(to_js)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(to_js)?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (w, h) = viewport.buffer_size();
        let render_state = SdfRenderState::new(surface, &adapter, w, h, viewport.pixel_ratio)
            .await
            .map_err(to_js)?;
        game.borrow_mut().render_state = Some(render_state);

        setup_pointer_handlers(&canvas, game.clone());
        setup_buttons(&document, game.clone());
        setup_keyboard(&window, game.clone());
        setup_resize(&window, &canvas, game.clone());
        setup_auto_pause(&window, &document, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Sweet Slice running!");
        Ok(())
    }

    fn pointer_pos(event: &PointerEvent) -> Vec2 {
        Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Press - capture the pointer so the swipe survives leaving the canvas
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input.blade.push(BladeInput::Press {
                    pointer_id: event.pointer_id(),
                    pos: pointer_pos(&event),
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                game.borrow_mut().input.blade.push(BladeInput::Drag {
                    pointer_id: event.pointer_id(),
                    pos: pointer_pos(&event),
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release and cancel both end the swipe
        for name in ["pointerup", "pointercancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                game.borrow_mut().input.blade.push(BladeInput::Release {
                    pointer_id: event.pointer_id(),
                });
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().request_start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("pause-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().input.pause = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                "Escape" | "p" | "P" => g.input.pause = true,
                "q" | "Q" => {
                    let preset = g.settings.cycle_quality();
                    log::info!("Quality: {}", preset.as_str());
                    g.settings_changed();
                }
                "m" | "M" => {
                    g.settings.muted = !g.settings.muted;
                    log::info!("Muted: {}", g.settings.muted);
                    g.settings_changed();
                }
                "r" | "R" => {
                    g.settings.reduced_motion = !g.settings.reduced_motion;
                    log::info!("Reduced motion: {}", g.settings.reduced_motion);
                    g.settings_changed();
                }
                " " | "Enter" => {
                    if matches!(g.state.phase, GamePhase::Title | GamePhase::GameOver) {
                        g.request_start();
                    }
                }
                _ => {}
            }
        });
        let _ = window
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window_clone = window.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let viewport = fit_canvas(&window_clone, &canvas_clone);
            game.borrow_mut().apply_viewport(viewport);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(window: &web_sys::Window, document: &Document, game: Rc<RefCell<Game>>) {
        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state.phase == GamePhase::Playing {
                        g.input.pause = true;
                        log::info!("Auto-paused (tab hidden)");
                    }
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
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
                if g.state.phase == GamePhase::Playing {
                    g.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Focus restores audio; the game stays paused until the player resumes
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_muted(false);
            });
            let _ = window
                .add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Sweet Slice failed to start: {:?}", e);
    }
}

/// Headless autoplay for balance checks: `sweet-slice [tuning.json] [seed]`
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use sweet_slice::Tuning;
    use sweet_slice::consts::SIM_DT;
    use sweet_slice::sim::{
        BladeInput, GamePhase, GameState, ItemKind, TickInput, segment_intersects_circle, tick,
    };

    env_logger::init();
    log::info!("Sweet Slice (native) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Bad tuning file {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let mut state = GameState::new(seed, tuning, Vec2::new(1280.0, 720.0), 1.0);
    let mut input = TickInput {
        start: true,
        ..Default::default()
    };

    // Two simulated minutes at most
    let max_ticks = (120.0 / SIM_DT) as u32;
    let mut ticks = 0;
    while ticks < max_ticks && state.phase != GamePhase::GameOver {
        tick(&mut state, &input, SIM_DT);
        input = TickInput::default();
        ticks += 1;

        // Cut the first visible treat with a short stroke, keeping clear of bombs
        let floor = state.arena.y;
        let target = state.items.iter().find(|item| {
            matches!(item.kind, ItemKind::Treat(_)) && !item.sliced && item.pos.y < floor
        });
        if let Some(item) = target {
            let a = item.pos - Vec2::new(item.radius + 4.0, 0.0);
            let b = item.pos + Vec2::new(item.radius + 4.0, 0.0);
            let risky = state.items.iter().any(|other| {
                other.kind == ItemKind::Bomb
                    && segment_intersects_circle(a, b, other.pos, other.radius)
            });
            if !risky {
                input.blade = vec![
                    BladeInput::Release { pointer_id: 1 },
                    BladeInput::Press { pointer_id: 1, pos: a },
                    BladeInput::Drag { pointer_id: 1, pos: b },
                ];
            }
        }
    }

    log::info!(
        "Autoplay finished after {:.1}s: score {}, misses {}, best combo {}, spawned {}",
        ticks as f32 * SIM_DT,
        state.score,
        state.misses,
        state.best_combo,
        state.spawned
    );
    println!("score={} best_combo={} misses={}", state.score, state.best_combo, state.misses);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
