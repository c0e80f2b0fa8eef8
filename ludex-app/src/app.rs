use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ludex_core::{ExportRow, GameKey, Scene};
use ludex_engine::variants::{DiscreteButtonSpatial, FeedCroc};
use ludex_engine::{Bounds, GameSession, SessionProgress, TrialSchedule};
use ludex_render::{SkiaSurface, SpriteStore, TextPainter};
use ludex_timing::MonotonicClock;
use pixels::{Pixels, SurfaceTexture};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::config::{GameType, StudyConfig};
use crate::cues::TimedCue;

type SpatialSession = GameSession<DiscreteButtonSpatial<u64>, MonotonicClock, Pcg32>;
type CrocSession = GameSession<FeedCroc<u64>, MonotonicClock, Pcg32>;

/// The active session, one variant at a time.
enum Study {
    Spatial(SpatialSession),
    Croc(CrocSession),
}

impl Study {
    fn start(&mut self) {
        match self {
            Study::Spatial(s) => s.start(),
            Study::Croc(s) => s.start(),
        }
    }

    fn tick(&mut self, scene: &mut Scene) {
        match self {
            Study::Spatial(s) => s.tick(scene),
            Study::Croc(s) => s.tick(scene),
        }
    }

    fn key_down(&mut self, key: GameKey) {
        match self {
            Study::Spatial(s) => s.key_down(key),
            Study::Croc(s) => s.key_down(key),
        }
    }

    fn pointer_moved(&mut self, y: f32) {
        match self {
            Study::Spatial(s) => s.pointer_moved(y),
            Study::Croc(s) => s.pointer_moved(y),
        }
    }

    fn resize(&mut self, canvas: Bounds) {
        match self {
            Study::Spatial(s) => s.resize(canvas),
            Study::Croc(s) => s.resize(canvas),
        }
    }

    fn is_complete(&self) -> bool {
        match self {
            Study::Spatial(s) => s.is_complete(),
            Study::Croc(s) => s.is_complete(),
        }
    }

    fn progress(&self) -> SessionProgress {
        match self {
            Study::Spatial(s) => s.progress(),
            Study::Croc(s) => s.progress(),
        }
    }

    fn rows(&self) -> &[ExportRow] {
        match self {
            Study::Spatial(s) => s.rows(),
            Study::Croc(s) => s.rows(),
        }
    }
}

pub struct App {
    config: StudyConfig,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    surface: Option<SkiaSurface>,
    sprites: SpriteStore,
    text: Option<TextPainter>,
    study: Option<Study>,
    scene: Scene,
    scale_factor: f64,
    started: bool,
    results_written: bool,
    should_exit: bool,
}

impl App {
    pub fn new(config: StudyConfig) -> Self {
        Self {
            config,
            window: None,
            pixels: None,
            surface: None,
            sprites: SpriteStore::new(),
            text: None,
            study: None,
            scene: Scene::default(),
            scale_factor: 1.0,
            started: false,
            results_written: false,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        log::info!("platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
        log::info!("press SPACE to start or ESC to exit");
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("no monitor available"))?;

        let window_attributes = Window::default_attributes()
            .with_title("Ludex")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        self.scale_factor = window.scale_factor();
        log::info!(
            "display: {}x{} at scale {:.2}",
            size.width,
            size.height,
            self.scale_factor
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.surface = SkiaSurface::new(size.width, size.height);

        for entry in &self.config.assets {
            self.sprites.load_file(entry.id, &entry.path);
        }
        if let Some(font) = &self.config.font {
            match TextPainter::from_file(font, self.config.font_size) {
                Ok(painter) => self.text = Some(painter),
                Err(e) => log::warn!("font unavailable, labels disabled: {e:#}"),
            }
        }

        self.study = Some(self.build_study(size)?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn build_study(&mut self, size: PhysicalSize<u32>) -> Result<Study> {
        let canvas = Bounds {
            w: size.width as f32,
            h: size.height as f32,
        };
        let clock = MonotonicClock::new();
        let seed = self.config.seed.unwrap_or_else(rand::random);
        log::info!("trial schedule seed: {seed}");
        let rng = Pcg32::seed_from_u64(seed);
        let game = self.config.game.clone();

        let mut study = match (self.config.game_type, &self.config.demo_pairs) {
            (GameType::DiscreteButtonSpatial, None) => Study::Spatial(GameSession::new(
                game,
                DiscreteButtonSpatial::new(),
                clock,
                rng,
                canvas,
            )?),
            (GameType::DiscreteButtonSpatial, Some(pairs)) => {
                let schedule = TrialSchedule::demo(pairs, &game.obstructions, &game.velocities)?;
                Study::Spatial(GameSession::with_schedule(
                    game,
                    DiscreteButtonSpatial::new(),
                    clock,
                    rng,
                    canvas,
                    schedule,
                )?)
            }
            (GameType::FeedCroc, None) => {
                Study::Croc(GameSession::new(game, FeedCroc::new(), clock, rng, canvas)?)
            }
            (GameType::FeedCroc, Some(pairs)) => {
                let schedule = TrialSchedule::demo(pairs, &game.obstructions, &game.velocities)?;
                Study::Croc(GameSession::with_schedule(
                    game,
                    FeedCroc::new(),
                    clock,
                    rng,
                    canvas,
                    schedule,
                )?)
            }
        };

        let cues = match &mut study {
            Study::Spatial(s) => s.cues_mut(),
            Study::Croc(s) => s.cues_mut(),
        };
        for entry in self.config.cue_entries() {
            cues.register(
                entry.id,
                Box::new(TimedCue::new(Duration::from_secs_f64(entry.secs))),
            );
        }
        Ok(study)
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(surface), Some(study)) =
            (self.pixels.as_mut(), self.surface.as_mut(), self.study.as_mut())
        else {
            return Ok(());
        };

        self.scene.clear();
        study.tick(&mut self.scene);
        if study.is_complete() {
            self.scene.label = Some("All done!".to_string());
        } else if !self.started {
            self.scene.label = Some("Press SPACE to play".to_string());
        }

        surface.render(&self.scene, &self.sprites, self.text.as_mut());
        surface.present(pixels.frame_mut());
        pixels.render()?;

        if study.is_complete() && !self.results_written {
            self.write_results()?;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    fn write_results(&mut self) -> Result<()> {
        let Some(study) = &self.study else {
            return Ok(());
        };
        let file = File::create(&self.config.output)?;
        serde_json::to_writer_pretty(BufWriter::new(file), study.rows())?;
        self.results_written = true;
        log::info!(
            "wrote {} rows to {}",
            study.rows().len(),
            self.config.output.display()
        );
        Ok(())
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(study) = self.study.as_mut() else {
            return;
        };
        match code {
            KeyCode::Space => {
                if !self.started {
                    self.started = true;
                    study.start();
                }
            }
            KeyCode::KeyY => study.key_down(GameKey::Upper),
            KeyCode::KeyG => study.key_down(GameKey::Middle),
            KeyCode::KeyV => study.key_down(GameKey::Lower),
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                log::error!("surface resize failed: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                log::error!("buffer resize failed: {e}");
            }
        }
        if let Some(surface) = &mut self.surface {
            surface.resize(new_size.width, new_size.height);
        }
        if let Some(study) = &mut self.study {
            study.resize(Bounds {
                w: new_size.width as f32,
                h: new_size.height as f32,
            });
        }
        log::debug!("display resized to {}x{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        if self.started && !self.results_written {
            if let Err(e) = self.write_results() {
                log::error!("failed to write results: {e:#}");
            }
        }
        if let Some(study) = &self.study {
            let progress = study.progress();
            log::info!(
                "session ended at trial {}/{}",
                progress.current,
                progress.total
            );
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    log::error!("render failed: {e:#}");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(study) = &mut self.study {
                    study.pointer_moved(position.y as f32);
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
