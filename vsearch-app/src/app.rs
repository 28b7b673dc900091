use anyhow::{anyhow, Result};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vsearch_core::{palette, GlyphPlacement, StimulusSet, Symbol};
use vsearch_experiment::results::export_path;
use vsearch_experiment::{
    write_config, ExperimentSettings, ExperimentStateMachine, PresentationRequest, RenderRequest,
};
use vsearch_render::SkiaRenderer;
use vsearch_timing::HighPrecisionTimer;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Icon, Window, WindowId},
};

const ICON_SIZE: u32 = 32;

/// Presentation shell: owns the window, feeds key presses into the trial
/// state machine and draws whatever it asks for.
pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    experiment: ExperimentStateMachine<HighPrecisionTimer, ThreadRng>,
    renderer: SkiaRenderer,
    buffer_size: u32,
    output_dir: PathBuf,
    fullscreen: bool,
    should_exit: bool,
}

impl App {
    pub fn new(settings: ExperimentSettings, output_dir: PathBuf) -> Result<Self> {
        let canvas = settings.trial.canvas_size;
        let mut experiment =
            ExperimentStateMachine::new(settings, HighPrecisionTimer::new(), rand::rng());
        experiment.generate_preview();

        Ok(Self {
            window: None,
            pixels: None,
            experiment,
            renderer: SkiaRenderer::new(canvas)?,
            buffer_size: canvas,
            output_dir,
            fullscreen: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "visual search ready"
        );
        info!("ENTER start | SPACE/F target found | G new preview | P png | C config | R results | ESC exit");

        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let size = self.buffer_size;
        let window_attributes = Window::default_attributes()
            .with_title("Visual Search")
            .with_inner_size(LogicalSize::new(size, size))
            .with_window_icon(window_icon());

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical = window.inner_size();
        info!(
            width = physical.width,
            height = physical.height,
            scale = window.scale_factor(),
            "window created"
        );

        let surface_texture = SurfaceTexture::new(physical.width, physical.height, window.clone());
        self.pixels = Some(Pixels::new(size, size, surface_texture)?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        self.experiment.update();
        self.apply_presentation_requests();

        let request = self.experiment.render_request();
        let stats = self.renderer.render(&request)?;

        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(());
        };
        let size = self.renderer.size();
        if size != self.buffer_size {
            pixels.resize_buffer(size, size)?;
            self.buffer_size = size;
        }
        self.renderer.copy_into(pixels.frame_mut())?;
        pixels.render()?;
        self.experiment.mark_onset();

        debug!(
            clear_ms = stats.clear.as_secs_f64() * 1e3,
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            glyphs = stats.glyphs,
            "frame"
        );
        Ok(())
    }

    /// Fullscreen is best effort: when the platform refuses, the run goes on
    /// in the window.
    fn apply_presentation_requests(&mut self) {
        let requests = self.experiment.drain_presentation_requests();
        let Some(window) = &self.window else {
            return;
        };
        for request in requests {
            match request {
                PresentationRequest::EnterFullscreen => {
                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    window.set_cursor_visible(false);
                    self.fullscreen = window.fullscreen().is_some();
                    if !self.fullscreen {
                        warn!("fullscreen unavailable, continuing windowed");
                    }
                }
                PresentationRequest::ExitFullscreen => {
                    window.set_fullscreen(None);
                    window.set_cursor_visible(true);
                    self.fullscreen = false;
                }
            }
        }
    }

    fn handle_input(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        match code {
            KeyCode::Enter | KeyCode::NumpadEnter => {
                self.experiment.start_experiment();
            }
            // The space bar counts only in fullscreen; F is the explicit control
            KeyCode::Space if self.fullscreen => {
                self.experiment.respond();
            }
            KeyCode::KeyF => {
                self.experiment.respond();
            }
            KeyCode::KeyG => {
                if let Some(set) = self.experiment.generate_preview() {
                    info!(glyphs = set.len(), "new preview");
                }
            }
            KeyCode::KeyP => self.report(self.save_snapshot(), "snapshot"),
            KeyCode::KeyC => self.report(self.save_config(), "config export"),
            KeyCode::KeyR => self.report(self.save_results(), "results export"),
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            _ => {}
        }
    }

    fn save_snapshot(&self) -> Result<()> {
        let path = export_path(&self.output_dir, "visual-search-stimulus", "png");
        self.renderer.save_png(&path)?;
        info!(path = %path.display(), "snapshot written");
        Ok(())
    }

    fn save_config(&self) -> Result<()> {
        write_config(&self.output_dir, &self.experiment.settings().trial)?;
        Ok(())
    }

    fn save_results(&self) -> Result<()> {
        let results = self.experiment.results();
        results.write_csv(&self.output_dir)?;
        results.write_json(&self.output_dir)?;
        Ok(())
    }

    fn report(&self, outcome: Result<()>, what: &str) {
        if let Err(e) = outcome {
            error!("{what} failed: {e:#}");
        }
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(width, height) {
                error!("failed to resize surface: {e}");
            }
        }
        debug!(width, height, "surface resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
            window.set_fullscreen(None);
        }
        info!(trials = self.experiment.results().len(), "exiting");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    error!("render failed: {e:#}");
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_input(code, event_loop);
                }
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz.width, sz.height),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

/// A green target slash, drawn by the stimulus renderer itself
fn window_icon() -> Option<Icon> {
    let build = || -> Result<Icon> {
        let mut renderer = SkiaRenderer::new(ICON_SIZE)?;
        let glyph = GlyphPlacement {
            x: ICON_SIZE as f32 / 2.0,
            y: ICON_SIZE as f32 / 2.0,
            is_target: true,
            color: palette::GREEN.to_string(),
            symbol: Symbol::ForwardSlash,
        };
        renderer.render(&RenderRequest::Stimulus {
            stimulus: Arc::new(StimulusSet::new(vec![glyph])),
            canvas_size: ICON_SIZE,
            glyph_size: ICON_SIZE - 8,
        })?;
        Icon::from_rgba(renderer.pixmap().data().to_vec(), ICON_SIZE, ICON_SIZE)
            .map_err(|e| anyhow!("bad icon: {e}"))
    };
    build().map_err(|e| warn!("window icon unavailable: {e:#}")).ok()
}
