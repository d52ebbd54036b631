use std::sync::Arc;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::controls::{KeyAction, pressed_key};
use crate::gpu::GpuContext;
use crate::renderer::FrameRenderer;
use crate::scene::SceneSetup;
use crate::wgpu_backend::WgpuBackend;

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vitrine".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Opens a window and runs `setup` until the window closes or a quit key is pressed.
///
/// The loop never sleeps: every redraw advances the animation by one tick and
/// immediately requests the next redraw.
///
/// # Example
/// ```no_run
/// use vitrine::{drawable, AppConfig, ProgramSource, SceneObject, SceneSetup};
///
/// let mut setup = SceneSetup::new();
/// let quad = setup.add_drawable(drawable::color_quad());
/// let flat = setup.add_program(ProgramSource::flat());
/// setup.add_object(SceneObject::new(quad, flat));
///
/// vitrine::run(AppConfig::new().title("Quad"), setup)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn run(config: AppConfig, setup: SceneSetup) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = VitrineApp::Pending {
        config,
        setup: Some(setup),
    };
    event_loop.run_app(&mut app).context("event loop failed")?;

    match app {
        VitrineApp::Exited(Some(err)) => Err(err),
        _ => Ok(()),
    }
}

enum VitrineApp {
    Pending {
        config: AppConfig,
        setup: Option<SceneSetup>,
    },
    Running {
        window: Arc<Window>,
        renderer: FrameRenderer<WgpuBackend>,
    },
    Exited(Option<anyhow::Error>),
}

impl VitrineApp {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        setup: SceneSetup,
    ) -> anyhow::Result<(Arc<Window>, FrameRenderer<WgpuBackend>)> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );
        let gpu = GpuContext::new(Arc::clone(&window)).context("failed to initialize GPU")?;
        let (width, height) = (gpu.width(), gpu.height());
        let backend = WgpuBackend::new(gpu);
        let renderer = FrameRenderer::initialize(backend, width, height, setup)
            .with_context(|| format!("failed to set up '{}'", config.title))?;

        Ok((window, renderer))
    }

    /// Releases the renderer, if any, and leaves the loop.
    fn exit(&mut self, event_loop: &ActiveEventLoop, error: Option<anyhow::Error>) {
        if let VitrineApp::Running { renderer, .. } =
            std::mem::replace(self, VitrineApp::Exited(None))
        {
            renderer.shutdown();
        }
        *self = VitrineApp::Exited(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for VitrineApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let VitrineApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Self::start(event_loop, config, setup) {
            Ok((window, renderer)) => {
                window.request_redraw();
                *self = VitrineApp::Running { window, renderer };
            }
            Err(err) => self.exit(event_loop, Some(err)),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let VitrineApp::Running { window, renderer } = self else {
            return;
        };

        let result = match event {
            WindowEvent::CloseRequested => {
                self.exit(event_loop, None);
                return;
            }
            WindowEvent::Resized(size) => renderer.on_resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = pressed_key(&event) {
                    if renderer.on_key(key) == KeyAction::Quit {
                        self.exit(event_loop, None);
                        return;
                    }
                }
                Ok(())
            }
            WindowEvent::RedrawRequested => {
                let result = renderer.on_tick();
                window.request_redraw();
                result
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            log::error!("{err}");
            self.exit(event_loop, Some(err.into()));
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if let VitrineApp::Running { .. } = self {
            self.exit(event_loop, None);
        }
    }
}
