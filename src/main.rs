use std::ffi::CString;
use std::num::NonZeroU32;
use std::ptr;

use anyhow::{anyhow, Context, Result};

use clap::Parser;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::{GlConfig, GlDisplay, NotCurrentGlContext};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};

use glutin_winit::GlWindow;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::raw_window_handle::HasWindowHandle;
use winit::window::{Window, WindowId};

mod backend;
mod cli;
mod device;
mod logging;
mod mesh;
mod program;
#[cfg(test)]
mod recording;
mod renderer;
mod shader_source;
mod shaders;

use backend::{GlBackend, NativeGl};
use device::{Device, ErrorCheck};
use renderer::Renderer;
use shader_source::ShaderSource;

struct App {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    device: Device<NativeGl>,
    renderer: Renderer,

    /// Set when a frame fails; the loop exits and `main` reports it.
    failure: Option<anyhow::Error>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.failure = Some(err);
        event_loop.exit();
    }

    /// Releases GL objects while the context is still current.
    fn finish(self) -> Result<()> {
        let released = self.renderer.destroy(&self.device);

        if let Some(err) = self.failure {
            return Err(err);
        }

        released.context("failed to release GL objects")
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        self.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                // Minimized windows report a zero size.
                let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
                    return;
                };

                self.gl_surface.resize(&self.gl_context, w, h);

                if let Err(err) = self.renderer.resize(&self.device, width, height) {
                    self.fail(event_loop, err.into());
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.renderer.render(&self.device) {
                    self.fail(event_loop, err.into());
                    return;
                }

                self.window.pre_present_notify();

                if let Err(err) = self.gl_surface.swap_buffers(&self.gl_context) {
                    self.fail(event_loop, anyhow!(err).context("failed to swap buffers"));
                    return;
                }

                self.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .max_by_key(|config| config.num_samples())
        .expect("glutin offered no GL configs")
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    logging::init_logging(args.log.as_deref());

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window_attribs = Window::default_attributes()
        .with_title(args.title.as_str())
        .with_inner_size(PhysicalSize::new(args.width, args.height));

    let (window, gl_config) = glutin_winit::DisplayBuilder::new()
        .with_window_attributes(Some(window_attribs))
        .build(&event_loop, ConfigTemplateBuilder::new(), pick_config)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = window.context("no window was created")?;

    let context_attribs = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .build(window.window_handle().ok().map(|wh| wh.as_raw()));
    let gl_display = gl_config.display();
    let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attribs) }
        .context("failed to create an OpenGL 3.3 context")?;

    let surface_attribs = window
        .build_surface_attributes(Default::default())
        .context("failed to describe the window surface")?;
    let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attribs) }
        .context("failed to create the window surface")?;

    let gl_context = gl_context
        .make_current(&gl_surface)
        .context("failed to make the GL context current")?;

    if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN)) {
        log::warn!("vsync unavailable: {err}");
    }

    gl::load_with(|symbol| match CString::new(symbol) {
        Ok(symbol) => gl_display.get_proc_address(&symbol),
        Err(_) => ptr::null(),
    });

    let check = if args.check_gl {
        ErrorCheck::On
    } else {
        ErrorCheck::Off
    };
    // SAFETY: the context was made current above and stays alive in `App`.
    let device = Device::new(unsafe { NativeGl::new() }, check);

    match device.gl().get_string(gl::VERSION) {
        Some(version) => log::info!("OpenGL {version}"),
        None => log::warn!("GL_VERSION is unavailable"),
    }

    let source = match &args.shader {
        Some(path) => ShaderSource::load(path),
        None => ShaderSource::builtin(),
    };

    let renderer = Renderer::new(&device, args.mesh.mesh(), &source)
        .context("failed to set up the renderer")?;

    let size = window.inner_size();
    renderer
        .resize(&device, size.width, size.height)
        .context("failed to set the viewport")?;

    let mut app = App {
        window,
        gl_context,
        gl_surface,
        device,
        renderer,
        failure: None,
    };

    event_loop
        .run_app(&mut app)
        .context("event loop terminated with an error")?;

    app.finish()
}
