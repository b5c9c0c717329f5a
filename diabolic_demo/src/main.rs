//! DiaBolic demo - a rotating cube rendered through the Vulkan backend
//!
//! Escape or closing the window quits. Run with
//! `cargo run -p diabolic_demo --features vulkan-validation` to get the
//! validation layers.

mod frame_clock;
mod sample;

use diabolic::dbl::Renderer;
use diabolic::graphics_device::Window as DeviceWindow;
use diabolic::{dbl_error, dbl_info, Result};
use diabolic_device_vulkan::{print_validation_stats_report, VulkanBackend};
use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use std::process::ExitCode;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use crate::sample::{assets_dir, demo_config, Sample};

const SOURCE: &str = "diabolic_demo";

const WINDOW_TITLE: &str = "DiaBolic";
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

/// winit window seen through the renderer's window collaborator
struct DemoWindow {
    window: winit::window::Window,
    close_requested: bool,
}

impl HasWindowHandle for DemoWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for DemoWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl DeviceWindow for DemoWindow {
    fn width(&self) -> u32 {
        self.window.inner_size().width
    }

    fn height(&self) -> u32 {
        self.window.inner_size().height
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }
}

#[derive(Default)]
struct App {
    // Dropped in declaration order: sample, renderer, then the window it presents to
    sample: Option<Sample>,
    renderer: Option<Renderer>,
    backend: Option<VulkanBackend>,
    window: Option<DemoWindow>,
    failed: bool,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = winit::window::Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = event_loop.create_window(attributes)
            .map_err(|e| diabolic::dbl_err!(SOURCE, InitializationFailed, "Failed to create window: {}", e))?;
        let window = self.window.insert(DemoWindow {
            window,
            close_requested: false,
        });

        let config = demo_config(&assets_dir());
        let backend = self.backend.insert(VulkanBackend::new(&*window, config.enable_validation)?);
        let renderer = Renderer::new(&*backend, &*window, config)?;

        dbl_info!(SOURCE, "Rendering on '{}' ({}x{})", renderer.adapter().name, renderer.width(), renderer.height());
        self.renderer = Some(renderer);
        self.sample = Some(Sample::new());
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: diabolic::Error) {
        dbl_error!(SOURCE, "{}", error);
        self.failed = true;
        event_loop.exit();
    }

    fn is_minimized(&self) -> bool {
        self.window.as_ref().is_some_and(|window| window.width() == 0 || window.height() == 0)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(window) = self.window.as_mut() {
                    window.close_requested = true;
                }
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => {
                if let Some(window) = self.window.as_mut() {
                    window.close_requested = true;
                }
            }

            WindowEvent::Resized(size) => {
                // Minimized windows keep their swapchain until restored
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(sample) = self.sample.as_mut() {
                    sample.pause();
                }
                let result = self.renderer.as_mut()
                    .map_or(Ok(()), |renderer| renderer.resize_window(size.width, size.height));
                if let Err(e) = result {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.is_minimized() {
                    return;
                }
                let (Some(sample), Some(renderer)) = (self.sample.as_mut(), self.renderer.as_mut()) else {
                    return;
                };
                if let Err(e) = sample.frame(renderer) {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }

        if self.window.as_ref().is_some_and(|window| window.should_close()) {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(window) = self.window.as_ref() {
            window.window.request_redraw();
        }
    }
}

fn main() -> ExitCode {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            dbl_error!(SOURCE, "Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        dbl_error!(SOURCE, "Event loop terminated with an error: {}", e);
        app.failed = true;
    }

    let failed = app.failed;
    drop(app);
    print_validation_stats_report();

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
