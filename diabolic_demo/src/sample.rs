/// Sample driver - advances time and renders one frame per redraw

use diabolic::dbl::{Renderer, RendererConfig};
use diabolic::{dbl_debug, dbl_info, Result};
use std::path::{Path, PathBuf};

use crate::frame_clock::FrameClock;

const SOURCE: &str = "diabolic_demo::sample";

const TEXTURE_FILE: &str = "textures/cube.png";

/// Renderer configuration for the demo assets
///
/// The cube is textured when `assets/textures/cube.png` exists, vertex colored
/// otherwise.
pub fn demo_config(assets: &Path) -> RendererConfig {
    let mut config = RendererConfig::default();
    config.geometry.vertex_shader = assets.join("shaders/uber_vs.wgsl");

    let texture = assets.join(TEXTURE_FILE);
    if texture.is_file() {
        config.geometry.pixel_shader = assets.join("shaders/uber_textured_ps.wgsl");
        config.geometry.texture = Some(texture);
    } else {
        dbl_info!(SOURCE, "No texture at '{}', using vertex colors", texture.display());
        config.geometry.pixel_shader = assets.join("shaders/uber_ps.wgsl");
    }
    config
}

/// Demo asset directory next to the crate manifest
pub fn assets_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
}

pub struct Sample {
    clock: FrameClock,
}

impl Sample {
    pub fn new() -> Self {
        Self {
            clock: FrameClock::new(),
        }
    }

    /// Tick the clock and render a frame
    pub fn frame(&mut self, renderer: &mut Renderer) -> Result<()> {
        let delta_time = self.clock.tick();
        renderer.render(delta_time)?;

        if let Some(rate) = self.clock.take_frame_rate() {
            dbl_debug!(SOURCE, "{:.1} FPS ({:.2} ms/frame, {} frames)",
                rate.frames_per_second, rate.milliseconds_per_frame, renderer.stats().frames_rendered);
        }
        Ok(())
    }

    /// Drop the time spent away (minimized, resizing) from the next delta
    pub fn pause(&mut self) {
        self.clock.reset();
    }
}

#[cfg(test)]
#[path = "sample_tests.rs"]
mod tests;
