//! Integration tests for the Renderer on the Vulkan backend
//!
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test -p diabolic --test renderer_integration_tests -- --ignored


use diabolic::dbl::{Renderer, RendererState};
use diabolic::graphics_device::{GraphicsBackend, Rect, ResourceState, Viewport};
use diabolic::Error;
use gpu_test_utils::{
    shader_path, test_backend, test_window, textured_config, untextured_config, write_checker_png,
    WINDOW_HEIGHT, WINDOW_WIDTH,
};
use serial_test::serial;

const DELTA_TIME: f32 = 1.0 / 60.0;

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_renderer_new() {
    let renderer = Renderer::new(test_backend(), test_window(), untextured_config()).unwrap();

    assert_eq!(renderer.state(), RendererState::Ready);
    assert_eq!(renderer.width(), WINDOW_WIDTH);
    assert_eq!(renderer.height(), WINDOW_HEIGHT);
    assert!((renderer.aspect_ratio() - WINDOW_WIDTH as f32 / WINDOW_HEIGHT as f32).abs() < 1e-6);
    assert_eq!(renderer.viewport(), Viewport::new(WINDOW_WIDTH, WINDOW_HEIGHT));
    assert_eq!(renderer.scissor_rect(), Rect::from_size(WINDOW_WIDTH, WINDOW_HEIGHT));
    assert_eq!(renderer.depth_buffer_size(), (WINDOW_WIDTH, WINDOW_HEIGHT));
    assert_eq!(renderer.stats().frames_rendered, 0);
    assert!(!renderer.geometry_pipeline().is_textured());
    assert_eq!(
        renderer.geometry_pipeline().buffer_states(),
        (ResourceState::VertexAndConstantBuffer, ResourceState::IndexBuffer)
    );

    let adapters = test_backend().enumerate_adapters().unwrap();
    assert!(adapters.contains(renderer.adapter()));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_renderer_missing_shader() {
    let mut config = untextured_config();
    config.geometry.pixel_shader = shader_path("does_not_exist.wgsl");

    let result = Renderer::new(test_backend(), test_window(), config);
    assert!(matches!(result, Err(Error::AssetLoadFailed(_))));
}

// ============================================================================
// FRAMES
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_render_frames() {
    let mut renderer = Renderer::new(test_backend(), test_window(), untextured_config()).unwrap();
    let waits_before = renderer.stats().frame_waits;

    for _ in 0..10 {
        renderer.render(DELTA_TIME).unwrap();
    }

    let stats = renderer.stats();
    assert_eq!(stats.frames_rendered, 10);
    assert_eq!(stats.frame_waits, waits_before + 10);
    assert!(renderer.geometry_pipeline().elapsed() > 0.0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_render_textured() {
    let texture = write_checker_png(8);
    let mut renderer = Renderer::new(test_backend(), test_window(), textured_config(texture)).unwrap();

    assert!(renderer.geometry_pipeline().is_textured());
    assert_eq!(
        renderer.geometry_pipeline().texture_state(),
        Some(ResourceState::PixelShaderResource)
    );

    for _ in 0..3 {
        renderer.render(DELTA_TIME).unwrap();
    }
    assert_eq!(renderer.stats().frames_rendered, 3);
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_resize_window() {
    let mut renderer = Renderer::new(test_backend(), test_window(), untextured_config()).unwrap();
    renderer.render(DELTA_TIME).unwrap();

    renderer.resize_window(640, 480).unwrap();
    assert_eq!(renderer.width(), 640);
    assert_eq!(renderer.height(), 480);
    assert!((renderer.aspect_ratio() - 640.0 / 480.0).abs() < 1e-6);
    assert_eq!(renderer.viewport(), Viewport::new(640, 480));
    assert_eq!(renderer.scissor_rect(), Rect::from_size(640, 480));
    assert_eq!(renderer.depth_buffer_size(), (640, 480));
    assert_eq!(renderer.stats().depth_buffer_rebuilds, 1);

    renderer.render(DELTA_TIME).unwrap();

    // Same size: nothing is rebuilt
    renderer.resize_window(640, 480).unwrap();
    assert_eq!(renderer.stats().depth_buffer_rebuilds, 1);

    renderer.resize_window(WINDOW_WIDTH, WINDOW_HEIGHT).unwrap();
    assert_eq!(renderer.depth_buffer_size(), (WINDOW_WIDTH, WINDOW_HEIGHT));
    assert_eq!(renderer.stats().depth_buffer_rebuilds, 2);
    renderer.render(DELTA_TIME).unwrap();
}
