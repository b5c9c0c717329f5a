//! Helpers shared by unit tests: temporary asset files and log capture

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::config::GeometryPipelineDesc;
use crate::log::{self, LogEntry, Logger};

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// Write `contents` to a unique file in the temp directory
pub(crate) fn write_temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join("diabolic_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let unique = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
    let path = dir.join(format!("{}_{}_{}", std::process::id(), unique, name));
    std::fs::write(&path, contents).unwrap();
    path
}

/// PNG whose top row is red and whose bottom row is blue
pub(crate) fn write_test_png(width: u32, height: u32) -> PathBuf {
    let image = image::RgbaImage::from_fn(width, height, |_, y| {
        if y == 0 {
            image::Rgba([255, 0, 0, 255])
        } else if y == height - 1 {
            image::Rgba([0, 0, 255, 255])
        } else {
            image::Rgba([0, 255, 0, 255])
        }
    });
    let path = write_temp_file("texture.png", &[]);
    image.save(&path).unwrap();
    path
}

/// Geometry pipeline inputs pointing at throwaway shader files
pub(crate) fn test_geometry_desc(texture: Option<PathBuf>) -> GeometryPipelineDesc {
    GeometryPipelineDesc {
        vertex_shader: write_temp_file("uber_vs.wgsl", b"@vertex fn main() {}"),
        pixel_shader: write_temp_file("uber_ps.wgsl", b"@fragment fn main() {}"),
        texture,
    }
}

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Route every log entry into the returned buffer until `log::reset_logger`.
/// Callers must be `#[serial]`.
pub(crate) fn install_capture_logger() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}
