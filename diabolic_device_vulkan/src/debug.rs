/// Vulkan Debug Messenger - Routes validation layer messages into the DiaBolic log
///
/// Messages are counted per severity and identical messages are grouped, so a
/// report can be printed when the application shuts down. Without the
/// `vulkan-validation` feature no messenger is ever created and the counters
/// stay at zero.

use colored::*;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<MessageTracker>> = Mutex::new(None);

/// Validation message counts since the backend was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    #[cfg_attr(not(feature = "vulkan-validation"), allow(dead_code))]
    fn increment(&self, counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Occurrence count per message text
struct MessageTracker {
    messages: FxHashMap<String, u32>,
}

impl MessageTracker {
    #[cfg_attr(not(feature = "vulkan-validation"), allow(dead_code))]
    fn track_message(&mut self, message: &str) -> u32 {
        let count = self.messages.entry(message.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn duplicate_count(&self) -> usize {
        self.messages.values().filter(|&&count| count > 1).count()
    }
}

/// Reset statistics and grouping (called when a validating instance is created)
#[cfg_attr(not(feature = "vulkan-validation"), allow(dead_code))]
pub(crate) fn init_debug_tracking() {
    VALIDATION_STATS.reset();
    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(MessageTracker {
            messages: FxHashMap::default(),
        });
    }
}

/// Get current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "✓ No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(tracker) = MESSAGE_TRACKER.lock() {
        let duplicates = tracker.as_ref().map_or(0, MessageTracker::duplicate_count);
        if duplicates > 0 {
            println!("\n  {} {} message(s) appeared multiple times", "ℹ".cyan(), duplicates);
        }
    }

    println!("{}\n", "====================================".bright_blue().bold());
}

#[cfg(feature = "vulkan-validation")]
pub(crate) use messenger::vulkan_debug_callback;

#[cfg(feature = "vulkan-validation")]
mod messenger {
    use super::{MessageTracker, MESSAGE_TRACKER, VALIDATION_STATS};
    use ash::vk;
    use diabolic::{dbl_debug, dbl_error, dbl_info, dbl_warn};
    use rustc_hash::FxHashMap;
    use std::ffi::CStr;

    const SOURCE: &str = "diabolic::vulkan::validation";

    /// Vulkan debug messenger callback
    ///
    /// Called by the validation layers; forwards each message to the DiaBolic
    /// logger with a severity matching the Vulkan one.
    pub unsafe extern "system" fn vulkan_debug_callback(
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
        p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
        _user_data: *mut std::os::raw::c_void,
    ) -> vk::Bool32 {
        if p_callback_data.is_null() {
            return vk::FALSE;
        }
        let callback_data = *p_callback_data;
        let message_id_name = if callback_data.p_message_id_name.is_null() {
            "Unknown"
        } else {
            CStr::from_ptr(callback_data.p_message_id_name)
                .to_str()
                .unwrap_or("Invalid UTF-8")
        };
        let message = if callback_data.p_message.is_null() {
            "No message"
        } else {
            CStr::from_ptr(callback_data.p_message)
                .to_str()
                .unwrap_or("Invalid UTF-8")
        };

        let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
            "Validation"
        } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
            "Performance"
        } else {
            "General"
        };

        let occurrence_count = match MESSAGE_TRACKER.lock() {
            Ok(mut tracker) => tracker
                .get_or_insert_with(|| MessageTracker {
                    messages: FxHashMap::default(),
                })
                .track_message(message),
            Err(_) => 1,
        };
        let repeat_indicator = if occurrence_count > 1 {
            format!(" [×{}]", occurrence_count)
        } else {
            String::new()
        };

        let text = format!("[{}]{} {}: {}", type_str, repeat_indicator, message_id_name, message);

        if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            VALIDATION_STATS.increment(&VALIDATION_STATS.errors);
            dbl_error!(SOURCE, "{}", text);
        } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            VALIDATION_STATS.increment(&VALIDATION_STATS.warnings);
            dbl_warn!(SOURCE, "{}", text);
        } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            VALIDATION_STATS.increment(&VALIDATION_STATS.info);
            dbl_info!(SOURCE, "{}", text);
        } else {
            VALIDATION_STATS.increment(&VALIDATION_STATS.verbose);
            dbl_debug!(SOURCE, "{}", text);
        }

        vk::FALSE // Don't abort Vulkan execution
    }
}
