//! Unit tests for command_queue.rs

use crate::command_queue::CommandQueue;
use crate::graphics_device::mock_graphics_device::{create_mock_device, MockCommandList};
use crate::graphics_device::{PrimitiveTopology, QueueKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// SUBMISSION TESTS
// ============================================================================

#[test]
fn test_execute_returns_increasing_fence_values() {
    let (gpu, device) = create_mock_device();
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();

    let first = queue.get_command_list().unwrap();
    assert_eq!(queue.execute_command_list(first).unwrap(), 1);
    let second = queue.get_command_list().unwrap();
    assert_eq!(queue.execute_command_list(second).unwrap(), 2);

    assert_eq!(queue.fence_value(), 2);
    assert_eq!(gpu.executed().len(), 2);
    assert!(queue.is_fence_complete(2).unwrap());
}

#[test]
fn test_executed_list_carries_recorded_commands() {
    let (gpu, device) = create_mock_device();
    let mut queue = CommandQueue::new(device, QueueKind::Copy).unwrap();

    let mut list = queue.get_command_list().unwrap();
    list.set_primitive_topology(PrimitiveTopology::TriangleList).unwrap();
    queue.execute_command_list(list).unwrap();

    let batches = gpu.executed();
    assert_eq!(batches[0].queue, QueueKind::Copy);
    assert_eq!(batches[0].commands, vec!["set_primitive_topology(TriangleList)".to_string()]);
}

// ============================================================================
// WAIT TESTS
// ============================================================================

#[test]
fn test_wait_returns_only_after_submission_completes() {
    let (gpu, device) = create_mock_device();
    gpu.set_auto_complete(false);
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();

    let mut values = Vec::new();
    for _ in 0..3 {
        let list = queue.get_command_list().unwrap();
        values.push(queue.execute_command_list(list).unwrap());
    }
    assert_eq!(values, vec![1, 2, 3]);
    assert!(!queue.is_fence_complete(1).unwrap());

    let released = Arc::new(AtomicU64::new(0));
    let worker = {
        let gpu = gpu.clone();
        let released = released.clone();
        thread::spawn(move || {
            for value in 1..=3 {
                thread::sleep(Duration::from_millis(10));
                released.store(value, Ordering::SeqCst);
                gpu.complete_next();
            }
        })
    };

    queue.wait_for_fence_value(2).unwrap();
    assert!(released.load(Ordering::SeqCst) >= 2);
    assert!(queue.is_fence_complete(2).unwrap());

    worker.join().unwrap();
    assert!(queue.is_fence_complete(3).unwrap());
}

#[test]
fn test_wait_on_reached_value_does_not_block() {
    let (gpu, device) = create_mock_device();
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();
    let list = queue.get_command_list().unwrap();
    let value = queue.execute_command_list(list).unwrap();

    gpu.set_auto_complete(false);
    queue.wait_for_fence_value(value).unwrap();
    queue.wait_for_fence_value(0).unwrap();
}

#[test]
fn test_flush_signals_and_waits() {
    let (_gpu, device) = create_mock_device();
    let mut queue = CommandQueue::new(device, QueueKind::Copy).unwrap();

    queue.flush().unwrap();
    assert_eq!(queue.fence_value(), 1);
    assert!(queue.is_fence_complete(1).unwrap());
}

// ============================================================================
// POOLING TESTS
// ============================================================================

#[test]
fn test_allocator_reused_only_after_completion() {
    let (gpu, device) = create_mock_device();
    gpu.set_auto_complete(false);
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();

    let list = queue.get_command_list().unwrap();
    queue.execute_command_list(list).unwrap();

    // First allocator still in flight: a second one is created
    let list = queue.get_command_list().unwrap();
    assert_eq!(gpu.allocators_created.load(Ordering::SeqCst), 2);
    assert_eq!(gpu.allocator_resets.load(Ordering::SeqCst), 0);
    queue.execute_command_list(list).unwrap();

    gpu.complete_pending();

    let list = queue.get_command_list().unwrap();
    assert_eq!(gpu.allocators_created.load(Ordering::SeqCst), 2);
    assert_eq!(gpu.allocator_resets.load(Ordering::SeqCst), 1);
    queue.execute_command_list(list).unwrap();
}

#[test]
fn test_command_lists_are_pooled() {
    let (gpu, device) = create_mock_device();
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();

    for _ in 0..10 {
        let list = queue.get_command_list().unwrap();
        queue.execute_command_list(list).unwrap();
    }

    assert_eq!(gpu.command_lists_created.load(Ordering::SeqCst), 1);
    assert_eq!(gpu.allocators_created.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reused_list_is_bound_to_fresh_allocator() {
    let (gpu, device) = create_mock_device();
    gpu.set_auto_complete(false);
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();

    let list = queue.get_command_list().unwrap();
    let first_allocator = list.as_any().downcast_ref::<MockCommandList>().unwrap().allocator_id;
    queue.execute_command_list(list).unwrap();

    let list = queue.get_command_list().unwrap();
    let second_allocator = list.as_any().downcast_ref::<MockCommandList>().unwrap().allocator_id;
    assert_ne!(first_allocator, second_allocator);
    queue.execute_command_list(list).unwrap();
    gpu.complete_pending();
}

#[test]
fn test_submission_failure_propagates() {
    let (gpu, device) = create_mock_device();
    let mut queue = CommandQueue::new(device, QueueKind::Direct).unwrap();

    gpu.fail_execute.store(true, std::sync::atomic::Ordering::SeqCst);
    let list = queue.get_command_list().unwrap();
    assert!(queue.execute_command_list(list).is_err());
    assert_eq!(queue.fence_value(), 0);
}
