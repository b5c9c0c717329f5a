/// Unit tests for MockGraphicsDevice and the mock types.

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// Fence / queue tests
// ============================================================================

#[test]
fn test_auto_complete_signal_reaches_fence() {
    let (_gpu, device) = create_mock_device();
    let queue = device.create_command_queue(QueueKind::Direct).unwrap();
    let fence = device.create_fence(0).unwrap();

    queue.signal(fence.as_ref(), 3).unwrap();
    assert_eq!(fence.completed_value().unwrap(), 3);
}

#[test]
fn test_deferred_signal_completes_on_release() {
    let (gpu, device) = create_mock_device();
    gpu.set_auto_complete(false);
    let queue = device.create_command_queue(QueueKind::Copy).unwrap();
    let fence = device.create_fence(0).unwrap();

    queue.signal(fence.as_ref(), 1).unwrap();
    queue.signal(fence.as_ref(), 2).unwrap();
    assert_eq!(fence.completed_value().unwrap(), 0);
    assert_eq!(gpu.pending_count(), 2);

    assert!(gpu.complete_next());
    assert_eq!(fence.completed_value().unwrap(), 1);
    assert_eq!(gpu.complete_pending(), 1);
    assert_eq!(fence.completed_value().unwrap(), 2);
    assert!(!gpu.complete_next());
}

#[test]
fn test_fence_wait_blocks_until_released() {
    let (gpu, device) = create_mock_device();
    gpu.set_auto_complete(false);
    let queue = device.create_command_queue(QueueKind::Direct).unwrap();
    let fence = device.create_fence(0).unwrap();
    queue.signal(fence.as_ref(), 1).unwrap();

    let releaser = {
        let gpu = gpu.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gpu.complete_pending();
        })
    };

    fence.wait(1).unwrap();
    assert_eq!(fence.completed_value().unwrap(), 1);
    releaser.join().unwrap();
}

#[test]
fn test_execute_rejects_open_list() {
    let (_gpu, device) = create_mock_device();
    let queue = device.create_command_queue(QueueKind::Direct).unwrap();
    let allocator = device.create_command_allocator(QueueKind::Direct).unwrap();
    let list = device.create_command_list(QueueKind::Direct, allocator.as_ref()).unwrap();

    let result = queue.execute_command_lists(&[list.as_ref()]);
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_execute_rejects_wrong_queue_kind() {
    let (_gpu, device) = create_mock_device();
    let queue = device.create_command_queue(QueueKind::Copy).unwrap();
    let allocator = device.create_command_allocator(QueueKind::Direct).unwrap();
    let mut list = device.create_command_list(QueueKind::Direct, allocator.as_ref()).unwrap();
    list.close().unwrap();

    assert!(queue.execute_command_lists(&[list.as_ref()]).is_err());
}

// ============================================================================
// Command list tests
// ============================================================================

#[test]
fn test_recording_after_close_fails() {
    let (_gpu, device) = create_mock_device();
    let allocator = device.create_command_allocator(QueueKind::Direct).unwrap();
    let mut list = device.create_command_list(QueueKind::Direct, allocator.as_ref()).unwrap();

    list.set_primitive_topology(PrimitiveTopology::TriangleList).unwrap();
    list.close().unwrap();
    assert!(!list.is_recording());
    assert!(list.set_primitive_topology(PrimitiveTopology::TriangleList).is_err());
    assert!(list.close().is_err());
}

#[test]
fn test_reset_reopens_and_clears() {
    let (gpu, device) = create_mock_device();
    let queue = device.create_command_queue(QueueKind::Direct).unwrap();
    let allocator = device.create_command_allocator(QueueKind::Direct).unwrap();
    let mut list = device.create_command_list(QueueKind::Direct, allocator.as_ref()).unwrap();

    assert!(list.reset(allocator.as_ref()).is_err(), "open lists cannot be reset");

    list.draw_indexed_instanced(3, 1, 0, 0, 0).unwrap();
    list.close().unwrap();
    list.reset(allocator.as_ref()).unwrap();
    list.close().unwrap();
    queue.execute_command_lists(&[list.as_ref()]).unwrap();

    let batches = gpu.executed();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].commands.is_empty());
}

// ============================================================================
// Resource / heap tests
// ============================================================================

#[test]
fn test_upload_resource_write_and_bounds() {
    let (_gpu, device) = create_mock_device();
    let upload = device
        .create_committed_resource(
            HeapType::Upload,
            &ResourceDesc::buffer(8, ResourceFlags::empty()),
            ResourceState::GenericRead,
            None,
            "staging",
        )
        .unwrap();

    upload.write(2, &[7, 8, 9]).unwrap();
    let mock = upload.as_any().downcast_ref::<MockResource>().unwrap();
    assert_eq!(mock.contents(), vec![0, 0, 7, 8, 9, 0, 0, 0]);

    assert!(upload.write(6, &[1, 2, 3]).is_err());
}

#[test]
fn test_default_heap_resource_is_not_writable() {
    let (_gpu, device) = create_mock_device();
    let buffer = device
        .create_committed_resource(
            HeapType::Default,
            &ResourceDesc::buffer(16, ResourceFlags::empty()),
            ResourceState::Common,
            None,
            "vertex_buffer",
        )
        .unwrap();

    assert!(matches!(buffer.write(0, &[1]), Err(Error::InvalidResource(_))));
}

#[test]
fn test_descriptor_heap_slot_validation() {
    let (_gpu, device) = create_mock_device();
    let heap = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            kind: DescriptorHeapKind::Rtv,
            capacity: 2,
            shader_visible: false,
        })
        .unwrap();
    let target = device
        .create_committed_resource(
            HeapType::Default,
            &ResourceDesc::texture_2d(4, 4, TextureFormat::R8G8B8A8_UNORM, ResourceFlags::ALLOW_RENDER_TARGET),
            ResourceState::RenderTarget,
            None,
            "target",
        )
        .unwrap();

    heap.create_render_target_view(1, &target).unwrap();
    assert!(heap.create_render_target_view(2, &target).is_err());
    assert!(heap.create_shader_resource_view(0, &target).is_err());
    assert!(DescriptorHandle::new(&heap, 2).is_err());

    let mock = heap.as_any().downcast_ref::<MockDescriptorHeap>().unwrap();
    assert_eq!(mock.view(1).as_deref(), Some("target"));
    assert_eq!(mock.view(0), None);
}

#[test]
fn test_descriptor_handle_equality() {
    let (_gpu, device) = create_mock_device();
    let desc = DescriptorHeapDesc {
        kind: DescriptorHeapKind::Dsv,
        capacity: 2,
        shader_visible: false,
    };
    let heap_a = device.create_descriptor_heap(&desc).unwrap();
    let heap_b = device.create_descriptor_heap(&desc).unwrap();

    assert_eq!(DescriptorHandle::new(&heap_a, 0).unwrap(), DescriptorHandle::new(&heap_a, 0).unwrap());
    assert_ne!(DescriptorHandle::new(&heap_a, 0).unwrap(), DescriptorHandle::new(&heap_a, 1).unwrap());
    assert_ne!(DescriptorHandle::new(&heap_a, 0).unwrap(), DescriptorHandle::new(&heap_b, 0).unwrap());
}

// ============================================================================
// Swapchain tests
// ============================================================================

#[test]
fn test_swapchain_index_cycles_on_present() {
    let (gpu, device) = create_mock_device();
    let queue = device.create_command_queue(QueueKind::Direct).unwrap();
    let window = MockWindow::new(320, 240);
    let mut swapchain = device
        .create_swapchain(
            &queue,
            &window,
            &SwapchainDesc {
                width: 320,
                height: 240,
                buffer_count: 2,
                format: TextureFormat::R8G8B8A8_UNORM,
            },
        )
        .unwrap();

    let indices: Vec<u32> = (0..5)
        .map(|_| {
            assert_eq!(swapchain.present(1).unwrap(), PresentStatus::Presented);
            swapchain.current_back_buffer_index()
        })
        .collect();
    assert_eq!(indices, vec![1, 0, 1, 0, 1]);
    assert_eq!(gpu.presents.load(Ordering::SeqCst), 5);

    swapchain.resize_buffers(640, 480).unwrap();
    assert_eq!(swapchain.current_back_buffer_index(), 0);
    assert_eq!(swapchain.buffer(1).unwrap().desc().width, 640);
    assert!(swapchain.buffer(2).is_err());
}

#[test]
fn test_swapchain_out_of_date_until_resized() {
    let (gpu, device) = create_mock_device();
    let queue = device.create_command_queue(QueueKind::Direct).unwrap();
    let window = MockWindow::new(320, 240);
    let mut swapchain = device
        .create_swapchain(
            &queue,
            &window,
            &SwapchainDesc {
                width: 320,
                height: 240,
                buffer_count: 2,
                format: TextureFormat::R8G8B8A8_UNORM,
            },
        )
        .unwrap();

    gpu.out_of_date_presents.store(1, Ordering::SeqCst);
    assert_eq!(swapchain.present(1).unwrap(), PresentStatus::OutOfDate);
    assert_eq!(swapchain.current_back_buffer_index(), 0);
    assert!(matches!(swapchain.present(1), Err(Error::BackendError(_))));

    swapchain.resize_buffers(320, 240).unwrap();
    assert_eq!(swapchain.present(1).unwrap(), PresentStatus::Presented);
    assert_eq!(gpu.presents.load(Ordering::SeqCst), 1);
    assert_eq!(gpu.swapchain_resizes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_swapchain_requires_direct_queue() {
    let (_gpu, device) = create_mock_device();
    let queue: Arc<dyn GpuQueue> = device.create_command_queue(QueueKind::Copy).unwrap();
    let window = MockWindow::new(8, 8);
    let desc = SwapchainDesc {
        width: 8,
        height: 8,
        buffer_count: 2,
        format: TextureFormat::R8G8B8A8_UNORM,
    };
    assert!(device.create_swapchain(&queue, &window, &desc).is_err());
}
