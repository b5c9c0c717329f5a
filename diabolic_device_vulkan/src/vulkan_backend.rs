/// VulkanBackend - Instance creation, adapter enumeration and logical device creation

use ash::vk;
use diabolic::graphics_device::{AdapterInfo, AdapterKind, GraphicsBackend, GraphicsDevice, Window};
use diabolic::{dbl_debug, dbl_err, dbl_info, dbl_warn, Result};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::HasDisplayHandle;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, VulkanInstance};
use crate::vulkan_graphics_device::VulkanGraphicsDevice;

const SOURCE: &str = "diabolic::vulkan::backend";

/// Vulkan entry point of DiaBolic
///
/// Owns the Vulkan instance. Adapters are the instance's physical devices, in
/// enumeration order.
pub struct VulkanBackend {
    instance: Arc<VulkanInstance>,
}

impl VulkanBackend {
    /// Load Vulkan and create an instance able to present to `window`'s display
    ///
    /// # Arguments
    ///
    /// * `window` - Anything exposing a display handle (surface extensions are picked from it)
    /// * `enable_validation` - Enable VK_LAYER_KHRONOS_validation; ignored unless
    ///   the `vulkan-validation` feature is compiled in
    pub fn new<W: HasDisplayHandle + ?Sized>(window: &W, enable_validation: bool) -> Result<Self> {
        let validation = enable_validation && cfg!(feature = "vulkan-validation");
        if enable_validation && !validation {
            dbl_warn!(SOURCE, "Validation requested but the vulkan-validation feature is not compiled in");
        }

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to load Vulkan library: {:?}", e))?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"DiaBolic Application")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"DiaBolic")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get display handle: {}", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get required extensions: {}", e))?
                .to_vec();

            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create Vulkan instance: {:?}", e))?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let mut vulkan_instance = VulkanInstance {
                entry,
                instance,
                surface_loader,
                debug_messenger: None,
            };

            if validation {
                vulkan_instance.debug_messenger = Some(Self::create_debug_messenger(&vulkan_instance)?);
            }

            dbl_info!(SOURCE, "Vulkan instance created (validation: {})", validation);
            Ok(Self {
                instance: Arc::new(vulkan_instance),
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    unsafe fn create_debug_messenger(
        instance: &VulkanInstance,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        let debug_utils = ash::ext::debug_utils::Instance::new(&instance.entry, &instance.instance);
        crate::debug::init_debug_tracking();

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = debug_utils.create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create debug messenger: {:?}", e))?;
        Ok((debug_utils, messenger))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    unsafe fn create_debug_messenger(
        _instance: &VulkanInstance,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        Err(dbl_err!(SOURCE, InitializationFailed, "Validation support is not compiled in"))
    }

    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>> {
        unsafe {
            self.instance.instance.enumerate_physical_devices()
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to enumerate physical devices: {:?}", e))
        }
    }

    fn adapter_info(&self, index: usize, physical_device: vk::PhysicalDevice) -> AdapterInfo {
        let instance = &self.instance.instance;
        let (properties, memory) = unsafe {
            (
                instance.get_physical_device_properties(physical_device),
                instance.get_physical_device_memory_properties(physical_device),
            )
        };

        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| format!("Vulkan device {}", index));

        let kind = match properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => AdapterKind::Discrete,
            vk::PhysicalDeviceType::INTEGRATED_GPU => AdapterKind::Integrated,
            vk::PhysicalDeviceType::VIRTUAL_GPU => AdapterKind::Virtual,
            vk::PhysicalDeviceType::CPU => AdapterKind::Software,
            _ => AdapterKind::Other,
        };

        let dedicated_video_memory = memory.memory_heaps_as_slice()
            .iter()
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size)
            .sum();

        AdapterInfo {
            index,
            name,
            kind,
            dedicated_video_memory,
        }
    }

    /// Queue family able to do graphics and present to `surface`
    unsafe fn find_direct_family(
        &self,
        physical_device: vk::PhysicalDevice,
        families: &[vk::QueueFamilyProperties],
        surface: vk::SurfaceKHR,
    ) -> Result<u32> {
        (0..families.len() as u32)
            .find(|&i| {
                families[i as usize].queue_flags.contains(vk::QueueFlags::GRAPHICS)
                    && self.instance.surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
            })
            .ok_or_else(|| dbl_err!(SOURCE, InitializationFailed, "No graphics queue family can present to the window"))
    }

    /// Dedicated transfer family (no graphics bit), falling back to the direct family
    fn find_copy_family(families: &[vk::QueueFamilyProperties], direct_family: u32) -> u32 {
        families
            .iter()
            .enumerate()
            .find(|(_, family)| {
                family.queue_flags.contains(vk::QueueFlags::TRANSFER)
                    && !family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            })
            .map(|(i, _)| i as u32)
            .unwrap_or(direct_family)
    }

    unsafe fn check_device_extensions(&self, physical_device: vk::PhysicalDevice) -> Result<()> {
        let available = self.instance.instance
            .enumerate_device_extension_properties(physical_device)
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to enumerate device extensions: {:?}", e))?;

        for required in [ash::khr::swapchain::NAME, ash::khr::push_descriptor::NAME] {
            let found = available.iter().any(|ext| ext.extension_name_as_c_str().is_ok_and(|name| name == required));
            if !found {
                return Err(dbl_err!(SOURCE, InitializationFailed,
                    "Device extension {} not supported", required.to_string_lossy()));
            }
        }
        Ok(())
    }

    unsafe fn create_logical_device(
        &self,
        adapter: &AdapterInfo,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<GpuContext> {
        let instance = &self.instance.instance;
        self.check_device_extensions(physical_device)?;

        let families = instance.get_physical_device_queue_family_properties(physical_device);
        let direct_family = self.find_direct_family(physical_device, &families, surface)?;
        let copy_family = Self::find_copy_family(&families, direct_family);
        dbl_debug!(SOURCE, "Queue families on '{}': direct={} copy={}", adapter.name, direct_family, copy_family);

        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(direct_family)
                .queue_priorities(&queue_priorities),
        ];
        if copy_family != direct_family {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(copy_family)
                    .queue_priorities(&queue_priorities),
            );
        }

        let device_extension_names = [
            ash::khr::swapchain::NAME.as_ptr(),
            ash::khr::push_descriptor::NAME.as_ptr(),
        ];

        let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
            .timeline_semaphore(true);
        let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
            .dynamic_rendering(true)
            .synchronization2(true);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .push_next(&mut features12)
            .push_next(&mut features13);

        let device = instance.create_device(physical_device, &device_create_info, None)
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create logical device: {:?}", e))?;

        let direct_queue = device.get_device_queue(direct_family, 0);
        let copy_queue = device.get_device_queue(copy_family, 0);

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                device.destroy_device(None);
                return Err(dbl_err!(SOURCE, InitializationFailed, "Failed to create GPU allocator: {:?}", e));
            }
        };

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(direct_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let one_shot_pool = match device.create_command_pool(&pool_info, None) {
            Ok(pool) => pool,
            Err(e) => {
                drop(allocator);
                device.destroy_device(None);
                return Err(dbl_err!(SOURCE, InitializationFailed, "Failed to create one-shot command pool: {:?}", e));
            }
        };

        Ok(GpuContext::new(
            Arc::clone(&self.instance),
            physical_device,
            device,
            allocator,
            (direct_family, direct_queue),
            (copy_family, copy_queue),
            one_shot_pool,
        ))
    }
}

impl GraphicsBackend for VulkanBackend {
    fn name(&self) -> &str {
        "Vulkan"
    }

    fn enumerate_adapters(&self) -> Result<Vec<AdapterInfo>> {
        let adapters: Vec<AdapterInfo> = self.physical_devices()?
            .into_iter()
            .enumerate()
            .map(|(index, physical_device)| self.adapter_info(index, physical_device))
            .collect();

        for adapter in &adapters {
            dbl_debug!(SOURCE, "Adapter {}: '{}' ({:?}, {} MiB)",
                adapter.index, adapter.name, adapter.kind, adapter.dedicated_video_memory / (1024 * 1024));
        }
        Ok(adapters)
    }

    fn create_device(&self, adapter: &AdapterInfo, window: &dyn Window) -> Result<Arc<dyn GraphicsDevice>> {
        let physical_device = self.physical_devices()?
            .get(adapter.index)
            .copied()
            .ok_or_else(|| dbl_err!(SOURCE, InitializationFailed, "Adapter index {} not found", adapter.index))?;

        unsafe {
            let surface = self.instance.create_surface(window)?;
            let context = match self.create_logical_device(adapter, physical_device, surface) {
                Ok(context) => context,
                Err(e) => {
                    self.instance.surface_loader.destroy_surface(surface, None);
                    return Err(e);
                }
            };

            dbl_info!(SOURCE, "Logical device created on '{}'", adapter.name);
            Ok(Arc::new(VulkanGraphicsDevice::new(Arc::new(context), adapter.clone(), surface)))
        }
    }
}
