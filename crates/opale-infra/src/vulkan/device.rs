// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The Vulkan device.
//!
//! One graphics queue, one primary command buffer re-recorded every
//! frame. Pipelines are fully baked at creation with viewport, scissor
//! and line width left dynamic. Uniform buffers live in set 0 as
//! dynamic-offset descriptors, combined image samplers in set 1.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use ash::khr;
use ash::vk;
use ash::vk::Handle as _;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use opale_core::api::*;
use opale_core::device::{DeviceConfig, DiagnosticSink};
use opale_core::error::GraphicsError;
use opale_core::traits::{DeviceCaps, GraphicsDevice};

use super::convert;

/// Uniform buffer bindings in descriptor set 0.
const UNIFORM_SLOTS: usize = 8;
/// Combined image sampler bindings in descriptor set 1.
const SAMPLER_SLOTS: usize = 16;
/// Descriptor set pairs the pool can hand out per frame. Every bind
/// change gets a fresh pair; already-recorded draws must keep seeing
/// the sets they were recorded with, so sets are never written after
/// they are bound. The pool is reset at the frame fence.
const SET_PAIRS_PER_FRAME: u32 = 256;

const TOPOLOGIES: [PrimitiveType; 3] = [
    PrimitiveType::Triangles,
    PrimitiveType::Points,
    PrimitiveType::Lines,
];

struct BufferBacking {
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: *mut u8,
    size: u32,
}

// SAFETY: the mapping is only written under the backing table lock.
unsafe impl Send for BufferBacking {}

#[derive(Clone, Copy)]
struct ImageBacking {
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: Option<vk::ImageView>,
    sampler: Option<vk::Sampler>,
    aspect: vk::ImageAspectFlags,
    format: vk::Format,
    levels: u32,
    layers: u32,
}

struct TargetBacking {
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
}

/// Native objects that may still be referenced by the in-flight command
/// buffer; destroyed at the next frame boundary.
enum Retired {
    Buffer(vk::Buffer, vk::DeviceMemory),
    Image(vk::Image, vk::DeviceMemory, Option<vk::ImageView>, Option<vk::Sampler>),
    Sampler(vk::Sampler),
    Pipelines([vk::Pipeline; 3]),
    ShaderModule(vk::ShaderModule),
    Target(vk::RenderPass, vk::Framebuffer),
}

/// A uniform slot as last handed to `bind_uniform_buffer`; the bind
/// offset lives in `Frame::dynamic_offsets`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct UniformBind {
    buffer: vk::Buffer,
    range: vk::DeviceSize,
}

/// Per-frame recording state.
struct Frame {
    recording: bool,
    in_pass: bool,
    /// Client id of the bound render target, 0 for the swapchain.
    target: u64,
    acquired: Option<u32>,
    pipeline: u64,
    topology: PrimitiveType,
    sets_dirty: bool,
    uniform_binds: [Option<UniformBind>; UNIFORM_SLOTS],
    sampler_binds: [Option<vk::DescriptorImageInfo>; SAMPLER_SLOTS],
    dynamic_offsets: [u32; UNIFORM_SLOTS],
    index: Option<(vk::Buffer, vk::IndexType)>,
    viewport: vk::Viewport,
    scissor: vk::Rect2D,
    line_width: f32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            recording: false,
            in_pass: false,
            target: 0,
            acquired: None,
            pipeline: 0,
            topology: PrimitiveType::Triangles,
            sets_dirty: false,
            uniform_binds: [None; UNIFORM_SLOTS],
            sampler_binds: [None; SAMPLER_SLOTS],
            dynamic_offsets: [0; UNIFORM_SLOTS],
            index: None,
            viewport: vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
                min_depth: 0.0,
                max_depth: 1.0,
            },
            scissor: vk::Rect2D::default(),
            line_width: 1.0,
        }
    }
}

/// A device over a Vulkan 1.1 context.
pub struct VulkanDevice {
    _entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: khr::surface::Instance,
    surface: vk::SurfaceKHR,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    device: ash::Device,
    queue: vk::Queue,
    swapchain_loader: khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    swap_views: Vec<vk::ImageView>,
    swap_framebuffers: Vec<vk::Framebuffer>,
    swap_extent: vk::Extent2D,
    /// Single-color-attachment pass, used for the swapchain framebuffers
    /// and as the compatibility pass pipelines are baked against.
    render_pass: vk::RenderPass,
    set_layouts: [vk::DescriptorSetLayout; 2],
    pipeline_layout: vk::PipelineLayout,
    descriptor_pool: vk::DescriptorPool,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    submit_fence: vk::Fence,
    caps: DeviceCaps,
    id: DeviceId,
    diagnostics: Option<DiagnosticSink>,
    next_client_id: AtomicU64,
    frame: Mutex<Frame>,
    buffers: Mutex<HashMap<u64, BufferBacking>>,
    images: Mutex<HashMap<u64, ImageBacking>>,
    pipelines: Mutex<HashMap<u64, [vk::Pipeline; 3]>>,
    targets: Mutex<HashMap<u64, TargetBacking>>,
    retired: Mutex<Vec<Retired>>,
}

// SAFETY: every interior table is behind a mutex; the Vulkan handles
// themselves are plain integers.
unsafe impl Sync for VulkanDevice {}

impl std::fmt::Debug for VulkanDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanDevice")
            .field("id", &self.id)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

fn unavailable(what: &str, err: vk::Result) -> GraphicsError {
    GraphicsError::BackendUnavailable(format!("{}: {}", what, err))
}

/// Layout an attachment image sits in between passes. Transitioning a
/// resolve source away from this layout with `UNDEFINED` as the old
/// layout would let the driver discard its contents.
fn attachment_layout(aspect: vk::ImageAspectFlags) -> vk::ImageLayout {
    if aspect.contains(vk::ImageAspectFlags::DEPTH) {
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    } else {
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    }
}

/// Index into the baked pipeline array for a primitive topology.
fn topology_variant(primitive: PrimitiveType) -> usize {
    TOPOLOGIES.iter().position(|t| *t == primitive).unwrap_or(0)
}

/// Flattens the occupied uniform slots into per-binding buffer infos
/// for a freshly allocated set. Empty slots get no write and stay
/// undefined, which is fine as long as no pipeline reads them.
fn uniform_buffer_infos(
    binds: &[Option<UniformBind>; UNIFORM_SLOTS],
) -> Vec<(u32, vk::DescriptorBufferInfo)> {
    binds
        .iter()
        .enumerate()
        .filter_map(|(slot, bind)| {
            bind.map(|bind| {
                (
                    slot as u32,
                    vk::DescriptorBufferInfo {
                        buffer: bind.buffer,
                        offset: 0,
                        range: bind.range,
                    },
                )
            })
        })
        .collect()
}

/// Sampler counterpart of `uniform_buffer_infos`.
fn sampler_image_infos(
    binds: &[Option<vk::DescriptorImageInfo>; SAMPLER_SLOTS],
) -> Vec<(u32, vk::DescriptorImageInfo)> {
    binds
        .iter()
        .enumerate()
        .filter_map(|(slot, info)| info.map(|info| (slot as u32, info)))
        .collect()
}

impl VulkanDevice {
    /// Builds a device rendering to the window behind the given raw
    /// handles.
    ///
    /// ## Errors
    /// * `GraphicsError::BackendUnavailable` - If no suitable adapter,
    ///   queue family or swapchain could be brought up.
    pub fn new(
        config: &DeviceConfig,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self, GraphicsError> {
        let entry = unsafe { ash::Entry::load() }.map_err(|err| {
            GraphicsError::BackendUnavailable(format!("loading libvulkan: {}", err))
        })?;

        let app_info = vk::ApplicationInfo::default().api_version(vk::API_VERSION_1_1);
        let extensions = ash_window::enumerate_required_extensions(display)
            .map_err(|err| unavailable("surface extensions", err))?;
        let instance_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(extensions);
        let instance = unsafe { entry.create_instance(&instance_info, None) }
            .map_err(|err| unavailable("creating instance", err))?;

        let surface_loader = khr::surface::Instance::new(&entry, &instance);
        let surface =
            unsafe { ash_window::create_surface(&entry, &instance, display, window, None) }
                .map_err(|err| unavailable("creating surface", err))?;

        let (physical, queue_family) =
            Self::pick_adapter(&instance, &surface_loader, surface)?;
        let properties = unsafe { instance.get_physical_device_properties(physical) };
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical) };

        let priorities = [1.0f32];
        let queue_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family)
            .queue_priorities(&priorities);
        let device_extensions = [khr::swapchain::NAME.as_ptr()];
        let queue_infos = [queue_info];
        let device_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&device_extensions);
        let device = unsafe { instance.create_device(physical, &device_info, None) }
            .map_err(|err| unavailable("creating device", err))?;
        let queue = unsafe { device.get_device_queue(queue_family, 0) };

        let render_pass = Self::create_render_pass(&device)?;

        let swapchain_loader = khr::swapchain::Device::new(&instance, &device);
        let surface_caps = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical, surface)
        }
        .map_err(|err| unavailable("querying surface", err))?;
        let swap_extent = surface_caps.current_extent;
        let swapchain_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(surface_caps.min_image_count.max(2))
            .image_format(vk::Format::B8G8R8A8_UNORM)
            .image_color_space(vk::ColorSpaceKHR::SRGB_NONLINEAR)
            .image_extent(swap_extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true);
        let swapchain = unsafe { swapchain_loader.create_swapchain(&swapchain_info, None) }
            .map_err(|err| unavailable("creating swapchain", err))?;
        let swap_images = unsafe { swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|err| unavailable("querying swapchain images", err))?;

        let mut swap_views = Vec::with_capacity(swap_images.len());
        let mut swap_framebuffers = Vec::with_capacity(swap_images.len());
        for image in &swap_images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(*image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk::Format::B8G8R8A8_UNORM)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe { device.create_image_view(&view_info, None) }
                .map_err(|err| unavailable("creating swapchain view", err))?;
            let attachments = [view];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(swap_extent.width)
                .height(swap_extent.height)
                .layers(1);
            let framebuffer = unsafe { device.create_framebuffer(&framebuffer_info, None) }
                .map_err(|err| unavailable("creating swapchain framebuffer", err))?;
            swap_views.push(view);
            swap_framebuffers.push(framebuffer);
        }

        let (set_layouts, pipeline_layout, descriptor_pool) =
            Self::create_descriptor_scheme(&device)?;

        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family);
        let command_pool = unsafe { device.create_command_pool(&pool_info, None) }
            .map_err(|err| unavailable("creating command pool", err))?;
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = unsafe { device.allocate_command_buffers(&allocate_info) }
            .map_err(|err| unavailable("allocating command buffer", err))?[0];

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let image_available = unsafe { device.create_semaphore(&semaphore_info, None) }
            .map_err(|err| unavailable("creating semaphore", err))?;
        let render_finished = unsafe { device.create_semaphore(&semaphore_info, None) }
            .map_err(|err| unavailable("creating semaphore", err))?;
        let fence_info = vk::FenceCreateInfo::default();
        let submit_fence = unsafe { device.create_fence(&fence_info, None) }
            .map_err(|err| unavailable("creating fence", err))?;

        let limits = properties.limits;
        let caps = DeviceCaps {
            uniform_buffer_alignment: (limits.min_uniform_buffer_offset_alignment as u32).max(1),
            max_samplers: limits
                .max_per_stage_descriptor_samplers
                .min(SAMPLER_SLOTS as u32)
                .max(1),
            max_msaa_samples: Self::highest_sample_count(limits.framebuffer_color_sample_counts),
        };
        log::info!(
            "vulkan device ready (uniform alignment {}, {} sampler slots, {}x msaa)",
            caps.uniform_buffer_alignment,
            caps.max_samplers,
            caps.max_msaa_samples
        );

        Ok(Self {
            _entry: entry,
            instance,
            surface_loader,
            surface,
            memory_properties,
            device,
            queue,
            swapchain_loader,
            swapchain,
            swap_views,
            swap_framebuffers,
            swap_extent,
            render_pass,
            set_layouts,
            pipeline_layout,
            descriptor_pool,
            command_pool,
            command_buffer,
            image_available,
            render_finished,
            submit_fence,
            caps,
            id: crate::next_device_id(),
            diagnostics: config.diagnostics.clone(),
            next_client_id: AtomicU64::new(1),
            frame: Mutex::new(Frame::default()),
            buffers: Mutex::new(HashMap::new()),
            images: Mutex::new(HashMap::new()),
            pipelines: Mutex::new(HashMap::new()),
            targets: Mutex::new(HashMap::new()),
            retired: Mutex::new(Vec::new()),
        })
    }

    fn pick_adapter(
        instance: &ash::Instance,
        surface_loader: &khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, u32), GraphicsError> {
        let adapters = unsafe { instance.enumerate_physical_devices() }
            .map_err(|err| unavailable("enumerating adapters", err))?;
        let mut fallback = None;
        for adapter in adapters {
            let properties = unsafe { instance.get_physical_device_properties(adapter) };
            let families =
                unsafe { instance.get_physical_device_queue_family_properties(adapter) };
            let family = families.iter().enumerate().find_map(|(index, family)| {
                let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
                let present = unsafe {
                    surface_loader
                        .get_physical_device_surface_support(adapter, index as u32, surface)
                        .unwrap_or(false)
                };
                (graphics && present).then_some(index as u32)
            });
            let Some(family) = family else { continue };
            if properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
                return Ok((adapter, family));
            }
            fallback.get_or_insert((adapter, family));
        }
        fallback.ok_or_else(|| {
            GraphicsError::BackendUnavailable("no adapter with a graphics+present queue".into())
        })
    }

    fn create_render_pass(device: &ash::Device) -> Result<vk::RenderPass, GraphicsError> {
        let attachment = vk::AttachmentDescription::default()
            .format(vk::Format::B8G8R8A8_UNORM)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::LOAD)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);
        let reference = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let references = [reference];
        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&references);
        let attachments = [attachment];
        let subpasses = [subpass];
        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses);
        unsafe { device.create_render_pass(&info, None) }
            .map_err(|err| unavailable("creating render pass", err))
    }

    #[allow(clippy::type_complexity)]
    fn create_descriptor_scheme(
        device: &ash::Device,
    ) -> Result<
        (
            [vk::DescriptorSetLayout; 2],
            vk::PipelineLayout,
            vk::DescriptorPool,
        ),
        GraphicsError,
    > {
        let uniform_bindings: Vec<vk::DescriptorSetLayoutBinding> = (0..UNIFORM_SLOTS)
            .map(|slot| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(slot as u32)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::ALL_GRAPHICS)
            })
            .collect();
        let sampler_bindings: Vec<vk::DescriptorSetLayoutBinding> = (0..SAMPLER_SLOTS)
            .map(|slot| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(slot as u32)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT)
            })
            .collect();

        let uniform_layout_info =
            vk::DescriptorSetLayoutCreateInfo::default().bindings(&uniform_bindings);
        let uniform_layout = unsafe { device.create_descriptor_set_layout(&uniform_layout_info, None) }
            .map_err(|err| unavailable("creating uniform set layout", err))?;
        let sampler_layout_info =
            vk::DescriptorSetLayoutCreateInfo::default().bindings(&sampler_bindings);
        let sampler_layout = unsafe { device.create_descriptor_set_layout(&sampler_layout_info, None) }
            .map_err(|err| unavailable("creating sampler set layout", err))?;
        let set_layouts = [uniform_layout, sampler_layout];

        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        let pipeline_layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
            .map_err(|err| unavailable("creating pipeline layout", err))?;

        let sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
                descriptor_count: UNIFORM_SLOTS as u32 * SET_PAIRS_PER_FRAME,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: SAMPLER_SLOTS as u32 * SET_PAIRS_PER_FRAME,
            },
        ];
        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(2 * SET_PAIRS_PER_FRAME)
            .pool_sizes(&sizes);
        let descriptor_pool = unsafe { device.create_descriptor_pool(&pool_info, None) }
            .map_err(|err| unavailable("creating descriptor pool", err))?;
        Ok((set_layouts, pipeline_layout, descriptor_pool))
    }

    fn highest_sample_count(flags: vk::SampleCountFlags) -> u32 {
        for (flag, count) in [
            (vk::SampleCountFlags::TYPE_16, 16),
            (vk::SampleCountFlags::TYPE_8, 8),
            (vk::SampleCountFlags::TYPE_4, 4),
            (vk::SampleCountFlags::TYPE_2, 2),
        ] {
            if flags.contains(flag) {
                return count;
            }
        }
        1
    }

    fn report(&self, message: &str) {
        match &self.diagnostics {
            Some(sink) => sink(message),
            None => log::error!("vulkan: {}", message),
        }
    }

    fn alloc_client_id(&self) -> u64 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    fn frame(&self) -> MutexGuard<'_, Frame> {
        match self.frame.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn memory_type(
        &self,
        requirements: vk::MemoryRequirements,
        required: vk::MemoryPropertyFlags,
        preferred: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        let types =
            &self.memory_properties.memory_types[..self.memory_properties.memory_type_count as usize];
        let fits = |index: usize, flags: vk::MemoryPropertyFlags| {
            requirements.memory_type_bits & (1 << index) != 0
                && types[index].property_flags.contains(flags)
        };
        (0..types.len())
            .find(|&index| fits(index, required | preferred))
            .or_else(|| (0..types.len()).find(|&index| fits(index, required)))
            .map(|index| index as u32)
    }

    fn ensure_recording(&self, frame: &mut Frame) {
        if frame.recording {
            return;
        }
        let begin = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        if let Err(err) = unsafe { self.device.begin_command_buffer(self.command_buffer, &begin) } {
            self.report(&format!("beginning command buffer: {}", err));
            return;
        }
        frame.recording = true;
    }

    fn end_pass(&self, frame: &mut Frame) {
        if frame.in_pass {
            unsafe { self.device.cmd_end_render_pass(self.command_buffer) };
            frame.in_pass = false;
        }
    }

    /// Begins the render pass for the bound target, acquiring a
    /// swapchain image first when the default target is bound.
    fn ensure_pass(&self, frame: &mut Frame) {
        self.ensure_recording(frame);
        if frame.in_pass || !frame.recording {
            return;
        }

        let (render_pass, framebuffer, extent) = if frame.target == 0 {
            if frame.acquired.is_none() {
                match unsafe {
                    self.swapchain_loader.acquire_next_image(
                        self.swapchain,
                        u64::MAX,
                        self.image_available,
                        vk::Fence::null(),
                    )
                } {
                    Ok((index, _)) => frame.acquired = Some(index),
                    Err(err) => {
                        self.report(&format!("acquiring swapchain image: {}", err));
                        return;
                    }
                }
            }
            let index = frame.acquired.unwrap_or(0) as usize;
            (self.render_pass, self.swap_framebuffers[index], self.swap_extent)
        } else {
            let targets = self.lock(&self.targets);
            let Some(backing) = targets.get(&frame.target) else {
                self.report("draw with an unrealized render target");
                return;
            };
            (
                backing.render_pass,
                backing.framebuffer,
                vk::Extent2D {
                    width: backing.width,
                    height: backing.height,
                },
            )
        };

        let begin = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            });
        unsafe {
            self.device
                .cmd_begin_render_pass(self.command_buffer, &begin, vk::SubpassContents::INLINE);
            self.device
                .cmd_set_viewport(self.command_buffer, 0, &[frame.viewport]);
            self.device
                .cmd_set_scissor(self.command_buffer, 0, &[frame.scissor]);
            self.device
                .cmd_set_line_width(self.command_buffer, frame.line_width);
        }
        frame.in_pass = true;
    }

    /// Materializes the shadow bind tables into a fresh descriptor set
    /// pair and binds it, if any bind changed since the last draw. A
    /// set already referenced by recorded draws is never written again;
    /// the pool is reset wholesale once the frame fence has signaled.
    fn flush_binds(&self, frame: &mut Frame) {
        if !frame.sets_dirty {
            return;
        }
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&self.set_layouts);
        let sets = match unsafe { self.device.allocate_descriptor_sets(&allocate_info) } {
            Ok(sets) => sets,
            Err(err) => {
                self.report(&format!("allocating descriptor sets: {}", err));
                return;
            }
        };
        let buffer_infos = uniform_buffer_infos(&frame.uniform_binds);
        let image_infos = sampler_image_infos(&frame.sampler_binds);
        let mut writes = Vec::with_capacity(buffer_infos.len() + image_infos.len());
        for (slot, info) in &buffer_infos {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(sets[0])
                    .dst_binding(*slot)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
                    .buffer_info(std::slice::from_ref(info)),
            );
        }
        for (slot, info) in &image_infos {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(sets[1])
                    .dst_binding(*slot)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(std::slice::from_ref(info)),
            );
        }
        unsafe {
            if !writes.is_empty() {
                self.device.update_descriptor_sets(&writes, &[]);
            }
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout,
                0,
                &sets,
                &frame.dynamic_offsets,
            );
        }
        frame.sets_dirty = false;
    }

    fn select_pipeline(&self, frame: &mut Frame, primitive: PrimitiveType) {
        if frame.pipeline == 0 || (frame.topology == primitive && frame.in_pass) {
            frame.topology = primitive;
            return;
        }
        let variant = topology_variant(primitive);
        let pipelines = self.lock(&self.pipelines);
        if let Some(baked) = pipelines.get(&frame.pipeline) {
            unsafe {
                self.device.cmd_bind_pipeline(
                    self.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    baked[variant],
                );
            }
        }
        frame.topology = primitive;
    }

    fn prepare_draw(&self, frame: &mut Frame, primitive: PrimitiveType) {
        self.ensure_pass(frame);
        if !frame.in_pass {
            return;
        }
        self.select_pipeline(frame, primitive);
        self.flush_binds(frame);
    }

    fn texture_view(&self, backing: &mut ImageBacking) -> Result<vk::ImageView, vk::Result> {
        if let Some(view) = backing.view {
            return Ok(view);
        }
        let kind = if backing.layers > 1 {
            vk::ImageViewType::TYPE_2D_ARRAY
        } else {
            vk::ImageViewType::TYPE_2D
        };
        let info = vk::ImageViewCreateInfo::default()
            .image(backing.image)
            .view_type(kind)
            .format(backing.format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: backing.aspect,
                base_mip_level: 0,
                level_count: backing.levels,
                base_array_layer: 0,
                layer_count: backing.layers,
            });
        let view = unsafe { self.device.create_image_view(&info, None) }?;
        backing.view = Some(view);
        Ok(view)
    }

    fn texture_sampler(
        &self,
        backing: &mut ImageBacking,
        texture: &Texture,
    ) -> Result<vk::Sampler, vk::Result> {
        if let Some(sampler) = backing.sampler {
            return Ok(sampler);
        }
        let info = vk::SamplerCreateInfo::default()
            .min_filter(convert::filter(texture.min_filtering))
            .mag_filter(convert::filter(texture.mag_filtering))
            .mipmap_mode(convert::mipmap_mode(texture.mip_filtering))
            .address_mode_u(convert::address_mode(texture.addressing_u))
            .address_mode_v(convert::address_mode(texture.addressing_v))
            .address_mode_w(convert::address_mode(texture.addressing_w))
            .anisotropy_enable(texture.anisotropy > 1)
            .max_anisotropy(texture.anisotropy.max(1) as f32)
            .min_lod(texture.base_level as f32)
            .max_lod(texture.max_level as f32);
        let sampler = unsafe { self.device.create_sampler(&info, None) }?;
        backing.sampler = Some(sampler);
        Ok(sampler)
    }

    /// Drops the target's realized framebuffer; rebuilt from the record
    /// at the next bind.
    fn invalidate_target(&self, target: &RenderTarget) {
        let id = target.handle.id();
        if let Some(backing) = self.lock(&self.targets).remove(&id) {
            self.lock(&self.retired)
                .push(Retired::Target(backing.render_pass, backing.framebuffer));
        }
    }

    /// Builds the render pass and framebuffer matching the target's
    /// current attachments.
    fn realize_target(&self, target: &RenderTarget) -> Result<(), vk::Result> {
        let id = target.handle.id();
        if self.lock(&self.targets).contains_key(&id) {
            return Ok(());
        }

        let mut descriptions = Vec::new();
        let mut references = Vec::new();
        let mut views = Vec::new();
        let mut width = 0;
        let mut height = 0;
        let mut images = self.lock(&self.images);
        for slot in target.colors.iter().flatten() {
            let Some(backing) = images.get_mut(&slot.texture.id()) else {
                continue;
            };
            let view = self.texture_view(backing)?;
            references.push(vk::AttachmentReference {
                attachment: descriptions.len() as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            });
            descriptions.push(
                vk::AttachmentDescription::default()
                    .format(convert::format(slot.format))
                    .samples(convert::samples(slot.samples))
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    ,
            );
            views.push(view);
            width = slot.width;
            height = slot.height;
        }
        let mut depth_reference = None;
        if let Some(slot) = &target.depth_stencil {
            if let Some(backing) = images.get_mut(&slot.texture.id()) {
                let view = self.texture_view(backing)?;
                depth_reference = Some(vk::AttachmentReference {
                    attachment: descriptions.len() as u32,
                    layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                });
                descriptions.push(
                    vk::AttachmentDescription::default()
                        .format(convert::format(slot.format))
                        .samples(convert::samples(slot.samples))
                        .load_op(vk::AttachmentLoadOp::LOAD)
                        .store_op(vk::AttachmentStoreOp::STORE)
                        .stencil_load_op(vk::AttachmentLoadOp::LOAD)
                        .stencil_store_op(vk::AttachmentStoreOp::STORE)
                        .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                        .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                        ,
                );
                views.push(view);
                if width == 0 {
                    width = slot.width;
                    height = slot.height;
                }
            }
        }
        drop(images);
        if views.is_empty() || width == 0 {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&references);
        if let Some(reference) = &depth_reference {
            subpass = subpass.depth_stencil_attachment(reference);
        }
        let subpasses = [subpass];
        let pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&descriptions)
            .subpasses(&subpasses);
        let render_pass = unsafe { self.device.create_render_pass(&pass_info, None) }?;

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&views)
            .width(width)
            .height(height)
            .layers(1);
        let framebuffer = match unsafe { self.device.create_framebuffer(&framebuffer_info, None) } {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                unsafe { self.device.destroy_render_pass(render_pass, None) };
                return Err(err);
            }
        };
        self.lock(&self.targets).insert(
            id,
            TargetBacking {
                render_pass,
                framebuffer,
                width,
                height,
            },
        );
        Ok(())
    }

    fn barrier(
        &self,
        image: vk::Image,
        aspect: vk::ImageAspectFlags,
        level: u32,
        from: vk::ImageLayout,
        to: vk::ImageLayout,
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
            .old_layout(from)
            .new_layout(to)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: level,
                level_count: 1,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            });
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }

    fn destroy_retired(&self, retired: Vec<Retired>) {
        for entry in retired {
            unsafe {
                match entry {
                    Retired::Buffer(buffer, memory) => {
                        self.device.destroy_buffer(buffer, None);
                        self.device.free_memory(memory, None);
                    }
                    Retired::Image(image, memory, view, sampler) => {
                        if let Some(sampler) = sampler {
                            self.device.destroy_sampler(sampler, None);
                        }
                        if let Some(view) = view {
                            self.device.destroy_image_view(view, None);
                        }
                        self.device.destroy_image(image, None);
                        self.device.free_memory(memory, None);
                    }
                    Retired::Sampler(sampler) => self.device.destroy_sampler(sampler, None),
                    Retired::Pipelines(pipelines) => {
                        for pipeline in pipelines {
                            self.device.destroy_pipeline(pipeline, None);
                        }
                    }
                    Retired::ShaderModule(module) => {
                        self.device.destroy_shader_module(module, None)
                    }
                    Retired::Target(render_pass, framebuffer) => {
                        self.device.destroy_framebuffer(framebuffer, None);
                        self.device.destroy_render_pass(render_pass, None);
                    }
                }
            }
        }
    }

    fn bake_pipelines(
        &self,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<[vk::Pipeline; 3], GraphicsError> {
        let entry = std::ffi::CString::new("main").map_err(|_| {
            GraphicsError::ResourceCreation("pipeline entry point name".into())
        })?;
        let mut stages = Vec::new();
        let mut push_stage = |stage: vk::ShaderStageFlags, handle: Handle| {
            if let Handle::Id(raw) = handle {
                stages.push(
                    vk::PipelineShaderStageCreateInfo::default()
                        .stage(stage)
                        .module(vk::ShaderModule::from_raw(raw))
                        .name(&entry)
                        ,
                );
            }
        };
        push_stage(vk::ShaderStageFlags::VERTEX, desc.program.vertex);
        push_stage(vk::ShaderStageFlags::FRAGMENT, desc.program.fragment);
        push_stage(vk::ShaderStageFlags::GEOMETRY, desc.program.geometry);

        let mut bindings = Vec::new();
        let mut attributes = Vec::new();
        for (slot, entry) in desc
            .layout
            .entries
            .iter()
            .take(desc.layout.count as usize)
            .enumerate()
        {
            if entry.attribute == AttributeType::Disabled {
                continue;
            }
            bindings.push(vk::VertexInputBindingDescription {
                binding: slot as u32,
                stride: entry.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            });
            attributes.push(vk::VertexInputAttributeDescription {
                location: slot as u32,
                binding: slot as u32,
                format: convert::attribute_format(entry.attribute),
                offset: entry.offset,
            });
        }
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let raster_desc = &desc.rasterizer.desc;
        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(convert::fill_mode(raster_desc.fill_mode))
            .cull_mode(convert::cull_mode(raster_desc.cull_mode))
            .front_face(convert::front_face(raster_desc.front_face))
            .line_width(1.0);

        let ds_desc = &desc.depth_stencil.desc;
        let stencil_op = vk::StencilOpState {
            fail_op: convert::stencil_operation(ds_desc.stencil_fail),
            pass_op: convert::stencil_operation(ds_desc.stencil_pass),
            depth_fail_op: convert::stencil_operation(ds_desc.stencil_zfail),
            compare_op: convert::compare(ds_desc.stencil_compare),
            compare_mask: ds_desc.stencil_compare_mask,
            write_mask: ds_desc.stencil_write_mask,
            reference: ds_desc.stencil_reference,
        };
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(ds_desc.depth_test)
            .depth_write_enable(ds_desc.depth_write)
            .depth_compare_op(convert::compare(ds_desc.depth_compare))
            .stencil_test_enable(ds_desc.stencil_enabled)
            .front(stencil_op)
            .back(stencil_op);

        let blend_desc = &desc.blend.desc;
        let blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(blend_desc.enabled)
            .src_color_blend_factor(convert::blend_function(blend_desc.src_color))
            .dst_color_blend_factor(convert::blend_function(blend_desc.dst_color))
            .color_blend_op(convert::blend_equation(blend_desc.color_equation))
            .src_alpha_blend_factor(convert::blend_function(blend_desc.src_alpha))
            .dst_alpha_blend_factor(convert::blend_function(blend_desc.dst_alpha))
            .alpha_blend_op(convert::blend_equation(blend_desc.alpha_equation))
            .color_write_mask(vk::ColorComponentFlags::RGBA);
        let blend_attachments = [blend_attachment];
        let blend = vk::PipelineColorBlendStateCreateInfo::default()
            .attachments(&blend_attachments);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);
        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let dynamic_states = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::LINE_WIDTH,
        ];
        let dynamic = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let mut infos = Vec::with_capacity(TOPOLOGIES.len());
        let assemblies: Vec<_> = TOPOLOGIES
            .iter()
            .map(|primitive| {
                vk::PipelineInputAssemblyStateCreateInfo::default()
                    .topology(convert::topology(*primitive))
            })
            .collect();
        for assembly in &assemblies {
            infos.push(
                vk::GraphicsPipelineCreateInfo::default()
                    .stages(&stages)
                    .vertex_input_state(&vertex_input)
                    .input_assembly_state(assembly)
                    .viewport_state(&viewport_state)
                    .rasterization_state(&rasterization)
                    .multisample_state(&multisample)
                    .depth_stencil_state(&depth_stencil)
                    .color_blend_state(&blend)
                    .dynamic_state(&dynamic)
                    .layout(self.pipeline_layout)
                    .render_pass(self.render_pass)
                    .subpass(0)
                    ,
            );
        }
        let pipelines = unsafe {
            self.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &infos, None)
        }
        .map_err(|(_, err)| {
            GraphicsError::ResourceCreation(format!("graphics pipeline: {}", err))
        })?;
        Ok([pipelines[0], pipelines[1], pipelines[2]])
    }
}

impl GraphicsDevice for VulkanDevice {
    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    /// Ends the frame: submits the recorded work, presents if a
    /// swapchain image was drawn to, and destroys retired objects.
    fn tick(&self) {
        let mut frame = self.frame();
        if frame.recording {
            self.end_pass(&mut frame);
            let submitted = unsafe {
                self.device.end_command_buffer(self.command_buffer).and_then(|_| {
                    let buffers = [self.command_buffer];
                    let waits = [self.image_available];
                    let stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
                    let signals = [self.render_finished];
                    let mut submit = vk::SubmitInfo::default().command_buffers(&buffers);
                    if frame.acquired.is_some() {
                        submit = submit
                            .wait_semaphores(&waits)
                            .wait_dst_stage_mask(&stages)
                            .signal_semaphores(&signals);
                    }
                    self.device
                        .queue_submit(self.queue, &[submit], self.submit_fence)
                })
            };
            match submitted {
                Ok(()) => {
                    if let Some(index) = frame.acquired {
                        let swapchains = [self.swapchain];
                        let indices = [index];
                        let semaphores = [self.render_finished];
                        let present = vk::PresentInfoKHR::default()
                            .wait_semaphores(&semaphores)
                            .swapchains(&swapchains)
                            .image_indices(&indices);
                        if let Err(err) =
                            unsafe { self.swapchain_loader.queue_present(self.queue, &present) }
                        {
                            self.report(&format!("presenting: {}", err));
                        }
                    }
                    let wait = unsafe {
                        self.device
                            .wait_for_fences(&[self.submit_fence], true, u64::MAX)
                            .and_then(|_| self.device.reset_fences(&[self.submit_fence]))
                    };
                    if let Err(err) = wait {
                        self.report(&format!("waiting for frame fence: {}", err));
                    }
                }
                Err(err) => self.report(&format!("submitting frame: {}", err)),
            }
            // The fence wait above retired every set handed out this
            // frame; reclaim them all and rebuild from the shadow
            // tables at the next draw.
            if let Err(err) = unsafe {
                self.device
                    .reset_descriptor_pool(self.descriptor_pool, vk::DescriptorPoolResetFlags::empty())
            } {
                self.report(&format!("resetting descriptor pool: {}", err));
            }
            frame.recording = false;
            frame.acquired = None;
            frame.pipeline = 0;
            frame.sets_dirty = true;
        }
        drop(frame);

        let retired = std::mem::take(&mut *self.lock(&self.retired));
        self.destroy_retired(retired);
    }

    fn clear_color(&self, target: Option<&RenderTarget>, attachment: Attachment, color: [f32; 4]) {
        let mut frame = self.frame();
        let wanted = target.map(|t| t.handle.id()).unwrap_or(0);
        if frame.target != wanted {
            self.end_pass(&mut frame);
            frame.target = wanted;
        }
        if let Some(target) = target {
            if let Err(err) = self.realize_target(target) {
                self.report(&format!("realizing render target: {}", err));
                return;
            }
        }
        self.ensure_pass(&mut frame);
        if !frame.in_pass {
            return;
        }
        let index = match (target, attachment) {
            (Some(_), Attachment::Color(index)) => index as u32,
            _ => 0,
        };
        let clear = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            color_attachment: index,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            },
        };
        let rect = vk::ClearRect {
            rect: frame.scissor_or_full(self, target),
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.device
                .cmd_clear_attachments(self.command_buffer, &[clear], &[rect]);
        }
    }

    fn clear_depth_stencil(&self, target: Option<&RenderTarget>, depth: f32, stencil: u8) {
        let mut frame = self.frame();
        let wanted = target.map(|t| t.handle.id()).unwrap_or(0);
        if frame.target != wanted {
            self.end_pass(&mut frame);
            frame.target = wanted;
        }
        if let Some(target) = target {
            if let Err(err) = self.realize_target(target) {
                self.report(&format!("realizing render target: {}", err));
                return;
            }
        }
        self.ensure_pass(&mut frame);
        if !frame.in_pass {
            return;
        }
        let clear = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            color_attachment: 0,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth,
                    stencil: stencil as u32,
                },
            },
        };
        let rect = vk::ClearRect {
            rect: frame.scissor_or_full(self, target),
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.device
                .cmd_clear_attachments(self.command_buffer, &[clear], &[rect]);
        }
    }

    fn draw(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        let mut frame = self.frame();
        self.prepare_draw(&mut frame, primitive);
        if frame.in_pass {
            unsafe { self.device.cmd_draw(self.command_buffer, count, 1, offset, 0) };
        }
    }

    fn draw_instanced(&self, primitive: PrimitiveType, count: u32, offset: u32, instances: u32) {
        let mut frame = self.frame();
        self.prepare_draw(&mut frame, primitive);
        if frame.in_pass {
            unsafe {
                self.device
                    .cmd_draw(self.command_buffer, count, instances, offset, 0)
            };
        }
    }

    fn draw_indexed(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        let mut frame = self.frame();
        self.prepare_draw(&mut frame, primitive);
        if frame.in_pass {
            unsafe {
                self.device
                    .cmd_draw_indexed(self.command_buffer, count, 1, offset, 0, 0)
            };
        }
    }

    fn draw_indexed_instanced(
        &self,
        primitive: PrimitiveType,
        count: u32,
        offset: u32,
        instances: u32,
    ) {
        let mut frame = self.frame();
        self.prepare_draw(&mut frame, primitive);
        if frame.in_pass {
            unsafe {
                self.device
                    .cmd_draw_indexed(self.command_buffer, count, instances, offset, 0, 0)
            };
        }
    }

    fn create_blend_state(
        &self,
        state: &mut BlendState,
        desc: &BlendStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.id;
        state.handle = Handle::Id(self.alloc_client_id());
        state.desc = *desc;
        Ok(())
    }

    fn delete_blend_state(&self, state: &mut BlendState) {
        state.handle.take();
    }

    fn create_depth_stencil_state(
        &self,
        state: &mut DepthStencilState,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.id;
        state.handle = Handle::Id(self.alloc_client_id());
        state.desc = *desc;
        Ok(())
    }

    fn delete_depth_stencil_state(&self, state: &mut DepthStencilState) {
        state.handle.take();
    }

    fn create_rasterizer_state(
        &self,
        state: &mut RasterizerState,
        desc: &RasterizerStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.id;
        state.handle = Handle::Id(self.alloc_client_id());
        state.desc = *desc;
        Ok(())
    }

    fn delete_rasterizer_state(&self, state: &mut RasterizerState) {
        state.handle.take();
    }

    fn create_buffer(
        &self,
        buffer: &mut Buffer,
        desc: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(buffer.handle.is_none());
        let mut size = desc.size.max(1);
        if desc.kind == BufferKind::Uniform {
            size = (size + 15) - (size + 15) % 16;
        }

        let usage = match desc.kind {
            BufferKind::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferKind::Index => vk::BufferUsageFlags::INDEX_BUFFER,
            BufferKind::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        };
        let info = vk::BufferCreateInfo::default()
            .size(size as vk::DeviceSize)
            .usage(usage | vk::BufferUsageFlags::TRANSFER_DST)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let native = unsafe { self.device.create_buffer(&info, None) }
            .map_err(|err| GraphicsError::ResourceCreation(format!("buffer: {}", err)))?;

        let requirements = unsafe { self.device.get_buffer_memory_requirements(native) };
        let memory_type = self
            .memory_type(
                requirements,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
                vk::MemoryPropertyFlags::DEVICE_LOCAL,
            )
            .ok_or_else(|| {
                GraphicsError::ResourceCreation("no host-visible memory type".into())
            })?;
        let allocate = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = unsafe { self.device.allocate_memory(&allocate, None) }
            .map_err(|err| GraphicsError::ResourceCreation(format!("buffer memory: {}", err)))?;
        let bound = unsafe {
            self.device.bind_buffer_memory(native, memory, 0).and_then(|_| {
                self.device
                    .map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
            })
        };
        let mapped = match bound {
            Ok(pointer) => pointer as *mut u8,
            Err(err) => {
                unsafe {
                    self.device.destroy_buffer(native, None);
                    self.device.free_memory(memory, None);
                }
                return Err(GraphicsError::ResourceCreation(format!(
                    "mapping buffer memory: {}",
                    err
                )));
            }
        };
        if let Some(data) = data {
            let length = data.len().min(size as usize);
            unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), mapped, length) };
        }

        let raw = native.as_raw();
        self.lock(&self.buffers).insert(
            raw,
            BufferBacking {
                buffer: native,
                memory,
                mapped,
                size,
            },
        );
        buffer.device = self.id;
        buffer.handle = Handle::Id(raw);
        buffer.kind = desc.kind;
        buffer.usage = desc.usage;
        buffer.size = size;
        Ok(())
    }

    fn write_buffer(&self, buffer: &mut Buffer, data: &[u8], offset: u32) {
        debug_assert_eq!(buffer.device, self.id);
        debug_assert!(offset as usize + data.len() <= buffer.size as usize);
        let buffers = self.lock(&self.buffers);
        let Some(backing) = buffers.get(&buffer.handle.id()) else {
            return;
        };
        let available = (backing.size as usize).saturating_sub(offset as usize);
        let length = data.len().min(available);
        unsafe {
            core::ptr::copy_nonoverlapping(
                data.as_ptr(),
                backing.mapped.add(offset as usize),
                length,
            );
        }
    }

    fn delete_buffer(&self, buffer: &mut Buffer) {
        if let Handle::Id(raw) = buffer.handle.take() {
            if let Some(backing) = self.lock(&self.buffers).remove(&raw) {
                unsafe { self.device.unmap_memory(backing.memory) };
                self.lock(&self.retired)
                    .push(Retired::Buffer(backing.buffer, backing.memory));
            }
        }
        buffer.size = 0;
    }

    fn create_attributes_state(
        &self,
        state: &mut AttributesState,
        desc: &AttributesStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(!state.handle.is_ready());
        debug_assert!(desc.binds.len() <= MAX_ATTRIBUTES);
        state.device = self.id;
        state.handle = Lazy::Uninit;
        state.count = desc.binds.len().min(MAX_ATTRIBUTES) as u32;
        for (slot, bind) in desc.binds.iter().take(MAX_ATTRIBUTES).enumerate() {
            state.binds[slot] = AttributeBind {
                buffer: bind.buffer.handle,
                stride: bind.stride,
                offset: bind.offset,
            };
        }
        state.index = desc.index.map(|(buffer, kind)| (buffer.handle, kind));
        Ok(())
    }

    fn bind_attributes_state(&self, state: &mut AttributesState, _layout: &InputLayout) {
        debug_assert_eq!(state.device, self.id);
        // No native vertex array object; the buffer binds are recorded
        // directly. The handle marks the state as realized.
        if !state.handle.is_ready() {
            state.handle = Lazy::Ready(Handle::None);
        }
        let mut frame = self.frame();
        self.ensure_recording(&mut frame);
        if !frame.recording {
            return;
        }
        for (slot, bind) in state.binds.iter().take(state.count as usize).enumerate() {
            if bind.buffer.is_none() {
                continue;
            }
            let buffers = [vk::Buffer::from_raw(bind.buffer.id())];
            let offsets = [bind.offset as vk::DeviceSize];
            unsafe {
                self.device.cmd_bind_vertex_buffers(
                    self.command_buffer,
                    slot as u32,
                    &buffers,
                    &offsets,
                );
            }
        }
        frame.index = state.index.map(|(handle, kind)| {
            (vk::Buffer::from_raw(handle.id()), convert::index_type(kind))
        });
        if let Some((index_buffer, index_type)) = frame.index {
            unsafe {
                self.device
                    .cmd_bind_index_buffer(self.command_buffer, index_buffer, 0, index_type);
            }
        }
    }

    fn delete_attributes_state(&self, state: &mut AttributesState) {
        state.handle.take();
        state.binds = [AttributeBind::default(); MAX_ATTRIBUTES];
        state.count = 0;
        state.index = None;
    }

    fn create_input_layout(
        &self,
        layout: &mut InputLayout,
        desc: &InputLayoutDescriptor<'_>,
        _program: &Program,
    ) -> Result<(), GraphicsError> {
        debug_assert!(layout.handle.is_none());
        debug_assert!(desc.entries.len() <= MAX_ATTRIBUTES);
        layout.device = self.id;
        layout.handle = Handle::Id(self.alloc_client_id());
        layout.count = desc.entries.len().min(MAX_ATTRIBUTES) as u32;
        for (slot, entry) in desc.entries.iter().take(MAX_ATTRIBUTES).enumerate() {
            layout.entries[slot] = *entry;
        }
        Ok(())
    }

    fn delete_input_layout(&self, layout: &mut InputLayout) {
        layout.handle.take();
        layout.count = 0;
    }

    fn create_texture(
        &self,
        texture: &mut Texture,
        desc: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(texture.handle.is_none());
        let format = convert::format(desc.format);
        let depth_format = desc.format == PixelFormat::Depth24Stencil8;
        let aspect = if depth_format {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::COLOR
        };
        let attachment_usage = if depth_format {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
        let is_volume = desc.kind == TextureKind::D3;
        let layers = if is_volume { 1 } else { desc.depth.max(1) };
        let levels = if desc.kind.is_multisampled() {
            1
        } else {
            desc.levels.max(1) as u32
        };
        let info = vk::ImageCreateInfo::default()
            .image_type(if is_volume {
                vk::ImageType::TYPE_3D
            } else {
                vk::ImageType::TYPE_2D
            })
            .format(format)
            .extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: if is_volume { desc.depth.max(1) } else { 1 },
            })
            .mip_levels(levels)
            .array_layers(layers)
            .samples(convert::samples(if desc.kind.is_multisampled() {
                desc.samples.max(1)
            } else {
                1
            }))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(
                vk::ImageUsageFlags::SAMPLED
                    | vk::ImageUsageFlags::TRANSFER_DST
                    | vk::ImageUsageFlags::TRANSFER_SRC
                    | attachment_usage,
            )
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        let image = unsafe { self.device.create_image(&info, None) }
            .map_err(|err| GraphicsError::ResourceCreation(format!("image: {}", err)))?;
        let requirements = unsafe { self.device.get_image_memory_requirements(image) };
        let memory_type = self
            .memory_type(
                requirements,
                vk::MemoryPropertyFlags::DEVICE_LOCAL,
                vk::MemoryPropertyFlags::empty(),
            )
            .or_else(|| self.memory_type(requirements, vk::MemoryPropertyFlags::empty(), vk::MemoryPropertyFlags::empty()))
            .ok_or_else(|| GraphicsError::ResourceCreation("no image memory type".into()))?;
        let allocate = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = unsafe { self.device.allocate_memory(&allocate, None) }
            .map_err(|err| GraphicsError::ResourceCreation(format!("image memory: {}", err)))?;
        if let Err(err) = unsafe { self.device.bind_image_memory(image, memory, 0) } {
            unsafe {
                self.device.destroy_image(image, None);
                self.device.free_memory(memory, None);
            }
            return Err(GraphicsError::ResourceCreation(format!(
                "binding image memory: {}",
                err
            )));
        }

        let raw = image.as_raw();
        self.lock(&self.images).insert(
            raw,
            ImageBacking {
                image,
                memory,
                view: None,
                sampler: None,
                aspect,
                format,
                levels,
                layers,
            },
        );
        texture.device = self.id;
        texture.handle = Handle::Id(raw);
        texture.view = Lazy::Uninit;
        texture.sampler = Lazy::Uninit;
        texture.kind = desc.kind;
        texture.format = desc.format;
        texture.levels = levels as u8;
        texture.samples = if desc.kind.is_multisampled() { desc.samples.max(1) } else { 1 };
        texture.width = desc.width;
        texture.height = desc.height;
        texture.depth = desc.depth.max(1);
        texture.addressing_u = TextureAddressing::Repeat;
        texture.addressing_v = TextureAddressing::Repeat;
        texture.addressing_w = TextureAddressing::Repeat;
        texture.min_filtering = Filtering::Nearest;
        texture.mag_filtering = Filtering::Linear;
        texture.mip_filtering = Filtering::Linear;
        texture.anisotropy = 1;
        texture.base_level = 0;
        texture.max_level = 1000;
        Ok(())
    }

    fn write_texture(
        &self,
        texture: &mut Texture,
        level: u8,
        offset: u32,
        width: u32,
        height: u32,
        depth: u32,
        data: &[u8],
    ) {
        debug_assert_eq!(texture.device, self.id);
        debug_assert!(!texture.kind.is_multisampled());
        let staging_info = vk::BufferCreateInfo::default()
            .size(data.len().max(1) as vk::DeviceSize)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let staging = match unsafe { self.device.create_buffer(&staging_info, None) } {
            Ok(staging) => staging,
            Err(err) => {
                self.report(&format!("staging buffer: {}", err));
                return;
            }
        };
        let requirements = unsafe { self.device.get_buffer_memory_requirements(staging) };
        let Some(memory_type) = self.memory_type(
            requirements,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::MemoryPropertyFlags::empty(),
        ) else {
            unsafe { self.device.destroy_buffer(staging, None) };
            self.report("no staging memory type");
            return;
        };
        let allocate = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let upload = unsafe {
            self.device.allocate_memory(&allocate, None).and_then(|memory| {
                self.device
                    .bind_buffer_memory(staging, memory, 0)
                    .and_then(|_| {
                        self.device
                            .map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                    })
                    .map(|pointer| (memory, pointer))
            })
        };
        let (memory, pointer) = match upload {
            Ok(pair) => pair,
            Err(err) => {
                unsafe { self.device.destroy_buffer(staging, None) };
                self.report(&format!("staging memory: {}", err));
                return;
            }
        };
        unsafe {
            core::ptr::copy_nonoverlapping(data.as_ptr(), pointer as *mut u8, data.len());
            self.device.unmap_memory(memory);
        }

        let images = self.lock(&self.images);
        let Some(backing) = images.get(&texture.handle.id()) else {
            drop(images);
            self.lock(&self.retired).push(Retired::Buffer(staging, memory));
            return;
        };
        let (image, aspect, layers) = (backing.image, backing.aspect, backing.layers);
        drop(images);

        let is_volume = texture.kind == TextureKind::D3;
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect,
                mip_level: level as u32,
                base_array_layer: if is_volume { 0 } else { offset.min(layers - 1) },
                layer_count: if is_volume { 1 } else { depth.max(1) },
            },
            image_offset: vk::Offset3D {
                x: 0,
                y: 0,
                z: if is_volume { offset as i32 } else { 0 },
            },
            image_extent: vk::Extent3D {
                width,
                height,
                depth: if is_volume { depth.max(1) } else { 1 },
            },
        };

        let mut frame = self.frame();
        self.end_pass(&mut frame);
        self.ensure_recording(&mut frame);
        if frame.recording {
            self.barrier(
                image,
                aspect,
                level as u32,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );
            unsafe {
                self.device.cmd_copy_buffer_to_image(
                    self.command_buffer,
                    staging,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }
            self.barrier(
                image,
                aspect,
                level as u32,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            );
        }
        drop(frame);
        self.lock(&self.retired).push(Retired::Buffer(staging, memory));
    }

    fn set_texture_addressing(
        &self,
        texture: &mut Texture,
        u: TextureAddressing,
        v: TextureAddressing,
        w: TextureAddressing,
    ) {
        if texture.addressing_u == u && texture.addressing_v == v && texture.addressing_w == w {
            return;
        }
        texture.addressing_u = u;
        texture.addressing_v = v;
        texture.addressing_w = w;
        self.retire_sampler(texture);
    }

    fn set_texture_filtering(
        &self,
        texture: &mut Texture,
        min: Filtering,
        mag: Filtering,
        mip: Filtering,
    ) {
        if texture.min_filtering == min && texture.mag_filtering == mag && texture.mip_filtering == mip
        {
            return;
        }
        texture.min_filtering = min;
        texture.mag_filtering = mag;
        texture.mip_filtering = mip;
        self.retire_sampler(texture);
    }

    fn set_texture_anisotropy(&self, texture: &mut Texture, anisotropy: u32) {
        let anisotropy = anisotropy.max(1);
        if texture.anisotropy == anisotropy {
            return;
        }
        texture.anisotropy = anisotropy;
        self.retire_sampler(texture);
    }

    fn set_texture_levels(&self, texture: &mut Texture, base: u32, max: u32) {
        if texture.base_level == base && texture.max_level == max {
            return;
        }
        texture.base_level = base;
        texture.max_level = max;
        self.retire_sampler(texture);
    }

    fn delete_texture(&self, texture: &mut Texture) {
        if let Handle::Id(raw) = texture.handle.take() {
            if let Some(backing) = self.lock(&self.images).remove(&raw) {
                self.lock(&self.retired).push(Retired::Image(
                    backing.image,
                    backing.memory,
                    backing.view,
                    backing.sampler,
                ));
            }
        }
        texture.view.take();
        texture.sampler.take();
    }

    fn create_shader(
        &self,
        shader: &mut Shader,
        desc: &ShaderDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(shader.handle.is_none());
        if desc.source.len() % 4 != 0 {
            return Err(GraphicsError::ShaderCompilation(
                "SPIR-V length is not a multiple of 4".into(),
            ));
        }
        let words: Vec<u32> = desc
            .source
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        let info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe { self.device.create_shader_module(&info, None) }
            .map_err(|err| GraphicsError::ShaderCompilation(format!("{}", err)))?;
        shader.device = self.id;
        shader.handle = Handle::Id(module.as_raw());
        shader.stage = desc.stage;
        Ok(())
    }

    fn delete_shader(&self, shader: &mut Shader) {
        if let Handle::Id(raw) = shader.handle.take() {
            self.lock(&self.retired)
                .push(Retired::ShaderModule(vk::ShaderModule::from_raw(raw)));
        }
    }

    fn create_program(
        &self,
        program: &mut Program,
        desc: &ProgramDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(program.handle.is_none());
        // SPIR-V carries explicit bindings; the named slot assignments
        // are not needed here. A program is just its stage modules.
        program.device = self.id;
        program.handle = Handle::Id(self.alloc_client_id());
        program.vertex = desc.vertex.handle;
        program.fragment = desc.fragment.handle;
        program.geometry = desc.geometry.map(|shader| shader.handle).unwrap_or_default();
        program.vertex_bytecode = Vec::new();
        Ok(())
    }

    fn delete_program(&self, program: &mut Program) {
        program.handle.take();
        program.vertex.take();
        program.fragment.take();
        program.geometry.take();
        program.vertex_bytecode.clear();
    }

    fn bind_uniform_buffer(&self, slot: u32, buffer: &Buffer, size: u32, offset: u32) {
        debug_assert_eq!(buffer.device, self.id);
        debug_assert!((slot as usize) < UNIFORM_SLOTS);
        debug_assert_eq!(
            offset % self.caps.uniform_buffer_alignment,
            0,
            "uniform bind offset must honor the device alignment"
        );
        let mut frame = self.frame();
        frame.uniform_binds[slot as usize] = Some(UniformBind {
            buffer: vk::Buffer::from_raw(buffer.handle.id()),
            range: size.max(1) as vk::DeviceSize,
        });
        frame.dynamic_offsets[slot as usize] = offset;
        frame.sets_dirty = true;
    }

    fn bind_samplers(&self, first: u32, textures: &mut [Option<&mut Texture>]) {
        let mut infos = Vec::new();
        {
            let mut images = self.lock(&self.images);
            for (position, entry) in textures.iter_mut().enumerate() {
                let slot = first + position as u32;
                if slot as usize >= SAMPLER_SLOTS {
                    break;
                }
                let Some(texture) = entry else { continue };
                let Some(backing) = images.get_mut(&texture.handle.id()) else {
                    continue;
                };
                let view = match self.texture_view(backing) {
                    Ok(view) => view,
                    Err(err) => {
                        self.report(&format!("texture view: {}", err));
                        continue;
                    }
                };
                let sampler = match self.texture_sampler(backing, texture) {
                    Ok(sampler) => sampler,
                    Err(err) => {
                        self.report(&format!("sampler: {}", err));
                        continue;
                    }
                };
                texture.view = Lazy::Ready(Handle::Id(view.as_raw()));
                texture.sampler = Lazy::Ready(Handle::Id(sampler.as_raw()));
                infos.push((
                    slot,
                    vk::DescriptorImageInfo {
                        sampler,
                        image_view: view,
                        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    },
                ));
            }
        }
        if infos.is_empty() {
            return;
        }
        let mut frame = self.frame();
        for (slot, info) in infos {
            frame.sampler_binds[slot as usize] = Some(info);
        }
        frame.sets_dirty = true;
    }

    fn create_render_target(&self, target: &mut RenderTarget) -> Result<(), GraphicsError> {
        debug_assert!(target.handle.is_none());
        target.device = self.id;
        target.handle = Handle::Id(self.alloc_client_id());
        target.colors = [None; MAX_COLOR_ATTACHMENTS];
        target.depth_stencil = None;
        target.draw_buffers.clear();
        Ok(())
    }

    fn bind_render_target(&self, target: Option<&RenderTarget>) {
        let mut frame = self.frame();
        let wanted = target.map(|t| t.handle.id()).unwrap_or(0);
        if frame.target == wanted {
            return;
        }
        self.end_pass(&mut frame);
        frame.target = wanted;
        drop(frame);
        if let Some(target) = target {
            if let Err(err) = self.realize_target(target) {
                self.report(&format!("realizing render target: {}", err));
            }
        }
    }

    fn set_render_target_texture(
        &self,
        target: &mut RenderTarget,
        attachment: Attachment,
        texture: &Texture,
    ) {
        debug_assert_eq!(target.device, self.id);
        let snapshot = AttachmentRef::of(texture);
        match attachment {
            Attachment::DepthStencil => target.depth_stencil = Some(snapshot),
            Attachment::Color(index) => {
                if let Some(slot) = target.colors.get_mut(index as usize) {
                    *slot = Some(snapshot);
                }
            }
        }
        self.invalidate_target(target);
    }

    fn set_render_target_draw_buffers(&self, target: &mut RenderTarget, buffers: &[Attachment]) {
        debug_assert_eq!(target.device, self.id);
        // Subpass color outputs follow attachment order; the list is
        // kept on the record for facade-level queries.
        target.draw_buffers.clear();
        target.draw_buffers.extend_from_slice(buffers);
    }

    fn resolve_render_target(
        &self,
        src: &RenderTarget,
        dst: &RenderTarget,
        mask: ResolveMask,
        src_color: u8,
        dst_color: u8,
    ) {
        let mut width = 0;
        let mut height = 0;
        let mut src_ref = None;
        let mut dst_ref = None;
        if mask.contains(ResolveMask::COLOR) {
            src_ref = src.attachment(Attachment::Color(src_color)).copied();
            dst_ref = dst.attachment(Attachment::Color(dst_color)).copied();
            if let Some(re) = &src_ref {
                (width, height) = (re.width, re.height);
            } else if let Some(re) = &dst_ref {
                (width, height) = (re.width, re.height);
            }
        }
        if width == 0 || height == 0 {
            src_ref = src.depth_stencil;
            dst_ref = dst.depth_stencil;
            if let Some(re) = &src_ref {
                (width, height) = (re.width, re.height);
            } else if let Some(re) = &dst_ref {
                (width, height) = (re.width, re.height);
            }
        }
        debug_assert!(width != 0 && height != 0, "resolve region cannot be inferred");
        let (Some(src_ref), Some(dst_ref)) = (src_ref, dst_ref) else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }

        let images = self.lock(&self.images);
        let (Some(from), Some(to)) = (
            images.get(&src_ref.texture.id()).copied(),
            images.get(&dst_ref.texture.id()).copied(),
        ) else {
            return;
        };
        drop(images);

        let mut frame = self.frame();
        self.end_pass(&mut frame);
        self.ensure_recording(&mut frame);
        if !frame.recording {
            return;
        }
        // The source still holds the rendered frame; its old layout
        // must be the real attachment layout or the transition is free
        // to throw the pixels away. The destination is overwritten in
        // full, so its prior contents can be discarded.
        self.barrier(
            from.image,
            from.aspect,
            0,
            attachment_layout(from.aspect),
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        );
        self.barrier(
            to.image,
            to.aspect,
            0,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        let subresource = |aspect| vk::ImageSubresourceLayers {
            aspect_mask: aspect,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        if src_ref.samples > 1 {
            let region = vk::ImageResolve {
                src_subresource: subresource(from.aspect),
                src_offset: vk::Offset3D::default(),
                dst_subresource: subresource(to.aspect),
                dst_offset: vk::Offset3D::default(),
                extent: vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                },
            };
            unsafe {
                self.device.cmd_resolve_image(
                    self.command_buffer,
                    from.image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    to.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }
        } else {
            let region = vk::ImageBlit {
                src_subresource: subresource(from.aspect),
                src_offsets: [
                    vk::Offset3D::default(),
                    vk::Offset3D {
                        x: width as i32,
                        y: height as i32,
                        z: 1,
                    },
                ],
                dst_subresource: subresource(to.aspect),
                dst_offsets: [
                    vk::Offset3D::default(),
                    vk::Offset3D {
                        x: width as i32,
                        y: height as i32,
                        z: 1,
                    },
                ],
            };
            unsafe {
                self.device.cmd_blit_image(
                    self.command_buffer,
                    from.image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    to.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                    vk::Filter::NEAREST,
                );
            }
        }
        self.barrier(
            from.image,
            from.aspect,
            0,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            attachment_layout(from.aspect),
        );
        self.barrier(
            to.image,
            to.aspect,
            0,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
    }

    fn delete_render_target(&self, target: &mut RenderTarget) {
        self.invalidate_target(target);
        let mut frame = self.frame();
        if frame.target == target.handle.id() {
            self.end_pass(&mut frame);
            frame.target = 0;
        }
        drop(frame);
        target.handle.take();
        target.colors = [None; MAX_COLOR_ATTACHMENTS];
        target.depth_stencil = None;
        target.draw_buffers.clear();
    }

    fn create_pipeline_state(
        &self,
        state: &mut PipelineState,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        let baked = self.bake_pipelines(desc)?;
        let id = self.alloc_client_id();
        self.lock(&self.pipelines).insert(id, baked);
        state.device = self.id;
        state.handle = Handle::Id(id);
        state.program = desc.program.handle;
        state.rasterizer = *desc.rasterizer;
        state.depth_stencil = *desc.depth_stencil;
        state.blend = *desc.blend;
        state.layout = *desc.layout;
        Ok(())
    }

    fn bind_pipeline_state(&self, state: &PipelineState) {
        let id = state.handle.id();
        let mut frame = self.frame();
        if frame.pipeline == id {
            return;
        }
        self.ensure_recording(&mut frame);
        if !frame.recording {
            return;
        }
        let variant = topology_variant(frame.topology);
        let pipelines = self.lock(&self.pipelines);
        let Some(baked) = pipelines.get(&id) else {
            return;
        };
        unsafe {
            self.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                baked[variant],
            );
        }
        drop(pipelines);
        frame.pipeline = id;
    }

    fn delete_pipeline_state(&self, state: &mut PipelineState) {
        if let Handle::Id(id) = state.handle.take() {
            let mut frame = self.frame();
            if frame.pipeline == id {
                frame.pipeline = 0;
            }
            drop(frame);
            if let Some(baked) = self.lock(&self.pipelines).remove(&id) {
                self.lock(&self.retired).push(Retired::Pipelines(baked));
            }
        }
    }

    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        let mut frame = self.frame();
        frame.viewport = vk::Viewport {
            x: x as f32,
            y: y as f32,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        if frame.in_pass {
            unsafe {
                self.device
                    .cmd_set_viewport(self.command_buffer, 0, &[frame.viewport])
            };
        }
    }

    fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32) {
        let mut frame = self.frame();
        frame.scissor = vk::Rect2D {
            offset: vk::Offset2D { x, y },
            extent: vk::Extent2D { width, height },
        };
        if frame.in_pass {
            unsafe {
                self.device
                    .cmd_set_scissor(self.command_buffer, 0, &[frame.scissor])
            };
        }
    }

    fn set_line_width(&self, width: f32) {
        let mut frame = self.frame();
        frame.line_width = width;
        if frame.in_pass {
            unsafe { self.device.cmd_set_line_width(self.command_buffer, width) };
        }
    }

    fn set_point_size(&self, _size: f32) {
        // Vulkan point size comes from the vertex shader
        // (gl_PointSize); there is no device state to set.
    }
}

impl VulkanDevice {
    fn retire_sampler(&self, texture: &mut Texture) {
        let mut images = self.lock(&self.images);
        if let Some(backing) = images.get_mut(&texture.handle.id()) {
            if let Some(sampler) = backing.sampler.take() {
                self.lock(&self.retired).push(Retired::Sampler(sampler));
            }
        }
        texture.sampler = Lazy::Uninit;
    }
}

impl Frame {
    /// Full-surface clear rect for the current target.
    fn scissor_or_full(&self, device: &VulkanDevice, target: Option<&RenderTarget>) -> vk::Rect2D {
        let extent = match target {
            None => device.swap_extent,
            Some(target) => {
                let targets = device.lock(&device.targets);
                targets
                    .get(&target.handle.id())
                    .map(|backing| vk::Extent2D {
                        width: backing.width,
                        height: backing.height,
                    })
                    .unwrap_or(device.swap_extent)
            }
        };
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
        }
        let retired = std::mem::take(&mut *self.lock(&self.retired));
        self.destroy_retired(retired);
        let buffers = std::mem::take(&mut *self.lock(&self.buffers));
        for backing in buffers.into_values() {
            unsafe {
                self.device.unmap_memory(backing.memory);
                self.device.destroy_buffer(backing.buffer, None);
                self.device.free_memory(backing.memory, None);
            }
        }
        let images = std::mem::take(&mut *self.lock(&self.images));
        for backing in images.into_values() {
            unsafe {
                if let Some(sampler) = backing.sampler {
                    self.device.destroy_sampler(sampler, None);
                }
                if let Some(view) = backing.view {
                    self.device.destroy_image_view(view, None);
                }
                self.device.destroy_image(backing.image, None);
                self.device.free_memory(backing.memory, None);
            }
        }
        let pipelines = std::mem::take(&mut *self.lock(&self.pipelines));
        for baked in pipelines.into_values() {
            for pipeline in baked {
                unsafe { self.device.destroy_pipeline(pipeline, None) };
            }
        }
        let targets = std::mem::take(&mut *self.lock(&self.targets));
        for backing in targets.into_values() {
            unsafe {
                self.device.destroy_framebuffer(backing.framebuffer, None);
                self.device.destroy_render_pass(backing.render_pass, None);
            }
        }
        unsafe {
            self.device.destroy_fence(self.submit_fence, None);
            self.device.destroy_semaphore(self.render_finished, None);
            self.device.destroy_semaphore(self.image_available, None);
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            for layout in self.set_layouts {
                self.device.destroy_descriptor_set_layout(layout, None);
            }
            for framebuffer in self.swap_framebuffers.drain(..) {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            for view in self.swap_views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.device.destroy_render_pass(self.render_pass, None);
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_sample_count_prefers_the_largest_bit() {
        let flags = vk::SampleCountFlags::TYPE_1
            | vk::SampleCountFlags::TYPE_4
            | vk::SampleCountFlags::TYPE_8;
        assert_eq!(VulkanDevice::highest_sample_count(flags), 8);
        assert_eq!(
            VulkanDevice::highest_sample_count(vk::SampleCountFlags::TYPE_1),
            1
        );
    }

    #[test]
    fn test_topology_variant_indexes_the_baked_array() {
        assert_eq!(topology_variant(PrimitiveType::Triangles), 0);
        assert_eq!(topology_variant(PrimitiveType::Points), 1);
        assert_eq!(topology_variant(PrimitiveType::Lines), 2);
        for primitive in TOPOLOGIES {
            assert_eq!(TOPOLOGIES[topology_variant(primitive)], primitive);
        }
    }

    #[test]
    fn test_resolve_sources_keep_their_attachment_layout() {
        assert_eq!(
            attachment_layout(vk::ImageAspectFlags::COLOR),
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
        );
        assert_eq!(
            attachment_layout(vk::ImageAspectFlags::DEPTH),
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        );
        assert_eq!(
            attachment_layout(vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL),
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        );
    }

    #[test]
    fn test_uniform_writes_cover_only_bound_slots() {
        let mut binds = [None; UNIFORM_SLOTS];
        binds[2] = Some(UniformBind {
            buffer: vk::Buffer::from_raw(7),
            range: 256,
        });
        binds[5] = Some(UniformBind {
            buffer: vk::Buffer::from_raw(9),
            range: 64,
        });
        let infos = uniform_buffer_infos(&binds);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].0, 2);
        assert_eq!(infos[0].1.buffer, vk::Buffer::from_raw(7));
        assert_eq!(infos[0].1.offset, 0);
        assert_eq!(infos[0].1.range, 256);
        assert_eq!(infos[1].0, 5);
        assert_eq!(infos[1].1.range, 64);
        assert!(uniform_buffer_infos(&[None; UNIFORM_SLOTS]).is_empty());
    }

    #[test]
    fn test_sampler_writes_skip_empty_slots() {
        let mut binds = [None; SAMPLER_SLOTS];
        let info = vk::DescriptorImageInfo {
            sampler: vk::Sampler::from_raw(3),
            image_view: vk::ImageView::from_raw(4),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        };
        binds[0] = Some(info);
        binds[SAMPLER_SLOTS - 1] = Some(info);
        let infos = sampler_image_infos(&binds);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].0, 0);
        assert_eq!(infos[1].0, SAMPLER_SLOTS as u32 - 1);
        assert_eq!(infos[1].1.image_view, vk::ImageView::from_raw(4));
    }

    #[test]
    fn test_fresh_frame_has_nothing_recorded() {
        let frame = Frame::default();
        assert!(!frame.recording);
        assert!(!frame.sets_dirty);
        assert!(frame.uniform_binds.iter().all(Option::is_none));
        assert!(frame.sampler_binds.iter().all(Option::is_none));
        assert_eq!(frame.dynamic_offsets, [0; UNIFORM_SLOTS]);
        assert_eq!(frame.topology, PrimitiveType::Triangles);
    }
}
