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

//! The Direct3D 11 device.
//!
//! Fixed-function states and input layouts are immutable native objects
//! created eagerly; binds compare the native pointer and skip the call
//! when the object is already current. Shader resource views and
//! sampler states are created on the first sampler bind from the
//! record's current parameters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use raw_window_handle::RawWindowHandle;
use windows::core::{Interface, PCSTR};
use windows::Win32::Foundation::{HMODULE, HWND};
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

use opale_core::api::*;
use opale_core::device::{DeviceConfig, DiagnosticSink};
use opale_core::error::GraphicsError;
use opale_core::traits::{DeviceCaps, GraphicsDevice};

use super::convert;

const SAMPLER_SLOTS: usize = 16;
const UNIFORM_SLOTS: usize = 8;

struct TextureEntry {
    resource: ID3D11Resource,
    srv: Option<ID3D11ShaderResourceView>,
    sampler: Option<ID3D11SamplerState>,
}

enum ShaderEntry {
    Vertex(ID3D11VertexShader, Vec<u8>),
    Pixel(ID3D11PixelShader),
    Geometry(ID3D11GeometryShader),
}

struct TargetEntry {
    colors: [Option<ID3D11RenderTargetView>; MAX_COLOR_ATTACHMENTS],
    depth: Option<ID3D11DepthStencilView>,
}

/// The stage composition of a linked program, resolved at pipeline bind.
#[derive(Clone, Copy)]
struct ProgramEntry {
    vertex: Handle,
    fragment: Handle,
    geometry: Handle,
}

#[derive(Default)]
struct Registry {
    buffers: HashMap<u64, ID3D11Buffer>,
    textures: HashMap<u64, TextureEntry>,
    shaders: HashMap<u64, ShaderEntry>,
    blends: HashMap<u64, ID3D11BlendState>,
    depth_stencils: HashMap<u64, ID3D11DepthStencilState>,
    rasterizers: HashMap<u64, ID3D11RasterizerState>,
    layouts: HashMap<u64, ID3D11InputLayout>,
    programs: HashMap<u64, ProgramEntry>,
    targets: HashMap<u64, TargetEntry>,
}

/// Native pointers of the currently bound objects; a bind whose object
/// is already current is skipped.
#[derive(Default)]
struct Bound {
    pipeline: u64,
    vertex_shader: usize,
    pixel_shader: usize,
    geometry_shader: usize,
    blend: usize,
    depth_stencil: usize,
    rasterizer: usize,
    layout: usize,
    topology: i32,
    target: u64,
    srvs: [usize; SAMPLER_SLOTS],
    samplers: [usize; SAMPLER_SLOTS],
}

/// A device over a Direct3D 11 hardware adapter.
pub struct D3d11Device {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    context1: Option<ID3D11DeviceContext1>,
    swapchain: IDXGISwapChain,
    backbuffer: ID3D11RenderTargetView,
    default_depth: ID3D11DepthStencilView,
    caps: DeviceCaps,
    id: DeviceId,
    diagnostics: Option<DiagnosticSink>,
    next_client_id: AtomicU64,
    registry: Mutex<Registry>,
    bound: Mutex<Bound>,
}

// SAFETY: the immediate context is single-threaded by contract; callers
// serialize all binds and draws, matching the trait's threading model.
unsafe impl Send for D3d11Device {}
unsafe impl Sync for D3d11Device {}

impl std::fmt::Debug for D3d11Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D3d11Device")
            .field("id", &self.id)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

fn raw_of<T: Interface>(object: &T) -> usize {
    object.as_raw() as usize
}

impl D3d11Device {
    /// Builds a device and swapchain over the given window handle.
    ///
    /// ## Errors
    /// * `GraphicsError::BackendUnavailable` - If the handle is not a
    ///   Win32 window or device creation fails.
    pub fn new(config: &DeviceConfig, window: RawWindowHandle) -> Result<Self, GraphicsError> {
        let RawWindowHandle::Win32(win32) = window else {
            return Err(GraphicsError::BackendUnavailable(
                "not a Win32 window handle".into(),
            ));
        };
        let hwnd = HWND(win32.hwnd.get() as *mut core::ffi::c_void);

        let swap_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                ..Default::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 2,
            OutputWindow: hwnd,
            Windowed: true.into(),
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: 0,
        };
        let levels = [D3D_FEATURE_LEVEL_11_0];
        let mut swapchain = None;
        let mut device = None;
        let mut context = None;
        unsafe {
            D3D11CreateDeviceAndSwapChain(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_FLAG(0),
                Some(&levels),
                D3D11_SDK_VERSION,
                Some(&swap_desc),
                Some(&mut swapchain),
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map_err(|err| {
            GraphicsError::BackendUnavailable(format!("creating device: {}", err))
        })?;
        let (Some(device), Some(context), Some(swapchain)) = (device, context, swapchain) else {
            return Err(GraphicsError::BackendUnavailable(
                "device creation returned no interfaces".into(),
            ));
        };
        let context1 = context.cast::<ID3D11DeviceContext1>().ok();

        let back_texture: ID3D11Texture2D = unsafe { swapchain.GetBuffer(0) }.map_err(|err| {
            GraphicsError::BackendUnavailable(format!("querying backbuffer: {}", err))
        })?;
        let mut backbuffer = None;
        unsafe { device.CreateRenderTargetView(&back_texture, None, Some(&mut backbuffer)) }
            .map_err(|err| {
                GraphicsError::BackendUnavailable(format!("backbuffer view: {}", err))
            })?;
        let Some(backbuffer) = backbuffer else {
            return Err(GraphicsError::BackendUnavailable("backbuffer view".into()));
        };

        let mut back_desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { back_texture.GetDesc(&mut back_desc) };
        let depth_desc = D3D11_TEXTURE2D_DESC {
            Width: back_desc.Width,
            Height: back_desc.Height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT_D24_UNORM_S8_UINT,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };
        let mut depth_texture = None;
        unsafe { device.CreateTexture2D(&depth_desc, None, Some(&mut depth_texture)) }.map_err(
            |err| GraphicsError::BackendUnavailable(format!("default depth: {}", err)),
        )?;
        let Some(depth_texture) = depth_texture else {
            return Err(GraphicsError::BackendUnavailable("default depth".into()));
        };
        let mut default_depth = None;
        unsafe { device.CreateDepthStencilView(&depth_texture, None, Some(&mut default_depth)) }
            .map_err(|err| {
                GraphicsError::BackendUnavailable(format!("default depth view: {}", err))
            })?;
        let Some(default_depth) = default_depth else {
            return Err(GraphicsError::BackendUnavailable("default depth view".into()));
        };

        let caps = DeviceCaps {
            // VSSetConstantBuffers1 offsets are given in 16-constant
            // units of 16 bytes each.
            uniform_buffer_alignment: 256,
            max_samplers: SAMPLER_SLOTS as u32,
            max_msaa_samples: Self::probe_msaa(&device),
        };
        log::info!(
            "d3d11 device ready (uniform alignment {}, {} sampler slots, {}x msaa)",
            caps.uniform_buffer_alignment,
            caps.max_samplers,
            caps.max_msaa_samples
        );

        Ok(Self {
            device,
            context,
            context1,
            swapchain,
            backbuffer,
            default_depth,
            caps,
            id: crate::next_device_id(),
            diagnostics: config.diagnostics.clone(),
            next_client_id: AtomicU64::new(1),
            registry: Mutex::new(Registry::default()),
            bound: Mutex::new(Bound::default()),
        })
    }

    fn probe_msaa(device: &ID3D11Device) -> u32 {
        for count in [16u32, 8, 4, 2] {
            let mut quality = 0u32;
            let supported = unsafe {
                device
                    .CheckMultisampleQualityLevels(DXGI_FORMAT_B8G8R8A8_UNORM, count, &mut quality)
                    .is_ok()
            };
            if supported && quality > 0 {
                return count;
            }
        }
        1
    }

    fn report(&self, message: &str) {
        match &self.diagnostics {
            Some(sink) => sink(message),
            None => log::error!("d3d11: {}", message),
        }
    }

    fn alloc_client_id(&self) -> u64 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn bound(&self) -> MutexGuard<'_, Bound> {
        match self.bound.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_topology(&self, bound: &mut Bound, primitive: PrimitiveType) {
        let wanted = convert::topology(primitive);
        if bound.topology == wanted.0 {
            return;
        }
        unsafe { self.context.IASetPrimitiveTopology(wanted) };
        bound.topology = wanted.0;
    }

    /// Resolves the view to clear for `target`/`attachment`. The
    /// attachment index only applies to bound off-screen targets.
    fn clear_view(
        &self,
        target: Option<&RenderTarget>,
        attachment: Attachment,
    ) -> Option<ID3D11RenderTargetView> {
        match target {
            None => Some(self.backbuffer.clone()),
            Some(target) => {
                let index = match attachment {
                    Attachment::Color(index) => index as usize,
                    Attachment::DepthStencil => 0,
                };
                let registry = self.registry();
                registry
                    .targets
                    .get(&target.handle.id())
                    .and_then(|entry| entry.colors.get(index).cloned().flatten())
            }
        }
    }

    fn depth_view(&self, target: Option<&RenderTarget>) -> Option<ID3D11DepthStencilView> {
        match target {
            None => Some(self.default_depth.clone()),
            Some(target) => {
                let registry = self.registry();
                registry
                    .targets
                    .get(&target.handle.id())
                    .and_then(|entry| entry.depth.clone())
            }
        }
    }

    fn texture_srv(
        &self,
        entry: &mut TextureEntry,
    ) -> Option<ID3D11ShaderResourceView> {
        if entry.srv.is_none() {
            let mut srv = None;
            let created = unsafe {
                self.device
                    .CreateShaderResourceView(&entry.resource, None, Some(&mut srv))
            };
            match created {
                Ok(()) => entry.srv = srv,
                Err(err) => {
                    self.report(&format!("shader resource view: {}", err));
                    return None;
                }
            }
        }
        entry.srv.clone()
    }

    fn texture_sampler(
        &self,
        entry: &mut TextureEntry,
        texture: &Texture,
    ) -> Option<ID3D11SamplerState> {
        if entry.sampler.is_none() {
            let desc = D3D11_SAMPLER_DESC {
                Filter: convert::filter(
                    texture.min_filtering,
                    texture.mag_filtering,
                    texture.mip_filtering,
                    texture.anisotropy,
                ),
                AddressU: convert::addressing(texture.addressing_u),
                AddressV: convert::addressing(texture.addressing_v),
                AddressW: convert::addressing(texture.addressing_w),
                MipLODBias: 0.0,
                MaxAnisotropy: texture.anisotropy.max(1),
                ComparisonFunc: D3D11_COMPARISON_NEVER,
                BorderColor: [0.0; 4],
                MinLOD: texture.base_level as f32,
                MaxLOD: texture.max_level as f32,
            };
            let mut sampler = None;
            let created = unsafe { self.device.CreateSamplerState(&desc, Some(&mut sampler)) };
            match created {
                Ok(()) => entry.sampler = sampler,
                Err(err) => {
                    self.report(&format!("sampler state: {}", err));
                    return None;
                }
            }
        }
        entry.sampler.clone()
    }

    /// Drops a materialized sampler so the next bind rebuilds it from
    /// the record.
    fn retire_sampler(&self, texture: &mut Texture) {
        let mut registry = self.registry();
        if let Some(entry) = registry.textures.get_mut(&texture.handle.id()) {
            entry.sampler = None;
        }
        texture.sampler = Lazy::Uninit;
    }
}

impl GraphicsDevice for D3d11Device {
    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    /// Presents the swapchain. Deletion released natively already, so
    /// there is nothing to reclaim.
    fn tick(&self) {
        let result = unsafe { self.swapchain.Present(1, DXGI_PRESENT(0)) };
        if let Err(err) = result.ok() {
            self.report(&format!("presenting: {}", err));
        }
    }

    fn clear_color(&self, target: Option<&RenderTarget>, attachment: Attachment, color: [f32; 4]) {
        let Some(view) = self.clear_view(target, attachment) else {
            return;
        };
        unsafe { self.context.ClearRenderTargetView(&view, &color) };
    }

    fn clear_depth_stencil(&self, target: Option<&RenderTarget>, depth: f32, stencil: u8) {
        let Some(view) = self.depth_view(target) else {
            return;
        };
        unsafe {
            self.context.ClearDepthStencilView(
                &view,
                (D3D11_CLEAR_DEPTH.0 | D3D11_CLEAR_STENCIL.0) as u32,
                depth,
                stencil,
            );
        }
    }

    fn draw(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        let mut bound = self.bound();
        self.set_topology(&mut bound, primitive);
        unsafe { self.context.Draw(count, offset) };
    }

    fn draw_instanced(&self, primitive: PrimitiveType, count: u32, offset: u32, instances: u32) {
        let mut bound = self.bound();
        self.set_topology(&mut bound, primitive);
        unsafe { self.context.DrawInstanced(count, instances, offset, 0) };
    }

    fn draw_indexed(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        let mut bound = self.bound();
        self.set_topology(&mut bound, primitive);
        unsafe { self.context.DrawIndexed(count, offset, 0) };
    }

    fn draw_indexed_instanced(
        &self,
        primitive: PrimitiveType,
        count: u32,
        offset: u32,
        instances: u32,
    ) {
        let mut bound = self.bound();
        self.set_topology(&mut bound, primitive);
        unsafe {
            self.context
                .DrawIndexedInstanced(count, instances, offset, 0, 0)
        };
    }

    fn create_blend_state(
        &self,
        state: &mut BlendState,
        desc: &BlendStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        let target = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: desc.enabled.into(),
            SrcBlend: convert::blend_function(desc.src_color),
            DestBlend: convert::blend_function(desc.dst_color),
            BlendOp: convert::blend_equation(desc.color_equation),
            SrcBlendAlpha: convert::blend_function(desc.src_alpha),
            DestBlendAlpha: convert::blend_function(desc.dst_alpha),
            BlendOpAlpha: convert::blend_equation(desc.alpha_equation),
            RenderTargetWriteMask: D3D11_COLOR_WRITE_ENABLE_ALL.0 as u8,
        };
        let native_desc = D3D11_BLEND_DESC {
            AlphaToCoverageEnable: false.into(),
            IndependentBlendEnable: false.into(),
            RenderTarget: [target; 8],
        };
        let mut native = None;
        unsafe { self.device.CreateBlendState(&native_desc, Some(&mut native)) }
            .map_err(|err| GraphicsError::ResourceCreation(format!("blend state: {}", err)))?;
        let Some(native) = native else {
            return Err(GraphicsError::ResourceCreation("blend state".into()));
        };

        let id = self.alloc_client_id();
        self.registry().blends.insert(id, native);
        state.device = self.id;
        state.handle = Handle::Id(id);
        state.desc = *desc;
        Ok(())
    }

    fn delete_blend_state(&self, state: &mut BlendState) {
        if let Handle::Id(id) = state.handle.take() {
            self.registry().blends.remove(&id);
        }
    }

    fn create_depth_stencil_state(
        &self,
        state: &mut DepthStencilState,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        let face = D3D11_DEPTH_STENCILOP_DESC {
            StencilFailOp: convert::stencil_operation(desc.stencil_fail),
            StencilDepthFailOp: convert::stencil_operation(desc.stencil_zfail),
            StencilPassOp: convert::stencil_operation(desc.stencil_pass),
            StencilFunc: convert::compare(desc.stencil_compare),
        };
        let native_desc = D3D11_DEPTH_STENCIL_DESC {
            DepthEnable: desc.depth_test.into(),
            DepthWriteMask: if desc.depth_write {
                D3D11_DEPTH_WRITE_MASK_ALL
            } else {
                D3D11_DEPTH_WRITE_MASK_ZERO
            },
            DepthFunc: convert::compare(desc.depth_compare),
            StencilEnable: desc.stencil_enabled.into(),
            StencilReadMask: (desc.stencil_compare_mask & 0xFF) as u8,
            StencilWriteMask: (desc.stencil_write_mask & 0xFF) as u8,
            FrontFace: face,
            BackFace: face,
        };
        let mut native = None;
        unsafe {
            self.device
                .CreateDepthStencilState(&native_desc, Some(&mut native))
        }
        .map_err(|err| GraphicsError::ResourceCreation(format!("depth-stencil state: {}", err)))?;
        let Some(native) = native else {
            return Err(GraphicsError::ResourceCreation("depth-stencil state".into()));
        };

        let id = self.alloc_client_id();
        self.registry().depth_stencils.insert(id, native);
        state.device = self.id;
        state.handle = Handle::Id(id);
        state.desc = *desc;
        Ok(())
    }

    fn delete_depth_stencil_state(&self, state: &mut DepthStencilState) {
        if let Handle::Id(id) = state.handle.take() {
            self.registry().depth_stencils.remove(&id);
        }
    }

    fn create_rasterizer_state(
        &self,
        state: &mut RasterizerState,
        desc: &RasterizerStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        let native_desc = D3D11_RASTERIZER_DESC {
            FillMode: convert::fill_mode(desc.fill_mode),
            CullMode: convert::cull_mode(desc.cull_mode),
            FrontCounterClockwise: (desc.front_face == FrontFace::CounterClockwise).into(),
            DepthBias: 0,
            DepthBiasClamp: 0.0,
            SlopeScaledDepthBias: 0.0,
            DepthClipEnable: true.into(),
            ScissorEnable: desc.scissor.into(),
            MultisampleEnable: false.into(),
            AntialiasedLineEnable: false.into(),
        };
        let mut native = None;
        unsafe {
            self.device
                .CreateRasterizerState(&native_desc, Some(&mut native))
        }
        .map_err(|err| GraphicsError::ResourceCreation(format!("rasterizer state: {}", err)))?;
        let Some(native) = native else {
            return Err(GraphicsError::ResourceCreation("rasterizer state".into()));
        };

        let id = self.alloc_client_id();
        self.registry().rasterizers.insert(id, native);
        state.device = self.id;
        state.handle = Handle::Id(id);
        state.desc = *desc;
        Ok(())
    }

    fn delete_rasterizer_state(&self, state: &mut RasterizerState) {
        if let Handle::Id(id) = state.handle.take() {
            self.registry().rasterizers.remove(&id);
        }
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
        let bind = match desc.kind {
            BufferKind::Vertex => D3D11_BIND_VERTEX_BUFFER,
            BufferKind::Index => D3D11_BIND_INDEX_BUFFER,
            BufferKind::Uniform => D3D11_BIND_CONSTANT_BUFFER,
        };
        let native_desc = D3D11_BUFFER_DESC {
            ByteWidth: size,
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: bind.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
            StructureByteStride: 0,
        };
        let initial = data.map(|data| D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr() as *const core::ffi::c_void,
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });
        let mut native = None;
        unsafe {
            self.device
                .CreateBuffer(&native_desc, initial.as_ref().map(|i| i as *const _), Some(&mut native))
        }
        .map_err(|err| GraphicsError::ResourceCreation(format!("buffer: {}", err)))?;
        let Some(native) = native else {
            return Err(GraphicsError::ResourceCreation("buffer".into()));
        };

        let id = self.alloc_client_id();
        self.registry().buffers.insert(id, native);
        buffer.device = self.id;
        buffer.handle = Handle::Id(id);
        buffer.kind = desc.kind;
        buffer.usage = desc.usage;
        buffer.size = size;
        Ok(())
    }

    fn write_buffer(&self, buffer: &mut Buffer, data: &[u8], offset: u32) {
        debug_assert_eq!(buffer.device, self.id);
        debug_assert!(offset as usize + data.len() <= buffer.size as usize);
        let registry = self.registry();
        let Some(native) = registry.buffers.get(&buffer.handle.id()) else {
            return;
        };
        // Constant buffers cannot be partially updated through a box.
        let region = (buffer.kind != BufferKind::Uniform).then_some(D3D11_BOX {
            left: offset,
            top: 0,
            front: 0,
            right: offset + data.len() as u32,
            bottom: 1,
            back: 1,
        });
        unsafe {
            self.context.UpdateSubresource(
                native,
                0,
                region.as_ref().map(|r| r as *const _),
                data.as_ptr() as *const core::ffi::c_void,
                0,
                0,
            );
        }
    }

    fn delete_buffer(&self, buffer: &mut Buffer) {
        if let Handle::Id(id) = buffer.handle.take() {
            self.registry().buffers.remove(&id);
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

    fn bind_attributes_state(&self, state: &mut AttributesState, layout: &InputLayout) {
        debug_assert_eq!(state.device, self.id);
        if !state.handle.is_ready() {
            state.handle = Lazy::Ready(Handle::None);
        }
        let registry = self.registry();
        for (slot, bind) in state.binds.iter().take(state.count as usize).enumerate() {
            let Some(native) = registry.buffers.get(&bind.buffer.id()) else {
                continue;
            };
            let buffers = Some(native.clone());
            let stride = bind.stride;
            let offset = bind.offset;
            unsafe {
                self.context.IASetVertexBuffers(
                    slot as u32,
                    1,
                    Some(&buffers),
                    Some(&stride),
                    Some(&offset),
                );
            }
        }
        if let Some((handle, kind)) = state.index {
            if let Some(native) = registry.buffers.get(&handle.id()) {
                unsafe {
                    self.context
                        .IASetIndexBuffer(native, convert::index_format(kind), 0)
                };
            }
        }
        if let Some(native) = registry.layouts.get(&layout.handle.id()) {
            let mut bound = self.bound();
            let raw = raw_of(native);
            if bound.layout != raw {
                unsafe { self.context.IASetInputLayout(native) };
                bound.layout = raw;
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
        program: &Program,
    ) -> Result<(), GraphicsError> {
        debug_assert!(layout.handle.is_none());
        debug_assert!(desc.entries.len() <= MAX_ATTRIBUTES);
        if program.vertex_bytecode.is_empty() {
            return Err(GraphicsError::ResourceCreation(
                "input layout needs the program's vertex bytecode".into(),
            ));
        }
        let mut elements = Vec::new();
        for (slot, entry) in desc.entries.iter().take(MAX_ATTRIBUTES).enumerate() {
            if entry.attribute == AttributeType::Disabled {
                continue;
            }
            elements.push(D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(b"TEXCOORD\0".as_ptr()),
                SemanticIndex: slot as u32,
                Format: convert::attribute_format(entry.attribute),
                InputSlot: slot as u32,
                AlignedByteOffset: entry.offset,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            });
        }
        let mut native = None;
        unsafe {
            self.device.CreateInputLayout(
                &elements,
                &program.vertex_bytecode,
                Some(&mut native),
            )
        }
        .map_err(|err| GraphicsError::ResourceCreation(format!("input layout: {}", err)))?;
        let Some(native) = native else {
            return Err(GraphicsError::ResourceCreation("input layout".into()));
        };

        let id = self.alloc_client_id();
        self.registry().layouts.insert(id, native);
        layout.device = self.id;
        layout.handle = Handle::Id(id);
        layout.count = desc.entries.len().min(MAX_ATTRIBUTES) as u32;
        for (slot, entry) in desc.entries.iter().take(MAX_ATTRIBUTES).enumerate() {
            layout.entries[slot] = *entry;
        }
        Ok(())
    }

    fn delete_input_layout(&self, layout: &mut InputLayout) {
        if let Handle::Id(id) = layout.handle.take() {
            self.registry().layouts.remove(&id);
        }
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
        let bind = D3D11_BIND_SHADER_RESOURCE.0 as u32
            | if depth_format {
                D3D11_BIND_DEPTH_STENCIL.0 as u32
            } else {
                D3D11_BIND_RENDER_TARGET.0 as u32
            };
        let levels = if desc.kind.is_multisampled() {
            1
        } else {
            desc.levels.max(1) as u32
        };
        let resource: ID3D11Resource = if desc.kind == TextureKind::D3 {
            let native_desc = D3D11_TEXTURE3D_DESC {
                Width: desc.width,
                Height: desc.height,
                Depth: desc.depth.max(1),
                MipLevels: levels,
                Format: format,
                Usage: D3D11_USAGE_DEFAULT,
                BindFlags: bind,
                CPUAccessFlags: 0,
                MiscFlags: 0,
            };
            let mut native = None;
            unsafe { self.device.CreateTexture3D(&native_desc, None, Some(&mut native)) }
                .map_err(|err| GraphicsError::ResourceCreation(format!("texture: {}", err)))?;
            native
                .ok_or_else(|| GraphicsError::ResourceCreation("texture".into()))?
                .cast()
                .map_err(|err| GraphicsError::ResourceCreation(format!("texture: {}", err)))?
        } else {
            let native_desc = D3D11_TEXTURE2D_DESC {
                Width: desc.width,
                Height: desc.height,
                MipLevels: levels,
                ArraySize: desc.depth.max(1),
                Format: format,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: if desc.kind.is_multisampled() {
                        desc.samples.max(1) as u32
                    } else {
                        1
                    },
                    Quality: 0,
                },
                Usage: D3D11_USAGE_DEFAULT,
                BindFlags: bind,
                CPUAccessFlags: 0,
                MiscFlags: 0,
            };
            let mut native = None;
            unsafe { self.device.CreateTexture2D(&native_desc, None, Some(&mut native)) }
                .map_err(|err| GraphicsError::ResourceCreation(format!("texture: {}", err)))?;
            native
                .ok_or_else(|| GraphicsError::ResourceCreation("texture".into()))?
                .cast()
                .map_err(|err| GraphicsError::ResourceCreation(format!("texture: {}", err)))?
        };

        let id = self.alloc_client_id();
        self.registry().textures.insert(
            id,
            TextureEntry {
                resource,
                srv: None,
                sampler: None,
            },
        );
        texture.device = self.id;
        texture.handle = Handle::Id(id);
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
        let registry = self.registry();
        let Some(entry) = registry.textures.get(&texture.handle.id()) else {
            return;
        };
        let row_pitch = if texture.format.is_compressed() {
            texture.format.surface_size(width, 4)
        } else {
            width * texture.format.bytes_per_pixel()
        };
        let slice_pitch = texture.format.surface_size(width, height);
        let is_volume = texture.kind == TextureKind::D3;
        let (subresource, region) = if is_volume {
            (
                level as u32,
                D3D11_BOX {
                    left: 0,
                    top: 0,
                    front: offset,
                    right: width,
                    bottom: height,
                    back: offset + depth.max(1),
                },
            )
        } else {
            // Subresource index selects the mip within the layer.
            (
                level as u32 + offset * texture.levels as u32,
                D3D11_BOX {
                    left: 0,
                    top: 0,
                    front: 0,
                    right: width,
                    bottom: height,
                    back: 1,
                },
            )
        };
        unsafe {
            self.context.UpdateSubresource(
                &entry.resource,
                subresource,
                Some(&region),
                data.as_ptr() as *const core::ffi::c_void,
                row_pitch,
                slice_pitch,
            );
        }
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
        if let Handle::Id(id) = texture.handle.take() {
            self.registry().textures.remove(&id);
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
        let entry = match desc.stage {
            ShaderStage::Vertex => {
                let mut native = None;
                unsafe {
                    self.device
                        .CreateVertexShader(desc.source, None, Some(&mut native))
                }
                .map_err(|err| GraphicsError::ShaderCompilation(format!("{}", err)))?;
                let native = native
                    .ok_or_else(|| GraphicsError::ShaderCompilation("vertex shader".into()))?;
                ShaderEntry::Vertex(native, desc.source.to_vec())
            }
            ShaderStage::Fragment => {
                let mut native = None;
                unsafe {
                    self.device
                        .CreatePixelShader(desc.source, None, Some(&mut native))
                }
                .map_err(|err| GraphicsError::ShaderCompilation(format!("{}", err)))?;
                let native = native
                    .ok_or_else(|| GraphicsError::ShaderCompilation("pixel shader".into()))?;
                ShaderEntry::Pixel(native)
            }
            ShaderStage::Geometry => {
                let mut native = None;
                unsafe {
                    self.device
                        .CreateGeometryShader(desc.source, None, Some(&mut native))
                }
                .map_err(|err| GraphicsError::ShaderCompilation(format!("{}", err)))?;
                let native = native
                    .ok_or_else(|| GraphicsError::ShaderCompilation("geometry shader".into()))?;
                ShaderEntry::Geometry(native)
            }
        };

        let id = self.alloc_client_id();
        self.registry().shaders.insert(id, entry);
        shader.device = self.id;
        shader.handle = Handle::Id(id);
        shader.stage = desc.stage;
        Ok(())
    }

    fn delete_shader(&self, shader: &mut Shader) {
        if let Handle::Id(id) = shader.handle.take() {
            self.registry().shaders.remove(&id);
        }
    }

    fn create_program(
        &self,
        program: &mut Program,
        desc: &ProgramDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(program.handle.is_none());
        // Bytecode carries register assignments; the named slot routing
        // is not needed. The vertex blob is retained for input layouts.
        let registry = self.registry();
        let bytecode = match registry.shaders.get(&desc.vertex.handle.id()) {
            Some(ShaderEntry::Vertex(_, bytecode)) => bytecode.clone(),
            _ => {
                return Err(GraphicsError::ProgramLink(
                    "vertex stage is not a vertex shader".into(),
                ))
            }
        };
        drop(registry);

        let id = self.alloc_client_id();
        program.device = self.id;
        program.handle = Handle::Id(id);
        program.vertex = desc.vertex.handle;
        program.fragment = desc.fragment.handle;
        program.geometry = desc.geometry.map(|shader| shader.handle).unwrap_or_default();
        program.vertex_bytecode = bytecode;
        self.registry().programs.insert(
            id,
            ProgramEntry {
                vertex: program.vertex,
                fragment: program.fragment,
                geometry: program.geometry,
            },
        );
        Ok(())
    }

    fn delete_program(&self, program: &mut Program) {
        if let Handle::Id(id) = program.handle.take() {
            self.registry().programs.remove(&id);
        }
        program.vertex.take();
        program.fragment.take();
        program.geometry.take();
        program.vertex_bytecode.clear();
    }

    fn bind_uniform_buffer(&self, slot: u32, buffer: &Buffer, size: u32, offset: u32) {
        debug_assert_eq!(buffer.device, self.id);
        debug_assert!((slot as usize) < UNIFORM_SLOTS);
        debug_assert_eq!(offset % 16, 0, "constant bind offsets are in 16-byte units");
        let registry = self.registry();
        let Some(native) = registry.buffers.get(&buffer.handle.id()) else {
            return;
        };
        let buffers = [Some(native.clone())];
        if offset == 0 && size >= buffer.size {
            unsafe {
                self.context.VSSetConstantBuffers(slot, Some(&buffers));
                self.context.PSSetConstantBuffers(slot, Some(&buffers));
            }
            return;
        }
        let Some(context1) = &self.context1 else {
            self.report("offset constant binds need ID3D11DeviceContext1");
            return;
        };
        let first_constant = offset / 16;
        let num_constants = ((size + 15) / 16).max(1);
        unsafe {
            context1.VSSetConstantBuffers1(
                slot,
                Some(&buffers),
                Some(&first_constant),
                Some(&num_constants),
            );
            context1.PSSetConstantBuffers1(
                slot,
                Some(&buffers),
                Some(&first_constant),
                Some(&num_constants),
            );
        }
    }

    fn bind_samplers(&self, first: u32, textures: &mut [Option<&mut Texture>]) {
        let mut srvs = Vec::with_capacity(textures.len());
        let mut samplers = Vec::with_capacity(textures.len());
        {
            let mut registry = self.registry();
            for entry in textures.iter_mut() {
                let Some(texture) = entry else {
                    srvs.push(None);
                    samplers.push(None);
                    continue;
                };
                let Some(native) = registry.textures.get_mut(&texture.handle.id()) else {
                    srvs.push(None);
                    samplers.push(None);
                    continue;
                };
                let srv = self.texture_srv(native);
                let sampler = self.texture_sampler(native, texture);
                if srv.is_some() {
                    texture.view = Lazy::Ready(Handle::None);
                }
                if sampler.is_some() {
                    texture.sampler = Lazy::Ready(Handle::None);
                }
                srvs.push(srv);
                samplers.push(sampler);
            }
        }
        let span = srvs.len().min(SAMPLER_SLOTS - (first as usize).min(SAMPLER_SLOTS));
        if span == 0 {
            return;
        }
        srvs.truncate(span);
        samplers.truncate(span);

        let mut bound = self.bound();
        let srv_raws: Vec<usize> = srvs
            .iter()
            .map(|srv| srv.as_ref().map(raw_of).unwrap_or(0))
            .collect();
        let sampler_raws: Vec<usize> = samplers
            .iter()
            .map(|sampler| sampler.as_ref().map(raw_of).unwrap_or(0))
            .collect();
        let start = first as usize;
        if bound.srvs[start..start + span] != srv_raws[..]
            || bound.samplers[start..start + span] != sampler_raws[..]
        {
            bound.srvs[start..start + span].copy_from_slice(&srv_raws);
            bound.samplers[start..start + span].copy_from_slice(&sampler_raws);
            unsafe {
                self.context.PSSetShaderResources(first, Some(&srvs));
                self.context.PSSetSamplers(first, Some(&samplers));
            }
        }
    }

    fn create_render_target(&self, target: &mut RenderTarget) -> Result<(), GraphicsError> {
        debug_assert!(target.handle.is_none());
        let id = self.alloc_client_id();
        self.registry().targets.insert(
            id,
            TargetEntry {
                colors: Default::default(),
                depth: None,
            },
        );
        target.device = self.id;
        target.handle = Handle::Id(id);
        target.colors = [None; MAX_COLOR_ATTACHMENTS];
        target.depth_stencil = None;
        target.draw_buffers.clear();
        Ok(())
    }

    fn bind_render_target(&self, target: Option<&RenderTarget>) {
        let wanted = target.map(|t| t.handle.id()).unwrap_or(0);
        let mut bound = self.bound();
        if bound.target == wanted {
            return;
        }
        match target {
            None => {
                let views = [Some(self.backbuffer.clone())];
                unsafe {
                    self.context
                        .OMSetRenderTargets(Some(&views), &self.default_depth)
                };
            }
            Some(target) => {
                let registry = self.registry();
                let Some(entry) = registry.targets.get(&wanted) else {
                    return;
                };
                // The draw buffer list picks which attachment points are
                // written, independent of which are occupied.
                let views: Vec<Option<ID3D11RenderTargetView>> = if target.draw_buffers.is_empty() {
                    entry.colors.iter().cloned().take_while(Option::is_some).collect()
                } else {
                    target
                        .draw_buffers
                        .iter()
                        .map(|buffer| match buffer {
                            Attachment::Color(index) => {
                                entry.colors.get(*index as usize).cloned().flatten()
                            }
                            Attachment::DepthStencil => None,
                        })
                        .collect()
                };
                unsafe {
                    self.context
                        .OMSetRenderTargets(Some(&views), entry.depth.as_ref())
                };
            }
        }
        bound.target = wanted;
    }

    fn set_render_target_texture(
        &self,
        target: &mut RenderTarget,
        attachment: Attachment,
        texture: &Texture,
    ) {
        debug_assert_eq!(target.device, self.id);
        let snapshot = AttachmentRef::of(texture);
        let mut registry = self.registry();
        let Some(resource) = registry
            .textures
            .get(&texture.handle.id())
            .map(|entry| entry.resource.clone())
        else {
            return;
        };
        let Some(entry) = registry.targets.get_mut(&target.handle.id()) else {
            return;
        };
        match attachment {
            Attachment::DepthStencil => {
                let mut view = None;
                let created =
                    unsafe { self.device.CreateDepthStencilView(&resource, None, Some(&mut view)) };
                if let Err(err) = created {
                    self.report(&format!("depth-stencil view: {}", err));
                    return;
                }
                entry.depth = view;
                target.depth_stencil = Some(snapshot);
            }
            Attachment::Color(index) => {
                let mut view = None;
                let created =
                    unsafe { self.device.CreateRenderTargetView(&resource, None, Some(&mut view)) };
                if let Err(err) = created {
                    self.report(&format!("render target view: {}", err));
                    return;
                }
                if let Some(slot) = entry.colors.get_mut(index as usize) {
                    *slot = view;
                }
                if let Some(slot) = target.colors.get_mut(index as usize) {
                    *slot = Some(snapshot);
                }
            }
        }
        drop(registry);
        // Force a rebind so the new attachment takes effect.
        let mut bound = self.bound();
        if bound.target == target.handle.id() {
            bound.target = u64::MAX;
        }
    }

    fn set_render_target_draw_buffers(&self, target: &mut RenderTarget, buffers: &[Attachment]) {
        debug_assert_eq!(target.device, self.id);
        target.draw_buffers.clear();
        target.draw_buffers.extend_from_slice(buffers);
        let mut bound = self.bound();
        if bound.target == target.handle.id() {
            bound.target = u64::MAX;
        }
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

        let registry = self.registry();
        let (Some(from), Some(to)) = (
            registry
                .textures
                .get(&src_ref.texture.id())
                .map(|entry| entry.resource.clone()),
            registry
                .textures
                .get(&dst_ref.texture.id())
                .map(|entry| entry.resource.clone()),
        ) else {
            return;
        };
        drop(registry);

        if src_ref.samples > 1 {
            unsafe {
                self.context
                    .ResolveSubresource(&to, 0, &from, 0, convert::format(src_ref.format))
            };
        } else {
            let region = D3D11_BOX {
                left: 0,
                top: 0,
                front: 0,
                right: width,
                bottom: height,
                back: 1,
            };
            unsafe {
                self.context
                    .CopySubresourceRegion(&to, 0, 0, 0, 0, &from, 0, Some(&region))
            };
        }
    }

    fn delete_render_target(&self, target: &mut RenderTarget) {
        if let Handle::Id(id) = target.handle.take() {
            self.registry().targets.remove(&id);
            let mut bound = self.bound();
            if bound.target == id {
                bound.target = u64::MAX;
            }
        }
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
        state.device = self.id;
        state.handle = Handle::Id(self.alloc_client_id());
        state.program = desc.program.handle;
        state.rasterizer = *desc.rasterizer;
        state.depth_stencil = *desc.depth_stencil;
        state.blend = *desc.blend;
        state.layout = *desc.layout;
        Ok(())
    }

    fn bind_pipeline_state(&self, state: &PipelineState) {
        let id = state.handle.id();
        let mut bound = self.bound();
        if bound.pipeline == id {
            return;
        }

        let registry = self.registry();
        let Some(stages) = registry.programs.get(&state.program.id()).copied() else {
            self.report("pipeline references an unknown program");
            return;
        };
        match registry.shaders.get(&stages.vertex.id()) {
            Some(ShaderEntry::Vertex(native, _)) => {
                let raw = raw_of(native);
                if bound.vertex_shader != raw {
                    unsafe { self.context.VSSetShader(native, None) };
                    bound.vertex_shader = raw;
                }
            }
            _ => self.report("pipeline has no vertex shader"),
        }
        match registry.shaders.get(&stages.fragment.id()) {
            Some(ShaderEntry::Pixel(native)) => {
                let raw = raw_of(native);
                if bound.pixel_shader != raw {
                    unsafe { self.context.PSSetShader(native, None) };
                    bound.pixel_shader = raw;
                }
            }
            _ => self.report("pipeline has no pixel shader"),
        }
        match registry.shaders.get(&stages.geometry.id()) {
            Some(ShaderEntry::Geometry(native)) => {
                let raw = raw_of(native);
                if bound.geometry_shader != raw {
                    unsafe { self.context.GSSetShader(native, None) };
                    bound.geometry_shader = raw;
                }
            }
            _ => {
                if bound.geometry_shader != 0 {
                    unsafe {
                        self.context
                            .GSSetShader(None::<&ID3D11GeometryShader>, None)
                    };
                    bound.geometry_shader = 0;
                }
            }
        }

        if let Some(native) = registry.rasterizers.get(&state.rasterizer.handle.id()) {
            let raw = raw_of(native);
            if bound.rasterizer != raw {
                unsafe { self.context.RSSetState(native) };
                bound.rasterizer = raw;
            }
        }
        if let Some(native) = registry.depth_stencils.get(&state.depth_stencil.handle.id()) {
            let raw = raw_of(native);
            if bound.depth_stencil != raw {
                unsafe {
                    self.context
                        .OMSetDepthStencilState(native, state.depth_stencil.desc.stencil_reference)
                };
                bound.depth_stencil = raw;
            }
        }
        if let Some(native) = registry.blends.get(&state.blend.handle.id()) {
            let raw = raw_of(native);
            if bound.blend != raw {
                unsafe {
                    self.context
                        .OMSetBlendState(native, None, u32::MAX)
                };
                bound.blend = raw;
            }
        }
        if let Some(native) = registry.layouts.get(&state.layout.handle.id()) {
            let raw = raw_of(native);
            if bound.layout != raw {
                unsafe { self.context.IASetInputLayout(native) };
                bound.layout = raw;
            }
        }
        bound.pipeline = id;
    }

    fn delete_pipeline_state(&self, state: &mut PipelineState) {
        if let Handle::Id(id) = state.handle.take() {
            let mut bound = self.bound();
            if bound.pipeline == id {
                bound.pipeline = 0;
            }
        }
    }

    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        let viewport = D3D11_VIEWPORT {
            TopLeftX: x as f32,
            TopLeftY: y as f32,
            Width: width as f32,
            Height: height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        unsafe { self.context.RSSetViewports(Some(&[viewport])) };
    }

    fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32) {
        let rect = windows::Win32::Foundation::RECT {
            left: x,
            top: y,
            right: x + width as i32,
            bottom: y + height as i32,
        };
        unsafe { self.context.RSSetScissorRects(Some(&[rect])) };
    }

    fn set_line_width(&self, _width: f32) {
        // Direct3D 11 rasterizes single-pixel lines only.
    }

    fn set_point_size(&self, _size: f32) {
        // Point size comes from the geometry on Direct3D 11.
    }
}
