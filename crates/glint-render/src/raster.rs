//! [`RasterContext`] on top of wgpu.
//!
//! The contract is immediate and stateful while wgpu records command buffers,
//! so this backend captures each `draw_elements` as a snapshot (program,
//! uniform bytes, attribute buffers, viewport, blending) and replays the
//! snapshots into one render pass when [`WgpuRasterContext::flush`] is called.
//! The last flushed frame is retained, so a flush with nothing new recorded
//! repaints it instead of leaving the target undefined.
//! Uniform locations are byte offsets into the program's uniform struct;
//! attribute locations are the WGSL `@location` values.

use crate::context::GraphicsContext;
use crate::reflect::{ProgramLayout, ShaderReflection, link_layout, reflect_wgsl};
use glam::{Mat4, Vec2, Vec3, Vec4};
use glint_core::alloc::{HashMap, HashSet};
use glint_core::profiling::{profile_function, profile_scope};
use glint_test_utils::{
    AttribLocation, BufferData, BufferHandle, BufferTarget, ProgramHandle, RasterContext,
    RasterError, ShaderHandle, ShaderStage, UniformLocation,
};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wgpu::util::DeviceExt;

/// Smallest uniform block handed to a bind group.
const MIN_UNIFORM_BLOCK: u64 = 16;

struct ShaderEntry {
    module: Arc<wgpu::ShaderModule>,
    reflection: ShaderReflection,
}

/// Immutable part of a linked program, shared with recorded draws so a draw
/// survives the deletion of its program until the next flush.
struct LinkedProgram {
    handle: ProgramHandle,
    vertex: Arc<wgpu::ShaderModule>,
    fragment: Arc<wgpu::ShaderModule>,
    layout: ProgramLayout,
}

struct ProgramEntry {
    linked: Arc<LinkedProgram>,
    uniforms: Vec<u8>,
}

#[derive(Default)]
struct BufferEntry {
    gpu: Option<Arc<wgpu::Buffer>>,
    len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramHandle,
    /// `(location, components)` sorted by location.
    attributes: Vec<(u32, u32)>,
    blending: bool,
}

#[derive(Clone)]
struct RecordedDraw {
    program: Arc<LinkedProgram>,
    key: PipelineKey,
    uniforms: Vec<u8>,
    vertex_buffers: Vec<Arc<wgpu::Buffer>>,
    index_buffer: Arc<wgpu::Buffer>,
    index_count: u32,
    viewport: Option<[i32; 4]>,
}

/// A clear color and the draws recorded after it.
#[derive(Default)]
struct Frame {
    clear_color: Option<[f32; 4]>,
    draws: Vec<RecordedDraw>,
}

#[derive(Default)]
struct RasterState {
    next_id: u32,
    shaders: HashMap<ShaderHandle, ShaderEntry>,
    programs: HashMap<ProgramHandle, ProgramEntry>,
    buffers: HashMap<BufferHandle, BufferEntry>,
    current_program: Option<ProgramHandle>,
    array_buffer: Option<BufferHandle>,
    element_buffer: Option<BufferHandle>,
    /// Attribute sources by location: buffer and component count.
    pointers: HashMap<AttribLocation, (BufferHandle, u32)>,
    enabled: HashSet<AttribLocation>,
    viewport: Option<[i32; 4]>,
    blending: bool,
    clear_color: Option<[f32; 4]>,
    draws: Vec<RecordedDraw>,
    /// What the last flush drew.
    retained: Arc<Frame>,
    pipelines: HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
}

impl RasterState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn bound_buffer(&mut self, target: BufferTarget) -> Option<(BufferHandle, &mut BufferEntry)> {
        let handle = match target {
            BufferTarget::Array => self.array_buffer?,
            BufferTarget::ElementArray => self.element_buffer?,
        };
        self.buffers.get_mut(&handle).map(|entry| (handle, entry))
    }
}

/// A wgpu-backed [`RasterContext`] drawing into textures of one format.
///
/// # Example
///
/// ```rust,no_run
/// use glint_render::{GraphicsContext, WgpuRasterContext};
///
/// let graphics = GraphicsContext::new_owned_sync()?;
/// let raster = WgpuRasterContext::new(graphics, wgpu::TextureFormat::Rgba8UnormSrgb);
/// // Hand `raster` to a plot, then once per frame:
/// // raster.flush(&view, (width, height));
/// # Ok::<(), glint_render::GraphicsError>(())
/// ```
pub struct WgpuRasterContext {
    graphics: Arc<GraphicsContext>,
    target_format: wgpu::TextureFormat,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    lost: Arc<AtomicBool>,
    state: Mutex<RasterState>,
}

impl WgpuRasterContext {
    pub fn new(graphics: Arc<GraphicsContext>, target_format: wgpu::TextureFormat) -> Self {
        let device = &graphics.device;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glint Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Glint Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            tracing::error!("Graphics device lost ({:?}): {}", reason, message);
            lost_flag.store(true, Ordering::Release);
        });

        Self {
            graphics,
            target_format,
            bind_group_layout,
            pipeline_layout,
            lost,
            state: Mutex::new(RasterState::default()),
        }
    }

    pub fn graphics(&self) -> &Arc<GraphicsContext> {
        &self.graphics
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Number of draws recorded since the last clear or flush.
    pub fn pending_draws(&self) -> usize {
        self.state.lock().draws.len()
    }

    /// Number of draws the next flush replays if nothing new is recorded.
    pub fn retained_draws(&self) -> usize {
        self.state.lock().retained.draws.len()
    }

    /// Layout of a linked program.
    pub fn program_layout(&self, program: ProgramHandle) -> Option<ProgramLayout> {
        self.state
            .lock()
            .programs
            .get(&program)
            .map(|entry| entry.linked.layout.clone())
    }

    /// Draw the current frame into `target`.
    ///
    /// A recorded clear starts a new frame; draws recorded without one are
    /// appended to the retained frame. With nothing recorded the retained
    /// frame is repainted. The target is always cleared first, to transparent
    /// black if no clear color was ever recorded.
    ///
    /// `size` is the size of `target` in pixels; recorded viewports use a
    /// bottom-left origin and are converted here. Returns the number of draws
    /// submitted.
    pub fn flush(&self, target: &wgpu::TextureView, size: (u32, u32)) -> usize {
        profile_function!();

        if self.is_lost() {
            return 0;
        }

        let mut state = self.state.lock();
        let recorded = std::mem::take(&mut state.draws);
        if let Some(clear_color) = state.clear_color.take() {
            state.retained = Arc::new(Frame {
                clear_color: Some(clear_color),
                draws: recorded,
            });
        } else if !recorded.is_empty() {
            let mut draws = state.retained.draws.clone();
            draws.extend(recorded);
            state.retained = Arc::new(Frame {
                clear_color: state.retained.clear_color,
                draws,
            });
        }
        let frame = state.retained.clone();
        let draws = &frame.draws;

        let device = &self.graphics.device;
        let alignment = u64::from(self.graphics.min_uniform_buffer_offset_alignment()).max(1);

        // One uniform buffer for the frame, one aligned block per draw.
        let binding_size = draws
            .iter()
            .map(|draw| (draw.uniforms.len() as u64).max(MIN_UNIFORM_BLOCK))
            .max()
            .unwrap_or(MIN_UNIFORM_BLOCK);
        let mut offsets = Vec::with_capacity(draws.len());
        let mut uniform_bytes: Vec<u8> = Vec::new();
        for draw in draws {
            let offset = uniform_bytes.len() as u64;
            offsets.push(offset as u32);
            uniform_bytes.extend_from_slice(&draw.uniforms);
            let end = (offset + binding_size).div_ceil(alignment) * alignment;
            uniform_bytes.resize(end as usize, 0);
        }
        uniform_bytes.resize(uniform_bytes.len().max(binding_size as usize), 0);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Glint Uniform Buffer"),
            contents: &uniform_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glint Uniform Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(binding_size),
                }),
            }],
        });

        let pipelines: Vec<Arc<wgpu::RenderPipeline>> = {
            profile_scope!("resolve_pipelines");
            draws
                .iter()
                .map(|draw| {
                    if let Some(pipeline) = state.pipelines.get(&draw.key) {
                        return pipeline.clone();
                    }
                    let pipeline = Arc::new(self.build_pipeline(&draw.program, &draw.key));
                    if state.programs.contains_key(&draw.key.program) {
                        state.pipelines.insert(draw.key.clone(), pipeline.clone());
                    }
                    pipeline
                })
                .collect()
        };
        drop(state);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Glint Plot Encoder"),
        });

        let mut submitted = 0;
        {
            let load = match frame.clear_color {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                None => wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glint Plot Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for ((draw, pipeline), offset) in draws.iter().zip(&pipelines).zip(&offsets) {
                let Some(rect) = target_viewport(draw.viewport, size) else {
                    tracing::trace!("Skipping draw with empty viewport {:?}", draw.viewport);
                    continue;
                };
                let [x, y, width, height] = rect.viewport;
                pass.set_viewport(x, y, width, height, 0.0, 1.0);
                let [x, y, width, height] = rect.scissor;
                pass.set_scissor_rect(x, y, width, height);
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &bind_group, &[*offset]);
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
                submitted += 1;
            }
        }

        self.graphics.queue.submit(std::iter::once(encoder.finish()));
        submitted
    }

    fn build_pipeline(&self, program: &LinkedProgram, key: &PipelineKey) -> wgpu::RenderPipeline {
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .attributes
            .iter()
            .map(|&(location, components)| {
                [wgpu::VertexAttribute {
                    format: vertex_format(components).unwrap_or(wgpu::VertexFormat::Float32x2),
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = key
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(&(_, components), attribute)| wgpu::VertexBufferLayout {
                array_stride: u64::from(components) * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        self.graphics
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Glint Material Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(program.layout.vertex_entry.as_str()),
                    buffers: &buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(program.layout.fragment_entry.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: key.blending.then_some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    /// Run `f` inside a validation error scope.
    fn validated<T>(&self, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        let device = &self.graphics.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let error = pollster::block_on(device.pop_error_scope());
        (value, error)
    }

    fn write_uniform(&self, location: UniformLocation, bytes: &[u8]) {
        let mut state = self.state.lock();
        let Some(program) = state.current_program else {
            tracing::warn!("Uniform upload without a current program");
            return;
        };
        let Some(entry) = state.programs.get_mut(&program) else {
            return;
        };
        let offset = location.raw();
        let Some(member) = entry
            .linked
            .layout
            .uniforms
            .iter()
            .find(|member| member.offset == offset)
        else {
            tracing::warn!("No uniform at offset {} in program {:?}", offset, program);
            return;
        };
        if bytes.len() > member.size as usize {
            tracing::warn!(
                "Uniform '{}' holds {} bytes, got {}",
                member.name,
                member.size,
                bytes.len()
            );
            return;
        }
        let start = offset as usize;
        entry.uniforms[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl RasterContext for WgpuRasterContext {
    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, RasterError> {
        profile_function!();

        if self.is_lost() {
            return Err(RasterError::ContextUnavailable("device lost".to_string()));
        }

        let reflection = reflect_wgsl(stage, source)?;
        let (module, error) = self.validated(|| {
            self.graphics
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Glint Material Shader"),
                    source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_string())),
                })
        });
        if let Some(error) = error {
            return Err(RasterError::ShaderCompile {
                stage,
                log: error.to_string(),
            });
        }

        let mut state = self.state.lock();
        let handle = ShaderHandle::from_raw(state.next_id());
        state.shaders.insert(
            handle,
            ShaderEntry {
                module: Arc::new(module),
                reflection,
            },
        );
        Ok(handle)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.state.lock().shaders.remove(&shader);
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, RasterError> {
        profile_function!();

        if self.is_lost() {
            return Err(RasterError::ContextUnavailable("device lost".to_string()));
        }

        let (vertex_module, fragment_module, layout) = {
            let state = self.state.lock();
            let vs = state
                .shaders
                .get(&vertex)
                .ok_or(RasterError::UnknownHandle("shader"))?;
            let fs = state
                .shaders
                .get(&fragment)
                .ok_or(RasterError::UnknownHandle("shader"))?;
            (
                vs.module.clone(),
                fs.module.clone(),
                link_layout(&vs.reflection, &fs.reflection)?,
            )
        };

        let handle = ProgramHandle::from_raw(self.state.lock().next_id());
        let linked = Arc::new(LinkedProgram {
            handle,
            vertex: vertex_module,
            fragment: fragment_module,
            layout,
        });

        // Build the pipeline for the reflected inputs now so interface
        // mismatches surface as link errors instead of at draw time.
        let key = PipelineKey {
            program: handle,
            attributes: linked
                .layout
                .attributes
                .iter()
                .map(|input| (input.location, input.components))
                .collect(),
            blending: true,
        };
        let (pipeline, error) = self.validated(|| self.build_pipeline(&linked, &key));
        if let Some(error) = error {
            return Err(RasterError::ProgramLink {
                log: error.to_string(),
            });
        }

        let uniform_len = (linked.layout.uniform_size as usize).max(MIN_UNIFORM_BLOCK as usize);
        let mut state = self.state.lock();
        state.pipelines.insert(key, Arc::new(pipeline));
        state.programs.insert(
            handle,
            ProgramEntry {
                linked,
                uniforms: vec![0; uniform_len],
            },
        );
        tracing::debug!("Linked program {:?}", handle);
        Ok(handle)
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        state.programs.remove(&program);
        state.pipelines.retain(|key, _| key.program != program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.state.lock().current_program = program;
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<AttribLocation> {
        let state = self.state.lock();
        let input = state.programs.get(&program)?.linked.layout.attribute(name)?;
        Some(AttribLocation::from_raw(input.location))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.lock();
        let member = state.programs.get(&program)?.linked.layout.uniform(name)?;
        Some(UniformLocation::from_raw(member.offset))
    }

    fn create_buffer(&self) -> Result<BufferHandle, RasterError> {
        if self.is_lost() {
            return Err(RasterError::ContextUnavailable("device lost".to_string()));
        }
        let mut state = self.state.lock();
        let handle = BufferHandle::from_raw(state.next_id());
        state.buffers.insert(handle, BufferEntry::default());
        Ok(handle)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let mut state = self.state.lock();
        match target {
            BufferTarget::Array => state.array_buffer = buffer,
            BufferTarget::ElementArray => state.element_buffer = buffer,
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>) {
        let (contents, usage): (&[u8], _) = match (target, data) {
            (BufferTarget::Array, BufferData::Float32(values)) => {
                (bytemuck::cast_slice(values), wgpu::BufferUsages::VERTEX)
            }
            (BufferTarget::ElementArray, BufferData::Uint32(values)) => {
                (bytemuck::cast_slice(values), wgpu::BufferUsages::INDEX)
            }
            (target, data) => {
                tracing::warn!("Unsupported upload {:?} to {:?}", data, target);
                return;
            }
        };

        let mut state = self.state.lock();
        let Some((handle, entry)) = state.bound_buffer(target) else {
            tracing::warn!("buffer_data with nothing bound at {:?}", target);
            return;
        };

        entry.len = data.len();
        entry.gpu = if contents.is_empty() {
            None
        } else {
            tracing::trace!("Uploading {} bytes to buffer {:?}", contents.len(), handle);
            Some(Arc::new(self.graphics.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Glint Material Buffer"),
                    contents,
                    usage,
                },
            )))
        };
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        state.buffers.remove(&buffer);
        if state.array_buffer == Some(buffer) {
            state.array_buffer = None;
        }
        if state.element_buffer == Some(buffer) {
            state.element_buffer = None;
        }
        state.pointers.retain(|_, (source, _)| *source != buffer);
    }

    fn uniform1f(&self, location: UniformLocation, value: f32) {
        self.write_uniform(location, bytemuck::bytes_of(&value));
    }

    fn uniform2fv(&self, location: UniformLocation, value: Vec2) {
        self.write_uniform(location, bytemuck::bytes_of(&value));
    }

    fn uniform3fv(&self, location: UniformLocation, value: Vec3) {
        self.write_uniform(location, bytemuck::bytes_of(&value));
    }

    fn uniform4fv(&self, location: UniformLocation, value: Vec4) {
        self.write_uniform(location, bytemuck::bytes_of(&value));
    }

    fn uniform_matrix4fv(&self, location: UniformLocation, value: &Mat4) {
        let columns = value.to_cols_array();
        self.write_uniform(location, bytemuck::cast_slice(&columns));
    }

    fn vertex_attrib_pointer(&self, location: AttribLocation, components: u32) {
        let mut state = self.state.lock();
        match state.array_buffer {
            Some(buffer) => {
                state.pointers.insert(location, (buffer, components));
            }
            None => tracing::warn!("vertex_attrib_pointer with no array buffer bound"),
        }
    }

    fn enable_vertex_attrib_array(&self, location: AttribLocation) {
        self.state.lock().enabled.insert(location);
    }

    fn disable_vertex_attrib_array(&self, location: AttribLocation) {
        self.state.lock().enabled.remove(&location);
    }

    fn draw_elements(&self, count: u32) {
        profile_function!();

        let mut state = self.state.lock();
        let Some(program) = state.current_program else {
            tracing::warn!("draw_elements without a current program");
            return;
        };
        let Some(entry) = state.programs.get(&program) else {
            return;
        };

        let mut attributes = Vec::with_capacity(entry.linked.layout.attributes.len());
        let mut vertex_buffers = Vec::with_capacity(attributes.capacity());
        for input in &entry.linked.layout.attributes {
            let location = AttribLocation::from_raw(input.location);
            let source = state
                .enabled
                .contains(&location)
                .then(|| state.pointers.get(&location))
                .flatten()
                .and_then(|(buffer, components)| {
                    let gpu = state.buffers.get(buffer)?.gpu.clone()?;
                    vertex_format(*components)?;
                    Some((gpu, *components))
                });
            let Some((gpu, components)) = source else {
                tracing::warn!(
                    "Skipping draw: attribute '{}' has no enabled buffer",
                    input.name
                );
                return;
            };
            attributes.push((input.location, components));
            vertex_buffers.push(gpu);
        }

        let Some(indices) = state.element_buffer.and_then(|buffer| state.buffers.get(&buffer))
        else {
            tracing::warn!("Skipping draw: no element buffer bound");
            return;
        };
        let Some(index_buffer) = indices.gpu.clone() else {
            return;
        };
        let index_count = count.min(indices.len as u32);

        let draw = RecordedDraw {
            program: entry.linked.clone(),
            key: PipelineKey {
                program: entry.linked.handle,
                attributes,
                blending: state.blending,
            },
            uniforms: entry.uniforms.clone(),
            vertex_buffers,
            index_buffer,
            index_count,
            viewport: state.viewport,
        };
        state.draws.push(draw);
    }

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.state.lock().viewport = Some([x, y, width as i32, height as i32]);
    }

    fn clear(&self, color: [f32; 4]) {
        let mut state = self.state.lock();
        state.draws.clear();
        state.clear_color = Some(color);
    }

    fn enable_alpha_blending(&self) {
        self.state.lock().blending = true;
    }
}

impl std::fmt::Debug for WgpuRasterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WgpuRasterContext")
            .field("target_format", &self.target_format)
            .field("programs", &state.programs.len())
            .field("buffers", &state.buffers.len())
            .field("pending_draws", &state.draws.len())
            .field("retained_draws", &state.retained.draws.len())
            .field("lost", &self.is_lost())
            .finish()
    }
}

fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// A recorded viewport in target coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TargetRect {
    /// The full viewport, which may extend past the target.
    viewport: [f32; 4],
    /// The part of the viewport inside the target.
    scissor: [u32; 4],
}

/// Convert a bottom-left-origin viewport to wgpu's top-left origin.
///
/// The viewport keeps its size so the NDC mapping is unchanged; the scissor
/// cuts it to the target. `None` covers the whole target, and a viewport
/// with nothing inside the target yields `None`.
fn target_viewport(viewport: Option<[i32; 4]>, (width, height): (u32, u32)) -> Option<TargetRect> {
    let [x, y, w, h] = viewport.unwrap_or([0, 0, width as i32, height as i32]);
    let (target_w, target_h) = (width as i32, height as i32);

    let left = x.clamp(0, target_w);
    let right = x.saturating_add(w).clamp(0, target_w);
    let bottom = y.clamp(0, target_h);
    let top = y.saturating_add(h).clamp(0, target_h);
    if right <= left || top <= bottom {
        return None;
    }

    Some(TargetRect {
        viewport: [
            x as f32,
            (target_h - y.saturating_add(h)) as f32,
            w as f32,
            h as f32,
        ],
        scissor: [
            left as u32,
            (target_h - top) as u32,
            (right - left) as u32,
            (top - bottom) as u32,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_flips_to_top_left() {
        // Plot area 40px from the left, 30px from the bottom of a 400x300 target.
        assert_eq!(
            target_viewport(Some([40, 30, 350, 260]), (400, 300)),
            Some(TargetRect {
                viewport: [40.0, 10.0, 350.0, 260.0],
                scissor: [40, 10, 350, 260],
            })
        );
    }

    #[test]
    fn test_viewport_defaults_to_target() {
        assert_eq!(
            target_viewport(None, (800, 600)),
            Some(TargetRect {
                viewport: [0.0, 0.0, 800.0, 600.0],
                scissor: [0, 0, 800, 600],
            })
        );
    }

    #[test]
    fn test_oversized_viewport_is_scissored() {
        // Half the viewport hangs off the bottom-left corner; its size and
        // therefore its mapping stay the same.
        assert_eq!(
            target_viewport(Some([-10, -10, 50, 50]), (100, 100)),
            Some(TargetRect {
                viewport: [-10.0, 60.0, 50.0, 50.0],
                scissor: [0, 60, 40, 40],
            })
        );
        assert_eq!(
            target_viewport(Some([0, 0, 200, 100]), (100, 100)),
            Some(TargetRect {
                viewport: [0.0, 0.0, 200.0, 100.0],
                scissor: [0, 0, 100, 100],
            })
        );
    }

    #[test]
    fn test_empty_viewport() {
        assert_eq!(target_viewport(Some([10, 10, 0, 20]), (100, 100)), None);
        assert_eq!(target_viewport(Some([200, 0, 10, 10]), (100, 100)), None);
    }

    #[test]
    fn test_vertex_formats() {
        assert_eq!(vertex_format(2), Some(wgpu::VertexFormat::Float32x2));
        assert_eq!(vertex_format(0), None);
        assert_eq!(vertex_format(5), None);
    }
}
