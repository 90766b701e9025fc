//! Mock implementation of [`RasterContext`] for testing.
//!
//! The mock keeps just enough state to behave like a real context (bound
//! buffers, current program, enabled attributes, uploaded contents) and
//! records every call, so tests can assert on exactly what a renderer did.

use crate::{raster_context::RasterContext, raster_types::*};
use ahash::{AHashMap, AHashSet};
use glam::{Mat4, Vec2, Vec3, Vec4};
use parking_lot::Mutex;

/// Records a rasterization call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterCall {
    CompileShader { stage: ShaderStage, shader: Option<ShaderHandle> },
    DeleteShader(ShaderHandle),
    LinkProgram { program: Option<ProgramHandle> },
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    CreateBuffer(BufferHandle),
    BindBuffer { target: BufferTarget, buffer: Option<BufferHandle> },
    BufferData { target: BufferTarget, buffer: Option<BufferHandle>, len: usize },
    DeleteBuffer(BufferHandle),
    Uniform { location: UniformLocation, value: UniformValue },
    VertexAttribPointer { location: AttribLocation, components: u32 },
    EnableVertexAttribArray(AttribLocation),
    DisableVertexAttribArray(AttribLocation),
    DrawElements { program: Option<ProgramHandle>, count: u32 },
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    Clear([f32; 4]),
    EnableAlphaBlending,
}

/// Contents of a mock buffer, as last uploaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MockBufferData {
    #[default]
    Empty,
    Float32(Vec<f32>),
    Uint32(Vec<u32>),
}

impl MockBufferData {
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            MockBufferData::Float32(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            MockBufferData::Uint32(data) => Some(data),
            _ => None,
        }
    }
}

/// Snapshot of the state a draw call was issued with.
#[derive(Debug, Clone)]
pub struct MockDraw {
    pub program: ProgramHandle,
    pub index_count: u32,
    pub index_buffer: Option<BufferHandle>,
    /// Enabled attributes by name, with the buffer each one sources from.
    pub attributes: Vec<(String, BufferHandle)>,
    /// Uniform values of the program at draw time, by name.
    pub uniforms: Vec<(String, UniformValue)>,
    pub viewport: Option<[i32; 4]>,
    pub blending: bool,
}

impl MockDraw {
    pub fn attribute(&self, name: &str) -> Option<BufferHandle> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, buffer)| *buffer)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(uniform, _)| uniform == name)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Default)]
struct MockProgram {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: AHashMap<u32, UniformValue>,
}

impl MockProgram {
    fn location_of(names: &mut Vec<String>, name: &str) -> u32 {
        match names.iter().position(|n| n == name) {
            Some(index) => index as u32,
            None => {
                names.push(name.to_string());
                (names.len() - 1) as u32
            }
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    shaders: AHashSet<ShaderHandle>,
    programs: AHashMap<ProgramHandle, MockProgram>,
    buffers: AHashMap<BufferHandle, MockBufferData>,
    bound_array: Option<BufferHandle>,
    bound_elements: Option<BufferHandle>,
    current_program: Option<ProgramHandle>,
    attrib_sources: AHashMap<u32, BufferHandle>,
    enabled_attribs: AHashSet<u32>,
    viewport: Option<[i32; 4]>,
    blending: bool,
    draws: Vec<MockDraw>,

    lost: bool,
    failing_sources: Vec<String>,
    fail_links: bool,
    hidden_names: AHashSet<String>,
}

impl MockState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn bound(&self, target: BufferTarget) -> Option<BufferHandle> {
        match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::ElementArray => self.bound_elements,
        }
    }
}

/// Mock implementation of [`RasterContext`] for testing.
///
/// Every program exposes any attribute or uniform name it is asked about
/// (locations are assigned on first lookup) unless the name was hidden with
/// [`hide_name`](Self::hide_name).
///
/// # Example
///
/// ```rust
/// use glint_test_utils::{MockRasterContext, RasterContext};
///
/// let mock = MockRasterContext::new();
/// let buffer = mock.create_buffer().unwrap();
/// mock.delete_buffer(buffer);
///
/// assert_eq!(mock.count_buffer_creates(), 1);
/// assert_eq!(mock.live_buffer_count(), 0);
/// ```
#[derive(Default)]
pub struct MockRasterContext {
    calls: Mutex<Vec<RasterCall>>,
    state: Mutex<MockState>,
}

impl MockRasterContext {
    pub fn new() -> Self {
        Self::default()
    }

    // Failure injection

    /// Make every compile of a source containing `pattern` fail.
    pub fn fail_shaders_containing(&self, pattern: impl Into<String>) {
        self.state.lock().failing_sources.push(pattern.into());
    }

    /// Make every subsequent link fail.
    pub fn set_fail_links(&self, fail: bool) {
        self.state.lock().fail_links = fail;
    }

    /// Simulate device loss.
    pub fn set_lost(&self, lost: bool) {
        self.state.lock().lost = lost;
    }

    /// Report `name` as absent from every program (attribute and uniform lookups).
    pub fn hide_name(&self, name: impl Into<String>) {
        self.state.lock().hidden_names.insert(name.into());
    }

    // Assertions

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<RasterCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls and draws (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
        self.state.lock().draws.clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn count(&self, predicate: impl Fn(&RasterCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, RasterCall::DrawElements { .. }))
    }

    pub fn count_clears(&self) -> usize {
        self.count(|call| matches!(call, RasterCall::Clear(_)))
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RasterCall::CreateBuffer(_)))
    }

    pub fn count_buffer_deletes(&self) -> usize {
        self.count(|call| matches!(call, RasterCall::DeleteBuffer(_)))
    }

    pub fn count_program_links(&self) -> usize {
        self.count(|call| matches!(call, RasterCall::LinkProgram { program: Some(_) }))
    }

    /// Buffers created and not yet deleted.
    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.lock().programs.len()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<MockBufferData> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    /// Snapshots of all draws since the last [`clear_calls`](Self::clear_calls).
    pub fn draws(&self) -> Vec<MockDraw> {
        self.state.lock().draws.clone()
    }

    fn record(&self, call: RasterCall) {
        self.calls.lock().push(call);
    }
}

impl RasterContext for MockRasterContext {
    fn is_lost(&self) -> bool {
        self.state.lock().lost
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, RasterError> {
        let result = {
            let mut state = self.state.lock();
            if state.lost {
                Err(RasterError::ContextUnavailable("context lost".into()))
            } else if let Some(pattern) = state
                .failing_sources
                .iter()
                .find(|pattern| source.contains(pattern.as_str()))
            {
                Err(RasterError::ShaderCompile {
                    stage,
                    log: format!("mock compile failure on `{}`", pattern),
                })
            } else {
                let shader = ShaderHandle::from_raw(state.next_id());
                state.shaders.insert(shader);
                Ok(shader)
            }
        };
        self.record(RasterCall::CompileShader {
            stage,
            shader: result.as_ref().ok().copied(),
        });
        result
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.state.lock().shaders.remove(&shader);
        self.record(RasterCall::DeleteShader(shader));
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, RasterError> {
        let result = {
            let mut state = self.state.lock();
            if state.fail_links {
                Err(RasterError::ProgramLink {
                    log: "mock link failure".into(),
                })
            } else if !state.shaders.contains(&vertex) || !state.shaders.contains(&fragment) {
                Err(RasterError::UnknownHandle("shader"))
            } else {
                let program = ProgramHandle::from_raw(state.next_id());
                state.programs.insert(program, MockProgram::default());
                Ok(program)
            }
        };
        self.record(RasterCall::LinkProgram {
            program: result.as_ref().ok().copied(),
        });
        result
    }

    fn delete_program(&self, program: ProgramHandle) {
        {
            let mut state = self.state.lock();
            state.programs.remove(&program);
            if state.current_program == Some(program) {
                state.current_program = None;
            }
        }
        self.record(RasterCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.state.lock().current_program = program;
        self.record(RasterCall::UseProgram(program));
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<AttribLocation> {
        let mut state = self.state.lock();
        if state.hidden_names.contains(name) {
            return None;
        }
        let program = state.programs.get_mut(&program)?;
        let location = MockProgram::location_of(&mut program.attributes, name);
        Some(AttribLocation::from_raw(location))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.lock();
        if state.hidden_names.contains(name) {
            return None;
        }
        let program = state.programs.get_mut(&program)?;
        let location = MockProgram::location_of(&mut program.uniforms, name);
        Some(UniformLocation::from_raw(location))
    }

    fn create_buffer(&self) -> Result<BufferHandle, RasterError> {
        let buffer = {
            let mut state = self.state.lock();
            if state.lost {
                return Err(RasterError::ContextUnavailable("context lost".into()));
            }
            let buffer = BufferHandle::from_raw(state.next_id());
            state.buffers.insert(buffer, MockBufferData::Empty);
            buffer
        };
        self.record(RasterCall::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        {
            let mut state = self.state.lock();
            match target {
                BufferTarget::Array => state.bound_array = buffer,
                BufferTarget::ElementArray => state.bound_elements = buffer,
            }
        }
        self.record(RasterCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>) {
        let buffer = {
            let mut state = self.state.lock();
            let buffer = state.bound(target);
            if let Some(contents) = buffer.and_then(|b| state.buffers.get_mut(&b)) {
                *contents = match data {
                    BufferData::Float32(values) => MockBufferData::Float32(values.to_vec()),
                    BufferData::Uint32(values) => MockBufferData::Uint32(values.to_vec()),
                };
            }
            buffer
        };
        self.record(RasterCall::BufferData {
            target,
            buffer,
            len: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        {
            let mut state = self.state.lock();
            state.buffers.remove(&buffer);
            if state.bound_array == Some(buffer) {
                state.bound_array = None;
            }
            if state.bound_elements == Some(buffer) {
                state.bound_elements = None;
            }
            state.attrib_sources.retain(|_, source| *source != buffer);
        }
        self.record(RasterCall::DeleteBuffer(buffer));
    }

    fn uniform1f(&self, location: UniformLocation, value: f32) {
        self.set_uniform(location, UniformValue::Float(value));
    }

    fn uniform2fv(&self, location: UniformLocation, value: Vec2) {
        self.set_uniform(location, UniformValue::Vec2(value));
    }

    fn uniform3fv(&self, location: UniformLocation, value: Vec3) {
        self.set_uniform(location, UniformValue::Vec3(value));
    }

    fn uniform4fv(&self, location: UniformLocation, value: Vec4) {
        self.set_uniform(location, UniformValue::Vec4(value));
    }

    fn uniform_matrix4fv(&self, location: UniformLocation, value: &Mat4) {
        self.set_uniform(location, UniformValue::Mat4(*value));
    }

    fn vertex_attrib_pointer(&self, location: AttribLocation, components: u32) {
        {
            let mut state = self.state.lock();
            if let Some(buffer) = state.bound_array {
                state.attrib_sources.insert(location.raw(), buffer);
            }
        }
        self.record(RasterCall::VertexAttribPointer {
            location,
            components,
        });
    }

    fn enable_vertex_attrib_array(&self, location: AttribLocation) {
        self.state.lock().enabled_attribs.insert(location.raw());
        self.record(RasterCall::EnableVertexAttribArray(location));
    }

    fn disable_vertex_attrib_array(&self, location: AttribLocation) {
        self.state.lock().enabled_attribs.remove(&location.raw());
        self.record(RasterCall::DisableVertexAttribArray(location));
    }

    fn draw_elements(&self, count: u32) {
        let program = {
            let mut state = self.state.lock();
            let current = state.current_program;
            if let Some(handle) = current {
                if let Some(program) = state.programs.get(&handle) {
                    let attributes = program
                        .attributes
                        .iter()
                        .enumerate()
                        .filter(|(location, _)| state.enabled_attribs.contains(&(*location as u32)))
                        .filter_map(|(location, name)| {
                            state
                                .attrib_sources
                                .get(&(location as u32))
                                .map(|buffer| (name.clone(), *buffer))
                        })
                        .collect();
                    let uniforms = program
                        .uniforms
                        .iter()
                        .enumerate()
                        .filter_map(|(location, name)| {
                            program
                                .values
                                .get(&(location as u32))
                                .map(|value| (name.clone(), *value))
                        })
                        .collect();
                    let draw = MockDraw {
                        program: handle,
                        index_count: count,
                        index_buffer: state.bound_elements,
                        attributes,
                        uniforms,
                        viewport: state.viewport,
                        blending: state.blending,
                    };
                    state.draws.push(draw);
                }
            }
            current
        };
        self.record(RasterCall::DrawElements { program, count });
    }

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.state.lock().viewport = Some([x, y, width as i32, height as i32]);
        self.record(RasterCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(RasterCall::Clear(color));
    }

    fn enable_alpha_blending(&self) {
        self.state.lock().blending = true;
        self.record(RasterCall::EnableAlphaBlending);
    }
}

impl MockRasterContext {
    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        {
            let mut state = self.state.lock();
            if let Some(current) = state.current_program {
                if let Some(program) = state.programs.get_mut(&current) {
                    program.values.insert(location.raw(), value);
                }
            }
        }
        self.record(RasterCall::Uniform { location, value });
    }
}
