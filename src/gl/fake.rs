//! In-memory stand-in for a GL context.
//!
//! Compiles like a permissive GLSL front end: a stage compiles when it has a
//! `#version` line and a `main` function and no `#error` directive. Active
//! uniforms come from `uniform <type> <name>;` declarations. Operations a real
//! driver would flag as `GL_INVALID_OPERATION` are collected in `errors`.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::ffi::CStr;

use super::{
    BufferHandle, ClearMask, GraphicsApi, PixelFormat, ProgramHandle, ShaderHandle,
    ShaderStage, TextureHandle, UniformLocation, VertexArrayHandle,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub program: ProgramHandle,
    pub vertex_array: VertexArrayHandle,
    pub first: i32,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttribPointer {
    pub location: u32,
    pub components: i32,
    pub stride: i32,
    pub offset: usize,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureUpload {
    pub width: i32,
    pub height: i32,
    pub format: PixelFormat,
    pub bytes: usize,
    pub mipmapped: bool,
    pub default_parameters: bool,
}

#[derive(Debug)]
struct FakeShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<ShaderHandle>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    values: HashMap<i32, UniformValue>,
    // Deleted while current; freed once another program is used.
    flagged_for_deletion: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u32,
    shaders: HashMap<ShaderHandle, FakeShader>,
    programs: HashMap<ProgramHandle, FakeProgram>,
    current_program: Option<ProgramHandle>,
    use_calls: usize,
    uniform_lookups: usize,
    vertex_arrays: HashMap<VertexArrayHandle, BTreeMap<u32, AttribPointer>>,
    bound_vertex_array: Option<VertexArrayHandle>,
    buffers: HashMap<BufferHandle, Vec<f32>>,
    bound_array_buffer: Option<BufferHandle>,
    textures: HashMap<TextureHandle, Option<TextureUpload>>,
    active_unit: u32,
    unit_bindings: HashMap<u32, TextureHandle>,
    clear_color: [f32; 4],
    clears: Vec<ClearMask>,
    depth_test: bool,
    viewport: Option<(i32, i32)>,
    draws: Vec<DrawCall>,
    errors: Vec<String>,
    fail_next_link: Option<String>,
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn current_linked_program(&mut self, operation: &str) -> Option<ProgramHandle> {
        let Some(handle) = self.current_program else {
            self.errors.push(format!("{operation} with no current program"));
            return None;
        };
        if !self.programs.get(&handle).is_some_and(|p| p.linked) {
            self.errors
                .push(format!("{operation} on unlinked program {}", handle.0));
            return None;
        }
        Some(handle)
    }

    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(handle) = self.current_linked_program("uniform write") else {
            return;
        };
        let in_range = self
            .programs
            .get(&handle)
            .is_some_and(|p| location.0 >= 0 && (location.0 as usize) < p.uniforms.len());
        if !in_range {
            self.errors
                .push(format!("uniform location {} out of range", location.0));
            return;
        }
        if let Some(program) = self.programs.get_mut(&handle) {
            program.values.insert(location.0, value);
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeGl {
    state: RefCell<FakeState>,
}

fn compile_log(source: &str) -> Option<String> {
    for (index, line) in source.lines().enumerate() {
        if let Some(message) = line.trim().strip_prefix("#error") {
            return Some(format!("ERROR: 0:{}: '#error' : {}", index + 1, message.trim()));
        }
    }
    if !source.lines().any(|line| line.trim().starts_with("#version")) {
        return Some("ERROR: 0:1: '' : #version required and missing.".to_string());
    }
    if !source.contains("void main") {
        return Some("ERROR: 0:1: 'main' : function not defined".to_string());
    }
    None
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let mut words = line.trim().trim_end_matches(';').split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("uniform"), Some(_ty), Some(name)) => Some(name.to_string()),
            _ => None,
        }
    })
}

fn truncate_log(log: &str, capacity: usize) -> String {
    let mut end = log.len().min(capacity.saturating_sub(1));
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

impl FakeGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `link_program` fail with `log`.
    pub fn fail_next_link(&self, log: &str) {
        self.state.borrow_mut().fail_next_link = Some(log.to_string());
    }

    /// True while `program` is deleted but still current.
    pub fn program_pending_deletion(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.flagged_for_deletion)
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn use_calls(&self) -> usize {
        self.state.borrow().use_calls
    }

    pub fn uniform_lookups(&self) -> usize {
        self.state.borrow().uniform_lookups
    }

    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let location = program.uniforms.iter().position(|u| u == name)?;
        program.values.get(&(location as i32)).copied()
    }

    pub fn uniform_values(&self, program: ProgramHandle) -> HashMap<i32, UniformValue> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.values.clone())
            .unwrap_or_default()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<f32>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn attributes(&self, vertex_array: VertexArrayHandle) -> Vec<AttribPointer> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .map(|attribs| attribs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.state.borrow().bound_vertex_array
    }

    pub fn texture_upload(&self, texture: TextureHandle) -> Option<TextureUpload> {
        self.state.borrow().textures.get(&texture).cloned().flatten()
    }

    pub fn texture_on_unit(&self, unit: u32) -> Option<TextureHandle> {
        self.state.borrow().unit_bindings.get(&unit).copied()
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    pub fn clears(&self) -> Vec<ClearMask> {
        self.state.borrow().clears.clone()
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.state.borrow().depth_test
    }

    pub fn viewport_size(&self) -> Option<(i32, i32)> {
        self.state.borrow().viewport
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }
}

impl GraphicsApi for FakeGl {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let mut state = self.state.borrow_mut();
        let handle = ShaderHandle(state.next_id());
        state.shaders.insert(
            handle,
            FakeShader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Some(handle)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &CStr) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(entry) => entry.source = source.to_string_lossy().into_owned(),
            None => state.errors.push(format!("source for unknown shader {}", shader.0)),
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.shaders.get_mut(&shader) {
            match compile_log(&entry.source) {
                Some(log) => {
                    entry.compiled = false;
                    entry.log = log;
                }
                None => {
                    entry.compiled = true;
                    entry.log.clear();
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderHandle, capacity: usize) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| truncate_log(&s.log, capacity))
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        let mut state = self.state.borrow_mut();
        let handle = ProgramHandle(state.next_id());
        state.programs.insert(handle, FakeProgram::default());
        Some(handle)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(entry) => entry.attached.push(shader),
            None => state.errors.push(format!("attach to unknown program {}", program.0)),
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        let injected = state.fail_next_link.take();
        let Some(entry) = state.programs.get(&program) else {
            return;
        };

        let mut failure = injected;
        let mut uniforms = Vec::new();
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            let shader = entry
                .attached
                .iter()
                .filter_map(|h| state.shaders.get(h))
                .find(|s| s.stage == stage);
            match shader {
                Some(shader) if shader.compiled => {
                    for name in declared_uniforms(&shader.source) {
                        if !uniforms.contains(&name) {
                            uniforms.push(name);
                        }
                    }
                }
                Some(_) => {
                    failure.get_or_insert_with(|| {
                        format!("error: {stage} shader was not compiled successfully")
                    });
                }
                None => {
                    failure.get_or_insert_with(|| format!("error: no {stage} shader attached"));
                }
            }
        }

        if let Some(entry) = state.programs.get_mut(&program) {
            match failure {
                Some(log) => {
                    entry.linked = false;
                    entry.log = log;
                    entry.uniforms.clear();
                }
                None => {
                    entry.linked = true;
                    entry.log.clear();
                    entry.uniforms = uniforms;
                    entry.values.clear();
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramHandle, capacity: usize) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| truncate_log(&p.log, capacity))
            .unwrap_or_default()
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if state.current_program == Some(program) {
            if let Some(entry) = state.programs.get_mut(&program) {
                entry.flagged_for_deletion = true;
            }
        } else {
            state.programs.remove(&program);
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        state.use_calls += 1;
        if let Some(handle) = program {
            let usable = state
                .programs
                .get(&handle)
                .is_some_and(|p| p.linked && !p.flagged_for_deletion);
            if !usable {
                state.errors.push(format!("use of unusable program {}", handle.0));
                return;
            }
        }
        if let Some(previous) = state.current_program.filter(|p| Some(*p) != program) {
            if state.programs.get(&previous).is_some_and(|p| p.flagged_for_deletion) {
                state.programs.remove(&previous);
            }
        }
        state.current_program = program;
    }

    fn current_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current_program
    }

    fn uniform_location(&self, program: ProgramHandle, name: &CStr) -> Option<UniformLocation> {
        self.state.borrow_mut().uniform_lookups += 1;
        let state = self.state.borrow();
        let entry = state.programs.get(&program).filter(|p| p.linked)?;
        let name = name.to_str().ok()?;
        entry
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|index| UniformLocation(index as i32))
    }

    fn uniform_1i(&self, location: UniformLocation, value: i32) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Int(value));
    }

    fn uniform_1f(&self, location: UniformLocation, value: f32) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Float(value));
    }

    fn uniform_matrix_4f(&self, location: UniformLocation, columns: &[f32; 16]) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Mat4(*columns));
    }

    fn create_vertex_array(&self) -> Option<VertexArrayHandle> {
        let mut state = self.state.borrow_mut();
        let handle = VertexArrayHandle(state.next_id());
        state.vertex_arrays.insert(handle, BTreeMap::new());
        Some(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn create_buffer(&self) -> Option<BufferHandle> {
        let mut state = self.state.borrow_mut();
        let handle = BufferHandle(state.next_id());
        state.buffers.insert(handle, Vec::new());
        Some(handle)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>) {
        self.state.borrow_mut().bound_array_buffer = buffer;
    }

    fn array_buffer_data(&self, data: &[f32]) {
        let mut state = self.state.borrow_mut();
        let Some(bound) = state.bound_array_buffer else {
            state.errors.push("buffer data with no array buffer bound".to_string());
            return;
        };
        state.buffers.insert(bound, data.to_vec());
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        if state.bound_array_buffer == Some(buffer) {
            state.bound_array_buffer = None;
        }
    }

    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: usize) {
        let mut state = self.state.borrow_mut();
        let Some(vertex_array) = state.bound_vertex_array else {
            state.errors.push("attribute pointer with no vertex array bound".to_string());
            return;
        };
        if let Some(attribs) = state.vertex_arrays.get_mut(&vertex_array) {
            attribs.insert(
                location,
                AttribPointer {
                    location,
                    components,
                    stride,
                    offset,
                    enabled: false,
                },
            );
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        let mut state = self.state.borrow_mut();
        let Some(vertex_array) = state.bound_vertex_array else {
            state.errors.push("enable attribute with no vertex array bound".to_string());
            return;
        };
        if let Some(attrib) = state
            .vertex_arrays
            .get_mut(&vertex_array)
            .and_then(|attribs| attribs.get_mut(&location))
        {
            attrib.enabled = true;
        }
    }

    fn create_texture(&self) -> Option<TextureHandle> {
        let mut state = self.state.borrow_mut();
        let handle = TextureHandle(state.next_id());
        state.textures.insert(handle, None);
        Some(handle)
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn bind_texture_2d(&self, texture: Option<TextureHandle>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(handle) => state.unit_bindings.insert(unit, handle),
            None => state.unit_bindings.remove(&unit),
        };
    }

    fn texture_2d_default_parameters(&self) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let Some(bound) = state.unit_bindings.get(&unit).copied() else {
            state.errors.push("texture parameters with no texture bound".to_string());
            return;
        };
        if let Some(slot) = state.textures.get_mut(&bound) {
            let upload = slot.get_or_insert(TextureUpload {
                width: 0,
                height: 0,
                format: PixelFormat::Rgba,
                bytes: 0,
                mipmapped: false,
                default_parameters: false,
            });
            upload.default_parameters = true;
        }
    }

    fn texture_2d_image(&self, width: i32, height: i32, format: PixelFormat, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let Some(bound) = state.unit_bindings.get(&unit).copied() else {
            state.errors.push("texture image with no texture bound".to_string());
            return;
        };
        let expected = width.max(0) as usize * height.max(0) as usize * format.channels();
        if pixels.len() < expected {
            let message = format!("texture image needs {expected} bytes, got {}", pixels.len());
            state.errors.push(message);
            return;
        }
        if let Some(slot) = state.textures.get_mut(&bound) {
            let default_parameters = slot.as_ref().is_some_and(|t| t.default_parameters);
            *slot = Some(TextureUpload {
                width,
                height,
                format,
                bytes: pixels.len(),
                mipmapped: false,
                default_parameters,
            });
        }
    }

    fn generate_mipmap_2d(&self) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let bound = state.unit_bindings.get(&unit).copied();
        let slot = match bound {
            Some(texture) => state.textures.get_mut(&texture),
            None => None,
        };
        if let Some(Some(upload)) = slot {
            upload.mipmapped = true;
            return;
        }
        state
            .errors
            .push("mipmap generation without image".to_string());
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.unit_bindings.retain(|_, bound| *bound != texture);
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.state.borrow_mut().clear_color = color;
    }

    fn clear(&self, mask: ClearMask) {
        self.state.borrow_mut().clears.push(mask);
    }

    fn enable_depth_test(&self) {
        self.state.borrow_mut().depth_test = true;
    }

    fn viewport(&self, width: i32, height: i32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.current_linked_program("draw") else {
            return;
        };
        let Some(vertex_array) = state.bound_vertex_array else {
            state.errors.push("draw with no vertex array bound".to_string());
            return;
        };
        state.draws.push(DrawCall {
            program,
            vertex_array,
            first,
            count,
        });
    }
}
