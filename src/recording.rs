//! An in-memory [`GlBackend`] for tests: records every call and emulates the
//! parts of GL state the program inspects (compile/link status, info logs and
//! error flags).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use gl::types::{GLbitfield, GLenum, GLfloat, GLint, GLsizei, GLuint};

use crate::backend::GlBackend;

pub(crate) const COMPILE_ERROR_LOG: &str = "0:1(1): error: syntax error, unexpected end of file";
pub(crate) const LINK_ERROR_LOG: &str = "error: linking with uncompiled/unspecialized shader";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Viewport(GLint, GLint, GLsizei, GLsizei),
    ClearColor(GLfloat, GLfloat, GLfloat, GLfloat),
    Clear(GLbitfield),
    GenBuffer(GLuint),
    BindBuffer(GLenum, GLuint),
    BufferData {
        target: GLenum,
        data: Vec<u8>,
        usage: GLenum,
    },
    DeleteBuffer(GLuint),
    GenVertexArray(GLuint),
    BindVertexArray(GLuint),
    DeleteVertexArray(GLuint),
    EnableVertexAttribArray(GLuint),
    VertexAttribPointer {
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    },
    CreateShader(GLenum, GLuint),
    ShaderSource(GLuint, String),
    CompileShader(GLuint),
    GetShaderInfoLog(GLuint),
    DeleteShader(GLuint),
    CreateProgram(GLuint),
    AttachShader(GLuint, GLuint),
    LinkProgram(GLuint),
    ValidateProgram(GLuint),
    UseProgram(GLuint),
    DeleteProgram(GLuint),
    DrawArrays {
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    },
    DrawElements {
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: usize,
    },
}

#[derive(Debug)]
struct FakeShader {
    ty: GLenum,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct FakeProgram {
    /// `(stage type, compiled)` of every attached shader.
    attached: Vec<(GLenum, bool)>,
    linked: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: GLuint,
    calls: Vec<Call>,
    errors: VecDeque<GLenum>,
    fail_next: Option<GLenum>,
    fail_on: Option<(fn(&Call) -> bool, GLenum)>,
    shaders: HashMap<GLuint, FakeShader>,
    programs: HashMap<GLuint, FakeProgram>,
}

impl State {
    /// Logs `call`; true when an injected failure fired on it.
    fn record(&mut self, call: Call) -> bool {
        let mut code = self.fail_next.take();

        if let Some((matches, fail_code)) = self.fail_on {
            if matches(&call) {
                self.fail_on = None;
                code = Some(fail_code);
            }
        }

        self.calls.push(call);
        self.errors.extend(code);
        code.is_some()
    }

    fn next_id(&mut self) -> GLuint {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingGl {
    state: RefCell<State>,
}

impl RecordingGl {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn draw_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::DrawArrays { .. } | Call::DrawElements { .. }))
            .collect()
    }

    /// Queues an error flag as if an earlier call had raised it.
    pub(crate) fn push_error(&self, code: GLenum) {
        self.state.borrow_mut().errors.push_back(code);
    }

    /// The next recorded call raises `code`.
    pub(crate) fn fail_next(&self, code: GLenum) {
        self.state.borrow_mut().fail_next = Some(code);
    }

    /// The first later call that `matches` raises `code`.
    pub(crate) fn fail_on(&self, matches: fn(&Call) -> bool, code: GLenum) {
        self.state.borrow_mut().fail_on = Some((matches, code));
    }

    pub(crate) fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }
}

impl GlBackend for RecordingGl {
    fn get_error(&self) -> GLenum {
        self.state
            .borrow_mut()
            .errors
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }

    fn get_string(&self, name: GLenum) -> Option<String> {
        (name == gl::VERSION).then(|| "3.3.0 RecordingGl".to_owned())
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        let mut state = self.state.borrow_mut();
        state.record(Call::Viewport(x, y, width, height));

        if width < 0 || height < 0 {
            state.errors.push_back(gl::INVALID_VALUE);
        }
    }

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        self.state
            .borrow_mut()
            .record(Call::ClearColor(red, green, blue, alpha));
    }

    fn clear(&self, mask: GLbitfield) {
        self.state.borrow_mut().record(Call::Clear(mask));
    }

    fn gen_buffer(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.record(Call::GenBuffer(id));
        id
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.state.borrow_mut().record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.state.borrow_mut().record(Call::BufferData {
            target,
            data: data.to_vec(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.state.borrow_mut().record(Call::DeleteBuffer(buffer));
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.record(Call::GenVertexArray(id));
        id
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.state.borrow_mut().record(Call::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        self.state.borrow_mut().record(Call::DeleteVertexArray(vao));
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.state
            .borrow_mut()
            .record(Call::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        self.state.borrow_mut().record(Call::VertexAttribPointer {
            index,
            size,
            ty,
            normalized,
            stride,
            offset,
        });
    }

    fn create_shader(&self, ty: GLenum) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();

        // A failed create yields no object.
        if state.record(Call::CreateShader(ty, id)) {
            return 0;
        }

        state.shaders.insert(
            id,
            FakeShader {
                ty,
                source: String::new(),
                compiled: false,
            },
        );
        id
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.record(Call::ShaderSource(shader, source.to_owned()));

        match state.shaders.get_mut(&shader) {
            Some(s) => s.source = source.to_owned(),
            None => state.errors.push_back(gl::INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.record(Call::CompileShader(shader));

        // Anything with an entry point counts as valid GLSL.
        match state.shaders.get_mut(&shader) {
            Some(s) => s.compiled = s.source.contains("void main"),
            None => state.errors.push_back(gl::INVALID_VALUE),
        }
    }

    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(s) = state.shaders.get(&shader) else {
            state.errors.push_back(gl::INVALID_VALUE);
            return 0;
        };

        match pname {
            gl::COMPILE_STATUS => s.compiled as GLint,
            _ => 0,
        }
    }

    fn get_shader_info_log(&self, shader: GLuint) -> String {
        let mut state = self.state.borrow_mut();
        state.record(Call::GetShaderInfoLog(shader));

        match state.shaders.get(&shader).map(|s| s.compiled) {
            Some(false) => COMPILE_ERROR_LOG.to_owned(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        state.record(Call::DeleteShader(shader));
        state.shaders.remove(&shader);
    }

    fn create_program(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();

        if state.record(Call::CreateProgram(id)) {
            return 0;
        }

        state.programs.insert(id, FakeProgram::default());
        id
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.record(Call::AttachShader(program, shader));

        let stage = state.shaders.get(&shader).map(|s| (s.ty, s.compiled));
        match (stage, state.programs.get_mut(&program)) {
            (Some(stage), Some(p)) => p.attached.push(stage),
            _ => state.errors.push_back(gl::INVALID_VALUE),
        }
    }

    fn link_program(&self, program: GLuint) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.record(Call::LinkProgram(program));

        match state.programs.get_mut(&program) {
            Some(p) => {
                let has = |ty| p.attached.iter().any(|&(t, ok)| t == ty && ok);
                let linked = p.attached.iter().all(|&(_, ok)| ok)
                    && has(gl::VERTEX_SHADER)
                    && has(gl::FRAGMENT_SHADER);
                p.linked = linked;
            }
            None => state.errors.push_back(gl::INVALID_VALUE),
        }
    }

    fn validate_program(&self, program: GLuint) {
        self.state.borrow_mut().record(Call::ValidateProgram(program));
    }

    fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(p) = state.programs.get(&program) else {
            state.errors.push_back(gl::INVALID_VALUE);
            return 0;
        };

        match pname {
            gl::LINK_STATUS => p.linked as GLint,
            _ => 0,
        }
    }

    fn get_program_info_log(&self, program: GLuint) -> String {
        match self.state.borrow().programs.get(&program) {
            Some(p) if !p.linked => LINK_ERROR_LOG.to_owned(),
            _ => String::new(),
        }
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.record(Call::UseProgram(program));

        let usable = program == 0 || state.programs.get(&program).is_some_and(|p| p.linked);
        if !usable {
            state.errors.push_back(gl::INVALID_OPERATION);
        }
    }

    fn delete_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.record(Call::DeleteProgram(program));
        state.programs.remove(&program);
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.state
            .borrow_mut()
            .record(Call::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.state.borrow_mut().record(Call::DrawElements {
            mode,
            count,
            ty,
            offset,
        });
    }
}
