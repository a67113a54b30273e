use gl::types::GLsizei;

use crate::backend::GlBackend;
use crate::device::{gl_call, Device, GlError};
use crate::mesh::{GpuMesh, Mesh};
use crate::program::Program;
use crate::shader_source::ShaderSource;

/// Draws one mesh with one program, every frame.
pub(crate) struct Renderer {
    mesh: GpuMesh,
    program: Program,
    clear_color: (f32, f32, f32),
}

impl Renderer {
    /// Uploads `mesh`, builds the program from `source` and makes it current for
    /// the rest of the run.
    pub(crate) fn new<B: GlBackend>(
        device: &Device<B>,
        mesh: &Mesh,
        source: &ShaderSource,
    ) -> Result<Self, GlError> {
        let mesh = GpuMesh::upload(device, mesh)?;
        let program = Program::create(device, source)?;
        program.bind(device)?;

        if program.is_linked() {
            log::debug!("drawing {:?} with program {}", mesh.draw_call(), program.id());
        } else {
            log::warn!("program {} failed to link; frames will be empty", program.id());
        }

        Ok(Self {
            mesh,
            program,
            clear_color: (0.0, 0.0, 0.0),
        })
    }

    pub(crate) fn render<B: GlBackend>(&self, device: &Device<B>) -> Result<(), GlError> {
        let (r, g, b) = self.clear_color;

        gl_call!(device, |gl| gl.clear_color(r, g, b, 1.0))?;
        gl_call!(device, |gl| gl.clear(gl::COLOR_BUFFER_BIT))?;

        self.mesh.draw(device)
    }

    pub(crate) fn resize<B: GlBackend>(
        &self,
        device: &Device<B>,
        width: u32,
        height: u32,
    ) -> Result<(), GlError> {
        gl_call!(device, |gl| gl.viewport(
            0,
            0,
            width as GLsizei,
            height as GLsizei
        ))
    }

    /// Releases the program and buffers. The context must still be current.
    pub(crate) fn destroy<B: GlBackend>(self, device: &Device<B>) -> Result<(), GlError> {
        gl_call!(device, |gl| gl.use_program(0))?;
        self.program.delete(device)?;
        self.mesh.delete(device)
    }
}
