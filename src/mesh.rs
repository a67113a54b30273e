use std::mem::size_of;

use gl::types::{GLenum, GLint, GLsizei, GLuint};

use crate::backend::GlBackend;
use crate::device::{gl_call, Device, GlError};

/// Floats per vertex; positions are 2D.
const COMPONENTS: usize = 2;

#[rustfmt::skip]
pub(crate) const TRIANGLE: Mesh = Mesh {
    name: "triangle",
    positions: &[
        -0.5, -0.5,
         0.0,  0.5,
         0.5, -0.5,
    ],
    indices: None,
};

#[rustfmt::skip]
pub(crate) const QUAD: Mesh = Mesh {
    name: "quad",
    positions: &[
        -0.5, -0.5, // 0
         0.5, -0.5, // 1
         0.5,  0.5, // 2
        -0.5,  0.5, // 3
    ],
    indices: Some(&[
        0, 1, 2,
        2, 3, 0,
    ]),
};

/// Fixed 2D geometry, optionally indexed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Mesh {
    pub name: &'static str,
    pub positions: &'static [f32],
    pub indices: Option<&'static [u32]>,
}

/// The draw submission for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawCall {
    Arrays {
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    },
    Elements {
        mode: GLenum,
        count: GLsizei,
        index_type: GLenum,
    },
}

impl Mesh {
    pub(crate) fn vertex_count(&self) -> usize {
        self.positions.len() / COMPONENTS
    }

    pub(crate) fn draw_call(&self) -> DrawCall {
        match self.indices {
            Some(indices) => DrawCall::Elements {
                mode: gl::TRIANGLES,
                count: indices.len() as GLsizei,
                index_type: gl::UNSIGNED_INT,
            },
            None => DrawCall::Arrays {
                mode: gl::TRIANGLES,
                first: 0,
                count: self.vertex_count() as GLsizei,
            },
        }
    }
}

/// A mesh uploaded into write-once GPU buffers.
#[derive(Debug)]
pub(crate) struct GpuMesh {
    vao: GLuint,
    vbo: GLuint,
    ibo: Option<GLuint>,
    draw: DrawCall,
}

impl GpuMesh {
    pub(crate) fn upload<B: GlBackend>(device: &Device<B>, mesh: &Mesh) -> Result<Self, GlError> {
        let vao = gl_call!(device, |gl| gl.gen_vertex_array())?;
        gl_call!(device, |gl| gl.bind_vertex_array(vao))?;

        let vbo = gl_call!(device, |gl| gl.gen_buffer())?;
        gl_call!(device, |gl| gl.bind_buffer(gl::ARRAY_BUFFER, vbo))?;
        gl_call!(device, |gl| gl.buffer_data(
            gl::ARRAY_BUFFER,
            bytemuck::cast_slice(mesh.positions),
            gl::STATIC_DRAW
        ))?;

        gl_call!(device, |gl| gl.enable_vertex_attrib_array(0))?;
        gl_call!(device, |gl| gl.vertex_attrib_pointer(
            0,
            COMPONENTS as GLint,
            gl::FLOAT,
            false,
            (COMPONENTS * size_of::<f32>()) as GLsizei,
            0
        ))?;

        // The element binding is recorded in the bound vertex array.
        let ibo = match mesh.indices {
            Some(indices) => {
                let ibo = gl_call!(device, |gl| gl.gen_buffer())?;
                gl_call!(device, |gl| gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, ibo))?;
                gl_call!(device, |gl| gl.buffer_data(
                    gl::ELEMENT_ARRAY_BUFFER,
                    bytemuck::cast_slice(indices),
                    gl::STATIC_DRAW
                ))?;
                Some(ibo)
            }
            None => None,
        };

        log::debug!(
            "uploaded {} mesh: {} vertices, {} indices",
            mesh.name,
            mesh.vertex_count(),
            mesh.indices.map_or(0, <[u32]>::len)
        );

        Ok(Self {
            vao,
            vbo,
            ibo,
            draw: mesh.draw_call(),
        })
    }

    pub(crate) fn draw_call(&self) -> DrawCall {
        self.draw
    }

    pub(crate) fn draw<B: GlBackend>(&self, device: &Device<B>) -> Result<(), GlError> {
        gl_call!(device, |gl| gl.bind_vertex_array(self.vao))?;

        match self.draw {
            DrawCall::Arrays { mode, first, count } => {
                gl_call!(device, |gl| gl.draw_arrays(mode, first, count))
            }
            DrawCall::Elements {
                mode,
                count,
                index_type,
            } => gl_call!(device, |gl| gl.draw_elements(mode, count, index_type, 0)),
        }
    }

    pub(crate) fn delete<B: GlBackend>(self, device: &Device<B>) -> Result<(), GlError> {
        if let Some(ibo) = self.ibo {
            gl_call!(device, |gl| gl.delete_buffer(ibo))?;
        }
        gl_call!(device, |gl| gl.delete_buffer(self.vbo))?;
        gl_call!(device, |gl| gl.delete_vertex_array(self.vao))
    }
}
