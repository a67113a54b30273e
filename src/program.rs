use std::error::Error;
use std::fmt;

use gl::types::GLuint;

use crate::backend::GlBackend;
use crate::device::{gl_call, Device, GlError};
use crate::shader_source::{ShaderSource, Stage};

/// A compiled shader stage. Zero is the sentinel left behind by a failed compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShaderId(GLuint);

impl ShaderId {
    pub(crate) const SENTINEL: ShaderId = ShaderId(0);

    pub(crate) fn raw(self) -> GLuint {
        self.0
    }

    pub(crate) fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShaderError {
    Compile { stage: Stage, log: String },
    Gl(GlError),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => {
                write!(f, "failed to compile {stage} shader: {}", log.trim_end())
            }
            ShaderError::Gl(err) => err.fmt(f),
        }
    }
}

impl Error for ShaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ShaderError::Compile { .. } => None,
            ShaderError::Gl(err) => Some(err),
        }
    }
}

impl From<GlError> for ShaderError {
    fn from(err: GlError) -> Self {
        ShaderError::Gl(err)
    }
}

/// Compiles one stage. On failure the stage object is deleted and the
/// compiler's info log is returned. A GL error after the stage object exists
/// deletes it too.
pub(crate) fn compile_shader<B: GlBackend>(
    device: &Device<B>,
    stage: Stage,
    source: &str,
) -> Result<ShaderId, ShaderError> {
    let shader = gl_call!(device, |gl| gl.create_shader(stage.gl_enum()))?;

    match compile_into(device, shader, source) {
        Ok(None) => Ok(ShaderId(shader)),
        Ok(Some(log)) => {
            gl_call!(device, |gl| gl.delete_shader(shader))?;
            Err(ShaderError::Compile { stage, log })
        }
        Err(err) => {
            device.gl().delete_shader(shader);
            Err(err.into())
        }
    }
}

/// Compiles `source` into `shader`; `Some(log)` when the compiler rejects it.
fn compile_into<B: GlBackend>(
    device: &Device<B>,
    shader: GLuint,
    source: &str,
) -> Result<Option<String>, GlError> {
    gl_call!(device, |gl| gl.shader_source(shader, source))?;
    gl_call!(device, |gl| gl.compile_shader(shader))?;

    let status = gl_call!(device, |gl| gl.get_shader_iv(shader, gl::COMPILE_STATUS))?;
    if status != 0 {
        return Ok(None);
    }

    gl_call!(device, |gl| gl.get_shader_info_log(shader)).map(Some)
}

/// Like [`compile_shader`], but a compile failure is logged and turned into
/// [`ShaderId::SENTINEL`] so program creation can carry on.
pub(crate) fn compile_stage<B: GlBackend>(
    device: &Device<B>,
    stage: Stage,
    source: &str,
) -> Result<ShaderId, GlError> {
    match compile_shader(device, stage, source) {
        Ok(shader) => Ok(shader),
        Err(ShaderError::Compile { stage, log }) => {
            log::error!("failed to compile {stage} shader!\n{}", log.trim_end());
            Ok(ShaderId::SENTINEL)
        }
        Err(ShaderError::Gl(err)) => Err(err),
    }
}

/// A linked program object.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Program {
    id: GLuint,
    linked: bool,
}

impl Program {
    /// Compiles both stages, then links and validates them into a new program.
    /// The stage objects are deleted afterwards; linking keeps what it needs.
    ///
    /// A failed compile or link is logged and still yields a program, so the
    /// failure surfaces through GL error checks or an empty frame. A GL error
    /// returns `Err` and leaves no stage or program object behind.
    pub(crate) fn create<B: GlBackend>(
        device: &Device<B>,
        source: &ShaderSource,
    ) -> Result<Self, GlError> {
        let vs = compile_stage(device, Stage::Vertex, source.section(Stage::Vertex))?;
        let fs = compile_stage(device, Stage::Fragment, source.section(Stage::Fragment))
            .inspect_err(|_| device.gl().delete_shader(vs.raw()))?;

        let id = gl_call!(device, |gl| gl.create_program()).inspect_err(|_| {
            device.gl().delete_shader(vs.raw());
            device.gl().delete_shader(fs.raw());
        })?;

        if vs.is_sentinel() || fs.is_sentinel() {
            log::warn!("attaching the sentinel shader to program {id}");
        }

        let linked = Self::link(device, id, vs, fs);
        let released = release_stages(device, [vs, fs]);

        match linked.and_then(|linked| released.map(|()| linked)) {
            Ok(linked) => Ok(Self { id, linked }),
            Err(err) => {
                device.gl().delete_program(id);
                Err(err)
            }
        }
    }

    /// Attaches, links and validates; `Ok(false)` when the link fails.
    fn link<B: GlBackend>(
        device: &Device<B>,
        id: GLuint,
        vs: ShaderId,
        fs: ShaderId,
    ) -> Result<bool, GlError> {
        gl_call!(device, |gl| gl.attach_shader(id, vs.raw()))?;
        gl_call!(device, |gl| gl.attach_shader(id, fs.raw()))?;
        gl_call!(device, |gl| gl.link_program(id))?;
        gl_call!(device, |gl| gl.validate_program(id))?;

        let linked = gl_call!(device, |gl| gl.get_program_iv(id, gl::LINK_STATUS))? != 0;
        if linked {
            log::debug!("linked program {id}");
        } else {
            let log = gl_call!(device, |gl| gl.get_program_info_log(id))?;
            log::error!("failed to link program {id}\n{}", log.trim_end());
        }

        Ok(linked)
    }

    pub(crate) fn id(&self) -> GLuint {
        self.id
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.linked
    }

    pub(crate) fn bind<B: GlBackend>(&self, device: &Device<B>) -> Result<(), GlError> {
        gl_call!(device, |gl| gl.use_program(self.id))
    }

    pub(crate) fn delete<B: GlBackend>(self, device: &Device<B>) -> Result<(), GlError> {
        gl_call!(device, |gl| gl.delete_program(self.id))
    }
}

/// Deletes every stage, even after one of the deletes fails; the first error wins.
fn release_stages<B: GlBackend>(
    device: &Device<B>,
    stages: [ShaderId; 2],
) -> Result<(), GlError> {
    stages.into_iter().fold(Ok(()), |result, stage| {
        let deleted = gl_call!(device, |gl| gl.delete_shader(stage.raw()));
        result.and(deleted)
    })
}
