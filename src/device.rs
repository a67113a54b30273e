use std::error::Error;
use std::fmt;

use gl::types::GLenum;

use crate::backend::GlBackend;

/// Upper bound on error flags drained per check. A lost context keeps reporting
/// errors forever, and GL implementations queue at most one flag per error kind.
const MAX_PENDING_ERRORS: usize = 16;

/// Whether every GL call is bracketed by error-flag checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCheck {
    Off,
    On,
}

/// A GL call that left a non-zero error flag behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GlError {
    pub code: GLenum,
    pub call: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[OpenGL Error] ({:#06x} {}): {} {}:{}",
            self.code,
            error_name(self.code),
            self.call,
            self.file,
            self.line
        )
    }
}

impl Error for GlError {}

pub(crate) fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown",
    }
}

/// Owns the GL backend for the thread the context is current on.
pub(crate) struct Device<B> {
    gl: B,
    check: ErrorCheck,
}

impl<B: GlBackend> Device<B> {
    pub(crate) fn new(gl: B, check: ErrorCheck) -> Self {
        Self { gl, check }
    }

    pub(crate) fn gl(&self) -> &B {
        &self.gl
    }

    /// Runs `f` against the backend. With checks on, stale error flags are
    /// cleared first and the first flag raised by `f` becomes an error naming
    /// `call` and its source location.
    ///
    /// Prefer the [`gl_call!`] macro, which fills in the call site.
    pub(crate) fn checked<T>(
        &self,
        call: &'static str,
        file: &'static str,
        line: u32,
        f: impl FnOnce(&B) -> T,
    ) -> Result<T, GlError> {
        if self.check == ErrorCheck::Off {
            return Ok(f(&self.gl));
        }

        self.clear_errors();
        let value = f(&self.gl);

        match self.gl.get_error() {
            gl::NO_ERROR => Ok(value),
            code => {
                let err = GlError {
                    code,
                    call,
                    file,
                    line,
                };
                log::error!("{err}");

                Err(err)
            }
        }
    }

    fn clear_errors(&self) {
        for _ in 0..MAX_PENDING_ERRORS {
            if self.gl.get_error() == gl::NO_ERROR {
                return;
            }
        }

        log::warn!("GL error flags did not clear after {MAX_PENDING_ERRORS} reads");
    }
}

/// `gl_call!(device, |gl| gl.some_call(..))` runs the call through
/// [`Device::checked`], reporting the call's text, file and line on error.
macro_rules! gl_call {
    ($device:expr, |$gl:ident| $call:expr) => {
        $device.checked(stringify!($call), file!(), line!(), |$gl| $call)
    };
}

pub(crate) use gl_call;
