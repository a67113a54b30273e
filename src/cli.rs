use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::mesh::{Mesh, QUAD, TRIANGLE};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MeshKind {
    Triangle,
    Quad,
}

impl MeshKind {
    pub(crate) fn mesh(self) -> &'static Mesh {
        match self {
            MeshKind::Triangle => &TRIANGLE,
            MeshKind::Quad => &QUAD,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Mesh to draw
    #[arg(short, long, value_enum, default_value_t = MeshKind::Triangle)]
    pub mesh: MeshKind,

    /// Shader file split by `#shader vertex` / `#shader fragment` lines (built-in shaders if omitted)
    #[arg(short, long)]
    pub shader: Option<PathBuf>,

    /// Check the GL error flag around every call and stop at the first error
    #[arg(long)]
    pub check_gl: bool,

    /// Initial width of window
    #[arg(long, default_value = "640")]
    pub width: u32,

    /// Initial height of window
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// Window title
    #[arg(long, default_value = "Hello World")]
    pub title: String,

    /// Log filter in env_logger syntax (falls back to RUST_LOG, then "info")
    #[arg(long)]
    pub log: Option<String>,
}
