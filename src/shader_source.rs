use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use gl::types::GLenum;

use crate::shaders::{FRAGMENT_SHADER_SRC, VERTEX_SHADER_SRC};

/// Lines containing this switch the active section.
const MARKER: &str = "#shader";

/// A single shader unit before linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub(crate) fn gl_enum(self) -> GLenum {
        match self {
            Stage::Vertex => gl::VERTEX_SHADER,
            Stage::Fragment => gl::FRAGMENT_SHADER,
        }
    }

    /// The stage named by a marker line, if any.
    fn from_marker(line: &str) -> Option<Self> {
        if line.contains("vertex") {
            Some(Stage::Vertex)
        } else if line.contains("fragment") {
            Some(Stage::Fragment)
        } else {
            None
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// Vertex and fragment source for one program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    /// The position passthrough / solid red pair compiled into the binary.
    pub(crate) fn builtin() -> Self {
        Self {
            vertex: VERTEX_SHADER_SRC.to_owned(),
            fragment: FRAGMENT_SHADER_SRC.to_owned(),
        }
    }

    /// Splits a `#shader vertex` / `#shader fragment` file into its two sections.
    ///
    /// Marker lines are dropped, as is everything before the first marker. A
    /// marker naming neither stage keeps the current section. Every kept line is
    /// terminated with `\n`. Bytes that are not UTF-8 become U+FFFD; they never
    /// cost the rest of the file.
    pub(crate) fn parse(mut reader: impl BufRead) -> io::Result<Self> {
        let mut source = Self::default();
        let mut active = None;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(trim_line_ending(&buf));

            if line.contains(MARKER) {
                if let Some(stage) = Stage::from_marker(&line) {
                    active = Some(stage);
                }
                continue;
            }

            if let Some(stage) = active {
                let section = source.section_mut(stage);
                section.push_str(&line);
                section.push('\n');
            }
        }

        Ok(source)
    }

    /// Reads and splits the file at `path`.
    ///
    /// A file that cannot be opened is logged and yields two empty sections,
    /// which then fail at compile time with a per-stage diagnostic. An I/O error
    /// while reading is treated the same way.
    pub(crate) fn load(path: &Path) -> Self {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                log::error!("failed to open shader file {}: {err}", path.display());
                return Self::default();
            }
        };

        match Self::parse(BufReader::new(file)) {
            Ok(source) => {
                log::debug!(
                    "loaded {}: {} vertex bytes, {} fragment bytes",
                    path.display(),
                    source.vertex.len(),
                    source.fragment.len()
                );
                source
            }
            Err(err) => {
                log::error!("failed to read shader file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub(crate) fn section(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }

    fn section_mut(&mut self, stage: Stage) -> &mut String {
        match stage {
            Stage::Vertex => &mut self.vertex,
            Stage::Fragment => &mut self.fragment,
        }
    }
}

/// Strips one trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
