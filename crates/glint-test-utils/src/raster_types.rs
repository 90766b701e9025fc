//! Plain handle and value types shared by every [`RasterContext`](crate::RasterContext).
//!
//! Handles are small copyable ids. A context owns the resource behind each
//! handle until it is explicitly deleted; dropping a handle releases nothing.

use glam::{Mat4, Vec2, Vec3, Vec4};
use std::fmt;

macro_rules! raster_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw id handed out by a context.
            pub const fn from_raw(id: u32) -> Self {
                Self(id)
            }

            /// The raw id.
            pub const fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

raster_handle!(
    /// A compiled shader stage.
    ShaderHandle
);
raster_handle!(
    /// A linked program (vertex + fragment stage).
    ProgramHandle
);
raster_handle!(
    /// A vertex or index buffer.
    BufferHandle
);
raster_handle!(
    /// Location of a vertex attribute inside a program.
    AttribLocation
);
raster_handle!(
    /// Location of a uniform inside the current program.
    UniformLocation
);

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Binding point a buffer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Array,
    /// Triangle-list indices.
    ElementArray,
}

/// Data uploaded with static usage into the buffer bound at a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferData<'a> {
    Float32(&'a [f32]),
    Uint32(&'a [u32]),
}

impl BufferData<'_> {
    /// Number of scalar elements.
    pub fn len(&self) -> usize {
        match self {
            BufferData::Float32(data) => data.len(),
            BufferData::Uint32(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * 4
    }
}

/// A uniform value as uploaded through one of the shaped upload calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// Number of f32 components.
    pub fn components(&self) -> usize {
        match self {
            UniformValue::Float(_) => 1,
            UniformValue::Vec2(_) => 2,
            UniformValue::Vec3(_) => 3,
            UniformValue::Vec4(_) => 4,
            UniformValue::Mat4(_) => 16,
        }
    }
}

/// Errors reported by a rasterization context.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterError {
    /// A shader stage failed to compile; `log` holds the diagnostic.
    ShaderCompile { stage: ShaderStage, log: String },
    /// Two stages could not be linked into a program.
    ProgramLink { log: String },
    /// The context is gone (never created, or lost).
    ContextUnavailable(String),
    /// A handle was used after deletion or with the wrong context.
    UnknownHandle(&'static str),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::ShaderCompile { stage, log } => {
                write!(f, "Failed to compile {} shader: {}", stage, log)
            }
            RasterError::ProgramLink { log } => write!(f, "Failed to link program: {}", log),
            RasterError::ContextUnavailable(msg) => {
                write!(f, "Rasterization context unavailable: {}", msg)
            }
            RasterError::UnknownHandle(kind) => write!(f, "Unknown {} handle", kind),
        }
    }
}

impl std::error::Error for RasterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_round_trip() {
        let handle = BufferHandle::from_raw(42);
        assert_eq!(handle.raw(), 42);
        assert_ne!(handle, BufferHandle::from_raw(43));
    }

    #[test]
    fn test_buffer_data_sizes() {
        let floats = [0.0f32; 6];
        let data = BufferData::Float32(&floats);
        assert_eq!(data.len(), 6);
        assert_eq!(data.byte_len(), 24);
        assert!(BufferData::Uint32(&[]).is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = RasterError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to compile fragment shader: unexpected token"
        );
    }
}
