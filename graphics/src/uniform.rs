//! Uniform values and the reserved time placeholders.

use vermeil_core::math::Mat4;

/// A value bound to a named uniform.
///
/// Two reserved placeholder variants exist: [`Time`](Self::Time) and
/// [`DeltaTime`](Self::DeltaTime). They are stored unchanged in the
/// device-global uniform registry and resolved to live numbers when the
/// global scope is bound for a draw - [`Time`](Self::Time) becomes the
/// wrapped `[0, 1)` frame clock value and [`DeltaTime`](Self::DeltaTime)
/// the previous frame's delta in seconds. Every other value passes
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// A single float.
    Float(f32),
    /// A 2-component vector.
    Vec2([f32; 2]),
    /// A 3-component vector.
    Vec3([f32; 3]),
    /// A 4-component vector.
    Vec4([f32; 4]),
    /// A signed integer.
    Int(i32),
    /// A boolean.
    Bool(bool),
    /// A 4x4 matrix, column-major.
    Mat4([f32; 16]),
    /// Reserved placeholder for the wrapped elapsed-time scalar.
    Time,
    /// Reserved placeholder for the previous frame's delta time.
    DeltaTime,
}

impl UniformValue {
    /// Whether this value is one of the reserved time placeholders.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Time | Self::DeltaTime)
    }

    /// Create a matrix value from a [`Mat4`].
    pub fn mat4(m: &Mat4) -> Self {
        let mut values = [0.0; 16];
        values.copy_from_slice(m.as_slice());
        Self::Mat4(values)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
