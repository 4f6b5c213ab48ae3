//! Composite math types used by scene attributes.
//!
//! [`Transform`] represents position, rotation, and scale; [`Color`] is an
//! RGBA quadruple. Both are plain value types built on `glam`.

use glam::{EulerRot, Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An RGBA color with `f32` channels.
///
/// Channels are not clamped; HDR values are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from its four channels.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Linearly interpolates between two colors per channel.
    #[must_use]
    pub fn lerp(self, end: Self, t: f32) -> Self {
        Self {
            r: lerp_f32(self.r, end.r, t),
            g: lerp_f32(self.g, end.g, t),
            b: lerp_f32(self.b, end.b, t),
            a: lerp_f32(self.a, end.a, t),
        }
    }
}

/// Position, rotation, and scale of an object in the scene.
///
/// Rotation is stored as Euler angles in degrees (XYZ order), matching the
/// text form `px,py,pz,rx,ry,rz,sx,sy,sz` used by the scene document format.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Rotation as Euler angles, in degrees.
    pub rotation: Vec3,
    /// Per-axis scale factor.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Creates a transform from position, Euler-degree rotation, and scale.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Returns the rotation as a unit quaternion.
    #[must_use]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// Sets the rotation from a unit quaternion, converting to Euler degrees.
    pub fn set_rotation_quat(&mut self, q: Quat) {
        let (x, y, z) = q.to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees());
    }

    /// Interpolates between two transforms.
    ///
    /// Position and scale interpolate linearly; rotation goes through
    /// quaternions and interpolates spherically.
    #[must_use]
    pub fn interpolate(start: &Self, end: &Self, t: f32) -> Self {
        let rotation = start.rotation_quat().slerp(end.rotation_quat(), t);
        let mut out = Self {
            position: start.position.lerp(end.position, t),
            rotation: Vec3::ZERO,
            scale: start.scale.lerp(end.scale, t),
        };
        out.set_rotation_quat(rotation);
        out
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Linear interpolation between two floats.
#[must_use]
pub fn lerp_f32(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}
