use glam::Vec2;

/// Re-maps `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// The mapping is linear and not clamped: values outside the input range
/// extrapolate past the output range.
#[inline]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// Rotates `v` counter-clockwise (clockwise on a y-down canvas) by `degrees`.
#[inline]
pub fn rotate_deg(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Unit vector pointing at `degrees` from the +x axis.
#[inline]
pub fn from_angle_deg(degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians())
}
