use crate::types::{Color, Point, Value};

// linearly map a number from one range to another
pub fn remap(s: Value, range_in: [Value; 2], range_out: [Value; 2]) -> Value {
    range_out[0] + (s - range_in[0]) * (range_out[1] - range_out[0]) / (range_in[1] - range_in[0])
}

// Return the interpolation factor t at which the segment v0..v1 reaches iso_val
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    let span = v1 - v0;
    if span == 0.0 {
        return 0.5;
    }
    ((iso_val - v0) / span).clamp(0.0, 1.0)
}

// Linearly interpolate between two points by factor t
pub fn interpolate_points(p0: Point, p1: Point, t: Value) -> Point {
    p0 + (p1 - p0) * t
}

pub fn mix_colors(first: Color, second: Color, t: Value) -> Color {
    first * (1.0 - t) + second * t
}
