use cgmath::Matrix4;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Origin in the middle of the viewport.
pub fn ortho_centered(width: f32, height: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX
        * cgmath::ortho(
            -0.5 * width,
            0.5 * width,
            -0.5 * height,
            0.5 * height,
            near,
            far,
        )
}

/// Origin in the bottom-left corner, y up.
pub fn ortho_bottom_left(width: f32, height: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(0.0, width, 0.0, height, near, far)
}

/// Origin in the top-left corner, y down. Used when drawing into a texture
/// that is sampled later.
pub fn ortho_bottom_left_flipped_y(
    width: f32,
    height: f32,
    near: f32,
    far: f32,
) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(0.0, width, height, 0.0, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector4;

    fn project(m: Matrix4<f32>, x: f32, y: f32) -> (f32, f32) {
        let p = m * Vector4::new(x, y, 0.0, 1.0);
        (p.x / p.w, p.y / p.w)
    }

    #[test]
    fn bottom_left_maps_viewport_corners() {
        let m = ortho_bottom_left(800.0, 600.0, -1.0, 1.0);

        let (x, y) = project(m, 0.0, 0.0);
        assert_relative_eq!(x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(y, -1.0, epsilon = 1e-6);

        let (x, y) = project(m, 800.0, 600.0);
        assert_relative_eq!(x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn flipped_y_puts_origin_at_top() {
        let m = ortho_bottom_left_flipped_y(100.0, 50.0, -1.0, 1.0);
        let (x, y) = project(m, 0.0, 0.0);
        assert_relative_eq!(x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn centered_maps_origin_to_middle() {
        let m = ortho_centered(100.0, 50.0, -1.0, 1.0);
        let (x, y) = project(m, 0.0, 0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn depth_lands_in_wgpu_range() {
        let m = ortho_bottom_left(10.0, 10.0, 0.0, 1.0);
        let near = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let far = m * Vector4::new(0.0, 0.0, -1.0, 1.0);
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-6);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-6);
    }
}
