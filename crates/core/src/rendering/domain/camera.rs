/// Orthographic camera centred on the video frame.
///
/// Camera space is y-up with the origin at the frame centre, so a frame of
/// `w × h` pixels spans `[-w/2, w/2] × [-h/2, h/2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicCamera {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

impl OrthographicCamera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
        };
        camera.resize(width, height);
        camera
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;
        self.left = -half_w;
        self.right = half_w;
        self.top = half_h;
        self.bottom = -half_h;
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Projects a camera-space point onto a viewport of the given pixel size.
    pub fn to_viewport(&self, x: f32, y: f32, viewport_w: u32, viewport_h: u32) -> (f32, f32) {
        let w = self.width();
        let h = self.height();
        if w <= 0.0 || h <= 0.0 {
            return (0.0, 0.0);
        }
        (
            (x - self.left) / w * viewport_w as f32,
            (self.top - y) / h * viewport_h as f32,
        )
    }
}
