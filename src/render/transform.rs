use kurbo::Affine;

/// Composes the transform used by `Font::print`.
///
/// Equivalent to `translate(ceil x, ceil y) · rotate(angle) · scale(sx, sy)
/// · shear(kx, ky) · translate(-ox, -oy)`.
#[allow(clippy::too_many_arguments)]
pub fn print_transform(
    x: f32,
    y: f32,
    angle: f32,
    sx: f32,
    sy: f32,
    ox: f32,
    oy: f32,
    kx: f32,
    ky: f32,
) -> Affine {
    let shear = Affine::new([1.0, ky as f64, kx as f64, 1.0, 0.0, 0.0]);
    Affine::translate((x.ceil() as f64, y.ceil() as f64))
        * Affine::rotate(angle as f64)
        * Affine::scale_non_uniform(sx as f64, sy as f64)
        * shear
        * Affine::translate((-(ox as f64), -(oy as f64)))
}

/// Active transform plus the saved transforms beneath it.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Affine,
    saved: Vec<Affine>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self {
            current: Affine::IDENTITY,
            saved: Vec::new(),
        }
    }
}

impl TransformStack {
    pub fn push(&mut self, transform: Affine) {
        self.saved.push(self.current);
        self.current = self.current * transform;
    }

    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(previous) => self.current = previous,
            None => tracing::warn!("transform stack underflow; pop ignored"),
        }
    }

    pub fn current(&self) -> Affine {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}
