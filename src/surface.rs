use tiny_skia::{
    Color, ColorU8, FillRule, GradientStop, LineCap, LineJoin, Paint, Path, Pixmap, Point,
    RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    Radial {
        center: Point,
        radius: f32,
        inner: Color,
        outer: Color,
    },
}

/// Drawing target owned by the host and sized through the driver.
///
/// A surface with a zero dimension accepts every call and draws nothing.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    /// Blend `color` over the whole canvas.
    fn fade(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_path(&mut self, path: &Path, fill: &Fill);
    fn stroke_path(&mut self, path: &Path, width: f32, color: Color);

    fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

// --- Raster ---

/// Software canvas backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Option<Pixmap>,
    width: u32,
    height: u32,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            width,
            height,
        }
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Straight-alpha color at (x, y), if inside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<ColorU8> {
        self.pixmap
            .as_ref()
            .and_then(|p| p.pixel(x, y))
            .map(|p| p.demultiply())
    }

    fn paint(shader: Shader<'_>) -> Paint<'_> {
        let mut paint = Paint::default();
        paint.shader = shader;
        paint.anti_alias = true;
        paint
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixmap = Pixmap::new(width, height);
    }

    fn clear(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::TRANSPARENT);
        }
    }

    fn fade(&mut self, color: Color) {
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32) {
            self.fill_rect(rect, color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let mut paint = Self::paint(Shader::SolidColor(color));
        // Rects are axis-aligned; coverage snaps to pixel centres.
        paint.anti_alias = false;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn fill_path(&mut self, path: &Path, fill: &Fill) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let shader = match *fill {
            Fill::Solid(color) => Shader::SolidColor(color),
            Fill::Radial {
                center,
                radius,
                inner,
                outer,
            } => RadialGradient::new(
                center,
                center,
                radius,
                vec![GradientStop::new(0.0, inner), GradientStop::new(1.0, outer)],
                SpreadMode::Pad,
                Transform::identity(),
            )
            .unwrap_or(Shader::SolidColor(inner)),
        };
        let paint = Self::paint(shader);
        pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn stroke_path(&mut self, path: &Path, width: f32, color: Color) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        if !(width.is_finite() && width > 0.0) {
            return;
        }
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let paint = Self::paint(Shader::SolidColor(color));
        pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
    }
}

// --- Recording ---

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Fade(Color),
    FillRect {
        rect: Rect,
        color: Color,
    },
    FillPath {
        bounds: Rect,
        points: Vec<Point>,
        fill: Fill,
    },
    StrokePath {
        bounds: Rect,
        points: Vec<Point>,
        width: f32,
        color: Color,
    },
}

/// Surface that keeps the operations issued to it instead of rasterizing.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    fn record(&mut self, op: DrawOp) {
        if !self.is_degenerate() {
            self.ops.push(op);
        }
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.record(DrawOp::Clear);
    }

    fn fade(&mut self, color: Color) {
        self.record(DrawOp::Fade(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.record(DrawOp::FillRect { rect, color });
    }

    fn fill_path(&mut self, path: &Path, fill: &Fill) {
        self.record(DrawOp::FillPath {
            bounds: path.bounds(),
            points: path.points().to_vec(),
            fill: *fill,
        });
    }

    fn stroke_path(&mut self, path: &Path, width: f32, color: Color) {
        self.record(DrawOp::StrokePath {
            bounds: path.bounds(),
            points: path.points().to_vec(),
            width,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::PathBuilder;

    #[test]
    fn zero_sized_pixmap_is_a_no_op() {
        let mut surface = PixmapSurface::new(0, 0);
        assert!(surface.is_degenerate());
        surface.fade(Color::BLACK);
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, 10.0, 10.0) {
            surface.fill_rect(rect, Color::WHITE);
        }
        assert!(surface.pixmap().is_none());
    }

    #[test]
    fn fill_rect_paints_pixels() {
        let mut surface = PixmapSurface::new(20, 20);
        let rect = Rect::from_xywh(0.0, 10.0, 20.0, 10.0).unwrap();
        surface.fill_rect(rect, Color::WHITE);
        assert_eq!(surface.pixel(5, 15).unwrap().red(), 255);
        assert_eq!(surface.pixel(5, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn sub_pixel_rects_fill_without_panicking() {
        let mut surface = PixmapSurface::new(78, 40);
        let rect = Rect::from_xywh(76.4, 10.0, 1.0, 30.0).unwrap();
        surface.fill_rect(rect, Color::WHITE);
        let covered = (76..78).any(|x| surface.pixel(x, 20).is_some_and(|p| p.alpha() == 255));
        assert!(covered);
    }

    #[test]
    fn resize_replaces_the_pixmap() {
        let mut surface = PixmapSurface::new(10, 10);
        surface.resize(30, 5);
        let pixmap = surface.pixmap().unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (30, 5));
        surface.resize(0, 5);
        assert!(surface.pixmap().is_none());
    }

    #[test]
    fn radial_fill_with_zero_radius_falls_back_to_solid() {
        let mut surface = PixmapSurface::new(8, 8);
        let path = PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, 8.0, 8.0).unwrap());
        surface.fill_path(
            &path,
            &Fill::Radial {
                center: Point::from_xy(4.0, 4.0),
                radius: 0.0,
                inner: Color::WHITE,
                outer: Color::BLACK,
            },
        );
        assert_eq!(surface.pixel(1, 1).unwrap().alpha(), 255);
    }

    #[test]
    fn recording_surface_skips_ops_while_degenerate() {
        let mut surface = RecordingSurface::new(0, 10);
        surface.fade(Color::BLACK);
        assert!(surface.ops().is_empty());
        surface.resize(10, 10);
        surface.fade(Color::BLACK);
        assert_eq!(surface.take_ops(), vec![DrawOp::Fade(Color::BLACK)]);
        assert!(surface.ops().is_empty());
    }
}
