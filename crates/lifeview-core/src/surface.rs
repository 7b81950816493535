#![forbid(unsafe_code)]

//! Drawing surface abstraction.
//!
//! [`Surface`] is the slice of the HTML canvas + 2D context API the viewer
//! relies on. The browser implements it over `CanvasRenderingContext2d`;
//! [`RasterSurface`] implements it over an in-memory RGBA buffer so rendering
//! can be checked pixel by pixel on native targets.
//!
//! Coordinates passed to `clear_rect`/`fill_rect` are context units: they are
//! multiplied by the accumulated `scale` before hitting the pixel buffer.

use std::collections::HashMap;

/// Canvas + 2D context operations consumed by calibration and rendering.
pub trait Surface {
    /// Read a numeric (possibly vendor-prefixed) property of the 2D context.
    fn context_property(&self, name: &str) -> Option<f64>;

    /// Current pixel-buffer size (`canvas.width`, `canvas.height`).
    fn buffer_size(&self) -> (u32, u32);

    /// Resize the pixel buffer. Like a real canvas, this resets the context
    /// transform and fill style.
    fn set_buffer_size(&mut self, width: u32, height: u32);

    /// Set the CSS (logical) display size in pixels.
    fn set_css_size(&mut self, width: f64, height: f64);

    /// Multiply the context transform by a scale.
    fn scale(&mut self, x: f64, y: f64);

    fn set_fill_style(&mut self, style: &str);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
}

/// Packed `0xRRGGBBAA` color; `0` is a cleared (transparent) pixel.
pub type PackedRgba = u32;

const DEFAULT_FILL: PackedRgba = 0x0000_00FF;
const FRAME_HASH_ALGO: &str = "fnv1a64";
const FNV64_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV64_PRIME: u64 = 0x100000001b3;

/// One recorded draw call, in context units.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear { x: f64, y: f64, w: f64, h: f64 },
    Fill { x: f64, y: f64, w: f64, h: f64 },
}

/// In-memory canvas with a pixel buffer, a scale transform and a draw log.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    css_size: (f64, f64),
    scale: (f64, f64),
    fill: PackedRgba,
    pixels: Vec<PackedRgba>,
    properties: HashMap<String, f64>,
    ops: Vec<DrawOp>,
}

impl RasterSurface {
    /// Create a surface with a `width × height` buffer, matching a freshly
    /// created canvas element.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            css_size: (f64::from(width), f64::from(height)),
            scale: (1.0, 1.0),
            fill: DEFAULT_FILL,
            pixels: vec![0; pixel_count(width, height)],
            properties: HashMap::new(),
            ops: Vec::new(),
        }
    }

    /// Expose a context property, e.g. `webkitBackingStorePixelRatio`.
    #[must_use]
    pub fn with_context_property(mut self, name: &str, value: f64) -> Self {
        self.properties.insert(name.to_owned(), value);
        self
    }

    #[must_use]
    pub const fn css_size(&self) -> (f64, f64) {
        self.css_size
    }

    #[must_use]
    pub const fn transform_scale(&self) -> (f64, f64) {
        self.scale
    }

    #[must_use]
    pub const fn fill_color(&self) -> PackedRgba {
        self.fill
    }

    /// Pixel at buffer coordinates, `None` when out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<PackedRgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Number of non-cleared pixels.
    #[must_use]
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }

    /// Draw calls issued since the last [`Self::take_ops`].
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Deterministic hash of the visible frame (dimensions + pixels).
    #[must_use]
    pub fn frame_hash(&self) -> String {
        let mut hash = FNV64_OFFSET_BASIS;
        hash = fnv1a64_extend(hash, &self.width.to_le_bytes());
        hash = fnv1a64_extend(hash, &self.height.to_le_bytes());
        for px in &self.pixels {
            hash = fnv1a64_extend(hash, &px.to_le_bytes());
        }
        format!("{FRAME_HASH_ALGO}:{hash:016x}")
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Map a context-space rect to a clipped half-open pixel range.
    fn device_span(&self, x: f64, y: f64, w: f64, h: f64) -> Option<(u32, u32, u32, u32)> {
        let (sx, sy) = self.scale;
        let (ax, bx) = ordered(x * sx, (x + w) * sx);
        let (ay, by) = ordered(y * sy, (y + h) * sy);
        let x0 = clip(ax, self.width);
        let x1 = clip(bx, self.width);
        let y0 = clip(ay, self.height);
        let y1 = clip(by, self.height);
        (x0 < x1 && y0 < y1).then_some((x0, x1, y0, y1))
    }

    fn paint(&mut self, x: f64, y: f64, w: f64, h: f64, color: PackedRgba) {
        let Some((x0, x1, y0, y1)) = self.device_span(x, y, w, h) else {
            return;
        };
        for py in y0..y1 {
            let start = self.index(x0, py);
            let end = self.index(x1, py);
            self.pixels[start..end].fill(color);
        }
    }
}

impl Surface for RasterSurface {
    fn context_property(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }

    fn buffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; pixel_count(width, height)];
        self.scale = (1.0, 1.0);
        self.fill = DEFAULT_FILL;
    }

    fn set_css_size(&mut self, width: f64, height: f64) {
        self.css_size = (width, height);
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.scale = (self.scale.0 * x, self.scale.1 * y);
    }

    fn set_fill_style(&mut self, style: &str) {
        // Canvas silently ignores unparseable fill styles.
        if let Some(color) = parse_color(style) {
            self.fill = color;
        }
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::Clear {
            x,
            y,
            w: width,
            h: height,
        });
        self.paint(x, y, width, height, 0);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::Fill {
            x,
            y,
            w: width,
            h: height,
        });
        let fill = self.fill;
        self.paint(x, y, width, height, fill);
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

fn clip(v: f64, max: u32) -> u32 {
    if !v.is_finite() {
        return if v > 0.0 { max } else { 0 };
    }
    v.round().clamp(0.0, f64::from(max)) as u32
}

#[must_use]
fn fnv1a64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// Parse `rgb(r, g, b)` or `#rrggbb` into an opaque packed color.
#[must_use]
pub fn parse_color(style: &str) -> Option<PackedRgba> {
    let style = style.trim();
    if let Some(hex) = style.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let rgb = u32::from_str_radix(hex, 16).ok()?;
        return Some((rgb << 8) | 0xFF);
    }
    let inner = style.strip_prefix("rgb(")?.strip_suffix(')')?;
    let mut channels = inner.split(',').map(|c| c.trim().parse::<u8>());
    let r = channels.next()?.ok()?;
    let g = channels.next()?.ok()?;
    let b = channels.next()?.ok()?;
    if channels.next().is_some() {
        return None;
    }
    Some(u32::from_be_bytes([r, g, b, 0xFF]))
}
