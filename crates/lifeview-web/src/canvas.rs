#![forbid(unsafe_code)]

//! `<canvas>` 2D context as a render [`Surface`].

use lifeview_core::{Result, Surface, ViewerError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Find the canvas with DOM id `id` and acquire its 2D context.
    pub fn locate(document: &Document, id: &str) -> Result<Self> {
        let canvas = document
            .get_element_by_id(id)
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| ViewerError::SurfaceUnavailable(id.to_owned()))?;
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(ViewerError::ContextUnavailable)?;
        Ok(Self { canvas, context })
    }
}

fn log_js_error(op: &'static str, result: core::result::Result<(), JsValue>) {
    if let Err(err) = result {
        tracing::warn!(op, error = ?err, "canvas call failed");
    }
}

impl Surface for CanvasSurface {
    fn context_property(&self, name: &str) -> Option<f64> {
        js_sys::Reflect::get(&self.context, &JsValue::from_str(name))
            .ok()?
            .as_f64()
    }

    fn buffer_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        // Resizing the buffer also resets the context transform and fill.
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn set_css_size(&mut self, width: f64, height: f64) {
        let style = self.canvas.style();
        log_js_error("style.width", style.set_property("width", &format!("{width}px")));
        log_js_error("style.height", style.set_property("height", &format!("{height}px")));
    }

    fn scale(&mut self, x: f64, y: f64) {
        log_js_error("scale", self.context.scale(x, y));
    }

    fn set_fill_style(&mut self, style: &str) {
        self.context.set_fill_style_str(style);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.context.clear_rect(x, y, w, h);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.context.fill_rect(x, y, w, h);
    }
}
