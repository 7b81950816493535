#![forbid(unsafe_code)]

//! Bindings to the subset of the `phoenix` JS client the viewer uses.

use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "phoenix")]
extern "C" {
    pub type Socket;

    #[wasm_bindgen(constructor)]
    pub fn new(endpoint: &str, opts: &JsValue) -> Socket;

    #[wasm_bindgen(method)]
    pub fn connect(this: &Socket);

    #[wasm_bindgen(method)]
    pub fn channel(this: &Socket, topic: &str, params: &JsValue) -> Channel;

    pub type Channel;

    #[wasm_bindgen(method)]
    pub fn join(this: &Channel) -> Push;

    /// Subscribe to `event`; returns the binding ref.
    #[wasm_bindgen(method)]
    pub fn on(this: &Channel, event: &str, callback: &js_sys::Function) -> f64;

    #[wasm_bindgen(method)]
    pub fn push(this: &Channel, event: &str, payload: &JsValue) -> Push;

    pub type Push;

    /// Register a reply hook (`"ok"`, `"error"`, `"timeout"`).
    #[wasm_bindgen(method)]
    pub fn receive(this: &Push, status: &str, callback: &js_sys::Function) -> Push;
}
