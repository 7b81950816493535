#![forbid(unsafe_code)]

use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;

use lifeview_core::clock::from_millis_f64;
use lifeview_core::{ChainId, PlayState, TickCommand, Viewer, ViewerError, WindowMetrics};
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{KeyboardEvent, Performance, Window};

use crate::canvas::CanvasSurface;
use crate::phoenix::{Channel, Socket};
use crate::{logging, options};

/// Everything the JS callbacks share. Callbacks run on the page's single
/// thread, one at a time, so each takes the borrow for its own duration only.
struct Runtime {
    viewer: Viewer<CanvasSurface>,
    channel: Channel,
    window: Window,
    performance: Option<Performance>,
}

type Shared = Rc<RefCell<Runtime>>;

impl Runtime {
    fn now(&self) -> Duration {
        let ms = self
            .performance
            .as_ref()
            .map_or_else(js_sys::Date::now, Performance::now);
        from_millis_f64(ms)
    }
}

fn to_js(err: ViewerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn json_text(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    js_sys::JSON::stringify(value).ok()?.as_string()
}

fn json_value(value: &serde_json::Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or_else(|_| js_sys::Object::new().into())
}

/// Handle returned to JS by [`mount`].
#[wasm_bindgen]
pub struct LifeView {
    shared: Shared,
}

#[wasm_bindgen]
impl LifeView {
    /// Flip play/pause, exactly as a keypress would.
    pub fn toggle(&self) {
        toggle(&self.shared);
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.shared.borrow().viewer.play_state() == PlayState::Ticking
    }

    /// Outbound tick requests sent so far.
    #[wasm_bindgen(js_name = ticksSent)]
    pub fn ticks_sent(&self) -> f64 {
        self.shared.borrow().viewer.tick_stats().ticks_sent as f64
    }
}

/// Calibrate the canvas, connect the socket, join the channel and start
/// listening for keypresses. Call once the DOM is ready.
#[wasm_bindgen]
pub fn mount(opts: Option<JsValue>) -> Result<LifeView, JsValue> {
    console_error_panic_hook::set_once();

    let raw = opts.as_ref().and_then(json_text);
    logging::init(&options::log_filter_hint(raw.as_deref())).map_err(to_js)?;
    let config = options::from_json(raw.as_deref()).map_err(|err| {
        error!(%err, "invalid mount options");
        to_js(err)
    })?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;
    let surface = CanvasSurface::locate(&document, &config.canvas_id).map_err(to_js)?;
    let metrics = WindowMetrics::new(
        window.inner_width()?.as_f64().unwrap_or_default(),
        window.inner_height()?.as_f64().unwrap_or_default(),
        Some(window.device_pixel_ratio()),
    );
    let mut viewer = Viewer::new(surface, metrics, config).map_err(to_js)?;

    let socket = Socket::new(&viewer.config().socket_endpoint, &js_sys::Object::new());
    socket.connect();
    viewer.connect().map_err(to_js)?;
    let channel = socket.channel(
        viewer.session().topic(),
        &json_value(&viewer.session().join_params()),
    );

    let performance = window.performance();
    let shared: Shared = Rc::new(RefCell::new(Runtime {
        viewer,
        channel,
        window,
        performance,
    }));

    join(&shared);
    listen_for_keypress(&shared, &document)?;
    info!("lifeview mounted");
    Ok(LifeView { shared })
}

fn join(shared: &Shared) {
    let on_ok = {
        let shared = Rc::clone(shared);
        Closure::<dyn FnMut(JsValue)>::new(move |reply: JsValue| {
            let text = json_text(&reply).unwrap_or_default();
            let outcome = {
                let mut rt = shared.borrow_mut();
                let now = rt.now();
                rt.viewer.join_ok(&text, now)
            };
            match outcome {
                Ok(outcome) => {
                    if outcome.first_join {
                        subscribe_ticks(&shared);
                    }
                    execute(&shared, outcome.commands);
                }
                Err(err) => error!(%err, "join reply out of sequence"),
            }
        })
    };
    let on_error = {
        let shared = Rc::clone(shared);
        Closure::<dyn FnMut(JsValue)>::new(move |reason: JsValue| {
            let reason = json_text(&reason).unwrap_or_else(|| "unknown".to_owned());
            shared.borrow_mut().viewer.join_error(&reason);
        })
    };

    let rt = shared.borrow();
    rt.channel
        .join()
        .receive("ok", on_ok.as_ref().unchecked_ref())
        .receive("error", on_error.as_ref().unchecked_ref());
    // Hooks stay registered for the page lifetime; the transport replays them
    // on rejoin.
    on_ok.forget();
    on_error.forget();
}

fn subscribe_ticks(shared: &Shared) {
    let on_tick = {
        let shared = Rc::clone(shared);
        Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            let text = json_text(&payload).unwrap_or_default();
            let mut rt = shared.borrow_mut();
            let event = rt.viewer.session().tick_event().to_owned();
            if let Err(err) = rt.viewer.server_push(&event, &text) {
                warn!(%err, "server tick not rendered");
            }
        })
    };
    let rt = shared.borrow();
    rt.channel
        .on(rt.viewer.session().tick_event(), on_tick.as_ref().unchecked_ref());
    on_tick.forget();
}

fn listen_for_keypress(shared: &Shared, document: &web_sys::Document) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no <body>"))?;
    let on_key = {
        let shared = Rc::clone(shared);
        Closure::<dyn FnMut(KeyboardEvent)>::new(move |_event: KeyboardEvent| {
            toggle(&shared);
        })
    };
    body.add_event_listener_with_callback("keypress", on_key.as_ref().unchecked_ref())?;
    on_key.forget();
    Ok(())
}

fn toggle(shared: &Shared) {
    let commands = {
        let mut rt = shared.borrow_mut();
        let now = rt.now();
        rt.viewer.keypress(now)
    };
    execute(shared, commands);
}

fn execute(shared: &Shared, commands: Vec<TickCommand>) {
    for command in commands {
        match command {
            TickCommand::PushTick => {
                let rt = shared.borrow();
                rt.channel
                    .push(rt.viewer.session().tick_event(), &js_sys::Object::new());
            }
            TickCommand::Schedule { chain, delay } => schedule(shared, chain, delay),
        }
    }
}

/// Arm a one-shot `setTimeout` that reports back to the tick chain.
fn schedule(shared: &Shared, chain: ChainId, delay: Duration) {
    let fire = {
        let shared = Rc::clone(shared);
        Closure::once_into_js(move || {
            let commands = {
                let mut rt = shared.borrow_mut();
                let now = rt.now();
                rt.viewer.timer_fired(chain, now)
            };
            execute(&shared, commands);
        })
    };
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let armed = shared
        .borrow()
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(fire.unchecked_ref(), millis);
    if let Err(err) = armed {
        error!(chain = %chain, error = ?err, "setTimeout failed, tick chain stalled");
    }
}
