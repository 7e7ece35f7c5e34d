#![forbid(unsafe_code)]

//! `wasm-bindgen` exports.
//!
//! Two ways in: [`FlipbookRunner`] is host-driven (JS feeds time and input,
//! reads JSON patches back), while [`mount`] binds a runner directly onto
//! the page markup and drives it from `requestAnimationFrame`. Only compiled
//! on `wasm32` targets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use flipbook_core::{Event, Flipbook, Zone};
use flipbook_web::input_parser::parse_key_code;
use flipbook_web::patch::DomPatch;
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, EventTarget, HtmlAudioElement, HtmlElement, HtmlInputElement,
    KeyboardEvent, MouseEvent, Window,
};

use super::runner_core::{MountOptions, RunnerCore, RunnerError, with_slot};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn install_tracing() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(tracing_wasm::set_as_global_default);
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn logs_to_js(logs: Vec<String>) -> Array {
    let arr = Array::new();
    for line in logs {
        arr.push(&JsValue::from_str(&line));
    }
    arr
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
    install_tracing();
}

// ---------------------------------------------------------------------------
// Host-driven runner
// ---------------------------------------------------------------------------

/// Flipbook runner driven entirely by the JS host.
#[wasm_bindgen]
pub struct FlipbookRunner {
    inner: RunnerCore,
}

#[wasm_bindgen]
impl FlipbookRunner {
    /// Create a runner from a JSON array of page tags (`null` for untagged
    /// pages) and an optional JSON config.
    #[wasm_bindgen(constructor)]
    pub fn new(tags_json: &str, config_json: Option<String>) -> Result<FlipbookRunner, JsValue> {
        install_panic_hook();
        RunnerCore::from_json(tags_json, config_json.as_deref())
            .map(|inner| Self { inner })
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn init(&mut self) {
        self.inner.init();
    }

    /// Advance the clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, dt_ms: f64) {
        self.inner.advance_time_ms(dt_ms);
    }

    /// Set the clock to absolute milliseconds.
    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&mut self, ts_ms: f64) {
        self.inner.set_time_ms(ts_ms);
    }

    /// Queue one JSON-encoded input. Returns `false` if it was rejected.
    #[wasm_bindgen(js_name = pushEncodedInput)]
    pub fn push_encoded_input(&mut self, json: &str) -> bool {
        self.inner.push_encoded_input(json)
    }

    /// Process pending input and timers.
    /// Returns `{ running, rendered, events_processed, tasks_fired, frame_idx }`.
    pub fn step(&mut self) -> JsValue {
        let result = self.inner.step();
        let obj = Object::new();
        set_js(&obj, "running", result.running.into());
        set_js(&obj, "rendered", result.rendered.into());
        set_js(&obj, "events_processed", result.events_processed.into());
        set_js(&obj, "tasks_fired", result.tasks_fired.into());
        set_js(
            &obj,
            "frame_idx",
            JsValue::from_f64(self.inner.frame_idx() as f64),
        );
        obj.into()
    }

    /// Drain pending DOM patches as a JSON array.
    #[wasm_bindgen(js_name = takePatchesJson)]
    pub fn take_patches_json(&mut self) -> String {
        self.inner.take_patches_json()
    }

    #[wasm_bindgen(js_name = takeLogs)]
    pub fn take_logs(&mut self) -> Array {
        logs_to_js(self.inner.take_logs())
    }

    /// Queue a navigation: `"next"` or `"prev"`.
    pub fn navigate(&mut self, direction: &str) -> bool {
        self.inner.navigate(direction)
    }

    #[wasm_bindgen(js_name = applyFilter)]
    pub fn apply_filter(&mut self, term: &str) {
        self.inner.apply_filter(term);
    }

    #[wasm_bindgen(js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        u32::try_from(self.inner.current_page()).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        u32::try_from(self.inner.page_count()).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

// ---------------------------------------------------------------------------
// DOM binding
// ---------------------------------------------------------------------------

/// Why [`mount`] refused to bind.
#[derive(Debug)]
pub enum MountError {
    NoWindow,
    NoDocument,
    AlreadyMounted,
    /// The page selector matched nothing.
    NoPages(String),
    Runner(RunnerError),
    Js(String),
}

impl MountError {
    fn js(value: JsValue) -> Self {
        Self::Js(format!("{value:?}"))
    }
}

impl std::fmt::Display for MountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoWindow => write!(f, "no window"),
            Self::NoDocument => write!(f, "no document"),
            Self::AlreadyMounted => write!(f, "flipbook already mounted"),
            Self::NoPages(selector) => write!(f, "no pages match {selector:?}"),
            Self::Runner(err) => write!(f, "{err}"),
            Self::Js(msg) => write!(f, "DOM error: {msg}"),
        }
    }
}

impl std::error::Error for MountError {}

impl From<RunnerError> for MountError {
    fn from(err: RunnerError) -> Self {
        Self::Runner(err)
    }
}

/// Element handles for every widget role. Optional roles may be absent
/// from the markup; patches for them are dropped.
struct Dom {
    document: Document,
    pages: Vec<HtmlElement>,
    wrapper: Option<Element>,
    prev_zone: Option<HtmlElement>,
    next_zone: Option<HtmlElement>,
    audio: Option<HtmlAudioElement>,
    loader: Option<HtmlElement>,
    markers: HashMap<u64, HtmlElement>,
    glyph: String,
}

fn display(visible: bool) -> &'static str {
    if visible { "block" } else { "none" }
}

impl Dom {
    fn apply(&mut self, patch: &DomPatch) -> Result<(), JsValue> {
        match *patch {
            DomPatch::StackOrder { page, z } => {
                if let Some(el) = self.pages.get(page) {
                    el.style().set_property("z-index", &z.to_string())?;
                }
            }
            DomPatch::Flipped { page, flipped } => {
                if let Some(el) = self.pages.get(page) {
                    el.class_list().toggle_with_force("flipped", flipped)?;
                }
            }
            DomPatch::Hidden { page, hidden } => {
                if let Some(el) = self.pages.get(page) {
                    el.class_list().toggle_with_force("filtered", hidden)?;
                    el.style().set_property("display", display(!hidden))?;
                }
            }
            DomPatch::BookOpen { open } => {
                if let Some(el) = &self.wrapper {
                    el.class_list().toggle_with_force("is-open", open)?;
                }
            }
            DomPatch::ZoneVisible { zone, visible } => {
                let el = match zone {
                    Zone::Prev => &self.prev_zone,
                    Zone::Next => &self.next_zone,
                };
                if let Some(el) = el {
                    el.style().set_property("display", display(visible))?;
                }
            }
            DomPatch::PlayCue => self.play_cue()?,
            DomPatch::SpawnMarker { id, x, y } => self.spawn_marker(id, x, y)?,
            DomPatch::MarkerActive { id, active } => {
                if let Some(el) = self.markers.get(&id) {
                    el.class_list().toggle_with_force("active", active)?;
                }
            }
            DomPatch::RemoveMarker { id } => {
                if let Some(el) = self.markers.remove(&id) {
                    el.remove();
                }
            }
            DomPatch::LoaderOpacity { opacity } => {
                if let Some(el) = &self.loader {
                    el.style().set_property("opacity", &opacity.to_string())?;
                }
            }
            DomPatch::RemoveLoader => {
                if let Some(el) = &self.loader {
                    el.style().set_property("display", "none")?;
                }
            }
        }
        Ok(())
    }

    fn play_cue(&self) -> Result<(), JsValue> {
        let Some(audio) = &self.audio else {
            return Ok(());
        };
        audio.set_current_time(0.0);
        let promise = audio.play()?;
        // Autoplay policies reject until the first user gesture.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                tracing::debug!(target: "flipbook.web", error = ?err, "cue playback rejected");
            }
        });
        Ok(())
    }

    fn spawn_marker(&mut self, id: u64, x: f64, y: f64) -> Result<(), JsValue> {
        let Some(body) = self.document.body() else {
            return Ok(());
        };
        let el: HtmlElement = self.document.create_element("span")?.dyn_into()?;
        el.class_list().add_1("paw-burst")?;
        el.set_text_content(Some(&self.glyph));
        let style = el.style();
        style.set_property("left", &format!("{x}px"))?;
        style.set_property("top", &format!("{y}px"))?;
        body.append_child(&el)?;
        self.markers.insert(id, el);
        Ok(())
    }
}

struct Mounted {
    core: RunnerCore,
    dom: Dom,
    origin_ms: Option<f64>,
}

impl Mounted {
    fn frame(&mut self, ts_ms: f64) {
        let origin = *self.origin_ms.get_or_insert(ts_ms);
        self.core.set_time_ms(ts_ms - origin);
        self.core.step();
        self.flush();
    }

    fn flush(&mut self) {
        for patch in self.core.take_patches() {
            if let Err(err) = self.dom.apply(&patch) {
                console_error(&format!("flipbook patch {patch:?} failed: {err:?}"));
            }
        }
        for line in self.core.take_logs() {
            web_sys::console::log_1(&JsValue::from_str(&line));
        }
    }

    fn push(state: &RefCell<Self>, event: Event) {
        let kind = event.kind();
        with_slot(state, kind, |mounted| mounted.core.push_event(event));
    }
}

thread_local! {
    static MOUNTED: RefCell<Option<Rc<RefCell<Mounted>>>> = const { RefCell::new(None) };
}

fn query_one<T: JsCast>(document: &Document, selector: &str) -> Option<T> {
    let found = match document.query_selector(selector) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(target: "flipbook.web", selector, error = ?err, "invalid selector");
            None
        }
    };
    let el = found.and_then(|el| el.dyn_into::<T>().ok());
    if el.is_none() {
        tracing::debug!(target: "flipbook.web", selector, "optional element not found");
    }
    el
}

fn query_pages(document: &Document, selector: &str) -> Result<Vec<HtmlElement>, MountError> {
    let list = document
        .query_selector_all(selector)
        .map_err(MountError::js)?;
    Ok((0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect())
}

fn listen(
    target: &EventTarget,
    name: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), MountError> {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(handler));
    target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(MountError::js)?;
    closure.forget();
    Ok(())
}

fn start_frame_loop(window: &Window, state: Rc<RefCell<Mounted>>) -> Result<(), MountError> {
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = Rc::clone(&f);
    let win = window.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        if let Ok(mut mounted) = state.try_borrow_mut() {
            mounted.frame(ts);
        }
        if let Some(cb) = f.borrow().as_ref() {
            let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(cb) = g.borrow().as_ref() {
        window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(MountError::js)?;
    }
    Ok(())
}

fn try_mount(options_json: &str) -> Result<(), MountError> {
    if MOUNTED.with(|m| m.borrow().is_some()) {
        return Err(MountError::AlreadyMounted);
    }
    let options = MountOptions::from_json(options_json)?;
    let window = web_sys::window().ok_or(MountError::NoWindow)?;
    let document = window.document().ok_or(MountError::NoDocument)?;

    let pages = query_pages(&document, &options.page_selector)?;
    if pages.is_empty() {
        return Err(MountError::NoPages(options.page_selector));
    }
    let tags: Vec<Option<String>> = pages
        .iter()
        .map(|page| page.get_attribute(&options.tag_attribute))
        .collect();
    let widget = Flipbook::new(options.config.clone(), tags).map_err(RunnerError::from)?;

    let search = query_one::<HtmlInputElement>(&document, &options.search_selector);
    let dom = Dom {
        document: document.clone(),
        wrapper: query_one(&document, &options.wrapper_selector),
        prev_zone: query_one(&document, &options.prev_zone_selector),
        next_zone: query_one(&document, &options.next_zone_selector),
        audio: query_one(&document, &options.audio_selector),
        loader: query_one(&document, &options.loader_selector),
        markers: HashMap::new(),
        glyph: widget.config().marker_glyph.clone(),
        pages,
    };

    let mut core = RunnerCore::new(widget);
    core.init();
    let state = Rc::new(RefCell::new(Mounted {
        core,
        dom,
        origin_ms: None,
    }));
    state.borrow_mut().flush();

    {
        let state = Rc::clone(&state);
        listen(&document, "click", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                let (x, y) = (f64::from(mouse.client_x()), f64::from(mouse.client_y()));
                Mounted::push(&state, Event::PointerDown { x, y });
            }
        })?;
    }

    {
        let state = Rc::clone(&state);
        listen(&document, "keydown", move |event| {
            let typing = event
                .target()
                .is_some_and(|t| t.dyn_ref::<HtmlInputElement>().is_some());
            if typing {
                return;
            }
            if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                Mounted::push(&state, Event::Key(parse_key_code(&key.key())));
            }
        })?;
    }

    if options.wire_zones {
        let zones = {
            let mounted = state.borrow();
            [
                (Zone::Prev, mounted.dom.prev_zone.clone()),
                (Zone::Next, mounted.dom.next_zone.clone()),
            ]
        };
        for (zone, el) in zones {
            let Some(el) = el else { continue };
            let state = Rc::clone(&state);
            listen(&el, "click", move |_| Mounted::push(&state, Event::ZoneTap(zone)))?;
        }
    }

    if let Some(input) = search {
        let state = Rc::clone(&state);
        let field = input.clone();
        listen(&input, "input", move |_| {
            Mounted::push(&state, Event::SearchInput(field.value()));
        })?;
    }

    if let Some(name) = &options.global_navigate {
        let state = Rc::clone(&state);
        let navigate = Closure::<dyn FnMut(String)>::wrap(Box::new(move |direction: String| {
            with_slot(&state, "navigate", |mounted| {
                mounted.core.navigate(&direction);
            });
        }));
        Reflect::set(&window, &JsValue::from_str(name), navigate.as_ref())
            .map_err(MountError::js)?;
        navigate.forget();
    }

    start_frame_loop(&window, Rc::clone(&state))?;
    MOUNTED.with(|m| *m.borrow_mut() = Some(state));
    tracing::info!(target: "flipbook.web", "flipbook mounted");
    Ok(())
}

/// Bind a flipbook onto the current document.
///
/// `options_json` overrides the default selectors and config. Returns
/// `false` (and logs to the console) if the markup has no pages or the
/// options are invalid; never throws.
#[wasm_bindgen]
pub fn mount(options_json: Option<String>) -> bool {
    install_panic_hook();
    match try_mount(options_json.as_deref().unwrap_or("")) {
        Ok(()) => true,
        Err(err) => {
            console_error(&format!("flipbook mount failed: {err}"));
            false
        }
    }
}
