use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlCanvasElement, HtmlElement, HtmlTextAreaElement, KeyboardEvent, PointerEvent, Window};

use inkboard_engine::{Command, ConfigUpdate, DrawingEngine, Tool, UpdateEffect};

use crate::canvas::CanvasSurface;
use crate::dom::{get_element, measure_viewport, pointer_input, set_css_size, set_shown, set_style};
use crate::keymap::{command_for, KeyPhase, KeyPress};

const RESIZE_RETRY_MS: i32 = 100;

struct App {
    engine: DrawingEngine,
    main: CanvasSurface,
    guide: CanvasSurface,
    wrapper: HtmlElement,
    text_input: HtmlTextAreaElement,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Runs `f` against the app. Returns `None` before `init` and when called
/// re-entrantly from an event the app itself triggered.
fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| borrow_slot(app, f))
}

fn borrow_slot<T, R>(slot: &RefCell<Option<T>>, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    let Ok(mut value) = slot.try_borrow_mut() else {
        log::trace!("app busy, dropping re-entrant event");
        return None;
    };
    value.as_mut().map(f)
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn html(canvas: &HtmlCanvasElement) -> Option<HtmlElement> {
    canvas.clone().dyn_into::<HtmlElement>().ok()
}

fn coalesced_pointer_events(event: &PointerEvent) -> Vec<PointerEvent> {
    let get_coalesced_events = Reflect::get(event.as_ref(), &JsValue::from_str("getCoalescedEvents"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());
    let mut out = Vec::new();
    if let Some(get_coalesced_events) = get_coalesced_events {
        if let Ok(events) = get_coalesced_events
            .call0(event.as_ref())
            .and_then(|value| value.dyn_into::<js_sys::Array>())
        {
            for index in 0..events.length() {
                if let Ok(event) = events.get(index).dyn_into::<PointerEvent>() {
                    out.push(event);
                }
            }
        }
    }
    if out.is_empty() {
        out.push(event.clone());
    }
    out
}

impl App {
    fn pointer_down(&mut self, event: &PointerEvent) {
        if self.engine.tool().keeps_text_focus() {
            // The compatibility mousedown that follows would move focus to the
            // body and blur the text box focused below.
            event.prevent_default();
        }
        let input = pointer_input(&self.main.canvas, event);
        self.engine.pointer_down(&input);
        let fresh_block = self
            .engine
            .router()
            .pending_text()
            .filter(|block| block.text.is_empty())
            .map(|block| block.anchor);
        if let Some(anchor) = fresh_block {
            let element: &HtmlElement = self.text_input.as_ref();
            set_style(element, "left", &format!("{}px", anchor.x));
            set_style(element, "top", &format!("{}px", anchor.y));
            self.text_input.set_value("");
            let _ = element.focus();
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent) {
        for event in coalesced_pointer_events(event) {
            let input = pointer_input(&self.main.canvas, &event);
            self.engine.pointer_move(&input);
        }
    }

    fn pointer_up(&mut self, event: Option<&PointerEvent>) {
        let input = event.map(|event| pointer_input(&self.main.canvas, event));
        self.engine.pointer_up(input.as_ref());
    }

    fn key(&mut self, phase: KeyPhase, event: &KeyboardEvent) -> Result<(), JsValue> {
        if self.engine.router().pending_text().is_some() {
            return Ok(());
        }
        let key = event.key();
        let press = KeyPress {
            key: &key,
            alt: event.alt_key(),
            shift: event.shift_key(),
            modifier: event.ctrl_key() || event.meta_key(),
            repeat: event.repeat(),
        };
        let Some(command) = command_for(phase, press) else {
            return Ok(());
        };
        event.prevent_default();
        self.run_command(command)
    }

    fn text_key(&mut self, event: &KeyboardEvent) {
        if self.engine.text_key(&event.key()) {
            event.prevent_default();
        }
        if self.engine.router().pending_text().is_none() {
            let element: &HtmlElement = self.text_input.as_ref();
            let _ = element.blur();
        }
    }

    fn run_command(&mut self, command: Command) -> Result<(), JsValue> {
        let effect = self.engine.execute(command).map_err(to_js)?;
        self.sync(effect);
        Ok(())
    }

    /// Brings the DOM in line with the engine after a command or update.
    fn sync(&mut self, effect: UpdateEffect) {
        if effect == UpdateEffect::Resize && !self.resize() {
            schedule_resize();
        }
        let visible = self.engine.is_visible();
        for canvas in [&self.main.canvas, &self.guide.canvas] {
            if let Some(element) = html(canvas) {
                set_shown(&element, visible);
            }
        }
        if let Some(guide) = html(&self.guide.canvas) {
            set_style(&guide, "opacity", &self.engine.guide_opacity().to_string());
        }
        if let Some(main) = html(&self.main.canvas) {
            set_style(&main, "background-color", &self.engine.config().background_color);
        }
        if self.engine.tool() != Tool::TextWriting {
            let element: &HtmlElement = self.text_input.as_ref();
            let _ = element.blur();
        }
    }

    /// Fits both canvases to the page. Returns `false` while the card
    /// container is not in the document yet.
    fn resize(&mut self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let Some(document) = window.document() else {
            return false;
        };
        let Some(viewport) = measure_viewport(&document, &self.wrapper) else {
            return false;
        };
        let size = self.engine.canvas_size(viewport, window.device_pixel_ratio());
        for surface in [&self.main, &self.guide] {
            surface.set_size(size.backing_width(), size.backing_height(), size.dpr);
            set_css_size(&surface.canvas, size);
        }
        set_style(&self.wrapper, "width", &format!("{}px", size.width));
        if let Some(main) = html(&self.main.canvas) {
            let border = if self.engine.config().small_canvas_enabled {
                "dashed"
            } else {
                "none"
            };
            set_style(&main, "border-style", border);
        }
        self.engine.resize(size.width, size.height, size.dpr);
        log::debug!("canvas {}x{} @{}", size.width, size.height, size.dpr);
        true
    }
}

/// Resizes now, or keeps retrying until the card container exists.
fn schedule_resize() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let retry = Closure::once_into_js(move || {
        if with_app(|app| app.resize()) == Some(false) {
            schedule_resize();
        }
    });
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        retry.unchecked_ref(),
        RESIZE_RETRY_MS,
    );
}

fn resize_when_ready() {
    if with_app(|app| app.resize()) == Some(false) {
        schedule_resize();
    }
}

fn start_frame_loop(window: &Window) -> Result<(), JsValue> {
    let handle: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = handle.clone();
    let window_cb = window.clone();
    *handle.borrow_mut() = Some(Closure::new(move |_: f64| {
        with_app(|app| app.engine.frame(&mut app.main, &mut app.guide));
        if let Some(callback) = next.borrow().as_ref() {
            let _ = window_cb.request_animation_frame(callback.as_ref().unchecked_ref());
        }
    }));
    if let Some(callback) = handle.borrow().as_ref() {
        window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }
    Ok(())
}

fn create_text_input(document: &web_sys::Document, wrapper: &HtmlElement) -> Result<HtmlTextAreaElement, JsValue> {
    // A textarea so Enter starts a new line of the pending text block.
    let input = document
        .create_element("textarea")?
        .dyn_into::<HtmlTextAreaElement>()
        .map_err(|_| JsValue::from_str("Invalid element type: textarea"))?;
    input.set_attribute("autocomplete", "off")?;
    input.set_attribute("rows", "1")?;
    let element: &HtmlElement = input.as_ref();
    set_style(element, "position", "absolute");
    set_style(element, "opacity", "0");
    set_style(element, "width", "1px");
    set_style(element, "height", "1px");
    set_style(element, "resize", "none");
    set_style(element, "pointer-events", "none");
    wrapper.append_child(&input)?;
    Ok(input)
}

fn attach_listeners(window: &Window, main: &HtmlCanvasElement, text_input: &HtmlTextAreaElement) -> Result<(), JsValue> {
    {
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            with_app(|app| app.pointer_down(&event));
        });
        main.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            with_app(|app| app.pointer_move(&event));
        });
        main.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        // Released anywhere on the page, not just over the canvas.
        let onup = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            with_app(|app| app.pointer_up(Some(&event)));
        });
        window.add_event_listener_with_callback("pointerup", onup.as_ref().unchecked_ref())?;
        onup.forget();

        let oncancel = Closure::<dyn FnMut(PointerEvent)>::new(move |_: PointerEvent| {
            with_app(|app| app.pointer_up(None));
        });
        window.add_event_listener_with_callback("pointercancel", oncancel.as_ref().unchecked_ref())?;
        oncancel.forget();
    }

    for (name, phase) in [("keydown", KeyPhase::Down), ("keyup", KeyPhase::Up)] {
        let onkey = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if let Some(Err(err)) = with_app(|app| app.key(phase, &event)) {
                web_sys::console::error_1(&err);
            }
        });
        window.add_event_listener_with_callback(name, onkey.as_ref().unchecked_ref())?;
        onkey.forget();
    }

    {
        let input_cb = text_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let value = input_cb.value();
            with_app(|app| app.engine.text_changed(&value));
        });
        text_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            event.stop_propagation();
            with_app(|app| app.text_key(&event));
        });
        text_input.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let onblur = Closure::<dyn FnMut(Event)>::new(move |_| {
            with_app(|app| app.engine.text_blur());
        });
        text_input.add_event_listener_with_callback("blur", onblur.as_ref().unchecked_ref())?;
        onblur.forget();
    }

    {
        let onresize = Closure::<dyn FnMut()>::new(resize_when_ready);
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    Ok(())
}

/// Sets up the drawing layer from the host's configuration snapshot.
#[wasm_bindgen]
pub fn init(config_json: &str) -> Result<(), JsValue> {
    if APP.with(|app| app.borrow().is_some()) {
        return Err(JsValue::from_str("Drawing layer already initialized"));
    }
    let engine = DrawingEngine::from_json(config_json).map_err(to_js)?;
    let _ = console_log::init_with_level(engine.config().log_level());

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let main_canvas: HtmlCanvasElement = get_element(&document, "main_canvas")?;
    let guide_canvas: HtmlCanvasElement = get_element(&document, "secondary_canvas")?;
    let wrapper: HtmlElement = get_element(&document, "canvas_wrapper")?;
    let text_input = create_text_input(&document, &wrapper)?;

    attach_listeners(&window, &main_canvas, &text_input)?;
    let mut app = App {
        engine,
        main: CanvasSurface::new(main_canvas)?,
        guide: CanvasSurface::new(guide_canvas)?,
        wrapper,
        text_input,
    };
    app.sync(UpdateEffect::Redraw);
    APP.with(|slot| *slot.borrow_mut() = Some(app));
    log::info!("drawing layer ready");

    resize_when_ready();
    start_frame_loop(&window)
}

/// Applies one `{"param": ...}` configuration change.
#[wasm_bindgen]
pub fn update_config(update_json: &str) -> Result<(), JsValue> {
    let update = ConfigUpdate::from_json(update_json).map_err(to_js)?;
    with_app(|app| {
        let effect = app.engine.apply_update(update).map_err(to_js)?;
        app.sync(effect);
        Ok(())
    })
    .unwrap_or(Ok(()))
}

/// Runs a named command such as `undo` or `select-pen-2`.
#[wasm_bindgen]
pub fn command(name: &str) -> Result<(), JsValue> {
    let command = name.parse::<Command>().map_err(to_js)?;
    with_app(|app| app.run_command(command)).unwrap_or(Ok(()))
}

#[wasm_bindgen]
pub fn resize() {
    resize_when_ready();
}

#[wasm_bindgen]
pub fn finish_delete() {
    with_app(|app| app.engine.finish_delete());
}

#[wasm_bindgen]
pub fn has_content() -> bool {
    with_app(|app| app.engine.has_content()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn active_tool() -> String {
    with_app(|app| app.engine.tool().to_string()).unwrap_or_default()
}
