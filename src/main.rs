//! Folio Sim entry point
//!
//! On the web: wires DOM input to the pinball table and the rubber scroll
//! region, drives both from one animation-frame loop, and draws the table.
//! Natively: a headless run that logs snapshots for tuning.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::prelude::*;
    use web_sys::{
        AddEventListenerOptions, Event, EventTarget, HtmlCanvasElement, HtmlElement, KeyboardEvent,
        TouchEvent, WheelEvent,
    };

    use folio_sim::consts::*;
    use folio_sim::input::{self, TouchDrag};
    use folio_sim::renderer::RenderState;
    use folio_sim::rubber::{KickBus, RubberRegion, SectionNavigator, Subscription};
    use folio_sim::sim::{FlipperSide, GameEvent, Table, tick};
    use folio_sim::{QualityPreset, Settings, Tuning};

    thread_local! {
        static HOST: RefCell<Option<Rc<RefCell<Host>>>> = const { RefCell::new(None) };
    }

    /// A DOM listener that detaches itself on drop
    struct Listener {
        target: EventTarget,
        kind: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    }

    impl Listener {
        fn attach(
            target: &EventTarget,
            kind: &'static str,
            passive: bool,
            handler: impl FnMut(Event) + 'static,
        ) -> Self {
            let closure = Closure::<dyn FnMut(Event)>::new(handler);
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            );
            Self {
                target: target.clone(),
                kind,
                closure,
            }
        }
    }

    impl Drop for Listener {
        fn drop(&mut self) {
            let _ = self
                .target
                .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
        }
    }

    /// Everything the frame loop and input handlers share
    struct Host {
        table: Table,
        region: RubberRegion,
        nav: Rc<RefCell<SectionNavigator>>,
        _nav_subscription: Subscription,
        drag: TouchDrag,
        tuning: Tuning,
        settings: Settings,
        render_state: Option<RenderState>,
        canvas: HtmlCanvasElement,
        page: Option<HtmlElement>,
        accumulator: f32,
        last_time: Option<f64>,
        raf_handle: Option<i32>,
        /// Callback for the pending frame, freed with the host
        raf_closure: Option<Closure<dyn FnMut(f64)>>,
        listeners: Vec<Listener>,
        running: bool,
    }

    impl Host {
        fn new(canvas: HtmlCanvasElement, page: Option<HtmlElement>, tuning: Tuning, settings: Settings) -> Self {
            let (w, h) = css_size(&canvas);
            let table = Table::new(w, h, tuning.pinball.clone());

            let bus = KickBus::new();
            let nav = Rc::new(RefCell::new(SectionNavigator::with_defaults(tuning.nav.clone())));
            let nav_subscription = bus.subscribe(nav.clone());
            let region = RubberRegion::new("page", tuning.spring.clone(), bus);

            Self {
                table,
                region,
                nav,
                _nav_subscription: nav_subscription,
                drag: TouchDrag::new(),
                tuning,
                settings,
                render_state: None,
                canvas,
                page,
                accumulator: 0.0,
                last_time: None,
                raf_handle: None,
                raf_closure: None,
                listeners: Vec::new(),
                running: true,
            }
        }

        /// Fixed-step pinball, then the self-idling spring
        fn update(&mut self, time: f64) {
            let dt = match self.last_time {
                Some(prev) => (((time - prev) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DELTA),
                None => FRAME_DT,
            };
            self.last_time = Some(time);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= FRAME_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.table, FRAME_DT);
                self.accumulator -= FRAME_DT;
                substeps += 1;

                for event in &self.table.events {
                    if let GameEvent::BumperHit { label } = event {
                        show_last_hit(label, &self.settings);
                    }
                }
            }
            if substeps == MAX_SUBSTEPS {
                self.accumulator = self.accumulator.min(FRAME_DT);
            }

            self.region.frame(time);

            let request = self.nav.borrow_mut().take_request();
            if let Some(request) = request {
                scroll_to_section(&request.section);
            }
        }

        fn render(&mut self) {
            let snapshot = self.table.snapshot();
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render_table(&snapshot, &self.settings) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1, render_state.table_size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Nudge page content by the rubber displacement
        fn apply_page_offset(&self, time: f64) {
            let Some(page) = &self.page else {
                return;
            };
            let (display, nav_offset) = if self.settings.effective_rubber_offset() {
                (
                    self.region.snapshot().display_displacement,
                    self.nav.borrow().offset_at(time),
                )
            } else {
                (0.0, 0.0)
            };
            let style = page.style();
            let _ = style.set_property("transform", &format!("translateY({:.2}px)", display));
            let _ = style.set_property("--nav-offset", &format!("{:.2}px", nav_offset));
        }

        fn relayout(&mut self) {
            let (w, h) = css_size(&self.canvas);
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let (pw, ph) = ((w as f64 * dpr) as u32, (h as f64 * dpr) as u32);
            self.canvas.set_width(pw);
            self.canvas.set_height(ph);
            self.table.relayout(w, h);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(pw, ph, (w, h));
            }
            self.accumulator = 0.0;
        }

        /// Page hidden: drop the frame clocks so resuming starts fresh.
        ///
        /// Key-ups are not delivered to hidden pages, so flippers are released.
        fn suspend(&mut self) {
            self.region.suspend();
            self.table.set_flipper_pressed(FlipperSide::Left, false);
            self.table.set_flipper_pressed(FlipperSide::Right, false);
            self.last_time = None;
            self.accumulator = 0.0;
        }

        fn on_key(&mut self, event: &KeyboardEvent, pressed: bool) {
            let Some(action) = input::key_action(&event.code(), event.shift_key()) else {
                return;
            };
            if input::apply_flip(&mut self.table, action, pressed) {
                event.prevent_default();
                return;
            }
            if pressed {
                if let Some(delta) = input::key_kick(action, &self.tuning.input) {
                    event.prevent_default();
                    self.region.kick(delta, event.time_stamp());
                }
            }
        }

        fn on_wheel(&mut self, event: &WheelEvent) {
            if let Some(delta) = input::wheel_kick(event.delta_y(), &self.tuning.input) {
                event.prevent_default();
                self.region.kick(delta, event.time_stamp());
            }
        }

        fn on_touch(&mut self, event: &TouchEvent, kind: &str) {
            let y = event.touches().get(0).map(|t| t.client_y() as f32);
            match (kind, y) {
                ("touchstart", Some(y)) => self.drag.start(y),
                ("touchmove", Some(y)) => {
                    if let Some(delta) = self.drag.update(y, &self.tuning.input) {
                        self.region.kick(delta, event.time_stamp());
                    }
                }
                _ => self.drag.end(),
            }
        }

        fn on_hash_change(&mut self, now: f64) {
            let hash = web_sys::window()
                .and_then(|w| w.location().hash().ok())
                .unwrap_or_default();
            let id = hash.trim_start_matches('#').split('?').next().unwrap_or("");
            if !id.is_empty() {
                self.nav.borrow_mut().jump_to(id, now);
            }
        }
    }

    fn css_size(canvas: &HtmlCanvasElement) -> (f32, f32) {
        (canvas.client_width().max(1) as f32, canvas.client_height().max(1) as f32)
    }

    fn show_last_hit(label: &str, settings: &Settings) {
        if !settings.show_labels {
            return;
        }
        let document = web_sys::window().and_then(|w| w.document());
        if let Some(el) = document.and_then(|d| d.get_element_by_id("last-hit")) {
            el.set_text_content(Some(label));
        }
    }

    fn scroll_to_section(id: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(el) = window.document().and_then(|d| d.get_element_by_id(id)) {
            let options = web_sys::ScrollIntoViewOptions::new();
            options.set_behavior(web_sys::ScrollBehavior::Smooth);
            options.set_block(web_sys::ScrollLogicalPosition::Start);
            el.scroll_into_view_with_scroll_into_view_options(&options);
        }
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(&format!("#{}", id)));
        }
    }

    /// Stored settings, with a `?quality=` override that is saved for next time
    fn load_settings(window: &web_sys::Window) -> Settings {
        let mut settings = Settings::load();
        let search = window.location().search().unwrap_or_default();
        if let Some(preset) = QualityPreset::from_query(&search) {
            if preset != settings.quality {
                settings.apply_preset(preset);
                settings.save();
            }
            log::info!("Quality preset {} from URL", preset.as_str());
        }
        settings
    }

    /// Tuning from the inline JSON script, defaults otherwise
    fn load_tuning(document: &web_sys::Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("folio-tuning")
            .and_then(|el| el.text_content())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from page");
                tuning
            }
            Err(e) => {
                log::warn!("Bad tuning JSON, using defaults: {}", e);
                Tuning::default()
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Folio Sim starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let page = document
            .get_element_by_id("page")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        let tuning = load_tuning(&document);
        let settings = load_settings(&window);

        let host = Rc::new(RefCell::new(Host::new(canvas.clone(), page, tuning, settings)));
        host.borrow_mut().relayout();

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let table_size = css_size(&canvas);
        let render_state = RenderState::new(surface, &adapter, canvas.width(), canvas.height(), table_size)
            .await
            .expect("Failed to create device");
        host.borrow_mut().render_state = Some(render_state);

        let listeners = setup_listeners(&window, &document, &host);
        host.borrow_mut().listeners = listeners;
        host.borrow_mut().on_hash_change(0.0);

        request_animation_frame(&host);
        HOST.with(|slot| *slot.borrow_mut() = Some(host));

        log::info!("Folio Sim running!");
    }

    /// Cancel the frame loop and detach every listener
    pub fn teardown() {
        let Some(host) = HOST.with(|slot| slot.borrow_mut().take()) else {
            return;
        };
        let hooks = {
            let mut h = host.borrow_mut();
            h.running = false;
            if let (Some(handle), Some(window)) = (h.raf_handle.take(), web_sys::window()) {
                let _ = window.cancel_animation_frame(handle);
            }
            (h.raf_closure.take(), std::mem::take(&mut h.listeners))
        };
        drop(hooks);
        drop(host);
        log::info!("Folio Sim stopped");
    }

    fn setup_listeners(
        window: &web_sys::Window,
        document: &web_sys::Document,
        host: &Rc<RefCell<Host>>,
    ) -> Vec<Listener> {
        let window_target: &EventTarget = window.as_ref();
        let document_target: &EventTarget = document.as_ref();
        let mut listeners = Vec::new();

        // Handlers hold weak refs so the host can drop while they are attached
        let on = |host: &Rc<RefCell<Host>>, f: fn(&mut Host, Event)| {
            let weak: Weak<RefCell<Host>> = Rc::downgrade(host);
            move |event: Event| {
                if let Some(host) = weak.upgrade() {
                    f(&mut host.borrow_mut(), event);
                }
            }
        };

        listeners.push(Listener::attach(
            window_target,
            "resize",
            true,
            on(host, |h, _| h.relayout()),
        ));
        listeners.push(Listener::attach(
            window_target,
            "keydown",
            false,
            on(host, |h, e| {
                if let Some(e) = e.dyn_ref::<KeyboardEvent>() {
                    h.on_key(e, true);
                }
            }),
        ));
        listeners.push(Listener::attach(
            window_target,
            "keyup",
            false,
            on(host, |h, e| {
                if let Some(e) = e.dyn_ref::<KeyboardEvent>() {
                    h.on_key(e, false);
                }
            }),
        ));
        listeners.push(Listener::attach(
            window_target,
            "wheel",
            false,
            on(host, |h, e| {
                if let Some(e) = e.dyn_ref::<WheelEvent>() {
                    h.on_wheel(e);
                }
            }),
        ));
        for kind in ["touchstart", "touchmove", "touchend"] {
            listeners.push(Listener::attach(
                window_target,
                kind,
                true,
                on(host, |h, e| {
                    if let Some(touch) = e.dyn_ref::<TouchEvent>() {
                        h.on_touch(touch, &e.type_());
                    }
                }),
            ));
        }
        listeners.push(Listener::attach(
            window_target,
            "hashchange",
            true,
            on(host, |h, e| h.on_hash_change(e.time_stamp())),
        ));
        listeners.push(Listener::attach(
            document_target,
            "visibilitychange",
            true,
            on(host, |h, _| {
                let hidden = web_sys::window()
                    .and_then(|w| w.document())
                    .is_some_and(|d| d.visibility_state() == web_sys::VisibilityState::Hidden);
                if hidden {
                    h.suspend();
                    log::info!("Suspended (tab hidden)");
                }
            }),
        ));

        listeners
    }

    fn request_animation_frame(host: &Rc<RefCell<Host>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        // Weak so a cancelled frame cannot keep the host alive
        let weak = Rc::downgrade(host);
        let closure = Closure::once(move |time: f64| {
            frame_loop(&weak, time);
        });
        let callback: &js_sys::Function = closure.as_ref().unchecked_ref();
        match window.request_animation_frame(callback) {
            Ok(handle) => {
                let mut h = host.borrow_mut();
                h.raf_handle = Some(handle);
                h.raf_closure = Some(closure);
            }
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
    }

    fn frame_loop(host: &Weak<RefCell<Host>>, time: f64) {
        let Some(host) = host.upgrade() else {
            return;
        };
        // Released after this callback returns
        let _current = {
            let mut h = host.borrow_mut();
            if !h.running {
                return;
            }
            h.raf_handle = None;
            let current = h.raf_closure.take();
            h.update(time);
            h.render();
            h.apply_page_offset(time);
            current
        };

        request_animation_frame(&host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    web_host::run().await;
}

/// Stop the simulation and release every DOM hook
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn folio_stop() {
    web_host::teardown();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Folio Sim (native) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match folio_sim::Tuning::from_json(&json) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Invalid tuning file {}: {}", path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                log::error!("Cannot read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => folio_sim::Tuning::default(),
    };

    headless::run(&tuning, 1280.0, 900.0, 600);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use folio_sim::Tuning;
    use folio_sim::consts::FRAME_DT;
    use folio_sim::rubber::{KickBus, RubberRegion, SectionNavigator};
    use folio_sim::sim::{FlipperSide, GameEvent, Table, tick};

    /// Run the table and a rubber region side by side, logging JSON snapshots
    pub fn run(tuning: &Tuning, width: f32, height: f32, frames: u32) {
        let mut table = Table::new(width, height, tuning.pinball.clone());

        let bus = KickBus::new();
        let nav = Rc::new(RefCell::new(SectionNavigator::with_defaults(tuning.nav.clone())));
        let _subscription = bus.subscribe(nav.clone());
        let mut region = RubberRegion::new("page", tuning.spring.clone(), bus);

        let mut hits = 0;
        let mut drains = 0;
        for frame in 0..frames {
            let now_ms = frame as f64 * FRAME_DT as f64 * 1000.0;
            table.set_flipper_pressed(FlipperSide::Left, frame % 90 < 12);
            table.set_flipper_pressed(FlipperSide::Right, frame % 75 < 12);
            tick(&mut table, FRAME_DT);
            for event in &table.events {
                match event {
                    GameEvent::BumperHit { .. } => hits += 1,
                    GameEvent::Drained => drains += 1,
                }
            }

            // A burst of scroll-down kicks early on
            if frame < 60 && frame % 4 == 0 {
                region.kick(-90.0, now_ms);
            }
            region.frame(now_ms);
            if let Some(request) = nav.borrow_mut().take_request() {
                log::info!("Frame {}: navigate to '{}'", frame, request.section);
            }

            if frame % 60 == 0 {
                match serde_json::to_string(&region.snapshot()) {
                    Ok(json) => log::info!("Frame {} rubber {}", frame, json),
                    Err(e) => log::warn!("Snapshot encode failed: {}", e),
                }
            }
        }

        match serde_json::to_string_pretty(&table.snapshot()) {
            Ok(json) => log::info!("Final table:\n{}", json),
            Err(e) => log::warn!("Snapshot encode failed: {}", e),
        }
        log::info!(
            "{} frames: {} bumper hits, {} drains, active section '{}'",
            frames,
            hits,
            drains,
            nav.borrow().active()
        );
    }
}
