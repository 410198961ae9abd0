//! Browser platform: `requestAnimationFrame` and canvas event listeners
//!
//! Callbacks reach the game through a weak [`EventSink`] reference, so a
//! dropped runner simply stops receiving events. Frame and listener closures
//! live in the platform until it is dropped or the listener is removed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

use super::{EventSink, FrameHandle, ListenerId, ListenerKind, Platform};
use crate::runner::GameRunner;
use crate::sim::Simulation;
use crate::sim::input::PointerEvent;

type SinkRef = Weak<RefCell<dyn EventSink>>;

pub struct WebPlatform {
    window: Window,
    canvas: HtmlCanvasElement,
    sink: Option<SinkRef>,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    listeners: HashMap<ListenerId, (ListenerKind, Closure<dyn FnMut(Event)>)>,
    next_listener: u32,
}

/// Deliver to the sink unless it is gone or already borrowed
fn with_sink(sink: &Option<SinkRef>, f: impl FnOnce(&mut dyn EventSink)) {
    let Some(sink) = sink.as_ref().and_then(Weak::upgrade) else {
        return;
    };
    if let Ok(mut sink) = sink.try_borrow_mut() {
        f(&mut *sink);
    }
}

/// Canvas-local pointer event for a DOM event
fn translate(
    kind: ListenerKind,
    event: &Event,
    canvas: &HtmlCanvasElement,
) -> Option<PointerEvent> {
    let (client_x, client_y) = match kind {
        ListenerKind::MouseDown | ListenerKind::MouseMove | ListenerKind::MouseUp => {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            (mouse.client_x(), mouse.client_y())
        }
        ListenerKind::TouchStart | ListenerKind::TouchMove | ListenerKind::TouchEnd => {
            let touch_event = event.dyn_ref::<TouchEvent>()?;
            event.prevent_default();
            // Lifted fingers only appear in changedTouches
            let list = if kind == ListenerKind::TouchEnd {
                touch_event.changed_touches()
            } else {
                touch_event.touches()
            };
            let touch = list.get(0)?;
            (touch.client_x(), touch.client_y())
        }
    };
    let rect = canvas.get_bounding_client_rect();
    let x = (f64::from(client_x) - rect.left()) as f32;
    let y = (f64::from(client_y) - rect.top()) as f32;
    Some(match kind {
        ListenerKind::TouchStart | ListenerKind::MouseDown => PointerEvent::Down { x, y },
        ListenerKind::TouchMove | ListenerKind::MouseMove => PointerEvent::Move { x, y },
        ListenerKind::TouchEnd | ListenerKind::MouseUp => PointerEvent::Up { x, y },
    })
}

impl WebPlatform {
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
            canvas,
            sink: None,
            frame_callback: None,
            listeners: HashMap::new(),
            next_listener: 0,
        })
    }

    /// Route callbacks to `sink`; must happen before any registration
    pub fn attach(&mut self, sink: SinkRef) {
        let frame_sink = Some(sink.clone());
        self.frame_callback = Some(Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            with_sink(&frame_sink, |s| s.frame(timestamp));
        }));
        self.sink = Some(sink);
    }
}

impl Platform for WebPlatform {
    fn request_frame(&mut self) -> FrameHandle {
        let Some(callback) = self.frame_callback.as_ref() else {
            log::warn!("Frame requested before a sink was attached");
            return FrameHandle(0);
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => FrameHandle(id),
            Err(e) => {
                log::warn!("requestAnimationFrame failed: {:?}", e);
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            log::warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);

        let sink = self.sink.clone();
        let canvas = self.canvas.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(pointer) = translate(kind, &event, &canvas) {
                with_sink(&sink, |s| s.pointer(pointer));
            }
        });
        if let Err(e) = self
            .canvas
            .add_event_listener_with_callback(kind.event_name(), closure.as_ref().unchecked_ref())
        {
            log::warn!("Could not listen for {}: {:?}", kind.event_name(), e);
        }
        self.listeners.insert(id, (kind, closure));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        let Some((kind, closure)) = self.listeners.remove(&id) else {
            return;
        };
        if let Err(e) = self
            .canvas
            .remove_event_listener_with_callback(kind.event_name(), closure.as_ref().unchecked_ref())
        {
            log::warn!("Could not remove {} listener: {:?}", kind.event_name(), e);
        }
    }
}

/// Wrap a runner for the browser: hook its platform up to it and start it.
///
/// The returned handle keeps the game alive; dropping it tears the game down.
pub fn mount<S>(runner: GameRunner<S, WebPlatform>) -> Rc<RefCell<GameRunner<S, WebPlatform>>>
where
    S: Simulation + 'static,
{
    let runner = Rc::new(RefCell::new(runner));
    let sink: Rc<RefCell<dyn EventSink>> = runner.clone();
    {
        let mut r = runner.borrow_mut();
        r.platform_mut().attach(Rc::downgrade(&sink));
        r.start();
    }
    runner
}
