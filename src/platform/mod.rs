//! Platform abstraction layer
//!
//! The platform owns the two asynchronous resources a running game holds:
//! the display-refresh frame callback and the input listeners. Both are
//! acquired and released through [`Platform`], and delivered back to the
//! game through [`EventSink`].
//!
//! - `clock`: timestamps to delta-time
//! - `lifecycle`: registration bookkeeping and idempotent teardown
//! - `web`: browser implementation (WASM only)

pub mod clock;
pub mod lifecycle;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clock::FrameClock;
pub use lifecycle::Lifecycle;
#[cfg(target_arch = "wasm32")]
pub use web::{WebPlatform, mount};

use std::collections::BTreeSet;

use crate::sim::input::PointerEvent;

/// Handle of a pending frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub i32);

/// Handle of a registered input listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

/// Raw input sources a game subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    TouchStart,
    TouchMove,
    TouchEnd,
    MouseDown,
    MouseMove,
    MouseUp,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 6] = [
        ListenerKind::TouchStart,
        ListenerKind::TouchMove,
        ListenerKind::TouchEnd,
        ListenerKind::MouseDown,
        ListenerKind::MouseMove,
        ListenerKind::MouseUp,
    ];

    /// DOM event name
    pub fn event_name(self) -> &'static str {
        match self {
            ListenerKind::TouchStart => "touchstart",
            ListenerKind::TouchMove => "touchmove",
            ListenerKind::TouchEnd => "touchend",
            ListenerKind::MouseDown => "mousedown",
            ListenerKind::MouseMove => "mousemove",
            ListenerKind::MouseUp => "mouseup",
        }
    }
}

/// Scheduling and listener primitives supplied by the host
pub trait Platform {
    /// Ask for one callback on the next display refresh
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending frame callback (unknown handles are ignored)
    fn cancel_frame(&mut self, handle: FrameHandle);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    /// Unregister a listener (unknown ids are ignored)
    fn remove_listener(&mut self, id: ListenerId);
}

/// Receiver of platform callbacks
pub trait EventSink {
    /// Display-refresh callback with a monotonically increasing timestamp (ms)
    fn frame(&mut self, timestamp_ms: f64);

    /// Raw pointer event in canvas-local coordinates
    fn pointer(&mut self, event: PointerEvent);
}

/// Platform for tests and the native demo.
///
/// Nothing fires on its own; the host calls the sink directly. Outstanding
/// frames and listeners are tracked so leaks are observable.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    next_frame: i32,
    next_listener: u32,
    pending_frames: BTreeSet<FrameHandle>,
    listeners: BTreeSet<ListenerId>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_frames(&self) -> usize {
        self.pending_frames.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Mark a frame as delivered. Returns false if it was cancelled.
    pub fn fire(&mut self, handle: FrameHandle) -> bool {
        self.pending_frames.remove(&handle)
    }

    /// Oldest pending frame, if any
    pub fn next_pending(&self) -> Option<FrameHandle> {
        self.pending_frames.first().copied()
    }
}

impl Platform for HeadlessPlatform {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        let handle = FrameHandle(self.next_frame);
        self.pending_frames.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending_frames.remove(&handle);
    }

    fn add_listener(&mut self, _kind: ListenerKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}
