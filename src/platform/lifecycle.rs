//! Registration bookkeeping for one game instance
//!
//! Every frame request and listener registration goes through a
//! [`Lifecycle`], so a single `teardown` call can release all of them.

use super::{FrameHandle, ListenerId, ListenerKind, Platform};

#[derive(Debug, Default)]
pub struct Lifecycle {
    frame: Option<FrameHandle>,
    listeners: Vec<ListenerId>,
    torn_down: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Subscribe to every input source
    pub fn attach_listeners<P: Platform>(&mut self, platform: &mut P) {
        if self.torn_down {
            return;
        }
        for kind in ListenerKind::ALL {
            self.listeners.push(platform.add_listener(kind));
        }
    }

    /// Request the next frame unless one is already pending or we are done
    pub fn schedule_frame<P: Platform>(&mut self, platform: &mut P) {
        if self.torn_down || self.frame.is_some() {
            return;
        }
        self.frame = Some(platform.request_frame());
    }

    /// The pending frame was delivered
    pub fn frame_fired(&mut self) {
        self.frame = None;
    }

    /// Cancel the pending frame and unregister every listener.
    ///
    /// Returns true only for the call that actually tore down.
    pub fn teardown<P: Platform>(&mut self, platform: &mut P) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        if let Some(handle) = self.frame.take() {
            platform.cancel_frame(handle);
        }
        for id in self.listeners.drain(..) {
            platform.remove_listener(id);
        }
        log::debug!("lifecycle torn down");
        true
    }
}
