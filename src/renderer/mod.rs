//! Rendering collaborator
//!
//! The runner hands the renderer a read-only view of the session and the
//! active core once per frame, after the simulation step. Drawing itself is
//! the host's business.

use crate::sim::GameSession;

pub trait Renderer<S> {
    fn render(&mut self, session: &GameSession, game: &S);
}

impl<S, F> Renderer<S> for F
where
    F: FnMut(&GameSession, &S),
{
    fn render(&mut self, session: &GameSession, game: &S) {
        self(session, game)
    }
}

/// Renderer that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl<S> Renderer<S> for NullRenderer {
    fn render(&mut self, _session: &GameSession, _game: &S) {}
}
