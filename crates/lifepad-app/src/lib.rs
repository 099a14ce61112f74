//! Shared plumbing for the lifepad terminal front end.

pub mod terminal;

pub mod renderer {
    use anyhow::Result;
    use lifepad_core::Session;

    /// Context handed to renderer implementations.
    ///
    /// The session is owned by value: exactly one processing loop drives it
    /// for the whole run, so there is nothing to share or lock.
    pub struct RendererContext {
        pub session: Session,
    }

    pub trait Renderer {
        /// Stable identifier describing the renderer implementation.
        fn name(&self) -> &'static str;

        /// Launch the renderer; blocks until the session ends.
        fn run(&self, ctx: RendererContext) -> Result<()>;
    }
}

pub use terminal::TerminalRenderer;
