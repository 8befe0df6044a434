//! Live editing engine
//!
//! ## Modules
//!
//! - `host`: Collaborator traits (templates, fonts, storage)
//! - `timers`: Keyed debounce timers driven by an explicit clock
//! - `store`: Slide State Store and the render-facing projection
//! - `queue`: Live Layout Queue (debounce, de-duplication, run-id gating)
//! - `persist`: Persistence Coordinator
//! - `editor`: Command/query facade over all of the above

pub mod host;
pub mod timers;
pub mod store;
pub mod queue;
pub mod persist;
pub mod editor;

// Re-exports for convenience
pub use editor::{ImageTarget, LayoutEditor, TickReport};
pub use host::{Collaborators, FontLoader, FontReadiness, PersistSink, TemplateRegistry};
pub use persist::{SavePurpose, SaveRequest, SaveStatus};
pub use queue::{DrainStats, DrainStep, LiveLayoutWorkItem};
pub use store::{ProjectSeed, RenderState};
