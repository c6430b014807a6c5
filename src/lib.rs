#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod interchange;
pub mod layout;
pub mod model;
pub mod persist;
pub mod theme;
pub mod workspace;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{EditorConfig, load_config};
pub use editor::{Command, CommandOutcome, Editor};
pub use error::{EditError, EditResult};
pub use layout::{LayoutOutcome, apply_auto_layout, resolve_collisions};
pub use model::{Anchor, Document, GraphEdge, GraphNode, LayoutMode, Position, Snapshot};
pub use persist::{JsonFileStore, MemoryStore, PersistedState, StateStore};
