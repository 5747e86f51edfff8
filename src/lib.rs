//! Host-side integration for an embedded BIM/IFC viewer widget.
//!
//! DESIGN
//! ======
//! - `host`: lifecycle of one viewer widget (create, destroy, capture)
//! - `widget`: capability traits the widget implements
//! - `sync`: publishing captured BCF viewpoints over HTTP
//! - `transport`: data adapter the widget loads models through
//! - `board`: saved-query Kanban board contract used next to the viewer

pub mod board;
pub mod config;
pub mod error;
pub mod host;
pub mod mount;
pub mod selection;
pub mod sync;
pub mod transport;
pub mod viewpoint;
pub mod widget;

pub use error::{ErrorCode, ViewerError};
pub use host::{HostPhase, ViewerHost};
pub use viewpoint::{BcfCreationOptions, Viewpoint};
