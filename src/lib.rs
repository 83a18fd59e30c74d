//! figloom turns a JSON figure document into per-figure PDF pages and one combined document.
//!
//! The public API is session-oriented:
//!
//! - Load and validate a [`FigureSet`] (or just [`validate`] a file without rendering)
//! - Create a [`FigureSession`] and register renderers on it
//! - [`FigureSession::build`] dispatches every figure in declaration order, composes
//!   `"multi"` figures into grid pages and concatenates the top-level pages
//!
//! Renderer type strings resolve, in order, to registered names, `"module:function"` references
//! to external renderer programs, and plugins advertised through [`inventory`] under
//! [`PLUGIN_GROUP`]. The stock `blank` and `image` renderers ship as plugins.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod compose;
pub(crate) mod merge;
pub(crate) mod registry;
pub(crate) mod session;
pub(crate) mod spec;
pub(crate) mod stock;

pub use inventory;

pub use crate::compose::compose_grid;
pub use crate::compose::grid::GridLayout;
pub use crate::foundation::error::{FigError, FigResult};
pub use crate::merge::merge;
pub use crate::registry::command::CommandRenderer;
pub use crate::registry::plugin::{PLUGIN_GROUP, RendererPlugin};
pub use crate::registry::renderer::{FnRenderer, RenderCall, Renderer, renderer_fn};
pub use crate::registry::resolve::{BindingKind, RendererBinding, RendererRegistry};
pub use crate::session::build::{BuildOpts, FigureSession, RunState};
pub use crate::session::report::{BuildReport, OutputArtifact, SkippedFigure};
pub use crate::spec::load::{load, validate};
pub use crate::spec::model::{FigureKind, FigureSet, FigureSpec, MULTI_TYPE, MultiSpec};
pub use crate::spec::validate::{Finding, FindingKind, validate_value};
pub use crate::stock::blank::{BlankRenderer, write_blank_page};
pub use crate::stock::image::{ImageRenderer, write_image_page};
