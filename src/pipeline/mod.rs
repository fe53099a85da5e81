//! The content-negotiated request/response pipeline.
//!
//! ```text
//! request ─▶ normalize (forms → canonical JSON) ─▶ context (negotiate once)
//!         ─▶ handler ─▶ Result<T, ApiError> ─▶ render (JSON or fragment)
//! ```

pub mod context;
pub mod deadline;
pub mod negotiate;
pub mod normalize;
pub mod render;
pub mod templates;

pub use context::{attach_context, Ctx, RequestContext};
pub use deadline::{enforce_deadline, Deadline};
pub use negotiate::{negotiate, Negotiation};
pub use normalize::{normalize_forms, Normalizer};
pub use render::{error_response, respond, Fragment, Representation};
