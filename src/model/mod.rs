//! Agent Definition Model
//!
//! Represents a conversational agent as structured data: intents with their
//! parameters, system and custom entities, contexts, and the locales the
//! agent supports. The model validates referential integrity and exposes
//! read/write access for editing tools; it carries no concurrency or
//! persistence machinery.

pub mod agent;
pub mod context;
pub mod entity;
pub mod intent;

pub use agent::{AgentDefinition, AgentManifest, ValidationReport};
pub use context::{Context, DEFAULT_CONTEXT_LIFESPAN};
pub use entity::{CustomEntity, EntityEntry, EntityRef, SystemEntity};
pub use intent::{event_name, validate_intent_name, Intent, Parameter};
