//! Declarative settings forms for admin panels
//!
//! `settings-framework` turns a data description of sections and fields into
//! host registrations and HTML form markup, mapping stored values back into
//! the controls on redisplay.
//!
//! # Architecture
//!
//! - **Schema-first**: a [`SettingsDocument`] is loaded once from YAML, JSON,
//!   TOML or an in-memory value and is immutable afterwards
//! - **Injected host**: storage, registration and assets go through the
//!   traits in [`host`]; [`memory`] provides in-process implementations
//! - **Hooks**: document, defaults and validation filters plus named
//!   render actions live on a [`HookBus`]
//! - **Lenient registration**: sections and fields without an id or title
//!   are skipped, unknown field types render nothing

pub mod config;
pub mod error;
pub mod framework;
pub mod hooks;
pub mod host;
pub mod loader;
pub mod memory;
pub mod registrar;
pub mod render;
pub mod source;
pub mod store;
pub mod types;
pub mod widgets;

pub use config::FrameworkConfig;
pub use error::{Result, SettingsError};
pub use framework::{SettingsFramework, SettingsFrameworkBuilder};
pub use hooks::HookBus;
pub use host::{
    AssetQueue, FieldContext, FieldRegistration, OptionStore, Sanitizer, SectionRegistration,
    SettingsCallbacks, SettingsRegistry,
};
pub use memory::{MemoryOptionStore, RecordedAssets, SettingSlot, SettingsPage};
pub use render::FieldRenderer;
pub use source::{DocumentSource, SourceFormat};
pub use types::{
    Choices, FieldDef, FieldDefaults, FieldType, ResolvedField, SectionDef, SettingsDocument,
    StoredValueMap, Tab,
};
pub use widgets::{DefaultWidgets, Widgets};
