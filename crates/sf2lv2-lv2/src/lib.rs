//! # sf2lv2-lv2
//!
//! LV2 glue for sf2lv2 instruments.
//!
//! This crate exposes an [`Lv2Plugin`] through the LV2 C ABI. It handles the
//! host-facing details:
//!
//! - The descriptor and its lifecycle entry points ([`Descriptor`])
//! - Host features and URID mapping ([`Features`])
//! - Atom sequence decoding for the event input ([`AtomEvents`])
//! - Port connections ([`PortConnections`])
//! - Turtle descriptions for generated bundles ([`ttl`])
//!
//! ## Architecture
//!
//! ```text
//! LV2 host
//!        ↓ (lv2_descriptor, C ABI)
//! Descriptor (generic over Lv2Plugin)
//!        ↓
//! SoundFontInstance → sf2lv2_core::Instrument
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sf2lv2_lv2::{export_lv2, PluginConfig};
//!
//! static CONFIG: PluginConfig =
//!     PluginConfig::new(c"https://example.com/plugins/piano", "Piano");
//!
//! export_lv2!(CONFIG);
//! ```

pub mod atom;
pub mod descriptor;
pub mod export;
pub mod features;
pub mod instance;
pub mod logging;
pub mod plugin;
pub mod ports;
pub mod sys;
pub mod ttl;

pub use atom::AtomEvents;
pub use descriptor::Descriptor;
pub use features::{Features, UridMapper};
pub use instance::SoundFontInstance;
pub use plugin::Lv2Plugin;
pub use ports::{Port, PortConnections, PORT_COUNT};

// Re-export shared types from sf2lv2-core
pub use sf2lv2_core::{LoadError, LoadResult, PluginConfig};
