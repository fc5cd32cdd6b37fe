//! Turtle bundle descriptions.
//!
//! An LV2 bundle carries a `manifest.ttl` pointing at the binary and a
//! plugin description listing every port. The program port is an integer
//! enumeration with one scale point per catalog entry, so hosts can show
//! preset names. Port indices and defaults come from the same tables the
//! runtime uses ([`Port`](crate::Port), [`Control`]).

use std::fmt::Write;

use sf2lv2_core::{Control, PresetCatalog};

use crate::ports::Port;
use crate::sys::{MIDI_EVENT_URI, URID_MAP_URI};

const PREFIXES: &str = "\
@prefix atom: <http://lv2plug.in/ns/ext/atom#> .
@prefix doap: <http://usefulinc.com/ns/doap#> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix lv2: <http://lv2plug.in/ns/lv2core#> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
";

/// Identity of a generated bundle.
#[derive(Debug, Clone)]
pub struct BundleInfo<'a> {
    /// Plugin URI.
    pub uri: &'a str,
    /// Plugin name (doap:name).
    pub name: &'a str,
    /// SoundFont name shown in the description comment.
    pub soundfont_name: &'a str,
    /// Shared library file name inside the bundle.
    pub binary: &'a str,
    /// Plugin description file name inside the bundle.
    pub description: &'a str,
    pub minor_version: u32,
    pub micro_version: u32,
}

/// Escape a value for a Turtle string literal.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Contents of `manifest.ttl`.
pub fn manifest_ttl(info: &BundleInfo<'_>) -> String {
    format!(
        "@prefix lv2: <http://lv2plug.in/ns/lv2core#> .\n\
         @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
         \n\
         <{uri}>\n    a lv2:Plugin ;\n    lv2:binary <{binary}> ;\n    rdfs:seeAlso <{description}> .\n",
        uri = info.uri,
        binary = info.binary,
        description = info.description,
    )
}

/// Contents of the plugin description file.
pub fn plugin_ttl(info: &BundleInfo<'_>, catalog: &PresetCatalog) -> String {
    let mut ports: Vec<String> = Vec::new();
    let mut index = 0u32;
    while let Some(port) = Port::from_index(index) {
        ports.push(port_ttl(port, index, catalog));
        index += 1;
    }

    let mut out = String::from(PREFIXES);
    out.push('\n');
    let _ = write!(
        out,
        "<{uri}>\n    a lv2:InstrumentPlugin, lv2:Plugin ;\n    lv2:requiredFeature <{urid_map}> ;\n    lv2:port {ports} ;\n",
        uri = info.uri,
        urid_map = uri_str(URID_MAP_URI),
        ports = ports.join(" , "),
    );
    let _ = write!(
        out,
        "    doap:name \"{name}\" ;\n    doap:license \"MIT\" ;\n    doap:maintainer [\n        foaf:name \"Isla Instruments\" ;\n        foaf:homepage <https://www.islainstruments.com> ;\n    ] ;\n    rdfs:comment \"This plugin wraps the {soundfont} soundfont as an LV2 instrument.\" ;\n    lv2:minorVersion {minor} ;\n    lv2:microVersion {micro} .\n",
        name = escape_literal(info.name),
        soundfont = escape_literal(info.soundfont_name),
        minor = info.minor_version,
        micro = info.micro_version,
    );
    out
}

fn port_ttl(port: Port, index: u32, catalog: &PresetCatalog) -> String {
    let body = match port {
        Port::Events => format!(
            "a lv2:InputPort, atom:AtomPort ;\n        atom:bufferType atom:Sequence ;\n        atom:supports <{midi}> ;\n        lv2:designation lv2:control ;\n        lv2:index {index} ;\n        lv2:symbol \"events\" ;\n        lv2:name \"Events\" ;",
            midi = uri_str(MIDI_EVENT_URI),
        ),
        Port::AudioLeft => audio_port(index, "audio_out_l", "Audio Output Left"),
        Port::AudioRight => audio_port(index, "audio_out_r", "Audio Output Right"),
        Port::Level => format!(
            "a lv2:InputPort, lv2:ControlPort ;\n        lv2:index {index} ;\n        lv2:symbol \"level\" ;\n        lv2:name \"Level\" ;\n        lv2:default 1.0 ;\n        lv2:minimum 0.0 ;\n        lv2:maximum 2.0 ;"
        ),
        Port::Program => program_port(index, catalog),
        Port::Control(control) => control_port(index, control),
    };
    format!("[\n        {body}\n    ]")
}

fn audio_port(index: u32, symbol: &str, name: &str) -> String {
    format!(
        "a lv2:OutputPort, lv2:AudioPort ;\n        lv2:index {index} ;\n        lv2:symbol \"{symbol}\" ;\n        lv2:name \"{name}\" ;"
    )
}

fn program_port(index: u32, catalog: &PresetCatalog) -> String {
    let points: Vec<String> = catalog
        .scale_points()
        .map(|(value, name)| {
            format!(
                "[\n            rdfs:label \"{}\" ;\n            rdf:value {value}\n        ]",
                escape_literal(name)
            )
        })
        .collect();

    format!(
        "a lv2:InputPort, lv2:ControlPort ;\n        lv2:index {index} ;\n        lv2:symbol \"program\" ;\n        lv2:name \"Program\" ;\n        lv2:portProperty lv2:enumeration, lv2:integer ;\n        lv2:default 0 ;\n        lv2:minimum 0 ;\n        lv2:maximum {max} ;\n        lv2:scalePoint {points} ;",
        max = catalog.len().saturating_sub(1),
        points = points.join(" , "),
    )
}

fn control_port(index: u32, control: Control) -> String {
    format!(
        "a lv2:InputPort, lv2:ControlPort ;\n        lv2:index {index} ;\n        lv2:symbol \"{symbol}\" ;\n        lv2:name \"{label}\" ;\n        lv2:default {default:.1} ;\n        lv2:minimum 0.0 ;\n        lv2:maximum 1.0 ;\n        rdfs:comment \"Maps to MIDI CC {cc} ({cc_name})\" ;",
        symbol = control.name(),
        label = control.label(),
        default = control.initial_value(),
        cc = control.controller(),
        cc_name = control.controller_name(),
    )
}

fn uri_str(uri: &std::ffi::CStr) -> &str {
    uri.to_str().unwrap_or_default()
}
