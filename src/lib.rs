/*!
# `jsonpick` Library

A JSONPath query engine for `serde_json` documents: compile an expression
once, evaluate it many times to collect matched values or the canonical
paths that locate them, and optionally update every matched location in
place.
*/

pub mod error;
pub mod path;
