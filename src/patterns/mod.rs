//! Pattern detectors (spec §4.4) — pure predicates over AST shapes and
//! already-resolved types, one file per idiom, mirroring the teacher's
//! one-rule-per-file layout under `rules/semantic/`.

pub mod closure_class;
pub mod derive_call;
pub mod framework_ui;
pub mod setmetatable;

pub use closure_class::{detect_closure_class, ClosureClass};
pub use derive_call::{detect_derive_call, DeriveCall};
pub use framework_ui::{detect_ui_base_call, detect_ui_child_call};
pub use setmetatable::detect_setmetatable_call;
