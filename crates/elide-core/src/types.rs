use serde::{Deserialize, Serialize};
use std::fmt;

/// Static type of an SSA value or of the slot an access reads or writes.
///
/// Only reference-typed accesses need GC barriers; primitive slots hold no
/// pointers the collector could relocate or recolor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Ref,
    Int,
}

impl Type {
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Ref)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Type::Ref => "ref",
            Type::Int => "int",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ref" => Some(Type::Ref),
            "int" => Some(Type::Int),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
