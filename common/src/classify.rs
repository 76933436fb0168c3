use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Lazy,
    NonLazy,
}

impl Variant {
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Lazy => "Lazy",
            Variant::NonLazy => "Non-lazy",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decides the variant of a run from the directory argument alone.
///
/// Directory naming was never consistent between experiments, so each
/// command picks the marker it tests for and everything else falls into
/// the other variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classifier {
    /// `-lazy` in the path means lazy, anything else is non-lazy
    ContainsLazy,
    /// `-nonlazy` in the path means non-lazy, anything else is lazy
    ContainsNonLazy,
}

impl Classifier {
    pub fn classify(&self, dir: &str) -> Variant {
        match self {
            Classifier::ContainsLazy => {
                if dir.contains("-lazy") {
                    Variant::Lazy
                } else {
                    Variant::NonLazy
                }
            }
            Classifier::ContainsNonLazy => {
                if dir.contains("-nonlazy") {
                    Variant::NonLazy
                } else {
                    Variant::Lazy
                }
            }
        }
    }
}
