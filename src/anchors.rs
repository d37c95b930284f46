//! Per-document anchor bookkeeping shared by the parser and the emitter.

use std::collections::HashMap;

use ahash::RandomState;

/// State of an anchor name within the current document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AnchorState {
    Unseen,
    Defined,
}

/// Anchor names seen so far in the current document.
///
/// A name moves from `Unseen` to `Defined` on its first definition and stays there;
/// redefinition is allowed and simply shadows the earlier node for later aliases.
/// [`reset`](AnchorTable::reset) returns every name to `Unseen` at a document boundary.
#[derive(Debug, Default)]
pub(crate) struct AnchorTable {
    /// Name to number of definitions in this document.
    defined: HashMap<String, usize, RandomState>,
}

impl AnchorTable {
    pub(crate) fn state(&self, name: &str) -> AnchorState {
        if self.defined.contains_key(name) {
            AnchorState::Defined
        } else {
            AnchorState::Unseen
        }
    }

    /// Record a definition. Returns true if the name was already defined (a redefinition).
    pub(crate) fn define(&mut self, name: &str) -> bool {
        match self.defined.get_mut(name) {
            Some(count) => {
                *count += 1;
                true
            }
            None => {
                self.defined.insert(name.to_owned(), 1);
                false
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.defined.clear();
    }
}
