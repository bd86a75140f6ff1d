//! The mechanical text emitter (spec §4.12).
//!
//! The node-to-text printer itself is out of scope per spec §1 ("a
//! straightforward tree-to-text printer"); what lives here is the thin,
//! indentation-tracking string buffer every generator module writes
//! through, plus the *scoped-swap* stack discipline (spec §5, §8 scenario
//! 6) used to install a temporary context for a subtree and restore the
//! previous one on exit. Grounded verbatim on `ScopedSwap<T>` in the
//! reference tool's `utils/General.h`.

use std::fmt::Write as _;

/// An indentation-tracking output buffer. Every generator module (records,
/// lowering, ether, nondet dump, address space, driver) writes its text
/// through one of these rather than returning ad hoc strings, so that
/// nested blocks indent consistently regardless of which module opened
/// them.
#[derive(Debug, Default)]
pub struct Emitter {
    buf: String,
    indent: usize,
}

impl Emitter {
    /// An empty emitter at indentation level 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text`, prefixed by the current indentation, followed by a
    /// newline.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    /// Appends a blank line, ignoring the current indentation.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Runs `f` with the indentation level increased by one, restoring it
    /// on return.
    pub fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }

    /// Consumes the emitter, returning the buffered text.
    pub fn into_string(self) -> String {
        self.buf
    }

    /// Borrows the buffered text so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Write for Emitter {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.buf.write_str(s)
    }
}

use std::fmt::Write;

/// A RAII guard which consumes a reference to a variable, copies its
/// current value out, overwrites it with a new value, and restores the
/// original on drop. Used to install a temporary lowering context (the
/// contract currently being lowered, the forward-declare flag for a
/// nested subtree, ...) for exactly the lifetime of a recursive call.
///
/// Grounded verbatim on `ScopedSwap<T>` in the reference tool's
/// `utils/General.h`; `T` must be `Clone` rather than merely copy
/// constructible, matching Rust's ownership model more closely than the
/// original's copy-constructor requirement.
pub struct ScopedSwap<'a, T: Clone> {
    slot: &'a mut T,
    old: T,
}

impl<'a, T: Clone> ScopedSwap<'a, T> {
    /// Sets `*slot` to `new`, remembering the previous value to restore on
    /// drop.
    pub fn new(slot: &'a mut T, new: T) -> Self {
        let old = slot.clone();
        *slot = new;
        Self { slot, old }
    }

    /// The value that was present when this swap was constructed.
    pub fn old(&self) -> &T {
        &self.old
    }
}

impl<T: Clone> Drop for ScopedSwap<'_, T> {
    fn drop(&mut self) {
        *self.slot = self.old.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scoped_swaps_restore_in_order() {
        // Mirrors spec §8 scenario 6: nest three swaps on the same
        // variable to 1, 2, 3; each pop restores the previous value.
        let mut value = 0i32;
        {
            let mut outer = ScopedSwap::new(&mut value, 1);
            assert_eq!(*outer.old(), 0);
            {
                let mut middle = ScopedSwap::new(&mut *outer.slot, 2);
                assert_eq!(*middle.old(), 1);
                {
                    let inner = ScopedSwap::new(&mut *middle.slot, 3);
                    assert_eq!(*inner.slot, 3);
                    assert_eq!(*inner.old(), 2);
                }
                assert_eq!(*middle.slot, 2);
            }
            assert_eq!(*outer.slot, 1);
        }
        assert_eq!(value, 0);
    }

    #[test]
    fn emitter_tracks_indentation() {
        let mut e = Emitter::new();
        e.line("outer");
        e.indented(|e| {
            e.line("inner");
        });
        e.line("outer again");
        assert_eq!(e.into_string(), "outer\n    inner\nouter again\n");
    }
}
