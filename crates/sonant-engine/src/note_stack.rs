//! Monophonic note priority ("last note held").
//!
//! The stack records every press in order, duplicates included, alongside
//! the set of keys still physically held. Releasing a key only clears its
//! held flag; stale entries are discarded lazily when [`NoteStack::resolve`]
//! walks down from the top. Each entry is popped at most once, so resolution
//! is amortized O(1) per release.

use sonant_core::MAX_NOTE;

const NOTE_COUNT: usize = MAX_NOTE as usize + 1;

/// Press order and held set for monophonic note priority.
#[derive(Debug, Clone)]
pub struct NoteStack {
    order: Vec<u8>,
    held: [bool; NOTE_COUNT],
}

impl NoteStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            held: [false; NOTE_COUNT],
        }
    }

    /// Record a key press. The note becomes the top of the stack even if it
    /// is already present further down.
    pub fn press(&mut self, note: u8) {
        if let Some(held) = self.held.get_mut(usize::from(note)) {
            *held = true;
            self.order.push(note);
        }
    }

    /// Record a key release. Returns whether the note was held.
    pub fn release(&mut self, note: u8) -> bool {
        self.held
            .get_mut(usize::from(note))
            .map(|held| std::mem::replace(held, false))
            .unwrap_or(false)
    }

    /// Most recently pressed note that is still held.
    ///
    /// Pops stale entries off the top until a held note is found. Returns
    /// `None`, with the stack empty, when no key is held.
    pub fn resolve(&mut self) -> Option<u8> {
        // Each pass either returns or shrinks the stack.
        while let Some(&top) = self.order.last() {
            if self.is_held(top) {
                return Some(top);
            }
            self.order.pop();
        }
        None
    }

    /// Whether `note` is currently held.
    pub fn is_held(&self, note: u8) -> bool {
        self.held.get(usize::from(note)).copied().unwrap_or(false)
    }

    /// Held notes in ascending order.
    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.held
            .iter()
            .enumerate()
            .filter(|&(_, &held)| held)
            .map(|(note, _)| note as u8)
    }

    /// Number of entries on the stack, stale ones included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the stack has no entries.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Forget every press and release.
    pub fn clear(&mut self) {
        self.order.clear();
        self.held = [false; NOTE_COUNT];
    }
}

impl Default for NoteStack {
    fn default() -> Self {
        Self::new()
    }
}
