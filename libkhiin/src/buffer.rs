//! The composition buffer: an ordered run of `BufferElement`s.
//!
//! Display carets index the concatenated display text of the elements
//! (converted text for converted elements, composed text otherwise). Raw
//! carets index the concatenated raw input. Both count codepoints.
//!
//! Editing a composition usually means splitting off the untouched text on
//! either side, rebuilding the middle and joining the pieces again. An
//! [`EditSession`] holds the split and joins on drop, so every exit path
//! leaves the buffer whole.

use std::ops::{Deref, DerefMut, Range};

use khiin_core::unicode::{contains_hanji, needs_virtual_space, prefix, suffix};

use crate::buffer_element::BufferElement;
use crate::keyconfig::KeyConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buffer {
    elements: Vec<BufferElement>,
}

impl From<Vec<BufferElement>> for Buffer {
    fn from(elements: Vec<BufferElement>) -> Self {
        Self { elements }
    }
}

impl From<BufferElement> for Buffer {
    fn from(element: BufferElement) -> Self {
        Self {
            elements: vec![element],
        }
    }
}

impl FromIterator<BufferElement> for Buffer {
    fn from_iter<I: IntoIterator<Item = BufferElement>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Buffer {
    type Item = BufferElement;
    type IntoIter = std::vec::IntoIter<BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BufferElement> {
        self.elements.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&BufferElement> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BufferElement> {
        self.elements.get_mut(index)
    }

    pub fn first(&self) -> Option<&BufferElement> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&BufferElement> {
        self.elements.last()
    }

    pub fn push(&mut self, element: BufferElement) {
        self.elements.push(element);
    }

    pub fn insert(&mut self, index: usize, element: BufferElement) {
        self.elements.insert(index.min(self.elements.len()), element);
    }

    pub fn remove(&mut self, index: usize) -> Option<BufferElement> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    pub fn append(&mut self, other: Buffer) {
        self.elements.extend(other.elements);
    }

    /// Display text of the whole buffer.
    pub fn text(&self) -> String {
        self.elements.iter().map(|e| e.display()).collect()
    }

    pub fn text_size(&self) -> usize {
        self.elements.iter().map(|e| e.size()).sum()
    }

    /// Display size of the elements in `range`.
    pub fn text_size_of(&self, range: Range<usize>) -> usize {
        self.elements[clamp(range, self.len())]
            .iter()
            .map(|e| e.size())
            .sum()
    }

    pub fn raw_text(&self) -> String {
        self.elements.iter().map(|e| e.raw()).collect()
    }

    pub fn raw_text_size(&self) -> usize {
        self.elements.iter().map(|e| e.raw_size()).sum()
    }

    pub fn raw_size_of(&self, range: Range<usize>) -> usize {
        self.elements[clamp(range, self.len())]
            .iter()
            .map(|e| e.raw_size())
            .sum()
    }

    /// Raw text from element `index` to the end.
    pub fn raw_text_from(&self, index: usize) -> String {
        self.elements
            .iter()
            .skip(index)
            .map(|e| e.raw())
            .collect()
    }

    /// The element holding display caret `caret`, and the caret's offset
    /// into it. A caret on a boundary belongs to the element on its left.
    /// Returns `len()` when the caret is past the end.
    pub fn element_at_caret(&self, caret: usize) -> (usize, usize) {
        let mut remainder = caret;
        for (i, el) in self.elements.iter().enumerate() {
            let size = el.size();
            if remainder > size {
                remainder -= size;
            } else {
                return (i, remainder);
            }
        }
        (self.len(), remainder)
    }

    /// Same as [`Buffer::element_at_caret`] for a raw caret.
    pub fn element_at_raw_caret(&self, raw_caret: usize) -> (usize, usize) {
        let mut remainder = raw_caret;
        for (i, el) in self.elements.iter().enumerate() {
            let size = el.raw_size();
            if remainder > size {
                remainder -= size;
            } else {
                return (i, remainder);
            }
        }
        (self.len(), remainder)
    }

    /// Display caret for a raw caret.
    pub fn caret_from(&self, kc: &KeyConfig, raw_caret: usize) -> usize {
        let (index, remainder) = self.element_at_raw_caret(raw_caret);
        let before = self.text_size_of(0..index);
        match self.elements.get(index) {
            Some(el) => before + el.raw_to_composed_caret(kc, remainder),
            None => before,
        }
    }

    /// Raw caret for a display caret.
    pub fn raw_caret_from(&self, kc: &KeyConfig, caret: usize) -> usize {
        let (index, remainder) = self.element_at_caret(caret);
        let before = self.raw_size_of(0..index);
        match self.elements.get(index) {
            Some(el) => before + el.composed_to_raw_caret(kc, remainder),
            None => before,
        }
    }

    /// True when nothing in the buffer has been converted.
    pub fn all_composing(&self) -> bool {
        self.elements
            .iter()
            .filter(|e| !e.is_virtual_space())
            .all(|e| !e.is_converted())
    }

    pub fn has_composing(&self) -> bool {
        self.elements
            .iter()
            .any(|e| !e.is_virtual_space() && !e.is_converted())
    }

    pub fn set_converted(&mut self, converted: bool) {
        for el in &mut self.elements {
            el.set_converted(converted);
        }
    }

    pub fn set_selected(&mut self, selected: bool) {
        for el in &mut self.elements {
            el.set_selected(selected);
        }
    }

    /// Keep only the first run of composing elements. Returns the converted
    /// elements before it and everything after it.
    pub fn isolate_composing(&mut self) -> (Buffer, Buffer) {
        let start = self
            .elements
            .iter()
            .position(|e| !e.is_converted() && !e.is_virtual_space())
            .unwrap_or(self.len());
        let end = self.elements[start..]
            .iter()
            .position(|e| e.is_converted())
            .map_or(self.len(), |i| start + i);

        let post = Buffer::from(self.elements.split_off(end));
        let pre = Buffer::from(self.elements.drain(..start).collect::<Vec<_>>());
        (pre, post)
    }

    /// Keep only the element under display caret `caret`. Returns the
    /// elements before and after it.
    ///
    /// A caret at the very end keeps nothing. An element showing Han text is
    /// cut at the caret into two converted, selected plain text pieces that
    /// go to either side, so typing starts a fresh composition between them.
    pub fn split_for_composition(&mut self, caret: usize) -> (Buffer, Buffer) {
        if caret >= self.text_size() {
            let pre = std::mem::take(self);
            return (pre, Buffer::new());
        }

        let (index, _) = self.element_at_caret(caret);
        let mut post = Buffer::from(self.elements.split_off(index + 1));
        let mut pre = Buffer::from(self.elements.drain(..index).collect::<Vec<_>>());

        let shows_hanji = self
            .elements
            .first()
            .is_some_and(|e| contains_hanji(&e.display()));

        if shows_hanji {
            let text = self.text();
            let at = caret - pre.text_size();
            let (lhs, rhs) = (prefix(&text, at), suffix(&text, at));
            if !lhs.is_empty() {
                pre.push(
                    BufferElement::plaintext(lhs)
                        .with_converted(true)
                        .with_selected(true),
                );
            }
            if !rhs.is_empty() {
                post.insert(
                    0,
                    BufferElement::plaintext(rhs)
                        .with_converted(true)
                        .with_selected(true),
                );
            }
            self.clear();
        }

        (pre, post)
    }

    /// Keep elements from `index` on. Returns the ones before it.
    pub fn split_at_element(&mut self, index: usize) -> Buffer {
        let index = index.min(self.len());
        Buffer::from(self.elements.drain(..index).collect::<Vec<_>>())
    }

    /// Reassemble `pre + self + post`.
    pub fn join(&mut self, pre: Buffer, post: Buffer) {
        let mut elements = pre.elements;
        elements.append(&mut self.elements);
        elements.extend(post.elements);
        self.elements = elements;
    }

    /// Replace the elements in `range` with `other`. Returns the index just
    /// past the inserted elements.
    pub fn replace(&mut self, range: Range<usize>, other: Buffer) -> usize {
        let range = clamp(range, self.len());
        let end = range.start + other.len();
        self.elements.splice(range, other.elements);
        end
    }

    pub fn remove_virtual_spacing(&mut self) {
        self.elements.retain(|e| !e.is_virtual_space());
    }

    /// Rebuild the virtual spaces: one wherever two adjacent elements would
    /// otherwise run together on display. A space is converted (or selected)
    /// when both of its neighbours are.
    pub fn adjust_virtual_spacing(&mut self) {
        self.remove_virtual_spacing();

        for i in (1..self.elements.len()).rev() {
            let lhs = &self.elements[i - 1];
            let rhs = &self.elements[i];
            if !needs_virtual_space(&lhs.display(), &rhs.display()) {
                continue;
            }

            let space = BufferElement::spacer()
                .with_converted(lhs.is_converted() && rhs.is_converted())
                .with_selected(lhs.is_selected() && rhs.is_selected());
            self.elements.insert(i, space);
        }
    }

    /// Drop virtual spaces at either end.
    pub fn strip_virtual_spacing(&mut self) {
        while self.elements.first().is_some_and(|e| e.is_virtual_space()) {
            self.elements.remove(0);
        }
        while self.elements.last().is_some_and(|e| e.is_virtual_space()) {
            self.elements.pop();
        }
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

/// A buffer split around the part being edited.
///
/// Dereferences to the part being edited. The pieces before and after it
/// are joined back when the session is dropped.
#[derive(Debug)]
pub struct EditSession<'a> {
    buffer: &'a mut Buffer,
    pre: Buffer,
    post: Buffer,
}

impl<'a> EditSession<'a> {
    /// Edit the first run of composing elements.
    pub fn isolate_composing(buffer: &'a mut Buffer) -> Self {
        let (pre, post) = buffer.isolate_composing();
        Self { buffer, pre, post }
    }

    /// Edit the element under display caret `caret`.
    pub fn split_for_composition(buffer: &'a mut Buffer, caret: usize) -> Self {
        let (pre, post) = buffer.split_for_composition(caret);
        Self { buffer, pre, post }
    }

    /// Edit everything from element `index` on.
    pub fn split_at_element(buffer: &'a mut Buffer, index: usize) -> Self {
        let pre = buffer.split_at_element(index);
        Self {
            buffer,
            pre,
            post: Buffer::new(),
        }
    }

    pub fn pre(&self) -> &Buffer {
        &self.pre
    }

    pub fn post(&self) -> &Buffer {
        &self.post
    }
}

impl Deref for EditSession<'_> {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        &*self.buffer
    }
}

impl DerefMut for EditSession<'_> {
    fn deref_mut(&mut self) -> &mut Buffer {
        &mut *self.buffer
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        let pre = std::mem::take(&mut self.pre);
        let post = std::mem::take(&mut self.post);
        self.buffer.join(pre, post);
    }
}
