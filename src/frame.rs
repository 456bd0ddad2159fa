// prologue - swi-prolog bindings for rust
// Copyright (C) 2025  Andrew Chi

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

use {
    crate::{
        Error, Prolog,
        sys::{
            PL_chars_to_term, PL_close_foreign_frame, PL_copy_term_ref, PL_discard_foreign_frame,
            PL_mark_string_buffers, PL_new_term_ref, PL_new_term_refs, PL_open_foreign_frame,
            PL_release_string_buffers_from_mark, buf_mark_t, fid_t, term_t,
        },
        term::Term,
        utils::c_predicate,
    },
    std::{ffi::CString, marker::PhantomData, mem::ManuallyDrop},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Release {
    /// Keep bindings, drop term references.
    Close,
    /// Undo bindings and drop term references.
    Discard,
}

#[derive(Debug)]
pub(crate) struct FrameSlot {
    fid: fid_t,
    release: Option<Release>,
}

/// Foreign frame that owns every term reference made while it is the innermost frame.
///
/// Frames are a stack in the engine. Releasing a frame that still has frames opened above it is
/// postponed until those are released.
#[derive(Debug)]
pub struct Frame<'p> {
    prolog: &'p Prolog,
    fid: fid_t,
}
impl<'p> Frame<'p> {
    pub(crate) fn open(prolog: &'p Prolog) -> Self {
        let fid = unsafe { PL_open_foreign_frame() };
        prolog.frames.borrow_mut().push(FrameSlot { fid, release: None });

        Self { prolog, fid }
    }

    /// Whether no other frame is open above this one.
    pub fn is_innermost(&self) -> bool {
        self.prolog
            .frames
            .borrow()
            .last()
            .is_some_and(|slot| slot.fid == self.fid)
    }

    /// The engine allocates term references in the innermost frame only.
    fn assert_innermost(&self) {
        assert!(
            self.is_innermost(),
            "term references can only be made in the innermost open frame"
        );
    }

    /// # Panics
    ///
    /// If a frame opened after this one is still open.
    pub fn new_term_ref(&self) -> Term<'_> {
        self.assert_innermost();
        unsafe { Term::from_raw(PL_new_term_ref()) }
    }

    /// Allocate `len` consecutive term references.
    ///
    /// # Panics
    ///
    /// If a frame opened after this one is still open.
    pub fn new_term_refs(&self, len: usize) -> Terms<'_> {
        self.assert_innermost();
        Terms {
            base: unsafe { PL_new_term_refs(len) },
            len,
            _marker: PhantomData,
        }
    }

    /// New reference in this frame to the term behind `term`.
    pub(crate) fn copy_term_ref(&self, term: &Term<'_>) -> Term<'_> {
        self.assert_innermost();
        unsafe { Term::from_raw(PL_copy_term_ref(term.as_raw())) }
    }

    /// Read `text` as a term.
    pub fn parse(&self, text: &str) -> Result<Term<'_>, Error> {
        let source = CString::new(text)?;
        let term = self.new_term_ref();

        c_predicate(|| unsafe { PL_chars_to_term(source.as_ptr(), term.as_raw()) })
            .then_some(term)
            .ok_or_else(|| Error::Syntax(text.to_owned()))
    }

    /// Release the frame but keep the bindings made inside it.
    pub fn close(self) {
        ManuallyDrop::new(self).release(Release::Close)
    }

    fn release(&self, release: Release) {
        let mut frames = self.prolog.frames.borrow_mut();
        if let Some(slot) = frames.iter_mut().rev().find(|slot| slot.fid == self.fid) {
            slot.release = Some(release);
        }
        if frames.last().is_some_and(|slot| slot.fid != self.fid) {
            tracing::warn!(fid = self.fid, "foreign frame released out of order");
        }

        while let Some(&FrameSlot {
            fid,
            release: Some(release),
        }) = frames.last()
        {
            frames.pop();
            match release {
                Release::Close => unsafe { PL_close_foreign_frame(fid) },
                Release::Discard => unsafe { PL_discard_foreign_frame(fid) },
            }
        }
    }
}
impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.release(Release::Discard)
    }
}

/// Consecutive term references, as used for argument vectors.
#[derive(Clone, Copy, Debug)]
pub struct Terms<'f> {
    base: term_t,
    len: usize,
    _marker: PhantomData<&'f ()>,
}
impl<'f> Terms<'f> {
    pub fn as_raw(&self) -> term_t {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<Term<'f>> {
        (index < self.len).then(|| unsafe { Term::from_raw(self.base + index) })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Term<'f>> + use<'f> {
        let base = self.base;
        (0..self.len).map(move |index| unsafe { Term::from_raw(base + index) })
    }
}

/// Releases text buffers handed out by the engine since construction.
pub(crate) struct StringsMark(buf_mark_t);
impl StringsMark {
    pub fn new() -> Self {
        let mut mark = 0;
        unsafe { PL_mark_string_buffers(&raw mut mark) };
        Self(mark)
    }
}
impl Drop for StringsMark {
    fn drop(&mut self) {
        unsafe { PL_release_string_buffers_from_mark(self.0) }
    }
}
