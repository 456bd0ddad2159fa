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
        Prolog,
        frame::StringsMark,
        init,
        sys::{
            PL_atom_mbchars, PL_new_atom_mbchars, PL_register_atom, PL_unregister_atom,
            PROLOGUE_REEXPORTS_BUF_STACK, PROLOGUE_REEXPORTS_REP_UTF8, atom_t,
        },
        utils::c_predicate,
    },
    std::{
        ffi::c_int,
        fmt::{self, Debug, Display, Formatter},
        hash::{Hash, Hasher},
        ptr, slice,
    },
};

impl Prolog {
    pub fn make_atom<S>(&self, name: &S) -> Atom
    where
        S: AsRef<str> + ?Sized,
    {
        Atom::intern(name.as_ref())
    }
}

/// Interned name holding a reference on its atom until dropped.
pub struct Atom {
    handle: atom_t,
    name: String,
}
impl Atom {
    pub(crate) fn intern(name: &str) -> Self {
        let handle = unsafe {
            PL_new_atom_mbchars(
                PROLOGUE_REEXPORTS_REP_UTF8 as c_int,
                name.len(),
                name.as_ptr().cast(),
            )
        };

        Self {
            handle,
            name: name.to_owned(),
        }
    }

    /// Take a new reference on an existing atom.
    ///
    /// # Safety
    ///
    /// `handle` must be an atom of the running engine.
    pub unsafe fn from_raw(handle: atom_t) -> Self {
        unsafe { PL_register_atom(handle) };

        Self {
            handle,
            name: text_of(handle),
        }
    }

    pub fn as_raw(&self) -> atom_t {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Give up the reference on the atom now.
    pub fn release(self) {
        drop(self)
    }
}
impl Clone for Atom {
    fn clone(&self) -> Self {
        unsafe { PL_register_atom(self.handle) };

        Self {
            handle: self.handle,
            name: self.name.clone(),
        }
    }
}
impl Drop for Atom {
    fn drop(&mut self) {
        // the atom table is gone after cleanup
        if !init::is_cleaned() {
            unsafe { PL_unregister_atom(self.handle) }
        }
    }
}
impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}
impl Eq for Atom {}
impl Hash for Atom {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.handle.hash(state)
    }
}
impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(&self.name)
    }
}
impl Debug for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("Atom").field(&self.name).finish()
    }
}

fn text_of(handle: atom_t) -> String {
    let _mark = StringsMark::new();
    let mut len = 0;
    let mut chars = ptr::null_mut();

    if c_predicate(|| unsafe {
        PL_atom_mbchars(
            handle,
            &raw mut len,
            &raw mut chars,
            PROLOGUE_REEXPORTS_REP_UTF8 | PROLOGUE_REEXPORTS_BUF_STACK,
        )
    }) {
        String::from_utf8_lossy(unsafe { slice::from_raw_parts(chars.cast::<u8>(), len) })
            .into_owned()
    } else {
        String::new()
    }
}
