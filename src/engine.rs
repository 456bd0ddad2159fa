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
        Error, Prolog, init,
        sys::{PL_thread_attach_engine, PL_thread_destroy_engine, PL_thread_self},
    },
    std::{cell::RefCell, ptr},
};

thread_local! {
    static PROLOG: Prolog = const { Prolog::new() };
    static ATTACHMENT: RefCell<Option<Attachment>> = const { RefCell::new(None) };
}

/// Engine of the current thread.
struct Attachment {
    /// Whether the engine was created by [attach] and should be destroyed with the thread.
    owned: bool,
}
impl Drop for Attachment {
    fn drop(&mut self) {
        if self.owned && !init::is_cleaned() {
            tracing::debug!("destroying thread engine");
            unsafe { PL_thread_destroy_engine() };
        }
    }
}

/// Make sure the current thread has an engine.
pub(crate) fn attach() -> Result<(), Error> {
    ATTACHMENT.with(|attachment| {
        let mut attachment = attachment.borrow_mut();
        if attachment.is_some() {
            return Ok(());
        }

        let (id, owned) = match unsafe { PL_thread_self() } {
            -1 => (unsafe { PL_thread_attach_engine(ptr::null_mut()) }, true),
            id => (id, false),
        };
        match id {
            -1 => return Err(Error::AttachEngine),
            -2 => tracing::warn!("swi-prolog was built without thread support"),
            id => tracing::debug!(id, owned, "using prolog engine"),
        }

        *attachment = Some(Attachment {
            owned: owned && id >= 0,
        });
        Ok(())
    })
}

pub(crate) fn with_current<F, O>(f: F) -> O
where
    F: for<'a> FnOnce(&'a Prolog) -> O,
{
    PROLOG.with(f)
}

/// Run `f` with the session of the current thread.
///
/// The engine is initialized with the default [Config](crate::Config) if [initialize](crate::initialize)
/// was not called yet, and an engine is attached to the thread on first use.
///
/// # Examples
///
/// ```
/// # use prologue::{Value, with_prolog};
/// # #[cfg(not(miri))]
/// assert_eq!(
///     with_prolog(|prolog| {
///         prolog.query("X is 6 * 7").unwrap().next().unwrap().unwrap()["X"].clone()
///     })
///     .unwrap(),
///     Value::Integer(42)
/// );
/// ```
pub fn with_prolog<F, O>(f: F) -> Result<O, Error>
where
    F: for<'a> FnOnce(&'a Prolog) -> O,
{
    init::ensure_initialized()?;
    attach()?;
    Ok(with_current(f))
}

#[cfg(test)]
mod tests {
    use {super::*, itertools::Itertools, std::thread};

    #[cfg_attr(miri, ignore)]
    #[test]
    fn multithreading() {
        fn spawn_query() -> thread::JoinHandle<()> {
            thread::spawn(|| {
                with_prolog(|prolog| {
                    assert_eq!(prolog.query("between(1, 3, X)").unwrap().count(), 3)
                })
                .unwrap()
            })
        }
        fn spawn_nested() -> thread::JoinHandle<()> {
            thread::spawn(|| {
                with_prolog(|_| with_prolog(|prolog| prolog.query("true").unwrap().count()))
                    .unwrap()
                    .map(|count| assert_eq!(count, 1))
                    .unwrap()
            })
        }

        [spawn_query, spawn_nested]
            .into_iter()
            .tuple_combinations::<(_, _)>()
            .for_each(|(l, r)| {
                [l, r]
                    .map(|spawn| spawn())
                    .into_iter()
                    .map(|thread| thread.join())
                    .collect::<Result<_, _>>()
                    .unwrap()
            });
    }
}
