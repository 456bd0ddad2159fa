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

//! Engine initialization and teardown.

use {
    crate::{
        Error,
        engine::{self, attach},
        foreign,
        frame::Frame,
        sys::{
            PL_call, PL_chars_to_term, PL_cleanup, PL_initialise, PL_is_initialised,
            PL_thread_self, atexit,
        },
        utils::c_predicate,
    },
    parking_lot::Mutex,
    std::{
        env,
        ffi::{CStr, CString, c_char, c_int},
        iter,
        path::PathBuf,
        process, ptr,
        sync::atomic::{self, AtomicBool, AtomicI32},
    },
};

static INIT_LOCK: Mutex<()> = Mutex::new(());
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static CLEANED: AtomicBool = AtomicBool::new(false);
static EXIT_CODE: AtomicI32 = AtomicI32::new(0);

/// Clause asserted at startup defining `prologue_run(+GoalText, -Bindings)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bootstrap {
    /// Parse with `read_term_from_atom/3`.
    #[default]
    ReadTerm,
    /// Parse with `atom_to_term/3`, for old releases.
    AtomToTerm,
}
impl Bootstrap {
    pub fn clause(self) -> &'static CStr {
        match self {
            Self::ReadTerm => {
                c"asserta((prologue_run(GoalString, BindingList) :- read_term_from_atom(GoalString, Goal, [variable_names(BindingList)]), call(Goal)))."
            }
            Self::AtomToTerm => {
                c"asserta((prologue_run(GoalString, BindingList) :- atom_chars(A, GoalString), atom_to_term(A, Goal, BindingList), call(Goal)))."
            }
        }
    }
}

/// Options for [initialize].
///
/// # Examples
///
/// ```
/// # use prologue::{Bootstrap, Config, Initialization, initialize};
/// # #[cfg(not(miri))]
/// assert!(matches!(
///     initialize(Config::default().bootstrap(Bootstrap::ReadTerm)),
///     Ok(Initialization::Initialized | Initialization::AlreadyInitialized)
/// ));
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    program: String,
    quiet: bool,
    signals: bool,
    home: Option<PathBuf>,
    args: Vec<String>,
    bootstrap: Bootstrap,
    cleanup_at_exit: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            program: String::from("./"),
            quiet: true,
            signals: false,
            home: env::var_os("SWI_HOME_DIR").map(PathBuf::from),
            args: Vec::new(),
            bootstrap: Bootstrap::default(),
            cleanup_at_exit: true,
        }
    }
}
impl Config {
    /// Value of `argv[0]`.
    pub fn program<S>(mut self, program: S) -> Self
    where
        S: Into<String>,
    {
        self.program = program.into();
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Let the engine install signal handlers.
    pub fn signals(mut self, signals: bool) -> Self {
        self.signals = signals;
        self
    }

    /// Override `SWI_HOME_DIR`.
    pub fn home<P>(mut self, home: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        self.home = home.map(Into::into);
        self
    }

    pub fn arg<S>(mut self, arg: S) -> Self
    where
        S: Into<String>,
    {
        self.args.push(arg.into());
        self
    }

    pub fn bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Call `PL_cleanup` when the process exits.
    pub fn cleanup_at_exit(mut self, cleanup_at_exit: bool) -> Self {
        self.cleanup_at_exit = cleanup_at_exit;
        self
    }

    fn argv(&self) -> Result<Vec<CString>, Error> {
        let home = self
            .home
            .as_ref()
            .map(|home| {
                home.to_str()
                    .map(|home| format!("--home={home}"))
                    .ok_or_else(|| Error::Path {
                        path: home.clone(),
                        reason: "home directory is not valid utf-8",
                    })
            })
            .transpose()?;

        iter::once(self.program.clone())
            .chain(self.quiet.then(|| String::from("-q")))
            .chain((!self.signals).then(|| String::from("--nosignals")))
            .chain(home)
            .chain(self.args.iter().cloned())
            .map(|arg| CString::new(arg).map_err(Error::from))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Initialization {
    Initialized,
    AlreadyInitialized,
}

/// Initialize the engine.
///
/// Only the first call does anything, later calls return [Initialization::AlreadyInitialized].
/// Foreign predicates registered before this are installed once the bridge predicate exists.
pub fn initialize(config: Config) -> Result<Initialization, Error> {
    if INITIALIZED.load(atomic::Ordering::Acquire) {
        return Ok(Initialization::AlreadyInitialized);
    }
    let _lock = INIT_LOCK.lock();
    if INITIALIZED.load(atomic::Ordering::Acquire) {
        return Ok(Initialization::AlreadyInitialized);
    }

    if !is_initialized() {
        let argv = config.argv()?;
        tracing::debug!(args = ?argv, "initializing swi-prolog");

        let argc = argv.len() as c_int;
        // the engine keeps pointers into argv
        let argv = Box::leak(
            argv.into_iter()
                .map(CString::into_raw)
                .chain(iter::once(ptr::null_mut::<c_char>()))
                .collect::<Box<[_]>>(),
        );
        let result = unsafe { PL_initialise(argc, argv.as_mut_ptr()) };
        if result == 0 {
            return Err(Error::Initialization(result));
        }
    }

    attach()?;
    bootstrap(config.bootstrap)?;

    if config.cleanup_at_exit && unsafe { atexit(cleanup_at_exit) } != 0 {
        tracing::warn!("failed to register the exit hook");
    }

    INITIALIZED.store(true, atomic::Ordering::Release);
    foreign::flush_pending()?;

    Ok(Initialization::Initialized)
}

fn bootstrap(bootstrap: Bootstrap) -> Result<(), Error> {
    engine::with_current(|prolog| {
        let frame = Frame::open(prolog);
        let clause = frame.new_term_ref();

        let asserted =
            c_predicate(|| unsafe { PL_chars_to_term(bootstrap.clause().as_ptr(), clause.as_raw()) })
                && c_predicate(|| unsafe { PL_call(clause.as_raw(), ptr::null_mut()) });
        tracing::debug!(?bootstrap, asserted, "asserting the bridge predicate");

        asserted.then_some(()).ok_or(Error::Bootstrap)
    })
}

pub(crate) fn ensure_initialized() -> Result<(), Error> {
    if INITIALIZED.load(atomic::Ordering::Acquire) {
        Ok(())
    } else {
        initialize(Config::default()).map(|_| ())
    }
}

/// Whether the engine reports itself initialized.
pub fn is_initialized() -> bool {
    c_predicate(|| unsafe { PL_is_initialised(ptr::null_mut(), ptr::null_mut()) })
}

/// Whether the engine was torn down by the exit hook.
pub(crate) fn is_cleaned() -> bool {
    CLEANED.load(atomic::Ordering::Acquire)
}

/// Exit the process with `code`, which is also handed to `PL_cleanup`.
pub fn exit(code: i32) -> ! {
    EXIT_CODE.store(code, atomic::Ordering::Release);
    process::exit(code)
}

extern "C" fn cleanup_at_exit() {
    if !is_initialized() {
        return;
    }
    CLEANED.store(true, atomic::Ordering::Release);

    // PL_cleanup has to run on the thread that called PL_initialise
    if unsafe { PL_thread_self() } == 1 {
        unsafe { PL_cleanup(EXIT_CODE.load(atomic::Ordering::Acquire)) };
    } else {
        tracing::warn!("exiting from a thread without the main engine, skipping cleanup");
    }
}
