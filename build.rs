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

use std::{
    fmt::Display,
    io::{Write, stdout},
};

// dict and rational term types need at least 8.2
const SWIPL_PACKAGE: &str = "swipl";
const SWIPL_MIN_VERSION: &str = "8.2";

fn die<T, U>(error: T) -> U
where
    T: Display,
{
    panic!("{error}")
}

fn main() {
    let mut stdout = stdout().lock();
    stdout
        .write_all(
            b"cargo:rerun-if-changed=build.rs
cargo:rerun-if-changed=src/reexports.h
cargo:rerun-if-changed=src/reexports.c
cargo:rerun-if-env-changed=SWI_HOME_DIR\n",
        )
        .and_then(|_| stdout.flush())
        .unwrap_or_else(die);
    drop(stdout);

    pkg_config::Config::new()
        .atleast_version(SWIPL_MIN_VERSION)
        .probe(SWIPL_PACKAGE)
        .unwrap_or_else(die)
        .include_paths
        .iter()
        .fold(cc::Build::new(), |mut build, path| {
            build.include(path);
            build
        })
        .file("src/reexports.c")
        .compile("reexports");
}
