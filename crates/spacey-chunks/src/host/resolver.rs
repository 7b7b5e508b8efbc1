// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical chunk path arithmetic.
//!
//! Chunk paths are output-relative names, not filesystem paths, so nothing
//! here touches the disk or the working directory.

use std::path::{Component, Path, PathBuf};

/// Collapses `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Path leading from directory `from` to chunk `to`.
///
/// Absolute chunk paths are returned unchanged.
pub fn relative(from: &Path, to: &str) -> PathBuf {
    let to = normalize(Path::new(to));
    pathdiff::diff_paths(&to, normalize(from)).unwrap_or(to)
}
