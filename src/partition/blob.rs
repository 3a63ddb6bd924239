// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Shared tensor buffer passed between partitions.
///
/// Cloning a `Blob` clones the handle, not the data: a producer partition and
/// its consumers bind the same object. Identity, not content, decides whether a
/// binding is current (see [`Blob::same`]).
#[derive(Clone, Default)]
pub struct Blob(Arc<Mutex<Vec<f32>>>);

/// Blobs keyed by tensor name.
pub type BlobMap = HashMap<String, Blob>;

impl Blob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(data: Vec<f32>) -> Self {
        Self(Arc::new(Mutex::new(data)))
    }

    /// True when both handles refer to the same buffer.
    pub fn same(a: &Blob, b: &Blob) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Copy of the current contents.
    pub fn read(&self) -> Vec<f32> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn write(&self, data: Vec<f32>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = data;
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("ptr", &Arc::as_ptr(&self.0))
            .field("len", &self.len())
            .finish()
    }
}
