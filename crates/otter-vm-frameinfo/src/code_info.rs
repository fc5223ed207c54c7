//! Shared, read-only tables of one compiled image
//!
//! A [`CodeInfo`] is built once and then only read, so any number of stack
//! walks may decode from it concurrently without locking.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::FrameInfoConfig;
use crate::constant::{ObjectConstant, SharedMethod};
use crate::error::{FrameInfoError, Result};

/// Frame info encodings plus the interned tables they index into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeInfo {
    frame_info_encodings: Vec<u8>,
    source_classes: Vec<Arc<str>>,
    source_method_names: Vec<Arc<str>>,
    object_constants: Vec<ObjectConstant>,
    config: FrameInfoConfig,
}

impl CodeInfo {
    /// Create code info from prebuilt tables
    pub fn new(
        frame_info_encodings: Vec<u8>,
        source_classes: Vec<Arc<str>>,
        source_method_names: Vec<Arc<str>>,
        object_constants: Vec<ObjectConstant>,
        config: FrameInfoConfig,
    ) -> Self {
        Self {
            frame_info_encodings,
            source_classes,
            source_method_names,
            object_constants,
            config,
        }
    }

    /// Start building code info
    pub fn builder() -> CodeInfoBuilder {
        CodeInfoBuilder::new()
    }

    /// The encoding buffer
    #[inline]
    pub fn frame_info_encodings(&self) -> &[u8] {
        &self.frame_info_encodings
    }

    /// Settings the image was encoded with
    #[inline]
    pub fn config(&self) -> FrameInfoConfig {
        self.config
    }

    /// Source class by index
    pub fn source_class(&self, index: i32) -> Result<&Arc<str>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.source_classes.get(i))
            .ok_or(FrameInfoError::SourceClassIndex { index })
    }

    /// Source method name by index
    pub fn source_method_name(&self, index: i32) -> Result<&Arc<str>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.source_method_names.get(i))
            .ok_or(FrameInfoError::SourceMethodNameIndex { index })
    }

    /// Object constant by index
    pub fn object_constant(&self, index: i64) -> Result<&ObjectConstant> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.object_constants.get(i))
            .ok_or(FrameInfoError::ObjectConstantIndex { index })
    }

    /// Deoptimization target method stored at `index` of the object constants
    pub fn deopt_method(&self, index: i64) -> Result<&SharedMethod> {
        self.object_constant(index)?
            .as_method()
            .ok_or(FrameInfoError::NotAMethod { index })
    }

    /// Number of interned source classes
    #[inline]
    pub fn source_class_count(&self) -> usize {
        self.source_classes.len()
    }

    /// Number of interned source method names
    #[inline]
    pub fn source_method_name_count(&self) -> usize {
        self.source_method_names.len()
    }

    /// Number of object constants
    #[inline]
    pub fn object_constant_count(&self) -> usize {
        self.object_constants.len()
    }
}

/// Append-only table that hands out one index per distinct value
#[derive(Debug, Clone)]
pub struct InternedTable<T> {
    values: Vec<T>,
    indices: FxHashMap<T, u32>,
}

impl<T> Default for InternedTable<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            indices: FxHashMap::default(),
        }
    }
}

impl<T: Clone + Eq + Hash> InternedTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, adding it if it is new
    pub fn intern(&mut self, value: T) -> u32 {
        if let Some(&idx) = self.indices.get(&value) {
            return idx;
        }
        let idx = self.values.len() as u32;
        self.indices.insert(value.clone(), idx);
        self.values.push(value);
        idx
    }

    /// Get a value by index
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.values.get(index as usize)
    }

    /// Number of distinct values
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in index order
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl InternedTable<Arc<str>> {
    /// Intern a string without allocating when it is already present
    pub fn intern_str(&mut self, value: &str) -> u32 {
        match self.indices.get(value) {
            Some(&idx) => idx,
            None => self.intern(Arc::from(value)),
        }
    }
}

/// Assembles a [`CodeInfo`]
///
/// Starts from [`FrameInfoConfig::from_env`], so images built in a process
/// with `OTTER_FRAMEINFO_SOURCE_REFERENCES=0` decode without source
/// references unless [`config`](Self::config) overrides it.
#[derive(Debug, Clone)]
pub struct CodeInfoBuilder {
    frame_info_encodings: Vec<u8>,
    source_classes: InternedTable<Arc<str>>,
    source_method_names: InternedTable<Arc<str>>,
    object_constants: InternedTable<ObjectConstant>,
    config: FrameInfoConfig,
}

impl CodeInfoBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            frame_info_encodings: Vec::new(),
            source_classes: InternedTable::new(),
            source_method_names: InternedTable::new(),
            object_constants: InternedTable::new(),
            config: FrameInfoConfig::from_env(),
        }
    }

    /// Set the encoding config
    pub fn config(mut self, config: FrameInfoConfig) -> Self {
        self.config = config;
        self
    }

    /// Intern a source class name
    pub fn source_class(&mut self, name: &str) -> u32 {
        self.source_classes.intern_str(name)
    }

    /// Intern a source method name
    pub fn source_method_name(&mut self, name: &str) -> u32 {
        self.source_method_names.intern_str(name)
    }

    /// Intern an object constant
    pub fn object_constant(&mut self, constant: ObjectConstant) -> u32 {
        self.object_constants.intern(constant)
    }

    /// Append encoded frame info, returning the offset it starts at
    pub fn append_encoding(&mut self, bytes: &[u8]) -> usize {
        let offset = self.frame_info_encodings.len();
        self.frame_info_encodings.extend_from_slice(bytes);
        offset
    }

    /// Current length of the encoding buffer
    #[inline]
    pub fn encoding_len(&self) -> usize {
        self.frame_info_encodings.len()
    }

    /// Finish the tables
    pub fn build(self) -> CodeInfo {
        CodeInfo {
            frame_info_encodings: self.frame_info_encodings,
            source_classes: self.source_classes.into_vec(),
            source_method_names: self.source_method_names.into_vec(),
            object_constants: self.object_constants.into_vec(),
            config: self.config,
        }
    }
}

impl Default for CodeInfoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
