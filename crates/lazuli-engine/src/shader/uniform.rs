use crate::device::UniformType;
use crate::error::{Error, Result};
use crate::hash::fnv1a_str;

/// One cached uniform: name, resolved location, element count and type.
#[derive(Debug, Clone)]
pub struct Uniform<L> {
    name: String,
    hash: u32,
    size: i32,
    ty: UniformType,
    location: L,
}

impl<L> Uniform<L> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// FNV-1a hash of the name, computed at insertion.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Element count (`1` unless the uniform is an array).
    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    #[inline]
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    #[inline]
    pub fn location(&self) -> &L {
        &self.location
    }
}

/// Bounded name → location table for one program.
///
/// Filled once at program creation; lookups hash the query once and compare
/// full names only on hash hits.
#[derive(Debug, Clone)]
pub struct UniformCache<L> {
    entries: Vec<Uniform<L>>,
    capacity: usize,
    max_name_len: usize,
}

impl<L> UniformCache<L> {
    pub fn new(capacity: usize, max_name_len: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            max_name_len,
        }
    }

    /// Adds an entry.
    ///
    /// Fails when the name is longer than the configured bound or when the
    /// table is full; the table is unchanged on failure.
    pub fn insert(&mut self, name: &str, size: i32, ty: UniformType, location: L) -> Result<()> {
        if name.len() > self.max_name_len {
            return Err(Error::UniformNameTooLong {
                name: name.to_owned(),
                limit: self.max_name_len,
            });
        }
        if self.entries.len() >= self.capacity {
            return Err(Error::TooManyUniforms {
                limit: self.capacity,
            });
        }

        self.entries.push(Uniform {
            name: name.to_owned(),
            hash: fnv1a_str(name),
            size,
            ty,
            location,
        });
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Uniform<L>> {
        let hash = fnv1a_str(name);
        self.entries
            .iter()
            .find(|u| u.hash == hash && u.name == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uniform<L>> {
        self.entries.iter()
    }
}
