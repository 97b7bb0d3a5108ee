use std::num::NonZeroU64;

/// Identity of a shader, texture or buffer within its [`Context`](crate::Context).
///
/// Bind elision and render-target switching compare ids, never contents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(NonZeroU64);

impl ResourceId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Monotonic id source, one per context.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    pub(crate) fn next(&mut self) -> ResourceId {
        let id = NonZeroU64::new(self.next).unwrap_or(NonZeroU64::MIN);
        self.next = self.next.wrapping_add(1).max(1);
        ResourceId(id)
    }
}
