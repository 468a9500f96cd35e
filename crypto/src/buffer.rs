//! # Secure Buffer Pool
//!
//! Pooled byte buffers for key material and plaintext/ciphertext staging.
//! A sensitive [`Lease`] is cryptographically zeroed the instant it is
//! dropped — on the success path, the error path, and during unwinding —
//! before the underlying allocation is shelved for reuse. Erasure is tied
//! to scope exit, never to allocator or collector timing.
//!
//! The pool itself is process-wide and thread-safe; each lease has
//! single-owner semantics for its lifetime.

use std::sync::{Mutex, OnceLock};

use zeroize::Zeroize;

/// Smallest pooled allocation, in bytes.
const MIN_CLASS: usize = 64;

/// Largest pooled allocation; bigger requests are served unpooled.
const MAX_CLASS: usize = 1 << 20;

/// Buffers retained per size class.
const SHELF_CAP: usize = 32;

const CLASS_COUNT: usize = (MAX_CLASS.ilog2() - MIN_CLASS.ilog2() + 1) as usize;

struct Pool {
    shelves: [Mutex<Vec<Box<[u8]>>>; CLASS_COUNT],
}

static POOL: OnceLock<Pool> = OnceLock::new();

impl Pool {
    fn global() -> &'static Self {
        POOL.get_or_init(|| Self {
            shelves: std::array::from_fn(|_| Mutex::new(Vec::new())),
        })
    }

    const fn class_for(len: usize) -> Option<usize> {
        if len > MAX_CLASS {
            return None;
        }
        let size = if len <= MIN_CLASS { MIN_CLASS } else { len.next_power_of_two() };
        Some((size.ilog2() - MIN_CLASS.ilog2()) as usize)
    }

    fn take(&self, class: usize) -> Option<Box<[u8]>> {
        match self.shelves[class].lock() {
            Ok(mut shelf) => shelf.pop(),
            Err(_) => None,
        }
    }

    fn shelve(&self, class: usize, buf: Box<[u8]>) {
        if let Ok(mut shelf) = self.shelves[class].lock()
            && shelf.len() < SHELF_CAP
        {
            shelf.push(buf);
        }
        // a poisoned or full shelf just drops the allocation
    }
}

/// A leased buffer: a view of exactly the requested length over a pooled
/// (possibly larger) allocation.
///
/// Sensitive leases are zeroed over their full underlying allocation when
/// dropped. Leases are not `Clone` and must not be shared between
/// concurrent operations.
pub struct Lease {
    data: Option<Box<[u8]>>,
    len: usize,
    sensitive: bool,
    class: Option<usize>,
}

/// Rent a sensitive buffer of at least `min_len` bytes.
///
/// The lease derefs to exactly `min_len` bytes, zero-initialized. The
/// memory is erased when the lease is dropped, however the scope exits.
#[must_use]
pub fn rent(min_len: usize) -> Lease {
    Lease::new(min_len, true)
}

/// Rent a non-sensitive scratch buffer of at least `min_len` bytes.
///
/// No erasure guarantee; use only for data that is public anyway.
#[must_use]
pub fn rent_scratch(min_len: usize) -> Lease {
    Lease::new(min_len, false)
}

impl Lease {
    fn new(min_len: usize, sensitive: bool) -> Self {
        let class = Pool::class_for(min_len);
        let mut data = class
            .and_then(|c| Pool::global().take(c))
            .unwrap_or_else(|| {
                let size = class.map_or(min_len, |c| MIN_CLASS << c);
                vec![0_u8; size].into_boxed_slice()
            });
        // pooled buffers come back zeroed, but a fresh caller should not
        // have to trust that
        data[..min_len].zeroize();
        Self {
            data: Some(data),
            len: min_len,
            sensitive,
            class,
        }
    }

    /// Length of the leased view.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the leased view is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shrink the view to `len` bytes. The bytes beyond the new length
    /// remain in the allocation and are erased on drop as usual.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the current view length.
    pub fn truncate(&mut self, len: usize) {
        assert!(len <= self.len, "cannot grow a lease");
        self.len = len;
    }
}

impl std::ops::Deref for Lease {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[..self.len],
            None => &[],
        }
    }
}

impl std::ops::DerefMut for Lease {
    fn deref_mut(&mut self) -> &mut [u8] {
        match &mut self.data {
            Some(data) => &mut data[..self.len],
            None => &mut [],
        }
    }
}

impl AsRef<[u8]> for Lease {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl AsMut<[u8]> for Lease {
    fn as_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(mut data) = self.data.take() {
            if self.sensitive {
                data.zeroize();
            }
            if let Some(class) = self.class {
                if !self.sensitive {
                    // scratch buffers are zeroed on the way back in so the
                    // next sensitive tenant starts clean
                    data.zeroize();
                }
                Pool::global().shelve(class, data);
            }
        }
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("len", &self.len)
            .field("sensitive", &self.sensitive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exact_view() {
        let lease = rent(100);
        assert_eq!(lease.len(), 100);
        assert!(lease.iter().all(|&b| b == 0));
    }

    #[test]
    fn oversize_request_unpooled() {
        let lease = rent(MAX_CLASS + 1);
        assert_eq!(lease.len(), MAX_CLASS + 1);
    }

    #[test]
    fn reuse_is_zeroed() {
        {
            let mut lease = rent(64);
            lease.copy_from_slice(&[0xab; 64]);
        }
        // whatever allocation we get back, it must read as zero
        let lease = rent(64);
        assert!(lease.iter().all(|&b| b == 0));
    }

    #[test]
    fn truncate_shrinks_view() {
        let mut lease = rent(64);
        lease.truncate(10);
        assert_eq!(lease.len(), 10);
    }

    #[test]
    fn zeroed_on_unwind() {
        // the Drop impl runs during unwinding, so a panicking operation
        // still erases its lease
        let result = std::panic::catch_unwind(|| {
            let mut lease = rent(64);
            lease.copy_from_slice(&[0xcd; 64]);
            panic!("boom");
        });
        assert!(result.is_err());
        let lease = rent(64);
        assert!(lease.iter().all(|&b| b == 0));
    }
}
