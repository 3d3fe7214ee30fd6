// Marked pointer packing a node reference and its deletion flag into one word.
//
// Bit layout:
//   Bit 0: DELETE_MARK - the node owning this next pointer is logically deleted
//
// Nodes are heap allocated with at least 8-byte alignment (they carry an i64
// key), so bit 0 of every node address is always zero and free for the flag.
// Loading, storing or CAS-ing the raw word therefore moves the pointer and
// the flag as one indivisible value.
//
const DELETE_MARK: usize = 0b1;

/// A pointer that uses the least significant bit as the deletion flag.
pub(crate) struct MarkedPtr<T> {
    ptr: *mut T,
}

// Manual impls to avoid requiring T: Clone/Copy/PartialEq
impl<T> Copy for MarkedPtr<T> {}

impl<T> Clone for MarkedPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for MarkedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for MarkedPtr<T> {}

impl<T> std::fmt::Debug for MarkedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkedPtr")
            .field("ptr", &self.as_ptr())
            .field("marked", &self.is_marked())
            .finish()
    }
}

impl<T> MarkedPtr<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a new MarkedPtr from a (possibly marked) raw word.
    #[inline]
    pub(crate) fn new(ptr: *mut T) -> Self {
        MarkedPtr { ptr }
    }

    /// Pack a clean pointer and a deletion flag.
    #[inline]
    pub(crate) fn compose(ptr: *mut T, marked: bool) -> Self {
        debug_assert_eq!(
            ptr as usize & DELETE_MARK,
            0,
            "node pointer is not aligned"
        );
        MarkedPtr::new(ptr).with_mark(marked)
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Get the clean pointer without the mark bit (the one you dereference).
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        (self.ptr as usize & !DELETE_MARK) as *mut T
    }

    /// Get the raw word with the mark bit intact (for CAS operations).
    #[inline]
    pub(crate) fn as_raw(&self) -> *mut T {
        self.ptr
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Check if DELETE-marked (bit 0).
    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        (self.ptr as usize & DELETE_MARK) != 0
    }

    // =========================================================================
    // Transformers
    // =========================================================================

    /// Create a version of this pointer with the deletion flag set or cleared.
    #[inline]
    pub(crate) fn with_mark(&self, mark: bool) -> Self {
        let ptr_bits = self.as_ptr() as usize;
        let marked_bits = if mark {
            ptr_bits | DELETE_MARK
        } else {
            ptr_bits
        };
        MarkedPtr {
            ptr: marked_bits as *mut T,
        }
    }
}
