//!
//! Facilities for manipulating instance variables.
//!

/// Represents an instance variable declared on a class.
///
/// The offset is computed when the ivar is added (the class's instance size
/// at that point, aligned up) and is stable for the lifetime of the class.
#[derive(Debug, Clone, PartialEq)]
pub struct Ivar {
    /// The ivar's name, unique within its declaring class.
    pub name: String,
    /// The type encoding string.
    pub types: String,
    /// The ivar's size in bytes.
    pub size: usize,
    /// The ivar's alignment requirement (a power of two).
    pub align: usize,
    /// The byte offset of this ivar within an instance.
    pub offset: usize,
}

impl Ivar {
    /// The byte range this ivar occupies within an instance.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size
    }
}
