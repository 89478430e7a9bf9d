use std::fmt;

/// The update flags of the MongoDB wire protocol's update operation.
///
/// Bit 0 requests an upsert, bit 1 requests a multi-update. The remaining bits are reserved and
/// always zero.
///
/// # Examples
///
/// ```
/// use mongo_update::UpdateFlags;
///
/// let flags = UpdateFlags::new(true, false);
/// assert!(flags.upsert());
/// assert!(!flags.multi_update());
/// assert_eq!(flags.bits(), 0b01);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpdateFlags(i32);

impl UpdateFlags {
    /// Insert a document if nothing matches the selector.
    pub const UPSERT: i32 = 1;
    /// Apply the modifier to every matching document.
    pub const MULTI_UPDATE: i32 = 1 << 1;

    /// Constructs the flags from their named parts.
    pub fn new(upsert: bool, multi_update: bool) -> Self {
        let mut bits = 0;
        if upsert {
            bits |= Self::UPSERT;
        }
        if multi_update {
            bits |= Self::MULTI_UPDATE;
        }
        UpdateFlags(bits)
    }

    /// Whether a document is inserted when nothing matches.
    pub fn upsert(&self) -> bool {
        self.0 & Self::UPSERT != 0
    }

    /// Whether every matching document is updated, rather than just the first.
    pub fn multi_update(&self) -> bool {
        self.0 & Self::MULTI_UPDATE != 0
    }

    /// Returns the wire encoding of the flags.
    pub fn bits(&self) -> i32 {
        self.0
    }
}

impl From<UpdateFlags> for i32 {
    fn from(flags: UpdateFlags) -> i32 {
        flags.bits()
    }
}

impl fmt::Display for UpdateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding() {
        assert_eq!(UpdateFlags::new(false, false).bits(), 0b00);
        assert_eq!(UpdateFlags::new(true, false).bits(), 0b01);
        assert_eq!(UpdateFlags::new(false, true).bits(), 0b10);
        assert_eq!(UpdateFlags::new(true, true).bits(), 0b11);
    }

    #[test]
    fn accessors() {
        let flags = UpdateFlags::new(true, true);
        assert!(flags.upsert());
        assert!(flags.multi_update());
        assert_eq!(UpdateFlags::default(), UpdateFlags::new(false, false));
    }

    #[test]
    fn display() {
        assert_eq!(UpdateFlags::new(false, true).to_string(), "0b10");
    }
}
