/// Errors reported by fallible [`HashMap`](crate::HashMap) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The map cannot address any more entries: the bucket table is already
    /// at its largest size, or the requested size cannot be allocated. The
    /// operation that reported it left the map unchanged.
    #[error("map capacity exceeded: at most 2^32 entries can be indexed")]
    CapacityExceeded,
    /// No entry exists for the requested key.
    #[error("key not found")]
    KeyNotFound,
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn messages() {
        assert_eq!(Error::KeyNotFound.to_string(), "key not found");
        assert!(
            Error::CapacityExceeded
                .to_string()
                .starts_with("map capacity exceeded")
        );
    }
}
