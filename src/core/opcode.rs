//! Opcode derivation.

/// Number of bytes the opcode occupies at the front of every envelope.
pub const OPCODE_SIZE: usize = 4;

/// Default number of shapes a registry reserves room for.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 256;

/// Wire opcode for a shape name: CRC-32 (IEEE polynomial) of its UTF-8 bytes.
///
/// Not collision free. Collisions are caught when the second shape registers.
#[inline]
pub fn opcode_for(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ieee_check_value() {
        // Standard CRC-32/IEEE check input.
        assert_eq!(opcode_for("123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(opcode_for(""), 0);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(opcode_for("FindNodeRequest"), opcode_for("FindNodeRequest"));
        assert_ne!(opcode_for("Ping"), opcode_for("Pong"));
    }
}
