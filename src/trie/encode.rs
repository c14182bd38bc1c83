//! Canonical byte layout of trie nodes.
//!
//! Nodes start with a header byte whose high bits name the node variant and
//! whose low bits hold the partial key length in nibbles. Byte strings carry a
//! SCALE compact length prefix.

/// Encoding of the empty trie, hashed to obtain the empty root
pub const EMPTY_TRIE: u8 = 0x00;

/// Node variant as written in the header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVariant {
    /// `01`: leaf with an inline value
    Leaf,
    /// `10`: branch without a value
    Branch,
    /// `11`: branch with an inline value
    BranchWithValue,
    /// `001`: leaf holding the digest of its value
    LeafWithHashedValue,
    /// `0001`: branch holding the digest of its value
    BranchWithHashedValue,
}

impl NodeVariant {
    /// Variant bits, already shifted into the high end of the header byte
    pub fn bits(self) -> u8 {
        match self {
            NodeVariant::Leaf => 0b0100_0000,
            NodeVariant::Branch => 0b1000_0000,
            NodeVariant::BranchWithValue => 0b1100_0000,
            NodeVariant::LeafWithHashedValue => 0b0010_0000,
            NodeVariant::BranchWithHashedValue => 0b0001_0000,
        }
    }

    /// Number of high bits taken by the variant
    fn bit_count(self) -> u32 {
        match self {
            NodeVariant::Leaf | NodeVariant::Branch | NodeVariant::BranchWithValue => 2,
            NodeVariant::LeafWithHashedValue => 3,
            NodeVariant::BranchWithHashedValue => 4,
        }
    }

    /// Low bits left for the partial key length
    pub fn partial_key_length_mask(self) -> u8 {
        0xFF >> self.bit_count()
    }
}

/// Write the node header: variant bits and partial key length.
///
/// Lengths below the mask fit in the header byte. Otherwise the header holds
/// the full mask and the remainder follows as a run of 255 bytes ended by a
/// byte below 255.
pub fn encode_header(variant: NodeVariant, partial_key_len: usize, out: &mut Vec<u8>) {
    let mask = variant.partial_key_length_mask();

    if partial_key_len < mask as usize {
        out.push(variant.bits() | partial_key_len as u8);
        return;
    }

    out.push(variant.bits() | mask);
    let mut remaining = partial_key_len - mask as usize;
    loop {
        let byte = remaining.min(255) as u8;
        out.push(byte);
        remaining -= byte as usize;
        if byte < 255 {
            break;
        }
    }
}

/// Write a SCALE compact integer
pub fn encode_compact_len(len: usize, out: &mut Vec<u8>) {
    let n = len as u64;

    match n {
        0..=0x3F => out.push((n as u8) << 2),
        0x40..=0x3FFF => out.extend_from_slice(&(((n as u16) << 2) | 0b01).to_le_bytes()),
        0x4000..=0x3FFF_FFFF => out.extend_from_slice(&(((n as u32) << 2) | 0b10).to_le_bytes()),
        _ => {
            let bytes = n.to_le_bytes();
            let used = bytes.len() - (n.leading_zeros() / 8) as usize;
            out.push((((used - 4) as u8) << 2) | 0b11);
            out.extend_from_slice(&bytes[..used]);
        }
    }
}

/// Write a byte string with its compact length prefix
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact_len(bytes.len(), out);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(variant: NodeVariant, len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        encode_header(variant, len, &mut out);
        out
    }

    fn compact(len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact_len(len, &mut out);
        out
    }

    #[test]
    fn test_partial_key_length_masks() {
        assert_eq!(NodeVariant::Leaf.partial_key_length_mask(), 63);
        assert_eq!(NodeVariant::Branch.partial_key_length_mask(), 63);
        assert_eq!(NodeVariant::LeafWithHashedValue.partial_key_length_mask(), 31);
        assert_eq!(NodeVariant::BranchWithHashedValue.partial_key_length_mask(), 15);
    }

    #[test]
    fn test_header_fits_in_one_byte() {
        assert_eq!(header(NodeVariant::Leaf, 0), vec![0x40]);
        assert_eq!(header(NodeVariant::Leaf, 62), vec![0x7E]);
        assert_eq!(header(NodeVariant::Branch, 1), vec![0x81]);
        assert_eq!(header(NodeVariant::BranchWithValue, 2), vec![0xC2]);
    }

    #[test]
    fn test_header_continuation_bytes() {
        // Exactly the mask still needs a terminating zero byte
        assert_eq!(header(NodeVariant::Leaf, 63), vec![0x7F, 0x00]);
        assert_eq!(header(NodeVariant::Leaf, 63 + 255), vec![0x7F, 0xFF, 0x00]);
        assert_eq!(header(NodeVariant::Leaf, 63 + 300), vec![0x7F, 0xFF, 0x2D]);
        assert_eq!(header(NodeVariant::LeafWithHashedValue, 31), vec![0x3F, 0x00]);
        assert_eq!(header(NodeVariant::BranchWithHashedValue, 15), vec![0x1F, 0x00]);
    }

    #[test]
    fn test_compact_len_modes() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(63), vec![0xFC]);
        assert_eq!(compact(64), vec![0x01, 0x01]);
        assert_eq!(compact(16383), vec![0xFD, 0xFF]);
        assert_eq!(compact(16384), vec![0x02, 0x00, 0x01, 0x00]);
        assert_eq!(compact(1 << 30), vec![0x03, 0x00, 0x00, 0x00, 0x40]);
        assert_eq!(compact(1 << 32), vec![0x07, 0x00, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_encode_bytes() {
        let mut out = Vec::new();
        encode_bytes(b"value1", &mut out);
        assert_eq!(out, b"\x18value1".to_vec());
    }
}
