/// Nibble is a 4-bit value (0-15)
pub type Nibble = u8;

/// Encode a byte slice into a vector of nibbles
///
/// Each byte is split into two nibbles (4-bit values), high nibble first.
/// For example, the byte 0xAB becomes two nibbles: 0xA and 0xB.
pub fn bytes_to_nibbles(bytes: &[u8]) -> Vec<Nibble> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);

    for &byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }

    nibbles
}

/// Convert a vector of nibbles back to bytes
///
/// Every two nibbles are combined into a single byte, so this inverts
/// [`bytes_to_nibbles`]. An odd trailing nibble lands in the high half of the
/// last byte.
pub fn nibbles_to_bytes(nibbles: &[Nibble]) -> Vec<u8> {
    nibbles
        .chunks(2)
        .map(|chunk| match *chunk {
            [high, low] => (high << 4) | (low & 0x0F),
            [high] => high << 4,
            _ => unreachable!("chunks(2) yields one or two nibbles"),
        })
        .collect()
}

/// Pack a partial key for a node encoding
///
/// Even paths pack two nibbles per byte. Odd paths put the first nibble alone
/// in the low half of the first byte and pack the rest in pairs, so the
/// encoding is aligned to the end of the key.
///
/// - [1, 2, 3, 4] becomes [0x12, 0x34]
/// - [1, 2, 3] becomes [0x01, 0x23]
pub fn encode_partial_key(nibbles: &[Nibble]) -> Vec<u8> {
    let mut packed = Vec::with_capacity((nibbles.len() + 1) / 2);
    let rest = if nibbles.len() % 2 == 1 {
        packed.push(nibbles[0] & 0x0F);
        &nibbles[1..]
    } else {
        nibbles
    };

    for pair in rest.chunks_exact(2) {
        packed.push((pair[0] << 4) | (pair[1] & 0x0F));
    }

    packed
}

/// Length of the shared prefix of two nibble paths
pub fn common_prefix_len(a: &[Nibble], b: &[Nibble]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Convert a vector of nibbles to a hex string
///
/// Each nibble becomes a hex character.
/// For example, the nibbles [0xA, 0xB] become the string "ab".
pub fn nibbles_to_hex(nibbles: &[Nibble]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    nibbles
        .iter()
        .map(|&nibble| DIGITS[(nibble & 0x0F) as usize] as char)
        .collect()
}
