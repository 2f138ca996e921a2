//! Reflected CRC16 used by the FEE packets.
//!
//! Polynomial `0xA001` (reflected `0x8005`), initial value `0xFFFF`.
//! Every input word is bit-reversed before it enters the register and the final register is bit-reversed again.

const CRC16_POLY_REFLECTED: u16 = 0xA001;
const CRC16_INIT: u16 = 0xFFFF;

/// Reverse the bit order of a 16 bit word.
#[inline]
pub fn reverse_bits(word: u16) -> u16 {
    word.reverse_bits()
}

/// Compute the FEE packet CRC over a sequence of words.
///
/// The sequence is the packet from its first header word up to, but excluding, the trailing CRC word.
pub fn crc16(words: impl IntoIterator<Item = u16>) -> u16 {
    let crc = words.into_iter().fold(CRC16_INIT, |mut crc, word| {
        crc ^= reverse_bits(word);
        for _ in 0..16 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC16_POLY_REFLECTED
            } else {
                crc >> 1
            };
        }
        crc
    });
    reverse_bits(crc)
}
