/// Byte order of a value as it appears on the wire or in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the running process.
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::Big;

    /// The order opposite to `self`.
    pub fn inverted(self) -> Self {
        match self {
            ByteOrder::Little => ByteOrder::Big,
            ByteOrder::Big => ByteOrder::Little,
        }
    }

    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::NATIVE
    }
}

/// Conversion of a value declared in some byte order into native order.
///
/// When the declared order already is [`ByteOrder::NATIVE`] the value is
/// returned untouched; otherwise its byte sequence is reversed.
pub trait NativeOrder: Sized {
    fn to_native(self, declared: ByteOrder) -> Self;
}

macro_rules! impl_native_order_int {
    ($($ty:ty),*) => {
        $(
            impl NativeOrder for $ty {
                #[inline]
                fn to_native(self, declared: ByteOrder) -> Self {
                    if declared.is_native() {
                        self
                    } else {
                        self.swap_bytes()
                    }
                }
            }
        )*
    };
}

impl_native_order_int!(u16, u32, u64);

impl<const N: usize> NativeOrder for [u8; N] {
    fn to_native(mut self, declared: ByteOrder) -> Self {
        if !declared.is_native() {
            self.reverse();
        }
        self
    }
}

impl NativeOrder for Vec<u8> {
    fn to_native(mut self, declared: ByteOrder) -> Self {
        if !declared.is_native() {
            self.reverse();
        }
        self
    }
}

impl NativeOrder for String {
    /// Text is reversed per character so the result stays valid UTF-8.
    /// For ASCII this is the same as reversing the bytes.
    fn to_native(self, declared: ByteOrder) -> Self {
        if declared.is_native() {
            self
        } else {
            self.chars().rev().collect()
        }
    }
}

/// Number of bytes needed to hold `value` (`ceil(bit_length / 8)`).
#[inline]
pub fn minimal_width(value: u64) -> usize {
    let bits = u64::BITS - value.leading_zeros();
    bits.div_ceil(8) as usize
}

/// Reverse only the significant bytes of `value`.
///
/// `0x0102` becomes `0x0201` rather than `0x0201_0000_0000_0000`, which is what
/// round-tripping an arbitrary-width integer through a byte slice expects.
pub fn reverse_minimal(value: u64) -> u64 {
    let width = minimal_width(value);
    let le = value.to_le_bytes();
    le[..width]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_order_is_identity() {
        assert_eq!(0x1234_5678u32.to_native(ByteOrder::NATIVE), 0x1234_5678);
        assert_eq!((*b"DVPL").to_native(ByteOrder::NATIVE), *b"DVPL");
        assert_eq!(vec![1u8, 2, 3].to_native(ByteOrder::NATIVE), vec![1, 2, 3]);
        assert_eq!("abc".to_string().to_native(ByteOrder::NATIVE), "abc");
    }

    #[test]
    fn foreign_order_reverses() {
        let foreign = ByteOrder::NATIVE.inverted();
        assert_eq!(0x1234_5678u32.to_native(foreign), 0x7856_3412);
        assert_eq!(0x0102u16.to_native(foreign), 0x0201);
        assert_eq!((*b"DVPL").to_native(foreign), *b"LPVD");
        assert_eq!(vec![1u8, 2, 3].to_native(foreign), vec![3, 2, 1]);
        assert_eq!("DVPL".to_string().to_native(foreign), "LPVD");
    }

    #[test]
    fn le_fields_match_from_le_bytes() {
        let wire = [0x10, 0x20, 0x30, 0x40];
        let value = u32::from_ne_bytes(wire).to_native(ByteOrder::Little);
        assert_eq!(value, u32::from_le_bytes(wire));
    }

    #[test]
    fn minimal_width_counts_significant_bytes() {
        assert_eq!(minimal_width(0), 0);
        assert_eq!(minimal_width(1), 1);
        assert_eq!(minimal_width(0xff), 1);
        assert_eq!(minimal_width(0x100), 2);
        assert_eq!(minimal_width(u64::MAX), 8);
    }

    #[test]
    fn reverse_minimal_uses_significant_width() {
        assert_eq!(reverse_minimal(0), 0);
        assert_eq!(reverse_minimal(0x01), 0x01);
        assert_eq!(reverse_minimal(0x0102), 0x0201);
        assert_eq!(reverse_minimal(0x01_0203), 0x03_0201);
        assert_eq!(reverse_minimal(0x0102_0304), 0x0403_0201);
    }
}
