use thiserror::Error;

/// Tag constants.
const TAG_MASK: u64 = 0b11;
const POINTER_TAG: u64 = 0b00;
const SPECIAL_TAG: u64 = 0b01;
const FLOAT_TAG: u64 = 0b10;
const INTEGER_TAG: u64 = 0b11;

const NIL_BITS: u64 = 0x1;
const TRUE_BITS: u64 = 0x5;
const FALSE_BITS: u64 = 0x9;

/// Largest integer that fits the 62-bit immediate encoding.
pub const INTEGER_MAX: i64 = 0x1FFF_FFFF_FFFF_FFFF;
/// Smallest integer that fits the 62-bit immediate encoding.
pub const INTEGER_MIN: i64 = -0x2000_0000_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("integer {0} does not fit the immediate encoding")]
    IntegerOutOfRange(i64),
}

/// The two low bits of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Pointer = 0b00,
    Special = 0b01,
    Float = 0b10,
    Integer = 0b11,
}

/// Index of an object in the current heap space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapRef(usize);

impl HeapRef {
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Decoded view of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Pointer(HeapRef),
    SmallInteger(i64),
    Float(f64),
    Nil,
    True,
    False,
}

/// A tagged 64-bit value.
///
/// Encoding:
/// - **Pointer**: `...XXXX00` heap index shifted left by two.
/// - **Special**: `...XXXX01` nil (`0x1`), true (`0x5`), false (`0x9`).
///   Any other special pattern decodes as nil.
/// - **Float**:   `...XXXX10` an `f64` whose two lowest mantissa bits are
///   replaced by the tag. The round trip is lossy: the result differs from
///   the input by at most 3 units in the last place.
/// - **Integer**: `...XXXX11` 62-bit signed integer shifted left by two.
///
/// Immediates are never heap objects, so the collector neither traces nor
/// moves them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    pub const NIL: Value = Value(NIL_BITS);
    pub const TRUE: Value = Value(TRUE_BITS);
    pub const FALSE: Value = Value(FALSE_BITS);

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn tag_of(self) -> Tag {
        match self.0 & TAG_MASK {
            POINTER_TAG => Tag::Pointer,
            SPECIAL_TAG => Tag::Special,
            FLOAT_TAG => Tag::Float,
            _ => Tag::Integer,
        }
    }

    #[inline(always)]
    pub const fn is_immediate(self) -> bool {
        self.0 & TAG_MASK != POINTER_TAG
    }

    pub fn kind(self) -> ValueKind {
        match self.tag_of() {
            Tag::Pointer => ValueKind::Pointer(HeapRef(self.0 as usize >> 2)),
            Tag::Special => match self.0 {
                TRUE_BITS => ValueKind::True,
                FALSE_BITS => ValueKind::False,
                _ => ValueKind::Nil,
            },
            Tag::Float => ValueKind::Float(f64::from_bits(self.0 & !TAG_MASK)),
            Tag::Integer => ValueKind::SmallInteger(self.0 as i64 >> 2),
        }
    }

    // ── Pointer ────────────────────────────────────────────────────

    #[inline(always)]
    pub const fn from_heap_ref(r: HeapRef) -> Self {
        Self((r.0 as u64) << 2)
    }

    #[inline(always)]
    pub const fn is_pointer(self) -> bool {
        self.0 & TAG_MASK == POINTER_TAG
    }

    #[inline(always)]
    pub const fn heap_ref(self) -> Option<HeapRef> {
        if self.is_pointer() {
            Some(HeapRef(self.0 as usize >> 2))
        } else {
            None
        }
    }

    // ── Integer ────────────────────────────────────────────────────

    pub const fn make_integer(n: i64) -> Result<Self, ValueError> {
        if n < INTEGER_MIN || n > INTEGER_MAX {
            return Err(ValueError::IntegerOutOfRange(n));
        }
        Ok(Self(((n << 2) as u64) | INTEGER_TAG))
    }

    /// Encode an integer the caller knows to be in range.
    ///
    /// # Panics
    ///
    /// Panics if `n` does not fit 62 bits.
    #[inline]
    pub fn from_i64(n: i64) -> Self {
        match Self::make_integer(n) {
            Ok(v) => v,
            Err(err) => panic!("{err}"),
        }
    }

    #[inline(always)]
    pub const fn is_integer(self) -> bool {
        self.0 & TAG_MASK == INTEGER_TAG
    }

    #[inline(always)]
    pub const fn get_integer(self) -> Option<i64> {
        if self.is_integer() {
            Some(self.0 as i64 >> 2)
        } else {
            None
        }
    }

    // ── Float ──────────────────────────────────────────────────────

    /// Encode a float, dropping the two lowest mantissa bits.
    #[inline(always)]
    pub const fn make_float(f: f64) -> Self {
        Self((f.to_bits() & !TAG_MASK) | FLOAT_TAG)
    }

    #[inline(always)]
    pub const fn is_float(self) -> bool {
        self.0 & TAG_MASK == FLOAT_TAG
    }

    #[inline(always)]
    pub const fn get_float(self) -> Option<f64> {
        if self.is_float() {
            Some(f64::from_bits(self.0 & !TAG_MASK))
        } else {
            None
        }
    }

    // ── Specials ───────────────────────────────────────────────────

    #[inline(always)]
    pub const fn make_nil() -> Self {
        Self::NIL
    }

    #[inline(always)]
    pub const fn make_true() -> Self {
        Self::TRUE
    }

    #[inline(always)]
    pub const fn make_false() -> Self {
        Self::FALSE
    }

    #[inline(always)]
    pub const fn from_bool(b: bool) -> Self {
        if b { Self::TRUE } else { Self::FALSE }
    }

    #[inline(always)]
    pub const fn is_nil(self) -> bool {
        self.0 & TAG_MASK == SPECIAL_TAG
            && self.0 != TRUE_BITS
            && self.0 != FALSE_BITS
    }

    #[inline(always)]
    pub const fn is_true(self) -> bool {
        self.0 == TRUE_BITS
    }

    #[inline(always)]
    pub const fn is_false(self) -> bool {
        self.0 == FALSE_BITS
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::NIL
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind() {
            ValueKind::Pointer(r) => write!(f, "Pointer({})", r.index()),
            ValueKind::SmallInteger(n) => write!(f, "SmallInteger({n})"),
            ValueKind::Float(x) => write!(f, "Float({x})"),
            ValueKind::Nil => f.write_str("Nil"),
            ValueKind::True => f.write_str("True"),
            ValueKind::False => f.write_str("False"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip() {
        for &n in &[0i64, 1, -1, 42, -42, 1 << 40, INTEGER_MAX, INTEGER_MIN] {
            let v = Value::make_integer(n).unwrap();
            assert!(v.is_integer());
            assert!(v.is_immediate());
            assert_eq!(v.tag_of(), Tag::Integer);
            assert_eq!(v.get_integer(), Some(n), "round trip of {n}");
            assert_eq!(v.kind(), ValueKind::SmallInteger(n));
        }
    }

    #[test]
    fn integer_out_of_range_is_an_error() {
        assert_eq!(
            Value::make_integer(INTEGER_MAX + 1),
            Err(ValueError::IntegerOutOfRange(INTEGER_MAX + 1))
        );
        assert_eq!(
            Value::make_integer(INTEGER_MIN - 1),
            Err(ValueError::IntegerOutOfRange(INTEGER_MIN - 1))
        );
        assert!(Value::make_integer(i64::MAX).is_err());
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn from_i64_panics_out_of_range() {
        let _ = Value::from_i64(i64::MIN);
    }

    #[test]
    fn integer_encoding_matches_layout() {
        assert_eq!(Value::from_i64(0).raw(), 0b11);
        assert_eq!(Value::from_i64(1).raw(), 0b111);
        assert_eq!(Value::from_i64(-1).raw(), u64::MAX);
    }

    #[test]
    fn float_round_trip_is_lossy_but_bounded() {
        for &x in &[0.0f64, 1.0, -1.5, 3.141592653589793, 1e-300, 6.02e23, -2.5e-7] {
            let v = Value::make_float(x);
            assert!(v.is_float());
            assert_eq!(v.tag_of(), Tag::Float);
            let back = v.get_float().unwrap();
            let epsilon = x.abs() * 1e-15 + f64::MIN_POSITIVE;
            assert!((back - x).abs() < epsilon, "{x} came back as {back}");
        }
    }

    #[test]
    fn float_drops_low_mantissa_bits() {
        let x = f64::from_bits(1.0f64.to_bits() | 0b11);
        let back = Value::make_float(x).get_float().unwrap();
        assert_ne!(back, x);
        assert_eq!(back, 1.0);
    }

    #[test]
    fn specials() {
        assert_eq!(Value::make_nil().raw(), 0x1);
        assert_eq!(Value::make_true().raw(), 0x5);
        assert_eq!(Value::make_false().raw(), 0x9);
        assert!(Value::NIL.is_nil() && !Value::NIL.is_true());
        assert!(Value::TRUE.is_true() && !Value::TRUE.is_nil());
        assert!(Value::FALSE.is_false() && !Value::FALSE.is_nil());
        assert_eq!(Value::from_bool(true), Value::TRUE);
        assert_eq!(Value::FALSE.kind(), ValueKind::False);
        assert_eq!(Value::from_raw(0xD).kind(), ValueKind::Nil);
    }

    #[test]
    fn pointers_are_zero_tagged() {
        let v = Value::from_heap_ref(HeapRef::new(7));
        assert!(v.is_pointer());
        assert!(!v.is_immediate());
        assert_eq!(v.raw() & 0b11, 0);
        assert_eq!(v.heap_ref(), Some(HeapRef::new(7)));
        assert_eq!(v.kind(), ValueKind::Pointer(HeapRef::new(7)));
        assert_eq!(Value::from_i64(7).heap_ref(), None);
    }

    #[test]
    fn every_pattern_decodes_to_one_kind() {
        for raw in [0u64, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0xD, u64::MAX, 1 << 63] {
            let v = Value::from_raw(raw);
            let tag_matches = match v.kind() {
                ValueKind::Pointer(_) => v.tag_of() == Tag::Pointer,
                ValueKind::SmallInteger(_) => v.tag_of() == Tag::Integer,
                ValueKind::Float(_) => v.tag_of() == Tag::Float,
                ValueKind::Nil | ValueKind::True | ValueKind::False => {
                    v.tag_of() == Tag::Special
                }
            };
            assert!(tag_matches, "pattern 0x{raw:x}");
        }
    }
}
