//! Bidirectional read position over a materialised tuple buffer

use crate::sql::executor::operators::TupleSlot;

/// Position is `-1` before the first tuple and `len` after the last one.
/// Stepping past either end parks there, so reversing re-returns the
/// boundary tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    current: isize,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self { current: -1 }
    }

    pub(crate) fn rewind(&mut self) {
        self.current = -1;
    }

    pub(crate) fn step(&mut self, rows: &[TupleSlot], forward: bool) -> Option<TupleSlot> {
        let len = rows.len() as isize;
        self.current = if forward {
            (self.current + 1).min(len)
        } else {
            (self.current - 1).max(-1)
        };
        if (0..len).contains(&self.current) {
            Some(TupleSlot::clone(&rows[self.current as usize]))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::columnar::ScalarValue;
    use std::sync::Arc;

    fn rows(n: i64) -> Vec<TupleSlot> {
        (0..n).map(|i| Arc::new(vec![ScalarValue::Int64(i)])).collect()
    }

    fn value(slot: Option<TupleSlot>) -> Option<i64> {
        slot.map(|t| match t[0] {
            ScalarValue::Int64(v) => v,
            _ => unreachable!(),
        })
    }

    #[test]
    fn reverse_after_end_returns_last() {
        let rows = rows(3);
        let mut cursor = Cursor::new();
        assert_eq!(value(cursor.step(&rows, true)), Some(0));
        assert_eq!(value(cursor.step(&rows, true)), Some(1));
        assert_eq!(value(cursor.step(&rows, true)), Some(2));
        assert_eq!(value(cursor.step(&rows, true)), None);
        assert_eq!(value(cursor.step(&rows, true)), None);
        assert_eq!(value(cursor.step(&rows, false)), Some(2));
        assert_eq!(value(cursor.step(&rows, false)), Some(1));
    }

    #[test]
    fn reverse_before_start_parks() {
        let rows = rows(2);
        let mut cursor = Cursor::new();
        assert_eq!(value(cursor.step(&rows, false)), None);
        assert_eq!(value(cursor.step(&rows, true)), Some(0));
        assert_eq!(value(cursor.step(&rows, false)), None);
        assert_eq!(value(cursor.step(&rows, true)), Some(0));
        cursor.rewind();
        assert_eq!(cursor, Cursor::new());
    }
}
