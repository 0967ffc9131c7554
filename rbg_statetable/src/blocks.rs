//! Block-boundary annotation of the row table.

use log::warn;
use rbg_data::BlockFlags;

use crate::state::CompilerState;

/// Mark the first row of every block with `BLOCKSTART` and OR `BLOCKEND` into
/// its last row. A one-row block carries both. Rows outside any boundary keep
/// the empty set, which is written out as `mZERO`.
pub fn annotate_blocks(state: &mut CompilerState) {
    for symbol in state.symbols.iter() {
        if let Some(row) = state.rows.get_mut(symbol.block_start) {
            row.blk_flags.insert(BlockFlags::BLOCKSTART);
        }
        match symbol.block_end.and_then(|end| state.rows.get_mut(end)) {
            Some(row) => row.blk_flags.insert(BlockFlags::BLOCKEND),
            None => warn!("block '{}' has no valid end row; BLOCKEND not set", symbol.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbg_data::RowEntry;

    fn state_with(rows: usize, blocks: &[(&str, usize, usize)]) -> CompilerState {
        let mut state = CompilerState::new();
        for address in 0..rows {
            state.place_row(address, RowEntry::default());
        }
        for (name, start, end) in blocks {
            state.symbols.open(name, *start).expect("open");
            state.symbols.close(name, *end).expect("close");
        }
        state
    }

    #[test]
    fn start_end_and_single_row_blocks() {
        let mut state = state_with(3, &[("oPEN", 0, 1), ("lOCK", 2, 2)]);
        annotate_blocks(&mut state);
        let flags: Vec<_> = state.rows.iter().map(|r| r.blk_flags).collect();
        assert_eq!(
            flags,
            vec![
                BlockFlags::BLOCKSTART,
                BlockFlags::BLOCKEND,
                BlockFlags::BLOCKSTART | BlockFlags::BLOCKEND,
            ]
        );
        assert_eq!(state.rows[2].blk_flags.token(), "mBLOCKSTART|mBLOCKEND");
    }

    #[test]
    fn interior_rows_emit_zero() {
        let mut state = state_with(4, &[("wAIT", 0, 3)]);
        annotate_blocks(&mut state);
        assert!(state.rows[1].blk_flags.is_empty());
        assert_eq!(state.rows[2].blk_flags.token(), "mZERO");
        assert_eq!(state.rows[3].blk_flags, BlockFlags::BLOCKEND);
    }

    #[test]
    fn every_row_has_exactly_one_flag_state() {
        let mut state = state_with(6, &[("a", 0, 0), ("b", 1, 3), ("c", 4, 5)]);
        annotate_blocks(&mut state);
        let starts: Vec<_> = state.symbols.iter().map(|s| s.block_start).collect();
        for (address, row) in state.rows.iter().enumerate() {
            assert_eq!(
                row.blk_flags.contains(BlockFlags::BLOCKSTART),
                starts.contains(&address),
                "row {address}"
            );
            assert!(BlockFlags::all().contains(row.blk_flags));
        }
    }
}
