//! Reference Resolver: pass 2 jump-target resolution.
//!
//! Every distinct value from the `gotoOnInput` and `gotoWithoutInput`
//! columns is looked up in the symbol table. Known names resolve to their
//! block's first row; unknown names are reported and emitted as
//! `mUNDEFINED` so the firmware never silently jumps to row 0.

use log::debug;
use rbg_data::{Column, JumpTarget};

use crate::diagnostics::Diagnostic;
use crate::state::{CompilerState, SymbolTable};

/// Resolve all referenced jump targets.
///
/// Resolved targets come first, ordered by address; undefined ones follow
/// in the order they were first referenced.
pub fn resolve_targets(state: &mut CompilerState) -> Vec<JumpTarget> {
    let mut names: Vec<&str> = Vec::new();
    for column in Column::JUMP_TARGETS {
        for value in state.discovered.values(column) {
            if !names.contains(&value.as_str()) {
                names.push(value);
            }
        }
    }

    let mut resolved = Vec::new();
    let mut undefined = Vec::new();
    for name in names {
        match target_for(&state.symbols, Some(name)) {
            JumpTarget::Resolved { name, address } => {
                debug!("jump target '{name}' resolves to row {address}");
                resolved.push((address, name));
            },
            JumpTarget::Undefined { name } => undefined.push(name),
            JumpTarget::None => {},
        }
    }
    resolved.sort();

    let mut targets: Vec<JumpTarget> = resolved
        .into_iter()
        .map(|(address, name)| JumpTarget::Resolved { name, address })
        .collect();
    for name in undefined {
        let rows = referencing_rows(state, &name);
        state.report(Diagnostic::UnresolvedTarget {
            name: name.clone(),
            rows,
        });
        targets.push(JumpTarget::Undefined { name });
    }
    targets
}

/// Classify one goto cell: blank, known block, or unknown name.
pub fn target_for(symbols: &SymbolTable, value: Option<&str>) -> JumpTarget {
    match value {
        None => JumpTarget::None,
        Some(name) => match symbols.get(name) {
            Some(symbol) => JumpTarget::Resolved {
                name: name.to_string(),
                address: symbol.block_start,
            },
            None => JumpTarget::Undefined { name: name.to_string() },
        },
    }
}

fn referencing_rows(state: &CompilerState, name: &str) -> Vec<usize> {
    state
        .rows
        .iter()
        .filter(|row| Column::JUMP_TARGETS.iter().any(|&c| row.cell(c) == Some(name)))
        .map(|row| row.source_row)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbg_data::RowEntry;

    fn state_with(blocks: &[(&str, usize)], gotos: &[(Option<&str>, Option<&str>)]) -> CompilerState {
        let mut state = CompilerState::new();
        for (name, start) in blocks {
            state.symbols.open(name, *start).expect("open");
        }
        for (i, (on_input, without_input)) in gotos.iter().enumerate() {
            let entry = RowEntry {
                goto_on_input: on_input.map(str::to_string),
                goto_without_input: without_input.map(str::to_string),
                source_row: i + 2,
                ..RowEntry::default()
            };
            if let Some(v) = on_input {
                state.discovered.record(Column::GotoOnInput, v);
            }
            if let Some(v) = without_input {
                state.discovered.record(Column::GotoWithoutInput, v);
            }
            state.place_row(i, entry);
        }
        state
    }

    #[test]
    fn targets_sorted_by_address_not_discovery() {
        let mut state = state_with(
            &[("a", 0), ("b", 3), ("c", 1)],
            &[(Some("b"), None), (Some("a"), Some("c")), (None, Some("b"))],
        );
        let targets = resolve_targets(&mut state);
        let order: Vec<_> = targets.iter().map(|t| (t.name().unwrap_or(""), t.address())).collect();
        assert_eq!(order, vec![("a", Some(0)), ("c", Some(1)), ("b", Some(3))]);
        assert!(state.diagnostics.is_empty());
    }

    #[test]
    fn ghost_is_undefined_and_reported() {
        let mut state = state_with(&[("oPEN", 0)], &[(Some("gHOST"), Some("oPEN")), (None, Some("gHOST"))]);
        let targets = resolve_targets(&mut state);
        assert_eq!(
            targets,
            vec![
                JumpTarget::Resolved {
                    name: "oPEN".into(),
                    address: 0
                },
                JumpTarget::Undefined { name: "gHOST".into() },
            ]
        );
        assert_eq!(
            state.diagnostics,
            vec![Diagnostic::UnresolvedTarget {
                name: "gHOST".into(),
                rows: vec![2, 3],
            }]
        );
    }

    #[test]
    fn blank_is_no_jump() {
        let state = state_with(&[("oPEN", 0)], &[]);
        assert_eq!(target_for(&state.symbols, None), JumpTarget::None);
        assert_eq!(target_for(&state.symbols, Some("oPEN")).address(), Some(0));
    }

    #[test]
    fn each_referenced_name_appears_once() {
        let mut state = state_with(
            &[("x", 0), ("y", 1)],
            &[(Some("y"), Some("y")), (Some("x"), Some("y")), (Some("y"), None)],
        );
        let targets = resolve_targets(&mut state);
        assert_eq!(targets.len(), 2);
    }
}
