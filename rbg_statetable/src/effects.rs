//! Effect Collector.
//!
//! Sound and LED-pattern cells normally name one of the firmware's effect
//! groups. Anything else gets a sequential slot per column so the author can
//! see what still needs a home. The slots are reported only; they are not
//! written into the table.

use std::collections::HashSet;

use log::info;
use rbg_data::{Column, EffectSlot, EffectSlots, NONE_TOKEN, RowEntry};

/// Effect bases the firmware already knows about.
pub const KNOWN_EFFECTS: [&str; 5] = [NONE_TOKEN, "mEFCT_SPCL", "mEFCT_SHOOT", "mEFCT_OPEN_BARREL", "mEFCT_LOCK_LOAD"];

/// True if the first `|`-separated part of `token` is a known effect.
pub fn is_known_effect(token: &str) -> bool {
    let base = token.split('|').next().unwrap_or_default().trim();
    KNOWN_EFFECTS.contains(&base)
}

/// Assign slots to unknown effects in both effect columns.
pub fn collect_effects(rows: &[RowEntry]) -> EffectSlots {
    EffectSlots {
        sound: collect_column(rows, Column::EfctSound),
        led: collect_column(rows, Column::EfctLed),
    }
}

fn collect_column(rows: &[RowEntry], column: Column) -> Vec<EffectSlot> {
    let mut seen = HashSet::new();
    let mut slots = Vec::new();
    for token in rows.iter().filter_map(|r| r.cell(column)) {
        if is_known_effect(token) || !seen.insert(token) {
            continue;
        }
        let slot = u32::try_from(slots.len() + 1).unwrap_or(u32::MAX);
        info!("{column}: unknown effect '{token}' assigned slot {slot}");
        slots.push(EffectSlot {
            token: token.to_string(),
            slot,
        });
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound(token: &str) -> RowEntry {
        RowEntry {
            efct_sound: Some(token.to_string()),
            ..RowEntry::default()
        }
    }

    #[test]
    fn repeated_unknown_effect_shares_one_slot() {
        let rows = vec![sound("customChime"), sound("customChime")];
        let slots = collect_effects(&rows);
        assert_eq!(
            slots.sound,
            vec![EffectSlot {
                token: "customChime".into(),
                slot: 1
            }]
        );
        assert!(slots.led.is_empty());
    }

    #[test]
    fn only_first_component_is_checked() {
        assert!(is_known_effect("mEFCT_SHOOT|mEFCT_UNKNOWN"));
        assert!(!is_known_effect("mEFCT_PWRON|mEFCT_SHOOT"));
        assert!(is_known_effect(" mEFCT_SPCL |0x10"));
    }

    #[test]
    fn slots_are_per_column_in_first_seen_order() {
        let rows = vec![
            sound("beep"),
            RowEntry {
                efct_sound: Some("mEFCT_SHOOT".into()),
                efct_led: Some("glow".into()),
                ..RowEntry::default()
            },
            sound("boop"),
            sound("beep"),
        ];
        let slots = collect_effects(&rows);
        let sound: Vec<_> = slots.sound.iter().map(|s| (s.token.as_str(), s.slot)).collect();
        assert_eq!(sound, vec![("beep", 1), ("boop", 2)]);
        assert_eq!(slots.led[0].slot, 1);
        assert_eq!(slots.led[0].token, "glow");
    }

    #[test]
    fn blank_cells_are_ignored() {
        let rows = vec![RowEntry::default()];
        assert!(collect_effects(&rows).is_empty());
    }
}
