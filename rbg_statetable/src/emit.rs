//! Emitters for a compiled table: the C header consumed by the firmware
//! sketch, and a RON dump for tooling.

use rbg_data::{
    BlockFlags, CompiledTable, EffectSlot, JumpTarget, NONE_ADDRESS, NONE_TOKEN, STRUCT_FIELDS, UNDEFINED_ADDRESS,
    UNDEFINED_TOKEN,
};

use crate::config::{EmitOptions, InitStyle};

/// Hand-maintained `.SPECIAL` and configuration-address constants.
const SPECIAL_DEFINES: &str = "\
// define the symbols - .SPECIAL:
#define mSPCL_EFCT_NONE       0x8000 // set this bit for no jump and no continuous sound
#define mSPCL_EFCT_ONETIME    0x4000 // set this bit for onetime sound play then jump while waiting for other input or sound end
#define mSPCL_EFCT_CONTINUOUS 0x2000 // set this bit for continuous sound play while waiting for other input
#define mSPCL_EFCT_CONFIGURE  0x1000 // set this bit to use configuration variables instead of EEPROM and do continuous
#define mSPCL_HANDLER         0x0080 // mask for functions is ((uint16_t) (mSPCL_HANDLER-1))
#define mSPCL_HANDLER_SHOOT        2 // solenoid ON
#define mSPCL_HANDLER_SOLENOID     3 // solenoid OFF
#define mSPCL_HANDLER_CFGSTART     4 // configuration - store value at address
#define mSPCL_HANDLER_CFGNEXT      5 // configuration - go to next value at address
#define mSPCL_HANDLER_CFG2STORAGE  6 // configuration - install current config num in EEPROM or myState
#define mSPCL_HANDLER_CFG2STORAGESKIP 7 // configuration - store current config num in EEPROM or myState, skip number based on choice
#define mSPCL_HANDLER_CFG2CPYRST   8 // configuration - use current config num to manage EEPROM with copy or reset, then clear out configuration states
#define mSPCL_HANDLER_FACT2RUN     9 // configuration - factory setting to running configuration
#define mSPCL_HANDLER_FACT2ALL    10 // configuration - factory setting to all saved configuration
#define mSPCL_HANDLER_RUN2ONE     11 // configuration - running configuration to saved config one
#define mSPCL_HANDLER_RUN2TWO     12 // configuration - running configuration to saved config two
#define mSPCL_HANDLER_RUN2THREE   13 // configuration - running configuration to saved config three
#define mSPCL_HANDLER_ONE2RUN     14 // configuration - saved configuration one to running config
#define mSPCL_HANDLER_TWO2RUN     15 // configuration - saved configuration two to running config
#define mSPCL_HANDLER_THREE2RUN   16 // configuration - saved configuration three to running config
#define mSPCL_HANDLER_CFG2ADVNCD  17 // configuration - advanced menu: the selection/skip function
#define mSPCL_HANDLER_DEMOMODE    18 // configuration - advanced menu: demo-mode
#define mSPCL_HANDLER_ADVFEATURES 19 // configuration - advanced menu: ADVANCED features

// these are used with mSPCL_HANDLER_START and _NEXT
#define mADDR_CFG_CATEGORY         1 // for looping through SOUND or LED PATTERN
#define mADDR_CFG_TYPE             2 // for looping through number groups: shooting, open, close, etc.
#define mADDR_CFG_EFFECT           3 // for looping through the effects for that CATEGORY and TYPE
#define mADDR_CFG_CPY_RST          4 // configuration copies and factory resets
#define mADDR_CFG_ADVANCED         5 // advanced configuration
#define mEFCT_TYPE_CFG_STOREADDR_MAX mADDR_CFG_ADVANCED // .storeAddr - maximum value
";

/// Effect number groups; each group owns the ten numbers after its base.
pub const EFFECT_RANGES: [(&str, u32, &str); 8] = [
    ("mEFCT_WIND_UP", 0, "001 to 009 - wind-up effects"),
    ("mEFCT_SHOOT", 10, "011 to 019 - shoot effects"),
    ("mEFCT_OPEN_BARREL", 20, "021 to 029 - open barrel effects"),
    ("mEFCT_LOCK_LOAD", 30, "031 to 039 - lock and load barrel effects"),
    ("mEFCT_PWRON", 40, "041 to 049 - initial power-up effects"),
    ("mEFCT_WAIT", 50, "051 to 059 - waiting for trigger"),
    ("mEFCT_CONFIGURE", 60, "061 to 099 - effects used to navigate menus"),
    ("mEFCT_UNIQ", 100, "101 to 127 - unique effects not included in configurations"),
];

/// Sound number and volume packing in `efctSound`.
pub const SOUND_MASKS: [(&str, u32, &str); 4] = [
    ("mMASK_EFCT_SND_NUM", 0xFF, "mask for sound number"),
    ("mSHIFT_EFCT_SND_VOL", 16, "shift for volume"),
    ("mMASK_EFCT_SND_VOL", 0x1F, "mask for volume once shifted in place"),
    ("mDEFAULT_EFCT_SND_VOL", 25, "default volume - 25 is pretty good"),
];

const STRUCT_NAME: &str = "RBGStateTable_t";
const TABLE_NAME: &str = "myStateTable";

/// Render the complete C header text for `table`.
pub fn emit_header(table: &CompiledTable, options: &EmitOptions) -> String {
    let mut out = String::new();
    out.push_str("// define the symbols - general use symbols:\n");
    out.push_str(&format!("#define {UNDEFINED_TOKEN} {UNDEFINED_ADDRESS}\n"));
    out.push_str(&format!("#define {NONE_TOKEN} {NONE_ADDRESS}\n"));
    out.push_str("#define mZERO 0\n\n");
    out.push_str(SPECIAL_DEFINES);
    out.push_str("\n// define the symbols - .blkFlags:\n");
    out.push_str(&format!("#define mBLOCKSTART {:#04x}\n", BlockFlags::BLOCKSTART.bits()));
    out.push_str(&format!("#define mBLOCKEND   {:#04x}\n", BlockFlags::BLOCKEND.bits()));
    out.push('\n');
    out.push_str(&emit_symbols(&table.targets));
    out.push('\n');
    out.push_str(&emit_effect_ranges());
    if options.report_effects && !table.effects.is_empty() {
        out.push('\n');
        out.push_str(&emit_effect_report(&table.effects.sound, &table.effects.led));
    }
    out.push('\n');
    out.push_str(&emit_struct());
    out.push('\n');
    match options.init_style {
        InitStyle::Positional => out.push_str(&emit_initializer(table, InitStyle::Positional)),
        InitStyle::Designated => out.push_str(&emit_initializer(table, InitStyle::Designated)),
        InitStyle::Both => {
            out.push_str("#ifdef RBG_POSITIONAL_INIT\n");
            out.push_str("// positional initializer, for toolchains without designated initializers\n");
            out.push_str(&emit_initializer(table, InitStyle::Positional));
            out.push_str("#else // designated initializer\n");
            out.push_str(&emit_initializer(table, InitStyle::Designated));
            out.push_str("#endif // RBG_POSITIONAL_INIT\n");
        },
    }
    out
}

/// `#define` lines for every referenced block, unresolved ones as `mUNDEFINED`.
pub fn emit_symbols(targets: &[JumpTarget]) -> String {
    let mut out = String::from(
        "// define the symbols - .index: first the single constant mROW_POWERON one, then the others:\n\
         #define mROW_POWERON 0  // first address in myStateTable[]\n",
    );
    for target in targets {
        match target {
            JumpTarget::Resolved { name, address } => out.push_str(&format!("#define {name} {address}\n")),
            JumpTarget::Undefined { name } => {
                out.push_str(&format!("#define {name} {UNDEFINED_TOKEN} // ERROR - not a block in the state table\n"));
            },
            JumpTarget::None => {},
        }
    }
    out
}

fn emit_effect_ranges() -> String {
    let mut out = String::from("// define the effect number ranges - must be divisible by 10\n");
    for (name, value, comment) in EFFECT_RANGES {
        out.push_str(&define_aligned(name, value, comment));
    }
    out.push('\n');
    for (name, value, comment) in SOUND_MASKS {
        out.push_str(&define_aligned(name, value, comment));
    }
    out
}

fn define_aligned(name: &str, value: u32, comment: &str) -> String {
    let width = 20usize.saturating_sub(name.len());
    format!("#define {name} {value:>width$} // {comment}\n")
}

fn emit_effect_report(sound: &[EffectSlot], led: &[EffectSlot]) -> String {
    let mut out = String::from("// effects outside the known groups (report only, not used in the table):\n");
    for (column, slots) in [("efctSound", sound), ("efctLED", led)] {
        for slot in slots {
            out.push_str(&format!("//   {column} {:>3} {}\n", slot.slot, slot.token));
        }
    }
    out
}

fn emit_struct() -> String {
    let mut out = format!("typedef struct _{STRUCT_NAME} {{\n");
    for decl in STRUCT_FIELDS {
        let member = format!("{};", decl.field.name());
        out.push_str(&format!("    {} {member:<18}// {}\n", decl.c_type, decl.comment));
    }
    out.push_str(&format!("}} {STRUCT_NAME};\n"));
    out
}

fn emit_initializer(table: &CompiledTable, style: InitStyle) -> String {
    let mut out = format!("static const {STRUCT_NAME} {TABLE_NAME}[{}]\n", table.rows.len());
    out.push_str("#if USE_PROGMEM\n  PROGMEM\n#endif // end USE_PROGMEM\n  = {\n");
    for (address, row) in table.rows.iter().enumerate() {
        let index = row.index.as_deref().unwrap_or(NONE_TOKEN);
        out.push_str(&format!("      {{ /* row {address} {index} */ "));
        for decl in STRUCT_FIELDS {
            let token = row.token(decl.field);
            match style {
                InitStyle::Designated => out.push_str(&format!(" .{}={token},", decl.field.name())),
                _ => out.push_str(&format!(" {token},")),
            }
        }
        out.push_str(" },\n");
    }
    out.push_str(&format!("}}; // end definition of {TABLE_NAME}[]\n"));
    out
}

/// Pretty RON dump of the compiled table.
///
/// # Errors
/// Returns the serializer error if the table cannot be encoded.
pub fn emit_ron(table: &CompiledTable) -> Result<String, ron::Error> {
    ron::ser::to_string_pretty(table, ron::ser::PrettyConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbg_data::{EffectSlots, RowEntry, Symbol};

    fn one_row_table() -> CompiledTable {
        CompiledTable {
            rows: vec![RowEntry {
                index: Some("oPEN".into()),
                blk_flags: BlockFlags::BLOCKSTART | BlockFlags::BLOCKEND,
                goto_on_input: Some("oPEN".into()),
                ..RowEntry::default()
            }],
            symbols: vec![Symbol {
                name: "oPEN".into(),
                block_start: 0,
                block_end: Some(0),
            }],
            targets: vec![JumpTarget::Resolved {
                name: "oPEN".into(),
                address: 0,
            }],
            ..CompiledTable::default()
        }
    }

    #[test]
    fn positional_row_layout() {
        let text = emit_initializer(&one_row_table(), InitStyle::Positional);
        assert!(text.starts_with("static const RBGStateTable_t myStateTable[1]\n"));
        assert!(text.contains(
            "      { /* row 0 oPEN */  mBLOCKSTART|mBLOCKEND, mNONE, mNONE, mNONE, mNONE, mNONE, mNONE, oPEN, mNONE, },\n"
        ));
    }

    #[test]
    fn designated_row_layout() {
        let text = emit_initializer(&one_row_table(), InitStyle::Designated);
        assert!(text.contains(" .blkFlags=mBLOCKSTART|mBLOCKEND, .SPECIAL=mNONE,"));
        assert!(text.contains(" .gotoOnInput=oPEN, .gotoWithoutInput=mNONE, },\n"));
        assert!(!text.contains(".index="));
    }

    #[test]
    fn struct_excludes_index() {
        let text = emit_struct();
        assert!(text.contains("    uint16_t blkFlags;         // mBLOCKSTART, mBLOCKEND or mZERO\n"));
        assert!(text.contains("    uint16_t gotoWithoutInput; // "));
        assert!(!text.contains("index;"));
        assert!(text.ends_with("} RBGStateTable_t;\n"));
    }

    #[test]
    fn undefined_symbol_is_not_an_address() {
        let text = emit_symbols(&[JumpTarget::Undefined { name: "gHOST".into() }]);
        assert!(text.contains("#define gHOST mUNDEFINED"));
    }

    #[test]
    fn effect_ranges_are_right_aligned() {
        let text = emit_effect_ranges();
        assert!(text.contains("#define mEFCT_WIND_UP       0 // 001 to 009 - wind-up effects\n"));
        assert!(text.contains("#define mEFCT_UNIQ        100 // 101 to 127"));
        assert!(text.contains("#define mDEFAULT_EFCT_SND_VOL 25 // default volume"));
    }

    #[test]
    fn both_styles_are_guarded() {
        let text = emit_header(&one_row_table(), &EmitOptions::default());
        assert_eq!(text.matches("static const RBGStateTable_t").count(), 2);
        assert!(text.contains("#ifdef RBG_POSITIONAL_INIT\n"));
        assert!(text.contains("#define mBLOCKSTART 0x80\n"));
        assert!(text.contains("#define mBLOCKEND   0x40\n"));
        assert!(text.contains("#define oPEN 0\n"));
    }

    #[test]
    fn effect_report_is_optional() {
        let mut table = one_row_table();
        table.effects = EffectSlots {
            sound: vec![EffectSlot {
                token: "customChime".into(),
                slot: 1,
            }],
            led: Vec::new(),
        };
        let with = emit_header(&table, &EmitOptions::default());
        assert!(with.contains("//   efctSound   1 customChime\n"));
        let without = emit_header(
            &table,
            &EmitOptions {
                report_effects: false,
                ..EmitOptions::default()
            },
        );
        assert!(!without.contains("customChime"));
    }

    #[test]
    fn ron_dump_round_trips() {
        let table = one_row_table();
        let text = emit_ron(&table).expect("ron");
        let back: CompiledTable = ron::from_str(&text).expect("parse back");
        assert_eq!(back, table);
    }
}
