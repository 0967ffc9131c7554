use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based address of a row in the compiled state table.
pub type Address = usize;

/// Firmware value for a jump target that could not be resolved.
pub const UNDEFINED_ADDRESS: u16 = 254;
/// Firmware value for "no jump" / empty cell.
pub const NONE_ADDRESS: u16 = 255;
/// Number of addressable rows before addresses collide with the sentinels.
pub const MAX_ROWS: usize = UNDEFINED_ADDRESS as usize;

/// Token emitted for an empty cell.
pub const NONE_TOKEN: &str = "mNONE";
/// Token emitted for an empty flag field.
pub const ZERO_TOKEN: &str = "mZERO";
/// Token emitted for an unresolved jump target.
pub const UNDEFINED_TOKEN: &str = "mUNDEFINED";

/// Columns read from the state table sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Index,
    Special,
    EfctSound,
    EfctLed,
    InputRbg,
    StoreVal,
    StoreAddr,
    GotoOnInput,
    GotoWithoutInput,
}

impl Column {
    /// Every column the sheet must provide, in canonical order.
    pub const ALL: [Column; 9] = [
        Column::Index,
        Column::Special,
        Column::EfctSound,
        Column::EfctLed,
        Column::InputRbg,
        Column::StoreVal,
        Column::StoreAddr,
        Column::GotoOnInput,
        Column::GotoWithoutInput,
    ];

    /// Columns whose values name blocks in the symbol table.
    pub const JUMP_TARGETS: [Column; 2] = [Column::GotoOnInput, Column::GotoWithoutInput];

    /// Header spelling used in the spreadsheet.
    pub fn name(self) -> &'static str {
        match self {
            Column::Index => "index",
            Column::Special => "SPECIAL",
            Column::EfctSound => "efctSound",
            Column::EfctLed => "efctLED",
            Column::InputRbg => "inputRBG",
            Column::StoreVal => "storeVal",
            Column::StoreAddr => "storeAddr",
            Column::GotoOnInput => "gotoOnInput",
            Column::GotoWithoutInput => "gotoWithoutInput",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    /// True for columns that hold block names and follow the capitalization rule.
    pub fn is_symbolic(self) -> bool {
        matches!(self, Column::Index | Column::GotoOnInput | Column::GotoWithoutInput)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Apply the symbol capitalization rule: first character lower-case, the rest upper-case.
///
/// Two spellings that differ only in case collapse to the same symbol.
///
/// ```
/// use rbg_data::normalize_symbol;
///
/// assert_eq!(normalize_symbol("open"), "oPEN");
/// assert_eq!(normalize_symbol("mROW_POWERON"), "mROW_POWERON");
/// assert_eq!(normalize_symbol(&normalize_symbol("Lock")), normalize_symbol("Lock"));
/// ```
pub fn normalize_symbol(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars.flat_map(char::to_uppercase)).collect(),
        None => String::new(),
    }
}

bitflags! {
    /// Block boundary markers carried in the `blkFlags` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct BlockFlags: u16 {
        const BLOCKSTART = 0x80;
        const BLOCKEND = 0x40;
    }
}

impl BlockFlags {
    /// Symbolic form used in the emitted initializer.
    pub fn token(self) -> String {
        if self.is_empty() {
            return ZERO_TOKEN.to_string();
        }
        let mut parts = Vec::new();
        if self.contains(BlockFlags::BLOCKSTART) {
            parts.push("mBLOCKSTART");
        }
        if self.contains(BlockFlags::BLOCKEND) {
            parts.push("mBLOCKEND");
        }
        parts.join("|")
    }
}

/// Categorical values of the `inputRBG` column.
///
/// Values without a known mask pass through unchanged as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputMask {
    Open,
    Lock,
    TrigOnly,
    TrigYellow,
    TrigGreen,
    TrigBlack,
    TrigExtra,
    TrigAny3,
    TrigAll3,
    TrigAny4,
    TrigAll4,
    Other(String),
}

impl InputMask {
    /// Classify a trimmed, non-empty cell. Matching is case-sensitive.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "open" => InputMask::Open,
            "lock" => InputMask::Lock,
            "trigOnly" => InputMask::TrigOnly,
            "trigYellow" => InputMask::TrigYellow,
            "trigGreen" => InputMask::TrigGreen,
            "trigBlack" => InputMask::TrigBlack,
            "trigExtra" => InputMask::TrigExtra,
            "trigAny3" => InputMask::TrigAny3,
            "trigAll3" => InputMask::TrigAll3,
            "trigAny4" => InputMask::TrigAny4,
            "trigAll4" => InputMask::TrigAll4,
            other => InputMask::Other(other.to_string()),
        }
    }

    /// Mask expression written into the table.
    pub fn token(&self) -> &str {
        match self {
            InputMask::Open => "mINP_OPEN",
            InputMask::Lock => "mINP_LOCK",
            InputMask::TrigOnly => "mINP_TRIG",
            InputMask::TrigYellow => "mINP_TRIG|mINP_B01",
            InputMask::TrigGreen => "mINP_TRIG|mINP_B02",
            InputMask::TrigBlack => "mINP_TRIG|mINP_B04",
            InputMask::TrigExtra => "mINP_TRIG|mINP_BXTRA",
            InputMask::TrigAny3 => "mINP_TRIG|mINP_BANY|mINP_B07",
            InputMask::TrigAll3 => "mINP_TRIG|mINP_B07",
            InputMask::TrigAny4 => "mINP_TRIG|mINP_BANY|mINP_B0F",
            InputMask::TrigAll4 => "mINP_TRIG|mINP_B0F",
            InputMask::Other(raw) => raw,
        }
    }
}

/// A named block of contiguous rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub block_start: Address,
    /// `None` while the block is still open.
    pub block_end: Option<Address>,
}

impl Symbol {
    pub fn open(name: impl Into<String>, block_start: Address) -> Self {
        Self {
            name: name.into(),
            block_start,
            block_end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.block_end.is_none()
    }
}

/// Fields of the emitted `RBGStateTable_t`, in struct order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BlkFlags,
    Special,
    EfctSound,
    EfctLed,
    InputRbg,
    StoreVal,
    StoreAddr,
    GotoOnInput,
    GotoWithoutInput,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::BlkFlags => "blkFlags",
            Field::Special => Column::Special.name(),
            Field::EfctSound => Column::EfctSound.name(),
            Field::EfctLed => Column::EfctLed.name(),
            Field::InputRbg => Column::InputRbg.name(),
            Field::StoreVal => Column::StoreVal.name(),
            Field::StoreAddr => Column::StoreAddr.name(),
            Field::GotoOnInput => Column::GotoOnInput.name(),
            Field::GotoWithoutInput => Column::GotoWithoutInput.name(),
        }
    }
}

/// Static declaration of one struct field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDecl {
    pub field: Field,
    pub c_type: &'static str,
    pub comment: &'static str,
}

/// Emitted struct layout. `index` is build-time metadata and has no field.
pub const STRUCT_FIELDS: [FieldDecl; 9] = [
    FieldDecl {
        field: Field::BlkFlags,
        c_type: "uint16_t",
        comment: "mBLOCKSTART, mBLOCKEND or mZERO",
    },
    FieldDecl {
        field: Field::Special,
        c_type: "uint16_t",
        comment: "special row-handling flags: mSPCL_*",
    },
    FieldDecl {
        field: Field::EfctSound,
        c_type: "uint16_t",
        comment: "index for sound to make | (loud << mSHIFT_EFCT_SND_VOL) | masks",
    },
    FieldDecl {
        field: Field::EfctLed,
        c_type: "uint16_t",
        comment: "index for light pattern",
    },
    FieldDecl {
        field: Field::InputRbg,
        c_type: "uint16_t",
        comment: "mask for input expected",
    },
    FieldDecl {
        field: Field::StoreVal,
        c_type: "uint16_t",
        comment: "value to store, 8 bit uint",
    },
    FieldDecl {
        field: Field::StoreAddr,
        c_type: "uint16_t",
        comment: "address to store; includes mask for mFUNC, mVAL",
    },
    FieldDecl {
        field: Field::GotoOnInput,
        c_type: "uint16_t",
        comment: "index within table to go with matching input",
    },
    FieldDecl {
        field: Field::GotoWithoutInput,
        c_type: "uint16_t",
        comment: "index within table to go without waiting for input",
    },
];

/// One normalized row of the state table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowEntry {
    /// Normalized block name; never emitted as a field.
    pub index: Option<String>,
    pub blk_flags: BlockFlags,
    pub special: Option<String>,
    pub efct_sound: Option<String>,
    pub efct_led: Option<String>,
    pub input_rbg: Option<InputMask>,
    pub store_val: Option<String>,
    pub store_addr: Option<String>,
    pub goto_on_input: Option<String>,
    pub goto_without_input: Option<String>,
    /// Spreadsheet row number the entry came from.
    #[serde(default)]
    pub source_row: usize,
}

impl RowEntry {
    /// Normalized text of a column, before any mask translation is applied.
    pub fn cell(&self, column: Column) -> Option<&str> {
        match column {
            Column::Index => self.index.as_deref(),
            Column::Special => self.special.as_deref(),
            Column::EfctSound => self.efct_sound.as_deref(),
            Column::EfctLed => self.efct_led.as_deref(),
            Column::InputRbg => self.input_rbg.as_ref().map(InputMask::token),
            Column::StoreVal => self.store_val.as_deref(),
            Column::StoreAddr => self.store_addr.as_deref(),
            Column::GotoOnInput => self.goto_on_input.as_deref(),
            Column::GotoWithoutInput => self.goto_without_input.as_deref(),
        }
    }

    /// Text written for `field` in the initializer; empty cells become `mNONE`.
    pub fn token(&self, field: Field) -> String {
        let cell = match field {
            Field::BlkFlags => return self.blk_flags.token(),
            Field::Special => self.cell(Column::Special),
            Field::EfctSound => self.cell(Column::EfctSound),
            Field::EfctLed => self.cell(Column::EfctLed),
            Field::InputRbg => self.cell(Column::InputRbg),
            Field::StoreVal => self.cell(Column::StoreVal),
            Field::StoreAddr => self.cell(Column::StoreAddr),
            Field::GotoOnInput => self.cell(Column::GotoOnInput),
            Field::GotoWithoutInput => self.cell(Column::GotoWithoutInput),
        };
        cell.unwrap_or(NONE_TOKEN).to_string()
    }
}

/// Resolution of one jump-target value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpTarget {
    /// Empty cell: no jump.
    None,
    /// Known block; jumps to its first row.
    Resolved { name: String, address: Address },
    /// Referenced name with no block behind it.
    Undefined { name: String },
}

impl JumpTarget {
    pub fn name(&self) -> Option<&str> {
        match self {
            JumpTarget::None => None,
            JumpTarget::Resolved { name, .. } | JumpTarget::Undefined { name } => Some(name),
        }
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            JumpTarget::Resolved { address, .. } => Some(*address),
            _ => None,
        }
    }
}

/// A novel effect token and the slot assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSlot {
    pub token: String,
    pub slot: u32,
}

/// Effect tokens not covered by the known-effects set, per effect column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectSlots {
    #[serde(default)]
    pub sound: Vec<EffectSlot>,
    #[serde(default)]
    pub led: Vec<EffectSlot>,
}

impl EffectSlots {
    pub fn is_empty(&self) -> bool {
        self.sound.is_empty() && self.led.is_empty()
    }
}

/// Final product of a compile run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompiledTable {
    pub rows: Vec<RowEntry>,
    /// Symbols in the order their blocks were opened.
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub effects: EffectSlots,
    /// Referenced jump targets; resolved ones by ascending address, then undefined ones.
    #[serde(default)]
    pub targets: Vec<JumpTarget>,
}

impl CompiledTable {
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn target(&self, name: &str) -> Option<&JumpTarget> {
        self.targets.iter().find(|t| t.name() == Some(name))
    }
}
