//! Architecture, register, and addressing-mode records.
//!
//! Builders produce these records before any database identity exists, so cross references are
//! arena indices:
//! 1. **Architecture placeholder:** [`ArchIndex`] points into [`ArchMetadata::architectures`].
//! 2. **Register forest:** [`RegisterIndex`] points into [`ArchMetadata::registers`]. A parent link
//!    may only target a root, so chains have length one and cycles cannot be built.
//!
//! The store rewrites both kinds of index into row ids when it persists the bundle.

use serde::{Deserialize, Serialize};

/// Placeholder reference to an architecture inside one [`ArchMetadata`] bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchIndex(pub usize);

/// Arena index of a register inside one [`ArchMetadata`] bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegisterIndex(pub usize);

/// Byte order of an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }

    /// Parses the stored form; anything other than `big` is little-endian.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// One ISA family member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Unique architecture key.
    pub isa_name: String,
    /// Native word size in bits.
    pub word_size: u32,
    /// Byte order.
    pub endianness: Endianness,
    /// Human-readable description.
    pub description: String,
    /// Vendor machine-mode name (e.g. `LONG_64`).
    pub machine_mode: String,
}

/// Architecture row with its persisted identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureRecord {
    /// Row id.
    pub id: i64,
    /// Architecture fields.
    #[serde(flatten)]
    pub architecture: Architecture,
}

/// A register as produced by a metadata builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// Owning architecture.
    pub architecture: ArchIndex,
    /// Upper-case register name.
    pub register_name: String,
    /// Vendor register class (`gpr`, `xmm`, `simd`, ...).
    pub register_class: String,
    /// Width in bits.
    pub width_bits: u32,
    /// Vendor numeric encoding.
    pub encoding_id: Option<u32>,
    /// Root of a register family.
    pub is_main_register: bool,
    /// Family root, for sub-registers.
    pub parent: Option<RegisterIndex>,
    /// Alternate names (for roots: the names of their sub-registers).
    pub aliases: Vec<String>,
    /// Explicit calling-convention override.
    pub calling_convention_preserved: Option<bool>,
    /// Fixed-role description (stack pointer, link register, ...).
    pub register_purpose: Option<String>,
}

impl Register {
    /// Creates a register with no links, aliases, or overrides.
    pub fn new(
        architecture: ArchIndex,
        register_name: impl Into<String>,
        register_class: impl Into<String>,
        width_bits: u32,
    ) -> Self {
        Self {
            architecture,
            register_name: register_name.into(),
            register_class: register_class.into(),
            width_bits,
            encoding_id: None,
            is_main_register: false,
            parent: None,
            aliases: Vec::new(),
            calling_convention_preserved: None,
            register_purpose: None,
        }
    }

    /// Sets the vendor encoding id.
    #[must_use]
    pub const fn with_encoding(mut self, encoding_id: Option<u32>) -> Self {
        self.encoding_id = encoding_id;
        self
    }

    /// Sets main-register status.
    #[must_use]
    pub const fn main(mut self, is_main: bool) -> Self {
        self.is_main_register = is_main;
        self
    }
}

/// Register row with persisted identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRecord {
    /// Row id.
    pub id: i64,
    /// Owning architecture row id.
    pub architecture_id: i64,
    /// Upper-case register name.
    pub register_name: String,
    /// Vendor register class.
    pub register_class: String,
    /// Width in bits.
    pub width_bits: u32,
    /// Vendor numeric encoding.
    pub encoding_id: Option<u32>,
    /// Root of a register family.
    pub is_main_register: bool,
    /// Parent row id, for sub-registers.
    pub parent_register_id: Option<i64>,
    /// Alternate names.
    pub aliases: Vec<String>,
    /// Explicit calling-convention override.
    pub calling_convention_preserved: Option<bool>,
    /// Fixed-role description.
    pub register_purpose: Option<String>,
}

/// A named operand addressing form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressingMode {
    /// Owning architecture.
    pub architecture: ArchIndex,
    /// Mode key (e.g. `base_displacement`).
    pub mode_name: String,
    /// Human-readable description.
    pub description: String,
    /// Example assembly.
    pub example_syntax: String,
}

/// Addressing-mode row with persisted identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressingModeRecord {
    /// Row id.
    pub id: i64,
    /// Owning architecture row id.
    pub architecture_id: i64,
    /// Mode key.
    pub mode_name: String,
    /// Human-readable description.
    pub description: String,
    /// Example assembly.
    pub example_syntax: String,
}

/// Output of a metadata builder: architectures plus the registers and modes that reference them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchMetadata {
    /// Architectures, addressed by [`ArchIndex`].
    pub architectures: Vec<Architecture>,
    /// Register arena, addressed by [`RegisterIndex`].
    pub registers: Vec<Register>,
    /// Addressing modes.
    pub addressing_modes: Vec<AddressingMode>,
}

impl ArchMetadata {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an architecture and returns its placeholder.
    pub fn push_architecture(&mut self, architecture: Architecture) -> ArchIndex {
        self.architectures.push(architecture);
        ArchIndex(self.architectures.len() - 1)
    }

    /// Appends a register and returns its arena index.
    pub fn push_register(&mut self, register: Register) -> RegisterIndex {
        self.registers.push(register);
        RegisterIndex(self.registers.len() - 1)
    }

    /// Appends an addressing mode.
    pub fn push_addressing_mode(
        &mut self,
        architecture: ArchIndex,
        mode_name: &str,
        description: &str,
        example_syntax: &str,
    ) {
        self.addressing_modes.push(AddressingMode {
            architecture,
            mode_name: mode_name.to_owned(),
            description: description.to_owned(),
            example_syntax: example_syntax.to_owned(),
        });
    }

    /// Looks up an architecture placeholder by key.
    pub fn architecture_index(&self, isa_name: &str) -> Option<ArchIndex> {
        self.architectures
            .iter()
            .position(|a| a.isa_name == isa_name)
            .map(ArchIndex)
    }

    /// Finds a register by architecture and case-insensitive name.
    pub fn find_register(&self, architecture: ArchIndex, name: &str) -> Option<RegisterIndex> {
        self.registers
            .iter()
            .position(|r| r.architecture == architecture && r.register_name.eq_ignore_ascii_case(name))
            .map(RegisterIndex)
    }

    /// Links `child` under `parent` and records the child's name as an alias of the parent.
    ///
    /// The link is refused (returns `false`) when either index is out of range, the two are the
    /// same register, they belong to different architectures, the parent is itself a child, or
    /// the child already has children. This keeps every chain at most one link long.
    pub fn link(&mut self, child: RegisterIndex, parent: RegisterIndex) -> bool {
        if child == parent
            || child.0 >= self.registers.len()
            || parent.0 >= self.registers.len()
        {
            return false;
        }
        let (c, p) = (&self.registers[child.0], &self.registers[parent.0]);
        if c.architecture != p.architecture || p.parent.is_some() {
            return false;
        }
        if self.registers.iter().any(|r| r.parent == Some(child)) {
            return false;
        }

        let name = c.register_name.clone();
        self.registers[child.0].parent = Some(parent);
        let aliases = &mut self.registers[parent.0].aliases;
        if !aliases.contains(&name) {
            aliases.push(name);
        }
        true
    }

    /// Follows parent links to the family root.
    ///
    /// The walk is bounded by the arena size.
    pub fn root_of(&self, index: RegisterIndex) -> RegisterIndex {
        let mut current = index;
        for _ in 0..self.registers.len() {
            match self.registers.get(current.0).and_then(|r| r.parent) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Registers belonging to one architecture.
    pub fn registers_for(&self, architecture: ArchIndex) -> impl Iterator<Item = &Register> {
        self.registers.iter().filter(move |r| r.architecture == architecture)
    }

    /// Appends another bundle, shifting its indices past the current contents.
    pub fn extend(&mut self, other: Self) {
        let arch_base = self.architectures.len();
        let reg_base = self.registers.len();
        self.architectures.extend(other.architectures);
        self.registers.extend(other.registers.into_iter().map(|mut r| {
            r.architecture = ArchIndex(r.architecture.0 + arch_base);
            r.parent = r.parent.map(|p| RegisterIndex(p.0 + reg_base));
            r
        }));
        self.addressing_modes
            .extend(other.addressing_modes.into_iter().map(|mut m| {
                m.architecture = ArchIndex(m.architecture.0 + arch_base);
                m
            }));
    }
}
