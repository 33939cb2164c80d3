//! ARM instruction-tree walker.
//!
//! The machine-readable ARM document is a tree of typed nodes. Each node's `_type` selects one
//! [`ArmNode`] variant:
//! 1. **Containers** (`Instruction.InstructionSet`, `Instruction.InstructionGroup`) hold `children`.
//! 2. **Instructions** (`Instruction.Instruction`) convert to one canonical record.
//! 3. **Aliases** (`Instruction.InstructionAlias`) convert to a simplified `ALIAS` record.
//!
//! [`ArmWalker`] visits nodes depth-first in document order with an explicit stack, taking
//! ownership of each subtree as it goes. A node that cannot be converted is reported as a
//! [`SkippedNode`] and the walk continues.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{Encoding, ISA_AARCH64, Instruction};

/// Description used when a node carries no title or description text.
pub const FALLBACK_DESCRIPTION: &str = "ARM AArch64 instruction";

const BASE_FEATURE: &str = "BASE";
const ISA_SET_A64: &str = "A64";

/// Architecture feature identifiers to catalog feature names.
const FEATURES: &[(&str, &str)] = &[
    ("FEAT_FP", "FP"),
    ("FEAT_ASIMD", "NEON"),
    ("FEAT_AES", "AES"),
    ("FEAT_SHA1", "SHA1"),
    ("FEAT_SHA256", "SHA256"),
    ("FEAT_CRC32", "CRC32"),
    ("FEAT_LSE", "LSE"),
    ("FEAT_FP16", "FP16"),
    ("FEAT_DPB", "DPB"),
    ("FEAT_SVE", "SVE"),
    ("FEAT_SVE2", "SVE2"),
    ("FEAT_TME", "TME"),
    ("FEAT_BF16", "BF16"),
    ("FEAT_I8MM", "I8MM"),
    ("FEAT_MTE", "MTE"),
    ("FEAT_PAUTH", "PAUTH"),
    ("FEAT_FCMA", "FCMA"),
    ("FEAT_JSCVT", "JSCVT"),
    ("FEAT_LRCPC", "LRCPC"),
    ("FEAT_LRCPC2", "LRCPC2"),
    ("FEAT_FRINTTS", "FRINTTS"),
    ("FEAT_DGH", "DGH"),
    ("FEAT_RNG", "RNG"),
    ("FEAT_FLAGM", "FLAGM"),
    ("FEAT_FLAGM2", "FLAGM2"),
    ("FEAT_FHML", "FHML"),
    ("FEAT_ECV", "ECV"),
    ("FEAT_AFP", "AFP"),
];

struct Patterns {
    name_suffix: Regex,
    non_alnum: Regex,
    feature: Regex,
}

#[allow(clippy::unwrap_used)]
static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    name_suffix: Regex::new(r"_[A-Za-z0-9]+$").unwrap(),
    non_alnum: Regex::new(r"[^A-Za-z0-9]").unwrap(),
    feature: Regex::new(r"FEAT_[A-Z0-9_]+").unwrap(),
});

/// Closed classification of a document node.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmNode {
    /// Set or group; children in document order.
    Container(Vec<Value>),
    /// Concrete instruction.
    Instruction(Map<String, Value>),
    /// Alias of another instruction.
    Alias(Map<String, Value>),
    /// Any other node type; ignored.
    Ignored,
    /// Not a JSON object.
    Malformed,
}

impl From<Value> for ArmNode {
    fn from(value: Value) -> Self {
        let Value::Object(mut obj) = value else {
            return Self::Malformed;
        };
        let kind = obj.get("_type").and_then(Value::as_str).map(str::to_owned);
        match kind.as_deref().unwrap_or_default() {
            "Instruction.InstructionSet" | "Instruction.InstructionGroup" => {
                match obj.remove("children") {
                    Some(Value::Array(children)) => Self::Container(children),
                    _ => Self::Container(Vec::new()),
                }
            }
            "Instruction.Instruction" => Self::Instruction(obj),
            "Instruction.InstructionAlias" => Self::Alias(obj),
            _ => Self::Ignored,
        }
    }
}

/// A node the walker could not convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNode {
    /// Node name, or `UNKNOWN`.
    pub name: String,
    /// Why it was skipped.
    pub reason: &'static str,
}

/// Depth-first, pre-order walk over an ARM instruction tree.
///
/// Yields `Ok` for each converted instruction or alias and `Err` for each skipped node.
#[derive(Debug)]
pub struct ArmWalker {
    stack: Vec<std::vec::IntoIter<Value>>,
}

impl ArmWalker {
    /// Walks the given top-level nodes in order.
    pub fn new(roots: Vec<Value>) -> Self {
        Self {
            stack: vec![roots.into_iter()],
        }
    }

    /// Walks the `instructions` array of a full document; anything else walks nothing.
    pub fn from_document(mut document: Value) -> Self {
        match document.get_mut("instructions").map(Value::take) {
            Some(Value::Array(roots)) => Self::new(roots),
            _ => Self::new(Vec::new()),
        }
    }

    /// Drops skip reports and yields only converted instructions.
    pub fn instructions(self) -> impl Iterator<Item = Instruction> {
        self.filter_map(Result::ok)
    }
}

impl Iterator for ArmWalker {
    type Item = Result<Instruction, SkippedNode>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let Some(node) = top.next() else {
                let _ = self.stack.pop();
                continue;
            };
            match ArmNode::from(node) {
                ArmNode::Container(children) => self.stack.push(children.into_iter()),
                ArmNode::Instruction(obj) => return Some(convert_instruction(&obj)),
                ArmNode::Alias(obj) => return Some(convert_alias(&obj)),
                ArmNode::Ignored => {}
                ArmNode::Malformed => {
                    return Some(Err(SkippedNode {
                        name: "UNKNOWN".to_owned(),
                        reason: "node is not an object",
                    }));
                }
            }
        }
    }
}

/// The node's `name`; absent or blank names read as `UNKNOWN` so no leaf lands on the empty
/// variant key.
fn node_name(obj: &Map<String, Value>) -> &str {
    obj.get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("UNKNOWN")
}

/// Mnemonic from the first assembly literal, else derived from the node name.
///
/// Only the literal's first token is kept, since literals such as `"ldr.w x0"` carry operand
/// text after the mnemonic. A blank literal counts as absent and the name is used instead.
pub fn extract_mnemonic(name: &str, obj: &Map<String, Value>) -> Option<String> {
    let literal = obj
        .get("assembly")
        .filter(|a| a.get("_type").and_then(Value::as_str) == Some("Instruction.Assembly"))
        .and_then(|a| a.get("symbols"))
        .and_then(Value::as_array)
        .and_then(|symbols| symbols.first())
        .filter(|s| s.get("_type").and_then(Value::as_str) == Some("Instruction.Symbols.Literal"))
        .and_then(|s| s.get("value"))
        .and_then(Value::as_str)
        .and_then(|v| v.split_whitespace().next())
        .map(str::to_uppercase);
    if literal.is_some() {
        return literal;
    }
    mnemonic_from_name(name)
}

/// Strips a trailing `_<alnum>` suffix and all non-alphanumerics, then upper-cases.
pub fn mnemonic_from_name(name: &str) -> Option<String> {
    let stem = PATTERNS.name_suffix.replace(name, "");
    let cleaned = PATTERNS.non_alnum.replace_all(&stem, "");
    (!cleaned.is_empty()).then(|| cleaned.to_uppercase())
}

/// Title, then description `after`/`before` text, then [`FALLBACK_DESCRIPTION`].
pub fn extract_description(obj: &Map<String, Value>) -> String {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    non_empty(obj.get("title"))
        .or_else(|| {
            let description = obj.get("description")?;
            non_empty(description.get("after")).or_else(|| non_empty(description.get("before")))
        })
        .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_owned())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(_)) => true,
    }
}

fn extract_encoding(name: &str, obj: &Map<String, Value>) -> Option<Encoding> {
    let encoding = obj.get("encoding");
    if !is_truthy(encoding) {
        return None;
    }
    let pattern = match encoding.and_then(|e| e.get("pattern")) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(v) if is_truthy(Some(v)) => v.to_string(),
        _ if name != "UNKNOWN" => name.to_owned(),
        _ => "UNKNOWN".to_owned(),
    };
    Some(Encoding::from_pattern(pattern))
}

fn collect_features(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for m in PATTERNS.feature.find_iter(s) {
                let id = m.as_str();
                let feature = FEATURES
                    .iter()
                    .find(|(known, _)| *known == id)
                    .map_or_else(|| id.trim_start_matches("FEAT_"), |&(_, name)| name);
                if !feature.is_empty() && !out.iter().any(|f| f == feature) {
                    out.push(feature.to_owned());
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_features(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_features(v, out)),
        _ => {}
    }
}

/// Catalog features named in a node's `condition` subtree; `[BASE]` when none are named.
///
/// Unlisted `FEAT_X` identifiers map to `X`.
pub fn extract_features(obj: &Map<String, Value>) -> Vec<String> {
    let mut features = Vec::new();
    if let Some(condition) = obj.get("condition") {
        collect_features(condition, &mut features);
    }
    if features.is_empty() {
        features.push(BASE_FEATURE.to_owned());
    }
    features
}

fn convert_instruction(obj: &Map<String, Value>) -> Result<Instruction, SkippedNode> {
    let name = node_name(obj);
    let mnemonic = extract_mnemonic(name, obj).ok_or_else(|| SkippedNode {
        name: name.to_owned(),
        reason: "no usable mnemonic",
    })?;
    let features = extract_features(obj);

    Ok(Instruction {
        variant: Some(name.to_owned()),
        category: (if is_truthy(obj.get("operation")) { "GENERAL" } else { "UNKNOWN" }).to_owned(),
        extension: features[0].clone(),
        isa_set: ISA_SET_A64.to_owned(),
        description: extract_description(obj),
        syntax: mnemonic.clone(),
        encoding: extract_encoding(name, obj),
        cpuid_features: features,
        cpl: Some(0),
        ..Instruction::new(ISA_AARCH64, mnemonic)
    })
}

fn convert_alias(obj: &Map<String, Value>) -> Result<Instruction, SkippedNode> {
    let name = node_name(obj);
    let mnemonic = extract_mnemonic(name, obj).ok_or_else(|| SkippedNode {
        name: name.to_owned(),
        reason: "alias has no usable mnemonic",
    })?;

    Ok(Instruction {
        variant: Some(name.to_owned()),
        category: "ALIAS".to_owned(),
        extension: BASE_FEATURE.to_owned(),
        isa_set: ISA_SET_A64.to_owned(),
        description: extract_description(obj),
        syntax: mnemonic.clone(),
        cpuid_features: vec![BASE_FEATURE.to_owned()],
        cpl: Some(0),
        attributes: vec!["ALIAS".to_owned()],
        ..Instruction::new(ISA_AARCH64, mnemonic)
    })
}

/// Source version from `_meta.version` as `<architecture>-<ref>-<build>`.
///
/// Absent when the document has no version block or its architecture is empty.
pub fn source_version(document: &Value) -> Option<String> {
    let version = document.get("_meta")?.get("version")?;
    let field = |key: &str| match version.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let architecture = field("architecture");
    if architecture.is_empty() {
        return None;
    }
    Some(format!("{architecture}-{}-{}", field("ref"), field("build")))
}
