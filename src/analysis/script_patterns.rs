//! Recognition of the raw script shapes that matter for input sizing
//!
//! Outputs that do not fit one of the six compressed templates are stored as
//! raw scripts. Among those, bare multisig and native segwit programs have a
//! predictable spending cost, everything else is treated as non-standard.

use crate::chainstate::OutputType;
use bitcoin::opcodes::{self, Class, ClassifyContext};
use bitcoin::script::Instruction;
use bitcoin::Script;
use serde::{Deserialize, Serialize};
use std::fmt;

const OP_1: u8 = 0x51;
const OP_3: u8 = 0x53;
const OP_CHECKMULTISIG: u8 = 0xae;
const PUSH_COMPRESSED_KEY: u8 = 0x21;
const PUSH_UNCOMPRESSED_KEY: u8 = 0x41;

/// Threshold and key count of a bare multisig script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigInfo {
    pub required_sigs: u8,
    pub total_pubkeys: u8,
}

/// Shape check for a standard bare multisig: `OP_m <key> ... OP_CHECKMULTISIG`
///
/// Relay policy only accepts bare multisig up to 3-of-3, so `m` is limited
/// to 1..=3. The first push must be a 33 or 65 byte key.
pub fn is_standard_multisig(script: &[u8]) -> bool {
    script.len() >= 3
        && (OP_1..=OP_3).contains(&script[0])
        && (script[1] == PUSH_COMPRESSED_KEY || script[1] == PUSH_UNCOMPRESSED_KEY)
        && script[script.len() - 1] == OP_CHECKMULTISIG
}

/// Signatures needed to spend a standard bare multisig
pub fn required_sigs(script: &[u8]) -> Option<u8> {
    if is_standard_multisig(script) {
        Some(script[0] - 0x50)
    } else {
        None
    }
}

/// Parse `OP_m <pubkey>* OP_n OP_CHECKMULTISIG` and return `(m, n)`
///
/// Every push must be a minimally encoded 33 or 65 byte key and `n` must
/// match the number of keys found.
pub fn parse_multisig(script: &[u8]) -> Option<MultisigInfo> {
    let instructions: Vec<Instruction<'_>> = Script::from_bytes(script)
        .instructions_minimal()
        .collect::<Result<_, _>>()
        .ok()?;

    let (op_m, rest) = instructions.split_first()?;
    let (checkmultisig, rest) = rest.split_last()?;
    let (op_n, keys) = rest.split_last()?;
    if checkmultisig.opcode()? != opcodes::all::OP_CHECKMULTISIG {
        return None;
    }

    let all_keys = keys.iter().all(|instruction| {
        matches!(instruction, Instruction::PushBytes(key) if matches!(key.len(), 33 | 65))
    });
    let total_pubkeys = small_int(op_n)?;
    if !all_keys || usize::from(total_pubkeys) != keys.len() {
        return None;
    }

    Some(MultisigInfo {
        required_sigs: small_int(op_m)?,
        total_pubkeys,
    })
}

/// Value of an `OP_1`..`OP_16` instruction
fn small_int(instruction: &Instruction<'_>) -> Option<u8> {
    match instruction.opcode()?.classify(ClassifyContext::Legacy) {
        Class::PushNum(n @ 1..=16) => u8::try_from(n).ok(),
        _ => None,
    }
}

/// Output selected by the non-standard-only filter: neither a compressed
/// template nor a standard bare multisig
pub fn is_non_standard_output(out_type: OutputType, payload: &[u8]) -> bool {
    !out_type.is_standard() && !is_standard_multisig(payload)
}

/// Version 0 witness program kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegwitProgram {
    P2wpkh,
    P2wsh,
}

pub fn native_segwit(script: &[u8]) -> Option<SegwitProgram> {
    let script = Script::from_bytes(script);
    if script.is_p2wpkh() {
        Some(SegwitProgram::P2wpkh)
    } else if script.is_p2wsh() {
        Some(SegwitProgram::P2wsh)
    } else {
        None
    }
}

/// Script family label attached to dumped outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    /// One of the six compressed templates
    Standard,
    Multisig(MultisigInfo),
    P2wpkh,
    P2wsh,
    NonStandard,
}

impl ScriptClass {
    pub fn classify(out_type: OutputType, payload: &[u8]) -> Self {
        if out_type.is_standard() {
            return ScriptClass::Standard;
        }
        if let Some(info) = parse_multisig(payload) {
            return ScriptClass::Multisig(info);
        }
        match native_segwit(payload) {
            Some(SegwitProgram::P2wpkh) => ScriptClass::P2wpkh,
            Some(SegwitProgram::P2wsh) => ScriptClass::P2wsh,
            None => ScriptClass::NonStandard,
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self, ScriptClass::Standard)
    }
}

impl fmt::Display for ScriptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptClass::Standard => write!(f, "std"),
            ScriptClass::Multisig(info) => {
                write!(f, "multisig-{}-{}", info.required_sigs, info.total_pubkeys)
            }
            ScriptClass::P2wpkh => write!(f, "P2WPKH"),
            ScriptClass::P2wsh => write!(f, "P2WSH"),
            ScriptClass::NonStandard => write!(f, "nonstd"),
        }
    }
}
