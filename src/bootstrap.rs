//! Operator bootstrap of the inventory pointer
//!
//! Sources are tried in order: signature resolution, the first line of the
//! pointer file, then an interactive prompt. Input is hexadecimal with an
//! optional `0x` prefix; an `id:` prefix marks the address of the identifier
//! field rather than the base.

use crate::context::Session;
use crate::core::types::{Address, BridgeError, BridgeResult};
use crate::inventory::{InventoryPointer, SignatureSearch};
use crate::memory::AttachedProcess;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// A pointer as typed by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInput {
    /// Inventory base address
    Base(Address),
    /// Address of the identifier field
    IdField(Address),
}

impl FromStr for PointerInput {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let field = text
            .get(..3)
            .filter(|prefix| prefix.eq_ignore_ascii_case("id:"))
            .map(|_| &text[3..]);

        match field {
            Some(rest) => Ok(PointerInput::IdField(Address::from_hex(rest)?)),
            None => Ok(PointerInput::Base(Address::from_hex(text)?)),
        }
    }
}

/// First line of the pointer file, if the file exists and the line is not blank
pub fn read_pointer_file(path: &Path) -> BridgeResult<Option<PointerInput>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match contents.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => line.parse().map(Some),
        _ => Ok(None),
    }
}

/// Ask the operator for a pointer
pub fn prompt_pointer<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> BridgeResult<PointerInput> {
    writeln!(
        output,
        "Enter the inventory base pointer (e.g. 0x7FF6ABCDEF00),"
    )?;
    write!(
        output,
        "or the identifier field address as id:0x7FF6ABCDEF08: "
    )?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(BridgeError::InvalidAddress(
            "No pointer entered".to_string(),
        ));
    }
    line.parse()
}

/// Validate and commit an operator-supplied pointer
pub fn apply_pointer<P: AttachedProcess>(
    session: &Session<P>,
    input: PointerInput,
) -> BridgeResult<InventoryPointer> {
    match input {
        PointerInput::Base(address) => session.set_pointer(address),
        PointerInput::IdField(address) => session.set_pointer_from_field(address),
    }
}

/// Establish the inventory pointer for a fresh session
///
/// Signature resolution is attempted first but cannot currently produce a
/// pointer. A bad pointer from the file or the prompt is an error; there is
/// no fallback after a source has produced input.
pub fn bootstrap_pointer<P: AttachedProcess, R: BufRead, W: Write>(
    session: &Session<P>,
    search: Option<&SignatureSearch>,
    pointer_file: &Path,
    input: &mut R,
    output: &mut W,
) -> BridgeResult<InventoryPointer> {
    match session.resolve_by_signature(search) {
        Ok(pointer) => return Ok(pointer),
        Err(e) => info!("Automatic resolution unavailable: {}", e),
    }

    let pointer_input = match read_pointer_file(pointer_file)? {
        Some(input) => {
            info!("Using pointer from {}", pointer_file.display());
            input
        }
        None => {
            warn!(
                "No pointer in {}, asking the operator",
                pointer_file.display()
            );
            prompt_pointer(input, output)?
        }
    };

    apply_pointer(session, pointer_input)
}
