//! Compact type descriptors for trampolines.
//!
//! The first letter is the result kind, the rest are parameters:
//!
//! | letter | kind |
//! |--------|------|
//! | `v`    | no result (result position only) |
//! | `i`    | i32 |
//! | `p`    | pointer, encoded as i32 |
//! | `j`    | i64 |
//! | `f`    | f32 |
//! | `d`    | f64 |
//!
//! So `"iii"` returns an i32 and takes two i32s, and `"vp"` takes a pointer and returns nothing.

use crate::messages::interop_errors::InteropError;
use crate::return_interop_error;
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    I32,
    I64,
    F32,
    F64,
}

impl ValueKind {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'i' | 'p' => Some(ValueKind::I32),
            'j' => Some(ValueKind::I64),
            'f' => Some(ValueKind::F32),
            'd' => Some(ValueKind::F64),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            ValueKind::I32 => 'i',
            ValueKind::I64 => 'j',
            ValueKind::F32 => 'f',
            ValueKind::F64 => 'd',
        }
    }

    pub fn encoder_type(self) -> wasm_encoder::ValType {
        match self {
            ValueKind::I32 => wasm_encoder::ValType::I32,
            ValueKind::I64 => wasm_encoder::ValType::I64,
            ValueKind::F32 => wasm_encoder::ValType::F32,
            ValueKind::F64 => wasm_encoder::ValType::F64,
        }
    }

    pub fn runtime_type(self) -> wasmtime::ValType {
        match self {
            ValueKind::I32 => wasmtime::ValType::I32,
            ValueKind::I64 => wasmtime::ValType::I64,
            ValueKind::F32 => wasmtime::ValType::F32,
            ValueKind::F64 => wasmtime::ValType::F64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub result: Option<ValueKind>,
    pub params: Vec<ValueKind>,
}

impl Signature {
    pub fn new(result: Option<ValueKind>, params: Vec<ValueKind>) -> Self {
        Signature { result, params }
    }

    pub fn parse(descriptor: &str) -> Result<Self, InteropError> {
        let mut letters = descriptor.chars();

        let result = match letters.next() {
            None => return_interop_error!(Signature, descriptor, "descriptor is empty"),
            Some('v') => None,
            Some(letter) => match ValueKind::from_letter(letter) {
                Some(kind) => Some(kind),
                None => return_interop_error!(
                    Signature,
                    descriptor,
                    "unsupported result type '{}'",
                    letter
                ),
            },
        };

        let mut params = Vec::with_capacity(descriptor.len().saturating_sub(1));
        for (position, letter) in letters.enumerate() {
            match ValueKind::from_letter(letter) {
                Some(kind) => params.push(kind),
                None if letter == 'v' => return_interop_error!(
                    Signature,
                    descriptor,
                    "'v' can only be used as the result, found it at parameter {}",
                    position
                ),
                None => return_interop_error!(
                    Signature,
                    descriptor,
                    "unsupported parameter type '{}' at parameter {}",
                    letter,
                    position
                ),
            }
        }

        Ok(Signature { result, params })
    }

    pub fn results(&self) -> &[ValueKind] {
        self.result.as_slice()
    }

    pub fn func_type(&self, engine: &wasmtime::Engine) -> wasmtime::FuncType {
        wasmtime::FuncType::new(
            engine,
            self.params.iter().map(|kind| kind.runtime_type()),
            self.results().iter().map(|kind| kind.runtime_type()),
        )
    }
}

impl FromStr for Signature {
    type Err = InteropError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        Signature::parse(descriptor)
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self.result {
            Some(kind) => kind.letter(),
            None => 'v',
        };

        write!(f, "{}", result)?;
        for param in &self.params {
            write!(f, "{}", param.letter())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/signature_tests.rs"]
mod tests;
