//! Module loader: the external collaborator that parses a compiled
//! module file — magic, timestamp, marshalled code object — into a
//! populated [`CodeObject`]. `spec.md` treats the marshal format as
//! out of scope beyond "magic + timestamp + code object"; the concrete
//! binary layout below (length-prefixed strings, little-endian
//! integers, a tagged constant pool) is this crate's own, grounded in
//! the teacher's `bytecode.rs` reader-helper style
//! (`read_u32`/`read_i64`/`read_string`).

use std::rc::Rc;

use crate::codeobject::{CodeObject, Constant, LineTable, Version};
use crate::error::{DecompileError, Result};

const MAGIC_V2_0: [u8; 4] = [0x87, 0xC6, 0x0D, 0x0A];
const MAGIC_V1_5_2: [u8; 4] = [0x99, 0x4E, 0x0D, 0x0A];

pub fn version_for_magic(magic: [u8; 4]) -> Option<Version> {
    match magic {
        MAGIC_V2_0 => Some(Version::V2_0),
        MAGIC_V1_5_2 => Some(Version::V1_5_2),
        _ => None,
    }
}

/// Parses `data` as a module file, returning its declared version and
/// top-level code object.
pub fn load_module(data: &[u8]) -> Result<(Version, CodeObject)> {
    let mut r = Reader::new(data);
    let magic = r.read_magic()?;
    let version = version_for_magic(magic).ok_or(DecompileError::UnsupportedVersion { magic })?;
    let _timestamp = r.read_u32()?;
    let code = parse_code_object(&mut r)?;
    Ok((version, code))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.pos + n > self.data.len() {
            return Err(DecompileError::malformed(self.pos, "unexpected end of module data"));
        }
        Ok(())
    }

    fn read_magic(&mut self) -> Result<[u8; 4]> {
        self.need(4)?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(magic)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        let b = &self.data[self.pos..self.pos + 4];
        let value = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        self.pos += 4;
        Ok(value)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.need(8)?;
        let b = &self.data[self.pos..self.pos + 8];
        let value = i64::from_le_bytes(b.try_into().unwrap());
        self.pos += 8;
        Ok(value)
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        let b = &self.data[self.pos..self.pos + 8];
        let value = f64::from_le_bytes(b.try_into().unwrap());
        self.pos += 8;
        Ok(value)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DecompileError::malformed(self.pos, "string is not valid UTF-8"))
    }
}

fn parse_constant(r: &mut Reader) -> Result<Constant> {
    match r.read_u8()? {
        0 => Ok(Constant::Int(r.read_i64()?)),
        1 => Ok(Constant::Float(r.read_f64()?)),
        2 => Ok(Constant::Str(r.read_string()?)),
        3 => Ok(Constant::None),
        4 => Ok(Constant::Ellipsis),
        5 => Ok(Constant::Code(Rc::new(parse_code_object(r)?))),
        6 => {
            let count = r.read_u32()?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(parse_constant(r)?);
            }
            Ok(Constant::Tuple(items))
        }
        tag => Err(DecompileError::malformed(r.pos, format!("unknown constant tag {}", tag))),
    }
}

fn parse_code_object(r: &mut Reader) -> Result<CodeObject> {
    let argcount = r.read_u32()?;
    let flags = r.read_u32()?;
    let first_line = r.read_u32()?;
    let name = r.read_string()?;

    let local_count = r.read_u32()?;
    let mut locals = Vec::with_capacity(local_count as usize);
    for _ in 0..local_count {
        locals.push(r.read_string()?);
    }

    let name_count = r.read_u32()?;
    let mut names = Vec::with_capacity(name_count as usize);
    for _ in 0..name_count {
        names.push(r.read_string()?);
    }

    let line_pair_count = r.read_u32()?;
    let mut line_table = Vec::with_capacity(line_pair_count as usize);
    for _ in 0..line_pair_count {
        let byte_delta = r.read_u8()?;
        let line_delta = r.read_u8()?;
        line_table.push((byte_delta, line_delta));
    }

    let const_count = r.read_u32()?;
    let mut constants = Vec::with_capacity(const_count as usize);
    for _ in 0..const_count {
        constants.push(parse_constant(r)?);
    }

    let instr_len = r.read_u32()? as usize;
    let instructions = r.read_bytes(instr_len)?.to_vec();

    Ok(CodeObject {
        instructions,
        constants,
        locals,
        names,
        argcount,
        flags,
        name,
        first_line,
        line_table: LineTable(line_table),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_string(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    fn minimal_code_object_bytes(instructions: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_le_bytes()); // argcount
        buf.extend_from_slice(&0u32.to_le_bytes()); // flags
        buf.extend_from_slice(&1u32.to_le_bytes()); // first_line
        push_string(&mut buf, "<module>");
        buf.extend_from_slice(&0u32.to_le_bytes()); // locals
        buf.extend_from_slice(&0u32.to_le_bytes()); // names
        buf.extend_from_slice(&0u32.to_le_bytes()); // line table pairs
        buf.extend_from_slice(&0u32.to_le_bytes()); // constants
        buf.extend_from_slice(&(instructions.len() as u32).to_le_bytes());
        buf.extend_from_slice(instructions);
        buf
    }

    #[test]
    fn rejects_unknown_magic() {
        let data = [0, 0, 0, 0];
        let err = load_module(&data).unwrap_err();
        assert!(matches!(err, DecompileError::UnsupportedVersion { .. }));
    }

    #[test]
    fn parses_known_magic_and_empty_code_object() {
        let mut data = MAGIC_V2_0.to_vec();
        data.extend_from_slice(&0u32.to_le_bytes()); // timestamp
        data.extend_from_slice(&minimal_code_object_bytes(&[]));
        let (version, code) = load_module(&data).unwrap();
        assert_eq!(version, Version::V2_0);
        assert_eq!(code.name, "<module>");
        assert!(code.instructions.is_empty());
    }

    #[test]
    fn truncated_data_is_input_malformed() {
        let data = MAGIC_V2_0.to_vec();
        let err = load_module(&data).unwrap_err();
        assert!(matches!(err, DecompileError::InputMalformed { .. }));
    }
}
