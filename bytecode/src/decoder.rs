use thiserror::Error;

use crate::instruction::Instruction;
use crate::op::Op;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("truncated {op:?} at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        op: Op,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Decode the instruction starting at `pc`.
///
/// Fails when the opcode is unknown or the operands (including inlined
/// block bytecode) run past the end of `bytes`.
pub fn decode_at(bytes: &[u8], pc: usize) -> Result<Instruction, DecodeError> {
    let byte = bytes[pc];
    let op = Op::try_from(byte)
        .map_err(|byte| DecodeError::UnknownOpcode { byte, offset: pc })?;

    let available = bytes.len() - pc;
    let check = |needed: usize| {
        if needed > available {
            Err(DecodeError::Truncated {
                op,
                offset: pc,
                needed,
                available,
            })
        } else {
            Ok(())
        }
    };
    check(op.size())?;

    let operand = |n: usize| read_u32(bytes, pc + 1 + n * 4);

    let instr = match op {
        Op::PushLiteral => Instruction::PushLiteral { idx: operand(0) },
        Op::PushInstanceVariable => {
            Instruction::PushInstanceVariable { idx: operand(0) }
        }
        Op::PushTemporaryVariable => {
            Instruction::PushTemporaryVariable { idx: operand(0) }
        }
        Op::PushSelf => Instruction::PushSelf,
        Op::StoreInstanceVariable => {
            Instruction::StoreInstanceVariable { idx: operand(0) }
        }
        Op::StoreTemporaryVariable => {
            Instruction::StoreTemporaryVariable { idx: operand(0) }
        }
        Op::SendMessage => Instruction::SendMessage {
            selector_idx: operand(0),
            argc: operand(1),
        },
        Op::ReturnStackTop => Instruction::ReturnStackTop,
        Op::Jump => Instruction::Jump {
            offset: operand(0) as i32,
        },
        Op::JumpIfTrue => Instruction::JumpIfTrue {
            offset: operand(0) as i32,
        },
        Op::JumpIfFalse => Instruction::JumpIfFalse {
            offset: operand(0) as i32,
        },
        Op::Pop => Instruction::Pop,
        Op::Duplicate => Instruction::Duplicate,
        Op::CreateBlock => {
            let size = operand(0);
            check(op.size() + size as usize)?;
            Instruction::CreateBlock {
                size,
                literal_count: operand(1),
                temp_count: operand(2),
            }
        }
        Op::ExecuteBlock => Instruction::ExecuteBlock { argc: operand(0) },
    };
    Ok(instr)
}

#[inline(always)]
fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

/// Decodes a bytecode byte slice into [`Instruction`]s, front to back.
///
/// Nested block bytecode is skipped over, not descended into. Iteration
/// stops at the first malformed instruction; [`error`](Self::error)
/// reports it.
pub struct BytecodeDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    error: Option<DecodeError>,
}

impl<'a> BytecodeDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            error: None,
        }
    }

    /// Current byte offset in the stream.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Whether the decoder has reached the end of the bytecode.
    #[inline(always)]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// Decode the next instruction together with its offset.
    pub fn decode_next(&mut self) -> Option<(usize, Instruction)> {
        if self.is_at_end() || self.error.is_some() {
            return None;
        }
        match decode_at(self.bytes, self.pos) {
            Ok(instr) => {
                let at = self.pos;
                self.pos += instr.len();
                Some((at, instr))
            }
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }
}

impl Iterator for BytecodeDecoder<'_> {
    type Item = Instruction;

    #[inline(always)]
    fn next(&mut self) -> Option<Instruction> {
        self.decode_next().map(|(_, instr)| instr)
    }
}
