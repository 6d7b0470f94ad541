use core::fmt;

use crate::op::Op;

/// A decoded instruction with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    PushLiteral {
        idx: u32,
    },
    PushInstanceVariable {
        idx: u32,
    },
    PushTemporaryVariable {
        idx: u32,
    },
    PushSelf,
    StoreInstanceVariable {
        idx: u32,
    },
    StoreTemporaryVariable {
        idx: u32,
    },
    SendMessage {
        selector_idx: u32,
        argc: u32,
    },
    ReturnStackTop,
    Jump {
        offset: i32,
    },
    JumpIfTrue {
        offset: i32,
    },
    JumpIfFalse {
        offset: i32,
    },
    Pop,
    Duplicate,
    /// The nested bytecode (`size` bytes) directly follows the head.
    CreateBlock {
        size: u32,
        literal_count: u32,
        temp_count: u32,
    },
    ExecuteBlock {
        argc: u32,
    },
}

impl Instruction {
    pub const fn op(&self) -> Op {
        match self {
            Self::PushLiteral { .. } => Op::PushLiteral,
            Self::PushInstanceVariable { .. } => Op::PushInstanceVariable,
            Self::PushTemporaryVariable { .. } => Op::PushTemporaryVariable,
            Self::PushSelf => Op::PushSelf,
            Self::StoreInstanceVariable { .. } => Op::StoreInstanceVariable,
            Self::StoreTemporaryVariable { .. } => Op::StoreTemporaryVariable,
            Self::SendMessage { .. } => Op::SendMessage,
            Self::ReturnStackTop => Op::ReturnStackTop,
            Self::Jump { .. } => Op::Jump,
            Self::JumpIfTrue { .. } => Op::JumpIfTrue,
            Self::JumpIfFalse { .. } => Op::JumpIfFalse,
            Self::Pop => Op::Pop,
            Self::Duplicate => Op::Duplicate,
            Self::CreateBlock { .. } => Op::CreateBlock,
            Self::ExecuteBlock { .. } => Op::ExecuteBlock,
        }
    }

    /// Encoded length in bytes, including inlined block bytecode.
    pub const fn len(&self) -> usize {
        match self {
            Self::CreateBlock { size, .. } => {
                Op::CreateBlock.size() + *size as usize
            }
            other => other.op().size(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op().name();
        match self {
            Self::PushLiteral { idx }
            | Self::PushInstanceVariable { idx }
            | Self::PushTemporaryVariable { idx }
            | Self::StoreInstanceVariable { idx }
            | Self::StoreTemporaryVariable { idx } => {
                write!(f, "{name} {idx}")
            }
            Self::SendMessage { selector_idx, argc } => {
                write!(f, "{name} #{selector_idx} argc={argc}")
            }
            Self::Jump { offset }
            | Self::JumpIfTrue { offset }
            | Self::JumpIfFalse { offset } => write!(f, "{name} {offset:+}"),
            Self::CreateBlock {
                size,
                literal_count,
                temp_count,
            } => write!(
                f,
                "{name} size={size} literals={literal_count} temps={temp_count}"
            ),
            Self::ExecuteBlock { argc } => write!(f, "{name} argc={argc}"),
            Self::PushSelf
            | Self::ReturnStackTop
            | Self::Pop
            | Self::Duplicate => f.write_str(name),
        }
    }
}
