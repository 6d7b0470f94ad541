/// Bytecode opcodes.
///
/// Every operand is a big-endian `u32`. Instructions are 1 byte when they
/// take no operands, 5 bytes with one operand and 9 bytes with two.
/// [`CreateBlock`](Op::CreateBlock) is variable length: its 13-byte head is
/// followed by the nested block bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    /// Push a literal from the literal table.
    /// Operands: `idx:u32`
    PushLiteral = 0,

    /// Push an instance variable of the receiver.
    /// Operands: `idx:u32`
    PushInstanceVariable,

    /// Push a temporary variable. Indices past the end of the current
    /// temp array resolve through the lexical outer context.
    /// Operands: `idx:u32`
    PushTemporaryVariable,

    /// Push the receiver.
    PushSelf,

    /// Store the stack top into an instance variable. The value stays on
    /// the stack.
    /// Operands: `idx:u32`
    StoreInstanceVariable,

    /// Store the stack top into a temporary variable. The value stays on
    /// the stack.
    /// Operands: `idx:u32`
    StoreTemporaryVariable,

    /// Send a message. Arguments are on top of the receiver.
    /// Operands: `selector_idx:u32`, `argc:u32`
    SendMessage,

    /// Return the stack top (or nil) from the current context.
    ReturnStackTop,

    /// Unconditional relative jump.
    /// Operands: `offset:i32` (relative to end of instruction)
    Jump,

    /// Pop the stack top and jump if it is `true`.
    /// Operands: `offset:i32`
    ///
    /// Only the `true` object is truthy. Numbers, nil and every other
    /// object count as false.
    JumpIfTrue,

    /// Pop the stack top and jump if it is not `true`.
    /// Operands: `offset:i32`
    JumpIfFalse,

    /// Discard the stack top.
    Pop,

    /// Push a copy of the stack top.
    Duplicate,

    /// Create a block closing over the current context.
    /// Operands: `size:u32`, `literal_count:u32`, `temp_count:u32`,
    /// followed by `size` bytes of block bytecode.
    CreateBlock,

    /// Pop `argc` arguments and a block, then run the block.
    /// Operands: `argc:u32`
    ExecuteBlock,
}

impl Op {
    pub const COUNT: usize = Op::ExecuteBlock as usize + 1;

    /// Bytes taken by the opcode and its fixed operands.
    ///
    /// For [`CreateBlock`](Op::CreateBlock) this excludes the nested
    /// bytecode that follows the head.
    pub const fn size(self) -> usize {
        match self {
            Op::PushSelf
            | Op::ReturnStackTop
            | Op::Pop
            | Op::Duplicate => 1,
            Op::PushLiteral
            | Op::PushInstanceVariable
            | Op::PushTemporaryVariable
            | Op::StoreInstanceVariable
            | Op::StoreTemporaryVariable
            | Op::Jump
            | Op::JumpIfTrue
            | Op::JumpIfFalse
            | Op::ExecuteBlock => 5,
            Op::SendMessage => 9,
            Op::CreateBlock => 13,
        }
    }

    pub const fn is_jump(self) -> bool {
        matches!(self, Op::Jump | Op::JumpIfTrue | Op::JumpIfFalse)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Op::PushLiteral => "PUSH_LITERAL",
            Op::PushInstanceVariable => "PUSH_INSTANCE_VARIABLE",
            Op::PushTemporaryVariable => "PUSH_TEMPORARY_VARIABLE",
            Op::PushSelf => "PUSH_SELF",
            Op::StoreInstanceVariable => "STORE_INSTANCE_VARIABLE",
            Op::StoreTemporaryVariable => "STORE_TEMPORARY_VARIABLE",
            Op::SendMessage => "SEND_MESSAGE",
            Op::ReturnStackTop => "RETURN_STACK_TOP",
            Op::Jump => "JUMP",
            Op::JumpIfTrue => "JUMP_IF_TRUE",
            Op::JumpIfFalse => "JUMP_IF_FALSE",
            Op::Pop => "POP",
            Op::Duplicate => "DUPLICATE",
            Op::CreateBlock => "CREATE_BLOCK",
            Op::ExecuteBlock => "EXECUTE_BLOCK",
        }
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        let op = match byte {
            0 => Op::PushLiteral,
            1 => Op::PushInstanceVariable,
            2 => Op::PushTemporaryVariable,
            3 => Op::PushSelf,
            4 => Op::StoreInstanceVariable,
            5 => Op::StoreTemporaryVariable,
            6 => Op::SendMessage,
            7 => Op::ReturnStackTop,
            8 => Op::Jump,
            9 => Op::JumpIfTrue,
            10 => Op::JumpIfFalse,
            11 => Op::Pop,
            12 => Op::Duplicate,
            13 => Op::CreateBlock,
            14 => Op::ExecuteBlock,
            _ => return Err(byte),
        };
        Ok(op)
    }
}
