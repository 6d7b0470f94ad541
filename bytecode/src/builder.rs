use crate::op::Op;

/// A forward jump whose offset has not yet been resolved.
///
/// Created by [`BytecodeBuilder::jump`], [`BytecodeBuilder::jump_if_true`],
/// and [`BytecodeBuilder::jump_if_false`]. Resolve it with
/// [`BytecodeBuilder::bind`].
#[derive(Debug)]
pub struct Label {
    /// Position of the i32 offset bytes in the buffer.
    offset_pos: usize,
    /// Position right after the jump instruction (base for relative offset).
    base: usize,
}

/// Builds a bytecode byte sequence. All operands are written big-endian.
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    buf: Vec<u8>,
}

impl BytecodeBuilder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current byte offset in the bytecode stream.
    pub fn current_offset(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    // ── emit helpers ───────────────────────────────────────────────

    fn emit_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn emit_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn emit_op(&mut self, op: Op) {
        self.buf.push(op as u8);
    }

    // ── stack ──────────────────────────────────────────────────────

    pub fn push_literal(&mut self, idx: u32) {
        self.emit_op(Op::PushLiteral);
        self.emit_u32(idx);
    }

    pub fn push_instance_variable(&mut self, idx: u32) {
        self.emit_op(Op::PushInstanceVariable);
        self.emit_u32(idx);
    }

    pub fn push_temporary_variable(&mut self, idx: u32) {
        self.emit_op(Op::PushTemporaryVariable);
        self.emit_u32(idx);
    }

    pub fn push_self(&mut self) {
        self.emit_op(Op::PushSelf);
    }

    pub fn store_instance_variable(&mut self, idx: u32) {
        self.emit_op(Op::StoreInstanceVariable);
        self.emit_u32(idx);
    }

    pub fn store_temporary_variable(&mut self, idx: u32) {
        self.emit_op(Op::StoreTemporaryVariable);
        self.emit_u32(idx);
    }

    pub fn pop(&mut self) {
        self.emit_op(Op::Pop);
    }

    pub fn duplicate(&mut self) {
        self.emit_op(Op::Duplicate);
    }

    // ── sends / returns ────────────────────────────────────────────

    /// `SEND_MESSAGE <selector_idx> <argc>`. The selector index refers to
    /// a Symbol in the literal table.
    pub fn send_message(&mut self, selector_idx: u32, argc: u32) {
        self.emit_op(Op::SendMessage);
        self.emit_u32(selector_idx);
        self.emit_u32(argc);
    }

    pub fn return_stack_top(&mut self) {
        self.emit_op(Op::ReturnStackTop);
    }

    // ── blocks ─────────────────────────────────────────────────────

    /// `CREATE_BLOCK` with the block bytecode inlined after the head.
    pub fn create_block(
        &mut self,
        literal_count: u32,
        temp_count: u32,
        body: &[u8],
    ) {
        self.emit_op(Op::CreateBlock);
        self.emit_u32(body.len() as u32);
        self.emit_u32(literal_count);
        self.emit_u32(temp_count);
        self.buf.extend_from_slice(body);
    }

    pub fn execute_block(&mut self, argc: u32) {
        self.emit_op(Op::ExecuteBlock);
        self.emit_u32(argc);
    }

    // ── jumps ──────────────────────────────────────────────────────

    /// Emit an unconditional forward jump. Returns a [`Label`] that must be
    /// resolved later with [`bind`](Self::bind).
    pub fn jump(&mut self) -> Label {
        self.emit_jump_placeholder(Op::Jump)
    }

    /// Emit a conditional forward jump taken on `true`. Returns a [`Label`].
    pub fn jump_if_true(&mut self) -> Label {
        self.emit_jump_placeholder(Op::JumpIfTrue)
    }

    /// Emit a conditional forward jump taken on anything but `true`.
    pub fn jump_if_false(&mut self) -> Label {
        self.emit_jump_placeholder(Op::JumpIfFalse)
    }

    /// Resolve a forward jump to the current position.
    pub fn bind(&mut self, label: Label) {
        let target = self.buf.len();
        let offset = (target as isize - label.base as isize) as i32;
        self.buf[label.offset_pos..label.offset_pos + 4]
            .copy_from_slice(&offset.to_be_bytes());
    }

    /// Emit a jump with an explicit offset, relative to the end of the
    /// jump instruction.
    pub fn jump_by(&mut self, op: Op, offset: i32) {
        debug_assert!(op.is_jump(), "{op:?} is not a jump");
        self.emit_op(op);
        self.emit_i32(offset);
    }

    /// Emit an unconditional backward jump to `target`.
    pub fn jump_back(&mut self, target: usize) {
        let base = self.buf.len() + Op::Jump.size();
        self.jump_by(Op::Jump, target as i32 - base as i32);
    }

    fn emit_jump_placeholder(&mut self, op: Op) -> Label {
        self.emit_op(op);
        let offset_pos = self.buf.len();
        self.emit_i32(0);
        let base = self.buf.len();
        Label { offset_pos, base }
    }
}
