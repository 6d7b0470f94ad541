mod op;
mod instruction;
mod builder;
mod decoder;

pub use op::Op;
pub use instruction::Instruction;
pub use builder::{BytecodeBuilder, Label};
pub use decoder::{BytecodeDecoder, DecodeError, decode_at};

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Instruction> {
        BytecodeDecoder::new(bytes).collect()
    }

    #[test]
    fn instruction_sizes() {
        assert_eq!(Op::PushSelf.size(), 1);
        assert_eq!(Op::ReturnStackTop.size(), 1);
        assert_eq!(Op::PushLiteral.size(), 5);
        assert_eq!(Op::JumpIfFalse.size(), 5);
        assert_eq!(Op::SendMessage.size(), 9);
        assert_eq!(Op::CreateBlock.size(), 13);
    }

    #[test]
    fn opcode_byte_values_are_stable() {
        assert_eq!(Op::PushLiteral as u8, 0);
        assert_eq!(Op::SendMessage as u8, 6);
        assert_eq!(Op::ReturnStackTop as u8, 7);
        assert_eq!(Op::Duplicate as u8, 12);
        assert_eq!(Op::ExecuteBlock as u8, 14);
        assert_eq!(Op::try_from(15), Err(15));
        for byte in 0..Op::COUNT as u8 {
            assert_eq!(Op::try_from(byte).map(|op| op as u8), Ok(byte));
        }
    }

    #[test]
    fn operands_are_big_endian() {
        let mut b = BytecodeBuilder::new();
        b.send_message(0x0102_0304, 2);
        assert_eq!(b.as_bytes(), &[6, 1, 2, 3, 4, 0, 0, 0, 2]);
    }

    #[test]
    fn decode_method_body() {
        let mut b = BytecodeBuilder::new();
        b.push_self();
        b.push_literal(0);
        b.send_message(1, 1);
        b.store_temporary_variable(2);
        b.pop();
        b.push_temporary_variable(2);
        b.duplicate();
        b.return_stack_top();

        assert_eq!(decode_all(&b.into_bytes()), vec![
            Instruction::PushSelf,
            Instruction::PushLiteral { idx: 0 },
            Instruction::SendMessage { selector_idx: 1, argc: 1 },
            Instruction::StoreTemporaryVariable { idx: 2 },
            Instruction::Pop,
            Instruction::PushTemporaryVariable { idx: 2 },
            Instruction::Duplicate,
            Instruction::ReturnStackTop,
        ]);
    }

    #[test]
    fn create_block_skips_nested_body() {
        let mut body = BytecodeBuilder::new();
        body.push_temporary_variable(0);
        body.push_literal(0);
        body.send_message(1, 1);
        let body = body.into_bytes();

        let mut b = BytecodeBuilder::new();
        b.create_block(2, 1, &body);
        b.push_literal(3);
        b.execute_block(1);
        let bytes = b.into_bytes();

        let first = decode_at(&bytes, 0).unwrap();
        assert_eq!(first, Instruction::CreateBlock {
            size: body.len() as u32,
            literal_count: 2,
            temp_count: 1,
        });
        assert_eq!(first.len(), 13 + body.len());
        assert_eq!(&bytes[13..13 + body.len()], body.as_slice());
        assert_eq!(decode_all(&bytes)[1..], [
            Instruction::PushLiteral { idx: 3 },
            Instruction::ExecuteBlock { argc: 1 },
        ]);
    }

    #[test]
    fn forward_jump() {
        let mut b = BytecodeBuilder::new();
        b.push_literal(0);
        let label = b.jump_if_false();
        b.push_literal(1);
        b.bind(label);
        b.return_stack_top();

        assert_eq!(decode_all(&b.into_bytes()), vec![
            Instruction::PushLiteral { idx: 0 },
            Instruction::JumpIfFalse { offset: 5 },
            Instruction::PushLiteral { idx: 1 },
            Instruction::ReturnStackTop,
        ]);
    }

    #[test]
    fn backward_jump() {
        let mut b = BytecodeBuilder::new();
        let loop_top = b.current_offset();
        b.push_self();
        b.pop();
        b.jump_back(loop_top);

        assert_eq!(decode_all(&b.into_bytes()), vec![
            Instruction::PushSelf,
            Instruction::Pop,
            Instruction::Jump { offset: -7 },
        ]);
    }

    #[test]
    fn unknown_opcode_is_reported() {
        let bytes = [Op::PushSelf as u8, 0xFF];
        let mut decoder = BytecodeDecoder::new(&bytes);
        assert_eq!(decoder.next(), Some(Instruction::PushSelf));
        assert_eq!(decoder.next(), None);
        assert_eq!(
            decoder.error(),
            Some(&DecodeError::UnknownOpcode { byte: 0xFF, offset: 1 })
        );
    }

    #[test]
    fn truncated_operand_is_reported() {
        let bytes = [Op::PushLiteral as u8, 0, 0];
        assert_eq!(
            decode_at(&bytes, 0),
            Err(DecodeError::Truncated {
                op: Op::PushLiteral,
                offset: 0,
                needed: 5,
                available: 3,
            })
        );
    }

    #[test]
    fn truncated_block_body_is_reported() {
        let mut b = BytecodeBuilder::new();
        b.create_block(0, 0, &[Op::PushSelf as u8, Op::ReturnStackTop as u8]);
        let mut bytes = b.into_bytes();
        bytes.pop();
        assert!(matches!(
            decode_at(&bytes, 0),
            Err(DecodeError::Truncated { op: Op::CreateBlock, needed: 15, .. })
        ));
    }

    #[test]
    fn display_instructions() {
        assert_eq!(
            Instruction::SendMessage { selector_idx: 5, argc: 2 }.to_string(),
            "SEND_MESSAGE #5 argc=2"
        );
        assert_eq!(Instruction::Jump { offset: -7 }.to_string(), "JUMP -7");
        assert_eq!(
            Instruction::PushTemporaryVariable { idx: 3 }.to_string(),
            "PUSH_TEMPORARY_VARIABLE 3"
        );
        assert_eq!(Instruction::Duplicate.to_string(), "DUPLICATE");
    }
}
