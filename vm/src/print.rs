use std::fmt::Write;

use bytecode::{BytecodeDecoder, Instruction, Op};
use object::{Body, Value, ValueKind};

use crate::lookup::{class_name, class_of};
use crate::Vm;

/// Nesting beyond this prints as `...`; arrays may contain themselves.
const MAX_PRINT_DEPTH: usize = 8;

impl Vm {
    /// Render `value` the way the CLI reports results.
    pub fn print_string(&self, value: Value) -> String {
        let mut out = String::new();
        self.print_into(&mut out, value, 0);
        out
    }

    /// Literal table and instructions of a method or block, one per line.
    /// Block bodies are listed indented under their `CREATE_BLOCK`.
    pub fn disassemble(&self, code: Value) -> String {
        let (bytecode, literals) = match self.heap.get(code).map(|o| &o.body) {
            Some(Body::Method(m)) => (&m.bytecode, &m.literals),
            Some(Body::Block(b)) => (&b.bytecode, &b.literals),
            _ => return format!("{} is not code\n", self.print_string(code)),
        };
        let mut out = String::new();
        for (i, literal) in literals.iter().enumerate() {
            let _ = writeln!(out, "#{i:<3} {}", self.print_string(*literal));
        }
        disassemble_bytes(&mut out, bytecode, 0);
        out
    }

    fn print_into(&self, out: &mut String, value: Value, depth: usize) {
        if depth > MAX_PRINT_DEPTH {
            out.push_str("...");
            return;
        }
        match value.kind() {
            ValueKind::SmallInteger(i) => {
                let _ = write!(out, "{i}");
            }
            ValueKind::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            ValueKind::Nil => out.push_str("nil"),
            ValueKind::True => out.push_str("true"),
            ValueKind::False => out.push_str("false"),
            ValueKind::Pointer(_) => self.print_object(out, value, depth),
        }
    }

    fn print_object(&self, out: &mut String, value: Value, depth: usize) {
        let Some(obj) = self.heap.get(value) else {
            let _ = write!(out, "<dangling {value:?}>");
            return;
        };
        match &obj.body {
            Body::String(s) => {
                let _ = write!(out, "'{}'", s.replace('\'', "''"));
            }
            Body::Symbol(s) => {
                let _ = write!(out, "#{s}");
            }
            Body::Class(c) => out.push_str(&c.name),
            Body::Array(elements) => {
                out.push_str("#(");
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.print_into(out, *e, depth + 1);
                }
                out.push(')');
            }
            Body::ByteArray(bytes) => {
                out.push_str("#[");
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{b}");
                }
                out.push(']');
            }
            Body::Method(m) => {
                let selector = self.symbol_name(m.selector).unwrap_or("?");
                let _ = write!(out, "{}>>{selector}", class_name(self, m.class));
            }
            Body::Forwarded => {
                let _ = write!(out, "<forwarded {value:?}>");
            }
            Body::Instance(_) | Body::Block(_) | Body::Dictionary(_) => {
                let name = class_name(self, class_of(self, value));
                let article = match name.chars().next() {
                    Some(c) if "AEIOU".contains(c) => "an",
                    _ => "a",
                };
                let _ = write!(out, "{article} {name}");
            }
        }
    }
}

fn disassemble_bytes(out: &mut String, bytes: &[u8], indent: usize) {
    let pad = " ".repeat(indent);
    let mut decoder = BytecodeDecoder::new(bytes);
    while let Some((at, instr)) = decoder.decode_next() {
        let _ = writeln!(out, "{pad}{at:04} {instr}");
        if let Instruction::CreateBlock { size, .. } = instr {
            let start = at + Op::CreateBlock.size();
            disassemble_bytes(out, &bytes[start..start + size as usize], indent + 4);
        }
    }
    if let Some(err) = decoder.error() {
        let _ = writeln!(out, "{pad}{:04} <{err}>", decoder.offset());
    }
}

#[cfg(test)]
mod tests {
    use crate::alloc::{alloc_array, alloc_byte_array, alloc_class, alloc_instance, alloc_string};
    use crate::special::bootstrap;
    use crate::VmCreateInfo;
    use object::Value;

    #[test]
    fn immediates() {
        let vm = bootstrap(VmCreateInfo::default());
        assert_eq!(vm.print_string(Value::from_i64(-42)), "-42");
        assert_eq!(vm.print_string(Value::make_float(2.5)), "2.5");
        assert_eq!(vm.print_string(Value::NIL), "nil");
        assert_eq!(vm.print_string(Value::TRUE), "true");
        assert_eq!(vm.print_string(Value::FALSE), "false");
    }

    #[test]
    fn heap_objects() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let s = alloc_string(&mut vm, "it's");
        assert_eq!(vm.print_string(s), "'it''s'");
        let sym = vm.intern("foo:");
        assert_eq!(vm.print_string(sym), "#foo:");
        assert_eq!(vm.print_string(vm.special.integer), "Integer");

        let a = alloc_array(&mut vm, vec![Value::from_i64(1), Value::NIL]);
        assert_eq!(vm.print_string(a), "#(1 nil)");
        let b = alloc_byte_array(&mut vm, vec![1, 255]);
        assert_eq!(vm.print_string(b), "#[1 255]");

        let object = vm.special.object;
        alloc_class(&mut vm, "Account", object, &[]);
        let account = vm.global("Account").unwrap();
        let x = alloc_instance(&mut vm, account, 0);
        assert_eq!(vm.print_string(x), "an Account");
    }

    #[test]
    fn disassemble_lists_literals_and_nested_blocks() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let mut b = crate::MethodBuilder::new(vm.special.object, "doit");
        let one = b.add_literal(1);
        let mut body = bytecode::BytecodeBuilder::new();
        body.push_literal(one);
        b.code().create_block(1, 0, body.as_bytes());
        b.code().return_stack_top();
        let method = b.build(&mut vm);

        let text = vm.disassemble(method);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#0   1");
        assert!(lines[1].starts_with("0000 CREATE_BLOCK"));
        assert_eq!(lines[2], "    0000 PUSH_LITERAL 0");
        assert_eq!(lines[3], "0018 RETURN_STACK_TOP");
    }

    #[test]
    fn self_containing_array_terminates() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let a = alloc_array(&mut vm, vec![Value::NIL]);
        if let object::Body::Array(e) = vm.body_mut(a) {
            e[0] = a;
        }
        let expected = format!("{}...{}", "#(".repeat(9), ")".repeat(9));
        assert_eq!(vm.print_string(a), expected);
    }
}
