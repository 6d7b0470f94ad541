//! The dispatch loop.
//!
//! Every activation is a [`Context`] driven by its own call to [`run`].
//! Sends and block invocations recurse on the host stack; the depth is
//! bounded by [`VmCreateInfo::max_depth`](crate::VmCreateInfo).
//!
//! `RefCell` borrows of a context are never held across an allocation or
//! a nested activation. The collector borrows every reachable context
//! mutably while it rewrites their slots.

use std::rc::Rc;

use bytecode::{decode_at, Instruction, Op};
use object::{Body, Context, ContextRef, Value};

use crate::alloc::alloc_block;
use crate::error::RuntimeError;
use crate::lookup::{class_name, class_of, lookup_method};
use crate::primitives;
use crate::Vm;

/// Run `method` with `receiver` and `args` in a new context whose sender is
/// the currently active one, if any.
pub fn execute_method(
    vm: &mut Vm,
    method: Value,
    receiver: Value,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let temp_count = match vm.heap.get(method).map(|o| &o.body) {
        Some(Body::Method(m)) => m.temp_names.len(),
        _ => {
            return Err(RuntimeError::TypeError {
                expected: "Method",
                got: method,
            })
        }
    };
    let ctx = Context::new(
        method,
        receiver,
        args,
        temp_count,
        vm.active_context().cloned(),
        None,
    )
    .into_ref();
    execute(vm, ctx)
}

/// Send `selector` to `receiver`: look the method up, try its primitive
/// and otherwise run its bytecode in a child context.
pub fn send_message(
    vm: &mut Vm,
    receiver: Value,
    selector: &str,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let class = class_of(vm, receiver);
    let Some(method) = lookup_method(vm, class, selector) else {
        return Err(RuntimeError::MethodNotFound {
            class: class_name(vm, class).to_owned(),
            selector: selector.to_owned(),
        });
    };
    log::trace!("send {}>>{selector} argc={}", class_name(vm, class), args.len());

    let (primitive, temp_count) = match vm.body(method) {
        Body::Method(m) => (m.primitive, m.temp_names.len()),
        other => panic!(
            "method dictionary entry for #{selector} is a {}",
            other.type_name()
        ),
    };

    if let Some(index) = primitive {
        if let Some(result) = primitives::dispatch(vm, index, receiver, &args)? {
            return Ok(result);
        }
        log::debug!("primitive {index} declined #{selector}, running bytecode");
    }

    let ctx = Context::new(
        method,
        receiver,
        args,
        temp_count,
        vm.active_context().cloned(),
        None,
    )
    .into_ref();
    execute(vm, ctx)
}

/// Invoke `block` with `args`. The block is both the code and the
/// receiver of the new context; its lexical outer context is the one it
/// was created in.
pub fn call_block(
    vm: &mut Vm,
    block: Value,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let (temp_count, outer) = match vm.heap.get(block).map(|o| &o.body) {
        Some(Body::Block(b)) => (b.temp_count, b.outer.clone()),
        _ => {
            return Err(RuntimeError::TypeError {
                expected: "Block",
                got: block,
            })
        }
    };
    let ctx = Context::new(
        block,
        block,
        args,
        temp_count,
        vm.active_context().cloned(),
        outer,
    )
    .into_ref();
    execute(vm, ctx)
}

/// Remaining host stack below which a nested activation first grows it.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each new host stack segment.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

fn execute(vm: &mut Vm, ctx: ContextRef) -> Result<Value, RuntimeError> {
    let running = ctx.clone();
    let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        vm.with_active(ctx, |vm| run(vm, &running))
    });
    // A block may keep this context alive as its outer; callers may not.
    running.borrow_mut().sender = None;
    result
}

fn bytecode_of(vm: &Vm, code: Value) -> Rc<[u8]> {
    match vm.body(code) {
        Body::Method(m) => m.bytecode.clone(),
        Body::Block(b) => b.bytecode.clone(),
        other => panic!("context code is a {}", other.type_name()),
    }
}

fn literals_of(vm: &Vm, code: Value) -> &[Value] {
    match vm.body(code) {
        Body::Method(m) => &m.literals,
        Body::Block(b) => &b.literals,
        other => panic!("context code is a {}", other.type_name()),
    }
}

fn literal(vm: &Vm, code: Value, idx: u32) -> Result<Value, RuntimeError> {
    let literals = literals_of(vm, code);
    literals
        .get(idx as usize)
        .copied()
        .ok_or(RuntimeError::LiteralOutOfBounds {
            index: idx as usize,
            len: literals.len(),
        })
}

fn run(vm: &mut Vm, ctx: &ContextRef) -> Result<Value, RuntimeError> {
    loop {
        // Re-read every step: a collection may have moved the code.
        let (code, pc) = {
            let c = ctx.borrow();
            (c.method, c.pc)
        };
        let bytecode = bytecode_of(vm, code);
        if pc >= bytecode.len() {
            return Ok(ctx.borrow().stack.last().copied().unwrap_or(Value::NIL));
        }

        let instr = decode_at(&bytecode, pc)?;
        let next = pc + instr.len();
        ctx.borrow_mut().pc = next;

        match instr {
            Instruction::PushLiteral { idx } => {
                let value = literal(vm, code, idx)?;
                ctx.borrow_mut().push(value);
            }
            Instruction::PushInstanceVariable { idx } => {
                let receiver = ctx.borrow().receiver;
                let value = load_ivar(vm, receiver, idx as usize)?;
                ctx.borrow_mut().push(value);
            }
            Instruction::PushTemporaryVariable { idx } => {
                let value = load_temp(ctx, idx as usize)?;
                ctx.borrow_mut().push(value);
            }
            Instruction::PushSelf => {
                let mut c = ctx.borrow_mut();
                let receiver = c.receiver;
                c.push(receiver);
            }
            Instruction::StoreInstanceVariable { idx } => {
                let (receiver, value) = {
                    let c = ctx.borrow();
                    (c.receiver, c.top())
                };
                store_ivar(vm, receiver, idx as usize, value)?;
            }
            Instruction::StoreTemporaryVariable { idx } => {
                let value = ctx.borrow().top();
                store_temp(ctx, idx as usize, value)?;
            }
            Instruction::SendMessage { selector_idx, argc } => {
                let selector = literal(vm, code, selector_idx)?;
                let Some(name) = vm.symbol_name(selector).map(str::to_owned) else {
                    return Err(RuntimeError::SelectorNotSymbol { got: selector });
                };
                let (receiver, args) = {
                    let mut c = ctx.borrow_mut();
                    let args = c.pop_n(argc as usize);
                    if c.stack.is_empty() {
                        return Err(RuntimeError::NilReceiver { selector: name });
                    }
                    (c.pop(), args)
                };
                let result = send_message(vm, receiver, &name, args)?;
                ctx.borrow_mut().push(result);
            }
            Instruction::ReturnStackTop => {
                return Ok(ctx.borrow().stack.last().copied().unwrap_or(Value::NIL));
            }
            Instruction::Jump { offset } => {
                jump(ctx, next, offset, bytecode.len())?;
            }
            Instruction::JumpIfTrue { offset } => {
                if ctx.borrow_mut().pop().is_true() {
                    jump(ctx, next, offset, bytecode.len())?;
                }
            }
            Instruction::JumpIfFalse { offset } => {
                if !ctx.borrow_mut().pop().is_true() {
                    jump(ctx, next, offset, bytecode.len())?;
                }
            }
            Instruction::Pop => {
                ctx.borrow_mut().pop();
            }
            Instruction::Duplicate => {
                let mut c = ctx.borrow_mut();
                let top = c.top();
                c.push(top);
            }
            Instruction::CreateBlock {
                size,
                literal_count,
                temp_count,
            } => {
                let start = pc + Op::CreateBlock.size();
                let body: Rc<[u8]> = bytecode[start..start + size as usize].into();
                let enclosing = literals_of(vm, code);
                let Some(literals) = enclosing.get(..literal_count as usize) else {
                    return Err(RuntimeError::LiteralOutOfBounds {
                        index: literal_count as usize,
                        len: enclosing.len(),
                    });
                };
                let literals = literals.to_vec();
                let block = alloc_block(
                    vm,
                    body,
                    literals,
                    temp_count as usize,
                    Some(ctx.clone()),
                );
                ctx.borrow_mut().push(block);
            }
            Instruction::ExecuteBlock { argc } => {
                let (block, args) = {
                    let mut c = ctx.borrow_mut();
                    let args = c.pop_n(argc as usize);
                    (c.pop(), args)
                };
                let result = call_block(vm, block, args)?;
                ctx.borrow_mut().push(result);
            }
        }
    }
}

fn jump(
    ctx: &ContextRef,
    next: usize,
    offset: i32,
    len: usize,
) -> Result<(), RuntimeError> {
    let target = next as i64 + offset as i64;
    if target < 0 || target >= len as i64 {
        return Err(RuntimeError::JumpOutOfBounds { target, len });
    }
    ctx.borrow_mut().pc = target as usize;
    Ok(())
}

// ── variables ─────────────────────────────────────────────────────────

fn load_ivar(vm: &Vm, receiver: Value, idx: usize) -> Result<Value, RuntimeError> {
    match vm.heap.get(receiver).map(|o| &o.body) {
        Some(Body::Instance(instance)) => instance.ivars.get(idx).copied().ok_or(
            RuntimeError::InstanceVariableOutOfBounds {
                index: idx,
                len: instance.ivars.len(),
            },
        ),
        _ => Err(RuntimeError::InstanceVariableOutOfBounds { index: idx, len: 0 }),
    }
}

fn store_ivar(
    vm: &mut Vm,
    receiver: Value,
    idx: usize,
    value: Value,
) -> Result<(), RuntimeError> {
    match vm.heap.get_mut(receiver).map(|o| &mut o.body) {
        Some(Body::Instance(instance)) => {
            let len = instance.ivars.len();
            match instance.ivars.get_mut(idx) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(RuntimeError::InstanceVariableOutOfBounds { index: idx, len }),
            }
        }
        _ => Err(RuntimeError::InstanceVariableOutOfBounds { index: idx, len: 0 }),
    }
}

/// Resolve temp `idx` against `ctx` and then its lexical outer chain.
fn load_temp(ctx: &ContextRef, idx: usize) -> Result<Value, RuntimeError> {
    let mut current = ctx.clone();
    loop {
        let outer = {
            let c = current.borrow();
            if let Some(value) = c.temps.get(idx) {
                return Ok(*value);
            }
            c.outer.clone()
        };
        match outer {
            Some(outer) => current = outer,
            None => return Err(RuntimeError::TemporaryVariableOutOfBounds { index: idx }),
        }
    }
}

fn store_temp(ctx: &ContextRef, idx: usize, value: Value) -> Result<(), RuntimeError> {
    let mut current = ctx.clone();
    loop {
        let outer = {
            let mut c = current.borrow_mut();
            if let Some(slot) = c.temps.get_mut(idx) {
                *slot = value;
                return Ok(());
            }
            c.outer.clone()
        };
        match outer {
            Some(outer) => current = outer,
            None => return Err(RuntimeError::TemporaryVariableOutOfBounds { index: idx }),
        }
    }
}
