//! Stack-based virtual machine (§4.4).
//!
//! Executes the bytecode a [`crate::compiler::Compiler`] produced: one value
//! stack shared across every active call, a call-frame stack tracking which
//! closure is running and where its window of the value stack begins, and a
//! list of open [`Upvalue`] cells threaded in descending-stack-address
//! order so closing them (on scope exit or `RETURN`) is a simple prefix
//! scan rather than a full walk.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io::Write;
use std::rc::Rc;

use crate::diagnostic::Diagnostic;
use crate::natives;
use crate::opcode::Opcode;
use crate::symbol::{Interner, SharedInterner, Symbol};
use crate::value::{
    values_equal, Closure, FunctionProto, NativeFunction, Object, RuntimeError, Upvalue,
    UpvalueHandle, Value,
};

/// Hard cap on simultaneously active call frames (§4.4.1).
const FRAMES_MAX: usize = 64;

/// The frame cap a [`Vm`] uses absent a `vm.frames_max` override (§13.1).
pub fn default_frames_max() -> usize {
    FRAMES_MAX
}

struct CallFrame {
    closure: Rc<Closure>,
    /// Index into `closure.proto.chunk.code` of the next byte to fetch.
    ip: usize,
    /// Index into the VM's value stack of this frame's slot 0 (the callee
    /// itself; argument `i` lives at `stack_offset + i + 1`).
    stack_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Ok,
    Bad,
}

/// Owns the whole runtime store the compiled program executes against:
/// the value stack, the frame stack, globals, and open upvalues. One `Vm`
/// runs exactly one loaded program from `load` through to completion or a
/// halting runtime error.
pub struct Vm {
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: HashMap<Symbol, Value>,
    const_globals: HashSet<Symbol>,
    /// Threaded list of open upvalues, ordered by descending stack slot —
    /// the invariant `capture`/`close_upvalues` both rely on (§4.4.5, §9).
    open_upvalues: Vec<UpvalueHandle>,
    interner: SharedInterner,
    state: VmState,
    /// Call-frame cap (§4.4.1); defaults to [`FRAMES_MAX`] but is
    /// overridable via `lumen-config`'s `vm.frames_max` (§13.1).
    frames_max: usize,
}

impl Vm {
    pub fn new(interner: SharedInterner) -> Self {
        Self::with_frames_max(interner, FRAMES_MAX)
    }

    /// Like [`Vm::new`], with the call-frame cap overridden — the
    /// `--config`-driven path the CLI uses (§13.1).
    pub fn with_frames_max(interner: SharedInterner, frames_max: usize) -> Self {
        Self {
            stack: Vec::with_capacity(256),
            frames: Vec::with_capacity(frames_max),
            globals: HashMap::new(),
            const_globals: HashSet::new(),
            open_upvalues: Vec::new(),
            interner,
            state: VmState::Ok,
            frames_max,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Wraps `script` in a zero-upvalue closure, pushes the initial call
    /// frame, and installs the native builtins (§4.4.2). The one-shot entry
    /// point: a file runner loads exactly once and runs to completion.
    pub fn load(&mut self, script: Rc<FunctionProto>, const_globals: HashSet<Symbol>) {
        self.install_natives();
        self.push_script(script, const_globals);
    }

    /// Installs the native builtins into `globals`. Idempotent in the sense
    /// that calling it again re-binds every native name — which is exactly
    /// wrong for a REPL that has since let user code shadow one of them, so
    /// callers that reuse a `Vm` across multiple compiles (§13.2's REPL)
    /// call this once, up front, and then drive each line through
    /// [`Vm::push_script`] instead of [`Vm::load`].
    pub fn install_natives(&mut self) {
        for (name, native) in natives::builtins(&self.interner) {
            let sym = self.interner.borrow_mut().intern(name);
            self.globals.insert(sym, Value::native(native));
        }
    }

    /// Pushes a new top-level call frame for `script` without touching
    /// existing globals, open upvalues, or stack contents — what the REPL
    /// needs so a `let`/`const`/`fn` bound on one line stays visible to the
    /// next (§13.2). `const_globals` accumulates rather than replaces, so a
    /// `const` declared on an earlier line is still enforced.
    pub fn push_script(&mut self, script: Rc<FunctionProto>, const_globals: HashSet<Symbol>) {
        self.const_globals.extend(const_globals);
        let closure = Rc::new(Closure { proto: script, upvalues: Vec::new() });
        self.stack.push(Value::closure(closure.clone()));
        self.frames.push(CallFrame { closure, ip: 0, stack_offset: self.stack.len() - 1 });
    }

    /// Runs until the outermost frame returns or a runtime error halts
    /// execution. On error, the returned [`Diagnostic`] carries the
    /// frame-by-frame trace (§4.4.6); the value stack is cleared either way
    /// control leaves, and [`Vm::state`] reflects the outcome.
    pub fn run(&mut self, out: &mut dyn Write) -> Result<(), Diagnostic> {
        match self.run_loop(out) {
            Ok(()) => {
                self.state = VmState::Ok;
                Ok(())
            }
            Err(err) => {
                let diagnostic = self.build_diagnostic(err);
                self.state = VmState::Bad;
                self.stack.clear();
                self.frames.clear();
                Err(diagnostic)
            }
        }
    }

    fn build_diagnostic(&self, err: RuntimeError) -> Diagnostic {
        let line = self
            .frames
            .last()
            .map(|f| f.closure.proto.chunk.line_at(f.ip.saturating_sub(1)))
            .unwrap_or(0);
        let interner = self.interner.borrow();
        let trace: Vec<String> = self
            .frames
            .iter()
            .rev()
            .map(|frame| {
                let chunk_line = frame.closure.proto.chunk.line_at(frame.ip.saturating_sub(1));
                let raw_name = interner.resolve(frame.closure.proto.name);
                let name = if raw_name == "<script>" { "script" } else { raw_name };
                format!("[line {}] in {}", chunk_line, name)
            })
            .collect();
        Diagnostic::runtime_error(line, err.to_string(), trace)
    }

    // ---- fetch/decode -----------------------------------------------

    fn frame(&self) -> &CallFrame {
        self.frames.last().expect("run() always has an active frame")
    }

    fn frame_mut(&mut self) -> &mut CallFrame {
        self.frames.last_mut().expect("run() always has an active frame")
    }

    fn read_byte(&mut self) -> u8 {
        let frame = self.frame_mut();
        let byte = frame.closure.proto.chunk.code[frame.ip];
        frame.ip += 1;
        byte
    }

    /// Big-endian 16-bit jump operand (§6).
    fn read_u16(&mut self) -> u16 {
        let hi = self.read_byte() as u16;
        let lo = self.read_byte() as u16;
        (hi << 8) | lo
    }

    /// Little-endian 24-bit `CONSTANT_LONG` operand (§6).
    fn read_u24(&mut self) -> usize {
        let b0 = self.read_byte() as usize;
        let b1 = self.read_byte() as usize;
        let b2 = self.read_byte() as usize;
        b0 | (b1 << 8) | (b2 << 16)
    }

    fn read_constant(&mut self) -> Value {
        let index = self.read_byte() as usize;
        self.frame().closure.proto.chunk.constants[index].clone()
    }

    fn read_constant_long(&mut self) -> Value {
        let index = self.read_u24();
        self.frame().closure.proto.chunk.constants[index].clone()
    }

    // ---- stack helpers -----------------------------------------------

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("compiler balances push/pop per opcode")
    }

    fn peek(&self, distance: usize) -> &Value {
        &self.stack[self.stack.len() - 1 - distance]
    }

    fn display_value(&self, value: &Value) -> String {
        let interner = self.interner.borrow();
        display_value(value, &interner)
    }

    // ---- the hot loop -----------------------------------------------

    fn run_loop(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        loop {
            let byte = self.read_byte();
            let op = Opcode::try_from(byte).map_err(|b| {
                RuntimeError::Native(format!("Unknown opcode {} in chunk.", b))
            })?;

            match op {
                Opcode::Constant => {
                    let value = self.read_constant();
                    self.push(value);
                }
                Opcode::ConstantLong => {
                    let value = self.read_constant_long();
                    self.push(value);
                }
                Opcode::Nil => self.push(Value::Nil),
                Opcode::True => self.push(Value::Bool(true)),
                Opcode::False => self.push(Value::Bool(false)),
                Opcode::Pop => {
                    self.pop();
                }
                Opcode::Dup => {
                    let top = self.peek(0).clone();
                    self.push(top);
                }
                Opcode::Swap => {
                    let len = self.stack.len();
                    self.stack.swap(len - 1, len - 2);
                }
                Opcode::Add => self.op_add()?,
                Opcode::Mult => self.binary_numeric(|a, b| a * b)?,
                Opcode::Div => self.op_div()?,
                Opcode::Neg => {
                    let n = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
                    self.push(Value::Number(-n));
                }
                Opcode::Not => {
                    let interner = self.interner.borrow();
                    let truthy = self.peek(0).is_truthy(&interner);
                    drop(interner);
                    self.pop();
                    self.push(Value::Bool(!truthy));
                }
                Opcode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(values_equal(&a, &b)));
                }
                Opcode::Greater => self.binary_compare(|a, b| a > b)?,
                Opcode::Less => self.binary_compare(|a, b| a < b)?,
                Opcode::Print => {
                    let value = self.pop();
                    let text = self.display_value(&value);
                    writeln!(out, "{}", text).map_err(|e| RuntimeError::Native(e.to_string()))?;
                }
                Opcode::DefineGlobal => {
                    let name = self.read_global_name();
                    let value = self.pop();
                    if self.globals.contains_key(&name) {
                        return Err(RuntimeError::GlobalRedefined(self.resolve(name)));
                    }
                    self.globals.insert(name, value);
                }
                Opcode::GetGlobal => {
                    let name = self.read_global_name();
                    let value = self
                        .globals
                        .get(&name)
                        .cloned()
                        .ok_or_else(|| RuntimeError::UndefinedGlobal(self.resolve(name)))?;
                    self.push(value);
                }
                Opcode::SetGlobal => {
                    let name = self.read_global_name();
                    if !self.globals.contains_key(&name) {
                        return Err(RuntimeError::UndefinedGlobal(self.resolve(name)));
                    }
                    if self.const_globals.contains(&name) {
                        return Err(RuntimeError::AssignToConst(self.resolve(name)));
                    }
                    let value = self.peek(0).clone();
                    self.globals.insert(name, value);
                }
                Opcode::GetLocal => {
                    let slot = self.read_byte() as usize;
                    let value = self.stack[self.frame().stack_offset + slot].clone();
                    self.push(value);
                }
                Opcode::SetLocal => {
                    let slot = self.read_byte() as usize;
                    let value = self.peek(0).clone();
                    let offset = self.frame().stack_offset;
                    self.stack[offset + slot] = value;
                }
                Opcode::GetUpvalue => {
                    let index = self.read_byte() as usize;
                    let handle = Rc::clone(&self.frame().closure.upvalues[index]);
                    self.push(self.upvalue_get(&handle));
                }
                Opcode::SetUpvalue => {
                    let index = self.read_byte() as usize;
                    let handle = Rc::clone(&self.frame().closure.upvalues[index]);
                    let value = self.peek(0).clone();
                    self.upvalue_set(&handle, value);
                }
                Opcode::CloseUpvalue => {
                    let top_slot = self.stack.len() - 1;
                    self.close_upvalues(top_slot);
                    self.pop();
                }
                Opcode::Jump => {
                    let offset = self.read_u16();
                    self.frame_mut().ip += offset as usize;
                }
                Opcode::JumpIfFalse => {
                    let offset = self.read_u16();
                    let interner = self.interner.borrow();
                    let truthy = self.peek(0).is_truthy(&interner);
                    drop(interner);
                    if !truthy {
                        self.frame_mut().ip += offset as usize;
                    }
                }
                Opcode::Loop => {
                    let offset = self.read_u16();
                    self.frame_mut().ip -= offset as usize;
                }
                Opcode::Call => {
                    let argc = self.read_byte();
                    let callee = self.peek(argc as usize).clone();
                    self.call_value(callee, argc)?;
                }
                Opcode::Closure => self.op_closure(),
                Opcode::Return => {
                    let result = self.pop();
                    let frame = self.frames.pop().expect("at least one active frame");
                    self.close_upvalues(frame.stack_offset);
                    self.stack.truncate(frame.stack_offset);
                    if self.frames.is_empty() {
                        return Ok(());
                    }
                    self.push(result);
                }
            }
        }
    }

    fn read_global_name(&mut self) -> Symbol {
        let constant = self.read_constant();
        constant.as_string_symbol().expect("compiler emits a string constant for global names")
    }

    fn resolve(&self, sym: Symbol) -> String {
        self.interner.borrow().resolve(sym).to_string()
    }

    fn op_add(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => {
                self.push(Value::Number(x + y));
                Ok(())
            }
            (Value::Object(Object::Str(_)), Value::Object(Object::Str(_)))
            | (Value::Object(Object::Str(_)), Value::Number(_))
            | (Value::Number(_), Value::Object(Object::Str(_))) => {
                let mut concatenated = self.display_value(&a);
                concatenated.push_str(&self.display_value(&b));
                let sym = self.interner.borrow_mut().intern(&concatenated);
                self.push(Value::string_symbol(sym));
                Ok(())
            }
            _ => Err(RuntimeError::InvalidAddOperands),
        }
    }

    fn op_div(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
        let a = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
        if b == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        self.push(Value::Number(a / b));
        Ok(())
    }

    fn binary_numeric(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
        let a = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
        self.push(Value::Number(f(a, b)));
        Ok(())
    }

    fn binary_compare(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
        let a = self.pop().as_number().ok_or(RuntimeError::NotANumber)?;
        self.push(Value::Bool(f(a, b)));
        Ok(())
    }

    // ---- calls -----------------------------------------------

    fn call_value(&mut self, callee: Value, argc: u8) -> Result<(), RuntimeError> {
        match callee {
            Value::Object(Object::Closure(closure)) => self.call_closure(closure, argc),
            Value::Object(Object::Native(native)) => self.call_native(native, argc),
            _ => Err(RuntimeError::NotCallable),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, argc: u8) -> Result<(), RuntimeError> {
        let arity = closure.proto.arity;
        if argc != arity {
            return Err(RuntimeError::ArityMismatch { expected: arity as usize, got: argc as usize });
        }
        if self.frames.len() >= self.frames_max {
            return Err(RuntimeError::StackOverflow);
        }
        let stack_offset = self.stack.len() - argc as usize - 1;
        self.frames.push(CallFrame { closure, ip: 0, stack_offset });
        Ok(())
    }

    fn call_native(&mut self, native: Rc<NativeFunction>, argc: u8) -> Result<(), RuntimeError> {
        if let Some(expected) = native.arity {
            if expected != argc {
                return Err(RuntimeError::ArityMismatch {
                    expected: expected as usize,
                    got: argc as usize,
                });
            }
        }
        let args_start = self.stack.len() - argc as usize;
        let result = (native.func)(&self.stack[args_start..], &self.interner)?;
        self.stack.truncate(args_start - 1);
        self.push(result);
        Ok(())
    }

    fn op_closure(&mut self) {
        let constant = self.read_constant();
        let proto = match constant {
            Value::Object(Object::Function(proto)) => proto,
            _ => unreachable!("compiler only emits CLOSURE over a Function constant"),
        };
        let mut upvalues = Vec::with_capacity(proto.upvalue_count as usize);
        for _ in 0..proto.upvalue_count {
            let is_local = self.read_byte() == 1;
            let index = self.read_byte() as usize;
            if is_local {
                let slot = self.frame().stack_offset + index;
                upvalues.push(self.capture_upvalue(slot));
            } else {
                upvalues.push(Rc::clone(&self.frame().closure.upvalues[index]));
            }
        }
        self.push(Value::closure(Rc::new(Closure { proto, upvalues })));
    }

    // ---- upvalues -----------------------------------------------

    /// Finds or creates the open upvalue for `slot`, keeping
    /// `open_upvalues` sorted by descending slot (§4.4.5, §9).
    fn capture_upvalue(&mut self, slot: usize) -> UpvalueHandle {
        let insert_at = self.open_upvalues.iter().position(|uv| uv.borrow().slot <= slot);
        if let Some(pos) = insert_at {
            if self.open_upvalues[pos].borrow().slot == slot {
                return Rc::clone(&self.open_upvalues[pos]);
            }
            let upvalue = Rc::new(RefCell::new(Upvalue::new_open(slot)));
            self.open_upvalues.insert(pos, Rc::clone(&upvalue));
            return upvalue;
        }
        let upvalue = Rc::new(RefCell::new(Upvalue::new_open(slot)));
        self.open_upvalues.push(Rc::clone(&upvalue));
        upvalue
    }

    /// Evacuates every open upvalue at or above `from_slot` into its own
    /// cell and unlinks it, per `RETURN` and block-exit semantics (§4.4.5).
    fn close_upvalues(&mut self, from_slot: usize) {
        while let Some(top) = self.open_upvalues.first() {
            let slot = top.borrow().slot;
            if slot < from_slot {
                break;
            }
            let value = self.stack[slot].clone();
            let upvalue = self.open_upvalues.remove(0);
            upvalue.borrow_mut().closed = Some(value);
        }
    }

    fn upvalue_get(&self, handle: &UpvalueHandle) -> Value {
        let uv = handle.borrow();
        match &uv.closed {
            Some(v) => v.clone(),
            None => self.stack[uv.slot].clone(),
        }
    }

    fn upvalue_set(&mut self, handle: &UpvalueHandle, value: Value) {
        let is_open = handle.borrow().closed.is_none();
        if is_open {
            let slot = handle.borrow().slot;
            self.stack[slot] = value;
        } else {
            handle.borrow_mut().closed = Some(value);
        }
    }
}

/// The language's to-string rule, shared by `PRINT` and string-concatenating
/// `ADD` (§4.4.3). Numbers use Rust's shortest round-tripping `f64` format,
/// which already omits a trailing `.0` for whole numbers.
pub(crate) fn display_value(value: &Value, interner: &Interner) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            let mut s = String::new();
            write!(s, "{}", n).unwrap();
            s
        }
        Value::Object(Object::Str(sym)) => interner.resolve(*sym).to_string(),
        Value::Object(Object::Function(proto)) => format!("<fn {}>", interner.resolve(proto.name)),
        Value::Object(Object::Closure(closure)) => {
            format!("<fn {}>", interner.resolve(closure.proto.name))
        }
        Value::Object(Object::Native(native)) => {
            format!("<native fn {}>", interner.resolve(native.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::lexer::Lexer;
    use crate::symbol::new_shared_interner;
    use rstest::rstest;

    fn run_source(source: &str) -> Result<String, Diagnostic> {
        let interner = new_shared_interner();
        let tokens = Lexer::new(source).tokenize();
        let output = compile(&tokens, interner.clone()).expect("compiles without error");
        let mut vm = Vm::new(interner);
        vm.load(output.script, output.const_globals);
        let mut buf = Vec::new();
        vm.run(&mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run_source("print(1 + 2 * 3);").unwrap(), "7\n");
    }

    #[test]
    fn variable_reassignment() {
        assert_eq!(run_source("let x = 10; x = x + 5; print(x);").unwrap(), "15\n");
    }

    #[test]
    fn const_string_concatenation() {
        assert_eq!(run_source("const s = \"a\"; print(s + \"b\");").unwrap(), "ab\n");
    }

    #[test]
    fn recursive_fibonacci() {
        let src = "fn f(n) { if (n < 2) return n; return f(n-1) + f(n-2); } print(f(10));";
        assert_eq!(run_source(src).unwrap(), "55\n");
    }

    #[test]
    fn closures_share_captured_state() {
        let src = "fn makeCounter() { let i = 0; fn c() { i = i + 1; return i; } return c; } \
                    let c = makeCounter(); print(c()); print(c()); print(c());";
        assert_eq!(run_source(src).unwrap(), "1\n2\n3\n");
    }

    #[test]
    fn while_loop_prints_range() {
        assert_eq!(
            run_source("let i = 0; while (i < 3) { print(i); i = i + 1; }").unwrap(),
            "0\n1\n2\n"
        );
    }

    #[rstest]
    #[case("print(1 / 0);", "Division by zero")]
    #[case("print(missing);", "Undefined variable")]
    #[case("const x = 1; x = 2;", "const")]
    #[case("let x = 1; x();", "Can only call")]
    #[case("fn f() { return f(); } f();", "Stack overflow")]
    fn runtime_errors_report_the_expected_message(
        #[case] source: &str,
        #[case] expected_substring: &str,
    ) {
        let err = run_source(source).unwrap_err();
        assert!(
            err.message.contains(expected_substring),
            "expected '{expected_substring}' in '{}'",
            err.message
        );
    }

    #[test]
    fn nested_call_runtime_error_includes_full_frame_trace() {
        use pretty_assertions::assert_eq;
        let src = "fn inner() { return 1 / 0; }\nfn outer() { return inner(); }\nouter();";
        let err = run_source(src).unwrap_err();
        let names: Vec<&str> =
            err.trace.iter().map(|frame| frame.rsplit("in ").next().unwrap()).collect();
        assert_eq!(names, vec!["inner", "outer", "script"]);
    }

    #[test]
    fn and_short_circuits_without_evaluating_right() {
        let src = "fn boom() { print(\"evaluated\"); return true; } print(false and boom());";
        assert_eq!(run_source(src).unwrap(), "false\n");
    }

    #[test]
    fn or_short_circuits_without_evaluating_right() {
        let src = "fn boom() { print(\"evaluated\"); return true; } print(true or boom());";
        assert_eq!(run_source(src).unwrap(), "true\n");
    }

    #[test]
    fn switch_statement_dispatches_matching_arm() {
        let src = "let x = 2; switch x { 1 -> print(\"one\"); 2 -> print(\"two\"); _ -> print(\"?\"); }";
        assert_eq!(run_source(src).unwrap(), "two\n");
    }

    #[test]
    fn post_increment_yields_pre_update_value() {
        assert_eq!(run_source("let i = 0; print(i++); print(i);").unwrap(), "0\n1\n");
    }

    #[test]
    fn pre_increment_yields_post_update_value() {
        assert_eq!(run_source("let i = 0; print(++i); print(i);").unwrap(), "1\n1\n");
    }

    #[test]
    fn for_loop_runs_init_cond_body_incr_in_order() {
        assert_eq!(
            run_source("for (let i = 0; i < 3; i = i + 1) { print(i); }").unwrap(),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn break_exits_the_innermost_loop() {
        let src = "let i = 0; while (true) { if (i == 2) break; print(i); i = i + 1; }";
        assert_eq!(run_source(src).unwrap(), "0\n1\n");
    }

    #[test]
    fn continue_skips_to_the_next_iteration() {
        let src = "for (let i = 0; i < 4; i = i + 1) { if (i == 2) continue; print(i); }";
        assert_eq!(run_source(src).unwrap(), "0\n1\n3\n");
    }

    #[test]
    fn empty_string_is_falsy_at_runtime() {
        assert_eq!(run_source("if (\"\") { print(\"t\"); } else { print(\"f\"); }").unwrap(), "f\n");
    }

    #[test]
    fn number_printing_omits_trailing_zero() {
        assert_eq!(run_source("print(7.0);").unwrap(), "7\n");
    }

    #[test]
    fn push_script_shares_globals_across_successive_compiles() {
        let interner = new_shared_interner();
        let mut vm = Vm::new(interner.clone());
        vm.install_natives();

        let tokens = Lexer::new("let x = 10;").tokenize();
        let out = compile(&tokens, interner.clone()).unwrap();
        vm.push_script(out.script, out.const_globals);
        let mut buf = Vec::new();
        vm.run(&mut buf).unwrap();

        let tokens = Lexer::new("print(x + 5);").tokenize();
        let out = compile(&tokens, interner.clone()).unwrap();
        vm.push_script(out.script, out.const_globals);
        let mut buf = Vec::new();
        vm.run(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "15\n");
    }

    #[test]
    fn push_script_keeps_globals_after_a_runtime_error_on_an_earlier_line() {
        let interner = new_shared_interner();
        let mut vm = Vm::new(interner.clone());
        vm.install_natives();

        let tokens = Lexer::new("const x = 1; print(1 / 0);").tokenize();
        let out = compile(&tokens, interner.clone()).unwrap();
        vm.push_script(out.script, out.const_globals);
        let mut buf = Vec::new();
        assert!(vm.run(&mut buf).is_err());

        let tokens = Lexer::new("print(x);").tokenize();
        let out = compile(&tokens, interner.clone()).unwrap();
        vm.push_script(out.script, out.const_globals);
        let mut buf = Vec::new();
        vm.run(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1\n");
    }
}
