use model::{
    AttrValue, CustomAttribute, ExternalMethodRef, MethodBody, MethodDef, MethodFlags, MethodId,
    MethodRef, ModuleGraph, ModuleId, NamedArg, OpCode, Operand, Parameter, TypeRef,
};

pub const PLUG_ATTRIBUTE: &str = "Cosmos.Build.API.Attributes.PlugAttribute";
pub const PLUG_MEMBER_ATTRIBUTE: &str = "Cosmos.Build.API.Attributes.PlugMemberAttribute";
pub const PLATFORM_SPECIFIC_ATTRIBUTE: &str =
    "Cosmos.Build.API.Attributes.PlatformSpecificAttribute";

/// Opt into engine logs for a test run (`RUST_LOG=debug cargo test`).
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
    log::debug!("test logging initialized");
}

pub struct TestAssemblies {
    pub graph: ModuleGraph,
    pub target: ModuleId,
    pub plugs: ModuleId,
}

pub fn assemblies() -> TestAssemblies {
    let mut graph = ModuleGraph::new();
    let target = graph.add_module("Target.dll", "Target");
    let plugs = graph.add_module("Plugs.dll", "Plugs");
    TestAssemblies {
        graph,
        target,
        plugs,
    }
}

fn attribute(full_name: &str) -> CustomAttribute {
    CustomAttribute::new(MethodRef::External(ExternalMethodRef {
        declaring: TypeRef::external("Cosmos.Build.API", full_name),
        name: ".ctor".to_string(),
        return_type: TypeRef::void(),
        params: Vec::new(),
        has_this: true,
    }))
}

/// `[Plug("<target>")]`
pub fn plug_attribute(target: &str) -> CustomAttribute {
    let mut attr = attribute(PLUG_ATTRIBUTE);
    attr.args.push(AttrValue::Str(target.to_string()));
    attr
}

/// `[PlugMember]`
pub fn plug_member_attribute() -> CustomAttribute {
    attribute(PLUG_MEMBER_ATTRIBUTE)
}

/// `[PlugMember(Target = "<name>")]`
pub fn plug_member_attribute_named(target: &str) -> CustomAttribute {
    let mut attr = attribute(PLUG_MEMBER_ATTRIBUTE);
    attr.named.push(NamedArg {
        name: "Target".to_string(),
        value: AttrValue::Str(target.to_string()),
    });
    attr
}

/// `[PlatformSpecific(Architecture = <mask>)]`
pub fn platform_attribute(mask: i64) -> CustomAttribute {
    let mut attr = attribute(PLATFORM_SPECIFIC_ATTRIBUTE);
    attr.named.push(NamedArg {
        name: "Architecture".to_string(),
        value: AttrValue::Int(mask),
    });
    attr
}

/// A method definition with positional parameters and, optionally, the
/// static flag set.
pub fn method(name: &str, static_: bool, ret: TypeRef, params: &[(&str, TypeRef)]) -> MethodDef {
    let mut m = MethodDef::new(name, ret);
    if static_ {
        m.flags |= MethodFlags::STATIC;
    }
    for (i, (pname, ty)) in params.iter().enumerate() {
        m.params.push(Parameter::new(i as u16, pname, ty.clone()));
    }
    m
}

/// Builds a body from `(opcode, operand)` pairs, allocating instruction
/// identities from the graph.
pub fn body(graph: &mut ModuleGraph, code: &[(OpCode, Operand)]) -> MethodBody {
    let instructions = code
        .iter()
        .map(|(op, operand)| graph.new_instr(*op, operand.clone()))
        .collect();
    MethodBody {
        instructions,
        ..MethodBody::default()
    }
}

/// Tiny evaluator for the arithmetic subset of bodies the tests build.
/// Arguments are the logical parameter list; the receiver is argument
/// slot 0.
pub fn eval(graph: &ModuleGraph, method: MethodId, receiver: i64, args: &[i64]) -> i64 {
    let body = graph
        .method(method)
        .body
        .as_ref()
        .expect("method under evaluation has a body");
    let index_of = |id| {
        body.instructions
            .iter()
            .position(|i| i.id == id)
            .expect("branch target resolves")
    };
    let mut stack: Vec<i64> = Vec::new();
    let mut pc = 0usize;
    let mut fuel = 10_000;
    while pc < body.instructions.len() {
        fuel -= 1;
        assert!(fuel > 0, "evaluation did not terminate");
        let instr = &body.instructions[pc];
        pc += 1;
        match (instr.op, &instr.operand) {
            (OpCode::Nop, _) => {}
            (OpCode::LdcI4 | OpCode::LdcI8, Operand::Imm(v)) => stack.push(*v),
            (OpCode::Ldarg, Operand::Imm(0)) => stack.push(receiver),
            (OpCode::Ldarg, Operand::Param(k)) => stack.push(args[*k as usize]),
            (OpCode::Add, _) => binop(&mut stack, |a, b| a + b),
            (OpCode::Sub, _) => binop(&mut stack, |a, b| a - b),
            (OpCode::Mul, _) => binop(&mut stack, |a, b| a * b),
            (OpCode::Dup, _) => {
                let top = *stack.last().expect("dup on a value");
                stack.push(top);
            }
            (OpCode::Pop, _) => {
                stack.pop();
            }
            (OpCode::Br, Operand::Target(t)) => pc = index_of(*t),
            (OpCode::Brtrue, Operand::Target(t)) => {
                if stack.pop().expect("brtrue on a value") != 0 {
                    pc = index_of(*t);
                }
            }
            (OpCode::Brfalse, Operand::Target(t)) => {
                if stack.pop().expect("brfalse on a value") == 0 {
                    pc = index_of(*t);
                }
            }
            (OpCode::Ret, _) => return stack.pop().unwrap_or(0),
            (op, operand) => panic!("evaluator does not model {op:?} {operand:?}"),
        }
    }
    panic!("body fell off the end without a ret");
}

fn binop(stack: &mut Vec<i64>, f: impl Fn(i64, i64) -> i64) {
    let b = stack.pop().expect("binary op right operand");
    let a = stack.pop().expect("binary op left operand");
    stack.push(f(a, b));
}

/// Structural shape of a body, with branch targets rendered as positions so
/// two clones of the same code compare equal.
pub fn body_shape(graph: &ModuleGraph, method: MethodId) -> Vec<String> {
    let body = graph.method(method).body.as_ref().expect("body");
    let index_of = |id| body.instructions.iter().position(|i| i.id == id);
    body.instructions
        .iter()
        .map(|i| match &i.operand {
            Operand::Target(t) => format!("{:?} -> {:?}", i.op, index_of(*t)),
            Operand::Switch(ts) => {
                let targets: Vec<_> = ts.iter().map(|t| index_of(*t)).collect();
                format!("{:?} -> {targets:?}", i.op)
            }
            other => format!("{:?} {other:?}", i.op),
        })
        .collect()
}
