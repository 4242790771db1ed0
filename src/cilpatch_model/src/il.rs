use serde::{Deserialize, Serialize};

use crate::field::FieldRef;
use crate::handles::InstrId;
use crate::method::MethodRef;
use crate::ty::TypeRef;

/// The subset of the CIL instruction set the engine works with. Short
/// encodings (`ldarg.0`, `br.s`, ...) are normalized to their long forms at
/// the I/O boundary, except `leave.s`, which body editing needs to see.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    Nop,
    Break,
    Ret,
    Dup,
    Pop,
    Throw,
    Rethrow,
    Endfinally,
    Endfilter,
    // branches
    Br,
    Brfalse,
    Brtrue,
    Beq,
    Bge,
    Bgt,
    Ble,
    Blt,
    BneUn,
    BgeUn,
    BgtUn,
    BleUn,
    BltUn,
    Leave,
    LeaveS,
    Switch,
    // arguments and locals
    Ldarg,
    Ldarga,
    Starg,
    Ldloc,
    Ldloca,
    Stloc,
    // constants
    LdcI4,
    LdcI8,
    LdcR4,
    LdcR8,
    Ldstr,
    Ldnull,
    Ldtoken,
    // calls
    Call,
    Callvirt,
    Calli,
    Newobj,
    Ldftn,
    Ldvirtftn,
    // fields
    Ldfld,
    Ldflda,
    Stfld,
    Ldsfld,
    Ldsflda,
    Stsfld,
    // objects and arrays
    Newarr,
    Ldlen,
    Ldelem,
    Ldelema,
    Stelem,
    Box,
    Unbox,
    UnboxAny,
    Castclass,
    Isinst,
    Initobj,
    Ldobj,
    Stobj,
    Sizeof,
    Localloc,
    // arithmetic and logic
    Add,
    Sub,
    Mul,
    Div,
    DivUn,
    Rem,
    RemUn,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    ShrUn,
    Neg,
    Not,
    // comparison
    Ceq,
    Cgt,
    CgtUn,
    Clt,
    CltUn,
    // conversion
    ConvI,
    ConvI1,
    ConvI2,
    ConvI4,
    ConvI8,
    ConvU,
    ConvU1,
    ConvU2,
    ConvU4,
    ConvU8,
    ConvR4,
    ConvR8,
}

/// The operand kind an opcode expects.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OperandKind {
    None,
    Imm,
    Float,
    Str,
    Target,
    Switch,
    Local,
    Param,
    Type,
    Field,
    Method,
    CallSite,
}

impl OpCode {
    pub fn operand_kind(self) -> OperandKind {
        use OpCode::*;
        match self {
            Br | Brfalse | Brtrue | Beq | Bge | Bgt | Ble | Blt | BneUn | BgeUn | BgtUn
            | BleUn | BltUn | Leave | LeaveS => OperandKind::Target,
            Switch => OperandKind::Switch,
            Ldarg | Ldarga | Starg => OperandKind::Param,
            Ldloc | Ldloca | Stloc => OperandKind::Local,
            LdcI4 | LdcI8 => OperandKind::Imm,
            LdcR4 | LdcR8 => OperandKind::Float,
            Ldstr => OperandKind::Str,
            Call | Callvirt | Newobj | Ldftn | Ldvirtftn => OperandKind::Method,
            Calli => OperandKind::CallSite,
            Ldfld | Ldflda | Stfld | Ldsfld | Ldsflda | Stsfld => OperandKind::Field,
            Newarr | Ldelem | Ldelema | Stelem | Box | Unbox | UnboxAny | Castclass | Isinst
            | Initobj | Ldobj | Stobj | Sizeof | Ldtoken => OperandKind::Type,
            _ => OperandKind::None,
        }
    }

    pub fn is_branch(self) -> bool {
        matches!(
            self.operand_kind(),
            OperandKind::Target | OperandKind::Switch
        )
    }

    /// `ldarg` / `ldarga` / `starg`: the instructions whose operand names an
    /// argument slot.
    pub fn is_ldarg_family(self) -> bool {
        matches!(self, OpCode::Ldarg | OpCode::Ldarga | OpCode::Starg)
    }

    pub fn is_field_load(self) -> bool {
        matches!(self, OpCode::Ldfld | OpCode::Ldsfld)
    }

    pub fn is_field_store(self) -> bool {
        matches!(self, OpCode::Stfld | OpCode::Stsfld)
    }

    pub fn is_field_load_address(self) -> bool {
        matches!(self, OpCode::Ldflda | OpCode::Ldsflda)
    }

    /// Whether `operand` is legal for this opcode. The `ldarg` family also
    /// accepts a literal immediate (the receiver slot of an instance method),
    /// and `ldtoken` accepts any of the three member reference kinds.
    pub fn accepts(self, operand: &Operand) -> bool {
        if self == OpCode::Ldtoken {
            return matches!(
                operand.kind(),
                OperandKind::Type | OperandKind::Field | OperandKind::Method
            );
        }
        if self.is_ldarg_family() && operand.kind() == OperandKind::Imm {
            return true;
        }
        operand.kind() == self.operand_kind()
    }
}

/// Instruction operand, one variant per operand kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    None,
    Imm(i64),
    Float(f64),
    Str(String),
    Target(InstrId),
    Switch(Vec<InstrId>),
    Local(u16),
    Param(u16),
    Type(TypeRef),
    Field(FieldRef),
    Method(MethodRef),
    CallSite(CallSite),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::None => OperandKind::None,
            Operand::Imm(_) => OperandKind::Imm,
            Operand::Float(_) => OperandKind::Float,
            Operand::Str(_) => OperandKind::Str,
            Operand::Target(_) => OperandKind::Target,
            Operand::Switch(_) => OperandKind::Switch,
            Operand::Local(_) => OperandKind::Local,
            Operand::Param(_) => OperandKind::Param,
            Operand::Type(_) => OperandKind::Type,
            Operand::Field(_) => OperandKind::Field,
            Operand::Method(_) => OperandKind::Method,
            Operand::CallSite(_) => OperandKind::CallSite,
        }
    }
}

/// Signature descriptor for `calli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub return_type: TypeRef,
    pub params: Vec<TypeRef>,
    pub has_this: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstrId,
    pub op: OpCode,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(id: InstrId, op: OpCode, operand: Operand) -> Instruction {
        debug_assert!(op.accepts(&operand), "operand kind mismatch for {op:?}");
        Instruction { id, op, operand }
    }
}
