//! Synthesised type tags and the operator typing matrix.

use std::fmt;

use boreal_syntax::DataType;

/// The tag an expression synthesises while attributes flow up the parse.
///
/// `Error` marks an operand that already produced a diagnostic; it is
/// absorbing, so parents stay quiet instead of cascading messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeTag {
    #[default]
    Empty,
    Integer,
    Logical,
    Str,
    Ok,
    Error,
}

impl TypeTag {
    pub fn is_error(self) -> bool {
        self == TypeTag::Error
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Empty => "",
            TypeTag::Integer => "integer",
            TypeTag::Logical => "logical",
            TypeTag::Str => "string",
            TypeTag::Ok => "type_ok",
            TypeTag::Error => "type_error",
        };
        write!(f, "{name}")
    }
}

impl From<DataType> for TypeTag {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Integer => TypeTag::Integer,
            DataType::Boolean => TypeTag::Logical,
            DataType::String => TypeTag::Str,
            DataType::Void => TypeTag::Empty,
        }
    }
}

/// Binary operators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::And => "and",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::Pow => "**",
        }
    }

    /// The result tag when both operand tags fit the operator's shape.
    /// `None` is a type mismatch the caller reports.
    pub fn result(self, left: TypeTag, right: TypeTag) -> Option<TypeTag> {
        use TypeTag::{Integer, Logical, Str};
        match self {
            BinaryOp::Or | BinaryOp::Xor | BinaryOp::And => {
                (left == Logical && right == Logical).then_some(Logical)
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => (left == Integer && right == Integer).then_some(Logical),
            BinaryOp::Add => match (left, right) {
                (Integer, Integer) => Some(Integer),
                (Str, Str) => Some(Str),
                _ => None,
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
                (left == Integer && right == Integer).then_some(Integer)
            }
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }

    pub fn result(self, operand: TypeTag) -> Option<TypeTag> {
        match self {
            UnaryOp::Not => (operand == TypeTag::Logical).then_some(TypeTag::Logical),
            UnaryOp::Plus | UnaryOp::Minus => {
                (operand == TypeTag::Integer).then_some(TypeTag::Integer)
            }
        }
    }
}
