// src/ast/expr.rs

use std::fmt;

/// Unique id for an expression node, assigned by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ExprId(pub i64);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A literal constant.
///
/// Duration and timestamp constants are produced by parser-side folding of
/// `duration(...)` / `timestamp(...)` calls over literals; both are stored as
/// nanosecond counts.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Duration(i64),
    Timestamp(i64),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentExpr {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub operand: Box<Expr>,
    pub field: String,
    /// True for the `has(x.f)` form; the result type is always `bool`.
    pub test_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub function: String,
    /// Receiver for member-style calls (`x.f(y)`); `None` for global calls.
    pub target: Option<Box<Expr>>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListElement {
    pub expr: Expr,
    /// True for optional splat entries (`[?x]`).
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListExpr {
    pub elements: Vec<ListElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Id of the entry itself, distinct from the key and value ids.
    pub id: ExprId,
    pub key: Expr,
    pub value: Expr,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapExpr {
    pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructExprField {
    /// Id of the field initializer, used to locate field-level diagnostics.
    pub id: ExprId,
    pub name: String,
    pub value: Expr,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructExpr {
    /// Possibly-qualified message type name as written in source.
    pub name: String,
    pub fields: Vec<StructExprField>,
}

/// A bounded fold over a list or map range.
///
/// Macro expansion in the parser lowers `e.all(x, p)` and friends into this
/// form; the checker only sees the expanded shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionExpr {
    pub iter_range: Expr,
    pub iter_var: String,
    pub accu_var: String,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(Constant),
    Ident(IdentExpr),
    Select(SelectExpr),
    Call(CallExpr),
    List(ListExpr),
    Map(MapExpr),
    Struct(StructExpr),
    Comprehension(Box<ComprehensionExpr>),
}

impl Default for ExprKind {
    fn default() -> Self {
        ExprKind::Ident(IdentExpr::default())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: impl Into<ExprId>, kind: ExprKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn constant(id: impl Into<ExprId>, constant: Constant) -> Self {
        Self::new(id, ExprKind::Const(constant))
    }

    pub fn int(id: impl Into<ExprId>, value: i64) -> Self {
        Self::constant(id, Constant::Int(value))
    }

    pub fn uint(id: impl Into<ExprId>, value: u64) -> Self {
        Self::constant(id, Constant::Uint(value))
    }

    pub fn double(id: impl Into<ExprId>, value: f64) -> Self {
        Self::constant(id, Constant::Double(value))
    }

    pub fn string(id: impl Into<ExprId>, value: impl Into<String>) -> Self {
        Self::constant(id, Constant::String(value.into()))
    }

    pub fn bool(id: impl Into<ExprId>, value: bool) -> Self {
        Self::constant(id, Constant::Bool(value))
    }

    pub fn null(id: impl Into<ExprId>) -> Self {
        Self::constant(id, Constant::Null)
    }

    pub fn ident(id: impl Into<ExprId>, name: impl Into<String>) -> Self {
        Self::new(id, ExprKind::Ident(IdentExpr { name: name.into() }))
    }

    pub fn select(id: impl Into<ExprId>, operand: Expr, field: impl Into<String>) -> Self {
        Self::new(
            id,
            ExprKind::Select(SelectExpr {
                operand: Box::new(operand),
                field: field.into(),
                test_only: false,
            }),
        )
    }

    pub fn test_only_select(id: impl Into<ExprId>, operand: Expr, field: impl Into<String>) -> Self {
        Self::new(
            id,
            ExprKind::Select(SelectExpr {
                operand: Box::new(operand),
                field: field.into(),
                test_only: true,
            }),
        )
    }

    pub fn call(id: impl Into<ExprId>, function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(
            id,
            ExprKind::Call(CallExpr {
                function: function.into(),
                target: None,
                args,
            }),
        )
    }

    pub fn member_call(
        id: impl Into<ExprId>,
        function: impl Into<String>,
        target: Expr,
        args: Vec<Expr>,
    ) -> Self {
        Self::new(
            id,
            ExprKind::Call(CallExpr {
                function: function.into(),
                target: Some(Box::new(target)),
                args,
            }),
        )
    }

    pub fn list(id: impl Into<ExprId>, elements: Vec<Expr>) -> Self {
        Self::new(
            id,
            ExprKind::List(ListExpr {
                elements: elements
                    .into_iter()
                    .map(|expr| ListElement {
                        expr,
                        optional: false,
                    })
                    .collect(),
            }),
        )
    }

    pub fn map(id: impl Into<ExprId>, entries: Vec<MapEntry>) -> Self {
        Self::new(id, ExprKind::Map(MapExpr { entries }))
    }

    pub fn struct_expr(
        id: impl Into<ExprId>,
        name: impl Into<String>,
        fields: Vec<StructExprField>,
    ) -> Self {
        Self::new(
            id,
            ExprKind::Struct(StructExpr {
                name: name.into(),
                fields,
            }),
        )
    }

    pub fn comprehension(id: impl Into<ExprId>, comprehension: ComprehensionExpr) -> Self {
        Self::new(id, ExprKind::Comprehension(Box::new(comprehension)))
    }
}

impl From<i64> for ExprId {
    fn from(value: i64) -> Self {
        ExprId(value)
    }
}
