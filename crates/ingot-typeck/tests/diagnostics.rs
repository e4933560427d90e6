//! Error-message contract tests.
//!
//! The rendered form of every `TypeError` variant is part of the engine's
//! public contract -- callers surface these strings verbatim -- so each one
//! is pinned here exactly.

use ingot_types::{Row, RowScope, Ty, TyVar};
use ingot_typeck::TypeError;

#[test]
fn mismatch_renders_expected_then_got() {
    let err = TypeError::Mismatch {
        expected: Ty::u32(),
        got: Ty::bool(),
    };
    assert_eq!(err.to_string(), "type mismatch: expected u32, got bool");
}

#[test]
fn mismatch_renders_constructor_printing() {
    let err = TypeError::Mismatch {
        expected: Ty::fun(vec![Ty::ptr(Ty::u8())], Ty::unit()),
        got: Ty::Tuple(vec![Ty::char(), Ty::array(Ty::u32(), 2)]),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"type mismatch: expected fn(Ptr<u8>) -> unit, got (char, [u32; 2])"
    );
}

#[test]
fn recursive_type_renders_bare() {
    let err = TypeError::RecursiveType {
        var: TyVar(0),
        ty: Ty::fun(vec![Ty::Var(TyVar(0))], Ty::u32()),
    };
    assert_eq!(err.to_string(), "recursive type");
}

#[test]
fn unbound_variable_quotes_name() {
    let err = TypeError::UnboundVariable { name: "x".into() };
    assert_eq!(err.to_string(), "unbound variable: \"x\"");
}

#[test]
fn attribute_errors_quote_attr_and_struct() {
    let missing = TypeError::MissingAttribute {
        attr: "k".into(),
        struct_name: "S".into(),
    };
    assert_eq!(missing.to_string(), "missing attribute \"k\" for struct \"S\"");

    let extraneous = TypeError::ExtraneousAttribute {
        attr: "k".into(),
        struct_name: "S".into(),
    };
    assert_eq!(
        extraneous.to_string(),
        "extraneous attribute \"k\" for struct \"S\""
    );

    let unknown = TypeError::UnknownAttribute {
        attr: "k".into(),
        struct_name: "S".into(),
    };
    assert_eq!(
        unknown.to_string(),
        "attribute \"k\" does not exist on struct \"S\""
    );
}

#[test]
fn undeclared_struct_quotes_name() {
    let err = TypeError::UndeclaredStruct { name: "S".into() };
    assert_eq!(err.to_string(), "undeclared struct \"S\"");
}

#[test]
fn no_matching_struct_prints_partial_type() {
    let row = Row::new(
        vec![("x".into(), Ty::u32()), ("w".into(), Ty::Var(TyVar(4)))],
        TyVar(9),
        RowScope::Instance,
    );
    let err = TypeError::NoMatchingStruct {
        ty: Ty::partial(row),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"no struct declaration matches type {x: u32, w: ?4, ..}"
    );
}

#[test]
fn return_outside_function_message() {
    assert_eq!(
        TypeError::ReturnOutsideFunction.to_string(),
        "'return' used outside of a function"
    );
}

#[test]
fn impl_for_unknown_type_quotes_name() {
    let err = TypeError::ImplForUnknownType { name: "T".into() };
    assert_eq!(err.to_string(), "cannot implement for unknown type \"T\"");
}

#[test]
fn type_display_snapshots() {
    insta::assert_snapshot!(format!("{}", Ty::unit()), @"unit");
    insta::assert_snapshot!(format!("{}", Ty::ptr(Ty::string())), @"Ptr<string>");
    insta::assert_snapshot!(
        format!("{}", Ty::fun(vec![Ty::u32(), Ty::bool()], Ty::named("Point"))),
        @"fn(u32, bool) -> Point"
    );
    insta::assert_snapshot!(
        format!(
            "{}",
            Ty::partial(Row::new(vec![], TyVar(3), RowScope::Instance))
        ),
        @"{..}"
    );
}
