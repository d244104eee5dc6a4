use pretty_assertions::assert_eq;

use vesper_ir::{GuardId, LabelId, PatternKind, RelOp, Span, TypeId};

use crate::test_helpers::Fixture;
use crate::vars::VarTable;

use super::*;

// Helpers

fn first_line(fx: &mut Fixture, input_ty: TypeId, test: DagTest) -> String {
    let pat = fx.pat(PatternKind::Discard);
    let clauses = [Clause::new(pat, LabelId::new(0), Span::new(1, 2))];
    let temps = TempTable::new(input_ty);
    let vars = VarTable::new();
    let mut arena = DagArena::new();
    let yes = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
    let no = arena.leaf(LeafLabel::Fail);
    let root = arena.intern(DagNode::Test {
        input: TempId::INPUT,
        test,
        when_true: yes,
        when_false: no,
    });
    let text = dump(&fx.env(), &arena, root, &temps, &vars, &clauses);
    text.lines().next().unwrap().to_owned()
}

// Rendering

#[test]
fn constants_render_in_source_form() {
    let mut fx = Fixture::new();
    let hi = fx.name("hi");
    let cases = [
        (TypeId::OBJECT, ConstValue::Null, "[0]: t0 == null ? [1] : [2]"),
        (TypeId::BOOL, ConstValue::Bool(true), "[0]: t0 == true ? [1] : [2]"),
        (TypeId::INT, ConstValue::Int(42), "[0]: t0 == 42 ? [1] : [2]"),
        (
            TypeId::FLOAT,
            ConstValue::from_f64(1.5),
            "[0]: t0 == 1.5 ? [1] : [2]",
        ),
        (
            TypeId::FLOAT,
            ConstValue::from_f64(f64::NAN),
            "[0]: t0 == NaN ? [1] : [2]",
        ),
        (TypeId::CHAR, ConstValue::Char('x'), "[0]: t0 == 'x' ? [1] : [2]"),
        (
            TypeId::STR,
            ConstValue::Str(hi),
            r#"[0]: t0 == "hi" ? [1] : [2]"#,
        ),
    ];
    for (ty, value, expected) in cases {
        assert_eq!(first_line(&mut fx, ty, DagTest::Const(value)), expected);
    }
}

#[test]
fn tests_render_their_shapes() {
    let mut fx = Fixture::new();
    let cases = [
        (DagTest::Type(TypeId::STR), "[0]: t0 is str ? [1] : [2]"),
        (DagTest::NonNull, "[0]: t0 != null ? [1] : [2]"),
        (DagTest::Null, "[0]: t0 == null ? [1] : [2]"),
        (
            DagTest::Relational(RelOp::Ge, ConstValue::Int(10)),
            "[0]: t0 >= 10 ? [1] : [2]",
        ),
        (
            DagTest::Relational(RelOp::Le, ConstValue::Char('a')),
            "[0]: t0 <= 'a' ? [1] : [2]",
        ),
        (
            DagTest::Guard(GuardId::new(3)),
            "[0]: when <g3> ? [1] : [2]",
        ),
        (DagTest::Never, "[0]: never ? [1] : [2]"),
    ];
    for (test, expected) in cases {
        assert_eq!(first_line(&mut fx, TypeId::OBJECT, test), expected);
    }
}

#[test]
fn evals_render_their_outputs() {
    let mut fx = Fixture::new();
    let point_name = fx.name("Point");
    let point = fx.types.add_class(point_name, None, []);
    let x_prop = {
        let n = fx.name("X");
        fx.symbols.add_property(n, TypeId::INT)
    };
    let dec = fx.symbols.add_deconstruct([TypeId::INT, TypeId::STR]);
    let pat = fx.pat(PatternKind::Discard);
    let clauses = [Clause::new(pat, LabelId::new(0), Span::new(1, 2))];

    // Interning order deliberately differs from evaluation order; the
    // printed numbers follow first appearance in the dump, not the table.
    let mut temps = TempTable::new(TypeId::OBJECT);
    let t0 = temps.input();
    let cast = temps.intern(DagOp::Cast(point), t0, 0, point);
    let _first = temps.intern(DagOp::Deconstruct(dec), cast, 0, TypeId::INT);
    let _second = temps.intern(DagOp::Deconstruct(dec), cast, 1, TypeId::STR);
    let _x = temps.intern(DagOp::Property(x_prop), cast, 0, TypeId::INT);

    let vars = VarTable::new();
    let mut arena = DagArena::new();
    let leaf = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
    let dec_eval = arena.intern(DagNode::Eval {
        input: cast,
        op: DagOp::Deconstruct(dec),
        next: leaf,
    });
    let prop_eval = arena.intern(DagNode::Eval {
        input: cast,
        op: DagOp::Property(x_prop),
        next: dec_eval,
    });
    let cast_eval = arena.intern(DagNode::Eval {
        input: t0,
        op: DagOp::Cast(point),
        next: prop_eval,
    });

    assert_eq!(
        dump(&fx.env(), &arena, cast_eval, &temps, &vars, &clauses),
        "[0]: t1 = (Point)t0; [1]\n\
         [1]: t2 = t1.X; [2]\n\
         [2]: (t3, t4) = t1.Deconstruct(); [3]\n\
         [3]: leaf `case 0`\n"
    );
}

#[test]
fn single_output_deconstruct_keeps_parentheses() {
    let mut fx = Fixture::new();
    let dec = fx.symbols.add_deconstruct([TypeId::INT]);
    let pat = fx.pat(PatternKind::Discard);
    let clauses = [Clause::new(pat, LabelId::new(0), Span::new(1, 2))];

    let mut temps = TempTable::new(TypeId::OBJECT);
    let t0 = temps.input();
    let _out = temps.intern(DagOp::Deconstruct(dec), t0, 0, TypeId::INT);

    let vars = VarTable::new();
    let mut arena = DagArena::new();
    let leaf = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
    let root = arena.intern(DagNode::Eval {
        input: t0,
        op: DagOp::Deconstruct(dec),
        next: leaf,
    });

    assert_eq!(
        dump(&fx.env(), &arena, root, &temps, &vars, &clauses),
        "[0]: (t1) = t0.Deconstruct(); [1]\n\
         [1]: leaf `case 0`\n"
    );
}

#[test]
fn temps_number_by_first_appearance() {
    let mut fx = Fixture::new();
    let point_name = fx.name("Point");
    let point = fx.types.add_class(point_name, None, []);
    let x_prop = {
        let n = fx.name("X");
        fx.symbols.add_property(n, TypeId::INT)
    };
    let y_prop = {
        let n = fx.name("Y");
        fx.symbols.add_property(n, TypeId::INT)
    };
    let pat = fx.pat(PatternKind::Discard);
    let clauses = [Clause::new(pat, LabelId::new(0), Span::new(1, 2))];

    // `Y`'s temp is interned first but appears second in the dump.
    let mut temps = TempTable::new(point);
    let t0 = temps.input();
    let _y = temps.intern(DagOp::Property(y_prop), t0, 0, TypeId::INT);
    let _x = temps.intern(DagOp::Property(x_prop), t0, 0, TypeId::INT);

    let vars = VarTable::new();
    let mut arena = DagArena::new();
    let leaf = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
    let fail = arena.leaf(LeafLabel::Fail);
    let x_eval = arena.intern(DagNode::Eval {
        input: t0,
        op: DagOp::Property(x_prop),
        next: leaf,
    });
    let y_eval = arena.intern(DagNode::Eval {
        input: t0,
        op: DagOp::Property(y_prop),
        next: fail,
    });
    let root = arena.intern(DagNode::Test {
        input: t0,
        test: DagTest::NonNull,
        when_true: x_eval,
        when_false: y_eval,
    });

    assert_eq!(
        dump(&fx.env(), &arena, root, &temps, &vars, &clauses),
        "[0]: t0 != null ? [1] : [3]\n\
         [1]: t1 = t0.X; [2]\n\
         [2]: leaf `case 0`\n\
         [3]: t2 = t0.Y; [4]\n\
         [4]: leaf <fail>\n"
    );
}

#[test]
fn nodes_number_in_preorder() {
    let mut fx = Fixture::new();
    let a = fx.pat(PatternKind::Constant {
        value: ConstValue::Char('a'),
    });
    let b = fx.pat(PatternKind::Constant {
        value: ConstValue::Char('b'),
    });
    let c = fx.pat(PatternKind::Constant {
        value: ConstValue::Char('c'),
    });
    let bc = fx.pat(PatternKind::Disjunction { left: b, right: c });
    let p = fx.pat(PatternKind::Disjunction { left: a, right: bc });
    let clauses = [Clause::new(p, LabelId::new(0), Span::new(1, 2))];
    let (dag, _diags) = fx.compile(TypeId::CHAR, &clauses);

    let text = dag.dump(&fx.env());
    assert_eq!(text.lines().count(), dag.arena().len());
    for (i, line) in text.lines().enumerate() {
        assert!(line.starts_with(&format!("[{i}]: ")), "line {i}: {line}");
    }
}

#[test]
fn repeated_compilation_renders_identically() {
    let mut fx = Fixture::new();
    let a = fx.pat(PatternKind::Constant {
        value: ConstValue::Char('a'),
    });
    let b = fx.pat(PatternKind::Constant {
        value: ConstValue::Char('b'),
    });
    let ab = fx.pat(PatternKind::Disjunction { left: a, right: b });
    let z = fx.name("z");
    let vz = fx.pat(PatternKind::Var {
        name: z,
        ty: TypeId::CHAR,
    });
    let wild = fx.pat(PatternKind::Discard);
    let clauses = [
        Clause::new(ab, LabelId::new(0), Span::new(1, 2)),
        Clause::guarded(vz, GuardId::new(0), LabelId::new(1), Span::new(3, 4)),
        Clause::new(wild, LabelId::new(2), Span::new(5, 6)),
    ];

    let (first, _diags) = fx.compile(TypeId::CHAR, &clauses);
    let (second, _diags) = fx.compile(TypeId::CHAR, &clauses);
    assert_eq!(first.dump(&fx.env()), second.dump(&fx.env()));
}
