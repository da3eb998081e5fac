use sable_opt::{CompilerStats, ConstantFolding, OptFlags, Optimization, OptimizerCfg};
use hir_ssa::{
    BinaryOp, BlockId, ComparisonBias, DataType, Graph, IfCondition, InstId, InstKind, Literal,
    MethodCompilationStat, Term,
};

fn returned(g: &Graph, b: BlockId) -> Option<InstId> {
    match g.blocks[b].end {
        Term::Return { value, .. } => value,
        _ => None,
    }
}

/// entry: if cond -> t, f; t and f return `x`.
fn branch_on(
    build: impl FnOnce(&mut Graph) -> (InstId, InstId),
) -> (Graph, InstId, [BlockId; 2]) {
    let mut g = Graph::new();
    let [t, f] = [g.add_block(), g.add_block()];
    let exit = g.add_exit_block();
    let (x, cond) = build(&mut g);
    g.set_term(g.entry, Term::If {
        cond,
        if_true: t,
        if_false: f,
    });
    g.set_term(t, Term::Return {
        value: Some(x),
        exit,
    });
    g.set_term(f, Term::Return {
        value: Some(x),
        exit,
    });
    g.finish().unwrap();
    (g, x, [t, f])
}

fn fold(g: &mut Graph) -> (bool, CompilerStats) {
    let cfg = OptimizerCfg::default();
    let mut stats = CompilerStats::default();
    let changed = ConstantFolding::new(&cfg, Some(&mut stats)).run(g);
    (changed, stats)
}

#[test]
fn branch_value_reaches_dominated_uses_only() {
    // v = call(); if v { return v ? 1 : 2 } else { return v }
    let mut g = Graph::new();
    let [t, f] = [g.add_block(), g.add_block()];
    let exit = g.add_exit_block();
    let entry = g.entry;
    let v = g.add_inst(
        entry,
        InstKind::Invoke {
            method: 0,
            args: vec![],
        },
        DataType::Bool,
    );
    let [one, two] = [g.int_constant(1), g.int_constant(2)];
    g.set_term(entry, Term::If {
        cond: v,
        if_true: t,
        if_false: f,
    });
    let select = g.add_inst(
        t,
        InstKind::Select {
            cond: v,
            if_true: one,
            if_false: two,
        },
        DataType::Int32,
    );
    g.set_term(t, Term::Return {
        value: Some(select),
        exit,
    });
    g.set_term(f, Term::Return {
        value: Some(v),
        exit,
    });
    g.finish().unwrap();

    let (changed, stats) = fold(&mut g);
    assert!(changed);
    let InstKind::Select { cond, .. } = g.insts[select].kind else {
        panic!("select was rewritten");
    };
    assert_eq!(g.literal(cond), Some(Literal::Int(1)));
    assert_eq!(returned(&g, f).and_then(|r| g.literal(r)), Some(Literal::Int(0)));
    // the branch itself still tests the call
    assert!(matches!(g.blocks[entry].end, Term::If { cond, .. } if cond == v));
    assert_eq!(stats.get(MethodCompilationStat::PropagatedIfValue), 2);
    g.verify().unwrap();
}

#[test]
fn equality_with_constant_seeds_taken_side() {
    let (mut g, x, [t, f]) = branch_on(|g| {
        let x = g.add_parameter(DataType::Int32);
        let five = g.int_constant(5);
        let entry = g.entry;
        (x, g.add_condition(entry, IfCondition::Eq, x, five))
    });
    fold(&mut g);
    assert_eq!(returned(&g, t).and_then(|r| g.literal(r)), Some(Literal::Int(5)));
    assert_eq!(returned(&g, f), Some(x));
    g.verify().unwrap();
}

#[test]
fn inequality_seeds_false_side() {
    let (mut g, x, [t, f]) = branch_on(|g| {
        let x = g.add_parameter(DataType::Int64);
        let k = g.long_constant(-9);
        let entry = g.entry;
        (x, g.add_condition(entry, IfCondition::Ne, k, x))
    });
    fold(&mut g);
    assert_eq!(returned(&g, t), Some(x));
    assert_eq!(returned(&g, f).and_then(|r| g.literal(r)), Some(Literal::Long(-9)));
}

#[test]
fn floating_equality_is_not_propagated() {
    let (mut g, x, [t, _]) = branch_on(|g| {
        let x = g.add_parameter(DataType::Float32);
        let zero = g.float_constant(0.0);
        let entry = g.entry;
        (x, g.add_condition(entry, IfCondition::Eq, x, zero))
    });
    let (_, stats) = fold(&mut g);
    assert_eq!(returned(&g, t), Some(x));
    assert_eq!(stats.get(MethodCompilationStat::PropagatedIfValue), 0);
}

#[test]
fn boolean_gets_complement_on_other_side() {
    let (mut g, _, [t, f]) = branch_on(|g| {
        let b = g.add_parameter(DataType::Bool);
        let zero = g.int_constant(0);
        let entry = g.entry;
        (b, g.add_condition(entry, IfCondition::Eq, b, zero))
    });
    fold(&mut g);
    assert_eq!(returned(&g, t).and_then(|r| g.literal(r)), Some(Literal::Int(0)));
    assert_eq!(returned(&g, f).and_then(|r| g.literal(r)), Some(Literal::Int(1)));
    g.verify().unwrap();
}

#[test]
fn compare_against_zero_is_unwrapped() {
    // if compare(x, 7L) == 0 { return x }
    let (mut g, _, [t, _]) = branch_on(|g| {
        let x = g.add_parameter(DataType::Int64);
        let seven = g.long_constant(7);
        let zero = g.int_constant(0);
        let entry = g.entry;
        let cmp = g.add_inst(
            entry,
            InstKind::Compare {
                left: x,
                right: seven,
                bias: ComparisonBias::NoBias,
            },
            DataType::Int32,
        );
        (x, g.add_condition(entry, IfCondition::Eq, cmp, zero))
    });
    fold(&mut g);
    assert_eq!(returned(&g, t).and_then(|r| g.literal(r)), Some(Literal::Long(7)));
}

#[test]
fn propagation_can_be_switched_off() {
    let (mut g, x, [t, _]) = branch_on(|g| {
        let x = g.add_parameter(DataType::Int32);
        let five = g.int_constant(5);
        let entry = g.entry;
        (x, g.add_condition(entry, IfCondition::Eq, x, five))
    });
    let cfg = OptimizerCfg::with_flags(OptFlags::all() - OptFlags::PROPAGATE_IF_VALUES);
    ConstantFolding::new(&cfg, None).run(&mut g);
    assert_eq!(returned(&g, t), Some(x));
}

#[test]
fn floating_multiplication_by_zero_survives() {
    let mut g = Graph::new();
    let exit = g.add_exit_block();
    let x = g.add_parameter(DataType::Float64);
    let zero = g.double_constant(0.0);
    let entry = g.entry;
    let mul = g.add_binary(entry, BinaryOp::Mul, DataType::Float64, x, zero);
    g.set_term(entry, Term::Return {
        value: Some(mul),
        exit,
    });
    g.finish().unwrap();
    let (changed, _) = fold(&mut g);
    assert!(!changed);
    assert!(g.is_live(mul));
}

#[test]
fn absorbing_inputs_collapse() {
    // (x ^ x) | (y * 0)
    let mut g = Graph::new();
    let exit = g.add_exit_block();
    let x = g.add_parameter(DataType::Int32);
    let y = g.add_parameter(DataType::Int32);
    let zero = g.int_constant(0);
    let entry = g.entry;
    let xor = g.add_binary(entry, BinaryOp::Xor, DataType::Int32, x, x);
    let mul = g.add_binary(entry, BinaryOp::Mul, DataType::Int32, y, zero);
    let or = g.add_binary(entry, BinaryOp::Or, DataType::Int32, xor, mul);
    g.set_term(entry, Term::Return {
        value: Some(or),
        exit,
    });
    g.finish().unwrap();
    let (_, stats) = fold(&mut g);
    assert_eq!(returned(&g, entry).and_then(|r| g.literal(r)), Some(Literal::Int(0)));
    assert_eq!(stats.get(MethodCompilationStat::SimplifiedAbsorbingInput), 2);
    assert_eq!(stats.get(MethodCompilationStat::ConstantFolded), 1);
    g.verify().unwrap();
}

#[test]
fn second_sweep_changes_nothing() {
    let (mut g, _, _) = branch_on(|g| {
        let x = g.add_parameter(DataType::Int32);
        let [a, b] = [g.int_constant(6), g.int_constant(7)];
        let entry = g.entry;
        let prod = g.add_binary(entry, BinaryOp::Mul, DataType::Int32, a, b);
        let sum = g.add_binary(entry, BinaryOp::Add, DataType::Int32, x, prod);
        (sum, g.add_condition(entry, IfCondition::Lt, sum, x))
    });
    assert!(fold(&mut g).0);
    let first = g.to_string();
    assert!(!fold(&mut g).0);
    assert_eq!(g.to_string(), first);
}

/// Folds a single-block method returning whatever `build` produces.
fn fold_returned(build: impl FnOnce(&mut Graph) -> InstId) -> (Graph, Option<Literal>, CompilerStats) {
    let mut g = Graph::new();
    let exit = g.add_exit_block();
    let v = build(&mut g);
    g.set_term(g.entry, Term::Return {
        value: Some(v),
        exit,
    });
    g.finish().unwrap();
    let (_, stats) = fold(&mut g);
    g.verify().unwrap();
    let lit = returned(&g, g.entry).and_then(|r| g.literal(r));
    (g, lit, stats)
}

#[test]
fn unsigned_tests_against_zero_are_decided() {
    // (condition, zero on the left, outcome)
    let cases = [
        (IfCondition::A, true, Some(false)),
        (IfCondition::Ae, false, Some(true)),
        (IfCondition::B, false, Some(false)),
        (IfCondition::Be, true, Some(true)),
        (IfCondition::A, false, None),
        (IfCondition::B, true, None),
    ];
    for (cond, zero_left, outcome) in cases {
        let (_, lit, stats) = fold_returned(|g| {
            let x = g.add_parameter(DataType::Int32);
            let zero = g.int_constant(0);
            let (l, r) = if zero_left { (zero, x) } else { (x, zero) };
            let entry = g.entry;
            g.add_condition(entry, cond, l, r)
        });
        assert_eq!(lit, outcome.map(Literal::bool), "{cond:?}, zero left: {zero_left}");
        assert_eq!(
            stats.get(MethodCompilationStat::SimplifiedAbsorbingInput),
            usize::from(outcome.is_some())
        );
    }
}

#[test]
fn and_with_own_complement_is_zero() {
    let (_, lit, stats) = fold_returned(|g| {
        let x = g.add_parameter(DataType::Int64);
        let entry = g.entry;
        let not = g.add_inst(
            entry,
            InstKind::Unary {
                op: hir_ssa::UnaryOp::Not,
                input: x,
            },
            DataType::Int64,
        );
        g.add_binary(entry, BinaryOp::And, DataType::Int64, not, x)
    });
    assert_eq!(lit, Some(Literal::Long(0)));
    assert_eq!(stats.get(MethodCompilationStat::SimplifiedAbsorbingInput), 1);
}

#[test]
fn fresh_object_is_never_null() {
    for (cond, outcome) in [(IfCondition::Eq, false), (IfCondition::Ne, true)] {
        let (_, lit, _) = fold_returned(|g| {
            let entry = g.entry;
            let obj = g.add_inst(entry, InstKind::NewInstance { class: 2 }, DataType::Reference);
            let null = g.null_constant();
            g.add_condition(entry, cond, null, obj)
        });
        assert_eq!(lit, Some(Literal::bool(outcome)));
    }
    // a reference parameter may be null
    let (g, lit, _) = fold_returned(|g| {
        let p = g.add_parameter(DataType::Reference);
        let null = g.null_constant();
        let entry = g.entry;
        g.add_condition(entry, IfCondition::Eq, p, null)
    });
    assert_eq!(lit, None);
    let kept = returned(&g, g.entry).map(|r| &g.insts[r].kind);
    assert!(matches!(kept, Some(InstKind::Condition { .. })));
}

#[test]
fn comparison_with_nan_follows_bias() {
    let cases = [
        (ComparisonBias::GtBias, Some(Literal::Int(1))),
        (ComparisonBias::LtBias, Some(Literal::Int(-1))),
        (ComparisonBias::NoBias, None),
    ];
    for (bias, outcome) in cases {
        let (_, lit, _) = fold_returned(|g| {
            let x = g.add_parameter(DataType::Float32);
            let nan = g.float_constant(f32::NAN);
            let entry = g.entry;
            g.add_inst(
                entry,
                InstKind::Compare {
                    left: x,
                    right: nan,
                    bias,
                },
                DataType::Int32,
            )
        });
        assert_eq!(lit, outcome, "{bias:?}");
    }
}
