use sable_opt::{CompilerStats, DeadCodeElimination, Optimization, OptimizerCfg, optimize};
use hir_ssa::{
    BinaryOp, DataType, Graph, IfCondition, InstFlags, InstKind, MethodCompilationStat, Term,
};

fn dce(g: &mut Graph) -> CompilerStats {
    let cfg = OptimizerCfg::default();
    let mut stats = CompilerStats::default();
    DeadCodeElimination::new(&cfg, Some(&mut stats)).run(g);
    g.verify().unwrap();
    stats
}

#[test]
fn constant_branch_keeps_only_the_taken_side() {
    // entry: if true -> t, f; t, f -> join(phi 10, 20)
    let mut g = Graph::new();
    let [t, f, join] = [g.add_block(), g.add_block(), g.add_block()];
    let exit = g.add_exit_block();
    let yes = g.int_constant(1);
    let [ten, twenty] = [g.int_constant(10), g.int_constant(20)];
    g.set_term(g.entry, Term::If {
        cond: yes,
        if_true: t,
        if_false: f,
    });
    g.set_term(t, Term::Goto(join));
    g.set_term(f, Term::Goto(join));
    let phi = g.add_phi(join, DataType::Int32, vec![ten, twenty]);
    g.set_term(join, Term::Return {
        value: Some(phi),
        exit,
    });
    g.finish().unwrap();

    let stats = dce(&mut g);
    assert_eq!(g.blocks[g.entry].end, Term::Goto(t));
    assert!(g.blocks[f].removed);
    assert!(!g.is_live(phi));
    assert_eq!(g.blocks[t].end, Term::Return {
        value: Some(ten),
        exit
    });
    assert!(!g.is_live(twenty) && !g.is_live(yes));
    assert_eq!(stats.get(MethodCompilationStat::RemovedDeadBlock), 1);
}

#[test]
fn if_chain_is_threaded() {
    // entry: if p -> b1, b2; b1, b2 -> b3(phi 1, 0); b3: if phi -> b4, b5
    let mut g = Graph::new();
    let [b1, b2, b3, b4, b5] = [
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
    ];
    let exit = g.add_exit_block();
    let p = g.add_parameter(DataType::Bool);
    let [one, zero] = [g.int_constant(1), g.int_constant(0)];
    let [hundred, two_hundred] = [g.int_constant(100), g.int_constant(200)];
    g.set_term(g.entry, Term::If {
        cond: p,
        if_true: b1,
        if_false: b2,
    });
    g.set_term(b1, Term::Goto(b3));
    g.set_term(b2, Term::Goto(b3));
    let phi = g.add_phi(b3, DataType::Bool, vec![one, zero]);
    g.set_term(b3, Term::If {
        cond: phi,
        if_true: b4,
        if_false: b5,
    });
    g.set_term(b4, Term::Return {
        value: Some(hundred),
        exit,
    });
    g.set_term(b5, Term::Return {
        value: Some(two_hundred),
        exit,
    });
    g.finish().unwrap();

    let stats = dce(&mut g);
    assert_eq!(stats.get(MethodCompilationStat::SimplifyIf), 1);
    assert!(g.blocks[b3].removed);
    assert_eq!(g.blocks[g.entry].end, Term::If {
        cond: p,
        if_true: b1,
        if_false: b2
    });
    assert_eq!(g.blocks[b1].end, Term::Return {
        value: Some(hundred),
        exit
    });
    assert_eq!(g.blocks[b2].end, Term::Return {
        value: Some(two_hundred),
        exit
    });
    assert_eq!(g.live_blocks().count(), 4);
}

#[test]
fn repeated_test_gets_a_phi_and_is_threaded() {
    // entry: if c -> a, b; a, b -> m; m: if c -> x, y
    let mut g = Graph::new();
    let [a, b, m, x, y] = [
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
    ];
    let exit = g.add_exit_block();
    let c = g.add_parameter(DataType::Bool);
    let v = g.add_parameter(DataType::Int32);
    let entry = g.entry;
    g.set_term(entry, Term::If {
        cond: c,
        if_true: a,
        if_false: b,
    });
    g.set_term(a, Term::Goto(m));
    g.set_term(b, Term::Goto(m));
    g.set_term(m, Term::If {
        cond: c,
        if_true: x,
        if_false: y,
    });
    let neg = g.add_inst(
        x,
        InstKind::Unary {
            op: hir_ssa::UnaryOp::Neg,
            input: v,
        },
        DataType::Int32,
    );
    g.set_term(x, Term::Return {
        value: Some(neg),
        exit,
    });
    g.set_term(y, Term::Return {
        value: Some(v),
        exit,
    });
    g.finish().unwrap();

    let stats = dce(&mut g);
    assert_eq!(stats.get(MethodCompilationStat::SimplifyIfAddedPhi), 1);
    assert_eq!(stats.get(MethodCompilationStat::SimplifyIf), 1);
    // the second test is gone: each arm of the first leads straight to its answer
    assert!(g.blocks[m].removed);
    let ifs = g
        .live_blocks()
        .filter(|b| matches!(g.blocks[*b].end, Term::If { .. }))
        .count();
    assert_eq!(ifs, 1);
}

#[test]
fn always_throwing_path_exits_and_null_check_goes() {
    // entry: if obj == null -> thr, ok
    // thr: call() (always throws); goto join
    // ok: goto join
    // join: nc = null_check obj; return nc.f0
    let mut g = Graph::new();
    let [thr, ok, join] = [g.add_block(), g.add_block(), g.add_block()];
    let exit = g.add_exit_block();
    let obj = g.add_parameter(DataType::Reference);
    let null = g.null_constant();
    let entry = g.entry;
    let is_null = g.add_condition(entry, IfCondition::Eq, obj, null);
    g.set_term(entry, Term::If {
        cond: is_null,
        if_true: thr,
        if_false: ok,
    });
    g.add_inst_with_flags(
        thr,
        InstKind::Invoke {
            method: 1,
            args: vec![],
        },
        DataType::Void,
        InstFlags::ALWAYS_THROWS,
    );
    g.set_term(thr, Term::Goto(join));
    g.set_term(ok, Term::Goto(join));
    let nc = g.add_inst(join, InstKind::NullCheck { input: obj }, DataType::Reference);
    let get = g.add_inst(join, InstKind::FieldGet { obj: nc, field: 0 }, DataType::Int32);
    g.set_term(join, Term::Return {
        value: Some(get),
        exit,
    });
    g.finish().unwrap();

    let stats = dce(&mut g);
    assert_eq!(g.blocks[thr].end, Term::Goto(exit));
    assert!(!g.is_live(nc));
    let InstKind::FieldGet { obj: through, .. } = g.insts[get].kind else {
        panic!("field read rewritten");
    };
    assert_eq!(g.insts[through].kind, InstKind::BoundType { input: obj });
    assert!(!g.can_be_null(through));
    assert_eq!(stats.get(MethodCompilationStat::SimplifyThrowingInvoke), 1);
    assert_eq!(stats.get(MethodCompilationStat::RemovedNullCheck), 1);
}

#[test]
fn dead_branch_inside_loop_rebuilds_loops() {
    // entry -> head(phi i = 0, next); head: if i < 10 -> body, out
    // body: if true -> inc, skip; inc, skip -> latch; latch: next = i + 1; -> head
    let mut g = Graph::new();
    let [head, body, inc, skip, latch, out] = [
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
    ];
    let exit = g.add_exit_block();
    let [zero, one, ten] = [g.int_constant(0), g.int_constant(1), g.int_constant(10)];
    g.set_term(g.entry, Term::Goto(head));
    let i = g.add_phi(head, DataType::Int32, vec![zero, zero]);
    let lt = g.add_condition(head, IfCondition::Lt, i, ten);
    g.set_term(head, Term::If {
        cond: lt,
        if_true: body,
        if_false: out,
    });
    g.set_term(body, Term::If {
        cond: one,
        if_true: inc,
        if_false: skip,
    });
    g.set_term(inc, Term::Goto(latch));
    g.set_term(skip, Term::Goto(latch));
    let next = g.add_binary(latch, BinaryOp::Add, DataType::Int32, i, one);
    g.replace_input(hir_ssa::User::Inst(i), 1, next);
    g.set_term(latch, Term::Goto(head));
    g.set_term(out, Term::Return {
        value: Some(i),
        exit,
    });
    g.finish().unwrap();
    assert!(g.loop_information().is_loop_header(head));

    let stats = dce(&mut g);
    assert!(g.blocks[skip].removed);
    assert_eq!(stats.get(MethodCompilationStat::RemovedDeadBlock), 1);
    assert!(g.is_dominance_fresh());
    let loops = g.loop_information();
    assert!(loops.is_loop_header(head));
    assert!(loops.is_in_loop(body));
    assert!(!loops.is_in_loop(out));
    assert!(g.is_live(i) && g.is_live(next));
}

#[test]
fn irreducible_graph_keeps_its_blocks() {
    // entry: if p -> a, b; a -> b; b: if q -> a, out; out: if true -> r1, r2
    let mut g = Graph::new();
    let [a, b, out, r1, r2] = [
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
        g.add_block(),
    ];
    let exit = g.add_exit_block();
    let p = g.add_parameter(DataType::Bool);
    let q = g.add_parameter(DataType::Bool);
    let yes = g.int_constant(1);
    g.set_term(g.entry, Term::If {
        cond: p,
        if_true: a,
        if_false: b,
    });
    g.set_term(a, Term::Goto(b));
    g.set_term(b, Term::If {
        cond: q,
        if_true: a,
        if_false: out,
    });
    let unused = g.add_inst(
        out,
        InstKind::Unary {
            op: hir_ssa::UnaryOp::Not,
            input: yes,
        },
        DataType::Int32,
    );
    g.set_term(out, Term::If {
        cond: yes,
        if_true: r1,
        if_false: r2,
    });
    g.set_term(r1, Term::Return { value: None, exit });
    g.set_term(r2, Term::Return { value: None, exit });
    g.finish().unwrap();
    assert!(g.has_irreducible_loops());

    let stats = dce(&mut g);
    assert!(!g.blocks[r2].removed);
    assert!(matches!(g.blocks[out].end, Term::If { .. }));
    assert!(!g.is_live(unused));
    assert_eq!(stats.get(MethodCompilationStat::RemovedDeadInstruction), 1);
}

#[test]
fn optimize_runs_both_passes_without_a_sink() {
    // if 3 > 2 { return x } else { return -x }
    let mut g = Graph::new();
    let [t, f] = [g.add_block(), g.add_block()];
    let exit = g.add_exit_block();
    let x = g.add_parameter(DataType::Int32);
    let [three, two] = [g.int_constant(3), g.int_constant(2)];
    let entry = g.entry;
    let gt = g.add_condition(entry, IfCondition::Gt, three, two);
    g.set_term(entry, Term::If {
        cond: gt,
        if_true: t,
        if_false: f,
    });
    g.set_term(t, Term::Return {
        value: Some(x),
        exit,
    });
    let neg = g.add_inst(
        f,
        InstKind::Unary {
            op: hir_ssa::UnaryOp::Neg,
            input: x,
        },
        DataType::Int32,
    );
    g.set_term(f, Term::Return {
        value: Some(neg),
        exit,
    });
    g.finish().unwrap();

    assert!(optimize(&mut g, &OptimizerCfg::default(), None).unwrap());
    assert!(g.blocks[f].removed);
    assert!(!g.is_live(neg));
    assert_eq!(g.blocks[entry].end, Term::Goto(t));
    assert!(g.is_dominance_fresh());
    // nothing left to do
    let mut stats = CompilerStats::default();
    assert!(!optimize(&mut g, &OptimizerCfg::default(), Some(&mut stats)).unwrap());
    assert_eq!(stats.to_string(), "");
}
