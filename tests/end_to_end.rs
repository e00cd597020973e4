//! End-to-end scenarios exercising [`finova::Solver`] through its public
//! surface only, without reaching into any internal module.

use finova::{Outcome, Solver, SolverConfig};
use finova::propagators::{AllDifferent, LinearRelation, LinearSum, NotEqual};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn pigeonhole_three_into_two_is_unsat() {
    init_tracing();
    let mut solver = Solver::new(SolverConfig::default());
    let pigeons: Vec<_> = (0..3).map(|_| solver.new_range(0, 1).unwrap()).collect();
    solver.post(Box::new(AllDifferent::new(pigeons))).unwrap();

    let outcome = solver.solve();
    assert_eq!(outcome, Outcome::Unsat);
    let stats = solver.stats();
    assert!(stats.node_count >= 1, "expected at least one search node, got {}", stats.node_count);
    assert!(stats.conflict_count >= 1, "expected at least one failure, got {}", stats.conflict_count);
}

#[test]
fn eight_queens_places_every_queen_without_conflict() {
    const N: i64 = 8;
    let mut solver = Solver::new(SolverConfig::default());
    let columns: Vec<_> = (0..N).map(|_| solver.new_range(0, N - 1).unwrap()).collect();

    let rising: Vec<_> = columns.iter().enumerate().map(|(row, &c)| solver.new_view(c, 1, row as i64).unwrap()).collect();
    let falling: Vec<_> = columns.iter().enumerate().map(|(row, &c)| solver.new_view(c, 1, -(row as i64)).unwrap()).collect();

    solver.post(Box::new(AllDifferent::new(columns.clone()))).unwrap();
    solver.post(Box::new(AllDifferent::new(rising))).unwrap();
    solver.post(Box::new(AllDifferent::new(falling))).unwrap();

    let outcome = solver.solve();
    assert_eq!(outcome, Outcome::Sat);
    let solution = solver.get_next_solution().unwrap();
    let placement: Vec<i64> = columns.iter().map(|&c| solution[c]).collect();

    for row_a in 0..placement.len() {
        for row_b in (row_a + 1)..placement.len() {
            let (ca, cb) = (placement[row_a], placement[row_b]);
            assert_ne!(ca, cb, "columns {row_a} and {row_b} share a column");
            let row_diff = (row_a as i64 - row_b as i64).abs();
            assert_ne!((ca - cb).abs(), row_diff, "rows {row_a} and {row_b} share a diagonal");
        }
    }
}

#[test]
fn minimisation_reaches_zero_with_the_sum_pinned() {
    let mut solver = Solver::new(SolverConfig::default());
    let x = solver.new_range(0, 10).unwrap();
    let y = solver.new_range(0, 10).unwrap();
    solver.post(Box::new(LinearSum::new(vec![x, y], vec![1, 1], LinearRelation::Equal, 7))).unwrap();

    let outcome = solver.minimize(x);
    assert_eq!(outcome, Outcome::Opt);
    let solution = solver.get_next_solution().unwrap();
    assert_eq!(solution[x], 0);
    assert_eq!(solution[y], 7);
}

#[test]
fn dimacs_unsat_instance_is_reported_unsat() {
    let text = "p cnf 2 4\n1 2 0\n1 -2 0\n-1 2 0\n-1 -2 0\n";
    let mut solver = Solver::from_dimacs(text, SolverConfig::default()).unwrap();
    assert_eq!(solver.solve(), Outcome::Unsat);
}

#[test]
fn enumerating_two_distinct_variables_yields_every_ordered_pair() {
    let mut solver = Solver::new(SolverConfig::default());
    let x = solver.new_range(0, 2).unwrap();
    let y = solver.new_range(0, 2).unwrap();
    solver.post(Box::new(NotEqual::new(x, y))).unwrap();

    let outcome = solver.solve_all();
    assert_eq!(outcome, Outcome::Opt, "exhausted enumeration with solutions found reports Opt");
    assert_eq!(solver.solutions().len(), 6, "3x3 minus the diagonal is six ordered pairs");

    let mut seen = std::collections::HashSet::new();
    for _ in 0..6 {
        let sol = solver.get_next_solution().expect("six solutions were captured");
        assert_ne!(sol[x], sol[y]);
        assert!(seen.insert((sol[x], sol[y])), "solutions must be distinct");
    }
    assert!(solver.get_next_solution().is_none(), "a seventh call must find nothing left");
}

#[test]
fn a_low_fail_limit_cuts_search_short() {
    let mut solver = Solver::new(SolverConfig::default().with_fail_limit(10));
    let pigeons: Vec<_> = (0..7).map(|_| solver.new_range(0, 5).unwrap()).collect();
    for i in 0..pigeons.len() {
        for j in (i + 1)..pigeons.len() {
            solver.post(Box::new(NotEqual::new(pigeons[i], pigeons[j]))).unwrap();
        }
    }

    let outcome = solver.solve();
    assert_eq!(outcome, Outcome::LimitOut);
}
