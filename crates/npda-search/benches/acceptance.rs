//! Criterion benchmarks for the acceptance search.
//!
//! Run with: cargo bench -p npda-search

use criterion::{criterion_group, criterion_main, Criterion};
use npda_search::{compile, Automaton, SearchConfig, Searcher};
use npda_syntax::parse;

const ANBN: &str = "q0 q1\na b\nZ A\nq0\nZ\n\nE\n\
                    q0 a Z q0 AZ\n\
                    q0 a A q0 AA\n\
                    q0 e Z q0 e\n\
                    q0 b A q1 e\n\
                    q1 b A q1 e\n\
                    q1 e Z q1 e\n";

const DYCK: &str = "q0\na b\nZ A\nq0\nZ\n\nE\n\
                    q0 a Z q0 AZ\n\
                    q0 a A q0 AA\n\
                    q0 b A q0 e\n\
                    q0 e Z q0 e\n";

// Even-length palindromes. The midpoint guess branches at every offset,
// so rejection has to sweep the whole quadratic configuration space.
const PALINDROME: &str = "q0 q1\na b\nZ A B\nq0\nZ\n\nE\n\
                          q0 a Z q0 AZ\n\
                          q0 a A q0 AA\n\
                          q0 a B q0 AB\n\
                          q0 b Z q0 BZ\n\
                          q0 b A q0 BA\n\
                          q0 b B q0 BB\n\
                          q0 e Z q1 Z\n\
                          q0 e A q1 A\n\
                          q0 e B q1 B\n\
                          q1 a A q1 e\n\
                          q1 b B q1 e\n\
                          q1 e Z q1 e\n";

fn load(source: &str) -> Automaton {
    compile(&parse(source).expect("benchmark automaton should parse"))
}

fn bench_run(c: &mut Criterion, name: &str, automaton: &Automaton, input: &str, expect: bool) {
    let searcher = Searcher::new(automaton, SearchConfig::default());
    c.bench_function(name, |b| {
        b.iter(|| {
            let outcome = searcher.run(input);
            assert_eq!(outcome.accepted(), expect);
        })
    });
}

fn benchmarks(c: &mut Criterion) {
    let anbn = load(ANBN);
    let dyck = load(DYCK);
    let palindrome = load(PALINDROME);

    let anbn_accept = format!("{}{}", "a".repeat(64), "b".repeat(64));
    let anbn_reject = format!("{}{}", "a".repeat(64), "b".repeat(63));
    let dyck_accept = "ab".repeat(64);
    let palindrome_accept = format!("{}{}{}", "a".repeat(12), "b".repeat(24), "a".repeat(12));
    let palindrome_reject = "ab".repeat(12);

    bench_run(c, "anbn_accept_n64", &anbn, &anbn_accept, true);
    bench_run(c, "anbn_reject_n64", &anbn, &anbn_reject, false);
    bench_run(c, "dyck_accept_n64", &dyck, &dyck_accept, true);
    bench_run(c, "palindrome_accept_n24", &palindrome, &palindrome_accept, true);
    bench_run(c, "palindrome_reject_n24", &palindrome, &palindrome_reject, false);

    c.bench_function("parse_compile_palindrome", |b| {
        b.iter(|| {
            let def = parse(PALINDROME).expect("benchmark automaton should parse");
            assert_eq!(compile(&def).state_count(), 2);
        })
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
