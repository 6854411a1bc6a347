#![no_main]
use libfuzzer_sys::fuzz_target;

// Definition text and input string share the fuzz payload, split at the
// first NUL byte.
fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let (def_bytes, rest) = data.split_at(split);
    let input_bytes = rest.get(1..).unwrap_or(&[]);

    if let (Ok(source), Ok(input)) = (
        std::str::from_utf8(def_bytes),
        std::str::from_utf8(input_bytes),
    ) {
        if let Ok(def) = npda_syntax::parse(source) {
            let automaton = npda_search::compile(&def);
            let config = npda_search::SearchConfig {
                max_configs: 1_000,
                max_depth: 50,
                max_time_secs: 2,
                ..npda_search::SearchConfig::default()
            };
            let searcher = npda_search::Searcher::new(&automaton, config);
            let _ = searcher.run(input);
        }
    }
});
