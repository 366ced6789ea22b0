#![no_main]

use libfuzzer_sys::fuzz_target;
use runtests::overrides::{apply_directive, parse};
use runtests::Configuration;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    // Parsing must never panic
    let Ok(directives) = parse(&input) else {
        return;
    };

    for directive in &directives {
        assert!(directive.line_num > 0, "Invalid line number");
    }

    // Applying arbitrary directives may fail, but must not panic
    let mut config = Configuration::new();
    for directive in &directives {
        let _ = apply_directive(&mut config, directive);
    }

    assert_eq!(parse(&input).ok(), Some(directives), "Parser is not deterministic");
});
