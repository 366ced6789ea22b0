#![no_main]

use libfuzzer_sys::fuzz_target;
use runtests::overrides::split_command_line;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    let Ok(tokens) = split_command_line(&input) else {
        return;
    };

    // Unquoted tokens never carry separators
    if !input.contains(&['"', '\'', '\\'][..]) {
        for token in &tokens {
            assert!(!token.contains(' ') && !token.contains('\t'));
            assert!(!token.is_empty());
        }
    }
});
