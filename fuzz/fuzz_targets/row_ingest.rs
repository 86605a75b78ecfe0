#![no_main]

use gacha_audit::audit::run_audit;
use gacha_audit::config::AuditConfig;
use gacha_audit::ingest::{parse_rows, parse_simulation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Whatever parses must audit without panicking
        if let Ok(batch) = parse_rows(input, true) {
            let _ = run_audit(&batch.rows, &AuditConfig::default());
        }
        let _ = parse_simulation(input);
    }
});
