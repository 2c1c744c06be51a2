#![no_main]
use covgate::parsers::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = covgate::parsers::lcov::LcovParser.parse(std::path::Path::new("fuzz.lcov"), data);
});
