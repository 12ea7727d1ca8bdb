#![no_main]

use libfuzzer_sys::fuzz_target;
use spanq::config::ParserConfig;
use spanq::query::PhraseQueryParser;
use spanq::utils::TermDictionary;

fuzz_target!(|data: &str| {
    // Arbitrary input may fail to parse, but must never panic
    let terms = TermDictionary::with_terms("body", ["fred", "freddy", "smith"]);
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let _ = parser.parse(data);
});
