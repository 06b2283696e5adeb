#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlquery::Node;

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        if let Ok(root) = Node::from_xml(r#"<Ast><Token kind="Name">a</Token><Preamble> </Preamble></Ast>"#) {
            // Evaluation should never panic on any expression
            let _ = root.evaluate(expr);
            let _ = root.find(expr, &[]);
        }
    }
});
