#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlquery::{parameterize, Node, QueryParam};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // First line is the query, the rest are string parameters
        let mut lines = input.lines();
        let query = lines.next().unwrap_or_default();
        let params: Vec<QueryParam> = lines.map(QueryParam::from).collect();
        if let Ok(substituted) = parameterize(query, &params) {
            if let Ok(root) = Node::from_xml(r#"<r><a v="x"/></r>"#) {
                let _ = root.evaluate(&substituted);
            }
        }
    }
});
