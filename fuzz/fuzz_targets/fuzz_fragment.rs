#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlquery::Node;

fuzz_target!(|data: &[u8]| {
    if let Ok(fragment) = std::str::from_utf8(data) {
        if let Ok(root) = Node::from_xml("<root><a/><b/></root>") {
            if let Ok(items) = root.find("/root/*", &[]) {
                // Inserting arbitrary text must either fail cleanly or keep
                // the document serializable
                let _ = items.append(fragment);
                let _ = items.after(fragment);
                let _ = root.dump(false);
            }
        }
    }
});
