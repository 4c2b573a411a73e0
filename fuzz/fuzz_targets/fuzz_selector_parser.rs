#![no_main]

use libfuzzer_sys::fuzz_target;
use modality_core::SelectorList;

fuzz_target!(|data: &str| {
    // Whatever parses must print back to something that parses the same way.
    if let Ok(list) = SelectorList::parse(data) {
        let printed = list.to_string();
        let reparsed = SelectorList::parse(&printed);
        assert_eq!(reparsed.as_ref(), Ok(&list), "printed as {printed:?}");
    }
});
