#![no_main]

use fieldlift_promoter::FieldPath;
use libfuzzer_sys::fuzz_target;

/// 두 따옴표 중 하나로 닫을 수 있어야 record accessor로 표기 가능
fn representable(key: &str) -> bool {
    ['\'', '"']
        .iter()
        .any(|&q| !key.ends_with(q) && !key.contains(&format!("{q}]")))
}

fuzz_target!(|data: &str| {
    if let Ok(path) = data.parse::<FieldPath>() {
        if !representable(path.parent()) || !representable(path.child()) {
            return;
        }
        // record accessor 표기는 같은 경로로 다시 해석되어야 함
        let accessor = path.to_record_accessor();
        let reparsed: FieldPath = accessor
            .parse()
            .unwrap_or_else(|e| panic!("{accessor} failed to reparse: {e}"));
        assert_eq!(reparsed, path);
    }
});
