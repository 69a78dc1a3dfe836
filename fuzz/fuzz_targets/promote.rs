#![no_main]

use arbitrary::Arbitrary;
use fieldlift_core::record::Record;
use fieldlift_promoter::{EmptyValuePolicy, FieldPath, FieldPromoter};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    parent: String,
    child: String,
    fallback: String,
    keep_empty: bool,
    /// 레코드 본문 (JSON 객체가 아니면 건너뜀)
    record_json: String,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(path) = FieldPath::new(input.parent, input.child) else {
        return;
    };
    let Ok(promoter) = FieldPromoter::new(path, "topic_name", input.fallback) else {
        return;
    };
    let policy = if input.keep_empty {
        EmptyValuePolicy::Keep
    } else {
        EmptyValuePolicy::Fallback
    };
    let promoter = promoter.with_empty_policy(policy);

    let Ok(Value::Object(original)) = serde_json::from_str::<Value>(&input.record_json) else {
        return;
    };
    let original: Record = original;

    let mut once = original.clone();
    promoter.promote(&mut once);
    let mut twice = once.clone();
    promoter.promote(&mut twice);

    assert_eq!(once, twice, "promotion must be idempotent");
    for (key, value) in &original {
        if key != "topic_name" {
            assert_eq!(once.get(key), Some(value), "other fields must be untouched");
        }
    }
});
