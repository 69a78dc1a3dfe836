#![no_main]

use fieldlift_promoter::LineCodec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let codec = LineCodec::default();
    if let Ok(decoded) = codec.decode(line, "fuzz") {
        // 디코딩된 이벤트는 항상 다시 인코딩 가능해야 함
        let encoded = codec
            .encode(&decoded.event, &decoded.framing)
            .expect("decoded event must encode");
        assert!(codec.decode(&encoded, "fuzz").is_ok());
    }
});
