//! 수집기 설정 렌더링
//!
//! 같은 승격 규칙을 로그 수집기(Fluent Bit) 쪽에 배포할 때 필요한
//! 텍스트를 생성합니다.
//!
//! - Lua 스크립트: `(tag, timestamp, record)`를 받아 `1, timestamp, record`를 반환
//! - `[FILTER] Name lua` 섹션
//! - `[OUTPUT] Name kafka` 섹션 (`Topics`, `Topic_Key`, `Dynamic_topic`)

use std::fmt::Write as _;

use crate::error::PromoterError;
use crate::promoter::{EmptyValuePolicy, FieldPromoter};
use crate::routing::TopicRouter;

/// 기본 Lua 함수명
pub const DEFAULT_FUNCTION_NAME: &str = "promote_topic";

/// 기본 스크립트 경로
pub const DEFAULT_SCRIPT_PATH: &str = "/fluent-bit/scripts/promote_topic.lua";

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Lua 식별자로 사용할 수 있는지 검사합니다.
pub fn is_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(&name)
}

/// 문자열을 Lua 큰따옴표 리터럴로 변환합니다.
pub fn lua_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                // 10진 이스케이프는 항상 3자리로 써야 뒤따르는 숫자와 섞이지 않음
                let _ = write!(out, "\\{:03}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// 승격 규칙을 Lua 필터 함수로 렌더링합니다.
pub fn render_lua_script(
    promoter: &FieldPromoter,
    function_name: &str,
) -> Result<String, PromoterError> {
    if !is_lua_identifier(function_name) {
        return Err(PromoterError::Config {
            field: "function_name".to_owned(),
            reason: format!("'{function_name}' is not a valid Lua identifier"),
        });
    }

    let source = promoter.source();
    let empty_check = match promoter.empty_policy() {
        EmptyValuePolicy::Fallback => {
            "value == nil or value == \"\" or (type(value) == \"table\" and next(value) == nil)"
        }
        EmptyValuePolicy::Keep => "value == nil",
    };

    let mut script = String::new();
    let _ = writeln!(
        script,
        "-- {}.{} -> {} (fallback: {})",
        lua_string(source.parent()),
        lua_string(source.child()),
        lua_string(promoter.target_key()),
        lua_string(promoter.fallback_str())
    );
    let _ = writeln!(script, "function {function_name}(tag, timestamp, record)");
    let _ = writeln!(script, "    local value = nil");
    let _ = writeln!(
        script,
        "    local parent = record[{}]",
        lua_string(source.parent())
    );
    let _ = writeln!(script, "    if type(parent) == \"table\" then");
    let _ = writeln!(
        script,
        "        value = parent[{}]",
        lua_string(source.child())
    );
    let _ = writeln!(script, "    end");
    let _ = writeln!(script, "    if {empty_check} then");
    let _ = writeln!(
        script,
        "        value = {}",
        lua_string(promoter.fallback_str())
    );
    let _ = writeln!(script, "    end");
    let _ = writeln!(
        script,
        "    record[{}] = value",
        lua_string(promoter.target_key())
    );
    let _ = writeln!(script, "    return 1, timestamp, record");
    let _ = writeln!(script, "end");
    Ok(script)
}

/// `[FILTER] Name lua` 섹션을 렌더링합니다.
pub fn render_filter_section(match_pattern: &str, script_path: &str, function_name: &str) -> String {
    let mut section = String::from("[FILTER]\n");
    push_entry(&mut section, "Name", "lua");
    push_entry(&mut section, "Match", match_pattern);
    push_entry(&mut section, "script", script_path);
    push_entry(&mut section, "call", function_name);
    section
}

/// `[OUTPUT] Name kafka` 섹션을 렌더링합니다.
pub fn render_kafka_output(match_pattern: &str, brokers: &str, router: &TopicRouter) -> String {
    let mut section = String::from("[OUTPUT]\n");
    push_entry(&mut section, "Name", "kafka");
    push_entry(&mut section, "Match", match_pattern);
    push_entry(&mut section, "Brokers", brokers);
    push_entry(&mut section, "Topics", &router.topics().join(","));
    push_entry(&mut section, "Topic_Key", router.topic_key());
    push_entry(
        &mut section,
        "Dynamic_topic",
        if router.dynamic_topic() { "On" } else { "Off" },
    );
    push_entry(&mut section, "Format", "json");
    section
}

fn push_entry(section: &mut String, key: &str, value: &str) {
    let _ = writeln!(section, "    {key:<14}{value}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FieldPath;

    fn promoter() -> FieldPromoter {
        FieldPromoter::new(
            FieldPath::new("kubernetes", "pod_name").unwrap(),
            "topic_name",
            "default-topic",
        )
        .unwrap()
    }

    #[test]
    fn lua_identifier_rules() {
        assert!(is_lua_identifier("promote_topic"));
        assert!(is_lua_identifier("_f2"));
        assert!(!is_lua_identifier(""));
        assert!(!is_lua_identifier("2f"));
        assert!(!is_lua_identifier("promote-topic"));
        assert!(!is_lua_identifier("end"));
    }

    #[test]
    fn lua_string_escapes() {
        assert_eq!(lua_string("plain"), "\"plain\"");
        assert_eq!(lua_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(lua_string("x\ny"), "\"x\\ny\"");
        assert_eq!(lua_string("\u{1}1"), "\"\\0011\"");
        assert_eq!(lua_string("pod-한글"), "\"pod-한글\"");
    }

    #[test]
    fn script_contains_rule() {
        let script = render_lua_script(&promoter(), DEFAULT_FUNCTION_NAME).unwrap();
        assert!(script.contains("function promote_topic(tag, timestamp, record)"));
        assert!(script.contains("local parent = record[\"kubernetes\"]"));
        assert!(script.contains("value = parent[\"pod_name\"]"));
        assert!(script.contains("value = \"default-topic\""));
        assert!(script.contains("record[\"topic_name\"] = value"));
        assert!(script.contains("return 1, timestamp, record"));
        assert!(script.contains("next(value) == nil"));
    }

    #[test]
    fn script_keep_policy_only_checks_nil() {
        let p = promoter().with_empty_policy(EmptyValuePolicy::Keep);
        let script = render_lua_script(&p, "f").unwrap();
        assert!(script.contains("if value == nil then"));
        assert!(!script.contains("value == \"\""));
    }

    #[test]
    fn script_rejects_invalid_function_name() {
        assert!(render_lua_script(&promoter(), "not valid").is_err());
    }

    #[test]
    fn script_escapes_keys() {
        let p = FieldPromoter::new(
            FieldPath::new("k8s\"meta", "pod").unwrap(),
            "topic",
            "fall\"back",
        )
        .unwrap();
        let script = render_lua_script(&p, "f").unwrap();
        assert!(script.contains("record[\"k8s\\\"meta\"]"));
        assert!(script.contains("value = \"fall\\\"back\""));
    }

    #[test]
    fn script_comment_cannot_break_out() {
        let p = FieldPromoter::new(
            FieldPath::new("kubernetes", "pod\nos.exit(1)").unwrap(),
            "topic",
            "x",
        )
        .unwrap();
        let script = render_lua_script(&p, "f").unwrap();
        assert!(script.lines().all(|l| !l.starts_with("os.exit")));
    }

    #[test]
    fn filter_section_layout() {
        let section = render_filter_section("kube.*", DEFAULT_SCRIPT_PATH, DEFAULT_FUNCTION_NAME);
        assert!(section.starts_with("[FILTER]\n"));
        assert!(section.contains("    Name          lua\n"));
        assert!(section.contains("    Match         kube.*\n"));
        assert!(section.contains("    call          promote_topic\n"));
    }

    #[test]
    fn kafka_output_reflects_router() {
        let router = TopicRouter::new(
            vec!["default-topic".to_owned(), "audit".to_owned()],
            "topic_name",
        )
        .unwrap()
        .with_dynamic_topic(false);
        let section = render_kafka_output("kube.*", "kafka-0:9092,kafka-1:9092", &router);
        assert!(section.starts_with("[OUTPUT]\n"));
        assert!(section.contains("    Brokers       kafka-0:9092,kafka-1:9092\n"));
        assert!(section.contains("    Topics        default-topic,audit\n"));
        assert!(section.contains("    Topic_Key     topic_name\n"));
        assert!(section.contains("    Dynamic_topic Off\n"));
    }
}
