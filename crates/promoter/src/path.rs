//! 승격 원본 필드 경로
//!
//! [`FieldPath`]는 부모 키와 그 안의 자식 키, 두 단계로 이루어진 경로입니다.
//! 두 가지 표기법을 지원합니다.
//!
//! - dot 표기: `kubernetes.pod_name`
//! - 수집기 record accessor 표기: `$kubernetes['pod_name']`, `$kubernetes["pod_name"]`
//!
//! 키에 `.`이 포함되면 record accessor 표기를 사용해야 합니다.

use std::fmt;
use std::str::FromStr;

use fieldlift_core::record::Record;
use serde_json::Value;

use crate::error::PromoterError;

/// 두 단계 필드 경로 (`parent.child`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    parent: String,
    child: String,
}

/// 경로 조회 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// 부모 키가 없음
    MissingParent,
    /// 부모 값이 객체가 아님
    ParentNotObject,
    /// 부모 객체에 자식 키가 없음
    MissingChild,
    /// 값을 찾음
    Found(&'a Value),
}

impl FieldPath {
    /// 부모 키와 자식 키로 경로를 생성합니다.
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Result<Self, PromoterError> {
        let parent = parent.into();
        let child = child.into();
        if parent.is_empty() || child.is_empty() {
            return Err(PromoterError::InvalidPath {
                path: format!("{parent}.{child}"),
                reason: "parent and child keys must not be empty".to_owned(),
            });
        }
        Ok(Self { parent, child })
    }

    /// 부모 키
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// 자식 키
    pub fn child(&self) -> &str {
        &self.child
    }

    /// 레코드에서 경로의 값을 조회합니다.
    pub fn resolve<'a>(&self, record: &'a Record) -> Lookup<'a> {
        let Some(parent) = record.get(&self.parent) else {
            return Lookup::MissingParent;
        };
        let Some(object) = parent.as_object() else {
            return Lookup::ParentNotObject;
        };
        match object.get(&self.child) {
            Some(value) => Lookup::Found(value),
            None => Lookup::MissingChild,
        }
    }

    /// 수집기 record accessor 표기로 변환합니다 (`$parent['child']`).
    pub fn to_record_accessor(&self) -> String {
        let simple_parent = self
            .parent
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if simple_parent {
            format!("${}{}", self.parent, bracket_key(&self.child))
        } else {
            format!("${}{}", bracket_key(&self.parent), bracket_key(&self.child))
        }
    }

    fn parse_dotted(s: &str) -> Result<Self, PromoterError> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 2 {
            return Err(PromoterError::InvalidPath {
                path: s.to_owned(),
                reason: format!(
                    "expected exactly two segments (parent.child), found {}",
                    parts.len()
                ),
            });
        }
        Self::new(parts[0], parts[1]).map_err(|_| PromoterError::InvalidPath {
            path: s.to_owned(),
            reason: "parent and child keys must not be empty".to_owned(),
        })
    }

    fn parse_accessor(s: &str) -> Result<Self, PromoterError> {
        let invalid = |reason: &str| PromoterError::InvalidPath {
            path: s.to_owned(),
            reason: reason.to_owned(),
        };

        let body = &s[1..];
        let (head, mut rest) = match body.find('[') {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };

        let mut segments = Vec::new();
        if !head.is_empty() {
            segments.push(head.to_owned());
        }

        while !rest.is_empty() {
            let mut chars = rest.chars();
            if chars.next() != Some('[') {
                return Err(invalid("expected '[' after key"));
            }
            let quote = match chars.next() {
                Some(q @ ('\'' | '"')) => q,
                _ => return Err(invalid("bracketed keys must be quoted")),
            };
            let inner = &rest[2..];
            let close = format!("{quote}]");
            let Some(end) = inner.find(close.as_str()) else {
                return Err(invalid("unterminated bracketed key"));
            };
            segments.push(inner[..end].to_owned());
            rest = &inner[end + close.len()..];
        }

        if segments.len() != 2 {
            return Err(invalid(&format!(
                "expected exactly two segments ($parent['child']), found {}",
                segments.len()
            )));
        }
        let child = segments.pop().unwrap_or_default();
        let parent = segments.pop().unwrap_or_default();
        Self::new(parent, child).map_err(|_| invalid("parent and child keys must not be empty"))
    }
}

fn closes_cleanly(key: &str, quote: char) -> bool {
    !key.ends_with(quote) && !key.contains(&format!("{quote}]"))
}

/// 키를 대괄호 표기로 감쌉니다.
///
/// 작은따옴표로 닫을 수 없는 키는 큰따옴표를 사용합니다. 두 따옴표 모두로 닫을 수
/// 없는 키는 표기할 수 없으므로 해석 시 다른 경로가 됩니다.
fn bracket_key(key: &str) -> String {
    if !closes_cleanly(key, '\'') {
        format!("[\"{key}\"]")
    } else {
        format!("['{key}']")
    }
}

impl FromStr for FieldPath {
    type Err = PromoterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PromoterError::InvalidPath {
                path: s.to_owned(),
                reason: "path must not be empty".to_owned(),
            });
        }
        if s.starts_with('$') {
            Self::parse_accessor(s)
        } else {
            Self::parse_dotted(s)
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.parent, self.child)
    }
}
