//! 디바이스 식별 정보.
//!
//! 고유 코드와 이름은 생성 이후 변경되지 않는다.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::ports::random::RandomSource;

/// 고유 코드 길이
pub const UNIQUE_CODE_LEN: usize = 12;

/// 고유 코드 문자 집합 (대문자 + 숫자)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 브레이슬릿 고유 코드 — 인증 및 `X-Bracelet-ID` 헤더 값
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UniqueCode(String);

impl UniqueCode {
    /// 외부에서 전달된 코드 검증 후 생성
    pub fn parse(code: &str) -> Result<Self, CoreError> {
        let code = code.trim();
        if code.len() != UNIQUE_CODE_LEN {
            return Err(CoreError::validation(
                "unique_code",
                format!("{UNIQUE_CODE_LEN}자여야 합니다 (입력: {}자)", code.len()),
            ));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::validation(
                "unique_code",
                "영문자와 숫자만 허용됩니다",
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// 임의의 고유 코드 생성
    pub fn generate(random: &mut dyn RandomSource) -> Self {
        let last = (CODE_ALPHABET.len() - 1) as u32;
        let code = (0..UNIQUE_CODE_LEN)
            .map(|_| CODE_ALPHABET[random.range_u32(0, last) as usize] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UniqueCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UniqueCode> for String {
    fn from(code: UniqueCode) -> Self {
        code.0
    }
}

/// 디바이스 식별 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// 고유 코드
    pub unique_code: UniqueCode,
    /// 사람이 읽을 수 있는 이름
    pub name: String,
}

impl DeviceIdentity {
    /// 식별 정보 생성 — 이름이 없으면 `Bracelet-<코드 앞 8자>`
    pub fn new(unique_code: UniqueCode, name: Option<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Bracelet-{}", &unique_code.as_str()[..8]));
        Self { unique_code, name }
    }
}
