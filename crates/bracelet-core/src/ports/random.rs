//! 난수 소스 포트.
//!
//! 배터리 소모, GPS 드리프트, 자동 버튼 입력은 모두 이 trait을 통해 난수를 얻는다.
//! 구현: `bracelet-device::random::SeededRandom` (rand), 테스트용 [`ScriptedRandom`].

/// 주입 가능한 난수 소스
pub trait RandomSource: Send + Sync {
    /// `[low, high]` 구간의 정수 (양 끝 포함)
    fn range_u32(&mut self, low: u32, high: u32) -> u32;

    /// `[low, high]` 구간의 실수
    fn range_f64(&mut self, low: f64, high: f64) -> f64;

    /// `probability` 확률로 true
    fn chance(&mut self, probability: f64) -> bool;
}

/// 미리 정해진 값을 순환하며 반환하는 결정적 난수 소스
///
/// - 정수: 스크립트 값을 `[low, high]`로 잘라 반환 (비어 있으면 `low`)
/// - 실수: 스크립트 비율 `t ∈ [0, 1]`로 `low + (high - low) * t` (비어 있으면 중앙값)
/// - 확률: 스크립트 값 `r`에 대해 `r < probability` (비어 있으면 항상 false)
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    ints: Vec<u32>,
    fractions: Vec<f64>,
    rolls: Vec<f64>,
    int_cursor: usize,
    fraction_cursor: usize,
    roll_cursor: usize,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ints(mut self, ints: Vec<u32>) -> Self {
        self.ints = ints;
        self
    }

    pub fn with_fractions(mut self, fractions: Vec<f64>) -> Self {
        self.fractions = fractions;
        self
    }

    pub fn with_rolls(mut self, rolls: Vec<f64>) -> Self {
        self.rolls = rolls;
        self
    }

    fn next<T: Copy>(values: &[T], cursor: &mut usize) -> Option<T> {
        if values.is_empty() {
            return None;
        }
        let value = values[*cursor % values.len()];
        *cursor += 1;
        Some(value)
    }
}

impl RandomSource for ScriptedRandom {
    fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        Self::next(&self.ints, &mut self.int_cursor)
            .map(|v| v.clamp(low, high))
            .unwrap_or(low)
    }

    fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        let t = Self::next(&self.fractions, &mut self.fraction_cursor)
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);
        low + (high - low) * t
    }

    fn chance(&mut self, probability: f64) -> bool {
        Self::next(&self.rolls, &mut self.roll_cursor)
            .map(|r| r < probability)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_ints_are_clamped_and_cycle() {
        let mut random = ScriptedRandom::new().with_ints(vec![0, 7]);
        assert_eq!(random.range_u32(1, 3), 1);
        assert_eq!(random.range_u32(1, 3), 3);
        assert_eq!(random.range_u32(1, 3), 1);
    }

    #[test]
    fn scripted_fractions_map_into_range() {
        let mut random = ScriptedRandom::new().with_fractions(vec![0.0, 1.0]);
        assert!((random.range_f64(-0.001, 0.001) + 0.001).abs() < 1e-12);
        assert!((random.range_f64(-0.001, 0.001) - 0.001).abs() < 1e-12);
    }

    #[test]
    fn empty_script_defaults() {
        let mut random = ScriptedRandom::new();
        assert_eq!(random.range_u32(8, 20), 8);
        assert_eq!(random.range_f64(-1.0, 1.0), 0.0);
        assert!(!random.chance(0.99));
    }

    #[test]
    fn rolls_compare_against_probability() {
        let mut random = ScriptedRandom::new().with_rolls(vec![0.01, 0.5]);
        assert!(random.chance(0.05));
        assert!(!random.chance(0.05));
    }
}
