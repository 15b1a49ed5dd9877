//! 아카이브 파일명 마스크 매칭
//!
//! `*` (0개 이상 임의 문자), `?` (임의 1문자) 지원.
//! 대소문자 무시 (Windows 파일 검색과 동일).

/// 마스크에 `*` 토큰이 포함되어 있는지 확인 (설정 검증용)
pub fn has_wildcard(mask: &str) -> bool {
    mask.contains('*')
}

/// 마스크 매칭 (대소문자 무시, UTF-8 안전)
///
/// 백트래킹 대신 마지막 `*` 위치만 기억하는 선형 탐색을 사용한다.
pub fn mask_match(mask: &str, name: &str) -> bool {
    let pattern: Vec<char> = mask.to_lowercase().chars().collect();
    let text: Vec<char> = name.to_lowercase().chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut star_text = 0usize;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some(p);
                star_text = t;
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                // `*`가 한 글자 더 삼키도록 되돌아감
                Some(s) => {
                    p = s + 1;
                    star_text += 1;
                    t = star_text;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("update*.zip"));
        assert!(has_wildcard("*"));
        assert!(!has_wildcard("update?.zip"));
        assert!(!has_wildcard("update.zip"));
        assert!(!has_wildcard(""));
    }

    #[test]
    fn test_update_masks() {
        assert!(mask_match("update*.zip", "update_v3.zip"));
        assert!(mask_match("update*.zip", "update.zip"));
        assert!(!mask_match("update*.zip", "update_v3.zip.bak"));
        assert!(!mask_match("update*.zip", "patch_v3.zip"));
        assert!(mask_match("*.zip", "anything.zip"));
    }

    #[test]
    fn test_question_mark() {
        assert!(mask_match("update?.zip", "update1.zip"));
        assert!(!mask_match("update?.zip", "update.zip"));
        assert!(!mask_match("update?.zip", "update12.zip"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(mask_match("UPDATE*.ZIP", "update_v3.zip"));
        assert!(mask_match("update*.zip", "Update_V3.ZIP"));
    }

    #[test]
    fn test_star_backtracking() {
        assert!(mask_match("*a*b", "xxaxxb"));
        assert!(mask_match("u*d*.zip", "u_d_d.zip"));
        assert!(!mask_match("*a*b", "xxaxx"));
        assert!(mask_match("**", ""));
        assert!(!mask_match("", "a"));
        assert!(mask_match("", ""));
    }

    #[test]
    fn test_non_ascii_names() {
        assert!(mask_match("обновление*.zip", "Обновление_2024.zip"));
        assert!(mask_match("*.zip", "업데이트.zip"));
    }
}
