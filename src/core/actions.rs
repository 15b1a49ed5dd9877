//! 액션 레지스트리
//!
//! 키 바인딩과 커맨드바 항목은 모두 이 모듈의 정의를 참조한다.

use crate::ui::components::command_bar::CommandItem;
use crossterm::event::{KeyCode, KeyModifiers};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartUpdate,
    CancelUpdate,
    ReloadSettings,
    ToggleTheme,
    Quit,
}

/// 커맨드바 표시 정보
pub struct CommandBarEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub priority: u8,
}

/// 액션 정의 (메타데이터)
pub struct ActionDef {
    pub action: Action,
    pub label: &'static str,
    pub command_bar: Option<CommandBarEntry>,
}

/// 키 바인딩 정의
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: Option<KeyModifiers>, // None = any modifier
    pub action: Action,
}

pub static ACTION_DEFS: &[ActionDef] = &[
    ActionDef {
        action: Action::StartUpdate,
        label: "Start update",
        command_bar: Some(CommandBarEntry {
            key: "u",
            label: "Update",
            priority: 1,
        }),
    },
    ActionDef {
        action: Action::CancelUpdate,
        label: "Cancel update",
        command_bar: Some(CommandBarEntry {
            key: "Esc",
            label: "Cancel",
            priority: 2,
        }),
    },
    ActionDef {
        action: Action::ReloadSettings,
        label: "Reload settings",
        command_bar: Some(CommandBarEntry {
            key: "r",
            label: "Reload",
            priority: 3,
        }),
    },
    ActionDef {
        action: Action::ToggleTheme,
        label: "Toggle theme",
        command_bar: Some(CommandBarEntry {
            key: "t",
            label: "Theme",
            priority: 4,
        }),
    },
    ActionDef {
        action: Action::Quit,
        label: "Quit",
        command_bar: Some(CommandBarEntry {
            key: "q",
            label: "Quit",
            priority: 9,
        }),
    },
];

fn build_key_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding {
            code: KeyCode::Char('c'),
            modifiers: Some(KeyModifiers::CONTROL),
            action: Action::Quit,
        },
        KeyBinding {
            code: KeyCode::Char('u'),
            modifiers: Some(KeyModifiers::NONE),
            action: Action::StartUpdate,
        },
        KeyBinding {
            code: KeyCode::Enter,
            modifiers: None,
            action: Action::StartUpdate,
        },
        KeyBinding {
            code: KeyCode::Esc,
            modifiers: None,
            action: Action::CancelUpdate,
        },
        KeyBinding {
            code: KeyCode::Char('r'),
            modifiers: Some(KeyModifiers::NONE),
            action: Action::ReloadSettings,
        },
        KeyBinding {
            code: KeyCode::Char('t'),
            modifiers: Some(KeyModifiers::NONE),
            action: Action::ToggleTheme,
        },
        KeyBinding {
            code: KeyCode::Char('q'),
            modifiers: Some(KeyModifiers::NONE),
            action: Action::Quit,
        },
    ]
}

static KEY_BINDINGS: LazyLock<Vec<KeyBinding>> = LazyLock::new(build_key_bindings);

/// 키 바인딩 목록 조회 (1회 초기화 후 재사용)
pub fn key_bindings() -> &'static [KeyBinding] {
    KEY_BINDINGS.as_slice()
}

/// 키 입력으로 액션 조회
pub fn find_action(modifiers: KeyModifiers, code: KeyCode) -> Option<Action> {
    for binding in key_bindings() {
        let code_matches = binding.code == code;
        let mod_matches = match binding.modifiers {
            None => true, // any modifier
            Some(required) => modifiers == required,
        };
        if code_matches && mod_matches {
            return Some(binding.action);
        }
    }
    None
}

impl Action {
    pub fn label(self) -> &'static str {
        ACTION_DEFS
            .iter()
            .find(|def| def.action == self)
            .map_or("", |def| def.label)
    }
}

/// 커맨드바용 항목 생성 (priority 순 정렬)
///
/// 실행 중에는 취소/종료만 활성화한다.
pub fn generate_command_bar_items(running: bool) -> Vec<CommandItem> {
    let mut entries: Vec<(&CommandBarEntry, &ActionDef)> = ACTION_DEFS
        .iter()
        .filter_map(|def| def.command_bar.as_ref().map(|cb| (cb, def)))
        .collect();

    entries.sort_by_key(|(cb, _)| cb.priority);

    entries
        .into_iter()
        .map(|(cb, def)| {
            let enabled = match def.action {
                Action::CancelUpdate => running,
                Action::Quit => true,
                _ => !running,
            };
            CommandItem::new(cb.key, cb.label).enabled(enabled)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_action() {
        assert_eq!(
            find_action(KeyModifiers::NONE, KeyCode::Char('u')),
            Some(Action::StartUpdate)
        );
        assert_eq!(
            find_action(KeyModifiers::NONE, KeyCode::Enter),
            Some(Action::StartUpdate)
        );
        assert_eq!(
            find_action(KeyModifiers::NONE, KeyCode::Esc),
            Some(Action::CancelUpdate)
        );
        assert_eq!(
            find_action(KeyModifiers::CONTROL, KeyCode::Char('c')),
            Some(Action::Quit)
        );
        assert_eq!(find_action(KeyModifiers::CONTROL, KeyCode::Char('u')), None);
        assert_eq!(find_action(KeyModifiers::NONE, KeyCode::Char('x')), None);
    }

    #[test]
    fn test_every_action_has_label() {
        for def in ACTION_DEFS {
            assert!(!def.action.label().is_empty());
        }
    }

    #[test]
    fn test_command_bar_items_follow_run_state() {
        let idle = generate_command_bar_items(false);
        let keys: Vec<&str> = idle.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["u", "Esc", "r", "t", "q"]);
        assert!(idle[0].enabled);
        assert!(!idle[1].enabled);

        let running = generate_command_bar_items(true);
        assert!(!running[0].enabled);
        assert!(running[1].enabled);
        assert!(running[4].enabled);
    }
}
