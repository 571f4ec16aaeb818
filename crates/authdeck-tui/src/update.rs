//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects. The reducer never performs I/O.

use authdeck_core::actions::OperationMode;
use authdeck_core::auth::AuthUser;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::effects::{ExecutePlan, UiEffect};
use crate::events::UiEvent;
use crate::state::{AppState, Focus};

/// The main reducer function.
pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            state.spinner_frame = state.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) => handle_key(state, key),
        UiEvent::Terminal(_) => vec![],
        UiEvent::ExecuteFinished { id, result } => {
            // A result for a superseded task id is stale; drop it.
            if !state.tasks.execute.finish_if_active(id) {
                return vec![];
            }
            match result {
                Ok(message) => state.output.success(message),
                Err(message) => state.output.error(message),
            }
            vec![]
        }
        UiEvent::AuthStateChanged(user) => handle_auth_state_changed(state, user),
        UiEvent::PhotoFetched { id, url, result } => {
            state.tasks.photo_fetch.finish_if_active(id);
            // Latest-wins: only the most recently requested URL may apply.
            if state.photo.last_requested.as_deref() != Some(url.as_str()) {
                return vec![];
            }
            match result {
                Ok(meta) => state.photo.meta = Some(meta),
                Err(message) => {
                    state.photo.meta = None;
                    state.output.info(format!("Photo fetch failed: {message}"));
                }
            }
            vec![]
        }
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.kind == KeyEventKind::Release {
        return vec![];
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let in_text_field = state.focus.as_field().is_some();

    match key.code {
        KeyCode::Esc => return vec![UiEffect::Quit],
        KeyCode::Char('c') if ctrl => return vec![UiEffect::Quit],
        KeyCode::Char('q') if !in_text_field => return vec![UiEffect::Quit],
        KeyCode::Tab => {
            state.cycle_focus(1);
            return vec![];
        }
        KeyCode::BackTab => {
            state.cycle_focus(-1);
            return vec![];
        }
        KeyCode::Enter => return start_execute(state),
        _ => {}
    }

    match state.focus {
        Focus::ModePicker => handle_mode_key(state, key.code),
        Focus::ActionPicker => handle_action_key(state, key.code),
        Focus::MethodPicker => handle_method_key(state, key.code),
        Focus::EmailField | Focus::PasswordField => handle_field_key(state, key.code),
    }
}

fn handle_mode_key(state: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
    let target = match code {
        KeyCode::Left | KeyCode::Up => Some(OperationMode::Session),
        KeyCode::Right | KeyCode::Down => Some(OperationMode::User),
        _ => None,
    };
    if let Some(mode) = target {
        if mode == OperationMode::User && !state.signed_in() {
            state.output.info("Sign in first to use user operations.");
            return vec![];
        }
        state.selection.select_mode(mode);
        state.clamp_focus();
    }
    vec![]
}

fn handle_action_key(state: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
    match code {
        KeyCode::Up => state.selection.move_action(-1),
        KeyCode::Down => state.selection.move_action(1),
        _ => return vec![],
    }
    state.clamp_focus();
    vec![]
}

fn handle_method_key(state: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
    if matches!(
        code,
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
    ) {
        state.selection.toggle_credential_method();
        state.clamp_focus();
    }
    vec![]
}

fn handle_field_key(state: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
    let Some(field) = state.focus.as_field() else {
        return vec![];
    };
    match code {
        KeyCode::Char(c) => state.fields.insert(field, c),
        KeyCode::Backspace => state.fields.backspace(field),
        _ => {}
    }
    vec![]
}

/// Starts an execute task unless one is already in flight (single-flight:
/// the original screen allowed re-entrant presses, which is a defect).
fn start_execute(state: &mut AppState) -> Vec<UiEffect> {
    if state.tasks.execute.is_running() {
        state.output.info("An operation is already running.");
        return vec![];
    }

    let task = state.task_seq.next_id();
    state.tasks.execute.start(task);

    let plan = ExecutePlan {
        action: state.selection.current_action(),
        method: state.selection.credential_method,
        email: state.fields.email.clone(),
        password: state.fields.password.clone(),
    };
    tracing::info!(action = %plan.action, "executing");
    vec![UiEffect::Execute { task, plan }]
}

/// Applies an identity change: reset the selection when the identity actually
/// changed, mirror the user, and (re)request the profile photo.
fn handle_auth_state_changed(state: &mut AppState, user: Option<AuthUser>) -> Vec<UiEffect> {
    let old_uid = state.current_user.as_ref().map(|u| u.uid.clone());
    let new_uid = user.as_ref().map(|u| u.uid.clone());

    if old_uid != new_uid {
        state.selection.reset_for_auth_change(user.is_some());
        state.clamp_focus();
    }

    let photo_url = user.as_ref().and_then(|u| u.photo_url.clone());
    state.current_user = user;

    match photo_url {
        Some(url) => {
            if state.photo.last_requested.as_deref() == Some(url.as_str()) {
                return vec![];
            }
            state.photo.last_requested = Some(url.clone());
            state.photo.meta = None;
            let task = state.task_seq.next_id();
            state.tasks.photo_fetch.start(task);
            vec![UiEffect::FetchPhoto { task, url }]
        }
        None => {
            state.photo = Default::default();
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use authdeck_core::actions::{SessionAction, UserAction};
    use authdeck_core::photo::PhotoMeta;

    use super::*;
    use crate::common::TaskId;

    fn user(uid: &str, photo_url: Option<&str>) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            photo_url: photo_url.map(str::to_string),
            ..AuthUser::default()
        }
    }

    fn meta(bytes: usize) -> PhotoMeta {
        PhotoMeta {
            width: 1,
            height: 1,
            format: "png".to_string(),
            bytes,
        }
    }

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn test_enter_emits_single_execute_effect() {
        let mut state = AppState::new();
        let effects = update(&mut state, key(KeyCode::Enter));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], UiEffect::Execute { .. }));
        assert!(state.tasks.execute.is_running());
    }

    #[test]
    fn test_reentrant_enter_is_refused_while_running() {
        let mut state = AppState::new();
        let first = update(&mut state, key(KeyCode::Enter));
        assert_eq!(first.len(), 1);
        let second = update(&mut state, key(KeyCode::Enter));
        assert!(second.is_empty());
    }

    #[test]
    fn test_execute_result_updates_output_and_frees_task() {
        let mut state = AppState::new();
        let effects = update(&mut state, key(KeyCode::Enter));
        let UiEffect::Execute { task, .. } = &effects[0] else {
            panic!("expected execute effect");
        };
        let id = *task;

        update(
            &mut state,
            UiEvent::ExecuteFinished {
                id,
                result: Ok("done".to_string()),
            },
        );
        assert!(!state.tasks.execute.is_running());
        assert!(state.output.lines().iter().any(|l| l.text == "done"));
    }

    #[test]
    fn test_stale_execute_result_is_dropped() {
        let mut state = AppState::new();
        update(&mut state, key(KeyCode::Enter));
        let lines_before = state.output.lines().len();
        update(
            &mut state,
            UiEvent::ExecuteFinished {
                id: TaskId(999),
                result: Ok("stale".to_string()),
            },
        );
        assert_eq!(state.output.lines().len(), lines_before);
        assert!(state.tasks.execute.is_running());
    }

    #[test]
    fn test_failed_execute_mutates_nothing_but_output() {
        let mut state = AppState::new();
        state.selection.select_session_action(SessionAction::CreateUser);
        let selection_before = state.selection.clone();
        let effects = update(&mut state, key(KeyCode::Enter));
        let UiEffect::Execute { task, .. } = &effects[0] else {
            panic!("expected execute effect");
        };
        let id = *task;

        update(
            &mut state,
            UiEvent::ExecuteFinished {
                id,
                result: Err("EMAIL_EXISTS".to_string()),
            },
        );
        assert_eq!(state.selection, selection_before);
        assert!(state.current_user.is_none());
        assert!(state.output.lines().iter().any(|l| l.text == "EMAIL_EXISTS"));
    }

    #[test]
    fn test_sign_in_resets_mode_and_requests_photo() {
        let mut state = AppState::new();
        state.selection.select_session_action(SessionAction::SignOut);

        let effects = update(
            &mut state,
            UiEvent::AuthStateChanged(Some(user("u1", Some("https://p/1.png")))),
        );
        assert_eq!(state.selection.mode, OperationMode::Session);
        assert_eq!(
            state.selection.session_action,
            SessionAction::FetchProvidersForEmail
        );
        assert!(state.signed_in());
        assert_eq!(effects.len(), 1);
        assert!(matches!(&effects[0], UiEffect::FetchPhoto { url, .. } if url == "https://p/1.png"));
        assert_eq!(state.photo.last_requested.as_deref(), Some("https://p/1.png"));
    }

    #[test]
    fn test_sign_out_resets_to_session_mode() {
        let mut state = AppState::new();
        update(&mut state, UiEvent::AuthStateChanged(Some(user("u1", None))));
        state.selection.select_mode(OperationMode::User);
        state.selection.select_user_action(UserAction::DeleteAccount);

        update(&mut state, UiEvent::AuthStateChanged(None));
        assert_eq!(state.selection.mode, OperationMode::Session);
        assert!(!state.signed_in());
        assert!(state.photo.last_requested.is_none());
    }

    #[test]
    fn test_same_identity_does_not_reset_selection() {
        let mut state = AppState::new();
        update(&mut state, UiEvent::AuthStateChanged(Some(user("u1", None))));
        state.selection.select_mode(OperationMode::User);
        state.selection.select_user_action(UserAction::GetIdToken);

        // Profile refresh for the same uid (e.g. after update-email).
        update(&mut state, UiEvent::AuthStateChanged(Some(user("u1", None))));
        assert_eq!(state.selection.mode, OperationMode::User);
        assert_eq!(state.selection.user_action, UserAction::GetIdToken);
    }

    #[test]
    fn test_photo_latest_wins_guard() {
        let mut state = AppState::new();

        // Request for URL A, then the user switches and URL B is requested.
        let a_effects = update(
            &mut state,
            UiEvent::AuthStateChanged(Some(user("u1", Some("https://p/a.png")))),
        );
        let UiEffect::FetchPhoto { task: a_task, .. } = &a_effects[0] else {
            panic!("expected photo fetch");
        };
        let a_id = *a_task;
        let b_effects = update(
            &mut state,
            UiEvent::AuthStateChanged(Some(user("u2", Some("https://p/b.png")))),
        );
        let UiEffect::FetchPhoto { task: b_task, .. } = &b_effects[0] else {
            panic!("expected photo fetch");
        };
        let b_id = *b_task;

        // B completes first, then A's slow result arrives late.
        update(
            &mut state,
            UiEvent::PhotoFetched {
                id: b_id,
                url: "https://p/b.png".to_string(),
                result: Ok(meta(22)),
            },
        );
        update(
            &mut state,
            UiEvent::PhotoFetched {
                id: a_id,
                url: "https://p/a.png".to_string(),
                result: Ok(meta(11)),
            },
        );

        // The displayed photo is B's, never A's.
        assert_eq!(state.photo.meta.as_ref().map(|m| m.bytes), Some(22));
    }

    #[test]
    fn test_user_mode_requires_sign_in() {
        let mut state = AppState::new();
        state.focus = Focus::ModePicker;
        update(&mut state, key(KeyCode::Right));
        assert_eq!(state.selection.mode, OperationMode::Session);

        update(&mut state, UiEvent::AuthStateChanged(Some(user("u1", None))));
        update(&mut state, key(KeyCode::Right));
        assert_eq!(state.selection.mode, OperationMode::User);
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut state = AppState::new();
        state.focus = Focus::EmailField;
        update(&mut state, key(KeyCode::Char('a')));
        update(&mut state, key(KeyCode::Char('@')));
        assert_eq!(state.fields.email, "a@");
        update(&mut state, key(KeyCode::Backspace));
        assert_eq!(state.fields.email, "a");
    }

    #[test]
    fn test_esc_quits() {
        let mut state = AppState::new();
        let effects = update(&mut state, key(KeyCode::Esc));
        assert!(matches!(effects[0], UiEffect::Quit));
    }

    #[test]
    fn test_q_quits_outside_text_fields_only() {
        let mut state = AppState::new();
        state.focus = Focus::ActionPicker;
        let effects = update(&mut state, key(KeyCode::Char('q')));
        assert!(matches!(effects[0], UiEffect::Quit));

        let mut state = AppState::new();
        state.focus = Focus::EmailField;
        let effects = update(&mut state, key(KeyCode::Char('q')));
        assert!(effects.is_empty());
        assert_eq!(state.fields.email, "q");
    }
}
