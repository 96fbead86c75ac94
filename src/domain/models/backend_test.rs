use super::BackendPrompt;
use crate::domain::models::Message;
use crate::domain::models::Role;

#[test]
fn it_builds_a_single_turn_prompt() {
    let prompt = BackendPrompt::from_text("Hello world");
    assert_eq!(prompt.messages, vec![Message::new(Role::User, "Hello world")]);
}

#[test]
fn it_finds_the_last_user_text() {
    let prompt = BackendPrompt::new(vec![
        Message::new(Role::User, "first"),
        Message::new(Role::Assistant, "reply"),
        Message::new(Role::User, "second"),
        Message::new(Role::Assistant, "another reply"),
    ]);
    assert_eq!(prompt.last_user_text(), "second");
}

#[test]
fn it_returns_empty_text_without_user_messages() {
    let prompt = BackendPrompt::new(vec![]);
    assert_eq!(prompt.last_user_text(), "");
}
