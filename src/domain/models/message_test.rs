use super::LogRecord;
use super::Message;
use super::Role;

#[test]
fn it_executes_new() {
    let msg = Message::new(Role::User, "Hi there!");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "Hi there!".to_string());
}

#[test]
fn it_serializes_messages() {
    let msg = Message::new(Role::Assistant, "hello");
    insta::assert_snapshot!(
        serde_json::to_string(&msg).unwrap(),
        @r###"{"role":"assistant","content":"hello"}"###
    );
}

#[test]
fn it_serializes_log_records() {
    let record = LogRecord::new(1700000000000, &Message::new(Role::User, "hi"));
    insta::assert_snapshot!(
        serde_json::to_string(&record).unwrap(),
        @r###"{"ts":1700000000000,"role":"user","content":"hi"}"###
    );
}

#[test]
fn it_rejects_unknown_roles() {
    let res = serde_json::from_str::<Message>(r#"{"role":"system","content":"x"}"#);
    assert!(res.is_err());
}
