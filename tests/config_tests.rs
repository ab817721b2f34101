use sovran_outcome::{Context, OneOf1, Outcome, OutcomeError, Policy, PolicySnapshot, State};
use std::sync::Arc;

const CONFIG: &str = r#"
[server]
port = 8080

[outcome]
default_as_null = true
containers_not_empty_if_issues = false
throw_exceptions_from_user_handling_code = false
"#;

#[test]
fn test_policy_from_toml_table() -> Result<(), OutcomeError> {
    let policy = Policy::from_toml_str(CONFIG)?;
    assert_eq!(
        policy.snapshot(),
        PolicySnapshot {
            default_as_null: true,
            containers_not_empty_if_issues: false,
            treat_exceptions_as_errors: false,
            throw_exceptions_from_user_handling_code: false,
        }
    );
    Ok(())
}

#[test]
fn test_loaded_policy_drives_outcomes() -> Result<(), OutcomeError> {
    let ctx = Arc::new(
        Context::builder()
            .policy(Policy::from_toml_str(CONFIG)?.snapshot())
            .build()?,
    );

    let zero = Outcome::<OneOf1<u32>>::from_value_in(&ctx, 0u32);
    assert_eq!(zero.state(), State::Empty);

    let failed = Outcome::<OneOf1<u32>>::from_error_in(&ctx, sovran_outcome::Error::generic("x"));
    assert!(failed.is_empty());
    Ok(())
}

#[test]
fn test_policy_flip_applies_to_live_context() {
    let ctx = Arc::new(Context::default());
    let outcome = Outcome::<OneOf1<u32>>::from_value_in(&ctx, 0u32);
    assert_eq!(outcome.try_get_value::<u32>(), Some(&0));

    ctx.policy().set_default_as_null(true);
    assert_eq!(outcome.try_get_value::<u32>(), None);
}

#[test]
fn test_bad_config_is_reported() {
    let result = Policy::from_toml_str("[outcome]\ndefault_as_null = 1\n");
    match result {
        Err(OutcomeError::Config(msg)) => assert!(msg.contains("default_as_null")),
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn test_install_global_once() -> Result<(), OutcomeError> {
    let installed = Context::builder().treat_exceptions_as_errors(true).build()?.install()?;
    assert!(Arc::ptr_eq(&installed, &Context::global()));

    let outcome = Outcome::<OneOf1<u32>>::empty();
    assert!(outcome.context().policy().treat_exceptions_as_errors());

    let again = Context::default().install();
    assert!(matches!(again, Err(OutcomeError::Config(_))));
    Ok(())
}
